pub const INGREDIENTS: &str = include_str!("../data/prompts/ingredients.txt");
pub const RECIPE_INSTRUCTION: &str = include_str!("../data/prompts/recipe_instruction.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.trim_end().to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// The fixed trailing instruction sent with every submission.
pub fn recipe_instruction() -> String {
    render(RECIPE_INSTRUCTION, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_multiple_vars() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "eggs"), ("b", "rice")]),
            "eggs and rice"
        );
    }

    #[test]
    fn test_render_strips_trailing_newline() {
        assert_eq!(render("{{x}}\n", &[("x", "basil")]), "basil");
    }

    #[test]
    fn test_prompts_are_non_empty() {
        assert!(!INGREDIENTS.trim().is_empty());
        assert!(!RECIPE_INSTRUCTION.trim().is_empty());
    }

    #[test]
    fn test_ingredients_has_placeholder() {
        assert!(INGREDIENTS.contains("{{ingredients}}"));
    }

    #[test]
    fn test_instruction_asks_for_three_markdown_ideas() {
        let instruction = recipe_instruction();
        assert!(instruction.contains("exactly 3"));
        assert!(instruction.contains("Markdown"));
    }
}
