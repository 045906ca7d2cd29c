use anyhow::Result;
use clap::Parser;
use pantry_chef::ai::{GeminiRecipeClient, InferenceAdapter};
use pantry_chef::config::Config;
use pantry_chef::controller::{Rejection, SubmissionController, SubmitOutcome};
use pantry_chef::image::ImageBlob;
use pantry_chef::models::SubmissionState;
use pantry_chef::render::render_markdown;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pantry-chef")]
#[command(about = "Suggest recipes from your ingredients or a photo of them")]
struct CliArgs {
    /// Ingredients you have, e.g. "eggs, spinach, feta".
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    ingredients: String,

    /// Photo of your ingredients (JPEG, PNG, GIF or WebP).
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Model ID to use instead of RECIPE_MODEL.
    #[arg(long, value_name = "ID")]
    model: Option<String>,

    /// Print the model's Markdown as-is.
    #[arg(long)]
    raw: bool,
}

impl CliArgs {
    fn is_empty(&self) -> bool {
        self.ingredients.trim().is_empty() && self.image.is_none()
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pantry_chef=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    if args.is_empty() {
        error!("Nothing to submit: pass --ingredients and/or --image");
        return Ok(ExitCode::from(2));
    }

    let config = Config::from_env()?;
    let model = args.model.clone().unwrap_or_else(|| config.model.clone());

    info!("Using model {}", model);

    let client = GeminiRecipeClient::new(config.gemini_api_key.clone(), config.request_timeout)
        .with_base_url(config.base_url.clone());
    let controller = SubmissionController::new(InferenceAdapter::new(Box::new(client)), model);

    controller.update_free_text(args.ingredients.as_str());

    if let Some(path) = &args.image {
        let blob = ImageBlob::from_path(path).await?;
        controller.attach_image(blob).await?;
    }

    let mut states = controller.subscribe();
    let watcher = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            debug!("State changed: {}", states.borrow_and_update().label());
        }
    });

    let outcome = controller.submit().await;
    // Closing the channel lets the watcher log the final state and exit.
    drop(controller);
    watcher.await?;

    match outcome {
        SubmitOutcome::Rejected(Rejection::EmptyInput) => {
            error!("Nothing to submit: pass --ingredients and/or --image");
            Ok(ExitCode::from(2))
        }
        SubmitOutcome::Rejected(Rejection::InFlight) => {
            error!("A request is already in progress");
            Ok(ExitCode::FAILURE)
        }
        SubmitOutcome::Completed(SubmissionState::Succeeded(text)) => {
            if args.raw {
                println!("{}", text);
            } else {
                print!("{}", render_markdown(&text));
            }
            Ok(ExitCode::SUCCESS)
        }
        SubmitOutcome::Completed(SubmissionState::Failed(failure)) => {
            eprintln!("{}", failure);
            Ok(ExitCode::FAILURE)
        }
        SubmitOutcome::Completed(state) => {
            error!("Submission ended in unexpected state: {}", state.label());
            Ok(ExitCode::FAILURE)
        }
    }
}
