use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "inkling")]
#[command(about = "Inkling - streamed inline predictions with partial acceptance")]
#[command(version)]
struct Cli {
    /// Completion endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Session identifier sent with every request
    #[arg(long, global = true)]
    session: Option<String>,

    /// Anchor identifier sent with every request (repeatable)
    #[arg(long = "anchor", global = true)]
    anchors: Vec<String>,

    /// Quiet period before a prediction is requested
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream one prediction for TEXT and exit
    Predict { text: String },
    /// Interactive editing session with ghost text
    Session {
        /// Load this file as the starting document
        #[arg(long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = inkling_core::Settings::load();

    if let Some(ref url) = cli.endpoint {
        settings.endpoint.url = url.clone();
    }
    if let Some(ref session) = cli.session {
        settings.context.session_id = Some(session.clone());
    }
    if !cli.anchors.is_empty() {
        settings.context.anchor_ids = cli.anchors.clone();
    }
    if let Some(ms) = cli.debounce_ms {
        settings.prediction.debounce_ms = ms;
    }
    let context = settings.request_context();

    match cli.command {
        Commands::Predict { text } => app::run_predict(&settings, context, &text).await?,
        Commands::Session { file } => app::run_session(settings, context, file).await?,
    }

    Ok(())
}
