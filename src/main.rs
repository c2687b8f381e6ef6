//! Finn CLI entry point.

use anyhow::Result;
use clap::Parser;
use finn::cli::commands::{self, SearchArgs, SummarizeArgs};
use finn::cli::{Cli, Commands};
use finn::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging; -v flags win over the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("finn={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let command = cli.command.unwrap_or(Commands::Interactive {
        model: None,
        image: None,
    });

    // Execute command
    match command {
        Commands::Interactive { model, image } => {
            commands::run_interactive(model, image, settings).await?;
        }

        Commands::Search {
            mode,
            terms,
            check_in,
            check_out,
            adults,
            export,
        } => {
            let args = SearchArgs {
                mode: &mode,
                terms: &terms,
                check_in: check_in.as_deref(),
                check_out: check_out.as_deref(),
                adults: &adults,
                export: export.as_deref(),
            };
            commands::run_search(args, settings).await?;
        }

        Commands::Summarize {
            urls,
            prompt,
            mode,
            model,
            video,
            image,
        } => {
            let args = SummarizeArgs {
                urls: &urls,
                prompt: &prompt,
                mode: &mode,
                model: model.as_deref(),
                video,
                image: image.as_deref(),
            };
            commands::run_summarize(args, settings).await?;
        }

        Commands::Finance { symbol } => {
            commands::run_finance(&symbol, settings).await?;
        }

        Commands::About => {
            commands::run_about();
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(&host, port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
