//! Summarize command: fetch sources and ask the model about them.

use super::{open_session, render_video};
use crate::cli::preflight::{self, Operation};
use crate::cli::{preview, Output};
use crate::config::Settings;
use crate::fetch::{format_items, parse_sources};
use crate::search::SearchMode;

/// Summarize arguments as typed on the command line.
pub struct SummarizeArgs<'a> {
    pub urls: &'a [String],
    pub prompt: &'a str,
    pub mode: &'a str,
    pub model: Option<&'a str>,
    pub video: bool,
    pub image: Option<&'a str>,
}

/// Run the summarize command.
pub async fn run_summarize(args: SummarizeArgs<'_>, settings: Settings) -> anyhow::Result<()> {
    let mode: SearchMode = args.mode.parse().map_err(anyhow::Error::msg)?;
    if matches!(mode, SearchMode::Hotels | SearchMode::Finance) {
        anyhow::bail!("summarize works with youtube, web or news sources");
    }
    let sources = parse_sources(&args.urls.join(" "))?;

    let mut operations = vec![Operation::Fetch(mode), Operation::Ask];
    if args.video {
        operations.push(Operation::Video);
    }
    for operation in operations {
        if let Err(e) = preflight::check(operation, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'finn doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let session = open_session(settings, args.image)?;

    let verb = if mode.fetches_transcripts() { "Transcribing" } else { "Scraping" };
    let spinner = Output::spinner(&format!("{} {} source(s)...", verb, sources.len()));
    let report = session.fetch(mode, &sources).await;
    spinner.finish_and_clear();
    let report = report?;

    for failure in &report.failures {
        Output::warning(&format!("Skipped {}: {}", failure.source, failure.error));
    }
    for item in &report.items {
        Output::list_item(&format!("{}: {}", item.source, preview(&item.text, 80)));
    }

    let spinner = Output::spinner("Asking the model...");
    let answer = session
        .ask(mode, args.model, args.prompt, &format_items(&report.items))
        .await;
    spinner.finish_and_clear();
    let answer = answer?;

    Output::answer(&answer);

    if args.video {
        match render_video(&session, &answer.text).await? {
            Some(url) => Output::success(&format!("Video ready: {}", url)),
            None => Output::warning("Video cancelled."),
        }
    }

    Ok(())
}
