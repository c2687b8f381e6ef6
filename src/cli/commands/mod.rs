//! CLI command implementations.

mod about;
mod config;
mod doctor;
mod finance;
mod interactive;
mod search;
mod serve;
mod summarize;

pub use about::run_about;
pub use config::run_config;
pub use doctor::run_doctor;
pub use finance::run_finance;
pub use interactive::run_interactive;
pub use search::{run_search, SearchArgs};
pub use serve::run_serve;
pub use summarize::{run_summarize, SummarizeArgs};

use crate::cli::interrupt::Interrupts;
use crate::cli::Output;
use crate::config::{Secrets, Settings};
use crate::error::Result;
use crate::search::FinanceQuote;
use crate::session::Session;

/// Width of the intraday chart in the terminal.
const CHART_WIDTH: usize = 60;

/// Build a session from the environment, optionally overriding the presenter image.
fn open_session(mut settings: Settings, image: Option<&str>) -> Result<Session> {
    if let Some(image) = image {
        settings.video.source_image_url = image.to_string();
    }
    let secrets = Secrets::from_env(&settings);
    Session::new(settings, &secrets)
}

/// Render a talking-head video, giving up quietly on Ctrl-C.
async fn render_video(session: &Session, script: &str) -> Result<Option<String>> {
    let spinner = Output::spinner("Rendering talking-head video (Ctrl-C to cancel)...");
    let outcome = Interrupts::global()
        .cancellable(session.render_video(script))
        .await;
    spinner.finish_and_clear();
    outcome.transpose()
}

/// Print a quote line and its intraday chart.
fn print_quote(quote: &FinanceQuote) {
    Output::success(&quote.describe());
    match crate::search::price_chart(&quote.graph, CHART_WIDTH) {
        Ok(chart) if !chart.is_empty() => {
            println!("\nFollowing is the daily chart:\n");
            println!("{}", chart);
        }
        Ok(_) => Output::warning("No intraday prices to chart."),
        Err(e) => Output::warning(&format!("Could not draw chart: {}", e)),
    }
}
