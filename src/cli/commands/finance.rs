//! Finance quote command.

use super::print_quote;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Secrets, Settings};
use crate::search::{SearchProvider, SearchQuery, SerpApiClient};

/// Show the latest quote and intraday chart for a symbol.
pub async fn run_finance(symbol: &str, settings: Settings) -> anyhow::Result<()> {
    let query = SearchQuery::finance(symbol)?;

    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'finn doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let secrets = Secrets::from_env(&settings);
    let client = SerpApiClient::new(secrets.search_api_key(&settings)?, &settings.search)?;

    let spinner = Output::spinner(&format!("Fetching quote for {}...", query.describe()));
    let results = client.search(&query).await;
    spinner.finish_and_clear();

    match results?.quote {
        Some(quote) => print_quote(&quote),
        None => Output::warning("No quote in the response."),
    }

    Ok(())
}
