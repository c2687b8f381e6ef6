//! One-shot search command.

use super::print_quote;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Secrets, Settings};
use crate::error::{FinnError, Result};
use crate::search::{NewsTopic, SearchMode, SearchProvider, SearchQuery, SerpApiClient};
use crate::table::{export_table, project_results, ExportFormat};
use std::path::Path;

/// Search arguments as typed on the command line.
pub struct SearchArgs<'a> {
    pub mode: &'a str,
    pub terms: &'a [String],
    pub check_in: Option<&'a str>,
    pub check_out: Option<&'a str>,
    pub adults: &'a str,
    pub export: Option<&'a str>,
}

/// Run the search command.
pub async fn run_search(args: SearchArgs<'_>, settings: Settings) -> anyhow::Result<()> {
    let mode: SearchMode = args.mode.parse().map_err(anyhow::Error::msg)?;
    let query = build_query(mode, args.terms, args.check_in, args.check_out, args.adults)?;

    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'finn doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let secrets = Secrets::from_env(&settings);
    let client = SerpApiClient::new(secrets.search_api_key(&settings)?, &settings.search)?;

    let spinner = Output::spinner(&format!("Searching {} for {}...", mode, query.describe()));
    let results = client.search(&query).await;
    spinner.finish_and_clear();
    let results = results?;

    if let Some(quote) = &results.quote {
        print_quote(quote);
    }

    // Intraday graphs are long; they are charted above and only exported.
    let table = project_results(&results);
    if mode != SearchMode::Finance {
        Output::table(&table);
    }

    if let Some(path) = args.export {
        let path = Path::new(path);
        std::fs::write(path, export_table(&table, ExportFormat::from_path(path)))?;
        Output::success(&format!("Wrote {} rows to {}", table.len(), path.display()));
    }

    Ok(())
}

/// Turn command-line terms into a query for `mode`.
pub fn build_query(
    mode: SearchMode,
    terms: &[String],
    check_in: Option<&str>,
    check_out: Option<&str>,
    adults: &str,
) -> Result<SearchQuery> {
    let text = terms.join(" ");
    match mode {
        SearchMode::Youtube => SearchQuery::youtube(&text),
        SearchMode::Web => SearchQuery::web(&text),
        SearchMode::News => text
            .parse::<NewsTopic>()
            .map(SearchQuery::news)
            .map_err(FinnError::InvalidInput),
        SearchMode::Hotels => {
            let check_in = check_in.ok_or_else(|| {
                FinnError::InvalidInput("--check-in is required for hotel searches".to_string())
            })?;
            let check_out = check_out.ok_or_else(|| {
                FinnError::InvalidInput("--check-out is required for hotel searches".to_string())
            })?;
            SearchQuery::hotels(&text, check_in, check_out, adults)
        }
        SearchMode::Finance => SearchQuery::finance(&text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_web_terms_are_joined() {
        let query = build_query(SearchMode::Web, &terms("what is a hedge fund"), None, None, "2").unwrap();
        assert_eq!(query, SearchQuery::web("what is a hedge fund").unwrap());
    }

    #[test]
    fn test_news_topic() {
        let query = build_query(SearchMode::News, &terms("tech"), None, None, "2").unwrap();
        assert_eq!(query, SearchQuery::news(NewsTopic::Technology));

        let err = build_query(SearchMode::News, &terms("gardening"), None, None, "2").unwrap_err();
        assert!(matches!(err, FinnError::InvalidInput(_)));
    }

    #[test]
    fn test_hotels_need_dates() {
        let err = build_query(SearchMode::Hotels, &terms("bali resorts"), None, None, "2").unwrap_err();
        assert!(err.to_string().contains("--check-in"));

        let query = build_query(
            SearchMode::Hotels,
            &terms("bali resorts"),
            Some("2024-06-25"),
            Some("2024-07-06"),
            "2",
        );
        tokio_test::assert_ok!(&query);
    }

    #[test]
    fn test_finance_symbol() {
        let query = build_query(SearchMode::Finance, &terms("amzn:nasdaq"), None, None, "2").unwrap();
        assert_eq!(query, SearchQuery::Finance { symbol: "AMZN:NASDAQ".to_string() });
    }
}
