//! About command.

use crate::cli::Output;
use crate::search::SearchMode;

const ABOUT: &str = "Finn uses SerpApi to fetch the results of a Google, YouTube, news, \
hotel or finance search. Pick the sites or videos that interest you and Finn scrapes \
the pages or transcribes the videos, then asks a language model to answer your prompt \
about them. Answers are shown as text or read out by a talking head.";

/// Print what each mode does.
pub fn run_about() {
    Output::header("Finn - Search & Summarize");
    println!();
    println!("{}", ABOUT);
    println!();
    for mode in SearchMode::ALL {
        Output::list_item(&format!("{}: {}", mode.label(), mode_help(mode)));
    }
    println!();
    Output::info("Run 'finn' to start, or 'finn doctor' to check your setup.");
}

fn mode_help(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Youtube => "search YouTube, then summarize the videos you pick",
        SearchMode::Web => "type a search as you would on google.com",
        SearchMode::News => "pick a news topic instead of typing a query",
        SearchMode::Hotels => "enter a place such as \"bali resorts\" and your dates",
        SearchMode::Finance => "enter a symbol with exchange for a quote and chart",
    }
}
