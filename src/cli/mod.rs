//! CLI module for Finn.

pub mod commands;
pub mod interrupt;
mod output;
pub mod preflight;

pub use output::{preview, Output};

use clap::{Parser, Subcommand};

/// Finn - Search & Summarize
///
/// Search YouTube, the web, news, hotels or stock quotes, pick the results
/// you care about, and ask a language model about their content.
#[derive(Parser, Debug)]
#[command(name = "finn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Command to run (defaults to the interactive workflow)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk through search, selection and summarization step by step
    Interactive {
        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Presenter image URL for video answers
        #[arg(long)]
        image: Option<String>,
    },

    /// Run one search and print the result table
    Search {
        /// Search mode (youtube, web, news, hotels, finance)
        mode: String,

        /// Search terms, topic, place or symbol
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,

        /// Hotel check-in date (YYYY-MM-DD)
        #[arg(long)]
        check_in: Option<String>,

        /// Hotel check-out date (YYYY-MM-DD)
        #[arg(long)]
        check_out: Option<String>,

        /// Number of hotel guests
        #[arg(long, default_value = "2")]
        adults: String,

        /// Write the table to a file (.csv or .json)
        #[arg(short, long)]
        export: Option<String>,
    },

    /// Fetch pages or videos and ask the model about them
    Summarize {
        /// URLs to fetch
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Instruction or question for the model
        #[arg(short, long)]
        prompt: String,

        /// How the URLs are fetched (youtube transcribes, web scrapes)
        #[arg(long, default_value = "web")]
        mode: String,

        /// Chat model to use
        #[arg(short = 'M', long)]
        model: Option<String>,

        /// Render the answer as a talking-head video
        #[arg(long)]
        video: bool,

        /// Presenter image URL for the video
        #[arg(long)]
        image: Option<String>,
    },

    /// Show the latest quote and intraday chart for a symbol
    Finance {
        /// Symbol with exchange, e.g. AMZN:NASDAQ
        symbol: String,
    },

    /// Describe what Finn does
    About,

    /// Check system requirements and configuration
    Doctor,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::parse_from(["finn"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_hotel_search() {
        let cli = Cli::parse_from([
            "finn", "-vv", "search", "hotels", "bali", "resorts", "--check-in", "2024-06-25",
            "--check-out", "2024-07-06", "--export", "hotels.csv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Search {
                mode,
                terms,
                check_in,
                adults,
                export,
                ..
            }) => {
                assert_eq!(mode, "hotels");
                assert_eq!(terms, vec!["bali", "resorts"]);
                assert_eq!(check_in.as_deref(), Some("2024-06-25"));
                assert_eq!(adults, "2");
                assert_eq!(export.as_deref(), Some("hotels.csv"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_summarize() {
        let cli = Cli::parse_from([
            "finn", "summarize", "https://a.com", "https://b.com", "-p", "Summarize", "--video",
        ]);
        match cli.command {
            Some(Commands::Summarize {
                urls, prompt, mode, video, ..
            }) => {
                assert_eq!(urls.len(), 2);
                assert_eq!(prompt, "Summarize");
                assert_eq!(mode, "web");
                assert!(video);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
