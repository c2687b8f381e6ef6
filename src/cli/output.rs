//! CLI output formatting utilities.

use crate::llm::GeneratedAnswer;
use crate::table::Table;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Widest cell shown in terminal tables.
const MAX_CELL: usize = 60;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a result table.
    pub fn table(table: &Table) {
        if table.is_empty() {
            Output::warning("No results.");
            return;
        }
        println!("{}", table.render(MAX_CELL));
    }

    /// Print a model answer with its token usage.
    pub fn answer(answer: &GeneratedAnswer) {
        println!();
        if answer.text.trim().is_empty() {
            Output::warning("The model returned an empty answer.");
        } else {
            println!("{}", answer.text.trim());
        }
        println!(
            "\n{}",
            style(format!("{} tokens used", answer.total_tokens)).dim()
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Shorten text to one line of at most `max_len` characters.
pub fn preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_len {
        content
    } else {
        let cut: String = content.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}
