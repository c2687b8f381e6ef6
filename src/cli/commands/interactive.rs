//! Interactive workflow on the terminal.
//!
//! Each stage of the workflow asks for one thing. A failed step prints the
//! error and asks again; `/restart` goes back to mode selection and `/quit`
//! leaves.

use super::{open_session, print_quote, render_video, run_about};
use crate::cli::preflight::{self, Operation};
use crate::cli::{preview, Output};
use crate::config::Settings;
use crate::error::{FinnError, Result};
use crate::fetch::{format_items, parse_sources};
use crate::llm::{prompt_hint, GeneratedAnswer};
use crate::search::{NewsTopic, SearchMode, SearchQuery, SearchResults};
use crate::session::{hotel_content, Session};
use crate::table::project_results;
use crate::video::Presentation;
use crate::workflow::{Event, Stage, Workflow};
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive workflow on stdin.
pub async fn run_interactive(
    model: Option<String>,
    image: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    for operation in [Operation::Search, Operation::Ask] {
        if let Err(e) = preflight::check(operation, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'finn doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let session = open_session(settings, image.as_deref())?;
    let stdin = io::stdin();
    let mut driver = Interactive::new(&session, stdin.lock(), model);
    driver.run().await?;

    Ok(())
}

/// What the user typed at a prompt.
enum Reply {
    Line(String),
    Restart,
    Quit,
}

/// Outcome of one stage.
enum Step {
    Event(Event),
    Stay,
    Quit,
}

/// Menu entry on the mode selection screen.
#[derive(Debug, PartialEq, Eq)]
enum MenuChoice {
    Mode(SearchMode),
    About,
}

macro_rules! line_or_return {
    ($reply:expr) => {
        match $reply {
            Reply::Line(line) => line,
            Reply::Restart => return Ok(Step::Event(Event::Restart)),
            Reply::Quit => return Ok(Step::Quit),
        }
    };
}

struct Interactive<'a, R> {
    session: &'a Session,
    input: R,
    model: Option<String>,
    workflow: Workflow,
    results: Option<SearchResults>,
    content: String,
    answer: Option<GeneratedAnswer>,
}

impl<'a, R: BufRead> Interactive<'a, R> {
    fn new(session: &'a Session, input: R, model: Option<String>) -> Self {
        Self {
            session,
            input,
            model,
            workflow: Workflow::new(),
            results: None,
            content: String::new(),
            answer: None,
        }
    }

    async fn run(&mut self) -> Result<()> {
        println!("\n{}", style("Finn - Search & Summarize").bold().cyan());
        println!(
            "{}",
            style("Type /restart to start over or /quit to leave.").dim()
        );

        if self.model.is_none() && !self.choose_model()? {
            return Ok(());
        }

        loop {
            let stage = self.workflow.stage();
            debug!(%stage, "Interactive step");

            let step = match stage {
                Stage::SelectMode => self.select_mode(),
                Stage::EnterQuery(mode) => self.enter_query(mode).await,
                Stage::ShowResults(mode) => self.show_results(mode),
                Stage::SelectItems(mode) => self.select_items(mode).await,
                Stage::EnterPrompt(mode) => self.enter_prompt(mode).await,
                Stage::ShowAnswer(_) => self.show_answer().await,
                Stage::Finished => self.finished(),
            };

            match step {
                Ok(Step::Event(event)) => {
                    if event == Event::Restart {
                        self.reset();
                    }
                    if let Err(e) = self.workflow.apply(event) {
                        Output::error(&e.to_string());
                    }
                }
                Ok(Step::Stay) => {}
                Ok(Step::Quit) => {
                    Output::info("Goodbye!");
                    return Ok(());
                }
                Err(e @ FinnError::Io(_)) => return Err(e),
                Err(e) => Output::error(&e.to_string()),
            }
        }
    }

    fn reset(&mut self) {
        self.results = None;
        self.content.clear();
        self.answer = None;
    }

    fn ask_line(&mut self, prompt: &str) -> Result<Reply> {
        print!("{} ", style(prompt).bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Reply::Quit);
        }

        Ok(match line.trim() {
            "/quit" | "/exit" => Reply::Quit,
            "/restart" => Reply::Restart,
            other => Reply::Line(other.to_string()),
        })
    }

    /// Returns false when the user quit.
    fn choose_model(&mut self) -> Result<bool> {
        let models = self.session.settings().completion.models.clone();
        if models.len() < 2 {
            return Ok(true);
        }

        println!("\nChoose model:");
        for (i, model) in models.iter().enumerate() {
            println!("  {}. {}", i + 1, model);
        }

        loop {
            let line = match self.ask_line("Model [1]:")? {
                Reply::Line(line) => line,
                Reply::Restart => continue,
                Reply::Quit => return Ok(false),
            };
            if line.is_empty() {
                self.model = Some(models[0].clone());
                return Ok(true);
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=models.len()).contains(&n) => {
                    self.model = Some(models[n - 1].clone());
                    return Ok(true);
                }
                _ => Output::error(&format!("Enter a number between 1 and {}", models.len())),
            }
        }
    }

    fn select_mode(&mut self) -> Result<Step> {
        Output::header("Select service");
        for (i, mode) in SearchMode::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, mode.label());
        }
        println!("  {}. About", SearchMode::ALL.len() + 1);

        let line = match self.ask_line("Choice:")? {
            Reply::Line(line) => line,
            Reply::Restart => return Ok(Step::Stay),
            Reply::Quit => return Ok(Step::Quit),
        };

        match parse_menu_choice(&line)? {
            MenuChoice::About => {
                run_about();
                Ok(Step::Stay)
            }
            MenuChoice::Mode(mode) => Ok(Step::Event(Event::ModeChosen(mode))),
        }
    }

    async fn enter_query(&mut self, mode: SearchMode) -> Result<Step> {
        let query = match mode {
            SearchMode::Youtube => {
                let line = line_or_return!(self.ask_line("Enter search term for YouTube search:")?);
                SearchQuery::youtube(&line)?
            }
            SearchMode::Web => {
                let line = line_or_return!(self.ask_line("Enter your search query:")?);
                SearchQuery::web(&line)?
            }
            SearchMode::News => {
                println!("\nWhich topic do you want headlines for?");
                for (i, topic) in NewsTopic::ALL.iter().enumerate() {
                    println!("  {}. {}", i + 1, topic.as_str());
                }
                let line = line_or_return!(self.ask_line("Topic:")?);
                SearchQuery::news(parse_topic(&line)?)
            }
            SearchMode::Hotels => {
                let place = line_or_return!(self.ask_line("Island or place (e.g. Bali Resorts):")?);
                let check_in = line_or_return!(self.ask_line("Check-in date (e.g. 2024-06-25):")?);
                let check_out = line_or_return!(self.ask_line("Check-out date (e.g. 2024-07-06):")?);
                let adults = line_or_return!(self.ask_line("Number of guests (e.g. 2):")?);
                SearchQuery::hotels(&place, &check_in, &check_out, &adults)?
            }
            SearchMode::Finance => {
                let line = line_or_return!(
                    self.ask_line("Symbol with exchange (e.g. AMZN:NASDAQ):")?
                );
                SearchQuery::finance(&line)?
            }
        };

        let spinner = Output::spinner(&format!("Searching for {}...", query.describe()));
        let results = self.session.search(&query).await;
        spinner.finish_and_clear();

        self.results = Some(results?);
        Ok(Step::Event(Event::QuerySubmitted(query)))
    }

    fn show_results(&mut self, mode: SearchMode) -> Result<Step> {
        let results = self.current_results()?;

        if let Some(quote) = &results.quote {
            print_quote(quote);
        }

        if mode != SearchMode::Finance {
            let table = project_results(results);
            println!("\nTop {} results:\n", table.len());
            Output::table(&table);
        }

        if matches!(mode, SearchMode::Youtube | SearchMode::Web | SearchMode::News) {
            println!(
                "{}",
                style("Pick items by number (e.g. 1 3), 'all', or paste URLs.").dim()
            );
        }

        Ok(Step::Event(Event::ResultsShown))
    }

    async fn select_items(&mut self, mode: SearchMode) -> Result<Step> {
        let links = self.current_results()?.links();
        let line = line_or_return!(self.ask_line("Items:")?);
        let sources = parse_selection(&line, &links)?;

        let verb = if mode.fetches_transcripts() { "Transcribing" } else { "Scraping" };
        let spinner = Output::spinner(&format!("{} {} item(s)...", verb, sources.len()));
        let report = self.session.fetch(mode, &sources).await;
        spinner.finish_and_clear();
        let report = report?;

        for failure in &report.failures {
            Output::warning(&format!("Skipped {}: {}", failure.source, failure.error));
        }
        for item in &report.items {
            Output::list_item(&format!("{}: {}", item.source, preview(&item.text, 80)));
        }

        self.content = format_items(&report.items);
        Ok(Step::Event(Event::ItemsSelected(sources)))
    }

    async fn enter_prompt(&mut self, mode: SearchMode) -> Result<Step> {
        if mode == SearchMode::Hotels {
            self.content = hotel_content(self.current_results()?)?;
        }

        let hint = prompt_hint(mode);
        if !hint.is_empty() {
            println!("{}", style(hint).dim());
        }
        let line = line_or_return!(self.ask_line("Prompt:")?);

        let spinner = Output::spinner("Asking the model...");
        let answer = self
            .session
            .ask(mode, self.model.as_deref(), &line, &self.content)
            .await;
        spinner.finish_and_clear();

        self.answer = Some(answer?);
        Ok(Step::Event(Event::PromptSubmitted(line)))
    }

    async fn show_answer(&mut self) -> Result<Step> {
        let presentation = if self.session.can_render_video() {
            let line = line_or_return!(self.ask_line("Show as [t]ext or [v]ideo?")?);
            parse_presentation(&line)?
        } else {
            Presentation::Text
        };

        let answer = self
            .answer
            .as_ref()
            .ok_or_else(|| FinnError::InvalidInput("There is no answer to show".to_string()))?;

        match presentation {
            Presentation::Text => Output::answer(answer),
            Presentation::TalkingHead => match render_video(self.session, &answer.text).await? {
                Some(url) => Output::success(&format!("Video ready: {}", url)),
                None => {
                    Output::warning("Video cancelled, showing the text instead.");
                    Output::answer(answer);
                }
            },
        }

        Ok(Step::Event(Event::AnswerShown))
    }

    fn finished(&mut self) -> Result<Step> {
        let line = line_or_return!(self.ask_line("Start another search? [Y/n]")?);
        if line.is_empty() || line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes") {
            Ok(Step::Event(Event::Restart))
        } else {
            Ok(Step::Quit)
        }
    }

    fn current_results(&self) -> Result<&SearchResults> {
        self.results
            .as_ref()
            .ok_or_else(|| FinnError::InvalidInput("Run a search first".to_string()))
    }
}

fn parse_menu_choice(input: &str) -> Result<MenuChoice> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return match n {
            n if (1..=SearchMode::ALL.len()).contains(&n) => Ok(MenuChoice::Mode(SearchMode::ALL[n - 1])),
            n if n == SearchMode::ALL.len() + 1 => Ok(MenuChoice::About),
            _ => Err(FinnError::InvalidInput(format!(
                "Enter a number between 1 and {}",
                SearchMode::ALL.len() + 1
            ))),
        };
    }
    if input.eq_ignore_ascii_case("about") || input.eq_ignore_ascii_case("home") {
        return Ok(MenuChoice::About);
    }
    input
        .parse::<SearchMode>()
        .map(MenuChoice::Mode)
        .map_err(FinnError::InvalidInput)
}

fn parse_topic(input: &str) -> Result<NewsTopic> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=NewsTopic::ALL.len()).contains(&n) => Ok(NewsTopic::ALL[n - 1]),
        Ok(_) => Err(FinnError::InvalidInput(format!(
            "Enter a number between 1 and {}",
            NewsTopic::ALL.len()
        ))),
        Err(_) => input.parse::<NewsTopic>().map_err(FinnError::InvalidInput),
    }
}

fn parse_presentation(input: &str) -> Result<Presentation> {
    match input.trim() {
        "" | "t" | "T" => Ok(Presentation::Text),
        "v" | "V" => Ok(Presentation::TalkingHead),
        other => other.parse(),
    }
}

/// Resolve a selection of result numbers and pasted URLs, keeping order.
fn parse_selection(input: &str, links: &[String]) -> Result<Vec<String>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        if links.is_empty() {
            return Err(FinnError::InvalidInput("There are no links to select".to_string()));
        }
        return Ok(links.to_vec());
    }

    let mut picked: Vec<String> = Vec::new();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let source = match token.parse::<usize>() {
            Ok(n) if (1..=links.len()).contains(&n) => links[n - 1].clone(),
            Ok(n) => {
                return Err(FinnError::InvalidInput(format!(
                    "{} is not between 1 and {}",
                    n,
                    links.len()
                )))
            }
            Err(_) => parse_sources(token)?.remove(0),
        };
        if !picked.contains(&source) {
            picked.push(source);
        }
    }

    if picked.is_empty() {
        return Err(FinnError::InvalidInput("Select at least one item".to_string()));
    }
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{ContentFetcher, ContentItem, PageLoader, PageScraper};
    use crate::llm::{CompletionClient, CompletionRequest, PromptRole};
    use crate::search::{parse_response, SearchProvider};
    use crate::chunking::RecursiveSplitter;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    struct CannedSearch(Value);

    #[async_trait]
    impl SearchProvider for CannedSearch {
        async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
            parse_response(query.mode(), self.0.clone())
        }
    }

    struct EchoPage;

    #[async_trait]
    impl PageLoader for EchoPage {
        async fn load(&self, url: &str) -> Result<String> {
            Ok(format!("Content of {}!", url.rsplit('/').next().unwrap_or_default()))
        }
    }

    struct NoTranscripts;

    #[async_trait]
    impl ContentFetcher for NoTranscripts {
        async fn fetch(&self, source: &str) -> Result<ContentItem> {
            Err(FinnError::AudioDownload(source.to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingCompletion {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<GeneratedAnswer> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(GeneratedAnswer {
                text: "It is a pooled investment vehicle...".to_string(),
                total_tokens: 42,
            })
        }
    }

    fn canned_results() -> Value {
        let organic: Vec<Value> = (1..=5)
            .map(|i| {
                json!({
                    "position": i,
                    "title": format!("Result {}", i),
                    "link": format!("https://example.com/page{}", i),
                    "snippet": "..."
                })
            })
            .collect();
        let properties: Vec<Value> = (1..=9)
            .map(|i| json!({ "name": format!("Hotel {}", i), "link": format!("https://hotel{}.com", i) }))
            .collect();
        json!({ "organic_results": organic, "properties": properties })
    }

    fn session(completion: Arc<RecordingCompletion>) -> Session {
        Session::with_components(
            Settings::default(),
            Arc::new(CannedSearch(canned_results())),
            Arc::new(NoTranscripts),
            Arc::new(PageScraper::new(Arc::new(EchoPage), Arc::new(RecursiveSplitter::default()))),
            completion,
            None,
        )
    }

    #[tokio::test]
    async fn test_web_walkthrough_recovers_from_bad_input() {
        let completion = Arc::new(RecordingCompletion::default());
        let session = session(completion.clone());

        // default model, bad menu choice, web mode, query, out-of-range item,
        // two items, prompt, then decline another round
        let script = "\n9\n2\nwhat is a hedge fund\n7\n1, 3\nWhat is a hedge fund?\nn\n";
        let mut driver = Interactive::new(&session, Cursor::new(script), None);
        driver.run().await.unwrap();

        assert_eq!(driver.workflow.stage(), Stage::Finished);
        assert_eq!(driver.model.as_deref(), Some("gpt-3.5-turbo-0125"));

        let requests = completion.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "What is a hedge fund?");
        assert_eq!(
            requests[0].messages[1].content,
            "Source: https://example.com/page1\nContent of page1\n\n---\n\nSource: https://example.com/page3\nContent of page3"
        );
    }

    #[tokio::test]
    async fn test_hotel_walkthrough_skips_selection() {
        let completion = Arc::new(RecordingCompletion::default());
        let session = session(completion.clone());

        let script = "2\n4\nLisbon\n2024-06-25\n2024-06-27\n2\nBest value?\nn\n";
        let mut driver = Interactive::new(&session, Cursor::new(script), None);
        driver.run().await.unwrap();

        assert_eq!(driver.model.as_deref(), Some("gpt-4o-2024-05-13"));

        let requests = completion.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages.iter().all(|m| m.role == PromptRole::User));
        let hotels: Vec<Value> = serde_json::from_str(&requests[0].messages[1].content).unwrap();
        assert_eq!(hotels.len(), 7);
    }

    #[tokio::test]
    async fn test_restart_returns_to_menu() {
        let completion = Arc::new(RecordingCompletion::default());
        let session = session(completion.clone());

        let script = "1\n2\n/restart\n/quit\n";
        let mut driver = Interactive::new(&session, Cursor::new(script), None);
        driver.run().await.unwrap();

        assert_eq!(driver.workflow.stage(), Stage::SelectMode);
        assert!(completion.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(parse_menu_choice("1").unwrap(), MenuChoice::Mode(SearchMode::Youtube));
        assert_eq!(parse_menu_choice("5").unwrap(), MenuChoice::Mode(SearchMode::Finance));
        assert_eq!(parse_menu_choice("6").unwrap(), MenuChoice::About);
        assert_eq!(parse_menu_choice("news").unwrap(), MenuChoice::Mode(SearchMode::News));
        assert!(parse_menu_choice("0").is_err());
        assert!(parse_menu_choice("weather").is_err());
    }

    #[test]
    fn test_parse_selection() {
        let links: Vec<String> = (1..=3).map(|i| format!("https://example.com/{}", i)).collect();

        assert_eq!(parse_selection("all", &links).unwrap(), links);
        assert_eq!(
            parse_selection("3 1 3", &links).unwrap(),
            vec!["https://example.com/3", "https://example.com/1"]
        );
        assert_eq!(
            parse_selection("2 https://other.org/x", &links).unwrap(),
            vec!["https://example.com/2", "https://other.org/x"]
        );
        assert!(parse_selection("4", &links).is_err());
        assert!(parse_selection("  ", &links).is_err());
        assert!(parse_selection("not-a-url", &links).is_err());
    }

    #[test]
    fn test_parse_topic_and_presentation() {
        assert_eq!(parse_topic("2").unwrap(), NewsTopic::Technology);
        assert_eq!(parse_topic("sports").unwrap(), NewsTopic::Sports);
        assert_eq!(parse_presentation("").unwrap(), Presentation::Text);
        assert_eq!(parse_presentation("v").unwrap(), Presentation::TalkingHead);
        assert!(parse_presentation("hologram").is_err());
    }
}
