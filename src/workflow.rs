//! Interactive workflow as an explicit state machine.
//!
//! ```text
//! SelectMode -> EnterQuery -> ShowResults -> SelectItems -> EnterPrompt -> ShowAnswer
//! ```
//!
//! Hotels go straight from results to the prompt, finance ends once the
//! quote is shown. Every stage may restart at mode selection.

use crate::error::{FinnError, Result};
use crate::search::{SearchMode, SearchQuery};
use std::fmt;

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelectMode,
    EnterQuery(SearchMode),
    ShowResults(SearchMode),
    SelectItems(SearchMode),
    EnterPrompt(SearchMode),
    ShowAnswer(SearchMode),
    Finished,
}

impl Stage {
    /// Mode the session is working in, if one has been chosen.
    pub fn mode(&self) -> Option<SearchMode> {
        match *self {
            Stage::EnterQuery(m)
            | Stage::ShowResults(m)
            | Stage::SelectItems(m)
            | Stage::EnterPrompt(m)
            | Stage::ShowAnswer(m) => Some(m),
            Stage::SelectMode | Stage::Finished => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SelectMode => "mode selection",
            Stage::EnterQuery(_) => "query entry",
            Stage::ShowResults(_) => "results",
            Stage::SelectItems(_) => "item selection",
            Stage::EnterPrompt(_) => "prompt entry",
            Stage::ShowAnswer(_) => "answer",
            Stage::Finished => "finished",
        };
        match self.mode() {
            Some(mode) => write!(f, "{} ({})", name, mode),
            None => f.write_str(name),
        }
    }
}

/// Something the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ModeChosen(SearchMode),
    QuerySubmitted(SearchQuery),
    ResultsShown,
    ItemsSelected(Vec<String>),
    PromptSubmitted(String),
    AnswerShown,
    Restart,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::ModeChosen(_) => "choose a mode",
            Event::QuerySubmitted(_) => "submit a query",
            Event::ResultsShown => "show results",
            Event::ItemsSelected(_) => "select items",
            Event::PromptSubmitted(_) => "submit a prompt",
            Event::AnswerShown => "show an answer",
            Event::Restart => "restart",
        }
    }
}

/// Compute the stage that follows `event`.
///
/// Inputs are checked here so a stage is never entered with unusable data.
pub fn transition(stage: Stage, event: &Event) -> Result<Stage> {
    let next = match (stage, event) {
        (_, Event::Restart) => Stage::SelectMode,

        (Stage::SelectMode, Event::ModeChosen(mode)) => Stage::EnterQuery(*mode),

        (Stage::EnterQuery(mode), Event::QuerySubmitted(query)) => {
            if query.mode() != mode {
                return Err(FinnError::InvalidInput(format!(
                    "A {} query cannot be used in {} mode",
                    query.mode(),
                    mode
                )));
            }
            Stage::ShowResults(mode)
        }

        (Stage::ShowResults(mode), Event::ResultsShown) => match mode {
            SearchMode::Finance => Stage::Finished,
            SearchMode::Hotels => Stage::EnterPrompt(mode),
            _ => Stage::SelectItems(mode),
        },

        (Stage::SelectItems(mode), Event::ItemsSelected(items)) => {
            if items.is_empty() {
                return Err(FinnError::InvalidInput("Select at least one item".to_string()));
            }
            Stage::EnterPrompt(mode)
        }

        (Stage::EnterPrompt(mode), Event::PromptSubmitted(prompt)) => {
            if prompt.trim().is_empty() {
                return Err(FinnError::InvalidInput("The prompt cannot be empty".to_string()));
            }
            Stage::ShowAnswer(mode)
        }

        (Stage::ShowAnswer(_), Event::AnswerShown) => Stage::Finished,

        (stage, event) => {
            return Err(FinnError::InvalidTransition {
                stage: stage.to_string(),
                event: event.name().to_string(),
            })
        }
    };

    Ok(next)
}

/// Tracks the current stage of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    stage: Stage,
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            stage: Stage::SelectMode,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Apply an event. On error the stage is left unchanged.
    pub fn apply(&mut self, event: Event) -> Result<Stage> {
        self.stage = transition(self.stage, &event)?;
        Ok(self.stage)
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::NewsTopic;

    #[test]
    fn test_web_route() {
        let mut wf = Workflow::new();
        wf.apply(Event::ModeChosen(SearchMode::Web)).unwrap();
        wf.apply(Event::QuerySubmitted(SearchQuery::web("what is a hedge fund").unwrap()))
            .unwrap();
        assert_eq!(wf.stage(), Stage::ShowResults(SearchMode::Web));
        assert_eq!(wf.apply(Event::ResultsShown).unwrap(), Stage::SelectItems(SearchMode::Web));
        wf.apply(Event::ItemsSelected(vec!["https://a.com".to_string()])).unwrap();
        wf.apply(Event::PromptSubmitted("What is it?".to_string())).unwrap();
        assert_eq!(wf.stage(), Stage::ShowAnswer(SearchMode::Web));
        assert_eq!(wf.apply(Event::AnswerShown).unwrap(), Stage::Finished);
    }

    #[test]
    fn test_hotels_skip_selection() {
        let stage = transition(Stage::ShowResults(SearchMode::Hotels), &Event::ResultsShown).unwrap();
        assert_eq!(stage, Stage::EnterPrompt(SearchMode::Hotels));
    }

    #[test]
    fn test_finance_ends_after_results() {
        let stage = transition(Stage::ShowResults(SearchMode::Finance), &Event::ResultsShown).unwrap();
        assert_eq!(stage, Stage::Finished);
    }

    #[test]
    fn test_out_of_order_event_rejected() {
        let mut wf = Workflow::new();
        let err = wf.apply(Event::PromptSubmitted("hi".to_string())).unwrap_err();
        assert!(matches!(err, FinnError::InvalidTransition { .. }));
        assert_eq!(wf.stage(), Stage::SelectMode);
    }

    #[test]
    fn test_query_mode_must_match() {
        let stage = Stage::EnterQuery(SearchMode::Youtube);
        let query = SearchQuery::news(NewsTopic::Sports);
        let err = transition(stage, &Event::QuerySubmitted(query)).unwrap_err();
        assert!(matches!(err, FinnError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let err = transition(Stage::SelectItems(SearchMode::News), &Event::ItemsSelected(vec![]))
            .unwrap_err();
        assert!(matches!(err, FinnError::InvalidInput(_)));

        let err = transition(
            Stage::EnterPrompt(SearchMode::News),
            &Event::PromptSubmitted("   ".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, FinnError::InvalidInput(_)));
    }

    #[test]
    fn test_restart_from_anywhere() {
        for stage in [
            Stage::SelectMode,
            Stage::EnterQuery(SearchMode::Web),
            Stage::SelectItems(SearchMode::Youtube),
            Stage::ShowAnswer(SearchMode::Hotels),
            Stage::Finished,
        ] {
            assert_eq!(transition(stage, &Event::Restart).unwrap(), Stage::SelectMode);
        }
    }
}
