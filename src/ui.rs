// UI layer: the interactive menu. Each turn shows the options, reads one
// choice and runs the chosen search flow to completion before asking again.

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::api::{ApiClient, Fetch};
use crate::error::SearchError;
use crate::prompt::{prompt_question, Answer, Prompter};

pub const MENU_TEXT: &str = "Search Options:\n\t1)Wikipedia\n\t2)Google\n\t3)Exit";
pub const CHOICE_LABEL: &str = "Choice";
pub const SEARCH_LABEL: &str = "Search";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Wikipedia,
    Google,
    Exit,
}

impl MenuChoice {
    /// Match a menu answer, ignoring case and surrounding whitespace.
    pub fn from_input(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "wikipedia" => Some(MenuChoice::Wikipedia),
            "2" | "google" => Some(MenuChoice::Google),
            "3" | "exit" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingChoice,
    RunningWikipedia,
    RunningGoogle,
    Terminated,
}

/// Main interactive menu. Runs until the user picks Exit, types the exit
/// keyword at a search prompt, or the input stream closes.
///
/// Search failures are printed and the menu comes back; only I/O failures
/// on the prompter itself end the loop with an error.
pub fn main_menu<P, F>(prompter: &mut P, api: &ApiClient<F>) -> Result<()>
where
    P: Prompter + ?Sized,
    F: Fetch,
{
    let mut state = State::AwaitingChoice;
    loop {
        state = match state {
            State::AwaitingChoice => read_choice(prompter)?,
            State::RunningWikipedia => {
                run_flow(prompter, "Searching Wikipedia...", |term| {
                    api.lookup_wikipedia(term)
                })?
            }
            State::RunningGoogle => {
                run_flow(prompter, "Searching Google...", |term| api.search_google(term))?
            }
            State::Terminated => break,
        };
    }
    log::info!("Session ended");
    Ok(())
}

fn read_choice<P: Prompter + ?Sized>(prompter: &mut P) -> Result<State> {
    prompter.say(MENU_TEXT).context("Failed to show the menu")?;
    let line = match prompter.ask(CHOICE_LABEL).context("Failed to read menu choice")? {
        Some(line) => line,
        None => return Ok(State::Terminated),
    };

    let next = match MenuChoice::from_input(&line) {
        Some(MenuChoice::Wikipedia) => State::RunningWikipedia,
        Some(MenuChoice::Google) => State::RunningGoogle,
        Some(MenuChoice::Exit) => State::Terminated,
        None => {
            prompter.say(&format!(
                "Error [INVALID_INPUT]: {:?} is not a menu option",
                line.trim()
            ))?;
            State::AwaitingChoice
        }
    };
    Ok(next)
}

/// Ask for a term, run `search` on it and print the record or the error.
fn run_flow<P, T, S>(prompter: &mut P, message: &'static str, search: S) -> Result<State>
where
    P: Prompter + ?Sized,
    T: Serialize,
    S: FnOnce(&str) -> Result<T, SearchError>,
{
    let outcome = prompt_question(prompter, SEARCH_LABEL).and_then(|answer| match answer {
        Answer::Exit => Ok(None),
        Answer::Term(term) => with_spinner(message, || search(&term)).map(Some),
    });

    match outcome {
        Ok(None) => Ok(State::Terminated),
        Ok(Some(record)) => {
            let rendered =
                serde_json::to_string_pretty(&record).context("Failed to render result")?;
            prompter.say(&rendered)?;
            Ok(State::AwaitingChoice)
        }
        Err(SearchError::Io(e)) => Err(e).context("Failed to read search term"),
        Err(e) => {
            log::debug!("Search failed: {:?}", e);
            prompter.say(&e.to_string())?;
            Ok(State::AwaitingChoice)
        }
    }
}

// indicatif's spinner shows progress while a request is in flight. It
// draws to stderr and stays hidden when that is not a terminal.
fn with_spinner<T>(message: &'static str, work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = work();
    spinner.finish_and_clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{google_images_url, opensearch_url, page_images_url};
    use crate::config::Endpoints;
    use crate::prompt::StdioPrompter;
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::cell::Cell;
    use std::io::Cursor;
    use std::sync::{Mutex, Once};

    const WIKI: &str = "http://wiki.test/w/api.php";
    const GOOGLE: &str = "http://google.test/images";

    /// Answers every request through a closure and counts the calls.
    struct FnFetcher<G> {
        respond: G,
        calls: Cell<usize>,
    }

    impl<G: Fn(&str) -> Result<String, SearchError>> Fetch for FnFetcher<G> {
        fn get_text(&self, url: &str) -> Result<String, SearchError> {
            self.calls.set(self.calls.get() + 1);
            (self.respond)(url)
        }
    }

    fn api<G>(respond: G) -> ApiClient<FnFetcher<G>>
    where
        G: Fn(&str) -> Result<String, SearchError>,
    {
        ApiClient::with_fetcher(
            FnFetcher {
                respond,
                calls: Cell::new(0),
            },
            Endpoints {
                wikipedia_api: WIKI.into(),
                google_images: GOOGLE.into(),
            },
        )
    }

    fn offline(url: &str) -> Result<String, SearchError> {
        Err(SearchError::invalid_response(format!("unexpected request to {}", url)))
    }

    fn run_session<F: Fetch>(input: &str, api: &ApiClient<F>) -> String {
        run_session_bytes(input.as_bytes(), api)
    }

    fn run_session_bytes<F: Fetch>(input: &[u8], api: &ApiClient<F>) -> String {
        let mut prompter = StdioPrompter::new(Cursor::new(input.to_vec()), Vec::new());
        main_menu(&mut prompter, api).unwrap();
        String::from_utf8(prompter.into_output()).unwrap()
    }

    /// Records the level and target of every log line emitted in this test binary.
    struct CapturingLogger;

    static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
    static LOGGER: CapturingLogger = CapturingLogger;

    impl Log for CapturingLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut captured) = CAPTURED.lock() {
                captured.push((record.level(), record.target().to_string()));
            }
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(LevelFilter::Trace);
        });
    }

    #[test]
    fn menu_choices_are_trimmed_and_case_insensitive() {
        for input in ["3", "exit", "EXIT", "  Exit  "] {
            assert_eq!(MenuChoice::from_input(input), Some(MenuChoice::Exit));
        }
        assert_eq!(MenuChoice::from_input("1"), Some(MenuChoice::Wikipedia));
        assert_eq!(MenuChoice::from_input("Wikipedia"), Some(MenuChoice::Wikipedia));
        assert_eq!(MenuChoice::from_input(" 2 "), Some(MenuChoice::Google));
        assert_eq!(MenuChoice::from_input("google"), Some(MenuChoice::Google));
        assert_eq!(MenuChoice::from_input("4"), None);
        assert_eq!(MenuChoice::from_input(""), None);
    }

    #[test]
    fn exit_choices_end_the_session_without_requests() {
        for input in ["3\n", "exit\n", "EXIT\n"] {
            let api = api(offline);
            let output = run_session(input, &api);
            assert_eq!(output.matches("Search Options:").count(), 1);
            assert_eq!(api.fetcher_calls(), 0);
        }
    }

    #[test]
    fn unknown_choice_prints_notice_and_reprompts() {
        let api = api(offline);
        let output = run_session("banana\n3\n", &api);
        assert!(output.contains("Error [INVALID_INPUT]: \"banana\" is not a menu option"));
        assert_eq!(output.matches("Search Options:").count(), 2);
    }

    #[test]
    fn closed_input_ends_the_session() {
        let api = api(offline);
        let output = run_session("", &api);
        assert_eq!(output.matches("Search Options:").count(), 1);
    }

    #[test]
    fn wikipedia_flow_prints_the_record() {
        let api = api(|url: &str| {
            if url == opensearch_url(WIKI, "Marie Curie") {
                Ok(r#"["Marie Curie",["Marie Curie"],[""],["https://en.wikipedia.org/wiki/Marie_Curie"]]"#.into())
            } else if url == page_images_url(WIKI, "Marie Curie") {
                Ok(r#"{"query":{"pages":{"20408":{"original":{"source":"http://img/curie.jpg"}}}}}"#.into())
            } else {
                offline(url)
            }
        });
        let output = run_session("1\nMarie Curie\n3\n", &api);

        assert!(output.contains("\"name\": \"Marie Curie\""));
        assert!(output.contains("\"imageUrl\": \"http://img/curie.jpg\""));
        assert_eq!(output.matches("\"name\"").count(), 1);
        assert_eq!(api.fetcher_calls(), 2);
    }

    #[test]
    fn wikipedia_failure_returns_to_the_menu() {
        let api = api(|_: &str| Ok(r#"["zzzz",[],[],[]]"#.to_string()));
        let output = run_session("wikipedia\nzzzz\n3\n", &api);

        assert!(output.contains("Error [INVALID_RESPONSE]"));
        assert_eq!(output.matches("Search Options:").count(), 2);
    }

    #[test]
    fn empty_search_term_is_reported_without_requests() {
        let api = api(offline);
        let output = run_session("1\n   \n3\n", &api);

        assert!(output.contains("Error [EMPTY_INPUT]"));
        assert_eq!(output.matches("Search Options:").count(), 2);
        assert_eq!(api.fetcher_calls(), 0);
    }

    #[test]
    fn google_flow_prints_record_and_survives_failures() {
        let api = api(|url: &str| {
            if url == google_images_url(GOOGLE, "cat") {
                Ok(r#"<img alt="cat" src="http://t0.test/cat.jpg">"#.into())
            } else {
                offline(url)
            }
        });
        let output = run_session("2\ncat\ngoogle\ndog\n3\n", &api);

        assert!(output.contains("\"Search\": \"cat\""));
        assert!(output.contains("\"Image_url\": \"http://t0.test/cat.jpg\""));
        assert!(output.contains("unexpected request to http://google.test/images?q=dog"));
        assert_eq!(output.matches("Search Options:").count(), 3);
    }

    #[test]
    fn exit_at_search_prompt_ends_the_session() {
        let api = api(offline);
        let output = run_session("2\nexit\n1\nEinstein\n", &api);

        assert_eq!(output.matches("Search Options:").count(), 1);
        assert_eq!(api.fetcher_calls(), 0);
    }

    #[test]
    fn undecodable_menu_choice_is_an_invalid_option() {
        let api = api(offline);
        let output = run_session_bytes(b"\xff\xfe\n3\n", &api);

        assert!(output.contains("Error [INVALID_INPUT]"));
        assert_eq!(output.matches("Search Options:").count(), 2);
        assert_eq!(api.fetcher_calls(), 0);
    }

    #[test]
    fn undecodable_search_term_is_searched_lossily() {
        let api = api(offline);
        let output = run_session_bytes(b"1\nCaf\xe9\n3\n", &api);

        assert!(output.contains("Caf%EF%BF%BD"));
        assert_eq!(output.matches("Search Options:").count(), 2);
        assert_eq!(api.fetcher_calls(), 1);
    }

    #[test]
    fn failed_searches_are_not_logged_above_debug() {
        capture_logs();
        let api = api(|url: &str| match url.contains("opensearch") {
            true => Ok(r#"["zzzz",[],[],[]]"#.to_string()),
            false => Err(SearchError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                url: url.to_string(),
            }),
        });
        let output = run_session("1\nzzzz\n2\n   \n2\ncat\n3\n", &api);
        assert_eq!(output.matches("Error [").count(), 3);

        let captured = CAPTURED.lock().unwrap();
        let search_failures: Vec<_> = captured
            .iter()
            .filter(|(_, target)| target.as_str() == "image_lookup_cli::ui")
            .collect();
        assert!(search_failures.iter().any(|(level, _)| *level == Level::Debug));
        assert!(captured
            .iter()
            .filter(|(_, target)| target.starts_with("image_lookup_cli::"))
            .filter(|(_, target)| !target.ends_with("::config"))
            .all(|(level, _)| *level > Level::Warn));
    }

    impl<G> ApiClient<FnFetcher<G>>
    where
        G: Fn(&str) -> Result<String, SearchError>,
    {
        fn fetcher_calls(&self) -> usize {
            self.fetcher().calls.get()
        }
    }
}
