// Prompt layer: the only code that talks to the user's input stream.
// Exactly one line is consumed per `ask` call.

use std::io::{self, BufRead, Write};

use dialoguer::Input;

use crate::error::SearchError;

/// Typing this at a prompt (any case, surrounding spaces ignored) ends the session.
pub const EXIT_KEYWORD: &str = "exit";

/// A request/response primitive over some input and output.
pub trait Prompter {
    /// Write one line of output for the user.
    fn say(&mut self, text: &str) -> io::Result<()>;

    /// Show `label` and wait for one line. `Ok(None)` means the input
    /// stream is closed and nothing more will arrive.
    fn ask(&mut self, label: &str) -> io::Result<Option<String>>;
}

/// Line-oriented prompter over any reader/writer pair. Used for piped
/// input and for driving sessions from tests.
pub struct StdioPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> StdioPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        StdioPrompter { input, output }
    }

    /// Give back the output sink, e.g. to inspect what a session printed.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for StdioPrompter<R, W> {
    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }

    fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;

        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }
        // Bytes that are not UTF-8 become U+FFFD instead of ending the session.
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        // Only the line terminator goes; the rest is returned as typed.
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Prompter for interactive terminals, backed by `dialoguer`.
#[derive(Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter
    }
}

impl Prompter for TerminalPrompter {
    fn say(&mut self, text: &str) -> io::Result<()> {
        println!("{}", text);
        Ok(())
    }

    fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        // `allow_empty` hands blank lines back to us instead of re-asking,
        // so they surface as `EmptyInput`.
        match Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => Ok(Some(line)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            // An undecodable line is treated as blank so the caller re-prompts.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                log::debug!("Discarding undecodable input: {}", e);
                Ok(Some(String::new()))
            }
            Err(e) => Err(e),
        }
    }
}

/// What the user answered at the search prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// A non-blank search term, exactly as typed.
    Term(String),
    /// The exit keyword was typed or the input stream closed.
    Exit,
}

/// Ask for a search term.
///
/// Blank or whitespace-only lines fail with `SearchError::EmptyInput` so no
/// request is ever made for them. Anything else is returned untrimmed.
pub fn prompt_question<P: Prompter + ?Sized>(
    prompter: &mut P,
    label: &str,
) -> Result<Answer, SearchError> {
    let line = match prompter.ask(label)? {
        Some(line) => line,
        None => return Ok(Answer::Exit),
    };

    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case(EXIT_KEYWORD) {
        Ok(Answer::Exit)
    } else if trimmed.is_empty() {
        Err(SearchError::EmptyInput)
    } else {
        Ok(Answer::Term(line))
    }
}
