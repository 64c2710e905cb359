// Library root
// -----------
// This crate exposes a small library surface for the image lookup CLI. The
// binary (`main.rs`) wires these modules together into the interactive menu.
//
// Module responsibilities:
// - `config`: endpoint URLs, user agent and timeout read from the environment.
// - `error`: the tagged `SearchError` shared by every flow.
// - `prompt`: reading one line at a time from the user (stdio or terminal).
// - `api`: HTTP interactions with Wikipedia and Google Images.
// - `extract`: pulling the first image out of a Google results page.
// - `ui`: the menu loop that dispatches to the two search flows.
//
// The `Fetch` and `Prompter` traits are the seams that let the flows run
// against canned responses and scripted input in tests.
pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod ui;
