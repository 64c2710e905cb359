// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, create an API client and a prompter,
//   then hand both to the menu loop.
// - Returns `anyhow::Result` so setup failures print with their context.

use std::io::{self, IsTerminal};

use env_logger::Env;
use image_lookup_cli::{
    api::ApiClient,
    prompt::{StdioPrompter, TerminalPrompter},
    ui::main_menu,
};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr and stay quiet unless RUST_LOG asks for more.
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    // Endpoints, user agent and timeout come from the environment.
    // See `config::Config::from_env`.
    let api = ApiClient::from_env()?;

    // Interactive terminals get dialoguer prompts; piped input is read line by line.
    if io::stdin().is_terminal() {
        main_menu(&mut TerminalPrompter::new(), &api)?;
    } else {
        let mut prompter = StdioPrompter::new(io::stdin().lock(), io::stdout());
        main_menu(&mut prompter, &api)?;
    }
    Ok(())
}
