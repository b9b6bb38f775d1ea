//! CLI command handlers, one file per command.

mod completions;
mod fetch;
mod probe;

pub use completions::{run_completions, run_man};
pub use fetch::{run_fetch, FetchArgs};
pub use probe::run_probe;

#[cfg(test)]
pub(crate) use fetch::build_fetch_config;
