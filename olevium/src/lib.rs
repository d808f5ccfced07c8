pub mod commands;
pub mod logging;
mod output;

pub use commands::{parse_args, Command, Executor, PasswordSource, PromptPassword, USAGE};
