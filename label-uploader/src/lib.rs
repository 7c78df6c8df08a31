pub mod cli;
pub mod load_config;
pub mod providers;

pub use cli::{run, Cli, Commands};
