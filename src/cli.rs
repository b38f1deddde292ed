//! CLI domain: parse, route and output only.
//! Session orchestration lives in `host`; the route table dispatches to it.

mod output;
mod parse;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use route::RunContext;
