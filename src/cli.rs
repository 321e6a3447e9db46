//! CLI domain: parse, route and output only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod route;

pub use output::{format_job_text, format_report_text, map_error};
pub use parse::{Cli, Commands, ConfigCommands, JobCommands};
pub use route::RunContext;
