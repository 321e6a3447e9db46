//! CLI parse: clap types for Cruciverb. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cruciverb CLI - staged crossword construction and validation
#[derive(Parser)]
#[command(name = "cruciverb")]
#[command(about = "Build crossword puzzles stage by stage and score them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config/ is read from here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Construct a puzzle for a theme
    Construct {
        /// Puzzle theme
        theme: String,
        /// Grid size, e.g. 15x15 or 5
        #[arg(long)]
        size: Option<String>,
        /// Difficulty, monday through sunday
        #[arg(long, default_value = "wednesday")]
        difficulty: String,
        /// Theme word to feature (repeatable)
        #[arg(long = "theme-word")]
        theme_words: Vec<String>,
        /// Attempts per generation stage
        #[arg(long)]
        max_retries: Option<u32>,
        /// Minimum accepted quality score
        #[arg(long)]
        threshold: Option<f64>,
        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Write the finished puzzle as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate a puzzle JSON file and print its quality report
    Validate {
        /// Puzzle file
        puzzle: PathBuf,
        /// Word list for dictionary checks (overrides [lexicon] path)
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect archived jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum JobCommands {
    /// Show one archived job record
    Show {
        job_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List archived jobs, newest first
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Drop archived jobs older than the retention window
    Prune,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Check the effective configuration and report every problem
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_construct_with_repeated_theme_words() {
        let cli = Cli::try_parse_from([
            "cruciverb",
            "construct",
            "Space",
            "--size",
            "5x5",
            "--theme-word",
            "ORBIT",
            "--theme-word",
            "COMET",
        ])
        .unwrap();
        match cli.command {
            Commands::Construct {
                theme,
                size,
                theme_words,
                difficulty,
                ..
            } => {
                assert_eq!(theme, "Space");
                assert_eq!(size.as_deref(), Some("5x5"));
                assert_eq!(theme_words, vec!["ORBIT", "COMET"]);
                assert_eq!(difficulty, "wednesday");
            }
            _ => panic!("expected construct"),
        }
    }

    #[test]
    fn global_flags_precede_subcommands() {
        let cli = Cli::try_parse_from([
            "cruciverb",
            "--verbose",
            "--log-format",
            "json",
            "config",
            "show",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_format.as_deref(), Some("json"));
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Show
            }
        ));
    }
}
