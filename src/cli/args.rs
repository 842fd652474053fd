//! CLI argument parsing.
//!
//! Kept separate from `main.rs` so that parsing can be tested with any
//! iterator of strings.

use std::path::PathBuf;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
    /// Enable debug-level logging.
    pub verbose: bool,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a study
    Run {
        /// Path to the study YAML file.
        study_path: PathBuf,
        /// Force parallel execution.
        parallel: bool,
        /// Print JSON instead of a table.
        json: bool,
    },
    /// Run the built-in reference comparison
    Compare {
        /// Print JSON instead of a table.
        json: bool,
    },
    /// Validate a study YAML file
    Validate {
        /// Path to the study YAML file.
        study_path: PathBuf,
    },
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        let verbose = args.iter().skip(1).any(|a| a == "-v" || a == "--verbose");

        if args.len() < 2 {
            return Self {
                command: Command::Help,
                verbose,
            };
        }

        let command = match args[1].as_str() {
            "run" => Self::parse_run_command(args),
            "compare" => Command::Compare {
                json: has_flag(&args[2..], "--json"),
            },
            "validate" => Self::parse_validate_command(args),
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command, verbose }
    }

    fn parse_run_command(args: &[String]) -> Command {
        if args.len() < 3 || args[2].starts_with('-') {
            eprintln!("Error: 'run' command requires a study path");
            return Command::Help;
        }

        let flags = &args[3..];
        Command::Run {
            study_path: PathBuf::from(&args[2]),
            parallel: has_flag(flags, "--parallel"),
            json: has_flag(flags, "--json"),
        }
    }

    fn parse_validate_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'validate' command requires a study path");
            return Command::Help;
        }

        Command::Validate {
            study_path: PathBuf::from(&args[2]),
        }
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
