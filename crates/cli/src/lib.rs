pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cellarhand",
    about = "Cellarhand operator CLI",
    long_about = "Operate cellarhand readiness, config inspection, and one-shot cellar questions.",
    after_help = "Examples:\n  cellarhand doctor --json\n  cellarhand ask \"do we have chianti by the glass?\"\n  cellarhand fetch --limit 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate config, completion credential, and sheet connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Ask the cellar assistant one question from the terminal")]
    Ask {
        #[arg(help = "Free-text question for the assistant")]
        question: String,
    },
    #[command(about = "Fetch the live inventory and print formatted records")]
    Fetch {
        #[arg(long, help = "Maximum records to print")]
        limit: Option<usize>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { question } => commands::ask::run(&question),
        Command::Fetch { limit } => commands::fetch::run(limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
