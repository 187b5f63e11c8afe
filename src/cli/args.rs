use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a config file (defaults to ./config.toml, then built-in defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the streaming relay server
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Chat interactively with the relay
    Chat {
        /// Chat endpoint URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// Send a single question and print the streamed reply
    Ask {
        /// Chat endpoint URL
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Your question
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Manage the quick-question list
    Questions {
        #[command(subcommand)]
        action: QuestionAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum QuestionAction {
    /// Show all quick questions
    List,
    /// Add a custom question
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Delete a custom question by id
    Remove { id: String },
}
