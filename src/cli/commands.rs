use clap::{Parser, Subcommand, ValueEnum};

/// `chainpilot` - chat-driven tool chains for MCP administration backends.
#[derive(Parser, Debug)]
#[command(name = "chainpilot")]
#[command(version)]
#[command(about = "Plan and run backend tool chains from plain requests.", long_about = None)]
pub struct Cli {
    /// Debug logging and full step output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat loop against the configured backend
    Chat {
        /// Single message mode (don't enter interactive mode)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List the tools the backend offers
    Tools,

    /// Invoke one backend tool directly, bypassing the planner
    Call {
        /// Tool name as listed by `chainpilot tools`
        tool: String,

        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },

    /// Connect to the backend and report connection status
    Status,

    /// Show or edit stored scope and update-set preferences
    Prefs {
        #[command(subcommand)]
        prefs_command: PrefsCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Print the stored preferences
    Show,
    /// Stop prompting and reuse the current selection
    Lock {
        #[arg(value_enum)]
        target: PrefsTarget,
    },
    /// Prompt again on the next state-changing request
    Unlock {
        #[arg(value_enum)]
        target: PrefsTarget,
    },
    /// Forget all stored selections and locks
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefsTarget {
    /// Application scope
    Scope,
    /// Update set
    Container,
}
