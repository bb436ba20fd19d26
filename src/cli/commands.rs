use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::Category;

#[derive(Parser)]
#[command(name = "alertbot")]
#[command(about = "Disaster-warning feed poller with Discord channel and DM notifications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the feeds and deliver new alerts until interrupted
    Run {
        /// Run a single poll cycle and exit
        #[arg(long)]
        once: bool,

        /// Dry run - don't send notifications, just show what would be sent
        #[arg(long)]
        dry_run: bool,
    },

    /// Opt a user in to direct-message alerts
    Subscribe {
        /// Discord user id
        user_id: u64,

        /// Categories to receive (global, regional); all when omitted
        #[arg(short, long = "category")]
        categories: Vec<Category>,
    },

    /// Opt a user out of direct-message alerts
    Unsubscribe {
        /// Discord user id
        user_id: u64,
    },

    /// Turn one alert category on or off for a subscriber
    Prefs {
        /// Discord user id
        user_id: u64,

        /// Category to change (global, regional)
        category: Category,

        #[arg(value_enum)]
        state: Toggle,
    },

    /// Send a category's alerts to a channel (administrators only)
    Bind {
        /// Category to route (global, regional)
        category: Category,

        /// Discord channel id
        channel_id: u64,

        /// Discord user id of the administrator making the change
        #[arg(long = "as", value_name = "USER_ID")]
        caller: u64,
    },

    /// Stop sending a category's alerts to its channel (administrators only)
    Unbind {
        /// Category to unroute (global, regional)
        category: Category,

        /// Discord user id of the administrator making the change
        #[arg(long = "as", value_name = "USER_ID")]
        caller: u64,
    },

    /// List subscribers and channel bindings
    List,

    /// List the polled feed sources
    Sources,

    /// Import subscribers and bindings from a JSON snapshot
    Import {
        /// Path to snapshot file
        path: String,
    },

    /// Export subscribers and bindings as a JSON snapshot
    Export {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}
