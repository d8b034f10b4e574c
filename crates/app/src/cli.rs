//! Command-line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cityportal", about = "City Portal session client", version)]
pub struct Cli {
    /// TOML config file (default: ./cityportal.toml when present)
    #[arg(long, env = "CITYPORTAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output from the portal crates (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and keep the session for later commands
    Login {
        /// Login handle
        username: String,
        /// Password ($CITYPORTAL_PASSWORD)
        #[arg(long, env = "CITYPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account; sign in afterwards with `login`
    Register {
        /// Login handle
        username: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Password ($CITYPORTAL_PASSWORD)
        #[arg(long, env = "CITYPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role to request; repeatable
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show what the portal would display for a view, e.g. `/admin/users`
    Open {
        /// View path
        path: String,
    },
    /// Read a backend path or absolute URL and print the JSON body
    Get {
        /// Path such as `/api/city-stats`
        path: String,
        /// Print `null` instead of failing when the backend answers 401
        #[arg(long)]
        tolerate_unauthorized: bool,
    },
    /// Headline city statistics
    Stats,
    /// Emergency alerts
    Alerts,
    /// City services
    Services,
    /// Recent activities
    Activities,
    /// Traffic overview
    Traffic,
    /// Healthcare facilities and emergency readiness
    Healthcare,
    /// Safety zones, helplines and safe routes
    Safety,
    /// Points of interest on the city map
    Map,
    /// Every portal user (admins only)
    Users,
    /// Scrapbook memories
    Scrapbook {
        #[command(subcommand)]
        action: ScrapbookAction,
    },
}

#[derive(Subcommand)]
pub enum ScrapbookAction {
    /// List entries, your own by default
    List {
        /// List public entries instead
        #[arg(long)]
        public: bool,
    },
    /// Save a new memory
    Add {
        /// Title
        title: String,
        /// Body text
        content: String,
        /// Where it happened
        #[arg(long)]
        location: Option<String>,
        /// Image URL
        #[arg(long)]
        image_url: Option<String>,
        /// Share with everyone
        #[arg(long)]
        public: bool,
    },
    /// Delete one of your memories
    Delete {
        /// Entry id
        id: i64,
    },
}
