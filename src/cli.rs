//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default management API port.
pub const DEFAULT_PORT: u16 = 1337;

/// Default heartbeat interval (4 minutes keeps free-tier hosts awake).
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 240;

/// Server-side cookie persistence for a browser web proxy.
///
/// Cookies captured from tunneled responses are stored in a local file,
/// Appwrite, or Supabase, selected from the environment at startup.
#[derive(Parser, Debug)]
#[command(name = "cookie-relay")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Cookie file used when no document store is configured
    #[arg(long, env = "COOKIE_STORE_PATH", global = true)]
    pub store_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the management API
    Serve(ServeArgs),
    /// Inspect or edit a stored cookie jar
    Cookies {
        #[command(subcommand)]
        command: CookiesCommand,
    },
    /// Show which storage backend is active
    Status,
    /// Ping a running server so hosting platforms keep it awake
    Heartbeat(HeartbeatArgs),
}

/// Options for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Resolve users from bearer tokens via Supabase auth
    #[arg(long, env = "MULTI_USER")]
    pub multi_user: bool,
}

/// `cookies` subcommands.
#[derive(Subcommand, Debug)]
pub enum CookiesCommand {
    /// Print the jar as JSON
    List(UserArgs),
    /// Add or replace one cookie
    Set(SetCookieArgs),
    /// Remove one cookie
    Remove(RemoveCookieArgs),
    /// Wipe the whole jar
    Clear(UserArgs),
}

/// Selects whose jar a `cookies` subcommand touches.
#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    /// User id (defaults to the single-user jar)
    #[arg(long, default_value = cookie_relay::DEFAULT_USER)]
    pub user: String,
}

/// Options for `cookies set`.
#[derive(Args, Debug, Clone)]
pub struct SetCookieArgs {
    /// Cookie domain, e.g. example.com
    pub domain: String,
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,

    /// Cookie path
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Expiry timestamp (RFC 3339 or HTTP date)
    #[arg(long)]
    pub expires: Option<String>,

    /// Mark the cookie HttpOnly
    #[arg(long)]
    pub http_only: bool,

    /// Mark the cookie Secure
    #[arg(long)]
    pub secure: bool,

    /// SameSite attribute (Lax, Strict, None)
    #[arg(long)]
    pub same_site: Option<String>,

    #[command(flatten)]
    pub user: UserArgs,
}

/// Options for `cookies remove`.
#[derive(Args, Debug, Clone)]
pub struct RemoveCookieArgs {
    /// Cookie domain
    pub domain: String,
    /// Cookie name
    pub name: String,

    #[command(flatten)]
    pub user: UserArgs,
}

/// Options for `heartbeat`.
#[derive(Args, Debug, Clone)]
pub struct HeartbeatArgs {
    /// Base URL of the running server
    #[arg(long, env = "HEARTBEAT_URL", default_value = "http://127.0.0.1:1337")]
    pub url: String,

    /// Seconds between pings (10-3600)
    #[arg(long, default_value_t = DEFAULT_HEARTBEAT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(10..=3600))]
    pub interval_secs: u64,

    /// Ping once and exit
    #[arg(long)]
    pub once: bool,
}
