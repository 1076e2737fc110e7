// src/config.rs
// =============================================================================
// Configuration for every part of the scraper, with documented defaults.
//
// Nothing here reads the environment: main.rs fills these structs from the
// command line and passes them down explicitly. Tests build them directly.
// =============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

// Default timeout for any single fetch (page or image)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

// Default number of download workers
pub const DEFAULT_WORKERS: usize = 8;

// Default port for server mode
pub const DEFAULT_PORT: u16 = 5000;

// User-Agent sent by both the page client and the download client
pub fn default_user_agent() -> String {
    format!("image-scraper/{}", env!("CARGO_PKG_VERSION"))
}

// Settings for fetching the page to scrape
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Total time allowed for the page request, body included (default 15s)
    pub timeout: Duration,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

// Settings for the download worker pool
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory images are written into (default "images")
    pub output_dir: PathBuf,
    /// How many downloads may run at once (default 8, never less than 1)
    pub workers: usize,
    /// Time allowed for each image, body included (default 15s)
    pub timeout: Duration,
    /// User-Agent sent with every image request
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("images"),
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

impl DownloadConfig {
    // Zero workers would never drain the queue, so clamp to one
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

// Settings for server mode
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (default 0.0.0.0:5000)
    pub bind_address: SocketAddr,
    /// Deadline for handling one request end to end (default 15s)
    pub request_timeout: Duration,
    pub fetch: FetchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            request_timeout: DEFAULT_TIMEOUT,
            fetch: FetchConfig::default(),
        }
    }
}

// Settings for terminal mode
#[derive(Debug, Clone, Default)]
pub struct TerminalConfig {
    /// Stop the session on the first page that cannot be fetched
    /// (default false: print the failure and prompt again)
    pub exit_on_fetch_failure: bool,
    /// Print download outcomes as JSON instead of a table
    pub json: bool,
    pub fetch: FetchConfig,
    pub download: DownloadConfig,
}
