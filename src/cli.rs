// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two modes, one per subcommand:
// - terminal: prompt for page URLs and download their images to disk
// - server:   answer GET /scraper?url=... with the page's image URLs
//
// Every flag has a default, so `image-scraper terminal` and
// `image-scraper server` are enough to get going.
// =============================================================================

use crate::config::{
    DownloadConfig, FetchConfig, ServerConfig, TerminalConfig, DEFAULT_PORT, DEFAULT_WORKERS,
};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "image-scraper",
    version,
    about = "Scrape a web page for images and download them",
    long_about = "image-scraper finds the images on a web page. In terminal mode it downloads \
                  them into a local directory; in server mode it returns their URLs as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prompt for page URLs and download every image found
    ///
    /// Type a URL and press enter; type q to quit.
    Terminal {
        /// Directory images are saved into
        #[arg(long, default_value = "images")]
        output_dir: PathBuf,

        /// Maximum number of images downloaded at the same time
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Timeout in seconds for each page and each image
        #[arg(long, default_value_t = 15)]
        timeout_secs: u64,

        /// Stop the session at the first page that can't be fetched
        /// (default: report it and ask for another URL)
        #[arg(long)]
        exit_on_error: bool,

        /// Print download results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Serve GET /scraper?url=<page-url> returning {"imgs": [...]}
    Server {
        /// Address to listen on
        #[arg(long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
        bind: SocketAddr,

        /// Timeout in seconds for the page fetch and for each request
        #[arg(long, default_value_t = 15)]
        timeout_secs: u64,
    },
}

impl Commands {
    // Settings for terminal mode, or None for the server subcommand
    pub fn terminal_config(&self) -> Option<TerminalConfig> {
        match self {
            Commands::Terminal {
                output_dir,
                workers,
                timeout_secs,
                exit_on_error,
                json,
            } => {
                let timeout = Duration::from_secs(*timeout_secs);
                let fetch = FetchConfig {
                    timeout,
                    ..FetchConfig::default()
                };
                let download = DownloadConfig {
                    output_dir: output_dir.clone(),
                    workers: *workers,
                    timeout,
                    user_agent: fetch.user_agent.clone(),
                };
                Some(TerminalConfig {
                    exit_on_fetch_failure: *exit_on_error,
                    json: *json,
                    fetch,
                    download,
                })
            }
            Commands::Server { .. } => None,
        }
    }

    pub fn server_config(&self) -> Option<ServerConfig> {
        match self {
            Commands::Server { bind, timeout_secs } => {
                let timeout = Duration::from_secs(*timeout_secs);
                Some(ServerConfig {
                    bind_address: *bind,
                    request_timeout: timeout,
                    fetch: FetchConfig {
                        timeout,
                        ..FetchConfig::default()
                    },
                })
            }
            Commands::Terminal { .. } => None,
        }
    }
}
