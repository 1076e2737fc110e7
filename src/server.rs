// src/server.rs
// =============================================================================
// Server mode: a single JSON endpoint over the scrape pipeline.
//
//   GET /scraper?url=<page-url>  ->  200 {"imgs": ["https://...", ...]}
//
// The answer is always 200 with a JSON body. A missing, empty, malformed or
// unfetchable url (or one that takes longer than the request timeout)
// yields {"imgs":[]}. Images are NOT downloaded in this mode; only their
// absolute URLs are returned.
// =============================================================================

use crate::config::ServerConfig;
use crate::scrape::{build_client, is_well_formed_url, scrape_image_urls};
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
pub struct ScraperQuery {
    url: Option<String>,
}

// Response body for /scraper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImgUrlResponse {
    pub imgs: Vec<String>,
}

#[derive(Clone)]
struct AppState {
    client: Client,
    request_timeout: Duration,
}

pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let client = build_client(&config.fetch).context("failed to build HTTP client")?;
        let state = AppState {
            client,
            request_timeout: config.request_timeout,
        };

        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/scraper", get(scraper_handler))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    // Binds and serves until the process is stopped
    //
    // Failing to bind is the one error that ends server mode.
    pub async fn run(self) -> Result<()> {
        let address = self.config.bind_address;
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        info!(address = %address, "server listening");
        println!("Server is listening on {}", address);

        axum::serve(listener, self.router())
            .await
            .context("server stopped unexpectedly")?;

        Ok(())
    }
}

// A query string that doesn't deserialize is treated like a missing url
async fn scraper_handler(
    State(state): State<AppState>,
    query: Option<Query<ScraperQuery>>,
) -> Json<ImgUrlResponse> {
    let page_url = query.and_then(|Query(q)| q.url).unwrap_or_default();

    if !is_well_formed_url(&page_url) {
        debug!(url = %page_url, "no usable url supplied");
        return Json(ImgUrlResponse { imgs: Vec::new() });
    }

    let imgs = find_images(&state, &page_url).await;
    Json(ImgUrlResponse { imgs })
}

async fn find_images(state: &AppState, page_url: &str) -> Vec<String> {
    let scrape = scrape_image_urls(&state.client, page_url);

    match tokio::time::timeout(state.request_timeout, scrape).await {
        Ok(Ok(urls)) => urls.into_iter().map(String::from).collect(),
        Ok(Err(e)) => {
            warn!(url = %page_url, error = %e, "could not scrape page");
            Vec::new()
        }
        Err(_) => {
            warn!(url = %page_url, timeout = ?state.request_timeout, "scrape timed out");
            Vec::new()
        }
    }
}
