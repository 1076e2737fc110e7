// src/terminal.rs
// =============================================================================
// Terminal mode: read page URLs line by line and download their images.
//
// Session rules:
// - "q" says goodbye and ends the session
// - blank lines just prompt again
// - anything else is a page URL: scrape it, download every image, print a
//   results table (or JSON), prompt again
// - a page that can't be fetched prints "Something went wrong: <why>" and
//   prompts again, unless exit_on_fetch_failure is set, in which case the
//   session ends there
// - cancelling the token (Ctrl-C in main.rs) stops in-flight downloads and
//   ends the session
//
// The loop is generic over its input and output so tests can drive it with
// byte slices instead of a real terminal.
// =============================================================================

use crate::config::TerminalConfig;
use crate::download::{sort_by_index, DownloadDispatcher, DownloadOutcome, DownloadStatus, DownloadSummary};
use crate::scrape::{build_client, scrape_image_urls};
use anyhow::{Context, Result};
use reqwest::Client;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::warn;

const FIRST_PROMPT: &str = "Enter url ";
const NEXT_PROMPT: &str = "Enter another url or press q to QUIT ";
const FAREWELL: &str = "Bye | (• ◡•)| (❍ᴥ❍ʋ)";

// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed "q"
    Quit,
    /// Input reached end of file
    InputClosed,
    /// A page couldn't be fetched and exit_on_fetch_failure is set
    FetchFailed,
    /// The cancellation token fired
    Interrupted,
}

// What happened to one page
enum PageStatus {
    Done,
    FetchFailed,
    Interrupted,
}

pub struct TerminalSession {
    config: TerminalConfig,
    client: Client,
    dispatcher: DownloadDispatcher,
    cancel: CancellationToken,
}

impl TerminalSession {
    pub fn new(config: TerminalConfig, cancel: CancellationToken) -> Result<Self> {
        let client = build_client(&config.fetch).context("failed to build HTTP client")?;
        let dispatcher = DownloadDispatcher::new(config.download.clone())
            .context("failed to build download client")?;

        Ok(Self {
            config,
            client,
            dispatcher,
            cancel,
        })
    }

    // Runs the prompt loop until "q", end of input, a fatal fetch failure
    // or cancellation
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        prompt(out, FIRST_PROMPT)?;
        let mut lines = input.lines();

        loop {
            let line = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    writeln!(out)?;
                    writeln!(out, "Interrupted")?;
                    return Ok(SessionEnd::Interrupted);
                }
                line = lines.next_line() => line.context("failed to read input")?,
            };

            let Some(line) = line else {
                return Ok(SessionEnd::InputClosed);
            };

            let line = line.trim();
            if line == "q" {
                writeln!(out, "{}", FAREWELL)?;
                return Ok(SessionEnd::Quit);
            }

            if line.is_empty() {
                prompt(out, FIRST_PROMPT)?;
                continue;
            }

            match self.process_page(line, out).await? {
                PageStatus::Done => {}
                PageStatus::FetchFailed if self.config.exit_on_fetch_failure => {
                    return Ok(SessionEnd::FetchFailed);
                }
                PageStatus::FetchFailed => {}
                PageStatus::Interrupted => {
                    writeln!(out, "Interrupted")?;
                    return Ok(SessionEnd::Interrupted);
                }
            }

            prompt(out, NEXT_PROMPT)?;
        }
    }

    async fn process_page<W: Write>(&self, page_url: &str, out: &mut W) -> Result<PageStatus> {
        let scraped = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(PageStatus::Interrupted),
            scraped = scrape_image_urls(&self.client, page_url) => scraped,
        };

        let urls = match scraped {
            Ok(urls) => urls,
            Err(e) => {
                warn!(url = %page_url, error = %e, "page fetch failed");
                writeln!(out, "Something went wrong: {}", e)?;
                return Ok(PageStatus::FetchFailed);
            }
        };

        if urls.is_empty() {
            writeln!(out, "No images found on {}", page_url)?;
            return Ok(PageStatus::Done);
        }

        writeln!(
            out,
            "Found {} image(s), saving to {}",
            urls.len(),
            self.dispatcher.config().output_dir.display()
        )?;

        let mut outcomes = self.dispatcher.download_all(urls, &self.cancel).await;
        sort_by_index(&mut outcomes);

        if self.config.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&outcomes)?)?;
        } else {
            print_table(out, &outcomes)?;
        }

        if self.cancel.is_cancelled() {
            Ok(PageStatus::Interrupted)
        } else {
            Ok(PageStatus::Done)
        }
    }
}

fn prompt<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    write!(out, "{}", text)?;
    out.flush()
}

// Prints outcomes as a human-readable table
fn print_table<W: Write>(out: &mut W, outcomes: &[DownloadOutcome]) -> std::io::Result<()> {
    writeln!(out, "{:<60} {:<10} {}", "URL", "STATUS", "DETAIL")?;
    writeln!(out, "{}", "=".repeat(100))?;

    for outcome in outcomes {
        // Truncate URL if too long for display
        let url_display = if outcome.url.chars().count() > 57 {
            format!("{}...", outcome.url.chars().take(57).collect::<String>())
        } else {
            outcome.url.clone()
        };

        let (status, detail) = match &outcome.status {
            DownloadStatus::Success { local_path, .. } => {
                ("OK", local_path.display().to_string())
            }
            DownloadStatus::Failed { reason, .. } => ("FAILED", reason.clone()),
        };

        writeln!(out, "{:<60} {:<10} {}", url_display, status, detail)?;
    }

    let summary = DownloadSummary::from_outcomes(outcomes);
    writeln!(out)?;
    writeln!(
        out,
        "Downloaded: {}  Failed: {}  Total: {}",
        summary.succeeded, summary.failed, summary.total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownloadConfig;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(dir: &TempDir, exit_on_fetch_failure: bool, json: bool) -> TerminalSession {
        let config = TerminalConfig {
            exit_on_fetch_failure,
            json,
            download: DownloadConfig {
                output_dir: dir.path().join("images"),
                workers: 2,
                timeout: Duration::from_secs(5),
                ..DownloadConfig::default()
            },
            ..TerminalConfig::default()
        };
        TerminalSession::new(config, CancellationToken::new()).unwrap()
    }

    async fn run(session: &TerminalSession, input: &str) -> (SessionEnd, String) {
        let mut out = Vec::new();
        let end = session.run(input.as_bytes(), &mut out).await.unwrap();
        (end, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_quit() {
        let dir = TempDir::new().unwrap();
        let (end, output) = run(&session(&dir, false, false), "q\n").await;

        assert_eq!(end, SessionEnd::Quit);
        assert!(output.starts_with(FIRST_PROMPT));
        assert!(output.contains(FAREWELL));
    }

    #[tokio::test]
    async fn test_input_closed_and_blank_lines() {
        let dir = TempDir::new().unwrap();
        let (end, output) = run(&session(&dir, false, false), "\n   \n").await;

        assert_eq!(end, SessionEnd::InputClosed);
        assert_eq!(output.matches(FIRST_PROMPT).count(), 3);
        assert!(!output.contains("Something went wrong"));
    }

    #[tokio::test]
    async fn test_failed_fetch_reprompts_by_default() {
        let dir = TempDir::new().unwrap();
        let (end, output) = run(&session(&dir, false, false), "not a url\nq\n").await;

        assert_eq!(end, SessionEnd::Quit);
        assert!(output.contains("Something went wrong"));
        assert!(output.contains(NEXT_PROMPT));
        assert!(output.contains(FAREWELL));
    }

    #[tokio::test]
    async fn test_failed_fetch_can_end_session() {
        let dir = TempDir::new().unwrap();
        let (end, output) = run(&session(&dir, true, false), "http://127.0.0.1:1/\nq\n").await;

        assert_eq!(end, SessionEnd::FetchFailed);
        assert!(output.contains("Something went wrong"));
        assert!(!output.contains(FAREWELL));
    }

    #[tokio::test]
    async fn test_scrape_and_download_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<img src="/ok.png"><img src="/gone.png"><img src="data:image/gif;base64,R0lG">"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 32]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let input = format!("{}/page\nq\n", server.uri());
        let (end, output) = run(&session(&dir, false, false), &input).await;

        assert_eq!(end, SessionEnd::Quit);
        assert!(output.contains("Found 2 image(s)"));
        assert!(output.contains("Downloaded: 1  Failed: 1  Total: 2"));

        let saved: Vec<_> = std::fs::read_dir(dir.path().join("images"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(saved.len(), 1);
        assert_eq!(std::fs::read(&saved[0]).unwrap(), vec![9u8; 32]);
    }

    #[tokio::test]
    async fn test_json_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<img src="a.png">"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8]))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let input = format!("{}/\nq\n", server.uri());
        let (_, output) = run(&session(&dir, false, true), &input).await;

        assert!(output.contains(r#""status": "success""#));
        assert!(output.contains(r#""bytes": 1"#));
    }

    #[tokio::test]
    async fn test_page_without_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>text only</p>"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let input = format!("{}\nq\n", server.uri());
        let (end, output) = run(&session(&dir, false, false), &input).await;

        assert_eq!(end, SessionEnd::Quit);
        assert!(output.contains("No images found"));
    }

    #[tokio::test]
    async fn test_cancelled_session_stops() {
        let dir = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        let session = TerminalSession::new(
            TerminalConfig {
                download: DownloadConfig {
                    output_dir: dir.path().to_path_buf(),
                    ..DownloadConfig::default()
                },
                ..TerminalConfig::default()
            },
            cancel.clone(),
        )
        .unwrap();

        cancel.cancel();
        let (end, output) = run(&session, "https://example.com/\n").await;

        assert_eq!(end, SessionEnd::Interrupted);
        assert!(output.contains("Interrupted"));
    }
}
