// src/download/dispatcher.rs
// =============================================================================
// This module downloads a list of image URLs with a fixed-size worker pool.
//
// How it works:
// 1. Every URL goes into one shared queue, tagged with its input index
// 2. N worker tasks (tokio::spawn, so they really run in parallel) pop
//    jobs until the queue is empty
// 3. Each job: GET, check 2xx, stream the body into "<name>.<index>.part",
//    then rename it to its final name
// 4. Every job sends exactly one DownloadOutcome back over a channel
// 5. We return once all workers have hung up
//
// A failed image is just a Failed outcome. Nothing is retried and no other
// job is affected. A CancellationToken lets the caller stop everything.
//
// Rust concepts:
// - Arc<Mutex<VecDeque>>: one queue, many owners, one popper at a time
// - mpsc channels: many workers send, one receiver collects (fan-in)
// - tokio::select!: race a download against cancellation
// - JoinSet: wait for spawned tasks and notice if one panicked
// =============================================================================

use super::naming::local_file_name;
use super::DownloadOutcome;
use crate::config::DownloadConfig;
use crate::error::DownloadError;
use futures::StreamExt;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

// One URL waiting to be downloaded
#[derive(Debug)]
struct Job {
    index: usize,
    url: Url,
}

type JobQueue = Arc<Mutex<VecDeque<Job>>>;

pub struct DownloadDispatcher {
    client: Client,
    config: DownloadConfig,
}

impl DownloadDispatcher {
    // Builds a dispatcher with its own client
    //
    // The client timeout covers each whole image, body included.
    pub fn new(config: DownloadConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    // Downloads every URL and returns one outcome per URL
    //
    // Parameters:
    //   urls: absolute image URLs; outcome.index refers to positions here
    //   cancel: when cancelled, running downloads stop and queued ones are
    //           reported as Cancelled
    //
    // Returns: exactly urls.len() outcomes, in completion order
    pub async fn download_all(
        &self,
        urls: Vec<Url>,
        cancel: &CancellationToken,
    ) -> Vec<DownloadOutcome> {
        let total = urls.len();
        if total == 0 {
            return Vec::new();
        }

        let originals: Vec<String> = urls.iter().map(Url::to_string).collect();
        let jobs: VecDeque<Job> = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| Job { index, url })
            .collect();

        let output_dir = self.config.output_dir.clone();
        if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
            warn!(dir = %output_dir.display(), error = %e, "cannot create output directory");
            let error = DownloadError::CreateDir(e);
            return jobs
                .into_iter()
                .map(|job| DownloadOutcome::failed(job.index, job.url, &error))
                .collect();
        }

        let queue: JobQueue = Arc::new(Mutex::new(jobs));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker_count = self.config.effective_workers().min(total);

        info!(total, workers = worker_count, dir = %output_dir.display(), "starting downloads");

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                outcomes: tx.clone(),
                client: self.client.clone(),
                output_dir: output_dir.clone(),
                cancel: cancel.clone(),
            };
            workers.spawn(worker.run());
        }

        // Only the workers hold senders now, so recv() ends when they all exit
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "download worker stopped abnormally");
            }
        }

        if outcomes.len() < total {
            fill_missing(&mut outcomes, originals);
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(total, succeeded, failed = total - succeeded, "downloads finished");

        outcomes
    }
}

struct Worker {
    id: usize,
    queue: JobQueue,
    outcomes: mpsc::UnboundedSender<DownloadOutcome>,
    client: Client,
    output_dir: PathBuf,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        while let Some(job) = self.next_job() {
            let result = if self.cancel.is_cancelled() {
                Err(DownloadError::Cancelled)
            } else {
                tokio::select! {
                    _ = self.cancel.cancelled() => Err(DownloadError::Cancelled),
                    result = download_one(&self.client, &job, &self.output_dir) => result,
                }
            };

            let outcome = match result {
                Ok((path, bytes)) => {
                    debug!(worker = self.id, url = %job.url, path = %path.display(), bytes, "downloaded");
                    DownloadOutcome::success(job.index, job.url, path, bytes)
                }
                Err(error) => {
                    if matches!(error, DownloadError::Cancelled) {
                        // The download future was dropped mid-write
                        let _ = tokio::fs::remove_file(partial_path(&self.output_dir, &job)).await;
                    }
                    warn!(worker = self.id, url = %job.url, error = %error, "download failed");
                    DownloadOutcome::failed(job.index, job.url, &error)
                }
            };

            if self.outcomes.send(outcome).is_err() {
                // Receiver gone: nobody is waiting for results any more
                break;
            }
        }
    }

    // The lock is held only for the pop, never across an await
    fn next_job(&self) -> Option<Job> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

// Downloads one image and returns where it was written and its size
async fn download_one(
    client: &Client,
    job: &Job,
    output_dir: &Path,
) -> Result<(PathBuf, u64), DownloadError> {
    let response = client
        .get(job.url.clone())
        .send()
        .await
        .map_err(DownloadError::from_request)?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status));
    }

    let final_path = output_dir.join(local_file_name(&job.url));
    let partial = partial_path(output_dir, job);

    let written = match write_body(response, &partial).await {
        Ok(bytes) => tokio::fs::rename(&partial, &final_path)
            .await
            .map(|()| bytes)
            .map_err(DownloadError::Write),
        Err(e) => Err(e),
    };

    if written.is_err() {
        let _ = tokio::fs::remove_file(&partial).await;
    }

    written.map(|bytes| (final_path, bytes))
}

// Streams the response body into a file, chunk by chunk
async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DownloadError::from_body)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

// A worker that panicked took its job (and maybe the rest of the queue)
// with it; report those URLs as WorkerLost instead of losing them
fn fill_missing(outcomes: &mut Vec<DownloadOutcome>, originals: Vec<String>) {
    let reported: HashSet<usize> = outcomes.iter().map(|o| o.index).collect();
    for (index, url) in originals.into_iter().enumerate() {
        if !reported.contains(&index) {
            outcomes.push(DownloadOutcome::failed(index, url, &DownloadError::WorkerLost));
        }
    }
}

// The index keeps two jobs for the same URL from sharing a temp file
fn partial_path(output_dir: &Path, job: &Job) -> PathBuf {
    output_dir.join(format!("{}.{}.part", local_file_name(&job.url), job.index))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why spawn workers instead of buffer_unordered?
//    - buffer_unordered polls every future from ONE task
//    - tokio::spawn puts each worker on the multi-threaded runtime, so
//      downloads and disk writes really happen in parallel
//
// 2. Why a std Mutex in async code?
//    - We only lock to pop one item and never .await while holding it
//    - For short critical sections like that, std::sync::Mutex is fine
//
// 3. Why write to ".part" first?
//    - A download that fails halfway never leaves a truncated image under
//      the real name; rename() only happens after the last byte is written
//
// 4. How do we know every URL got an outcome?
//    - Each job sends exactly one outcome before its worker takes the next
//    - When all senders are dropped, recv() returns None
//    - Anything still missing (a panicked worker) is filled in as WorkerLost
// -----------------------------------------------------------------------------
