//! # Batch Orchestrator
//!
//! Runs the image pipeline over many URLs in fixed-size windows.
//!
//! - At most `max_items` URLs are processed; the rest are ignored
//! - Every pipeline in a window runs concurrently
//! - The next window starts once the whole window has settled and the
//!   pacing delay has elapsed; there is no delay after the last window
//! - A failing item is reported and never aborts the batch

use core_library::models::ImageRecord;
use core_runtime::config::BatchConfig;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::pipeline::ImagePipeline;

/// One URL that did not make it through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of a batch call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// URLs taken from the input, after the cap
    pub processed: usize,
    pub successful: Vec<ImageRecord>,
    pub failed: Vec<BatchFailure>,
}

pub struct BatchOrchestrator {
    pipeline: Arc<dyn ImagePipeline>,
    config: BatchConfig,
}

impl BatchOrchestrator {
    pub fn new(pipeline: Arc<dyn ImagePipeline>, config: BatchConfig) -> Self {
        Self {
            pipeline,
            config: BatchConfig {
                window_size: config.window_size.max(1),
                ..config
            },
        }
    }

    #[instrument(skip(self, urls), fields(requested = urls.len()))]
    pub async fn batch_fetch(&self, urls: &[String], user_id: &str) -> BatchReport {
        let urls = &urls[..urls.len().min(self.config.max_items)];
        let mut report = BatchReport {
            processed: urls.len(),
            ..BatchReport::default()
        };

        info!(processed = urls.len(), "Processing batch");

        let windows: Vec<&[String]> = urls.chunks(self.config.window_size).collect();
        let window_count = windows.len();

        for (index, window) in windows.into_iter().enumerate() {
            let results = join_all(
                window
                    .iter()
                    .map(|url| async move { (url, self.pipeline.process(url, user_id).await) }),
            )
            .await;

            for (url, result) in results {
                match result {
                    Ok(record) => report.successful.push(record),
                    Err(e) => {
                        warn!(url = %url, error = %e, "Batch item failed");
                        report.failed.push(BatchFailure {
                            url: url.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            if index + 1 < window_count {
                tokio::time::sleep(self.config.pacing_delay).await;
            }
        }

        info!(
            successful = report.successful.len(),
            failed = report.failed.len(),
            "Batch complete"
        );
        report
    }
}
