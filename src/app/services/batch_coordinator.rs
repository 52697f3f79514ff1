//! Sequential batch execution with partial-failure tolerance
//!
//! Items are split into fixed-size chunks that are handed to an async
//! processor one at a time. A chunk whose processor returns an error is
//! recorded as a fully failed [`BatchResult`] and the next chunk is still
//! attempted. An optional cancellation token is checked between chunks only.

use serde::Serialize;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Result;

/// Outcome of one chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult<O> {
    /// 1-based chunk number
    pub batch_number: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Records produced by the chunk (e.g. saved notes)
    #[serde(skip)]
    pub outputs: Vec<O>,
}

impl<O> BatchResult<O> {
    /// Successful chunk producing `outputs`
    pub fn completed(batch_number: usize, outputs: Vec<O>) -> Self {
        Self {
            batch_number,
            processed: outputs.len(),
            successful: outputs.len(),
            failed: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            outputs,
        }
    }

    /// Chunk whose processor failed; every item counts as failed
    pub fn failure(batch_number: usize, size: usize, message: impl Into<String>) -> Self {
        Self {
            batch_number,
            processed: size,
            successful: 0,
            failed: size,
            errors: vec![message.into()],
            warnings: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failed > 0 && self.successful == 0
    }
}

/// Results of a coordinated run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun<O> {
    pub results: Vec<BatchResult<O>>,
    /// Cancellation was observed before all chunks ran
    pub cancelled: bool,
    /// Items in chunks that were never attempted
    pub unattempted: usize,
}

impl<O> BatchRun<O> {
    pub fn successful(&self) -> usize {
        self.results.iter().map(|r| r.successful).sum()
    }
}

/// Runs chunks strictly one after another
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    batch_size: usize,
    cancellation: Option<CancellationToken>,
}

impl BatchCoordinator {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size)
    }

    /// Process `items` chunk by chunk
    ///
    /// `processor` receives each chunk and its 1-based number; `on_batch` is
    /// called after every chunk with the result and the number of chunks done
    /// and total.
    pub async fn run<T, O, F, Fut>(
        &self,
        items: Vec<T>,
        mut processor: F,
        mut on_batch: impl FnMut(&BatchResult<O>, usize, usize),
    ) -> BatchRun<O>
    where
        F: FnMut(Vec<T>, usize) -> Fut,
        Fut: Future<Output = Result<BatchResult<O>>>,
    {
        let total_items = items.len();
        let total_batches = self.batch_count(total_items);
        let mut results = Vec::with_capacity(total_batches);
        let mut consumed = 0;
        let mut remaining = items.into_iter();

        info!(
            "Processing {} items in {} batches of up to {}",
            total_items, total_batches, self.batch_size
        );

        for index in 0..total_batches {
            if self.is_cancelled() {
                warn!(
                    "Batch processing cancelled before batch {}/{}",
                    index + 1,
                    total_batches
                );
                return BatchRun {
                    results,
                    cancelled: true,
                    unattempted: total_items - consumed,
                };
            }

            let chunk: Vec<T> = remaining.by_ref().take(self.batch_size).collect();
            let size = chunk.len();
            consumed += size;
            let batch_number = index + 1;

            let result = match processor(chunk, batch_number).await {
                Ok(mut result) => {
                    result.batch_number = batch_number;
                    debug!(
                        "Batch {}/{}: {} successful, {} failed",
                        batch_number, total_batches, result.successful, result.failed
                    );
                    result
                }
                Err(e) => {
                    warn!("Batch {}/{} failed: {}", batch_number, total_batches, e);
                    BatchResult::failure(batch_number, size, e.to_string())
                }
            };

            on_batch(&result, batch_number, total_batches);
            results.push(result);
        }

        BatchRun {
            results,
            cancelled: false,
            unattempted: 0,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Process `items` in chunks of `batch_size`, continuing past failed chunks
pub async fn process_batch<T, O, F, Fut>(
    items: Vec<T>,
    batch_size: usize,
    processor: F,
) -> Vec<BatchResult<O>>
where
    F: FnMut(Vec<T>, usize) -> Fut,
    Fut: Future<Output = Result<BatchResult<O>>>,
{
    BatchCoordinator::new(batch_size)
        .run(items, processor, |_, _, _| {})
        .await
        .results
}
