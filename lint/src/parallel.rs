//! Parallel task fan-out and result aggregation.
//!
//! Workers pull from a bounded multi-consumer queue and push results over a
//! channel; the caller joins the pool and collects. Exactly one task result
//! is produced per input task. Result ordering is not guaranteed.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::linter::LintResult;
use crate::linter::LintTask;
use crate::linter::Linter;
use crate::linter::TaskResult;

/// Fan-out executor with a fixed worker cap.
#[derive(Debug, Clone, Copy)]
pub struct ParallelExecutor {
    max_workers: usize,
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ParallelExecutor {
    /// `max_workers` of zero falls back to the hardware thread count.
    pub fn new(max_workers: usize) -> Self {
        let max_workers = if max_workers == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4)
        } else {
            max_workers
        };
        Self { max_workers }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every task, returning one result per task.
    ///
    /// Zero tasks short-circuit; a single task runs synchronously on the
    /// caller. Otherwise `min(max_workers, n)` workers drain a shared
    /// queue. Each worker observes cancellation before invoking the
    /// analyzer and emits a cancellation result once the token trips.
    pub async fn execute_tasks(
        &self,
        token: &CancellationToken,
        tasks: Vec<LintTask>,
    ) -> Vec<TaskResult> {
        match tasks.len() {
            0 => Vec::new(),
            1 => match tasks.into_iter().next() {
                Some(task) => vec![run_task(token, task).await],
                None => Vec::new(),
            },
            n => self.fan_out(token, tasks, n).await,
        }
    }

    async fn fan_out(
        &self,
        token: &CancellationToken,
        tasks: Vec<LintTask>,
        n: usize,
    ) -> Vec<TaskResult> {
        let workers = self.max_workers.min(n);
        let (task_tx, task_rx) = async_channel::bounded::<LintTask>(n);
        let (result_tx, mut result_rx) = tokio::sync::mpsc::channel::<TaskResult>(n);

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    while let Ok(task) = task_rx.recv().await {
                        let result = run_task(&token, task).await;
                        if result_tx.send(result).await.is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(result_tx);
        drop(task_rx);

        for task in tasks {
            // Capacity equals the task count, so enqueueing never blocks.
            if task_tx.send(task).await.is_err() {
                break;
            }
        }
        task_tx.close();

        join_all(handles).await;

        let mut results = Vec::with_capacity(n);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }
        results
    }

    /// Fan one file out over every analyzer that handles it.
    pub async fn execute_for_file(
        &self,
        token: &CancellationToken,
        linters: &[Arc<dyn Linter>],
        path: &Path,
        content: &Bytes,
    ) -> Vec<TaskResult> {
        let tasks: Vec<LintTask> = linters
            .iter()
            .filter(|linter| linter.can_handle(path))
            .map(|linter| LintTask {
                linter: linter.clone(),
                path: path.to_path_buf(),
                content: content.clone(),
            })
            .collect();

        self.execute_tasks(token, tasks).await
    }
}

async fn run_task(token: &CancellationToken, task: LintTask) -> TaskResult {
    let name = task.linter.name().to_string();

    if token.is_cancelled() {
        return TaskResult::err(name, anyhow::anyhow!("lint canceled"));
    }

    tracing::debug!(linter = %name, path = %task.path.display(), "running lint task");
    match task.linter.lint(token, &task.path, &task.content).await {
        Ok(result) => TaskResult::ok(name, result),
        Err(error) => TaskResult::err(name, error),
    }
}

/// Aggregated view over a set of task results.
#[derive(Debug)]
pub struct AggregateOutcome {
    pub result: LintResult,
    /// Analyzer errors, collected separately; they never flip `success`.
    pub errors: Vec<anyhow::Error>,
}

/// Fold task results into one lint result plus the error list.
///
/// Issues concatenate; `success` is the AND of contributing successes (an
/// empty input aggregates to success); `formatted` keeps the first
/// non-empty blob encountered; test outputs join with newlines.
pub fn aggregate_results(results: Vec<TaskResult>) -> AggregateOutcome {
    let mut aggregate = LintResult::clean();
    let mut errors = Vec::new();
    let mut test_outputs = Vec::new();

    for task_result in results {
        if let Some(error) = task_result.error {
            errors.push(error);
        }
        let Some(result) = task_result.result else {
            continue;
        };

        if !result.success {
            aggregate.success = false;
        }
        aggregate.issues.extend(result.issues);

        if aggregate.formatted.is_none()
            && let Some(formatted) = result.formatted
            && !formatted.is_empty()
        {
            aggregate.formatted = Some(formatted);
        }

        if let Some(output) = result.test_output
            && !output.is_empty()
        {
            test_outputs.push(output);
        }
    }

    if !test_outputs.is_empty() {
        aggregate.test_output = Some(test_outputs.join("\n"));
    }

    AggregateOutcome {
        result: aggregate,
        errors,
    }
}
