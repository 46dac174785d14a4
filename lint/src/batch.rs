//! Batch dispatch.
//!
//! Analyzers that expose the batch capability run once over their filtered
//! slice of the file set; everything else fans out per file through the
//! parallel executor. The output map is built concurrently behind a single
//! mutex.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::linter::Linter;
use crate::linter::TaskResult;
use crate::parallel::ParallelExecutor;

/// Run every analyzer over `files`, batching where supported.
///
/// Returns one entry per path that at least one analyzer handled, each
/// holding the task results contributed by batching and regular analyzers
/// alike.
pub async fn execute_batch(
    executor: &ParallelExecutor,
    token: &CancellationToken,
    linters: &[Arc<dyn Linter>],
    files: &BTreeMap<PathBuf, Bytes>,
) -> HashMap<PathBuf, Vec<TaskResult>> {
    let output: Mutex<HashMap<PathBuf, Vec<TaskResult>>> = Mutex::new(HashMap::new());

    let (batching, regular): (Vec<_>, Vec<_>) = linters
        .iter()
        .cloned()
        .partition(|linter| linter.as_batch().is_some());

    let mut jobs: Vec<BoxFuture<'_, ()>> = Vec::new();

    for linter in &batching {
        let subset: BTreeMap<PathBuf, Bytes> = files
            .iter()
            .filter(|(path, _)| linter.can_handle(path))
            .map(|(path, content)| (path.clone(), content.clone()))
            .collect();
        if subset.is_empty() {
            continue;
        }

        let linter = linter.clone();
        let output = &output;
        jobs.push(Box::pin(async move {
            let name = linter.name().to_string();
            let Some(batch) = linter.as_batch() else {
                return;
            };

            match batch.lint_batch(token, &subset).await {
                Ok(results) => {
                    let mut output = output.lock().expect("Failed to acquire batch output lock");
                    for (path, result) in results {
                        output
                            .entry(path)
                            .or_default()
                            .push(TaskResult::ok(name.clone(), result));
                    }
                }
                Err(error) => {
                    // One error-bearing result per file in the batch.
                    let message = format!("{error:#}");
                    let mut output = output.lock().expect("Failed to acquire batch output lock");
                    for path in subset.keys() {
                        output
                            .entry(path.clone())
                            .or_default()
                            .push(TaskResult::err(name.clone(), anyhow::anyhow!(message.clone())));
                    }
                }
            }
        }));
    }

    if !regular.is_empty() {
        for (path, content) in files {
            let regular = &regular;
            let output = &output;
            jobs.push(Box::pin(async move {
                let results = executor
                    .execute_for_file(token, regular, path, content)
                    .await;
                if results.is_empty() {
                    return;
                }
                output
                    .lock()
                    .expect("Failed to acquire batch output lock")
                    .entry(path.clone())
                    .or_default()
                    .extend(results);
            }));
        }
    }

    join_all(jobs).await;
    output
        .into_inner()
        .expect("Failed to acquire batch output lock")
}
