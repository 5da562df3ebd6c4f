//! Concurrent execution of the passive analyzer batch.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, warn};

use super::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};

/// Runs the selected analyzers on the blocking pool and collects their outputs.
///
/// An empty `selected` slice runs every analyzer. A failing (or panicking)
/// analyzer is logged and omitted; the rest of the batch is unaffected.
pub async fn run_passive(
    analyzers: &[Arc<dyn Analyzer>],
    selected: &[AnalyzerKind],
    ctx: &ExtractionContext,
) -> Vec<AnalyzerOutput> {
    let tasks = analyzers
        .iter()
        .filter(|a| selected.is_empty() || selected.contains(&a.kind()))
        .map(|analyzer| {
            let analyzer = Arc::clone(analyzer);
            let ctx = ctx.clone();
            let kind = analyzer.kind();
            let handle = tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                let result = analyzer.analyze(&ctx);
                (result, start.elapsed())
            });
            async move { (kind, handle.await) }
        });

    let mut outputs = Vec::new();
    for (kind, joined) in join_all(tasks).await {
        match joined {
            Ok((Ok(output), elapsed)) => {
                debug!(analyzer = %kind, pass = ?ctx.pass, ?elapsed, "analyzer finished");
                outputs.push(output);
            }
            Ok((Err(err), _)) => {
                warn!(analyzer = %kind, pass = ?ctx.pass, error = %err, "analyzer failed; skipping");
            }
            Err(err) => {
                warn!(analyzer = %kind, pass = ?ctx.pass, error = %err, "analyzer task aborted; skipping");
            }
        }
    }
    outputs
}
