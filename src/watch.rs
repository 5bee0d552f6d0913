use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::lookup::{LookupOutcome, LookupService};

/// Runs a lookup for each line of `input` once it has been left alone for
/// `debounce`, and hands finished outcomes to `report`.
///
/// A line replaced within the debounce window is never looked up. A lookup
/// overtaken by a newer one is never reported, whether the service cancelled
/// it or its answer simply arrived late. Returns once `input` is exhausted and
/// every outstanding lookup has settled.
pub async fn watch_lines<R, F>(
    service: Arc<LookupService>,
    input: R,
    debounce: Duration,
    mut report: F,
) where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str, &LookupOutcome),
{
    let mut lines = input.lines();
    let mut open = true;
    let mut pending: Option<String> = None;
    let deadline = tokio::time::sleep(debounce);
    tokio::pin!(deadline);

    let mut lookups = JoinSet::new();
    let mut issued: u64 = 0;
    let mut shown: u64 = 0;

    loop {
        tokio::select! {
            line = lines.next_line(), if open => match line {
                Ok(Some(line)) => {
                    pending = Some(line);
                    deadline.as_mut().reset(Instant::now() + debounce);
                }
                Ok(None) => open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read input");
                    open = false;
                }
            },
            () = &mut deadline, if pending.is_some() => {
                if let Some(query) = pending.take() {
                    issued += 1;
                    let seq = issued;
                    let service = Arc::clone(&service);
                    lookups.spawn(async move {
                        let outcome = service.lookup(&query).await;
                        (seq, query, outcome)
                    });
                }
            }
            Some(done) = lookups.join_next(), if !lookups.is_empty() => match done {
                Ok((seq, query, outcome)) => {
                    if outcome.is_cancelled() || seq < shown {
                        tracing::debug!(%query, "lookup superseded");
                    } else {
                        shown = seq;
                        report(&query, &outcome);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "lookup task failed"),
            },
            else => break,
        }
    }
}
