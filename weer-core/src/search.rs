//! Coalesces rapid city-search input so only settled queries reach the network.

use std::time::Duration;
use tokio::sync::mpsc;

/// Quiet period after the last keystroke before a query is emitted.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(600);

/// Shorter (trimmed) queries are never emitted.
pub const MIN_QUERY_CHARS: usize = 3;

/// Input side: feed it every edit of the search box.
#[derive(Debug, Clone)]
pub struct SearchInput {
    tx: mpsc::UnboundedSender<String>,
}

impl SearchInput {
    /// Returns `false` once the receiving side is gone.
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.tx.send(text.into()).is_ok()
    }
}

/// Output side: yields the last input of each burst.
#[derive(Debug)]
pub struct DebouncedQueries {
    rx: mpsc::UnboundedReceiver<String>,
    quiet: Duration,
}

pub fn debounced(quiet: Duration) -> (SearchInput, DebouncedQueries) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SearchInput { tx }, DebouncedQueries { rx, quiet })
}

impl DebouncedQueries {
    /// Next settled query, or `None` once every [`SearchInput`] is dropped.
    ///
    /// A burst still pending when the inputs close is flushed immediately.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            let mut pending = self.rx.recv().await?;

            loop {
                tokio::select! {
                    more = self.rx.recv() => match more {
                        Some(text) => pending = text,
                        None => break,
                    },
                    _ = tokio::time::sleep(self.quiet) => break,
                }
            }

            let query = pending.trim();
            if query.chars().count() >= MIN_QUERY_CHARS {
                tracing::debug!(query, "search settled");
                return Some(query.to_string());
            }
            tracing::debug!(query, "search too short, ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_last_input_of_a_burst_is_emitted() {
        let (input, mut queries) = debounced(DEFAULT_QUIET_PERIOD);

        let typing = tokio::spawn(async move {
            for text in ["A", "Am", "Ams", "Amst", "Amsterdam"] {
                input.push(text);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
            input.push("Rotterdam");
        });

        assert_eq!(queries.next().await.as_deref(), Some("Amsterdam"));
        assert_eq!(queries.next().await.as_deref(), Some("Rotterdam"));
        typing.await.unwrap();
        assert_eq!(queries.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn short_queries_are_dropped() {
        let (input, mut queries) = debounced(DEFAULT_QUIET_PERIOD);
        input.push("Am");
        drop(input);
        assert_eq!(queries.next().await, None);

        let (input, mut queries) = debounced(DEFAULT_QUIET_PERIOD);
        input.push("  Ede  ");
        drop(input);
        assert_eq!(queries.next().await.as_deref(), Some("Ede"));
    }

    #[tokio::test(start_paused = true)]
    async fn emission_waits_for_the_quiet_period() {
        let (input, mut queries) = debounced(Duration::from_millis(600));
        let started = tokio::time::Instant::now();

        input.push("Leiden");
        let query = queries.next().await;

        assert_eq!(query.as_deref(), Some("Leiden"));
        assert!(started.elapsed() >= Duration::from_millis(600));
        drop(input);
    }
}
