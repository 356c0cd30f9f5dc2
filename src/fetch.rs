//! Background post fetching.
//!
//! Fetches run on a dedicated thread that owns a single-threaded tokio
//! runtime.  The UI thread sends [`FetchRequest`]s through a [`Fetcher`]
//! handle and drains [`FetchOutcome`]s from an [`mpsc`] receiver on every
//! tick.
//!
//! Each request becomes its own task, so a second request does not wait for
//! the first one.  Outcomes carry the request's generation; deciding which
//! outcome is stale is the feed controller's job, not the worker's.

use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use tokio::sync::mpsc as async_mpsc;
use tracing::{debug, error};

use crate::source::{FetchError, Post, PostSource};

/// Ask the worker to load the posts at `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub url: String,
}

/// The result of one [`FetchRequest`].
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub url: String,
    pub result: Result<Vec<Option<Post>>, FetchError>,
}

/// Handle for submitting requests to the worker thread.  Dropping it stops
/// the worker; in-flight fetches are abandoned.
pub struct Fetcher {
    requests: async_mpsc::UnboundedSender<FetchRequest>,
}

impl Fetcher {
    /// Queue a request.  Returns `false` if the worker has exited.
    pub fn submit(&self, request: FetchRequest) -> bool {
        debug!(generation = request.generation, url = %request.url, "submitting fetch");
        if self.requests.send(request).is_err() {
            error!("fetch worker is gone; request dropped");
            return false;
        }
        true
    }
}

/// Spawn the fetch worker thread.
///
/// Returns the request handle and a receiver that the main loop should
/// drain on every tick.
pub fn spawn<S: PostSource>(source: S) -> io::Result<(Fetcher, mpsc::Receiver<FetchOutcome>)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (request_tx, mut request_rx) = async_mpsc::unbounded_channel::<FetchRequest>();
    let (outcome_tx, outcome_rx) = mpsc::channel();
    let source = Arc::new(source);

    thread::Builder::new()
        .name("fetch-worker".into())
        .spawn(move || {
            runtime.block_on(async move {
                while let Some(request) = request_rx.recv().await {
                    let source = Arc::clone(&source);
                    let outcome_tx = outcome_tx.clone();
                    tokio::spawn(async move {
                        let result = source.fetch(&request.url).await;
                        let outcome = FetchOutcome {
                            generation: request.generation,
                            url: request.url,
                            result,
                        };
                        // The UI has exited if the receiver is gone.
                        let _ = outcome_tx.send(outcome);
                    });
                }
                debug!("fetch worker shutting down");
            });
        })?;

    Ok((Fetcher { requests: request_tx }, outcome_rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves canned posts; URLs containing "slow" take a while.
    struct FakeSource {
        posts: HashMap<String, usize>,
    }

    impl PostSource for FakeSource {
        async fn fetch(&self, url: &str) -> Result<Vec<Option<Post>>, FetchError> {
            if url.contains("slow") {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            match self.posts.get(url) {
                Some(&n) => Ok(vec![Some(Post::default()); n]),
                None => Err(FetchError::NotFound { url: url.to_string() }),
            }
        }
    }

    fn fake() -> FakeSource {
        FakeSource {
            posts: HashMap::from([("fast.json".to_string(), 2), ("slow.json".to_string(), 5)]),
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn delivers_outcomes_with_their_generation() {
        let (fetcher, rx) = spawn(fake()).unwrap();
        assert!(fetcher.submit(FetchRequest {
            generation: 7,
            url: "fast.json".into(),
        }));

        let outcome = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(outcome.generation, 7);
        assert_eq!(outcome.url, "fast.json");
        assert_eq!(outcome.result.unwrap().len(), 2);
    }

    #[test]
    fn errors_are_delivered_too() {
        let (fetcher, rx) = spawn(fake()).unwrap();
        fetcher.submit(FetchRequest {
            generation: 1,
            url: "missing.json".into(),
        });

        let outcome = rx.recv_timeout(WAIT).unwrap();
        assert!(matches!(outcome.result, Err(FetchError::NotFound { .. })));
    }

    #[test]
    fn requests_overlap_instead_of_queueing() {
        let (fetcher, rx) = spawn(fake()).unwrap();
        fetcher.submit(FetchRequest {
            generation: 1,
            url: "slow.json".into(),
        });
        fetcher.submit(FetchRequest {
            generation: 2,
            url: "fast.json".into(),
        });

        let first = rx.recv_timeout(WAIT).unwrap();
        let second = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(first.generation, 2, "fast request finishes first");
        assert_eq!(second.generation, 1);
    }
}
