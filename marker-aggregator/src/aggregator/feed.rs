//! Feed state exposed to marker consumers

use std::sync::{Arc, Mutex};

use marker_types::Marker;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::Aggregator;

/// Observable state of an aggregation cycle
///
/// `Loading` holds until the cycle settles, then exactly one of `Ready` or
/// `Failed` replaces it.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    /// The cycle has not settled yet
    Loading,
    /// The cycle succeeded with the flattened marker collection
    Ready(Vec<Marker>),
    /// The cycle failed; no partial marker set is exposed
    Failed(String),
}

impl FetchState {
    /// Whether the cycle has settled
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// Runs aggregation cycles in the background and publishes their state
///
/// Dropping the feed cancels the in-flight cycle, so a torn-down consumer
/// stops outstanding fetches instead of leaking them.
pub struct MarkerFeed {
    aggregator: Arc<Aggregator>,
    state_tx: Arc<watch::Sender<FetchState>>,
    state_rx: watch::Receiver<FetchState>,
    lifecycle: CancellationToken,
    current_cycle: Mutex<CancellationToken>,
}

impl MarkerFeed {
    /// Starts a feed and kicks off the first aggregation cycle
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(aggregator: Aggregator) -> Self {
        let (state_tx, state_rx) = watch::channel(FetchState::Loading);
        let lifecycle = CancellationToken::new();

        let feed = Self {
            aggregator: Arc::new(aggregator),
            state_tx: Arc::new(state_tx),
            state_rx,
            current_cycle: Mutex::new(lifecycle.child_token()),
            lifecycle,
        };
        feed.spawn_cycle();
        feed
    }

    fn spawn_cycle(&self) {
        let cycle = self.lifecycle.child_token();
        *self.current_cycle.lock().expect("feed lock poisoned") = cycle.clone();

        let aggregator = Arc::clone(&self.aggregator);
        let state_tx = Arc::clone(&self.state_tx);
        tokio::spawn(async move {
            let state = match aggregator.run(&cycle).await {
                Ok(aggregation) => FetchState::Ready(aggregation.markers),
                Err(e) => FetchState::Failed(e.to_string()),
            };
            // A cancelled cycle publishes nothing; a refresh already replaced
            // the state with Loading
            if !cycle.is_cancelled() {
                let _ = state_tx.send(state);
            }
        });
    }

    /// Cancels the in-flight cycle, resets the state to `Loading`, and
    /// starts a new cycle
    ///
    /// This is the retry affordance: nothing retries automatically.
    pub fn refresh(&self) {
        self.current_cycle
            .lock()
            .expect("feed lock poisoned")
            .cancel();
        let _ = self.state_tx.send(FetchState::Loading);
        self.spawn_cycle();
    }

    /// Returns a receiver observing the feed state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state_rx.clone()
    }

    /// Waits until the current cycle settles and returns the settled state
    pub async fn settled(&self) -> FetchState {
        let mut rx = self.state_rx.clone();
        let settled = rx
            .wait_for(FetchState::is_settled)
            .await
            .expect("feed state channel closed");
        settled.clone()
    }
}

impl Drop for MarkerFeed {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}
