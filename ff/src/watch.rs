//! Game watcher: the polling loop on top of [`GameFeed`]
//!
//! Ticks at a fixed cadence and fires both polled reads on every tick without
//! waiting for earlier ones to finish, the way a UI refresh loop does. The
//! feed's throttling and zombie filtering keep the resulting view from
//! flooding the node or moving backward.

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::chain::{CallOutput, GameId};
use crate::network::GameFeed;
use crate::rpc::ReadError;

/// Which polled read an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    GameData,
    Cards,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::GameData => write!(f, "game-data"),
            Feed::Cards => write!(f, "cards"),
        }
    }
}

/// Outcome of one completed read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A fresh value replaced the view
    Updated { feed: Feed, output: CallOutput },
    /// Throttled or superseded; the view is unchanged
    Unchanged { feed: Feed },
    /// The read failed; the previous value is kept
    Failed { feed: Feed, error: String },
}

impl WatchEvent {
    pub fn feed(&self) -> Feed {
        match self {
            WatchEvent::Updated { feed, .. } | WatchEvent::Unchanged { feed } | WatchEvent::Failed { feed, .. } => *feed,
        }
    }
}

/// Latest known state of a game as seen by the watcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameView {
    pub game_data: Option<CallOutput>,
    pub cards: Option<CallOutput>,
    /// Most recent failure and the feed it came from; cleared when that feed recovers
    pub last_error: Option<(Feed, String)>,
    pub updates: u64,
    pub unchanged: u64,
    pub failures: u64,
}

impl GameView {
    /// Fold one read result into the view
    pub fn apply(&mut self, feed: Feed, result: Result<Option<CallOutput>, ReadError>) -> WatchEvent {
        match result {
            Ok(Some(output)) => {
                self.updates += 1;
                let slot = match feed {
                    Feed::GameData => &mut self.game_data,
                    Feed::Cards => &mut self.cards,
                };
                *slot = Some(output.clone());
                if self.last_error.as_ref().is_some_and(|(failed, _)| *failed == feed) {
                    self.last_error = None;
                }
                WatchEvent::Updated { feed, output }
            }
            Ok(None) => {
                self.unchanged += 1;
                WatchEvent::Unchanged { feed }
            }
            Err(e) => {
                self.failures += 1;
                let error = e.to_string();
                self.last_error = Some((feed, error.clone()));
                WatchEvent::Failed { feed, error }
            }
        }
    }
}

type TaggedRead = BoxFuture<'static, (Feed, Result<Option<CallOutput>, ReadError>)>;

/// Polls one game through a [`GameFeed`]
pub struct GameWatcher {
    feed: GameFeed,
    game_id: GameId,
    poll_interval: Duration,
}

impl GameWatcher {
    pub fn new(feed: GameFeed, game_id: GameId, poll_interval: Duration) -> Self {
        debug!(%game_id, ?poll_interval, "GameWatcher::new: called");
        Self {
            feed,
            game_id,
            poll_interval,
        }
    }

    /// Poll `max_polls` times (forever when `None`), sending one event per
    /// completed read. Reads still in flight after the last poll are drained.
    /// Stops early if the receiver goes away.
    pub async fn run(&self, max_polls: Option<u64>, events: mpsc::Sender<WatchEvent>) -> GameView {
        info!(game_id = %self.game_id, ?max_polls, "GameWatcher started");

        let mut view = GameView::default();
        let mut in_flight: FuturesUnordered<TaggedRead> = FuturesUnordered::new();
        let mut polls = 0u64;

        // Zero is rejected by tokio::time::interval
        let mut ticker = tokio::time::interval(self.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let more_polls = max_polls.is_none_or(|max| polls < max);
            if !more_polls && in_flight.is_empty() {
                break;
            }

            tokio::select! {
                _ = ticker.tick(), if more_polls => {
                    polls += 1;
                    debug!(polls, in_flight = in_flight.len(), "GameWatcher::run: tick");
                    in_flight.push(tag(Feed::GameData, self.feed.fetch_game_data(self.game_id)));
                    in_flight.push(tag(Feed::Cards, self.feed.fetch_cards(self.game_id)));
                }
                Some((feed, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    let event = view.apply(feed, result);
                    debug!(?event, "GameWatcher::run: read completed");
                    if events.send(event).await.is_err() {
                        info!("Event receiver dropped, stopping watcher");
                        break;
                    }
                }
            }
        }

        info!(
            polls,
            updates = view.updates,
            unchanged = view.unchanged,
            failures = view.failures,
            "GameWatcher finished"
        );
        view
    }
}

fn tag(feed: Feed, read: fetchgate::FetchFuture<CallOutput, ReadError>) -> TaggedRead {
    read.map(move |result| (feed, result)).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThrottleSettings;
    use crate::network::GameReader;
    use crate::network::mock::MockGameReader;
    use fetchgate::ThrottleConfig;
    use std::sync::Arc;

    const GAME: GameId = GameId(7);

    fn watcher(reader: &Arc<MockGameReader>, throttle_ms: u64, poll_ms: u64) -> GameWatcher {
        let settings = ThrottleSettings {
            game_data: ThrottleConfig::from_millis(throttle_ms),
            cards: ThrottleConfig::from_millis(throttle_ms),
        };
        let feed = GameFeed::new(Arc::clone(reader) as Arc<dyn GameReader>, &settings);
        GameWatcher::new(feed, GAME, Duration::from_millis(poll_ms))
    }

    async fn collect(mut rx: mpsc::Receiver<WatchEvent>) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_view_apply() {
        let mut view = GameView::default();

        let event = view.apply(Feed::Cards, Ok(Some(CallOutput(vec![9]))));
        assert_eq!(
            event,
            WatchEvent::Updated {
                feed: Feed::Cards,
                output: CallOutput(vec![9])
            }
        );
        assert_eq!(view.cards, Some(CallOutput(vec![9])));

        // None keeps what we had
        assert_eq!(view.apply(Feed::Cards, Ok(None)), WatchEvent::Unchanged { feed: Feed::Cards });
        assert_eq!(view.cards, Some(CallOutput(vec![9])));

        // Errors are recorded, value kept
        let event = view.apply(Feed::Cards, Err(ReadError::InvalidResponse("boom".to_string())));
        assert_eq!(event.feed(), Feed::Cards);
        assert!(matches!(event, WatchEvent::Failed { .. }));
        assert_eq!(view.cards, Some(CallOutput(vec![9])));
        assert_eq!(
            view.last_error,
            Some((Feed::Cards, "Invalid response: boom".to_string()))
        );
        assert_eq!((view.updates, view.unchanged, view.failures), (1, 1, 1));
    }

    #[test]
    fn test_view_error_cleared_on_recovery() {
        let mut view = GameView::default();
        view.apply(Feed::Cards, Err(ReadError::InvalidResponse("boom".to_string())));

        // Unchanged is not a recovery
        view.apply(Feed::Cards, Ok(None));
        assert!(view.last_error.is_some());

        // A fresh value on the other feed says nothing about this one
        view.apply(Feed::GameData, Ok(Some(CallOutput(vec![1]))));
        assert_eq!(view.last_error.as_ref().map(|(feed, _)| *feed), Some(Feed::Cards));

        view.apply(Feed::Cards, Ok(Some(CallOutput(vec![2]))));
        assert_eq!(view.last_error, None);
        assert_eq!(view.failures, 1);
    }

    #[test]
    fn test_feed_display() {
        assert_eq!(Feed::GameData.to_string(), "game-data");
        assert_eq!(Feed::Cards.to_string(), "cards");
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_polls_keep_view() {
        let reader = Arc::new(MockGameReader::new());
        let watcher = watcher(&reader, 250, 100);
        let (tx, rx) = mpsc::channel(64);

        // Polls at t=0, 100, 200: only the first is admitted per feed
        let view = watcher.run(Some(3), tx).await;
        let events = collect(rx).await;

        assert_eq!(events.len(), 6);
        assert_eq!(events.iter().filter(|e| matches!(e, WatchEvent::Updated { .. })).count(), 2);
        assert_eq!(reader.game_data_calls(), 1);
        assert_eq!(reader.cards_calls(), 1);
        assert_eq!(view.game_data, Some(CallOutput(vec![1, 1])));
        assert_eq!(view.cards, Some(CallOutput(vec![2, 1])));
        assert_eq!(view.unchanged, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overtaken_read_does_not_regress_view() {
        // First game data read is slow, second is fast and overtakes it
        let reader = Arc::new(MockGameReader::with_game_data_latencies(vec![
            Duration::from_millis(300),
            Duration::from_millis(50),
        ]));
        let watcher = watcher(&reader, 0, 100);
        let (tx, rx) = mpsc::channel(64);

        let view = watcher.run(Some(2), tx).await;
        let events = collect(rx).await;

        let game_data: Vec<_> = events.into_iter().filter(|e| e.feed() == Feed::GameData).collect();
        assert_eq!(
            game_data,
            vec![
                WatchEvent::Updated {
                    feed: Feed::GameData,
                    output: CallOutput(vec![1, 2])
                },
                WatchEvent::Unchanged { feed: Feed::GameData },
            ]
        );
        assert_eq!(view.game_data, Some(CallOutput(vec![1, 2])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_reported() {
        let reader = Arc::new(MockGameReader::new());
        reader.set_failing(true);
        let watcher = watcher(&reader, 0, 100);
        let (tx, rx) = mpsc::channel(64);

        let view = watcher.run(Some(1), tx).await;
        let events = collect(rx).await;

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, WatchEvent::Failed { .. })));
        assert_eq!(view.game_data, None);
        assert_eq!(view.failures, 2);
        let (_, error) = view.last_error.unwrap();
        assert!(error.contains("mock failure"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let reader = Arc::new(MockGameReader::new());
        let watcher = watcher(&reader, 0, 100);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        // Would run forever with a live receiver
        let view = watcher.run(None, tx).await;
        assert_eq!(view.updates, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_polls() {
        let reader = Arc::new(MockGameReader::new());
        let watcher = watcher(&reader, 0, 100);
        let (tx, rx) = mpsc::channel(1);

        assert_eq!(watcher.run(Some(0), tx).await, GameView::default());
        assert!(collect(rx).await.is_empty());
        assert_eq!(reader.game_data_calls(), 0);
    }
}
