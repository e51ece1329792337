//! Timeline tests for ThrottledFetch
//!
//! These drive a coordinator with a paused tokio clock and hand-resolved
//! reads, so both dispatch times and completion order are exact.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fetchgate::{ThrottleConfig, ThrottledFetch};
use proptest::prelude::*;
use tokio::sync::oneshot;
use tokio::time::advance;

type Reply = Result<char, String>;

#[derive(Clone, Default)]
struct Reads {
    pending: Arc<Mutex<Vec<Option<oneshot::Sender<Reply>>>>>,
}

impl Reads {
    fn coordinator(&self, interval_ms: u64) -> ThrottledFetch<u64, char, String> {
        let pending = Arc::clone(&self.pending);
        ThrottledFetch::new(
            move |_game_id: u64| {
                let (tx, rx) = oneshot::channel();
                pending.lock().unwrap().push(Some(tx));
                async move { rx.await.unwrap_or_else(|_| Err("abandoned".to_string())) }
            },
            ThrottleConfig::from_millis(interval_ms),
        )
    }

    fn dispatched(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Answer the read that was dispatched `nth` (0-based, in dispatch order)
    fn answer(&self, nth: usize, reply: Reply) {
        let tx = self.pending.lock().unwrap()[nth].take().expect("read already answered");
        tx.send(reply).expect("caller went away");
    }
}

// =============================================================================
// Worked example: throttle interval 1000ms, key 42
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_example_throttled_poll_returns_null() {
    let reads = Reads::default();
    let fetch = reads.coordinator(1000);

    // t=0: dispatches; resolves at t=50 with A
    let first = tokio::spawn(fetch.fetch(42));
    advance(Duration::from_millis(50)).await;
    reads.answer(0, Ok('A'));
    assert_eq!(first.await.unwrap(), Ok(Some('A')));

    // t=100: throttled, no read issued
    advance(Duration::from_millis(50)).await;
    assert_eq!(fetch.fetch(42).await, Ok(None));
    assert_eq!(reads.dispatched(), 1);

    // t=1000: dispatches again, resolves at t=1300 with B
    advance(Duration::from_millis(900)).await;
    let second = tokio::spawn(fetch.fetch(42));
    assert_eq!(reads.dispatched(), 2);
    advance(Duration::from_millis(300)).await;
    reads.answer(1, Ok('B'));
    assert_eq!(second.await.unwrap(), Ok(Some('B')));
}

#[tokio::test(start_paused = true)]
async fn test_example_late_completion_after_newer_is_null() {
    let reads = Reads::default();
    let fetch = reads.coordinator(1000);

    // Earlier dispatch (will carry C) at t=0, newer dispatch (B) at t=1000
    let older = tokio::spawn(fetch.fetch(42));
    advance(Duration::from_millis(1000)).await;
    let newer = tokio::spawn(fetch.fetch(42));

    // B accepted at t=1300, C straggles in afterwards
    advance(Duration::from_millis(300)).await;
    reads.answer(1, Ok('B'));
    assert_eq!(newer.await.unwrap(), Ok(Some('B')));

    reads.answer(0, Ok('C'));
    assert_eq!(older.await.unwrap(), Ok(None));
}

#[tokio::test(start_paused = true)]
async fn test_example_completion_before_newer_delivers_both() {
    let reads = Reads::default();
    let fetch = reads.coordinator(1000);

    let older = tokio::spawn(fetch.fetch(42));
    advance(Duration::from_millis(1000)).await;
    let newer = tokio::spawn(fetch.fetch(42));

    // C completes at t=1050, before B
    advance(Duration::from_millis(50)).await;
    reads.answer(0, Ok('C'));
    assert_eq!(older.await.unwrap(), Ok(Some('C')));

    advance(Duration::from_millis(250)).await;
    reads.answer(1, Ok('B'));
    assert_eq!(newer.await.unwrap(), Ok(Some('B')));
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_not_converted_to_null() {
    let reads = Reads::default();
    let fetch = reads.coordinator(1000);

    let call = tokio::spawn(fetch.fetch(42));
    reads.answer(0, Err("rpc unavailable".to_string()));
    assert_eq!(call.await.unwrap(), Err("rpc unavailable".to_string()));

    // The failed dispatch still counts for throttling
    assert_eq!(fetch.fetch(42).await, Ok(None));
}

// =============================================================================
// Ordering property
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For calls on one key completing in any order, the non-null results
    /// follow initiation order and the newest call is always delivered.
    #[test]
    fn prop_delivered_values_follow_initiation_order(
        order in Just((0..8usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let label = |nth: usize| char::from(b'a' + nth as u8);
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

        let delivered = runtime.block_on(async {
            let reads = Reads::default();
            let fetch = reads.coordinator(0);

            let mut handles: Vec<_> = (0..order.len()).map(|_| Some(tokio::spawn(fetch.fetch(7)))).collect();

            // Complete the reads one at a time in the shuffled order
            let mut delivered = Vec::new();
            for &nth in &order {
                reads.answer(nth, Ok(label(nth)));
                let handle = handles[nth].take().unwrap();
                if let Some(value) = handle.await.unwrap().unwrap() {
                    delivered.push(value);
                }
            }
            delivered
        });

        prop_assert!(delivered.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(delivered.last().copied(), Some(label(order.len() - 1)));
    }
}
