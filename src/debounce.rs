//! Debounced query dispatch utility.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Spawns a dispatcher thread that coalesces a burst of query updates and
/// invokes `callback` once with the final value after `delay` of quiet.
///
/// Updates arriving inside the quiet window supersede the pending value and
/// restart the window. Empty/whitespace updates bypass the window: they
/// dispatch immediately and cancel any pending non-empty value, so a
/// cleared input never waits behind stale results. Dropping the returned
/// sender tears the dispatcher down; a pending value is canceled, not
/// flushed.
pub fn spawn_debounced_query_dispatcher<F>(delay: Duration, callback: F) -> Sender<String>
where
    F: Fn(String) + Send + 'static,
{
    let (query_tx, query_rx) = mpsc::channel::<String>();
    thread::spawn(move || loop {
        let Ok(mut pending) = query_rx.recv() else {
            return;
        };
        if pending.trim().is_empty() {
            callback(pending);
            continue;
        }
        loop {
            match query_rx.recv_timeout(delay) {
                Ok(next) => {
                    if next.trim().is_empty() {
                        callback(next);
                        break;
                    }
                    pending = next;
                }
                Err(RecvTimeoutError::Timeout) => {
                    callback(pending);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    });
    query_tx
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::spawn_debounced_query_dispatcher;

    #[test]
    fn test_burst_coalesces_to_final_value() {
        let (seen_tx, seen_rx) = mpsc::channel();
        let query_tx =
            spawn_debounced_query_dispatcher(Duration::from_millis(50), move |query| {
                let _ = seen_tx.send(query);
            });

        for update in ["a", "ad", "adele"] {
            query_tx
                .send(update.to_string())
                .expect("dispatcher should accept updates");
        }

        let dispatched = seen_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("final value should dispatch after the quiet period");
        assert_eq!(dispatched, "adele");
        assert!(
            seen_rx.recv_timeout(Duration::from_millis(200)).is_err(),
            "only one dispatch should fire per burst"
        );
    }

    #[test]
    fn test_empty_update_bypasses_quiet_window() {
        let (seen_tx, seen_rx) = mpsc::channel();
        // A long delay so anything observed quickly must have bypassed it.
        let query_tx =
            spawn_debounced_query_dispatcher(Duration::from_secs(10), move |query| {
                let _ = seen_tx.send(query);
            });

        query_tx
            .send("adele".to_string())
            .expect("dispatcher should accept updates");
        query_tx
            .send("  ".to_string())
            .expect("dispatcher should accept updates");

        let dispatched = seen_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("empty update should dispatch immediately");
        assert_eq!(dispatched, "  ");
        assert!(
            seen_rx.recv_timeout(Duration::from_millis(200)).is_err(),
            "the canceled non-empty value should never dispatch"
        );
    }

    #[test]
    fn test_leading_empty_update_dispatches_immediately() {
        let (seen_tx, seen_rx) = mpsc::channel();
        let query_tx = spawn_debounced_query_dispatcher(Duration::from_secs(10), move |query| {
            let _ = seen_tx.send(query);
        });

        query_tx
            .send(String::new())
            .expect("dispatcher should accept updates");

        let dispatched = seen_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("empty update should dispatch immediately");
        assert!(dispatched.is_empty());
    }

    #[test]
    fn test_dropping_sender_cancels_pending_value() {
        let (seen_tx, seen_rx) = mpsc::channel();
        let query_tx =
            spawn_debounced_query_dispatcher(Duration::from_millis(300), move |query| {
                let _ = seen_tx.send(query);
            });

        query_tx
            .send("adele".to_string())
            .expect("dispatcher should accept updates");
        drop(query_tx);

        assert!(
            seen_rx.recv_timeout(Duration::from_millis(600)).is_err(),
            "teardown should cancel the pending value"
        );
    }
}
