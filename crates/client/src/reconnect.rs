//! Fixed-delay reconnect timer with a single pending slot.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// At most one scheduled reconnection attempt.
///
/// Arming the timer cancels whatever was pending.  Each arming gets a fresh
/// id; when the timer fires it sends that id, and the owner must
/// [`claim`](Self::claim) it before acting.  A fire whose id is no longer
/// armed (canceled after the message was already queued) is refused.
#[derive(Debug, Default)]
pub struct ReconnectTimer {
    next_id: u64,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    id: u64,
    task: JoinHandle<()>,
}

impl ReconnectTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer: after `delay`, send the arming id on `tx`.
    /// Any previously pending attempt is canceled first.
    pub fn schedule(&mut self, delay: Duration, tx: &mpsc::UnboundedSender<u64>) -> u64 {
        self.cancel();

        self.next_id += 1;
        let id = self.next_id;
        let tx = tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(id);
        });
        self.pending = Some(Pending { id, task });
        id
    }

    /// Cancel the pending attempt, if any.  Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.task.abort();
                true
            }
            None => false,
        }
    }

    /// Consume a fire event.  `true` only for the currently armed id.
    pub fn claim(&mut self, id: u64) -> bool {
        match &self.pending {
            Some(pending) if pending.id == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(5000);

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ReconnectTimer::new();
        let id = timer.schedule(DELAY, &tx);

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(rx.try_recv().is_err(), "fired before the delay elapsed");

        let fired = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fired, id);
        assert!(timer.claim(fired));
        assert!(!timer.cancel(), "claimed attempt still pending");
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_cancels_previous_attempt() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ReconnectTimer::new();
        let first = timer.schedule(DELAY, &tx);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let second = timer.schedule(DELAY, &tx);
        assert_ne!(first, second);

        let fired = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fired, second);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err(), "a duplicate attempt fired");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ReconnectTimer::new();
        timer.schedule(DELAY, &tx);
        assert!(timer.cancel());
        assert!(!timer.cancel());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_ids_are_refused() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timer = ReconnectTimer::new();
        let first = timer.schedule(DELAY, &tx);
        let second = timer.schedule(DELAY, &tx);
        assert!(!timer.claim(first));
        assert!(timer.claim(second));
        assert!(!timer.claim(second));
    }
}
