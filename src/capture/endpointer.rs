use crate::timer::ScheduledCallback;
use std::time::Duration;
use tracing::debug;

/// Silence-based end-of-utterance detection
///
/// Every interim event carrying speech (re)arms a quiet-period timer. When the
/// timer elapses without being re-armed, the callback receives the arm id it was
/// scheduled with; `fire` accepts that id exactly once. Nothing is ever armed
/// until speech has been seen.
#[derive(Debug)]
pub struct SilenceEndpointer {
    quiet_period: Duration,
    armed: bool,
    arm_id: u64,
    timer: Option<ScheduledCallback>,
}

impl SilenceEndpointer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            armed: false,
            arm_id: 0,
            timer: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feed one interim event. Returns whether the timer was re-armed.
    pub fn observe<F>(&mut self, text: &str, on_elapsed: F) -> bool
    where
        F: FnOnce(u64) + Send + 'static,
    {
        if text.trim().is_empty() {
            return false;
        }

        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }

        self.arm_id += 1;
        self.armed = true;

        let arm_id = self.arm_id;
        self.timer = Some(ScheduledCallback::schedule(self.quiet_period, move || {
            on_elapsed(arm_id)
        }));

        debug!("Silence timer armed (#{})", arm_id);
        true
    }

    /// Accept an elapsed-timer notification. True only for the latest arming,
    /// and only once.
    pub fn fire(&mut self, arm_id: u64) -> bool {
        if !self.armed || arm_id != self.arm_id {
            return false;
        }

        self.armed = false;
        self.timer = None;
        true
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl Drop for SilenceEndpointer {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn endpointer() -> (
        SilenceEndpointer,
        mpsc::UnboundedSender<u64>,
        mpsc::UnboundedReceiver<u64>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SilenceEndpointer::new(Duration::from_millis(2000)), tx, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_fires_after_last_speech() {
        let (mut ep, tx, mut rx) = endpointer();

        let mut last_event = Instant::now();
        for _ in 0..5 {
            let tx = tx.clone();
            assert!(ep.observe("still talking", move |id| {
                let _ = tx.send(id);
            }));
            last_event = Instant::now();
            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert!(rx.try_recv().is_err(), "no signal while speech continues");
        }

        let id = rx.recv().await.unwrap();
        assert_eq!(Instant::now() - last_event, Duration::from_millis(2000));
        assert!(ep.fire(id));
        assert!(!ep.fire(id), "signal is accepted exactly once");
        assert!(!ep.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_events_do_not_arm() {
        let (mut ep, tx, mut rx) = endpointer();

        assert!(!ep.observe("   ", move |id| {
            let _ = tx.send(id);
        }));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(!ep.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_arm_is_rejected() {
        let (mut ep, tx, _rx) = endpointer();

        let tx1 = tx.clone();
        ep.observe("one", move |id| {
            let _ = tx1.send(id);
        });
        ep.observe("one two", move |id| {
            let _ = tx.send(id);
        });

        assert!(!ep.fire(1));
        assert!(ep.fire(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_cancels_pending_signal() {
        let (mut ep, tx, mut rx) = endpointer();

        ep.observe("hello", move |id| {
            let _ = tx.send(id);
        });
        ep.disarm();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(!ep.fire(1));
    }
}
