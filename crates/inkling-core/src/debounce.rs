use std::time::Duration;

use tokio::time::Instant;

/// A single resettable deadline.
///
/// Every `arm` pushes the deadline out by the full delay, replacing any
/// pending one, so only a quiet period of `delay` lets it fire.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, or a far-future instant when idle so it can sit
    /// in a `select!` arm guarded by [`Debouncer::is_armed`].
    pub fn deadline(&self) -> Instant {
        self.deadline
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(86400))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elapsed(debouncer: &Debouncer) -> bool {
        debouncer.is_armed() && debouncer.deadline() <= Instant::now()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_only_after_quiet_period() {
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));
        debouncer.arm();
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(!elapsed(&debouncer));

        // New input resets the countdown.
        debouncer.arm();
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(!elapsed(&debouncer));

        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(elapsed(&debouncer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_until_deadline_waits_full_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let start = Instant::now();
        debouncer.arm();
        tokio::time::sleep_until(debouncer.deadline()).await;
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_disarms() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        debouncer.arm();
        debouncer.cancel();
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!debouncer.is_armed());
        assert!(debouncer.deadline() > Instant::now() + Duration::from_secs(3600));
    }
}
