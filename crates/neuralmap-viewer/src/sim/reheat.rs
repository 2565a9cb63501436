use std::time::Duration;

use crate::util::config::ReheatSettings;

/// Fires a small reheat at a fixed interval while the layout is idle, so a
/// settled map keeps breathing. Owned by the layout lifecycle; cancelling it
/// is permanent until a new scheduler is created.
#[derive(Debug, Clone)]
pub struct ReheatScheduler {
    enabled: bool,
    cancelled: bool,
    interval: Duration,
    elapsed: Duration,
    pub velocity_jitter: f32,
    pub alpha: f32,
}

impl ReheatScheduler {
    pub fn new(cfg: &ReheatSettings) -> Self {
        Self {
            enabled: cfg.enabled,
            cancelled: false,
            interval: Duration::from_millis(cfg.interval_ms.max(1)),
            elapsed: Duration::ZERO,
            velocity_jitter: cfg.velocity_jitter,
            alpha: cfg.alpha,
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.cancelled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.elapsed = Duration::ZERO;
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.elapsed = Duration::ZERO;
    }

    /// Restarts the countdown, e.g. while the layout is still moving.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Advances the clock; true when a reheat is due.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.is_active() {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every(ms: u64) -> ReheatScheduler {
        ReheatScheduler::new(&ReheatSettings {
            enabled: true,
            interval_ms: ms,
            ..ReheatSettings::default()
        })
    }

    #[test]
    fn fires_once_per_interval() {
        let mut r = every(3000);
        let frame = Duration::from_millis(500);
        let fired: Vec<bool> = (0..12).map(|_| r.advance(frame)).collect();
        assert_eq!(fired.iter().filter(|f| **f).count(), 2);
        assert!(fired[5]);
        assert!(fired[11]);
    }

    #[test]
    fn cancelled_scheduler_never_fires() {
        let mut r = every(10);
        r.cancel();
        assert!(!r.advance(Duration::from_secs(5)));
        r.set_enabled(true);
        assert!(!r.advance(Duration::from_secs(5)));
    }

    #[test]
    fn disabled_by_config() {
        let mut r = ReheatScheduler::new(&ReheatSettings {
            enabled: false,
            ..ReheatSettings::default()
        });
        assert!(!r.advance(Duration::from_secs(60)));
    }
}
