use crate::config::TimingConfig;
use std::time::Duration;
use tracing::{info, warn};

/// Timing of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTiming {
    pub lead_in: Duration,
    pub fade_out: Duration,
    pub fade_window: Duration,
    pub requested: Duration,
    /// Whole seconds the countdown runs for
    pub total_secs: u64,
    /// Allowed relative overshoot of the requested length before warning
    pub tolerance: f64,
}

impl SessionTiming {
    /// Timing for a requested length, before narration is measured
    pub fn new(config: &TimingConfig, requested_minutes: f64) -> Self {
        let requested = Duration::from_secs_f64((requested_minutes.max(0.0) * 60.0).round());
        Self {
            lead_in: Duration::from_secs(config.lead_in_secs),
            fade_out: Duration::from_secs(config.fade_out_secs),
            fade_window: Duration::from_secs(config.fade_window_secs),
            requested,
            total_secs: requested.as_secs(),
            tolerance: config.duration_tolerance,
        }
    }

    /// `lead_in + Σ narration + fade_out`
    pub fn actual_duration(&self, narration: &[Option<Duration>]) -> Option<Duration> {
        narration
            .iter()
            .copied()
            .sum::<Option<Duration>>()
            .map(|speech| self.lead_in + speech + self.fade_out)
    }

    /// Replace the requested total with the realized one once every clip is measured
    ///
    /// The realized length always wins; a large overshoot is only logged.
    pub fn reconcile(&mut self, narration: &[Option<Duration>]) {
        let Some(actual) = self.actual_duration(narration) else {
            warn!(
                "Narration length unknown, keeping requested {}s",
                self.total_secs
            );
            return;
        };

        let total_secs = actual.as_secs_f64().ceil() as u64;
        let requested_secs = self.requested.as_secs();

        if requested_secs > 0 {
            let overshoot = total_secs as f64 / requested_secs as f64 - 1.0;
            if overshoot > self.tolerance {
                warn!(
                    "Narration runs {}s against {}s requested ({:+.0}%)",
                    total_secs,
                    requested_secs,
                    overshoot * 100.0
                );
            }
        }

        info!(
            "Session length reconciled: {}s requested, {}s actual",
            requested_secs, total_secs
        );

        self.total_secs = total_secs;
    }

    /// Seconds left on the countdown
    pub fn remaining_secs(&self, elapsed_secs: u64) -> u64 {
        self.total_secs.saturating_sub(elapsed_secs)
    }

    /// Music volume for the final fade window, `None` outside it
    pub fn fade_volume(&self, remaining_secs: u64, music_volume: f32) -> Option<f32> {
        let window = self.fade_window.as_secs();
        if window == 0 || remaining_secs == 0 || remaining_secs > window {
            return None;
        }
        Some(remaining_secs as f32 / window as f32 * music_volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(minutes: f64) -> SessionTiming {
        SessionTiming::new(&TimingConfig::default(), minutes)
    }

    fn secs(s: u64) -> Option<Duration> {
        Some(Duration::from_secs(s))
    }

    #[test]
    fn test_actual_duration_sums_lead_in_narration_and_fade_out() {
        let mut t = timing(3.0);
        let narration = [secs(12), secs(90), secs(15)];

        assert_eq!(t.actual_duration(&narration), secs(137));

        t.reconcile(&narration);
        assert_eq!(t.total_secs, 137);
    }

    #[test]
    fn test_reconcile_rounds_up_fractional_seconds() {
        let mut t = timing(3.0);
        t.reconcile(&[
            Some(Duration::from_millis(12_400)),
            secs(90),
            Some(Duration::from_millis(15_200)),
        ]);
        assert_eq!(t.total_secs, 138);
    }

    #[test]
    fn test_reconcile_keeps_requested_when_unmeasured() {
        let mut t = timing(3.0);
        t.reconcile(&[secs(12), None, secs(15)]);
        assert_eq!(t.total_secs, 180);
    }

    #[test]
    fn test_reconcile_does_not_cap_overshoot() {
        let mut t = timing(3.0);
        t.reconcile(&[secs(60), secs(300), secs(60)]);
        assert_eq!(t.total_secs, 440);
    }

    #[test]
    fn test_fade_volume() {
        let t = timing(3.0);

        let v = t.fade_volume(3, 0.4).unwrap();
        assert!((v - 0.24).abs() < 1e-6);

        assert_eq!(t.fade_volume(5, 0.4), Some(0.4));
        assert_eq!(t.fade_volume(6, 0.4), None);
        assert_eq!(t.fade_volume(0, 0.4), None);
    }
}
