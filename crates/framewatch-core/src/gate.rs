use serde::{Deserialize, Serialize};

use crate::snapshot::VideoSnapshot;

/// Decides whether a snapshot is worth sending to the host.
///
/// Chosen per source kind in [`crate::config::GateConfig`]; the scheduler
/// never branches on the policy itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ChangeGate {
    /// Pass when position or duration moved by more than `threshold` seconds,
    /// or when the paused flag flipped. Suits push-driven sources that tick
    /// several times a second and may not tick again after a pause.
    ValueDelta { threshold: f64 },
    /// Pass when at least `interval_ms` elapsed since the last propagated
    /// snapshot. Suits poll-driven sources.
    TimeDelta { interval_ms: u64 },
}

impl ChangeGate {
    /// `prev` is the last snapshot that was propagated, `None` if nothing was
    /// sent yet.
    pub fn should_propagate(&self, prev: Option<&VideoSnapshot>, next: &VideoSnapshot) -> bool {
        let Some(prev) = prev else {
            return true;
        };
        if prev.exists != next.exists {
            return true;
        }
        match *self {
            Self::ValueDelta { threshold } => {
                prev.paused != next.paused
                    || moved(prev.current_time, next.current_time, threshold)
                    || moved(prev.duration, next.duration, threshold)
            }
            Self::TimeDelta { interval_ms } => {
                next.observed_at.saturating_sub(prev.observed_at) >= interval_ms
            }
        }
    }
}

fn moved(prev: Option<f64>, next: Option<f64>, threshold: f64) -> bool {
    match (prev, next) {
        (Some(a), Some(b)) => (b - a).abs() > threshold,
        (None, None) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(position: f64, at: u64) -> VideoSnapshot {
        VideoSnapshot {
            exists: true,
            duration: Some(1440.0),
            current_time: Some(position),
            paused: Some(false),
            observed_at: at,
        }
    }

    /// Feed snapshots through the gate the way the scheduler does, returning
    /// how many were propagated.
    fn run(gate: ChangeGate, snapshots: impl IntoIterator<Item = VideoSnapshot>) -> usize {
        let mut last: Option<VideoSnapshot> = None;
        let mut sent = 0;
        for snapshot in snapshots {
            if gate.should_propagate(last.as_ref(), &snapshot) {
                last = Some(snapshot);
                sent += 1;
            }
        }
        sent
    }

    #[test]
    fn test_first_snapshot_always_passes() {
        let value = ChangeGate::ValueDelta { threshold: 0.5 };
        let time = ChangeGate::TimeDelta { interval_ms: 3000 };
        assert!(value.should_propagate(None, &playing(0.0, 0)));
        assert!(time.should_propagate(None, &playing(0.0, 0)));
        assert!(time.should_propagate(None, &VideoSnapshot::empty(0)));
    }

    #[test]
    fn test_value_delta_threshold() {
        let gate = ChangeGate::ValueDelta { threshold: 0.5 };
        let prev = playing(10.0, 0);
        assert!(!gate.should_propagate(Some(&prev), &playing(10.5, 250)));
        assert!(gate.should_propagate(Some(&prev), &playing(10.6, 250)));
        // Seeking backwards counts too.
        assert!(gate.should_propagate(Some(&prev), &playing(2.0, 250)));

        let mut longer = playing(10.0, 250);
        longer.duration = Some(1500.0);
        assert!(gate.should_propagate(Some(&prev), &longer));
    }

    #[test]
    fn test_value_delta_suppresses_push_noise() {
        // Push source every 250 ms, advancing 0.1 s per tick.
        let gate = ChangeGate::ValueDelta { threshold: 0.5 };
        let ticks = 100;
        let sent = run(
            gate,
            (0..ticks).map(|i| playing(i as f64 * 0.1, i as u64 * 250)),
        );
        assert!(sent * 5 <= ticks, "sent {sent} of {ticks}");
        assert!(sent > 1);
    }

    #[test]
    fn test_time_delta_rate_limits_polls() {
        // Poll every 1000 ms.
        let gate = ChangeGate::TimeDelta { interval_ms: 3000 };
        let polls = 30;
        let sent = run(
            gate,
            (0..polls).map(|i| playing(i as f64, i as u64 * 1000)),
        );
        assert!(sent * 3 <= polls, "sent {sent} of {polls}");
        assert_eq!(sent, 10);
    }

    #[test]
    fn test_existence_change_always_passes() {
        let value = ChangeGate::ValueDelta { threshold: 0.5 };
        let time = ChangeGate::TimeDelta { interval_ms: 3000 };
        let prev = playing(10.0, 0);
        let gone = VideoSnapshot::empty(10);
        assert!(value.should_propagate(Some(&prev), &gone));
        assert!(time.should_propagate(Some(&prev), &gone));
        assert!(!value.should_propagate(Some(&gone), &VideoSnapshot::empty(20)));
    }

    #[test]
    fn test_value_delta_passes_pause_flip() {
        let gate = ChangeGate::ValueDelta { threshold: 0.5 };
        let prev = playing(10.0, 0);
        let mut paused = playing(10.1, 250);
        paused.paused = Some(true);
        assert!(gate.should_propagate(Some(&prev), &paused));
        assert!(gate.should_propagate(Some(&paused), &playing(10.1, 500)));
        // Still paused, not moved.
        let mut still = paused;
        still.observed_at = 750;
        assert!(!gate.should_propagate(Some(&paused), &still));
    }

    #[test]
    fn test_time_delta_holds_pause_until_interval() {
        let gate = ChangeGate::TimeDelta { interval_ms: 3000 };
        let prev = playing(10.0, 0);
        let mut paused = playing(11.0, 1000);
        paused.paused = Some(true);
        assert!(!gate.should_propagate(Some(&prev), &paused));
        paused.observed_at = 3000;
        assert!(gate.should_propagate(Some(&prev), &paused));
    }

    #[test]
    fn test_deserialize_policies() {
        let gate: ChangeGate =
            toml::from_str("policy = \"value_delta\"\nthreshold = 0.5").unwrap();
        assert_eq!(gate, ChangeGate::ValueDelta { threshold: 0.5 });
        let gate: ChangeGate =
            toml::from_str("policy = \"time_delta\"\ninterval_ms = 3000").unwrap();
        assert_eq!(gate, ChangeGate::TimeDelta { interval_ms: 3000 });
    }
}
