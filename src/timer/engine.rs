// Sleep timer and fade-out engine
// Deadlines are plain data; a periodic host tick fires whatever is due.
// Arming or cancelling replaces the whole schedule, so there is never more
// than one pending stop or fade sequence.

use std::time::{Duration, Instant};

use thiserror::Error;

/// Length of the volume fade-out window before the scheduled stop
pub const FADE_OUT_DURATION: Duration = Duration::from_secs(3 * 60);

/// Interval between fade-out volume steps
pub const FADE_OUT_STEP: Duration = Duration::from_secs(10);

/// Number of equal fade-out steps (the window divides evenly)
pub const FADE_OUT_STEPS: u32 = (FADE_OUT_DURATION.as_secs() / FADE_OUT_STEP.as_secs()) as u32;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("timer duration must be greater than zero")]
    ZeroDuration,
}

/// Work the host has to carry out after a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerEvent {
    /// Apply a fade-out volume step to the live output (not persisted)
    FadeStep { volume: f32, step: u32, steps: u32 },
    /// The scheduled stop fired: pause playback, reset position, release the
    /// wake lock. `restore_volume` carries the pre-fade snapshot when
    /// fade-out was enabled.
    Expired { restore_volume: Option<f32> },
}

#[derive(Debug)]
struct FadeOut {
    starts_at: Instant,
    original_volume: f32,
    steps_done: u32,
}

#[derive(Debug)]
struct Armed {
    end_at: Instant,
    total: Duration,
    fade: Option<FadeOut>,
}

/// Sleep timer state machine: Idle -> Armed -> (FadingOut ->) Idle
#[derive(Debug, Default)]
pub struct SleepTimer {
    armed: Option<Armed>,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self { armed: None }
    }

    /// Arm the timer for `hours` and `minutes` from `now`.
    ///
    /// Input is validated before any existing schedule is touched, so a
    /// rejected call leaves a previously armed timer running. With `fade_out`
    /// the current volume is snapshotted and the fade start is scheduled at
    /// `end - FADE_OUT_DURATION`, clamped to `now` for short durations.
    pub fn arm(
        &mut self,
        now: Instant,
        hours: u32,
        minutes: u32,
        fade_out: bool,
        current_volume: f32,
    ) -> Result<(), TimerError> {
        let total_minutes = u64::from(hours) * 60 + u64::from(minutes);
        if total_minutes == 0 {
            return Err(TimerError::ZeroDuration);
        }

        // Tear down the previous schedule before creating the new one.
        self.armed = None;

        let total = Duration::from_secs(total_minutes * 60);
        let end_at = now + total;

        let fade = fade_out.then(|| FadeOut {
            starts_at: end_at
                .checked_sub(FADE_OUT_DURATION)
                .filter(|start| *start >= now)
                .unwrap_or(now),
            original_volume: current_volume,
            steps_done: 0,
        });

        self.armed = Some(Armed { end_at, total, fade });
        Ok(())
    }

    /// Clear the scheduled stop and any fade-out state.
    ///
    /// Returns the snapshotted pre-fade volume when fade-out was enabled so
    /// the caller can restore it, regardless of fade progress. Safe to call
    /// while idle.
    pub fn cancel(&mut self) -> Option<f32> {
        self.armed
            .take()
            .and_then(|armed| armed.fade.map(|fade| fade.original_volume))
    }

    /// Fire everything due at `now`.
    ///
    /// Fade steps due before the stop are emitted first, so at the stop
    /// instant the volume has reached its final step value before the
    /// `Expired` event restores the snapshot. A delayed tick catches up on
    /// every missed step and still fires the expiry exactly once.
    pub fn tick(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();

        let Some(armed) = self.armed.as_mut() else {
            return events;
        };

        if let Some(fade) = armed.fade.as_mut() {
            while fade.steps_done < FADE_OUT_STEPS {
                let due = fade.starts_at + FADE_OUT_STEP * (fade.steps_done + 1);
                if due > now || due > armed.end_at {
                    break;
                }
                fade.steps_done += 1;
                let volume = if fade.steps_done == FADE_OUT_STEPS {
                    // Final step lands exactly on zero
                    0.0
                } else {
                    fade.original_volume
                        * (1.0 - fade.steps_done as f32 / FADE_OUT_STEPS as f32)
                };
                events.push(TimerEvent::FadeStep {
                    volume,
                    step: fade.steps_done,
                    steps: FADE_OUT_STEPS,
                });
            }
        }

        if now >= armed.end_at {
            let restore_volume = armed.fade.as_ref().map(|fade| fade.original_volume);
            self.armed = None;
            events.push(TimerEvent::Expired { restore_volume });
        }

        events
    }

    /// Time left until the scheduled stop; `None` while idle.
    ///
    /// Pure observation for the countdown display. The stop itself only ever
    /// comes out of [`tick`](Self::tick).
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|armed| armed.end_at.saturating_duration_since(now))
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Whether the fade-out window has begun
    pub fn is_fading(&self, now: Instant) -> bool {
        self.armed
            .as_ref()
            .and_then(|armed| armed.fade.as_ref())
            .map(|fade| now >= fade.starts_at)
            .unwrap_or(false)
    }

    /// Whether the armed timer will fade out before stopping
    pub fn fade_out_enabled(&self) -> bool {
        self.armed
            .as_ref()
            .map(|armed| armed.fade.is_some())
            .unwrap_or(false)
    }

    /// Total configured duration of the armed timer
    pub fn total(&self) -> Option<Duration> {
        self.armed.as_ref().map(|armed| armed.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(60);
    const SEC: Duration = Duration::from_secs(1);

    fn fade_steps(events: &[TimerEvent]) -> Vec<(u32, f32)> {
        events
            .iter()
            .filter_map(|event| match event {
                TimerEvent::FadeStep { volume, step, .. } => Some((*step, *volume)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn arm_sets_exact_end_time() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 1, 30, false, 0.7).unwrap();
        assert_eq!(timer.remaining(t0), Some(90 * MIN));
        assert_eq!(timer.total(), Some(90 * MIN));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        assert!(matches!(
            timer.arm(t0, 0, 0, false, 0.7),
            Err(TimerError::ZeroDuration)
        ));
        assert!(!timer.is_armed());
    }

    #[test]
    fn invalid_arm_leaves_existing_timer_running() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 30, false, 0.7).unwrap();
        assert!(timer.arm(t0, 0, 0, false, 0.7).is_err());

        assert!(timer.is_armed());
        assert_eq!(timer.remaining(t0), Some(30 * MIN));
        // The surviving schedule still fires.
        let events = timer.tick(t0 + 30 * MIN);
        assert_eq!(events, vec![TimerEvent::Expired { restore_volume: None }]);
    }

    #[test]
    fn rearm_replaces_previous_schedule() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 5, true, 0.8).unwrap();
        timer.arm(t0, 1, 0, false, 0.8).unwrap();

        assert_eq!(timer.remaining(t0), Some(60 * MIN));
        assert!(!timer.fade_out_enabled());

        // Nothing from the first schedule fires at its old deadline.
        assert!(timer.tick(t0 + 5 * MIN).is_empty());
        // Exactly one stop fires, at the new deadline.
        let events = timer.tick(t0 + 60 * MIN);
        assert_eq!(events, vec![TimerEvent::Expired { restore_volume: None }]);
        assert!(timer.tick(t0 + 61 * MIN).is_empty());
    }

    #[test]
    fn expiry_without_fade_leaves_volume_alone() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 5, false, 0.7).unwrap();
        assert!(timer.tick(t0 + 5 * MIN - SEC).is_empty());

        let events = timer.tick(t0 + 5 * MIN);
        assert_eq!(events, vec![TimerEvent::Expired { restore_volume: None }]);
        assert!(!timer.is_armed());
    }

    #[test]
    fn fade_begins_at_end_minus_window() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        // 5 minute timer: fade starts at 2:00, first step lands at 2:10.
        timer.arm(t0, 0, 5, true, 0.8).unwrap();
        assert!(timer.tick(t0 + 2 * MIN + 9 * SEC).is_empty());
        assert!(!timer.is_fading(t0 + 2 * MIN - SEC));
        assert!(timer.is_fading(t0 + 2 * MIN));

        let events = timer.tick(t0 + 2 * MIN + 10 * SEC);
        assert_eq!(fade_steps(&events), vec![(1, 0.8 * (1.0 - 1.0 / 18.0))]);
    }

    #[test]
    fn fade_step_values_follow_linear_ramp() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 5, true, 0.8).unwrap();

        // Walk the whole ramp one second at a time.
        let mut steps = Vec::new();
        let mut at = t0;
        while timer.is_armed() {
            at += SEC;
            steps.extend(fade_steps(&timer.tick(at)));
        }

        assert_eq!(steps.len(), FADE_OUT_STEPS as usize);
        for (k, volume) in &steps {
            let expected = if *k == FADE_OUT_STEPS {
                0.0
            } else {
                0.8 * (1.0 - *k as f32 / FADE_OUT_STEPS as f32)
            };
            assert!((volume - expected).abs() < 1e-6, "step {k}: {volume}");
        }

        // Second-to-last step is original/18, per the reference ramp.
        let (_, penultimate) = steps[steps.len() - 2];
        assert!((penultimate - 0.8 / 18.0).abs() < 1e-6);
    }

    #[test]
    fn fade_reaches_zero_then_expiry_restores_snapshot() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 5, true, 0.8).unwrap();

        // Drive up to one second before the end.
        let mut at = t0;
        while at < t0 + 5 * MIN - SEC {
            at += SEC;
            timer.tick(at);
        }

        // The stop instant carries both the final zero step and the restore.
        let events = timer.tick(t0 + 5 * MIN);
        assert_eq!(
            events,
            vec![
                TimerEvent::FadeStep {
                    volume: 0.0,
                    step: FADE_OUT_STEPS,
                    steps: FADE_OUT_STEPS
                },
                TimerEvent::Expired {
                    restore_volume: Some(0.8)
                },
            ]
        );
        assert!(!timer.is_armed());
    }

    #[test]
    fn delayed_tick_catches_up_and_expires_once() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 5, true, 0.9).unwrap();

        // Host tick was throttled: one late call sees the whole ramp.
        let events = timer.tick(t0 + 7 * MIN);
        let steps = fade_steps(&events);
        assert_eq!(steps.len(), FADE_OUT_STEPS as usize);
        assert_eq!(steps.last(), Some(&(FADE_OUT_STEPS, 0.0)));
        assert_eq!(
            events.last(),
            Some(&TimerEvent::Expired {
                restore_volume: Some(0.9)
            })
        );
        assert!(timer.tick(t0 + 8 * MIN).is_empty());
    }

    #[test]
    fn cancel_mid_fade_reports_snapshot() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 5, true, 0.8).unwrap();
        // Three steps in, observable volume is well below the snapshot.
        let events = timer.tick(t0 + 2 * MIN + 30 * SEC);
        assert_eq!(fade_steps(&events).len(), 3);

        assert_eq!(timer.cancel(), Some(0.8));
        assert!(!timer.is_armed());
        assert!(timer.tick(t0 + 5 * MIN).is_empty());
    }

    #[test]
    fn cancel_without_fade_has_no_volume_to_restore() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 5, false, 0.8).unwrap();
        assert_eq!(timer.cancel(), None);

        // Idempotent on an idle timer.
        assert_eq!(timer.cancel(), None);
    }

    #[test]
    fn short_duration_starts_fade_immediately() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        // 2 minutes is shorter than the 3 minute window: first step at 0:10.
        timer.arm(t0, 0, 2, true, 0.6).unwrap();
        assert!(timer.is_fading(t0));

        let events = timer.tick(t0 + 10 * SEC);
        assert_eq!(fade_steps(&events), vec![(1, 0.6 * (1.0 - 1.0 / 18.0))]);

        // The ramp cannot finish in time; expiry tears it down and restores.
        let mut at = t0 + 10 * SEC;
        let mut last = Vec::new();
        while timer.is_armed() {
            at += SEC;
            last = timer.tick(at);
        }
        assert_eq!(
            last.last(),
            Some(&TimerEvent::Expired {
                restore_volume: Some(0.6)
            })
        );
        // Only the steps that fit before the end fired: 120s / 10s = 12.
        assert!(timer.tick(at + SEC).is_empty());
    }

    #[test]
    fn remaining_counts_down_and_saturates() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();

        timer.arm(t0, 0, 10, false, 0.5).unwrap();
        assert_eq!(timer.remaining(t0 + 4 * MIN), Some(6 * MIN));
        assert_eq!(timer.remaining(t0 + 11 * MIN), Some(Duration::ZERO));

        timer.tick(t0 + 10 * MIN);
        assert_eq!(timer.remaining(t0 + 10 * MIN), None);
    }
}
