//! Settling-delay debouncing of raw gesture classifications.
//!
//! Landmark-based pose estimation regularly misclassifies single frames. The [`Debouncer`] only
//! confirms a gesture once the classifier has reported it continuously for a settling delay, at the
//! cost of that much latency before any gesture takes effect.
//!
//! A confirmed gesture is released as soon as the raw classification differs from it, unless a
//! dropout grace period is configured. With a grace period, the confirmed gesture survives contrary
//! classifications until they have persisted for the whole grace period.
//!
//! Ticks without a hand are reported through [`Debouncer::hold`]. They leave the state as it is,
//! but the time spent without a hand counts towards neither the settling delay nor the grace
//! period.

use std::time::Duration;

use crate::classifier::GestureId;

/// Debouncer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No gesture confirmed or pending.
    Idle,
    /// `gesture` has been reported continuously since `since`, but not for long enough yet.
    Pending { gesture: GestureId, since: Duration },
    /// `gesture` is confirmed.
    ///
    /// `dropout_since` is set while a grace period is running: the raw classification has differed
    /// from `gesture` since then.
    Confirmed {
        gesture: GestureId,
        dropout_since: Option<Duration>,
    },
}

/// State change caused by a single [`Debouncer::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing of note happened.
    None,
    /// A new gesture started settling (possibly replacing one that was pending).
    Pending(GestureId),
    /// The pending gesture was confirmed.
    Confirmed(GestureId),
    /// The confirmed gesture was released; the debouncer is idle.
    Released(GestureId),
    /// A pending gesture was dropped before being confirmed.
    Abandoned(GestureId),
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    settling_delay: Duration,
    dropout_grace: Duration,
    state: DebounceState,
    /// Start of the current run of ticks without a hand.
    absent_since: Option<Duration>,
}

impl Debouncer {
    /// Creates a debouncer that confirms gestures after `settling_delay` and releases them after
    /// `dropout_grace` (zero releases immediately).
    pub fn new(settling_delay: Duration, dropout_grace: Duration) -> Self {
        Self {
            settling_delay,
            dropout_grace,
            state: DebounceState::Idle,
            absent_since: None,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Returns the confirmed gesture, if any.
    pub fn confirmed(&self) -> Option<GestureId> {
        match self.state {
            DebounceState::Confirmed { gesture, .. } => Some(gesture),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = DebounceState::Idle;
        self.absent_since = None;
    }

    /// Records a tick at time `now` on which no hand was observed.
    ///
    /// The state is kept, and the time until the next [`update`][Self::update] is excluded from
    /// the settling delay and the grace period.
    pub fn hold(&mut self, now: Duration) {
        self.absent_since.get_or_insert(now);
    }

    /// Shifts all running timers forward by `gap`.
    fn skip(&mut self, gap: Duration) {
        match &mut self.state {
            DebounceState::Idle => {}
            DebounceState::Pending { since, .. } => *since += gap,
            DebounceState::Confirmed { dropout_since, .. } => {
                if let Some(since) = dropout_since {
                    *since += gap;
                }
            }
        }
    }

    /// Feeds the raw classification for the tick at time `now`.
    ///
    /// At most one state transition happens per call.
    pub fn update(&mut self, now: Duration, raw: Option<GestureId>) -> Transition {
        use DebounceState::*;

        if let Some(absent_since) = self.absent_since.take() {
            self.skip(now.saturating_sub(absent_since));
        }

        let (state, transition) = match (self.state, raw) {
            (Idle, None) => (Idle, Transition::None),
            (Idle, Some(g)) => (
                Pending {
                    gesture: g,
                    since: now,
                },
                Transition::Pending(g),
            ),
            (Pending { gesture, since }, Some(g)) if g == gesture => {
                if now.saturating_sub(since) >= self.settling_delay {
                    (
                        Confirmed {
                            gesture,
                            dropout_since: None,
                        },
                        Transition::Confirmed(gesture),
                    )
                } else {
                    (self.state, Transition::None)
                }
            }
            (Pending { .. }, Some(g)) => (
                Pending {
                    gesture: g,
                    since: now,
                },
                Transition::Pending(g),
            ),
            (Pending { gesture, .. }, None) => (Idle, Transition::Abandoned(gesture)),
            (Confirmed { gesture, .. }, Some(g)) if g == gesture => (
                Confirmed {
                    gesture,
                    dropout_since: None,
                },
                Transition::None,
            ),
            (
                Confirmed {
                    gesture,
                    dropout_since,
                },
                _,
            ) => {
                let dropout_since = dropout_since.unwrap_or(now);
                if now.saturating_sub(dropout_since) >= self.dropout_grace {
                    (Idle, Transition::Released(gesture))
                } else {
                    (
                        Confirmed {
                            gesture,
                            dropout_since: Some(dropout_since),
                        },
                        Transition::None,
                    )
                }
            }
        };

        self.state = state;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(10);

    fn g(i: usize) -> GestureId {
        crate::classifier::Catalogue::default()
            .iter()
            .nth(i)
            .unwrap()
            .0
    }

    /// Feeds `raw` for `ticks` ticks starting at `*time`, returning all transitions.
    fn feed(
        d: &mut Debouncer,
        time: &mut Duration,
        raw: Option<GestureId>,
        ticks: usize,
    ) -> Vec<Transition> {
        (0..ticks)
            .map(|_| {
                let t = d.update(*time, raw);
                *time += TICK;
                t
            })
            .collect()
    }

    fn count_confirmed(transitions: &[Transition]) -> usize {
        transitions
            .iter()
            .filter(|t| matches!(t, Transition::Confirmed(_)))
            .count()
    }

    #[test]
    fn short_gesture_never_confirms() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            let delay_ticks = rng.usize(1..20);
            let mut d = Debouncer::new(TICK * delay_ticks as u32, Duration::ZERO);
            let mut time = Duration::ZERO;

            // Seen on `delay_ticks` consecutive ticks spans only `delay_ticks - 1` tick periods.
            let transitions = feed(&mut d, &mut time, Some(g(0)), delay_ticks);
            assert_eq!(count_confirmed(&transitions), 0);
            feed(&mut d, &mut time, None, 1);
            assert_eq!(d.state(), DebounceState::Idle);
        }
    }

    #[test]
    fn sustained_gesture_confirms_once() {
        let mut d = Debouncer::new(Duration::from_millis(100), Duration::ZERO);
        let mut time = Duration::ZERO;

        let transitions = feed(&mut d, &mut time, Some(g(1)), 50);
        assert_eq!(transitions[0], Transition::Pending(g(1)));
        assert_eq!(transitions[10], Transition::Confirmed(g(1)));
        assert_eq!(count_confirmed(&transitions), 1);
        assert_eq!(d.confirmed(), Some(g(1)));

        // Stays confirmed until the classification changes, then drops immediately.
        assert_eq!(d.update(time, Some(g(2))), Transition::Released(g(1)));
        assert_eq!(d.state(), DebounceState::Idle);
    }

    #[test]
    fn changing_gesture_restarts_timer() {
        let mut d = Debouncer::new(Duration::from_millis(50), Duration::ZERO);
        let mut time = Duration::ZERO;

        feed(&mut d, &mut time, Some(g(0)), 4);
        let switch_time = time;
        assert_eq!(d.update(time, Some(g(1))), Transition::Pending(g(1)));
        time += TICK;
        assert_eq!(
            d.state(),
            DebounceState::Pending {
                gesture: g(1),
                since: switch_time
            }
        );

        let transitions = feed(&mut d, &mut time, Some(g(1)), 5);
        assert_eq!(transitions.last(), Some(&Transition::Confirmed(g(1))));
    }

    #[test]
    fn alternating_gestures_never_confirm() {
        let mut d = Debouncer::new(Duration::from_millis(20), Duration::ZERO);
        let mut time = Duration::ZERO;
        for i in 0..100 {
            let t = d.update(time, Some(g(i % 2)));
            assert_ne!(t, Transition::Confirmed(g(i % 2)));
            time += TICK;
        }
    }

    #[test]
    fn missing_gesture_abandons_pending() {
        let mut d = Debouncer::new(Duration::from_millis(50), Duration::ZERO);
        d.update(Duration::ZERO, Some(g(0)));
        assert_eq!(d.update(TICK, None), Transition::Abandoned(g(0)));
        assert_eq!(d.state(), DebounceState::Idle);
    }

    #[test]
    fn zero_delay_confirms_on_second_tick() {
        let mut d = Debouncer::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(d.update(Duration::ZERO, Some(g(0))), Transition::Pending(g(0)));
        assert_eq!(d.update(TICK, Some(g(0))), Transition::Confirmed(g(0)));
    }

    #[test]
    fn grace_period_survives_short_dropout() {
        let mut d = Debouncer::new(Duration::ZERO, Duration::from_millis(30));
        let mut time = Duration::ZERO;
        feed(&mut d, &mut time, Some(g(0)), 2);
        assert_eq!(d.confirmed(), Some(g(0)));

        // One misclassified frame.
        feed(&mut d, &mut time, Some(g(1)), 1);
        assert_eq!(d.confirmed(), Some(g(0)));
        feed(&mut d, &mut time, Some(g(0)), 1);
        assert_eq!(
            d.state(),
            DebounceState::Confirmed {
                gesture: g(0),
                dropout_since: None
            }
        );

        // A sustained change releases after the grace period.
        let transitions = feed(&mut d, &mut time, None, 4);
        assert_eq!(
            transitions,
            [
                Transition::None,
                Transition::None,
                Transition::None,
                Transition::Released(g(0)),
            ]
        );
    }

    #[test]
    fn time_without_hand_does_not_count_towards_settling() {
        let mut d = Debouncer::new(Duration::from_millis(150), Duration::ZERO);
        let mut time = Duration::ZERO;

        assert_eq!(d.update(time, Some(g(1))), Transition::Pending(g(1)));
        for _ in 0..20 {
            time += TICK;
            d.hold(time);
        }
        time += TICK;
        assert_eq!(d.update(time, Some(g(1))), Transition::None);
        assert_eq!(
            d.state(),
            DebounceState::Pending {
                gesture: g(1),
                since: Duration::from_millis(200)
            }
        );

        // Observed ticks keep counting after the gap: 220ms..=350ms.
        time += TICK;
        let transitions = feed(&mut d, &mut time, Some(g(1)), 14);
        assert_eq!(count_confirmed(&transitions), 1);
        assert_eq!(transitions[13], Transition::Confirmed(g(1)));
    }

    #[test]
    fn time_without_hand_does_not_count_towards_grace() {
        let mut d = Debouncer::new(Duration::ZERO, Duration::from_millis(30));
        let mut time = Duration::ZERO;
        feed(&mut d, &mut time, Some(g(0)), 2);
        assert_eq!(d.confirmed(), Some(g(0)));

        feed(&mut d, &mut time, Some(g(1)), 1);
        for _ in 0..10 {
            d.hold(time);
            time += TICK;
        }
        assert_eq!(d.update(time, Some(g(1))), Transition::None);
        assert_eq!(d.confirmed(), Some(g(0)));
    }

    #[test]
    fn clock_going_backwards_does_not_confirm() {
        let mut d = Debouncer::new(Duration::from_millis(50), Duration::ZERO);
        d.update(Duration::from_secs(1), Some(g(0)));
        assert_eq!(d.update(Duration::ZERO, Some(g(0))), Transition::None);
    }
}
