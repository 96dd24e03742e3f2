//! Tick sources and performance measurement tools.

use std::{
    fmt, mem,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::filter::Ema;

const EMA_ALPHA: f32 = 0.3;

/// A sampling tick, timestamped relative to the start of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick {
    pub time: Duration,
}

impl Tick {
    pub fn at(time: Duration) -> Self {
        Self { time }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::at(Duration::from_millis(ms))
    }
}

/// Produces the ticks driving a [`Controller`][crate::controller::Controller].
pub trait TickSource {
    fn next_tick(&mut self) -> Tick;
}

/// Synthetic fixed-period ticks, starting at zero. Does not consult any clock.
#[derive(Debug, Clone)]
pub struct FixedTicks {
    period: Duration,
    next: Duration,
}

impl FixedTicks {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Duration::ZERO,
        }
    }
}

impl TickSource for FixedTicks {
    fn next_tick(&mut self) -> Tick {
        let tick = Tick::at(self.next);
        self.next += self.period;
        tick
    }
}

/// Ticks timestamped with the real time elapsed since construction.
#[derive(Debug, Clone)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for WallClock {
    fn next_tick(&mut self) -> Tick {
        Tick::at(self.start.elapsed())
    }
}

/// A timer that can measure and average the time an operation takes.
///
/// Collected timings are averaged and reset when the timer is displayed using `{}`
/// ([`std::fmt::Display`]).
pub struct Timer {
    name: &'static str,
    state: Mutex<State>,
}

struct State {
    ema: Ema,
    /// The current average time.
    avg: f32,
    /// The number of time measurements that contributed to the current `avg`.
    count: usize,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(State {
                ema: Ema::new(EMA_ALPHA),
                avg: 0.0,
                count: 0,
            }),
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&self, timee: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = timee();
        self.record(start.elapsed());
        result
    }

    fn record(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.avg = state.ema.push(duration.as_secs_f32());
        state.count += 1;
    }
}

/// Displays the average recorded time and resets it.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.ema.reset();

        let avg = mem::replace(&mut state.avg, 0.0);
        let len = mem::replace(&mut state.count, 0);
        let avg_ms = avg * 1000.0;

        write!(f, "{}: {len}x{avg_ms:.02}ms", self.name)
    }
}

/// Logs ticks per second with optional extra data.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter by 1 and logs FPS and `extra` if one second has passed.
    pub fn tick_with<D: fmt::Display>(&mut self, extra: D) {
        self.frames += 1;
        if self.start.elapsed() > Duration::from_secs(1) {
            log::debug!("{}: {} FPS ({})", self.name, self.frames, extra);

            self.frames = 0;
            self.start = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ticks() {
        let mut ticks = FixedTicks::new(Duration::from_millis(10));
        let times = (0..4)
            .map(|_| ticks.next_tick().time.as_millis())
            .collect::<Vec<_>>();
        assert_eq!(times, [0, 10, 20, 30]);
    }

    #[test]
    fn wall_clock_is_monotonic() {
        let mut clock = WallClock::new();
        let a = clock.next_tick();
        let b = clock.next_tick();
        assert!(b >= a);
    }

    #[test]
    fn timer_display_resets() {
        let timer = Timer::new("tick");
        assert_eq!(timer.time(|| 5), 5);
        timer.time(|| ());

        let shown = timer.to_string();
        assert!(shown.starts_with("tick: 2x"), "{shown}");
        assert_eq!(timer.to_string(), "tick: 0x0.00ms");
    }
}
