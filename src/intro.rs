//! Opening sequence for a freshly spawned swarm.
//!
//! With [`SwarmConfig::intro`](crate::SwarmConfig::intro) enabled, the
//! swarm walks through seven timed phases before settling. Each phase
//! scales the spring force, so particles wait at the spawn origin, drift
//! toward the silhouette, then snap in.
//!
//! | Phase | Seconds | Spring |
//! |-------|---------|--------|
//! | Void | 0 to 1 | 0 |
//! | Awakening | 1 to 10 | 1/3 |
//! | Tuning | 10 to 16 | 2/3 |
//! | Coalescing | 16 to 22 | 1 |
//! | Emergence | 22 to 26 | 1 |
//! | Transition | 26 to 28 | 1 |
//! | Ready | 28 on | 1 |

use std::fmt;

/// One step of the opening sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntroPhase {
    Void,
    Awakening,
    Tuning,
    Coalescing,
    Emergence,
    Transition,
    Ready,
}

impl IntroPhase {
    pub const ALL: [IntroPhase; 7] = [
        IntroPhase::Void,
        IntroPhase::Awakening,
        IntroPhase::Tuning,
        IntroPhase::Coalescing,
        IntroPhase::Emergence,
        IntroPhase::Transition,
        IntroPhase::Ready,
    ];

    /// Start and end of the phase in seconds since the first update.
    /// `Ready` has no end.
    pub fn span(self) -> (f64, f64) {
        match self {
            IntroPhase::Void => (0.0, 1.0),
            IntroPhase::Awakening => (1.0, 10.0),
            IntroPhase::Tuning => (10.0, 16.0),
            IntroPhase::Coalescing => (16.0, 22.0),
            IntroPhase::Emergence => (22.0, 26.0),
            IntroPhase::Transition => (26.0, 28.0),
            IntroPhase::Ready => (28.0, f64::INFINITY),
        }
    }

    /// Multiplier on the configured spring force.
    pub fn spring_scale(self) -> f32 {
        match self {
            IntroPhase::Void => 0.0,
            IntroPhase::Awakening => 1.0 / 3.0,
            IntroPhase::Tuning => 2.0 / 3.0,
            _ => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntroPhase::Void => "void",
            IntroPhase::Awakening => "awakening",
            IntroPhase::Tuning => "tuning",
            IntroPhase::Coalescing => "coalescing",
            IntroPhase::Emergence => "emergence",
            IntroPhase::Transition => "transition",
            IntroPhase::Ready => "ready",
        }
    }

    /// Phase and progress in `[0, 1]` at `elapsed` seconds. `Ready` is
    /// always fully progressed.
    pub fn at(elapsed: f64) -> (IntroPhase, f32) {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        for phase in IntroPhase::ALL {
            let (start, end) = phase.span();
            if elapsed < end {
                if end.is_infinite() {
                    return (phase, 1.0);
                }
                let progress = ((elapsed - start) / (end - start)).clamp(0.0, 1.0);
                return (phase, progress as f32);
            }
        }
        (IntroPhase::Ready, 1.0)
    }
}

impl fmt::Display for IntroPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the opening sequence against host time.
///
/// The clock starts at the first [`advance`](Self::advance) so hosts can
/// pass any time base.
#[derive(Clone, Debug, Default)]
pub struct IntroTimeline {
    start_ms: Option<f64>,
    phase: Option<IntroPhase>,
    progress: f32,
}

impl IntroTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `time_ms` and return the current phase.
    pub fn advance(&mut self, time_ms: f64) -> IntroPhase {
        let start = *self.start_ms.get_or_insert(time_ms);
        let (phase, progress) = IntroPhase::at((time_ms - start) * 0.001);
        if self.phase != Some(phase) {
            log::debug!("Intro phase: {}", phase);
        }
        self.phase = Some(phase);
        self.progress = progress;
        phase
    }

    /// Current phase. `Void` until the first advance.
    pub fn phase(&self) -> IntroPhase {
        self.phase.unwrap_or(IntroPhase::Void)
    }

    /// Progress through the current phase in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Some(IntroPhase::Ready)
    }

    /// Start over from `Void` at the next advance.
    pub fn restart(&mut self) {
        *self = Self::default();
    }
}
