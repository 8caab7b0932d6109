//! Time-windowed event reactions.
//!
//! Game events append [`Reaction`]s to a [`ReactionLedger`]. Every frame the
//! ledger drops expired entries and folds the survivors into a single
//! [`ModifierBundle`] that both backends consume.
//!
//! | Kind | Duration | Contribution | Combination |
//! |------|----------|--------------|-------------|
//! | [`ReactionKind::Pulse`] | 300 ms | `scale_burst = (1-t)·i·3` | max |
//! | [`ReactionKind::Explode`] | 500 ms | `velocity_burst = (1-t)·i·8` | max |
//! | [`ReactionKind::Glow`] | 500 ms | `color_shift = (1-t)·i` | max |
//! | [`ReactionKind::Flicker`] | 250 ms | `flicker_alpha` square wave 1.0 / 0.3 | last wins |
//! | [`ReactionKind::Celebrate`] | 2000 ms | `celebrate_hue = progress·360` | last wins |
//!
//! Flicker and Celebrate overwrite instead of taking the max. Nothing
//! expires through timers: eviction happens in [`ReactionLedger::evaluate`].

use std::fmt;
use std::str::FromStr;

use crate::error::ParseReactionError;

/// Upper bound applied to reaction intensities.
pub const MAX_INTENSITY: f32 = 4.0;

/// Kind of animation event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    /// Temporary size burst.
    Pulse,
    /// Random velocity kicks.
    Explode,
    /// Color shift toward the highlight.
    Glow,
    /// Opacity square wave.
    Flicker,
    /// Rainbow hue sweep.
    Celebrate,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::Pulse,
        ReactionKind::Explode,
        ReactionKind::Glow,
        ReactionKind::Flicker,
        ReactionKind::Celebrate,
    ];

    /// How long a reaction of this kind stays active, in milliseconds.
    pub fn duration_ms(self) -> f64 {
        match self {
            ReactionKind::Pulse => 300.0,
            ReactionKind::Explode => 500.0,
            ReactionKind::Glow => 500.0,
            ReactionKind::Flicker => 250.0,
            ReactionKind::Celebrate => 2000.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReactionKind::Pulse => "pulse",
            ReactionKind::Explode => "explode",
            ReactionKind::Glow => "glow",
            ReactionKind::Flicker => "flicker",
            ReactionKind::Celebrate => "celebrate",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReactionKind {
    type Err = ParseReactionError;

    /// Accepts kind names and the game event names that trigger them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pulse" | "ballhit" => Ok(ReactionKind::Pulse),
            "explode" | "brickdestroy" => Ok(ReactionKind::Explode),
            "glow" | "powerup" => Ok(ReactionKind::Glow),
            "flicker" | "damage" => Ok(ReactionKind::Flicker),
            "celebrate" | "victory" => Ok(ReactionKind::Celebrate),
            _ => Err(ParseReactionError(s.to_string())),
        }
    }
}

/// Clamp an intensity into `[0, MAX_INTENSITY]`; non-finite values become 0.
pub fn sanitize_intensity(intensity: f32) -> f32 {
    if intensity.is_finite() {
        intensity.clamp(0.0, MAX_INTENSITY)
    } else {
        0.0
    }
}

/// One active reaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reaction {
    pub kind: ReactionKind,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub intensity: f32,
}

impl Reaction {
    pub fn new(kind: ReactionKind, intensity: f32, start_ms: f64) -> Self {
        Self {
            kind,
            start_ms,
            duration_ms: kind.duration_ms(),
            intensity: sanitize_intensity(intensity),
        }
    }

    /// Milliseconds since the reaction started, never negative.
    #[inline]
    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.start_ms).max(0.0)
    }

    #[inline]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms > self.duration_ms
    }

    /// Normalized progress in `[0, 1]`.
    #[inline]
    pub fn progress(&self, now_ms: f64) -> f32 {
        (self.elapsed_ms(now_ms) / self.duration_ms).min(1.0) as f32
    }
}

/// Per-frame aggregate of all active reactions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifierBundle {
    /// Added to every particle's size.
    pub scale_burst: f32,
    /// Magnitude of random velocity kicks.
    pub velocity_burst: f32,
    /// Blend weight toward the highlight color.
    pub color_shift: f32,
    /// Opacity multiplier, 1.0 when no flicker is active.
    pub flicker_alpha: f32,
    /// Hue in degrees, or -1.0 when no celebration is active.
    pub celebrate_hue: f32,
}

impl ModifierBundle {
    pub const NONE: ModifierBundle = ModifierBundle {
        scale_burst: 0.0,
        velocity_burst: 0.0,
        color_shift: 0.0,
        flicker_alpha: 1.0,
        celebrate_hue: -1.0,
    };

    pub fn is_celebrating(&self) -> bool {
        self.celebrate_hue >= 0.0
    }
}

impl Default for ModifierBundle {
    fn default() -> Self {
        Self::NONE
    }
}

/// Ordered list of active reactions.
#[derive(Clone, Debug, Default)]
pub struct ReactionLedger {
    reactions: Vec<Reaction>,
}

impl ReactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reaction starting at `now_ms`. Reactions are never merged.
    pub fn add(&mut self, kind: ReactionKind, intensity: f32, now_ms: f64) {
        self.reactions.push(Reaction::new(kind, intensity, now_ms));
    }

    /// Drop expired reactions and fold the rest into a bundle.
    pub fn evaluate(&mut self, now_ms: f64) -> ModifierBundle {
        self.reactions.retain(|r| !r.is_expired(now_ms));

        let mut bundle = ModifierBundle::NONE;
        for r in &self.reactions {
            let t = r.progress(now_ms);
            let fade = 1.0 - t;
            match r.kind {
                ReactionKind::Pulse => {
                    bundle.scale_burst = bundle.scale_burst.max(fade * r.intensity * 3.0);
                }
                ReactionKind::Explode => {
                    bundle.velocity_burst = bundle.velocity_burst.max(fade * r.intensity * 8.0);
                }
                ReactionKind::Glow => {
                    bundle.color_shift = bundle.color_shift.max(fade * r.intensity);
                }
                ReactionKind::Flicker => {
                    let elapsed = r.elapsed_ms(now_ms);
                    bundle.flicker_alpha = if (elapsed * 0.1).sin() > 0.0 { 1.0 } else { 0.3 };
                }
                ReactionKind::Celebrate => {
                    let elapsed = r.elapsed_ms(now_ms);
                    bundle.celebrate_hue = (elapsed / 2000.0 * 360.0) as f32;
                }
            }
        }
        bundle
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.iter()
    }

    pub fn clear(&mut self) {
        self.reactions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: f64 = 10_000.0;

    #[test]
    fn test_pulse_decays_linearly() {
        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Pulse, 1.0, T0);

        let bundle = ledger.evaluate(T0 + 150.0);
        assert!((bundle.scale_burst - 1.5).abs() < 1e-5);
        assert_eq!(ledger.len(), 1);

        let bundle = ledger.evaluate(T0 + 301.0);
        assert_eq!(bundle.scale_burst, 0.0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_overlapping_glows_take_max_not_sum() {
        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Glow, 0.4, T0);
        ledger.add(ReactionKind::Glow, 0.9, T0);

        let bundle = ledger.evaluate(T0 + 100.0);
        let fade = 1.0 - 100.0 / 500.0;
        assert!((bundle.color_shift - fade * 0.9).abs() < 1e-5);
        assert!(bundle.color_shift < fade * (0.4 + 0.9));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_explode_uses_velocity_scale() {
        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Explode, 0.5, T0);
        let bundle = ledger.evaluate(T0 + 250.0);
        assert!((bundle.velocity_burst - 0.5 * 0.5 * 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_each_reaction_ages_independently() {
        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Pulse, 1.0, T0);
        ledger.add(ReactionKind::Pulse, 1.0, T0 + 200.0);

        // First has expired, second is a third of the way through
        let bundle = ledger.evaluate(T0 + 350.0);
        assert_eq!(ledger.len(), 1);
        let expected = (1.0 - 150.0 / 300.0) * 3.0;
        assert!((bundle.scale_burst - expected).abs() < 1e-5);
    }

    #[test]
    fn test_flicker_is_a_square_wave() {
        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Flicker, 1.0, T0);

        // sin(10 * 0.1) > 0
        assert_eq!(ledger.evaluate(T0 + 10.0).flicker_alpha, 1.0);
        // sin(40 * 0.1) < 0
        assert_eq!(ledger.evaluate(T0 + 40.0).flicker_alpha, 0.3);
        // sin(70 * 0.1) > 0 again: no decay
        assert_eq!(ledger.evaluate(T0 + 70.0).flicker_alpha, 1.0);
        // Expired
        assert_eq!(ledger.evaluate(T0 + 251.0).flicker_alpha, 1.0);
    }

    // Flicker and Celebrate are last-writer-wins, unlike the max rule used
    // by Pulse, Explode and Glow. These tests pin that asymmetry.

    #[test]
    fn test_flicker_last_writer_wins() {
        let mut ledger = ReactionLedger::new();
        // At evaluation time the first is in a bright half-cycle, the second dark
        ledger.add(ReactionKind::Flicker, 1.0, T0);
        ledger.add(ReactionKind::Flicker, 1.0, T0 + 30.0);

        // First: elapsed 70 → sin(7) > 0 → 1.0; second: elapsed 40 → sin(4) < 0 → 0.3
        let bundle = ledger.evaluate(T0 + 70.0);
        assert_eq!(bundle.flicker_alpha, 0.3);
    }

    #[test]
    fn test_celebrate_last_writer_wins() {
        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Celebrate, 1.0, T0);
        ledger.add(ReactionKind::Celebrate, 1.0, T0 + 1000.0);

        // First would give 270°, the later one 90°, and the later one wins
        let bundle = ledger.evaluate(T0 + 1500.0);
        assert!((bundle.celebrate_hue - 90.0).abs() < 1e-4);
        assert!(bundle.is_celebrating());
    }

    #[test]
    fn test_default_bundle() {
        let mut ledger = ReactionLedger::new();
        let bundle = ledger.evaluate(T0);
        assert_eq!(bundle, ModifierBundle::NONE);
        assert_eq!(bundle.flicker_alpha, 1.0);
        assert_eq!(bundle.celebrate_hue, -1.0);
        assert!(!bundle.is_celebrating());
    }

    #[test]
    fn test_intensity_is_clamped() {
        assert_eq!(sanitize_intensity(-1.0), 0.0);
        assert_eq!(sanitize_intensity(100.0), MAX_INTENSITY);
        assert_eq!(sanitize_intensity(f32::NAN), 0.0);
        assert_eq!(sanitize_intensity(f32::INFINITY), 0.0);
        assert_eq!(sanitize_intensity(1.25), 1.25);

        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Pulse, 50.0, T0);
        let bundle = ledger.evaluate(T0);
        assert!((bundle.scale_burst - MAX_INTENSITY * 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_reaction_started_in_the_future_counts_from_zero() {
        let mut ledger = ReactionLedger::new();
        ledger.add(ReactionKind::Glow, 1.0, T0 + 50.0);
        let bundle = ledger.evaluate(T0);
        assert!((bundle.color_shift - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_kind_names_and_events() {
        assert_eq!("pulse".parse::<ReactionKind>().unwrap(), ReactionKind::Pulse);
        assert_eq!("ballHit".parse::<ReactionKind>().unwrap(), ReactionKind::Pulse);
        assert_eq!("brickDestroy".parse::<ReactionKind>().unwrap(), ReactionKind::Explode);
        assert_eq!(" GLOW ".parse::<ReactionKind>().unwrap(), ReactionKind::Glow);
        assert_eq!("damage".parse::<ReactionKind>().unwrap(), ReactionKind::Flicker);
        assert_eq!("victory".parse::<ReactionKind>().unwrap(), ReactionKind::Celebrate);
        assert!("dance".parse::<ReactionKind>().is_err());

        for kind in ReactionKind::ALL {
            assert_eq!(kind.to_string().parse::<ReactionKind>().unwrap(), kind);
        }
    }
}
