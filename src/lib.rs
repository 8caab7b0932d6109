//! # fnlloyd-swarm
//!
//! A game character drawn as a swarm of particles, for 2D arcade games.
//!
//! The swarm rests on a procedural humanoid silhouette (or a loaded model),
//! breathes, ripples with a two-source wave field and reacts to game events
//! with short-lived pulses, explosions, glows, flickers and celebrations.
//! The same simulation runs on a wgpu compute pipeline or, when no GPU is
//! available, on a CPU loop drawing onto a [`Canvas`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use fnlloyd_swarm::prelude::*;
//!
//! let mut swarm = Swarm::new(SwarmConfig::new().with_canvas(1280.0, 720.0));
//! swarm.init(None); // CPU fallback
//!
//! let mut canvas = FrameBuffer::new(1280, 720);
//! swarm.react(ReactionKind::Pulse, 1.0);
//! swarm.update(640.0, 600.0, 16.0, 0.016, 0.0);
//! swarm.render(Some(&mut canvas), None, 0.0);
//! ```
//!
//! With a GPU, pass the device and surface format to [`Swarm::init`] and
//! hand a render pass to [`Swarm::render`]:
//!
//! ```ignore
//! swarm.init(Some((GpuContext::new(device, queue), surface_format)));
//! // each frame
//! swarm.update(x, y, time_ms, dt, combo);
//! swarm.render(None, Some(&mut render_pass), combo);
//! ```
//!
//! ## Reactions
//!
//! | Kind | Duration | Effect |
//! |------|----------|--------|
//! | [`ReactionKind::Pulse`] | 300 ms | particles grow, fading out |
//! | [`ReactionKind::Explode`] | 500 ms | random velocity kicks |
//! | [`ReactionKind::Glow`] | 500 ms | colors shift toward the highlight |
//! | [`ReactionKind::Flicker`] | 250 ms | opacity square wave |
//! | [`ReactionKind::Celebrate`] | 2000 ms | rainbow hue sweep |
//!
//! Simultaneous reactions of one kind combine by maximum, never by sum.

pub mod backend;
pub mod bones;
pub mod canvas;
pub mod config;
pub mod cpu;
pub mod error;
pub mod fx;
pub mod glyph;
pub mod gpu;
pub mod intro;
pub mod model;
pub mod palette;
pub mod particle;
pub mod reactions;
pub mod swarm;
pub mod time;
pub mod wave;

pub use backend::BackendKind;
pub use canvas::{BlendMode, Canvas, FrameBuffer};
pub use config::{BreatheConfig, SwarmConfig, WaveConfig};
pub use error::{GpuError, ModelError, ParseReactionError};
pub use fx::{BallTrails, FxPool};
pub use glyph::GlyphVertexSource;
pub use glam::{Vec2, Vec3};
pub use gpu::GpuContext;
pub use intro::IntroPhase;
pub use model::{MemoryVertexSource, ObjVertexSource, VertexCloud, VertexSource};
pub use palette::{Color, Palette};
pub use particle::Particle;
pub use reactions::{ModifierBundle, ReactionKind};
pub use swarm::Swarm;
pub use time::FrameClock;
pub use wave::WaveField;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use fnlloyd_swarm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backend::BackendKind;
    pub use crate::canvas::{BlendMode, Canvas, FrameBuffer};
    pub use crate::config::{BreatheConfig, SwarmConfig, WaveConfig};
    pub use crate::error::{GpuError, ModelError};
    pub use crate::fx::{BallTrails, FxPool};
    pub use crate::glyph::GlyphVertexSource;
    pub use crate::gpu::GpuContext;
    pub use crate::intro::IntroPhase;
    pub use crate::model::{MemoryVertexSource, ObjVertexSource, VertexCloud, VertexSource};
    pub use crate::palette::{Color, Palette};
    pub use crate::reactions::{ModifierBundle, ReactionKind};
    pub use crate::swarm::Swarm;
    pub use crate::time::FrameClock;
    pub use crate::{Vec2, Vec3};
}
