//! The character swarm: backend selection, frame routing and rest shapes.
//!
//! A [`Swarm`] owns the particles (through its backend), the reaction
//! ledger and the model loader. Hosts drive it with one
//! [`update`](Swarm::update) and one [`render`](Swarm::render) per frame.
//!
//! Within `update` the order is fixed:
//!
//! 1. a finished model load is applied to the homes,
//! 2. reactions requested since the last frame are stamped with this
//!    frame's time,
//! 3. the ledger drops expired reactions and folds the rest,
//! 4. the intro timeline, when enabled, picks this frame's spring scale,
//! 5. the backend advances the particles.
//!
//! A reaction requested before `update` is therefore visible in that same
//! frame.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::{Backend, BackendKind, FrameParams};
use crate::bones;
use crate::canvas::Canvas;
use crate::config::SwarmConfig;
use crate::cpu::CpuBackend;
use crate::error::{ModelError, ParseReactionError};
use crate::gpu::{GpuBackend, GpuContext};
use crate::intro::{IntroPhase, IntroTimeline};
use crate::model::{self, HomePositions, VertexCloud, VertexSource};
use crate::particle::Particle;
use crate::reactions::{sanitize_intensity, ModifierBundle, ReactionKind, ReactionLedger};
use crate::wave::WaveField;

type LoadResult = (String, Result<VertexCloud, ModelError>);

/// Particle character with a GPU or CPU backend.
pub struct Swarm {
    config: SwarmConfig,
    backend: Option<Backend>,
    ledger: ReactionLedger,
    pending_reactions: Vec<(ReactionKind, f32)>,
    modifiers: ModifierBundle,
    music_intensity: f32,
    rng: StdRng,
    loader: Option<Receiver<LoadResult>>,
    pending_cloud: Option<VertexCloud>,
    intro: Option<IntroTimeline>,
}

impl Swarm {
    pub fn new(config: SwarmConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let intro = config.intro.then(IntroTimeline::new);
        Self {
            config,
            backend: None,
            ledger: ReactionLedger::new(),
            pending_reactions: Vec::new(),
            modifiers: ModifierBundle::NONE,
            music_intensity: 0.0,
            rng,
            loader: None,
            pending_cloud: None,
            intro,
        }
    }

    /// Pick a backend. Never fails: without a GPU context, or if the GPU
    /// backend cannot be built, the CPU fallback is used.
    ///
    /// Calling `init` again keeps the existing backend.
    pub fn init(&mut self, gpu: Option<(GpuContext, wgpu::TextureFormat)>) -> BackendKind {
        if let Some(backend) = &self.backend {
            log::warn!("Swarm already initialized on the {} backend", backend.kind());
            return backend.kind();
        }

        let backend = match gpu {
            Some((ctx, format)) => {
                let particles = bones::generate(self.config.particle_count, &self.config, &mut self.rng);
                match GpuBackend::new(&ctx, format, &particles, &self.config) {
                    Ok(gpu) => Backend::Gpu(gpu),
                    Err(e) => {
                        log::warn!("GPU backend unavailable ({}), falling back to CPU", e);
                        self.cpu_backend()
                    }
                }
            }
            None => {
                log::info!("No GPU context provided, using CPU fallback");
                self.cpu_backend()
            }
        };

        log::info!(
            "Swarm running on the {} backend with {} particles",
            backend.kind(),
            backend.particle_count()
        );
        let kind = backend.kind();
        self.backend = Some(backend);

        if let Some(cloud) = self.pending_cloud.take() {
            if let Err(e) = self.apply_model(&cloud) {
                log::warn!("Deferred model could not be applied: {}", e);
            }
        }
        kind
    }

    fn cpu_backend(&mut self) -> Backend {
        let particles = bones::generate(self.config.cpu_particle_count, &self.config, &mut self.rng);
        Backend::Cpu(CpuBackend::new(particles, &self.config))
    }

    /// Fetch a model on a background thread.
    ///
    /// The result is applied on a later [`update`](Self::update). A newer
    /// request replaces one still in flight. Failures keep the current
    /// shape.
    pub fn load_model(&mut self, source: Arc<dyn VertexSource>, url: impl Into<String>) {
        let url = url.into();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("swarm-model-loader".into())
            .spawn(move || {
                let result = source.fetch(&url);
                // The swarm may have been dropped or moved on to another model
                let _ = tx.send((url, result));
            });

        match spawned {
            Ok(_) => self.loader = Some(rx),
            Err(e) => log::warn!("Could not start model loader: {}", e),
        }
    }

    pub fn is_loading_model(&self) -> bool {
        self.loader.is_some()
    }

    /// Resample `cloud` into home positions and apply them now.
    ///
    /// Before [`init`](Self::init) the cloud is kept and applied once a
    /// backend exists.
    pub fn apply_model(&mut self, cloud: &VertexCloud) -> Result<(), ModelError> {
        let Some(count) = self.backend.as_ref().map(|b| b.particle_count() as usize) else {
            self.pending_cloud = Some(cloud.clone());
            return Ok(());
        };

        let scale = self.config.model_scale;
        let homes = model::sample(cloud, count, scale.x, scale.y, &mut self.rng)?;
        self.write_homes(&homes);
        log::info!("Applied model: {} vertices onto {} particles", cloud.len(), count);
        Ok(())
    }

    /// Replace homes with caller-supplied offsets, padded or truncated to
    /// the particle count.
    ///
    /// Input containing a NaN or infinite coordinate is rejected and the
    /// current homes are kept.
    pub fn set_home_positions(&mut self, home_x: &[f32], home_y: &[f32]) {
        let Some(count) = self.backend.as_ref().map(|b| b.particle_count() as usize) else {
            log::warn!("Ignoring home positions: swarm is not initialized");
            return;
        };
        let n = home_x.len().min(home_y.len());
        if let Some(index) = (0..n).find(|&i| !(home_x[i].is_finite() && home_y[i].is_finite())) {
            log::warn!("Ignoring home positions, keeping current shape: {}", ModelError::NonFinite { index });
            return;
        }
        if n != count {
            log::debug!("Fitting {} home positions to {} particles", n, count);
        }
        let homes = model::pad_or_truncate(home_x, home_y, count, self.config.model_scale, &mut self.rng);
        self.write_homes(&homes);
    }

    /// Return to the procedural bone silhouette.
    pub fn reset_shape(&mut self) {
        let Some(count) = self.backend.as_ref().map(|b| b.particle_count()) else {
            return;
        };
        let mut homes = HomePositions::with_capacity(count as usize);
        for (home, _) in bones::generate_homes(count, &mut self.rng) {
            homes.push(home);
        }
        self.write_homes(&homes);
    }

    fn write_homes(&mut self, homes: &HomePositions) {
        match &mut self.backend {
            Some(Backend::Gpu(gpu)) => gpu.write_home_positions(homes),
            Some(Backend::Cpu(cpu)) => cpu.write_home_positions(homes),
            None => {}
        }
    }

    fn poll_loader(&mut self) {
        let received = match &self.loader {
            Some(rx) => rx.try_recv(),
            None => return,
        };

        match received {
            Ok((url, Ok(cloud))) => {
                self.loader = None;
                if let Err(e) = self.apply_model(&cloud) {
                    log::warn!("Model '{}' could not be applied, keeping current shape: {}", url, e);
                }
            }
            Ok((url, Err(e))) => {
                self.loader = None;
                log::warn!("Model '{}' failed to load, keeping current shape: {}", url, e);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.loader = None;
                log::warn!("Model loader exited without a result");
            }
        }
    }

    /// Queue a reaction. It starts at the next [`update`](Self::update).
    pub fn react(&mut self, kind: ReactionKind, intensity: f32) {
        self.pending_reactions.push((kind, sanitize_intensity(intensity)));
    }

    /// Queue a reaction by kind or game-event name. Unknown names are
    /// logged and ignored.
    pub fn react_named(&mut self, name: &str, intensity: f32) -> Result<(), ParseReactionError> {
        match name.parse::<ReactionKind>() {
            Ok(kind) => {
                self.react(kind, intensity);
                Ok(())
            }
            Err(e) => {
                log::warn!("Ignoring reaction: {}", e);
                Err(e)
            }
        }
    }

    /// Current opening-sequence phase. Always `Ready` when the intro is
    /// disabled.
    pub fn intro_phase(&self) -> IntroPhase {
        self.intro.as_ref().map_or(IntroPhase::Ready, IntroTimeline::phase)
    }

    /// Progress through [`intro_phase`](Self::intro_phase) in `[0, 1]`.
    pub fn intro_progress(&self) -> f32 {
        self.intro.as_ref().map_or(1.0, IntroTimeline::progress)
    }

    /// Play the opening sequence again from the next update, enabling it
    /// if it was off.
    pub fn replay_intro(&mut self) {
        self.intro.get_or_insert_with(IntroTimeline::new).restart();
    }

    /// Music intensity drives wave amplitude. Clamped to `[0, 1]`.
    pub fn set_music_intensity(&mut self, value: f32) {
        self.music_intensity = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn music_intensity(&self) -> f32 {
        self.music_intensity
    }

    /// Current wave displacement amplitude in pixels.
    pub fn wave_amplitude(&self) -> f32 {
        WaveField::new(self.config.wave).amplitude(self.music_intensity)
    }

    /// Advance one frame.
    ///
    /// `time_ms` is milliseconds since the host started and `dt` is the
    /// frame delta in seconds. Does nothing before [`init`](Self::init).
    pub fn update(&mut self, target_x: f32, target_y: f32, time_ms: f64, dt: f32, combo_glow: f32) {
        if self.backend.is_none() {
            return;
        }

        self.poll_loader();

        for (kind, intensity) in self.pending_reactions.drain(..) {
            self.ledger.add(kind, intensity, time_ms);
        }
        self.modifiers = self.ledger.evaluate(time_ms);

        let spring_scale = match &mut self.intro {
            Some(intro) => intro.advance(time_ms).spring_scale(),
            None => 1.0,
        };

        let frame = FrameParams {
            target: Vec2::new(target_x, target_y),
            time_ms,
            dt,
            combo_glow,
            music_intensity: self.music_intensity,
            spring_scale,
        };

        match &mut self.backend {
            Some(Backend::Gpu(gpu)) => gpu.update(&frame, &self.modifiers),
            Some(Backend::Cpu(cpu)) => cpu.update(&frame, &self.modifiers),
            None => {}
        }
    }

    /// Draw the swarm.
    ///
    /// The GPU backend records into `pass`; the CPU backend draws onto
    /// `canvas`. A handle that does not match the active backend is
    /// ignored.
    pub fn render(
        &self,
        canvas: Option<&mut dyn Canvas>,
        pass: Option<&mut wgpu::RenderPass<'_>>,
        combo_glow: f32,
    ) {
        match (&self.backend, canvas, pass) {
            (Some(Backend::Cpu(cpu)), Some(canvas), _) => cpu.render(canvas, &self.modifiers, combo_glow),
            (Some(Backend::Gpu(gpu)), _, Some(pass)) => gpu.render(pass, &self.modifiers, combo_glow),
            _ => {}
        }
    }

    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(Backend::kind)
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Particle count of the active backend, 0 before init.
    pub fn particle_count(&self) -> u32 {
        self.backend.as_ref().map_or(0, Backend::particle_count)
    }

    /// Modifiers computed by the last update.
    pub fn modifiers(&self) -> ModifierBundle {
        self.modifiers
    }

    /// Reactions currently in the ledger.
    pub fn active_reactions(&self) -> usize {
        self.ledger.len()
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// CPU-side particles. `None` on the GPU backend, which never reads
    /// its buffer back.
    pub fn cpu_particles(&self) -> Option<&[Particle]> {
        match &self.backend {
            Some(Backend::Cpu(cpu)) => Some(cpu.particles()),
            _ => None,
        }
    }
}
