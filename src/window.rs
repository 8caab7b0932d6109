use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use fnlloyd_swarm::prelude::*;

use crate::overlay::CanvasOverlay;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

const MUSIC_ON: f32 = 0.9;
const COMBO_DECAY_PER_SEC: f32 = 0.5;

/// Errors that end the demo.
#[derive(Debug)]
pub enum DemoError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    Gpu(GpuError),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            DemoError::Window(e) => write!(f, "Failed to create window: {}", e),
            DemoError::Gpu(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::EventLoop(e) => Some(e),
            DemoError::Window(e) => Some(e),
            DemoError::Gpu(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for DemoError {
    fn from(e: winit::error::EventLoopError) -> Self {
        DemoError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for DemoError {
    fn from(e: winit::error::OsError) -> Self {
        DemoError::Window(e)
    }
}

impl From<GpuError> for DemoError {
    fn from(e: GpuError) -> Self {
        DemoError::Gpu(e)
    }
}

impl From<wgpu::CreateSurfaceError> for DemoError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        DemoError::Gpu(GpuError::from(e))
    }
}

struct DemoState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    ctx: GpuContext,
    config: wgpu::SurfaceConfiguration,
    swarm: Swarm,
    overlay: CanvasOverlay,
    fx: FxPool,
    trails: BallTrails,
    clock: FrameClock,
    canvas_size: Vec2,
    cursor: Vec2,
    music_on: bool,
    combo: f32,
}

impl DemoState {
    fn new(window: Arc<Window>, model_path: Option<&PathBuf>) -> Result<Self, DemoError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;
        let (ctx, adapter) = pollster::block_on(GpuContext::request(&instance, Some(&surface)))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &config);

        let canvas_size = Vec2::new(config.width as f32, config.height as f32);
        let mut swarm = Swarm::new(SwarmConfig::new().with_canvas(canvas_size.x, canvas_size.y));
        swarm.init(Some((ctx.clone(), surface_format)));

        if let Some(path) = model_path {
            swarm.load_model(Arc::new(ObjVertexSource::new(".")), path.to_string_lossy());
        }

        let overlay = CanvasOverlay::new(&ctx.device, config.width, config.height, surface_format);

        Ok(Self {
            window,
            surface,
            ctx,
            config,
            swarm,
            overlay,
            fx: FxPool::new(),
            trails: BallTrails::new(),
            clock: FrameClock::new(),
            canvas_size,
            cursor: canvas_size * Vec2::new(0.5, 0.8),
            music_on: false,
            combo: 0.0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.ctx.device, &self.config);
        }
    }

    /// Window pixels to swarm canvas pixels. The canvas keeps its initial
    /// size and is stretched over the window.
    fn to_canvas(&self, x: f64, y: f64) -> Vec2 {
        let window = Vec2::new(self.config.width as f32, self.config.height as f32);
        Vec2::new(x as f32, y as f32) * self.canvas_size / window
    }

    fn handle_key(&mut self, key: KeyCode) -> bool {
        let palette = self.swarm.config().palette;
        let burst = match key {
            KeyCode::Digit1 => Some((ReactionKind::Pulse, palette.gold)),
            KeyCode::Digit2 => Some((ReactionKind::Explode, palette.cyan)),
            KeyCode::Digit3 => Some((ReactionKind::Glow, palette.purple)),
            KeyCode::Digit4 => Some((ReactionKind::Flicker, palette.highlight)),
            KeyCode::Digit5 => Some((ReactionKind::Celebrate, palette.gold)),
            KeyCode::KeyM => {
                self.music_on = !self.music_on;
                self.swarm
                    .set_music_intensity(if self.music_on { MUSIC_ON } else { 0.0 });
                log::info!("Music {}", if self.music_on { "on" } else { "off" });
                None
            }
            KeyCode::KeyR => {
                self.swarm.reset_shape();
                None
            }
            KeyCode::KeyI => {
                self.swarm.replay_intro();
                log::info!("Replaying intro");
                None
            }
            KeyCode::Escape => return false,
            _ => None,
        };

        if let Some((kind, color)) = burst {
            self.swarm.react(kind, 1.0);
            self.fx.burst(self.cursor.x, self.cursor.y - 40.0, color);
            self.combo = (self.combo + 1.0).min(10.0);
        }
        true
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let tick = self.clock.tick();
        self.combo = (self.combo - tick.dt * COMBO_DECAY_PER_SEC).max(0.0);

        self.swarm
            .update(self.cursor.x, self.cursor.y, tick.time_ms, tick.dt, self.combo);

        self.trails.add(self.cursor.x, self.cursor.y, self.swarm.config().palette.cyan);

        self.overlay.begin();
        self.swarm
            .render(Some(&mut self.overlay.canvas as &mut dyn Canvas), None, self.combo);
        self.fx.update_and_draw(&mut self.overlay.canvas);
        self.trails.update_and_draw(&mut self.overlay.canvas);
        self.overlay.upload(&self.ctx.queue);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.swarm.render(None, Some(&mut render_pass), self.combo);
            self.overlay.draw(&mut render_pass);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if tick.frame % 30 == 0 {
            let backend = self
                .swarm
                .backend_kind()
                .map_or_else(|| "-".to_string(), |k| k.to_string());
            self.window.set_title(&format!(
                "Fnlloyd Swarm [{}] {:.0} fps",
                backend,
                self.clock.fps()
            ));
        }

        Ok(())
    }
}

pub struct App {
    model_path: Option<PathBuf>,
    state: Option<DemoState>,
    error: Option<DemoError>,
}

impl App {
    pub fn new(model_path: Option<PathBuf>) -> Self {
        Self {
            model_path,
            state: None,
            error: None,
        }
    }

    /// The error that stopped the event loop, if any.
    pub fn into_result(self) -> Result<(), DemoError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: DemoError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Fnlloyd Swarm")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match DemoState::new(window, self.model_path.as_ref()) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                state.resize(physical_size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = state.to_canvas(position.x, position.y);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if !state.handle_key(key) {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.window.inner_size();
                        state.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
                state.window.request_redraw();
            }
            _ => {}
        }
    }
}
