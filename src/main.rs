//! Interactive demo: the swarm follows the mouse.
//!
//! Keys `1`-`5` trigger pulse, explode, glow, flicker and celebrate. `M`
//! toggles music, `R` restores the bone silhouette, `Esc` quits. An optional
//! argument names a Wavefront OBJ file to load as the rest shape.

mod overlay;
mod window;

use std::path::PathBuf;

use winit::event_loop::{ControlFlow, EventLoop};

use crate::window::{App, DemoError};

fn main() -> Result<(), DemoError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let model_path = std::env::args_os().nth(1).map(PathBuf::from);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(model_path);
    event_loop.run_app(&mut app)?;
    app.into_result()
}
