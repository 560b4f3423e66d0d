//! Interactive GPU Mandelbrot viewer.
//!
//! A full-screen quad is shaded per pixel by a WGSL program; the CPU side
//! owns the view transform ([`viewport`]), turns polled input into zoom and
//! pan ([`controller`]) and keeps the program's uniforms in sync
//! ([`program`]).

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod program;
pub mod shader;
pub mod vec2;
pub mod viewport;

use anyhow::{Context, Result};
use mandelview_engine::device::GpuInit;
use mandelview_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::PhysicalSize;

pub use app::ViewerApp;
pub use config::ViewerConfig;
pub use controller::{FrameController, SessionState};
pub use error::ProgramError;
pub use shader::ShaderSource;
pub use vec2::Vec2;
pub use viewport::{ViewportState, ZoomDirection};

/// Opens a viewer window and blocks until it is closed.
///
/// `initial_screen_size` is the requested window size in physical pixels and
/// also the startup scale (one fractal unit spans the window on each axis).
pub fn run(initial_screen_size: (u32, u32), iteration_limit: u32) -> Result<()> {
    run_with_config(ViewerConfig {
        screen_size: initial_screen_size,
        iteration_limit,
        ..ViewerConfig::default()
    })
}

/// [`run`] with every setting spelled out.
pub fn run_with_config(config: ViewerConfig) -> Result<()> {
    if let Err(errors) = config.validate() {
        anyhow::bail!("invalid viewer configuration:\n  {}", errors.join("\n  "));
    }

    let shader = match &config.shader_path {
        Some(path) => ShaderSource::from_path(path).context("load shader")?,
        None => ShaderSource::embedded(),
    };
    log::info!(
        "starting viewer: {}x{}, {} iterations, shader {}",
        config.screen_size.0,
        config.screen_size.1,
        config.iteration_limit,
        shader.label
    );

    let runtime_config = RuntimeConfig {
        title: config.title.clone(),
        initial_size: PhysicalSize::new(config.screen_size.0, config.screen_size.1),
    };

    let app = ViewerApp::new(&config, shader);
    Runtime::run(runtime_config, GpuInit::default(), app).context("viewer runtime failed")
}
