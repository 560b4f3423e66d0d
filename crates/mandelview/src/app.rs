use mandelview_engine::core::{App, AppControl, FrameCtx};
use winit::event::WindowEvent;

use crate::config::ViewerConfig;
use crate::controller::{FrameController, SessionState};
use crate::program::{FractalProgram, QUAD_INDEX_COUNT};
use crate::shader::ShaderSource;

/// Shown wherever the fractal pass draws nothing (degraded program).
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Glue between the engine runtime and the frame controller.
///
/// The GPU program is created on the first frame, once a device exists.
pub struct ViewerApp {
    controller: FrameController,
    shader: ShaderSource,
    program: Option<FractalProgram>,
    synced_size: bool,
}

impl ViewerApp {
    pub fn new(config: &ViewerConfig, shader: ShaderSource) -> Self {
        Self {
            controller: FrameController::from_config(config),
            shader,
            program: None,
            synced_size: false,
        }
    }

    pub fn controller(&self) -> &FrameController {
        &self.controller
    }
}

impl App for ViewerApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::Resized(size) => self.controller.resize((size.width, size.height)),
            WindowEvent::CloseRequested => self.controller.request_close(),
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let size = ctx.gpu.size();

        // The window may not come up at the requested size.
        if !self.synced_size {
            self.controller.resize((size.width, size.height));
            self.synced_size = true;
        }

        let program = self.program.get_or_insert_with(|| {
            FractalProgram::build(ctx.gpu.device(), ctx.gpu.surface_format(), &self.shader)
        });

        if self.controller.step(ctx.input, program) == SessionState::Terminating {
            return AppControl::Exit;
        }

        // Minimized: nothing to present into.
        if size.width == 0 || size.height == 0 {
            return AppControl::Continue;
        }

        ctx.render(CLEAR_COLOR, |target| program.draw(target, QUAD_INDEX_COUNT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec2::Vec2;
    use winit::dpi::PhysicalSize;

    fn viewer() -> ViewerApp {
        ViewerApp::new(&ViewerConfig::default(), ShaderSource::embedded())
    }

    // ── window events ─────────────────────────────────────────────────────

    #[test]
    fn resize_updates_screen_size_only() {
        let mut app = viewer();
        let scale = app.controller().viewport().scale;

        let control = app.on_window_event(&WindowEvent::Resized(PhysicalSize::new(1024, 768)));

        assert_eq!(control, AppControl::Continue);
        assert_eq!(app.controller().viewport().screen_size, (1024, 768));
        assert_eq!(app.controller().viewport().scale, scale);
        assert_eq!(scale, Vec2::new(640.0, 480.0));
    }

    #[test]
    fn close_request_terminates_on_next_frame() {
        let mut app = viewer();
        assert_eq!(app.controller().state(), SessionState::Running);

        let control = app.on_window_event(&WindowEvent::CloseRequested);

        // The exit itself is reported from the next frame.
        assert_eq!(control, AppControl::Continue);
        assert_eq!(app.controller().state(), SessionState::Terminating);
    }

    #[test]
    fn other_window_events_are_ignored() {
        let mut app = viewer();

        let control = app.on_window_event(&WindowEvent::Focused(false));

        assert_eq!(control, AppControl::Continue);
        assert_eq!(app.controller().state(), SessionState::Running);
        assert_eq!(app.controller().viewport().screen_size, (640, 480));
    }
}
