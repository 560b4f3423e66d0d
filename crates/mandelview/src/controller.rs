//! Per-frame driver: input edges in, viewport mutations, uniforms out.
//!
//! One [`FrameController::step`] per rendered frame:
//! 1. poll zoom keys, cursor and pan button
//! 2. zoom on the release edge of a zoom key, anchored at the cursor
//! 3. pan by the cursor delta since the previous frame while the pan button is held
//! 4. remember the cursor
//! 5. write `u_offset`, `u_scale`, `u_iterations`, `u_screen` to the program
//!
//! The caller draws and presents afterwards.

use mandelview_engine::input::{InputSource, Key, KeyState, MouseButton, MouseButtonState};

use crate::config::{KeyBindings, ViewerConfig};
use crate::program::{UniformLocation, UniformTarget};
use crate::vec2::Vec2;
use crate::viewport::{HOME_REGION, ViewportState, ZoomDirection};

pub const U_OFFSET: &str = "u_offset";
pub const U_SCALE: &str = "u_scale";
pub const U_ITERATIONS: &str = "u_iterations";
pub const U_SCREEN: &str = "u_screen";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SessionState {
    Running,
    Terminating,
}

// ── input edges ───────────────────────────────────────────────────────────

/// What was held during the previous polled frame.
///
/// Starts with nothing held and the cursor at the origin.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct InputEdgeState {
    pub zoom_in_held: bool,
    pub zoom_out_held: bool,
    pub reset_held: bool,
    /// Diagnostic only: panning is level-driven and never reads it.
    pub pan_held: bool,
    pub previous_cursor: Vec2,
}

/// Updates `held` to `down` and reports a held→released transition.
fn release_edge(held: &mut bool, down: bool) -> bool {
    let fired = *held && !down;
    *held = down;
    fired
}

// ── uniform slots ─────────────────────────────────────────────────────────

/// Uniform locations resolved from the bound program.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UniformSlots {
    pub offset: Option<UniformLocation>,
    pub scale: Option<UniformLocation>,
    pub iterations: Option<UniformLocation>,
    pub screen: Option<UniformLocation>,
}

impl UniformSlots {
    /// Looks every viewer uniform up once; each missing one is warned about here
    /// and silently skipped afterwards.
    pub fn resolve<U: UniformTarget + ?Sized>(target: &U) -> Self {
        let lookup = |name: &str| {
            let loc = target.uniform_location(name);
            if loc.is_none() {
                log::warn!("uniform `{name}` not found in program; writes skipped");
            }
            loc
        };

        Self {
            offset: lookup(U_OFFSET),
            scale: lookup(U_SCALE),
            iterations: lookup(U_ITERATIONS),
            screen: lookup(U_SCREEN),
        }
    }
}

// ── controller ────────────────────────────────────────────────────────────

/// Interaction settings the controller reads every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Controls {
    pub zoom_factor: f64,
    pub keys: KeyBindings,
    pub pan_button: MouseButton,
}

impl Controls {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            zoom_factor: config.zoom_factor,
            keys: config.keys,
            pan_button: config.pan_button,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

/// Sole owner of the viewport for a viewing session.
#[derive(Debug, Clone)]
pub struct FrameController {
    viewport: ViewportState,
    edges: InputEdgeState,
    controls: Controls,
    slots: Option<UniformSlots>,
    state: SessionState,
}

impl FrameController {
    pub fn new(viewport: ViewportState, controls: Controls) -> Self {
        Self {
            viewport,
            edges: InputEdgeState::default(),
            controls,
            slots: None,
            state: SessionState::Running,
        }
    }

    /// Startup view for the configured initial screen size and iteration limit.
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(
            ViewportState::new(config.screen_size, config.iteration_limit),
            Controls::from_config(config),
        )
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn edges(&self) -> &InputEdgeState {
        &self.edges
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Locations resolved so far; `None` until the first step with a program.
    pub fn uniform_slots(&self) -> Option<&UniformSlots> {
        self.slots.as_ref()
    }

    /// Close signal from the windowing layer. Takes effect at the next step.
    pub fn request_close(&mut self) {
        if self.state == SessionState::Running {
            log::info!("close requested");
        }
        self.state = SessionState::Terminating;
    }

    pub fn resize(&mut self, size: (u32, u32)) {
        log::debug!("viewport resized to {}x{}", size.0, size.1);
        self.viewport.resize(size);
    }

    /// Runs one frame of input handling and uniform upload.
    pub fn step<I, U>(&mut self, input: &I, target: &mut U) -> SessionState
    where
        I: InputSource + ?Sized,
        U: UniformTarget + ?Sized,
    {
        if self.state == SessionState::Terminating {
            return self.state;
        }

        let keys = self.controls.keys;

        if input.key_state(keys.quit) == KeyState::Pressed {
            log::info!("quit key {} pressed", keys.quit);
            self.state = SessionState::Terminating;
            return self.state;
        }

        let cursor = Vec2::from(input.cursor_position());
        let down = |key: Key| input.key_state(key) == KeyState::Pressed;

        if release_edge(&mut self.edges.zoom_in_held, down(keys.zoom_in)) {
            self.zoom(ZoomDirection::In, cursor);
        }
        if release_edge(&mut self.edges.zoom_out_held, down(keys.zoom_out)) {
            self.zoom(ZoomDirection::Out, cursor);
        }
        if release_edge(&mut self.edges.reset_held, down(keys.reset)) {
            let (min, max) = HOME_REGION;
            if self.viewport.frame_region(min, max) {
                log::debug!(
                    "view reset: offset {:?}, scale {:?}",
                    self.viewport.offset,
                    self.viewport.scale
                );
            }
        }

        let pan_down =
            input.mouse_button_state(self.controls.pan_button) == MouseButtonState::Pressed;
        if pan_down {
            let delta = cursor - self.edges.previous_cursor;
            if delta != Vec2::zero() {
                self.viewport.pan(delta);
                log::trace!("pan by {delta:?}; offset now {:?}", self.viewport.offset);
            }
        }
        self.edges.pan_held = pan_down;
        self.edges.previous_cursor = cursor;

        self.write_uniforms(target);
        self.state
    }

    fn zoom(&mut self, direction: ZoomDirection, anchor: Vec2) {
        if !self.viewport.zoom(direction, anchor, self.controls.zoom_factor) {
            log::debug!(
                "zoom {direction:?} refused: scale limit reached at {:?}",
                self.viewport.scale
            );
            return;
        }
        log::debug!(
            "zoom {direction:?} at {anchor:?}: offset {:?}, scale {:?}",
            self.viewport.offset,
            self.viewport.scale
        );
    }

    fn write_uniforms<U: UniformTarget + ?Sized>(&mut self, target: &mut U) {
        let slots = *self.slots.get_or_insert_with(|| UniformSlots::resolve(&*target));
        let vp = &self.viewport;

        if let Some(loc) = slots.offset {
            let [x, y] = vp.offset.to_f32();
            target.set_uniform_2f(loc, x, y);
        }
        if let Some(loc) = slots.scale {
            let [x, y] = vp.scale.to_f32();
            target.set_uniform_2f(loc, x, y);
        }
        if let Some(loc) = slots.iterations {
            target.set_uniform_1i(loc, i32::try_from(vp.iteration_limit).unwrap_or(i32::MAX));
        }
        if let Some(loc) = slots.screen {
            target.set_uniform_2f(loc, vp.screen_size.0 as f32, vp.screen_size.1 as f32);
        }
    }
}
