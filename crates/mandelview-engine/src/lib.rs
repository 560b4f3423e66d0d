//! mandelview engine crate.
//!
//! Owns the platform + GPU runtime pieces the viewer is built on: the winit
//! event loop, the wgpu device/surface pair, polled input state and logging.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod window;
