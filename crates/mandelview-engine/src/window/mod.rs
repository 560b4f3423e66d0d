//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the viewer window, and wires them to the
//! GPU layer and the input state.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
