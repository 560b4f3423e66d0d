//! Input subsystem.
//!
//! The runtime translates winit window events into platform-agnostic
//! [`InputEvent`]s and folds them into an [`InputState`]. Application code
//! never sees events; it polls the current level state once per frame through
//! [`InputSource`].

pub(crate) mod platform;
mod source;
mod state;
mod types;

pub use source::InputSource;
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};
