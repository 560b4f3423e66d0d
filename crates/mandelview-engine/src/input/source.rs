use super::types::{Key, KeyState, MouseButton, MouseButtonState};

/// Polling interface over the windowing layer's input state.
///
/// Answers are level-triggered: they describe what is held *now*, not what
/// changed. Callers that need edges keep their own previous-frame state.
pub trait InputSource {
    /// Last known cursor position in physical pixels.
    fn cursor_position(&self) -> (f64, f64);

    fn key_state(&self, key: Key) -> KeyState;

    fn mouse_button_state(&self, button: MouseButton) -> MouseButtonState;
}
