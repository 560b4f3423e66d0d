use std::collections::HashSet;

use super::source::InputSource;
use super::types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

/// Current input state for the viewer window.
///
/// Holds "is down" sets and the last known cursor position. The runtime
/// folds every translated event into this value; the application only polls
/// it.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Last known pointer position in physical pixels.
    ///
    /// Kept when the pointer leaves the window so polling keeps returning the
    /// last position, like a native cursor query would.
    pub pointer_pos: (f64, f64),

    /// Whether the pointer is currently over the window surface.
    pub pointer_inside: bool,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Release events are not delivered while unfocused;
                    // clear to avoid stuck keys.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                self.pointer_pos = (*x, *y);
                self.pointer_inside = true;
            }

            InputEvent::PointerLeft => {
                self.pointer_inside = false;
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    self.keys_down.insert(*key);
                }
                KeyState::Released => {
                    self.keys_down.remove(key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    self.buttons_down.insert(*button);
                }
                MouseButtonState::Released => {
                    self.buttons_down.remove(button);
                }
            },
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

impl InputSource for InputState {
    fn cursor_position(&self) -> (f64, f64) {
        self.pointer_pos
    }

    fn key_state(&self, key: Key) -> KeyState {
        if self.key_down(key) {
            KeyState::Pressed
        } else {
            KeyState::Released
        }
    }

    fn mouse_button_state(&self, button: MouseButton) -> MouseButtonState {
        if self.button_down(button) {
            MouseButtonState::Pressed
        } else {
            MouseButtonState::Released
        }
    }
}
