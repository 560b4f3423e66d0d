//! Viewer configuration.

use std::path::PathBuf;

use mandelview_engine::input::{Key, MouseButton};

/// Tunable defaults and limits.
pub mod constants {
    use mandelview_engine::input::{Key, MouseButton};

    pub const DEFAULT_TITLE: &str = "mandelview";

    /// Default window dimensions (physical pixels)
    pub const DEFAULT_WIDTH: u32 = 640;
    pub const DEFAULT_HEIGHT: u32 = 480;

    pub const DEFAULT_ITERATIONS: u32 = 256;

    /// Multiplicative scale change per zoom step
    pub const DEFAULT_ZOOM_FACTOR: f64 = 1.5;

    pub const DEFAULT_ZOOM_IN_KEY: Key = Key::Z;
    pub const DEFAULT_ZOOM_OUT_KEY: Key = Key::X;
    pub const DEFAULT_RESET_KEY: Key = Key::R;
    pub const DEFAULT_QUIT_KEY: Key = Key::Escape;
    pub const DEFAULT_PAN_BUTTON: MouseButton = MouseButton::Left;

    /// Largest window edge accepted (common GPU texture limit)
    pub const MAX_DIMENSION: u32 = 8192;

    /// The shader receives the limit as `i32`; keep it far below that.
    pub const MAX_ITERATIONS: u32 = 1 << 20;

    pub const MAX_ZOOM_FACTOR: f64 = 16.0;
}

/// Keys the frame controller polls.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyBindings {
    pub zoom_in: Key,
    pub zoom_out: Key,
    pub reset: Key,
    pub quit: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            zoom_in: constants::DEFAULT_ZOOM_IN_KEY,
            zoom_out: constants::DEFAULT_ZOOM_OUT_KEY,
            reset: constants::DEFAULT_RESET_KEY,
            quit: constants::DEFAULT_QUIT_KEY,
        }
    }
}

impl KeyBindings {
    fn all(&self) -> [(&'static str, Key); 4] {
        [
            ("zoom_in", self.zoom_in),
            ("zoom_out", self.zoom_out),
            ("reset", self.reset),
            ("quit", self.quit),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,

    /// Initial window size; also defines the startup scale.
    pub screen_size: (u32, u32),

    pub iteration_limit: u32,

    /// Must be finite and greater than 1.
    pub zoom_factor: f64,

    pub keys: KeyBindings,

    /// Held to drag the view.
    pub pan_button: MouseButton,

    /// WGSL file replacing the embedded program.
    pub shader_path: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: constants::DEFAULT_TITLE.to_string(),
            screen_size: (constants::DEFAULT_WIDTH, constants::DEFAULT_HEIGHT),
            iteration_limit: constants::DEFAULT_ITERATIONS,
            zoom_factor: constants::DEFAULT_ZOOM_FACTOR,
            keys: KeyBindings::default(),
            pan_button: constants::DEFAULT_PAN_BUTTON,
            shader_path: None,
        }
    }
}

impl ViewerConfig {
    /// Validate all configuration parameters.
    /// Returns Ok(()) if valid, or Err with every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let (width, height) = self.screen_size;
        for (name, value) in [("width", width), ("height", height)] {
            if value == 0 {
                errors.push(format!("{name} must be at least 1 (got 0)"));
            }
            if value > constants::MAX_DIMENSION {
                errors.push(format!(
                    "{name} must be at most {} (got {value})",
                    constants::MAX_DIMENSION
                ));
            }
        }

        if self.iteration_limit == 0 {
            errors.push("iteration_limit must be at least 1 (got 0)".to_string());
        }
        if self.iteration_limit > constants::MAX_ITERATIONS {
            errors.push(format!(
                "iteration_limit must be at most {} (got {})",
                constants::MAX_ITERATIONS,
                self.iteration_limit
            ));
        }

        // NaN fails both comparisons below, so check finiteness first.
        if !self.zoom_factor.is_finite() || self.zoom_factor <= 1.0 {
            errors.push(format!(
                "zoom_factor must be a finite number greater than 1 (got {})",
                self.zoom_factor
            ));
        } else if self.zoom_factor > constants::MAX_ZOOM_FACTOR {
            errors.push(format!(
                "zoom_factor must be at most {} (got {})",
                constants::MAX_ZOOM_FACTOR,
                self.zoom_factor
            ));
        }

        let bindings = self.keys.all();
        for (i, (name_a, key_a)) in bindings.iter().enumerate() {
            for (name_b, key_b) in &bindings[i + 1..] {
                if key_a == key_b {
                    errors.push(format!("keys.{name_a} and keys.{name_b} are both bound to {key_a}"));
                }
            }
        }

        if let Some(path) = &self.shader_path {
            if path.as_os_str().is_empty() {
                errors.push("shader_path must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.screen_size, (640, 480));
        assert_eq!(cfg.iteration_limit, 256);
        assert_eq!(cfg.zoom_factor, 1.5);
        assert_eq!(cfg.keys.zoom_in, Key::Z);
        assert_eq!(cfg.keys.zoom_out, Key::X);
        assert_eq!(cfg.pan_button, MouseButton::Left);
    }

    #[test]
    fn zoom_factor_must_exceed_one() {
        for bad in [1.0, 0.5, -2.0, f64::NAN, f64::INFINITY, 100.0] {
            let cfg = ViewerConfig {
                zoom_factor: bad,
                ..ViewerConfig::default()
            };
            let errors = cfg.validate().unwrap_err();
            assert_eq!(errors.len(), 1, "{bad}: {errors:?}");
            assert!(errors[0].starts_with("zoom_factor"));
        }
    }

    #[test]
    fn every_violation_is_reported() {
        let cfg = ViewerConfig {
            screen_size: (0, 10_000),
            iteration_limit: 0,
            zoom_factor: 0.0,
            shader_path: Some(PathBuf::new()),
            ..ViewerConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
    }

    #[test]
    fn duplicate_key_bindings_are_rejected() {
        let cfg = ViewerConfig {
            keys: KeyBindings {
                zoom_out: Key::Z,
                ..KeyBindings::default()
            },
            ..ViewerConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors, vec!["keys.zoom_in and keys.zoom_out are both bound to Z".to_string()]);
    }

    #[test]
    fn iteration_limit_upper_bound() {
        let cfg = ViewerConfig {
            iteration_limit: constants::MAX_ITERATIONS + 1,
            ..ViewerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
