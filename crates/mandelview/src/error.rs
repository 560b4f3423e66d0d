use thiserror::Error;

/// Failures turning shader text into a usable fractal program.
///
/// Neither is fatal: the viewer logs the error and keeps running with a
/// program that only clears the frame.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// WGSL parse or validation failure. `message` carries the diagnostic.
    #[error("shader `{label}` failed to compile:\n{message}")]
    Compile { label: String, message: String },

    /// The module is valid WGSL but does not fit the viewer's pipeline.
    #[error("shader `{label}` failed to link: {message}")]
    Link { label: String, message: String },
}

impl ProgramError {
    pub fn label(&self) -> &str {
        match self {
            ProgramError::Compile { label, .. } | ProgramError::Link { label, .. } => label,
        }
    }
}
