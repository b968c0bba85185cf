/// Convenience result type used across the crate.
pub type DrawResult<T> = Result<T, DrawError>;

/// Error taxonomy for scheduling, theme resolution, and rendering.
///
/// Every error is raised synchronously at the point of detection and
/// propagates to the caller; rendering one circuit/theme pair is
/// all-or-nothing.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    /// Malformed register sizes or instruction shapes in the circuit model.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An instruction references a wire absent from the line-index map.
    #[error("unknown wire: {0}")]
    UnknownWire(String),

    /// A strict theme lookup found no usable value for a key.
    #[error("missing theme key: {0}")]
    MissingThemeKey(String),

    /// A named or file theme source could not be located or parsed.
    #[error("theme load error: {0}")]
    ThemeLoad(String),
}

impl DrawError {
    /// Build a [`DrawError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`DrawError::MissingThemeKey`] value.
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingThemeKey(key.into())
    }

    /// Build a [`DrawError::ThemeLoad`] value.
    pub fn theme_load(msg: impl Into<String>) -> Self {
        Self::ThemeLoad(msg.into())
    }
}
