use thiserror::Error;

/// Failure taxonomy for the whole renderer.
///
/// Only startup-time failures terminate the process: a device that cannot
/// be created or a configuration that cannot describe a working frustum.
/// Everything after the frame loop begins degrades instead, by substituting
/// a placeholder asset or abandoning the current frame.
#[derive(Debug, Error)]
pub enum Error {
    /// GPU/window initialization failed before the frame loop started.
    #[error("initialization failed: {0}")]
    Init(String),

    /// Settings describe something unusable (zero-size target, bad frustum).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An asset failed to load; callers substitute a placeholder.
    #[error("asset error: {0}")]
    Asset(String),

    /// A draw could not be submitted; the frame skips it or is abandoned.
    #[error("draw error: {0}")]
    Draw(String),
}

impl Error {
    /// Whether this error should terminate the process rather than let the
    /// frame loop continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Init(_) | Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_startup_errors_are_fatal() {
        assert!(Error::Init("no adapter".into()).is_fatal());
        assert!(Error::Config("bad frustum".into()).is_fatal());
        assert!(!Error::Asset("missing file".into()).is_fatal());
        assert!(!Error::Draw("bad handle".into()).is_fatal());
    }

    #[test]
    fn messages_carry_context() {
        let err = Error::Config("shadow map size must be non-zero".into());
        assert!(err.to_string().contains("shadow map size"));
    }
}
