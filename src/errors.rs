use thiserror::Error;

/// Errors raised by the picker, its document model and the CLI
#[derive(Debug, Error)]
pub enum PickerError {
    /// Target selector matched nothing (exit code 2)
    #[error("No elements found matching selector: {0}")]
    ElementNotFound(String),
    /// Selector could not be parsed (exit code 3)
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    /// Panel markup is missing an expected node (exit code 4)
    #[error("Picker panel is missing required element #{0}")]
    PanelMarkup(String),
    /// `init` called on a picker that is already mounted (exit code 4)
    #[error("Picker is already initialized")]
    AlreadyInitialized,
    /// No tokio runtime available for notification timers (exit code 4)
    #[error("Picker requires a running tokio runtime")]
    NoRuntime,
    /// DOM snapshot could not be loaded (exit code 5)
    #[error("Invalid DOM snapshot: {0}")]
    Snapshot(String),
    /// Configuration file could not be read or parsed (exit code 6)
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PickerError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PickerError::ElementNotFound(_) => 2,
            PickerError::InvalidSelector { .. } => 3,
            PickerError::PanelMarkup(_)
            | PickerError::AlreadyInitialized
            | PickerError::NoRuntime => 4,
            PickerError::Snapshot(_) => 5,
            PickerError::Config(_) => 6,
            PickerError::Io(_) | PickerError::Other(_) => 1,
        }
    }

    /// Recover the typed error from an `anyhow` chain, if one is inside
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<PickerError>() {
            Ok(picker_err) => picker_err,
            Err(err) => PickerError::Other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PickerError::ElementNotFound("a".into()).exit_code(), 2);
        assert_eq!(
            PickerError::InvalidSelector {
                selector: "a[".into(),
                reason: "unexpected '['".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(PickerError::PanelMarkup("picker-link".into()).exit_code(), 4);
        assert_eq!(PickerError::NoRuntime.exit_code(), 4);
        assert_eq!(PickerError::Snapshot("bad".into()).exit_code(), 5);
        assert_eq!(PickerError::Config("bad".into()).exit_code(), 6);
    }

    #[test]
    fn test_from_anyhow_keeps_typed_error() {
        let err = anyhow::Error::new(PickerError::ElementNotFound(".missing".into()))
            .context("resolving target");
        let recovered = PickerError::from_anyhow(err);
        assert!(matches!(recovered, PickerError::ElementNotFound(ref s) if s == ".missing"));

        let plain = PickerError::from_anyhow(anyhow::anyhow!("boom"));
        assert_eq!(plain.exit_code(), 1);
        assert_eq!(plain.to_string(), "boom");
    }
}
