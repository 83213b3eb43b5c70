use thiserror::Error;

/// Error returned by an object model's lifecycle calls.
///
/// `Config` is only meaningful from `init` (it fails model load);
/// `Fault` from any timed call is folded into the scheduler's fatal
/// `INVALID` termination path.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Fault(String),
}

impl ModelError {
    /// Shorthand for a configuration rejection at `init`.
    pub fn config(msg: impl Into<String>) -> Self {
        ModelError::Config(msg.into())
    }

    /// Shorthand for a runtime fault in a timed call.
    pub fn fault(msg: impl Into<String>) -> Self {
        ModelError::Fault(msg.into())
    }
}

/// Error from the property access surface of a [`SimObject`][crate::SimObject].
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("object '{object}' has no property '{property}'")]
    UnknownProperty { object: String, property: String },

    #[error("object '{object}' vetoed write to '{property}'")]
    Vetoed { object: String, property: String },

    #[error("object '{object}' rejected value for '{property}'")]
    Rejected { object: String, property: String },
}
