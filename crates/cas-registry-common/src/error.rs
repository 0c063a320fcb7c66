//! Validation errors raised before anything is written to a registry.

/// Input that cannot be turned into a service descriptor.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// One or more required parameters were absent or had the wrong type.
    #[error("missing or invalid parameters: {}", .0.join(", "))]
    MissingOrInvalid(Vec<String>),

    /// A caller supplied service id that is not a decimal number.
    #[error("invalid service id `{0}`: expected decimal digits")]
    InvalidId(String),

    /// The attribute input did not have the expected shape.
    #[error("invalid type for `{param}`: expected {expected}")]
    InvalidAttributes {
        /// The offending parameter name.
        param: &'static str,
        /// What shape was expected.
        expected: &'static str,
    },

    /// Registry configuration problem.
    #[error("invalid registry configuration: {0}")]
    Config(&'static str),
}
