pub type Result<T> = std::result::Result<T, LottieError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LottieError {
    /// A recognised field holds an unexpected JSON type.
    #[error("schema mismatch at {field:?}: expected {expected}")]
    SchemaMismatch { field: String, expected: &'static str },

    #[error("unknown code {code} for {field:?}")]
    UnknownEnumerationCode { field: &'static str, code: i64 },

    #[error("malformed keyframe curve: {0}")]
    MalformedCurve(String),

    #[error("property value requested before the first update")]
    NotInitialized,

    #[error("invalid document version {0:?}")]
    InvalidVersion(String),
}

impl LottieError {
    pub fn schema_mismatch(field: impl Into<String>, expected: &'static str) -> Self {
        Self::SchemaMismatch {
            field: field.into(),
            expected,
        }
    }

    pub fn malformed_curve(msg: impl Into<String>) -> Self {
        Self::MalformedCurve(msg.into())
    }

    /// Document quirks that parsing substitutes a default for.
    /// The rest signal a broken invariant and go back to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SchemaMismatch { .. } | Self::UnknownEnumerationCode { .. } | Self::InvalidVersion(_)
        )
    }
}
