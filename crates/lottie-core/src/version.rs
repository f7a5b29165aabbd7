//! Document format version and the schema variants it selects.

use crate::error::{LottieError, Result};
use std::fmt;
use std::str::FromStr;

/// Semantic version read from the document root `"v"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DocumentVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// How a keyframe list encodes the target value of each segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeLayout {
    /// Each keyframe carries its own `s` and `e`; the trailing keyframe may
    /// hold only `t`.
    StartEnd,
    /// Keyframes carry only `s`; a segment ends at the next keyframe's `s`.
    StartOnly,
}

impl DocumentVersion {
    /// Oldest schema behaviour, used when the document does not say.
    pub const OLDEST: DocumentVersion = DocumentVersion::new(0, 0, 0);

    /// First exporter release that dropped `e` from keyframes.
    pub const START_ONLY_KEYFRAMES: DocumentVersion = DocumentVersion::new(5, 5, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Strict parse. Missing trailing components count as zero (`"5.5"` is 5.5.0).
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LottieError::InvalidVersion(s.to_string()));
        }

        let mut parts = [0u32; 3];
        for (idx, component) in trimmed.split('.').enumerate() {
            if idx >= parts.len() {
                return Err(LottieError::InvalidVersion(s.to_string()));
            }
            parts[idx] = component
                .parse()
                .map_err(|_| LottieError::InvalidVersion(s.to_string()))?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Lenient parse: absent or unparseable strings fall back to [`Self::OLDEST`].
    pub fn from_document_str(raw: Option<&str>) -> Self {
        match raw.map(Self::parse) {
            Some(Ok(v)) => v,
            Some(Err(e)) => {
                tracing::debug!("{e}, using oldest schema behaviour");
                Self::OLDEST
            }
            None => Self::OLDEST,
        }
    }

    /// Reads `"v"` from a document root object.
    pub fn from_document(root: &serde_json::Value) -> Self {
        Self::from_document_str(root.get("v").and_then(|v| v.as_str()))
    }

    pub fn keyframe_layout(&self) -> KeyframeLayout {
        if *self < Self::START_ONLY_KEYFRAMES {
            KeyframeLayout::StartEnd
        } else {
            KeyframeLayout::StartOnly
        }
    }
}

impl FromStr for DocumentVersion {
    type Err = LottieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_and_short_versions() {
        assert_eq!(DocumentVersion::parse("5.7.4").unwrap(), DocumentVersion::new(5, 7, 4));
        assert_eq!(DocumentVersion::parse("5.5").unwrap(), DocumentVersion::new(5, 5, 0));
        assert_eq!("4".parse::<DocumentVersion>().unwrap(), DocumentVersion::new(4, 0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(DocumentVersion::parse("").is_err());
        assert!(DocumentVersion::parse("5.x.1").is_err());
        assert!(DocumentVersion::parse("1.2.3.4").is_err());
    }

    #[test]
    fn lenient_parse_defaults_to_oldest() {
        assert_eq!(DocumentVersion::from_document_str(None), DocumentVersion::OLDEST);
        assert_eq!(
            DocumentVersion::from_document_str(Some("not a version")),
            DocumentVersion::OLDEST
        );
        assert_eq!(
            DocumentVersion::from_document(&json!({ "v": "5.1.13" })),
            DocumentVersion::new(5, 1, 13)
        );
        assert_eq!(
            DocumentVersion::from_document(&json!({ "v": 5 })),
            DocumentVersion::OLDEST
        );
    }

    #[test]
    fn layout_switches_at_5_5_0() {
        assert_eq!(
            DocumentVersion::new(5, 4, 9).keyframe_layout(),
            KeyframeLayout::StartEnd
        );
        assert_eq!(
            DocumentVersion::new(5, 5, 0).keyframe_layout(),
            KeyframeLayout::StartOnly
        );
        assert_eq!(DocumentVersion::OLDEST.keyframe_layout(), KeyframeLayout::StartEnd);
        assert_eq!(DocumentVersion::new(5, 5, 2).to_string(), "5.5.2");
    }
}
