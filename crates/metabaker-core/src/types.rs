//! Core types for Metabaker
//!
//! Defines the data that flows through the pipeline:
//! - Token counts and index conventions
//! - Content identifiers and pin status
//! - Metadata templates and per-token records

use crate::error::{MetabakerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Range;
use std::path::Path;

/// Placeholder substituted in the template `name` field
pub const TOKEN_NUMBER_PLACEHOLDER: &str = "$TOKEN_NUMBER";

/// Number of tokens a run operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Wrap a raw count
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Zero counts are rejected by the resolver but accepted by the materializer
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TokenCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First token index of a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBase {
    /// Indices `[0, count)`
    #[default]
    Zero,
    /// Indices `[1, count]`
    One,
}

impl IndexBase {
    /// First index
    #[inline]
    #[must_use]
    pub const fn first(self) -> u64 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Token indices covered by `count`
    ///
    /// # Errors
    /// - `MetabakerError::InvalidArgument` if the last index overflows `u64`
    pub fn indices(self, count: TokenCount) -> Result<Range<u64>> {
        let start = self.first();
        let end = start.checked_add(count.get()).ok_or_else(|| {
            MetabakerError::invalid_argument(format!("count {count} overflows token index range"))
        })?;
        Ok(start..end)
    }
}

/// What to do when a run produces no images or no metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Log a warning and stop the task without error
    #[default]
    Warn,
    /// Fail with `MissingRecord`
    Fail,
}

/// Opaque handle returned by the content store for an uploaded directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(String);

impl ContentId {
    /// Wrap a raw identifier
    ///
    /// # Errors
    /// - `MetabakerError::ExternalCallFailure` if the identifier is empty
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(MetabakerError::external("content store returned an empty CID"));
        }
        Ok(Self(value))
    }

    /// Borrow the identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `ipfs://<cid>` URI for the whole directory
    #[must_use]
    pub fn base_uri(&self) -> String {
        format!("ipfs://{}", self.0)
    }

    /// `ipfs://<cid>/<name>` URI for one file of the directory
    #[must_use]
    pub fn file_uri(&self, name: &str) -> String {
        format!("ipfs://{}/{}", self.0, name)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pin state reported by the content store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PinStatus {
    /// Waiting to be pinned
    Queued,
    /// Pinning in progress
    Pinning,
    /// Pinned
    Pinned,
    /// Pinning failed
    Failed,
    /// Status string not recognised
    Unknown(String),
}

impl PinStatus {
    /// Parse the status string returned by the store
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "pinning" => Self::Pinning,
            "pinned" => Self::Pinned,
            "failed" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for PinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::Pinning => f.write_str("pinning"),
            Self::Pinned => f.write_str("pinned"),
            Self::Failed => f.write_str("failed"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Shared JSON skeleton used to scaffold per-token metadata
///
/// Field order of the source document is preserved so rendered records are
/// byte-stable across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTemplate {
    fields: Map<String, Value>,
}

impl MetadataTemplate {
    /// Fields every template must carry as strings
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["name", "description", "image"];

    /// Build from a parsed JSON value
    ///
    /// # Errors
    /// - `MetabakerError::MalformedRecord` if the value is not an object or a
    ///   required field is missing or not a string
    pub fn from_value(value: Value, origin: &Path) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(MetabakerError::MalformedRecord {
                path: origin.to_path_buf(),
                reason: "template must be a JSON object".to_string(),
            });
        };
        for field in Self::REQUIRED_FIELDS {
            if !fields.get(field).is_some_and(Value::is_string) {
                return Err(MetabakerError::MalformedRecord {
                    path: origin.to_path_buf(),
                    reason: format!("template field `{field}` must be a string"),
                });
            }
        }
        Ok(Self { fields })
    }

    /// Parse template text
    ///
    /// # Errors
    /// - `MetabakerError::Json` if the text is not JSON
    /// - `MetabakerError::MalformedRecord` if required fields are missing
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let value = serde_json::from_str(text).map_err(|e| MetabakerError::json(origin, e))?;
        Self::from_value(value, origin)
    }

    /// Template `name`
    #[must_use]
    pub fn name(&self) -> &str {
        self.fields.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    /// Render the record for one token index
    ///
    /// Every occurrence of the placeholder in `name` becomes `#<index>`.
    #[must_use]
    pub fn render(&self, index: u64) -> TokenMetadata {
        let mut fields = self.fields.clone();
        let name = self.name().replace(TOKEN_NUMBER_PLACEHOLDER, &format!("#{index}"));
        fields.insert("name".to_string(), Value::String(name));
        TokenMetadata { fields }
    }

    /// Pretty JSON text of the template
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        pretty(&self.fields)
    }
}

impl Default for MetadataTemplate {
    fn default() -> Self {
        let mut fields = Map::new();
        fields.insert(
            "name".to_string(),
            Value::String(format!("nft name template token number {TOKEN_NUMBER_PLACEHOLDER}")),
        );
        fields.insert("description".to_string(), Value::String("nft description".to_string()));
        fields.insert(
            "image".to_string(),
            Value::String("put a placeholder image here.jpg".to_string()),
        );
        Self { fields }
    }
}

/// Finalized metadata of one token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    fields: Map<String, Value>,
}

impl TokenMetadata {
    /// Build from a parsed JSON value
    ///
    /// # Errors
    /// - `MetabakerError::MalformedRecord` if the value is not an object
    pub fn from_value(value: Value, origin: &Path) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(MetabakerError::MalformedRecord {
                path: origin.to_path_buf(),
                reason: "metadata must be a JSON object".to_string(),
            }),
        }
    }

    /// Token name, if present
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Raw `image` field
    #[must_use]
    pub fn image_value(&self) -> Option<&Value> {
        self.fields.get("image")
    }

    /// Image reference, if present and a string
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.fields.get("image").and_then(Value::as_str)
    }

    /// Overwrite the image reference
    pub fn set_image(&mut self, image: impl Into<String>) {
        self.fields.insert("image".to_string(), Value::String(image.into()));
    }

    /// Borrow all fields
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Pretty JSON text, two-space indented
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        pretty(&self.fields)
    }
}

/// Metadata paired with its token index
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    /// Token index
    pub index: u64,
    /// Finalized metadata
    pub metadata: TokenMetadata,
}

fn pretty(fields: &Map<String, Value>) -> String {
    // A map of JSON values always serializes.
    serde_json::to_string_pretty(fields).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn index_base_ranges() {
        assert_eq!(IndexBase::Zero.indices(TokenCount::new(3)).unwrap(), 0..3);
        assert_eq!(IndexBase::One.indices(TokenCount::new(3)).unwrap(), 1..4);
        assert!(IndexBase::Zero.indices(TokenCount::new(0)).unwrap().is_empty());
    }

    #[test]
    fn index_base_overflow() {
        let err = IndexBase::One.indices(TokenCount::new(u64::MAX)).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn content_id_uris() {
        let cid = ContentId::new("bafy123").unwrap();
        assert_eq!(cid.base_uri(), "ipfs://bafy123");
        assert_eq!(cid.file_uri("1.png"), "ipfs://bafy123/1.png");
        assert!(ContentId::new("  ").is_err());
    }

    #[test]
    fn pin_status_parse() {
        assert_eq!(PinStatus::parse("pinned"), PinStatus::Pinned);
        assert_eq!(PinStatus::parse("odd").to_string(), "odd");
    }

    #[test]
    fn template_render_replaces_every_placeholder() {
        let template = MetadataTemplate::from_value(
            json!({
                "name": "$TOKEN_NUMBER of $TOKEN_NUMBER",
                "description": "d $TOKEN_NUMBER",
                "image": "x.png"
            }),
            Path::new("template.json"),
        )
        .unwrap();

        let record = template.render(7);
        assert_eq!(record.name(), Some("#7 of #7"));
        assert_eq!(
            record.fields().get("description"),
            Some(&json!("d $TOKEN_NUMBER"))
        );
    }

    #[test]
    fn template_rejects_missing_fields() {
        let err = MetadataTemplate::from_value(json!({ "name": "n" }), Path::new("t.json"))
            .unwrap_err();
        assert!(matches!(err, MetabakerError::MalformedRecord { .. }));
    }

    #[test]
    fn default_template_round_trips() {
        let template = MetadataTemplate::default();
        let text = template.to_pretty_json();
        assert!(text.starts_with("{\n  \"name\""));
        let parsed = MetadataTemplate::parse(&text, Path::new("t.json")).unwrap();
        assert_eq!(parsed, template);
    }

    #[test]
    fn metadata_preserves_field_order() {
        let meta = TokenMetadata::from_value(
            json!({ "image": "a.png", "name": "n", "attributes": [] }),
            Path::new("0.json"),
        )
        .unwrap();
        let keys: Vec<_> = meta.fields().keys().cloned().collect();
        assert_eq!(keys, vec!["image", "name", "attributes"]);
    }
}
