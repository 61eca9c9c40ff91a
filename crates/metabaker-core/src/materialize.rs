//! Metadata materialization
//!
//! Produces one finalized [`TokenRecord`] per token index, either by
//! rendering the shared template ([`MaterializeMode::Scaffold`]) or by
//! repointing the `image` of authored per-token metadata at an uploaded
//! image directory ([`MaterializeMode::Patch`]).

use crate::error::{MetabakerError, Result};
use crate::types::{ContentId, IndexBase, MetadataTemplate, TokenCount, TokenMetadata, TokenRecord};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Source of authored per-token metadata
pub trait RecordSource: Sync {
    /// Load the record for `index`, `None` if it does not exist
    ///
    /// # Errors
    /// Implementations fail on unreadable or non-object records.
    fn load(&self, index: u64) -> Result<Option<TokenMetadata>>;

    /// Where the record for `index` lives, for diagnostics
    fn location(&self, index: u64) -> PathBuf;
}

impl RecordSource for BTreeMap<u64, TokenMetadata> {
    fn load(&self, index: u64) -> Result<Option<TokenMetadata>> {
        Ok(self.get(&index).cloned())
    }

    fn location(&self, index: u64) -> PathBuf {
        PathBuf::from(format!("{index}.json"))
    }
}

/// How records are produced
#[derive(Clone, Copy)]
pub enum MaterializeMode<'a> {
    /// Render the shared template per index
    Scaffold(&'a MetadataTemplate),
    /// Patch the image of authored records
    Patch(&'a dyn RecordSource),
}

impl MaterializeMode<'_> {
    /// Short mode name for logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scaffold(_) => "scaffold",
            Self::Patch(_) => "patch",
        }
    }
}

/// Last `/`-separated segment of an image reference
#[must_use]
pub fn image_basename(image: &str) -> &str {
    image.rsplit('/').next().unwrap_or(image)
}

/// Produce finalized metadata for every token index
///
/// Records are returned in ascending index order. A zero count yields an
/// empty sequence; rejecting it is the count resolver's job.
///
/// # Arguments
/// * `count` - number of tokens
/// * `index_base` - first token index
/// * `mode` - scaffold from template or patch authored records
/// * `cid` - image directory identifier, required by patch mode
/// * `image_extension` - used for the image name when a record has none
///
/// # Errors
/// - `MetabakerError::InvalidArgument` if patch mode has no `cid`
/// - `MetabakerError::MissingRecord` if an authored record is absent
/// - `MetabakerError::MalformedRecord` if a record's `image` is not a string
pub fn materialize(
    count: TokenCount,
    index_base: IndexBase,
    mode: MaterializeMode<'_>,
    cid: Option<&ContentId>,
    image_extension: &str,
) -> Result<Vec<TokenRecord>> {
    let indices = index_base.indices(count)?;
    tracing::debug!("Materializing {} records ({})", count, mode.label());

    match mode {
        MaterializeMode::Scaffold(template) => Ok(indices
            .map(|index| TokenRecord {
                index,
                metadata: template.render(index),
            })
            .collect()),
        MaterializeMode::Patch(source) => {
            let cid = cid.ok_or_else(|| {
                MetabakerError::invalid_argument("patching metadata requires an image CID")
            })?;
            let extension = image_extension.trim_start_matches('.');
            indices
                .map(|index| patch_record(source, index, cid, extension))
                .collect()
        }
    }
}

fn patch_record(
    source: &dyn RecordSource,
    index: u64,
    cid: &ContentId,
    extension: &str,
) -> Result<TokenRecord> {
    let mut metadata = source.load(index)?.ok_or_else(|| {
        MetabakerError::missing_record(format!(
            "no metadata for token {index} at {}",
            source.location(index).display()
        ))
    })?;

    let basename = match metadata.image_value() {
        None => format!("{index}.{extension}"),
        Some(value) => {
            let image = value.as_str().ok_or_else(|| MetabakerError::MalformedRecord {
                path: source.location(index),
                reason: "`image` must be a string".to_string(),
            })?;
            match image_basename(image) {
                "" => format!("{index}.{extension}"),
                name => name.to_string(),
            }
        }
    };

    let image = cid.file_uri(&basename);
    tracing::debug!("Token {} image -> {}", index, image);
    metadata.set_image(image);
    Ok(TokenRecord { index, metadata })
}
