//! Project directory layout
//!
//! ```text
//! <base>/template.json     shared template
//! <base>/images/<i>.<ext>  source images
//! <base>/metadata/<i>.json authored metadata
//! <base>/.upload/          staging, rebuilt on every publish
//! ```

use crate::error::{MetabakerError, Result};
use crate::external::UploadFile;
use crate::materialize::RecordSource;
use crate::types::{MetadataTemplate, TokenMetadata, TokenRecord};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Shared template file name
pub const TEMPLATE_NAME: &str = "template.json";

const IMAGES_DIR: &str = "images";
const METADATA_DIR: &str = "metadata";
const UPLOAD_DIR: &str = ".upload";
const JSON_EXTENSION: &str = "json";

/// Filesystem layout rooted at the base metadata path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    base: PathBuf,
    image_extension: String,
}

impl ProjectLayout {
    /// Create layout for a base directory
    #[must_use]
    pub fn new(base: impl Into<PathBuf>, image_extension: impl Into<String>) -> Self {
        let image_extension = image_extension.into();
        Self {
            base: base.into(),
            image_extension: image_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Base metadata directory
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Image extension without the dot
    #[inline]
    #[must_use]
    pub fn image_extension(&self) -> &str {
        &self.image_extension
    }

    /// Source images directory
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.base.join(IMAGES_DIR)
    }

    /// Authored metadata directory
    #[must_use]
    pub fn metadata_dir(&self) -> PathBuf {
        self.base.join(METADATA_DIR)
    }

    /// Staging directory
    #[must_use]
    pub fn upload_dir(&self) -> PathBuf {
        self.base.join(UPLOAD_DIR)
    }

    /// Shared template path
    #[must_use]
    pub fn template_path(&self) -> PathBuf {
        self.base.join(TEMPLATE_NAME)
    }

    /// `<index>.<ext>`
    #[must_use]
    pub fn image_name(&self, index: u64) -> String {
        format!("{index}.{}", self.image_extension)
    }

    /// Source image of a token
    #[must_use]
    pub fn image_path(&self, index: u64) -> PathBuf {
        self.images_dir().join(self.image_name(index))
    }

    /// Authored metadata of a token
    #[must_use]
    pub fn metadata_path(&self, index: u64) -> PathBuf {
        self.metadata_dir().join(format!("{index}.{JSON_EXTENSION}"))
    }

    /// Create the images and metadata directories
    ///
    /// # Errors
    /// - `MetabakerError::Io` if a directory cannot be created
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.images_dir(), self.metadata_dir()] {
            create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Write the default template unless one exists
    ///
    /// Returns `true` if a template was written.
    ///
    /// # Errors
    /// - `MetabakerError::Io` if the template cannot be written
    pub fn ensure_template(&self) -> Result<bool> {
        let path = self.template_path();
        if path.exists() {
            return Ok(false);
        }
        create_dir_all(&self.base)?;
        write(&path, MetadataTemplate::default().to_pretty_json().as_bytes())?;
        tracing::info!("Wrote default template to {}", path.display());
        Ok(true)
    }

    /// Load the shared template, creating the default one first if absent
    ///
    /// # Errors
    /// - `MetabakerError::Io`, `Json` or `MalformedRecord` on a bad template
    pub fn load_template(&self) -> Result<MetadataTemplate> {
        self.ensure_template()?;
        let path = self.template_path();
        let text = std::fs::read_to_string(&path).map_err(|e| MetabakerError::io(&path, e))?;
        MetadataTemplate::parse(&text, &path)
    }

    /// Remove and recreate the staging directory
    ///
    /// # Errors
    /// - `MetabakerError::Io` on filesystem failure
    pub fn reset_staging(&self) -> Result<PathBuf> {
        self.clean_staging()?;
        let dir = self.upload_dir();
        create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove the staging directory
    ///
    /// Returns `true` if something was removed.
    ///
    /// # Errors
    /// - `MetabakerError::Io` on filesystem failure
    pub fn clean_staging(&self) -> Result<bool> {
        let dir = self.upload_dir();
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MetabakerError::io(dir, e)),
        }
    }

    /// Copy the source image of every index into staging
    ///
    /// # Errors
    /// - `MetabakerError::MissingRecord` if a source image is absent
    /// - `MetabakerError::Io` on copy failure
    pub fn stage_images(&self, indices: Range<u64>) -> Result<usize> {
        let upload = self.upload_dir();
        create_dir_all(&upload)?;
        let mut staged = 0;
        for index in indices {
            let source = self.image_path(index);
            if !source.is_file() {
                return Err(MetabakerError::missing_record(format!(
                    "no image for token {index} at {}",
                    source.display()
                )));
            }
            let target = upload.join(self.image_name(index));
            std::fs::copy(&source, &target).map_err(|e| MetabakerError::io(&source, e))?;
            staged += 1;
        }
        Ok(staged)
    }

    /// Write finalized records into staging as `<index>.json`
    ///
    /// # Errors
    /// - `MetabakerError::Io` on write failure
    pub fn write_staged_records(&self, records: &[TokenRecord]) -> Result<()> {
        let upload = self.upload_dir();
        create_dir_all(&upload)?;
        for record in records {
            let path = upload.join(format!("{}.{JSON_EXTENSION}", record.index));
            write(&path, record.metadata.to_pretty_json().as_bytes())?;
        }
        Ok(())
    }

    /// Staged images, sorted by file name
    ///
    /// # Errors
    /// - `MetabakerError::Io` on read failure
    pub fn staged_images(&self) -> Result<Vec<UploadFile>> {
        let suffix = format!(".{}", self.image_extension);
        self.read_staged(|name| name.ends_with(&suffix).then(|| name.to_string()))
    }

    /// Staged metadata, uploaded without the `.json` suffix
    ///
    /// Stripping the suffix lets a contract serve `baseURI + tokenId`.
    ///
    /// # Errors
    /// - `MetabakerError::Io` on read failure
    pub fn staged_metadata(&self) -> Result<Vec<UploadFile>> {
        let suffix = format!(".{JSON_EXTENSION}");
        self.read_staged(|name| name.strip_suffix(&suffix).map(ToString::to_string))
    }

    fn read_staged<F>(&self, rename: F) -> Result<Vec<UploadFile>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = self.upload_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MetabakerError::io(dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MetabakerError::io(&dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(upload_name) = path.file_name().and_then(|n| n.to_str()).and_then(&rename)
            else {
                continue;
            };
            let bytes = std::fs::read(&path).map_err(|e| MetabakerError::io(&path, e))?;
            files.push(UploadFile::new(upload_name, bytes));
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

/// Authored metadata read from `<base>/metadata/<i>.json`
#[derive(Debug, Clone, Copy)]
pub struct FileRecordSource<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> FileRecordSource<'a> {
    /// Read records of a layout
    #[inline]
    #[must_use]
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }
}

impl RecordSource for FileRecordSource<'_> {
    fn load(&self, index: u64) -> Result<Option<TokenMetadata>> {
        let path = self.layout.metadata_path(index);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MetabakerError::io(path, e)),
        };
        let value = serde_json::from_str(&text).map_err(|e| MetabakerError::json(&path, e))?;
        TokenMetadata::from_value(value, &path).map(Some)
    }

    fn location(&self, index: u64) -> PathBuf {
        self.layout.metadata_path(index)
    }
}

fn create_dir_all(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| MetabakerError::io(dir, e))
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| MetabakerError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn layout() -> (TempDir, ProjectLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path().join("metadata"), ".png");
        (dir, layout)
    }

    #[test]
    fn paths() {
        let layout = ProjectLayout::new("/p/meta", "jpg");
        assert_eq!(layout.image_path(3), PathBuf::from("/p/meta/images/3.jpg"));
        assert_eq!(layout.metadata_path(3), PathBuf::from("/p/meta/metadata/3.json"));
        assert_eq!(layout.upload_dir(), PathBuf::from("/p/meta/.upload"));
        assert_eq!(layout.template_path(), PathBuf::from("/p/meta/template.json"));
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let (_dir, layout) = layout();
        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();
        assert!(layout.images_dir().is_dir());
        assert!(layout.metadata_dir().is_dir());

        assert!(layout.ensure_template().unwrap());
        std::fs::write(
            layout.template_path(),
            r#"{"name":"custom $TOKEN_NUMBER","description":"d","image":"i"}"#,
        )
        .unwrap();
        assert!(!layout.ensure_template().unwrap());
        assert_eq!(layout.load_template().unwrap().name(), "custom $TOKEN_NUMBER");
    }

    #[test]
    fn load_template_creates_default() {
        let (_dir, layout) = layout();
        let template = layout.load_template().unwrap();
        assert_eq!(template, MetadataTemplate::default());
    }

    #[test]
    fn stage_images_requires_every_index() {
        let (_dir, layout) = layout();
        layout.ensure_dirs().unwrap();
        std::fs::write(layout.image_path(0), b"zero").unwrap();

        assert_eq!(layout.stage_images(0..1).unwrap(), 1);
        let err = layout.stage_images(0..2).unwrap_err();
        assert!(err.is_missing_record());
    }

    #[test]
    fn staged_files_are_filtered_and_renamed() {
        let (_dir, layout) = layout();
        layout.ensure_dirs().unwrap();
        std::fs::write(layout.image_path(1), b"one").unwrap();
        std::fs::write(layout.image_path(0), b"zero").unwrap();
        layout.reset_staging().unwrap();
        layout.stage_images(0..2).unwrap();

        let template = MetadataTemplate::default();
        layout
            .write_staged_records(&[TokenRecord {
                index: 0,
                metadata: template.render(0),
            }])
            .unwrap();

        let images = layout.staged_images().unwrap();
        let names: Vec<_> = images.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["0.png", "1.png"]);
        assert_eq!(images[0].bytes, b"zero");

        let metadata = layout.staged_metadata().unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[0].name, "0");
    }

    #[test]
    fn reset_and_clean_staging() {
        let (_dir, layout) = layout();
        let upload = layout.reset_staging().unwrap();
        std::fs::write(upload.join("stale.json"), b"{}").unwrap();

        layout.reset_staging().unwrap();
        assert!(layout.staged_metadata().unwrap().is_empty());

        assert!(layout.clean_staging().unwrap());
        assert!(!layout.clean_staging().unwrap());
        assert!(layout.staged_images().unwrap().is_empty());
    }

    #[test]
    fn file_record_source() {
        let (_dir, layout) = layout();
        layout.ensure_dirs().unwrap();
        std::fs::write(layout.metadata_path(0), json!({ "image": "0.png" }).to_string()).unwrap();
        std::fs::write(layout.metadata_path(1), "[1, 2]").unwrap();
        std::fs::write(layout.metadata_path(2), "{ nope").unwrap();

        let source = FileRecordSource::new(&layout);
        assert_eq!(source.load(0).unwrap().unwrap().image(), Some("0.png"));
        assert!(matches!(
            source.load(1).unwrap_err(),
            MetabakerError::MalformedRecord { .. }
        ));
        assert!(matches!(source.load(2).unwrap_err(), MetabakerError::Json { .. }));
        assert!(source.load(3).unwrap().is_none());
    }
}
