use serde::Serialize;
use std::path::{Path, PathBuf};

use super::derivative::DerivativeTarget;
use super::preset::ResizePreset;
use crate::domain::value_objects::BucketName;

/// An uploaded original, described entirely by where it lives.
///
/// Every derived field is a pure function of `key` (and the mapper's staging
/// root), so processing the same notification twice touches the same local
/// file and the same destination keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceObject {
    pub bucket: String,
    pub key: String,
    /// Local file the original is downloaded into
    pub staging_path: PathBuf,
    /// Extension of the final key segment, including the dot, or empty
    pub extension: String,
    /// Final key segment with the extension stripped
    pub base_name: String,
    /// Nested namespace all derivatives are written under, always ending in '/'
    pub destination_prefix: String,
}

impl SourceObject {
    /// Directory part of the key, including the trailing separator
    pub fn directory_prefix(&self) -> &str {
        split_key(&self.key).0
    }

    /// Final segment of the key, extension included
    pub fn file_name(&self) -> &str {
        split_key(&self.key).1
    }
}

/// Derives staging paths and destination keys from source keys.
///
/// Holds nothing but the local scratch root; no I/O happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPathMapper {
    staging_root: PathBuf,
}

impl KeyPathMapper {
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Describe the object at `bucket`/`key`.
    ///
    /// Total over all keys: a key without an extension yields an empty
    /// extension, and a base name without hyphens nests as a single segment.
    ///
    /// `p/images/f04902b4-ee4a-4f97-8c3b-bc1632f4ef6b.jpg` maps to the prefix
    /// `p/images/f04902b4/ee4a/4f97/8c3b/bc1632f4ef6b/`.
    pub fn derive_source_object(&self, bucket: &str, key: &str) -> SourceObject {
        let (directory, file_name) = split_key(key);
        let extension = extension_of(file_name);
        let base_name = &file_name[..file_name.len() - extension.len()];

        let nested = base_name.split('-').collect::<Vec<_>>().join("/");
        let destination_prefix = format!("{}{}/", directory, nested);

        SourceObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            staging_path: self.staging_root.join(file_name),
            extension: extension.to_string(),
            base_name: base_name.to_string(),
            destination_prefix,
        }
    }

    /// `{destination_prefix}{preset}{extension}`
    pub fn derive_destination_key(&self, source: &SourceObject, preset_name: &str) -> String {
        format!(
            "{}{}{}",
            source.destination_prefix, preset_name, source.extension
        )
    }

    /// `{staging_root}/{base_name}_{preset}{extension}`, unique per (source, preset)
    pub fn derive_local_output_path(&self, source: &SourceObject, preset_name: &str) -> PathBuf {
        self.staging_root.join(format!(
            "{}_{}{}",
            source.base_name, preset_name, source.extension
        ))
    }

    /// Pair a source with one preset
    pub fn derive_target(
        &self,
        source: &SourceObject,
        preset: &ResizePreset,
        destination_bucket: &BucketName,
    ) -> DerivativeTarget {
        DerivativeTarget {
            preset: preset.clone(),
            local_output_path: self.derive_local_output_path(source, preset.name()),
            destination_bucket: destination_bucket.clone(),
            destination_key: self.derive_destination_key(source, preset.name()),
        }
    }
}

/// Split a key into (directory prefix with trailing '/', final segment)
fn split_key(key: &str) -> (&str, &str) {
    match key.rfind('/') {
        Some(idx) => (&key[..=idx], &key[idx + 1..]),
        None => ("", key),
    }
}

/// Everything from the last '.' of the final segment, or empty
fn extension_of(file_name: &str) -> &str {
    file_name.rfind('.').map_or("", |idx| &file_name[idx..])
}
