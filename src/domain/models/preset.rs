use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::errors::ValidationError;

/// A named resize tier: bounding box plus output quality.
///
/// The name doubles as a path segment in destination keys and local output
/// paths, so it may not contain `/` or `.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizePreset {
    name: String,
    width: u32,
    height: u32,
    quality: u8,
}

impl ResizePreset {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        quality: u8,
    ) -> Result<Self, ValidationError> {
        let preset = Self {
            name: name.into(),
            width,
            height,
            quality,
        };
        preset.validate()?;
        Ok(preset)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyPresetName);
        }

        if let Some(character) = self
            .name
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '.') || c.is_control())
        {
            return Err(ValidationError::InvalidPresetNameCharacter {
                name: self.name.clone(),
                character,
            });
        }

        if self.width == 0 || self.height == 0 {
            return Err(ValidationError::InvalidPresetGeometry {
                name: self.name.clone(),
                width: self.width,
                height: self.height,
            });
        }

        if self.quality > 100 {
            return Err(ValidationError::InvalidPresetQuality {
                name: self.name.clone(),
                quality: self.quality,
            });
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl std::fmt::Display for ResizePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}x{}, q{})",
            self.name, self.width, self.height, self.quality
        )
    }
}

/// Ordered, immutable set of presets shared by every invocation.
///
/// Constructed once at startup and handed to the pipeline explicitly; there
/// is no global registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PresetRegistry {
    presets: Vec<ResizePreset>,
}

impl PresetRegistry {
    /// Build a registry, rejecting duplicate names and empty lists
    pub fn new(presets: Vec<ResizePreset>) -> Result<Self, ValidationError> {
        if presets.is_empty() {
            return Err(ValidationError::EmptyPresetRegistry);
        }

        let mut seen = HashSet::with_capacity(presets.len());
        for preset in &presets {
            if !seen.insert(preset.name()) {
                return Err(ValidationError::DuplicatePresetName(
                    preset.name().to_string(),
                ));
            }
        }

        Ok(Self { presets })
    }

    /// The four tiers every derivative store expects:
    /// thumbnail, thumbnail-2x, gallery and gallery-2x.
    pub fn default_registry() -> Self {
        let presets = [
            ("thumbnail", 200, 200, 95),
            ("thumbnail-2x", 400, 400, 80),
            ("gallery", 600, 600, 80),
            ("gallery-2x", 1024, 1024, 75),
        ]
        .into_iter()
        .map(|(name, width, height, quality)| ResizePreset {
            name: name.to_string(),
            width,
            height,
            quality,
        })
        .collect();

        Self { presets }
    }

    /// Parse a JSON array of presets, validating every entry
    pub fn from_json(document: &str) -> Result<Self, ValidationError> {
        let raw: Vec<ResizePreset> = serde_json::from_str(document)
            .map_err(|e| ValidationError::MalformedPresetDocument(e.to_string()))?;

        let presets = raw
            .into_iter()
            .map(|p| {
                p.validate()?;
                Ok(p)
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Self::new(presets)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResizePreset> {
        self.presets.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ResizePreset> {
        self.presets.iter().find(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::default_registry()
    }
}

impl<'a> IntoIterator for &'a PresetRegistry {
    type Item = &'a ResizePreset;
    type IntoIter = std::slice::Iter<'a, ResizePreset>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order_and_values() {
        let registry = PresetRegistry::default_registry();
        let summary: Vec<(&str, u32, u32, u8)> = registry
            .iter()
            .map(|p| (p.name(), p.width(), p.height(), p.quality()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("thumbnail", 200, 200, 95),
                ("thumbnail-2x", 400, 400, 80),
                ("gallery", 600, 600, 80),
                ("gallery-2x", 1024, 1024, 75),
            ]
        );
    }

    #[test]
    fn test_default_registry_passes_validation() {
        let presets: Vec<ResizePreset> = PresetRegistry::default_registry().iter().cloned().collect();
        assert!(presets.iter().all(|p| p.validate().is_ok()));
        assert!(PresetRegistry::new(presets).is_ok());
    }

    #[test]
    fn test_invalid_presets() {
        assert_eq!(
            ResizePreset::new("", 10, 10, 50),
            Err(ValidationError::EmptyPresetName)
        );
        assert!(ResizePreset::new("a/b", 10, 10, 50).is_err());
        assert!(ResizePreset::new("thumb.small", 10, 10, 50).is_err());
        assert!(ResizePreset::new("thumb", 0, 10, 50).is_err());
        assert!(ResizePreset::new("thumb", 10, 0, 50).is_err());
        assert!(ResizePreset::new("thumb", 10, 10, 101).is_err());
        assert!(ResizePreset::new("thumb", 10, 10, 100).is_ok());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let presets = vec![
            ResizePreset::new("thumb", 10, 10, 50).unwrap(),
            ResizePreset::new("thumb", 20, 20, 50).unwrap(),
        ];
        assert_eq!(
            PresetRegistry::new(presets),
            Err(ValidationError::DuplicatePresetName("thumb".to_string()))
        );
        assert_eq!(
            PresetRegistry::new(vec![]),
            Err(ValidationError::EmptyPresetRegistry)
        );
    }

    #[test]
    fn test_from_json() {
        let registry = PresetRegistry::from_json(
            r#"[{"name":"square","width":128,"height":128,"quality":90},
                {"name":"banner","width":1200,"height":400,"quality":70}]"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("banner").map(|p| p.width()), Some(1200));
        assert!(registry.get("thumbnail").is_none());
    }

    #[test]
    fn test_from_json_validates_entries() {
        let err = PresetRegistry::from_json(
            r#"[{"name":"bad.name","width":128,"height":128,"quality":90}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPresetNameCharacter { character: '.', .. }
        ));

        let err = PresetRegistry::from_json("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPresetDocument(_)));
    }
}
