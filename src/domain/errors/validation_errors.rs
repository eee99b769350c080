/// Validation errors for domain value objects and the preset registry
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),

    // BucketName validation errors
    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),
    BucketNameConsecutiveHyphens,
    BucketNameAdjacentDot,
    BucketNameLooksLikeIpAddress,

    // ResizePreset validation errors
    EmptyPresetName,
    InvalidPresetNameCharacter {
        name: String,
        character: char,
    },
    InvalidPresetGeometry {
        name: String,
        width: u32,
        height: u32,
    },
    InvalidPresetQuality {
        name: String,
        quality: u8,
    },

    // PresetRegistry validation errors
    EmptyPresetRegistry,
    DuplicatePresetName(String),
    MalformedPresetDocument(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }

            // BucketName errors
            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, dots and hyphens allowed",
                    c
                )
            }
            ValidationError::BucketNameConsecutiveHyphens => {
                write!(f, "Bucket name cannot contain consecutive hyphens")
            }
            ValidationError::BucketNameAdjacentDot => {
                write!(f, "Bucket name dots must sit between letters or digits")
            }
            ValidationError::BucketNameLooksLikeIpAddress => {
                write!(f, "Bucket name cannot be formatted as an IP address")
            }

            // Preset errors
            ValidationError::EmptyPresetName => write!(f, "Preset name cannot be empty"),
            ValidationError::InvalidPresetNameCharacter { name, character } => {
                write!(
                    f,
                    "Preset name '{}' contains reserved character '{}'",
                    name, character
                )
            }
            ValidationError::InvalidPresetGeometry {
                name,
                width,
                height,
            } => {
                write!(
                    f,
                    "Preset '{}' has invalid geometry {}x{} (both sides must be positive)",
                    name, width, height
                )
            }
            ValidationError::InvalidPresetQuality { name, quality } => {
                write!(
                    f,
                    "Preset '{}' has quality {} (expected 0..=100)",
                    name, quality
                )
            }

            // Registry errors
            ValidationError::EmptyPresetRegistry => {
                write!(f, "Preset registry must contain at least one preset")
            }
            ValidationError::DuplicatePresetName(name) => {
                write!(f, "Duplicate preset name: {}", name)
            }
            ValidationError::MalformedPresetDocument(message) => {
                write!(f, "Malformed preset document: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
