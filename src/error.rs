//! Error types for `scenegltf`

use thiserror::Error;

/// The error type for `scenegltf` export operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Unsupported Input ====================
    /// The attribute storage type has no glTF component type.
    #[error("unsupported component storage: {type_name}")]
    UnsupportedComponentStorage {
        /// Name of the offending storage type (e.g. `i32`).
        type_name: &'static str,
    },

    /// The accessor item size has no glTF type string.
    #[error("unsupported accessor item size: {item_size}")]
    UnsupportedItemSize {
        /// The item size found on the attribute.
        item_size: usize,
    },

    /// A morph target was addressed by a name the mesh does not define.
    #[error("morph target not found: {name}")]
    MorphTargetNotFound {
        /// The morph target name used by the animation track.
        name: String,
    },

    /// A per-index morph track uses CUBICSPLINE interpolation, which the
    /// track merger cannot resample.
    #[error("CUBICSPLINE interpolation is not supported for morph target track {track}")]
    CubicSplineMorphTrack {
        /// Index of the track within its clip.
        track: usize,
    },

    // ==================== Image Errors ====================
    /// The requested image encode target is not PNG or JPEG.
    #[error("unsupported image mime type: {mime}")]
    UnsupportedMimeType {
        /// The requested mime type.
        mime: String,
    },

    /// The image source cannot be rasterized.
    #[error("invalid image source: {reason}")]
    InvalidImageSource {
        /// Description of what is invalid.
        reason: String,
    },

    /// Image encoding failed.
    #[error("image encoding failed: {message}")]
    ImageEncode {
        /// The encoder error message.
        message: String,
    },

    // ==================== Serialization Errors ====================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for `scenegltf` operations.
pub type Result<T> = std::result::Result<T, Error>;
