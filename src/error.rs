//! Error types for `meshforge`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `meshforge` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Scene Import Errors ====================
    /// The input model file could not be loaded or is not a supported format.
    #[error("unsupported input format: {message}")]
    UnsupportedInputFormat {
        /// Description of what failed during import.
        message: String,
    },

    /// Extraction walked the whole scene graph and produced zero meshes.
    #[error("no geometry found in model")]
    NoGeometryFound,

    // ==================== Texture Codec Errors ====================
    /// The source image could not be read or decoded.
    #[error("failed to decode image '{path}': {message}")]
    ImageDecodeError {
        /// The source image path.
        path: PathBuf,
        /// The decode error message.
        message: String,
    },

    /// Failed to create a DDS container.
    #[error("failed to create DDS: {message}")]
    DdsCreateFailed {
        /// The error message.
        message: String,
    },

    /// Failed to write DDS container data.
    #[error("failed to write DDS: {message}")]
    DdsWriteFailed {
        /// The error message.
        message: String,
    },

    /// Failed to parse an existing DDS container (pass-through path).
    #[error("failed to parse DDS: {message}")]
    DdsParseFailed {
        /// The parse error message.
        message: String,
    },

    // ==================== Document Serializer Errors ====================
    /// Serializing the scene document failed. Fatal; aborts the export.
    #[error("document serialization failed: {message}")]
    SerializationFailure {
        /// The serialization error message.
        message: String,
    },

    // ==================== Catalog Errors ====================
    /// A material references a shader filename not present in the catalog.
    #[error("unknown shader: {filename}")]
    UnknownShader {
        /// The shader filename that was looked up.
        filename: String,
    },

    // ==================== Parsing Errors ====================
    /// XML writing error.
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// UTF-8 conversion error.
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// A specialized Result type for `meshforge` operations.
pub type Result<T> = std::result::Result<T, Error>;
