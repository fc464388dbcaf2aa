use std::error::Error as StdError;
use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while opening a shapefile dataset.
///
/// All of these are detected before any store transaction opens.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A mandatory component file is missing.
    #[error("{component} file not found at {path}")]
    NotFound {
        /// Component label, such as `"shape"` or `"attribute"`.
        component: &'static str,
        /// Path that was inspected.
        path: Utf8PathBuf,
    },
    /// Probing the filesystem failed.
    #[error("failed to inspect {path}")]
    Inspect {
        /// Path that was inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A component header could not be parsed.
    #[error("failed to read {component} header from {path}")]
    Format {
        /// Component label.
        component: &'static str,
        /// Component path.
        path: Utf8PathBuf,
        /// Parser error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The projection file exists but could not be read.
    #[error("failed to read projection file {path}")]
    ReadProjection {
        /// Projection file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
