//! Error types emitted by the Terrane CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use terrane_core::StoreError;
use terrane_data::ImportError;
use thiserror::Error;

/// Errors emitted by the Terrane CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required value is missing after configuration merging.
    #[error("missing <{field}> (pass it on the command line or set {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The commit interval was zero.
    #[error("{field} must be at least 1")]
    InvalidCommitInterval { field: &'static str },
    /// The dataset does not exist as given or with a `.shp` extension.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The store directory could not be created.
    #[error("failed to create store directory {path:?}: {source}")]
    CreateStoreDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The layer store could not be opened.
    #[error("failed to open layer store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// The import itself failed.
    #[error("failed to import {dataset:?}: {source}")]
    Import {
        dataset: Utf8PathBuf,
        #[source]
        source: ImportError,
    },
}
