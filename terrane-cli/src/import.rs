//! Import command implementation for the Terrane CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use terrane_core::SqliteLayerStore;
use terrane_data::{DEFAULT_COMMIT_INTERVAL, ImportReport, LayerImporter};

use crate::{
    ARG_IMPORT_COMMIT_INTERVAL, ARG_IMPORT_DATASET, ARG_IMPORT_STORE_DIR, CliError,
    ENV_IMPORT_DATASET, ENV_IMPORT_STORE_DIR,
};

/// File name of the layer database inside the store directory.
pub(crate) const STORE_FILE_NAME: &str = "layers.db";

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Import a shapefile into a named layer of the layer store. \
                 Records are written in transactions of at most \
                 <commit-interval> features; unreadable or empty geometries \
                 are skipped with a warning.",
    about = "Import a shapefile into a layer"
)]
#[ortho_config(prefix = "TERRANE")]
pub(crate) struct ImportArgs {
    /// Directory holding the layer store (`layers.db`); created if missing.
    #[arg(value_name = "store-dir")]
    #[serde(default)]
    pub(crate) store_dir: Option<Utf8PathBuf>,
    /// Shapefile to import, with or without the `.shp` extension.
    #[arg(value_name = "dataset")]
    #[serde(default)]
    pub(crate) dataset: Option<Utf8PathBuf>,
    /// Target layer name; defaults to the dataset file stem.
    #[arg(value_name = "layer")]
    #[serde(default)]
    pub(crate) layer: Option<String>,
    /// Records per transaction (default 1000).
    #[arg(value_name = "commit-interval")]
    #[serde(default)]
    pub(crate) commit_interval: Option<usize>,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) store_dir: Utf8PathBuf,
    pub(crate) dataset: Utf8PathBuf,
    pub(crate) layer: Option<String>,
    pub(crate) commit_interval: usize,
}

impl ImportConfig {
    /// Location of the layer database.
    pub(crate) fn store_path(&self) -> Utf8PathBuf {
        self.store_dir.join(STORE_FILE_NAME)
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let candidates = [
            self.dataset.clone(),
            Utf8PathBuf::from(format!("{}.shp", self.dataset)),
        ];
        for candidate in &candidates {
            if Self::is_file(candidate)? {
                return Ok(());
            }
        }
        Err(CliError::MissingSourceFile {
            field: ARG_IMPORT_DATASET,
            path: self.dataset.clone(),
        })
    }

    fn is_file(path: &Utf8Path) -> Result<bool, CliError> {
        terrane_fs::file_is_file(path).map_err(|source| CliError::InspectSourcePath {
            field: ARG_IMPORT_DATASET,
            path: path.to_path_buf(),
            source,
        })
    }
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let store_dir = args.store_dir.ok_or(CliError::MissingArgument {
            field: ARG_IMPORT_STORE_DIR,
            env: ENV_IMPORT_STORE_DIR,
        })?;
        let dataset = args.dataset.ok_or(CliError::MissingArgument {
            field: ARG_IMPORT_DATASET,
            env: ENV_IMPORT_DATASET,
        })?;
        let commit_interval = match args.commit_interval {
            None => DEFAULT_COMMIT_INTERVAL,
            Some(0) => {
                return Err(CliError::InvalidCommitInterval {
                    field: ARG_IMPORT_COMMIT_INTERVAL,
                });
            }
            Some(interval) => interval,
        };
        let layer = args.layer.filter(|name| !name.trim().is_empty());
        Ok(Self {
            store_dir,
            dataset,
            layer,
            commit_interval,
        })
    }
}

/// Open (or create) the layer store and import the configured dataset.
pub(crate) fn import_dataset(config: &ImportConfig) -> Result<ImportReport, CliError> {
    let store_path = config.store_path();
    terrane_fs::ensure_parent_dir(&store_path).map_err(|source| {
        CliError::CreateStoreDirectory {
            path: config.store_dir.clone(),
            source,
        }
    })?;

    let store = SqliteLayerStore::open(&store_path).map_err(|source| CliError::OpenStore {
        path: store_path.clone(),
        source,
    })?;
    let import_failed = |source| CliError::Import {
        dataset: config.dataset.clone(),
        source,
    };
    let mut importer = LayerImporter::new(store, config.commit_interval).map_err(import_failed)?;
    importer
        .import_path(&config.dataset, config.layer.as_deref())
        .map_err(import_failed)
}
