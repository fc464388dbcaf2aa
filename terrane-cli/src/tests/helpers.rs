//! Test helpers for composing import datasets and layered overrides.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) store_dir: Option<Utf8PathBuf>,
    pub(super) dataset: Option<Utf8PathBuf>,
    pub(super) layer: Option<String>,
    pub(super) commit_interval: Option<usize>,
}

/// Temporary directory holding a placeholder shapefile.
#[derive(Debug)]
pub(super) struct DatasetFiles {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl DatasetFiles {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        fs::write(root.join("roads.shp"), b"shape contents").expect("write shape file");
        fs::write(root.join("roads.dbf"), b"attribute contents").expect("write attribute file");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Dataset path without extension.
    pub(super) fn dataset(&self) -> Utf8PathBuf {
        self.root.join("roads")
    }

    pub(super) fn store_dir(&self) -> Utf8PathBuf {
        self.root.join("store")
    }

    pub(super) fn config_store_dir(&self) -> Utf8PathBuf {
        self.root.join("config-store")
    }
}

/// Apply file and environment layers beneath the CLI values, mirroring the
/// precedence used by `ortho_config`: CLI, then environment, then file.
pub(super) fn merge_layers(
    mut cli_args: ImportArgs,
    file_layer: Option<LayerOverrides>,
    env_layer: Option<LayerOverrides>,
) -> Result<ImportConfig, CliError> {
    merge_field(
        &mut cli_args.store_dir,
        extract_field(env_layer.as_ref(), |layer| &layer.store_dir),
        extract_field(file_layer.as_ref(), |layer| &layer.store_dir),
    );
    merge_field(
        &mut cli_args.dataset,
        extract_field(env_layer.as_ref(), |layer| &layer.dataset),
        extract_field(file_layer.as_ref(), |layer| &layer.dataset),
    );
    merge_field(
        &mut cli_args.layer,
        extract_field(env_layer.as_ref(), |layer| &layer.layer),
        extract_field(file_layer.as_ref(), |layer| &layer.layer),
    );
    merge_field(
        &mut cli_args.commit_interval,
        extract_field(env_layer.as_ref(), |layer| &layer.commit_interval),
        extract_field(file_layer.as_ref(), |layer| &layer.commit_interval),
    );
    let config = ImportConfig::try_from(cli_args)?;
    config.validate_sources()?;
    Ok(config)
}

fn merge_field<T>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: Option<&LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.and_then(|entry| accessor(entry).clone())
}
