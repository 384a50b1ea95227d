use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::dataset::Dataset;
use crate::error::Result;

/// Persist the imported dataset as gzip-compressed bincode
///
/// Parent directories are created when missing.
///
/// # Arguments
/// * `dataset` - Dataset to store
/// * `path` - Destination file, usually `database/dataset.bin.gz`
pub fn save_dataset(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, dataset)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.finish()?;

    info!(
        "Snapshot saved to {} ({} students, {} teachers)",
        path.display(),
        dataset.students.len(),
        dataset.teachers.len()
    );
    Ok(())
}

/// Load a dataset written by [`save_dataset`]
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let file = File::open(path.as_ref())?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let dataset: Dataset = deserialize_from(&mut reader)?;
    Ok(dataset)
}
