use crate::error::StorageError;
use crate::read_table;
use core_types::{stack_frames, Datasets};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PARTITION_FILES: [&str; 2] = ["data.parquet", "data.csv"];

/// Every partition file under `input_dir/dataset`, in sorted path order.
pub fn partition_files(input_dir: &Path, dataset: &str) -> Result<Vec<PathBuf>, StorageError> {
    let base = input_dir.join(dataset);
    if !base.is_dir() {
        return Err(StorageError::DatasetNotFound(base));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry?;
        let is_partition = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| PARTITION_FILES.contains(&name));
        if is_partition {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(StorageError::NoPartitions(base));
    }
    Ok(files)
}

/// Loads and concatenates every partition of one dataset.
///
/// Layout: `input_dir/<dataset>/period=<p>/data.{parquet,csv}`. Partitions may
/// disagree on columns; the result holds their union.
pub fn load_partitioned_dataset(input_dir: &Path, dataset: &str) -> Result<DataFrame, StorageError> {
    let files = partition_files(input_dir, dataset)?;
    let parts = files
        .iter()
        .map(|path| read_table(path))
        .collect::<Result<Vec<_>, _>>()?;
    let table = stack_frames(&parts)?;

    tracing::info!(
        dataset = %dataset,
        partitions = files.len(),
        rows = table.height(),
        columns = table.width(),
        "Dataset loaded"
    );
    Ok(table)
}

/// Loads each named dataset from `input_dir`.
pub fn load_datasets<I, S>(input_dir: &Path, names: I) -> Result<Datasets, StorageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            Ok((name.to_string(), load_partitioned_dataset(input_dir, name)?))
        })
        .collect()
}
