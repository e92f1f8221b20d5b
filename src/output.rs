// Output file naming

use crate::constants::OUTPUT_PREFIX;
use crate::error::WatermarkError;
use std::path::{Path, PathBuf};

/// Build `<output_dir>/watermarked_<source basename>`.
pub fn output_path_for(output_dir: &Path, source: &Path) -> Result<PathBuf, WatermarkError> {
    let name = source.file_name().ok_or_else(|| {
        WatermarkError::decode(source, "source path has no file name")
    })?;

    let mut file_name = std::ffi::OsString::from(OUTPUT_PREFIX);
    file_name.push(name);
    Ok(output_dir.join(file_name))
}

/// Make sure the output directory exists before a sink opens a file in it.
pub fn ensure_output_dir(output_dir: &Path) -> Result<(), WatermarkError> {
    std::fs::create_dir_all(output_dir)?;
    Ok(())
}
