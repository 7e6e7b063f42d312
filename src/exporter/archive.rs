use crate::error::{Result, SnapshotError};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write the whole output tree into a single zip archive. Entry names are
/// paths relative to `output_root`, with forward slashes on every platform.
/// Returns the number of file entries written.
pub fn write_archive(output_root: &Path, archive_path: &Path) -> Result<usize> {
    let archive_error = |message: String| SnapshotError::Archive {
        path: archive_path.to_path_buf(),
        message,
    };

    let file = fs::File::create(archive_path).map_err(|e| archive_error(e.to_string()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(output_root).follow_links(false) {
        let entry = entry.map_err(|e| archive_error(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(output_root)
            .map_err(|e| archive_error(e.to_string()))?;
        let name = relative.to_string_lossy().replace('\\', "/");

        writer
            .start_file(name, options)
            .map_err(|e| archive_error(e.to_string()))?;
        let mut source = fs::File::open(entry.path()).map_err(|e| archive_error(e.to_string()))?;
        io::copy(&mut source, &mut writer).map_err(|e| archive_error(e.to_string()))?;
        entries += 1;
    }

    writer.finish().map_err(|e| archive_error(e.to_string()))?;
    Ok(entries)
}
