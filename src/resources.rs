use std::io::Write;
use tempfile::NamedTempFile;

use crate::error::{IntoSubalignError, Result};

/// Write `contents` to a fresh, exclusively created file in the system temp
/// dir. The file is removed when the returned handle is dropped.
pub fn text_file(prefix: &str, contents: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".txt")
        .tempfile()
        .with_path(std::env::temp_dir())?;
    let path = file.path().to_path_buf();
    file.write_all(contents.as_bytes()).with_path(path.clone())?;
    file.flush().with_path(path)?;
    Ok(file)
}
