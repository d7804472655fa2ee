use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extension of source and prelude files.
pub const SOURCE_EXTENSION: &str = "wt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdlibFile {
    /// Path relative to the stdlib root.
    pub path: PathBuf,
    pub contents: String,
}

pub fn default_stdlib_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../stdlib")
}

/// Load every `.wt` file under `root`, in path order.
pub fn load_stdlib_files(root: impl AsRef<Path>) -> Result<Vec<StdlibFile>, std::io::Error> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            let contents = fs::read_to_string(path)?;
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            log::debug!("loaded prelude file {}", relative.display());
            files.push(StdlibFile {
                path: relative,
                contents,
            });
        }
    }
    Ok(files)
}
