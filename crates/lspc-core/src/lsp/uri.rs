//! Filesystem path to `file://` URI conversion.

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use lsp_types::Uri;
use url::Url;

use crate::error::{Error, Result};

/// Convert a filesystem path into a `file://` document URI.
///
/// Relative paths are resolved against the current directory and `.`/`..`
/// components are folded lexically (symlinks are not resolved). Percent
/// encoding and Windows drive letters (`file:///C:/...`) are handled by
/// [`Url::from_file_path`].
///
/// # Errors
///
/// Returns [`Error::InvalidUri`] if the path cannot be represented as a URI.
pub fn path_to_uri(path: &Path) -> Result<Uri> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = normalize(&absolute);

    let url = Url::from_file_path(&normalized)
        .map_err(|()| Error::InvalidUri(format!("not an absolute path: {}", normalized.display())))?;

    Uri::from_str(url.as_str()).map_err(|e| Error::InvalidUri(format!("{url}: {e}")))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
