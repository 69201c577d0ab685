use std::{io, path::Path};

use tokio::fs;

use crate::{VmxdError, VmxdResult};

use super::{Registry, VmDescriptor};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Lists `directory` and maps every descriptor file in it to its VM name.
///
/// Only the immediate entries are considered. Directories are skipped, and so is any
/// entry whose name does not end with `extension` exactly (the match is case-sensitive).
/// The VM name is the file name with `extension` removed.
///
/// ## Errors
/// Returns [`VmxdError::DirectoryUnreadable`] if the directory cannot be listed.
pub async fn scan(directory: impl AsRef<Path>, extension: &str) -> VmxdResult<Registry> {
    let directory = directory.as_ref();
    let unreadable = |source: io::Error| VmxdError::DirectoryUnreadable {
        path: directory.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(directory).await.map_err(unreadable)?;
    let mut registry = Registry::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::warn!("skipping {}: {e}", entry.path().display());
                continue;
            }
        };

        if file_type.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            tracing::debug!("skipping non utf-8 file name: {:?}", file_name);
            continue;
        };

        match file_name.strip_suffix(extension) {
            Some(name) if !name.is_empty() => {
                registry.insert(VmDescriptor::new(name, directory.join(file_name)));
            }
            _ => continue,
        }
    }

    tracing::debug!(
        "scanned {}: found {} vm(s)",
        directory.display(),
        registry.len()
    );

    Ok(registry)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
