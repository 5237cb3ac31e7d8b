//! Packed chart bundles
//!
//! Charts may ship as `.tgz` archives, either flat or with the conventional
//! single top-level directory (`<chart-name>/Chart.yaml`). The loader reads
//! the archive in a single pass and normalizes entry names before handing
//! them to the chart assembler.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use crate::chart::Chart;
use crate::error::{CoreError, Result};

/// Load a chart from a `.tar.gz` archive
pub fn load_archive(path: &Path) -> Result<Chart> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .map_err(|e| CoreError::Archive {
                message: format!("invalid entry path in {}: {e}", path.display()),
            })?
            .to_string_lossy()
            .replace('\\', "/");

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        entries.push((name, data));
    }

    if entries.is_empty() {
        return Err(CoreError::Archive {
            message: format!("archive {} contains no files", path.display()),
        });
    }

    Chart::from_entries(strip_shared_root(entries), &path.display().to_string())
}

/// Strip a single shared top-level directory from entry names, if any
fn strip_shared_root(entries: Vec<(String, Vec<u8>)>) -> Vec<(String, Vec<u8>)> {
    let shared = entries
        .first()
        .and_then(|(name, _)| name.split_once('/'))
        .map(|(root, _)| root.to_string());

    let Some(root) = shared else {
        return entries;
    };

    let prefix = format!("{root}/");
    if !entries.iter().all(|(name, _)| name.starts_with(&prefix)) {
        return entries;
    }

    entries
        .into_iter()
        .map(|(name, data)| (name[prefix.len()..].to_string(), data))
        .collect()
}
