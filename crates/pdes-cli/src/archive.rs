//! # pdes-cli::archive
//!
//! Checkpoint files for the configuration graph: `<base>.<type>.<rank>`
//! in either readable JSON or compact binary. A graph loaded from an
//! archive wires up identically to the one that was saved.

use crate::args::ArchiveType;
use anyhow::{Context, Result};
use pdes_types::{graph::ConfigGraph, ids::Rank};
use std::path::{Path, PathBuf};

fn archive_path(base: &Path, ty: ArchiveType, rank: Rank) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{}.{rank}", ty.extension()));
    PathBuf::from(name)
}

pub fn save(graph: &ConfigGraph, base: &Path, ty: ArchiveType, rank: Rank) -> Result<PathBuf> {
    let path = archive_path(base, ty, rank);
    let bytes = match ty {
        ArchiveType::Text => serde_json::to_vec_pretty(graph)?,
        ArchiveType::Bin => postcard::to_allocvec(graph)?,
    };
    std::fs::write(&path, bytes)
        .with_context(|| format!("cannot write archive {}", path.display()))?;
    Ok(path)
}

pub fn load(base: &Path, ty: ArchiveType, rank: Rank) -> Result<ConfigGraph> {
    let path = archive_path(base, ty, rank);
    let bytes = std::fs::read(&path)
        .with_context(|| format!("cannot read archive {}", path.display()))?;
    let graph = match ty {
        ArchiveType::Text => serde_json::from_slice(&bytes)?,
        ArchiveType::Bin => postcard::from_bytes(&bytes)?,
    };
    Ok(graph)
}
