//! Removal of previously generated output directories.
//!
//! An output directory is any directory below the root whose name ends in a
//! stage suffix (`mesh.vert/`). Everything else is searched recursively.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::GenError;
use crate::stage::Stage;

/// What a sweep removed and what it had to leave behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed_dirs: Vec<PathBuf>,
    pub removed_files: Vec<PathBuf>,
    /// Entries inside output directories that weren't generated files
    pub kept: Vec<PathBuf>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.kept.is_empty()
    }
}

/// Delete generated files under `root`.
///
/// Inside an output directory, regular files carrying a stage suffix are
/// removed. Anything else is kept with a warning, and then the directory
/// itself is kept too. Symlinks are never followed.
pub fn sweep(root: &Path) -> Result<SweepReport, GenError> {
    let mut report = SweepReport::default();

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| GenError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_dir() || Stage::of_path(entry.path()).is_none() {
            continue;
        }

        walker.skip_current_dir();
        sweep_output_dir(entry.path(), &mut report)?;
    }

    Ok(report)
}

fn sweep_output_dir(dir: &Path, report: &mut SweepReport) -> Result<(), GenError> {
    tracing::info!("{}/", dir.display());

    let mut entries = std::fs::read_dir(dir)
        .map_err(GenError::io(dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(GenError::io(dir))?;
    entries.sort_by_key(|e| e.file_name());

    let mut can_remove_dir = true;
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(GenError::io(&path))?;

        if file_type.is_file() && Stage::of_path(&path).is_some() {
            std::fs::remove_file(&path).map_err(GenError::io(&path))?;
            report.removed_files.push(path);
        } else {
            tracing::warn!("\"{}\" not removed", path.display());
            report.kept.push(path);
            can_remove_dir = false;
        }
    }

    if can_remove_dir {
        std::fs::remove_dir(dir).map_err(GenError::io(dir))?;
        tracing::info!("old files removed");
        report.removed_dirs.push(dir.to_path_buf());
    }

    Ok(())
}
