//! Shader pipeline stages and the file suffix convention built on them.

use std::fmt;
use std::path::Path;

/// A shader pipeline stage.
///
/// Config files, output directories and generated files are all tagged with
/// the stage as their final extension (`foo.vert.json`, `foo.vert/`,
/// `foo.vert/OPTIONA1.vert`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vert,
    Geom,
    Frag,
}

impl Stage {
    /// Every recognized stage, in pipeline order.
    pub const ALL: [Stage; 3] = [Stage::Vert, Stage::Geom, Stage::Frag];

    /// Parse a suffix without its leading dot.
    pub fn from_suffix(suffix: &str) -> Option<Stage> {
        Self::ALL.into_iter().find(|stage| stage.suffix() == suffix)
    }

    /// The file suffix for this stage, without the leading dot.
    pub fn suffix(self) -> &'static str {
        match self {
            Stage::Vert => "vert",
            Stage::Geom => "geom",
            Stage::Frag => "frag",
        }
    }

    /// Classify a file or directory by its final extension.
    pub fn of_path(path: &Path) -> Option<Stage> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Stage::from_suffix)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}
