//! Rendering and writing of per-permutation shader sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Template;
use crate::error::{ConfigErrorKind, ConfigurationError, GenError};
use crate::permutation::{Generation, Permutation};
use crate::stage::Stage;

/// First line of every generated file
pub const VERSION_DIRECTIVE: &str = "#version 460";

/// Prefix of the preprocessor symbol defined for each axis
pub const DEFINE_PREFIX: &str = "OPTION_";

/// A generated file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Render the source for one permutation.
///
/// ```text
/// #version 460
///
/// #define OPTION_A 1
/// #define OPTION_B x
///
/// #include "../mesh.vert.glsl"
/// ```
pub fn render(permutation: &Permutation<'_>, include_name: &str) -> String {
    let mut out = String::new();
    out.push_str(VERSION_DIRECTIVE);
    out.push_str("\n\n");

    for (axis, value) in permutation.iter() {
        out.push_str("#define ");
        out.push_str(DEFINE_PREFIX);
        out.push_str(axis);
        out.push(' ');
        out.push_str(value);
        out.push('\n');
    }

    out.push_str("\n#include \"../");
    out.push_str(include_name);
    out.push_str("\"\n");
    out
}

/// `<output_name>.<stage>`
pub fn output_file_name(permutation: &Permutation<'_>, stage: Stage) -> String {
    format!("{}.{}", permutation.output_name(), stage.suffix())
}

/// Every file `generation` produces for `template`, in enumeration order.
///
/// Fails if two permutations map to the same file name, which values
/// containing `_` followed by another axis name can cause.
pub fn output_files(
    template: &Template,
    generation: &Generation<'_>,
) -> Result<Vec<OutputFile>, ConfigurationError> {
    let paths = &template.paths;
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(generation.permutations.len());
    let mut files = Vec::with_capacity(generation.permutations.len());

    for (i, permutation) in generation.permutations.iter().enumerate() {
        let name = output_file_name(permutation, paths.stage);
        if let Some(&first) = seen.get(&name) {
            return Err(ConfigurationError::new(
                &paths.config,
                ConfigErrorKind::OutputCollision {
                    first: generation.permutations[first].to_string(),
                    second: permutation.to_string(),
                    file: name,
                },
            ));
        }
        files.push(OutputFile {
            path: paths.output_dir.join(&name),
            contents: render(permutation, &paths.include_name),
        });
        seen.insert(name, i);
    }

    Ok(files)
}

/// Create `output_dir` and write every file into it. Returns the number written.
pub fn write_outputs(output_dir: &Path, files: &[OutputFile]) -> Result<usize, GenError> {
    std::fs::create_dir_all(output_dir).map_err(GenError::io(output_dir))?;

    for file in files {
        std::fs::write(&file.path, &file.contents).map_err(GenError::io(&file.path))?;
    }

    tracing::debug!("wrote {} files to {}", files.len(), output_dir.display());
    Ok(files.len())
}
