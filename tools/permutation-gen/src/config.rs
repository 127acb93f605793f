//! Template configuration: `<name>.<stage>.json` files and the option spaces they declare.
//!
//! ```json
//! {
//!     "options": { "SHADOWS": ["0", "1"], "LIGHTS": ["1", "4", "8"] },
//!     "requirements": ["SHADOWS == '0' or LIGHTS != '8'"]
//! }
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{ConfigErrorKind, ConfigurationError, GenError};
use crate::requirement::{Requirement, is_identifier};
use crate::stage::Stage;

/// Extension of template configuration files
pub const CONFIG_EXTENSION: &str = "json";

/// Extension of the shared template source every output includes
pub const INCLUDE_EXTENSION: &str = "glsl";

/// Raw deserialized config file
#[derive(Debug, Clone, Deserialize)]
pub struct ShaderConfig {
    /// Axis name -> allowed values, in declaration order
    pub options: IndexMap<String, Vec<String>>,
    pub requirements: Vec<String>,
}

/// A named option dimension with its allowed values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub name: String,
    pub values: Vec<String>,
}

impl Axis {
    pub fn value_index(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

/// Validated, ordered set of axes.
///
/// Declaration order decides both enumeration order and output file naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpace {
    axes: Vec<Axis>,
}

impl OptionSpace {
    pub fn new(options: IndexMap<String, Vec<String>>) -> Result<Self, ConfigErrorKind> {
        if options.is_empty() {
            return Err(ConfigErrorKind::NoAxes);
        }

        let mut axes = Vec::with_capacity(options.len());
        for (name, values) in options {
            if !is_identifier(&name) {
                return Err(ConfigErrorKind::InvalidAxisName(name));
            }
            for (i, value) in values.iter().enumerate() {
                if !is_valid_value(value) {
                    return Err(ConfigErrorKind::InvalidValue {
                        axis: name,
                        value: value.clone(),
                    });
                }
                if values[..i].contains(value) {
                    return Err(ConfigErrorKind::DuplicateValue {
                        axis: name,
                        value: value.clone(),
                    });
                }
            }
            axes.push(Axis { name, values });
        }

        Ok(Self { axes })
    }

    /// Convenience constructor for literal option spaces.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> Result<Self, ConfigErrorKind> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|axis| axis.name == name)
    }

    /// Size of the Cartesian product (saturating).
    pub fn candidate_count(&self) -> usize {
        self.axes
            .iter()
            .fold(1usize, |count, axis| count.saturating_mul(axis.values.len()))
    }
}

/// Values end up in file names and `#define` lines.
fn is_valid_value(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\')
}

/// Paths derived from a `<name>.<stage>.json` config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePaths {
    pub config: PathBuf,
    pub stage: Stage,
    /// `<name>.<stage>/`, next to the config
    pub output_dir: PathBuf,
    /// `<name>.<stage>.glsl`, included as `../<include_name>` from the output directory
    pub include_name: String,
}

impl TemplatePaths {
    /// Returns `None` if `path` isn't a config for a recognized stage.
    pub fn from_config_path(path: &Path) -> Option<Self> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(CONFIG_EXTENSION) {
            return None;
        }

        let output_dir = path.with_extension("");
        let stage = Stage::of_path(&output_dir)?;
        let stem = output_dir.file_name()?.to_str()?;

        Some(Self {
            config: path.to_path_buf(),
            stage,
            include_name: format!("{}.{}", stem, INCLUDE_EXTENSION),
            output_dir,
        })
    }
}

/// A loaded template: its paths, option space and compiled requirements.
#[derive(Debug, Clone)]
pub struct Template {
    pub paths: TemplatePaths,
    pub space: OptionSpace,
    pub requirements: Vec<Requirement>,
}

impl Template {
    /// Read and validate the config file.
    pub fn load(paths: TemplatePaths) -> Result<Self, GenError> {
        let bytes = std::fs::read(&paths.config).map_err(GenError::io(&paths.config))?;
        Ok(Self::from_slice(paths, &bytes)?)
    }

    /// Validate config text as if it had been read from `paths.config`.
    pub fn from_json(paths: TemplatePaths, json: &str) -> Result<Self, ConfigurationError> {
        Self::from_slice(paths, json.as_bytes())
    }

    /// Like [`Template::from_json`], for raw file contents. Invalid UTF-8 is a
    /// JSON error like any other.
    pub fn from_slice(paths: TemplatePaths, bytes: &[u8]) -> Result<Self, ConfigurationError> {
        let config: ShaderConfig = serde_json::from_slice(bytes)
            .map_err(|e| ConfigurationError::new(&paths.config, e))?;

        let space = OptionSpace::new(config.options)
            .map_err(|kind| ConfigurationError::new(&paths.config, kind))?;

        let requirements = config
            .requirements
            .iter()
            .map(|expression| {
                Requirement::compile(expression, &space).map_err(|source| {
                    ConfigurationError::new(
                        &paths.config,
                        ConfigErrorKind::Requirement {
                            expression: expression.clone(),
                            source,
                        },
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            paths,
            space,
            requirements,
        })
    }
}
