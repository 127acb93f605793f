//! Shader permutation generator
//!
//! Expands `<name>.<stage>.json` option spaces under a shader root into one
//! preprocessed source file per permutation that satisfies the template's
//! requirements:
//!
//! ```text
//! shaders/mesh.vert.json        options + requirements
//! shaders/mesh.vert.glsl        shared template source
//! shaders/mesh.vert/A1_Bx.vert  #define OPTION_A 1 / OPTION_B x + #include "../mesh.vert.glsl"
//! ```
//!
//! All entry points take the root explicitly; nothing is process-global.

pub mod config;
pub mod emit;
pub mod error;
pub mod permutation;
pub mod requirement;
pub mod stage;
pub mod sweep;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub use config::{Axis, OptionSpace, Template, TemplatePaths};
pub use emit::OutputFile;
pub use error::{ConfigErrorKind, ConfigurationError, GenError, RequirementError};
pub use permutation::{Generation, Permutation, Permutations, generate};
pub use requirement::Requirement;
pub use stage::Stage;
pub use sweep::{SweepReport, sweep};

/// Default shader root, relative to the working directory
pub const DEFAULT_ROOT: &str = "shaders";

/// Everything one template would produce.
#[derive(Debug, Clone)]
pub struct TemplateOutput {
    pub paths: TemplatePaths,
    /// Candidates before requirement filtering
    pub total: usize,
    pub files: Vec<OutputFile>,
}

/// Output of every template under a root, computed without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub templates: Vec<TemplateOutput>,
    /// `.json` files that aren't `<name>.<stage>.json`
    pub skipped: Vec<PathBuf>,
}

/// Result of a full generation run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sweep: SweepReport,
    pub templates: Vec<TemplateSummary>,
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub output_dir: PathBuf,
    pub generated: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn files_written(&self) -> usize {
        self.templates.iter().map(|t| t.generated).sum()
    }
}

/// Differences between generated outputs on disk and a fresh plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Files the plan expects that don't exist
    pub missing: Vec<PathBuf>,
    /// Files whose contents differ from what would be generated
    pub stale: Vec<PathBuf>,
    /// Entries in output directories that no permutation produces
    pub unexpected: Vec<PathBuf>,
    /// Number of expected files compared
    pub checked: usize,
}

impl CheckReport {
    pub fn in_sync(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.unexpected.is_empty()
    }
}

/// Find template configs under `root`, in sorted traversal order.
pub fn discover_configs(root: &Path) -> Result<Vec<PathBuf>, GenError> {
    let mut configs = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| GenError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(config::CONFIG_EXTENSION)
        {
            configs.push(path.to_path_buf());
        }
    }
    Ok(configs)
}

/// Load every template under `root` and compute its outputs.
pub fn plan(root: &Path) -> Result<Plan, GenError> {
    let mut plan = Plan::default();

    for config_path in discover_configs(root)? {
        let Some(paths) = template_paths(config_path, &mut plan.skipped) else {
            continue;
        };
        plan.templates.push(plan_template(paths)?);
    }

    Ok(plan)
}

/// Sweep old outputs under `root`, then regenerate every template.
///
/// Each template is written before the next one is loaded, so a bad config
/// leaves every template before it in traversal order regenerated.
pub fn run(root: &Path) -> Result<RunSummary, GenError> {
    let mut summary = RunSummary {
        sweep: sweep::sweep(root)?,
        ..RunSummary::default()
    };

    for config_path in discover_configs(root)? {
        let Some(paths) = template_paths(config_path, &mut summary.skipped) else {
            continue;
        };
        let output = plan_template(paths)?;
        let generated = emit::write_outputs(&output.paths.output_dir, &output.files)?;
        summary.templates.push(TemplateSummary {
            output_dir: output.paths.output_dir,
            generated,
            total: output.total,
        });
    }

    Ok(summary)
}

/// Recognize a `<name>.<stage>.json` config, recording it in `skipped` otherwise.
fn template_paths(config_path: PathBuf, skipped: &mut Vec<PathBuf>) -> Option<TemplatePaths> {
    let paths = TemplatePaths::from_config_path(&config_path);
    if paths.is_none() {
        tracing::info!("skipping \"{}\"", config_path.display());
        skipped.push(config_path);
    }
    paths
}

/// Load one template and compute its outputs in memory.
fn plan_template(paths: TemplatePaths) -> Result<TemplateOutput, GenError> {
    let template = Template::load(paths)?;
    let generation = generate(&template.space, &template.requirements);
    let files = emit::output_files(&template, &generation)?;

    tracing::info!("{}/", template.paths.output_dir.display());
    tracing::info!(
        "  {} of {} possible permutations",
        generation.permutations.len(),
        generation.total
    );

    Ok(TemplateOutput {
        total: generation.total,
        files,
        paths: template.paths,
    })
}

/// Compare generated outputs under `root` with a fresh plan. Writes nothing.
pub fn check(root: &Path) -> Result<CheckReport, GenError> {
    let plan = plan(root)?;
    let mut report = CheckReport::default();

    for output in &plan.templates {
        for file in &output.files {
            report.checked += 1;
            match std::fs::read(&file.path) {
                Ok(existing) if existing == file.contents.as_bytes() => {}
                Ok(_) => report.stale.push(file.path.clone()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    report.missing.push(file.path.clone());
                }
                Err(e) => return Err(GenError::io(&file.path)(e)),
            }
        }

        let output_dir = &output.paths.output_dir;
        if !output_dir.is_dir() {
            continue;
        }
        let expected: HashSet<&Path> = output.files.iter().map(|f| f.path.as_path()).collect();
        let mut entries = std::fs::read_dir(output_dir)
            .map_err(GenError::io(output_dir))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(GenError::io(output_dir))?;
        entries.sort();
        report
            .unexpected
            .extend(entries.into_iter().filter(|p| !expected.contains(p.as_path())));
    }

    for path in report.missing.iter().chain(&report.stale) {
        tracing::warn!("out of date: {}", path.display());
    }
    for path in &report.unexpected {
        tracing::warn!("not generated by any permutation: {}", path.display());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    const MESH_CONFIG: &str =
        r#"{ "options": { "A": ["1", "2"], "B": ["x", "y"] }, "requirements": ["A == '1' or B == 'x'"] }"#;

    #[test]
    fn test_plan_skips_unrecognized_configs() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        write(&root.join("mesh.vert.json"), MESH_CONFIG);
        write(&root.join("settings.json"), "{}");
        write(&root.join("compute.comp.json"), "{}");

        let plan = plan(root).unwrap();
        assert_eq!(plan.templates.len(), 1);
        assert_eq!(plan.templates[0].total, 4);
        assert_eq!(plan.templates[0].files.len(), 3);
        assert_eq!(
            plan.skipped,
            [root.join("compute.comp.json"), root.join("settings.json")]
        );
        assert!(!root.join("mesh.vert").exists(), "plan must not write");
    }

    #[test]
    fn test_run_then_check_is_in_sync() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        write(&root.join("mesh.vert.json"), MESH_CONFIG);

        let summary = run(root).unwrap();
        assert_eq!(
            summary.templates,
            [TemplateSummary {
                output_dir: root.join("mesh.vert"),
                generated: 3,
                total: 4,
            }]
        );
        assert_eq!(summary.files_written(), 3);

        let report = check(root).unwrap();
        assert!(report.in_sync(), "{report:?}");
        assert_eq!(report.checked, 3);
    }

    #[test]
    fn test_check_reports_drift() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        write(&root.join("mesh.vert.json"), MESH_CONFIG);
        run(root).unwrap();

        std::fs::remove_file(root.join("mesh.vert/A1_Bx.vert")).unwrap();
        write(&root.join("mesh.vert/A1_By.vert"), "edited");
        write(&root.join("mesh.vert/A2_By.vert"), "orphan");

        let report = check(root).unwrap();
        assert!(!report.in_sync());
        assert_eq!(report.missing, [root.join("mesh.vert/A1_Bx.vert")]);
        assert_eq!(report.stale, [root.join("mesh.vert/A1_By.vert")]);
        assert_eq!(report.unexpected, [root.join("mesh.vert/A2_By.vert")]);
    }

    #[test]
    fn test_run_stops_on_configuration_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        write(&root.join("a.vert.json"), MESH_CONFIG);
        write(
            &root.join("bad.frag.json"),
            r#"{ "options": { "A": ["1"] }, "requirements": ["__import__('os')"] }"#,
        );
        write(&root.join("c.vert.json"), MESH_CONFIG);

        let err = match run(root) {
            Err(GenError::Config(err)) => err,
            other => panic!("expected configuration error, got {other:?}"),
        };
        assert_eq!(err.path, root.join("bad.frag.json"));
        assert!(!root.join("bad.frag").exists());

        // Templates earlier in traversal order were already written.
        assert!(root.join("a.vert/A1_Bx.vert").is_file());
        assert!(!root.join("c.vert").exists());
    }

    #[test]
    fn test_colliding_outputs_are_a_configuration_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        write(
            &root.join("m.vert.json"),
            r#"{ "options": { "A": ["x_By", "x"], "B": ["z", "y_Bz"] }, "requirements": [] }"#,
        );

        let err = match run(root) {
            Err(GenError::Config(err)) => err,
            other => panic!("expected configuration error, got {other:?}"),
        };
        assert!(matches!(err.kind, ConfigErrorKind::OutputCollision { .. }));
        assert!(!root.join("m.vert").exists());
    }
}
