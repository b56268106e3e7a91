//! File and project compilation
//!
//! Every template is an independent compile unit; a project compile runs
//! them on the rayon pool and collects per-file outcomes.

use crate::config::GiomConfig;
use anyhow::Context;
use giom_compiler::{compile_to_string, CompileOptions};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const OUTPUT_EXTENSION: &str = "gad";

/// Outcome of a project compile.
#[derive(Debug, Default)]
pub struct ProjectReport {
    /// Written output files, in source order.
    pub written: Vec<PathBuf>,
    /// One message per failed template.
    pub errors: Vec<String>,
}

impl ProjectReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compile one template file. Errors carry `filename` in their position.
pub fn compile_file(path: &Path, filename: &str, options: &CompileOptions) -> anyhow::Result<String> {
    let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let options = options.clone().with_filename(filename);
    let output = compile_to_string(&source, &options)?;
    Ok(output)
}

/// Files under `base_dir` matching any of the `include` patterns, sorted
/// and without duplicates.
pub fn discover_files(base_dir: &Path, include: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for pattern in include {
        let full_pattern = base_dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        match glob::glob(&pattern_str) {
            Ok(paths) => {
                for path in paths.flatten() {
                    if path.is_file() {
                        files.push(path);
                    }
                }
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "invalid include pattern");
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

/// `<out_dir>/<relative dir>/<stem>.gad` for a source under `base_dir`.
pub fn output_path(source: &Path, base_dir: &Path, out_dir: &Path) -> PathBuf {
    let relative = source.strip_prefix(base_dir).unwrap_or(source);
    out_dir.join(relative).with_extension(OUTPUT_EXTENSION)
}

pub fn compile_project(base_dir: &Path, config: &GiomConfig) -> ProjectReport {
    let start = Instant::now();
    let files = discover_files(base_dir, &config.include);
    let out_dir = config.out_dir(base_dir);
    info!(files = files.len(), out_dir = %out_dir.display(), "compiling project");

    let results: Vec<anyhow::Result<PathBuf>> = files
        .par_iter()
        .map(|source| {
            let relative = source.strip_prefix(base_dir).unwrap_or(source);
            let output = compile_file(source, &relative.to_string_lossy(), &config.compiler_options)?;

            let target = output_path(source, base_dir, &out_dir);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(&target, output).with_context(|| format!("writing {}", target.display()))?;
            debug!(source = %source.display(), target = %target.display(), "wrote template");
            Ok(target)
        })
        .collect();

    let mut report = ProjectReport::default();
    for result in results {
        match result {
            Ok(target) => report.written.push(target),
            Err(err) => report.errors.push(format!("{:#}", err)),
        }
    }

    info!(
        written = report.written.len(),
        failed = report.errors.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "project compiled"
    );
    report
}
