//! Project configuration
//!
//! An optional `giom.json` at the project root:
//!
//! ```json
//! {
//!   "compilerOptions": { "prettyPrint": true, "globalNames": ["site"] },
//!   "include": ["views/**/*.giom"],
//!   "outDir": "build"
//! }
//! ```

use anyhow::Context;
use giom_compiler::CompileOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "giom.json";

fn default_include() -> Vec<String> {
    vec!["**/*.giom".to_string()]
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiomConfig {
    #[serde(default)]
    pub compiler_options: CompileOptions,
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Output root, relative to the project directory. Outputs are written
    /// next to their sources when unset.
    #[serde(default)]
    pub out_dir: Option<String>,
}

impl Default for GiomConfig {
    fn default() -> Self {
        GiomConfig {
            compiler_options: CompileOptions::default(),
            include: default_include(),
            out_dir: None,
        }
    }
}

impl GiomConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: GiomConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Load `giom.json` from a project directory, or the defaults when the
    /// directory has none.
    pub fn load_project(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(GiomConfig::default())
        }
    }

    pub fn out_dir(&self, project_dir: &Path) -> PathBuf {
        match &self.out_dir {
            Some(out_dir) => project_dir.join(out_dir),
            None => project_dir.to_path_buf(),
        }
    }
}
