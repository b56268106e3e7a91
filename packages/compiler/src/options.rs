//! Compile options

use serde::{Deserialize, Serialize};

fn default_module_extension() -> String {
    ".giom".to_string()
}

/// Options of one compile call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Start tags and non-inline text on their own lines, indented by
    /// nesting depth.
    pub pretty_print: bool,
    /// Host code written before the template body.
    pub pre_code: Option<String>,
    /// Names declared with a leading `global(...)` line.
    pub global_names: Vec<String>,
    pub filename: Option<String>,
    /// Extension appended to `@import` paths.
    #[serde(default = "default_module_extension")]
    pub module_extension: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            pretty_print: false,
            pre_code: None,
            global_names: Vec::new(),
            filename: None,
            module_extension: default_module_extension(),
        }
    }
}

impl CompileOptions {
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}
