#![deny(clippy::all)]

/**
 * giom Template Compiler
 *
 * Compiles indentation-based giom templates into gad mixed-mode source,
 * with optional Node.js bindings.
 */

#[cfg(feature = "napi-bindings")]
use napi::bindgen_prelude::*;
#[cfg(feature = "napi-bindings")]
use napi_derive::napi;

pub mod attrs;
pub mod chars;
pub mod compiler;
pub mod error;
pub mod host;
pub mod options;
pub mod parse_util;
pub mod parser;
pub mod runtime;

pub use compiler::Compiler;
pub use error::{CompilerError, Result as CompileResult};
pub use options::CompileOptions;
pub use parser::Root;

use tracing::debug;

/// Parse `source` into its template tree.
pub fn parse(source: &str, options: &CompileOptions) -> CompileResult<Root> {
    parser::Parser::new(source)
        .with_filename(options.filename.clone())
        .with_module_extension(options.module_extension.as_str())
        .parse()
}

/// Compile a template source to gad mixed-mode text.
pub fn compile_to_string(source: &str, options: &CompileOptions) -> CompileResult<String> {
    let root = parse(source, options)?;
    let output = Compiler::new(options).compile(&root)?;

    debug!(
        filename = options.filename.as_deref().unwrap_or("<source>"),
        bytes = output.len(),
        "compiled template"
    );
    Ok(output)
}

/// Compile options as passed from JavaScript.
#[cfg(feature = "napi-bindings")]
#[napi(object)]
pub struct JsCompileOptions {
    pub pretty_print: Option<bool>,
    pub pre_code: Option<String>,
    pub global_names: Option<Vec<String>>,
    pub filename: Option<String>,
    pub module_extension: Option<String>,
}

#[cfg(feature = "napi-bindings")]
impl From<JsCompileOptions> for CompileOptions {
    fn from(js: JsCompileOptions) -> Self {
        let defaults = CompileOptions::default();
        CompileOptions {
            pretty_print: js.pretty_print.unwrap_or(defaults.pretty_print),
            pre_code: js.pre_code,
            global_names: js.global_names.unwrap_or_default(),
            filename: js.filename,
            module_extension: js.module_extension.unwrap_or(defaults.module_extension),
        }
    }
}

/// Compile a template
#[cfg(feature = "napi-bindings")]
#[napi]
pub fn compile_template(source: String, options: Option<JsCompileOptions>) -> Result<String> {
    let options = options.map(CompileOptions::from).unwrap_or_default();
    compile_to_string(&source, &options).map_err(|err| Error::from_reason(err.to_string()))
}

/// Parse a template and return its tree as JSON
#[cfg(feature = "napi-bindings")]
#[napi]
pub fn parse_template(source: String, filename: Option<String>) -> Result<String> {
    let options = CompileOptions {
        filename,
        ..CompileOptions::default()
    };
    let root = parse(&source, &options).map_err(|err| Error::from_reason(err.to_string()))?;
    serde_json::to_string(&root).map_err(|err| Error::from_reason(err.to_string()))
}

/// Get compiler version
#[cfg(feature = "napi-bindings")]
#[napi]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
