//! Compiler
//!
//! Turns a parsed template into a gad mixed-mode module: the generated
//! body wrapped with the optional `global` line, the configured pre code,
//! the mixed-mode marker and the trailing return of all exports.

mod emitter;
mod visitor;

pub use emitter::EmitterContext;
pub use visitor::{CodegenVisitor, CompiledBody};

use crate::chars;
use crate::error::Result;
use crate::host::quote;
use crate::options::CompileOptions;
use crate::parser::Root;
use tracing::debug;

pub struct Compiler<'o> {
    options: &'o CompileOptions,
}

impl<'o> Compiler<'o> {
    pub fn new(options: &'o CompileOptions) -> Self {
        Compiler { options }
    }

    pub fn compile(&self, root: &Root) -> Result<String> {
        let mut visitor = CodegenVisitor::new(self.options.pretty_print);
        visitor.visit_root(root)?;
        let body = visitor.finish();

        debug!(
            exports = body.exports.len(),
            comps = body.exported_comps.len(),
            bytes = body.source.len(),
            "generated template body"
        );

        Ok(self.wrap(body))
    }

    fn wrap(&self, body: CompiledBody) -> String {
        let mut out = String::new();

        if !self.options.global_names.is_empty() {
            out.push_str(&format!("global({})\n", self.options.global_names.join(", ")));
        }
        if let Some(pre_code) = &self.options.pre_code {
            out.push_str(pre_code);
            out.push('\n');
        }

        out.push_str("# gad: mixed\n");
        out.push_str(&body.source);
        if !body.source.is_empty() {
            out.push('\n');
        }

        let entries: Vec<String> = body
            .exports
            .iter()
            .chain(body.exported_comps.iter())
            .map(|(name, value)| format!("{}: {}", return_key(name), value))
            .collect();
        out.push_str(&format!("{{% return {{{}}} %}}", entries.join(", ")));
        out
    }
}

fn return_key(name: &str) -> String {
    if chars::is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}
