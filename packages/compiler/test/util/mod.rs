/**
 * Test Utilities
 *
 * Shared helpers for compiling template snippets in integration tests.
 */
use giom_compiler::parser::{Node, Root, Tag};
use giom_compiler::{compile_to_string, parse, CompileOptions};

const HEADER: &str = "# gad: mixed\n";
const EMPTY_RETURN: &str = "{% return {} %}";

/// Compile `source` with default options.
pub fn compile(source: &str) -> String {
    compile_with(source, &CompileOptions::default())
}

pub fn compile_with(source: &str, options: &CompileOptions) -> String {
    match compile_to_string(source, options) {
        Ok(out) => out,
        Err(err) => panic!("compile failed: {}\nsource:\n{}", err, source),
    }
}

/// Generated body of a template without exports: the output minus the
/// mixed-mode header and the empty return.
pub fn body(source: &str) -> String {
    let out = compile(source);
    let rest = out
        .strip_prefix(HEADER)
        .unwrap_or_else(|| panic!("missing header in {:?}", out));
    let rest = rest
        .strip_suffix(EMPTY_RETURN)
        .unwrap_or_else(|| panic!("unexpected return in {:?}", out));
    rest.strip_suffix('\n').unwrap_or(rest).to_string()
}

/// Error message of a failing compile.
pub fn compile_error(source: &str) -> String {
    match compile_to_string(source, &CompileOptions::default()) {
        Ok(out) => panic!("expected an error, got {:?}", out),
        Err(err) => err.to_string(),
    }
}

pub fn parse_root(source: &str) -> Root {
    match parse(source, &CompileOptions::default()) {
        Ok(root) => root,
        Err(err) => panic!("parse failed: {}", err),
    }
}

/// The first top level tag of `source`.
pub fn first_tag(source: &str) -> Tag {
    parse_root(source)
        .block
        .children
        .into_iter()
        .find_map(|node| match node {
            Node::Tag(tag) => Some(tag),
            _ => None,
        })
        .expect("no tag in source")
}
