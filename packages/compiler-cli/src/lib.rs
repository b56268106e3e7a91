#![deny(clippy::all)]

/**
 * giom Compiler CLI
 *
 * Project configuration and file/directory compilation behind `giomc`.
 */
pub use giom_compiler as compiler;

pub mod compile;
pub mod config;

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
