/**
 * giom Compiler CLI - giomc
 *
 * Compiles giom templates to gad mixed-mode source.
 */
use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use giom_compiler_cli::compile::{compile_project, OUTPUT_EXTENSION};
use giom_compiler_cli::compiler::{compile_to_string, parse, CompileOptions};
use giom_compiler_cli::config::GiomConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, process};
use tracing_subscriber::EnvFilter;

const STDIN_FILENAME: &str = "(stdin)";
const LOG_ENV: &str = "GIOM_LOG";

fn command() -> Command {
    Command::new("giomc")
        .version(giom_compiler_cli::version())
        .about("giom template compiler")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Template to compile, or - for stdin")
                .required_unless_present("project"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("FILE")
                .help("Write the output to FILE instead of stdout"),
        )
        .arg(
            Arg::new("out-self")
                .long("out-self")
                .action(ArgAction::SetTrue)
                .conflicts_with("out")
                .help("Write the output next to the input, as FILE.gad"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .action(ArgAction::SetTrue)
                .help("Pretty print the generated markup"),
        )
        .arg(
            Arg::new("pre-code")
                .long("pre-code")
                .value_name("CODE")
                .help("Host code written before the template body"),
        )
        .arg(
            Arg::new("global")
                .long("global")
                .value_name("NAME")
                .action(ArgAction::Append)
                .help("Declare a global name (repeatable)"),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .action(ArgAction::SetTrue)
                .help("Print the parsed template as JSON instead of compiling"),
        )
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("DIR")
                .conflicts_with("file")
                .help("Compile every template of a project directory (see giom.json)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log compile progress"),
        )
}

/// `GIOM_LOG` filter, `warn` when unset. `--verbose` forces `debug`.
fn log_filter(env: Option<&str>, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn init_logging(verbose: bool) {
    let env = std::env::var(LOG_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(env.as_deref(), verbose))
        .init();
}

/// Command line flags layered over `base`.
fn compile_options(matches: &ArgMatches, base: CompileOptions) -> CompileOptions {
    let mut options = base;
    if matches.get_flag("pretty") {
        options.pretty_print = true;
    }
    if let Some(pre_code) = matches.get_one::<String>("pre-code") {
        options.pre_code = Some(pre_code.clone());
    }
    if let Some(globals) = matches.get_many::<String>("global") {
        options.global_names = globals.cloned().collect();
    }
    options
}

fn read_input(file: &str) -> anyhow::Result<(String, String)> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("reading stdin")?;
        return Ok((source, STDIN_FILENAME.to_string()));
    }
    let source = fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
    Ok((source, file.to_string()))
}

fn run_file(matches: &ArgMatches, file: &str) -> anyhow::Result<()> {
    let (source, filename) = read_input(file)?;
    let options = compile_options(matches, CompileOptions::default()).with_filename(filename);

    let output = if matches.get_flag("ast") {
        serde_json::to_string_pretty(&parse(&source, &options)?)?
    } else {
        compile_to_string(&source, &options)?
    };

    let target = if let Some(out) = matches.get_one::<String>("out") {
        Some(PathBuf::from(out))
    } else if matches.get_flag("out-self") {
        if file == "-" {
            anyhow::bail!("--out-self needs an input file");
        }
        Some(PathBuf::from(format!("{}.{}", file, OUTPUT_EXTENSION)))
    } else {
        None
    };

    match target {
        Some(path) => fs::write(&path, output).with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{}", output);
            Ok(())
        }
    }
}

fn run_project(matches: &ArgMatches, dir: &str) -> anyhow::Result<()> {
    let dir = Path::new(dir);
    let mut config = GiomConfig::load_project(dir)?;
    config.compiler_options = compile_options(matches, config.compiler_options);

    let report = compile_project(dir, &config);
    if !report.is_success() {
        for error in &report.errors {
            eprintln!("Error: {}", error);
        }
        process::exit(1);
    }
    Ok(())
}

fn main() {
    let matches = command().get_matches();
    init_logging(matches.get_flag("verbose"));

    let result = match (
        matches.get_one::<String>("project"),
        matches.get_one::<String>("file"),
    ) {
        (Some(dir), _) => run_project(&matches, dir),
        (None, Some(file)) => run_file(&matches, file),
        (None, None) => Ok(()),
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}
