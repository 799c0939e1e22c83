mod test_runner;
mod values;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context as _, Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use engine::{Block, Registry, Workspace};

#[derive(Parser)]
#[command(name = "blocks", version, about = "Block program interpreter and code generator")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interpret a program and print its root bindings
    Run(RunArgs),

    /// Print the generated source of a program
    Generate(GenerateArgs),

    /// Parse a program without running it
    Check(CheckArgs),

    /// Run .test.toml test cases
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON program file
    file: PathBuf,

    /// TOML file of initial root bindings
    #[arg(short, long)]
    globals: Option<PathBuf>,

    /// Print bindings as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// JSON program file
    file: PathBuf,

    /// Dump the generated statement tree instead of source text
    #[arg(long)]
    tree: bool,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// JSON program file
    file: PathBuf,

    /// List every block of the parsed workspace
    #[arg(long)]
    list_blocks: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.toml file or a directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let result = match cli.command {
        Command::Run(args) => do_run(args, color_choice),
        Command::Generate(args) => do_generate(args, color_choice),
        Command::Check(args) => do_check(args, color_choice),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                return;
            }
            process::exit(test_runner::run_tests(&args.path, cli.no_color, &args.category));
        }
    };

    if let Err(error) = result {
        eprintln!("error: {:#}", error);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn do_run(args: RunArgs, color_choice: ColorChoice) -> Result<()> {
    let globals = match &args.globals {
        Some(path) => read_globals(path)?,
        None => Vec::new(),
    };
    let workspace = load_workspace(&args.file, color_choice)?;
    let execution = workspace.run(globals)?;
    debug!(value = %execution.value, "program finished");

    if args.json {
        println!("{}", values::render_json(&execution.variables)?);
    } else {
        print!("{}", values::render_toml(&execution.variables));
    }
    Ok(())
}

fn do_generate(args: GenerateArgs, color_choice: ColorChoice) -> Result<()> {
    let workspace = load_workspace(&args.file, color_choice)?;
    let program = workspace.compile()?;
    if args.tree {
        println!("{:#?}", program);
    } else {
        print!("{}", engine::codegen::emit::emit_program(&program));
    }
    Ok(())
}

fn do_check(args: CheckArgs, color_choice: ColorChoice) -> Result<()> {
    let workspace = load_workspace(&args.file, color_choice)?;
    if args.list_blocks {
        for head in workspace.blocks() {
            print_chain(head, None, 0);
        }
    } else {
        eprintln!(
            "ok: {} parsed successfully ({} chains)",
            args.file.display(),
            workspace.len()
        );
    }
    Ok(())
}

fn print_chain(head: &Block, slot: Option<&str>, indent: usize) {
    let pad = "  ".repeat(indent);
    for (position, block) in head.chain().enumerate() {
        let label = match slot {
            Some(slot) if position == 0 => format!("{}: ", slot),
            _ => String::new(),
        };
        let id = if block.id.is_empty() {
            String::new()
        } else {
            format!(" ({})", block.id)
        };
        println!("{}{}{}{}", pad, label, block.block_type, id);
        for value in block.values.values() {
            if let Some(nested) = &value.block {
                print_chain(nested, Some(&value.name), indent + 1);
            }
        }
        for statement in block.statements.values() {
            if let Some(nested) = &statement.block {
                print_chain(nested, Some(&statement.name), indent + 1);
            }
        }
    }
}

/// Read a program file and build its workspace, reporting malformed JSON
/// as a positioned diagnostic.
fn load_workspace(path: &Path, color_choice: ColorChoice) -> Result<Workspace> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;

    let mut files = SimpleFiles::new();
    let file_id = files.add(path.display().to_string(), source.clone());

    let graph = match graph::GraphParser::new(source, file_id).parse() {
        Ok(graph) => graph,
        Err(error) => {
            if let Some(diagnostic) = error.to_diagnostic() {
                let writer = StandardStream::stderr(color_choice);
                let config = term::Config::default();
                let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
                return Err(anyhow!("could not parse '{}'", path.display()));
            }
            return Err(error.into());
        }
    };

    let registry = Registry::standard();
    let workspace = engine::Parser::new(&registry).parse(&graph)?;
    Ok(workspace)
}

fn read_globals(path: &Path) -> Result<Vec<(String, engine::RuntimeValue)>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let table: toml::Table =
        toml::from_str(&text).with_context(|| format!("invalid globals file '{}'", path.display()))?;
    values::bindings_from_table(&table)
}
