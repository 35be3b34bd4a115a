use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simlc::frontend::error::CompileError;
use simlc::frontend::{lexer, parse_source};
use simlc::FlatObject;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "simlc", version = simlc::VERSION, about = "Siml model compiler")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and check a module without producing output
    Check { file: PathBuf },
    /// Compile a module and print its flattened objects
    Compile { file: PathBuf },
    /// Print the token stream of a source file
    Tokens { file: PathBuf },
    /// Print the parsed syntax tree of a source file
    Ast { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Command::Check { file } => {
            let objects = simlc::compile_file(&file)?;
            println!("ok: {} object(s) checked", objects.len());
        }
        Command::Compile { file } => {
            let objects = simlc::compile_file(&file)?;
            for object in &objects {
                print_object(object);
            }
        }
        Command::Tokens { file } => {
            let source = read_source(&file)?;
            let tokens = lexer::tokenize(&source)?;
            for token in &tokens {
                println!(
                    "{:>4}:{:<4} {:?}",
                    token.span.start.line, token.span.start.column, token.kind
                );
            }
        }
        Command::Ast { file } => {
            let source = read_source(&file)?;
            let module_name = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("module");
            let module =
                parse_source(&source, module_name).map_err(CompileError::from)?;
            println!("{:#?}", module);
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read '{}'", path.display()))
}

fn print_object(object: &FlatObject) {
    println!("object {}", object.name);
    for attr in object.attrs.values() {
        println!(
            "    data {}: {} {}    # from {}",
            attr.name, attr.type_name, attr.role, attr.origin_class
        );
    }
    for func in &object.funcs {
        println!("    func {}() [{} statements]:", func.name, func.body.len());
        for usage in &func.usage {
            println!("        reads {:?}, writes {:?}", usage.reads, usage.writes);
        }
    }
}
