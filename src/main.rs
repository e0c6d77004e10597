use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use log::{error, LevelFilter};

/// structdump - dump a struct-typed global's memory layout as JSON
fn main() {
    // Initialize logging
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("structdump", LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let args: Vec<String> = env::args().collect();

    let mut file: Option<PathBuf> = None;
    let mut variable: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-v" | "--version" => {
                println!("structdump v{}", structdump::VERSION);
                process::exit(0);
            }
            "-h" | "--help" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            "--file" => {
                i += 1;
                match args.get(i) {
                    Some(path) => file = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--file requires a path");
                        process::exit(1);
                    }
                }
            }
            "--variable" => {
                i += 1;
                match args.get(i) {
                    Some(name) => variable = Some(name.clone()),
                    None => {
                        eprintln!("--variable requires a name");
                        process::exit(1);
                    }
                }
            }
            arg => {
                eprintln!("unknown argument: {}", arg);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (Some(file), Some(variable)) = (file, variable) else {
        print_usage(&args[0]);
        process::exit(1);
    };

    if let Err(e) = run(&file, &variable) {
        error!("{:#}", e);
        process::exit(1);
    }
}

/// Run one extraction and print its result: the resolved top-level type name
/// followed by the JSON document
fn run(file: &Path, variable: &str) -> Result<()> {
    let data =
        fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let extraction = structdump::dump(&data, variable)?;
    println!("{}", extraction.type_name);
    println!("{}", extraction.types.to_json()?);
    Ok(())
}

/// Print usage information
fn print_usage(program_name: &str) {
    println!("structdump - dump a struct-typed global's memory layout as JSON");
    println!(
        "Usage: {} --file <binary> --variable <name>",
        program_name
    );
    println!();
    println!("Options:");
    println!("  --file <binary>    Object or executable file with DWARF debug info");
    println!("  --variable <name>  The struct-typed global variable to dump");
    println!("  -h, --help         Display this help message");
    println!("  -v, --version      Display version information");
}
