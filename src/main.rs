use clap::{Arg, ArgAction, Command};
use std::path::Path;
use tracing::debug;

use bcf::format::DefinitionRegistry;
use bcf::formatting::serialize_file;
use bcf::problem;
use bcf::structure::BcfFile;

fn main() {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    tracing_subscriber::fmt::init();

    let matches = Command::new("bcf")
        .version(VERSION)
        .propagate_version(true)
        .about("The BCF blocks configuration format.")
        .disable_help_subcommand(true)
        .subcommand(
            Command::new("check")
                .about("Parse and validate the given file")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Emit the error list as JSON instead of plain text."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The file you want to validate."),
                ),
        )
        .subcommand(
            Command::new("format")
                .about("Rewrite the given file in its canonical form on standard output")
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The file you want to reformat."),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("check", submatches)) => {
            let filename = submatches
                .get_one::<String>("filename")
                .expect("filename is a required argument");
            let json = submatches.get_flag("json");
            let file = open(filename);
            let errors = file
                .error_list()
                .len();
            if json {
                println!("{}", problem::report_json(&file));
            } else if errors > 0 {
                println!("{}", problem::report(&file));
            }
            debug!("{} errors in {}", errors, filename);
            if errors > 0 {
                std::process::exit(1);
            }
        }
        Some(("format", submatches)) => {
            let filename = submatches
                .get_one::<String>("filename")
                .expect("filename is a required argument");
            let file = open(filename);
            for line in serialize_file(&file) {
                println!("{}", line);
            }
        }
        Some(_) => {
            println!("No valid subcommand was used")
        }
        None => {
            println!("usage: bcf [COMMAND] ...");
            println!("Try '--help' for more information.");
        }
    }
}

/// Pick the definition for the file out of the registry, then load it.
fn open(filename: &str) -> BcfFile {
    let registry = DefinitionRegistry::with_builtin();
    let path = Path::new(filename);
    let definition = match registry.find_for_file(path) {
        Some(definition) => definition.clone(),
        None => {
            eprintln!(
                "error: no format definition matches '{}'; supported file types: {}",
                filename,
                registry
                    .supported_file_types()
                    .join(", ")
            );
            std::process::exit(1);
        }
    };

    let mut file = match BcfFile::new(path, definition) {
        Ok(file) => file,
        Err(error) => {
            eprintln!("error: {}", error);
            std::process::exit(1);
        }
    };
    if let Err(error) = file.load() {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
    file
}
