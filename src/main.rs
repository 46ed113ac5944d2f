#[cfg(not(feature = "cli"))]
compile_error!("The `mdbx` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use mdb::cli;
use mdb::cli::app::{Cli, ColorMode, Commands};
use mdb::MdbError;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, MdbError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| MdbError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Tables {
            file,
            user_only,
            json,
        } => cli::tables::execute(
            &cli::tables::TablesOptions {
                file,
                user_only,
                json,
            },
            &mut writer,
        ),

        Commands::Export {
            file,
            table,
            delimiter,
            row_delimiter,
            no_header,
            null_text,
            quote,
            include_deleted,
            boolean_words,
        } => cli::export::execute(
            &cli::export::ExportCmdOptions {
                file,
                table,
                delimiter,
                row_delimiter,
                no_header,
                null_text,
                quote,
                include_deleted,
                boolean_words,
            },
            &mut writer,
        ),

        Commands::Info { file, json } => {
            cli::info::execute(&cli::info::InfoOptions { file, json }, &mut writer)
        }

        Commands::Dump {
            file,
            page,
            length,
            raw,
        } => cli::dump::execute(
            &cli::dump::DumpOptions {
                file,
                page,
                length,
                raw,
            },
            &mut writer,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
