#[cfg(not(feature = "cli"))]
compile_error!("The `flf` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;

use fixedlen::cli;
use fixedlen::cli::app::{Cli, ColorMode, Commands};
use fixedlen::util::audit::AuditLogger;
use fixedlen::FlfError;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let writer_result: Result<Box<dyn Write>, FlfError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| FlfError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let audit_logger: Option<Arc<AuditLogger>> = match &cli.audit_log {
        Some(path) => {
            let logger = match AuditLogger::open(path) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            let args: Vec<String> = std::env::args().collect();
            let _ = logger.start_session(args);
            Some(Arc::new(logger))
        }
        None => None,
    };

    let result = match cli.command {
        Commands::Layout { schema, json } => cli::layout::execute(
            &cli::layout::LayoutOptions { schema, json },
            &mut writer,
        ),

        Commands::Info { file, schema, json } => cli::info::execute(
            &cli::info::InfoOptions { file, schema, json },
            &mut writer,
        ),

        Commands::Export {
            file,
            schema,
            record,
            limit,
            format,
        } => cli::export::execute(
            &cli::export::ExportOptions {
                file,
                schema,
                record,
                limit,
                format,
            },
            &mut writer,
        ),

        Commands::Dump {
            file,
            schema,
            record,
            raw,
        } => cli::dump::execute(
            &cli::dump::DumpOptions {
                file,
                schema,
                record,
                raw,
            },
            &mut writer,
        ),

        Commands::Import {
            file,
            schema,
            input,
            append,
        } => cli::import::execute(
            &cli::import::ImportOptions {
                file,
                schema,
                input,
                append,
                audit_logger: audit_logger.clone(),
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "flf", &mut writer);
            Ok(())
        }
    };

    if let Some(ref logger) = audit_logger {
        let _ = logger.end_session();
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
