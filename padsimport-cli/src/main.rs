//! PadsImport CLI - PADS-Logic schematic import from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use padsimport::parser::read_file_header;
use padsimport::{DiagnosticKind, ImportOptions, ImportResult, PadsImportCore};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "padsimport")]
#[command(about = "PADS-Logic ASCII schematic import tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Log progress to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a file is a PADS-Logic export
    Check {
        /// Path to a .txt or .asc file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Import a PADS file, or every PADS file under a directory
    Import {
        /// Path to a PADS file or a directory
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Fail when any diagnostic is collected
        #[arg(long)]
        strict: bool,

        /// Always emit child sheets, even for a single-sheet design
        #[arg(long)]
        no_flatten: bool,

        /// Child sheet symbol width in mils
        #[arg(long, default_value_t = 2000.0)]
        sheet_width: f64,

        /// Child sheet symbol height in mils
        #[arg(long, default_value_t = 1500.0)]
        sheet_height: f64,

        /// Exit with error code if diagnostics of this kind (or any) were found
        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,
    },

    /// List the library symbols an import would produce
    Symbols {
        /// Path to a PADS file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Show every pin of every symbol
        #[arg(short, long)]
        pins: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

#[derive(Clone, ValueEnum)]
enum FailOn {
    Any,
    Format,
    Desync,
    Mapping,
    Duplicate,
    Reference,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Check { file } => handle_check(&file),
        Commands::Import {
            path,
            format,
            strict,
            no_flatten,
            sheet_width,
            sheet_height,
            fail_on,
        } => {
            let options = ImportOptions {
                strict_mode: strict,
                flatten_single_sheet: !no_flatten,
                sheet_size: (sheet_width, sheet_height),
            };
            handle_import(&path, options, format, fail_on)
        }
        Commands::Symbols { file, pins } => handle_symbols(&file, pins),
    };

    process::exit(exit_code);
}

fn handle_check(file: &Path) -> i32 {
    match read_file_header(file) {
        Ok(header) => {
            println!(
                "{}: {} {} ({:?} dialect)",
                file.display(),
                header.product.as_str(),
                header.version,
                header.dialect()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            1
        }
    }
}

fn handle_import(
    path: &Path,
    options: ImportOptions,
    format: OutputFormat,
    fail_on: Option<FailOn>,
) -> i32 {
    let result = if path.is_dir() {
        PadsImportCore::import_directory(path, options)
    } else {
        PadsImportCore::import_file(path, options).map(|r| vec![r])
    };

    match result {
        Ok(results) => {
            output_results(&results, &format);
            if let Some(kind) = fail_on {
                if results.iter().any(|r| should_fail(r, &kind)) {
                    return 1;
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn should_fail(result: &ImportResult, fail_on: &FailOn) -> bool {
    let kind = match fail_on {
        FailOn::Any => return !result.is_clean(),
        FailOn::Format => DiagnosticKind::Format,
        FailOn::Desync => DiagnosticKind::Desync,
        FailOn::Mapping => DiagnosticKind::Mapping,
        FailOn::Duplicate => DiagnosticKind::Duplicate,
        FailOn::Reference => DiagnosticKind::Reference,
    };
    result.has(kind)
}

fn output_results(results: &[ImportResult], format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(results),
        OutputFormat::Json => output_json(results),
    }
}

fn output_human(results: &[ImportResult]) {
    if results.is_empty() {
        println!("No PADS files found");
        return;
    }
    for result in results {
        println!("\nFile: {}", result.file.display());
        println!("{}", "─".repeat(60));
        println!(
            "  Format:  {} {}",
            result.header.product.as_str(),
            result.header.version
        );
        println!("  Output:  {}", result.schematic.filename);
        for sheet in &result.schematic.root.sheets {
            println!("           {}", sheet.filename);
        }

        let s = &result.stats;
        println!("\n  Summary:");
        println!("    Library symbols: {}", s.lib_symbols);
        println!("    Placements:      {}", s.placements);
        println!("    Symbols:         {}", s.symbols);
        println!("    Nets:            {}", s.nets);
        println!("    Sheets:          {}", s.sheets);
        println!("    Wires:           {}", s.wires);
        println!("    Labels:          {}", s.labels);

        if result.is_clean() {
            println!("\n  No diagnostics");
            continue;
        }
        println!("\n  Diagnostics ({}):", result.diagnostics.len());
        for diagnostic in result.diagnostics.iter() {
            println!("    - {}", diagnostic);
        }
    }
}

fn output_json(results: &[ImportResult]) {
    let output = serde_json::json!({
        "results": results.iter().map(|r| {
            serde_json::json!({
                "file": r.file.display().to_string(),
                "header": r.header,
                "output": r.schematic.filename,
                "sheets": r.schematic.root.sheets.iter().map(|s| s.filename.clone()).collect::<Vec<_>>(),
                "stats": r.stats,
                "diagnostics": r.diagnostics.as_slice(),
            })
        }).collect::<Vec<_>>(),
        "summary": {
            "total_files": results.len(),
            "total_diagnostics": results.iter().map(|r| r.diagnostics.len()).sum::<usize>(),
        }
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_symbols(file: &Path, pins: bool) -> i32 {
    let result = match PadsImportCore::import_file(file, ImportOptions::default()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("Library symbols in {}:\n", file.display());
    for symbol in &result.schematic.library {
        let power = match &symbol.power_net {
            Some(net) => format!(" (power: {})", net),
            None => String::new(),
        };
        println!("  {} [{} pin(s)]{}", symbol.name, symbol.pins.len(), power);
        if pins {
            for pin in &symbol.pins {
                println!("    {} {} {}", pin.number, pin.name, pin.pin_type);
            }
        }
    }
    0
}
