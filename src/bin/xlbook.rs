//! xlbook - compile a JSON book into a resolved sheet model
//!
//! Usage:
//!   xlbook <input.json>              # Output JSON to stdout
//!   xlbook <input.json> -o out.json  # Output JSON to file
//!   xlbook <input.json> --check      # Report issues only

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};

use xlbook::{compile_str, CompileOptions, Generator, Issue, JsonGenerator, XlbookError};

#[derive(Parser)]
#[command(name = "xlbook")]
#[command(version, about = "Compile a declarative spreadsheet book", long_about = None)]
#[command(after_help = "EXAMPLES:
    xlbook book.json                Print the resolved book
    xlbook book.json -o out.json    Write the resolved book to a file
    xlbook book.json --check        Only report issues")]
struct Cli {
    /// Input book (JSON)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<String>,

    /// Report issues without writing output
    #[arg(long)]
    check: bool,

    /// Write single-line JSON
    #[arg(long)]
    compact: bool,

    /// Print compile metrics to stderr
    #[arg(long)]
    metrics: bool,

    /// Do not resolve unknown colors against the standard palette
    #[arg(long)]
    no_standard_palette: bool,

    /// Do not resolve unknown formats against the standard formats
    #[arg(long)]
    no_standard_formats: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn report(issues: &[Issue]) {
    for issue in issues {
        eprintln!("{issue}");
    }
}

fn run(cli: &Cli) -> Result<(), XlbookError> {
    let source = fs::read_to_string(&cli.input)?;
    let options = CompileOptions {
        standard_palette: !cli.no_standard_palette,
        standard_formats: !cli.no_standard_formats,
        metrics: cli.metrics,
    };

    let compilation = match compile_str(&source, &options) {
        Ok(compilation) => compilation,
        Err(issues) => {
            report(&issues);
            return Err(XlbookError::Compilation(issues.len()));
        }
    };

    if let Some(metrics) = &compilation.metrics {
        eprintln!("{}", serde_json::to_string(metrics)?);
    }

    let book = match compilation.into_result() {
        Ok(book) => book,
        Err(failure) => {
            report(&failure.issues);
            return Err(XlbookError::Compilation(failure.issues.len()));
        }
    };

    if cli.check {
        eprintln!("{}: ok", cli.input);
        return Ok(());
    }

    let written = match &cli.output {
        Some(path) => {
            let mut generator = JsonGenerator::new(BufWriter::new(File::create(path)?));
            if cli.compact {
                generator = generator.compact();
            }
            let written = generator.generate(&book);
            if written.is_ok() {
                eprintln!("Written: {path}");
            }
            written
        }
        None => {
            let mut generator = JsonGenerator::new(io::stdout().lock());
            if cli.compact {
                generator = generator.compact();
            }
            generator.generate(&book)
        }
    };

    match written {
        Ok(()) => Ok(()),
        Err(issues) => {
            report(&issues);
            Err(XlbookError::Generate(format!("{} issue(s)", issues.len())))
        }
    }
}
