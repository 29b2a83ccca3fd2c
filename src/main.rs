//! Purpose: `sqljson` CLI entry point: stream a tabular JSON document as JSON rows.
//! Role: Binary crate root; parses args, builds writer options, streams to stdout.
//! Invariants: Rows go to stdout only; diagnostics and errors go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use sqljson::api::{
    Error, ErrorKind, FieldOutcome, RowCursor, RowsWriter, ScanKind, ScanOverride, WriterOptions,
    to_exit_code,
};
use tracing_subscriber::EnvFilter;

mod input;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputMode {
    /// One JSON array: `[`, rows, `]`.
    Array,
    /// One object per line, no separators.
    Rows,
    /// Objects separated by leading commas, no brackets.
    CommaRows,
}

#[derive(Parser)]
#[command(
    name = "sqljson",
    version,
    about = "Stream tabular query results as JSON",
    after_help = r#"INPUT
  {"columns":[{"name":"widget_id","type":"VARCHAR"}],"rows":[["abc123"]]}

EXAMPLES
  $ sqljson widgets.json
  $ sqljson --mode comma-rows --omit secret < widgets.json
  $ RUST_LOG=debug sqljson --config writer.json widgets.json"#
)]
struct Cli {
    #[arg(help = "Table document to read (default: stdin)", value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
    #[arg(long, help = "Writer config file (JSON)", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "array", help = "Output framing")]
    mode: OutputMode,
    #[arg(
        long = "raw-suffix",
        value_name = "SUFFIX",
        help = "Emit columns ending in SUFFIX as pre-formed JSON (repeatable; replaces config)"
    )]
    raw_suffixes: Vec<String>,
    #[arg(long, help = "Emit [] instead of null for empty raw-JSON values")]
    empty_raw_as_array: bool,
    #[arg(long = "as-text", value_name = "COLUMN", help = "Scan COLUMN as text (repeatable)")]
    as_text: Vec<String>,
    #[arg(long, value_name = "COLUMN", help = "Leave COLUMN out of every row (repeatable)")]
    omit: Vec<String>,
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Write)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(());
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `sqljson --help`."));
            }
        },
    };

    let options = writer_options(&cli)?;
    let mut cursor = input::load_table(cli.input.as_deref())?;

    let stdout = io::stdout();
    let mut writer = RowsWriter::with_options(BufWriter::new(stdout.lock()), options);
    if !cli.omit.is_empty() {
        let omit = cli.omit.clone();
        writer.set_hook(move |_, name, _, _| {
            if omit.iter().any(|column| column == name) {
                Ok(FieldOutcome::Skip)
            } else {
                Ok(FieldOutcome::Default)
            }
        });
    }

    let rows = match cli.mode {
        OutputMode::Array => writer.write_response(&mut cursor)?,
        OutputMode::CommaRows => writer.write_comma_rows(&mut cursor)?,
        OutputMode::Rows => {
            let mut rows = 0u64;
            while cursor.advance() {
                writer.write_row(&mut cursor)?;
                rows += 1;
            }
            if let Some(err) = cursor.take_error() {
                return Err(Error::new(ErrorKind::Iteration)
                    .with_message("cursor iteration failed")
                    .with_boxed_source(err));
            }
            rows
        }
    };

    writer.sink_mut().flush().map_err(|err| {
        Error::new(ErrorKind::Write)
            .with_message("failed to flush stdout")
            .with_source(err)
    })?;
    tracing::debug!(rows, mode = ?cli.mode, "stream complete");
    Ok(())
}

fn writer_options(cli: &Cli) -> Result<WriterOptions, Error> {
    let mut options = match &cli.config {
        Some(path) => WriterOptions::from_path(path)?,
        None => WriterOptions::default(),
    };
    if !cli.raw_suffixes.is_empty() {
        options.raw_json_suffixes = cli.raw_suffixes.clone();
    }
    if cli.empty_raw_as_array {
        options.empty_raw_as_array = true;
    }
    // Flag rules go first so they win over config rules for the same column.
    let mut rules: Vec<ScanOverride> = cli
        .as_text
        .iter()
        .map(|column| ScanOverride::exact(column.as_str(), ScanKind::Text))
        .collect();
    rules.append(&mut options.scan_overrides);
    options.scan_overrides = rules;
    Ok(options)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(column) = err.column() {
        inner.insert("column".to_string(), json!(column));
    }
    if let Some(index) = err.column_index() {
        inner.insert("column_index".to_string(), json!(index));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(column) = err.column() {
        lines.push(format!("column: {column}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
