//! NACHA ACH CLI
//!
//! Loads an ACH file, recomputes every control total, and writes the
//! normalized file (or a CSV report about it).
//!
//! # Usage
//!
//! ```bash
//! cargo run -- payroll.ach --out fixed.ach
//! cargo run -- payroll.ach --crlf --no-renumber > fixed.ach
//! cargo run -- payroll.ach --report entries > entries.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use nacha_ach::report::{write_entry_report, write_summary};
use nacha_ach::{NachaError, NachaFile, Result, WriteOptions};
use std::env;
use std::io;
use std::process;

/// What to produce on output.
enum Mode {
    Rewrite,
    EntryReport,
    Summary,
}

struct Args {
    input: String,
    output: Option<String>,
    options: WriteOptions,
    mode: Mode,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut input = None;
    let mut output = None;
    let mut options = WriteOptions::default();
    let mut mode = Mode::Rewrite;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--crlf" => options.crlf = true,
            "--no-renumber" => options.renumber = false,
            "--out" => {
                let path = args
                    .next()
                    .ok_or_else(|| NachaError::InvalidOption("--out requires a path".into()))?;
                output = Some(path);
            }
            "--report" => {
                mode = match args.next().as_deref() {
                    Some("entries") => Mode::EntryReport,
                    Some("summary") => Mode::Summary,
                    _ => {
                        return Err(NachaError::InvalidOption(
                            "--report requires 'entries' or 'summary'".into(),
                        ))
                    }
                };
            }
            flag if flag.starts_with("--") => {
                return Err(NachaError::InvalidOption(flag.to_string()));
            }
            _ if input.is_none() => input = Some(arg),
            _ => return Err(NachaError::InvalidOption(arg)),
        }
    }

    Ok(Args {
        input: input.ok_or(NachaError::MissingArgument)?,
        output,
        options,
        mode,
    })
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let mut file = NachaFile::open(&args.input)?.with_options(args.options);

    let stdout = io::stdout();
    let handle = stdout.lock();

    match (args.mode, args.output) {
        (Mode::Rewrite, Some(path)) => file.write_file(path)?,
        (Mode::Rewrite, None) => file.write(handle)?,
        (Mode::EntryReport, _) => write_entry_report(&file, handle)?,
        (Mode::Summary, _) => write_summary(&file, handle)?,
    }

    Ok(())
}
