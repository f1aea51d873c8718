/*
rfunge – a Funge-98 interpreter
Copyright © 2021 Thomas Jollans

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as
published by the Free Software Foundation, either version 3 of the
License, or (at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! The standalone binary's CLI: argument parsing with `clap`, source
//! loading, `--bench`/`--benchn` timing, and the glue that turns a
//! parsed [`Config`] into an [`Interpreter`] run. Kept out of `lib.rs`
//! on purpose -- it's the outer shell around the engine, not part of
//! what the rest of the crate tests.

pub mod env;

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{App, Arg, ErrorKind};

use funge98::{new_interpreter_with_mode, Dimension, ProgramResult};

use self::env::CmdLineEnv;

/// Everything that can go wrong before the interpreter starts running.
/// Always reported as exit code 1.
#[derive(Debug)]
pub struct CliError(pub String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError(format!("{}", e))
    }
}

/// `-B`/`--cell-size`. Only 32- and 64-bit cells are genuine; `16` is
/// accepted but emulated on top of 32-bit cells -- see DESIGN.md's
/// Open Question note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSize {
    Sixteen,
    ThirtyTwo,
    SixtyFour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchMode {
    /// `--bench`: repeat for ~2 seconds and report the average.
    TwoSeconds,
    /// `--benchn N`: repeat exactly `N` times (`N == 1` does not retry
    /// a `q` exit, unlike the 2-second mode).
    Count(u32),
}

pub enum SourceInput {
    File(PathBuf),
    /// `-S`/`--source-line`, repeatable; each occurrence is one line,
    /// joined with `\n` before loading.
    Inline(Vec<String>),
}

pub struct Config {
    pub debug: bool,
    pub warnings: bool,
    pub dim: Dimension,
    /// `--befunge-93`: restricts the instruction set to Base93 and
    /// changes `/`/`%` by-zero to ask the user instead of pushing 0.
    pub befunge93: bool,
    pub cell_size: CellSize,
    pub concurrent: bool,
    pub source: SourceInput,
    pub show_source_lines: bool,
    pub include_dirs: Vec<PathBuf>,
    pub bench: Option<BenchMode>,
}

/// What trying to parse argv produced: a runnable [`Config`], or a
/// request to print something (`--help`/`--version`, or a usage error)
/// and stop, carrying the exit code assigned to each case.
pub enum Parsed {
    Run(Config),
    PrintAndExit { message: String, code: i32 },
}

/// Build the `clap` parser for the CLI's option table. clap's default
/// unambiguous-prefix matching on long options gives "prefix matching"
/// for free. `-93` is not a legal single-character clap short flag, so
/// [`parse_args`] rewrites it (and Trefunge's `-3`) out of the raw
/// argv before handing it to clap, rather than bending the parser to
/// fit an irregular flag shape.
fn build_app() -> App<'static, 'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .version_short("v")
        .about("Funge-98 / Trefunge-98 interpreter")
        .arg(Arg::with_name("debug").short("d").long("debug").help(
            "Run under the interactive debugger (not available in this build; falls back to \
             plain execution)",
        ))
        .arg(
            Arg::with_name("warnings")
                .short("w")
                .long("warnings")
                .help("Warn about unknown instructions and undefined cases"),
        )
        .arg(
            Arg::with_name("befunge93")
                .long("befunge-93")
                .help("Use Befunge-93 semantics (Base93 only)")
                .conflicts_with("trefunge"),
        )
        .arg(
            Arg::with_name("trefunge")
                .long("trefunge")
                .help("Use Trefunge-98 (3-D) semantics"),
        )
        .arg(
            Arg::with_name("no-concurrent")
                .short("N")
                .long("no-concurrent")
                .help("Disable `t` (split); it reflects instead"),
        )
        .arg(
            Arg::with_name("cell-size")
                .short("B")
                .long("cell-size")
                .takes_value(true)
                .possible_values(&["16", "32", "64"])
                .help("Cell width in bits"),
        )
        .arg(
            Arg::with_name("source-line")
                .short("S")
                .long("source-line")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Inline source line (repeatable; appended in order)"),
        )
        .arg(
            Arg::with_name("show-source-lines")
                .long("show-source-lines")
                .help("Echo the source before running it"),
        )
        .arg(
            Arg::with_name("include-directory")
                .short("I")
                .long("include-directory")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Search path for `i`/`o`"),
        )
        .arg(
            Arg::with_name("bench")
                .short("b")
                .long("bench")
                .conflicts_with("benchn")
                .help("Repeat the program until 2 seconds elapse; print the average time"),
        )
        .arg(
            Arg::with_name("benchn")
                .long("benchn")
                .takes_value(true)
                .help("Repeat the program N times; print the average time"),
        )
        .arg(
            Arg::with_name("PROGRAM")
                .help("Path to the Funge-98 source file")
                .required(false),
        )
}

/// Long option names [`build_app`] actually registers, plus `--help`/
/// `--version` which clap adds implicitly.
const KNOWN_LONG_FLAGS: &[&str] = &[
    "--help",
    "--version",
    "--debug",
    "--warnings",
    "--befunge-93",
    "--trefunge",
    "--no-concurrent",
    "--cell-size",
    "--source-line",
    "--show-source-lines",
    "--include-directory",
    "--bench",
    "--benchn",
];

/// Unknown long options that look like flags produce warnings to
/// stderr but do not abort. clap's own unknown-argument handling is
/// fatal, so unrecognized `--foo`/`--foo=bar` tokens are warned about
/// and dropped here, before clap ever sees them, rather than bending
/// clap's error recovery to be lenient.
fn warn_unknown_long_flags<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    let mut out = Vec::new();
    let mut past_options = false;
    for a in args {
        if past_options {
            out.push(a);
            continue;
        }
        if a == "--" {
            past_options = true;
            out.push(a);
            continue;
        }
        if a.starts_with("--") {
            let name = a.split('=').next().unwrap_or(&a);
            if !KNOWN_LONG_FLAGS.contains(&name) {
                eprintln!("warning: unknown option {:?}", a);
                continue;
            }
        }
        out.push(a);
    }
    out
}

/// Translate the irregular `-93`/`-3` short flags into their long forms
/// before clap ever sees them (see [`build_app`]'s doc comment).
fn normalize_argv<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    let args: Vec<String> = args
        .into_iter()
        .map(|a| match a.as_str() {
            "-93" => "--befunge-93".to_owned(),
            "-3" => "--trefunge".to_owned(),
            other => other.to_owned(),
        })
        .collect();
    warn_unknown_long_flags(args)
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Parsed {
    let app = build_app();
    let matches = match app.get_matches_from_safe(normalize_argv(args)) {
        Ok(m) => m,
        Err(e) => {
            let code = match e.kind {
                ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => 0,
                _ => 1,
            };
            return Parsed::PrintAndExit {
                message: e.message,
                code,
            };
        }
    };

    match build_config(&matches) {
        Ok(cfg) => Parsed::Run(cfg),
        Err(e) => Parsed::PrintAndExit {
            message: e.0,
            code: 1,
        },
    }
}

fn build_config(matches: &clap::ArgMatches) -> Result<Config, CliError> {
    let befunge93 = matches.is_present("befunge93");
    let trefunge = matches.is_present("trefunge");
    let dim = if trefunge { Dimension::Tre } else { Dimension::Be };

    let cell_size = match matches.value_of("cell-size") {
        Some("16") => CellSize::Sixteen,
        Some("64") => CellSize::SixtyFour,
        _ => CellSize::ThirtyTwo,
    };

    let source_lines: Vec<String> = matches
        .values_of("source-line")
        .map(|v| v.map(str::to_owned).collect())
        .unwrap_or_default();
    let program = matches.value_of("PROGRAM");

    let source = match (program, source_lines.is_empty()) {
        (Some(_), false) => {
            return Err(CliError(
                "specify a source file or --source-line, not both".to_owned(),
            ));
        }
        (Some(path), true) => SourceInput::File(PathBuf::from(path)),
        (None, false) => SourceInput::Inline(source_lines),
        (None, true) => {
            return Err(CliError(
                "no source file given (and no --source-line)".to_owned(),
            ));
        }
    };

    let include_dirs = matches
        .values_of("include-directory")
        .map(|v| v.map(PathBuf::from).collect())
        .unwrap_or_default();

    let bench = if matches.is_present("bench") {
        Some(BenchMode::TwoSeconds)
    } else if let Some(n) = matches.value_of("benchn") {
        let n: u32 = n
            .parse()
            .map_err(|_| CliError(format!("--benchn: not a valid count: {:?}", n)))?;
        Some(BenchMode::Count(n))
    } else {
        None
    };

    Ok(Config {
        debug: matches.is_present("debug"),
        warnings: matches.is_present("warnings"),
        dim,
        befunge93,
        cell_size,
        concurrent: !matches.is_present("no-concurrent"),
        source,
        show_source_lines: matches.is_present("show-source-lines"),
        include_dirs,
        bench,
    })
}

fn load_source(source: &SourceInput) -> Result<Vec<u8>, CliError> {
    match source {
        SourceInput::File(path) => Ok(fs::read(path)?),
        SourceInput::Inline(lines) => Ok(lines.join("\n").into_bytes()),
    }
}

fn argv0(source: &SourceInput) -> String {
    match source {
        SourceInput::File(path) => path.display().to_string(),
        SourceInput::Inline(_) => "-S".to_owned(),
    }
}

/// Run one pass of the interpreter and return its exit code: `Done`
/// exits 0, `Quit` unwinds with `q`'s operand.
fn run_once(cfg: &Config, src: &[u8]) -> i32 {
    let env = CmdLineEnv::new(
        cfg.warnings,
        false,
        vec![argv0(&cfg.source)],
        cfg.include_dirs.clone(),
    );
    macro_rules! run_with {
        ($cell:ty) => {{
            let mut interp = new_interpreter_with_mode::<$cell, _>(cfg.dim, env, cfg.befunge93);
            interp.warnings = cfg.warnings;
            interp.concurrent = cfg.concurrent;
            // Program load always uses text-mode byte rules (CR/LF
            // normalization, FF as z-page advance, space as don't-overwrite);
            // the CLI has no `--binary` flag, so binary-mode loading is
            // only ever reachable through the `i` instruction's flag bit.
            interp.load_program(src, false);
            match interp.run() {
                ProgramResult::Done(code) => code,
                ProgramResult::Quit(code) => code,
            }
        }};
    }
    match cfg.cell_size {
        CellSize::SixtyFour => run_with!(i64),
        // 16-bit cells have no lossless `From<i32>` to hang a
        // `FungeValue` impl on (orphan rules); emulate on i32.
        CellSize::ThirtyTwo | CellSize::Sixteen => run_with!(i32),
    }
}

/// Run the configured program, handling `--bench`/`--benchn`.
/// Returns the process exit code.
pub fn run(cfg: Config) -> Result<i32, CliError> {
    if cfg.debug {
        eprintln!(
            "warning: --debug requested, but the interactive debugger is not part of this build; running normally"
        );
    }
    if cfg.cell_size == CellSize::Sixteen {
        eprintln!("warning: 16-bit cells are emulated on top of 32-bit cells");
    }

    let src = load_source(&cfg.source)?;
    if cfg.show_source_lines {
        io::stdout().write_all(&src).ok();
    }

    match cfg.bench {
        None => Ok(run_once(&cfg, &src)),
        Some(BenchMode::Count(n)) => {
            let iters = n.max(1);
            let start = Instant::now();
            let mut last = 0;
            for _ in 0..iters {
                last = run_once(&cfg, &src);
                if n == 1 {
                    // a single iteration does not get the `q`-exit retry
                    // that `--bench`'s multi-iteration loop gets.
                    return Ok(last);
                }
            }
            report_bench(start.elapsed(), iters);
            Ok(last)
        }
        Some(BenchMode::TwoSeconds) => {
            let start = Instant::now();
            let mut count: u32 = 0;
            let mut last = 0;
            while start.elapsed().as_secs_f64() < 2.0 {
                last = run_once(&cfg, &src);
                count += 1;
            }
            report_bench(start.elapsed(), count.max(1));
            Ok(last)
        }
    }
}

fn report_bench(elapsed: Duration, iters: u32) {
    let avg = elapsed.as_secs_f64() / iters as f64;
    eprintln!(
        "{} iterations in {:.3}s -- avg {:.6}s/iteration",
        iters,
        elapsed.as_secs_f64(),
        avg
    );
}
