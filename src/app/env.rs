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

use std::fs::File;
use std::io::{self, stderr, stdin, stdout, Error, ErrorKind, Read, Stdin, Stdout, Write};
use std::path::PathBuf;
use std::process::Command;

use funge98::{all_fingerprints, safe_fingerprints, ExecMode, InterpreterEnv};

/// A synchronous [`InterpreterEnv`] for the standalone binary, built on
/// blocking `std::io` rather than an async runtime:
/// `InterpreterEnv::read_char`/`read_int` are synchronous by design (no
/// `Interpreter::run` is ever polled from inside an async runtime), so
/// an async IO stack has no use here.
pub struct CmdLineEnv {
    warnings: bool,
    sandbox: bool,
    argv: Vec<String>,
    allowed_fingerprints: Vec<i32>,
    include_dirs: Vec<PathBuf>,
    stdin: Stdin,
    stdout: Stdout,
    /// A byte read by [`CmdLineEnv::read_int`] that turned out not to
    /// belong to the token it was scanning, held back for the next read.
    pushback: Option<u8>,
}

impl CmdLineEnv {
    pub fn new(
        warnings: bool,
        sandbox: bool,
        argv: Vec<String>,
        include_dirs: Vec<PathBuf>,
    ) -> Self {
        Self {
            warnings,
            sandbox,
            argv,
            allowed_fingerprints: if sandbox {
                safe_fingerprints()
            } else {
                all_fingerprints()
            },
            include_dirs,
            stdin: stdin(),
            stdout: stdout(),
            pushback: None,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        if let Some(b) = self.pushback.take() {
            return Some(b);
        }
        let mut buf = [0u8; 1];
        match self.stdin.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        let direct = PathBuf::from(filename);
        if direct.is_absolute() || direct.exists() || self.include_dirs.is_empty() {
            return direct;
        }
        for dir in &self.include_dirs {
            let candidate = dir.join(filename);
            if candidate.exists() {
                return candidate;
            }
        }
        direct
    }
}

impl InterpreterEnv for CmdLineEnv {
    fn write_out(&mut self, bytes: &[u8]) {
        self.stdout.write_all(bytes).ok();
        self.stdout.flush().ok();
    }

    fn read_int(&mut self) -> Option<i64> {
        let mut b = self.read_byte()?;
        while b.is_ascii_whitespace() {
            b = self.read_byte()?;
        }
        let negative = b == b'-';
        if negative || b == b'+' {
            b = self.read_byte()?;
        }
        let mut value: i64 = 0;
        let mut saw_digit = false;
        while b.is_ascii_digit() {
            saw_digit = true;
            value = value * 10 + (b - b'0') as i64;
            match self.read_byte() {
                Some(next) => b = next,
                None => {
                    return Some(if negative { -value } else { value });
                }
            }
        }
        self.pushback = Some(b);
        if saw_digit {
            Some(if negative { -value } else { value })
        } else {
            None
        }
    }

    fn read_char(&mut self) -> Option<char> {
        self.read_byte().map(|b| b as char)
    }

    fn warn(&mut self, msg: &str) {
        if self.warnings {
            writeln!(stderr(), "{}", msg).ok();
        }
    }

    fn have_file_input(&self) -> bool {
        !self.sandbox
    }

    fn have_file_output(&self) -> bool {
        !self.sandbox
    }

    fn have_execute(&self) -> ExecMode {
        if self.sandbox {
            ExecMode::Disabled
        } else {
            ExecMode::System
        }
    }

    fn read_file(&mut self, filename: &str) -> io::Result<Vec<u8>> {
        if self.sandbox {
            return Err(Error::from(ErrorKind::PermissionDenied));
        }
        let path = self.resolve(filename);
        let mut buf = Vec::new();
        File::open(path).and_then(|mut f| f.read_to_end(&mut buf))?;
        Ok(buf)
    }

    fn write_file(&mut self, filename: &str, content: &[u8]) -> io::Result<()> {
        if self.sandbox {
            return Err(Error::from(ErrorKind::PermissionDenied));
        }
        File::create(filename).and_then(|mut f| f.write_all(content))
    }

    fn execute_command(&mut self, command: &str) -> i32 {
        if self.sandbox {
            return -1;
        }
        if cfg!(unix) {
            Command::new("sh")
                .arg("-c")
                .arg(command)
                .status()
                .ok()
                .and_then(|s| s.code())
                .unwrap_or(-1)
        } else if cfg!(windows) {
            Command::new("cmd")
                .arg("/C")
                .arg(command)
                .status()
                .ok()
                .and_then(|s| s.code())
                .unwrap_or(-1)
        } else {
            eprintln!("WARNING: don't know how to execute commands on this platform");
            -1
        }
    }

    fn env_vars(&mut self) -> Vec<(String, String)> {
        if self.sandbox {
            Vec::new()
        } else {
            std::env::vars().collect()
        }
    }

    fn argv(&mut self) -> Vec<String> {
        self.argv.clone()
    }

    fn is_fingerprint_enabled(&self, fpr: i32) -> bool {
        self.allowed_fingerprints.iter().any(|f| *f == fpr)
    }
}
