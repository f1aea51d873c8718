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

//! The interpreter: context/IP, thread/step, and the round-robin
//! scheduler, wired up around the funge-space and vector building
//! blocks in the sibling modules. `Interpreter::run` drives a pass
//! over every live IP,
//! generalised to 3 dimensions and built on the space-gliding
//! `Cursor::advance` rather than one `space.move_by` call per tick.

pub mod cursor;
pub mod fingerprints;
pub mod instruction_set;
mod instructions;
pub mod ip;
pub mod motion;

use std::io;

use crate::fungespace::{Dimension, FungeSpace, FungeValue, SrcIO, Vector};

pub use self::cursor::Cursor;
pub use self::fingerprints::{all_fingerprints, safe_fingerprints, string_to_fingerprint};
pub use self::instruction_set::{InstructionResult, InstructionSet};
pub use self::ip::InstructionPointer;
pub use self::motion::MotionCmds;

/// Execution mode as reported by the sysinfo (`y`) instruction and
/// consulted by the `=` instruction. This crate's `=` only ever shells
/// out through the platform default, so there is no further
/// shell-flavour distinction beyond enabled/disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Disabled,
    System,
}

/// What `run` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramResult {
    /// Every IP quit (`@`) or every IP got trapped: finished cleanly.
    Done(i32),
    /// An IP executed `q`: unwind immediately with this exit code.
    Quit(i32),
}

/// The trait boundary to the outside world: standard IO, warnings,
/// file access, `=` execution, and the environment/argv/fingerprint
/// allow-list an IP can read through `y`. Every method has a
/// conservative default (deny/empty) so a minimal test environment
/// need only implement the handful it cares about.
pub trait InterpreterEnv {
    /// Write bytes to the program's standard output.
    fn write_out(&mut self, bytes: &[u8]);
    /// Read one whitespace-delimited integer from standard input.
    /// `None` means EOF or a non-numeric token, both of which reflect
    /// the requesting IP.
    fn read_int(&mut self) -> Option<i64>;
    /// Read one character from standard input.
    fn read_char(&mut self) -> Option<char>;
    /// Emit a `--warnings`-gated diagnostic (unknown instruction, bad
    /// fingerprint load, ...). A no-op unless the collaborator wants
    /// `-w` behaviour.
    fn warn(&mut self, _msg: &str) {}
    /// Is `i` available?
    fn have_file_input(&self) -> bool {
        false
    }
    /// Is `o` available?
    fn have_file_output(&self) -> bool {
        false
    }
    /// Is `=` available, and how does [`InterpreterEnv::execute_command`] behave?
    fn have_execute(&self) -> ExecMode {
        ExecMode::Disabled
    }
    fn read_file(&mut self, _filename: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }
    fn write_file(&mut self, _filename: &str, _content: &[u8]) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }
    /// Run a shell command, returning its exit status (or -1 on
    /// failure to even launch it).
    fn execute_command(&mut self, _command: &str) -> i32 {
        -1
    }
    fn env_vars(&mut self) -> Vec<(String, String)> {
        Vec::new()
    }
    /// Command-line arguments to expose via `y`; element 0 is
    /// conventionally the script name.
    fn argv(&mut self) -> Vec<String> {
        Vec::new()
    }
    /// Is a given fingerprint id (see [`string_to_fingerprint`]) allowed
    /// to be `(`-loaded? See also [`all_fingerprints`]/[`safe_fingerprints`].
    fn is_fingerprint_enabled(&self, _fpr: i32) -> bool {
        false
    }
}

/// A do-nothing environment for unit tests: no input, output discarded,
/// no fingerprints, no files. A real (non-test-only) type since test
/// modules across `fungespace`/`interpreter` all need one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEnv;

impl InterpreterEnv for NoEnv {
    fn write_out(&mut self, _bytes: &[u8]) {}
    fn read_int(&mut self) -> Option<i64> {
        None
    }
    fn read_char(&mut self) -> Option<char> {
        None
    }
}

/// Dispatch one character: the fingerprint-overlaid instruction table
/// is consulted first; an unmapped letter warns and reflects instead
/// of panicking.
pub fn exec_char<V, Space, Env>(
    c: char,
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    match ip.instructions.get(c) {
        Some(f) => f(ip, space, env),
        None => {
            env.warn(&format!("unknown instruction {:?} ({:#x})", c, c as u32));
            ip.reflect();
            InstructionResult::Continue
        }
    }
}

/// Owns funge-space and the live IP list; one instance per `run`.
/// `next_ip_id` is the monotonically increasing counter `t` splits
/// draw fresh IDs from.
pub struct Interpreter<V, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Env: InterpreterEnv,
{
    pub space: Space,
    pub env: Env,
    pub ips: Vec<InstructionPointer<Vector<V>, Space, Env>>,
    pub dim: Dimension,
    pub warnings: bool,
    /// `--no-concurrent`: when false, `t` reflects instead of forking.
    pub concurrent: bool,
    next_ip_id: i32,
}

impl<V, Space, Env> Interpreter<V, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    pub fn new(dim: Dimension, space: Space, env: Env) -> Self {
        Self::new_with_mode(dim, space, env, false)
    }

    /// As [`Interpreter::new`], but with `--befunge-93`'s Base93-only
    /// restriction applied (or not) explicitly.
    pub fn new_with_mode(dim: Dimension, space: Space, env: Env, base93_only: bool) -> Self {
        let mut first = InstructionPointer::new_with_mode(dim, base93_only);
        first.id = 0;
        Self {
            space,
            env,
            ips: vec![first],
            dim,
            warnings: false,
            concurrent: true,
            next_ip_id: 1,
        }
    }

    /// Load `src` into funge-space at the origin, honouring `binary`
    /// (no line/page breaks, x-only advance) vs text mode's byte rules.
    pub fn load_program(&mut self, src: &[u8], binary: bool) {
        if binary {
            let mut pos = Vector::zero();
            for &b in src {
                self.space.set(pos, (b as i32).into());
                pos.x = pos.x + 1.into();
            }
        } else {
            self.space.load_src(Vector::zero(), src, self.dim);
        }
    }

    /// Drive every live IP to completion: round-robin, one whole
    /// `step()` per IP per tick, `t` inserting the child just before
    /// the parent for the remainder of the current pass.
    pub fn run(&mut self) -> ProgramResult {
        loop {
            let mut idx = 0;
            while idx < self.ips.len() {
                match self.step_one(idx) {
                    StepOutcome::Alive => idx += 1,
                    StepOutcome::Died => {
                        self.ips.remove(idx);
                    }
                    StepOutcome::Split => {
                        let child = self.spawn_child(idx);
                        self.ips.insert(idx, child);
                        // Parent (now at idx+1) already advanced past
                        // its `t`; both parent and child get to run
                        // again later in this same pass.
                        idx += 2;
                    }
                    StepOutcome::Exit(code) => return ProgramResult::Quit(code),
                }
            }
            if self.ips.is_empty() {
                return ProgramResult::Done(0);
            }
        }
    }

    /// A single step of the IP at `idx`: read the cell under the
    /// cursor, dispatch it, then advance.
    fn step_one(&mut self, idx: usize) -> StepOutcome {
        let ip = &mut self.ips[idx];
        let cell = ip.cursor.peek(&self.space);

        if ip.string_mode {
            if cell == '"'.into() {
                ip.string_mode = false;
            } else if cell == ' '.into() {
                if !ip.string_mode_just_saw_space {
                    ip.string_mode_just_saw_space = true;
                } else {
                    ip.push(cell);
                }
            } else {
                if ip.string_mode_just_saw_space {
                    ip.push(' '.into());
                    ip.string_mode_just_saw_space = false;
                }
                ip.push(cell);
            }
        } else {
            match exec_char(cell.to_char(), ip, &mut self.space, &mut self.env) {
                InstructionResult::Continue => {}
                InstructionResult::Die => return StepOutcome::Died,
                InstructionResult::Exit(code) => return StepOutcome::Exit(code),
            }
        }

        let ip = &mut self.ips[idx];
        let mut split_requested = ip.requests_split;
        ip.requests_split = false;
        if split_requested && !self.concurrent {
            // `-N`: `t` reflects instead of forking.
            ip.reflect();
            split_requested = false;
        }

        let ip = &mut self.ips[idx];
        let follow_teleports = !ip.string_mode;
        if !ip.cursor.advance(&self.space, follow_teleports) {
            // Trapped: no non-space cell reachable on this line.
            return StepOutcome::Died;
        }
        if split_requested {
            return StepOutcome::Split;
        }
        StepOutcome::Alive
    }

    /// `t`: clone the parent's context, reverse the copy's direction,
    /// advance it one step, and assign it the next IP id.
    fn spawn_child(&mut self, parent_idx: usize) -> InstructionPointer<Vector<V>, Space, Env> {
        let id = self.next_ip_id;
        self.next_ip_id += 1;
        let mut child = self.ips[parent_idx].clone();
        child.id = id;
        child.cursor.reverse();
        child.cursor.advance(&self.space, !child.string_mode);
        child
    }
}

enum StepOutcome {
    Alive,
    Died,
    Split,
    Exit(i32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fungespace::PagedFungeSpace;

    #[derive(Default)]
    struct CapturingEnv {
        out: Vec<u8>,
    }

    impl InterpreterEnv for CapturingEnv {
        fn write_out(&mut self, bytes: &[u8]) {
            self.out.extend_from_slice(bytes);
        }
        fn read_int(&mut self) -> Option<i64> {
            None
        }
        fn read_char(&mut self) -> Option<char> {
            None
        }
    }

    fn run_src(src: &[u8]) -> (ProgramResult, Vec<u8>) {
        let space: PagedFungeSpace<Vector<i64>, i64> = PagedFungeSpace::new(Dimension::Be);
        let mut interp = Interpreter::new(Dimension::Be, space, CapturingEnv::default());
        interp.load_program(src, true);
        let result = interp.run();
        (result, interp.env.out)
    }

    #[test]
    fn quit_immediately() {
        let (result, out) = run_src(b"@");
        assert_eq!(result, ProgramResult::Done(0));
        assert!(out.is_empty());
    }

    #[test]
    fn output_int_scenario() {
        let (result, out) = run_src(b"9.@");
        assert_eq!(result, ProgramResult::Done(0));
        assert_eq!(out, b"9 ");
    }

    #[test]
    fn add_and_output() {
        let (_, out) = run_src(b"12+.@");
        assert_eq!(out, b"3 ");
    }

    #[test]
    fn string_mode_pushes_in_reading_order() {
        // "Hi",, : pushes 'H' then 'i', then prints them (TOS first) as
        // chars -- 'i' comes out before 'H'.
        let (_, out) = run_src(b"\"Hi\",,@");
        assert_eq!(out, b"iH");
    }

    #[test]
    fn fingerprint_load_and_unload_roundtrip() {
        let (result, _) = run_src(b"\"MODU\"4(\"MODU\"4)@");
        assert_eq!(result, ProgramResult::Done(0));
    }

    #[test]
    fn split_runs_two_ips() {
        let (result, _) = run_src(b"1t$@");
        assert_eq!(result, ProgramResult::Done(0));
    }

    #[test]
    fn no_concurrent_reflects_instead_of_splitting() {
        let space: PagedFungeSpace<Vector<i64>, i64> = PagedFungeSpace::new(Dimension::Be);
        let mut interp = Interpreter::new(Dimension::Be, space, CapturingEnv::default());
        interp.concurrent = false;
        interp.load_program(b"1t$@", true);
        let result = interp.run();
        assert_eq!(result, ProgramResult::Done(0));
    }
}
