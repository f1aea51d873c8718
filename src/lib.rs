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

pub mod fungespace;
pub mod interpreter;

use crate::fungespace::{Dimension, FungeValue, PagedFungeSpace};

pub use crate::fungespace::{FungeSpace, SrcIO, Vector};
pub use crate::interpreter::{
    all_fingerprints, safe_fingerprints, string_to_fingerprint, ExecMode, Interpreter,
    InstructionPointer, InstructionResult, InterpreterEnv, NoEnv, ProgramResult,
};

/// Build an interpreter for a program of the given dimensionality,
/// backed by a fresh [`PagedFungeSpace`].
///
/// `V` is the cell type (typically `i32` or `i64`); `env` supplies IO
/// and the other host-provided behaviour an [`InterpreterEnv`] needs.
pub fn new_interpreter<V, Env>(
    dim: Dimension,
    env: Env,
) -> Interpreter<V, PagedFungeSpace<Vector<V>, V>, Env>
where
    V: FungeValue,
    Env: InterpreterEnv,
{
    Interpreter::new(dim, PagedFungeSpace::new(dim), env)
}

/// As [`new_interpreter`], but with `--befunge-93`'s Base93-only
/// restriction applied (or not) explicitly.
pub fn new_interpreter_with_mode<V, Env>(
    dim: Dimension,
    env: Env,
    base93_only: bool,
) -> Interpreter<V, PagedFungeSpace<Vector<V>, V>, Env>
where
    V: FungeValue,
    Env: InterpreterEnv,
{
    Interpreter::new_with_mode(dim, PagedFungeSpace::new(dim), env, base93_only)
}
