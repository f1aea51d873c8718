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

use hashbrown::HashMap;

use crate::fungespace::{Dimension, FungeSpace, FungeValue, SrcIO, Vector};

use super::ip::InstructionPointer;
use super::motion::MotionCmds;
use super::InterpreterEnv;

/// What a single instruction asks the scheduler to do next.
#[derive(Debug)]
pub enum InstructionResult {
    /// Advance and continue stepping this IP.
    Continue,
    /// This IP should be removed from the scheduler (`@`).
    Die,
    /// The whole program should stop, with this exit code (`q`).
    Exit(i32),
}

/// An instruction is a plain function pointer: `(ip, space, env) ->
/// InstructionResult`. No async, no boxed closures — fingerprints are
/// just more entries in the table.
pub type Instruction<Idx, Space, Env> =
    fn(&mut InstructionPointer<Idx, Space, Env>, &mut Space, &mut Env) -> InstructionResult;

/// Per-character layered dispatch table. Loading a fingerprint pushes
/// a new layer over some characters; unloading pops it, exposing
/// whatever was registered before (another fingerprint, or the base
/// instruction set).
pub struct InstructionSet<Idx, Space, Env> {
    layers: HashMap<char, Vec<Instruction<Idx, Space, Env>>>,
}

// Written by hand rather than `#[derive(Clone)]`: a bare fn pointer is
// always `Copy`/`Clone` regardless of the types it mentions, but the
// derive macro would conservatively (and wrongly, for our purposes)
// require `Space: Clone` and `Env: Clone` too, which `t`-forking an IP
// whose `Env` is a `CmdLineEnv` full of file handles can't provide.
impl<Idx: Clone, Space, Env> Clone for InstructionSet<Idx, Space, Env> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<Idx, Space, Env> InstructionSet<Idx, Space, Env> {
    pub fn empty() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }

    pub fn get(&self, c: char) -> Option<Instruction<Idx, Space, Env>> {
        self.layers.get(&c).and_then(|v| v.last().copied())
    }

    /// Push one layer of instructions, one char at a time. Used both
    /// by the base-instruction-set bootstrap and by fingerprint `load`.
    pub fn add_layer(&mut self, layer: HashMap<char, Instruction<Idx, Space, Env>>) {
        for (c, f) in layer {
            self.layers.entry(c).or_insert_with(Vec::new).push(f);
        }
    }

    /// Pop the most recent layer for each of the given characters.
    /// Returns `false` (and leaves the table unmodified) if any of the
    /// given characters had no layer to pop: unload only succeeds
    /// atomically, for all of a fingerprint's characters or none.
    pub fn pop_layer(&mut self, chars: &[char]) -> bool {
        for c in chars {
            match self.layers.get(c) {
                Some(v) if !v.is_empty() => {}
                _ => return false,
            }
        }
        for c in chars {
            self.layers.get_mut(c).unwrap().pop();
        }
        true
    }
}

impl<V, Space, Env> InstructionSet<Vector<V>, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    /// Build the Base93/Base98/Trefunge98 instruction set appropriate
    /// for `dim`: Base93 (plus the cardinal 2-D motions, which
    /// Befunge-93 also has) is always present; Base98's
    /// additions -- including `[`/`]`/`w` -- layer on top unless
    /// `base93_only` is set (`--befunge-93`); Trefunge98's 3-D motion
    /// instructions layer on top of that only when `dim == Tre`.
    pub fn new(dim: Dimension, base93_only: bool) -> Self {
        let mut set = Self::empty();
        set.add_layer(super::instructions::base93_layer());
        if dim.axes() >= 2 {
            set.add_layer(super::instructions::befunge93_motion_layer());
        }
        if !base93_only {
            set.add_layer(super::instructions::base98_layer());
            if dim.axes() >= 2 {
                set.add_layer(super::instructions::befunge98_motion_layer());
            }
        }
        if dim.axes() >= 3 {
            set.add_layer(super::instructions::trefunge_layer());
        }
        set
    }
}
