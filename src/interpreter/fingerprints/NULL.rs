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

use crate::fungespace::{FungeSpace, FungeValue, SrcIO, Vector};
use crate::interpreter::instruction_set::{Instruction, InstructionResult, InstructionSet};
use crate::interpreter::ip::InstructionPointer;
use crate::interpreter::InterpreterEnv;

/// Fingerprint 0x4e554c4c ('NULL')
///
/// A fingerprint that does nothing: every instruction it "handles"
/// just reflects. Used by test suites (and here) as the simplest
/// possible fingerprint, and as the template every other one in this
/// module follows.
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    for c in 'A'..='Z' {
        layer.insert(c, reflect);
    }
    instructionset.add_layer(layer);
    true
}

pub fn unload<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let letters: Vec<char> = ('A'..='Z').collect();
    instructionset.pop_layer(&letters)
}

fn reflect<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    _space: &mut Space,
    _env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    ip.reflect();
    InstructionResult::Continue
}
