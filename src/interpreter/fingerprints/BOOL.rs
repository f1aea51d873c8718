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

/// From the catseye library
///
/// Fingerprint 0x424f4f4c ('BOOL')
///
/// Bitwise logic on whole cells: `A` and, `O` or, `X` xor, `N` not.
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('A', and);
    layer.insert('O', or);
    layer.insert('X', xor);
    layer.insert('N', not);
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
    instructionset.pop_layer(&['A', 'O', 'X', 'N'])
}

fn and<V, Space, Env>(
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
    let b = ip.pop();
    let a = ip.pop();
    ip.push(a & b);
    InstructionResult::Continue
}

fn or<V, Space, Env>(
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
    let b = ip.pop();
    let a = ip.pop();
    ip.push(a | b);
    InstructionResult::Continue
}

fn xor<V, Space, Env>(
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
    let b = ip.pop();
    let a = ip.pop();
    ip.push(a ^ b);
    InstructionResult::Continue
}

fn not<V, Space, Env>(
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
    let a = ip.pop();
    ip.push(!a);
    InstructionResult::Continue
}
