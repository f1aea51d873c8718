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
/// Fingerprint 0x4f525448 ('ORTH')
///
/// Bitwise logic (`A`/`O`/`E`), absolute cursor-position and delta
/// setters (`X`/`Y`/`V`/`W`), and a pair of `g`/`p` variants (`G`/`P`)
/// that address funge-space directly rather than relative to the
/// storage offset.
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
    layer.insert('E', xor);
    layer.insert('X', set_x);
    layer.insert('Y', set_y);
    layer.insert('V', set_delta_x);
    layer.insert('W', set_delta_y);
    layer.insert('G', get_abs);
    layer.insert('P', put_abs);
    layer.insert('Z', skip_if_zero);
    layer.insert('S', display_string);
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
    instructionset.pop_layer(&['A', 'O', 'E', 'X', 'Y', 'V', 'W', 'G', 'P', 'Z', 'S'])
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

/// `X`: pop a value, set the cursor's x coordinate to it.
fn set_x<V, Space, Env>(
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
    let x = ip.pop();
    ip.cursor.location.x = x;
    ip.cursor.invalidate();
    InstructionResult::Continue
}

/// `Y`: pop a value, set the cursor's y coordinate to it.
fn set_y<V, Space, Env>(
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
    let y = ip.pop();
    ip.cursor.location.y = y;
    ip.cursor.invalidate();
    InstructionResult::Continue
}

/// `V`: pop a value, set the delta's x component to it.
fn set_delta_x<V, Space, Env>(
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
    let x = ip.pop();
    ip.cursor.delta.x = x;
    InstructionResult::Continue
}

/// `W`: pop a value, set the delta's y component to it.
fn set_delta_y<V, Space, Env>(
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
    let y = ip.pop();
    ip.cursor.delta.y = y;
    InstructionResult::Continue
}

/// `G`: pop y, pop x, push the cell at (x, y) -- unlike base `g`, this
/// is not adjusted by the storage offset, and is explicitly 2-D.
fn get_abs<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    _env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let y = ip.pop();
    let x = ip.pop();
    let v = space.get(Vector::new(x, y, 0.into()));
    ip.push(v);
    InstructionResult::Continue
}

/// `P`: pop y, pop x, pop a value, write it to (x, y) -- again, no
/// storage-offset adjustment.
fn put_abs<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    _env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let y = ip.pop();
    let x = ip.pop();
    let v = ip.pop();
    space.set(Vector::new(x, y, 0.into()), v);
    InstructionResult::Continue
}

/// `Z`: pop a value; if it's zero, skip the next cell (a conditional
/// trampoline).
fn skip_if_zero<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    _env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    if ip.pop() == 0.into() {
        ip.cursor.step(space);
    }
    InstructionResult::Continue
}

/// `S`: pop a 0gnirts string and write it straight to standard output.
fn display_string<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    _space: &mut Space,
    env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    use num::ToPrimitive;
    let s = ip.pop_0gnirts();
    let bytes: Vec<u8> = s.iter().map(|v| v.to_i64().unwrap_or(0) as u8).collect();
    env.write_out(&bytes);
    InstructionResult::Continue
}
