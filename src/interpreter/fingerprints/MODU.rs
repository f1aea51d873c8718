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
/// Fingerprint 0x4d4f4455 ('MODU')
///
/// The finer, less-well-agreed-upon points of modulo arithmetic. `M`
/// is a floor-division remainder (CCBI/cfunge/pyfunge convention), `U`
/// is Sam Holden's unsigned-result (Euclidean) remainder, `R` is the
/// plain C-style truncating remainder (what the base `%` instruction
/// also does).
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('M', signed_rem);
    layer.insert('U', unsigned_rem);
    layer.insert('R', c_rem);
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
    instructionset.pop_layer(&['M', 'U', 'R'])
}

fn signed_rem<V, Space, Env>(
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
    if b == 0.into() {
        ip.push(0.into());
    } else {
        let q = a / b; // truncating division, Rust's default
        let r = a % b;
        ip.push(if q < 0.into() { r + b } else { r });
    }
    InstructionResult::Continue
}

fn unsigned_rem<V, Space, Env>(
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
    if b == 0.into() {
        ip.push(0.into());
    } else {
        let r = a % b;
        ip.push(if r < 0.into() {
            if b > 0.into() {
                r + b
            } else {
                r - b
            }
        } else {
            r
        });
    }
    InstructionResult::Continue
}

fn c_rem<V, Space, Env>(
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
    ip.push(if b == 0.into() { 0.into() } else { a % b });
    InstructionResult::Continue
}
