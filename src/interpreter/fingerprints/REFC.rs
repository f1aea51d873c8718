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

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use num::ToPrimitive;

use crate::fungespace::{FungeIndex, FungeSpace, FungeValue, SrcIO, Vector};
use crate::interpreter::instruction_set::{Instruction, InstructionResult, InstructionSet};
use crate::interpreter::ip::InstructionPointer;
use crate::interpreter::InterpreterEnv;

const REFS_KEY: &str = "REFC.refs";

/// Fingerprint 0x52454643 ('REFC')
///
/// `R` stores a vector on a private reference table and pushes a
/// reference number for it; `D` pops a reference number and pushes
/// the vector it refers to (or 0-vector if the reference is invalid).
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('R', reference);
    layer.insert('D', dereference);
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
    instructionset.pop_layer(&['R', 'D'])
}

fn refs<V>(ip: &mut InstructionPointer<Vector<V>, impl FungeSpace<Vector<V>, Output = V>, impl InterpreterEnv>) -> Rc<RefCell<Vec<Vector<V>>>>
where
    V: FungeValue,
{
    if let Some(existing) = ip.private_data.get(REFS_KEY) {
        if let Some(rc) = existing.downcast_ref::<Rc<RefCell<Vec<Vector<V>>>>>() {
            return rc.clone();
        }
    }
    let fresh: Rc<RefCell<Vec<Vector<V>>>> = Rc::new(RefCell::new(Vec::new()));
    ip.private_data
        .insert(REFS_KEY.to_owned(), Rc::new(fresh.clone()) as Rc<dyn Any>);
    fresh
}

fn reference<V, Space, Env>(
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
    let v = crate::interpreter::motion::MotionCmds::pop_vector(ip);
    let table = refs(ip);
    let idx = {
        let mut table = table.borrow_mut();
        table.push(v);
        table.len() - 1
    };
    // Reference numbers are 1-based; 0 is reserved for "no reference".
    ip.push(V::from((idx + 1) as i32));
    InstructionResult::Continue
}

fn dereference<V, Space, Env>(
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
    let r = ip.pop();
    let table = refs(ip);
    let table = table.borrow();
    let idx = r.to_i64().unwrap_or(0);
    let v = if idx >= 1 && (idx as usize) <= table.len() {
        table[(idx - 1) as usize]
    } else {
        Vector::zero()
    };
    crate::interpreter::motion::MotionCmds::push_vector(ip, v);
    InstructionResult::Continue
}
