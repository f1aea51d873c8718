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
/// Fingerprint 0x524f4d41 ('ROMA')
///
/// After successfully loading ROMA, `C`, `D`, `I`, `L`, `M`, `V`, and
/// `X` push the value of the corresponding Roman numeral. These are
/// just digits: `MCM\-+LXXX+++IV\-++` leaves 1984 on the stack, but
/// `MCMLXXXIV` does not.
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('I', unum);
    layer.insert('V', quinque);
    layer.insert('X', decem);
    layer.insert('L', quinquaginta);
    layer.insert('C', centum);
    layer.insert('D', quingenti);
    layer.insert('M', mille);
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
    instructionset.pop_layer(&['I', 'V', 'X', 'L', 'C', 'D', 'M'])
}

macro_rules! push_const {
    ($name:ident, $val:expr) => {
        fn $name<V, Space, Env>(
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
            ip.push($val.into());
            InstructionResult::Continue
        }
    };
}

push_const!(unum, 1);
push_const!(quinque, 5);
push_const!(decem, 10);
push_const!(quinquaginta, 50);
push_const!(centum, 100);
push_const!(quingenti, 500);
push_const!(mille, 1000);
