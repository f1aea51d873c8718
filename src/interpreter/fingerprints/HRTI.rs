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

use std::time::Instant;

use hashbrown::HashMap;

use crate::fungespace::{FungeSpace, FungeValue, SrcIO, Vector};
use crate::interpreter::instruction_set::{Instruction, InstructionResult, InstructionSet};
use crate::interpreter::ip::InstructionPointer;
use crate::interpreter::InterpreterEnv;

/// High Resolution Timer, fingerprint 0x48525449 ('HRTI').
///
/// This is also what "TIMER" refers to elsewhere (`TIMER_FINGERPRINT`
/// in the Stinkhorn original is literally the same 4 bytes) — one
/// implementation covers both names.
///
/// `G` pushes the timer's granularity in microseconds. `M` marks the
/// current time. `S` pushes the number of microseconds since the last
/// mark (or since `(` if never marked), then re-marks.
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('G', granularity);
    layer.insert('M', mark);
    layer.insert('S', since_mark);
    layer.insert('T', second_of_day);
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
    instructionset.pop_layer(&['G', 'M', 'S', 'T'])
}

fn granularity<V, Space, Env>(
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
    // `Instant`'s actual resolution isn't queryable portably; 1us is
    // the granularity we promise callers of `S`.
    ip.push(1.into());
    InstructionResult::Continue
}

fn mark<V, Space, Env>(
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
    ip.private_data.insert(
        "HRTI.mark".to_owned(),
        std::rc::Rc::new(Instant::now()) as std::rc::Rc<dyn std::any::Any>,
    );
    InstructionResult::Continue
}

fn since_mark<V, Space, Env>(
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
    let prev = ip
        .private_data
        .get("HRTI.mark")
        .and_then(|a| a.downcast_ref::<Instant>().copied());
    let now = Instant::now();
    let micros = match prev {
        Some(p) => now.duration_since(p).as_micros() as i64,
        None => 0,
    };
    ip.private_data
        .insert("HRTI.mark".to_owned(), std::rc::Rc::new(now));
    ip.push((micros as i32).into());
    InstructionResult::Continue
}

fn second_of_day<V, Space, Env>(
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
    use chrono::Timelike;
    let now = chrono::Local::now();
    let secs = now.hour() * 3600 + now.minute() * 60 + now.second();
    ip.push((secs as i32).into());
    InstructionResult::Continue
}
