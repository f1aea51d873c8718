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
use num::ToPrimitive;

use crate::fungespace::{FungeSpace, FungeValue, SrcIO, Vector};
use crate::interpreter::instruction_set::{Instruction, InstructionResult, InstructionSet};
use crate::interpreter::ip::InstructionPointer;
use crate::interpreter::motion::MotionCmds;
use crate::interpreter::InterpreterEnv;

/// The well-known Funge-98 string-handling library (absent from the
/// Stinkhorn original too -- `fing-strn.cpp` doesn't exist there), so
/// this is written fresh from the published STRN instruction contract:
/// strings are handled as 0gnirts the same as everywhere else in the
/// base set.
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('A', append);
    layer.insert('C', compare);
    layer.insert('D', display);
    layer.insert('F', search);
    layer.insert('G', get_string);
    layer.insert('I', input_string);
    layer.insert('L', left);
    layer.insert('M', slice);
    layer.insert('N', to_number);
    layer.insert('P', put_string);
    layer.insert('R', right);
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
    instructionset.pop_layer(&['A', 'C', 'D', 'F', 'G', 'I', 'L', 'M', 'N', 'P', 'R'])
}

fn to_bytes<V: FungeValue>(s: &[V]) -> Vec<u8> {
    s.iter().map(|v| v.to_i64().unwrap_or(0) as u8).collect()
}

/// `A`: pop `b` (the suffix), pop `a` (the prefix); push `a` followed
/// by `b` as one 0gnirts string.
fn append<V, Space, Env>(
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
    let b = ip.pop_0gnirts();
    let a = ip.pop_0gnirts();
    let mut combined = to_bytes(&a);
    combined.extend(to_bytes(&b));
    ip.push_0gnirts(&combined);
    InstructionResult::Continue
}

/// `C`: pop `b`, pop `a`; push -1/0/1 for `a < b`/`a == b`/`a > b`
/// (ASCII lexicographic order).
fn compare<V, Space, Env>(
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
    let b = to_bytes(&ip.pop_0gnirts());
    let a = to_bytes(&ip.pop_0gnirts());
    let ordering = a.cmp(&b) as i32;
    ip.push(ordering.into());
    InstructionResult::Continue
}

/// `D`: pop a string and write it to standard output with no newline.
fn display<V, Space, Env>(
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
    let s = ip.pop_0gnirts();
    env.write_out(&to_bytes(&s));
    InstructionResult::Continue
}

/// `F`: pop `needle`, pop `haystack`; push the index of the first
/// occurrence of `needle` in `haystack`, or -1 if not found.
fn search<V, Space, Env>(
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
    let needle = to_bytes(&ip.pop_0gnirts());
    let haystack = to_bytes(&ip.pop_0gnirts());
    let found = if needle.is_empty() {
        Some(0)
    } else {
        haystack
            .windows(needle.len())
            .position(|w| w == needle.as_slice())
    };
    ip.push(found.map(|i| i as i32).unwrap_or(-1).into());
    InstructionResult::Continue
}

/// `G`: pop `n`, pop a vector; read `n` cells from funge-space starting
/// there (storage-offset adjusted, scanning along the x-axis, stopping
/// early at a null cell), and push the result as a 0gnirts string.
fn get_string<V, Space, Env>(
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
    let n = ip.pop().to_i64().unwrap_or(0).max(0);
    let v = Vector::<V>::pop_vector(ip) + ip.storage_offset;
    let mut bytes = Vec::new();
    for i in 0..n {
        let cell = space.get(v + Vector::x_axis((i as i32).into()));
        if cell == 0.into() {
            break;
        }
        bytes.push(cell.to_i64().unwrap_or(0) as u8);
    }
    ip.push_0gnirts(&bytes);
    InstructionResult::Continue
}

/// `I`: read one line from standard input and push it as a 0gnirts
/// string (no trailing newline).
fn input_string<V, Space, Env>(
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
    let mut bytes = Vec::new();
    while let Some(c) = env.read_char() {
        if c == '\n' {
            break;
        }
        let mut buf = [0u8; 4];
        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    ip.push_0gnirts(&bytes);
    InstructionResult::Continue
}

/// `L`: pop `n`, pop a string; push its leftmost `n` characters.
fn left<V, Space, Env>(
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
    let n = ip.pop().to_i64().unwrap_or(0).max(0) as usize;
    let s = to_bytes(&ip.pop_0gnirts());
    let take = n.min(s.len());
    ip.push_0gnirts(&s[..take]);
    InstructionResult::Continue
}

/// `R`: pop `n`, pop a string; push its rightmost `n` characters.
fn right<V, Space, Env>(
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
    let n = ip.pop().to_i64().unwrap_or(0).max(0) as usize;
    let s = to_bytes(&ip.pop_0gnirts());
    let take = n.min(s.len());
    ip.push_0gnirts(&s[s.len() - take..]);
    InstructionResult::Continue
}

/// `M`: pop `len`, pop `pos`, pop a string; push the `len`-character
/// substring starting at `pos` (clamped to the string's bounds).
fn slice<V, Space, Env>(
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
    let len = ip.pop().to_i64().unwrap_or(0).max(0) as usize;
    let pos = ip.pop().to_i64().unwrap_or(0).max(0) as usize;
    let s = to_bytes(&ip.pop_0gnirts());
    if pos >= s.len() {
        ip.push_0gnirts(&[]);
        return InstructionResult::Continue;
    }
    let end = (pos + len).min(s.len());
    ip.push_0gnirts(&s[pos..end]);
    InstructionResult::Continue
}

/// `N`: pop a string, parse a leading (optionally signed) decimal
/// integer from it, and push the parsed value (0 if none found).
fn to_number<V, Space, Env>(
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
    let s = to_bytes(&ip.pop_0gnirts());
    let text = String::from_utf8_lossy(&s);
    let trimmed = text.trim_start();
    let mut end = 0;
    let bytes = trimmed.as_bytes();
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let n: i64 = if end > digits_start {
        trimmed[..end].parse().unwrap_or(0)
    } else {
        0
    };
    ip.push((n as i32).into());
    InstructionResult::Continue
}

/// `P`: pop a vector, pop a string; write the string into funge-space
/// starting there (storage-offset adjusted, along the x-axis),
/// followed by a null terminator cell.
fn put_string<V, Space, Env>(
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
    let v = Vector::<V>::pop_vector(ip) + ip.storage_offset;
    let s = to_bytes(&ip.pop_0gnirts());
    for (i, &b) in s.iter().enumerate() {
        space.set(v + Vector::x_axis((i as i32).into()), (b as i32).into());
    }
    space.set(v + Vector::x_axis((s.len() as i32).into()), 0.into());
    InstructionResult::Continue
}
