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

//! The Base93/Base98/Trefunge98 built-in instruction tables: one plain
//! function per instruction, keyed into layers by character.

use chrono::{Datelike, Timelike};
use hashbrown::HashMap;
use pkg_version::{pkg_version_major, pkg_version_minor, pkg_version_patch};

use crate::fungespace::{FungeSpace, FungeValue, SrcIO, Vector};

use super::ip::InstructionPointer;
use super::instruction_set::{Instruction, InstructionResult};
use super::motion::{MotionCmds, RngCore98, ThreadRng98};
use super::{ExecMode, InterpreterEnv};

type Layer<V, Space, Env> = HashMap<char, Instruction<Vector<V>, Space, Env>>;

const FUNGE_HANDPRINT: i32 = 0x5246_4e47u32 as i32; // "RFNG"

pub fn base93_layer<V, Space, Env>() -> Layer<V, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut l: Layer<V, Space, Env> = HashMap::new();
    l.insert('0', d0);
    l.insert('1', d1);
    l.insert('2', d2);
    l.insert('3', d3);
    l.insert('4', d4);
    l.insert('5', d5);
    l.insert('6', d6);
    l.insert('7', d7);
    l.insert('8', d8);
    l.insert('9', d9);
    l.insert('+', add);
    l.insert('-', subtract);
    l.insert('*', multiply);
    l.insert('/', divide);
    l.insert('%', modulo);
    l.insert('!', not);
    l.insert('`', greater_than);
    l.insert('>', go_east);
    l.insert('<', go_west);
    l.insert('?', go_away);
    l.insert('_', horiz_if);
    l.insert('"', toggle_stringmode);
    l.insert(':', dup);
    l.insert('\\', swap);
    l.insert('$', pop_discard);
    l.insert('.', output_int);
    l.insert(',', output_char);
    l.insert('#', trampoline);
    l.insert('p', put);
    l.insert('g', get);
    l.insert('&', input_int);
    l.insert('~', input_char);
    l.insert('@', terminate);
    l.insert(' ', no_op);
    l.insert('q', quit);
    l
}

pub fn base98_layer<V, Space, Env>() -> Layer<V, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut l: Layer<V, Space, Env> = HashMap::new();
    l.insert('a', d10);
    l.insert('b', d11);
    l.insert('c', d12);
    l.insert('d', d13);
    l.insert('e', d14);
    l.insert('f', d15);
    l.insert('z', no_op);
    l.insert(';', skip_comment);
    l.insert('j', jump);
    l.insert('k', iterate);
    l.insert('{', begin_block);
    l.insert('}', end_block);
    l.insert('u', stack_under_stack);
    l.insert('i', input_file);
    l.insert('o', output_file);
    l.insert('=', execute);
    l.insert('y', sysinfo);
    l.insert('t', split);
    l.insert('(', load_fingerprint);
    l.insert(')', unload_fingerprint);
    l.insert('\'', fetch_char);
    l.insert('s', store_char);
    l.insert('x', absolute_delta);
    l
}

/// `^`/`v`/`|`: present in Befunge-93 as well as Befunge-98, so this
/// layers in regardless of `--befunge-93`.
pub fn befunge93_motion_layer<V, Space, Env>() -> Layer<V, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut l: Layer<V, Space, Env> = HashMap::new();
    l.insert('^', go_north);
    l.insert('v', go_south);
    l.insert('|', vert_if);
    l
}

/// `[`/`]`/`w`: Befunge-98 additions over Befunge-93's 2-D motion set.
pub fn befunge98_motion_layer<V, Space, Env>() -> Layer<V, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut l: Layer<V, Space, Env> = HashMap::new();
    l.insert(']', turn_right);
    l.insert('[', turn_left);
    l.insert('w', compare);
    l
}

pub fn trefunge_layer<V, Space, Env>() -> Layer<V, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut l: Layer<V, Space, Env> = HashMap::new();
    l.insert('h', go_high);
    l.insert('l', go_low);
    l.insert('m', high_low_if);
    l
}

macro_rules! digit_instr {
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

digit_instr!(d0, 0);
digit_instr!(d1, 1);
digit_instr!(d2, 2);
digit_instr!(d3, 3);
digit_instr!(d4, 4);
digit_instr!(d5, 5);
digit_instr!(d6, 6);
digit_instr!(d7, 7);
digit_instr!(d8, 8);
digit_instr!(d9, 9);
digit_instr!(d10, 10);
digit_instr!(d11, 11);
digit_instr!(d12, 12);
digit_instr!(d13, 13);
digit_instr!(d14, 14);
digit_instr!(d15, 15);

fn add<V, Space, Env>(
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
    ip.push(a + b);
    InstructionResult::Continue
}

fn subtract<V, Space, Env>(
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
    ip.push(a - b);
    InstructionResult::Continue
}

fn multiply<V, Space, Env>(
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
    ip.push(a * b);
    InstructionResult::Continue
}

/// `/`: Funge-98 defines division by zero as pushing 0; Befunge-93
/// instead asks the user for a replacement value on stdin.
fn divide<V, Space, Env>(
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
    let b = ip.pop();
    let a = ip.pop();
    ip.push(divide_by_zero_safe(ip.base93_only, env, a, b, |a, b| a / b));
    InstructionResult::Continue
}

fn modulo<V, Space, Env>(
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
    let b = ip.pop();
    let a = ip.pop();
    ip.push(divide_by_zero_safe(ip.base93_only, env, a, b, |a, b| a % b));
    InstructionResult::Continue
}

fn divide_by_zero_safe<V: FungeValue, Env: InterpreterEnv>(
    base93_only: bool,
    env: &mut Env,
    a: V,
    b: V,
    op: impl FnOnce(V, V) -> V,
) -> V {
    if b != 0.into() {
        return op(a, b);
    }
    if base93_only {
        env.read_int().map(|n| (n as i32).into()).unwrap_or_else(|| 0.into())
    } else {
        0.into()
    }
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
    ip.push(if a == 0.into() { 1.into() } else { 0.into() });
    InstructionResult::Continue
}

fn greater_than<V, Space, Env>(
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
    ip.push(if a > b { 1.into() } else { 0.into() });
    InstructionResult::Continue
}

fn go_east<V, Space, Env>(
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
    Vector::<V>::go_east(ip);
    InstructionResult::Continue
}

fn go_west<V, Space, Env>(
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
    Vector::<V>::go_west(ip);
    InstructionResult::Continue
}

fn go_north<V, Space, Env>(
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
    Vector::<V>::go_north(ip);
    InstructionResult::Continue
}

fn go_south<V, Space, Env>(
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
    Vector::<V>::go_south(ip);
    InstructionResult::Continue
}

fn go_high<V, Space, Env>(
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
    Vector::<V>::go_high(ip);
    InstructionResult::Continue
}

fn go_low<V, Space, Env>(
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
    Vector::<V>::go_low(ip);
    InstructionResult::Continue
}

/// `m`: Trefunge's z-axis conditional, the `h`/`l` analogue of `|`/`_`.
/// Pops one value; zero goes low, nonzero goes high.
fn high_low_if<V, Space, Env>(
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
    if ip.pop() == 0.into() {
        Vector::<V>::go_low(ip);
    } else {
        Vector::<V>::go_high(ip);
    }
    InstructionResult::Continue
}

fn turn_left<V, Space, Env>(
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
    Vector::<V>::turn_left(ip);
    InstructionResult::Continue
}

fn turn_right<V, Space, Env>(
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
    Vector::<V>::turn_right(ip);
    InstructionResult::Continue
}

fn go_away<V, Space, Env>(
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
    let mut rng = ThreadRng98;
    Vector::<V>::go_away(ip, &mut rng as &mut dyn RngCore98);
    InstructionResult::Continue
}

fn horiz_if<V, Space, Env>(
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
    if ip.pop() == 0.into() {
        Vector::<V>::go_east(ip);
    } else {
        Vector::<V>::go_west(ip);
    }
    InstructionResult::Continue
}

fn vert_if<V, Space, Env>(
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
    if ip.pop() == 0.into() {
        Vector::<V>::go_south(ip);
    } else {
        Vector::<V>::go_north(ip);
    }
    InstructionResult::Continue
}

/// `w`: compare. Pops b, then a; if a>b turn right, a<b turn left,
/// else go straight.
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
    let b = ip.pop();
    let a = ip.pop();
    if a > b {
        Vector::<V>::turn_right(ip);
    } else if a < b {
        Vector::<V>::turn_left(ip);
    }
    InstructionResult::Continue
}

/// `x`: pop a vector and set it as the IP's delta directly, bypassing
/// `[`/`]`/cardinal moves entirely.
fn absolute_delta<V, Space, Env>(
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
    let d = Vector::<V>::pop_vector(ip);
    ip.cursor.delta = d;
    InstructionResult::Continue
}

fn toggle_stringmode<V, Space, Env>(
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
    ip.string_mode = !ip.string_mode;
    InstructionResult::Continue
}

fn dup<V, Space, Env>(
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
    let a = ip.peek();
    ip.push(a);
    InstructionResult::Continue
}

fn swap<V, Space, Env>(
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
    let b = ip.pop();
    ip.push(a);
    ip.push(b);
    InstructionResult::Continue
}

fn pop_discard<V, Space, Env>(
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
    ip.pop();
    InstructionResult::Continue
}

fn output_int<V, Space, Env>(
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
    let v = ip.pop();
    let s = format!("{} ", v.to_i64().unwrap_or(0));
    env.write_out(s.as_bytes());
    InstructionResult::Continue
}

fn output_char<V, Space, Env>(
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
    let v = ip.pop();
    let c = v.to_char();
    let mut buf = [0u8; 4];
    env.write_out(c.encode_utf8(&mut buf).as_bytes());
    InstructionResult::Continue
}

fn trampoline<V, Space, Env>(
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
    ip.cursor.step(space);
    InstructionResult::Continue
}

/// `j`: jump `n` cells forward along the current delta without
/// stopping to glide past spaces the way a plain `step` would -- the
/// landing cell is whatever is there, space or not.
fn jump<V, Space, Env>(
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
    let n = ip.pop();
    ip.cursor.location = ip.cursor.location + ip.cursor.delta * n;
    ip.cursor.invalidate();
    InstructionResult::Continue
}

fn put<V, Space, Env>(
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
    let v = Vector::<V>::pop_vector(ip);
    let val = ip.pop();
    space.set(ip.storage_offset + v, val);
    InstructionResult::Continue
}

fn get<V, Space, Env>(
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
    let v = Vector::<V>::pop_vector(ip);
    let val = space.get(ip.storage_offset + v);
    ip.push(val);
    InstructionResult::Continue
}

fn input_int<V, Space, Env>(
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
    match env.read_int() {
        Some(n) => {
            ip.push((n as i32).into());
        }
        None => ip.reflect(),
    }
    InstructionResult::Continue
}

fn input_char<V, Space, Env>(
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
    match env.read_char() {
        Some(c) => {
            ip.push((c as i32).into());
        }
        None => ip.reflect(),
    }
    InstructionResult::Continue
}

fn terminate<V, Space, Env>(
    _ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    _space: &mut Space,
    _env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    InstructionResult::Die
}

fn quit<V, Space, Env>(
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
    let code = ip.pop().to_i64().unwrap_or(0) as i32;
    InstructionResult::Exit(code)
}

fn no_op<V, Space, Env>(
    _ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    _space: &mut Space,
    _env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    InstructionResult::Continue
}

/// `;`: skip to (and past) the next `;`, executing nothing in between.
fn skip_comment<V, Space, Env>(
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
    loop {
        ip.cursor.step(space);
        if ip.cursor.peek(space) == (';' as i32).into() {
            ip.cursor.step(space);
            break;
        }
    }
    InstructionResult::Continue
}

/// `k`: execute the next instruction `n` times (0 skips it entirely,
/// by just leaving the cursor past it without running it).
fn iterate<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let n = ip.pop().to_i64().unwrap_or(0);
    ip.cursor.step(space);
    let c = ip.cursor.peek(space).to_char();
    if n <= 0 {
        return InstructionResult::Continue;
    }
    for _ in 0..n {
        let result = super::exec_char(c, ip, space, env);
        if !matches!(result, InstructionResult::Continue) {
            return result;
        }
    }
    InstructionResult::Continue
}

fn begin_block<V, Space, Env>(
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
    let n = ip.pop().to_i64().unwrap_or(0);
    let new_offset = ip.cursor.location + ip.cursor.delta;
    ip.begin_block(n, new_offset);
    InstructionResult::Continue
}

fn end_block<V, Space, Env>(
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
    let n = ip.pop().to_i64().unwrap_or(0);
    if !ip.end_block(n) {
        ip.reflect();
    }
    InstructionResult::Continue
}

fn stack_under_stack<V, Space, Env>(
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
    let n = ip.pop().to_i64().unwrap_or(0);
    if !ip.stack_under_stack(n) {
        ip.reflect();
    }
    InstructionResult::Continue
}

fn filename_from_0gnirts<V: FungeValue>(bytes: Vec<V>) -> String {
    let raw: Vec<u8> = bytes.iter().map(|v| v.to_i64().unwrap_or(0) as u8).collect();
    String::from_utf8_lossy(&raw).into_owned()
}

fn input_file<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    if !env.have_file_input() {
        ip.reflect();
        return InstructionResult::Continue;
    }
    let va = Vector::<V>::pop_vector(ip);
    let target = Vector::<V>::pop_vector(ip);
    let flags = ip.pop().to_i64().unwrap_or(0);
    let filename = filename_from_0gnirts(ip.pop_0gnirts());
    match env.read_file(&filename) {
        Ok(bytes) => {
            let linear = flags & 1 == 0;
            let dest = ip.storage_offset + target;
            Vector::<V>::put_src(space, dest, va, &bytes, linear);
            ip.push(va.y);
            ip.push(va.x);
            ip.push(dest.y);
            ip.push(dest.x);
        }
        Err(_) => ip.reflect(),
    }
    InstructionResult::Continue
}

fn output_file<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    if !env.have_file_output() {
        ip.reflect();
        return InstructionResult::Continue;
    }
    let va = Vector::<V>::pop_vector(ip);
    let source = Vector::<V>::pop_vector(ip);
    let flags = ip.pop().to_i64().unwrap_or(0);
    let filename = filename_from_0gnirts(ip.pop_0gnirts());
    let from = ip.storage_offset + source;
    let bytes = if flags & 1 == 0 {
        Vector::<V>::get_src_str(space, from, va).into_bytes()
    } else {
        Vector::<V>::get_src_bin(space, from, va)
    };
    if env.write_file(&filename, &bytes).is_err() {
        ip.reflect();
    }
    InstructionResult::Continue
}

fn execute<V, Space, Env>(
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
    match env.have_execute() {
        ExecMode::Disabled => {
            ip.push((-1i32).into());
        }
        ExecMode::System => {
            let cmd = filename_from_0gnirts(ip.pop_0gnirts());
            let code = env.execute_command(&cmd);
            ip.push(code.into());
        }
    }
    InstructionResult::Continue
}

/// `y`: push a large block of environment/system info, trimmed to the
/// fields this crate's `InterpreterEnv` actually exposes.
fn sysinfo<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    env: &mut Env,
) -> InstructionResult
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let n = ip.pop().to_i64().unwrap_or(0);

    let argv = env.argv();
    let env_vars = env.env_vars();

    let mut cells: Vec<V> = Vec::new();
    let mut flags = 0i32;
    if cfg!(unix) {
        flags |= 0x01;
    }
    if env.have_file_input() {
        flags |= 0x02;
    }
    if matches!(env.have_execute(), ExecMode::System) {
        flags |= 0x04;
    }
    cells.push(flags.into());
    cells.push((std::mem::size_of::<V>() as i32).into());
    cells.push(FUNGE_HANDPRINT.into());
    let version =
        pkg_version_major!() * 1_000_000 + pkg_version_minor!() * 1_000 + pkg_version_patch!();
    cells.push((version as i32).into());
    cells.push(if matches!(env.have_execute(), ExecMode::System) {
        1
    } else {
        0
    }
    .into());
    cells.push((std::path::MAIN_SEPARATOR as i32).into());
    cells.push((ip.dim.axes() as i32).into());
    cells.push(ip.id.into());
    cells.push(ip.storage_offset.x);
    cells.push(ip.storage_offset.y);
    let lo = space.min_idx();
    cells.push(lo.x);
    cells.push(lo.y);
    let hi = space.max_idx();
    cells.push(hi.x - lo.x);
    cells.push(hi.y - lo.y);
    let now = chrono::Local::now();
    let date_packed = (now.year() - 1900) * 256 * 256 + (now.month() as i32) * 256 + now.day() as i32;
    cells.push(date_packed.into());
    let time_packed = (now.hour() as i32) * 256 * 256 + (now.minute() as i32) * 256 + now.second() as i32;
    cells.push(time_packed.into());
    cells.push((ip.stack_stack.len() as i32).into());
    for s in ip.stack_stack.iter() {
        cells.push((s.len() as i32).into());
    }

    let mut argv_cells: Vec<V> = Vec::new();
    for a in argv.iter().rev() {
        argv_cells.push(0.into());
        for b in a.bytes().rev() {
            argv_cells.push((b as i32).into());
        }
    }
    argv_cells.push(0.into());

    let mut env_cells: Vec<V> = Vec::new();
    for (k, v) in env_vars.iter().rev() {
        let entry = format!("{}={}", k, v);
        env_cells.push(0.into());
        for b in entry.bytes().rev() {
            env_cells.push((b as i32).into());
        }
    }
    env_cells.push(0.into());

    if n > 0 {
        let mut all = cells.clone();
        all.extend(env_cells.iter().copied());
        all.extend(argv_cells.iter().copied());
        ip.push(all.get((n - 1) as usize).copied().unwrap_or_else(|| 0.into()));
    } else {
        for v in argv_cells.into_iter().rev() {
            ip.push(v);
        }
        for v in env_cells.into_iter().rev() {
            ip.push(v);
        }
        for v in cells.into_iter().rev() {
            ip.push(v);
        }
    }
    InstructionResult::Continue
}

/// `t`: split execution into two IPs. The actual duplication happens
/// in the scheduler (`Interpreter::run`), since only it owns the IP
/// list; this just raises the request flag.
fn split<V, Space, Env>(
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
    ip.requests_split = true;
    InstructionResult::Continue
}

/// `'`: fetch the character immediately following and push its value,
/// without ever dispatching it as an instruction.
fn fetch_char<V, Space, Env>(
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
    ip.cursor.step(space);
    let v = ip.cursor.peek(space);
    ip.push(v);
    InstructionResult::Continue
}

/// `s`: pop a value and store it in the cell immediately following,
/// then skip over that cell.
fn store_char<V, Space, Env>(
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
    let v = ip.pop();
    ip.cursor.step(space);
    space.set(ip.cursor.location, v);
    ip.cursor.invalidate();
    InstructionResult::Continue
}

fn load_fingerprint<V, Space, Env>(
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
    let count = ip.pop().to_i64().unwrap_or(0).max(0) as u32;
    let mut fpr: i64 = 0;
    for _ in 0..count {
        fpr = fpr * 256 + ip.pop().to_i64().unwrap_or(0);
    }
    if count == 0 || !env.is_fingerprint_enabled(fpr as i32) {
        ip.reflect();
        return InstructionResult::Continue;
    }
    if !super::fingerprints::load(fpr as i32, ip) {
        ip.reflect();
    }
    InstructionResult::Continue
}

fn unload_fingerprint<V, Space, Env>(
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
    let count = ip.pop().to_i64().unwrap_or(0).max(0) as u32;
    let mut fpr: i64 = 0;
    for _ in 0..count {
        fpr = fpr * 256 + ip.pop().to_i64().unwrap_or(0);
    }
    if count == 0 || !super::fingerprints::unload(fpr as i32, ip) {
        ip.reflect();
    }
    InstructionResult::Continue
}
