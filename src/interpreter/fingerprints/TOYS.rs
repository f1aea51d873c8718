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

/// A grab-bag of extra stack, math and funge-space manipulation
/// instructions from the catseye library.
///
/// Fingerprint 0x544f5953 ('TOYS')
///
/// Grounded in the Stinkhorn `fing-toys.cpp` original. `F` (fill an i*j matrix from
/// the stack into funge-space) and `G` (its inverse) are omitted: their
/// exact stack layout isn't pinned down precisely enough by the
/// available source to reconstruct with confidence, so this fingerprint
/// reflects on those two rather than guess at their contract.
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('C', copy_low_keep);
    layer.insert('K', copy_high_keep);
    layer.insert('M', copy_low_erase);
    layer.insert('V', copy_high_erase);
    layer.insert('S', chicane);
    layer.insert('L', peek_left);
    layer.insert('R', peek_right);
    layer.insert('I', increment);
    layer.insert('D', decrement);
    layer.insert('N', negate);
    layer.insert('H', shift);
    layer.insert('A', push_n_copies);
    layer.insert('B', add_and_sub);
    layer.insert('E', stack_sum);
    layer.insert('P', stack_product);
    layer.insert('Q', put_behind);
    layer.insert('T', turn_to_axis);
    layer.insert('U', scatter_direction);
    layer.insert('W', watch_cell);
    layer.insert('X', move_x);
    layer.insert('Y', move_y);
    layer.insert('Z', move_z);
    layer.insert('O', move_line_east_west);
    layer.insert('J', move_line_north_south);
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
    instructionset.pop_layer(&[
        'C', 'K', 'M', 'V', 'S', 'L', 'R', 'I', 'D', 'N', 'H', 'A', 'B', 'E', 'P', 'Q', 'T', 'U',
        'W', 'X', 'Y', 'Z', 'O', 'J',
    ])
}

fn axis_len<V: FungeValue>(v: V) -> i64 {
    v.to_i64().unwrap_or(0).max(0)
}

/// Shared implementation of `C`/`K`/`M`/`V`: pops `dst`, `src`, `size`
/// (in that reverse order, so `size` is pushed last), copies the
/// rectangular region of that `size` from `src` to `dst`, optionally
/// erasing the source afterwards. `low_order` picks forward (low first)
/// vs backward (high first) scan order, which only matters when the
/// source and destination regions overlap.
fn copy_region<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    low_order: bool,
    erase: bool,
) where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
{
    let size = Vector::<V>::pop_vector(ip);
    let src = Vector::<V>::pop_vector(ip) + ip.storage_offset;
    let dst = Vector::<V>::pop_vector(ip) + ip.storage_offset;
    let sx = axis_len(size.x).max(1);
    let sy = axis_len(size.y).max(1);
    let sz = axis_len(size.z).max(1);
    let xs: Vec<i64> = if low_order {
        (0..sx).collect()
    } else {
        (0..sx).rev().collect()
    };
    let ys: Vec<i64> = if low_order {
        (0..sy).collect()
    } else {
        (0..sy).rev().collect()
    };
    let zs: Vec<i64> = if low_order {
        (0..sz).collect()
    } else {
        (0..sz).rev().collect()
    };
    for &z in &zs {
        for &y in &ys {
            for &x in &xs {
                let off = Vector::new((x as i32).into(), (y as i32).into(), (z as i32).into());
                let v = space.get(src + off);
                space.set(dst + off, v);
                if erase {
                    space.set(src + off, ' '.into());
                }
            }
        }
    }
}

fn copy_low_keep<V, Space, Env>(
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
    copy_region(ip, space, true, false);
    InstructionResult::Continue
}

fn copy_high_keep<V, Space, Env>(
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
    copy_region(ip, space, false, false);
    InstructionResult::Continue
}

fn copy_low_erase<V, Space, Env>(
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
    copy_region(ip, space, true, true);
    InstructionResult::Continue
}

fn copy_high_erase<V, Space, Env>(
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
    copy_region(ip, space, false, true);
    InstructionResult::Continue
}

/// `S`: pop a size vector, a destination vector, and a value; fill the
/// rectangular region with that value.
fn chicane<V, Space, Env>(
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
    let size = Vector::<V>::pop_vector(ip);
    let dst = Vector::<V>::pop_vector(ip) + ip.storage_offset;
    let val = ip.pop();
    let sx = axis_len(size.x).max(1);
    let sy = axis_len(size.y).max(1);
    let sz = axis_len(size.z).max(1);
    for z in 0..sz {
        for y in 0..sy {
            for x in 0..sx {
                let off = Vector::new((x as i32).into(), (y as i32).into(), (z as i32).into());
                space.set(dst + off, val);
            }
        }
    }
    InstructionResult::Continue
}

fn rotate_left<V: FungeValue>(d: Vector<V>) -> Vector<V> {
    Vector::new(d.y, -d.x, d.z)
}
fn rotate_right<V: FungeValue>(d: Vector<V>) -> Vector<V> {
    Vector::new(-d.y, d.x, d.z)
}

/// `L`: push the cell 90 degrees to the left of the cursor's travel
/// direction, without turning.
fn peek_left<V, Space, Env>(
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
    let probe = ip.cursor.location + rotate_left(ip.cursor.delta);
    ip.push(space.get(probe));
    InstructionResult::Continue
}

/// `R`: the same, 90 degrees to the right.
fn peek_right<V, Space, Env>(
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
    let probe = ip.cursor.location + rotate_right(ip.cursor.delta);
    ip.push(space.get(probe));
    InstructionResult::Continue
}

fn increment<V, Space, Env>(
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
    ip.push(a + 1.into());
    InstructionResult::Continue
}

fn decrement<V, Space, Env>(
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
    ip.push(a - 1.into());
    InstructionResult::Continue
}

fn negate<V, Space, Env>(
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
    ip.push(-a);
    InstructionResult::Continue
}

/// `H`: pop `b`, pop `a`; shift `a` left by `b` bits if `b >= 0`, right
/// by `-b` bits otherwise.
fn shift<V, Space, Env>(
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
    let b = ip.pop().to_i64().unwrap_or(0);
    let a = ip.pop();
    ip.push(if b >= 0 {
        a << (b as u32)
    } else {
        a >> ((-b) as u32)
    });
    InstructionResult::Continue
}

/// `A`: pop `n`, pop `value`; push `value` back onto the stack `n`
/// times. Reflects if `n` is negative.
fn push_n_copies<V, Space, Env>(
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
    let value = ip.pop();
    if n < 0 {
        ip.reflect();
        return InstructionResult::Continue;
    }
    for _ in 0..n {
        ip.push(value);
    }
    InstructionResult::Continue
}

/// `B`: pop `b`, pop `a`; push `a+b`, then push `a-b`.
fn add_and_sub<V, Space, Env>(
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
    ip.push(a - b);
    InstructionResult::Continue
}

/// `E`: push the sum of every value currently on the stack.
fn stack_sum<V, Space, Env>(
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
    let total = ip.stack_stack[0]
        .iter()
        .copied()
        .fold(V::from(0i32), |acc, v| acc + v);
    ip.push(total);
    InstructionResult::Continue
}

/// `P`: push the product of every value currently on the stack.
fn stack_product<V, Space, Env>(
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
    let total = ip.stack_stack[0]
        .iter()
        .copied()
        .fold(V::from(1i32), |acc, v| acc * v);
    ip.push(total);
    InstructionResult::Continue
}

/// `Q`: pop a value, write it to the cell immediately behind the
/// cursor (the opposite of where it's travelling).
fn put_behind<V, Space, Env>(
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
    space.set(ip.cursor.location - ip.cursor.delta, v);
    InstructionResult::Continue
}

/// `T`: pop `d` (an axis number, 0/1/2), pop a boolean; set the delta
/// to the positive or negative unit vector on axis `d`. Reflects if
/// `d` isn't a live axis for this IP's dimensionality.
fn turn_to_axis<V, Space, Env>(
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
    let d = ip.pop().to_i64().unwrap_or(-1);
    let positive = ip.pop() != 0.into();
    if d < 0 || d as usize >= ip.dim.axes() {
        ip.reflect();
        return InstructionResult::Continue;
    }
    let mut delta = Vector::zero();
    let unit = if positive { 1.into() } else { (-1i32).into() };
    delta.set_axis(d as usize, unit);
    ip.cursor.delta = delta;
    InstructionResult::Continue
}

/// `U`: overwrite the cell under the cursor with a randomly chosen
/// direction character drawn from the delta characters valid for this
/// IP's dimensionality.
fn scatter_direction<V, Space, Env>(
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
    let choices: &[char] = match ip.dim.axes() {
        1 => &['<', '>'],
        2 => &['<', '>', '^', 'v'],
        _ => &['<', '>', '^', 'v', 'h', 'l'],
    };
    let pick = choices[rand::random::<usize>() % choices.len()];
    space.set(ip.cursor.location, (pick as i32).into());
    ip.cursor.invalidate();
    InstructionResult::Continue
}

/// `W`: pop a vector, pop a value; compare it against the cell at that
/// vector (storage-offset adjusted). If the cell is less than the
/// value, push the value and the vector back and back the cursor up
/// one step (so the comparison cell gets visited again once the value
/// there catches up); if greater, reflect; if equal, continue on.
fn watch_cell<V, Space, Env>(
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
    let vec = Vector::<V>::pop_vector(ip);
    let value = ip.pop();
    let actual = space.get(ip.storage_offset + vec);
    if actual < value {
        ip.push(value);
        Vector::<V>::push_vector(ip, vec);
        let back = ip.cursor.location - ip.cursor.delta;
        ip.cursor.location = back;
        ip.cursor.invalidate();
    } else if actual > value {
        ip.reflect();
    }
    InstructionResult::Continue
}

fn move_x<V, Space, Env>(
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
    ip.cursor.location.x = ip.cursor.location.x + 1.into();
    ip.cursor.invalidate();
    InstructionResult::Continue
}

fn move_y<V, Space, Env>(
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
    ip.cursor.location.y = ip.cursor.location.y + 1.into();
    ip.cursor.invalidate();
    InstructionResult::Continue
}

/// `Z`: as `X`/`Y`, but on the z-axis; reflects for unefunge/befunge IPs.
fn move_z<V, Space, Env>(
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
    if ip.dim.axes() < 3 {
        ip.reflect();
        return InstructionResult::Continue;
    }
    ip.cursor.location.z = ip.cursor.location.z + 1.into();
    ip.cursor.invalidate();
    InstructionResult::Continue
}

/// Shift an entire line of funge-space by `magnitude` cells along
/// `movement_direction` (a unit vector), using two lock-step cursors:
/// one reads from the old position, the other writes to the new one,
/// and cells vacated behind the moving line are cleared.
fn move_line<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    space: &mut Space,
    movement_direction: Vector<V>,
) where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
{
    let magnitude = ip.pop().to_i64().unwrap_or(0);
    if magnitude == 0 {
        return;
    }
    let steps = magnitude.abs();
    let dir = if magnitude > 0 {
        movement_direction
    } else {
        -movement_direction
    };
    let lo = space.min_idx();
    let hi = space.max_idx();
    let (axis, cross_axis) = if dir.x != 0.into() { (0usize, 1usize) } else { (1usize, 0usize) };
    let cross_lo = lo.axis(cross_axis).to_i64().unwrap_or(0);
    let cross_hi = hi.axis(cross_axis).to_i64().unwrap_or(0);
    let line_lo = lo.axis(axis).to_i64().unwrap_or(0);
    let line_hi = hi.axis(axis).to_i64().unwrap_or(0);
    for cross in cross_lo..=cross_hi {
        let range: Vec<i64> = if magnitude > 0 {
            (line_lo..=line_hi).rev().collect()
        } else {
            (line_lo..=line_hi).collect()
        };
        for pos in range {
            let mut src = Vector::zero();
            src.set_axis(axis, (pos as i32).into());
            src.set_axis(cross_axis, (cross as i32).into());
            let v = space.get(src);
            let mut dst = src;
            dst.set_axis(axis, ((pos + steps * if magnitude > 0 { 1 } else { -1 }) as i32).into());
            space.set(dst, v);
        }
        // clear the `steps` cells vacated at the trailing edge
        for k in 0..steps {
            let trailing = if magnitude > 0 { line_lo + k } else { line_hi - k };
            let mut cell = Vector::zero();
            cell.set_axis(axis, (trailing as i32).into());
            cell.set_axis(cross_axis, (cross as i32).into());
            space.set(cell, ' '.into());
        }
    }
}

fn move_line_east_west<V, Space, Env>(
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
    move_line(ip, space, Vector::x_axis(1.into()));
    InstructionResult::Continue
}

fn move_line_north_south<V, Space, Env>(
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
    move_line(ip, space, Vector::y_axis(1.into()));
    InstructionResult::Continue
}
