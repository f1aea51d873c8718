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

use rand::Rng;

use crate::fungespace::{FungeSpace, FungeValue, Vector};

use super::InstructionPointer;
use super::InterpreterEnv;

/// Motion-related instructions, generalised over dimensionality. One
/// impl covers `Vector<T>` regardless of how many of its axes are
/// actually in play; `ip.dim` decides which of `^`/`v`/`h`/`l` are
/// legal rather than a separate type per dimension.
pub trait MotionCmds<Space, Env>
where
    Space: FungeSpace<Self, Output = <Self as MotionCmds<Space, Env>>::Output>,
    Env: InterpreterEnv,
    Self: Sized + Copy,
{
    type Output: FungeValue;

    fn pop_vector(ip: &mut InstructionPointer<Self, Space, Env>) -> Self;
    fn push_vector(ip: &mut InstructionPointer<Self, Space, Env>, v: Self);

    fn go_east(ip: &mut InstructionPointer<Self, Space, Env>);
    fn go_west(ip: &mut InstructionPointer<Self, Space, Env>);
    fn go_north(ip: &mut InstructionPointer<Self, Space, Env>);
    fn go_south(ip: &mut InstructionPointer<Self, Space, Env>);
    fn go_high(ip: &mut InstructionPointer<Self, Space, Env>);
    fn go_low(ip: &mut InstructionPointer<Self, Space, Env>);

    fn turn_left(ip: &mut InstructionPointer<Self, Space, Env>);
    fn turn_right(ip: &mut InstructionPointer<Self, Space, Env>);

    fn go_away(ip: &mut InstructionPointer<Self, Space, Env>, rng: &mut dyn RngCore98);
}

/// Minimal object-safe RNG interface so `go_away` doesn't force a
/// concrete `rand::Rng` implementation on every caller.
pub trait RngCore98 {
    fn gen_range_usize(&mut self, bound: usize) -> usize;
}

pub struct ThreadRng98;
impl RngCore98 for ThreadRng98 {
    fn gen_range_usize(&mut self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

impl<Space, Env, V> MotionCmds<Space, Env> for Vector<V>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Env: InterpreterEnv,
{
    type Output = V;

    fn pop_vector(ip: &mut InstructionPointer<Self, Space, Env>) -> Self {
        // Funge-98 vectors are pushed y-then-x (x on top), or
        // z-then-y-then-x in trefunge, so they pop x, then y, then z.
        let x = ip.pop();
        let y = ip_pop_if(ip, 1);
        let z = ip_pop_if(ip, 2);
        Vector::new(x, y, z)
    }

    fn push_vector(ip: &mut InstructionPointer<Self, Space, Env>, v: Self) {
        if ip.dim.axes() >= 3 {
            ip.push(v.z);
        }
        if ip.dim.axes() >= 2 {
            ip.push(v.y);
        }
        ip.push(v.x);
    }

    fn go_east(ip: &mut InstructionPointer<Self, Space, Env>) {
        ip.cursor.delta = Vector::x_axis(1.into());
    }
    fn go_west(ip: &mut InstructionPointer<Self, Space, Env>) {
        ip.cursor.delta = Vector::x_axis((-1).into());
    }
    fn go_north(ip: &mut InstructionPointer<Self, Space, Env>) {
        ip.cursor.delta = Vector::y_axis((-1).into());
    }
    fn go_south(ip: &mut InstructionPointer<Self, Space, Env>) {
        ip.cursor.delta = Vector::y_axis(1.into());
    }
    fn go_high(ip: &mut InstructionPointer<Self, Space, Env>) {
        ip.cursor.delta = Vector::z_axis(1.into());
    }
    fn go_low(ip: &mut InstructionPointer<Self, Space, Env>) {
        ip.cursor.delta = Vector::z_axis((-1).into());
    }

    fn turn_left(ip: &mut InstructionPointer<Self, Space, Env>) {
        let d = ip.cursor.delta;
        ip.cursor.delta = Vector::new(d.y, -d.x, d.z);
    }
    fn turn_right(ip: &mut InstructionPointer<Self, Space, Env>) {
        let d = ip.cursor.delta;
        ip.cursor.delta = Vector::new(-d.y, d.x, d.z);
    }

    fn go_away(ip: &mut InstructionPointer<Self, Space, Env>, rng: &mut dyn RngCore98) {
        let choices: &[fn(&mut InstructionPointer<Self, Space, Env>)] = match ip.dim.axes() {
            1 => &[Self::go_east, Self::go_west],
            2 => &[Self::go_east, Self::go_west, Self::go_north, Self::go_south],
            _ => &[
                Self::go_east,
                Self::go_west,
                Self::go_north,
                Self::go_south,
                Self::go_high,
                Self::go_low,
            ],
        };
        let pick = choices[rng.gen_range_usize(choices.len())];
        pick(ip);
    }
}

/// Helper for `pop_vector`: only pop an extra axis component if the
/// IP's dimensionality actually uses it, else read as zero.
fn ip_pop_if<Space, Env, V>(ip: &mut InstructionPointer<Vector<V>, Space, Env>, axis: usize) -> V
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Env: InterpreterEnv,
{
    if ip.dim.axes() > axis {
        ip.pop()
    } else {
        0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fungespace::{Dimension, PagedFungeSpace};
    use crate::interpreter::InstructionPointer;
    use crate::NoEnv;

    #[test]
    fn turn_right_rotates_east_to_south() {
        let mut ip: InstructionPointer<Vector<i64>, PagedFungeSpace<Vector<i64>, i64>, NoEnv> =
            InstructionPointer::new(Dimension::Be);
        ip.cursor.delta = Vector::x_axis(1);
        Vector::<i64>::turn_right(&mut ip);
        assert_eq!(ip.cursor.delta, Vector::y_axis(1));
    }
}
