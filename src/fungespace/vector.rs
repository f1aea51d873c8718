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

use std::cmp::Ordering;
use std::convert::From;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, BitAnd, Div, Mul, Neg, Shr, Sub, SubAssign};

use super::FungeValue;

/// How many axes an interpreter/IP is actually using.
///
/// Rather than a scalar index type for unefunge and a dedicated 2-D
/// vector type for befunge, this crate uses a single [`Vector`] for
/// all three dimensionalities and keeps
/// track of how many axes are "live" here. Instructions that only make
/// sense in 2 or 3 dimensions (`^v`, `hlm`, ...) are simply never
/// registered in the instruction table for lower dimensions; the
/// `z`/`y` components of a `Vector` still exist and read as zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    Uni,
    Be,
    Tre,
}

impl Dimension {
    pub fn axes(self) -> usize {
        match self {
            Dimension::Uni => 1,
            Dimension::Be => 2,
            Dimension::Tre => 3,
        }
    }
}

/// A position or delta in funge-space, with up to 3 axes.
///
/// `z` is always present (and defaults to 0) so that one `Vector` type
/// and one `FungeSpace` implementation cover unefunge, befunge, and
/// trefunge alike.
#[derive(Clone, Copy, Debug, Default)]
pub struct Vector<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vector<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: FungeValue> Vector<T> {
    pub fn zero() -> Self {
        Self {
            x: 0.into(),
            y: 0.into(),
            z: 0.into(),
        }
    }

    pub fn x_axis(x: T) -> Self {
        Self {
            x,
            y: 0.into(),
            z: 0.into(),
        }
    }

    pub fn y_axis(y: T) -> Self {
        Self {
            x: 0.into(),
            y,
            z: 0.into(),
        }
    }

    pub fn z_axis(z: T) -> Self {
        Self {
            x: 0.into(),
            y: 0.into(),
            z,
        }
    }

    /// The component on the given axis (0 = x, 1 = y, 2 = z).
    pub fn axis(&self, n: usize) -> T {
        match n {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("funge-space only has 3 axes"),
        }
    }

    pub fn set_axis(&mut self, n: usize, v: T) {
        match n {
            0 => self.x = v,
            1 => self.y = v,
            2 => self.z = v,
            _ => panic!("funge-space only has 3 axes"),
        }
    }
}

impl<T: PartialEq> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}
impl<T: Eq> Eq for Vector<T> {}

// Pages are keyed by (address >> log2(page size)) in a hashmap, so the
// index type has to be hashable alongside being orderable.
impl<T: Hash> Hash for Vector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
        self.z.hash(state);
    }
}

impl<T: FungeValue> Add for Vector<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: FungeValue> AddAssign for Vector<T> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: FungeValue> Sub for Vector<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: FungeValue> SubAssign for Vector<T> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: FungeValue> Neg for Vector<T> {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Scalar multiplication, used by `t` (split) to flip a delta and by
/// the Lahey-wrap search to step a parametric line forward/backward by
/// a distance in one multiply instead of a loop of adds.
impl<T: FungeValue> Mul<T> for Vector<T> {
    type Output = Self;
    fn mul(self, rhs: T) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Component-wise integer division, used by `TOYS`' vector ops.
impl<T: FungeValue> Div<T> for Vector<T> {
    type Output = Self;
    fn div(self, rhs: T) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Component-wise right shift, the "bitshift" operation on vectors.
impl<T: FungeValue> Shr<u32> for Vector<T> {
    type Output = Self;
    fn shr(self, rhs: u32) -> Self {
        Self::new(self.x >> rhs, self.y >> rhs, self.z >> rhs)
    }
}

/// Component-wise bitmask, the "bitmask" operation on vectors.
impl<T: FungeValue> BitAnd<T> for Vector<T> {
    type Output = Self;
    fn bitand(self, rhs: T) -> Self {
        Self::new(self.x & rhs, self.y & rhs, self.z & rhs)
    }
}

impl<T: FungeValue> From<(T, T)> for Vector<T> {
    fn from(t: (T, T)) -> Self {
        Self::new(t.0, t.1, 0.into())
    }
}

impl<T: FungeValue> From<(T, T, T)> for Vector<T> {
    fn from(t: (T, T, T)) -> Self {
        Self::new(t.0, t.1, t.2)
    }
}

/// Lexicographic ordering on (z, y, x), used to canonicalise the two
/// corners of a bounding box and to find the "first" cell for `[`-style
/// scans, extended with z.
impl<T: PartialOrd> PartialOrd for Vector<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.z.partial_cmp(&other.z) {
            Some(Ordering::Equal) => match self.y.partial_cmp(&other.y) {
                Some(Ordering::Equal) => self.x.partial_cmp(&other.x),
                other => other,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub() {
        let a = Vector::new(1i64, 2, 3);
        let b = Vector::new(10i64, 20, 30);
        assert_eq!(a + b, Vector::new(11, 22, 33));
        assert_eq!(b - a, Vector::new(9, 18, 27));
    }

    #[test]
    fn axes() {
        assert_eq!(Dimension::Uni.axes(), 1);
        assert_eq!(Dimension::Be.axes(), 2);
        assert_eq!(Dimension::Tre.axes(), 3);
    }
}
