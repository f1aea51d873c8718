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

//! Funge-space: the sparse, (in principle) unbounded grid that a Funge-98
//! program lives in, plus the traits that let the rest of the crate stay
//! generic over cell type and storage strategy.

pub mod paged;
pub mod vector;

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub};

use num::ToPrimitive;

pub use paged::PagedFungeSpace;
pub use vector::{Dimension, Vector};

/// Bound required of a funge-space cell value: a signed integer-like
/// type cheap enough to copy and rich enough to do modular arithmetic,
/// bit-twiddling and `char` conversion on.
pub trait FungeValue:
    Copy
    + Clone
    + Debug
    + Default
    + Eq
    + Ord
    + Hash
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
    + Neg<Output = Self>
    + Not<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + From<i32>
    + From<char>
    + ToPrimitive
    + 'static
{
    fn to_char(&self) -> char;
}

impl FungeValue for i32 {
    fn to_char(&self) -> char {
        char::from_u32(*self as u32).unwrap_or('\u{fffd}')
    }
}

impl FungeValue for i64 {
    fn to_char(&self) -> char {
        char::from_u32(*self as u32).unwrap_or('\u{fffd}')
    }
}

/// A multi-dimensional funge-space index. Always a [`Vector`] in this
/// crate, but kept as a trait so that the rest of the code speaks in
/// terms of "an index", not "a Vector", when naming `Idx`.
pub trait FungeIndex: Copy + Eq + PartialOrd + Debug + 'static {
    type Scalar: FungeValue;

    fn zero() -> Self;
    fn axis(&self, n: usize) -> Self::Scalar;
    fn set_axis(&mut self, n: usize, v: Self::Scalar);

    /// Manhattan (taxicab) distance between two points, used to rank
    /// candidate wrap targets when searching for Lahey-space bounds.
    fn taxicab_distance(&self, other: &Self) -> i64;
}

impl<T: FungeValue> FungeIndex for Vector<T> {
    type Scalar = T;

    fn zero() -> Self {
        Vector::zero()
    }
    fn axis(&self, n: usize) -> T {
        Vector::axis(self, n)
    }
    fn set_axis(&mut self, n: usize, v: T) {
        Vector::set_axis(self, n, v)
    }
    fn taxicab_distance(&self, other: &Self) -> i64 {
        let dx = (self.x.to_i64().unwrap_or(0) - other.x.to_i64().unwrap_or(0)).abs();
        let dy = (self.y.to_i64().unwrap_or(0) - other.y.to_i64().unwrap_or(0)).abs();
        let dz = (self.z.to_i64().unwrap_or(0) - other.z.to_i64().unwrap_or(0)).abs();
        dx + dy + dz
    }
}

/// An index type usable as an array/page key: must additionally be
/// hashable, since paged storage keys pages by (index / page size).
pub trait FungeArrayIdx: FungeIndex + Hash {}
impl<T: FungeValue> FungeArrayIdx for Vector<T> {}

/// The funge-space trait: a sparse grid of cells, addressable by
/// [`FungeIndex`], with Lahey-space wraparound motion and the bounding
/// box bookkeeping that `p`/`g`/`?` and friends rely on.
pub trait FungeSpace<Idx: FungeIndex> {
    type Output: FungeValue;

    /// Read a cell, returning the space character if never written.
    fn get(&self, idx: Idx) -> Self::Output;
    /// Write a cell. Writing the space character removes it from
    /// storage, matching the Funge-98 "space means unused" convention.
    fn set(&mut self, idx: Idx, v: Self::Output);

    /// Smallest occupied coordinate seen on each axis so far (the
    /// corner `p`/`g` treat as `(0,0,0)` in Lahey-space terms).
    fn min_idx(&self) -> Idx;
    /// Largest occupied coordinate seen on each axis so far.
    fn max_idx(&self) -> Idx;

    /// Move from `idx` by `delta`, wrapping at the edges of the
    /// occupied rectangle/box per the Lahey-space algorithm.
    fn move_by(&self, idx: Idx, delta: Idx) -> Idx;

    /// Load a block of source text into funge-space starting at
    /// `start`, per the `load` byte rules (space does not overwrite,
    /// `\r`/`\r\n`/`\n` all terminate a line).
    fn load_src(&mut self, start: Idx, src: &[u8], dim: Dimension) -> Idx;

    /// The critical search primitive used by cursor advance: starting
    /// at `idx`, repeatedly hop by `delta` (each hop already wraps at
    /// the occupied bounding box, per [`FungeSpace::move_by`]) until a
    /// non-space cell is found. Returns `None` -- the IP is trapped --
    /// if no non-space cell turns up within twice the bounding box's
    /// taxicab diagonal, which bounds how many hops a single pass
    /// around a wrapped line can take before it must have revisited
    /// its start.
    fn advance_cursor(&self, idx: Idx, delta: Idx) -> Option<Idx> {
        if delta == Idx::zero() {
            return if self.get(idx) != ' '.into() {
                Some(idx)
            } else {
                None
            };
        }
        let bound = 2 * self.min_idx().taxicab_distance(&self.max_idx()) + 4;
        let mut pos = idx;
        let mut steps: i64 = 0;
        loop {
            pos = self.move_by(pos, delta);
            if self.get(pos) != ' '.into() {
                return Some(pos);
            }
            steps += 1;
            if steps > bound {
                return None;
            }
        }
    }
}

/// File-IO helper trait for the `i`/`o` instructions: converting
/// between a rectangular region of funge-space and a flat byte buffer,
/// authored from the `load`/`store` byte rules Funge-98 defines for
/// source files.
pub trait SrcIO<Space> {
    /// Read a rectangular region as Funge-98 "linear text file" bytes:
    /// newline after every row (0gnirts-style bytes, one row per line,
    /// for befunge/trefunge "sub-space text" semantics), or as one flat
    /// run for unefunge.
    fn get_src_str(space: &Space, start: Self, size: Self) -> String;
    /// Read a rectangular region as a flat binary buffer in row-major
    /// (x fastest, then y, then z) order, with no separators at all.
    fn get_src_bin(space: &Space, start: Self, size: Self) -> Vec<u8>;
    /// Write bytes into a rectangular region starting at `start`. When
    /// `linear` is true, `\n` advances to the start of the next row
    /// (text-file semantics); when false, bytes are laid out in flat
    /// row-major order (binary semantics). Existing cells not covered
    /// by `buf` are left untouched.
    fn put_src(space: &mut Space, start: Self, size: Self, buf: &[u8], linear: bool);
}

impl<T, Space> SrcIO<Space> for Vector<T>
where
    T: FungeValue,
    Space: FungeSpace<Vector<T>, Output = T>,
{
    fn get_src_str(space: &Space, start: Self, size: Self) -> String {
        let mut out = String::new();
        for z in 0..size.z.to_i64().unwrap_or(1).max(1) {
            for y in 0..size.y.to_i64().unwrap_or(1).max(1) {
                for x in 0..size.x.to_i64().unwrap_or(1).max(1) {
                    let idx = Vector::new(
                        start.x + (x as i32).into(),
                        start.y + (y as i32).into(),
                        start.z + (z as i32).into(),
                    );
                    out.push(space.get(idx).to_char());
                }
                out.push('\n');
            }
        }
        out
    }

    fn get_src_bin(space: &Space, start: Self, size: Self) -> Vec<u8> {
        let mut out = Vec::new();
        for z in 0..size.z.to_i64().unwrap_or(1).max(1) {
            for y in 0..size.y.to_i64().unwrap_or(1).max(1) {
                for x in 0..size.x.to_i64().unwrap_or(1).max(1) {
                    let idx = Vector::new(
                        start.x + (x as i32).into(),
                        start.y + (y as i32).into(),
                        start.z + (z as i32).into(),
                    );
                    out.push(space.get(idx).to_i64().unwrap_or(0) as u8);
                }
            }
        }
        out
    }

    fn put_src(space: &mut Space, start: Self, size: Self, buf: &[u8], linear: bool) {
        let width = size.x.to_i64().unwrap_or(1).max(1);
        let height = size.y.to_i64().unwrap_or(1).max(1);
        let mut x = 0i64;
        let mut y = 0i64;
        for &b in buf {
            if linear && b == b'\n' {
                x = 0;
                y += 1;
                continue;
            }
            if x < width && y < height {
                let idx = Vector::new(
                    start.x + (x as i32).into(),
                    start.y + (y as i32).into(),
                    start.z,
                );
                space.set(idx, (b as i32).into());
            }
            x += 1;
            if !linear && x >= width {
                x = 0;
                y += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_is_funge_index() {
        let v: Vector<i32> = FungeIndex::zero();
        assert_eq!(v, Vector::new(0, 0, 0));
    }

    #[test]
    fn taxicab() {
        let a = Vector::new(0i32, 0, 0);
        let b = Vector::new(3i32, -4, 0);
        assert_eq!(a.taxicab_distance(&b), 7);
    }
}
