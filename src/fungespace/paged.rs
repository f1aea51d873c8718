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

use super::vector::Dimension;
use super::{FungeIndex, FungeSpace, FungeValue, Vector};

/// Cells per page, per axis. Pages are allocated lazily and dropped
/// once emptied back to all-spaces, so this mostly just trades hashmap
/// lookups for page-local array indexing.
const PAGE_SIZE: i64 = 32;

/// Side length of the "eden", a flat array cache over the rectangle
/// `x, y in [0, EDEN_SIZE)`, `z == 0` — the region almost every Funge-98
/// program's source actually lives in. Looking a cell up here skips the
/// hashmap entirely.
const EDEN_SIZE: i64 = 256;

fn div_floor(a: i64, b: i64) -> i64 {
    let d = a / b;
    let r = a % b;
    if (r != 0) && ((r < 0) != (b < 0)) {
        d - 1
    } else {
        d
    }
}

fn rem_floor(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

/// A page of `PAGE_SIZE^dims` cells, stored flat. `dims` tells the page
/// how many of x/y/z are actually used, so unefunge/befunge pages don't
/// allocate `PAGE_SIZE^3` cells they'll never touch.
struct Page<V> {
    cells: Vec<V>,
    dims: usize,
}

impl<V: FungeValue> Page<V> {
    fn new(dims: usize) -> Self {
        let n = (PAGE_SIZE as usize).pow(dims as u32);
        Self {
            cells: vec![' '.into(); n],
            dims,
        }
    }

    fn offset(&self, local: (i64, i64, i64)) -> usize {
        let (lx, ly, lz) = local;
        match self.dims {
            1 => lx as usize,
            2 => (ly * PAGE_SIZE + lx) as usize,
            _ => ((lz * PAGE_SIZE + ly) * PAGE_SIZE + lx) as usize,
        }
    }

    fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| *c == ' '.into())
    }
}

/// A sparse, in-principle-unbounded funge-space, backed by a hashmap of
/// fixed-size pages plus a direct-array "eden" cache for the common
/// case of small 2-D sources. This replaces the Stinkhorn original's
/// pointer-chasing octree-with-doubling-root: an arena of flat pages
/// is the idiomatic Rust analogue, generalized here to 3 dimensions.
pub struct PagedFungeSpace<Idx, V> {
    dim: Dimension,
    eden: Vec<V>,
    pages: HashMap<Idx, Page<V>>,
    min: Idx,
    max: Idx,
    any_cell: bool,
}

impl<V: FungeValue> PagedFungeSpace<Vector<V>, V> {
    pub fn new(dim: Dimension) -> Self {
        Self {
            dim,
            eden: vec![' '.into(); (EDEN_SIZE * EDEN_SIZE) as usize],
            pages: HashMap::new(),
            min: Vector::zero(),
            max: Vector::zero(),
            any_cell: false,
        }
    }

    fn in_eden(idx: &Vector<V>) -> Option<(usize, usize)> {
        let x = idx.x.to_i64()?;
        let y = idx.y.to_i64()?;
        let z = idx.z.to_i64()?;
        if z == 0 && (0..EDEN_SIZE).contains(&x) && (0..EDEN_SIZE).contains(&y) {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    fn page_key(&self, idx: &Vector<V>) -> Vector<V> {
        let x = idx.x.to_i64().unwrap_or(0);
        let y = idx.y.to_i64().unwrap_or(0);
        let z = idx.z.to_i64().unwrap_or(0);
        Vector::new(
            (div_floor(x, PAGE_SIZE) as i32).into(),
            (div_floor(y, PAGE_SIZE) as i32).into(),
            (div_floor(z, PAGE_SIZE) as i32).into(),
        )
    }

    /// Wrap each axis of `out` independently to the opposite edge of
    /// `[min, max]` when it falls outside that axis's range.
    fn clamp_axes(mut out: Vector<V>, min: Vector<V>, max: Vector<V>) -> Vector<V> {
        for n in 0..3 {
            if out.axis(n) > max.axis(n) {
                out.set_axis(n, min.axis(n));
            } else if out.axis(n) < min.axis(n) {
                out.set_axis(n, max.axis(n));
            }
        }
        out
    }

    fn local(&self, idx: &Vector<V>) -> (i64, i64, i64) {
        let x = idx.x.to_i64().unwrap_or(0);
        let y = idx.y.to_i64().unwrap_or(0);
        let z = idx.z.to_i64().unwrap_or(0);
        (
            rem_floor(x, PAGE_SIZE),
            rem_floor(y, PAGE_SIZE),
            rem_floor(z, PAGE_SIZE),
        )
    }

    fn update_bounds(&mut self, idx: Vector<V>) {
        if !self.any_cell {
            self.min = idx;
            self.max = idx;
            self.any_cell = true;
            return;
        }
        for n in 0..3 {
            if idx.axis(n) < self.min.axis(n) {
                self.min.set_axis(n, idx.axis(n));
            }
            if idx.axis(n) > self.max.axis(n) {
                self.max.set_axis(n, idx.axis(n));
            }
        }
    }
}

impl<V: FungeValue> FungeSpace<Vector<V>> for PagedFungeSpace<Vector<V>, V> {
    type Output = V;

    fn get(&self, idx: Vector<V>) -> V {
        if let Some((x, y)) = Self::in_eden(&idx) {
            return self.eden[y as usize * EDEN_SIZE as usize + x as usize];
        }
        let key = self.page_key(&idx);
        match self.pages.get(&key) {
            Some(page) => page.cells[page.offset(self.local(&idx))],
            None => ' '.into(),
        }
    }

    fn set(&mut self, idx: Vector<V>, v: V) {
        if v == ' '.into() {
            // Writing a space never needs to grow storage; if a page
            // exists, clear the cell in place and drop the page once
            // it's entirely space again, to bound memory use.
            if let Some((x, y)) = Self::in_eden(&idx) {
                self.eden[y as usize * EDEN_SIZE as usize + x as usize] = v;
                return;
            }
            let key = self.page_key(&idx);
            let local = self.local(&idx);
            let mut drop_page = false;
            if let Some(page) = self.pages.get_mut(&key) {
                let off = page.offset(local);
                page.cells[off] = v;
                drop_page = page.is_empty();
            }
            if drop_page {
                self.pages.remove(&key);
            }
            return;
        }
        if let Some((x, y)) = Self::in_eden(&idx) {
            self.eden[y as usize * EDEN_SIZE as usize + x as usize] = v;
        } else {
            let key = self.page_key(&idx);
            let local = self.local(&idx);
            let dims = self.dim.axes();
            let page = self.pages.entry(key).or_insert_with(|| Page::new(dims));
            let off = page.offset(local);
            page.cells[off] = v;
        }
        self.update_bounds(idx);
    }

    fn min_idx(&self) -> Vector<V> {
        self.min
    }

    fn max_idx(&self) -> Vector<V> {
        self.max
    }

    /// Lahey-space wraparound: walk one step in `delta`'s direction; on
    /// any axis where that step leaves the occupied bounding box, wrap
    /// to the opposite edge of the box on that axis. Every built-in
    /// motion instruction (`>`/`<`/`^`/`v`/`h`/`l`) uses an
    /// axis-aligned delta (exactly one nonzero component), for which
    /// per-axis wrap *is* the line the cursor is travelling along, so
    /// it's handled exactly below.
    fn move_by(&self, idx: Vector<V>, delta: Vector<V>) -> Vector<V> {
        if !self.any_cell {
            return idx + delta;
        }
        let out = idx + delta;
        let nonzero_axes = (0..3).filter(|&n| delta.axis(n) != 0.into()).count();
        if nonzero_axes <= 1 {
            return Self::clamp_axes(out, self.min, self.max);
        }
        // `x` can set an arbitrary multi-axis delta, so the cursor may
        // be travelling along a genuine diagonal. Wrapping each axis
        // independently (as above) would step off that line entirely,
        // so instead shift `out` backward by whole multiples of
        // `delta` -- staying on the same line -- until every axis
        // `delta` touches is back inside the box. If the box's extent
        // on some axis isn't a multiple of that axis's component of
        // `delta`, the uniform shift can leave a residual axis out of
        // range; fall back to clamping that axis independently, same
        // as the cardinal case, rather than looping indefinitely.
        let mut k: i64 = 0;
        for n in 0..3 {
            let d = delta.axis(n).to_i64().unwrap_or(0);
            if d == 0 {
                continue;
            }
            let o = out.axis(n).to_i64().unwrap_or(0);
            let lo = self.min.axis(n).to_i64().unwrap_or(0);
            let hi = self.max.axis(n).to_i64().unwrap_or(0);
            if d > 0 && o > hi {
                k = k.max((o - hi + d - 1) / d);
            } else if d < 0 && o < lo {
                let nd = -d;
                k = k.max((lo - o + nd - 1) / nd);
            }
        }
        let shifted = out - delta * V::from(k as i32);
        Self::clamp_axes(shifted, self.min, self.max)
    }

    fn load_src(&mut self, start: Vector<V>, src: &[u8], _dim: Dimension) -> Vector<V> {
        let col = start.x;
        let row_start_y = start.y;
        let mut pos = start;
        let mut furthest = start;
        let mut i = 0;
        while i < src.len() {
            let b = src[i];
            match b {
                b'\n' => {
                    pos.x = col;
                    pos.y = pos.y + 1.into();
                    i += 1;
                    continue;
                }
                b'\r' => {
                    if i + 1 < src.len() && src[i + 1] == b'\n' {
                        i += 1;
                    }
                    pos.x = col;
                    pos.y = pos.y + 1.into();
                    i += 1;
                    continue;
                }
                0x0c => {
                    // form feed: next plane (trefunge source files only)
                    pos.x = col;
                    pos.y = row_start_y;
                    pos.z = pos.z + 1.into();
                    i += 1;
                    continue;
                }
                b' ' => {
                    // space does not overwrite: leave any existing cell
                    // untouched, just advance.
                }
                _ => {
                    self.set(pos, (b as i32).into());
                }
            }
            if pos.x > furthest.x {
                furthest.x = pos.x;
            }
            if pos.y > furthest.y {
                furthest.y = pos.y;
            }
            if pos.z > furthest.z {
                furthest.z = pos.z;
            }
            pos.x = pos.x + 1.into();
            i += 1;
        }
        furthest
    }
}

impl<V: FungeValue> PagedFungeSpace<Vector<V>, V> {
    pub fn dimension(&self) -> Dimension {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> PagedFungeSpace<Vector<i64>, i64> {
        PagedFungeSpace::new(Dimension::Be)
    }

    #[test]
    fn set_get_roundtrip() {
        let mut sp = space();
        let idx = Vector::new(3i64, 4, 0);
        sp.set(idx, 'X' as i64);
        assert_eq!(sp.get(idx), 'X' as i64);
        assert_eq!(sp.get(Vector::new(0, 0, 0)), ' ' as i64);
    }

    #[test]
    fn out_of_eden_roundtrip() {
        let mut sp = space();
        let idx = Vector::new(1000i64, -500, 0);
        sp.set(idx, '@' as i64);
        assert_eq!(sp.get(idx), '@' as i64);
    }

    #[test]
    fn wraps_at_bounds() {
        let mut sp = space();
        sp.set(Vector::new(0i64, 0, 0), 'a' as i64);
        sp.set(Vector::new(5i64, 0, 0), 'b' as i64);
        let wrapped = sp.move_by(Vector::new(5i64, 0, 0), Vector::new(1, 0, 0));
        assert_eq!(wrapped, Vector::new(0, 0, 0));
    }

    #[test]
    fn load_src_basic() {
        let mut sp = space();
        sp.load_src(Vector::zero(), b"12\n34", Dimension::Be);
        assert_eq!(sp.get(Vector::new(0, 0, 0)), '1' as i64);
        assert_eq!(sp.get(Vector::new(1, 0, 0)), '2' as i64);
        assert_eq!(sp.get(Vector::new(0, 1, 0)), '3' as i64);
        assert_eq!(sp.get(Vector::new(1, 1, 0)), '4' as i64);
    }
}
