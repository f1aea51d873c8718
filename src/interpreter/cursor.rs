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

use crate::fungespace::{FungeSpace, FungeValue, Vector};

/// Position + delta + the value last read there, bundled together so a
/// step doesn't need to separately track "where am I" and "where do I
/// go next". Keeps a small cache of the last read so fingerprint code
/// and the scheduler can cheaply ask "what's under me" without
/// re-deriving it from `space` on every call.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<V: FungeValue> {
    pub location: Vector<V>,
    pub delta: Vector<V>,
    last_read: Option<V>,
}

impl<V: FungeValue> Cursor<V> {
    pub fn new(location: Vector<V>, delta: Vector<V>) -> Self {
        Self {
            location,
            delta,
            last_read: None,
        }
    }

    /// Advance the cursor by its current delta, wrapping in Lahey-space
    /// as `space` dictates, and invalidate the read cache.
    pub fn step<Space: FungeSpace<Vector<V>, Output = V>>(&mut self, space: &Space) {
        self.location = space.move_by(self.location, self.delta);
        self.last_read = None;
    }

    pub fn reverse(&mut self) {
        self.delta = -self.delta;
    }

    /// Glide past every space cell (the defining Funge-98 movement rule
    /// -- Befunge-93's space is a no-op *instruction*; Funge-98's is
    /// invisible to the IP), treating a `;...;` bracket as part of the
    /// same glide when `follow_teleports` is set. Returns `false` --
    /// the IP is trapped -- when no non-space cell is reachable at all.
    pub fn advance<Space: FungeSpace<Vector<V>, Output = V>>(
        &mut self,
        space: &Space,
        follow_teleports: bool,
    ) -> bool {
        loop {
            match space.advance_cursor(self.location, self.delta) {
                None => return false,
                Some(pos) => {
                    self.location = pos;
                    self.last_read = None;
                }
            }
            if follow_teleports && self.peek(space) == ';'.into() {
                loop {
                    match space.advance_cursor(self.location, self.delta) {
                        None => return false,
                        Some(pos) => {
                            self.location = pos;
                            self.last_read = None;
                        }
                    }
                    if self.peek(space) == ';'.into() {
                        break;
                    }
                }
                // Land past the closing `;` and keep gliding from there
                // (it may be immediately followed by more space, or by
                // another `;...;` pair).
                continue;
            }
            return true;
        }
    }

    /// The value currently under the cursor, reading through `space`
    /// and caching the result until the next `step`.
    pub fn peek<Space: FungeSpace<Vector<V>, Output = V>>(&mut self, space: &Space) -> V {
        if let Some(v) = self.last_read {
            return v;
        }
        let v = space.get(self.location);
        self.last_read = Some(v);
        v
    }

    pub fn invalidate(&mut self) {
        self.last_read = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fungespace::{Dimension, PagedFungeSpace};

    #[test]
    fn step_and_peek() {
        let mut sp: PagedFungeSpace<Vector<i64>, i64> = PagedFungeSpace::new(Dimension::Be);
        sp.set(Vector::new(1, 0, 0), 'x' as i64);
        let mut cur = Cursor::new(Vector::zero(), Vector::x_axis(1));
        assert_eq!(cur.peek(&sp), ' ' as i64);
        cur.step(&sp);
        assert_eq!(cur.location, Vector::new(1, 0, 0));
        assert_eq!(cur.peek(&sp), 'x' as i64);
    }
}
