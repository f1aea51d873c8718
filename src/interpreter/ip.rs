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

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::fungespace::{Dimension, FungeSpace, FungeValue, Vector};

use super::cursor::Cursor;
use super::fingerprints::FingerprintState;
use super::instruction_set::InstructionSet;

/// A single stack in the stack-stack. Index 0 is the top of stack.
pub type FungeStack<V> = Vec<V>;

/// One running thread of execution: position, delta, the stack-stack,
/// storage offset, and all per-IP fingerprint state. Carries a runtime
/// `Dimension` alongside a 3-axis `Vector` so one `InstructionPointer`
/// covers Unefunge/Befunge/Trefunge instead of one type per dimension.
pub struct InstructionPointer<Idx, Space, Env> {
    pub id: i32,
    pub dim: Dimension,
    /// Set when `--befunge-93` restricts this IP to Base93-only
    /// semantics: no Base98 instructions, and `/`/`%` by zero ask the
    /// user instead of pushing 0.
    pub base93_only: bool,
    pub cursor: Cursor<<Space as FungeSpace<Idx>>::Output>,
    pub storage_offset: Idx,
    /// One saved storage offset per block currently open via `{`,
    /// restored by the matching `}`.
    offset_stack: Vec<Idx>,
    /// `stack_stack[0]` is the TOSS (top of stack stack); higher
    /// indices are older, pushed-under stacks (SOSS, SOSSOSS, ...).
    pub stack_stack: Vec<FungeStack<<Space as FungeSpace<Idx>>::Output>>,
    /// "Invert" mode flag: while set, `push` inserts at the bottom of
    /// the TOSS instead of the top. Toggled by fingerprints (no base
    /// instruction sets it); kept here rather than per-stack since
    /// it's stack-*stack*-wide state, not a property of one stack.
    pub invert_mode: bool,
    /// "Queue" mode flag: while set, `pop` removes from the bottom of
    /// the TOSS instead of the top.
    pub queue_mode: bool,
    pub string_mode: bool,
    /// Set the first time a run of spaces is seen while in string
    /// mode; cleared the next time a non-space cell is seen. Drives
    /// the space-folding rule in the thread step (a run of spaces in
    /// string mode contributes a single space to the stack).
    pub string_mode_just_saw_space: bool,
    /// Set by the `t` instruction; consumed and cleared by the
    /// scheduler after each step, which does the actual IP cloning.
    pub requests_split: bool,
    pub instructions: InstructionSet<Idx, Space, Env>,
    pub fingerprints: FingerprintState<Idx, Space, Env>,
    pub dead: bool,
    /// Scratch storage fingerprints use to keep state across calls
    /// (e.g. REFC's reference list), keyed by a fingerprint-chosen
    /// name so unrelated fingerprints can't collide by accident.
    pub private_data: HashMap<String, Rc<dyn Any>>,
}

impl<V, Space, Env> InstructionPointer<Vector<V>, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
{
    pub fn new(dim: Dimension) -> Self {
        Self::new_with_mode(dim, false)
    }

    /// As [`InstructionPointer::new`], but with `--befunge-93`'s
    /// Base93-only restriction applied (or not) explicitly.
    pub fn new_with_mode(dim: Dimension, base93_only: bool) -> Self {
        Self {
            id: 0,
            dim,
            base93_only,
            cursor: Cursor::new(Vector::zero(), Vector::x_axis(1.into())),
            storage_offset: Vector::zero(),
            offset_stack: Vec::new(),
            stack_stack: vec![Vec::new()],
            invert_mode: false,
            queue_mode: false,
            string_mode: false,
            string_mode_just_saw_space: false,
            requests_split: false,
            instructions: InstructionSet::new(dim, base93_only),
            fingerprints: FingerprintState::new(),
            dead: false,
            private_data: HashMap::new(),
        }
    }

    /// Push a value onto the TOSS. In invert-mode, this inserts at the
    /// bottom instead of appending at the top.
    pub fn push(&mut self, v: V) {
        if self.invert_mode {
            self.stack_stack[0].insert(0, v);
        } else {
            self.stack_stack[0].push(v);
        }
    }

    /// Pop a value off the TOSS; an empty stack yields 0. In
    /// queue-mode, pops from the bottom instead of the top.
    pub fn pop(&mut self) -> V {
        if self.queue_mode {
            if self.stack_stack[0].is_empty() {
                0.into()
            } else {
                self.stack_stack[0].remove(0)
            }
        } else {
            self.stack_stack[0].pop().unwrap_or_else(|| 0.into())
        }
    }

    /// The value `pop` would return, without removing it.
    pub fn peek(&self) -> V {
        let s = &self.stack_stack[0];
        if self.queue_mode {
            *s.first().unwrap_or(&0.into())
        } else {
            *s.last().unwrap_or(&0.into())
        }
    }

    pub fn clear_stack(&mut self) {
        self.stack_stack[0].clear();
    }

    /// Pop a 0gnirts (null-terminated reversed string) off the TOSS.
    pub fn pop_0gnirts(&mut self) -> Vec<V> {
        let mut out = Vec::new();
        loop {
            let c = self.pop();
            if c == 0.into() {
                break;
            }
            out.push(c);
        }
        out
    }

    /// Push a string as a 0gnirts: a trailing 0, then the bytes in
    /// reverse order, so popping them back off reads forwards.
    pub fn push_0gnirts(&mut self, s: &[u8]) {
        self.push(0.into());
        for &b in s.iter().rev() {
            self.push((b as i32).into());
        }
    }

    /// `r`: reverse direction of travel.
    pub fn reflect(&mut self) {
        self.cursor.reverse();
    }

    /// `{`: push a new stack, transferring `n` values from the old
    /// TOSS (now SOSS) onto the new one. Negative `n` instead pushes
    /// `|n|` zeroes onto the SOSS.
    pub fn begin_block(&mut self, n: i64, storage_offset: Vector<V>)
    where
        V: FungeValue,
    {
        let mut new_stack = Vec::new();
        if n > 0 {
            let soss = &mut self.stack_stack[0];
            let len = soss.len();
            let take = n as usize;
            if take <= len {
                new_stack = soss.split_off(len - take);
            } else {
                // fewer than n values available: pad the *bottom* of
                // the saved block with zeroes first, keeping the
                // elements actually taken from the SOSS in their
                // original order so the old top stays on top.
                let missing = take - len;
                new_stack = soss.drain(..).collect();
                let mut padded = vec![0.into(); missing];
                padded.extend(new_stack);
                new_stack = padded;
            }
        } else if n < 0 {
            let zeroes = (-n) as usize;
            self.stack_stack[0].extend(std::iter::repeat(0.into()).take(zeroes));
        }
        self.stack_stack.insert(0, new_stack);
        self.offset_stack.push(self.storage_offset);
        self.storage_offset = storage_offset;
    }

    /// `}`: pop the current stack, transferring `n` values back onto
    /// the (newly exposed) TOSS. Reflects if there is no SOSS to
    /// return to.
    pub fn end_block(&mut self, n: i64) -> bool {
        if self.stack_stack.len() < 2 {
            return false;
        }
        let mut old_toss = self.stack_stack.remove(0);
        if n > 0 {
            let take = (n as usize).min(old_toss.len());
            let transferred = old_toss.split_off(old_toss.len() - take);
            self.stack_stack[0].extend(transferred);
        } else if n < 0 {
            let zeroes = (-n) as usize;
            let new_len = self.stack_stack[0].len().saturating_sub(zeroes);
            self.stack_stack[0].truncate(new_len);
        }
        if let Some(prev_offset) = self.offset_stack.pop() {
            self.storage_offset = prev_offset;
        }
        true
    }

    /// `u`: move `count` values between SOSS and TOSS (direction and
    /// sign per the `u` instruction's own definition).
    pub fn stack_under_stack(&mut self, count: i64) -> bool {
        if self.stack_stack.len() < 2 {
            return false;
        }
        if count > 0 {
            for _ in 0..count {
                let v = self.stack_stack[1].pop().unwrap_or_else(|| 0.into());
                self.stack_stack[0].push(v);
            }
        } else {
            for _ in 0..(-count) {
                let v = self.stack_stack[0].pop().unwrap_or_else(|| 0.into());
                self.stack_stack[1].push(v);
            }
        }
        true
    }
}

// Written by hand for the same reason as `InstructionSet`'s Clone impl:
// `t` forks an IP by cloning it, but `Space`/`Env` (e.g. a `CmdLineEnv`
// holding file handles) have no business being `Clone` themselves.
impl<V, Space, Env> Clone for InstructionPointer<Vector<V>, Space, Env>
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            dim: self.dim,
            base93_only: self.base93_only,
            cursor: self.cursor,
            storage_offset: self.storage_offset,
            offset_stack: self.offset_stack.clone(),
            stack_stack: self.stack_stack.clone(),
            invert_mode: self.invert_mode,
            queue_mode: self.queue_mode,
            string_mode: self.string_mode,
            string_mode_just_saw_space: self.string_mode_just_saw_space,
            requests_split: self.requests_split,
            instructions: self.instructions.clone(),
            fingerprints: self.fingerprints.clone(),
            dead: self.dead,
            private_data: self.private_data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fungespace::PagedFungeSpace;
    use crate::NoEnv;

    type TestIp = InstructionPointer<Vector<i64>, PagedFungeSpace<Vector<i64>, i64>, NoEnv>;

    #[test]
    fn push_pop_empty_is_zero() {
        let mut ip = TestIp::new(Dimension::Be);
        assert_eq!(ip.pop(), 0);
        ip.push(5);
        ip.push(7);
        assert_eq!(ip.pop(), 7);
        assert_eq!(ip.pop(), 5);
        assert_eq!(ip.pop(), 0);
    }

    #[test]
    fn gnirts_roundtrip() {
        let mut ip = TestIp::new(Dimension::Be);
        ip.push_0gnirts(b"hi");
        let s = ip.pop_0gnirts();
        let bytes: Vec<u8> = s.iter().map(|v| *v as u8).collect();
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn begin_end_block_roundtrip() {
        let mut ip = TestIp::new(Dimension::Be);
        ip.push(1);
        ip.push(2);
        ip.push(3);
        ip.begin_block(2, Vector::zero());
        assert_eq!(ip.stack_stack.len(), 2);
        // The new TOSS keeps the transferred block's relative order:
        // the old TOSS's top value (3) stays on top.
        assert_eq!(ip.pop(), 3);
        assert_eq!(ip.pop(), 2);
        ip.push(30);
        ip.push(20);
        ip.end_block(2);
        assert_eq!(ip.stack_stack.len(), 1);
        // `}` merges the block back in the same order it was pushed
        // onto the now-discarded TOSS.
        assert_eq!(ip.pop(), 20);
        assert_eq!(ip.pop(), 30);
        assert_eq!(ip.pop(), 1);
    }
}
