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

//! Fingerprint dispatch: `(` and `)` ask a [`FingerprintState`] to load
//! or unload a fingerprint by its 4-byte ID. The overlay-stack +
//! refcounting model here is grounded in the Stinkhorn original's
//! `fingerprint_stack.hpp`/`fingerprint.hpp`: the same fingerprint can
//! be loaded more than once (by nested `(` or by forked IPs), and its
//! instructions only actually disappear once the last matching `)`
//! has run.

#![allow(non_snake_case)]

pub mod BOOL;
pub mod HRTI;
pub mod MODU;
pub mod NULL;
pub mod ORTH;
pub mod REFC;
pub mod ROMA;
pub mod SOCK;
pub mod STRN;
pub mod TOYS;

use hashbrown::HashMap;

use crate::fungespace::{FungeSpace, FungeValue, SrcIO, Vector};

use super::ip::InstructionPointer;
use super::motion::MotionCmds;
use super::InterpreterEnv;

/// Packs a 4-character fingerprint name into the 32-bit id Funge-98
/// pushes onto the stack before `(`/`)`, e.g. `"NULL"` -> `0x4e554c4c`.
pub fn string_to_fingerprint(name: &str) -> i32 {
    let mut id: i32 = 0;
    for c in name.chars() {
        id = id * 256 + (c as i32);
    }
    id
}

/// Fingerprints considered safe to expose even when sandboxed (no
/// filesystem or process access). `SOCK` and `TOYS`'s file operations
/// are excluded; everything else here is pure computation.
pub fn safe_fingerprints() -> Vec<i32> {
    ["NULL", "ROMA", "BOOL", "MODU", "HRTI", "REFC", "STRN", "ORTH"]
        .iter()
        .map(|s| string_to_fingerprint(s))
        .collect()
}

pub fn all_fingerprints() -> Vec<i32> {
    let mut v = safe_fingerprints();
    v.push(string_to_fingerprint("SOCK"));
    v.push(string_to_fingerprint("TOYS"));
    v
}

/// Per-IP bookkeeping of which fingerprints are currently loaded, with
/// reference counts so that loading the same fingerprint twice (once
/// directly, once again after a `t` fork shares the overlay) only
/// tears down its instruction layer once the last reference is gone.
pub struct FingerprintState<Idx, Space, Env> {
    refcount: HashMap<i32, u32>,
    order: Vec<i32>,
    _marker: std::marker::PhantomData<fn(&mut Space, &mut Env) -> Idx>,
}

impl<Idx, Space, Env> Clone for FingerprintState<Idx, Space, Env> {
    fn clone(&self) -> Self {
        Self {
            refcount: self.refcount.clone(),
            order: self.order.clone(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<Idx, Space, Env> FingerprintState<Idx, Space, Env> {
    pub fn new() -> Self {
        Self {
            refcount: HashMap::new(),
            order: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn is_loaded(&self, fpr: i32) -> bool {
        self.refcount.get(&fpr).copied().unwrap_or(0) > 0
    }
}

impl<Idx, Space, Env> Default for FingerprintState<Idx, Space, Env> {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch table from fingerprint id to its `load`/`unload` functions.
/// A plain if-else chain.
pub fn load<V, Space, Env>(fpr: i32, ip: &mut InstructionPointer<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let already = ip.fingerprints.is_loaded(fpr);
    let ok = if already {
        true
    } else if fpr == string_to_fingerprint("NULL") {
        NULL::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("ROMA") {
        ROMA::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("BOOL") {
        BOOL::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("MODU") {
        MODU::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("HRTI") {
        HRTI::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("REFC") {
        REFC::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("STRN") {
        STRN::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("ORTH") {
        ORTH::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("SOCK") {
        SOCK::load(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("TOYS") {
        TOYS::load(&mut ip.instructions)
    } else {
        false
    };
    if ok {
        *ip.fingerprints.refcount.entry(fpr).or_insert(0) += 1;
        ip.fingerprints.order.push(fpr);
    }
    ok
}

pub fn unload<V, Space, Env>(fpr: i32, ip: &mut InstructionPointer<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let count = ip.fingerprints.refcount.get(&fpr).copied().unwrap_or(0);
    if count == 0 {
        // Unloading a fingerprint this IP never loaded is a no-op,
        // not a failure -- `)` only reflects when the matching `(`
        // itself failed to load, never on an unmatched unload.
        return true;
    }
    if count > 1 {
        ip.fingerprints.refcount.insert(fpr, count - 1);
        if let Some(pos) = ip.fingerprints.order.iter().rposition(|id| *id == fpr) {
            ip.fingerprints.order.remove(pos);
        }
        return true;
    }
    let ok = if fpr == string_to_fingerprint("NULL") {
        NULL::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("ROMA") {
        ROMA::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("BOOL") {
        BOOL::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("MODU") {
        MODU::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("HRTI") {
        HRTI::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("REFC") {
        REFC::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("STRN") {
        STRN::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("ORTH") {
        ORTH::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("SOCK") {
        SOCK::unload(&mut ip.instructions)
    } else if fpr == string_to_fingerprint("TOYS") {
        TOYS::unload(&mut ip.instructions)
    } else {
        false
    };
    if ok {
        ip.fingerprints.refcount.insert(fpr, 0);
        if let Some(pos) = ip.fingerprints.order.iter().rposition(|id| *id == fpr) {
            ip.fingerprints.order.remove(pos);
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_id_packing() {
        assert_eq!(string_to_fingerprint("NULL"), 0x4e554c4c);
        assert_eq!(string_to_fingerprint("HRTI"), 0x48525449);
    }
}
