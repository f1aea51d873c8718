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

#![cfg(not(target_arch = "wasm32"))]

use std::any::Any;
use std::cell::{RefCell, RefMut};
use std::io::{Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddrV4};
use std::os::raw::c_int;
use std::rc::Rc;

use hashbrown::HashMap;
use num::ToPrimitive;
use socket2::{Domain, Protocol, Socket, Type};

use crate::fungespace::{FungeSpace, FungeValue, SrcIO, Vector};
use crate::interpreter::instruction_set::{Instruction, InstructionResult, InstructionSet};
use crate::interpreter::ip::InstructionPointer;
use crate::interpreter::motion::MotionCmds;
use crate::interpreter::InterpreterEnv;

const SOCKETS_KEY: &str = "SOCK.sockets";

/// From the rcFunge docs:
///
/// "SOCK" 0x534F434B
///
/// A   (s -- prt addr s)   Accept a connection
/// B   (s ct prt addr -- ) Bind a socket
/// C   (s ct prt addr -- ) Open a connection
/// I   (0gnirts -- addr)   Convert an ascii ip address to a 32 bit address
/// K   (s -- )             Kill a connection
/// L   (n s -- )           Set a socket to listening mode (n=backlog size)
/// O   (n o s -- )         Set socket option
/// R   (V l s -- bytes)    Receive from a socket
/// S   (pf typ pro -- s)   Create a socket
/// W   (V l s -- retcode)  Write to a socket
///
/// All functions act as `r` on failure. `ct`/`pf` must be 2 (`AF_INET`);
/// the `ct=1`/`pf=1` (`AF_UNIX`) case is documented as broken in the
/// SOCK fingerprint's own reference description and is deliberately
/// left unimplemented (reflects instead).
pub fn load<V, Space, Env>(instructionset: &mut InstructionSet<Vector<V>, Space, Env>) -> bool
where
    V: FungeValue,
    Space: FungeSpace<Vector<V>, Output = V>,
    Vector<V>: SrcIO<Space>,
    Env: InterpreterEnv,
{
    let mut layer = HashMap::<char, Instruction<Vector<V>, Space, Env>>::new();
    layer.insert('A', accept);
    layer.insert('B', bind);
    layer.insert('C', connect);
    layer.insert('I', ipaddr);
    layer.insert('K', kill);
    layer.insert('L', listen);
    layer.insert('O', setopt);
    layer.insert('R', recv);
    layer.insert('S', socket_create);
    layer.insert('W', write);
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
    instructionset.pop_layer(&['A', 'B', 'C', 'I', 'K', 'L', 'O', 'R', 'S', 'W'])
}

/// Open sockets, keyed by their index into this vector. A `None` slot
/// is a killed socket whose index is free to reuse.
fn socketlist<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
) -> RefMut<Vec<Option<Socket>>>
where
    V: FungeValue,
{
    if !ip.private_data.contains_key(SOCKETS_KEY) {
        ip.private_data.insert(
            SOCKETS_KEY.to_owned(),
            Rc::new(RefCell::new(Vec::<Option<Socket>>::new())) as Rc<dyn Any>,
        );
    }
    ip.private_data
        .get(SOCKETS_KEY)
        .and_then(|any_ref| any_ref.downcast_ref::<Rc<RefCell<Vec<Option<Socket>>>>>())
        .map(|rc| rc.borrow_mut())
        .unwrap()
}

fn push_socket<V, Space, Env>(
    ip: &mut InstructionPointer<Vector<V>, Space, Env>,
    socket: Socket,
) -> usize
where
    V: FungeValue,
{
    let mut sl = socketlist(ip);
    if let Some(i) = sl.iter().position(|s| s.is_none()) {
        sl[i] = Some(socket);
        i
    } else {
        sl.push(Some(socket));
        sl.len() - 1
    }
}

/// `S`: pop `pro`, pop `typ`, pop `pf`; create a new socket and push its
/// handle, or reflect if the parameters are unsupported.
fn socket_create<V, Space, Env>(
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
    let proto = ip.pop();
    let typ = ip.pop();
    let pf = ip.pop();
    if pf != 2.into() {
        ip.reflect();
        return InstructionResult::Continue;
    }

    let real_proto = match proto.to_i32().unwrap_or(-1) {
        1 => Some(Protocol::TCP),
        2 => Some(Protocol::UDP),
        0 => None,
        _ => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };

    let new_socket = match typ.to_i32().unwrap_or_default() {
        1 => Socket::new(Domain::IPV4, Type::DGRAM, real_proto).ok(),
        2 => Socket::new(Domain::IPV4, Type::STREAM, real_proto).ok(),
        _ => None,
    };

    if let Some(new_socket) = new_socket {
        let sock_idx = push_socket(ip, new_socket);
        ip.push((sock_idx as i32).into());
    } else {
        ip.reflect();
    }
    InstructionResult::Continue
}

/// `K`: pop a socket handle, shut it down and free the slot.
fn kill<V, Space, Env>(
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
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let mut sl = socketlist(ip);
    let success = if sock_id < sl.len() {
        if let Some(sock) = &sl[sock_id] {
            sock.shutdown(Shutdown::Both).ok();
        }
        sl[sock_id] = None;
        true
    } else {
        false
    };
    drop(sl);
    if !success {
        ip.reflect();
    }
    InstructionResult::Continue
}

/// `O`: pop a socket handle, pop `o` (option id), pop a flag; apply the
/// option if supported.
fn setopt<V, Space, Env>(
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
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let opt = ip.pop();
    let flag = ip.pop() != 0.into();

    let sl = socketlist(ip);
    let had_error = match sl.get(sock_id).and_then(|o| o.as_ref()) {
        Some(sock) => {
            let result = match opt.to_i32().unwrap_or_default() {
                2 => sock.set_reuse_address(flag).ok(),
                3 => sock.set_keepalive(flag).ok(),
                5 => sock.set_broadcast(flag).ok(),
                _ => None,
            };
            result.is_none()
        }
        None => true,
    };
    drop(sl);
    if had_error {
        ip.reflect();
    }
    InstructionResult::Continue
}

/// `B`: pop `addr`, pop `prt`, pop `ct`, pop a socket handle; bind to
/// `addr:prt`.
fn bind<V, Space, Env>(
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
    let addr = ip.pop().to_i32().unwrap_or_default();
    let port = match ip.pop().to_u16() {
        Some(p) => p,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let ct = ip.pop();
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    if ct != 2.into() {
        ip.reflect();
        return InstructionResult::Continue;
    }
    let addr = SocketAddrV4::new((addr as u32).into(), port);
    let sl = socketlist(ip);
    let success = match sl.get(sock_id).and_then(|o| o.as_ref()) {
        Some(sock) => sock.bind(&addr.into()).is_ok(),
        None => false,
    };
    drop(sl);
    if !success {
        ip.reflect();
    }
    InstructionResult::Continue
}

/// `C`: pop `addr`, pop `prt`, pop `ct`, pop a socket handle; connect.
fn connect<V, Space, Env>(
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
    let addr = ip.pop().to_i32().unwrap_or_default();
    let port = match ip.pop().to_u16() {
        Some(p) => p,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let ct = ip.pop();
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    if ct != 2.into() {
        ip.reflect();
        return InstructionResult::Continue;
    }
    let addr = SocketAddrV4::new((addr as u32).into(), port);
    let sl = socketlist(ip);
    let success = match sl.get(sock_id).and_then(|o| o.as_ref()) {
        Some(sock) => sock.connect(&addr.into()).is_ok(),
        None => false,
    };
    drop(sl);
    if !success {
        ip.reflect();
    }
    InstructionResult::Continue
}

/// `L`: pop a socket handle, pop `n` (backlog); start listening.
fn listen<V, Space, Env>(
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
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let backlog = ip.pop().to_i32().unwrap_or(1) as c_int;
    let sl = socketlist(ip);
    let success = match sl.get(sock_id).and_then(|o| o.as_ref()) {
        Some(sock) => sock.listen(backlog).is_ok(),
        None => false,
    };
    drop(sl);
    if !success {
        ip.reflect();
    }
    InstructionResult::Continue
}

/// `A`: pop a socket handle (a listener); block for one incoming
/// connection, pushing `prt addr s` for the new connection.
fn accept<V, Space, Env>(
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
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let sl = socketlist(ip);
    let accepted = sl
        .get(sock_id)
        .and_then(|o| o.as_ref())
        .and_then(|sock| sock.accept().ok());
    drop(sl);

    match accepted {
        Some((client_sock, client_addr)) => {
            let v4 = client_addr.as_socket_ipv4();
            let sock_idx = push_socket(ip, client_sock);
            if let Some(v4) = v4 {
                ip.push((v4.port() as i32).into());
                ip.push((u32::from(*v4.ip()) as i32).into());
            } else {
                ip.push(0.into());
                ip.push(0.into());
            }
            ip.push((sock_idx as i32).into());
        }
        None => ip.reflect(),
    }
    InstructionResult::Continue
}

/// `R`: pop a socket handle, pop `l` (max bytes), pop a vector; read up
/// to `l` bytes into funge-space there, pushing the number actually
/// read.
fn recv<V, Space, Env>(
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
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let max_count = ip.pop().to_usize().unwrap_or_default();
    let loc = Vector::<V>::pop_vector(ip) + ip.storage_offset;
    let mut buf = vec![0u8; max_count];

    let mut sl = socketlist(ip);
    let read = sl
        .get_mut(sock_id)
        .and_then(|o| o.as_mut())
        .and_then(|sock| sock.read(&mut buf).ok());
    drop(sl);

    match read {
        Some(count) => {
            for (i, b) in buf[..count].iter().enumerate() {
                space.set(loc + Vector::x_axis((i as i32).into()), (*b as i32).into());
            }
            ip.push((count as i32).into());
        }
        None => ip.reflect(),
    }
    InstructionResult::Continue
}

/// `W`: pop a socket handle, pop `l` (byte count), pop a vector; write
/// `l` bytes read from funge-space there, pushing the number of bytes
/// sent.
fn write<V, Space, Env>(
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
    let sock_id = match ip.pop().to_usize() {
        Some(n) => n,
        None => {
            ip.reflect();
            return InstructionResult::Continue;
        }
    };
    let count = ip.pop().to_usize().unwrap_or_default();
    let loc = Vector::<V>::pop_vector(ip) + ip.storage_offset;
    let mut buf = vec![0u8; count];
    for (i, slot) in buf.iter_mut().enumerate() {
        let cell = space.get(loc + Vector::x_axis((i as i32).into()));
        *slot = cell.to_i64().unwrap_or(0) as u8;
    }

    let mut sl = socketlist(ip);
    let sent = sl
        .get_mut(sock_id)
        .and_then(|o| o.as_mut())
        .and_then(|sock| sock.write_all(&buf).ok());
    drop(sl);

    match sent {
        Some(()) => ip.push((buf.len() as i32).into()),
        None => ip.reflect(),
    }
    InstructionResult::Continue
}

/// `I`: pop a 0gnirts dotted-quad string, push the address it encodes
/// as a packed 32-bit integer.
fn ipaddr<V, Space, Env>(
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
    let bytes: Vec<u8> = ip
        .pop_0gnirts()
        .iter()
        .map(|v| v.to_i64().unwrap_or(0) as u8)
        .collect();
    let text = String::from_utf8_lossy(&bytes);
    match text.parse::<Ipv4Addr>() {
        Ok(addr) => {
            let addr_long: u32 = addr.into();
            ip.push((addr_long as i32).into());
        }
        Err(_) => ip.reflect(),
    }
    InstructionResult::Continue
}
