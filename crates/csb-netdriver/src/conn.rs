//! Per-connection state shared by the server and client event loops: the
//! socket, its cursor through the sequence, and the one-send-or-recv-per-
//! readiness-notification dispatch that both sides perform identically
//! (only the *direction* each perceives differs — see [`Role`]).

use std::io::{self, Read, Write};

use mio::event::Event;
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use crate::sequence::{effective_direction, Cursor, Direction, Role, Sequence, MAX_STEP_SIZE};

/// Per-connection scratch state.
pub struct Conn {
    pub stream: TcpStream,
    pub cursor: Cursor,
    pub interest: Interest,
    /// False only for a client-side connection whose non-blocking
    /// `connect` has not yet been confirmed complete. Server-side
    /// connections are always already connected at accept time.
    pub connected: bool,
    scratch: [u8; MAX_STEP_SIZE],
}

impl Conn {
    pub fn new(stream: TcpStream, interest: Interest) -> Self {
        Conn {
            stream,
            cursor: Cursor::new(),
            interest,
            connected: true,
            scratch: [0u8; MAX_STEP_SIZE],
        }
    }
}

/// What happened when [`service`] was asked to act on a readiness event.
pub enum Outcome {
    /// The operation would block; try again on the next notification.
    WouldBlock,
    /// The operation completed; the cursor advanced, and the registry was
    /// updated if the next step's direction differs from this one's.
    Advanced,
    /// The peer closed the connection, or the socket errored — the caller
    /// should deregister and drop it.
    Closed,
}

/// Perform the single send or receive this connection's current step calls
/// for, having been told `event` fired for it.
///
/// Mirrors the original's `readwrite`: exactly one `send`/`recv` per epoll
/// notification, never a drain-until-`EWOULDBLOCK` loop — this drives a
/// timing sequence, not a throughput-maximizing proxy.
pub fn service(
    conn: &mut Conn,
    event: &Event,
    sequence: &Sequence,
    role: Role,
    registry: &Registry,
    token: Token,
) -> Outcome {
    if event.is_read_closed() || event.is_write_closed() || event.is_error() {
        return Outcome::Closed;
    }

    let step = sequence.step(conn.cursor.step_index());
    let direction = effective_direction(step, role);
    let buf = &mut conn.scratch[..step.size];

    let result = match direction {
        Direction::Write => conn.stream.write(buf),
        Direction::Read => conn.stream.read(buf),
    };

    match result {
        Ok(0) if direction == Direction::Read && step.size > 0 => return Outcome::Closed,
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Outcome::WouldBlock,
        Err(_) => return Outcome::Closed,
    }

    conn.cursor.advance(sequence);
    let next_step = sequence.step(conn.cursor.step_index());
    let next_direction = effective_direction(next_step, role);
    let desired = match next_direction {
        Direction::Read => Interest::READABLE,
        Direction::Write => Interest::WRITABLE,
    };
    if desired != conn.interest {
        if let Err(e) = registry.reregister(&mut conn.stream, token, desired) {
            log::warn!("reregister failed for {token:?}: {e}");
            return Outcome::Closed;
        }
        conn.interest = desired;
    }
    Outcome::Advanced
}

/// For a client connection still completing its non-blocking `connect`:
/// a writable event may simply mean the connect finished, not that the
/// first step's own direction is writable. Confirm the connect actually
/// succeeded, then make sure the registered interest matches what the
/// first step needs before any `service` call is attempted.
///
/// Returns `false` if the connect failed outright — the caller should
/// deregister and drop the connection.
pub fn confirm_connected(conn: &mut Conn, sequence: &Sequence, registry: &Registry, token: Token) -> bool {
    match conn.stream.take_error() {
        Ok(None) => {}
        _ => return false,
    }
    conn.connected = true;

    let wanted = match effective_direction(sequence.step(0), Role::Client) {
        Direction::Read => Interest::READABLE,
        Direction::Write => Interest::WRITABLE,
    };
    if wanted != conn.interest {
        if registry.reregister(&mut conn.stream, token, wanted).is_err() {
            return false;
        }
        conn.interest = wanted;
    }
    true
}
