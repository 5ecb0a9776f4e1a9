//! The server side of the operation-sequence driver: an `accept` loop plus
//! one `Conn` per accepted connection, each advancing through the shared
//! sequence from the server's (inverted) perspective.

use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Socket, Type};

use crate::conn::{service, Conn, Outcome};
use crate::sequence::{effective_direction, Direction, Role, Sequence};

const LISTENER: Token = Token(0);
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for one server run.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub sequence: Sequence,
}

/// Accept connections on `config.addr` and drive each through
/// `config.sequence` until `stop` is set.
///
/// Binds with `SO_REUSEPORT`/`SO_REUSEADDR` so multiple server processes
/// can share one port, matching the original's loopback-benchmark setup.
pub fn run(config: ServerConfig, stop: &AtomicBool) -> io::Result<()> {
    let std_listener = bind_reuseport(config.addr)?;
    run_with_listener(std_listener, config.sequence, stop)
}

/// Bind `addr` with `SO_REUSEPORT`/`SO_REUSEADDR` without starting the
/// accept loop. Exposed so callers (tests in particular) that need the
/// kernel to assign an ephemeral port can read it back via
/// `TcpListener::local_addr` before handing the listener to
/// [`run_with_listener`].
pub fn bind(addr: SocketAddr) -> io::Result<StdTcpListener> {
    bind_reuseport(addr)
}

/// Run the accept loop against an already-bound listener. See [`run`].
pub fn run_with_listener(std_listener: StdTcpListener, sequence: Sequence, stop: &AtomicBool) -> io::Result<()> {
    let mut listener = TcpListener::from_std(std_listener);

    let mut poll = Poll::new()?;
    poll.registry().register(&mut listener, LISTENER, Interest::READABLE)?;

    let mut events = Events::with_capacity(16);
    let mut conns: HashMap<Token, Conn> = HashMap::new();
    let mut next_token = 1usize;

    let initial_interest = match effective_direction(sequence.step(0), Role::Server) {
        Direction::Read => Interest::READABLE,
        Direction::Write => Interest::WRITABLE,
    };

    while !stop.load(Ordering::Relaxed) {
        match poll.poll(&mut events, Some(POLL_TIMEOUT)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }

        for event in events.iter() {
            if event.token() == LISTENER {
                accept_all(&listener, &poll, &mut conns, &mut next_token, initial_interest);
                continue;
            }

            let token = event.token();
            let Some(conn) = conns.get_mut(&token) else { continue };
            match service(conn, event, &sequence, Role::Server, poll.registry(), token) {
                Outcome::WouldBlock | Outcome::Advanced => {}
                Outcome::Closed => drop_conn(&poll, &mut conns, token),
            }
        }
    }
    Ok(())
}

fn accept_all(
    listener: &TcpListener,
    poll: &Poll,
    conns: &mut HashMap<Token, Conn>,
    next_token: &mut usize,
    initial_interest: Interest,
) {
    loop {
        match listener.accept() {
            Ok((mut stream, _peer)) => {
                let token = Token(*next_token);
                *next_token += 1;
                if poll.registry().register(&mut stream, token, initial_interest).is_ok() {
                    conns.insert(token, Conn::new(stream, initial_interest));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => {
                log::warn!("accept failed: {e}");
                break;
            }
        }
    }
}

fn drop_conn(poll: &Poll, conns: &mut HashMap<Token, Conn>, token: Token) {
    if let Some(mut conn) = conns.remove(&token) {
        let _ = poll.registry().deregister(&mut conn.stream);
    }
}

fn bind_reuseport(addr: SocketAddr) -> io::Result<StdTcpListener> {
    let domain = Domain::for_address(addr);
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    Ok(socket.into())
}
