//! The client side of the operation-sequence driver: opens `num_connections`
//! TCP connections and drives each through the shared sequence from the
//! client's own (non-inverted) perspective.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};

use crate::conn::{confirm_connected, service, Conn, Outcome};
use crate::sequence::{Role, Sequence};

const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for one client run.
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    pub sequence: Sequence,
    pub num_connections: usize,
}

/// Open `config.num_connections` connections to `config.server_addr` and
/// drive each through `config.sequence` until every connection has closed
/// or `stop` is set.
pub fn run(config: ClientConfig, stop: &AtomicBool) -> io::Result<()> {
    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(16);
    let mut conns: HashMap<Token, Conn> = HashMap::new();

    for i in 0..config.num_connections {
        // A non-blocking `connect` always completes (if it completes at
        // all) by becoming writable, regardless of what the sequence's
        // first step actually needs — `confirm_connected` reconciles the
        // two once that event arrives.
        let mut stream = TcpStream::connect(config.server_addr)?;
        let token = Token(i);
        poll.registry().register(&mut stream, token, Interest::WRITABLE)?;
        let mut conn = Conn::new(stream, Interest::WRITABLE);
        conn.connected = false;
        conns.insert(token, conn);
    }

    while !conns.is_empty() && !stop.load(Ordering::Relaxed) {
        match poll.poll(&mut events, Some(POLL_TIMEOUT)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }

        for event in events.iter() {
            let token = event.token();
            let Some(conn) = conns.get_mut(&token) else { continue };

            if !conn.connected {
                if !confirm_connected(conn, &config.sequence, poll.registry(), token) {
                    if let Some(mut conn) = conns.remove(&token) {
                        let _ = poll.registry().deregister(&mut conn.stream);
                    }
                    continue;
                }
                // The event that just fired was the connect-completion
                // writable notification, not necessarily a signal that the
                // first step's own direction is ready; only proceed to
                // `service` this round if it still is.
                if conn.interest != Interest::WRITABLE {
                    continue;
                }
            }

            match service(conn, event, &config.sequence, Role::Client, poll.registry(), token) {
                Outcome::WouldBlock | Outcome::Advanced => {}
                Outcome::Closed => {
                    if let Some(mut conn) = conns.remove(&token) {
                        let _ = poll.registry().deregister(&mut conn.stream);
                    }
                }
            }
        }
    }
    Ok(())
}
