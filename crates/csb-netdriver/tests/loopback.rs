//! End-to-end roundtrip: a server and a client exchange bytes over an
//! ephemeral loopback port, each driven by the same operation-sequence
//! string, for long enough to wrap the sequence several times.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use csb_netdriver::client::{self, ClientConfig};
use csb_netdriver::sequence::Sequence;
use csb_netdriver::server;

fn loopback_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
}

#[test]
fn client_and_server_complete_a_mixed_sequence() {
    let program = "3r64-2w32-1r8";
    let server_sequence = Sequence::parse(program).unwrap();
    let client_sequence = Sequence::parse(program).unwrap();

    let std_listener = server::bind(loopback_addr()).expect("bind ephemeral port");
    let bound_addr = std_listener.local_addr().expect("local_addr");

    let server_stop = Arc::new(AtomicBool::new(false));
    let server_stop_thread = Arc::clone(&server_stop);
    let server_thread = std::thread::spawn(move || {
        server::run_with_listener(std_listener, server_sequence, &server_stop_thread)
    });

    // Give the listener a moment to be schedulable before the client dials.
    std::thread::sleep(Duration::from_millis(20));

    let client_stop = Arc::new(AtomicBool::new(false));
    let client_stop_thread = Arc::clone(&client_stop);
    let client_thread = std::thread::spawn(move || {
        client::run(
            ClientConfig {
                server_addr: bound_addr,
                sequence: client_sequence,
                num_connections: 4,
            },
            &client_stop_thread,
        )
    });

    // Let several connections cycle the sequence a number of times, then
    // stop both sides the same way the harness's own worker loop does:
    // flip an atomic and rendezvous via join.
    std::thread::sleep(Duration::from_millis(300));
    client_stop.store(true, Ordering::Relaxed);
    server_stop.store(true, Ordering::Relaxed);

    client_thread
        .join()
        .expect("client thread panicked")
        .expect("client loop returned an error");
    server_thread
        .join()
        .expect("server thread panicked")
        .expect("server loop returned an error");
}

#[test]
fn single_step_sequence_parses_and_round_trips_its_own_grammar() {
    let sequence = Sequence::parse("1r16").unwrap();
    assert_eq!(sequence.len(), 1);
}
