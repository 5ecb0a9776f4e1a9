//! `csb-netdriver-client`: the connecting side of the operation-sequence
//! driver.

use std::net::ToSocketAddrs;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use log::{error, info};

use csb_netdriver::client::{self, ClientConfig};
use csb_netdriver::sequence::Sequence;

#[derive(Parser)]
#[command(name = "csb-netdriver-client")]
#[command(about = "Auxiliary TCP loopback client driving the operation-sequence grammar")]
struct Cli {
    /// Server host to connect to.
    #[arg(short = 'H', long)]
    host: String,

    /// Server port to connect to.
    #[arg(short, long, default_value_t = 10000)]
    port: u16,

    /// Number of concurrent connections to open.
    #[arg(short = 'n', long, default_value_t = 1)]
    connections: usize,

    /// Operation sequence, e.g. `2r1024-1w32`.
    #[arg(short = 'P', long)]
    program: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let sequence = match Sequence::parse(&cli.program) {
        Ok(seq) => seq,
        Err(e) => {
            error!("failed to parse operation sequence {:?}: {e}", cli.program);
            std::process::exit(1);
        }
    };

    let server_addr = match (cli.host.as_str(), cli.port).to_socket_addrs() {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                error!("could not resolve {}:{}", cli.host, cli.port);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("could not resolve {}:{}: {e}", cli.host, cli.port);
            std::process::exit(1);
        }
    };

    info!("connecting {} connection(s) to {server_addr}", cli.connections);
    let stop = AtomicBool::new(false);
    let config = ClientConfig {
        server_addr,
        sequence,
        num_connections: cli.connections,
    };
    if let Err(e) = client::run(config, &stop) {
        error!("client loop exited: {e}");
        std::process::exit(2);
    }
}
