//! `csb-netdriver-server`: the listening side of the operation-sequence
//! driver.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::AtomicBool;

use clap::{Parser, ValueEnum};
use log::{error, info};

use csb_netdriver::sequence::Sequence;
use csb_netdriver::server::{self, ServerConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Family {
    V4,
    V6,
}

#[derive(Parser)]
#[command(name = "csb-netdriver-server")]
#[command(about = "Auxiliary TCP loopback server driving the operation-sequence grammar")]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 10000)]
    port: u16,

    /// Address family to bind. The original combines `-6` with a fallthrough
    /// into the program-sequence option on account of a missing `break`
    /// in its `getopt` switch; this CLI requires the family spelled out
    /// explicitly instead of reproducing that bug.
    #[arg(long, value_enum, default_value = "v4")]
    family: Family,

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

    let ip = match cli.family {
        Family::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        Family::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    let addr = SocketAddr::new(ip, cli.port);

    info!("listening on {addr} ({} step sequence)", sequence.len());
    let stop = AtomicBool::new(false);
    if let Err(e) = server::run(ServerConfig { addr, sequence }, &stop) {
        error!("server loop exited: {e}");
        std::process::exit(2);
    }
}
