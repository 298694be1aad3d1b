//! Link-cable commands - echo peer and byte sender

use anyhow::{Context, Result, bail};
use clap::Args;
use std::net::{IpAddr, SocketAddr};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use retrogbm_core::{LinkCableListener, LinkCableTransport, LinkPort, config};
use retrogbm_shared::LINK_CABLE_PORT;

/// Arguments for the link-echo command
#[derive(Args)]
pub struct LinkEchoArgs {
    /// Address to listen on
    #[arg(long, default_value_t = format!("0.0.0.0:{LINK_CABLE_PORT}"))]
    pub bind: String,
}

/// Arguments for the link-send command
#[derive(Args)]
pub struct LinkSendArgs {
    /// Bytes to send, in hex (e.g. "42" or "0x42")
    #[arg(required = true)]
    pub bytes: Vec<String>,

    /// Peer IP address (defaults to the last peer used)
    #[arg(long)]
    pub peer: Option<String>,

    /// Peer port
    #[arg(long, default_value_t = LINK_CABLE_PORT)]
    pub port: u16,

    /// Seconds to wait for each reply
    #[arg(long, default_value = "2")]
    pub timeout: u64,
}

/// Execute the link-echo command
pub fn echo(args: LinkEchoArgs) -> Result<()> {
    let listener = LinkCableListener::bind(&args.bind)?;
    println!("Echoing link-cable bytes on {}", listener.local_addr());
    listener.serve(Arc::new(|byte: u8| Some(byte)))?;
    Ok(())
}

/// Delivers bytes from the peer to the command instead of an engine.
struct ReplyPort(Mutex<Sender<u8>>);

impl LinkPort for ReplyPort {
    fn feed_link_cable_byte(&self, byte: u8) {
        if let Ok(tx) = self.0.lock() {
            let _ = tx.send(byte);
        }
    }
}

/// Execute the link-send command
pub fn send(args: LinkSendArgs) -> Result<()> {
    let bytes = args
        .bytes
        .iter()
        .map(|s| parse_byte(s))
        .collect::<Result<Vec<u8>>>()?;

    let mut cfg = config::load();
    let peer = match args.peer.or_else(|| Some(cfg.link.last_peer_ip.clone())) {
        Some(peer) if !peer.is_empty() => peer,
        _ => bail!("No peer given and no previous peer in config; pass --peer"),
    };
    let ip: IpAddr = peer
        .parse()
        .with_context(|| format!("Invalid peer address '{peer}'"))?;

    let (tx, rx) = mpsc::channel();
    let transport = LinkCableTransport::new(Arc::new(ReplyPort(Mutex::new(tx))));
    let worker = if args.port == LINK_CABLE_PORT {
        transport.connect(&peer)
    } else {
        transport.connect_to(SocketAddr::new(ip, args.port))
    };
    if worker.join().is_err() {
        bail!("Link connect worker panicked");
    }
    println!("{}", transport.status_message());
    if !transport.is_connected() {
        bail!("Could not reach {peer}:{}", args.port);
    }

    if cfg.link.last_peer_ip != peer {
        cfg.link.last_peer_ip = peer;
        if let Err(e) = config::save(&cfg) {
            tracing::warn!(error = %e, "Failed to remember peer");
        }
    }

    let timeout = Duration::from_secs(args.timeout);
    for byte in bytes {
        transport.send_byte(byte);
        match rx.recv_timeout(timeout) {
            Ok(reply) => println!("sent 0x{byte:02X}, received 0x{reply:02X}"),
            Err(_) => println!("sent 0x{byte:02X}, no reply"),
        }
    }

    transport.disconnect();
    Ok(())
}

fn parse_byte(s: &str) -> Result<u8> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).with_context(|| format!("Invalid byte '{s}'"))
}
