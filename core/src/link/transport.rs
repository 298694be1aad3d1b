//! TCP client relaying link-cable bytes to a peer

use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use retrogbm_shared::{LINK_CABLE_PORT, LINK_FRAME_MARKER};

use super::error::LinkError;
use crate::engine::LinkPort;

/// Size of one wire frame: marker byte plus payload byte.
pub const FRAME_LEN: usize = 2;

/// Connection state of a [`LinkCableTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// No connection has been attempted yet
    NotConnected,
    Connecting,
    Connected,
    /// The peer closed the connection or `disconnect` was called
    Disconnected,
    /// The last connection attempt failed
    Failed(String),
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Encode one payload byte as a wire frame.
pub fn encode_frame(byte: u8) -> [u8; FRAME_LEN] {
    [LINK_FRAME_MARKER, byte]
}

struct Connection {
    status: LinkStatus,
    peer_ip: Option<String>,
    /// Kept so `disconnect` can shut the socket down under the reader.
    stream: Option<TcpStream>,
    writer: Option<Sender<[u8; FRAME_LEN]>>,
    /// Bumped on every connect/disconnect so stale workers leave state alone.
    generation: u64,
}

struct Inner {
    connection: Mutex<Connection>,
    port: Arc<dyn LinkPort>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn send_byte(&self, byte: u8) {
        let conn = self.lock();
        match (&conn.status, &conn.writer) {
            (LinkStatus::Connected, Some(writer)) => {
                if writer.send(encode_frame(byte)).is_err() {
                    tracing::debug!(byte, "Link writer gone, dropping byte");
                } else {
                    tracing::trace!(byte, "Queued link byte");
                }
            }
            _ => tracing::debug!(byte, status = %conn.status, "Link not connected, dropping byte"),
        }
    }

    fn disconnect(&self) {
        let mut conn = self.lock();
        conn.generation += 1;
        conn.writer = None;
        if let Some(stream) = conn.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        if matches!(conn.status, LinkStatus::Connected | LinkStatus::Connecting) {
            conn.status = LinkStatus::Disconnected;
            tracing::info!(peer = ?conn.peer_ip, "Link cable disconnected");
        }
    }

    /// Called by the connect worker once the socket is open.
    fn attach(self: &Arc<Self>, generation: u64, stream: TcpStream) -> Result<(), LinkError> {
        let reader = stream.try_clone()?;
        let writer_stream = stream.try_clone()?;

        let mut conn = self.lock();
        if conn.generation != generation {
            // Disconnected or reconnected while we were connecting.
            let _ = stream.shutdown(Shutdown::Both);
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        conn.status = LinkStatus::Connected;
        conn.stream = Some(stream);
        conn.writer = Some(tx);
        tracing::info!(peer = ?conn.peer_ip, "Link cable connected");
        drop(conn);

        spawn_writer(writer_stream, rx);

        let inner = Arc::clone(self);
        thread::Builder::new()
            .name("link-receive".to_string())
            .spawn(move || inner.receive_loop(generation, reader))?;
        Ok(())
    }

    fn receive_loop(&self, generation: u64, mut stream: TcpStream) {
        let mut frame = [0u8; FRAME_LEN];
        let reason = loop {
            match stream.read_exact(&mut frame) {
                Ok(()) => {
                    if frame[0] != LINK_FRAME_MARKER {
                        tracing::trace!(marker = frame[0], "Unexpected link frame marker");
                    }
                    tracing::trace!(byte = frame[1], "Received link byte");
                    self.port.feed_link_cable_byte(frame[1]);
                }
                Err(e) => break e,
            }
        };

        let mut conn = self.lock();
        if conn.generation == generation {
            tracing::info!(error = %reason, "Link cable peer went away");
            conn.status = LinkStatus::Disconnected;
            conn.writer = None;
            conn.stream = None;
        }
    }
}

fn spawn_writer(mut stream: TcpStream, rx: Receiver<[u8; FRAME_LEN]>) {
    let spawned = thread::Builder::new()
        .name("link-send".to_string())
        .spawn(move || {
            for frame in rx {
                if let Err(e) = stream.write_all(&frame).and_then(|()| stream.flush()) {
                    tracing::warn!(error = %e, "Failed to send link byte");
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to start link writer");
    }
}

/// Client side of the link-cable relay.
///
/// Bytes received from the peer go straight to the engine through the
/// [`LinkPort`]; bytes from the engine are sent with [`send_byte`].
/// All socket work happens on worker threads, so no method blocks on the
/// network.
///
/// [`send_byte`]: LinkCableTransport::send_byte
pub struct LinkCableTransport {
    inner: Arc<Inner>,
}

impl LinkCableTransport {
    pub fn new(port: Arc<dyn LinkPort>) -> Self {
        Self {
            inner: Arc::new(Inner {
                connection: Mutex::new(Connection {
                    status: LinkStatus::NotConnected,
                    peer_ip: None,
                    stream: None,
                    writer: None,
                    generation: 0,
                }),
                port,
            }),
        }
    }

    /// Connect to a peer on the link-cable port.
    ///
    /// Returns the connect worker; joining it waits for the attempt to
    /// finish. Failure leaves the transport in [`LinkStatus::Failed`], there
    /// is no retry.
    pub fn connect(&self, ip: &str) -> JoinHandle<()> {
        self.start_connect(ip.to_string(), (ip.to_string(), LINK_CABLE_PORT))
    }

    /// Connect to an explicit address.
    pub fn connect_to(&self, addr: SocketAddr) -> JoinHandle<()> {
        self.start_connect(addr.ip().to_string(), addr)
    }

    fn start_connect<A>(&self, peer_ip: String, target: A) -> JoinHandle<()>
    where
        A: ToSocketAddrs + fmt::Debug + Send + 'static,
    {
        self.inner.disconnect();

        let generation = {
            let mut conn = self.inner.lock();
            conn.status = LinkStatus::Connecting;
            conn.peer_ip = Some(peer_ip);
            conn.generation
        };

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            tracing::info!(target = ?target, "Connecting link cable");
            let result = TcpStream::connect(&target)
                .map_err(|source| LinkError::Connect {
                    addr: format!("{target:?}"),
                    source,
                })
                .and_then(|stream| {
                    let _ = stream.set_nodelay(true);
                    inner.attach(generation, stream)
                });

            if let Err(e) = result {
                tracing::warn!(error = %e, "Link cable connection failed");
                let mut conn = inner.lock();
                if conn.generation == generation {
                    conn.status = LinkStatus::Failed(e.to_string());
                    conn.stream = None;
                    conn.writer = None;
                }
            }
        })
    }

    /// Send one byte to the peer. Dropped with a log line when not connected.
    pub fn send_byte(&self, byte: u8) {
        self.inner.send_byte(byte);
    }

    /// Close the connection. Safe to call at any time, any number of times.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        let conn = self.inner.lock();
        conn.status == LinkStatus::Connected && conn.stream.is_some()
    }

    pub fn status(&self) -> LinkStatus {
        self.inner.lock().status.clone()
    }

    /// Status line shown to the player.
    pub fn status_message(&self) -> String {
        let conn = self.inner.lock();
        match &conn.status {
            LinkStatus::NotConnected => "Not connected".to_string(),
            LinkStatus::Connecting => "Connecting".to_string(),
            LinkStatus::Connected => {
                format!("Connected to {}", conn.peer_ip.as_deref().unwrap_or_default())
            }
            LinkStatus::Disconnected => "Disconnected".to_string(),
            LinkStatus::Failed(_) => "Failed to connect to the server".to_string(),
        }
    }

    pub fn peer_ip(&self) -> Option<String> {
        self.inner.lock().peer_ip.clone()
    }

    /// Pump bytes published by the session into [`send_byte`].
    ///
    /// The returned thread ends when the sending side of `rx` is dropped.
    ///
    /// [`send_byte`]: LinkCableTransport::send_byte
    pub fn spawn_forwarder(&self, rx: Receiver<u8>) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            for byte in rx {
                inner.send_byte(byte);
            }
            tracing::debug!("Link output closed");
        })
    }
}

impl Drop for LinkCableTransport {
    fn drop(&mut self) {
        self.inner.disconnect();
    }
}
