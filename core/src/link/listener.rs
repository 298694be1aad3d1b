//! Peer side of the link-cable relay

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use retrogbm_shared::{LINK_CABLE_PORT, LINK_FRAME_MARKER};

use super::error::LinkError;
use super::transport::{FRAME_LEN, encode_frame};

/// Reacts to one byte received from a client.
///
/// The returned byte, if any, is framed and sent back to the same client.
pub trait FrameHandler: Send + Sync + 'static {
    fn on_byte(&self, byte: u8) -> Option<u8>;
}

impl<F> FrameHandler for F
where
    F: Fn(u8) -> Option<u8> + Send + Sync + 'static,
{
    fn on_byte(&self, byte: u8) -> Option<u8> {
        self(byte)
    }
}

/// Accepts link-cable clients and serves each on its own thread.
pub struct LinkCableListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl LinkCableListener {
    pub fn bind(addr: &str) -> Result<Self, LinkError> {
        let bind_err = |source| LinkError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        tracing::info!(%local_addr, "Link cable listener bound");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Bind `0.0.0.0` on the link-cable port.
    pub fn bind_default() -> Result<Self, LinkError> {
        Self::bind(&format!("0.0.0.0:{LINK_CABLE_PORT}"))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept clients until the listener fails.
    pub fn serve(self, handler: Arc<dyn FrameHandler>) -> Result<(), LinkError> {
        for stream in self.listener.incoming() {
            let stream = stream?;
            let handler = Arc::clone(&handler);
            let peer = stream.peer_addr().ok();
            tracing::info!(?peer, "Link cable client connected");

            thread::Builder::new()
                .name("link-client".to_string())
                .spawn(move || {
                    if let Err(e) = serve_client(stream, handler.as_ref()) {
                        tracing::warn!(?peer, error = %e, "Link cable client failed");
                    }
                    tracing::info!(?peer, "Link cable client disconnected");
                })?;
        }
        Ok(())
    }

    /// Run [`serve`](Self::serve) on a background thread.
    pub fn spawn(self, handler: Arc<dyn FrameHandler>) -> JoinHandle<Result<(), LinkError>> {
        thread::spawn(move || self.serve(handler))
    }
}

fn serve_client(mut stream: TcpStream, handler: &dyn FrameHandler) -> Result<(), LinkError> {
    let mut frame = [0u8; FRAME_LEN];
    loop {
        match stream.read_exact(&mut frame) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        if frame[0] != LINK_FRAME_MARKER {
            tracing::trace!(marker = frame[0], "Unexpected link frame marker");
        }
        tracing::trace!(byte = frame[1], "Link byte from client");

        if let Some(reply) = handler.on_byte(frame[1]) {
            stream.write_all(&encode_frame(reply))?;
            stream.flush()?;
        }
    }
}
