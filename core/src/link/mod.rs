//! Link-cable relay over TCP
//!
//! Two emulator instances exchange serial-port bytes through a TCP
//! connection on port 54000. Every byte travels as a two-byte frame:
//!
//! ```text
//! [0xFF, byte]
//! ```
//!
//! [`LinkCableTransport`] is the client an emulator session uses;
//! [`LinkCableListener`] is the accepting side, used by the CLI's echo
//! peer and by tests.
//!
//! # Usage
//!
//! ```ignore
//! let transport = LinkCableTransport::new(session.link_port());
//! transport.connect("192.168.1.20");
//! let _forwarder = transport.spawn_forwarder(session.subscribe_link_output(64));
//! ```
//!
//! # Limitations
//!
//! - No connect or read timeouts
//! - No reconnect; a failed attempt stays failed until `connect` is called again

mod error;
mod listener;
mod transport;


pub use error::LinkError;
pub use listener::{FrameHandler, LinkCableListener};
pub use transport::{FRAME_LEN, LinkCableTransport, LinkStatus, encode_frame};
