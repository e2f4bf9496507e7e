//! A userspace TCP/IP protocol core.
//!
//! The `tcp` module holds the transport engines: a bounded byte stream
//! with writer/reader views, a stream reassembler, and the TCP sender
//! and receiver state machines built on 32-bit wrapping sequence
//! numbers. The `net` module holds the link/network layer: Ethernet,
//! ARP and IPv4 wire codecs, an ARP-resolving network interface, and a
//! longest-prefix-match router.
//!
//! Everything is single-threaded and externally driven: time advances
//! only through explicit `tick(ms)` calls, and all queues are plain
//! FIFOs drained by the caller.

pub mod net;
pub mod tcp;

pub use net::interface::NetworkInterface;
pub use net::router::Router;
pub use tcp::byte_stream::ByteStream;
pub use tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
pub use tcp::reassembler::Reassembler;
pub use tcp::receiver::TcpReceiver;
pub use tcp::sender::TcpSender;
pub use tcp::wrap32::Wrap32;
