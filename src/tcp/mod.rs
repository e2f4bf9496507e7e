pub mod byte_stream;
pub mod messages;
pub mod reassembler;
pub mod receiver;
pub mod sender;
pub mod tcp_header;
pub mod wrap32;

// -- Re-export structs for more concise usage

pub use byte_stream::{ByteStream, Reader, Writer};
pub use messages::{TcpReceiverMessage, TcpSenderMessage};
pub use reassembler::Reassembler;
pub use receiver::TcpReceiver;
pub use sender::TcpSender;
pub use tcp_header::{TcpFlags, TcpHeader};
pub use wrap32::Wrap32;
