pub mod arp;
pub mod errors;
pub mod ethernet;
pub mod interface;
pub mod ip;
pub mod router;

// -- Re-export structs for more concise usage

pub use arp::ArpMessage;
pub use errors::HeaderError;
pub use ethernet::{EthernetAddress, EthernetFrame, EthernetHeader, ETHERNET_BROADCAST};
pub use interface::NetworkInterface;
pub use ip::{IpFlags, Ipv4Datagram, Ipv4Header};
pub use router::Router;
