use crate::net::errors::HeaderError;

/// A 48-bit Ethernet (hardware) address
pub type EthernetAddress = [u8; 6];

/// Destination address of broadcast frames
pub const ETHERNET_BROADCAST: EthernetAddress = [0xff; 6];

/// EtherType for IPv4 payloads
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// EtherType for ARP payloads
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// Ethernet header size in bytes
pub const ETHERNET_HEADER_LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: EthernetAddress,
    pub src: EthernetAddress,
    pub ethertype: u16,
}

impl EthernetHeader {
    /// Serialize into a 14-byte array
    pub fn serialize(&self) -> [u8; ETHERNET_HEADER_LEN] {
        let mut buf = [0u8; ETHERNET_HEADER_LEN];
        buf[0..6].copy_from_slice(&self.dst);
        buf[6..12].copy_from_slice(&self.src);
        buf[12..14].copy_from_slice(&self.ethertype.to_be_bytes());
        buf
    }

    /// Parse the header at the front of `buf`
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < ETHERNET_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: ETHERNET_HEADER_LEN,
                found: buf.len(),
            });
        }
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&buf[0..6]);
        src.copy_from_slice(&buf[6..12]);
        Ok(EthernetHeader {
            dst,
            src,
            ethertype: u16::from_be_bytes([buf[12], buf[13]]),
        })
    }
}

/// An Ethernet frame: header plus opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ETHERNET_HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&self.header.serialize());
        buf.extend_from_slice(&self.payload);
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        let header = EthernetHeader::parse(buf)?;
        Ok(EthernetFrame {
            header,
            payload: buf[ETHERNET_HEADER_LEN..].to_vec(),
        })
    }
}

/// Render a hardware address as `aa:bb:cc:dd:ee:ff` for log lines
pub fn format_address(addr: &EthernetAddress) -> String {
    addr.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

// -- Unit tests --
