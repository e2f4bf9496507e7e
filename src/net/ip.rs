use crate::net::errors::HeaderError;
use bitflags::bitflags;
use std::net::Ipv4Addr;

bitflags! {
    /// The three control bits that share a wire u16 with the 13-bit
    /// fragment offset
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IpFlags: u16 {
        const RESERVED = 0x8000;
        const DONT_FRAGMENT = 0x4000;
        const MORE_FRAGMENTS = 0x2000;
    }
}

/// Low 13 bits of the flags/fragment-offset word
const FRAG_OFFSET_MASK: u16 = 0x1fff;

/// A 20-byte IPv4 header (no options) in host representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8, // always 4
    pub ihl: u8,     // header length in 32-bit words
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub flags: IpFlags,
    pub frag_offset: u16, // 13 bits, shares a u16 with the flags on the wire
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
}

impl Default for Ipv4Header {
    fn default() -> Self {
        Ipv4Header {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: 20,
            id: 0,
            flags: IpFlags::DONT_FRAGMENT,
            frag_offset: 0,
            ttl: 64,
            protocol: 6,
            checksum: 0,
            src_ip: Ipv4Addr::UNSPECIFIED,
            dst_ip: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl Ipv4Header {
    /// The 20 wire bytes of this header, with a fresh checksum
    fn to_bytes(&self) -> [u8; 20] {
        let mut buf = [0u8; 20];
        buf[0] = (self.version << 4) | self.ihl;
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&self.total_len.to_be_bytes());
        buf[4..6].copy_from_slice(&self.id.to_be_bytes());
        let flags_word = self.flags.bits() | (self.frag_offset & FRAG_OFFSET_MASK);
        buf[6..8].copy_from_slice(&flags_word.to_be_bytes());
        buf[8] = self.ttl;
        buf[9] = self.protocol;
        // bytes 10..12 stay zero while the checksum is computed
        buf[12..16].copy_from_slice(&self.src_ip.octets());
        buf[16..20].copy_from_slice(&self.dst_ip.octets());

        let checksum = Self::checksum(&buf);
        buf[10..12].copy_from_slice(&checksum.to_be_bytes());
        buf
    }

    /// Serialize into a 20-byte buffer, writing a fresh checksum.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, HeaderError> {
        if buf.len() < 20 {
            return Err(HeaderError::BufferTooSmall {
                expected: 20,
                found: buf.len(),
            });
        }
        buf[0..20].copy_from_slice(&self.to_bytes());
        Ok(20)
    }

    /// Parse and verify a header from the front of `buf`
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < 20 {
            return Err(HeaderError::BufferTooSmall {
                expected: 20,
                found: buf.len(),
            });
        }

        let version = buf[0] >> 4;
        if version != 4 {
            return Err(HeaderError::UnsupportedVersion(version));
        }

        let ihl = buf[0] & 0x0f;
        let header_len = ihl as usize * 4;
        if header_len < 20 || buf.len() < header_len {
            return Err(HeaderError::LengthMismatch);
        }

        if Self::checksum(&buf[0..header_len]) != 0 {
            return Err(HeaderError::BadChecksum("IPv4"));
        }

        let flags_word = u16::from_be_bytes([buf[6], buf[7]]);

        Ok(Ipv4Header {
            version,
            ihl,
            tos: buf[1],
            total_len: u16::from_be_bytes([buf[2], buf[3]]),
            id: u16::from_be_bytes([buf[4], buf[5]]),
            flags: IpFlags::from_bits_truncate(flags_word),
            frag_offset: flags_word & FRAG_OFFSET_MASK,
            ttl: buf[8],
            protocol: buf[9],
            checksum: u16::from_be_bytes([buf[10], buf[11]]),
            src_ip: Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            dst_ip: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
        })
    }

    /// Refresh the stored checksum after mutating header fields
    pub fn compute_checksum(&mut self) {
        let bytes = self.to_bytes();
        self.checksum = u16::from_be_bytes([bytes[10], bytes[11]]);
    }

    /// RFC 1071 one's-complement fold over the header bytes
    pub fn checksum(data: &[u8]) -> u16 {
        let sum: u32 = data
            .chunks(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]) as u32)
            .sum();

        let folded = (sum & 0xffff) + (sum >> 16);
        !(folded as u16)
    }
}

/// An IPv4 datagram: header plus opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Datagram {
    /// Build a datagram around `payload`, fixing up length and checksum
    pub fn new(mut header: Ipv4Header, payload: Vec<u8>) -> Self {
        header.total_len = (header.ihl as usize * 4 + payload.len()) as u16;
        header.compute_checksum();
        Ipv4Datagram { header, payload }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20 + self.payload.len());
        buf.extend_from_slice(&self.header.to_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        let header = Ipv4Header::parse(buf)?;
        let header_len = header.ihl as usize * 4;
        let total_len = header.total_len as usize;
        if total_len < header_len || buf.len() < total_len {
            return Err(HeaderError::LengthMismatch);
        }
        Ok(Ipv4Datagram {
            payload: buf[header_len..total_len].to_vec(),
            header,
        })
    }
}

// -- Unit tests --
