use crate::net::errors::HeaderError;
use crate::net::ip::Ipv4Header;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;
use bitflags::bitflags;

bitflags! {
    /// The control bits in byte 13 of the header, FIN lowest
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TcpFlags: u8 {
        const FIN = 0x01;
        const SYN = 0x02;
        const RST = 0x04;
        const PSH = 0x08;
        const ACK = 0x10;
        const URG = 0x20;
        const ECE = 0x40;
        const CWR = 0x80;
    }
}

/// A TCP segment header plus its payload, in host representation.
///
/// Outbound headers are always 20 bytes (no options). Inbound headers
/// may carry options; the option bytes are skipped, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_no: Wrap32,
    pub ack_no: Wrap32,
    pub data_offset: u8, // header length in 32-bit words
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent: u16,
    pub payload: Vec<u8>,
}

impl Default for TcpHeader {
    fn default() -> Self {
        TcpHeader {
            src_port: 0,
            dst_port: 0,
            seq_no: Wrap32::new(0),
            ack_no: Wrap32::new(0),
            data_offset: 5,
            flags: TcpFlags::empty(),
            window: 0,
            checksum: 0,
            urgent: 0,
            payload: Vec::new(),
        }
    }
}

impl TcpHeader {
    /// Build a wire header from a segment and the ack/window to piggyback.
    /// The ACK flag is set only when the receiver message carries an ackno.
    pub fn from_messages(
        segment: &TcpSenderMessage,
        ack: &TcpReceiverMessage,
        src_port: u16,
        dst_port: u16,
    ) -> Self {
        let mut flags = TcpFlags::empty();
        flags.set(TcpFlags::SYN, segment.syn);
        flags.set(TcpFlags::FIN, segment.fin);
        flags.set(TcpFlags::ACK, ack.ackno.is_some());

        TcpHeader {
            src_port,
            dst_port,
            seq_no: segment.seqno,
            ack_no: ack.ackno.unwrap_or(Wrap32::new(0)),
            flags,
            window: ack.window_size,
            payload: segment.payload.clone(),
            ..TcpHeader::default()
        }
    }

    /// The sender-side message carried by this header
    pub fn sender_message(&self) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: self.seq_no,
            syn: self.flags.contains(TcpFlags::SYN),
            payload: self.payload.clone(),
            fin: self.flags.contains(TcpFlags::FIN),
        }
    }

    /// The receiver-side message carried by this header
    pub fn receiver_message(&self) -> TcpReceiverMessage {
        TcpReceiverMessage {
            ackno: self.flags.contains(TcpFlags::ACK).then_some(self.ack_no),
            window_size: self.window,
        }
    }

    /// Serialize into `buf`, computing the pseudo-header checksum from
    /// `iph`. Returns the number of bytes written.
    pub fn serialize(&self, buf: &mut [u8], iph: &Ipv4Header) -> Result<usize, HeaderError> {
        let header_len = self.data_offset as usize * 4;
        let total_len = header_len + self.payload.len();

        if buf.len() < total_len {
            return Err(HeaderError::BufferTooSmall {
                expected: total_len,
                found: buf.len(),
            });
        }

        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        buf[4..8].copy_from_slice(&self.seq_no.value().to_be_bytes());
        buf[8..12].copy_from_slice(&self.ack_no.value().to_be_bytes());
        buf[12] = self.data_offset << 4;
        buf[13] = self.flags.bits();
        buf[14..16].copy_from_slice(&self.window.to_be_bytes());
        buf[16..18].fill(0); // checksum computed below
        buf[18..20].copy_from_slice(&self.urgent.to_be_bytes());
        buf[20..header_len].fill(0);
        buf[header_len..total_len].copy_from_slice(&self.payload);

        let checksum = Self::checksum(&buf[..total_len], iph);
        buf[16..18].copy_from_slice(&checksum.to_be_bytes());

        Ok(total_len)
    }

    /// Parse a TCP segment, verifying the pseudo-header checksum
    pub fn parse(buf: &[u8], iph: &Ipv4Header) -> Result<Self, HeaderError> {
        if buf.len() < 20 {
            return Err(HeaderError::BufferTooSmall {
                expected: 20,
                found: buf.len(),
            });
        }

        let data_offset = buf[12] >> 4;
        let header_len = data_offset as usize * 4;
        if header_len < 20 || buf.len() < header_len {
            return Err(HeaderError::BufferTooSmall {
                expected: header_len.max(20),
                found: buf.len(),
            });
        }

        if Self::checksum(buf, iph) != 0 {
            return Err(HeaderError::BadChecksum("TCP"));
        }

        Ok(TcpHeader {
            src_port: u16::from_be_bytes([buf[0], buf[1]]),
            dst_port: u16::from_be_bytes([buf[2], buf[3]]),
            seq_no: Wrap32::new(u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]])),
            ack_no: Wrap32::new(u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]])),
            data_offset,
            flags: TcpFlags::from_bits_truncate(buf[13]),
            window: u16::from_be_bytes([buf[14], buf[15]]),
            checksum: u16::from_be_bytes([buf[16], buf[17]]),
            urgent: u16::from_be_bytes([buf[18], buf[19]]),
            payload: buf[header_len..].to_vec(),
        })
    }

    /// One's-complement sum over the IPv4 pseudo-header and the segment
    pub fn checksum(data: &[u8], iph: &Ipv4Header) -> u16 {
        let mut sum: u32 = 0;

        let src = iph.src_ip.octets();
        let dst = iph.dst_ip.octets();
        sum += u16::from_be_bytes([src[0], src[1]]) as u32;
        sum += u16::from_be_bytes([src[2], src[3]]) as u32;
        sum += u16::from_be_bytes([dst[0], dst[1]]) as u32;
        sum += u16::from_be_bytes([dst[2], dst[3]]) as u32;
        sum += iph.protocol as u32;
        sum += data.len() as u32;

        let mut chunks = data.chunks_exact(2);
        for chunk in &mut chunks {
            sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        }
        if let [last] = chunks.remainder() {
            sum += (*last as u32) << 8;
        }

        while sum > 0xffff {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !(sum as u16)
    }
}

// -- Unit tests --
