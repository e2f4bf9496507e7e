use crate::net::errors::HeaderError;
use crate::net::ethernet::EthernetAddress;

/// An ARP message for IPv4 over Ethernet (28 bytes on the wire)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: u16,
    pub sender_ethernet_address: EthernetAddress,
    pub sender_ip_address: u32,
    pub target_ethernet_address: EthernetAddress,
    pub target_ip_address: u32,
}

impl ArpMessage {
    pub const OPCODE_REQUEST: u16 = 1;
    pub const OPCODE_REPLY: u16 = 2;

    const HARDWARE_TYPE_ETHERNET: u16 = 1;
    const PROTOCOL_TYPE_IPV4: u16 = 0x0800;
    const WIRE_LEN: usize = 28;

    /// A broadcast request asking who holds `target_ip`
    pub fn request(
        sender_ethernet_address: EthernetAddress,
        sender_ip_address: u32,
        target_ip_address: u32,
    ) -> Self {
        ArpMessage {
            opcode: Self::OPCODE_REQUEST,
            sender_ethernet_address,
            sender_ip_address,
            target_ethernet_address: [0; 6], // unknown, that's the question
            target_ip_address,
        }
    }

    /// A reply answering `request` with our hardware address
    pub fn reply(
        sender_ethernet_address: EthernetAddress,
        sender_ip_address: u32,
        request: &ArpMessage,
    ) -> Self {
        ArpMessage {
            opcode: Self::OPCODE_REPLY,
            sender_ethernet_address,
            sender_ip_address,
            target_ethernet_address: request.sender_ethernet_address,
            target_ip_address: request.sender_ip_address,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::WIRE_LEN);
        buf.extend_from_slice(&Self::HARDWARE_TYPE_ETHERNET.to_be_bytes());
        buf.extend_from_slice(&Self::PROTOCOL_TYPE_IPV4.to_be_bytes());
        buf.push(6); // hardware address length
        buf.push(4); // protocol address length
        buf.extend_from_slice(&self.opcode.to_be_bytes());
        buf.extend_from_slice(&self.sender_ethernet_address);
        buf.extend_from_slice(&self.sender_ip_address.to_be_bytes());
        buf.extend_from_slice(&self.target_ethernet_address);
        buf.extend_from_slice(&self.target_ip_address.to_be_bytes());
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < Self::WIRE_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: Self::WIRE_LEN,
                found: buf.len(),
            });
        }

        let hardware_type = u16::from_be_bytes([buf[0], buf[1]]);
        let protocol_type = u16::from_be_bytes([buf[2], buf[3]]);
        if hardware_type != Self::HARDWARE_TYPE_ETHERNET
            || protocol_type != Self::PROTOCOL_TYPE_IPV4
            || buf[4] != 6
            || buf[5] != 4
        {
            return Err(HeaderError::UnsupportedArpType);
        }

        let mut sender_ethernet_address = [0u8; 6];
        let mut target_ethernet_address = [0u8; 6];
        sender_ethernet_address.copy_from_slice(&buf[8..14]);
        target_ethernet_address.copy_from_slice(&buf[18..24]);

        Ok(ArpMessage {
            opcode: u16::from_be_bytes([buf[6], buf[7]]),
            sender_ethernet_address,
            sender_ip_address: u32::from_be_bytes([buf[14], buf[15], buf[16], buf[17]]),
            target_ethernet_address,
            target_ip_address: u32::from_be_bytes([buf[24], buf[25], buf[26], buf[27]]),
        })
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_request_wire_layout() {
        let sender_ip = u32::from(Ipv4Addr::new(192, 168, 64, 100));
        let target_ip = u32::from(Ipv4Addr::new(192, 168, 64, 1));
        let msg = ArpMessage::request([0x02, 0, 0, 0, 0, 0x99], sender_ip, target_ip);

        let bytes = msg.serialize();
        assert_eq!(bytes.len(), 28);
        assert_eq!(&bytes[0..2], &[0, 1]); // hardware type: Ethernet
        assert_eq!(&bytes[2..4], &[0x08, 0x00]); // protocol type: IPv4
        assert_eq!(bytes[4], 6);
        assert_eq!(bytes[5], 4);
        assert_eq!(&bytes[6..8], &[0, 1]); // opcode: request
        assert_eq!(&bytes[18..24], &[0; 6]); // target hardware unknown
        assert_eq!(&bytes[24..28], &[192, 168, 64, 1]);

        assert_eq!(ArpMessage::parse(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_reply_addresses_requester() {
        let request = ArpMessage::request([0x02, 0, 0, 0, 0, 0x99], 100, 200);
        let reply = ArpMessage::reply([0x02, 0xaa, 0, 0, 0, 0x01], 200, &request);

        assert_eq!(reply.opcode, ArpMessage::OPCODE_REPLY);
        assert_eq!(reply.target_ethernet_address, request.sender_ethernet_address);
        assert_eq!(reply.target_ip_address, request.sender_ip_address);
        assert_eq!(reply.sender_ip_address, 200);
    }

    #[test]
    fn test_parse_rejects_non_ethernet_hardware() {
        let mut bytes = ArpMessage::request([0; 6], 1, 2).serialize();
        bytes[1] = 6; // IEEE 802 hardware type
        assert_eq!(
            ArpMessage::parse(&bytes),
            Err(HeaderError::UnsupportedArpType)
        );
    }

    #[test]
    fn test_parse_rejects_short_buffer() {
        assert!(ArpMessage::parse(&[0u8; 27]).is_err());
    }
}
