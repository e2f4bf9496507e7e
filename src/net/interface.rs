use crate::net::arp::ArpMessage;
use crate::net::ethernet::{
    format_address, EthernetAddress, EthernetFrame, EthernetHeader, ETHERNET_BROADCAST,
    ETHERTYPE_ARP, ETHERTYPE_IPV4,
};
use crate::net::ip::Ipv4Datagram;
use log::{debug, trace};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

/// How long a learned IP-to-Ethernet mapping stays valid
const MAPPING_TTL_MS: u64 = 30_000;

/// How long before an unanswered ARP request may be repeated
const REQUEST_COOLDOWN_MS: u64 = 5_000;

#[derive(Debug)]
struct Mapping {
    eth: EthernetAddress,
    age_ms: u64,
}

/// A network interface: translates IPv4 datagrams to and from Ethernet
/// frames, resolving next-hop addresses with ARP.
///
/// Datagrams whose next hop is not yet resolved are parked until the
/// ARP reply arrives; at most one request per next hop is outstanding
/// within the cool-down period. All timing is driven externally through
/// [`tick`](Self::tick).
#[derive(Debug)]
pub struct NetworkInterface {
    ethernet_address: EthernetAddress,
    ip_address: Ipv4Addr,
    mappings: HashMap<u32, Mapping>,            // resolved next hops
    requests_in_flight: HashMap<u32, u64>,      // next hop -> ms since ARP request
    pending: HashMap<u32, VecDeque<EthernetFrame>>, // frames awaiting resolution
    out_queue: VecDeque<EthernetFrame>,
}

impl NetworkInterface {
    pub fn new(ethernet_address: EthernetAddress, ip_address: Ipv4Addr) -> Self {
        debug!(
            "network interface has Ethernet address {} and IP address {}",
            format_address(&ethernet_address),
            ip_address
        );
        NetworkInterface {
            ethernet_address,
            ip_address,
            mappings: HashMap::new(),
            requests_in_flight: HashMap::new(),
            pending: HashMap::new(),
            out_queue: VecDeque::new(),
        }
    }

    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    /// Send `dgram` toward `next_hop`, resolving its Ethernet address
    /// first if necessary
    pub fn send_datagram(&mut self, dgram: &Ipv4Datagram, next_hop: Ipv4Addr) {
        let hop = u32::from(next_hop);
        let frame = self.encapsulate(dgram);

        if let Some(mapping) = self.mappings.get(&hop) {
            let mut frame = frame;
            frame.header.dst = mapping.eth;
            self.out_queue.push_back(frame);
            return;
        }

        // Park the frame; its destination is stamped when the reply lands
        self.pending.entry(hop).or_default().push_back(frame);

        if !self.requests_in_flight.contains_key(&hop) {
            trace!("sending ARP request for {next_hop}");
            let request = ArpMessage::request(
                self.ethernet_address,
                u32::from(self.ip_address),
                hop,
            );
            self.out_queue.push_back(EthernetFrame {
                header: EthernetHeader {
                    dst: ETHERNET_BROADCAST,
                    src: self.ethernet_address,
                    ethertype: ETHERTYPE_ARP,
                },
                payload: request.serialize(),
            });
            self.requests_in_flight.insert(hop, 0);
        }
    }

    /// Process an inbound frame. Returns the datagram when the frame
    /// carries IPv4 addressed to us; ARP frames are handled internally.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<Ipv4Datagram> {
        if frame.header.dst != self.ethernet_address && frame.header.dst != ETHERNET_BROADCAST {
            return None;
        }

        match frame.header.ethertype {
            ETHERTYPE_IPV4 => Ipv4Datagram::parse(&frame.payload).ok(),
            ETHERTYPE_ARP => {
                let Ok(message) = ArpMessage::parse(&frame.payload) else {
                    return None;
                };
                self.learn(&message);
                if message.opcode == ArpMessage::OPCODE_REQUEST
                    && message.target_ip_address == u32::from(self.ip_address)
                {
                    trace!(
                        "replying to ARP request from {}",
                        Ipv4Addr::from(message.sender_ip_address)
                    );
                    let reply = ArpMessage::reply(
                        self.ethernet_address,
                        u32::from(self.ip_address),
                        &message,
                    );
                    self.out_queue.push_back(EthernetFrame {
                        header: EthernetHeader {
                            dst: message.sender_ethernet_address,
                            src: self.ethernet_address,
                            ethertype: ETHERTYPE_ARP,
                        },
                        payload: reply.serialize(),
                    });
                }
                None
            }
            _ => None,
        }
    }

    /// Advance all ARP timers by `ms_since_last_tick` milliseconds
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        let pending = &mut self.pending;
        self.mappings.retain(|hop, mapping| {
            mapping.age_ms += ms_since_last_tick;
            if mapping.age_ms > MAPPING_TTL_MS {
                // The answer went stale; anything still parked rides on it
                pending.remove(hop);
                false
            } else {
                true
            }
        });

        self.requests_in_flight.retain(|_, age_ms| {
            *age_ms += ms_since_last_tick;
            *age_ms <= REQUEST_COOLDOWN_MS
        });
    }

    /// The next frame awaiting transmission, if any
    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.out_queue.pop_front()
    }

    /// Record the sender mapping from an ARP message and flush every
    /// frame that was waiting for it
    fn learn(&mut self, message: &ArpMessage) {
        trace!(
            "learned {} is at {}",
            Ipv4Addr::from(message.sender_ip_address),
            format_address(&message.sender_ethernet_address)
        );
        self.mappings.insert(
            message.sender_ip_address,
            Mapping {
                eth: message.sender_ethernet_address,
                age_ms: 0,
            },
        );

        if let Some(parked) = self.pending.remove(&message.sender_ip_address) {
            for mut frame in parked {
                frame.header.dst = message.sender_ethernet_address;
                self.out_queue.push_back(frame);
            }
        }
    }

    fn encapsulate(&self, dgram: &Ipv4Datagram) -> EthernetFrame {
        EthernetFrame {
            header: EthernetHeader {
                dst: ETHERNET_BROADCAST, // placeholder until the hop resolves
                src: self.ethernet_address,
                ethertype: ETHERTYPE_IPV4,
            },
            payload: dgram.serialize(),
        }
    }
}

// -- Unit tests --
