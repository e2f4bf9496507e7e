use crate::net::ethernet::EthernetFrame;
use crate::net::interface::NetworkInterface;
use crate::net::ip::Ipv4Datagram;
use log::trace;
use std::collections::VecDeque;
use std::net::Ipv4Addr;

/// One routing-table entry: a prefix, where to send matching traffic,
/// and through which interface
#[derive(Debug, Clone)]
pub struct RouteInfo {
    prefix: u32,
    prefix_len: u8,
    next_hop: Option<Ipv4Addr>,
    interface_idx: usize,
}

impl RouteInfo {
    fn matches(&self, dst: Ipv4Addr) -> bool {
        if self.prefix_len == 0 {
            return true; // default route matches everything
        }
        let mask = 0xFFFF_FFFFu32 << (32 - self.prefix_len as u32);
        (u32::from(dst) & mask) == self.prefix
    }
}

/// A [`NetworkInterface`] plus a queue of the datagrams it has received
/// from the wire, for the router to drain.
#[derive(Debug)]
pub struct QueuedInterface {
    interface: NetworkInterface,
    datagrams_in: VecDeque<Ipv4Datagram>,
}

impl QueuedInterface {
    pub fn new(interface: NetworkInterface) -> Self {
        QueuedInterface {
            interface,
            datagrams_in: VecDeque::new(),
        }
    }

    /// Feed an inbound frame; received datagrams queue up for routing
    pub fn recv_frame(&mut self, frame: &EthernetFrame) {
        if let Some(dgram) = self.interface.recv_frame(frame) {
            self.datagrams_in.push_back(dgram);
        }
    }

    /// The next received datagram, if any
    pub fn maybe_receive(&mut self) -> Option<Ipv4Datagram> {
        self.datagrams_in.pop_front()
    }

    pub fn send_datagram(&mut self, dgram: &Ipv4Datagram, next_hop: Ipv4Addr) {
        self.interface.send_datagram(dgram, next_hop);
    }

    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.interface.maybe_send()
    }

    pub fn tick(&mut self, ms_since_last_tick: u64) {
        self.interface.tick(ms_since_last_tick);
    }
}

/// Routes IPv4 datagrams between several network interfaces by
/// longest-prefix match.
#[derive(Debug, Default)]
pub struct Router {
    interfaces: Vec<QueuedInterface>,
    routing_table: Vec<RouteInfo>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    /// Take ownership of an interface; returns its index for `add_route`
    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.interfaces.push(QueuedInterface::new(interface));
        self.interfaces.len() - 1
    }

    pub fn interface_mut(&mut self, idx: usize) -> &mut QueuedInterface {
        &mut self.interfaces[idx]
    }

    /// Register a route. `next_hop` of `None` means the destination is
    /// directly attached to the interface.
    pub fn add_route(
        &mut self,
        prefix: u32,
        prefix_len: u8,
        next_hop: Option<Ipv4Addr>,
        interface_idx: usize,
    ) {
        trace!(
            "adding route {}/{prefix_len} via interface {interface_idx}",
            Ipv4Addr::from(prefix)
        );
        self.routing_table.push(RouteInfo {
            prefix,
            prefix_len,
            next_hop,
            interface_idx,
        });
        // Longest prefix wins; the sort is stable so insertion order
        // breaks ties
        self.routing_table
            .sort_by(|a, b| b.prefix_len.cmp(&a.prefix_len));
    }

    /// Drain every interface's received datagrams and forward each one
    pub fn route(&mut self) {
        for idx in 0..self.interfaces.len() {
            while let Some(mut dgram) = self.interfaces[idx].maybe_receive() {
                let dst = dgram.header.dst_ip;
                let Some(route) = self.routing_table.iter().find(|r| r.matches(dst)) else {
                    trace!("no route to {dst}, dropping");
                    continue;
                };
                if dgram.header.ttl <= 1 {
                    trace!("TTL expired for {dst}, dropping");
                    continue;
                }

                dgram.header.ttl -= 1;
                dgram.header.compute_checksum();

                let next_hop = route.next_hop.unwrap_or(dst);
                self.interfaces[route.interface_idx].send_datagram(&dgram, next_hop);
            }
        }
    }
}

// -- Unit tests --
