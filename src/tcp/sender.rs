use crate::tcp::byte_stream::Reader;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;
use std::collections::VecDeque;

/// The most payload bytes a single segment will carry
pub const MAX_PAYLOAD_SIZE: u64 = 1452;

/// The sending side of a TCP connection.
///
/// Slices the outbound byte stream into segments that respect the
/// peer's advertised window, placing exactly one SYN at the front of
/// the connection and one FIN at the end. Segments wait in `ready`
/// until the owner collects them with [`maybe_send`](Self::maybe_send),
/// and stay in `outstanding` until acknowledged. A single
/// retransmission alarm re-sends the oldest outstanding segment on
/// expiry, doubling the timeout each time the peer's window is open.
#[derive(Debug)]
pub struct TcpSender {
    isn: Wrap32,
    initial_rto_ms: u64,
    rto_ms: u64,
    next_abs_seqno: u64, // sequence space consumed so far (SYN + payload + FIN)
    window_size: u64,
    elapsed_ms: u64, // time since the alarm was last armed
    retransmissions: u64,
    syn_sent: bool,
    fin_sent: bool,
    outstanding: VecDeque<(u64, TcpSenderMessage)>, // (abs seqno, segment), ordered
    ready: VecDeque<TcpSenderMessage>,
}

impl TcpSender {
    /// New sender with the given initial retransmission timeout. Pass a
    /// fixed ISN for deterministic behavior; otherwise one is drawn at
    /// random.
    pub fn new(initial_rto_ms: u64, fixed_isn: Option<Wrap32>) -> Self {
        TcpSender {
            isn: fixed_isn.unwrap_or_else(|| Wrap32::new(rand::random())),
            initial_rto_ms,
            rto_ms: initial_rto_ms,
            next_abs_seqno: 0,
            window_size: 1,
            elapsed_ms: 0,
            retransmissions: 0,
            syn_sent: false,
            fin_sent: false,
            outstanding: VecDeque::new(),
            ready: VecDeque::new(),
        }
    }

    /// Fill the peer's window with segments drawn from `reader`
    pub fn push(&mut self, reader: &mut Reader) {
        // A closed window still admits a one-unit probe
        let window = if self.window_size == 0 { 1 } else { self.window_size };
        let mut remaining = window.saturating_sub(self.sequence_numbers_in_flight());

        while remaining > 0 && !self.fin_sent {
            let mut msg = TcpSenderMessage {
                seqno: Wrap32::wrap(self.next_abs_seqno, self.isn),
                ..TcpSenderMessage::default()
            };

            if !self.syn_sent {
                msg.syn = true;
                self.syn_sent = true;
            }

            let budget = remaining - msg.syn as u64;
            let take = budget.min(MAX_PAYLOAD_SIZE).min(reader.bytes_buffered());
            msg.payload = Self::read_payload(reader, take);

            // The FIN needs a window unit of its own
            if reader.is_finished() && budget > take {
                msg.fin = true;
                self.fin_sent = true;
            }

            let len = msg.sequence_length();
            if len == 0 {
                break;
            }

            self.outstanding.push_back((self.next_abs_seqno, msg.clone()));
            self.ready.push_back(msg);
            self.next_abs_seqno += len;
            remaining -= len;
        }
    }

    /// The next segment awaiting transmission, if any
    pub fn maybe_send(&mut self) -> Option<TcpSenderMessage> {
        self.ready.pop_front()
    }

    /// A zero-length segment stamped with the current seqno, for
    /// carrying ackno-only replies
    pub fn send_empty_message(&self) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::wrap(self.next_abs_seqno, self.isn),
            ..TcpSenderMessage::default()
        }
    }

    /// Process an ack and window advertisement from the peer
    pub fn receive(&mut self, msg: &TcpReceiverMessage) {
        self.window_size = msg.window_size as u64;

        let Some(ackno) = msg.ackno else {
            return;
        };
        let ack_abs = ackno.unwrap(self.isn, self.next_abs_seqno);
        if ack_abs > self.next_abs_seqno {
            return; // acking sequence space never sent
        }

        // Retire every segment the ack covers entirely
        let mut acked = false;
        while let Some((abs_seqno, segment)) = self.outstanding.front() {
            if abs_seqno + segment.sequence_length() > ack_abs {
                break;
            }
            self.outstanding.pop_front();
            acked = true;
        }

        if acked {
            self.rto_ms = self.initial_rto_ms;
            self.elapsed_ms = 0;
            self.retransmissions = 0;
        }
    }

    /// Advance time by `ms_since_last_tick` milliseconds
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        self.elapsed_ms += ms_since_last_tick;
        if self.elapsed_ms < self.rto_ms {
            return;
        }

        if let Some((_, segment)) = self.outstanding.front() {
            self.ready.push_front(segment.clone());
            // A zero-window probe going unanswered is not congestion
            if self.window_size > 0 {
                self.retransmissions += 1;
                self.rto_ms *= 2;
            }
        }
        self.elapsed_ms = 0;
    }

    /// Total sequence space currently unacknowledged
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.outstanding
            .iter()
            .map(|(_, segment)| segment.sequence_length())
            .sum()
    }

    /// How many consecutive retransmissions have happened
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.retransmissions
    }

    fn read_payload(reader: &mut Reader, len: u64) -> Vec<u8> {
        let mut payload = Vec::with_capacity(len as usize);
        while (payload.len() as u64) < len {
            let front = reader.peek();
            if front.is_empty() {
                break;
            }
            let take = (len as usize - payload.len()).min(front.len());
            payload.extend_from_slice(&front[..take]);
            reader.pop(take as u64);
        }
        payload
    }
}

// -- Unit tests --
