use crate::tcp::byte_stream::Writer;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::reassembler::Reassembler;
use crate::tcp::wrap32::Wrap32;

/// The receiving side of a TCP connection.
///
/// Translates inbound segments into stream-indexed fragments for the
/// [`Reassembler`], and reports the ackno and window back to the peer.
/// Until a SYN has been seen there is no zero point to unwrap against,
/// so every segment is dropped and no ackno is advertised.
#[derive(Debug, Default)]
pub struct TcpReceiver {
    syn_received: bool,
    zero: Wrap32, // the peer's ISN, valid once syn_received
}

impl TcpReceiver {
    pub fn new() -> Self {
        TcpReceiver::default()
    }

    /// Process one inbound segment, feeding its payload to `reassembler`
    pub fn receive(
        &mut self,
        message: &TcpSenderMessage,
        reassembler: &mut Reassembler,
        writer: &mut Writer,
    ) {
        if message.syn {
            self.syn_received = true;
            self.zero = message.seqno;
        }
        if !self.syn_received {
            return;
        }

        // The next byte the reassembler wants sits one past the SYN
        let checkpoint = writer.bytes_pushed() + 1;
        let abs_seqno = message.seqno.unwrap(self.zero, checkpoint);

        // A non-SYN segment claiming the ISN's sequence slot is nonsense
        if !message.syn && abs_seqno == 0 {
            return;
        }

        // The SYN occupies absolute seqno 0, so payload bytes start at
        // stream index abs_seqno - 1 (or 0 for the SYN segment itself).
        let index = if message.syn { abs_seqno } else { abs_seqno - 1 };
        reassembler.insert(index, &message.payload, message.fin, writer);
    }

    /// The ackno and window advertisement to send back to the peer
    pub fn send(&self, writer: &Writer) -> TcpReceiverMessage {
        let ackno = self.syn_received.then(|| {
            let fin = writer.is_closed() as u64;
            Wrap32::wrap(1 + writer.bytes_pushed() + fin, self.zero)
        });
        TcpReceiverMessage {
            ackno,
            window_size: writer.available_capacity().min(65_535) as u16,
        }
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::byte_stream::ByteStream;

    fn segment(seqno: u32, payload: &[u8], syn: bool, fin: bool) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::new(seqno),
            syn,
            payload: payload.to_vec(),
            fin,
        }
    }

    #[test]
    fn test_no_ackno_before_syn() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(100, b"hello", false, false), &mut ra, &mut stream.writer());
        assert_eq!(stream.writer().bytes_pushed(), 0);

        let msg = rcv.send(&stream.writer());
        assert_eq!(msg.ackno, None);
        assert_eq!(msg.window_size, 64);
    }

    #[test]
    fn test_syn_sets_ackno() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(1000, b"", true, false), &mut ra, &mut stream.writer());

        let msg = rcv.send(&stream.writer());
        assert_eq!(msg.ackno, Some(Wrap32::new(1001)));
    }

    #[test]
    fn test_payload_advances_ackno() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(1000, b"", true, false), &mut ra, &mut stream.writer());
        rcv.receive(&segment(1001, b"hello", false, false), &mut ra, &mut stream.writer());

        assert_eq!(stream.writer().bytes_pushed(), 5);
        assert_eq!(rcv.send(&stream.writer()).ackno, Some(Wrap32::new(1006)));
    }

    #[test]
    fn test_syn_with_payload() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(42, b"abc", true, false), &mut ra, &mut stream.writer());
        assert_eq!(stream.writer().bytes_pushed(), 3);
        assert_eq!(rcv.send(&stream.writer()).ackno, Some(Wrap32::new(46)));
    }

    #[test]
    fn test_fin_adds_to_ackno_once_stream_closed() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(0, b"", true, false), &mut ra, &mut stream.writer());
        rcv.receive(&segment(1, b"hi", false, true), &mut ra, &mut stream.writer());

        assert!(stream.writer().is_closed());
        // 0 (SYN) + 2 bytes + FIN -> next needed is 4
        assert_eq!(rcv.send(&stream.writer()).ackno, Some(Wrap32::new(4)));
    }

    #[test]
    fn test_out_of_order_segment_held_back() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(0, b"", true, false), &mut ra, &mut stream.writer());
        rcv.receive(&segment(4, b"def", false, false), &mut ra, &mut stream.writer());

        assert_eq!(stream.writer().bytes_pushed(), 0);
        assert_eq!(ra.bytes_pending(), 3);
        assert_eq!(rcv.send(&stream.writer()).ackno, Some(Wrap32::new(1)));

        rcv.receive(&segment(1, b"abc", false, false), &mut ra, &mut stream.writer());
        assert_eq!(stream.writer().bytes_pushed(), 6);
        assert_eq!(rcv.send(&stream.writer()).ackno, Some(Wrap32::new(7)));
    }

    #[test]
    fn test_ackno_wraps_around() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(u32::MAX, b"", true, false), &mut ra, &mut stream.writer());
        assert_eq!(rcv.send(&stream.writer()).ackno, Some(Wrap32::new(0)));

        rcv.receive(&segment(0, b"ab", false, false), &mut ra, &mut stream.writer());
        assert_eq!(stream.writer().bytes_pushed(), 2);
        assert_eq!(rcv.send(&stream.writer()).ackno, Some(Wrap32::new(2)));
    }

    #[test]
    fn test_segment_in_isn_slot_without_syn_is_dropped() {
        let mut stream = ByteStream::new(64);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(500, b"", true, false), &mut ra, &mut stream.writer());
        rcv.receive(&segment(500, b"junk", false, false), &mut ra, &mut stream.writer());

        assert_eq!(stream.writer().bytes_pushed(), 0);
        assert_eq!(ra.bytes_pending(), 0);
    }

    #[test]
    fn test_window_size_clamped() {
        let mut stream = ByteStream::new(1 << 20);
        let rcv = TcpReceiver::new();

        assert_eq!(rcv.send(&stream.writer()).window_size, 65_535);
    }

    #[test]
    fn test_window_size_tracks_capacity() {
        let mut stream = ByteStream::new(10);
        let mut ra = Reassembler::new();
        let mut rcv = TcpReceiver::new();

        rcv.receive(&segment(0, b"", true, false), &mut ra, &mut stream.writer());
        rcv.receive(&segment(1, b"abcdef", false, false), &mut ra, &mut stream.writer());

        assert_eq!(rcv.send(&stream.writer()).window_size, 4);

        stream.reader().pop(6);
        assert_eq!(rcv.send(&stream.writer()).window_size, 10);
    }
}
