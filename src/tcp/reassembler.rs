use crate::tcp::byte_stream::Writer;
use std::collections::VecDeque;

/// Reassembles out-of-order byte fragments into a contiguous stream.
///
/// Fragments are indexed by their absolute position in the stream. The
/// reassembler only stores bytes inside the acceptance window
/// `[bytes_pushed, bytes_pushed + available_capacity)` of the output
/// writer; everything else is dropped. Whenever the front of the window
/// becomes contiguous it is flushed into the writer.
#[derive(Debug, Default)]
pub struct Reassembler {
    slots: VecDeque<(u8, bool)>, // acceptance window, slot 0 = next byte the writer expects
    pending: u64,                // filled slots not yet flushed
    last_seen: bool,             // has the terminating fragment been observed?
    last_index: u64,             // one past the final byte, valid once last_seen
}

impl Reassembler {
    pub fn new() -> Self {
        Reassembler::default()
    }

    /// Insert the fragment `data` starting at absolute index `first_index`.
    /// `is_last` marks the fragment that ends the stream.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool, writer: &mut Writer) {
        let unassembled = writer.bytes_pushed();
        let window_end = unassembled + writer.available_capacity();

        if is_last {
            self.last_seen = true;
            self.last_index = first_index + data.len() as u64;
        }

        // Wholly unusable: nothing to store, but the terminator above may
        // still end the stream.
        if data.is_empty() || first_index >= window_end {
            self.maybe_close(writer);
            return;
        }

        // Trim to the acceptance window
        let start = first_index.max(unassembled);
        let end = (first_index + data.len() as u64).min(window_end);

        if start < end {
            let offset = (start - first_index) as usize;
            let kept = &data[offset..offset + (end - start) as usize];

            let needed = (end - unassembled) as usize;
            if self.slots.len() < needed {
                self.slots.resize(needed, (0, false));
            }

            let base = (start - unassembled) as usize;
            for (i, &byte) in kept.iter().enumerate() {
                let (slot, filled) = &mut self.slots[base + i];
                if !*filled {
                    *slot = byte;
                    *filled = true;
                    self.pending += 1;
                }
            }
        }

        self.flush(writer);
        self.maybe_close(writer);
    }

    /// The number of bytes stored but not yet flushed to the writer
    pub fn bytes_pending(&self) -> u64 {
        self.pending
    }

    /// Push the contiguous run at the front of the window into the writer
    fn flush(&mut self, writer: &mut Writer) {
        let run = self.slots.iter().take_while(|(_, filled)| *filled).count();
        if run == 0 {
            return;
        }
        let package: Vec<u8> = self.slots.drain(..run).map(|(byte, _)| byte).collect();
        writer.push(&package);
        self.pending -= run as u64;
    }

    fn maybe_close(&self, writer: &mut Writer) {
        if self.last_seen && self.pending == 0 && writer.bytes_pushed() == self.last_index {
            writer.close();
        }
    }
}

// -- Unit tests --
