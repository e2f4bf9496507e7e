use std::ops::Add;

/// A 32-bit sequence number that wraps around modulo 2^32.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    /// The raw 32-bit wire value
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute 64-bit `seq_no` relative to the zero point `zero`
    pub fn wrap(n: u64, zero: Wrap32) -> Self {
        zero + (n & 0xFFFF_FFFF) as u32
    }

    /// Unwrap into the absolute 64-bit `seq_no` closest to `checkpoint`
    pub fn unwrap(&self, zero: Wrap32, checkpoint: u64) -> u64 {
        let wrap_size: u64 = 1 << 32;

        // Offset from the zero point, modulo 2^32
        let offset = self.value.wrapping_sub(zero.value) as u64;

        // Candidate in the same 2^32 block as the checkpoint. Step down one
        // block when we overshot, unless the candidate has no block to give
        // (checkpoint in the first block).
        let mut low = offset + (checkpoint - (checkpoint % wrap_size));
        if low >= checkpoint && low >= wrap_size {
            low -= wrap_size;
        }

        // Pick whichever of `low` and `low + 2^32` is nearer to the
        // checkpoint, ties going to the lower candidate.
        if checkpoint.abs_diff(low) <= wrap_size / 2 {
            low
        } else {
            low + wrap_size
        }
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(rhs))
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;

    // -- Test wrapping --

    #[test]
    fn test_wrap_zero_offset() {
        let wrapped = Wrap32::wrap(3 * (1u64 << 32), Wrap32::new(0));
        assert_eq!(wrapped, Wrap32::new(0));
    }

    #[test]
    fn test_wrap_positive_offset() {
        let wrapped = Wrap32::wrap(3 * (1u64 << 32) + 17, Wrap32::new(15));
        assert_eq!(wrapped, Wrap32::new(32));
    }

    #[test]
    fn test_wrap_negative_offset() {
        let wrapped = Wrap32::wrap(7 * (1u64 << 32) - 2, Wrap32::new(15));
        assert_eq!(wrapped, Wrap32::new(13));
    }

    // -- Test unwrapping --

    #[test]
    fn test_unwrap_first_sequence_after_isn_zero() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), 0);
        assert_eq!(unwrapped, 1u64)
    }

    #[test]
    fn test_unwrap_first_sequence_after_first_wraparound() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), u32::MAX as u64);
        assert_eq!(unwrapped, (1u64 << 32) + 1)
    }

    #[test]
    fn test_unwrap_last_sequence_before_third_wraparound() {
        let unwrapped = Wrap32::new(u32::MAX - 1).unwrap(Wrap32::new(0), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 2);
    }

    #[test]
    fn test_unwrap_tenth_before_third_wraparound() {
        let unwrapped = Wrap32::new(u32::MAX - 10).unwrap(Wrap32::new(0), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 11);
    }

    #[test]
    fn test_unwrap_with_nonzero_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(10), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 11);
    }

    #[test]
    fn test_unwrap_max_wrapped_value_with_zero_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(0), 0);
        assert_eq!(unwrapped, u32::MAX as u64);
    }

    #[test]
    fn test_unwrap_value_equals_isn_returns_zero() {
        let unwrapped = Wrap32::new(16).unwrap(Wrap32::new(16), 0);
        assert_eq!(unwrapped, 0u64);
    }

    #[test]
    fn test_unwrap_max_value_with_nonzero_isn() {
        let unwrapped = Wrap32::new(15).unwrap(Wrap32::new(16), 0);
        assert_eq!(unwrapped, u32::MAX as u64);
    }

    #[test]
    fn test_unwrap_zero_value_with_large_isn() {
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(i32::MAX as u32), 0);
        assert_eq!(unwrapped, (i32::MAX as u64) + 2);
    }

    #[test]
    fn test_unwrap_max_value_with_max_isn_returns_half_wrap() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(i32::MAX as u32), 0);
        assert_eq!(unwrapped, (1u64) << 31);
    }

    #[test]
    fn test_unwrap_near_checkpoint_before_wrap_boundary() {
        let wrapped = Wrap32::wrap(3 * (1u64 << 32), Wrap32::new(0));
        let unwrapped = wrapped.unwrap(Wrap32::new(0), 3 * (1u64 << 32) - 10);
        assert_eq!(unwrapped, 3 * (1u64 << 32));
    }

    #[test]
    fn test_unwrap_round_trip() {
        let zeros = [Wrap32::new(0), Wrap32::new(17), Wrap32::new(u32::MAX - 3)];
        let values = [
            0u64,
            1,
            u32::MAX as u64,
            1u64 << 32,
            (1u64 << 32) + 5,
            3 * (1u64 << 32) - 1,
            (1u64 << 40) + 12345,
        ];
        for &zero in &zeros {
            for &n in &values {
                assert_eq!(Wrap32::wrap(n, zero).unwrap(zero, n), n);
            }
        }
    }

    // -- Test `+` operator overload --

    #[test]
    fn test_add() {
        assert_eq!(Wrap32::new(1) + 2, Wrap32::new(3));
    }

    #[test]
    fn test_add_overflow() {
        assert_eq!(Wrap32::new(u32::MAX) + 1, Wrap32::new(0));
    }
}
