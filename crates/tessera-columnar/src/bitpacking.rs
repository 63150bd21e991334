#![forbid(unsafe_code)]

//! Fixed-width bit packing for encoded long payloads.
//!
//! Values are written MSB-first into a continuous bit stream, padded with zero bits to a whole
//! byte. Only a small set of widths is supported so decoders can stay branch-light.

pub const SUPPORTED_WIDTHS: [u8; 13] = [1, 2, 4, 8, 12, 16, 20, 24, 32, 40, 48, 56, 64];

/// Smallest supported width that can represent every value in `0..=max`.
pub fn bits_for_max(max: u64) -> u8 {
    let needed = (64 - max.leading_zeros()).max(1) as u8;
    SUPPORTED_WIDTHS
        .iter()
        .copied()
        .find(|&w| w >= needed)
        .unwrap_or(64)
}

pub fn is_supported_width(bits: u8) -> bool {
    SUPPORTED_WIDTHS.contains(&bits)
}

/// Bytes needed to hold `count` packed values of `bits` width.
pub fn packed_len(count: usize, bits: u8) -> Option<usize> {
    let total_bits = count.checked_mul(bits as usize)?;
    Some(total_bits.div_ceil(8))
}

pub struct BitPacker<'a> {
    out: &'a mut Vec<u8>,
    bits: u32,
    acc: u128,
    pending: u32,
}

impl<'a> BitPacker<'a> {
    pub fn new(out: &'a mut Vec<u8>, bits: u8) -> Self {
        debug_assert!(is_supported_width(bits), "unsupported width {bits}");
        Self {
            out,
            bits: bits as u32,
            acc: 0,
            pending: 0,
        }
    }

    pub fn push(&mut self, value: u64) {
        let mask = if self.bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        };
        debug_assert!(value <= mask, "value {value} does not fit in {} bits", self.bits);

        self.acc = (self.acc << self.bits) | (value & mask) as u128;
        self.pending += self.bits;
        while self.pending >= 8 {
            self.pending -= 8;
            self.out.push((self.acc >> self.pending) as u8);
        }
        self.acc &= (1u128 << self.pending) - 1;
    }

    /// Flushes the trailing partial byte, if any.
    pub fn finish(self) {
        if self.pending > 0 {
            self.out.push((self.acc << (8 - self.pending)) as u8);
        }
    }
}

/// Reads value `index` from a packed stream. The caller guarantees the stream holds at least
/// `index + 1` values (see [`packed_len`]).
pub fn unpack_at(buf: &[u8], index: usize, bits: u8) -> u64 {
    let bits = bits as usize;
    let start_bit = index * bits;
    let first = start_bit / 8;
    let last = (start_bit + bits - 1) / 8;

    let mut acc: u128 = 0;
    for &b in &buf[first..=last] {
        acc = (acc << 8) | b as u128;
    }
    let trailing = (last + 1) * 8 - (start_bit + bits);
    let value = acc >> trailing;
    if bits == 64 {
        value as u64
    } else {
        (value as u64) & ((1u64 << bits) - 1)
    }
}

#[cfg(test)]
pub fn unpack_all(buf: &[u8], count: usize, bits: u8) -> Vec<u64> {
    (0..count).map(|i| unpack_at(buf, i, bits)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_round_up_to_supported_sizes() {
        assert_eq!(bits_for_max(0), 1);
        assert_eq!(bits_for_max(1), 1);
        assert_eq!(bits_for_max(2), 2);
        assert_eq!(bits_for_max(255), 8);
        assert_eq!(bits_for_max(256), 12);
        assert_eq!(bits_for_max(1 << 32), 40);
        assert_eq!(bits_for_max(i64::MAX as u64), 64);
        assert_eq!(bits_for_max(u64::MAX), 64);
    }

    #[test]
    fn packs_msb_first() {
        let mut out = Vec::new();
        let mut packer = BitPacker::new(&mut out, 4);
        packer.push(0xA);
        packer.push(0x5);
        packer.push(0xF);
        packer.finish();
        assert_eq!(out, [0xA5, 0xF0]);
    }

    #[test]
    fn every_width_reads_back() {
        for &bits in &SUPPORTED_WIDTHS {
            let max = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
            let values: Vec<u64> = (0..37u64)
                .map(|i| max.wrapping_sub(i.wrapping_mul(0x9E37_79B9)) & max)
                .collect();

            let mut out = Vec::new();
            let mut packer = BitPacker::new(&mut out, bits);
            for &v in &values {
                packer.push(v);
            }
            packer.finish();

            assert_eq!(Some(out.len()), packed_len(values.len(), bits), "width {bits}");
            assert_eq!(unpack_all(&out, values.len(), bits), values, "width {bits}");
        }
    }
}
