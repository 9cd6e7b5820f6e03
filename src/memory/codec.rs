// Tue Jan 13 2026 - Alex

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::W8),
            16 => Some(Self::W16),
            32 => Some(Self::W32),
            64 => Some(Self::W64),
            _ => None,
        }
    }

    fn mask(self) -> u64 {
        match self {
            Self::W64 => u64::MAX,
            _ => (1u64 << self.bits()) - 1,
        }
    }
}

/// Two's-complement reinterpretation of the low `bits` bits of `value`.
pub fn int_to_signed(value: u64, bits: u32) -> i64 {
    let bits = bits.clamp(1, 64);
    let value = if bits == 64 { value } else { value & ((1u64 << bits) - 1) };
    if value >= 1u64 << (bits - 1) {
        (value as i128 - (1i128 << bits)) as i64
    } else {
        value as i64
    }
}

pub fn decode_unsigned(bytes: &[u8], width: Width) -> u64 {
    let mut buf = [0u8; 8];
    let n = bytes.len().min(width.bytes());
    buf[..n].copy_from_slice(&bytes[..n]);
    u64::from_le_bytes(buf)
}

pub fn decode_signed(bytes: &[u8], width: Width) -> i64 {
    int_to_signed(decode_unsigned(bytes, width), width.bits())
}

pub fn decode(bytes: &[u8], width: Width, signed: bool) -> i128 {
    if signed {
        decode_signed(bytes, width) as i128
    } else {
        decode_unsigned(bytes, width) as i128
    }
}

pub fn encode(value: i128, width: Width) -> Vec<u8> {
    let raw = (value as u128 as u64) & width.mask();
    raw.to_le_bytes()[..width.bytes()].to_vec()
}

pub fn decode_f32(bytes: &[u8]) -> f32 {
    f32::from_bits(decode_unsigned(bytes, Width::W32) as u32)
}

pub fn decode_f64(bytes: &[u8]) -> f64 {
    f64::from_bits(decode_unsigned(bytes, Width::W64))
}

pub fn encode_f32(value: f32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

pub fn encode_f64(value: f64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_to_signed_boundaries() {
        for bits in [8u32, 16, 32, 64] {
            let half = 1u128 << (bits - 1);
            let full = 1u128 << bits;
            assert_eq!(int_to_signed(0, bits), 0);
            assert_eq!(int_to_signed((half - 1) as u64, bits) as i128, half as i128 - 1);
            assert_eq!(int_to_signed(half as u64, bits) as i128, -(half as i128));
            assert_eq!(int_to_signed((full - 1) as u64, bits), -1);
        }
    }

    #[test]
    fn test_int_to_signed_literals() {
        assert_eq!(int_to_signed(127, 8), 127);
        assert_eq!(int_to_signed(128, 8), -128);
        assert_eq!(int_to_signed(255, 8), -1);
        assert_eq!(int_to_signed(2u64.pow(15), 16), -(2i64.pow(15)));
        assert_eq!(int_to_signed(u64::MAX, 64), -1);
    }

    #[test]
    fn test_reinterpret_across_signedness() {
        let bytes = encode(-5, Width::W8);
        assert_eq!(bytes, vec![251]);
        assert_eq!(decode(&bytes, Width::W8, false), 251);
        assert_eq!(decode(&bytes, Width::W8, true), -5);

        let bytes = encode(-1337, Width::W32);
        assert_eq!(decode_unsigned(&bytes, Width::W32), (-1337i32) as u32 as u64);
        assert_eq!(decode_signed(&bytes, Width::W32), -1337);
    }

    #[test]
    fn test_decode_ignores_surrounding_bytes() {
        let bytes = [0x39, 0x05, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(decode_unsigned(&bytes, Width::W16), 1337);
        assert_eq!(decode_unsigned(&[0x01], Width::W64), 1);
    }

    #[test]
    fn test_floats() {
        let bytes = encode_f32(4.1251);
        assert!((decode_f32(&bytes) - 4.1251).abs() < 0.0001);
        let bytes = encode_f64(10.4421);
        assert_eq!(decode_f64(&bytes), 10.4421);
        assert_eq!(Width::from_bits(12), None);
    }
}
