use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde};

// Wire integers parameterized on a bit width. The fixed forms cost exactly
// their width; the variable forms are chopped into `BITS`-wide groups, each
// followed by a one-bit flag announcing whether another group comes, so
// small values stay short no matter how large they are allowed to get.
// Signed values fold their sign into the low bit first, so the magnitude
// rather than the two's-complement pattern decides the encoded length.

fn check_width(bits: u8) {
    assert!(
        (1..=63).contains(&bits),
        "integer width must be between 1 and 63 bits"
    );
}

fn write_group(writer: &mut dyn BitWrite, group: u64, width: u8) {
    for shift in (0..width).rev() {
        writer.write_bit(group >> shift & 1 != 0);
    }
}

fn read_group(reader: &mut BitReader, width: u8) -> Result<u64, SerdeErr> {
    let mut group: u64 = 0;
    for _ in 0..width {
        group = group << 1 | u64::from(reader.read_bit()?);
    }
    Ok(group)
}

fn fold_sign(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn unfold_sign(folded: u64) -> i64 {
    (folded >> 1) as i64 ^ -((folded & 1) as i64)
}

/// An unsigned integer that costs exactly `BITS` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnsignedInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedInteger<BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        check_width(BITS);
        let value = value.into();
        if value >> BITS != 0 {
            panic!("{value} does not fit in {BITS} bits");
        }
        Self { value }
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    pub fn set<T: Into<u64>>(&mut self, value: T) {
        *self = Self::new(value);
    }
}

impl<const BITS: u8> Serde for UnsignedInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_group(writer, self.value, BITS);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        check_width(BITS);
        Ok(Self {
            value: read_group(reader, BITS)?,
        })
    }
}

/// A signed integer covering `[-2^BITS, 2^BITS)`; the wire cost is
/// `BITS + 1`, the extra bit carrying the folded sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedInteger<const BITS: u8> {
    value: i64,
}

impl<const BITS: u8> SignedInteger<BITS> {
    pub fn new<T: Into<i64>>(value: T) -> Self {
        check_width(BITS);
        let value = value.into();
        if BITS < 63 && fold_sign(value) >> (BITS + 1) != 0 {
            panic!("{value} is outside the {BITS}-bit signed range");
        }
        Self { value }
    }

    pub fn get(&self) -> i64 {
        self.value
    }

    pub fn set<T: Into<i64>>(&mut self, value: T) {
        *self = Self::new(value);
    }
}

impl<const BITS: u8> Serde for SignedInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_group(writer, fold_sign(self.value), BITS + 1);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        check_width(BITS);
        Ok(Self {
            value: unfold_sign(read_group(reader, BITS + 1)?),
        })
    }
}

/// An unsigned integer written as `BITS`-wide groups, lowest group first,
/// each followed by a continuation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnsignedVariableInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedVariableInteger<BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        check_width(BITS);
        Self {
            value: value.into(),
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    pub fn set<T: Into<u64>>(&mut self, value: T) {
        *self = Self::new(value);
    }
}

impl<const BITS: u8> Serde for UnsignedVariableInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let mask = (1u64 << BITS) - 1;
        let mut rest = self.value;
        loop {
            write_group(writer, rest & mask, BITS);
            rest >>= BITS;
            writer.write_bit(rest != 0);
            if rest == 0 {
                return;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        check_width(BITS);
        let width = u32::from(BITS);

        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let group = read_group(reader, BITS)?;
            if shift >= 64 || (shift + width > 64 && group >> (64 - shift) != 0) {
                return Err(SerdeErr::InvalidEncoding);
            }
            value |= group << shift;

            if !reader.read_bit()? {
                return Ok(Self { value });
            }
            shift += width;
        }
    }
}

/// The variable-length form for signed values: the sign is folded into the
/// low bit, then the groups follow the unsigned scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedVariableInteger<const BITS: u8> {
    value: i64,
}

impl<const BITS: u8> SignedVariableInteger<BITS> {
    pub fn new<T: Into<i64>>(value: T) -> Self {
        check_width(BITS);
        Self {
            value: value.into(),
        }
    }

    pub fn get(&self) -> i64 {
        self.value
    }

    pub fn set<T: Into<i64>>(&mut self, value: T) {
        *self = Self::new(value);
    }
}

impl<const BITS: u8> Serde for SignedVariableInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<BITS> {
            value: fold_sign(self.value),
        }
        .ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let folded = UnsignedVariableInteger::<BITS>::de(reader)?;
        Ok(Self {
            value: unfold_sign(folded.get()),
        })
    }
}
