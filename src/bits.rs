use bitstream_io::{BigEndian, BitWrite, BitWriter};
use bitvec::prelude::*;
use std::{
    fmt,
    io::{Result as IoResult, Write},
};

/// Concatenated codes of an encoded symbol sequence.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Encoded {
    bits: BitVec,
}

impl Encoded {
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_bitslice(&self) -> &BitSlice {
        self.bits.as_bitslice()
    }

    pub fn into_bitvec(self) -> BitVec {
        self.bits
    }

    /// Number of bytes written by [`Encoded::write_packed`].
    pub fn packed_len(&self) -> usize {
        self.bits.len().div_ceil(8)
    }

    /// Packs the bits most significant first, zero-filling the last byte.
    pub fn write_packed<W: Write>(&self, writer: W) -> IoResult<()> {
        let mut writer: BitWriter<W, BigEndian> = BitWriter::new(writer);
        for bit in self.bits.iter() {
            writer.write_bit(*bit)?;
        }
        writer.byte_align()?;
        writer.flush()?;
        Ok(())
    }
}

impl From<BitVec> for Encoded {
    fn from(bits: BitVec) -> Self {
        Encoded { bits }
    }
}

/// Formats the bits as a string of `0` and `1` characters.
impl fmt::Display for Encoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter() {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
