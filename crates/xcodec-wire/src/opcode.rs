//! The six message opcodes of the pipe-pair protocol.

use crate::error::ProtocolError;

/// One-byte message tag. Values match the original implementation's wire
/// format exactly (see `SPEC_FULL.md` §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// First message on a pipe-pair: advertises the local cache UUID.
    Hello = 0xFF,
    /// Teach the peer one segment.
    Learn = 0xFE,
    /// Request the segment for a fingerprint.
    Ask = 0xFD,
    /// "I have no more data."
    Eos = 0xFC,
    /// "I have processed all your data; you may close."
    EosAck = 0xFB,
    /// A length-prefixed chunk of encoder output.
    Frame = 0x00,
}

impl Opcode {
    /// The byte value of this opcode on the wire.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Parses an opcode byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidOpcode`] for any byte that isn't one
    /// of the six recognised opcodes.
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0xFF => Ok(Self::Hello),
            0xFE => Ok(Self::Learn),
            0xFD => Ok(Self::Ask),
            0xFC => Ok(Self::Eos),
            0xFB => Ok(Self::EosAck),
            0x00 => Ok(Self::Frame),
            other => Err(ProtocolError::InvalidOpcode { byte: other }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_its_byte() {
        for opcode in
            [Opcode::Hello, Opcode::Learn, Opcode::Ask, Opcode::Eos, Opcode::EosAck, Opcode::Frame]
        {
            assert_eq!(Opcode::from_byte(opcode.to_byte()), Ok(opcode));
        }
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert_eq!(Opcode::from_byte(0x42), Err(ProtocolError::InvalidOpcode { byte: 0x42 }));
    }
}
