//! LEB128-style variable-width integers, used for the `REFERENCE` token's
//! segment offset.

/// Appends `value` to `output` as an unsigned LEB128 varint.
pub fn encode(output: &mut bytes::BytesMut, mut value: u64) {
    loop {
        let mut byte = u8::try_from(value & 0x7f).unwrap_or(0);
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        output.extend_from_slice(&[byte]);
        if value == 0 {
            break;
        }
    }
}

/// Parses an unsigned LEB128 varint from the start of `input`.
///
/// Returns the decoded value and the number of bytes consumed, or `None` if
/// `input` does not contain a complete varint.
pub fn decode(input: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in input.iter().enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}
