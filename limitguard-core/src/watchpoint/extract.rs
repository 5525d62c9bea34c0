//! Value Extraction
//!
//! Pulls one field out of a message and normalizes it into a canonical
//! `u32`:
//!
//! ```text
//! Type        Bytes  Order     Extension
//! ---------------------------------------
//! I8 / U8       1     -        sign / zero
//! I16 / U16     2    BE | LE   sign / zero
//! I32 / U32     4    BE | LE   none
//! F32           4    BE | LE   none (raw IEEE-754 bits)
//! ```
//!
//! Byte order is decoded from the declared endianness, never from the host,
//! so the same table behaves identically on every target.

use crate::{
    errors::{LcError, LcResult},
    watchpoint::{ByteOrder, DataType},
};

/// Extract the field of `data_type` at `offset` in `payload`
///
/// Fails with `DataType` for an empty slot and with `Offset` when the field
/// would run past the end of the payload.
pub fn extract(data_type: DataType, payload: &[u8], offset: u16) -> LcResult<u32> {
    let width = data_type
        .width()
        .ok_or(LcError::DataType { data_type: data_type.raw() })?;

    let start = offset as usize;
    let bytes = payload
        .get(start..start + width as usize)
        .ok_or(LcError::Offset { offset, width, message_len: payload.len() })?;

    let value = match (width, data_type.byte_order()) {
        (1, _) => {
            if data_type.is_signed() {
                bytes[0] as i8 as i32 as u32
            } else {
                bytes[0] as u32
            }
        }
        (2, order) => {
            let pair = [bytes[0], bytes[1]];
            let word = match order {
                ByteOrder::Big => u16::from_be_bytes(pair),
                ByteOrder::Little => u16::from_le_bytes(pair),
            };
            if data_type.is_signed() {
                word as i16 as i32 as u32
            } else {
                word as u32
            }
        }
        (_, order) => {
            let quad = [bytes[0], bytes[1], bytes[2], bytes[3]];
            match order {
                ByteOrder::Big => u32::from_be_bytes(quad),
                ByteOrder::Little => u32::from_le_bytes(quad),
            }
        }
    };

    Ok(value)
}
