//! Watchpoints: Monitored Telemetry Fields
//!
//! ## Overview
//!
//! A watchpoint names one field inside one telemetry message and a rule to
//! test it against. Every time a message carrying the field arrives, the
//! field is pulled out, masked, and compared with a stored reference value:
//!
//! ```text
//! payload ──► extract(type, offset) ──► & bitmask ──► compare(op, reference) ──► WatchResult
//!                 │                                        │
//!             OffsetError                             FloatNaN / custom
//!             DataTypeError                           predicate
//! ```
//!
//! ## Definitions vs Compiled Watchpoints
//!
//! Definition tables are uploaded as raw numbers ([`WatchpointDefinition`]).
//! At load time each used entry is decoded once into a [`Watchpoint`], with
//! the reference value already reinterpreted as a [`TypedValue`]. The hot
//! path never touches raw tags.
//!
//! ## Results
//!
//! Each slot also owns a [`WatchpointResult`]: the last outcome plus the
//! statistics ground operators use to tune limits (evaluation count,
//! false-to-true transitions, consecutive and cumulative true counts, and the
//! most recent transition in each direction).

pub mod compare;
pub mod extract;

use crate::{
    constants::{
        limits::{
            DATA_BYTE, DATA_UBYTE, DATA_WORD_BE, DATA_WORD_LE, DATA_UWORD_BE, DATA_UWORD_LE,
            DATA_DWORD_BE, DATA_DWORD_LE, DATA_UDWORD_BE, DATA_UDWORD_LE, DATA_FLOAT_BE,
            DATA_FLOAT_LE, DATA_WATCH_NOT_USED, NO_OPER, OPER_LE, OPER_LT, OPER_EQ, OPER_NE,
            OPER_GE, OPER_GT, OPER_CUSTOM, HIGHEST_VALID_MSG_ID,
        },
        MAX_WATCHPOINTS,
    },
    errors::{LcError, LcResult, ValidationReason},
    message::{Message, MessageId},
    time::Timestamp,
    traits::CustomPredicate,
};

/// Index of a watchpoint slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchIndex(u16);

impl WatchIndex {
    /// Checked constructor, `None` past the end of the table
    pub const fn new(index: u16) -> Option<Self> {
        if (index as usize) < MAX_WATCHPOINTS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Raw index
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Index as a table offset
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Every slot in table order
    pub fn all() -> impl Iterator<Item = WatchIndex> {
        (0..MAX_WATCHPOINTS as u16).map(WatchIndex)
    }
}

/// Outcome of one watchpoint evaluation
///
/// Also the value domain of the RPN stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum WatchResult {
    /// Comparison did not hold
    False = 0,
    /// Comparison held (limit violated)
    True = 1,
    /// Evaluation failed
    Error = 2,
    /// Not refreshed within the configured age
    #[default]
    Stale = 3,
}

impl WatchResult {
    /// Map a boolean comparison outcome
    pub const fn from_bool(value: bool) -> Self {
        if value {
            WatchResult::True
        } else {
            WatchResult::False
        }
    }
}

/// Byte order of a multi-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

/// Declared type of a watched field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Slot is empty
    NotUsed,
    /// Signed 8-bit
    I8,
    /// Unsigned 8-bit
    U8,
    /// Signed 16-bit, big-endian
    I16Be,
    /// Signed 16-bit, little-endian
    I16Le,
    /// Unsigned 16-bit, big-endian
    U16Be,
    /// Unsigned 16-bit, little-endian
    U16Le,
    /// Signed 32-bit, big-endian
    I32Be,
    /// Signed 32-bit, little-endian
    I32Le,
    /// Unsigned 32-bit, big-endian
    U32Be,
    /// Unsigned 32-bit, little-endian
    U32Le,
    /// Single precision float, big-endian
    F32Be,
    /// Single precision float, little-endian
    F32Le,
}

impl DataType {
    /// Decode a raw table tag
    pub const fn from_raw(raw: u8) -> LcResult<Self> {
        Ok(match raw {
            DATA_WATCH_NOT_USED => DataType::NotUsed,
            DATA_BYTE => DataType::I8,
            DATA_UBYTE => DataType::U8,
            DATA_WORD_BE => DataType::I16Be,
            DATA_WORD_LE => DataType::I16Le,
            DATA_UWORD_BE => DataType::U16Be,
            DATA_UWORD_LE => DataType::U16Le,
            DATA_DWORD_BE => DataType::I32Be,
            DATA_DWORD_LE => DataType::I32Le,
            DATA_UDWORD_BE => DataType::U32Be,
            DATA_UDWORD_LE => DataType::U32Le,
            DATA_FLOAT_BE => DataType::F32Be,
            DATA_FLOAT_LE => DataType::F32Le,
            _ => return Err(LcError::DataType { data_type: raw }),
        })
    }

    /// Raw table tag
    pub const fn raw(self) -> u8 {
        match self {
            DataType::NotUsed => DATA_WATCH_NOT_USED,
            DataType::I8 => DATA_BYTE,
            DataType::U8 => DATA_UBYTE,
            DataType::I16Be => DATA_WORD_BE,
            DataType::I16Le => DATA_WORD_LE,
            DataType::U16Be => DATA_UWORD_BE,
            DataType::U16Le => DATA_UWORD_LE,
            DataType::I32Be => DATA_DWORD_BE,
            DataType::I32Le => DATA_DWORD_LE,
            DataType::U32Be => DATA_UDWORD_BE,
            DataType::U32Le => DATA_UDWORD_LE,
            DataType::F32Be => DATA_FLOAT_BE,
            DataType::F32Le => DATA_FLOAT_LE,
        }
    }

    /// Field width in bytes, `None` for an empty slot
    pub const fn width(self) -> Option<u8> {
        match self {
            DataType::NotUsed => None,
            DataType::I8 | DataType::U8 => Some(1),
            DataType::I16Be | DataType::I16Le | DataType::U16Be | DataType::U16Le => Some(2),
            _ => Some(4),
        }
    }

    /// Byte order of the field; single bytes report big-endian
    pub const fn byte_order(self) -> ByteOrder {
        match self {
            DataType::I16Le | DataType::U16Le | DataType::I32Le | DataType::U32Le
            | DataType::F32Le => ByteOrder::Little,
            _ => ByteOrder::Big,
        }
    }

    /// True for signed integer types
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::I8 | DataType::I16Be | DataType::I16Le | DataType::I32Be | DataType::I32Le
        )
    }

    /// True for float types
    pub const fn is_float(self) -> bool {
        matches!(self, DataType::F32Be | DataType::F32Le)
    }
}

/// Relational operator of a watchpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    /// value <= reference
    Le,
    /// value < reference
    Lt,
    /// value == reference
    Eq,
    /// value != reference
    Ne,
    /// value >= reference
    Ge,
    /// value > reference
    Gt,
    /// Delegated to the custom predicate
    Custom,
}

impl Operator {
    /// Decode a raw operator id
    pub const fn from_raw(raw: u8) -> LcResult<Self> {
        Ok(match raw {
            OPER_LE => Operator::Le,
            OPER_LT => Operator::Lt,
            OPER_EQ => Operator::Eq,
            OPER_NE => Operator::Ne,
            OPER_GE => Operator::Ge,
            OPER_GT => Operator::Gt,
            OPER_CUSTOM => Operator::Custom,
            _ => return Err(LcError::Operator { operator_id: raw }),
        })
    }

    /// Raw operator id
    pub const fn raw(self) -> u8 {
        match self {
            Operator::Le => OPER_LE,
            Operator::Lt => OPER_LT,
            Operator::Eq => OPER_EQ,
            Operator::Ne => OPER_NE,
            Operator::Ge => OPER_GE,
            Operator::Gt => OPER_GT,
            Operator::Custom => OPER_CUSTOM,
        }
    }
}

/// A value at its declared width and signedness
///
/// Reference values are decoded into this form once per table load, and
/// every extracted value is narrowed into it before comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypedValue {
    /// Unsigned byte
    U8(u8),
    /// Signed byte
    I8(i8),
    /// Unsigned half-word
    U16(u16),
    /// Signed half-word
    I16(i16),
    /// Unsigned word
    U32(u32),
    /// Signed word
    I32(i32),
    /// Single-precision float
    F32(f32),
}

impl TypedValue {
    /// Reinterpret the low bits of a canonical 32-bit value as `data_type`
    pub fn narrow(data_type: DataType, raw: u32) -> LcResult<Self> {
        Ok(match data_type {
            DataType::NotUsed => return Err(LcError::DataType { data_type: data_type.raw() }),
            DataType::I8 => TypedValue::I8(raw as u8 as i8),
            DataType::U8 => TypedValue::U8(raw as u8),
            DataType::I16Be | DataType::I16Le => TypedValue::I16(raw as u16 as i16),
            DataType::U16Be | DataType::U16Le => TypedValue::U16(raw as u16),
            DataType::I32Be | DataType::I32Le => TypedValue::I32(raw as i32),
            DataType::U32Be | DataType::U32Le => TypedValue::U32(raw),
            DataType::F32Be | DataType::F32Le => TypedValue::F32(f32::from_bits(raw)),
        })
    }
}

/// Raw watchpoint definition table entry
///
/// This is the uploadable form: every field is a plain number so a table
/// image can be checked by [`crate::validation::validate_watchpoints`] before
/// the engine accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchpointDefinition {
    /// Raw data type tag
    pub data_type: u8,
    /// Raw operator id
    pub operator_id: u8,
    /// Message carrying the field
    pub message_id: u16,
    /// Byte offset of the field in the message
    pub offset: u16,
    /// Mask applied to the extracted value before comparison
    pub bitmask: u32,
    /// Reference value, reinterpreted per data type
    pub comparison_value: u32,
    /// Cycles after which an unrefreshed result goes stale, 0 = never
    pub result_age_when_stale: u32,
    /// Opaque argument handed to the custom predicate
    pub custom_arg: u32,
}

impl WatchpointDefinition {
    /// An empty slot
    pub const UNUSED: Self = Self {
        data_type: DATA_WATCH_NOT_USED,
        operator_id: NO_OPER,
        message_id: 0,
        offset: 0,
        bitmask: u32::MAX,
        comparison_value: 0,
        result_age_when_stale: 0,
        custom_arg: 0,
    };

    /// Entry watching `data_type` at `offset` in `message_id`
    pub const fn new(data_type: DataType, operator: Operator, message_id: u16, offset: u16) -> Self {
        Self {
            data_type: data_type.raw(),
            operator_id: operator.raw(),
            message_id,
            offset,
            ..Self::UNUSED
        }
    }

    /// Set the reference value from its raw 32-bit image
    pub fn with_comparison(mut self, value: u32) -> Self {
        self.comparison_value = value;
        self
    }

    /// Set a float reference value
    pub fn with_float_comparison(mut self, value: f32) -> Self {
        self.comparison_value = value.to_bits();
        self
    }

    /// Set the bitmask
    pub fn with_mask(mut self, bitmask: u32) -> Self {
        self.bitmask = bitmask;
        self
    }

    /// Set the staleness horizon in evaluation cycles
    pub fn with_stale_age(mut self, cycles: u32) -> Self {
        self.result_age_when_stale = cycles;
        self
    }

    /// Set the custom predicate argument
    pub fn with_custom_arg(mut self, arg: u32) -> Self {
        self.custom_arg = arg;
        self
    }

    /// True when the slot is empty
    pub const fn is_unused(&self) -> bool {
        self.data_type == DATA_WATCH_NOT_USED
    }
}

impl Default for WatchpointDefinition {
    fn default() -> Self {
        Self::UNUSED
    }
}

/// Decoded, load-time-checked watchpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Watchpoint {
    /// Width, signedness and byte order of the field
    pub data_type: DataType,
    /// Comparison applied to the field
    pub operator: Operator,
    /// Message carrying the field
    pub message_id: MessageId,
    /// Byte offset of the field in the payload
    pub offset: u16,
    /// ANDed with the extracted bits before comparison
    pub bitmask: u32,
    /// Comparison value, already narrowed to `data_type`
    pub reference: TypedValue,
    /// Sample cycles before a result goes stale, 0 for never
    pub stale_age: u32,
    /// Passed through to the custom predicate
    pub custom_arg: u32,
}

impl Watchpoint {
    /// Decode a raw entry
    ///
    /// Returns `Ok(None)` for an empty slot and the first failed check
    /// otherwise. Checks run in table-validation order: data type, operator,
    /// message id, then float reference sanity.
    pub fn decode(definition: &WatchpointDefinition) -> Result<Option<Self>, ValidationReason> {
        let data_type =
            DataType::from_raw(definition.data_type).map_err(|_| ValidationReason::DataType)?;
        if data_type == DataType::NotUsed {
            return Ok(None);
        }

        let operator =
            Operator::from_raw(definition.operator_id).map_err(|_| ValidationReason::Operator)?;

        if definition.message_id > HIGHEST_VALID_MSG_ID {
            return Err(ValidationReason::MessageId);
        }

        let reference = TypedValue::narrow(data_type, definition.comparison_value)
            .map_err(|_| ValidationReason::DataType)?;
        if let TypedValue::F32(value) = reference {
            if value.is_nan() {
                return Err(ValidationReason::FloatNaN);
            }
            if value.is_infinite() {
                return Err(ValidationReason::FloatInfinite);
            }
        }

        Ok(Some(Self {
            data_type,
            operator,
            message_id: MessageId(definition.message_id),
            offset: definition.offset,
            bitmask: definition.bitmask,
            reference,
            stale_age: definition.result_age_when_stale,
            custom_arg: definition.custom_arg,
        }))
    }

    /// Evaluate against a received message
    ///
    /// Returns the outcome together with the unmasked extracted value, which
    /// the result table records on transitions.
    pub fn evaluate(
        &self,
        index: WatchIndex,
        message: &Message<'_>,
        predicate: &mut dyn CustomPredicate,
    ) -> LcResult<(WatchResult, u32)> {
        let raw = extract::extract(self.data_type, message.payload, self.offset)?;
        let masked = raw & self.bitmask;

        let outcome = match self.operator {
            Operator::Custom => predicate.evaluate(index, masked, message, self.custom_arg),
            operator => {
                let value = TypedValue::narrow(self.data_type, masked)?;
                compare::compare(operator, value, self.reference)?
            }
        };

        Ok((outcome, raw))
    }
}

/// Value and time of one result transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    /// Unmasked extracted value
    pub value: u32,
    /// Timestamp of the message that caused it
    pub timestamp: Timestamp,
}

/// Runtime state of one watchpoint slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchpointResult {
    /// Last outcome
    pub result: WatchResult,
    /// Cycles left before the result goes stale
    pub countdown_to_stale: u32,
    /// Number of evaluations; decode errors count, short packets do not
    pub evaluation_count: u32,
    /// False to true transitions
    pub false_to_true_count: u32,
    /// Current run of true results
    pub consecutive_true_count: u32,
    /// Lifetime true results
    pub cumulative_true_count: u32,
    /// Most recent false to true transition
    pub last_false_to_true: Transition,
    /// Most recent true to false transition
    pub last_true_to_false: Transition,
}

impl WatchpointResult {
    /// Record a completed comparison
    pub fn record(&mut self, outcome: WatchResult, value: u32, timestamp: Timestamp, stale_age: u32) {
        let previous = self.result;
        self.evaluation_count = self.evaluation_count.saturating_add(1);

        match outcome {
            WatchResult::True => {
                if previous == WatchResult::False {
                    self.false_to_true_count = self.false_to_true_count.saturating_add(1);
                    self.consecutive_true_count = 1;
                    self.last_false_to_true = Transition { value, timestamp };
                } else {
                    self.consecutive_true_count = self.consecutive_true_count.saturating_add(1);
                }
                self.cumulative_true_count = self.cumulative_true_count.saturating_add(1);
            }
            WatchResult::False => {
                if previous == WatchResult::True {
                    self.last_true_to_false = Transition { value, timestamp };
                }
                self.consecutive_true_count = 0;
            }
            WatchResult::Error => {
                self.record_error();
                return;
            }
            // A predicate may report stale data; the countdown restarts anyway
            WatchResult::Stale => {}
        }

        self.result = outcome;
        self.countdown_to_stale = stale_age;
    }

    /// Mark the slot as errored; staleness countdown is cleared
    pub fn record_error(&mut self) {
        self.result = WatchResult::Error;
        self.countdown_to_stale = 0;
    }

    /// Advance the staleness countdown by one cycle
    pub fn age(&mut self) {
        if self.countdown_to_stale != 0 {
            self.countdown_to_stale -= 1;
            if self.countdown_to_stale == 0 {
                self.result = WatchResult::Stale;
            }
        }
    }

    /// Back to the load-time defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NoCustomPredicate;

    #[test]
    fn raw_tags_round_trip() {
        for raw in 1..=12u8 {
            let data_type = DataType::from_raw(raw).unwrap();
            assert_eq!(data_type.raw(), raw);
            assert_eq!(data_type.is_float(), raw == DATA_FLOAT_BE || raw == DATA_FLOAT_LE);
        }
        assert!(!DataType::NotUsed.is_float());
        assert_eq!(DataType::from_raw(0xFF), Ok(DataType::NotUsed));
        assert_eq!(DataType::from_raw(13), Err(LcError::DataType { data_type: 13 }));
        assert_eq!(Operator::from_raw(0), Err(LcError::Operator { operator_id: 0 }));
    }

    #[test]
    fn narrowing_keeps_declared_width() {
        assert_eq!(TypedValue::narrow(DataType::I8, 0xFFFF_FF80).unwrap(), TypedValue::I8(-128));
        assert_eq!(TypedValue::narrow(DataType::U16Le, 0x0001_FFFE).unwrap(), TypedValue::U16(0xFFFE));
        assert_eq!(TypedValue::narrow(DataType::F32Be, 1.5f32.to_bits()).unwrap(), TypedValue::F32(1.5));
        assert!(TypedValue::narrow(DataType::NotUsed, 0).is_err());
    }

    #[test]
    fn decode_rejects_bad_entries() {
        let mut def = WatchpointDefinition::new(DataType::U8, Operator::Gt, 0x0801, 4);
        assert!(matches!(Watchpoint::decode(&def), Ok(Some(_))));

        def.operator_id = 9;
        assert_eq!(Watchpoint::decode(&def), Err(ValidationReason::Operator));

        let def = WatchpointDefinition::new(DataType::U8, Operator::Gt, 0x2000, 4);
        assert_eq!(Watchpoint::decode(&def), Err(ValidationReason::MessageId));

        let def = WatchpointDefinition::new(DataType::F32Le, Operator::Lt, 1, 0)
            .with_float_comparison(f32::NAN);
        assert_eq!(Watchpoint::decode(&def), Err(ValidationReason::FloatNaN));

        let def = WatchpointDefinition::new(DataType::F32Le, Operator::Lt, 1, 0)
            .with_float_comparison(f32::NEG_INFINITY);
        assert_eq!(Watchpoint::decode(&def), Err(ValidationReason::FloatInfinite));

        assert_eq!(Watchpoint::decode(&WatchpointDefinition::UNUSED), Ok(None));
    }

    #[test]
    fn evaluate_masks_before_compare() {
        let def = WatchpointDefinition::new(DataType::U8, Operator::Eq, 1, 1)
            .with_mask(0x0F)
            .with_comparison(0x05);
        let wp = Watchpoint::decode(&def).unwrap().unwrap();
        let payload = [0x00, 0xA5];
        let msg = Message::new(MessageId(1), &payload, 10);

        let (outcome, raw) = wp
            .evaluate(WatchIndex::new(0).unwrap(), &msg, &mut NoCustomPredicate)
            .unwrap();
        assert_eq!(outcome, WatchResult::True);
        assert_eq!(raw, 0xA5);
    }

    #[test]
    fn result_transitions() {
        let mut r = WatchpointResult::default();
        r.record(WatchResult::True, 7, 100, 3);
        // Stale -> True is not a false-to-true transition
        assert_eq!(r.false_to_true_count, 0);
        assert_eq!(r.consecutive_true_count, 1);

        r.record(WatchResult::False, 2, 200, 3);
        assert_eq!(r.last_true_to_false, Transition { value: 2, timestamp: 200 });
        assert_eq!(r.consecutive_true_count, 0);

        r.record(WatchResult::True, 9, 300, 3);
        r.record(WatchResult::True, 9, 400, 3);
        assert_eq!(r.false_to_true_count, 1);
        assert_eq!(r.last_false_to_true, Transition { value: 9, timestamp: 300 });
        assert_eq!(r.consecutive_true_count, 2);
        assert_eq!(r.cumulative_true_count, 3);
        assert_eq!(r.evaluation_count, 4);
        assert_eq!(r.countdown_to_stale, 3);

        r.record(WatchResult::Error, 0, 500, 3);
        assert_eq!(r.result, WatchResult::Error);
        assert_eq!(r.countdown_to_stale, 0);
        assert_eq!(r.consecutive_true_count, 2);
    }

    #[test]
    fn aging_goes_stale_once() {
        let mut r = WatchpointResult::default();
        r.record(WatchResult::False, 0, 0, 2);
        r.age();
        assert_eq!(r.result, WatchResult::False);
        r.age();
        assert_eq!(r.result, WatchResult::Stale);
        r.age();
        assert_eq!(r.countdown_to_stale, 0);

        // Zero horizon never goes stale
        r.record(WatchResult::True, 0, 0, 0);
        r.age();
        assert_eq!(r.result, WatchResult::True);
    }
}
