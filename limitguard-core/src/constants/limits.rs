//! Raw Table Encodings and Numeric Limits
//!
//! Definition tables are uploaded as raw numbers. These constants give the
//! wire value of every tag the engine understands; anything else is rejected
//! at validation time.

// ===== WATCHPOINT DATA TYPES =====

/// Watchpoint slot is not in use.
pub const DATA_WATCH_NOT_USED: u8 = 0xFF;
/// Signed 8-bit.
pub const DATA_BYTE: u8 = 1;
/// Unsigned 8-bit.
pub const DATA_UBYTE: u8 = 2;
/// Signed 16-bit, big-endian.
pub const DATA_WORD_BE: u8 = 3;
/// Signed 16-bit, little-endian.
pub const DATA_WORD_LE: u8 = 4;
/// Unsigned 16-bit, big-endian.
pub const DATA_UWORD_BE: u8 = 5;
/// Unsigned 16-bit, little-endian.
pub const DATA_UWORD_LE: u8 = 6;
/// Signed 32-bit, big-endian.
pub const DATA_DWORD_BE: u8 = 7;
/// Signed 32-bit, little-endian.
pub const DATA_DWORD_LE: u8 = 8;
/// Unsigned 32-bit, big-endian.
pub const DATA_UDWORD_BE: u8 = 9;
/// Unsigned 32-bit, little-endian.
pub const DATA_UDWORD_LE: u8 = 10;
/// IEEE-754 single precision, big-endian.
pub const DATA_FLOAT_BE: u8 = 11;
/// IEEE-754 single precision, little-endian.
pub const DATA_FLOAT_LE: u8 = 12;

// ===== COMPARISON OPERATORS =====

/// Operator slot is not in use.
pub const NO_OPER: u8 = 0xFF;
/// Value `<=` comparison.
pub const OPER_LE: u8 = 1;
/// Value `<` comparison.
pub const OPER_LT: u8 = 2;
/// Value `==` comparison.
pub const OPER_EQ: u8 = 3;
/// Value `!=` comparison.
pub const OPER_NE: u8 = 4;
/// Value `>=` comparison.
pub const OPER_GE: u8 = 5;
/// Value `>` comparison.
pub const OPER_GT: u8 = 6;
/// Delegates to the registered custom predicate.
pub const OPER_CUSTOM: u8 = 7;

// ===== ACTIONPOINT STATES =====

/// Actionpoint slot is not in use.
pub const APSTATE_NOT_USED: u8 = 0xFF;
/// Evaluated, responses sent.
pub const APSTATE_ACTIVE: u8 = 1;
/// Evaluated, responses suppressed.
pub const APSTATE_PASSIVE: u8 = 2;
/// Not evaluated; may be re-enabled.
pub const APSTATE_DISABLED: u8 = 3;
/// Not evaluated until the next table load.
pub const APSTATE_PERMOFF: u8 = 4;

// ===== RPN TOKENS =====

/// Pops two results, pushes their AND.
pub const RPN_AND: u16 = 0xFFF1;
/// Pops two results, pushes their OR.
pub const RPN_OR: u16 = 0xFFF2;
/// Pops two results, pushes their XOR.
pub const RPN_XOR: u16 = 0xFFF3;
/// Inverts the top of the stack.
pub const RPN_NOT: u16 = 0xFFF4;
/// Terminal token, pops the final result.
pub const RPN_EQUAL: u16 = 0xFFF5;

// ===== NUMERIC LIMITS =====

/// Absolute tolerance used by float equality and inequality.
pub const FLOAT_TOLERANCE: f32 = 1.0e-25;

/// Highest message identifier a watchpoint may reference.
pub const HIGHEST_VALID_MSG_ID: u16 = 0x1FFF;

/// Highest response identifier an actionpoint may request.
pub const MAX_VALID_RESPONSE_ID: u16 = 0xFFF0;
