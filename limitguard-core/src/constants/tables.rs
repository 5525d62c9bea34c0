//! Table Capacities and Buffer Lengths
//!
//! Every runtime table in the engine is an array sized by one of these
//! constants. Changing them changes RAM usage linearly:
//!
//! ```text
//! Watchpoint result:   ~40 bytes x MAX_WATCHPOINTS
//! Actionpoint result:  ~36 bytes x MAX_ACTIONPOINTS
//! Dispatch index:      2 bytes x HASH_TABLE_ENTRIES + 6 bytes x 2 x MAX_WATCHPOINTS
//! ```

// ===== TABLE CAPACITIES =====

/// Number of watchpoint slots in the definition and result tables.
#[cfg(not(feature = "low_memory_tables"))]
pub const MAX_WATCHPOINTS: usize = 176;

/// Number of watchpoint slots in the definition and result tables.
#[cfg(feature = "low_memory_tables")]
pub const MAX_WATCHPOINTS: usize = 32;

/// Number of actionpoint slots in the definition and result tables.
#[cfg(not(feature = "low_memory_tables"))]
pub const MAX_ACTIONPOINTS: usize = 176;

/// Number of actionpoint slots in the definition and result tables.
#[cfg(feature = "low_memory_tables")]
pub const MAX_ACTIONPOINTS: usize = 32;

// ===== RPN =====

/// Length of the fixed RPN token buffer carried by every actionpoint.
///
/// Also bounds the evaluator stack: an equation can never push more
/// operands than it has tokens.
pub const MAX_RPN_EQU_SIZE: usize = 20;

const _: () = assert!(
    MAX_RPN_EQU_SIZE >= 2,
    "An RPN equation needs at least one operand and the evaluate token"
);

/// Maximum length of an actionpoint's notification text (bytes).
pub const MAX_ACTION_TEXT: usize = 32;

// ===== DISPATCH INDEX =====

/// Number of buckets in the message dispatch index.
///
/// Must be a power of two, the bucket is the masked low bits of the
/// message identifier.
#[cfg(not(feature = "low_memory_tables"))]
pub const HASH_TABLE_ENTRIES: usize = 256;

/// Number of buckets in the message dispatch index.
#[cfg(feature = "low_memory_tables")]
pub const HASH_TABLE_ENTRIES: usize = 16;

/// Mask applied to a message identifier to select its bucket.
pub const HASH_TABLE_MASK: u16 = (HASH_TABLE_ENTRIES - 1) as u16;

const _: () = assert!(
    HASH_TABLE_ENTRIES.is_power_of_two(),
    "Bucket count must be power of 2"
);

const _: () = assert!(
    MAX_WATCHPOINTS < u16::MAX as usize && MAX_ACTIONPOINTS < u16::MAX as usize,
    "Table indices are 16-bit with a reserved sentinel"
);

// ===== COMMAND SELECTORS =====

/// Selector meaning "every watchpoint" in reset requests.
pub const ALL_WATCHPOINTS: u16 = 0xFFFF;

/// Selector meaning "every actionpoint" in sample, state and reset requests.
pub const ALL_ACTIONPOINTS: u16 = 0xFFFF;

// ===== RESULT VIEWS =====

/// Bytes needed to pack 2 bits per watchpoint.
pub const PACKED_WATCH_RESULTS: usize = (MAX_WATCHPOINTS + 3) / 4;

/// Bytes needed to pack 4 bits per actionpoint.
pub const PACKED_ACTION_RESULTS: usize = (MAX_ACTIONPOINTS + 1) / 2;
