//! Notification Identifiers
//!
//! Numeric identifiers attached to every notification the engine emits.
//! Ground procedures filter on these, so they never change once assigned.

// ===== TABLE MANAGEMENT =====

/// Watchpoint table validated.
pub const WDTVAL_INF_EID: u16 = 20;
/// Watchpoint table entry rejected.
pub const WDTVAL_ERR_EID: u16 = 21;
/// Actionpoint table validated.
pub const ADTVAL_INF_EID: u16 = 22;
/// Actionpoint table entry rejected.
pub const ADTVAL_ERR_EID: u16 = 23;
/// Actionpoint equation rejected.
pub const ADTVAL_RPNERR_EID: u16 = 24;
/// Message registration failed.
pub const SUBSCRIBE_ERR_EID: u16 = 25;
/// Message deregistration failed.
pub const UNSUBSCRIBE_ERR_EID: u16 = 26;

// ===== WATCHPOINT EVALUATION =====

/// Message arrived that no watchpoint references.
pub const MID_INF_EID: u16 = 30;
/// Watchpoint has an unknown data type.
pub const WP_DATATYPE_ERR_EID: u16 = 31;
/// Watchpoint has an unknown operator.
pub const WP_OPERID_ERR_EID: u16 = 32;
/// Watched field lies past the end of the message.
pub const WP_OFFSET_ERR_EID: u16 = 33;
/// Float field decoded to NaN.
pub const WP_NAN_ERR_EID: u16 = 34;

// ===== ACTIONPOINT EVALUATION =====

/// Equation failed during sampling.
pub const INVALID_RPN_ERR_EID: u16 = 40;
/// Equation evaluated to error.
pub const ACTION_ERROR_ERR_EID: u16 = 41;
/// Actionpoint went from pass to fail.
pub const AP_PASSTOFAIL_INF_EID: u16 = 42;
/// Actionpoint went from fail to pass.
pub const AP_FAILTOPASS_INF_EID: u16 = 43;
/// Actionpoint kept failing after going passive.
pub const AP_PASSIVE_FAIL_INF_EID: u16 = 44;
/// Response suppressed because the engine is passive.
pub const PASSIVE_FAIL_DBG_EID: u16 = 45;
/// Sample request outside the actionpoint table.
pub const APSAMPLE_APNUM_ERR_EID: u16 = 46;
