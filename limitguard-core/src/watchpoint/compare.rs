//! Watchpoint Comparison
//!
//! Integer comparisons are plain relational tests at the declared width, so
//! a signed byte of `0xFF` is `-1` and an unsigned one is `255`.
//!
//! Floats need two extra rules:
//!
//! 1. A NaN value never reaches a relational operator; it is an error.
//! 2. Equality and inequality use an absolute tolerance
//!    ([`FLOAT_TOLERANCE`]); the ordering operators do not, and infinities
//!    order normally.
//!
//! The custom operator is handled by the caller, which owns the predicate.

use libm::fabsf;

use crate::{
    constants::FLOAT_TOLERANCE,
    constants::limits::OPER_CUSTOM,
    errors::{LcError, LcResult},
    watchpoint::{Operator, TypedValue, WatchResult},
};

/// Compare `value` against `reference` with `operator`
///
/// Mismatched value and reference types evaluate to `Error`. `Custom`
/// cannot be answered here and is rejected as an operator error.
pub fn compare(operator: Operator, value: TypedValue, reference: TypedValue) -> LcResult<WatchResult> {
    let holds = match (value, reference) {
        (TypedValue::U8(a), TypedValue::U8(b)) => relate(operator, a, b)?,
        (TypedValue::I8(a), TypedValue::I8(b)) => relate(operator, a, b)?,
        (TypedValue::U16(a), TypedValue::U16(b)) => relate(operator, a, b)?,
        (TypedValue::I16(a), TypedValue::I16(b)) => relate(operator, a, b)?,
        (TypedValue::U32(a), TypedValue::U32(b)) => relate(operator, a, b)?,
        (TypedValue::I32(a), TypedValue::I32(b)) => relate(operator, a, b)?,
        (TypedValue::F32(a), TypedValue::F32(b)) => relate_float(operator, a, b)?,
        _ => return Ok(WatchResult::Error),
    };

    Ok(WatchResult::from_bool(holds))
}

fn relate<T: PartialOrd>(operator: Operator, a: T, b: T) -> LcResult<bool> {
    Ok(match operator {
        Operator::Le => a <= b,
        Operator::Lt => a < b,
        Operator::Eq => a == b,
        Operator::Ne => a != b,
        Operator::Ge => a >= b,
        Operator::Gt => a > b,
        Operator::Custom => return Err(LcError::Operator { operator_id: OPER_CUSTOM }),
    })
}

fn relate_float(operator: Operator, a: f32, b: f32) -> LcResult<bool> {
    if a.is_nan() {
        return Err(LcError::FloatNaN);
    }

    Ok(match operator {
        Operator::Eq => fabsf(a - b) <= FLOAT_TOLERANCE,
        Operator::Ne => fabsf(a - b) > FLOAT_TOLERANCE,
        other => relate(other, a, b)?,
    })
}
