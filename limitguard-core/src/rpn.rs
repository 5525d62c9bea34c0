//! Reverse Polish Notation Equations
//!
//! ## Overview
//!
//! Every actionpoint carries a fixed-length postfix equation over watchpoint
//! results. A token is either an operand (a watchpoint index) or one of five
//! operators:
//!
//! ```text
//! Token     Raw      Stack effect
//! --------------------------------
//! operand   0..MAX   push watchpoint result
//! AND       0xFFF1   pop 2, push 1
//! OR        0xFFF2   pop 2, push 1
//! XOR       0xFFF3   pop 2, push 1
//! NOT       0xFFF4   pop 1, push 1
//! EQUAL     0xFFF5   pop final result, must leave the stack empty
//! ```
//!
//! ## Four-Valued Logic
//!
//! Stack values are [`WatchResult`]s, so `Error` and `Stale` flow through the
//! operators instead of being collapsed to booleans:
//!
//! ```text
//! AND:  False dominates, then Error, then Stale, else True
//! OR:   True dominates,  then Error, then Stale, else False
//! XOR:  Error, then Stale, else a != b
//! NOT:  Error and Stale pass through, else negation
//! ```
//!
//! The dominance of `False` in AND (and `True` in OR) gives short-circuit
//! results without short-circuit evaluation: `[0, 1, AND, EQUAL]` passes
//! whenever watchpoint 0 is false, no matter what watchpoint 1 holds.
//!
//! ## Validation vs Evaluation
//!
//! [`validate`] runs once at table load and only tracks the symbolic stack
//! depth. [`evaluate`] runs on every sample and still checks everything,
//! so a corrupted equation is reported instead of misbehaving.

use heapless::Vec;

use crate::{
    actionpoint::ActionResult,
    constants::{
        limits::{RPN_AND, RPN_EQUAL, RPN_NOT, RPN_OR, RPN_XOR},
        MAX_RPN_EQU_SIZE,
    },
    errors::{LcError, LcResult},
    watchpoint::{WatchIndex, WatchResult},
};

/// One decoded equation token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpnToken {
    /// Push the result of a watchpoint
    Operand(WatchIndex),
    /// Logical AND of the top two entries
    And,
    /// Logical OR of the top two entries
    Or,
    /// Exclusive OR of the top two entries
    Xor,
    /// Negate the top entry
    Not,
    /// Pop the final result
    Equal,
}

impl RpnToken {
    /// Decode a raw token, `None` if it is neither an operator nor a valid index
    pub const fn decode(raw: u16) -> Option<Self> {
        match raw {
            RPN_AND => Some(RpnToken::And),
            RPN_OR => Some(RpnToken::Or),
            RPN_XOR => Some(RpnToken::Xor),
            RPN_NOT => Some(RpnToken::Not),
            RPN_EQUAL => Some(RpnToken::Equal),
            index => match WatchIndex::new(index) {
                Some(wp) => Some(RpnToken::Operand(wp)),
                None => None,
            },
        }
    }
}

impl WatchResult {
    /// Four-valued AND
    pub const fn and(self, other: Self) -> Self {
        use WatchResult::*;
        match (self, other) {
            (False, _) | (_, False) => False,
            (Error, _) | (_, Error) => Error,
            (Stale, _) | (_, Stale) => Stale,
            _ => True,
        }
    }

    /// Four-valued OR
    pub const fn or(self, other: Self) -> Self {
        use WatchResult::*;
        match (self, other) {
            (True, _) | (_, True) => True,
            (Error, _) | (_, Error) => Error,
            (Stale, _) | (_, Stale) => Stale,
            _ => False,
        }
    }

    /// Four-valued XOR
    pub const fn xor(self, other: Self) -> Self {
        use WatchResult::*;
        match (self, other) {
            (Error, _) | (_, Error) => Error,
            (Stale, _) | (_, Stale) => Stale,
            (a, b) => WatchResult::from_bool(!matches!((a, b), (True, True) | (False, False))),
        }
    }

    /// Four-valued NOT
    pub const fn not(self) -> Self {
        use WatchResult::*;
        match self {
            True => False,
            False => True,
            other => other,
        }
    }
}

/// Evaluate an equation against the current watchpoint results
///
/// `lookup` returns the stored result for an operand. Malformed equations
/// fail with `IllegalExpression` carrying the token position and the stack
/// depth at that point.
pub fn evaluate<F>(equation: &[u16], lookup: F) -> LcResult<ActionResult>
where
    F: Fn(WatchIndex) -> WatchResult,
{
    let mut stack: Vec<WatchResult, MAX_RPN_EQU_SIZE> = Vec::new();
    let illegal = |index: usize, depth: usize| LcError::IllegalExpression { index, stack_depth: depth };

    for (index, &raw) in equation.iter().enumerate().take(MAX_RPN_EQU_SIZE) {
        let depth = stack.len();
        match RpnToken::decode(raw) {
            Some(RpnToken::Operand(wp)) => {
                stack.push(lookup(wp)).map_err(|_| illegal(index, depth))?;
            }
            Some(op @ (RpnToken::And | RpnToken::Or | RpnToken::Xor)) => {
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    return Err(illegal(index, depth));
                };
                let combined = match op {
                    RpnToken::And => a.and(b),
                    RpnToken::Or => a.or(b),
                    _ => a.xor(b),
                };
                // Two popped, one pushed: capacity is guaranteed
                let _ = stack.push(combined);
            }
            Some(RpnToken::Not) => {
                let Some(a) = stack.pop() else {
                    return Err(illegal(index, depth));
                };
                let _ = stack.push(a.not());
            }
            Some(RpnToken::Equal) => {
                if depth != 1 {
                    return Err(illegal(index, depth));
                }
                return Ok(match stack.pop() {
                    Some(WatchResult::False) => ActionResult::Pass,
                    Some(WatchResult::True) => ActionResult::Fail,
                    Some(WatchResult::Stale) => ActionResult::Stale,
                    _ => ActionResult::Error,
                });
            }
            None => return Err(illegal(index, depth)),
        }
    }

    // Ran off the end of the buffer without reaching EQUAL
    Err(illegal(equation.len().min(MAX_RPN_EQU_SIZE), stack.len()))
}

/// Check an equation is well formed without evaluating it
///
/// Tracks the symbolic stack depth: operands add one, binary operators
/// remove one, NOT leaves it unchanged. Valid iff EQUAL is reached with
/// depth exactly 1 and the depth never dropped to zero or below before.
/// Tokens after EQUAL are not examined.
pub fn validate(equation: &[u16]) -> LcResult<()> {
    let mut depth: usize = 0;

    for (index, &raw) in equation.iter().enumerate().take(MAX_RPN_EQU_SIZE) {
        let invalid = LcError::IllegalExpression { index, stack_depth: depth };
        match RpnToken::decode(raw).ok_or(invalid)? {
            RpnToken::Operand(_) => depth += 1,
            RpnToken::And | RpnToken::Or | RpnToken::Xor => {
                if depth < 2 {
                    return Err(invalid);
                }
                depth -= 1;
            }
            RpnToken::Not => {
                if depth < 1 {
                    return Err(invalid);
                }
            }
            RpnToken::Equal => {
                return if depth == 1 { Ok(()) } else { Err(invalid) };
            }
        }
    }

    Err(LcError::IllegalExpression {
        index: equation.len().min(MAX_RPN_EQU_SIZE),
        stack_depth: depth,
    })
}
