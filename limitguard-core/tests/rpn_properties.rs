//! Property tests for equation validation and evaluation

use limitguard_core::{
    constants::{
        limits::{RPN_AND, RPN_EQUAL, RPN_NOT, RPN_OR, RPN_XOR},
        MAX_RPN_EQU_SIZE, MAX_WATCHPOINTS,
    },
    rpn, ActionResult, LcResult, WatchIndex, WatchResult,
};
use proptest::prelude::*;

const RESULTS: [WatchResult; 4] =
    [WatchResult::False, WatchResult::True, WatchResult::Error, WatchResult::Stale];

fn token() -> impl Strategy<Value = u16> {
    prop_oneof![
        4 => 0u16..4,
        1 => Just(RPN_AND),
        1 => Just(RPN_OR),
        1 => Just(RPN_XOR),
        1 => Just(RPN_NOT),
        1 => Just(RPN_EQUAL),
        // Neither an operator nor a valid index
        1 => Just(MAX_WATCHPOINTS as u16),
    ]
}

fn equation() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::vec(token(), 1..=MAX_RPN_EQU_SIZE)
}

fn result() -> impl Strategy<Value = WatchResult> {
    prop::sample::select(RESULTS.to_vec())
}

/// Depth simulation the validator must agree with
fn reference_valid(tokens: &[u16]) -> bool {
    let mut depth = 0i32;
    for &token in tokens {
        match token {
            RPN_EQUAL => return depth == 1,
            RPN_AND | RPN_OR | RPN_XOR => {
                if depth < 2 {
                    return false;
                }
                depth -= 1;
            }
            RPN_NOT => {
                if depth < 1 {
                    return false;
                }
            }
            t if (t as usize) < MAX_WATCHPOINTS => depth += 1,
            _ => return false,
        }
    }
    false
}

fn reference_and(a: WatchResult, b: WatchResult) -> WatchResult {
    use WatchResult::*;
    if a == False || b == False {
        False
    } else if a == Error || b == Error {
        Error
    } else if a == Stale || b == Stale {
        Stale
    } else {
        True
    }
}

fn reference_or(a: WatchResult, b: WatchResult) -> WatchResult {
    use WatchResult::*;
    if a == True || b == True {
        True
    } else if a == Error || b == Error {
        Error
    } else if a == Stale || b == Stale {
        Stale
    } else {
        False
    }
}

fn reference_xor(a: WatchResult, b: WatchResult) -> WatchResult {
    use WatchResult::*;
    if a == Error || b == Error {
        Error
    } else if a == Stale || b == Stale {
        Stale
    } else {
        WatchResult::from_bool(a != b)
    }
}

proptest! {
    #[test]
    fn validator_matches_depth_simulation(tokens in equation()) {
        prop_assert_eq!(rpn::validate(&tokens).is_ok(), reference_valid(&tokens));
    }

    #[test]
    fn evaluation_fails_exactly_where_validation_does(
        tokens in equation(),
        values in prop::array::uniform4(result()),
    ) {
        let evaluated = rpn::evaluate(&tokens, |wp: WatchIndex| values[wp.as_usize()]);
        prop_assert_eq!(evaluated.err(), rpn::validate(&tokens).err());
    }

    #[test]
    fn evaluation_is_deterministic(
        tokens in equation(),
        values in prop::array::uniform4(result()),
    ) {
        let lookup = |wp: WatchIndex| values[wp.as_usize()];
        let first = rpn::evaluate(&tokens, lookup);
        for _ in 0..4 {
            prop_assert_eq!(rpn::evaluate(&tokens, lookup), first);
        }
    }

    #[test]
    fn binary_operators_follow_propagation_law(a in result(), b in result()) {
        let eval = |op: u16| rpn::evaluate(&[0, 1, op, RPN_EQUAL], |wp: WatchIndex| {
            if wp.get() == 0 { a } else { b }
        });
        let expect = |r: WatchResult| -> LcResult<ActionResult> { Ok(match r {
            WatchResult::False => ActionResult::Pass,
            WatchResult::True => ActionResult::Fail,
            WatchResult::Error => ActionResult::Error,
            WatchResult::Stale => ActionResult::Stale,
        }) };

        prop_assert_eq!(eval(RPN_AND), expect(reference_and(a, b)));
        prop_assert_eq!(eval(RPN_OR), expect(reference_or(a, b)));
        prop_assert_eq!(eval(RPN_XOR), expect(reference_xor(a, b)));
        prop_assert_eq!(a.and(b), b.and(a));
        prop_assert_eq!(a.or(b), b.or(a));
        prop_assert_eq!(a.not().not(), a);
    }
}
