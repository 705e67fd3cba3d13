//! Property tests for duration parsing: clamping and RANDOM operand order.

use proptest::prelude::*;
use statescript_frontend::{parse_states, SpecialsTable, StateTable, SymbolTable, MAX_TICS};

fn parse_duration(duration: &str) -> StateTable {
    let symbols = SymbolTable::with_builtins();
    let specials = SpecialsTable::new();
    let mut worklist = Vec::new();
    let source = format!("{{\n Spawn:\n POSS A {}\n Stop\n}}", duration);
    let (table, diagnostics) =
        parse_states(&source, "TestActor", &symbols, &specials, &mut worklist);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        diagnostics
    );
    table
}

proptest! {
    #[test]
    fn duration_in_range_stored_unchanged(tics in -1i32..=MAX_TICS) {
        let table = parse_duration(&tics.to_string());
        prop_assert_eq!(table.state(0).unwrap().tics, tics);
        prop_assert_eq!(table.state(0).unwrap().tic_range, 0);
    }

    #[test]
    fn duration_outside_range_clamped(tics in any::<i32>()) {
        let table = parse_duration(&tics.to_string());
        prop_assert_eq!(table.state(0).unwrap().tics, tics.clamp(-1, MAX_TICS));
    }

    #[test]
    fn random_operand_order_irrelevant(a in -1i32..=MAX_TICS, b in -1i32..=MAX_TICS) {
        let forward = parse_duration(&format!("RANDOM({}, {})", a, b));
        let reversed = parse_duration(&format!("RANDOM({}, {})", b, a));
        let fwd = forward.state(0).unwrap();
        let rev = reversed.state(0).unwrap();
        prop_assert_eq!((fwd.tics, fwd.tic_range), (rev.tics, rev.tic_range));
        prop_assert_eq!(fwd.tics, a.min(b));
        prop_assert_eq!(fwd.tic_range, (a.max(b) - a.min(b)));
    }

    #[test]
    fn random_operands_clamped(a in any::<i32>(), b in any::<i32>()) {
        let table = parse_duration(&format!("RANDOM({}, {})", a, b));
        let state = table.state(0).unwrap();
        let lo = a.clamp(-1, MAX_TICS).min(b.clamp(-1, MAX_TICS));
        let hi = a.clamp(-1, MAX_TICS).max(b.clamp(-1, MAX_TICS));
        prop_assert_eq!(state.tics, lo);
        prop_assert_eq!(state.tic_range, hi - lo);
    }
}
