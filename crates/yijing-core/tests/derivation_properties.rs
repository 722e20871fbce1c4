use proptest::prelude::*;
use proptest::test_runner::Config;
use yijing_core::{
    changing_line_index, to_binary_key, to_line_vector, BinaryInput, HexagramTable, LineVector,
    Relation, TABLE_SIZE,
};

fn table() -> HexagramTable {
    HexagramTable::embedded().expect("embedded table")
}

fn any_lines() -> impl Strategy<Value = LineVector> {
    prop::array::uniform6(0u8..=1).prop_map(|l| LineVector::new(l).expect("0/1 lines"))
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn user_number_selection_is_periodic(n in -1_000_000_i64..1_000_000, k in -1_000_i64..1_000) {
        let t = table();
        let a = t.find_by_user_number(n);
        let b = t.find_by_user_number(n + 64 * k);
        prop_assert_eq!(a.number, b.number);
    }

    #[test]
    fn user_number_selection_never_panics(n in any::<i64>()) {
        let t = table();
        let h = t.find_by_user_number(n);
        prop_assert!(t.all().iter().any(|x| std::ptr::eq(x, h)));
    }

    #[test]
    fn opposite_twice_is_identity(lines in any_lines()) {
        prop_assert_eq!(lines.complement().complement(), lines);
    }

    #[test]
    fn inverted_twice_is_identity(lines in any_lines()) {
        prop_assert_eq!(lines.reversed().reversed(), lines);
    }

    #[test]
    fn changed_differs_in_exactly_the_moving_line(lines in any_lines(), n in any::<i64>()) {
        let changed = Relation::Changed.apply(&lines, n);
        let before = lines.lines();
        let after = changed.lines();
        let diffs: Vec<usize> = (0..6).filter(|&i| before[i] != after[i]).collect();
        prop_assert_eq!(diffs, vec![changing_line_index(n)]);
        prop_assert_eq!(changing_line_index(n), n.rem_euclid(6) as usize);
    }

    #[test]
    fn mutual_ignores_user_number(index in 0usize..64, a in any::<i64>(), b in any::<i64>()) {
        let t = table();
        let original = &t.all()[index];
        let first = t.calculate_all_related(original, a).mutual.map(|h| h.number);
        let second = t.calculate_all_related(original, b).mutual.map(|h| h.number);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn composite_never_fails(n in any::<i64>()) {
        let t = table();
        let original = t.find_by_user_number(n);
        let result = t.calculate_all_related(original, n);
        prop_assert_eq!(result.original.number, original.number);
        for (relation, found) in result.related() {
            let expected = relation.apply(&original.lines.expect("lines"), n);
            prop_assert_eq!(found.and_then(|h| h.lines), Some(expected));
        }
    }
}

#[test]
fn conversion_roundtrips_for_every_table_entry() {
    let t = table();
    assert_eq!(t.len(), TABLE_SIZE);
    for h in t.all() {
        let key = h.binary_key().expect("valid key");
        let lines = to_line_vector(&BinaryInput::Text(key.clone())).unwrap();
        let again = to_line_vector(&BinaryInput::Text(to_binary_key(&lines))).unwrap();
        assert_eq!(lines, again);
        assert_eq!(to_binary_key(&again), key);
    }
}

#[test]
fn keys_cover_all_sixty_four_patterns() {
    let t = table();
    for value in 0u32..64 {
        let key = format!("{value:06b}");
        assert!(t.find_by_binary_key(&key).is_some(), "missing {key}");
    }
}

#[test]
fn all_yang_scenario() {
    let t = table();
    let original = t.find_by_binary_key("111111").unwrap();
    let lines = original.lines.unwrap();

    assert_eq!(changing_line_index(7), 1);
    assert_eq!(Relation::Changed.apply(&lines, 7).to_binary_key(), "101111");
    assert_eq!(Relation::Opposite.apply(&lines, 7).to_binary_key(), "000000");
    assert_eq!(Relation::Inverted.apply(&lines, 7).to_binary_key(), "111111");

    let result = t.calculate_all_related(original, 7);
    assert_eq!(result.changed.and_then(|h| h.binary_key()).as_deref(), Some("101111"));
    assert_eq!(result.opposite.and_then(|h| h.binary_key()).as_deref(), Some("000000"));
    assert_eq!(result.inverted.and_then(|h| h.binary_key()).as_deref(), Some("111111"));
}

#[test]
fn mutual_scenario() {
    let lines = LineVector::parse("010001").unwrap();
    assert_eq!(lines.mutual().lines(), [0, 0, 0, 1, 0, 0]);
    let t = table();
    let original = t.find_by_binary_key("010001").unwrap();
    assert_eq!(
        t.calculate_mutual(original).and_then(|h| h.binary_key()).as_deref(),
        Some("000100")
    );
}

#[test]
fn negative_and_zero_user_numbers() {
    let t = table();
    assert_eq!(t.find_by_user_number(0).number, 1);
    assert_eq!(t.find_by_user_number(64).number, 1);
    assert_eq!(t.find_by_user_number(-1).number, 64);
    assert_eq!(t.find_by_user_number(i64::MIN).number, t.find_by_user_number(0).number);
}

#[test]
fn global_helpers_match_table() {
    let reading = yijing_core::cast(7).unwrap();
    assert_eq!(reading.original.number, 8);
    assert_eq!(yijing_core::find_by_user_number(7).unwrap().number, 8);
    assert_eq!(yijing_core::get_all_hexagrams().unwrap().len(), TABLE_SIZE);
    assert!(yijing_core::find_by_binary_key("0").unwrap().is_some());
}
