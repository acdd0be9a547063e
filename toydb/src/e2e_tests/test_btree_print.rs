//! Test the `.btree` tree dump.

use crate::e2e_tests::helpers::*;

fn leaf_lines(indent: &str, ids: std::ops::RangeInclusive<i64>) -> Vec<String> {
    let ids: Vec<i64> = ids.collect();
    let mut lines = vec![format!("{indent}- leaf (size {})", ids.len())];
    lines.extend(ids.iter().map(|id| format!("{indent}  - {id}")));
    lines
}

#[test]
fn test_print_one_node_btree() {
    let test = TestDb::new();

    let mut commands: Vec<String> = [3, 1, 2].map(insert_command).to_vec();
    commands.push(".btree".to_string());
    commands.push(".exit".to_string());
    let results = test.run_script(&commands);

    assert_eq!(
        results,
        vec![
            "db > Executed.",
            "db > Executed.",
            "db > Executed.",
            "db > Tree:",
            "- leaf (size 3)",
            "  - 1",
            "  - 2",
            "  - 3",
            "db > ",
        ]
    );
}

#[test]
fn test_print_btree_of_depth_two() {
    let test = TestDb::new();

    let mut commands: Vec<String> = (1..=14).map(insert_command).collect();
    commands.push(".btree".to_string());
    commands.push(".exit".to_string());
    let results = test.run_script(&commands);

    let mut expected = vec!["db > Tree:".to_string(), "- internal (size 1)".to_string()];
    expected.extend(leaf_lines("  ", 1..=7));
    expected.push("  - key 7".to_string());
    expected.extend(leaf_lines("  ", 8..=14));
    expected.push("db > ".to_string());
    assert_eq!(results[14..], expected[..]);
}

#[test]
fn test_print_four_leaf_node_btree() {
    let test = TestDb::new();

    let ids = [
        18, 7, 10, 29, 23, 4, 14, 30, 15, 26, 22, 19, 2, 1, 21, 11, 6, 20, 5, 8, 9, 3, 12, 27, 17,
        16, 13, 24, 25, 28,
    ];
    let mut commands: Vec<String> = ids.map(insert_command).to_vec();
    commands.push(".btree".to_string());
    commands.push(".exit".to_string());
    let results = test.run_script(&commands);

    let mut expected = vec!["db > Tree:".to_string(), "- internal (size 3)".to_string()];
    expected.extend(leaf_lines("  ", 1..=7));
    expected.push("  - key 7".to_string());
    expected.extend(leaf_lines("  ", 8..=15));
    expected.push("  - key 15".to_string());
    expected.extend(leaf_lines("  ", 16..=22));
    expected.push("  - key 22".to_string());
    expected.extend(leaf_lines("  ", 23..=30));
    expected.push("db > ".to_string());
    assert_eq!(results[ids.len()..], expected[..]);
}

#[test]
fn test_print_three_level_btree() {
    let test = TestDb::new();

    let mut commands: Vec<String> = (1..=60).map(insert_command).collect();
    commands.push(".btree".to_string());
    let results = test.run_script(&commands);

    let dump = &results[60..];
    assert_eq!(dump[0], "db > Tree:");
    assert_eq!(dump[1], "- internal (size 2)");
    assert_eq!(dump[2], "  - internal (size 1)");

    // Every id appears exactly once as a leaf entry, in order.
    let leaf_ids: Vec<i64> = dump
        .iter()
        .filter_map(|line| line.trim_start().strip_prefix("- "))
        .filter_map(|rest| rest.parse().ok())
        .collect();
    assert_eq!(leaf_ids, (1..=60).collect::<Vec<_>>());
}
