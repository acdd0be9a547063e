//! Test dot-prefixed meta commands.

use crate::e2e_tests::helpers::*;

#[test]
fn test_constants() {
    let test = TestDb::new();

    let results = test.run_script(&[".constants", ".exit"]);
    assert_eq!(
        results,
        vec![
            "db > Constants:",
            "ROW_SIZE: 296",
            "COMMON_NODE_HEADER_SIZE: 6",
            "LEAF_NODE_HEADER_SIZE: 14",
            "LEAF_NODE_CELL_SIZE: 300",
            "LEAF_NODE_SPACE_FOR_CELLS: 4082",
            "LEAF_NODE_MAX_CELLS: 13",
            "db > ",
        ]
    );
}

#[test]
fn test_unrecognized_command() {
    let test = TestDb::new();

    let results = test.run_script(&[".tables", ".exit"]);
    assert_eq!(results, vec!["db > Unrecognized command '.tables'.", "db > "]);
}

#[test]
fn test_exit_stops_reading() {
    let test = TestDb::new();

    let results = test.run_script(&[".exit", "insert 1 user1 person1@example.com"]);
    assert_eq!(results, vec!["db > "]);

    let results = test.run_script(&["select"]);
    assert_eq!(results, vec!["db > Executed.", "db > "]);
}
