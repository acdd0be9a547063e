//! Test how malformed statements are reported.

use crate::e2e_tests::helpers::*;

#[test]
fn test_negative_id() {
    let test = TestDb::new();

    let results = test.run_script(&["insert -1 cstack foo@bar.com", "select", ".exit"]);
    assert_eq!(
        results,
        vec!["db > ID must be positive.", "db > Executed.", "db > "]
    );
}

#[test]
fn test_id_too_large() {
    let test = TestDb::new();

    let results = test.run_script(&["insert 4294967296 a b", ".exit"]);
    assert_eq!(results, vec!["db > ID is too large.", "db > "]);
}

#[test]
fn test_syntax_error() {
    let test = TestDb::new();

    let results = test.run_script(&["insert 1 user1", "insert x a b", ".exit"]);
    assert_eq!(
        results,
        vec![
            "db > Syntax error. Could not parse statement.",
            "db > Syntax error. Could not parse statement.",
            "db > ",
        ]
    );
}

#[test]
fn test_unrecognized_keyword() {
    let test = TestDb::new();

    let results = test.run_script(&["delete 1", ".exit"]);
    assert_eq!(
        results,
        vec!["db > Unrecognized keyword at start of 'delete 1'.", "db > "]
    );
}
