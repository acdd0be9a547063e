//! Test username and email length limits.

use crate::e2e_tests::helpers::*;
use crate::types::{EMAIL_SIZE, USERNAME_SIZE};

#[test]
fn test_max_length_strings() {
    let test = TestDb::new();

    let username = "a".repeat(USERNAME_SIZE);
    let email = "a".repeat(EMAIL_SIZE);
    let results = test.run_script(&[
        format!("insert 1 {username} {email}"),
        "select".to_string(),
        ".exit".to_string(),
    ]);

    assert_eq!(
        results,
        vec![
            "db > Executed.".to_string(),
            format!("db > (1, {username}, {email})"),
            "Executed.".to_string(),
            "db > ".to_string(),
        ]
    );
}

#[test]
fn test_strings_too_long() {
    let test = TestDb::new();

    let username = "a".repeat(USERNAME_SIZE + 1);
    let email = "a".repeat(EMAIL_SIZE + 1);
    let results = test.run_script(&[
        format!("insert 1 {username} {email}"),
        format!("insert 1 user1 {email}"),
        "select".to_string(),
        ".exit".to_string(),
    ]);

    assert_eq!(
        results,
        vec![
            "db > String is too long.",
            "db > String is too long.",
            "db > Executed.",
            "db > ",
        ]
    );
}
