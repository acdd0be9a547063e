//! Test that duplicate ids are rejected.

use crate::e2e_tests::helpers::*;

#[test]
fn test_duplicate_id_is_rejected() {
    let test = TestDb::new();

    let results = test.run_script(&[
        "insert 1 user1 person1@example.com",
        "insert 1 user1 person1@example.com",
        "select",
        ".exit",
    ]);

    assert_eq!(
        results,
        vec![
            "db > Executed.",
            "db > Error: Duplicate key.",
            "db > (1, user1, person1@example.com)",
            "Executed.",
            "db > ",
        ]
    );
}

#[test]
fn test_duplicate_after_split() {
    let test = TestDb::new();

    let mut commands: Vec<String> = (1..=30).map(insert_command).collect();
    commands.extend([1, 14, 30].map(insert_command));
    let results = test.run_script(&commands);

    assert!(results[..30].iter().all(|line| line == "db > Executed."));
    assert_eq!(results[30..33], ["db > Error: Duplicate key."; 3]);
}
