//! Test that rows survive closing and reopening the database.

use crate::e2e_tests::helpers::*;
use crate::storage::PAGE_SIZE;

#[test]
fn test_keeps_data_after_closing() {
    let test = TestDb::new();

    let results = test.run_script(&["insert 1 user1 person1@example.com", ".exit"]);
    assert_eq!(results, vec!["db > Executed.", "db > "]);

    let results = test.run_script(&["select", ".exit"]);
    assert_eq!(
        results,
        vec![
            "db > (1, user1, person1@example.com)",
            "Executed.",
            "db > ",
        ]
    );
}

#[test]
fn test_tree_survives_reopen() {
    let test = TestDb::new();

    let mut commands: Vec<String> = (1..=50).rev().map(insert_command).collect();
    commands.push(".btree".to_string());
    let first = test.run_script(&commands);

    let second = test.run_script(&[".btree", "select"]);
    assert_eq!(first[50..first.len() - 1], second[..first.len() - 51]);

    let select = &second[first.len() - 51..];
    assert_eq!(select[0], format!("db > {}", row_line(1)));
    assert_eq!(select[49], row_line(50));
    assert_eq!(select[50], "Executed.");
}

#[test]
fn test_file_is_whole_pages() {
    let test = TestDb::new();

    let commands: Vec<String> = (1..=40).map(insert_command).collect();
    test.run_script(&commands);

    #[allow(clippy::expect_used)]
    let size = std::fs::metadata(test.path()).expect("metadata").len();
    assert!(size > 0);
    assert_eq!(size % PAGE_SIZE as u64, 0);
}
