//! Test inserting rows and reading them back.

use crate::e2e_tests::helpers::*;

#[test]
fn test_insert_and_select_one_row() {
    let test = TestDb::new();

    let results = test.run_script(&[
        "insert 1 user1 person1@example.com",
        "select",
        ".exit",
    ]);

    assert_eq!(
        results,
        vec![
            "db > Executed.",
            "db > (1, user1, person1@example.com)",
            "Executed.",
            "db > ",
        ]
    );
}

#[test]
fn test_select_empty_table() {
    let test = TestDb::new();

    let results = test.run_script(&["select", ".exit"]);
    assert_eq!(results, vec!["db > Executed.", "db > "]);
}

#[test]
fn test_end_of_input_acts_like_exit() {
    let test = TestDb::new();

    let results = test.run_script(&["insert 1 user1 person1@example.com"]);
    assert_eq!(results, vec!["db > Executed.", "db > "]);

    let results = test.run_script(&["select"]);
    assert_eq!(results[0], "db > (1, user1, person1@example.com)");
}

#[test]
fn test_select_rows_in_multi_level_tree() {
    let test = TestDb::new();

    let mut commands: Vec<String> = (1..=15).map(insert_command).collect();
    commands.push("select".to_string());
    commands.push(".exit".to_string());
    let results = test.run_script(&commands);

    let mut expected = vec![format!("db > {}", row_line(1))];
    expected.extend((2..=15).map(row_line));
    expected.push("Executed.".to_string());
    expected.push("db > ".to_string());
    assert_eq!(results[15..], expected[..]);
}

#[test]
fn test_select_after_shuffled_inserts() {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    let test = TestDb::new();

    let mut ids: Vec<i64> = (1..=100).collect();
    ids.shuffle(&mut StdRng::seed_from_u64(5));
    let mut commands: Vec<String> = ids.iter().map(|&id| insert_command(id)).collect();
    commands.push("select".to_string());
    let results = test.run_script(&commands);

    assert!(results[..100].iter().all(|line| line == "db > Executed."));
    let mut expected = vec![format!("db > {}", row_line(1))];
    expected.extend((2..=100).map(row_line));
    expected.push("Executed.".to_string());
    expected.push("db > ".to_string());
    assert_eq!(results[100..], expected[..]);
}
