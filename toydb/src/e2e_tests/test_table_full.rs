//! Test behavior when the table runs out of pages.

use crate::config::TableConfig;
use crate::e2e_tests::helpers::*;

#[test]
fn test_table_full_error() {
    let test = TestDb::with_config(TableConfig { max_pages: 3 });

    let mut commands: Vec<String> = (1..=21).map(insert_command).collect();
    commands.push("select".to_string());
    commands.push(".exit".to_string());
    let results = test.run_script(&commands);

    assert!(results[..20].iter().all(|line| line == "db > Executed."));
    assert_eq!(results[20], "db > Error: Table is full.");

    let mut expected = vec![format!("db > {}", row_line(1))];
    expected.extend((2..=20).map(row_line));
    expected.push("Executed.".to_string());
    expected.push("db > ".to_string());
    assert_eq!(results[21..], expected[..]);
}

#[test]
fn test_table_full_with_default_capacity() {
    let test = TestDb::new();

    let commands: Vec<String> = (1..=1400).map(insert_command).collect();
    let results = test.run_script(&commands);

    #[allow(clippy::expect_used)]
    let first_full = results
        .iter()
        .position(|line| line == "db > Error: Table is full.")
        .expect("table never filled");
    assert!(results[..first_full].iter().all(|line| line == "db > Executed."));
    assert!(results[first_full..1400]
        .iter()
        .all(|line| line == "db > Error: Table is full."));

    let results = test.run_script(&["select"]);
    assert_eq!(results.len(), first_full + 2);
    assert_eq!(results[first_full], "Executed.");
}
