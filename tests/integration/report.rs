//! Integration tests for the CSV report

use plugin_harvester::output::write_report;
use plugin_harvester::{Outcome, Plugin};

fn plugin(slug: &str, name: &str, installs: u64) -> Plugin {
    Plugin {
        slug: slug.to_string(),
        name: name.to_string(),
        active_installs: installs,
        last_updated: None,
        page: 1,
    }
}

#[test]
fn report_covers_every_listed_plugin_with_its_true_status() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("plugins.csv");

    let plugins = vec![
        plugin("akismet", "Akismet Anti-spam", 500_000),
        plugin("ghost", "Ghost Plugin", 90_000),
        plugin("skipped", "Never Attempted", 15_000),
    ];
    let outcomes = vec![
        Outcome::ok("akismet", "downloaded", Some("5.3".into())),
        Outcome::fail("ghost", "no download link", None),
    ];

    write_report(&plugins, &outcomes, &path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines[0], "name,version,slug,status");
    assert_eq!(lines[1], "Akismet Anti-spam,5.3,akismet,downloaded");
    assert_eq!(lines[2], "Ghost Plugin,,ghost,failed: no download link");
    assert_eq!(lines[3], "Never Attempted,,skipped,not downloaded");
    assert_eq!(lines.len(), 4);
}

#[test]
fn idempotent_skips_are_reported_as_downloaded() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("plugins.csv");

    let plugins = vec![plugin("resumed", "Resumed", 40_000)];
    let outcomes = vec![Outcome::ok("resumed", "already exists", Some("2.1".into()))];

    write_report(&plugins, &outcomes, &path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("Resumed,2.1,resumed,downloaded"));
}

#[test]
fn report_rows_follow_the_ranked_plugin_order() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("plugins.csv");

    let plugins = vec![
        plugin("first", "First", 300_000),
        plugin("second", "Second", 200_000),
        plugin("third", "Third", 100_000),
    ];
    let outcomes: Vec<Outcome> = plugins
        .iter()
        .map(|p| Outcome::ok(p.slug.clone(), "downloaded", None))
        .collect();

    write_report(&plugins, &outcomes, &path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let slugs: Vec<&str> = contents
        .lines()
        .skip(1)
        .map(|l| l.split(',').nth(2).unwrap())
        .collect();
    assert_eq!(slugs, ["first", "second", "third"]);
}
