//! Lookups against the real services. Run with `cargo test -- --ignored`.

use super::*;

#[ignore = "Hits the live Google Books and Open Library APIs"]
#[tokio::test]
async fn test_live_known_isbn() -> TestResult<()> {
  let fetcher = Fetcher::from_config(&Config::default())?;
  let record = fetcher.fetch("978-0-14-312774-1").await;

  assert!(!record.is_not_found());
  assert!(record.title().contains("Being Mortal"));
  assert_ne!(record.source, NO_SOURCE);
  Ok(())
}

#[ignore = "Hits the live Google Books and Open Library APIs"]
#[tokio::test]
async fn test_live_unknown_isbn() -> TestResult<()> {
  let report = Coordinator::from_config(&Config::default())?
    .lookup_many([BEING_MORTAL, "0000000000000"])
    .await;

  assert_eq!(report.total(), 2);
  assert_eq!(report.not_found, ["0000000000000"]);
  Ok(())
}
