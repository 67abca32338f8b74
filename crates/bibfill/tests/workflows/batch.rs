use chrono::NaiveDate;

use super::*;

/// Three identifiers against a mock: one found by Google Books, one found by
/// Open Library, one unknown to both.
async fn mock_catalogue() -> MockServer {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/books/v1/volumes"))
    .and(query_param("q", format!("isbn:{BEING_MORTAL}")))
    .respond_with(ResponseTemplate::new(200).set_body_json(google_volume("Being Mortal")))
    .with_priority(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/books/v1/volumes"))
    .respond_with(ResponseTemplate::new(200).set_body_json(google_empty()))
    .mount(&server)
    .await;

  mount_open_library(
    &server,
    "9780000000002",
    ResponseTemplate::new(200)
      .set_body_json(open_library_entry("9780000000002", "An Open Library Book")),
  )
  .await;
  Mock::given(method("GET"))
    .and(path("/api/books"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    .mount(&server)
    .await;

  server
}

#[tokio::test]
async fn test_batch_lookup_and_export() -> TestResult<()> {
  let server = mock_catalogue().await;
  let dir = tempdir()?;

  let input = dir.path().join("isbns.csv");
  std::fs::write(&input, "978-0-14-312774-1\n\n9780000000002\n0000000000000\n")?;
  let identifiers = table::read_identifiers(&input)?;
  assert_eq!(identifiers.len(), 3);

  let coordinator = Coordinator::new(fetcher(&server), 2);
  let mut progress = Vec::new();
  let report =
    coordinator.lookup_many_with_progress(identifiers, |update| progress.push(update)).await;

  assert_eq!(progress.last(), Some(&Progress { completed: 3, total: 3 }));
  assert_eq!(report.total(), 3);
  assert_eq!(report.found_count(), 2);
  assert_eq!(report.not_found, ["0000000000000"]);
  assert!(report.errors.is_empty());

  let mut sources: Vec<_> =
    report.found().map(|record| (record.isbn.as_str(), record.source.as_str())).collect();
  sources.sort();
  assert_eq!(sources, [("978-0-14-312774-1", "google_books"), ("9780000000002", "open_library")]);

  let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
  let files = table::export(&report, dir.path().join("out"), date)?;
  assert!(files.found.ends_with("books_metadata_found_2024-03-09.csv"));
  assert!(files.errors.is_none());

  let found = std::fs::read_to_string(&files.found)?;
  let mut lines = found.lines();
  assert!(lines.next().unwrap_or_default().starts_with("ISBN,Title,Authors,Publisher"));
  assert_eq!(lines.count(), 2);

  let not_found = std::fs::read_to_string(files.not_found.unwrap())?;
  assert_eq!(not_found, "0000000000000\n");
  Ok(())
}

#[tokio::test]
async fn test_failures_land_in_not_found_and_errors() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/books/v1/volumes"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/books"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    .mount(&server)
    .await;

  let report = Coordinator::new(fetcher(&server), 10)
    .lookup_many(["9780000000001", "9780000000002", "9780000000001"])
    .await;

  assert_eq!(report.total(), 3);
  assert_eq!(report.found_count(), 0);
  assert_eq!(report.not_found.len(), 3);
  assert_eq!(report.errors.len(), 3);
  assert!(report.errors.iter().all(|entry| entry.error == "google_books returned HTTP 500"));
  // Three attempts per identifier on the primary, one on the secondary.
  assert_eq!(hits(&server, "/books/v1/volumes").await, 9);
  assert_eq!(hits(&server, "/api/books").await, 3);

  let dir = tempdir()?;
  let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
  let files = table::export(&report, dir.path(), date)?;
  let errors = std::fs::read_to_string(files.errors.unwrap())?;
  assert_eq!(errors.lines().next(), Some("ISBN,Error"));
  assert_eq!(errors.lines().count(), 4);
  Ok(())
}
