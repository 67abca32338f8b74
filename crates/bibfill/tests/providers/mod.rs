use bibfill::{error::BibfillError, provider::Provider};

use super::*;

#[tokio::test]
async fn test_primary_match() -> TestResult<()> {
  let server = MockServer::start().await;
  let volume = google_volume("Being Mortal");
  mount_google(&server, BEING_MORTAL, ResponseTemplate::new(200).set_body_json(volume)).await;

  let record = fetcher(&server).fetch(BEING_MORTAL).await;

  assert_eq!(record.source, "google_books");
  assert_eq!(record.isbn, BEING_MORTAL);
  assert_eq!(record.title(), "Being Mortal");
  assert_eq!(record.get(Field::Authors), Some("Atul Gawande"));
  assert_eq!(record.get(Field::PageCount), Some("282"));
  assert_eq!(
    record.get(Field::Identifiers),
    Some("ISBN_10: 0143127748, ISBN_13: 9780143127741")
  );
  assert!(record.error.is_none());
  assert_eq!(hits(&server, "/api/books").await, 0);
  Ok(())
}

#[tokio::test]
async fn test_fallback_to_secondary() -> TestResult<()> {
  let server = MockServer::start().await;
  let empty = ResponseTemplate::new(200).set_body_json(google_empty());
  mount_google(&server, BEING_MORTAL, empty).await;
  mount_open_library(
    &server,
    BEING_MORTAL,
    ResponseTemplate::new(200).set_body_json(open_library_entry(BEING_MORTAL, "Being Mortal")),
  )
  .await;

  let record = fetcher(&server).fetch(BEING_MORTAL).await;

  assert_eq!(record.source, "open_library");
  assert_eq!(record.title(), "Being Mortal");
  assert_eq!(record.get(Field::Publisher), Some("Metropolitan Books"));
  assert_eq!(record.get(Field::Language), Some("eng"));
  assert_eq!(record.get(Field::Identifiers), Some("isbn_13: 9780143127741"));
  assert!(record.error.is_none());
  Ok(())
}

#[tokio::test]
async fn test_both_providers_miss() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_google(&server, "0000000000000", ResponseTemplate::new(200).set_body_json(google_empty()))
    .await;
  mount_open_library(&server, "0000000000000", ResponseTemplate::new(200).set_body_json(json!({})))
    .await;

  let record = fetcher(&server).fetch("0000000000000").await;

  assert!(record.is_not_found());
  assert_eq!(record.title(), NOT_FOUND);
  assert_eq!(record.source, NO_SOURCE);
  assert_eq!(record.isbn, "0000000000000");
  assert!(record.error.is_none());
  Ok(())
}

#[tokio::test]
async fn test_primary_is_retried_then_reported() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_google(&server, BEING_MORTAL, ResponseTemplate::new(500).set_body_string("backend error"))
    .await;
  mount_open_library(&server, BEING_MORTAL, ResponseTemplate::new(200).set_body_json(json!({})))
    .await;

  let record = fetcher(&server).fetch(BEING_MORTAL).await;

  assert_eq!(hits(&server, "/books/v1/volumes").await, 3);
  assert_eq!(hits(&server, "/api/books").await, 1);
  assert!(record.is_not_found());
  assert_eq!(record.error.as_deref(), Some("google_books returned HTTP 500"));

  let log = record.log.expect("failed attempt is logged");
  assert_eq!(log.attempts().len(), 1);
  assert_eq!(log.attempts()[0].provider, "google_books");
  assert_eq!(log.attempts()[0].body.as_deref(), Some("backend error"));
  Ok(())
}

#[tokio::test]
async fn test_secondary_is_not_retried() -> TestResult<()> {
  let server = MockServer::start().await;
  let empty = ResponseTemplate::new(200).set_body_json(google_empty());
  mount_google(&server, BEING_MORTAL, empty).await;
  mount_open_library(&server, BEING_MORTAL, ResponseTemplate::new(503)).await;

  let record = fetcher(&server).fetch(BEING_MORTAL).await;

  assert_eq!(hits(&server, "/api/books").await, 1);
  assert_eq!(record.error.as_deref(), Some("open_library returned HTTP 503"));
  Ok(())
}

#[tokio::test]
async fn test_hyphenated_identifier_is_normalized() -> TestResult<()> {
  let server = MockServer::start().await;
  let volume = google_volume("Being Mortal");
  mount_google(&server, BEING_MORTAL, ResponseTemplate::new(200).set_body_json(volume)).await;

  let record = fetcher(&server).fetch("978-0-14-312774-1").await;

  assert_eq!(record.source, "google_books");
  assert_eq!(record.isbn, "978-0-14-312774-1");
  Ok(())
}

#[tokio::test]
async fn test_identifier_without_digits_is_not_sent() -> TestResult<()> {
  let server = MockServer::start().await;

  let record = fetcher(&server).fetch("--").await;

  assert!(record.is_not_found());
  assert_eq!(hits(&server, "/books/v1/volumes").await, 0);
  Ok(())
}

#[tokio::test]
async fn test_missing_credentials_skip_the_request() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_open_library(
    &server,
    BEING_MORTAL,
    ResponseTemplate::new(200).set_body_json(open_library_entry(BEING_MORTAL, "Being Mortal")),
  )
  .await;

  let keyed = ProviderConfig {
    requires_key: true,
    api_key: None,
    api_key_env: Some("BIBFILL_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
    ..google_books(&server)
  };
  let google = HttpProvider::new(keyed)?;
  assert!(matches!(
    google.lookup(&Isbn::new(BEING_MORTAL)).await,
    Err(BibfillError::MissingCredentials(name)) if name == "google_books"
  ));

  let record = Fetcher::new()
    .with_provider(google)
    .with_provider(HttpProvider::new(open_library(&server))?)
    .fetch(BEING_MORTAL)
    .await;

  assert_eq!(record.source, "open_library");
  assert_eq!(hits(&server, "/books/v1/volumes").await, 0);
  Ok(())
}

#[tokio::test]
async fn test_api_key_is_sent_and_masked() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/books/v1/volumes"))
    .and(query_param("key", "secret-key-123"))
    .respond_with(ResponseTemplate::new(200).set_body_json(google_volume("Being Mortal")))
    .expect(1)
    .mount(&server)
    .await;

  let google = HttpProvider::new(google_books(&server).with_api_key("secret-key-123"))?;
  let endpoint = google.endpoint(&Isbn::new(BEING_MORTAL));
  assert!(endpoint.contains("secr****"));
  assert!(!endpoint.contains("secret-key-123"));

  let record = google.lookup(&Isbn::new(BEING_MORTAL)).await?;
  assert_eq!(record.map(|r| r.title().to_string()).as_deref(), Some("Being Mortal"));
  Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_an_error() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_google(&server, BEING_MORTAL, ResponseTemplate::new(200).set_body_string("not json")).await;
  mount_open_library(&server, BEING_MORTAL, ResponseTemplate::new(200).set_body_json(json!({})))
    .await;

  let record = fetcher(&server).fetch(BEING_MORTAL).await;

  assert!(record.is_not_found());
  assert!(record.error.is_some());
  // Decoding failures are permanent and not retried.
  assert_eq!(hits(&server, "/books/v1/volumes").await, 1);
  Ok(())
}

#[test]
fn test_record_serializes_with_export_names() {
  let record = Record::new(BEING_MORTAL).with_field(Field::Title, "Being Mortal");
  let value = serde_json::to_value(&record).unwrap();
  assert_eq!(value["ISBN"], BEING_MORTAL);
  assert_eq!(value["Title"], "Being Mortal");
  assert_eq!(value["Source"], NO_SOURCE);
  assert!(value.get("Error").is_none());
}
