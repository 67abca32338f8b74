use bibfill::{
  config::Config,
  coordinator::{Coordinator, Progress},
  table,
};

use super::*;

mod batch;
mod live;

#[test]
fn test_shipped_provider_definitions() {
  let providers = Config::default().provider_configs().unwrap();
  assert_eq!(providers.len(), 2);

  let google = &providers[0];
  assert_eq!(google.name, "google_books");
  assert_eq!(google.retry, RetryPolicy::fixed(3, 1000));
  assert_eq!(google.api_key_env.as_deref(), Some("GOOGLE_BOOKS_API_KEY"));
  assert!(google.field_maps.contains_key(&Field::Title));

  let open_library = &providers[1];
  assert_eq!(open_library.name, "open_library");
  assert_eq!(open_library.retry, RetryPolicy::once());
  assert!(!open_library.field_maps.contains_key(&Field::Source));
}
