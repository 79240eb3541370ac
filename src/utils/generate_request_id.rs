use uuid::Uuid;

/// Generates a correlation id for a new request.
///
/// Ids are random v4 UUIDs in their 32-character simple form, so they are
/// unique across connections and processes without any shared counter.
pub fn generate_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}
