#![allow(dead_code)]

use serde_json::{Value, json};

pub mod api_client;
pub mod test_context;

pub const REPO: &str = "https://example.com/org/repo.git";

pub fn run_request(link: &str) -> Value {
    json!({ "sourceLink": link })
}
