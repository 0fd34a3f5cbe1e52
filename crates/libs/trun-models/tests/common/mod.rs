#![allow(dead_code)]

pub mod db_test_context;

pub fn from_env(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| panic!("Env Variable '{var}' missing"))
}
