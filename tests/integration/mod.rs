//! Integration tests for gendb.

pub mod common;
pub mod export_test;
pub mod postgres_test;
pub mod query_test;
