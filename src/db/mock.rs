//! Mock connectors for testing.
//!
//! Provides in-memory connectors that return canned results or fail on
//! demand, recording what they were asked to run.

use super::{Connector, QueryRequest, QueryResult};
use crate::db::Value;
use crate::error::{GenDbError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A statement as seen by a mock connector.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub connection: String,
    pub sql: String,
    pub params: Vec<Value>,
}

/// A mock connector that returns a predefined result.
#[derive(Debug, Default)]
pub struct MockConnector {
    result: QueryResult,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockConnector {
    /// Creates a mock connector that returns an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock connector that returns `result` on every call.
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Returns the most recent call, if any.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls().pop()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn run(&self, request: QueryRequest<'_>) -> Result<QueryResult> {
        let call = RecordedCall {
            connection: request.environment.connection_parameters().connection,
            sql: request.sql.to_string(),
            params: request.params.to_vec(),
        };
        self.calls
            .lock()
            .map_err(|_| GenDbError::internal("mock call log poisoned"))?
            .push(call);
        Ok(self.result.clone())
    }
}

/// A connector whose every call fails.
#[derive(Debug, Clone)]
pub struct FailingConnector {
    message: String,
}

impl FailingConnector {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Connector for FailingConnector {
    async fn run(&self, _request: QueryRequest<'_>) -> Result<QueryResult> {
        Err(GenDbError::connection(self.message.clone()))
    }
}
