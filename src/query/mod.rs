//! Parameterized query building and execution.
//!
//! A [`QueryBuilder`] owns the environment, the SQL text, the user-supplied
//! parameters and the parameters accumulated by conditions. Executing it runs
//! the statement through a [`Connector`] and keeps the rows as a
//! [`ResultSet`].

mod condition;
mod placeholders;
mod source;

pub use condition::{
    validate_field, Condition, ConditionValue, Operator, RenderedCondition, MAX_FIELD_LEN,
};
pub use placeholders::{placeholder_count, to_numbered};
pub use source::SqlSource;

use crate::config::{Environment, Settings};
use crate::db::{Connector, QueryRequest, Value};
use crate::dialect::Dialect;
use crate::error::{GenDbError, Result};
use crate::results::ResultSet;
use std::time::Duration;
use tracing::{debug, error, info};

/// Builds and runs one parameterized statement.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    environment: Environment,
    dialect: Dialect,
    settings: Settings,
    sql: String,
    vars: Vec<Value>,
    condition_vars: Vec<Value>,
    result: ResultSet,
}

impl QueryBuilder {
    /// Creates a builder for `environment` with empty SQL.
    pub fn new(environment: Environment) -> Self {
        info!("Initializing query builder: {}", environment.display_string());
        let dialect = environment.dialect();
        Self {
            environment,
            dialect,
            ..Default::default()
        }
    }

    /// Sets the SQL text or `.sql` file path.
    pub fn with_sql(mut self, sql: &str) -> Result<Self> {
        self.set_query(sql)?;
        Ok(self)
    }

    /// Sets the user parameters.
    pub fn with_vars<I, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.set_vars(vars);
        self
    }

    /// Sets the execution settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Dialect resolved when the environment was last configured.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current SQL text, including any appended conditions.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// User-supplied parameters.
    pub fn vars(&self) -> &[Value] {
        &self.vars
    }

    /// Parameters accumulated by conditions.
    pub fn condition_vars(&self) -> &[Value] {
        &self.condition_vars
    }

    /// The result set of the last successful execution.
    pub fn result(&self) -> &ResultSet {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut ResultSet {
        &mut self.result
    }

    pub fn into_result(self) -> ResultSet {
        self.result
    }

    /// Updates environment attributes; the whole update is rejected if any
    /// key is unknown. The dialect is re-derived afterwards.
    pub fn set_environment<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.environment.update(entries)?;
        self.dialect = self.environment.dialect();
        Ok(())
    }

    /// Replaces the SQL text. Conditions added earlier are discarded along
    /// with the text they were appended to.
    pub fn set_query(&mut self, sql: &str) -> Result<()> {
        self.sql = SqlSource::resolve(sql)?;
        self.condition_vars.clear();
        Ok(())
    }

    /// Replaces the user parameters.
    pub fn set_vars<I, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.vars = vars.into_iter().map(Into::into).collect();
        info!("Adding Variables: {:?}", self.vars);
    }

    /// Replaces the user parameters with a single value.
    pub fn set_var(&mut self, var: impl Into<Value>) {
        self.set_vars([var.into()]);
    }

    /// Appends `AND <fragment>` for the condition `field operator value`.
    ///
    /// The base SQL must already end in a WHERE clause (e.g. `WHERE 1=1`).
    /// On error nothing is changed.
    pub fn add_conditional(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<ConditionValue>,
    ) -> Result<()> {
        let value = value.into();
        info!("Updating Conditionals: {field} {operator} {:?}", value);

        let rendered = Condition::new(field, operator, value)
            .and_then(|c| c.render(self.dialect))
            .map_err(|e| {
                error!("{e}");
                e
            })?;

        self.sql = format!("{} AND {}", self.sql, rendered.fragment);
        self.condition_vars.extend(rendered.params);
        Ok(())
    }

    /// Applies a condition per `(field, (operator, value))` entry, stopping at
    /// the first rejected one.
    pub fn add_conditionals<I, F, O, V>(&mut self, conditions: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, (O, V))>,
        F: AsRef<str>,
        O: AsRef<str>,
        V: Into<ConditionValue>,
    {
        for (field, (operator, value)) in conditions {
            self.add_conditional(field.as_ref(), operator.as_ref(), value)?;
        }
        Ok(())
    }

    /// User parameters followed by condition parameters.
    pub fn bound_parameters(&self) -> Vec<Value> {
        self.vars
            .iter()
            .chain(self.condition_vars.iter())
            .cloned()
            .collect()
    }

    /// Runs the statement and stores the rows.
    ///
    /// On failure the previous result set is kept and the error returned.
    pub async fn execute(&mut self, connector: &dyn Connector) -> Result<&ResultSet> {
        let params = self.bound_parameters();
        let connection = self.environment.connection_parameters();

        let expected = placeholder_count(&self.sql);
        if expected != params.len() {
            let err = GenDbError::query(format!(
                "Statement has {expected} placeholders but {} parameters were supplied",
                params.len()
            ));
            error!("{err}");
            return Err(err);
        }

        info!("Query: Creating Connection");
        debug!("Connection details: {:?}", connection.details);
        debug!("SQL Statement: {}", self.sql);
        debug!("SQL Variables: {:?}", params);

        let request = QueryRequest {
            environment: &self.environment,
            dialect: self.dialect,
            sql: &self.sql,
            params: &params,
            timeout: Duration::from_secs(self.settings.timeout_secs),
        };

        info!("Query: Executing SQL Statement");
        let outcome = connector.run(request).await.map_err(|e| {
            error!("{}: {e}", e.category());
            e
        })?;

        if self.settings.debug {
            debug!("Columns: {:?}", outcome.columns);
        }
        let result = ResultSet::from_query_result(outcome);
        info!("Total Result Count: {}", result.len());
        if self.settings.debug {
            if let Some(first) = result.rows().first() {
                debug!("Index 0: {:?}", first);
            }
        }

        self.result = result;
        Ok(&self.result)
    }
}
