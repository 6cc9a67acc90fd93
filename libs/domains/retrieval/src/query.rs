//! Nearest-neighbor SQL over a pgvector table.
//!
//! Parameters, in order:
//! - `$1` query embedding as a pgvector text literal, cast with `::vector`
//! - `$2` row cap
//! - `$3` excluded ids as a Postgres array literal, cast with `::bigint[]`
//!   (bound only when the exclusion set is non-empty)

use sea_orm::{DatabaseBackend, Statement, Value};
use std::fmt::Write as _;

use crate::error::{RetrievalError, RetrievalResult};
use crate::models::DistanceMetric;

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_TABLE: &str = "book_chunks3";

/// Schema-qualified chunk table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: String,
    table: String,
}

impl Default for TableName {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl TableName {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> RetrievalResult<Self> {
        let schema = schema.into();
        let table = table.into();
        if schema.trim().is_empty() {
            return Err(RetrievalError::Config("schema name is required".into()));
        }
        if table.trim().is_empty() {
            return Err(RetrievalError::Config("table name is required".into()));
        }
        Ok(Self { schema, table })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `"schema"."table"`, safe to splice into SQL.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\"\""))
}

/// `[0.1,0.2,...]`, the text form pgvector parses.
pub fn vector_literal(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * 12 + 2);
    out.push('[');
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{value}");
    }
    out.push(']');
    out
}

/// `{1,2,3}`, the text form Postgres parses as an array.
fn bigint_array_literal(ids: &[i64]) -> String {
    let joined = ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{joined}}}")
}

/// One nearest-neighbor lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalQuery {
    pub embedding: Vec<f32>,
    /// Ids that must not be returned
    pub excluded_ids: Vec<i64>,
    pub limit: u32,
    pub distance: DistanceMetric,
}

impl RetrievalQuery {
    pub fn new(
        embedding: Vec<f32>,
        excluded_ids: Vec<i64>,
        limit: u32,
        distance: DistanceMetric,
    ) -> Self {
        Self {
            embedding,
            excluded_ids,
            limit,
            distance,
        }
    }

    pub fn has_exclusions(&self) -> bool {
        !self.excluded_ids.is_empty()
    }

    /// SQL text; the exclusion clause appears only when there is something to exclude.
    pub fn sql(&self, table: &TableName) -> String {
        let filter = if self.has_exclusions() {
            " WHERE id <> ALL($3::bigint[])"
        } else {
            ""
        };
        format!(
            "SELECT id::bigint AS id, content FROM {table}{filter} ORDER BY embedding {op} $1::vector, id ASC LIMIT $2",
            table = table.qualified(),
            op = self.distance.operator(),
        )
    }

    pub fn values(&self) -> Vec<Value> {
        let mut values: Vec<Value> = vec![
            vector_literal(&self.embedding).into(),
            i64::from(self.limit).into(),
        ];
        if self.has_exclusions() {
            values.push(bigint_array_literal(&self.excluded_ids).into());
        }
        values
    }

    pub fn to_statement(&self, table: &TableName) -> Statement {
        Statement::from_sql_and_values(DatabaseBackend::Postgres, self.sql(table), self.values())
    }
}
