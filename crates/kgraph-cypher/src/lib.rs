//! # KGraph Cypher
//!
//! A read-only Cypher subset evaluated over any [`GraphBackend`].
//!
//! ```text
//! MATCH (a:Person {name: $who})-[r:KNOWS]->(b)
//! WHERE b.age >= 30
//! RETURN DISTINCT b.name AS friend ORDER BY friend LIMIT 10
//! ```

pub mod ast;
pub mod cmp;
pub mod eval;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod result;

pub use eval::Parameters;
pub use executor::Executor;
pub use parser::{ParseError, parse_query};
pub use result::{QueryResult, Row, Value};

use kgraph_core::GraphBackend;
use thiserror::Error;

/// Errors that can occur during query execution.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Execution error
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Variable not found
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// Parameter referenced but not supplied
    #[error("Parameter ${0} not found in provided parameters")]
    ParameterNotFound(String),

    /// Unknown function name
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Parses and executes a query against a backend.
pub fn execute_query<B: GraphBackend + ?Sized>(
    backend: &B,
    query: &str,
    params: Option<&Parameters>,
) -> Result<QueryResult> {
    let ast = parse_query(query)?;
    Executor::new(backend).execute(&ast, params)
}
