//! Table grammars for dump extraction.
//!
//! This module provides:
//! - Field kinds and per-table field grammars
//! - The registry mapping a table kind to its grammar and default columns
//! - Output column selection parsing and validation
//! - YAML grammar files that extend or override the built-in registry

mod builtin;
mod config;

pub use config::*;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

static TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_$]+$").unwrap());

/// Errors raised while building or querying table grammars.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown table kind '{kind}' (known kinds: {known})")]
    UnknownTableKind { kind: String, known: String },
    #[error("column index {index} out of range for '{kind}' ({field_count} fields)")]
    ColumnOutOfRange {
        kind: String,
        index: usize,
        field_count: usize,
    },
    #[error("grammar for '{0}' has no fields")]
    EmptyGrammar(String),
    #[error("no output columns selected for '{0}'")]
    EmptyColumns(String),
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),
    #[error("invalid column list '{0}': expected comma-separated indexes")]
    InvalidColumnList(String),
}

/// Token type expected at one position of a tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// One or more ASCII digits
    Integer,
    /// Integer with an optional leading minus
    SignedInteger,
    /// Digits with at most one decimal point
    Decimal,
    /// Single-quoted string with backslash escapes
    QuotedString,
    /// Quoted string or the bare literal `NULL`
    NullableQuotedString,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::SignedInteger => "signed-integer",
            FieldKind::Decimal => "decimal",
            FieldKind::QuotedString => "quoted-string",
            FieldKind::NullableQuotedString => "nullable-quoted-string",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered field kinds of one tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGrammar(Vec<FieldKind>);

impl FieldGrammar {
    pub fn new(fields: Vec<FieldKind>) -> Self {
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldKind] {
        &self.0
    }
}

impl fmt::Display for FieldGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", kind)?;
        }
        Ok(())
    }
}

/// Grammar and output selection for one table kind.
///
/// Several kinds may share a SQL table name when a dump format changed over
/// time; the `version` tells them apart in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    kind: String,
    table: String,
    version: u32,
    grammar: FieldGrammar,
    columns: Vec<usize>,
}

impl TableSchema {
    /// Build a schema, checking that every output column addresses a field
    pub fn new(
        kind: impl Into<String>,
        table: impl Into<String>,
        grammar: Vec<FieldKind>,
        columns: Vec<usize>,
    ) -> Result<Self, SchemaError> {
        let kind = kind.into();
        let table = table.into();

        if !TABLE_NAME_RE.is_match(&table) {
            return Err(SchemaError::InvalidTableName(table));
        }
        if grammar.is_empty() {
            return Err(SchemaError::EmptyGrammar(kind));
        }

        let schema = Self {
            kind,
            table,
            version: 1,
            grammar: FieldGrammar::new(grammar),
            columns: Vec::new(),
        };
        schema.with_columns(columns)
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Copy of this schema selecting a different set of output columns
    pub fn with_columns(&self, columns: Vec<usize>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::EmptyColumns(self.kind.clone()));
        }
        if let Some(&index) = columns.iter().find(|&&c| c >= self.grammar.len()) {
            return Err(SchemaError::ColumnOutOfRange {
                kind: self.kind.clone(),
                index,
                field_count: self.grammar.len(),
            });
        }

        Ok(Self {
            columns,
            ..self.clone()
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn grammar(&self) -> &FieldGrammar {
        &self.grammar
    }

    pub fn field_count(&self) -> usize {
        self.grammar.len()
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }
}

/// Parse an output column override such as `0,2,1`
pub fn parse_column_list(text: &str) -> Result<Vec<usize>, SchemaError> {
    let columns: Result<Vec<usize>, _> = text
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>())
        .collect();

    match columns {
        Ok(cols) if !cols.is_empty() => Ok(cols),
        _ => Err(SchemaError::InvalidColumnList(text.to_string())),
    }
}

/// Lookup table from kind name to schema
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: AHashMap<String, TableSchema>,
}

impl SchemaRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the MediaWiki table grammars
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for schema in builtin::schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Add a schema, replacing any previous schema of the same kind
    pub fn register(&mut self, schema: TableSchema) -> Option<TableSchema> {
        self.schemas.insert(schema.kind.clone(), schema)
    }

    pub fn lookup(&self, kind: &str) -> Result<&TableSchema, SchemaError> {
        self.schemas
            .get(kind)
            .ok_or_else(|| SchemaError::UnknownTableKind {
                kind: kind.to_string(),
                known: self.kinds().join(", "),
            })
    }

    /// Registered kind names in sorted order
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.schemas.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Registered schemas sorted by kind name
    pub fn schemas(&self) -> Vec<&TableSchema> {
        let mut schemas: Vec<&TableSchema> = self.schemas.values().collect();
        schemas.sort_by(|a, b| a.kind.cmp(&b.kind));
        schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(
            registry.kinds(),
            vec![
                "category",
                "categorylinks",
                "page",
                "page_props",
                "pagelinks",
                "pagelinks_props",
                "redirect"
            ]
        );
    }

    #[test]
    fn test_lookup_unknown_kind() {
        let registry = SchemaRegistry::builtin();
        let err = registry.lookup("revision").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTableKind { ref kind, .. } if kind == "revision"));
        assert!(err.to_string().contains("pagelinks"));
    }

    #[test]
    fn test_page_schema_shape() {
        let registry = SchemaRegistry::builtin();
        let page = registry.lookup("page").unwrap();
        assert_eq!(page.field_count(), 14);
        assert_eq!(page.columns(), &[0, 1, 2, 5, 11, 12, 13]);
        assert_eq!(page.grammar().fields()[7], FieldKind::Decimal);
        assert_eq!(page.grammar().fields()[13], FieldKind::NullableQuotedString);
    }

    #[test]
    fn test_pagelinks_variants_are_distinct() {
        let registry = SchemaRegistry::builtin();
        let positional = registry.lookup("pagelinks").unwrap();
        let props = registry.lookup("pagelinks_props").unwrap();
        assert_eq!(positional.table(), props.table());
        assert_eq!(positional.field_count(), 4);
        assert_eq!(props.field_count(), 7);
        assert_ne!(positional.version(), props.version());
    }

    #[test]
    fn test_every_builtin_column_in_range() {
        let registry = SchemaRegistry::builtin();
        for schema in registry.schemas() {
            assert!(schema
                .columns()
                .iter()
                .all(|&c| c < schema.field_count()));
        }
    }

    #[test]
    fn test_with_columns_out_of_range() {
        let registry = SchemaRegistry::builtin();
        let redirect = registry.lookup("redirect").unwrap();
        let err = redirect.with_columns(vec![0, 5]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ColumnOutOfRange {
                kind: "redirect".to_string(),
                index: 5,
                field_count: 5
            }
        );
    }

    #[test]
    fn test_with_columns_reorders() {
        let registry = SchemaRegistry::builtin();
        let redirect = registry.lookup("redirect").unwrap();
        let custom = redirect.with_columns(vec![2, 0]).unwrap();
        assert_eq!(custom.columns(), &[2, 0]);
        assert_eq!(custom.grammar(), redirect.grammar());
    }

    #[test]
    fn test_new_rejects_bad_table_name() {
        let err = TableSchema::new("x", "bad name", vec![FieldKind::Integer], vec![0]).unwrap_err();
        assert_eq!(err, SchemaError::InvalidTableName("bad name".to_string()));
    }

    #[test]
    fn test_new_rejects_empty_grammar() {
        let err = TableSchema::new("x", "x", vec![], vec![0]).unwrap_err();
        assert_eq!(err, SchemaError::EmptyGrammar("x".to_string()));
    }

    #[test]
    fn test_parse_column_list() {
        assert_eq!(parse_column_list("0,2,1").unwrap(), vec![0, 2, 1]);
        assert_eq!(parse_column_list(" 3 , 4 ").unwrap(), vec![3, 4]);
        assert!(parse_column_list("").is_err());
        assert!(parse_column_list("a,b").is_err());
        assert!(parse_column_list("-1").is_err());
    }

    #[test]
    fn test_register_replaces_kind() {
        let mut registry = SchemaRegistry::builtin();
        let count = registry.len();
        let replacement =
            TableSchema::new("category", "category", vec![FieldKind::Integer], vec![0]).unwrap();
        assert!(registry.register(replacement).is_some());
        assert_eq!(registry.len(), count);
        assert_eq!(registry.lookup("category").unwrap().field_count(), 1);
    }
}
