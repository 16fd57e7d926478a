//! YAML grammar files.
//!
//! A grammar file adds table kinds to the built-in registry or replaces
//! existing ones:
//!
//! ```yaml
//! tables:
//!   - kind: pagelinks
//!     table: pagelinks
//!     version: 3
//!     fields: [integer, integer, quoted-string, integer, integer]
//!     columns: [0, 2, 4]
//! ```

use super::{FieldKind, SchemaRegistry, TableSchema};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_version() -> u32 {
    1
}

/// One table kind declared in a grammar file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableGrammarConfig {
    pub kind: String,
    /// SQL table name; defaults to the kind
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub fields: Vec<FieldKind>,
    /// Output columns; defaults to every field in order
    #[serde(default)]
    pub columns: Option<Vec<usize>>,
}

impl TableGrammarConfig {
    pub fn into_schema(self) -> anyhow::Result<TableSchema> {
        let table = self.table.unwrap_or_else(|| self.kind.clone());
        let columns = self
            .columns
            .unwrap_or_else(|| (0..self.fields.len()).collect());
        let schema = TableSchema::new(self.kind, table, self.fields, columns)?;
        Ok(schema.with_version(self.version))
    }
}

/// Complete grammar file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarFile {
    pub tables: Vec<TableGrammarConfig>,
}

impl GrammarFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("invalid grammar file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let file: GrammarFile = serde_yaml_ng::from_str(content)?;
        Ok(file)
    }

    /// Register every declared table on top of `registry`
    pub fn apply(self, registry: &mut SchemaRegistry) -> anyhow::Result<()> {
        for entry in self.tables {
            let kind = entry.kind.clone();
            let schema = entry
                .into_schema()
                .with_context(|| format!("table kind '{}'", kind))?;
            if registry.register(schema).is_some() {
                tracing::debug!(kind = %kind, "grammar file overrides built-in kind");
            }
        }
        Ok(())
    }
}

impl SchemaRegistry {
    /// Built-in registry extended by an optional grammar file
    pub fn with_config(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut registry = Self::builtin();
        if let Some(path) = path {
            GrammarFile::load(path)?.apply(&mut registry)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grammar_file() {
        let yaml = r#"
tables:
  - kind: langlinks
    fields: [integer, quoted-string, quoted-string]
    columns: [0, 2]
  - kind: redirect
    version: 2
    fields: [integer, signed-integer, quoted-string]
"#;
        let file = GrammarFile::parse(yaml).unwrap();
        assert_eq!(file.tables.len(), 2);
        assert_eq!(file.tables[0].fields[1], FieldKind::QuotedString);

        let mut registry = SchemaRegistry::builtin();
        file.apply(&mut registry).unwrap();

        let langlinks = registry.lookup("langlinks").unwrap();
        assert_eq!(langlinks.table(), "langlinks");
        assert_eq!(langlinks.columns(), &[0, 2]);

        let redirect = registry.lookup("redirect").unwrap();
        assert_eq!(redirect.version(), 2);
        assert_eq!(redirect.field_count(), 3);
        assert_eq!(redirect.columns(), &[0, 1, 2]);
    }

    #[test]
    fn test_unknown_field_kind_rejected() {
        let yaml = "tables:\n  - kind: t\n    fields: [integer, blob]\n";
        assert!(GrammarFile::parse(yaml).is_err());
    }

    #[test]
    fn test_out_of_range_column_rejected() {
        let yaml = "tables:\n  - kind: t\n    fields: [integer]\n    columns: [1]\n";
        let file = GrammarFile::parse(yaml).unwrap();
        let mut registry = SchemaRegistry::new();
        let err = file.apply(&mut registry).unwrap_err();
        assert!(format!("{:#}", err).contains("out of range"));
    }
}
