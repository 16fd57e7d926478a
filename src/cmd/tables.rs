use crate::schema::{FieldKind, SchemaRegistry};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct TableJson<'a> {
    kind: &'a str,
    table: &'a str,
    version: u32,
    fields: &'a [FieldKind],
    columns: &'a [usize],
}

pub fn run(schema_config: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let registry = SchemaRegistry::with_config(schema_config.as_deref())?;
    let schemas = registry.schemas();

    if json {
        let tables: Vec<TableJson> = schemas
            .iter()
            .map(|s| TableJson {
                kind: s.kind(),
                table: s.table(),
                version: s.version(),
                fields: s.grammar().fields(),
                columns: s.columns(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    println!("Registered table kinds:\n");
    for schema in schemas {
        println!(
            "  {:<16} `{}` v{} ({} fields) columns {:?}",
            schema.kind(),
            schema.table(),
            schema.version(),
            schema.field_count(),
            schema.columns()
        );
        println!("    {}", schema.grammar());
    }

    Ok(())
}
