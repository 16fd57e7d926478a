//! Streaming extraction of rows from bulk `INSERT` statements in SQL dumps.
//!
//! The pipeline reads a dump one line at a time, keeps only
//! ``INSERT INTO `table` VALUES`` lines for the selected table, splits each
//! statement into tuples and matches every tuple against the table's field
//! grammar. Matched tuples become tab-separated records; tuples that do not
//! match are reported and skipped.
//!
//! ```
//! use dump_extract::extractor::{ExtractOptions, RowExtractor};
//! use dump_extract::schema::SchemaRegistry;
//! use dump_extract::writer::TsvWriter;
//!
//! let registry = SchemaRegistry::builtin();
//! let schema = registry.lookup("redirect").unwrap().clone();
//! let mut sink = TsvWriter::new(Vec::new());
//!
//! let input = "INSERT INTO `redirect` VALUES (10,0,'Target_Page','','');\n";
//! RowExtractor::new(schema, ExtractOptions::default())
//!     .run(input.as_bytes(), 4096, &mut sink)
//!     .unwrap();
//!
//! assert_eq!(sink.into_inner().unwrap(), b"10\t0\t'Target_Page'\n");
//! ```

pub mod diagnostics;
pub mod extractor;
pub mod input;
pub mod logging;
pub mod parser;
pub mod progress;
pub mod schema;
pub mod writer;
