//! Built-in grammars for the MediaWiki SQL dump tables.

use super::{FieldKind, TableSchema};

use FieldKind::{
    Decimal as Dec, Integer as Int, NullableQuotedString as NStr, QuotedString as Str,
    SignedInteger as SInt,
};

/// (kind, table, version, fields, default columns)
type Entry = (
    &'static str,
    &'static str,
    u32,
    &'static [FieldKind],
    &'static [usize],
);

const BUILTIN: &[Entry] = &[
    // cl_from, cl_to, cl_sortkey, cl_timestamp, cl_sortkey_prefix, cl_collation, cl_type
    (
        "categorylinks",
        "categorylinks",
        1,
        &[Int, Str, Str, Str, Str, Str, Str],
        &[0, 1, 6],
    ),
    // pl_from, pl_namespace, pl_title, pl_from_namespace
    (
        "pagelinks",
        "pagelinks",
        1,
        &[Int, Int, Str, Int],
        &[0, 1, 2, 3],
    ),
    // Older property-style pagelinks rows share the categorylinks shape
    (
        "pagelinks_props",
        "pagelinks",
        2,
        &[Int, Str, Str, Str, Str, Str, Str],
        &[0, 1, 2],
    ),
    // rd_from, rd_namespace, rd_title, rd_interwiki, rd_fragment
    (
        "redirect",
        "redirect",
        1,
        &[Int, SInt, Str, Str, Str],
        &[0, 1, 2],
    ),
    // cat_id, cat_title, cat_pages, cat_subcats, cat_files
    (
        "category",
        "category",
        1,
        &[Int, Str, Int, Int, Int],
        &[0, 1, 2, 3, 4],
    ),
    (
        "page_props",
        "page_props",
        1,
        &[Int, Str, Str, Str, Str, Str, Str],
        &[0, 1],
    ),
    // page_id, page_namespace, page_title, page_restrictions, page_counter,
    // page_is_redirect, page_is_new, page_random, page_touched,
    // page_links_updated, page_latest, page_len, page_content_model, page_lang
    (
        "page",
        "page",
        1,
        &[
            Int, Int, Str, Str, Int, Int, Int, Dec, Str, NStr, Int, Int, NStr, NStr,
        ],
        &[0, 1, 2, 5, 11, 12, 13],
    ),
];

pub(super) fn schemas() -> Vec<TableSchema> {
    BUILTIN
        .iter()
        .filter_map(|&(kind, table, version, fields, columns)| {
            TableSchema::new(kind, table, fields.to_vec(), columns.to_vec())
                .ok()
                .map(|s| s.with_version(version))
        })
        .collect()
}
