//! Database schema definitions

/// SQL to create the tag table.
/// One row per tagging event; names keep their original casing.
pub const CREATE_TAG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tag (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    author_id TEXT NOT NULL,
    tagged_time TEXT NOT NULL,
    tenant_id INTEGER NOT NULL
)
"#;

/// SQL to create the resource_tag table linking a tag row to a version
pub const CREATE_RESOURCE_TAG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS resource_tag (
    tag_id INTEGER NOT NULL,
    version INTEGER NOT NULL,
    tenant_id INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tag_tenant_name ON tag(tenant_id, name)",
    "CREATE INDEX IF NOT EXISTS idx_resource_tag_version ON resource_tag(version, tenant_id)",
    "CREATE INDEX IF NOT EXISTS idx_resource_tag_tag ON resource_tag(tag_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_TAG_TABLE, CREATE_RESOURCE_TAG_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
