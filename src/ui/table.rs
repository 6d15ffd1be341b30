use crate::tag::{TagCount, Tagging};
use crate::storage::DbStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Tenant", &stats.tenant.to_string());
    builder.add_row("Tags", &stats.tags.to_string());
    builder.add_row("Taggings", &stats.taggings.to_string());
    builder.add_row("Tagged versions", &stats.versions.to_string());
    builder.build()
}

#[derive(Tabled)]
struct TaggingRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Tag")]
    name: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Tagged")]
    tagged_at: String,
    #[tabled(rename = "Path")]
    path: String,
}

pub fn tagging_table(taggings: &[Tagging]) -> String {
    let rows: Vec<TaggingRow> = taggings
        .iter()
        .map(|t| TaggingRow {
            id: t.id.0,
            name: t.name.clone(),
            author: t.author.clone(),
            tagged_at: t.tagged_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            path: t.resource_path.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Tag")]
    name: String,
    #[tabled(rename = "Count")]
    count: u64,
}

pub fn count_table(counts: &[TagCount]) -> String {
    let rows: Vec<CountRow> = counts
        .iter()
        .map(|c| CountRow {
            name: c.name.clone(),
            count: c.count,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
