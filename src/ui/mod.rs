pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, muted, section, status, success, summary_row, warn};
pub use table::{count_table, stats_table, tagging_table, TableBuilder};
pub use theme::{theme, Theme};
