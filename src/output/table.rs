//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, Width, object::Columns, object::Rows},
};

/// Widest a free-text column may get before it wraps
const MAX_COLUMN_WIDTH: usize = 60;

/// Format rows as a rounded table; the last column wraps at a fixed width
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Modify::new(Columns::last()).with(Width::wrap(MAX_COLUMN_WIDTH)));

    table.to_string()
}
