use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Row count cell, yellow when a target produced nothing.
pub fn color_coded_rows_cell(rows: usize) -> Cell {
    if rows == 0 {
        Cell::new(rows).fg(TableColor::Yellow)
    } else {
        Cell::new(rows).fg(TableColor::Green)
    }
}

/// Count cell that is dimmed when zero.
pub fn count_cell(count: usize) -> Cell {
    if count == 0 {
        Cell::new(count).fg(TableColor::DarkGrey)
    } else {
        Cell::new(count)
    }
}
