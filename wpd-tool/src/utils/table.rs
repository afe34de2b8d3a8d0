//! Table formatting utilities

use prettytable::{Cell, Row, Table};

/// Create a table with bold headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        headers
            .iter()
            .map(|h| Cell::new(h).style_spec("b"))
            .collect(),
    ));
    table
}

/// Add a row to a table, right-aligning the given columns
pub fn add_table_row(table: &mut Table, cells: Vec<String>, right_aligned: &[usize]) {
    let row_cells = cells
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let cell = Cell::new(s);
            if right_aligned.contains(&i) {
                cell.style_spec("r")
            } else {
                cell
            }
        })
        .collect();
    table.add_row(Row::new(row_cells));
}
