use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use crate::error::WorkbookError;

/// Reads the first worksheet of an XLSX file into a grid of cell texts.
///
/// Empty cells become `""`; whole-number floats lose their `.0` so serials
/// stored as numbers read back the way they were typed.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<String>>, WorkbookError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(WorkbookError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    // calamine trims leading empty rows/columns; keep the grid anchored at A1.
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
    grid.extend(range.rows().map(|row| {
        std::iter::repeat(String::new())
            .take(first_col as usize)
            .chain(row.iter().map(cell_text))
            .collect()
    }));

    Ok(grid)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}
