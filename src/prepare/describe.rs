use std::collections::HashSet;

use serde::Serialize;

use super::table::{Cell, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub missing: usize,
    /// Missing cells as a percentage of rows.
    pub missing_pct: f64,
    /// Distinct non-missing values.
    pub unique: usize,
}

/// Min/mean/max of a per-row statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Spread {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    /// Missing cells per row as a percentage of columns.
    pub row_missing_pct: Spread,
}

#[derive(PartialEq, Eq, Hash)]
enum Distinct<'a> {
    Number(u64),
    Text(&'a str),
}

/// Missing-value and cardinality statistics for `table`.
pub fn describe(table: &Table) -> TableSummary {
    let rows = table.rows();
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let missing = column.missing();
            let unique: HashSet<Distinct<'_>> = column
                .cells
                .iter()
                .filter_map(|cell| match cell {
                    Cell::Missing => None,
                    // -0.0 and 0.0 are one value
                    Cell::Number(n) => Some(Distinct::Number((n + 0.0).to_bits())),
                    Cell::Text(s) => Some(Distinct::Text(s)),
                })
                .collect();
            ColumnSummary {
                name: column.name.clone(),
                missing,
                missing_pct: percentage(missing, rows),
                unique: unique.len(),
            }
        })
        .collect();

    TableSummary {
        rows,
        columns,
        row_missing_pct: row_spread(table),
    }
}

fn row_spread(table: &Table) -> Spread {
    let rows = table.rows();
    if rows == 0 || table.width() == 0 {
        return Spread::default();
    }

    let per_row: Vec<f64> = (0..rows)
        .map(|row| {
            let missing = table
                .columns()
                .iter()
                .filter(|c| c.cells[row].is_missing())
                .count();
            percentage(missing, table.width())
        })
        .collect();

    Spread {
        min: per_row.iter().copied().fold(f64::INFINITY, f64::min),
        mean: per_row.iter().sum::<f64>() / rows as f64,
        max: per_row.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
