use tracing::{info, warn};

use super::error::PrepareError;
use super::table::{Cell, Column, Table};

pub const LATITUDE_COLUMN: &str = "geocode_latitude";
pub const LONGITUDE_COLUMN: &str = "geocode_longitude";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolves a free-text address to coordinates.
///
/// `Ok(None)` is a miss. Errors (timeouts, transport failures) are also treated as misses by
/// [`normalize_addresses`].
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, PrepareError>;
}

/// Outcome counts of [`normalize_addresses`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeStats {
    pub resolved: usize,
    pub missed: usize,
    pub failed: usize,
}

/// Lowercases and strips everything but `[a-z0-9]` and whitespace.
pub fn clean_text(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect()
}

/// Cleans every text column in place; missing cells of those columns become `""`.
///
/// Returns the number of columns touched.
pub fn preprocess_text_columns(table: &mut Table) -> usize {
    let mut touched = 0;
    for column in table.columns_mut().iter_mut().filter(|c| c.is_text()) {
        for cell in &mut column.cells {
            match cell {
                Cell::Text(s) => *s = clean_text(s),
                Cell::Missing => *cell = Cell::Text(String::new()),
                Cell::Number(_) => {}
            }
        }
        touched += 1;
    }
    touched
}

/// Cleans text columns, then geocodes `column` into [`LATITUDE_COLUMN`] and
/// [`LONGITUDE_COLUMN`]. Unresolved rows get [`Cell::Missing`].
pub fn normalize_addresses(
    table: &mut Table,
    column: &str,
    geocoder: &dyn Geocoder,
) -> Result<GeocodeStats, PrepareError> {
    if table.column(column).is_none() {
        return Err(PrepareError::MissingColumn {
            name: column.to_string(),
        });
    }
    preprocess_text_columns(table);

    let addresses = table
        .column(column)
        .map(|c| c.cells.clone())
        .unwrap_or_default();

    let mut stats = GeocodeStats::default();
    let mut latitudes = Vec::with_capacity(addresses.len());
    let mut longitudes = Vec::with_capacity(addresses.len());

    for (row, cell) in addresses.iter().enumerate() {
        let address = match cell {
            Cell::Text(s) if !s.trim().is_empty() => s.clone(),
            Cell::Number(n) => n.to_string(),
            _ => {
                stats.missed += 1;
                latitudes.push(Cell::Missing);
                longitudes.push(Cell::Missing);
                continue;
            }
        };

        let coords = match geocoder.geocode(&address) {
            Ok(Some(coords)) => {
                stats.resolved += 1;
                Some(coords)
            }
            Ok(None) => {
                stats.missed += 1;
                None
            }
            Err(err) => {
                warn!(row, error = %err, "Geocoding failed");
                stats.failed += 1;
                None
            }
        };
        latitudes.push(coords.map_or(Cell::Missing, |c| Cell::Number(c.latitude)));
        longitudes.push(coords.map_or(Cell::Missing, |c| Cell::Number(c.longitude)));
    }

    table.remove_column(LATITUDE_COLUMN);
    table.remove_column(LONGITUDE_COLUMN);
    table.push_column(Column {
        name: LATITUDE_COLUMN.to_string(),
        cells: latitudes,
    })?;
    table.push_column(Column {
        name: LONGITUDE_COLUMN.to_string(),
        cells: longitudes,
    })?;

    info!(
        column,
        resolved = stats.resolved,
        missed = stats.missed,
        failed = stats.failed,
        "Normalized addresses"
    );
    Ok(stats)
}
