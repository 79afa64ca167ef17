//! In-memory table preparation ahead of pair sampling.
//!
//! A [`Table`] is cleaned ([`Table::drop_columns_with_high_missing`]), remapped and filtered
//! with a [`ColumnMapping`], optionally geocoded ([`normalize_addresses`]) and finally turned
//! into per-record feature vectors with [`Table::feature_matrix`]. Reading and writing files
//! of any tabular format is left to the caller.

pub mod describe;
pub mod error;
pub mod mapping;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod normalize;
pub mod table;


pub use describe::{ColumnSummary, Spread, TableSummary, describe};
pub use error::PrepareError;
pub use mapping::{ColumnMapping, MappingEntry};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGeocoder;
pub use normalize::{
    Coordinates, GeocodeStats, Geocoder, LATITUDE_COLUMN, LONGITUDE_COLUMN, clean_text,
    normalize_addresses, preprocess_text_columns,
};
pub use table::{Cell, Column, Table};
