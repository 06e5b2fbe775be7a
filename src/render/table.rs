//! The metadata table shown next to the image.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::metadata::MetadataRecord;

/// Instrument keys shown in the table, in display order.
pub const DISPLAY_VARIABLES: &[&str] = &[
    "AP_WD",
    "AP_BEAM_TIME",
    "AP_IMAGE_PIXEL_SIZE",
    "AP_HOLDER_HEIGHT",
    "AP_BEAM_CURRENT",
    "AP_HOLDER_DIAMETER",
];

/// Placeholder for a missing or unparseable cell.
pub const NOT_AVAILABLE: &str = "N/A";

// Unlike the normalizer this accepts a sign and both micro signs
static DISPLAY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([-+]?\d*\.\d+|\d+)\s*([a-zA-Zµμ]+)").expect("display pattern should compile")
});

/// Split a value into its number and unit for display.
pub fn split_quantity(text: &str) -> Option<(&str, &str)> {
    let captures = DISPLAY_PATTERN.captures(text)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub variable: String,
    pub value: String,
    pub unit: String,
}

/// Rows for every display variable, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTable {
    rows: Vec<TableRow>,
}

impl MetadataTable {
    /// Build the table from a cleaned record.
    ///
    /// Missing keys, non-text values and text without a quantity produce
    /// `N/A` for both value and unit.
    pub fn from_record(record: &MetadataRecord) -> Self {
        let rows = DISPLAY_VARIABLES
            .iter()
            .map(|&variable| {
                let (value, unit) = record
                    .get(variable)
                    .and_then(|v| v.as_text())
                    .and_then(split_quantity)
                    .unwrap_or((NOT_AVAILABLE, NOT_AVAILABLE));
                TableRow {
                    variable: variable.to_string(),
                    value: value.to_string(),
                    unit: unit.to_string(),
                }
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }
}

impl fmt::Display for MetadataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = TableRow {
            variable: "Variable".to_string(),
            value: "Value".to_string(),
            unit: "Unit".to_string(),
        };
        let all = || std::iter::once(&header).chain(self.rows.iter());

        let variable_width = all().map(|r| r.variable.chars().count()).max().unwrap_or(0);
        let value_width = all().map(|r| r.value.chars().count()).max().unwrap_or(0);

        for row in all() {
            writeln!(
                f,
                "{:<vw$}  {:<uw$}  {}",
                row.variable,
                row.value,
                row.unit,
                vw = variable_width,
                uw = value_width
            )?;
        }
        Ok(())
    }
}
