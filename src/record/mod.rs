//! Structured car records
//!
//! A [`Record`] holds one value per [`Field`]. Every field starts out as the
//! [`UNKNOWN`] sentinel and is filled at most once, so the first extraction
//! tier that finds a value for a field wins.

mod numeric;

pub use numeric::{clean_numeric, clean_power, is_year};

use std::fmt;

/// Sentinel for a field whose value could not be determined
pub const UNKNOWN: &str = "Unknown";

/// The attributes extracted for every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Brand,
    Model,
    Year,
    Mileage,
    Price,
    Fuel,
    Transmission,
    Power,
}

impl Field {
    /// All fields in column order
    pub const ALL: [Field; 8] = [
        Field::Brand,
        Field::Model,
        Field::Year,
        Field::Mileage,
        Field::Price,
        Field::Fuel,
        Field::Transmission,
        Field::Power,
    ];

    /// Column header used in persisted tables
    pub fn column(&self) -> &'static str {
        match self {
            Self::Brand => "Brand",
            Self::Model => "Model",
            Self::Year => "Year",
            Self::Mileage => "Mileage",
            Self::Price => "Price",
            Self::Fuel => "Fuel",
            Self::Transmission => "Transmission",
            Self::Power => "Power",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }

    /// Fields whose raw values get unit and separator cleanup
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Mileage | Self::Price | Self::Power)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One structured car listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    values: [String; 8],
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Record {
    /// Creates a record with every field set to [`UNKNOWN`]
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| UNKNOWN.to_string()),
        }
    }

    /// Builds a record from values in [`Field::ALL`] order
    ///
    /// Empty values are stored as [`UNKNOWN`].
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut record = Self::new();
        for (field, value) in Field::ALL.into_iter().zip(values) {
            let value = value.into();
            if !value.trim().is_empty() {
                record.values[field.index()] = value.trim().to_string();
            }
        }
        record
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn is_unknown(&self, field: Field) -> bool {
        self.get(field) == UNKNOWN
    }

    /// Sets `field` if it is still unknown
    ///
    /// Numeric fields are cleaned first. Values that are empty after cleanup
    /// leave the field unknown. Returns whether the field was set.
    pub fn fill(&mut self, field: Field, raw: &str) -> bool {
        if !self.is_unknown(field) {
            return false;
        }

        let value = match field {
            Field::Power => clean_power(raw),
            f if f.is_numeric() => clean_numeric(raw),
            _ => collapse_whitespace(raw),
        };

        if value.is_empty() || value == UNKNOWN {
            return false;
        }

        self.values[field.index()] = value;
        true
    }

    /// True iff no field holds the [`UNKNOWN`] sentinel
    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| !self.is_unknown(*f))
    }

    /// Fields still holding the sentinel
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.is_unknown(*f))
            .collect()
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Identity key over all field values
    pub fn fingerprint(&self) -> String {
        self.values.join("\u{1f}")
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Field::ALL
            .iter()
            .map(|field| format!("{}={}", field, self.get(*field)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A record together with the detail page it was extracted from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedListing {
    pub url: String,
    pub record: Record,
}

/// Collapses runs of whitespace (including non-breaking spaces) to one space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
