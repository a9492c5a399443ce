//! Statistics over persisted tables
//!
//! This module provides functionality for summarising a persisted table
//! and displaying the result.

use crate::clean::coerce_number;
use crate::record::Field;
use crate::store::PersistedTable;
use std::collections::HashMap;

/// Summary of one persisted table
#[derive(Debug, Clone, PartialEq)]
pub struct TableStatistics {
    /// Total number of rows
    pub total_rows: usize,

    /// Rows with every field determined
    pub complete_rows: usize,

    /// Row count per brand
    pub rows_by_brand: HashMap<String, usize>,

    /// Row count per raw fuel value
    pub rows_by_fuel: HashMap<String, usize>,

    /// Median of the prices that parse as numbers
    pub median_price: Option<u64>,
}

impl TableStatistics {
    pub fn from_table(table: &PersistedTable) -> Self {
        let mut rows_by_brand = HashMap::new();
        let mut rows_by_fuel = HashMap::new();
        let mut complete_rows = 0;
        let mut prices = Vec::new();

        for record in table.records() {
            if record.is_complete() {
                complete_rows += 1;
            }
            *rows_by_brand
                .entry(record.get(Field::Brand).to_string())
                .or_insert(0) += 1;
            *rows_by_fuel
                .entry(record.get(Field::Fuel).to_string())
                .or_insert(0) += 1;
            if let Some(price) = coerce_number(record.get(Field::Price)) {
                prices.push(price);
            }
        }

        Self {
            total_rows: table.len(),
            complete_rows,
            rows_by_brand,
            rows_by_fuel,
            median_price: median(&mut prices),
        }
    }
}

/// Median of `values`; the lower middle element for even lengths
fn median(values: &mut [u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[(values.len() - 1) / 2])
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `name` - Label of the table, usually the source name
/// * `stats` - The statistics to display
pub fn print_statistics(name: &str, stats: &TableStatistics) {
    println!("=== {} ===\n", name);

    println!("Overview:");
    println!("  Rows: {}", stats.total_rows);
    let complete_rate = if stats.total_rows > 0 {
        (stats.complete_rows as f64 / stats.total_rows as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "  Complete rows: {} ({:.1}%)",
        stats.complete_rows, complete_rate
    );
    match stats.median_price {
        Some(price) => println!("  Median price: {}", price),
        None => println!("  Median price: n/a"),
    }
    println!();

    print_counts("Rows by Brand", &stats.rows_by_brand, 10);
    print_counts("Rows by Fuel", &stats.rows_by_fuel, usize::MAX);
}

fn print_counts(title: &str, counts: &HashMap<String, usize>, limit: usize) {
    if counts.is_empty() {
        return;
    }

    println!("{}:", title);
    // Sort by count (descending), then name
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (name, count) in sorted.iter().take(limit) {
        println!("  {}: {}", name, count);
    }
    if sorted.len() > limit {
        println!("  ... and {} more", sorted.len() - limit);
    }
    println!();
}
