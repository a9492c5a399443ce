//! Label vocabulary shared by every site
//!
//! Labels are matched case-insensitively by substring, in the order below;
//! the first field with a matching synonym wins.

use crate::record::Field;

const SYNONYMS: [(Field, &[&str]); 7] = [
    (Field::Brand, &["značka", "výrobce", "brand", "make"]),
    (Field::Model, &["model"]),
    (
        Field::Year,
        &["rok výroby", "rok uvedení", "rok", "vyrobeno", "year"],
    ),
    (
        Field::Mileage,
        &["tachometr", "najeto", "najeté", "stav km", "mileage"],
    ),
    (Field::Fuel, &["palivo", "fuel"]),
    (Field::Transmission, &["převodovka", "transmission", "gearbox"]),
    (Field::Power, &["výkon", "power"]),
];

/// Value for an automatic gearbox
pub const AUTOMAT: &str = "Automat";

/// Value for everything else
pub const MANUAL: &str = "Manual";

/// Maps an attribute label to the field it names
pub fn match_label(label: &str) -> Option<Field> {
    let label = label.to_lowercase();
    if label.trim().is_empty() {
        return None;
    }

    SYNONYMS
        .iter()
        .find(|(_, words)| words.iter().any(|w| label.contains(w)))
        .map(|(field, _)| *field)
}

/// "Automat" if any scanned text mentions "automat", else "Manual"
pub fn infer_transmission<'a, I>(texts: I) -> &'static str
where
    I: IntoIterator<Item = &'a str>,
{
    if texts
        .into_iter()
        .any(|t| t.to_lowercase().contains("automat"))
    {
        AUTOMAT
    } else {
        MANUAL
    }
}
