use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Serialize, Serializer};

/// Number of decimal places every canonical quantity is rounded to.
pub const QUANTITY_PRECISION: i32 = 3;

/// From this magnitude on an `f64` carries no digits past the third decimal
/// place.
const EXACT_THRESHOLD: f64 = 1e15;

/// Magnitude from which quantities are printed in exponent form.
const EXPONENT_THRESHOLD: f64 = 1e21;

/// Identifies which of the two fixed export shapes a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    /// Flat export, one row per item occurrence.
    Cn,
    /// Hierarchical export where `Parent:Child` rows roll up into `Parent`.
    Us,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Cn => write!(f, "CN"),
            SourceKind::Us => write!(f, "US"),
        }
    }
}

/// One decoded data row: field name → value, in header order.
///
/// Inserting a name that already exists replaces its value but keeps the
/// original position, matching how a repeated header behaves in an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Returns the value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = RawRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// A parsed item quantity.
///
/// Not-a-number is a legitimate value: a row whose quantity failed to parse
/// carries NaN forward and poisons every total it takes part in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quantity(f64);

impl Quantity {
    pub const NAN: Quantity = Quantity(f64::NAN);

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Parses a decimal string. Blank, malformed and non-finite inputs are
    /// rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Self)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }

    /// Rounds half away from zero to [`QUANTITY_PRECISION`] decimal places.
    ///
    /// Magnitudes of 1e15 and above are already exact at that precision and
    /// are returned as they are.
    pub fn rounded(self) -> Self {
        if !self.0.is_finite() || self.0.abs() >= EXACT_THRESHOLD {
            return self;
        }
        let scale = 10f64.powi(QUANTITY_PRECISION);
        Self((self.0 * scale).round() / scale)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 || (self.0.is_nan() && other.0.is_nan())
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_nan() {
            write!(f, "NaN")
        } else if self.0.is_infinite() {
            let sign = if self.0 < 0.0 { "-" } else { "" };
            write!(f, "{sign}Infinity")
        } else if self.0.abs() >= EXPONENT_THRESHOLD {
            let exponent_form = format!("{:e}", self.0);
            match exponent_form.split_once('e') {
                Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                    write!(f, "{mantissa}e+{exponent}")
                }
                _ => write!(f, "{exponent_form}"),
            }
        } else {
            write!(f, "{:.*}", QUANTITY_PRECISION as usize, self.0)
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Normalized `{item, quantity}` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub item: String,
    pub quantity: Quantity,
}

impl CanonicalRecord {
    pub fn new(item: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }

    /// Converts the record into its tabular form with `item` and `quantity`
    /// columns.
    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert("item", self.item.clone());
        raw.insert("quantity", self.quantity.to_string());
        raw
    }
}

/// Canonical records with unique item names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalSet {
    records: Vec<CanonicalRecord>,
}

impl CanonicalSet {
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up the quantity recorded for `item`.
    pub fn quantity_of(&self, item: &str) -> Option<Quantity> {
        self.records
            .iter()
            .find(|record| record.item == item)
            .map(|record| record.quantity)
    }

    /// Tabular form of every record, ready for [`crate::codec::encode`].
    pub fn to_raw_records(&self) -> Vec<RawRecord> {
        self.records.iter().map(CanonicalRecord::to_raw).collect()
    }

    /// Reorders the records with `compare`. Uniqueness is unaffected.
    pub(crate) fn sorted_by<F>(mut self, compare: F) -> Self
    where
        F: FnMut(&CanonicalRecord, &CanonicalRecord) -> std::cmp::Ordering,
    {
        self.records.sort_by(compare);
        self
    }
}

impl<'a> IntoIterator for &'a CanonicalSet {
    type Item = &'a CanonicalRecord;
    type IntoIter = std::slice::Iter<'a, CanonicalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Running per-item totals that remember first-seen order.
#[derive(Debug, Default)]
pub struct ItemTotals {
    entries: Vec<(String, Quantity)>,
    index: HashMap<String, usize>,
}

impl ItemTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` to the running total for `item`, creating the entry
    /// on first sight.
    pub fn add(&mut self, item: &str, quantity: Quantity) {
        match self.index.get(item) {
            Some(&position) => self.entries[position].1 += quantity,
            None => {
                self.index.insert(item.to_string(), self.entries.len());
                self.entries.push((item.to_string(), quantity));
            }
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.index.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rounds every total and freezes the entries into a canonical set.
    pub fn into_set(self) -> CanonicalSet {
        let records = self
            .entries
            .into_iter()
            .map(|(item, total)| CanonicalRecord::new(item, total.rounded()))
            .collect();
        CanonicalSet { records }
    }
}

/// What was wrong with a row that was still processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// The quantity field did not parse; the row counts as NaN.
    NonNumericQuantity { value: String },
    /// The item field was blank; the row was skipped.
    BlankItem,
}

/// Non-fatal, per-row validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub source: SourceKind,
    /// 1-based index over data rows (the header is not counted).
    pub row: usize,
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::NonNumericQuantity { value } => write!(
                f,
                "{} row {}: quantity '{value}' is not a number",
                self.source, self.row
            ),
            WarningKind::BlankItem => {
                write!(f, "{} row {}: item name is blank, row skipped", self.source, self.row)
            }
        }
    }
}
