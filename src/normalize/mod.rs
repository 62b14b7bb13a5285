//! Per-source rules that collapse raw export rows into canonical item sets.

pub mod cn;
pub mod us;

use serde::Serialize;
use tracing::warn;

use crate::error::{MergeError, Result};
use crate::model::{CanonicalSet, Quantity, RawRecord, SourceKind, ValidationWarning, WarningKind};

/// Column holding the item name in both export shapes.
pub const ITEM_COLUMN: &str = "item";
/// Column holding the quantity in both export shapes.
pub const QUANTITY_COLUMN: &str = "quantity";
/// Separates a parent item from its child in hierarchical names.
pub const HIERARCHY_SEPARATOR: char = ':';

/// Canonical records produced from one source, plus the row warnings raised
/// while producing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Normalized {
    pub records: CanonicalSet,
    pub warnings: Vec<ValidationWarning>,
}

/// A data row with its quantity already parsed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedRow<'a> {
    pub item: &'a str,
    pub quantity: Quantity,
}

/// Validates the shared `item`/`quantity` columns and parses every row.
///
/// Rows with an unparseable quantity are kept as NaN and reported; rows with
/// a blank item are reported and dropped.
pub(crate) fn parse_rows<'a>(
    source: SourceKind,
    rows: &'a [RawRecord],
    warnings: &mut Vec<ValidationWarning>,
) -> Result<Vec<ParsedRow<'a>>> {
    let mut parsed = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let position = index + 1;
        let item = required_field(source, row, ITEM_COLUMN)?;
        let raw_quantity = required_field(source, row, QUANTITY_COLUMN)?;

        let quantity = match Quantity::parse(raw_quantity) {
            Some(quantity) => quantity,
            None => {
                report(
                    warnings,
                    ValidationWarning {
                        source,
                        row: position,
                        kind: WarningKind::NonNumericQuantity {
                            value: raw_quantity.to_string(),
                        },
                    },
                );
                Quantity::NAN
            }
        };

        if item.is_empty() {
            report(
                warnings,
                ValidationWarning {
                    source,
                    row: position,
                    kind: WarningKind::BlankItem,
                },
            );
            continue;
        }

        parsed.push(ParsedRow { item, quantity });
    }

    Ok(parsed)
}

/// Checks a decoded header for the `item` and `quantity` columns, so a
/// malformed export is rejected even when it has no data rows.
pub fn require_columns<S: AsRef<str>>(source: SourceKind, headers: &[S]) -> Result<()> {
    for column in [ITEM_COLUMN, QUANTITY_COLUMN] {
        if !headers.iter().any(|header| header.as_ref() == column) {
            return Err(MergeError::MissingColumn {
                export: source,
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn required_field<'a>(source: SourceKind, row: &'a RawRecord, column: &str) -> Result<&'a str> {
    row.get(column).ok_or_else(|| MergeError::MissingColumn {
        export: source,
        column: column.to_string(),
    })
}

fn report(warnings: &mut Vec<ValidationWarning>, warning: ValidationWarning) {
    warn!(source = %warning.source, row = warning.row, "{warning}");
    warnings.push(warning);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(item: &str, quantity: &str) -> RawRecord {
        [("item", item), ("quantity", quantity)].into_iter().collect()
    }

    #[test]
    fn non_numeric_quantity_becomes_nan_with_warning() {
        let rows = vec![row("bolt", "4"), row("nut", "abc")];
        let mut warnings = Vec::new();
        let parsed = parse_rows(SourceKind::Cn, &rows, &mut warnings).expect("parsed");

        assert_eq!(parsed.len(), 2);
        assert!(parsed[1].quantity.is_nan());
        assert_eq!(
            warnings,
            vec![ValidationWarning {
                source: SourceKind::Cn,
                row: 2,
                kind: WarningKind::NonNumericQuantity {
                    value: "abc".into()
                },
            }]
        );
    }

    #[test]
    fn blank_items_are_skipped() {
        let rows = vec![row("", "4"), row("nut", "1")];
        let mut warnings = Vec::new();
        let parsed = parse_rows(SourceKind::Us, &rows, &mut warnings).expect("parsed");

        assert_eq!(parsed, vec![ParsedRow { item: "nut", quantity: Quantity::new(1.0) }]);
        assert_eq!(warnings[0].kind, WarningKind::BlankItem);
        assert_eq!(warnings[0].row, 1);
    }

    #[test]
    fn missing_column_is_fatal() {
        let rows: Vec<RawRecord> = vec![[("name", "bolt"), ("quantity", "1")].into_iter().collect()];
        let mut warnings = Vec::new();
        let error = parse_rows(SourceKind::Cn, &rows, &mut warnings).unwrap_err();

        assert!(matches!(
            error,
            MergeError::MissingColumn { export: SourceKind::Cn, ref column } if column == "item"
        ));
    }

    #[test]
    fn header_without_quantity_is_rejected() {
        assert!(require_columns(SourceKind::Us, &["item", "quantity", "note"]).is_ok());

        let error = require_columns(SourceKind::Us, &["item", "qty"]).unwrap_err();
        assert!(matches!(
            error,
            MergeError::MissingColumn { export: SourceKind::Us, ref column } if column == "quantity"
        ));
    }
}
