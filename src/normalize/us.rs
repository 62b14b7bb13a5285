use serde::Serialize;
use tracing::{debug, instrument};

use super::{HIERARCHY_SEPARATOR, Normalized, parse_rows};
use crate::error::Result;
use crate::model::{ItemTotals, RawRecord, SourceKind};

/// What to do with a `Parent:Child` row whose parent has no row of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Leave the row out of the canonical set.
    #[default]
    Drop,
    /// Keep the row under its full colon-qualified name.
    Retain,
}

/// Collapses a US export, rolling child rows up into their parents.
///
/// Top-level rows are accumulated first, in row order, so every parent keeps
/// the position of its first own row. Child rows are then absorbed into the
/// parent named before the first separator. Children without a parent row
/// follow `orphans`; retained orphans are appended after the parents.
#[instrument(level = "debug", skip_all, fields(rows = rows.len(), ?orphans))]
pub fn normalize(rows: &[RawRecord], orphans: OrphanPolicy) -> Result<Normalized> {
    let mut warnings = Vec::new();
    let parsed = parse_rows(SourceKind::Us, rows, &mut warnings)?;

    let (children, top_level): (Vec<_>, Vec<_>) = parsed
        .iter()
        .partition(|row| row.item.contains(HIERARCHY_SEPARATOR));

    let mut totals = ItemTotals::new();
    for row in &top_level {
        totals.add(row.item, row.quantity);
    }

    let mut orphaned: Vec<_> = Vec::new();
    for row in &children {
        let parent = row
            .item
            .split_once(HIERARCHY_SEPARATOR)
            .map(|(parent, _)| parent)
            .unwrap_or(row.item);
        if totals.contains(parent) {
            totals.add(parent, row.quantity);
        } else {
            orphaned.push(*row);
        }
    }

    for row in orphaned {
        match orphans {
            OrphanPolicy::Drop => debug!(item = row.item, "dropping child row without parent"),
            OrphanPolicy::Retain => totals.add(row.item, row.quantity),
        }
    }

    let records = totals.into_set();
    debug!(items = records.len(), "US export normalized");
    Ok(Normalized { records, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::model::Quantity;

    fn items(normalized: &Normalized) -> Vec<&str> {
        normalized.records.iter().map(|r| r.item.as_str()).collect()
    }

    #[test]
    fn children_roll_up_into_parent() {
        let rows = decode("item,quantity\nFruit,2\nFruit:Apple,3\n").expect("decoded");
        let normalized = normalize(&rows, OrphanPolicy::Drop).expect("normalized");

        assert_eq!(items(&normalized), vec!["Fruit"]);
        assert_eq!(normalized.records.records()[0].quantity.to_string(), "5.000");
    }

    #[test]
    fn child_before_parent_still_rolls_up() {
        let rows = decode("item,quantity\nFruit:Pear,1.5\nVeg,1\nFruit,2\nFruit:Apple:Red,0.25\n").expect("decoded");
        let normalized = normalize(&rows, OrphanPolicy::Drop).expect("normalized");

        assert_eq!(items(&normalized), vec!["Veg", "Fruit"]);
        assert_eq!(normalized.records.quantity_of("Fruit"), Some(Quantity::new(3.75)));
    }

    #[test]
    fn orphan_rows_are_dropped_by_default() {
        let rows = decode("item,quantity\nVeg:Carrot,4\n").expect("decoded");
        let normalized = normalize(&rows, OrphanPolicy::Drop).expect("normalized");

        assert!(normalized.records.is_empty());
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn orphan_rows_can_be_retained() {
        let rows = decode("item,quantity\nVeg:Carrot,4\nFruit,1\nVeg:Carrot,1\n").expect("decoded");
        let normalized = normalize(&rows, OrphanPolicy::Retain).expect("normalized");

        assert_eq!(items(&normalized), vec!["Fruit", "Veg:Carrot"]);
        assert_eq!(normalized.records.quantity_of("Veg:Carrot"), Some(Quantity::new(5.0)));
    }

    #[test]
    fn repeated_parent_rows_aggregate_into_one_record() {
        let rows = decode("item,quantity\nFruit,2\nFruit,1\nFruit:Apple,3\n").expect("decoded");
        let normalized = normalize(&rows, OrphanPolicy::Drop).expect("normalized");

        assert_eq!(items(&normalized), vec!["Fruit"]);
        assert_eq!(normalized.records.quantity_of("Fruit"), Some(Quantity::new(6.0)));
    }

    #[test]
    fn non_numeric_child_poisons_parent() {
        let rows = decode("item,quantity\nFruit,2\nFruit:Apple,abc\n").expect("decoded");
        let normalized = normalize(&rows, OrphanPolicy::Drop).expect("normalized");

        assert!(normalized.records.quantity_of("Fruit").is_some_and(Quantity::is_nan));
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.warnings[0].row, 2);
    }
}
