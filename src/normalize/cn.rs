use tracing::{debug, instrument};

use super::{Normalized, parse_rows};
use crate::error::Result;
use crate::model::{ItemTotals, RawRecord, SourceKind};

/// Collapses a CN export into one record per item.
///
/// Repeated items are summed in row order and the totals are rounded once
/// every row has been consumed. Records come out in first-seen order.
#[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
pub fn normalize(rows: &[RawRecord]) -> Result<Normalized> {
    let mut warnings = Vec::new();
    let parsed = parse_rows(SourceKind::Cn, rows, &mut warnings)?;

    let mut totals = ItemTotals::new();
    for row in &parsed {
        totals.add(row.item, row.quantity);
    }

    let records = totals.into_set();
    debug!(items = records.len(), "CN export normalized");
    Ok(Normalized { records, warnings })
}
