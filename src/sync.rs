use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, instrument};

use crate::codec;
use crate::error::Result;
use crate::io::persist::{Persist, format_filename};
use crate::io::source::SourceProvider;
use crate::merge::merge;
use crate::model::{CanonicalSet, SourceKind, ValidationWarning};
use crate::normalize::{Normalized, cn, require_columns, us};

/// Knobs that change how the exports are normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOptions {
    pub orphans: us::OrphanPolicy,
}

/// Result of merging two exports in memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// Merged dataset, sorted by item.
    pub records: CanonicalSet,
    /// Encoded tabular text of `records`.
    pub text: String,
    /// Row warnings from both exports, CN first.
    pub warnings: Vec<ValidationWarning>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub filename: String,
    pub outcome: MergeOutcome,
}

/// Normalizes both exports, merges them and encodes the result.
#[instrument(
    level = "info",
    skip_all,
    fields(cn_bytes = cn_text.len(), us_bytes = us_text.len(), orphans = ?options.orphans)
)]
pub fn merge_exports(cn_text: &str, us_text: &str, options: MergeOptions) -> Result<MergeOutcome> {
    let cn_table = codec::decode_table(cn_text)?;
    let us_table = codec::decode_table(us_text)?;
    info!(
        cn_rows = cn_table.records.len(),
        us_rows = us_table.records.len(),
        "decoded exports"
    );

    require_columns(SourceKind::Cn, &cn_table.headers)?;
    require_columns(SourceKind::Us, &us_table.headers)?;

    let cn = cn::normalize(&cn_table.records)?;
    let us = us::normalize(&us_table.records, options.orphans)?;
    merge_normalized(cn, us)
}

fn merge_normalized(cn: Normalized, us: Normalized) -> Result<MergeOutcome> {
    let records = merge(&cn.records, &us.records);
    let text = codec::encode(&records.to_raw_records())?;
    info!(items = records.len(), "merged dataset encoded");

    let mut warnings = cn.warnings;
    warnings.extend(us.warnings);

    Ok(MergeOutcome {
        records,
        text,
        warnings,
    })
}

/// Reads both exports, merges them and hands the text to `sink` under a name
/// derived from `timestamp`.
///
/// Nothing reaches `sink` when any fatal error occurs.
#[instrument(level = "info", skip_all, fields(%timestamp))]
pub fn run<P, S>(
    sources: &P,
    sink: &mut S,
    timestamp: NaiveDateTime,
    options: MergeOptions,
) -> Result<RunReport>
where
    P: SourceProvider + ?Sized,
    S: Persist + ?Sized,
{
    let cn_text = sources.read_text(SourceKind::Cn)?;
    let us_text = sources.read_text(SourceKind::Us)?;
    let outcome = merge_exports(&cn_text, &us_text, options)?;

    let filename = format_filename(timestamp);
    sink.persist(&outcome.text, &filename)?;
    info!(%filename, warnings = outcome.warnings.len(), "merge run complete");

    Ok(RunReport { filename, outcome })
}
