use anyhow::Result;
use arrow::record_batch::RecordBatch;
use tracing::info;

pub mod clean;
pub mod columns;
pub mod derive;

/// Transform stage: raw source batch in, cleaned MarketRecord batch out.
///
/// Order matches the contract: strip commas from `city`, project onto the
/// 24 selected columns, drop rows with any missing value, then append the
/// derived period year/month columns. Whole-batch semantics: any failure
/// aborts the run with no partial output.
#[tracing::instrument(level = "info", skip(raw))]
pub fn transform(raw: &RecordBatch) -> Result<RecordBatch> {
    info!(rows = raw.num_rows(), "transforming data");
    let stripped = clean::strip_city_commas(raw)?;
    let selected = columns::project_selected(&stripped)?;
    let dense = clean::drop_null_rows(&selected)?;
    let out = derive::append_period_fields(&dense)?;
    info!(
        rows = out.num_rows(),
        columns = out.num_columns(),
        "transformation complete"
    );
    Ok(out)
}
