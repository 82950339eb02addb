use crate::transform::columns::MONTH_LABELS;
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{ArrayRef, Int32Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a Utf8 date column. Any unparseable value aborts the run.
fn parse_date_column(batch: &RecordBatch, name: &str) -> Result<Vec<NaiveDate>> {
    let idx = batch
        .schema()
        .index_of(name)
        .with_context(|| format!("missing date column '{name}'"))?;
    let col = batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("column '{name}' is not a string column"))?;

    let mut dates = Vec::with_capacity(batch.num_rows());
    for opt in col.iter() {
        let raw = opt.ok_or_else(|| anyhow!("null '{name}' value after null filtering"))?;
        let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .with_context(|| format!("unparseable '{name}' value: {raw}"))?;
        dates.push(date);
    }
    Ok(dates)
}

/// Append the four derived period columns: 4-digit years as Int32 and
/// 3-letter month labels as Utf8. The label substitution targets only these
/// two derived month columns; no other column is touched.
pub fn append_period_fields(batch: &RecordBatch) -> Result<RecordBatch> {
    let begin = parse_date_column(batch, "period_begin")?;
    let end = parse_date_column(batch, "period_end")?;

    let begin_years: Int32Array = begin.iter().map(|d| Some(d.year())).collect();
    let end_years: Int32Array = end.iter().map(|d| Some(d.year())).collect();
    let begin_months: StringArray = begin
        .iter()
        .map(|d| Some(MONTH_LABELS[d.month0() as usize]))
        .collect();
    let end_months: StringArray = end
        .iter()
        .map(|d| Some(MONTH_LABELS[d.month0() as usize]))
        .collect();

    let mut fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(Field::new("period_begin_in_years", DataType::Int32, false));
    fields.push(Field::new("period_end_in_years", DataType::Int32, false));
    fields.push(Field::new("period_begin_in_months", DataType::Utf8, false));
    fields.push(Field::new("period_end_in_months", DataType::Utf8, false));

    let mut cols: Vec<ArrayRef> = batch.columns().to_vec();
    cols.push(Arc::new(begin_years));
    cols.push(Arc::new(end_years));
    cols.push(Arc::new(begin_months));
    cols.push(Arc::new(end_months));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).map_err(Into::into)
}
