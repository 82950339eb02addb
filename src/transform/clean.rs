use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, BooleanArray, StringArray},
    compute::filter_record_batch,
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Strip every comma from the `city` column. Commas in city names would
/// break naive downstream CSV consumers. Other columns are untouched.
pub fn strip_city_commas(batch: &RecordBatch) -> Result<RecordBatch> {
    let city_idx = batch
        .schema()
        .index_of("city")
        .context("source is missing expected column 'city'")?;

    let mut cols: Vec<ArrayRef> = batch.columns().to_vec();
    let cities = as_string_column(batch, city_idx)?;
    let cleaned: StringArray = cities
        .iter()
        .map(|opt| opt.map(|s| s.replace(',', "")))
        .collect();
    cols[city_idx] = Arc::new(cleaned) as ArrayRef;

    RecordBatch::try_new(batch.schema(), cols).map_err(Into::into)
}

/// Drop every row holding a null (or all-empty) value in any column.
/// No imputation: a single missing metric discards the whole observation.
pub fn drop_null_rows(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut keep = vec![true; batch.num_rows()];
    for idx in 0..batch.num_columns() {
        let col = as_string_column(batch, idx)?;
        for (row, flag) in keep.iter_mut().enumerate() {
            if col.is_null(row) || col.value(row).is_empty() {
                *flag = false;
            }
        }
    }
    let mask = BooleanArray::from(keep);
    filter_record_batch(batch, &mask).context("filtering null rows")
}

fn as_string_column(batch: &RecordBatch, idx: usize) -> Result<&StringArray> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            anyhow!(
                "column '{}' is not a string column",
                batch.schema().field(idx).name()
            )
        })
}
