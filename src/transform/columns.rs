use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;

/// The 24 source columns a MarketRecord keeps, in output order.
pub const SELECTED_COLUMNS: [&str; 24] = [
    "period_begin",
    "period_end",
    "period_duration",
    "region_type",
    "region_type_id",
    "table_id",
    "is_seasonally_adjusted",
    "city",
    "state",
    "state_code",
    "property_type",
    "property_type_id",
    "median_sale_price",
    "median_list_price",
    "median_ppsf",
    "median_list_ppsf",
    "homes_sold",
    "inventory",
    "months_of_supply",
    "median_dom",
    "avg_sale_to_list",
    "sold_above_list",
    "parent_metro_region_metro_code",
    "last_updated",
];

/// Month number (1-based) to 3-letter label. Applied only to the derived
/// `period_begin_in_months` / `period_end_in_months` columns.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Project the raw batch onto exactly the selected columns, in order.
/// A missing column is fatal.
pub fn project_selected(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut indices = Vec::with_capacity(SELECTED_COLUMNS.len());
    for name in SELECTED_COLUMNS {
        let idx = schema
            .index_of(name)
            .with_context(|| format!("source is missing expected column '{name}'"))?;
        indices.push(idx);
    }
    batch
        .project(&indices)
        .context("projecting onto selected columns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{ArrayRef, StringArray},
        datatypes::{DataType, Field, Schema},
    };
    use std::sync::Arc;

    #[test]
    fn projection_preserves_declared_order() -> Result<()> {
        // Build a batch with the selected columns in reverse, plus an extra.
        let mut names: Vec<&str> = SELECTED_COLUMNS.into_iter().rev().collect();
        names.push("region");
        let fields: Vec<Field> = names
            .iter()
            .map(|n| Field::new(*n, DataType::Utf8, true))
            .collect();
        let cols: Vec<ArrayRef> = names
            .iter()
            .map(|_| Arc::new(StringArray::from(vec!["x"])) as ArrayRef)
            .collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), cols)?;

        let projected = project_selected(&batch)?;
        assert_eq!(projected.num_columns(), 24);
        for (i, name) in SELECTED_COLUMNS.iter().enumerate() {
            assert_eq!(projected.schema().field(i).name(), name);
        }
        Ok(())
    }

    #[test]
    fn missing_column_is_fatal() {
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("city", DataType::Utf8, true)])),
            vec![Arc::new(StringArray::from(vec!["Seattle"])) as ArrayRef],
        )
        .unwrap();
        let err = project_selected(&batch).unwrap_err();
        assert!(err.to_string().contains("missing expected column"));
    }
}
