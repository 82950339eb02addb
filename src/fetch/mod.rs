use anyhow::{anyhow, Context, Result};
use arrow::{
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use flate2::read::GzDecoder;
use regex::Regex;
use reqwest::Client;
use std::{
    io::{Cursor, Read},
    sync::Arc,
};
use tracing::info;
use url::Url;

const READ_BATCH_SIZE: usize = 65_536;

/// Download the export at `url_str` and return the raw (still compressed) body.
pub async fn download(client: &Client, url_str: &str) -> Result<Vec<u8>> {
    let url = Url::parse(url_str).with_context(|| format!("invalid source url: {url_str}"))?;
    let resp = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching {url}"))?;
    let bytes = resp.bytes().await.context("reading response body")?;
    Ok(bytes.to_vec())
}

/// Decompress a gzip TSV payload and parse it into a single record batch.
/// Every source column is read as nullable Utf8; empty fields become nulls.
/// No schema validation beyond what the header row claims.
pub fn parse_tsv(gz_bytes: &[u8]) -> Result<RecordBatch> {
    let mut text = String::new();
    GzDecoder::new(gz_bytes)
        .read_to_string(&mut text)
        .context("decompressing gzip payload")?;

    let header = text
        .lines()
        .next()
        .ok_or_else(|| anyhow!("source file is empty"))?;
    let fields: Vec<Field> = header
        .split('\t')
        .map(|name| Field::new(name.trim(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let null_regex = Regex::new("^$").expect("null regex should be valid");
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_delimiter(b'\t')
        .with_null_regex(null_regex)
        .with_batch_size(READ_BATCH_SIZE)
        .build(Cursor::new(text.as_bytes()))
        .context("creating TSV reader")?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("parsing TSV rows")?;
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    arrow::compute::concat_batches(&schema, &batches).context("concatenating TSV batches")
}

/// Fetch stage entry point: download, decompress, parse into memory.
#[tracing::instrument(level = "info", skip(client))]
pub async fn fetch_market_data(client: &Client, url: &str) -> Result<RecordBatch> {
    info!("extracting market tracker data");
    let gz = download(client, url).await?;
    let batch = parse_tsv(&gz)?;
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "data extracted"
    );
    Ok(batch)
}
