use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use async_trait::async_trait;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::objects::upload::{Media, UploadObjectRequest, UploadType},
};
use std::{fs, fs::File, path::Path};
use tracing::{debug, info};

/// Bytes per progress tick while streaming the upload.
const UPLOAD_CHUNK_BYTES: usize = 8 * 1024 * 1024;

/// Serialize the batch to a CSV file with a header row and no index column.
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating output file {}", path.display()))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer
        .write(batch)
        .with_context(|| format!("writing CSV to {}", path.display()))?;
    info!(rows = batch.num_rows(), path = %path.display(), "data saved");
    Ok(())
}

/// The one capability publish needs from object storage. Keeps the pipeline
/// independent of any particular provider client.
#[async_trait]
pub trait ObjectStore {
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()>;
}

/// Google Cloud Storage implementation, authenticated from the ambient
/// environment (Application Default Credentials).
pub struct GcsStore {
    client: Client,
}

impl GcsStore {
    pub async fn new() -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .context("authenticating to object storage")?;
        Ok(Self {
            client: Client::new(config),
        })
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let total = data.len() as u64;
        let upload_type = UploadType::Simple(Media::new(key.to_string()));
        let request = UploadObjectRequest {
            bucket: bucket.to_string(),
            ..Default::default()
        };

        // Stream in fixed chunks so upload progress is observable in the logs.
        let chunks: Vec<Vec<u8>> = data.chunks(UPLOAD_CHUNK_BYTES).map(<[u8]>::to_vec).collect();
        let mut sent = 0u64;
        let body = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            debug!(sent, total, "upload progress");
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        self.client
            .upload_streamed_object(&request, body, &upload_type)
            .await
            .with_context(|| format!("uploading {key} to bucket {bucket}"))?;
        Ok(())
    }
}

/// Publish stage entry point: the already-written local file is copied as-is
/// to the configured bucket and key.
#[tracing::instrument(level = "info", skip(store, path), fields(path = %path.display()))]
pub async fn upload_file<S: ObjectStore>(
    store: &S,
    path: &Path,
    bucket: &str,
    key: &str,
) -> Result<()> {
    let data =
        fs::read(path).with_context(|| format!("reading output file {}", path.display()))?;
    info!(bytes = data.len(), "uploading to object storage");
    store.upload(bucket, key, data).await?;
    info!("file uploaded to gs://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{ArrayRef, Int32Array, StringArray},
        csv::ReaderBuilder,
        datatypes::{DataType, Field, Schema},
    };
    use std::{
        collections::HashMap,
        io::Write,
        sync::{Arc, Mutex},
    };
    use tempfile::NamedTempFile;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("city", DataType::Utf8, true),
            Field::new("period_begin_in_years", DataType::Int32, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Seattle", "Austin Tx-ish"])) as ArrayRef,
                Arc::new(Int32Array::from(vec![2023, 2024])) as ArrayRef,
            ],
        )
        .unwrap()
    }

    #[test]
    fn csv_round_trip_preserves_rows_and_values() -> Result<()> {
        let batch = sample_batch();
        let tmp = NamedTempFile::new()?;
        write_csv(&batch, tmp.path())?;

        let text = fs::read_to_string(tmp.path())?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("city,period_begin_in_years"));

        // read back through the arrow CSV reader and compare
        let schema = Arc::new(Schema::new(vec![
            Field::new("city", DataType::Utf8, true),
            Field::new("period_begin_in_years", DataType::Int32, true),
        ]));
        let reread = ReaderBuilder::new(schema)
            .with_header(true)
            .build(File::open(tmp.path())?)?
            .next()
            .expect("one batch")?;
        assert_eq!(reread.num_rows(), batch.num_rows());

        let cities = reread
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(cities.value(1), "Austin Tx-ish");
        let years = reread
            .column(1)
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap();
        assert_eq!(years.value(0), 2023);
        Ok(())
    }

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
            self.objects
                .lock()
                .unwrap()
                .insert(format!("{bucket}/{key}"), data);
            Ok(())
        }
    }

    #[tokio::test]
    async fn upload_sends_the_exact_file_bytes() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"city,state\nSeattle,WA\n")?;

        let store = MemoryStore::default();
        upload_file(&store, tmp.path(), "market-bucket", "real_estate_data.csv").await?;

        let objects = store.objects.lock().unwrap();
        let stored = objects
            .get("market-bucket/real_estate_data.csv")
            .expect("object stored");
        assert_eq!(stored.as_slice(), b"city,state\nSeattle,WA\n");
        Ok(())
    }

    #[tokio::test]
    async fn missing_local_file_is_fatal() {
        let store = MemoryStore::default();
        let err = upload_file(&store, Path::new("does-not-exist.csv"), "b", "k")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does-not-exist.csv"));
    }
}
