use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::Utc;
use common::{Error, Result};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;

/// Lineage stamped into every table file the pipeline writes.
#[derive(Debug, Clone)]
pub struct TableLineage {
    pub layer: &'static str,
    pub source_file: String,
}

impl TableLineage {
    pub fn new(layer: &'static str, source_file: &str) -> Self {
        Self {
            layer,
            source_file: source_file.to_string(),
        }
    }

    fn key_values(&self, record_count: usize) -> Vec<KeyValue> {
        vec![
            KeyValue {
                key: "layer".to_string(),
                value: Some(self.layer.to_string()),
            },
            KeyValue {
                key: "source_file".to_string(),
                value: Some(self.source_file.clone()),
            },
            KeyValue {
                key: "processed_at".to_string(),
                value: Some(Utc::now().to_rfc3339()),
            },
            KeyValue {
                key: "record_count".to_string(),
                value: Some(record_count.to_string()),
            },
        ]
    }
}

/// Serializes one table to an in-memory Parquet file.
pub fn write_parquet(batch: &RecordBatch, lineage: &TableLineage) -> Result<Vec<u8>> {
    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(lineage.key_values(batch.num_rows())))
        .build();

    let mut buffer: Vec<u8> = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    Ok(buffer)
}

/// Reads a Parquet file back into a single table.
pub fn read_parquet(data: Vec<u8>) -> Result<RecordBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(data))?;
    let schema: SchemaRef = builder.schema().clone();
    let reader = builder.build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    if batches.len() == 1 {
        return batches
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other("parquet batch vanished".to_string()));
    }
    Ok(concat_batches(&schema, &batches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_parquet_keeps_rows_and_lineage() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("brand", DataType::Utf8, false),
            Field::new("cc", DataType::Int64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["FORD", "SEAT"])),
            Arc::new(Int64Array::from(vec![1600, 0])),
        ];
        let batch = RecordBatch::try_new(schema, columns).unwrap();

        let lineage = TableLineage::new("gold", "export_mensual_mat_202403.parquet");
        let data = write_parquet(&batch, &lineage).unwrap();

        let restored = read_parquet(data.clone()).unwrap();
        assert_eq!(restored.num_rows(), 2);
        assert_eq!(restored.column(0).as_ref(), batch.column(0).as_ref());
        assert_eq!(restored.column(1).as_ref(), batch.column(1).as_ref());

        let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(data)).unwrap();
        let kv: Vec<(String, Option<String>)> = builder
            .metadata()
            .file_metadata()
            .key_value_metadata()
            .unwrap()
            .iter()
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect();
        assert!(kv.contains(&("layer".to_string(), Some("gold".to_string()))));
        assert!(kv.contains(&("record_count".to_string(), Some("2".to_string()))));
    }
}
