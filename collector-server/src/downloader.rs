use std::sync::Arc;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use csv::Writer;

use commons_error::*;
use dcdto::DatasetEntry;

use crate::dataset_store::{DatasetStore, TABLE_EXCLUDES};
use crate::x_request_id::{Follower, XRequestID};

/// A dataset ready to be sent back
#[derive(Debug)]
pub(crate) struct CsvFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl CsvFile {
    /// The filename as it goes in the Content-Disposition header
    fn attachment_name(&self) -> String {
        self.filename.chars().filter(|c| *c != '"' && *c != '\\' && !c.is_control()).collect()
    }
}

impl IntoResponse for CsvFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.attachment_name());
        (StatusCode::OK, [(CONTENT_TYPE, "text/csv; charset=utf-8".to_string()), (CONTENT_DISPOSITION, disposition)], self.content)
            .into_response()
    }
}

pub(crate) struct DownloadDelegate {
    store: Arc<dyn DatasetStore>,
    pub follower: Follower,
}

impl DownloadDelegate {
    pub fn new(store: Arc<dyn DatasetStore>, x_request_id: XRequestID) -> Self {
        Self { store, follower: Follower { x_request_id: x_request_id.new_if_null() } }
    }

    /// Entries for the download page, empty when the index cannot be read
    pub async fn list_datasets(&self) -> Vec<DatasetEntry> {
        log_info!("🚀 Start list_datasets, follower=[{}]", &self.follower);

        let entries = match self.store.all_table_info().await {
            Ok(entries) => entries,
            Err(e) => {
                log_error!("💣 Cannot read the table index, error=[{}], follower=[{}]", e, &self.follower);
                vec![]
            }
        };

        log_info!("🏁 End list_datasets, count=[{}], follower=[{}]", entries.len(), &self.follower);
        entries
    }

    ///
    /// 🔑 Read a dataset table back into a CSV file.
    ///
    /// None for the utility tables and for any name the catalog does not know.
    ///
    pub async fn download_dataset(&self, dataset_name: &str) -> Option<CsvFile> {
        log_info!("🚀 Start download_dataset, dataset_name=[{}], follower=[{}]", dataset_name, &self.follower);

        let r = self.read_dataset(dataset_name).await;
        match &r {
            Ok(Some(csv_file)) => log_info!(
                "😎 Dataset read, filename=[{}], size=[{}], follower=[{}]",
                &csv_file.filename,
                csv_file.content.len(),
                &self.follower
            ),
            Ok(None) => log_warn!("⛔ Unknown dataset, dataset_name=[{}], follower=[{}]", dataset_name, &self.follower),
            Err(e) => log_error!("💣 Cannot read the dataset, error=[{}], follower=[{}]", e, &self.follower),
        }

        log_info!("🏁 End download_dataset, follower=[{}]", &self.follower);
        r.ok().flatten()
    }

    async fn read_dataset(&self, dataset_name: &str) -> anyhow::Result<Option<CsvFile>> {
        if TABLE_EXCLUDES.contains(&dataset_name) {
            return Ok(None);
        }

        // The name must come from the catalog before it goes into any query
        let table_names = self.store.table_names().await.map_err(tr_fwd!())?;
        let Some(table_name) = table_names.into_iter().find(|t| t == dataset_name) else {
            return Ok(None);
        };

        let columns = self.store.column_names(&table_name).await.map_err(tr_fwd!())?;
        if columns.is_empty() {
            return Ok(None);
        }

        let rows = self.store.fetch_rows(&table_name, &columns).await.map_err(tr_fwd!())?;

        let mut writer = Writer::from_writer(vec![]);
        writer.write_record(&columns)?;
        for row in &rows {
            writer.write_record(row)?;
        }
        let content = writer.into_inner().map_err(|e| anyhow::anyhow!("Cannot flush the csv writer: {}", e))?;

        let filename = self
            .store
            .filename(&table_name)
            .await
            .map_err(tr_fwd!())?
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| format!("{}.csv", &table_name));

        Ok(Some(CsvFile { filename, content }))
    }
}
