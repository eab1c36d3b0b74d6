use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord};

use commons_error::*;
use dcdto::error_codes::{
    DATA_NOT_SAVED, EMPTY_FILE, INVALID_COLUMN_NAME, INVALID_CSV_CONTENT, INVALID_DATASET_NAME, NO_FILE_UPLOADED,
    PARTIAL_SUCCESS, UPLOAD_SUCCESS,
};
use dcdto::ErrorSet;

use crate::dataset_sql::match_columns_data;
use crate::dataset_store::{DatasetStore, StoreError, TABLE_EXCLUDES};
use crate::identifier::{clean_word, dataset_name_from_filename};
use crate::x_request_id::{Follower, XRequestID};

/// The file part of the upload form
#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct UploadOutcome {
    pub status: &'static ErrorSet<'static>,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl UploadOutcome {
    fn from_errorset(status: &'static ErrorSet<'static>) -> Self {
        Self { status, inserted: 0, skipped: 0, failed: 0 }
    }
}

pub(crate) struct UploadDelegate {
    store: Arc<dyn DatasetStore>,
    pub follower: Follower,
}

fn record_to_strings(record: &StringRecord) -> Vec<String> {
    record.iter().map(|field| field.to_owned()).collect()
}

impl UploadDelegate {
    pub fn new(store: Arc<dyn DatasetStore>, x_request_id: XRequestID) -> Self {
        Self { store, follower: Follower { x_request_id: x_request_id.new_if_null() } }
    }

    ///
    /// 🔑 Turn the uploaded CSV file into a dataset table.
    ///
    /// The header gives the columns, then every row is inserted on its own,
    /// a row that cannot be saved does not stop the others.
    ///
    pub async fn upload(&self, uploaded_file: Option<UploadedFile>) -> UploadOutcome {
        log_info!("🚀 Start upload, follower=[{}]", &self.follower);

        let Some(uploaded_file) = uploaded_file.filter(|f| !f.filename.is_empty()) else {
            log_warn!("⛔ No file in the form, follower=[{}]", &self.follower);
            return UploadOutcome::from_errorset(&NO_FILE_UPLOADED);
        };

        let Some(table_name) = dataset_name_from_filename(&uploaded_file.filename) else {
            log_warn!(
                "⛔ No dataset name for the file, filename=[{}], follower=[{}]",
                &uploaded_file.filename,
                &self.follower
            );
            return UploadOutcome::from_errorset(&INVALID_DATASET_NAME);
        };

        if TABLE_EXCLUDES.iter().any(|t| t.eq_ignore_ascii_case(&table_name)) {
            log_warn!(
                "⛔ The dataset name is a utility table, table_name=[{}], follower=[{}]",
                &table_name,
                &self.follower
            );
            return UploadOutcome::from_errorset(&INVALID_DATASET_NAME);
        }

        if uploaded_file.content.is_empty() {
            log_warn!("⛔ The file was empty, filename=[{}], follower=[{}]", &uploaded_file.filename, &self.follower);
            return UploadOutcome::from_errorset(&EMPTY_FILE);
        }

        log_debug!(
            "Upload the file into the table, filename=[{}], table_name=[{}], size=[{}], follower=[{}]",
            &uploaded_file.filename,
            &table_name,
            uploaded_file.content.len(),
            &self.follower
        );

        let mut reader =
            ReaderBuilder::new().has_headers(false).flexible(true).from_reader(uploaded_file.content.as_slice());
        // Invalid UTF-8 is a read error, the header is refused and a row counts as failed
        let mut records = reader.records();

        let header = match records.next() {
            None => {
                log_warn!("⛔ No record in the file, follower=[{}]", &self.follower);
                return UploadOutcome::from_errorset(&EMPTY_FILE);
            }
            Some(Err(e)) => {
                log_error!("💣 Cannot read the header, error=[{}], follower=[{}]", e, &self.follower);
                return UploadOutcome::from_errorset(&INVALID_CSV_CONTENT);
            }
            Some(Ok(record)) => record_to_strings(&record),
        };

        let Some(column_names) = header.iter().map(|h| clean_word(h)).collect::<Option<Vec<String>>>() else {
            log_warn!("⛔ Invalid column name, header=[{:?}], follower=[{}]", &header, &self.follower);
            return UploadOutcome::from_errorset(&INVALID_COLUMN_NAME);
        };

        if let Err(e) = self.store.insert_table_index(&table_name, &uploaded_file.filename).await {
            match e {
                StoreError::IdExists => {
                    log_info!("😎 The dataset is already indexed, table_name=[{}], follower=[{}]", &table_name, &self.follower);
                }
                _ => {
                    log_error!("💣 Cannot index the dataset, error=[{}], follower=[{}]", e, &self.follower);
                    return UploadOutcome::from_errorset(e.error_set());
                }
            }
        }

        if let Err(e) = self.store.create_table(&table_name, &column_names).await {
            match e {
                StoreError::TableExists => {
                    log_info!("😎 The table already exists, table_name=[{}], follower=[{}]", &table_name, &self.follower);
                }
                _ => {
                    log_error!("💣 Cannot create the table, error=[{}], follower=[{}]", e, &self.follower);
                    return UploadOutcome::from_errorset(e.error_set());
                }
            }
        }

        let mut outcome = UploadOutcome::from_errorset(&UPLOAD_SUCCESS);
        let mut row_count = 0;

        for (line, result) in records.enumerate() {
            row_count += 1;
            let row_data = match result {
                Ok(record) => record_to_strings(&record),
                Err(e) => {
                    log_warn!("⛔ Cannot read the row, row=[{}], error=[{}], follower=[{}]", line + 1, e, &self.follower);
                    outcome.failed += 1;
                    continue;
                }
            };

            if row_data.iter().all(|cell| cell.trim().is_empty()) {
                outcome.skipped += 1;
                continue;
            }

            let (columns, data) = match_columns_data(&column_names, &row_data);
            if columns.is_empty() {
                outcome.skipped += 1;
                continue;
            }

            match self.store.insert_row(&table_name, &columns, &data).await {
                Ok(()) => outcome.inserted += 1,
                Err(e) => {
                    log_warn!("⛔ Row not saved, row=[{}], error=[{}], follower=[{}]", line + 1, e, &self.follower);
                    outcome.failed += 1;
                }
            }
        }

        outcome.status = if outcome.failed >= row_count {
            &*DATA_NOT_SAVED
        } else if outcome.failed > 0 {
            &*PARTIAL_SUCCESS
        } else {
            &*UPLOAD_SUCCESS
        };

        log_info!(
            "😎 Upload done, table_name=[{}], inserted=[{}], skipped=[{}], failed=[{}], follower=[{}]",
            &table_name,
            outcome.inserted,
            outcome.skipped,
            outcome.failed,
            &self.follower
        );
        log_info!("🏁 End upload, follower=[{}]", &self.follower);
        outcome
    }
}
