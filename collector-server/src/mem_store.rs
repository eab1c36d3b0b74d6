use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::anyhow;
use axum::async_trait;

use dcdto::DatasetEntry;

use crate::dataset_store::{verify_insert, DatasetStore, StoreError, TABLE_INDEX_NAME};

#[derive(Default)]
struct MemTable {
    columns: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

#[derive(Default)]
struct MemData {
    tables: BTreeMap<String, MemTable>,
    index: BTreeMap<String, String>,
}

///
/// DatasetStore kept in memory, it reports the same errors as the database would
///
#[derive(Default)]
pub(crate) struct MemDatasetStore {
    data: Mutex<MemData>,
    unavailable: bool,
}

impl MemDatasetStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.data.lock().unwrap().tables.insert(
            TABLE_INDEX_NAME.to_owned(),
            MemTable { columns: vec!["table_id".into(), "table_name".into(), "filename".into()], rows: vec![] },
        );
        store
    }

    /// Every call fails like a lost connection
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::new() }
    }

    /// A table that is not in the index
    pub fn with_table(self, table_name: &str, columns: &[&str], rows: &[&[&str]]) -> Self {
        {
            let mut data = self.data.lock().unwrap();
            let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
            let rows: Vec<HashMap<String, String>> = rows
                .iter()
                .map(|r| columns.iter().cloned().zip(r.iter().map(|v| v.to_string())).filter(|(_, v)| !v.is_empty()).collect())
                .collect();
            data.tables.insert(table_name.to_owned(), MemTable { columns, rows });
        }
        self
    }

    pub fn row_count(&self, table_name: &str) -> usize {
        self.data.lock().unwrap().tables.get(table_name).map(|t| t.rows.len()).unwrap_or(0)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.unavailable {
            return Err(anyhow!("Connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl DatasetStore for MemDatasetStore {
    async fn insert_table_index(&self, table_name: &str, filename: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        if data.index.contains_key(table_name) {
            return Err(StoreError::IdExists);
        }
        data.index.insert(table_name.to_owned(), filename.to_owned());
        Ok(())
    }

    async fn create_table(&self, table_name: &str, columns: &[String]) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        if data.tables.contains_key(table_name) {
            return Err(StoreError::TableExists);
        }
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].contains(c) {
                return Err(StoreError::DuplicateColumn);
            }
        }
        if columns.is_empty() {
            return Err(StoreError::Operational);
        }
        data.tables.insert(table_name.to_owned(), MemTable { columns: columns.to_vec(), rows: vec![] });
        Ok(())
    }

    async fn insert_row(&self, table_name: &str, columns: &[String], row_data: &[String]) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        let table_names: Vec<String> = data.tables.keys().cloned().collect();
        let table_columns = data.tables.get(table_name).map(|t| t.columns.clone()).unwrap_or_default();
        verify_insert(&table_names, table_name, &table_columns, columns, row_data)?;

        let table = data.tables.get_mut(table_name).ok_or(StoreError::TableNotFound)?;
        let row: HashMap<String, String> = columns.iter().cloned().zip(row_data.iter().cloned()).collect();

        // First column is the primary key
        let pk = &table.columns[0];
        let Some(pk_value) = row.get(pk) else {
            return Err(StoreError::Integrity);
        };
        if table.rows.iter().any(|r| r.get(pk) == Some(pk_value)) {
            return Err(StoreError::IdExists);
        }
        table.rows.push(row);
        Ok(())
    }

    async fn table_names(&self) -> anyhow::Result<Vec<String>> {
        self.check()?;
        Ok(self.data.lock().unwrap().tables.keys().cloned().collect())
    }

    async fn column_names(&self, table_name: &str) -> anyhow::Result<Vec<String>> {
        self.check()?;
        Ok(self.data.lock().unwrap().tables.get(table_name).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn fetch_rows(&self, table_name: &str, columns: &[String]) -> anyhow::Result<Vec<Vec<String>>> {
        self.check()?;
        let data = self.data.lock().unwrap();
        let table = data.tables.get(table_name).ok_or_else(|| anyhow!("relation {} does not exist", table_name))?;
        Ok(table
            .rows
            .iter()
            .map(|r| columns.iter().map(|c| r.get(c).cloned().unwrap_or_default()).collect())
            .collect())
    }

    async fn filename(&self, table_name: &str) -> anyhow::Result<Option<String>> {
        self.check()?;
        Ok(self.data.lock().unwrap().index.get(table_name).cloned())
    }

    async fn all_table_info(&self) -> anyhow::Result<Vec<DatasetEntry>> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .index
            .iter()
            .map(|(table_name, filename)| DatasetEntry { table_name: table_name.clone(), filename: filename.clone() })
            .collect())
    }
}
