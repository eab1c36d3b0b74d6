use std::collections::HashMap;

use axum::async_trait;
use thiserror::Error;

use commons_error::*;
use commons_pg::{
    sql_state, CellValue, SQLChange, SQLConnection, SQLDataSet, SQLQueryBlock, DUPLICATE_COLUMN, DUPLICATE_TABLE,
    UNIQUE_VIOLATION,
};
use dcdto::error_codes::{
    DATASET_ALREADY_EXISTS, DUPLICATE_COLUMN_NAME, ID_ALREADY_EXISTS, INSERT_CONSTRUCTION_ERROR, INTEGRITY_ERROR,
    INTERNAL_DATABASE_ERROR, NO_DATA_TO_INSERT, OPERATIONAL_ERROR, TABLE_NOT_FOUND,
};
use dcdto::{DatasetEntry, ErrorSet};

use crate::dataset_sql::{create_table_statement, insert_params, insert_statement, select_all_statement};
use crate::identifier::quote_ident;

/// The index of the uploaded datasets
pub(crate) const TABLE_INDEX_NAME: &str = "table_index";

/// Utility tables of the database, never shown nor downloaded
pub(crate) const TABLE_EXCLUDES: &[&str] = &[TABLE_INDEX_NAME, "migrate_version"];

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("This dataset already exists")]
    TableExists,
    #[error("UNIQUE constraint failed")]
    IdExists,
    #[error("Duplicate column name error")]
    DuplicateColumn,
    #[error("Operational Error occurred")]
    Operational,
    #[error("Integrity Error occurred")]
    Integrity,
    #[error("Table is not in the database")]
    TableNotFound,
    #[error("INSERT command construction error")]
    ColumnNotFound,
    #[error("No data to insert")]
    NoData,
    #[error("Internal database error")]
    Database(#[from] anyhow::Error),
}

impl StoreError {
    /// Message and http status shown to the user
    pub(crate) fn error_set(&self) -> &'static ErrorSet<'static> {
        match self {
            StoreError::TableExists => &*DATASET_ALREADY_EXISTS,
            StoreError::IdExists => &*ID_ALREADY_EXISTS,
            StoreError::DuplicateColumn => &*DUPLICATE_COLUMN_NAME,
            StoreError::Operational => &*OPERATIONAL_ERROR,
            StoreError::Integrity => &*INTEGRITY_ERROR,
            StoreError::TableNotFound => &*TABLE_NOT_FOUND,
            StoreError::ColumnNotFound => &*INSERT_CONSTRUCTION_ERROR,
            StoreError::NoData => &*NO_DATA_TO_INSERT,
            StoreError::Database(_) => &*INTERNAL_DATABASE_ERROR,
        }
    }
}

///
/// Everything the application asks to the database.
///
/// Table and column names given to the store went through clean_word.
///
#[async_trait]
pub(crate) trait DatasetStore: Send + Sync {
    /// Record the table and the file it comes from in the table index
    async fn insert_table_index(&self, table_name: &str, filename: &str) -> Result<(), StoreError>;

    /// Create the dataset table, VARCHAR columns, the first one being the primary key
    async fn create_table(&self, table_name: &str, columns: &[String]) -> Result<(), StoreError>;

    /// Insert one row, after checking the table and the columns against the catalog
    async fn insert_row(&self, table_name: &str, columns: &[String], row_data: &[String]) -> Result<(), StoreError>;

    async fn table_names(&self) -> anyhow::Result<Vec<String>>;

    /// Columns in their table order, empty for an unknown table
    async fn column_names(&self, table_name: &str) -> anyhow::Result<Vec<String>>;

    /// Every row as text, NULL cells read as empty strings
    async fn fetch_rows(&self, table_name: &str, columns: &[String]) -> anyhow::Result<Vec<Vec<String>>>;

    /// Original filename of the dataset
    async fn filename(&self, table_name: &str) -> anyhow::Result<Option<String>>;

    /// All the entries of the table index, by table name
    async fn all_table_info(&self) -> anyhow::Result<Vec<DatasetEntry>>;
}

/// Shared checks of insert_row, before any statement is built with the names
pub(crate) fn verify_insert(
    table_names: &[String],
    table_name: &str,
    table_columns: &[String],
    columns: &[String],
    row_data: &[String],
) -> Result<(), StoreError> {
    if !table_names.iter().any(|t| t == table_name) {
        return Err(StoreError::TableNotFound);
    }
    if row_data.is_empty() {
        return Err(StoreError::NoData);
    }
    if columns.len() != row_data.len() || !columns.iter().all(|c| table_columns.contains(c)) {
        return Err(StoreError::ColumnNotFound);
    }
    Ok(())
}

///
/// DatasetStore on PostgreSQL, every dataset table lives in [schema]
///
pub(crate) struct PgDatasetStore {
    schema: String,
}

impl PgDatasetStore {
    pub fn new(schema: &str) -> Self {
        Self { schema: schema.to_owned() }
    }

    fn index_table(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(TABLE_INDEX_NAME))
    }

    /// Run one query in its own transaction
    async fn query(&self, query: SQLQueryBlock) -> anyhow::Result<SQLDataSet> {
        let mut cnx = SQLConnection::from_pool().await.map_err(err_fwd!("💣 New Db connection failed"))?;
        let mut trans = cnx.begin().await.map_err(err_fwd!("💣 Transaction issue"))?;
        let sql_result = match query.execute(&mut trans).await {
            Ok(ds) => ds,
            Err(e) => {
                trans.rollback().await;
                return Err(e);
            }
        };
        trans.commit().await.map_err(err_fwd!("💣 Commit failed"))?;
        Ok(sql_result)
    }

    /// Run one change in its own transaction, the failure is classified by [on_error]
    async fn change(
        &self,
        change: SQLChange,
        is_batch: bool,
        on_error: fn(&anyhow::Error) -> StoreError,
    ) -> Result<(), StoreError> {
        let mut cnx = SQLConnection::from_pool().await.map_err(err_fwd!("💣 New Db connection failed"))?;
        let mut trans = cnx.begin().await.map_err(err_fwd!("💣 Transaction issue"))?;

        let r = if is_batch { change.batch(&mut trans).await } else { change.execute(&mut trans).await.map(|_| ()) };

        if let Err(e) = r {
            trans.rollback().await;
            return Err(on_error(&e));
        }
        trans.commit().await.map_err(err_fwd!("💣 Commit failed"))?;
        Ok(())
    }
}

fn is_sql_state(e: &anyhow::Error, code: &str) -> bool {
    sql_state(e).as_deref() == Some(code)
}

fn index_insert_error(e: &anyhow::Error) -> StoreError {
    if is_sql_state(e, UNIQUE_VIOLATION) {
        StoreError::IdExists
    } else {
        StoreError::Operational
    }
}

fn create_table_error(e: &anyhow::Error) -> StoreError {
    if is_sql_state(e, DUPLICATE_TABLE) {
        StoreError::TableExists
    } else if is_sql_state(e, DUPLICATE_COLUMN) {
        StoreError::DuplicateColumn
    } else {
        StoreError::Operational
    }
}

/// A duplicate primary key, any other refusal of the row is an integrity error
fn insert_row_error(e: &anyhow::Error) -> StoreError {
    if is_sql_state(e, UNIQUE_VIOLATION) {
        StoreError::IdExists
    } else {
        StoreError::Integrity
    }
}

#[async_trait]
impl DatasetStore for PgDatasetStore {
    async fn insert_table_index(&self, table_name: &str, filename: &str) -> Result<(), StoreError> {
        let mut params: HashMap<String, CellValue> = HashMap::new();
        params.insert("p_table_name".to_owned(), CellValue::from_raw_str(table_name));
        params.insert("p_filename".to_owned(), CellValue::from_raw_str(filename));

        let change = SQLChange {
            sql_query: format!(
                "INSERT INTO {} (table_name, filename) VALUES (:p_table_name, :p_filename)",
                self.index_table()
            ),
            params,
        };

        self.change(change, false, index_insert_error).await
    }

    async fn create_table(&self, table_name: &str, columns: &[String]) -> Result<(), StoreError> {
        let sql_query = create_table_statement(&self.schema, table_name, columns)
            .map_err(err_fwd!("💣 Cannot build the create statement, table=[{}]", table_name))
            .map_err(|_| StoreError::Operational)?;

        let change = SQLChange { sql_query, params: HashMap::new() };

        self.change(change, true, create_table_error).await
    }

    async fn insert_row(&self, table_name: &str, columns: &[String], row_data: &[String]) -> Result<(), StoreError> {
        let table_names = self.table_names().await?;
        let table_columns = if table_names.iter().any(|t| t == table_name) {
            self.column_names(table_name).await?
        } else {
            vec![]
        };
        verify_insert(&table_names, table_name, &table_columns, columns, row_data)?;

        let sql_query = insert_statement(&self.schema, table_name, columns)
            .map_err(err_fwd!("💣 Cannot build the insert statement, table=[{}]", table_name))
            .map_err(|_| StoreError::ColumnNotFound)?;

        let change = SQLChange { sql_query, params: insert_params(row_data) };

        self.change(change, false, insert_row_error).await
    }

    async fn table_names(&self) -> anyhow::Result<Vec<String>> {
        let mut params = HashMap::new();
        params.insert("p_schema".to_owned(), CellValue::from_raw_str(&self.schema));

        let query = SQLQueryBlock {
            sql_query: r"SELECT table_name::text AS table_name FROM information_schema.tables
                        WHERE table_schema = :p_schema AND table_type = 'BASE TABLE'
                        ORDER BY table_name"
                .to_string(),
            limit: None,
            params,
        };

        let mut sql_result = self.query(query).await.map_err(err_fwd!("💣 Cannot read the table names"))?;

        let mut table_names = vec![];
        while sql_result.next() {
            if let Some(name) = sql_result.get_string("table_name") {
                table_names.push(name);
            }
        }
        Ok(table_names)
    }

    async fn column_names(&self, table_name: &str) -> anyhow::Result<Vec<String>> {
        let mut params = HashMap::new();
        params.insert("p_schema".to_owned(), CellValue::from_raw_str(&self.schema));
        params.insert("p_table_name".to_owned(), CellValue::from_raw_str(table_name));

        let query = SQLQueryBlock {
            sql_query: r"SELECT column_name::text AS column_name FROM information_schema.columns
                        WHERE table_schema = :p_schema AND table_name = :p_table_name
                        ORDER BY ordinal_position"
                .to_string(),
            limit: None,
            params,
        };

        let mut sql_result = self
            .query(query)
            .await
            .map_err(err_fwd!("💣 Cannot read the column names, table=[{}]", table_name))?;

        let mut column_names = vec![];
        while sql_result.next() {
            if let Some(name) = sql_result.get_string("column_name") {
                column_names.push(name);
            }
        }
        Ok(column_names)
    }

    async fn fetch_rows(&self, table_name: &str, columns: &[String]) -> anyhow::Result<Vec<Vec<String>>> {
        let query = SQLQueryBlock {
            sql_query: select_all_statement(&self.schema, table_name, columns)?,
            limit: None,
            params: HashMap::new(),
        };

        let mut sql_result =
            self.query(query).await.map_err(err_fwd!("💣 Cannot read the dataset, table=[{}]", table_name))?;

        let mut rows = vec![];
        while sql_result.next() {
            let row = columns.iter().map(|c| sql_result.get_string(c).unwrap_or_default()).collect();
            rows.push(row);
        }
        Ok(rows)
    }

    async fn filename(&self, table_name: &str) -> anyhow::Result<Option<String>> {
        let mut params = HashMap::new();
        params.insert("p_table_name".to_owned(), CellValue::from_raw_str(table_name));

        let query = SQLQueryBlock {
            sql_query: format!("SELECT filename FROM {} WHERE table_name = :p_table_name", self.index_table()),
            limit: Some(1),
            params,
        };

        let mut sql_result =
            self.query(query).await.map_err(err_fwd!("💣 Cannot read the filename, table=[{}]", table_name))?;

        Ok(if sql_result.next() { sql_result.get_string("filename") } else { None })
    }

    async fn all_table_info(&self) -> anyhow::Result<Vec<DatasetEntry>> {
        let query = SQLQueryBlock {
            sql_query: format!("SELECT table_name, filename FROM {} ORDER BY table_name", self.index_table()),
            limit: None,
            params: HashMap::new(),
        };

        let mut sql_result = self.query(query).await.map_err(err_fwd!("💣 Cannot read the table index"))?;

        let mut entries = vec![];
        while sql_result.next() {
            entries.push(DatasetEntry {
                table_name: sql_result.get_string("table_name").unwrap_or_default(),
                filename: sql_result.get_string("filename").unwrap_or_default(),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    /// A server error carrying only its SQLSTATE
    #[derive(Debug, Error)]
    #[error("database error, sqlstate [{code}]")]
    struct ServerError {
        code: &'static str,
    }

    impl DatabaseError for ServerError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                UNIQUE_VIOLATION => ErrorKind::UniqueViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    /// The error as it comes out of commons-pg
    fn server_error(code: &'static str) -> anyhow::Error {
        sqlx::Error::Database(Box::new(ServerError { code })).into()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn insert_checks_the_table_first() {
        let r = verify_insert(&strings(&["other"]), "cities", &[], &strings(&["name"]), &[]);
        assert!(matches!(r, Err(StoreError::TableNotFound)));
    }

    #[test]
    fn insert_needs_data() {
        let r = verify_insert(&strings(&["cities"]), "cities", &strings(&["name"]), &[], &[]);
        assert!(matches!(r, Err(StoreError::NoData)));
    }

    #[test]
    fn insert_checks_every_column() {
        let tables = strings(&["cities"]);
        let table_columns = strings(&["name", "country"]);

        let r = verify_insert(&tables, "cities", &table_columns, &strings(&["name", "mayor"]), &strings(&["a", "b"]));
        assert!(matches!(r, Err(StoreError::ColumnNotFound)));

        let r = verify_insert(&tables, "cities", &table_columns, &strings(&["country"]), &strings(&["France"]));
        assert!(r.is_ok());
    }

    #[test]
    fn messages_match_the_status() {
        for e in [
            StoreError::TableExists,
            StoreError::IdExists,
            StoreError::DuplicateColumn,
            StoreError::Operational,
            StoreError::Integrity,
            StoreError::TableNotFound,
            StoreError::ColumnNotFound,
            StoreError::NoData,
        ] {
            assert_eq!(e.to_string(), e.error_set().err_message);
        }
        let e = StoreError::from(anyhow::anyhow!("connection refused"));
        assert_eq!(&*INTERNAL_DATABASE_ERROR, e.error_set());
    }

    #[test]
    fn index_insert_errors() {
        assert!(matches!(index_insert_error(&server_error(UNIQUE_VIOLATION)), StoreError::IdExists));
        assert!(matches!(index_insert_error(&server_error("42P01")), StoreError::Operational));
        assert!(matches!(index_insert_error(&anyhow::anyhow!("connection reset")), StoreError::Operational));
    }

    #[test]
    fn create_table_errors() {
        assert!(matches!(create_table_error(&server_error(DUPLICATE_TABLE)), StoreError::TableExists));
        assert!(matches!(create_table_error(&server_error(DUPLICATE_COLUMN)), StoreError::DuplicateColumn));
        assert!(matches!(create_table_error(&server_error(UNIQUE_VIOLATION)), StoreError::Operational));
        assert!(matches!(create_table_error(&anyhow::Error::from(sqlx::Error::PoolTimedOut)), StoreError::Operational));
    }

    #[test]
    fn insert_row_errors() {
        assert!(matches!(insert_row_error(&server_error(UNIQUE_VIOLATION)), StoreError::IdExists));
        // not null violation on the primary key
        assert!(matches!(insert_row_error(&server_error("23502")), StoreError::Integrity));
        assert!(matches!(insert_row_error(&server_error(DUPLICATE_TABLE)), StoreError::Integrity));
    }

    #[test]
    fn utility_tables_are_excluded() {
        assert!(TABLE_EXCLUDES.contains(&"table_index"));
        assert!(TABLE_EXCLUDES.contains(&"migrate_version"));
    }
}
