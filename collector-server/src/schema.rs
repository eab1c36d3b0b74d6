use std::collections::HashMap;

use commons_error::*;
use commons_pg::{SQLChange, SQLConnection};

use crate::dataset_store::TABLE_INDEX_NAME;
use crate::identifier::quote_ident;

const INDEX_SCHEMA: &str = r#"
CREATE SCHEMA IF NOT EXISTS {schema};

CREATE TABLE IF NOT EXISTS {schema}.{table_index} (
    table_id INTEGER NULL,
    table_name TEXT NOT NULL,
    filename TEXT,
    CONSTRAINT table_index_pk PRIMARY KEY (table_name)
);
"#;

pub(crate) fn index_schema_script(schema: &str) -> String {
    INDEX_SCHEMA.replace("{schema}", &quote_ident(schema)).replace("{table_index}", &quote_ident(TABLE_INDEX_NAME))
}

/// Create the schema and the table index if they are not there yet
pub(crate) async fn init_schema(schema: &str) -> anyhow::Result<()> {
    log_info!("🚀 Start init_schema, schema=[{}]", schema);

    let mut cnx = SQLConnection::from_pool().await.map_err(err_fwd!("💣 New Db connection failed"))?;
    let mut trans = cnx.begin().await.map_err(err_fwd!("💣 Transaction issue"))?;

    let change = SQLChange { sql_query: index_schema_script(schema), params: HashMap::new() };
    change.batch(&mut trans).await.map_err(err_fwd!("💣 Cannot create the table index, schema=[{}]", schema))?;

    trans.commit().await.map_err(err_fwd!("💣 Commit failed"))?;

    log_info!("🏁 End init_schema, schema=[{}]", schema);
    Ok(())
}
