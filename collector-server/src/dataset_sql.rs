//!
//! Statements for the dataset tables.
//!
//! Table and column names must have gone through clean_word and, for the inserts and selects,
//! must have been checked against the catalog. Values are never part of the statement text,
//! they are bound through the :p_colN parameters.
//!
use std::collections::HashMap;

use anyhow::anyhow;
use commons_pg::CellValue;

use crate::identifier::quote_ident;

fn qualified_table(schema: &str, table_name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table_name))
}

fn param_name(index: usize) -> String {
    format!("p_col{}", index)
}

/// CREATE TABLE with VARCHAR columns, the first column being the primary key
pub(crate) fn create_table_statement(schema: &str, table_name: &str, columns: &[String]) -> anyhow::Result<String> {
    let first = columns.first().ok_or_else(|| anyhow!("No column for table [{}]", table_name))?;

    let mut create_command = format!("CREATE TABLE {} (", qualified_table(schema, table_name));
    for col in columns {
        create_command.push_str(&format!("{} VARCHAR, ", quote_ident(col)));
    }
    create_command.push_str(&format!("PRIMARY KEY ({}))", quote_ident(first)));
    Ok(create_command)
}

///
/// INSERT with named parameters
///
/// INSERT INTO "schema"."table" ("column1","column2") VALUES (:p_col0,:p_col1)
///
pub(crate) fn insert_statement(schema: &str, table_name: &str, columns: &[String]) -> anyhow::Result<String> {
    if columns.is_empty() {
        return Err(anyhow!("No column to insert into table [{}]", table_name));
    }
    let column_list = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(",");
    let value_list = (0..columns.len()).map(|i| format!(":{}", param_name(i))).collect::<Vec<_>>().join(",");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_table(schema, table_name),
        column_list,
        value_list
    ))
}

/// Parameters matching the insert_statement placeholders
pub(crate) fn insert_params(row_data: &[String]) -> HashMap<String, CellValue> {
    row_data
        .iter()
        .enumerate()
        .map(|(i, value)| (param_name(i), CellValue::from_raw_str(value)))
        .collect()
}

/// Every row of the table, each column read as text
pub(crate) fn select_all_statement(schema: &str, table_name: &str, columns: &[String]) -> anyhow::Result<String> {
    if columns.is_empty() {
        return Err(anyhow!("No column to select from table [{}]", table_name));
    }
    let column_list = columns
        .iter()
        .map(|c| format!("{0}::text AS {0}", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("SELECT {} FROM {}", column_list, qualified_table(schema, table_name)))
}

///
/// Match up the non empty cells with their columns.
/// Cells past the last column and columns past the last cell are ignored.
///
pub(crate) fn match_columns_data(column_names: &[String], row_data: &[String]) -> (Vec<String>, Vec<String>) {
    column_names
        .iter()
        .zip(row_data.iter())
        .filter(|(_, data)| !data.is_empty())
        .map(|(column, data)| (column.clone(), data.clone()))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn create_table() {
        let sql = create_table_statement("public", "cities", &strings(&["name", "country"])).unwrap();
        assert_eq!(
            r#"CREATE TABLE "public"."cities" ("name" VARCHAR, "country" VARCHAR, PRIMARY KEY ("name"))"#,
            sql
        );
    }

    #[test]
    fn create_table_needs_a_column() {
        assert!(create_table_statement("public", "cities", &[]).is_err());
    }

    #[test]
    fn insert_uses_placeholders_only() {
        let sql = insert_statement("public", "cities", &strings(&["name", "country"])).unwrap();
        assert_eq!(r#"INSERT INTO "public"."cities" ("name","country") VALUES (:p_col0,:p_col1)"#, sql);

        let params = insert_params(&strings(&["Lyon'); DROP TABLE x; --", "France"]));
        assert_eq!(2, params.len());
        assert_eq!(Some("Lyon'); DROP TABLE x; --".to_string()), params["p_col0"].inner_value_string());
        assert_eq!(Some("France".to_string()), params["p_col1"].inner_value_string());
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn insert_needs_a_column() {
        assert!(insert_statement("public", "cities", &[]).is_err());
    }

    #[test]
    fn select_all_casts_to_text() {
        let sql = select_all_statement("public", "cities", &strings(&["name", "pop"])).unwrap();
        assert_eq!(r#"SELECT "name"::text AS "name", "pop"::text AS "pop" FROM "public"."cities""#, sql);
        assert!(select_all_statement("public", "cities", &[]).is_err());
    }

    #[test]
    fn match_skips_empty_cells() {
        let columns = strings(&["a", "b", "c"]);
        let (cols, data) = match_columns_data(&columns, &strings(&["1", "", "3"]));
        assert_eq!(strings(&["a", "c"]), cols);
        assert_eq!(strings(&["1", "3"]), data);
    }

    #[test]
    fn match_ignores_extra_and_missing_cells() {
        let columns = strings(&["a", "b"]);
        let (cols, data) = match_columns_data(&columns, &strings(&["1", "2", "3"]));
        assert_eq!(strings(&["a", "b"]), cols);
        assert_eq!(strings(&["1", "2"]), data);

        let (cols, data) = match_columns_data(&columns, &strings(&["1"]));
        assert_eq!(strings(&["a"]), cols);
        assert_eq!(strings(&["1"]), data);

        let (cols, _) = match_columns_data(&columns, &strings(&["", ""]));
        assert!(cols.is_empty());
    }
}
