use std::collections::HashMap;

pub mod sql_transaction;

pub use sql_transaction::{init_db_pool, SQLChange, SQLConnection, SQLQueryBlock, SQLTransaction};

/// SQLSTATE codes the services branch on.
pub const UNIQUE_VIOLATION: &str = "23505";
pub const DUPLICATE_TABLE: &str = "42P07";
pub const DUPLICATE_COLUMN: &str = "42701";

/// Extract the SQLSTATE code of a database error forwarded as an anyhow::Error.
/// None if the error did not come from the database server.
pub fn sql_state(e: &anyhow::Error) -> Option<String> {
    let sqlx_error = e.downcast_ref::<sqlx::Error>()?;
    let db_error = sqlx_error.as_database_error()?;
    db_error.code().map(|c| c.into_owned())
}

/// A value bound to a query or read from a row
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    String(Option<String>),
}

impl CellValue {
    pub fn inner_value_string(&self) -> Option<String> {
        match self {
            CellValue::String(val) => val.clone(),
        }
    }

    pub fn from_raw_str(text: &str) -> Self {
        CellValue::String(Some(text.to_owned()))
    }

    pub fn from_raw_string(text: String) -> Self {
        CellValue::String(Some(text))
    }
}

/// Rows read by a SQLQueryBlock, walked with a cursor.
#[derive(Clone, Debug)]
pub struct SQLDataSet {
    // 0 before the first call to next()
    position: usize,
    data: Vec<HashMap<String, CellValue>>,
}

impl SQLDataSet {
    pub(crate) fn from_rows(data: Vec<HashMap<String, CellValue>>) -> Self {
        Self { position: 0, data }
    }

    pub fn next(&mut self) -> bool {
        if self.position < self.data.len() {
            self.position += 1;
            return true;
        }
        false
    }

    fn current_cell(&self, col_name: &str) -> Option<&CellValue> {
        if self.position < 1 || self.position > self.data.len() {
            return None;
        }
        self.data.get(self.position - 1)?.get(col_name)
    }

    pub fn get_string(&self, col_name: &str) -> Option<String> {
        self.current_cell(col_name)?.inner_value_string()
    }
}

/// Rewrite the :p_name placeholders into $1, $2... and give the values in the matching order.
///
/// The longest names are replaced first, so :p_col1 never eats the head of :p_col10.
pub(crate) fn parse_query(string_template: &str, params: &HashMap<String, CellValue>) -> (String, Vec<CellValue>) {
    let mut names: Vec<&String> = params.keys().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut new_sql_string = string_template.to_string();
    let mut v_params: Vec<CellValue> = Vec::with_capacity(names.len());

    for (index, param_name) in names.into_iter().enumerate() {
        let from = format!(":{}", param_name);
        let to = format!("${}", index + 1);
        new_sql_string = new_sql_string.replace(&from, to.as_str());
        v_params.push(params[param_name].clone());
    }

    (new_sql_string, v_params)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{parse_query, sql_state, CellValue, SQLDataSet};

    #[test]
    fn parse_query_numbers_the_parameters() {
        let mut params = HashMap::new();
        params.insert("p_table_name".to_owned(), CellValue::from_raw_str("cities"));
        params.insert("p_filename".to_owned(), CellValue::from_raw_str("cities.csv"));

        let (sql, values) = parse_query(
            "INSERT INTO t (table_name, filename) VALUES (:p_table_name, :p_filename)",
            &params,
        );

        assert_eq!("INSERT INTO t (table_name, filename) VALUES ($1, $2)", sql);
        assert_eq!(
            vec![CellValue::from_raw_str("cities"), CellValue::from_raw_str("cities.csv")],
            values
        );
    }

    #[test]
    fn parse_query_handles_prefixed_names() {
        let mut params = HashMap::new();
        for i in 0..12 {
            params.insert(format!("p_col{}", i), CellValue::from_raw_string(format!("v{}", i)));
        }
        let template = (0..12).map(|i| format!(":p_col{}", i)).collect::<Vec<_>>().join(",");

        let (sql, values) = parse_query(&template, &params);

        // Every placeholder must point to the value of its own name
        let positions: Vec<usize> = sql
            .split(',')
            .map(|p| p.trim_start_matches('$').parse::<usize>().unwrap())
            .collect();
        for (i, pos) in positions.iter().enumerate() {
            assert_eq!(Some(format!("v{}", i)), values[pos - 1].inner_value_string());
        }
    }

    #[test]
    fn parse_query_without_params_is_untouched() {
        let (sql, values) = parse_query("SELECT \"a\"::text AS \"a\" FROM t", &HashMap::new());
        assert_eq!("SELECT \"a\"::text AS \"a\" FROM t", sql);
        assert!(values.is_empty());
    }

    #[test]
    fn dataset_cursor() {
        let mut row = HashMap::new();
        row.insert("name".to_owned(), CellValue::from_raw_str("Lyon"));
        row.insert("country".to_owned(), CellValue::String(None));
        let mut ds = SQLDataSet::from_rows(vec![row]);

        assert_eq!(None, ds.get_string("name"));
        assert!(ds.next());
        assert_eq!(Some("Lyon".to_owned()), ds.get_string("name"));
        assert_eq!(None, ds.get_string("country"));
        assert_eq!(None, ds.get_string("unknown"));
        assert!(!ds.next());
        assert_eq!(None, ds.get_string("name"));
    }

    #[test]
    fn sql_state_of_a_non_database_error() {
        let e = anyhow::anyhow!("not a database error");
        assert_eq!(None, sql_state(&e));

        let e: anyhow::Error = sqlx::Error::RowNotFound.into();
        assert_eq!(None, sql_state(&e));
    }
}
