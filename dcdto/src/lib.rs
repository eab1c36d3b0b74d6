use serde_derive::{Deserialize, Serialize};

pub mod error_codes;

///
/// Commons DTO
///

/// A user facing message and the http status that goes with it
#[derive(Debug, PartialEq, Eq)]
pub struct ErrorSet<'a> {
    pub err_message: &'a str,
    pub http_error_code: u16,
}

///
/// Dataset DTO
///

/// One entry of the table index: the table holding the data and the file it came from
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DatasetEntry {
    pub table_name: String,
    pub filename: String,
}

///
/// Page models, handed to the templates
///

#[derive(Serialize, Debug)]
pub struct MessagePage {
    pub title: String,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct DownloadPage {
    pub title: String,
    pub message: Option<String>,
    pub header: Vec<String>,
    pub output: Vec<DatasetEntry>,
}
