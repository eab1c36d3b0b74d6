use http::StatusCode;
use once_cell::sync::Lazy;

use crate::ErrorSet;

/// Upload page
pub static UPLOAD_PROMPT: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Upload a CSV file",
    http_error_code: StatusCode::OK.as_u16(),
});
pub static UPLOAD_SUCCESS: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Upload successful!",
    http_error_code: StatusCode::OK.as_u16(),
});
pub static PARTIAL_SUCCESS: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Partial success: Not all rows were successfully saved.",
    http_error_code: StatusCode::OK.as_u16(),
});
pub static NO_FILE_UPLOADED: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Please upload a CSV file",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static UPLOAD_READ_ERROR: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "The uploaded data could not be read",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static INVALID_DATASET_NAME: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Invalid dataset name",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static EMPTY_FILE: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "The file was empty",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static INVALID_CSV_CONTENT: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Invalid CSV content",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static INVALID_COLUMN_NAME: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Invalid column name",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static DATA_NOT_SAVED: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Data could not be saved.",
    http_error_code: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
});

/// Dataset store
pub static DATASET_ALREADY_EXISTS: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "This dataset already exists",
    http_error_code: StatusCode::CONFLICT.as_u16(),
});
pub static ID_ALREADY_EXISTS: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "UNIQUE constraint failed",
    http_error_code: StatusCode::CONFLICT.as_u16(),
});
pub static DUPLICATE_COLUMN_NAME: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Duplicate column name error",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static OPERATIONAL_ERROR: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Operational Error occurred",
    http_error_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
});
pub static INTEGRITY_ERROR: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Integrity Error occurred",
    http_error_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
});
pub static TABLE_NOT_FOUND: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Table is not in the database",
    http_error_code: StatusCode::NOT_FOUND.as_u16(),
});
pub static INSERT_CONSTRUCTION_ERROR: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "INSERT command construction error",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static NO_DATA_TO_INSERT: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "No data to insert",
    http_error_code: StatusCode::BAD_REQUEST.as_u16(),
});
pub static INTERNAL_DATABASE_ERROR: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Internal database error",
    http_error_code: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
});

/// Download page
pub static DATASET_UNAVAILABLE: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Unable to retrieve dataset",
    http_error_code: StatusCode::NOT_FOUND.as_u16(),
});

/// Generic
pub static PAGE_NOT_FOUND: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "The requested page couldn't be found.",
    http_error_code: StatusCode::NOT_FOUND.as_u16(),
});
pub static INTERNAL_TECHNICAL_ERROR: Lazy<ErrorSet> = Lazy::new(|| ErrorSet {
    err_message: "Internal technical error",
    http_error_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
});
