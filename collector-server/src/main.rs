use std::process::exit;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde_derive::Deserialize;
use tower_http::services::ServeDir;

use commons_error::*;
use commons_pg::init_db_pool;
use dcconfig::conf_reader::{override_from_env, read_config, read_env};
use dcconfig::properties::{get_prop_pg_connect_string, get_prop_value, get_prop_value_or, set_prop_values};
use dcconfig::property_name::{
    DB_SCHEMA_PROPERTY, ENV_OVERRIDES, LOG_CONFIG_FILE_PROPERTY, MAX_UPLOAD_SIZE_PROPERTY, SERVER_HOST_PROPERTY,
    SERVER_PORT_PROPERTY, STATIC_DIR_PROPERTY,
};
use dcdto::error_codes::{DATASET_UNAVAILABLE, UPLOAD_PROMPT, UPLOAD_READ_ERROR};

use crate::dataset_store::{DatasetStore, PgDatasetStore};
use crate::downloader::DownloadDelegate;
use crate::schema::init_schema;
use crate::uploader::{UploadDelegate, UploadedFile};
use crate::views::Views;
use crate::x_request_id::XRequestID;

mod dataset_sql;
mod dataset_store;
mod downloader;
mod identifier;
mod schema;
mod uploader;
mod views;
mod x_request_id;

#[cfg(test)]
mod mem_store;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5555;
const DEFAULT_SCHEMA: &str = "public";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Name of the submit button, a POST without it only shows the form
const SUBMIT_FIELD: &str = "uploadData";

#[derive(Clone)]
pub(crate) struct AppState {
    pub store: Arc<dyn DatasetStore>,
    pub views: Arc<Views>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct DownloadQuery {
    dataset: Option<String>,
}

/// 🌟 Upload form
///
/// GET /
async fn upload_page(State(state): State<AppState>) -> Response {
    state.views.upload_page(&UPLOAD_PROMPT)
}

/// 🌟 Upload a CSV file, it becomes a dataset table
///
/// POST /
async fn upload(State(state): State<AppState>, x_request_id: XRequestID, multipart: Option<Multipart>) -> Response {
    let Some(multipart) = multipart else {
        return state.views.upload_page(&UPLOAD_PROMPT);
    };

    let (submitted, uploaded_file) = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            log_error!("💣 Cannot read the upload form, error=[{}], x_request_id=[{}]", e, x_request_id);
            return state.views.upload_page(&UPLOAD_READ_ERROR);
        }
    };

    if !submitted {
        return state.views.upload_page(&UPLOAD_PROMPT);
    }

    let delegate = UploadDelegate::new(state.store.clone(), x_request_id);
    let outcome = delegate.upload(uploaded_file).await;
    state.views.upload_page(outcome.status)
}

///
/// Walk through the form fields.
/// Tell if the submit button is there and keep the first file field, even without a filename.
///
async fn read_upload_form(mut multipart: Multipart) -> Result<(bool, Option<UploadedFile>), MultipartError> {
    let mut submitted = false;
    let mut uploaded_file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(SUBMIT_FIELD) {
            submitted = true;
            continue;
        }

        let filename = match field.file_name() {
            Some(f) => base_filename(f).to_owned(),
            None => continue,
        };

        if uploaded_file.is_none() {
            let content = field.bytes().await?.to_vec();
            uploaded_file = Some(UploadedFile { filename, content });
        }
    }

    Ok((submitted, uploaded_file))
}

/// Some browsers send the full path of the file
fn base_filename(filename: &str) -> &str {
    filename.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(filename)
}

/// 🌟 GET /index and /home
async fn home() -> Redirect {
    Redirect::to("/")
}

/// 🌟 List the datasets, or send one of them back as CSV
///
/// GET /download?dataset=<table_name>
async fn download(
    State(state): State<AppState>,
    x_request_id: XRequestID,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let delegate = DownloadDelegate::new(state.store.clone(), x_request_id);

    let Some(dataset_name) = query.dataset.filter(|d| !d.is_empty()) else {
        return state.views.download_page(delegate.list_datasets().await, None);
    };

    match delegate.download_dataset(&dataset_name).await {
        Some(csv_file) => csv_file.into_response(),
        None => state.views.download_page(delegate.list_datasets().await, Some(&*DATASET_UNAVAILABLE)),
    }
}

/// 🌟 Any other path
async fn page_not_found(State(state): State<AppState>) -> Response {
    state.views.not_found_page()
}

pub(crate) fn build_router(state: AppState, max_upload_size: usize, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(upload_page).post(upload))
        .route("/upload", get(upload_page).post(upload))
        .route("/index", get(home))
        .route("/home", get(home))
        .route("/download", get(download))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(page_not_found)
        .layer(DefaultBodyLimit::max(max_upload_size))
        .with_state(state)
}

/// The server port, default port when missing or invalid
fn parse_port(value: &str) -> u16 {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => DEFAULT_PORT,
    }
}

fn parse_max_upload_size(value: &str) -> usize {
    value.trim().parse::<usize>().ok().filter(|s| *s > 0).unwrap_or(DEFAULT_MAX_UPLOAD_SIZE)
}

#[tokio::main]
async fn main() {
    const PROGRAM_NAME: &str = "Data Collector";

    println!("😎 Init {}", PROGRAM_NAME);

    const PROJECT_CODE: &str = "collector-server";
    const VAR_NAME: &str = "DC_ENV";

    // Read the application config's file
    println!("😎 Config file using PROJECT_CODE={} VAR_NAME={}", PROJECT_CODE, VAR_NAME);

    let mut props = match read_config(PROJECT_CODE, &read_env(VAR_NAME)) {
        Ok(props) => props,
        Err(e) => {
            eprintln!("💣 Cannot read the config file, error=[{}]", e);
            exit(-55);
        }
    };
    override_from_env(&mut props, ENV_OVERRIDES);
    set_prop_values(props);

    let host = get_prop_value_or(SERVER_HOST_PROPERTY, DEFAULT_HOST);
    let port = parse_port(&get_prop_value_or(SERVER_PORT_PROPERTY, ""));

    let Ok(log_config) = get_prop_value(LOG_CONFIG_FILE_PROPERTY) else {
        eprintln!("💣 Cannot read the log4rs config");
        exit(-57);
    };

    let log_config_path = std::path::Path::new(&log_config);

    println!("😎 Read log properties from {:?}", &log_config_path);

    if let Err(e) = log4rs::init_file(log_config_path, Default::default()) {
        eprintln!("{:?} {:?}", &log_config_path, e);
        exit(-59);
    }

    // Init DB pool
    let (connect_string, db_pool_size) =
        match get_prop_pg_connect_string().map_err(err_fwd!("Cannot read the database connection information")) {
            Ok(x) => x,
            Err(e) => {
                log_error!("{:?}", e);
                exit(-64);
            }
        };

    if init_db_pool(&connect_string, db_pool_size).await.is_err() {
        log_error!("💣 Cannot connect to the database");
        exit(-65);
    }

    let schema = get_prop_value_or(DB_SCHEMA_PROPERTY, DEFAULT_SCHEMA);
    if init_schema(&schema).await.is_err() {
        log_error!("💣 Cannot prepare the schema, schema=[{}]", &schema);
        exit(-66);
    }

    let Ok(views) = Views::new() else {
        log_error!("💣 Cannot load the page templates");
        exit(-67);
    };

    let max_upload_size = parse_max_upload_size(&get_prop_value_or(MAX_UPLOAD_SIZE_PROPERTY, ""));
    let static_dir = get_prop_value_or(STATIC_DIR_PROPERTY, DEFAULT_STATIC_DIR);

    let state = AppState { store: Arc::new(PgDatasetStore::new(&schema)), views: Arc::new(views) };
    let app = build_router(state, max_upload_size, &static_dir);

    log_info!("🚀 Start {} on {}:{}", PROGRAM_NAME, &host, port);

    let listener = match tokio::net::TcpListener::bind((host.as_str(), port)).await {
        Ok(listener) => listener,
        Err(e) => {
            log_error!("💣 Cannot bind the server address, host=[{}], port=[{}], error=[{}]", &host, port, e);
            exit(-68);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log_error!("💣 Server stopped, error=[{}]", e);
    }

    log_info!("🏁 End {}", PROGRAM_NAME);
}
