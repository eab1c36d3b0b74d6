use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use handlebars::Handlebars;
use serde::Serialize;

use commons_error::*;
use dcdto::error_codes::{INTERNAL_TECHNICAL_ERROR, PAGE_NOT_FOUND};
use dcdto::{DatasetEntry, DownloadPage, ErrorSet, MessagePage};

const UPLOAD_TITLE: &str = "Upload data";
const DOWNLOAD_TITLE: &str = "Please select a dataset to download";
const NOT_FOUND_TITLE: &str = "Sorry!";
const DOWNLOAD_HEADER: [&str; 2] = ["Table name", "Filename"];

const INDEX_TEMPLATE: &str = "index";
const DOWNLOAD_TEMPLATE: &str = "download";
const NOT_FOUND_TEMPLATE: &str = "page_not_found";

/// The html pages of the application, templates are compiled into the binary
pub(crate) struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> anyhow::Result<Self> {
        let mut hb = Handlebars::new();

        hb.register_partial("header", include_str!("../templates/header.hbs"))
            .map_err(err_fwd!("💣 Cannot register the header partial"))?;
        hb.register_partial("footer", include_str!("../templates/footer.hbs"))
            .map_err(err_fwd!("💣 Cannot register the footer partial"))?;
        hb.register_template_string(INDEX_TEMPLATE, include_str!("../templates/index.hbs"))
            .map_err(err_fwd!("💣 Cannot register the index template"))?;
        hb.register_template_string(DOWNLOAD_TEMPLATE, include_str!("../templates/download.hbs"))
            .map_err(err_fwd!("💣 Cannot register the download template"))?;
        hb.register_template_string(NOT_FOUND_TEMPLATE, include_str!("../templates/page_not_found.hbs"))
            .map_err(err_fwd!("💣 Cannot register the page_not_found template"))?;

        Ok(Self { registry: hb })
    }

    /// Upload form, with the outcome of the last upload as message
    pub fn upload_page(&self, status: &ErrorSet) -> Response {
        let data = MessagePage { title: UPLOAD_TITLE.to_string(), message: status.err_message.to_string() };
        self.render(INDEX_TEMPLATE, &data, status.http_error_code)
    }

    pub fn download_page(&self, output: Vec<DatasetEntry>, error: Option<&ErrorSet>) -> Response {
        let data = DownloadPage {
            title: DOWNLOAD_TITLE.to_string(),
            message: error.map(|e| e.err_message.to_string()),
            header: DOWNLOAD_HEADER.iter().map(|h| h.to_string()).collect(),
            output,
        };
        self.render(DOWNLOAD_TEMPLATE, &data, error.map(|e| e.http_error_code).unwrap_or(200))
    }

    pub fn not_found_page(&self) -> Response {
        let data = MessagePage { title: NOT_FOUND_TITLE.to_string(), message: PAGE_NOT_FOUND.err_message.to_string() };
        self.render(NOT_FOUND_TEMPLATE, &data, PAGE_NOT_FOUND.http_error_code)
    }

    fn render<T: Serialize>(&self, template: &str, data: &T, http_code: u16) -> Response {
        let status = StatusCode::from_u16(http_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.registry.render(template, data) {
            Ok(rendered) => (status, Html(rendered)).into_response(),
            Err(e) => {
                log_error!("💣 Cannot render the page, template=[{}], error=[{}]", template, e);
                let status = StatusCode::from_u16(INTERNAL_TECHNICAL_ERROR.http_error_code)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, INTERNAL_TECHNICAL_ERROR.err_message).into_response()
            }
        }
    }
}
