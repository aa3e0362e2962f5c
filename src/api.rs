use actix_web::{
    http::header,
    middleware::DefaultHeaders,
    web::{JsonConfig, PathConfig, QueryConfig, ServiceConfig},
};

use crate::error::Error;

pub mod broadcast;
pub mod device;
pub mod history;

pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOWED_METHODS: &str = "GET, POST, PATCH, OPTIONS";

/// Permissive cross-origin headers, added to every response including errors.
pub fn cors() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
}

/// Registers every route along with extractor configs that report failures as JSON errors.
pub fn configure(cfg: &mut ServiceConfig) {
    let json_cfg = JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, _| Error::invalid_parameter(err.to_string()).into());

    let path_cfg =
        PathConfig::default().error_handler(|err, _| Error::not_found(err.to_string()).into());

    let query_cfg = QueryConfig::default()
        .error_handler(|err, _| Error::invalid_parameter(err.to_string()).into());

    cfg.app_data(json_cfg)
        .app_data(path_cfg)
        .app_data(query_cfg)
        .service(device::service())
        .service(broadcast::service())
        .service(history::service());
}
