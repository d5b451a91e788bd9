pub mod error;
pub mod help;
pub mod response;

use actix_web::web::{JsonConfig, PathConfig};
use error::ApiError;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Extractor failures are rendered in the same envelope as handler errors.
    conf.app_data(JsonConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected JSON body: {}", err);
        ApiError::bad_request("Invalid Input detected.").into()
    }))
    .app_data(PathConfig::default().error_handler(|_err, _req| {
        ApiError::InvalidArgument("Invalid Id".to_owned()).into()
    }));

    help::configure(conf);
}
