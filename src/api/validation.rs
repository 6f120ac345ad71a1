use super::error::PageError;
use crate::pages::form::validation_messages;

fn deserialize_message(err: &str) -> String {
    if err.contains("unknown variant") {
        "Invalid choice. Check allowed values for this field".to_string()
    } else if err.contains("invalid digit") || err.contains("number too large") {
        "Invalid number in request".to_string()
    } else if err.contains("invalid value") {
        "Invalid value in request parameters".to_string()
    } else {
        "Invalid request parameters".to_string()
    }
}

/// Turn extractor failures into an HTML 400 page listing what was wrong
fn to_page_error(err: actix_web_validator::Error) -> actix_web::Error {
    let messages = match err {
        actix_web_validator::Error::Validate(validation_errors) => {
            validation_messages(&validation_errors)
        }
        actix_web_validator::Error::Deserialize(de_err) => {
            vec![deserialize_message(&de_err.to_string())]
        }
        _ => vec!["Validation error".to_string()],
    };
    PageError::BadRequest(messages).into()
}

/// Query string config shared by every page route
pub fn query_config() -> actix_web_validator::QueryConfig {
    actix_web_validator::QueryConfig::default().error_handler(|err, _req| to_page_error(err))
}

/// Form body config for the mutation routes
pub fn form_config() -> actix_web_validator::FormConfig {
    actix_web_validator::FormConfig::default().error_handler(|err, _req| to_page_error(err))
}
