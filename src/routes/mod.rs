use actix_web::error::InternalError;
use actix_web::{HttpResponse, HttpResponseBuilder, web};

use crate::dto::ApiResponse;
use crate::services::ServiceError;

pub mod terminations;

/// HTTP status matching a service failure. A missing identity never reaches
/// the services; the extractor answers it with 401.
pub fn status_for(err: &ServiceError) -> HttpResponseBuilder {
    match err {
        ServiceError::Unauthorized => HttpResponse::Forbidden(),
        ServiceError::MissingField(_) | ServiceError::Validation(_) => HttpResponse::BadRequest(),
        ServiceError::NotFound => HttpResponse::NotFound(),
        ServiceError::Internal => HttpResponse::InternalServerError(),
    }
}

pub fn error_response(err: ServiceError) -> HttpResponse {
    status_for(&err).json(ApiResponse::failure(err.to_string()))
}

fn bad_request(message: String, err: actix_web::Error) -> actix_web::Error {
    InternalError::from_response(err, HttpResponse::BadRequest().json(ApiResponse::failure(message)))
        .into()
}

/// Registers the JSON API. Order matters: literal segments before `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        bad_request(err.to_string(), err.into())
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        bad_request(err.to_string(), err.into())
    }))
    .service(
        web::scope("/api/v1")
            .service(terminations::termination_stats)
            .service(terminations::termination_events)
            .service(terminations::export_terminations)
            .service(terminations::delete_terminations)
            .service(terminations::list_terminations)
            .service(terminations::add_termination)
            .service(terminations::show_termination)
            .service(terminations::update_termination),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn maps_service_errors_to_statuses() {
        let cases = [
            (ServiceError::Unauthorized, StatusCode::FORBIDDEN),
            (ServiceError::MissingField("reason"), StatusCode::BAD_REQUEST),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(err).status(), status);
        }
    }
}
