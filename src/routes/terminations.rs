use actix_web::http::header;
use actix_web::{HttpResponse, Responder, get, post, web};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::auth::AuthenticatedUser;
use crate::broadcast::TerminationBroadcaster;
use crate::domain::dates::CalendarDate;
use crate::dto::ApiResponse;
use crate::dto::terminations::TerminationDto;
use crate::forms::terminations::{
    AddTerminationForm, DeleteTerminationsForm, ExportTerminationsForm, ListTerminationsForm,
    UpdateTerminationForm,
};
use crate::repository::DieselRepository;
use crate::routes::{error_response, status_for};
use crate::services::export::export_terminations as export_terminations_service;
use crate::services::terminations::{
    UpdateOutcome, add_termination as add_termination_service,
    delete_terminations as delete_terminations_service,
    show_termination as show_termination_service,
    show_termination_stats as show_termination_stats_service,
    show_terminations as show_terminations_service, subscribe_refreshes,
    update_termination as update_termination_service,
};

/// Reconnect delay suggested to `EventSource` clients, in milliseconds.
const SSE_RETRY_MS: u32 = 3000;

#[get("/terminations/stats")]
pub async fn termination_stats(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match show_termination_stats_service(&user, repo.get_ref(), CalendarDate::today()) {
        Ok(stats) => HttpResponse::Ok().json(ApiResponse::ok(stats)),
        Err(err) => error_response(err),
    }
}

#[get("/terminations")]
pub async fn list_terminations(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(form): web::Query<ListTerminationsForm>,
) -> impl Responder {
    match show_terminations_service(form, &user, repo.get_ref(), CalendarDate::today()) {
        Ok(terminations) => {
            let count = terminations.len();
            HttpResponse::Ok().json(ApiResponse::ok(terminations).with_count(count))
        }
        Err(err) => status_for(&err).json(ApiResponse::<Vec<TerminationDto>>::empty_list(
            err.to_string(),
        )),
    }
}

#[get("/terminations/events")]
pub async fn termination_events(
    user: AuthenticatedUser,
    broadcaster: web::Data<TerminationBroadcaster>,
) -> impl Responder {
    let receiver = match subscribe_refreshes(&user, broadcaster.get_ref()) {
        Ok(receiver) => receiver,
        Err(err) => return error_response(err),
    };

    let events = BroadcastStream::new(receiver).filter_map(|message| match message {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok::<_, actix_web::Error>(web::Bytes::from(format!(
                "event: refresh\ndata: {json}\n\n"
            )))),
            Err(e) => {
                log::error!("Failed to serialize refresh event: {e}");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            log::warn!("Refresh subscriber lagged behind by {skipped} events");
            None
        }
    });
    let stream = tokio_stream::once(Ok(web::Bytes::from(format!(
        "retry: {SSE_RETRY_MS}\n\n"
    ))))
    .chain(events);

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}

#[get("/terminations/export")]
pub async fn export_terminations(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(form): web::Query<ExportTerminationsForm>,
) -> impl Responder {
    match export_terminations_service(form, &user, repo.get_ref(), CalendarDate::today()) {
        Ok(file) => HttpResponse::Ok()
            .append_header((header::CONTENT_TYPE, file.content_type))
            .append_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ))
            .body(file.bytes),
        Err(err) => error_response(err),
    }
}

#[get("/terminations/{termination_id}")]
pub async fn show_termination(
    termination_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match show_termination_service(&termination_id, &user, repo.get_ref()) {
        Ok(termination) => HttpResponse::Ok().json(ApiResponse::ok(termination)),
        Err(err) => error_response(err),
    }
}

#[post("/terminations")]
pub async fn add_termination(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    broadcaster: web::Data<TerminationBroadcaster>,
    web::Json(form): web::Json<AddTerminationForm>,
) -> impl Responder {
    match add_termination_service(form, &user, repo.get_ref(), broadcaster.get_ref()) {
        Ok(termination) => HttpResponse::Ok()
            .json(ApiResponse::ok(termination).with_message("Termination created successfully")),
        Err(err) => error_response(err),
    }
}

#[post("/terminations/{termination_id}/update")]
pub async fn update_termination(
    termination_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    broadcaster: web::Data<TerminationBroadcaster>,
    web::Json(mut form): web::Json<UpdateTerminationForm>,
) -> impl Responder {
    form.termination_id = Some(termination_id.into_inner());

    match update_termination_service(form, &user, repo.get_ref(), broadcaster.get_ref()) {
        Ok(UpdateOutcome::Updated(termination)) => HttpResponse::Ok()
            .json(ApiResponse::ok(termination).with_message("Termination updated successfully")),
        Ok(UpdateOutcome::Unchanged(termination)) => {
            HttpResponse::Ok().json(ApiResponse::ok(termination).with_message("No changes were made"))
        }
        Err(err) => error_response(err),
    }
}

#[post("/terminations/delete")]
pub async fn delete_terminations(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    broadcaster: web::Data<TerminationBroadcaster>,
    web::Json(form): web::Json<DeleteTerminationsForm>,
) -> impl Responder {
    match delete_terminations_service(form, &user, repo.get_ref(), broadcaster.get_ref()) {
        Ok(deleted) => {
            let message = format!("Deleted {} terminations", deleted.deleted_count);
            HttpResponse::Ok().json(ApiResponse::ok(deleted).with_message(message))
        }
        Err(err) => error_response(err),
    }
}
