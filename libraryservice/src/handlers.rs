use std::sync::Arc;

use actix_web::web::Data;
use actix_web::HttpResponse;

use crate::api::{ApiResponse, WELCOME_MESSAGE};
use crate::records_repository::{RecordsRepository, RecordsRepositoryError};

pub mod books;
pub mod users;

pub type RepositoryData = Data<Arc<dyn RecordsRepository>>;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::message(WELCOME_MESSAGE))
}

fn error_response(err: RecordsRepositoryError) -> HttpResponse {
    let body = ApiResponse::failure(err.to_string());
    match err {
        RecordsRepositoryError::BookNotFound(_) | RecordsRepositoryError::UserNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        RecordsRepositoryError::BookAlreadyExists(_)
        | RecordsRepositoryError::UserAlreadyExists(_) => HttpResponse::Conflict().json(body),
        RecordsRepositoryError::InvalidUpdate(_) => HttpResponse::BadRequest().json(body),
        RecordsRepositoryError::DanglingIssuedBook { .. } => {
            tracing::error!("Records are inconsistent: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}
