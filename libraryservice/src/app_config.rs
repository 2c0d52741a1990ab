use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};

use crate::api::ApiResponse;
use crate::handlers;
use crate::handlers::{books, users};

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::resource("/").route(web::get().to(handlers::home)))
        .service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/books")
                // literal path has to be registered before `/{book_id}`
                .service(
                    web::resource("/issued-books/for-users")
                        .route(web::get().to(books::get_issued_books)),
                )
                .service(
                    web::resource("")
                        .route(web::get().to(books::get_all_books))
                        .route(web::post().to(books::add_book)),
                )
                .service(
                    web::resource("/{book_id}")
                        .route(web::get().to(books::get_book))
                        .route(web::put().to(books::update_book))
                        .route(web::delete().to(books::delete_book)),
                ),
        )
        .service(
            web::scope("/users")
                .service(
                    web::resource("/subscription-details/{user_id}")
                        .route(web::get().to(users::get_subscription_details)),
                )
                .service(
                    web::resource("")
                        .route(web::get().to(users::get_all_users))
                        .route(web::post().to(users::add_user)),
                )
                .service(
                    web::resource("/{user_id}")
                        .route(web::get().to(users::get_user))
                        .route(web::put().to(users::update_user))
                        .route(web::delete().to(users::delete_user)),
                ),
        );
}

/// Malformed bodies are answered with the usual failure envelope
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _request| {
        let response =
            HttpResponse::BadRequest().json(ApiResponse::failure(format!("Invalid body: {}", err)));
        InternalError::from_response(err, response).into()
    })
}
