use actix_web::{web, HttpResponse};

use crate::api::{ApiResponse, BookId, CreateBookRequest, UpdateRecordRequest};
use crate::handlers::{error_response, RepositoryData};

pub const NO_ISSUED_BOOKS_MESSAGE: &str = "No books have been issued yet";

pub async fn get_all_books(records_repository: RepositoryData) -> HttpResponse {
    match records_repository.list_books().await {
        Ok(books) => HttpResponse::Ok().json(ApiResponse::with_data(books)),
        Err(err) => error_response(err),
    }
}

pub async fn get_book(
    records_repository: RepositoryData,
    book_id: web::Path<BookId>,
) -> HttpResponse {
    match records_repository.get_book(&book_id).await {
        Ok(book) => HttpResponse::Ok().json(ApiResponse::with_data(book)),
        Err(err) => error_response(err),
    }
}

pub async fn add_book(
    records_repository: RepositoryData,
    request: web::Json<CreateBookRequest>,
) -> HttpResponse {
    let Some(book) = request.into_inner().into_book() else {
        return HttpResponse::BadRequest()
            .json(ApiResponse::failure(CreateBookRequest::MISSING_FIELDS_MESSAGE));
    };
    match records_repository.add_book(book).await {
        Ok(book) => {
            tracing::info!(book_id = %book.id, "Book created");
            HttpResponse::Created().json(ApiResponse::with_message_and_data(
                "Book created successfully",
                book,
            ))
        }
        Err(err) => error_response(err),
    }
}

pub async fn update_book(
    records_repository: RepositoryData,
    book_id: web::Path<BookId>,
    request: web::Json<UpdateRecordRequest>,
) -> HttpResponse {
    let patch = match request.into_inner().into_patch() {
        Ok(patch) => patch,
        Err(message) => return HttpResponse::BadRequest().json(ApiResponse::failure(message)),
    };
    match records_repository.update_book(&book_id, patch).await {
        Ok(books) => HttpResponse::Ok().json(ApiResponse::with_message_and_data(
            "Book updated successfully",
            books,
        )),
        Err(err) => error_response(err),
    }
}

pub async fn delete_book(
    records_repository: RepositoryData,
    book_id: web::Path<BookId>,
) -> HttpResponse {
    match records_repository.delete_book(&book_id).await {
        Ok(books) => {
            tracing::info!(book_id = %book_id, "Book deleted");
            HttpResponse::Ok().json(ApiResponse::with_message_and_data(
                "Book deleted successfully",
                books,
            ))
        }
        Err(err) => error_response(err),
    }
}

pub async fn get_issued_books(records_repository: RepositoryData) -> HttpResponse {
    match records_repository.list_issued_books().await {
        Ok(books) if books.is_empty() => {
            HttpResponse::NotFound().json(ApiResponse::failure(NO_ISSUED_BOOKS_MESSAGE))
        }
        Ok(books) => HttpResponse::Ok().json(ApiResponse::with_data(books)),
        Err(err) => error_response(err),
    }
}
