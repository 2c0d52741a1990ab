use actix_web::{web, HttpResponse};

use crate::api::{ApiResponse, CreateUserRequest, UpdateRecordRequest, UserId};
use crate::handlers::{error_response, RepositoryData};
use crate::subscription::subscription_details;

pub async fn get_all_users(records_repository: RepositoryData) -> HttpResponse {
    match records_repository.list_users().await {
        Ok(users) => HttpResponse::Ok().json(ApiResponse::with_data(users)),
        Err(err) => error_response(err),
    }
}

pub async fn get_user(
    records_repository: RepositoryData,
    user_id: web::Path<UserId>,
) -> HttpResponse {
    match records_repository.get_user(&user_id).await {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::with_data(user)),
        Err(err) => error_response(err),
    }
}

pub async fn add_user(
    records_repository: RepositoryData,
    request: web::Json<CreateUserRequest>,
) -> HttpResponse {
    let Some(user) = request.into_inner().into_user() else {
        return HttpResponse::BadRequest()
            .json(ApiResponse::failure(CreateUserRequest::MISSING_FIELDS_MESSAGE));
    };
    match records_repository.add_user(user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User created");
            HttpResponse::Created().json(ApiResponse::with_message_and_data(
                "User created successfully",
                user,
            ))
        }
        Err(err) => error_response(err),
    }
}

pub async fn update_user(
    records_repository: RepositoryData,
    user_id: web::Path<UserId>,
    request: web::Json<UpdateRecordRequest>,
) -> HttpResponse {
    let patch = match request.into_inner().into_patch() {
        Ok(patch) => patch,
        Err(message) => return HttpResponse::BadRequest().json(ApiResponse::failure(message)),
    };
    match records_repository.update_user(&user_id, patch).await {
        Ok(users) => HttpResponse::Ok().json(ApiResponse::with_message_and_data(
            "User updated successfully",
            users,
        )),
        Err(err) => error_response(err),
    }
}

pub async fn delete_user(
    records_repository: RepositoryData,
    user_id: web::Path<UserId>,
) -> HttpResponse {
    match records_repository.delete_user(&user_id).await {
        Ok(users) => {
            tracing::info!(user_id = %user_id, "User deleted");
            HttpResponse::Ok().json(ApiResponse::with_message_and_data(
                "User deleted successfully",
                users,
            ))
        }
        Err(err) => error_response(err),
    }
}

pub async fn get_subscription_details(
    records_repository: RepositoryData,
    user_id: web::Path<UserId>,
) -> HttpResponse {
    let user = match records_repository.get_user(&user_id).await {
        Ok(user) => user,
        Err(err) => return error_response(err),
    };
    match subscription_details(&user, chrono::Utc::now()) {
        Ok(details) => HttpResponse::Ok().json(ApiResponse::with_data(details)),
        Err(err) => {
            tracing::warn!(user_id = %user.id, "Cannot compute subscription details: {}", err);
            HttpResponse::BadRequest().json(ApiResponse::failure(err.to_string()))
        }
    }
}
