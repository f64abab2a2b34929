use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::{
        domain::attempt::AttemptMode,
        dto::{
            request::{CreatePracticeSessionRequest, PaginationParams, SubmitAnswerRequest},
            response::CreateAttemptResponse,
        },
    },
};

// Paths are relative to the authenticated `/api` scope.

#[post("/tryouts/blueprints/{blueprint_id}/attempts")]
pub async fn create_tryout_attempt(
    state: web::Data<Arc<AppState>>,
    blueprint_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt_id = state
        .session_service
        .create_tryout_session(&blueprint_id, auth.user_id())
        .await?;
    Ok(HttpResponse::Created().json(CreateAttemptResponse { attempt_id }))
}

#[post("/practice/sets/{question_set_id}/attempts")]
pub async fn create_practice_attempt(
    state: web::Data<Arc<AppState>>,
    question_set_id: web::Path<String>,
    request: web::Json<CreatePracticeSessionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let attempt_id = state
        .session_service
        .create_practice_session(&question_set_id, auth.user_id(), request.time_mode)
        .await?;
    Ok(HttpResponse::Created().json(CreateAttemptResponse { attempt_id }))
}

#[post("/tryouts/attempts/{attempt_id}/sections/{section_index}/start")]
pub async fn start_section(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, u32)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (attempt_id, section_index) = path.into_inner();
    let response = state
        .session_service
        .start_section(&attempt_id, section_index, auth.user_id())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/tryouts/attempts/{attempt_id}/sections/{section_index}/end")]
pub async fn end_section(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, u32)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (attempt_id, section_index) = path.into_inner();
    let response = state
        .session_service
        .end_section(&attempt_id, section_index, auth.user_id())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/tryouts/attempts/{attempt_id}/items/{item_id}/answer")]
pub async fn submit_tryout_answer(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    submit_answer(state, path, request, auth, AttemptMode::Tryout).await
}

#[post("/practice/attempts/{attempt_id}/items/{item_id}/answer")]
pub async fn submit_practice_answer(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    submit_answer(state, path, request, auth, AttemptMode::Practice).await
}

async fn submit_answer(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitAnswerRequest>,
    auth: AuthenticatedUser,
    context: AttemptMode,
) -> Result<HttpResponse, AppError> {
    let (attempt_id, item_id) = path.into_inner();
    let request = request.into_inner();
    request.validate()?;

    let item = state
        .session_service
        .submit_answer(
            &attempt_id,
            &item_id,
            request.answer,
            request.time_spent_seconds,
            auth.user_id(),
            context,
        )
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

#[post("/attempts/{attempt_id}/finalize")]
pub async fn finalize_attempt(
    state: web::Data<Arc<AppState>>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let results = state
        .session_service
        .finalize(&attempt_id, auth.user_id())
        .await?;
    Ok(HttpResponse::Ok().json(results))
}

#[get("/attempts/{attempt_id}")]
pub async fn get_attempt(
    state: web::Data<Arc<AppState>>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .session_service
        .get_attempt(&attempt_id, auth.user_id())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/attempts")]
pub async fn list_attempts(
    state: web::Data<Arc<AppState>>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    pagination.validate()?;

    let response = state
        .session_service
        .list_attempts(auth.user_id(), pagination.offset(), pagination.limit())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
