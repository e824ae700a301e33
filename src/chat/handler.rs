use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::model::Pagination;
use crate::user;

use super::service::ChatService;
use super::Id;

// The computed counts are cheap but called eagerly by clients; short private
// caching bounds the load without a server-side counter.
const CHATS_CACHE_CONTROL: &str = "private, max-age=10";
const UNREAD_CACHE_CONTROL: &str = "private, max-age=5";

#[derive(Deserialize)]
pub struct CreateParams {
    recipient: user::Id,
    product: Option<String>,
    title: Option<String>,
}

pub async fn create(
    Extension(sub): Extension<user::Id>,
    State(chat_service): State<ChatService>,
    Json(params): Json<CreateParams>,
) -> crate::Result<impl IntoResponse> {
    let chat = chat_service
        .find_or_create(&sub, &params.recipient, params.product, params.title)
        .await?;

    Ok(Json(chat))
}

pub async fn find_all(
    Extension(sub): Extension<user::Id>,
    State(chat_service): State<ChatService>,
    Query(pagination): Query<Pagination>,
) -> crate::Result<impl IntoResponse> {
    let chats = chat_service.find_all_for(&sub, pagination).await?;

    Ok((
        [(header::CACHE_CONTROL, CHATS_CACHE_CONTROL)],
        Json(chats),
    ))
}

pub async fn find_one(
    Extension(sub): Extension<user::Id>,
    State(chat_service): State<ChatService>,
    Path(id): Path<Id>,
) -> crate::Result<impl IntoResponse> {
    let chat = chat_service.find_one_for(&id, &sub).await?;
    Ok(Json(chat))
}

#[derive(Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

pub async fn unread_count(
    Extension(sub): Extension<user::Id>,
    State(chat_service): State<ChatService>,
) -> crate::Result<impl IntoResponse> {
    let unread_count = chat_service.unread_count_for(&sub).await?;

    Ok((
        [(header::CACHE_CONTROL, UNREAD_CACHE_CONTROL)],
        Json(UnreadCount { unread_count }),
    ))
}
