use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use crate::chat;
use crate::model::Pagination;
use crate::user;

use super::model::MessageDto;
use super::service::MessageService;

pub async fn find_by_chat(
    Extension(sub): Extension<user::Id>,
    State(message_service): State<MessageService>,
    Path(chat_id): Path<chat::Id>,
    Query(pagination): Query<Pagination>,
) -> crate::Result<Json<Vec<MessageDto>>> {
    let messages = message_service
        .find_by_chat_for(&chat_id, &sub, pagination)
        .await?;

    Ok(Json(messages))
}
