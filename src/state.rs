use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth;
use crate::auth::service::TokenService;
use crate::chat::repository::MongoChatRepository;
use crate::chat::service::ChatService;
use crate::event::service::EventService;
use crate::integration::db;
use crate::integration::mail::{MailClient, Mailer};
use crate::integration::Config;
use crate::message::repository::MongoMessageRepository;
use crate::message::service::MessageService;
use crate::user::repository::MongoUserRepository;
use crate::user::service::UserService;
use crate::Result;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub user_service: UserService,
    pub chat_service: ChatService,
    pub message_service: MessageService,
    pub event_service: EventService,
}

impl AppState {
    pub async fn init(config: &Config) -> Result<Self> {
        let database = db::init(&config.mongo).await?;
        let mailer: Mailer = Arc::new(MailClient::new(&config.mail));

        let user_service = UserService::new(Arc::new(MongoUserRepository::new(&database)));

        let message_repository = Arc::new(MongoMessageRepository::new(&database));
        let chat_service = ChatService::new(
            Arc::new(MongoChatRepository::new(&database)),
            message_repository.clone(),
            user_service.clone(),
        );
        let message_service = MessageService::new(message_repository, chat_service.clone());

        let event_service = EventService::new(
            chat_service.clone(),
            message_service.clone(),
            user_service.clone(),
            mailer,
        );

        Ok(Self {
            auth_service: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl)),
            user_service,
            chat_service,
            message_service,
            event_service,
        })
    }
}
