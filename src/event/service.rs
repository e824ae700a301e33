use log::{debug, error};

use crate::chat::service::ChatService;
use crate::integration::mail::{Mail, Mailer};
use crate::message::service::MessageService;
use crate::user;
use crate::user::service::UserService;

use super::context;
use super::model::{Command, Notification, RoomEvent};
use super::presence::PresenceRegistry;
use super::rooms::RoomRegistry;
use super::Result;

/// Coordinates room traffic for every live connection. Transport-independent:
/// the gateway feeds it parsed commands, it talks back through the connection
/// context and the room/presence registries.
#[derive(Clone)]
pub struct EventService {
    chat_service: ChatService,
    message_service: MessageService,
    user_service: UserService,
    presence: PresenceRegistry,
    rooms: RoomRegistry,
    mailer: Mailer,
}

impl EventService {
    pub fn new(
        chat_service: ChatService,
        message_service: MessageService,
        user_service: UserService,
        mailer: Mailer,
    ) -> Self {
        Self {
            chat_service,
            message_service,
            user_service,
            presence: PresenceRegistry::new(),
            rooms: RoomRegistry::new(),
            mailer,
        }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }
}

impl EventService {
    /// Executes one client command. Failures are returned to the gateway,
    /// which relays them to the offending connection only; nothing is
    /// mutated or broadcast on a failed command.
    pub async fn handle_command(&self, ctx: &context::Ws, command: Command) -> Result<()> {
        debug!("handling command: {command:?}");

        match command {
            Command::JoinChat { chat_id } => {
                let chat = self.chat_service.join(&chat_id, ctx.user_id()).await?;

                if !ctx.has_joined(&chat_id).await {
                    let subscription = self.rooms.subscribe(&chat_id).await;
                    ctx.join(&chat_id, subscription).await;
                }

                ctx.notify(Notification::ChatJoined { chat_id, chat });
            }
            Command::LeaveChat { chat_id } => {
                ctx.leave(&chat_id).await;
            }
            Command::SendMessage {
                chat_id,
                content,
                kind,
            } => {
                let chat = self
                    .chat_service
                    .check_member(&chat_id, ctx.user_id())
                    .await?;

                let message = self
                    .message_service
                    .create(&chat_id, ctx.user_id(), &content, kind)
                    .await?;

                self.rooms
                    .publish(
                        &chat_id,
                        RoomEvent::broadcast(Notification::NewMessage {
                            message: message.clone(),
                        }),
                    )
                    .await;

                // connections with the room open get the copy above; the
                // gateway drops the personal duplicate for them
                for counterpart in chat.counterparts(ctx.user_id()) {
                    if self.presence.is_online(&counterpart).await {
                        self.presence
                            .notify(
                                &counterpart,
                                Notification::NewMessage {
                                    message: message.clone(),
                                },
                            )
                            .await;
                    } else {
                        self.send_mail_notification(counterpart, &ctx.user.name, &message.content);
                    }
                }
            }
            Command::MarkAsRead { chat_id } => {
                let read_at = self.chat_service.mark_read(&chat_id, ctx.user_id()).await?;

                self.rooms
                    .publish(
                        &chat_id,
                        RoomEvent::from_connection(
                            ctx.connection_id,
                            Notification::MessageRead {
                                chat_id: chat_id.clone(),
                                user_id: ctx.user_id().clone(),
                                read_at,
                            },
                        ),
                    )
                    .await;
            }
            Command::Typing { chat_id, is_typing } => {
                self.chat_service
                    .check_member(&chat_id, ctx.user_id())
                    .await?;

                self.rooms
                    .publish(
                        &chat_id,
                        RoomEvent::from_connection(
                            ctx.connection_id,
                            Notification::UserTyping {
                                user_id: ctx.user_id().clone(),
                                user_name: ctx.user.name.clone(),
                                is_typing,
                            },
                        ),
                    )
                    .await;
            }
        }

        Ok(())
    }

    /// Fire-and-forget mail fallback for recipients with no live connection.
    /// Delivery failures are logged and swallowed; they never surface to the
    /// sender.
    fn send_mail_notification(&self, recipient: user::Id, sender_name: &str, content: &str) {
        let user_service = self.user_service.clone();
        let mailer = self.mailer.clone();
        let sender_name = sender_name.to_owned();
        let content = content.to_owned();

        tokio::spawn(async move {
            let user = match user_service.find_by_id(&recipient).await {
                Ok(user) => user,
                Err(e) => {
                    error!("failed to load mail recipient {recipient}: {e}");
                    return;
                }
            };

            let mail = Mail {
                to: user.email,
                subject: format!("New message from {sender_name}"),
                body: content,
            };

            if let Err(e) = mailer.send(&mail).await {
                error!("failed to send new message mail to {recipient}: {e}");
            }
        });
    }
}
