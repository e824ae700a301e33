use axum::extract::ws::Message::{Binary, Close, Text};
use axum::extract::ws::{self, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, error, warn};
use serde::Deserialize;
use serde_json::from_str;
use tokio::sync::{broadcast, mpsc};
use tokio::try_join;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamMap;

use crate::auth;
use crate::chat;
use crate::user::model::User;
use crate::user::service::UserService;

use super::context::{Outbound, Ws};
use super::model::{Command, Notification, RoomEvent};
use super::service::EventService;

#[derive(Deserialize)]
pub struct Params {
    token: Option<String>,
}

/// Upgrade endpoint. The token travels as a query parameter because browser
/// WebSocket clients cannot set an Authorization header; a missing or invalid
/// token refuses the upgrade before any socket exists.
pub async fn ws(
    ws: WebSocketUpgrade,
    Query(params): Query<Params>,
    State(auth_service): State<auth::Service>,
    State(user_service): State<UserService>,
    State(event_service): State<EventService>,
) -> super::Result<Response> {
    let token = params.token.ok_or(auth::Error::Unauthorized)?;
    let sub = auth_service.validate(&token)?;
    let user = user_service.find_by_id(&sub).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(user, socket, event_service)))
}

async fn handle_socket(user: User, ws: WebSocket, event_service: EventService) {
    let user_id = user.id.clone();
    let personal = event_service.presence().connect(&user_id).await;
    let (ctx, outbound) = Ws::new(user);

    let (sender, receiver) = ws.split();

    let read_task = tokio::spawn(read(ctx.clone(), receiver, event_service.clone()));
    let write_task = tokio::spawn(write(ctx.clone(), sender, personal, outbound));

    match try_join!(read_task, write_task) {
        Ok(_) => debug!("ws disconnected gracefully"),
        Err(e) => error!("ws disconnected with error: {e}"),
    }

    event_service.presence().disconnect(&user_id).await;
}

async fn read(ctx: Ws, mut receiver: SplitStream<WebSocket>, event_service: EventService) {
    loop {
        tokio::select! {
            // close is notified => stop 'read' task
            _ = ctx.close.notified() => break,

            frame = receiver.next() => {
                match frame {
                    None => {
                        ctx.close.notify_one();
                        break;
                    },
                    Some(Err(e)) => {
                        error!("failed to read ws frame: {e}");
                        ctx.close.notify_one(); // notify 'write' task to stop
                        break;
                    },
                    Some(Ok(Close(frame))) => {
                        debug!("ws connection closed by client: {frame:?}");
                        ctx.close.notify_one(); // notify 'write' task to stop
                        break;
                    },
                    Some(Ok(Text(content))) => handle_text_frame(&ctx, content.as_str(), &event_service).await,
                    Some(Ok(Binary(content))) => warn!("received binary ws frame: {content:?}"),
                    Some(Ok(_)) => {} // ping/pong, axum answers these itself
                }
            }
        }
    }
}

/// One command per frame. A failed command answers the calling connection
/// with an error notification and leaves the session running; only transport
/// failures tear the connection down.
async fn handle_text_frame(ctx: &Ws, content: &str, event_service: &EventService) {
    let command = match from_str::<Command>(content) {
        Ok(command) => command,
        Err(e) => {
            warn!("skipping malformed frame: {e}");
            let error = super::Error::from(e);
            ctx.notify(Notification::Error {
                message: error.client_message(),
            });
            return;
        }
    };

    if let Err(e) = event_service.handle_command(ctx, command).await {
        error!("failed to handle command: {e}");
        ctx.notify(Notification::Error {
            message: e.client_message(),
        });
    }
}

async fn write(
    ctx: Ws,
    mut sender: SplitSink<WebSocket, ws::Message>,
    personal: broadcast::Receiver<Notification>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let mut personal = BroadcastStream::new(personal);
    let mut rooms: StreamMap<chat::Id, BroadcastStream<RoomEvent>> = StreamMap::new();

    loop {
        tokio::select! {
            // close is notified => stop 'write' task
            _ = ctx.close.notified() => break,

            // instructions from the 'read' task
            item = outbound.recv() => {
                match item {
                    None => break,
                    Some(Outbound::Subscribe(chat_id, rx)) => {
                        rooms.insert(chat_id, BroadcastStream::new(rx));
                    },
                    Some(Outbound::Unsubscribe(chat_id)) => {
                        rooms.remove(&chat_id);
                    },
                    Some(Outbound::Notify(noti)) => send_notification(&ctx, &mut sender, &noti).await,
                }
            },

            // the user's personal channel, fed while chats run in the background
            item = personal.next() => {
                match item {
                    None => break,
                    Some(Err(e)) => warn!("personal channel lagged: {e}"),
                    Some(Ok(noti)) => {
                        if !covered_by_room(&noti, &rooms) {
                            send_notification(&ctx, &mut sender, &noti).await;
                        }
                    }
                }
            },

            // traffic of every room this connection has joined
            Some((_, item)) = rooms.next(), if !rooms.is_empty() => {
                match item {
                    Err(e) => warn!("room channel lagged: {e}"),
                    Ok(event) => {
                        if !event.skips(ctx.connection_id) {
                            send_notification(&ctx, &mut sender, &event.notification).await;
                        }
                    }
                }
            },
        }
    }
}

/// A connection with the chat's room open already gets the room copy of a new
/// message; the personal channel only covers chats running in the background.
/// Forwarding both would deliver the same message twice to one socket.
fn covered_by_room(
    notification: &Notification,
    rooms: &StreamMap<chat::Id, BroadcastStream<RoomEvent>>,
) -> bool {
    match notification {
        Notification::NewMessage { message } => rooms.contains_key(&message.chat_id),
        _ => false,
    }
}

async fn send_notification(
    ctx: &Ws,
    sender: &mut SplitSink<WebSocket, ws::Message>,
    notification: &Notification,
) {
    debug!("sending notification: {notification:?}");

    let payload = match serde_json::to_string(notification) {
        Ok(payload) => payload,
        Err(e) => {
            error!("failed to serialize notification: {e}");
            return;
        }
    };

    if let Err(e) = sender.send(Text(payload.into())).await {
        error!("failed to send notification to client: {e}");
        ctx.close.notify_one();
    }
}
