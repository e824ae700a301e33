//! Repository tests against a real MongoDB. They spin up a throwaway
//! container each and are skipped unless Docker is available:
//! `cargo test -- --ignored`.

use testcontainers_modules::mongo::Mongo;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;

use nadlanka_chat::chat::model::{Chat, LastMessage};
use nadlanka_chat::chat::repository::{ChatRepository, MongoChatRepository};
use nadlanka_chat::integration::db;
use nadlanka_chat::message::model::{ChatMessage, Kind};
use nadlanka_chat::message::repository::{MessageRepository, MongoMessageRepository};
use nadlanka_chat::model::Pagination;
use nadlanka_chat::user;

async fn database() -> (ContainerAsync<Mongo>, mongodb::Database) {
    let node = Mongo::default().start().await.unwrap();
    let config = db::Config {
        host: String::from("127.0.0.1"),
        port: node.get_host_port_ipv4(27017).await.unwrap(),
        db: String::from("nadlanka_test"),
    };
    let database = db::init(&config).await.unwrap();
    (node, database)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn chat_is_found_by_members_and_product() {
    let (_node, database) = database().await;
    let repository = MongoChatRepository::new(&database);

    let (a, b) = (user::Id::random(), user::Id::random());
    let chat = Chat::new(a.clone(), b.clone(), None, None).unwrap();
    repository.insert(&chat).await.unwrap();

    let found = repository.find_by_id(&chat.id).await.unwrap().unwrap();
    assert_eq!(found.id, chat.id);

    let members = [a.clone(), b.clone()];
    let by_members = repository
        .find_by_members_and_product(&members, None)
        .await
        .unwrap();
    assert_eq!(by_members.unwrap().id, chat.id);

    // a product-scoped lookup does not match the product-less chat
    let other = repository
        .find_by_members_and_product(&members, Some("prod-1"))
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn read_marker_never_moves_backwards() {
    let (_node, database) = database().await;
    let repository = MongoChatRepository::new(&database);

    let (a, b) = (user::Id::random(), user::Id::random());
    let chat = Chat::new(a.clone(), b, None, None).unwrap();
    let initial = chat.participant(&a).unwrap().last_read_at;
    repository.insert(&chat).await.unwrap();

    repository
        .update_last_read(&chat.id, &a, initial + 1000)
        .await
        .unwrap();
    let advanced = repository.find_by_id(&chat.id).await.unwrap().unwrap();
    assert_eq!(advanced.participant(&a).unwrap().last_read_at, initial + 1000);

    // stale write is ignored
    repository
        .update_last_read(&chat.id, &a, initial)
        .await
        .unwrap();
    let unchanged = repository.find_by_id(&chat.id).await.unwrap().unwrap();
    assert_eq!(
        unchanged.participant(&a).unwrap().last_read_at,
        initial + 1000
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn snapshot_update_bumps_the_message_counter() {
    let (_node, database) = database().await;
    let repository = MongoChatRepository::new(&database);

    let (a, b) = (user::Id::random(), user::Id::random());
    let chat = Chat::new(a.clone(), b, None, None).unwrap();
    repository.insert(&chat).await.unwrap();

    for content in ["first", "second"] {
        repository
            .update_last_message(
                &chat.id,
                &LastMessage {
                    content: content.into(),
                    sender: a.clone(),
                    sent_at: chat.created_at + 1,
                },
            )
            .await
            .unwrap();
    }

    let updated = repository.find_by_id(&chat.id).await.unwrap().unwrap();
    assert_eq!(updated.message_count, 2);
    assert_eq!(updated.last_message.unwrap().content, "second");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn messages_page_newest_first() {
    let (_node, database) = database().await;
    let repository = MongoMessageRepository::new(&database);

    let chat_id = nadlanka_chat::chat::Id::random();
    let sender = user::Id::random();

    for (content, offset) in [("one", 1), ("two", 2), ("three", 3)] {
        let mut message = ChatMessage::new(chat_id.clone(), sender.clone(), content, Kind::Text);
        message.created_at += offset;
        repository.insert(&message).await.unwrap();
    }

    let page = repository
        .find_by_chat(&chat_id, Pagination::new(1, 2))
        .await
        .unwrap();
    let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["three", "two"]);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn unread_count_excludes_own_and_already_read_messages() {
    let (_node, database) = database().await;
    let repository = MongoMessageRepository::new(&database);

    let chat_id = nadlanka_chat::chat::Id::random();
    let (reader, other) = (user::Id::random(), user::Id::random());
    let base = 1_700_000_000_000_i64;

    for (sender, offset) in [(&other, 1), (&other, 2), (&reader, 3), (&other, 4)] {
        let mut message = ChatMessage::new(chat_id.clone(), sender.clone(), "m", Kind::Text);
        message.created_at = base + offset;
        repository.insert(&message).await.unwrap();
    }

    // everything from the counterpart is unread
    assert_eq!(
        repository.count_newer_than(&chat_id, &reader, base).await.unwrap(),
        3
    );
    // messages at or before the read marker do not count
    assert_eq!(
        repository
            .count_newer_than(&chat_id, &reader, base + 2)
            .await
            .unwrap(),
        1
    );
    // from the counterpart's side only the reader's single message is unread
    assert_eq!(
        repository
            .count_newer_than(&chat_id, &other, base)
            .await
            .unwrap(),
        1
    );
}
