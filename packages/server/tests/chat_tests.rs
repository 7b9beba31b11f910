//! Chat protocol and channel tests: envelope round-trips, decode failure
//! modes, membership gating, persistence-before-fanout, and lag behavior.

use std::sync::Arc;

use api_core::common::{MessageId, ProtocolError, SessionId, UserId, ValidatedPage};
use api_core::domains::chat::{
    protocol, ChatFrame, ChatHub, ChatMessagePayload, ChatService, ErrorPayload,
    InMemoryMessageStore, MessageEntity, MessageStore,
};
use api_core::domains::location::StaticLocationResolver;
use api_core::domains::sessions::validate::CreateSessionRequest;
use api_core::domains::sessions::{InMemorySessionStore, SessionService, SessionStore};
use api_core::kernel::events::TestEventSink;
use chrono::{Duration, Utc};
use tokio::sync::broadcast;

struct TestContext {
    sessions: Arc<SessionService>,
    chat: Arc<ChatService>,
}

fn setup() -> TestContext {
    let session_store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let message_store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let hub = ChatHub::new();

    let sessions = Arc::new(SessionService::new(
        session_store.clone(),
        message_store.clone(),
        Arc::new(StaticLocationResolver::default()),
        Arc::new(TestEventSink::new()),
        hub.clone(),
    ));
    let chat = Arc::new(ChatService::new(session_store, message_store, hub));
    TestContext { sessions, chat }
}

async fn create_session(ctx: &TestContext, creator: UserId) -> SessionId {
    let request = CreateSessionRequest {
        title: "Evening doubles".to_string(),
        description: "Two courts booked".to_string(),
        sport_type: "badminton".to_string(),
        latitude: 51.9607,
        longitude: 7.6261,
        date: Utc::now() + Duration::days(1),
        min_participants: 2,
        max_participants: 8,
        tags: vec![],
    };
    ctx.sessions.create(request, creator).await.unwrap().id
}

fn text_payload(message: &str) -> ChatMessagePayload {
    ChatMessagePayload {
        message: message.to_string(),
        parent_message_id: None,
    }
}

#[tokio::test]
async fn envelope_roundtrip_for_every_kind() {
    let frames = vec![
        ChatFrame::ChatMessage(ChatMessagePayload {
            message: "who's bringing the net?".to_string(),
            parent_message_id: Some(MessageId::new()),
        }),
        ChatFrame::ChatBroadcast(MessageEntity::new(
            SessionId::new(),
            UserId::new(),
            "court two is free".to_string(),
            None,
        )),
        ChatFrame::Error(ErrorPayload {
            code: "forbidden".to_string(),
            reason: "only participants may use the chat".to_string(),
        }),
    ];

    for frame in frames {
        let encoded = protocol::encode(&frame).unwrap();
        assert_eq!(protocol::decode(&encoded).unwrap(), frame);
    }
}

#[tokio::test]
async fn unknown_discriminator_fails_cleanly_with_raw_string() {
    let result = protocol::decode(r#"{"type": "video_call_invite", "room": 3}"#);
    match result {
        Err(ProtocolError::UnknownKind(raw)) => assert_eq!(raw, "video_call_invite"),
        other => panic!("expected UnknownKind, got {other:?}"),
    }

    // bad payload against a known schema is the other failure mode
    assert!(matches!(
        protocol::decode(r#"{"type": "chat_message", "message": 42}"#),
        Err(ProtocolError::InvalidFrame(_))
    ));
}

#[tokio::test]
async fn message_is_persisted_then_fanned_out() {
    let ctx = setup();
    let creator = UserId::new();
    let member = UserId::new();
    let session_id = create_session(&ctx, creator).await;
    ctx.sessions.join(session_id, member).await.unwrap();

    let mut rx_member = ctx.chat.subscribe(session_id).await;
    let mut rx_creator = ctx.chat.subscribe(session_id).await;

    let sent = ctx
        .chat
        .send(session_id, creator, text_payload("warmup at seven"))
        .await
        .unwrap();

    // both connected subscribers see the same broadcast
    assert_eq!(
        rx_member.recv().await.unwrap(),
        ChatFrame::ChatBroadcast(sent.clone())
    );
    assert_eq!(
        rx_creator.recv().await.unwrap(),
        ChatFrame::ChatBroadcast(sent.clone())
    );

    // and the durable history already holds it
    let (history, _) = ctx
        .chat
        .history(session_id, member, &ValidatedPage::new(0, 10))
        .await
        .unwrap();
    assert_eq!(history, vec![sent]);
}

#[tokio::test]
async fn history_survives_disconnected_receivers() {
    let ctx = setup();
    let creator = UserId::new();
    let session_id = create_session(&ctx, creator).await;

    // no subscribers at all: fan-out is a no-op, persistence is not
    ctx.chat
        .send(session_id, creator, text_payload("anyone?"))
        .await
        .unwrap();

    let (history, _) = ctx
        .chat
        .history(session_id, creator, &ValidatedPage::new(0, 10))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn slow_receiver_lags_without_losing_the_channel() {
    let hub = ChatHub::with_capacity(1);
    let session_id = SessionId::new();
    let mut rx = hub.subscribe(session_id).await;

    for i in 0..3 {
        hub.publish(
            session_id,
            ChatFrame::ChatBroadcast(MessageEntity::new(
                session_id,
                UserId::new(),
                format!("message {i}"),
                None,
            )),
        )
        .await;
    }

    // the receiver missed frames but the subscription keeps working
    assert!(matches!(
        rx.recv().await,
        Err(broadcast::error::RecvError::Lagged(_))
    ));
    match rx.recv().await.unwrap() {
        ChatFrame::ChatBroadcast(message) => assert_eq!(message.message, "message 2"),
        other => panic!("expected broadcast, got {other:?}"),
    }
}

#[tokio::test]
async fn membership_gates_send_and_history() {
    let ctx = setup();
    let creator = UserId::new();
    let outsider = UserId::new();
    let session_id = create_session(&ctx, creator).await;

    assert!(ctx
        .chat
        .send(session_id, outsider, text_payload("hi"))
        .await
        .is_err());
    assert!(ctx
        .chat
        .history(session_id, outsider, &ValidatedPage::new(0, 10))
        .await
        .is_err());

    // a kicked member loses access
    let member = UserId::new();
    ctx.sessions.join(session_id, member).await.unwrap();
    ctx.chat
        .send(session_id, member, text_payload("made it"))
        .await
        .unwrap();
    ctx.sessions.kick(session_id, member, creator).await.unwrap();
    assert!(ctx
        .chat
        .send(session_id, member, text_payload("back again"))
        .await
        .is_err());
}

#[tokio::test]
async fn threaded_replies_reference_parents_in_same_session() {
    let ctx = setup();
    let creator = UserId::new();
    let member = UserId::new();
    let session_id = create_session(&ctx, creator).await;
    ctx.sessions.join(session_id, member).await.unwrap();

    let parent = ctx
        .chat
        .send(session_id, creator, text_payload("shuttles on me"))
        .await
        .unwrap();

    let reply = ctx
        .chat
        .send(
            session_id,
            member,
            ChatMessagePayload {
                message: "legend".to_string(),
                parent_message_id: Some(parent.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.parent_message_id, Some(parent.id));

    // a parent from another session does not resolve
    let other_session = create_session(&ctx, creator).await;
    let cross = ctx
        .chat
        .send(
            other_session,
            creator,
            ChatMessagePayload {
                message: "cross-thread".to_string(),
                parent_message_id: Some(parent.id),
            },
        )
        .await;
    assert!(cross.is_err());
}

#[tokio::test]
async fn deleting_the_session_closes_the_channel_and_drops_history() {
    let ctx = setup();
    let creator = UserId::new();
    let session_id = create_session(&ctx, creator).await;

    ctx.chat
        .send(session_id, creator, text_payload("kickoff moved"))
        .await
        .unwrap();
    let mut rx = ctx.chat.subscribe(session_id).await;

    ctx.sessions.delete(session_id, creator).await.unwrap();

    // drain the frame published before deletion, then observe the close
    loop {
        match rx.recv().await {
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
            Err(error) => panic!("unexpected receive error: {error:?}"),
        }
    }

    assert!(ctx
        .chat
        .history(session_id, creator, &ValidatedPage::new(0, 10))
        .await
        .is_err());
}

#[tokio::test]
async fn history_pagination_in_creation_order() {
    let ctx = setup();
    let creator = UserId::new();
    let session_id = create_session(&ctx, creator).await;

    for i in 0..5 {
        ctx.chat
            .send(session_id, creator, text_payload(&format!("message {i}")))
            .await
            .unwrap();
    }

    let (first, has_more) = ctx
        .chat
        .history(session_id, creator, &ValidatedPage::new(0, 2))
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].message, "message 0");
    assert!(has_more);

    let (last, has_more) = ctx
        .chat
        .history(session_id, creator, &ValidatedPage::new(2, 2))
        .await
        .unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].message, "message 4");
    assert!(!has_more);
}
