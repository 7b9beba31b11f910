//! Session service: creation and the participant state machine.
//!
//! Every mutation of one session runs under that session's lock, so
//! check-then-act sequences (capacity, duplicate membership) hold under
//! concurrent requests. Operations on different sessions proceed
//! independently. The store is the single source of truth; the service
//! re-reads under the lock and never trusts a cached participant count.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::common::{ApiError, SessionId, UserId, ValidatedPage};
use crate::domains::chat::channel::ChatHub;
use crate::domains::chat::store::MessageStore;
use crate::domains::location::LocationResolver;
use crate::domains::sessions::events::SessionEvent;
use crate::domains::sessions::models::{SessionDto, SessionEntity, SessionLocation};
use crate::domains::sessions::search::{self, NearbyQuery};
use crate::domains::sessions::store::SessionStore;
use crate::domains::sessions::validate::{validate, CreateSessionRequest};
use crate::kernel::events::EventSink;

/// Language for reverse-geocoded addresses.
const ADDRESS_LANGUAGE: &str = "en";

/// One mutex per session id; mutations acquire it before touching the store.
#[derive(Default)]
struct SessionLocks {
    inner: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session_id: SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            locks
                .entry(session_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    async fn remove(&self, session_id: SessionId) {
        self.inner.lock().await.remove(&session_id);
    }
}

pub struct SessionService {
    store: Arc<dyn SessionStore>,
    messages: Arc<dyn MessageStore>,
    resolver: Arc<dyn LocationResolver>,
    events: Arc<dyn EventSink>,
    hub: ChatHub,
    locks: SessionLocks,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        messages: Arc<dyn MessageStore>,
        resolver: Arc<dyn LocationResolver>,
        events: Arc<dyn EventSink>,
        hub: ChatHub,
    ) -> Self {
        Self {
            store,
            messages,
            resolver,
            events,
            hub,
            locks: SessionLocks::default(),
        }
    }

    /// Validate a creation request and persist the new aggregate.
    ///
    /// All violated rules are reported together. The reverse-geocoded
    /// address is best-effort: a resolver failure degrades to an unresolved
    /// address and never fails the creation.
    pub async fn create(
        &self,
        request: CreateSessionRequest,
        creator: UserId,
    ) -> Result<SessionDto, ApiError> {
        let validated = validate(&request, Utc::now()).map_err(ApiError::Validation)?;

        let address = match self
            .resolver
            .reverse_geocode(validated.latitude, validated.longitude, ADDRESS_LANGUAGE)
            .await
        {
            Ok(address) => address,
            Err(error) => {
                tracing::warn!(error = %error, "reverse geocoding failed, storing unresolved address");
                None
            }
        };

        let session = SessionEntity {
            id: SessionId::new(),
            creator_id: creator,
            participants: vec![creator],
            title: validated.title,
            description: validated.description,
            sport_type: validated.sport_type,
            location: SessionLocation {
                latitude: validated.latitude,
                longitude: validated.longitude,
                address,
            },
            date: validated.date,
            min_participants: validated.min_participants,
            max_participants: validated.max_participants,
            tags: validated.tags,
            created_at: Utc::now(),
        };

        self.store.insert(session.clone()).await?;
        self.events.publish(SessionEvent::Created {
            session_id: session.id,
            creator_id: creator,
        });

        tracing::info!(session_id = %session.id, creator_id = %creator, "session created");
        Ok(session.to_dto(creator))
    }

    /// Fetch one session, participants filtered by requester visibility.
    pub async fn get(&self, session_id: SessionId, requester: UserId) -> Result<SessionDto, ApiError> {
        let session = self.require(session_id).await?;
        Ok(session.to_dto(requester))
    }

    /// Join an open session.
    pub async fn join(&self, session_id: SessionId, user: UserId) -> Result<(), ApiError> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.require(session_id).await?;
        if session.is_participant(user) {
            return Err(ApiError::conflict("user is already a participant"));
        }
        if session.is_full() {
            return Err(ApiError::conflict("session is already full"));
        }
        if session.is_past(Utc::now()) {
            return Err(ApiError::conflict("session date has passed"));
        }

        session.participants.push(user);
        self.store.update(session).await?;
        self.events.publish(SessionEvent::UserJoined {
            session_id,
            user_id: user,
        });
        Ok(())
    }

    /// Leave a session. Creators cannot leave their own session.
    pub async fn leave(&self, session_id: SessionId, user: UserId) -> Result<(), ApiError> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.require(session_id).await?;
        if session.is_creator(user) {
            return Err(ApiError::forbidden(
                "creators cannot leave their own session",
            ));
        }
        if !session.is_participant(user) {
            return Err(ApiError::conflict("user is not a participant"));
        }

        session.participants.retain(|participant| *participant != user);
        self.store.update(session).await?;
        self.events.publish(SessionEvent::UserLeft {
            session_id,
            user_id: user,
        });
        Ok(())
    }

    /// Remove a participant. Creator-only; the creator is un-kickable.
    pub async fn kick(
        &self,
        session_id: SessionId,
        target: UserId,
        acting: UserId,
    ) -> Result<(), ApiError> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.require(session_id).await?;
        if !session.is_creator(acting) {
            return Err(ApiError::forbidden("only the creator can kick users"));
        }
        if target == session.creator_id {
            return Err(ApiError::forbidden("the creator cannot be kicked"));
        }
        if !session.is_participant(target) {
            return Err(ApiError::not_found("user is not a participant"));
        }

        session.participants.retain(|participant| *participant != target);
        self.store.update(session).await?;
        self.events.publish(SessionEvent::UserKicked {
            session_id,
            user_id: target,
            kicked_by: acting,
        });
        Ok(())
    }

    /// Hard-delete a session and cascade its chat history. Creator-only.
    pub async fn delete(&self, session_id: SessionId, acting: UserId) -> Result<(), ApiError> {
        {
            let _guard = self.locks.acquire(session_id).await;

            let session = self.require(session_id).await?;
            if !session.is_creator(acting) {
                return Err(ApiError::forbidden("only the creator can delete a session"));
            }

            self.store.delete(session_id).await?;
            self.messages.delete_all_for_session(session_id).await?;
            self.hub.remove(session_id).await;
        }
        self.locks.remove(session_id).await;

        self.events.publish(SessionEvent::Deleted {
            session_id,
            deleted_by: acting,
        });
        tracing::info!(session_id = %session_id, "session deleted");
        Ok(())
    }

    /// Sessions the user created or joined.
    pub async fn list_for_user(
        &self,
        user: UserId,
        page: &ValidatedPage,
    ) -> Result<(Vec<SessionDto>, bool), ApiError> {
        let sessions = self.store.all().await?;
        let (sessions, has_more) = search::for_user(sessions, user, page);
        Ok((to_dtos(sessions, user), has_more))
    }

    /// Open sessions near the supplied origin that the requester is not
    /// part of, nearest first.
    pub async fn search_nearby(
        &self,
        requester: UserId,
        query: &NearbyQuery,
    ) -> Result<(Vec<SessionDto>, bool), ApiError> {
        if !(-90.0..=90.0).contains(&query.latitude) || !(-180.0..=180.0).contains(&query.longitude)
        {
            return Err(ApiError::invalid(
                "location.out_of_range",
                "search origin coordinates are out of range",
            ));
        }

        let page = query.page_query().validate();
        let sessions = self.store.all().await?;
        let (sessions, has_more) = search::nearby(
            sessions,
            requester,
            (query.latitude, query.longitude),
            query.radius_km,
            &page,
            Utc::now(),
        );
        Ok((to_dtos(sessions, requester), has_more))
    }

    async fn require(&self, session_id: SessionId) -> Result<SessionEntity, ApiError> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("session does not exist"))
    }
}

fn to_dtos(sessions: Vec<SessionEntity>, requester: UserId) -> Vec<SessionDto> {
    sessions
        .into_iter()
        .map(|session| session.to_dto(requester))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::chat::store::InMemoryMessageStore;
    use crate::domains::location::StaticLocationResolver;
    use crate::domains::sessions::store::InMemorySessionStore;
    use crate::kernel::events::TestEventSink;
    use chrono::Duration;

    fn request(max_participants: u32) -> CreateSessionRequest {
        CreateSessionRequest {
            title: "Session Title".to_string(),
            description: "Session Description".to_string(),
            sport_type: "basketball".to_string(),
            latitude: 51.924470285085526,
            longitude: 7.846992772627526,
            date: Utc::now() + Duration::days(1),
            min_participants: 1,
            max_participants,
            tags: vec!["tag1".to_string(), "tag2".to_string()],
        }
    }

    fn service() -> (SessionService, Arc<TestEventSink>) {
        let events = Arc::new(TestEventSink::new());
        let service = SessionService::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(StaticLocationResolver::with_address("Everswinkel", "48351")),
            events.clone(),
            ChatHub::new(),
        );
        (service, events)
    }

    #[tokio::test]
    async fn test_create_resolves_address_and_seeds_participants() {
        let (service, events) = service();
        let creator = UserId::new();

        let dto = service.create(request(10), creator).await.unwrap();

        assert_eq!(dto.creator_id, creator);
        assert_eq!(dto.participants, Some(vec![creator]));
        let address = dto.location.address.unwrap();
        assert_eq!(address.city, "Everswinkel");
        assert_eq!(address.zip_code, "48351");
        assert!(matches!(
            events.recorded().as_slice(),
            [SessionEvent::Created { .. }]
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_request_with_all_rules() {
        let (service, _) = service();
        let mut bad = request(5);
        bad.min_participants = 10;
        bad.latitude = 9999.0;

        let error = service.create(bad, UserId::new()).await.unwrap_err();
        match error {
            ApiError::Validation(violations) => {
                let codes: Vec<_> = violations.iter().map(|v| v.code).collect();
                assert_eq!(
                    codes,
                    vec!["location.latitude_out_of_range", "participants.min_exceeds_max"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_join_then_duplicate_join_conflicts() {
        let (service, _) = service();
        let creator = UserId::new();
        let joiner = UserId::new();
        let dto = service.create(request(10), creator).await.unwrap();

        service.join(dto.id, joiner).await.unwrap();
        let second = service.join(dto.id, joiner).await;
        assert!(matches!(second, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_join_full_session_conflicts_without_mutation() {
        let (service, _) = service();
        let creator = UserId::new();
        let dto = service.create(request(2), creator).await.unwrap();

        service.join(dto.id, UserId::new()).await.unwrap();
        let overflow = service.join(dto.id, UserId::new()).await;
        assert!(matches!(overflow, Err(ApiError::Conflict(_))));

        let after = service.get(dto.id, creator).await.unwrap();
        assert_eq!(after.participants.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_joins_never_exceed_capacity() {
        let creator = UserId::new();
        let events = Arc::new(TestEventSink::new());
        let service = Arc::new(SessionService::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(StaticLocationResolver::default()),
            events,
            ChatHub::new(),
        ));
        let dto = service.create(request(2), creator).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let session_id = dto.id;
            handles.push(tokio::spawn(async move {
                service.join(session_id, UserId::new()).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        // one free slot next to the creator
        assert_eq!(successes, 1);
        let after = service.get(dto.id, creator).await.unwrap();
        assert_eq!(after.participants.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_creator_cannot_leave_and_cannot_be_kicked() {
        let (service, _) = service();
        let creator = UserId::new();
        let member = UserId::new();
        let dto = service.create(request(10), creator).await.unwrap();
        service.join(dto.id, member).await.unwrap();

        assert!(matches!(
            service.leave(dto.id, creator).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.kick(dto.id, creator, creator).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.kick(dto.id, member, member).await,
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_kick_removes_member_and_rekick_is_not_found() {
        let (service, _) = service();
        let creator = UserId::new();
        let member = UserId::new();
        let dto = service.create(request(10), creator).await.unwrap();
        service.join(dto.id, member).await.unwrap();

        service.kick(dto.id, member, creator).await.unwrap();
        let after = service.get(dto.id, creator).await.unwrap();
        assert!(!after.participants.unwrap().contains(&member));

        let again = service.kick(dto.id, member, creator).await;
        assert!(matches!(again, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_chat_history() {
        let creator = UserId::new();
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let messages: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
        let service = SessionService::new(
            sessions.clone(),
            messages.clone(),
            Arc::new(StaticLocationResolver::default()),
            Arc::new(TestEventSink::new()),
            ChatHub::new(),
        );
        let dto = service.create(request(10), creator).await.unwrap();

        messages
            .append(crate::domains::chat::models::MessageEntity::new(
                dto.id,
                creator,
                "see you there".to_string(),
                None,
            ))
            .await
            .unwrap();

        service.delete(dto.id, creator).await.unwrap();

        assert!(matches!(
            service.get(dto.id, creator).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(messages.history(dto.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_non_creator_is_forbidden() {
        let (service, _) = service();
        let creator = UserId::new();
        let dto = service.create(request(10), creator).await.unwrap();

        let result = service.delete(dto.id, UserId::new()).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_mutations_on_missing_session_are_not_found() {
        let (service, _) = service();
        let ghost = SessionId::new();
        let user = UserId::new();

        assert!(matches!(service.join(ghost, user).await, Err(ApiError::NotFound(_))));
        assert!(matches!(service.leave(ghost, user).await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            service.kick(ghost, user, user).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(ghost, user).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
