//! End-to-end tests: `EventService` talking to the REST backend over HTTP.
//!
//! The backend runs in-process on an ephemeral port and serves from its
//! own mirror, so no database is needed.
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use event_planner::api;
use event_planner::app_state::AppState;
use event_planner::domain::{Event, EventId, EventPatch, NewEvent, UserId};
use event_planner::error::PlannerError;
use event_planner::provider::{Backend, CallContext, EventMirror, EventProvider, RestProvider};
use event_planner::service::EventService;
use event_planner::storage::{DeviceStorage, MemoryStore};

struct Server {
    addr: SocketAddr,
    events: EventMirror,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Server {
    async fn start() -> Self {
        let events = EventMirror::new(Arc::new(MemoryStore::new()));
        let app = api::build_router().with_state(AppState::new(Arc::new(events.clone())));
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let (shutdown, signal) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await;
        });
        Self {
            addr,
            events,
            shutdown,
            handle,
        }
    }

    /// Stops accepting, closes idle keep-alive connections and waits for
    /// the server to exit.
    async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }

    /// Creates an event directly on the server, bypassing the client.
    async fn seed(&self, name: &str) -> Event {
        let ctx = CallContext::new(Backend::Local, Some(UserId::from("u1")));
        let Ok(event) = self.events.create(&ctx, &NewEvent::named(name)).await else {
            panic!("seed failed");
        };
        event
    }

    fn client(&self) -> RestProvider {
        RestProvider::new(&format!("http://{}/api", self.addr))
            .with_probe_timeout(Duration::from_millis(500))
    }
}

async fn signed_in_service(server: &Server) -> EventService {
    let service = EventService::new(DeviceStorage::in_memory()).with_rest(server.client());
    let Ok(_) = service
        .identity()
        .sign_in(&json!({ "id": "u1", "email": "u1@example.com" }), false)
        .await
    else {
        panic!("sign in failed");
    };
    service
}

#[tokio::test]
async fn crud_goes_through_rest_and_mirrors_results() {
    let server = Server::start().await;
    let service = signed_in_service(&server).await;

    let Ok(created) = service.create_event(&NewEvent::named("Launch")).await else {
        panic!("create failed");
    };
    assert_eq!(created.user_id.as_str(), "u1");
    assert_eq!(server.events.load().await, vec![created.clone()]);
    assert_eq!(service.mirror().load().await, vec![created.clone()]);

    let listed = service.list_events().await;
    assert_eq!(listed, vec![created.clone()]);

    let patch = EventPatch {
        city: Some("Oslo".to_string()),
        ..EventPatch::default()
    };
    let Ok(updated) = service.update_event(created.id, &patch).await else {
        panic!("update failed");
    };
    assert_eq!(updated.city.as_deref(), Some("Oslo"));
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(service.mirror().find(created.id).await, Some(updated.clone()));
    assert_eq!(server.events.find(created.id).await, Some(updated.clone()));

    assert_eq!(service.get_event(created.id).await, Some(updated));

    let Ok(()) = service.delete_event(created.id).await else {
        panic!("delete failed");
    };
    assert!(server.events.load().await.is_empty());
    assert!(service.mirror().load().await.is_empty());
    assert_eq!(service.get_event(created.id).await, None);

    server.stop().await;
}

#[tokio::test]
async fn remote_write_failure_reaches_caller_and_leaves_mirror() {
    let server = Server::start().await;
    let service = signed_in_service(&server).await;

    let Ok(created) = service.create_event(&NewEvent::named("Launch")).await else {
        panic!("create failed");
    };
    let patch = EventPatch {
        city: Some("Oslo".to_string()),
        ..EventPatch::default()
    };
    let missing = EventId::new();
    assert!(matches!(
        service.update_event(missing, &patch).await,
        Err(PlannerError::EventNotFound(id)) if id == missing
    ));
    assert_eq!(service.mirror().load().await, vec![created]);

    server.stop().await;
}

#[tokio::test]
async fn falls_back_to_mirror_when_backend_goes_away() {
    let server = Server::start().await;
    let service = signed_in_service(&server).await;

    let Ok(created) = service.create_event(&NewEvent::named("Launch")).await else {
        panic!("create failed");
    };
    server.stop().await;

    assert_eq!(service.list_events().await, vec![created.clone()]);
    assert_eq!(service.get_event(created.id).await, Some(created.clone()));

    let patch = EventPatch {
        venue_type: Some("outdoor".to_string()),
        ..EventPatch::default()
    };
    let Ok(updated) = service.update_event(created.id, &patch).await else {
        panic!("offline update failed");
    };
    assert_eq!(updated.venue_type.as_deref(), Some("outdoor"));
    assert!(updated.updated_at > created.updated_at);

    let Ok(offline) = service.create_event(&NewEvent::named("Retro")).await else {
        panic!("offline create failed");
    };
    let ids: Vec<EventId> = service.list_events().await.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![offline.id, created.id]);
}

#[tokio::test]
async fn remote_get_adds_record_to_empty_mirror() {
    let server = Server::start().await;
    let service = signed_in_service(&server).await;
    let seeded = server.seed("Fetched").await;
    assert!(service.mirror().load().await.is_empty());

    assert_eq!(service.get_event(seeded.id).await, Some(seeded.clone()));
    assert_eq!(service.mirror().find(seeded.id).await, Some(seeded.clone()));

    server.stop().await;
    assert_eq!(service.get_event(seeded.id).await, Some(seeded));
}

#[tokio::test]
async fn remote_list_overwrites_stale_mirror() {
    let server = Server::start().await;
    let service = signed_in_service(&server).await;
    let stale = NewEvent::named("Stale").into_event(
        EventId::new(),
        UserId::from("u1"),
        chrono::Utc::now(),
    );
    assert!(service.mirror().save(&[stale]).await.is_ok());
    let remote = server.seed("Remote").await;

    assert_eq!(service.list_events().await, vec![remote.clone()]);
    assert_eq!(service.mirror().load().await, vec![remote]);

    server.stop().await;
}

#[tokio::test]
async fn delete_of_event_already_gone_remotely_clears_mirror() {
    let server = Server::start().await;
    let service = signed_in_service(&server).await;
    let Ok(created) = service.create_event(&NewEvent::named("Launch")).await else {
        panic!("create failed");
    };
    assert!(matches!(server.events.remove(created.id).await, Ok(true)));

    let Ok(()) = service.delete_event(created.id).await else {
        panic!("delete of a missing remote event should succeed");
    };
    assert!(service.mirror().find(created.id).await.is_none());

    server.stop().await;
}

#[tokio::test]
async fn failed_remote_delete_reaches_caller_and_keeps_mirror() {
    let server = Server::start().await;
    let service = signed_in_service(&server).await;
    let Ok(created) = service.create_event(&NewEvent::named("Launch")).await else {
        panic!("create failed");
    };
    let Ok(()) = service.identity().sign_out().await else {
        panic!("sign out failed");
    };

    assert!(matches!(
        service.delete_event(created.id).await,
        Err(PlannerError::Backend { status: 401, .. })
    ));
    assert_eq!(service.mirror().find(created.id).await, Some(created.clone()));
    assert_eq!(server.events.find(created.id).await, Some(created));

    server.stop().await;
}
