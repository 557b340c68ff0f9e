//! Shared helpers for gateway tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oto_dispatch::{AdminAllowList, DispatchConfig, Dispatcher};
use oto_gateway::{build_router, AppState};
use oto_license::{CredentialGenerator, SharedSecret};
use oto_registry::CredentialRegistry;
use oto_types::{ActorId, FixedClock, ThreadRandom};
use std::sync::Arc;

pub const ADMIN: i64 = 1001;
pub const USER: i64 = 2002;

/// 2026-10-19 09:30:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}

/// Dispatcher with ADMIN privileged on a pinned clock.
pub fn test_dispatcher() -> (Arc<Dispatcher>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let generator =
        CredentialGenerator::new(SharedSecret::default(), clock.clone(), Arc::new(ThreadRandom));
    let dispatcher = Dispatcher::new(
        generator,
        Arc::new(CredentialRegistry::new()),
        Arc::new(AdminAllowList::new([ActorId::new(ADMIN)])),
        DispatchConfig::default(),
    );
    (Arc::new(dispatcher), clock)
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
pub async fn spawn_test_server(dispatcher: Arc<Dispatcher>) -> String {
    let app = build_router(AppState::new(dispatcher));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

/// Extracts the code from an issuance reply.
pub fn code_from_reply(text: &str) -> String {
    text.lines()
        .find_map(|line| line.strip_prefix("Code: "))
        .expect("reply has no code line")
        .to_string()
}
