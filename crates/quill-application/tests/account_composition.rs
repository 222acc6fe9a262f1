use quill_application::accounts::{UseAccountOpts, use_account};
use quill_application::testing::ScriptedApi;
use quill_application::{EntityQuery, Scope, Session, SessionConfig};
use quill_core::account::Relationship;
use quill_core::{CacheKey, Method};
use serde_json::json;
use std::time::Duration;

const ACCOUNT_PATH: &str = "/api/v1/accounts/42";
const RELATIONSHIP_PATH: &str = "/api/v1/accounts/relationships?id[]=42";

fn account_json() -> serde_json::Value {
    json!({ "id": "42", "acct": "alex@example.social", "username": "alex" })
}

#[tokio::test]
async fn test_account_without_relationship() {
    let api = ScriptedApi::new();
    api.respond(Method::Get, ACCOUNT_PATH, Ok(account_json()));
    let session = Session::new(api.clone(), SessionConfig::default());

    let mut hook = use_account(&session, Some("42"), UseAccountOpts::default(), &Scope::new());
    let state = hook.settled().await;

    let view = state.account.expect("account resolved");
    assert_eq!(view.account.id, "42");
    assert!(view.relationship.is_none());
    assert!(!state.is_loading);
    assert!(!state.is_relationship_loading);
    assert_eq!(api.calls(Method::Get, RELATIONSHIP_PATH), 0);
}

#[tokio::test]
async fn test_disabled_relationship_does_not_hold_loading() {
    let api = ScriptedApi::new();
    api.respond(Method::Get, ACCOUNT_PATH, Ok(account_json()));
    let gate = api.respond_gated(
        Method::Get,
        RELATIONSHIP_PATH,
        Ok(json!([{ "id": "42", "following": true }])),
    );
    let session = Session::new(api.clone(), SessionConfig::default());
    let scope = Scope::new();

    // Another consumer keeps the relationship request pending.
    let other = session.use_entity::<Relationship>(
        EntityQuery::new(CacheKey::of::<Relationship>("42"), RELATIONSHIP_PATH),
        &scope,
    );
    assert!(other.snapshot().is_loading);

    let mut hook = use_account(&session, Some("42"), UseAccountOpts::default(), &scope);
    let state = hook.settled().await;

    assert!(!state.is_loading);
    assert!(other.snapshot().is_loading);
    assert!(state.account.unwrap().relationship.is_none());

    gate.notify_one();
}

#[tokio::test]
async fn test_loading_until_relationship_resolves() {
    let api = ScriptedApi::new();
    api.respond(Method::Get, ACCOUNT_PATH, Ok(account_json()));
    api.respond_after(
        Method::Get,
        RELATIONSHIP_PATH,
        Duration::from_millis(50),
        Ok(json!([{ "id": "42", "following": true, "followed_by": true }])),
    );
    let session = Session::new(api.clone(), SessionConfig::default());

    let mut hook = use_account(
        &session,
        Some("42"),
        UseAccountOpts {
            with_relationship: true,
        },
        &Scope::new(),
    );

    let mut saw_account_alone = false;
    let state = loop {
        let state = hook.snapshot();
        if let Some(view) = &state.account {
            if view.relationship.is_none() {
                assert!(state.is_loading, "must stay loading until the relationship arrives");
                saw_account_alone = true;
            }
        }
        if !state.is_loading {
            break state;
        }
        hook.changed().await.expect("scope is live");
    };

    assert!(saw_account_alone);
    let view = state.account.unwrap();
    assert_eq!(view.account.username, "alex");
    let relationship = view.relationship.unwrap();
    assert!(relationship.following);
    assert!(relationship.followed_by);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_unmounted_hook_stops_receiving_state() {
    let api = ScriptedApi::new();
    let gate = api.respond_gated(Method::Get, ACCOUNT_PATH, Ok(account_json()));
    let session = Session::new(api.clone(), SessionConfig::default());
    let scope = Scope::new();

    let mut hook = use_account(&session, Some("42"), UseAccountOpts::default(), &scope);
    scope.cancel();
    gate.notify_one();

    assert!(hook.changed().await.is_none());
    let state = hook.snapshot();
    assert!(state.account.is_none());
    assert!(state.error.unwrap().is_cancelled());

    // The cache write still lands for other consumers.
    let mut fresh = use_account(&session, Some("42"), UseAccountOpts::default(), &Scope::new());
    assert_eq!(fresh.settled().await.account.unwrap().account.id, "42");
    assert_eq!(api.calls(Method::Get, ACCOUNT_PATH), 1);
}
