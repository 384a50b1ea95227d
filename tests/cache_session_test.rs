use serde_json::json;
use std::thread::sleep;
use std::time::Duration;
use survey_dashboard::DashboardError;
use survey_dashboard::cache::ResponseCache;
use survey_dashboard::session::{EditorCredentials, SessionContext, SessionStore, hash_password, verify_password};
use tempfile::tempdir;

#[test]
fn cache_hits_until_ttl_expires() {
    let mut cache = ResponseCache::new(Duration::from_secs(60));
    assert_eq!(cache.get("students"), None);

    cache.set("students", json!({"total_responses": 24}));
    assert_eq!(cache.get("students"), Some(json!({"total_responses": 24})));

    sleep(Duration::from_millis(20));
    assert_eq!(
        cache.get_with_ttl("students", Duration::from_millis(5)),
        None,
        "older than the explicit ttl"
    );
    assert!(cache.is_empty(), "expired entries are dropped on read");

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.default_ttl, 60);
}

#[test]
fn cache_clear_and_patterns() {
    let mut cache = ResponseCache::default();
    cache.set("teachers_teachers_active", json!(1));
    cache.set("teachers_teachers_all", json!(2));
    cache.set("comparison_teachers_active", json!(3));
    cache.set("tools", json!(4));

    assert_eq!(cache.invalidate_pattern("teachers_teachers"), 2);
    assert_eq!(cache.stats().keys, vec!["comparison_teachers_active", "tools"]);

    cache.clear(Some("tools"));
    assert_eq!(cache.len(), 1);
    cache.clear(None);
    assert!(cache.is_empty());
}

#[test]
fn password_hash_round_trip() {
    let hash = hash_password("segreto").expect("hashing works");
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("segreto", &hash).expect("hash is well formed"));
    assert!(!verify_password("sbagliato", &hash).expect("hash is well formed"));
    assert!(verify_password("segreto", "not-a-phc-string").is_err());
}

#[test]
fn editor_credentials() {
    let disabled = EditorCredentials::new(None).expect("no hash is allowed");
    assert!(!disabled.is_enabled());
    assert!(matches!(disabled.check("anything"), Err(DashboardError::Forbidden(_))));

    assert!(EditorCredentials::new(Some("garbage".to_string())).is_err());

    let enabled = EditorCredentials::new(Some(hash_password("segreto").expect("hash"))).expect("valid hash");
    assert!(enabled.is_enabled());
    assert!(enabled.check("segreto").is_ok());
    assert!(matches!(enabled.check("sbagliato"), Err(DashboardError::Forbidden(_))));
}

#[test]
fn session_store_lifecycle() {
    let store = SessionStore::default();
    let token = store.create();
    assert!(store.validate(&token));
    assert!(store.require(Some(&token)).is_ok());
    assert!(matches!(store.require(None), Err(DashboardError::Unauthorized)));
    assert!(matches!(store.require(Some("unknown")), Err(DashboardError::Unauthorized)));

    assert!(store.revoke(&token));
    assert!(!store.revoke(&token));
    assert!(!store.validate(&token));
}

#[test]
fn expired_sessions_are_purged() {
    let store = SessionStore::with_ttl(Duration::from_millis(1));
    let token = store.create();
    sleep(Duration::from_millis(10));
    assert!(!store.validate(&token));
    assert_eq!(store.purge_expired(), 1);
    assert!(store.is_empty());
}

#[test]
fn session_context_persists_token() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("state").join("session");

    let mut session = SessionContext::init(&path).expect("missing file is fine");
    assert!(!session.is_authenticated());

    session.establish("abc-123").expect("token written");
    let reloaded = SessionContext::init(&path).expect("file readable");
    assert_eq!(reloaded.token(), Some("abc-123"));

    session.teardown().expect("file removed");
    assert!(!path.exists());
    assert_eq!(session.token(), None);
    session.teardown().expect("teardown twice is harmless");
}
