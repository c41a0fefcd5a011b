use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use meetup_csrf::crypto::csrf::{CsrfEngine, MAX_CLOCK_SKEW_SECONDS};
use meetup_csrf::error::{CsrfError, StoreError};
use meetup_csrf::repositories::memory::MemoryTokenRepository;
use meetup_csrf::repositories::token::{Lookup, TokenRepository};

const SECRET: [u8; 16] = [0u8; 16];
const WINDOW: i64 = 3600;
const T0: i64 = 1_700_000_000;

fn engine() -> (CsrfEngine<MemoryTokenRepository>, MemoryTokenRepository) {
    let repo = MemoryTokenRepository::new();
    let engine = CsrfEngine::new(&SECRET, WINDOW, repo.clone()).unwrap();
    (engine, repo)
}

/// Repository whose every call fails.
#[derive(Clone)]
struct BrokenRepository;

impl TokenRepository for BrokenRepository {
    async fn add(&self, _key: &str, _ttl_seconds: u64) -> Result<(), StoreError> {
        Err(StoreError::Backend("down".to_string()))
    }

    async fn validate(&self, _key: &str) -> Result<Lookup, StoreError> {
        Err(StoreError::Backend("down".to_string()))
    }

    async fn add_if_absent(&self, _key: &str, _ttl_seconds: u64) -> Result<bool, StoreError> {
        Err(StoreError::Backend("down".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("down".to_string()))
    }
}

#[tokio::test]
async fn fresh_token_checks_once() {
    let (engine, repo) = engine();
    let token = engine.create("sid-1", T0).unwrap();

    assert!(engine.check_at("sid-1", &token, T0).await.unwrap());
    assert_eq!(
        repo.validate(&format!("csrf:{}", token)).await.unwrap(),
        Lookup::Exists
    );
    assert!(!engine.check_at("sid-1", &token, T0).await.unwrap());
}

#[tokio::test]
async fn wall_clock_check_accepts_token_minted_now() {
    let (engine, _) = engine();
    let token = engine
        .create("sid-now", chrono::Utc::now().timestamp())
        .unwrap();

    assert!(engine.check("sid-now", &token).await.unwrap());
}

#[test]
fn identical_inputs_give_distinct_tokens() {
    let (engine, _) = engine();
    let a = engine.create("sid-1", T0).unwrap();
    let b = engine.create("sid-1", T0).unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn any_flipped_byte_is_malformed() {
    let (engine, repo) = engine();
    let token = engine.create("sid-1", T0).unwrap();
    let raw = general_purpose::STANDARD.decode(&token).unwrap();

    for i in 0..raw.len() {
        let mut tampered = raw.clone();
        tampered[i] ^= 0x01;
        let tampered = general_purpose::STANDARD.encode(tampered);

        let result = engine.check_at("sid-1", &tampered, T0).await;
        assert!(
            matches!(result, Err(CsrfError::MalformedToken)),
            "byte {} accepted: {:?}",
            i,
            result
        );
    }

    assert!(repo.is_empty().await);
    assert!(engine.check_at("sid-1", &token, T0).await.unwrap());
}

#[tokio::test]
async fn token_is_bound_to_its_session() {
    let (engine, repo) = engine();
    let token = engine.create("sid-a", T0).unwrap();

    assert!(!engine.check_at("sid-b", &token, T0).await.unwrap());
    assert!(!engine.check_at("sid-a-longer", &token, T0).await.unwrap());
    assert!(repo.is_empty().await);

    // A mismatched attempt must not burn the token for its owner.
    assert!(engine.check_at("sid-a", &token, T0).await.unwrap());
}

#[tokio::test]
async fn expiry_boundary_is_inclusive() {
    let (engine, repo) = engine();

    let on_edge = engine.create("sid-1", T0).unwrap();
    assert!(engine.check_at("sid-1", &on_edge, T0 + WINDOW).await.unwrap());

    let past_edge = engine.create("sid-1", T0).unwrap();
    let result = engine.check_at("sid-1", &past_edge, T0 + WINDOW + 1).await;
    assert!(matches!(result, Err(CsrfError::Expired)));

    assert_eq!(
        repo.validate(&format!("csrf:{}", past_edge)).await.unwrap(),
        Lookup::NotFound
    );
}

#[tokio::test]
async fn garbage_is_malformed() {
    let (engine, _) = engine();

    for bad in ["not-base64!!", "", "AAAA", "AAAAAAAAAAAAAAAA"] {
        let result = engine.check_at("sid-1", bad, T0).await;
        assert!(matches!(result, Err(CsrfError::MalformedToken)), "{:?} -> {:?}", bad, result);
    }
}

#[tokio::test]
async fn token_from_another_secret_is_malformed() {
    let (engine, _) = engine();
    let other = CsrfEngine::new(&[1u8; 16], WINDOW, MemoryTokenRepository::new()).unwrap();
    let token = other.create("sid-1", T0).unwrap();

    assert!(matches!(
        engine.check_at("sid-1", &token, T0).await,
        Err(CsrfError::MalformedToken)
    ));
}

#[test]
fn secret_length_selects_cipher() {
    let repo = MemoryTokenRepository::new();
    for len in [16, 24, 32] {
        assert!(CsrfEngine::new(&vec![9u8; len], WINDOW, repo.clone()).is_ok());
    }
    for len in [0, 15, 17, 31, 33, 64] {
        assert!(matches!(
            CsrfEngine::new(&vec![9u8; len], WINDOW, repo.clone()),
            Err(CsrfError::InvalidKey(l)) if l == len
        ));
    }
}

#[tokio::test]
async fn aes256_round_trip() {
    let engine = CsrfEngine::new(&[3u8; 32], WINDOW, MemoryTokenRepository::new()).unwrap();
    let token = engine.create("sid-256", T0).unwrap();
    assert!(engine.check_at("sid-256", &token, T0 + 1).await.unwrap());
}

#[tokio::test]
async fn concrete_scenario() {
    let (engine, _) = engine();

    let tok = engine.create("sid-1", 1_700_000_000).unwrap();
    assert!(engine.check_at("sid-1", &tok, 1_700_000_000).await.unwrap());
    assert!(!engine.check_at("sid-1", &tok, 1_700_000_000).await.unwrap());

    let tok2 = engine.create("sid-1", 1_700_000_000).unwrap();
    assert!(matches!(
        engine.check_at("sid-1", &tok2, 1_700_003_601).await,
        Err(CsrfError::Expired)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_accept_exactly_one() {
    let (engine, _) = engine();
    let engine = Arc::new(engine);
    let token = engine.create("sid-1", T0).unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let engine = engine.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            engine.check_at("sid-1", &token, T0).await.unwrap()
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn store_failure_propagates_but_local_rejections_skip_the_store() {
    let engine = CsrfEngine::new(&SECRET, WINDOW, BrokenRepository).unwrap();
    let token = engine.create("sid-1", T0).unwrap();

    assert!(matches!(
        engine.check_at("sid-1", &token, T0).await,
        Err(CsrfError::Store(StoreError::Backend(_)))
    ));

    assert!(matches!(
        engine.check_at("sid-1", "not-base64!!", T0).await,
        Err(CsrfError::MalformedToken)
    ));
    assert!(matches!(
        engine.check_at("sid-1", &token, T0 + WINDOW + 1).await,
        Err(CsrfError::Expired)
    ));
    assert!(!engine.check_at("sid-2", &token, T0).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn far_future_token_is_rejected_every_time() {
    let (engine, repo) = engine();
    let token = engine.create("sid-1", T0 + 10 * WINDOW).unwrap();

    assert!(matches!(
        engine.check_at("sid-1", &token, T0).await,
        Err(CsrfError::MalformedToken)
    ));

    tokio::time::advance(Duration::from_secs(WINDOW as u64 + 1)).await;
    assert!(matches!(
        engine.check_at("sid-1", &token, T0 + WINDOW + 1).await,
        Err(CsrfError::MalformedToken)
    ));
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn small_clock_skew_is_tolerated() {
    let (engine, _) = engine();

    let ahead = engine.create("sid-1", T0 + MAX_CLOCK_SKEW_SECONDS).unwrap();
    assert!(engine.check_at("sid-1", &ahead, T0).await.unwrap());

    let too_far = engine.create("sid-1", T0 + MAX_CLOCK_SKEW_SECONDS + 1).unwrap();
    assert!(matches!(
        engine.check_at("sid-1", &too_far, T0).await,
        Err(CsrfError::MalformedToken)
    ));
}

#[tokio::test(start_paused = true)]
async fn replay_record_lives_as_long_as_a_skewed_token() {
    let (engine, _) = engine();
    let token = engine.create("sid-1", T0 + 30).unwrap();

    assert!(engine.check_at("sid-1", &token, T0).await.unwrap());

    // Past a plain window-sized TTL, but the token is still inside its window.
    tokio::time::advance(Duration::from_secs(WINDOW as u64 + 1)).await;
    assert!(!engine.check_at("sid-1", &token, T0 + WINDOW + 1).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn replay_record_ends_with_the_token() {
    let (engine, repo) = engine();
    let token = engine.create("sid-1", T0).unwrap();

    assert!(engine.check_at("sid-1", &token, T0 + WINDOW - 10).await.unwrap());
    assert_eq!(repo.len().await, 1);

    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(repo.is_empty().await);
    assert!(matches!(
        engine.check_at("sid-1", &token, T0 + WINDOW + 1).await,
        Err(CsrfError::Expired)
    ));
}
