use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_library::models::{NewCanvasEmbed, NewUser};
use core_library::repositories::PageRequest;
use core_library::RejectionReason;
use core_runtime::config::{GalleryConfig, StoreBackend};
use core_service::{ConnectionState, CoreError, GalleryService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const POST: &str = "https://www.instagram.com/p/CxYz123/";

// ============================================================================
// Test HTTP clients
// ============================================================================

/// Answers every oEmbed call with the same payload.
struct OEmbedOnly {
    calls: AtomicUsize,
}

#[async_trait]
impl HttpClient for OEmbedOnly {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.url.ends_with("instagram_oembed") {
            Ok(HttpResponse::new(
                200,
                r#"{"author_name":"natgeo","title":"Sunrise","thumbnail_url":"https://cdn.example.com/t.jpg"}"#,
            ))
        } else {
            Err(BridgeError::OperationFailed("unexpected request".to_string()))
        }
    }
}

/// Answers oEmbed like [`OEmbedOnly`], but only after 50 ms.
struct SlowOEmbed {
    calls: AtomicUsize,
}

#[async_trait]
impl HttpClient for SlowOEmbed {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        if request.url.ends_with("instagram_oembed") {
            Ok(HttpResponse::new(
                200,
                r#"{"author_name":"natgeo","title":"Sunrise","thumbnail_url":"https://cdn.example.com/t.jpg"}"#,
            ))
        } else {
            Err(BridgeError::OperationFailed("unexpected request".to_string()))
        }
    }
}

struct DeadNetwork;

#[async_trait]
impl HttpClient for DeadNetwork {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        Err(BridgeError::OperationFailed("network unreachable".to_string()))
    }
}

async fn service(http: Arc<dyn HttpClient>) -> GalleryService {
    let config = GalleryConfig::builder()
        .store(StoreBackend::Memory)
        .http_client(http)
        .build()
        .unwrap();
    GalleryService::bootstrap(config).await.unwrap()
}

async fn sqlite_service(http: Arc<dyn HttpClient>) -> GalleryService {
    let config = GalleryConfig::builder()
        .store(StoreBackend::Sqlite {
            database_url: "sqlite::memory:".to_string(),
        })
        .http_client(http)
        .build()
        .unwrap();
    GalleryService::bootstrap(config).await.unwrap()
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_fetch_image_persists_once() {
    let http = Arc::new(OEmbedOnly {
        calls: AtomicUsize::new(0),
    });
    let service = service(http.clone()).await;
    let user = service
        .create_user(NewUser::new("alice", false))
        .await
        .unwrap();

    let first = service.fetch_image(POST, &user.id).await.unwrap();
    assert_eq!(first.metadata.author_name, "natgeo");
    assert_eq!(first.metadata.attribution_text, "Photo by natgeo on Instagram");

    let second = service.fetch_image(POST, &user.id).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(http.calls.load(Ordering::SeqCst), 1);

    let recent = service.recent_images(PageRequest::default()).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn test_fetch_image_rejects_bad_url() {
    let service = service(Arc::new(DeadNetwork)).await;

    let result = service.fetch_image("https://example.com/p/x", "u1").await;
    assert!(matches!(result, Err(CoreError::InvalidUrl(_))));

    let result = service.fetch_metadata("not a url").await;
    assert!(matches!(result, Err(CoreError::Metadata(_))));
}

#[tokio::test]
async fn test_sqlite_backend_round_trip() {
    let http = Arc::new(OEmbedOnly {
        calls: AtomicUsize::new(0),
    });
    let service = sqlite_service(http).await;
    let user = service
        .create_user(NewUser::new("frank", true))
        .await
        .unwrap();

    let record = service.fetch_image(POST, &user.id).await.unwrap();
    assert_eq!(service.get_by_url(POST).await.unwrap(), Some(record));
}

#[tokio::test]
async fn test_unknown_user_is_rejected_after_persisting() {
    let http = Arc::new(OEmbedOnly {
        calls: AtomicUsize::new(0),
    });
    let service = service(http).await;

    let result = service.fetch_image(POST, "ghost").await;
    assert!(matches!(
        result,
        Err(CoreError::LicenseRejected {
            reason: RejectionReason::UserNotFound
        })
    ));
    assert!(service.get_by_url(POST).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_dead_network_still_produces_default_record() {
    let service = service(Arc::new(DeadNetwork)).await;
    let user = service
        .create_user(NewUser::new("bob", false))
        .await
        .unwrap();

    let record = service.fetch_image(POST, &user.id).await.unwrap();
    assert_eq!(record.metadata.title, "Instagram Post");
    assert_eq!(record.metadata.author_name, "Unknown");
}

#[tokio::test(start_paused = true)]
async fn test_business_user_blocked_on_non_commercial_image() {
    let service = service(Arc::new(DeadNetwork)).await;
    let business = service
        .create_user(NewUser::new("acme", true))
        .await
        .unwrap();

    let mut metadata = service.fetch_metadata(POST).await.unwrap();
    metadata.commercial_allowed = false;
    service.save(metadata).await.unwrap();

    let validation = service.validate_license(&business.id, POST).await;
    assert!(!validation.allowed);
    assert_eq!(
        validation.reason,
        Some(RejectionReason::CommercialUseNotAllowed)
    );
    assert!(validation.image.is_some());
}

// ============================================================================
// Batch and canvas
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_batch_fetch_mixed_input() {
    let http = Arc::new(OEmbedOnly {
        calls: AtomicUsize::new(0),
    });
    let service = service(http).await;
    let user = service
        .create_user(NewUser::new("carol", false))
        .await
        .unwrap();

    let urls = vec![
        POST.to_string(),
        "not-a-url".to_string(),
        "https://www.instagram.com/p/Abc_9/".to_string(),
    ];
    let report = service.batch_fetch(&urls, &user.id).await;

    assert_eq!(report.processed, 3);
    assert_eq!(report.successful.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].url, "not-a-url");
}

#[tokio::test(start_paused = true)]
async fn test_batch_with_repeated_url_stores_one_record() {
    let http = Arc::new(SlowOEmbed {
        calls: AtomicUsize::new(0),
    });
    let service = service(http.clone()).await;
    let user = service
        .create_user(NewUser::new("gina", false))
        .await
        .unwrap();

    let urls = vec![POST.to_string(), POST.to_string()];
    let report = service.batch_fetch(&urls, &user.id).await;

    assert_eq!(report.successful.len(), 2);
    assert!(report.failed.is_empty());
    assert_eq!(report.successful[0].id, report.successful[1].id);
    assert_eq!(http.calls.load(Ordering::SeqCst), 1);

    service.clear_caches().await;
    let stored: Vec<_> = service
        .recent_images(PageRequest::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|record| record.original_url() == POST)
        .collect();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, report.successful[0].id);
}

#[tokio::test]
async fn test_concurrent_create_user_conflicts() {
    let service = sqlite_service(Arc::new(DeadNetwork)).await;

    let (a, b) = tokio::join!(
        service.create_user(NewUser::new("hank", false)),
        service.create_user(NewUser::new("hank", true)),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert!(matches!(
        a.err().or(b.err()),
        Some(CoreError::Library(core_library::LibraryError::Conflict(_)))
    ));
}

#[tokio::test]
async fn test_canvas_embed_requires_known_image() {
    let http = Arc::new(OEmbedOnly {
        calls: AtomicUsize::new(0),
    });
    let service = service(http).await;
    let user = service
        .create_user(NewUser::new("dave", false))
        .await
        .unwrap();
    let record = service.fetch_image(POST, &user.id).await.unwrap();

    let embed = service
        .save_canvas_embed(NewCanvasEmbed {
            canvas_id: "board-1".to_string(),
            image_id: record.id.clone(),
            user_id: user.id.clone(),
            position: None,
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(embed.image_id, record.id);

    let missing = service
        .save_canvas_embed(NewCanvasEmbed {
            canvas_id: "board-1".to_string(),
            image_id: "nope".to_string(),
            user_id: user.id,
            position: None,
            note: None,
        })
        .await;
    assert!(missing.is_err());
}

// ============================================================================
// Operations
// ============================================================================

#[tokio::test]
async fn test_health_and_cache_maintenance() {
    let http = Arc::new(OEmbedOnly {
        calls: AtomicUsize::new(0),
    });
    let service = sqlite_service(http).await;
    let health = service.health().await;
    assert_eq!(health.database, ConnectionState::Connected);
    assert_eq!(
        serde_json::to_value(health).unwrap(),
        serde_json::json!({ "database": "connected" })
    );

    service.fetch_metadata(POST).await.unwrap();
    let stats = service.cache_stats().await;
    assert_eq!(stats.instagram.total_entries, 1);

    service.clear_caches().await;
    let stats = service.cache_stats().await;
    assert_eq!(stats.instagram.total_entries, 0);
    assert_eq!(stats.database.total_entries, 0);

    let shutdown = CancellationToken::new();
    let handles = service.start_maintenance(&shutdown);
    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}
