//! Local stand-in for the order API.
//!
//! `POST /orders/sync` holds a single-permit payment lock for a configurable time before
//! answering, so synchronous orders serialize behind each other. `POST /orders/async`
//! only enqueues the order for background workers and answers `202` straight away.
use async_channel::{bounded, Receiver, Sender};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use orderload_core::{LineItem, OrderPayload, ASYNC_PATH, HEALTH_PATH, SYNC_PATH};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::num::NonZeroU64;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
#[allow(unused)]
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct OrderServiceConfig {
    /// How long a synchronous order holds the payment lock.
    pub payment_delay: Duration,
    /// Background workers draining the async queue.
    pub workers: usize,
    /// How long a worker spends on one queued order.
    pub processing_delay: Duration,
    pub queue_capacity: usize,
    /// Answer every Nth order request with a 500.
    pub fail_every: Option<NonZeroU64>,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            payment_delay: Duration::from_secs(3),
            workers: 1,
            processing_delay: Duration::from_secs(3),
            queue_capacity: 1024,
            fail_every: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub customer_id: u32,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Order {
    fn pending(payload: OrderPayload) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            customer_id: payload.customer_id,
            status: OrderStatus::Pending,
            items: payload.items,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Accepted {
    pub message: String,
    pub order_id: Uuid,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid order payload")]
    InvalidPayload(#[from] JsonRejection),

    #[error("Failed to queue order")]
    QueueUnavailable,

    #[error("Payment processor unavailable")]
    PaymentUnavailable,

    #[error("Injected failure")]
    Injected,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::PaymentUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::QueueUnavailable | ApiError::Injected => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Per-route counts, for asserting on what a load test actually sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub sync: u64,
    pub async_accepted: u64,
    pub processed: u64,
    pub rejected: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    sync: AtomicU64,
    async_accepted: AtomicU64,
    processed: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

#[derive(Clone)]
pub struct OrderService {
    inner: Arc<Inner>,
}

struct Inner {
    config: OrderServiceConfig,
    payment: Semaphore,
    queue: Sender<Order>,
    counters: Arc<Counters>,
    requests: AtomicU64,
}

impl OrderService {
    /// Create the service and start its queue workers. Must be called within a tokio
    /// runtime.
    pub fn start(config: OrderServiceConfig) -> Self {
        let (tx, rx) = bounded(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());

        for id in 0..config.workers {
            tokio::spawn(worker(
                id,
                rx.clone(),
                counters.clone(),
                config.processing_delay,
            ));
        }

        Self {
            inner: Arc::new(Inner {
                config,
                payment: Semaphore::new(1),
                queue: tx,
                counters,
                requests: AtomicU64::new(0),
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(SYNC_PATH, post(sync_order))
            .route(ASYNC_PATH, post(async_order))
            .route(HEALTH_PATH, get(health))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    pub fn counters(&self) -> CounterSnapshot {
        let c = &self.inner.counters;
        CounterSnapshot {
            sync: c.sync.load(Ordering::Relaxed),
            async_accepted: c.async_accepted.load(Ordering::Relaxed),
            processed: c.processed.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }

    fn accept(
        &self,
        payload: Result<Json<OrderPayload>, JsonRejection>,
    ) -> Result<OrderPayload, ApiError> {
        let Json(payload) = payload.map_err(|rejection| {
            self.inner.counters.rejected.fetch_add(1, Ordering::Relaxed);
            ApiError::from(rejection)
        })?;

        let n = self.inner.requests.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(every) = self.inner.config.fail_every {
            if n % every.get() == 0 {
                self.inner.counters.failed.fetch_add(1, Ordering::Relaxed);
                return Err(ApiError::Injected);
            }
        }

        Ok(payload)
    }

    async fn verify_payment(&self) -> Result<(), ApiError> {
        let _permit = self
            .inner
            .payment
            .acquire()
            .await
            .map_err(|_| ApiError::PaymentUnavailable)?;
        tokio::time::sleep(self.inner.config.payment_delay).await;
        Ok(())
    }
}

async fn sync_order(
    State(service): State<OrderService>,
    payload: Result<Json<OrderPayload>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let mut order = Order::pending(service.accept(payload)?);
    debug!("SYNC: received order {}", order.order_id);

    service.verify_payment().await?;

    order.status = OrderStatus::Completed;
    service.inner.counters.sync.fetch_add(1, Ordering::Relaxed);
    metrics::counter!("mock-service.orders", "route" => "sync").increment(1);
    Ok(Json(order))
}

async fn async_order(
    State(service): State<OrderService>,
    payload: Result<Json<OrderPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    let order = Order::pending(service.accept(payload)?);
    let order_id = order.order_id;
    debug!("ASYNC: received order {order_id}");

    service.inner.queue.try_send(order).map_err(|err| {
        error!("Failed to queue order {order_id}: {err}");
        ApiError::QueueUnavailable
    })?;

    service
        .inner
        .counters
        .async_accepted
        .fetch_add(1, Ordering::Relaxed);
    metrics::counter!("mock-service.orders", "route" => "async").increment(1);
    Ok((
        StatusCode::ACCEPTED,
        Json(Accepted {
            message: "Order accepted for processing".to_string(),
            order_id,
        }),
    ))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn worker(id: usize, rx: Receiver<Order>, counters: Arc<Counters>, delay: Duration) {
    debug!("Worker {id} started");
    while let Ok(mut order) = rx.recv().await {
        order.status = OrderStatus::Processing;
        tokio::time::sleep(delay).await;
        order.status = OrderStatus::Completed;
        counters.processed.fetch_add(1, Ordering::Relaxed);
        debug!("Worker {id}: order {} {:?}", order.order_id, order.status);
    }
    debug!("Worker {id} stopped");
}

/// Bind `addr` and serve in a background task. Returns the bound address, which differs
/// from `addr` when port 0 is requested.
pub async fn spawn(
    addr: SocketAddr,
    config: OrderServiceConfig,
) -> std::io::Result<(SocketAddr, OrderService)> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let service = OrderService::start(config);
    let app = service.router();

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Mock order service stopped: {err}");
        }
    });

    Ok((local_addr, service))
}

/// Serve on `addr` until the process exits.
pub async fn run(addr: SocketAddr, config: OrderServiceConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mock order service listening on {}", listener.local_addr()?);
    let service = OrderService::start(config);
    axum::serve(listener, service.router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    fn payload(customer_id: u32) -> OrderPayload {
        OrderPayload {
            customer_id,
            items: vec![
                LineItem {
                    item_id: "item-a".to_string(),
                    quantity: 2,
                },
                LineItem {
                    item_id: "item-b".to_string(),
                    quantity: 1,
                },
            ],
        }
    }

    fn fast_config() -> OrderServiceConfig {
        OrderServiceConfig {
            payment_delay: Duration::from_millis(5),
            processing_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    async fn start(config: OrderServiceConfig) -> (String, OrderService) {
        let (addr, service) = spawn("127.0.0.1:0".parse().unwrap(), config)
            .await
            .unwrap();
        (format!("http://{addr}"), service)
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn sync_completes_order() {
        let (base, service) = start(fast_config()).await;

        let res = Client::new()
            .post(format!("{base}{SYNC_PATH}"))
            .json(&payload(7))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);

        let order: Order = res.json().await.unwrap();
        assert_eq!(order.customer_id, 7);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.items.len(), 2);
        assert_eq!(service.counters().sync, 1);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn sync_orders_serialize_on_payment() {
        let config = OrderServiceConfig {
            payment_delay: Duration::from_millis(100),
            ..fast_config()
        };
        let (base, _service) = start(config).await;
        let client = Client::new();

        let start = tokio::time::Instant::now();
        let send = |id| {
            client
                .post(format!("{base}{SYNC_PATH}"))
                .json(&payload(id))
                .send()
        };
        let (a, b) = tokio::join!(send(1), send(2));
        assert!(a.unwrap().status().is_success());
        assert!(b.unwrap().status().is_success());
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn async_accepts_and_processes() {
        let (base, service) = start(fast_config()).await;

        let res = Client::new()
            .post(format!("{base}{ASYNC_PATH}"))
            .json(&payload(9))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);
        let accepted: Accepted = res.json().await.unwrap();
        assert_eq!(accepted.message, "Order accepted for processing");

        while service.counters().processed == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(service.counters().async_accepted, 1);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn invalid_payload_is_rejected() {
        let (base, service) = start(fast_config()).await;

        let res = Client::new()
            .post(format!("{base}{SYNC_PATH}"))
            .json(&serde_json::json!({"customer": "nobody"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Invalid order payload");
        assert_eq!(service.counters().rejected, 1);
        assert_eq!(service.counters().sync, 0);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn injected_failures() {
        let config = OrderServiceConfig {
            fail_every: NonZeroU64::new(2),
            ..fast_config()
        };
        let (base, service) = start(config).await;
        let client = Client::new();

        let mut statuses = vec![];
        for id in 0..4 {
            let res = client
                .post(format!("{base}{ASYNC_PATH}"))
                .json(&payload(id))
                .send()
                .await
                .unwrap();
            statuses.push(res.status().as_u16());
        }

        assert_eq!(statuses, vec![202, 500, 202, 500]);
        assert_eq!(service.counters().failed, 2);
        assert_eq!(service.counters().async_accepted, 2);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn health() {
        let (base, _service) = start(fast_config()).await;
        let res = reqwest::get(format!("{base}{HEALTH_PATH}")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
    }
}
