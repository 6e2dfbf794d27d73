//! End-to-end tests of the session lifecycle against PostgreSQL
//!
//! Each test truncates the schema first, so they run serially against a
//! dedicated database (`DATABASE_URL`) and are ignored by default:
//! `cargo test -p api -- --ignored`.

use api::{
    AppState,
    error::ApiError,
    models::{
        AddOrderRequest, CreateProductRequest, CreateTableRequest, InvoiceStatus, NewInvoice,
        OrderItem, OrderStatus, ProductCategory, SessionStatus, SessionType, StartSessionRequest,
        TableStatus,
    },
    routes, scheduler,
};
use auth::rate_limiter::{RateLimiter, RateLimiterConfig};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, FixedOffset, Utc};
use common::{
    database::{DatabaseConfig, init_pool, run_migrations},
    jwt::{JwtConfig, JwtService},
};
use serial_test::serial;
use tower::ServiceExt;

type TestResult = Result<(), Box<dyn std::error::Error>>;

struct Fixture {
    state: AppState,
    staff_id: i64,
    table_id: i64,
    tea_id: i64,
}

async fn setup() -> Result<Fixture, Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::from_env()?).await?;
    run_migrations(&pool).await?;

    sqlx::query(
        "TRUNCATE invoices, session_orders, table_sessions, products, tables, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;

    let staff_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, role) VALUES ('cashier', 'x', 'staff') RETURNING id",
    )
    .fetch_one(&pool)
    .await?;

    let state = AppState::new(
        pool,
        JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            token_expiry: 3600,
        }),
        RateLimiter::new(RateLimiterConfig::default()),
        FixedOffset::east_opt(0).ok_or("offset")?,
    );

    let table = state
        .table_repository
        .create(&CreateTableRequest {
            name: "Table 1".to_string(),
            hourly_rate: 100_000.0,
        })
        .await?;

    let tea = state
        .product_repository
        .create(&CreateProductRequest {
            name: "Iced tea".to_string(),
            category: ProductCategory::Drink,
            price: 20_000.0,
            description: String::new(),
        })
        .await?;

    Ok(Fixture {
        state,
        staff_id,
        table_id: table.id,
        tea_id: tea.id,
    })
}

fn start_request(table_id: i64, minutes: i32) -> StartSessionRequest {
    StartSessionRequest {
        table_id,
        customer_name: "Minh".to_string(),
        preset_duration_minutes: minutes,
        prepaid_amount: 0.0,
        session_type: SessionType::FixedTime,
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_start_marks_table_occupied_and_rejects_second_start() -> TestResult {
    let f = setup().await?;
    let sessions = &f.state.session_repository;

    let session = sessions
        .start(&start_request(f.table_id, 60), f.staff_id, Utc::now())
        .await?;
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.remaining_minutes, Some(60));
    assert_eq!(session.hourly_rate, 100_000.0);

    let table = f.state.table_repository.find_by_id(f.table_id).await?.ok_or("table")?;
    assert_eq!(table.status, TableStatus::Occupied);

    let second = sessions
        .start(&start_request(f.table_id, 30), f.staff_id, Utc::now())
        .await;
    assert!(matches!(second, Err(ApiError::Conflict(_))));

    let missing = sessions
        .start(&start_request(9_999, 30), f.staff_id, Utc::now())
        .await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_end_session_issues_invoice_for_fixed_time() -> TestResult {
    let f = setup().await?;
    let start = Utc::now() - Duration::minutes(95);

    let session = f
        .state
        .session_repository
        .start(&start_request(f.table_id, 90), f.staff_id, start)
        .await?;

    f.state
        .order_repository
        .add_items(&AddOrderRequest {
            session_id: session.id,
            items: vec![OrderItem {
                product_id: f.tea_id,
                quantity: 2,
                note: None,
            }],
        })
        .await?;

    let now = Utc::now();
    let ended = f.state.session_repository.end(session.id, now).await?;
    assert_eq!(ended.status, SessionStatus::Completed);
    assert_eq!(ended.actual_duration_minutes, Some(95));

    let invoice = f
        .state
        .invoice_issuer
        .issue_for_session(session.id, f.staff_id, now)
        .await?;
    assert_eq!(invoice.table_amount, 150_000.0);
    assert_eq!(invoice.orders_amount, 40_000.0);
    assert_eq!(invoice.amount, 190_000.0);
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.services_detail, "- Iced tea x2: 40000 VND\n");

    let table = f.state.table_repository.find_by_id(f.table_id).await?.ok_or("table")?;
    assert_eq!(table.status, TableStatus::Available);

    // A second end or a second invoice is refused
    assert!(matches!(
        f.state.session_repository.end(session.id, now).await,
        Err(ApiError::Conflict(_))
    ));
    assert!(matches!(
        f.state
            .invoice_issuer
            .issue_for_session(session.id, f.staff_id, now)
            .await,
        Err(ApiError::Conflict(_))
    ));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_order_batch_is_all_or_nothing() -> TestResult {
    let f = setup().await?;
    let session = f
        .state
        .session_repository
        .start(&start_request(f.table_id, 60), f.staff_id, Utc::now())
        .await?;

    let result = f
        .state
        .order_repository
        .add_items(&AddOrderRequest {
            session_id: session.id,
            items: vec![
                OrderItem {
                    product_id: f.tea_id,
                    quantity: 1,
                    note: None,
                },
                OrderItem {
                    product_id: 9_999,
                    quantity: 1,
                    note: None,
                },
            ],
        })
        .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let orders = f.state.order_repository.list_for_session(session.id).await?;
    assert!(orders.is_empty());

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_cancelled_orders_are_not_billed() -> TestResult {
    let f = setup().await?;
    let session = f
        .state
        .session_repository
        .start(&start_request(f.table_id, 60), f.staff_id, Utc::now())
        .await?;

    let orders = f
        .state
        .order_repository
        .add_items(&AddOrderRequest {
            session_id: session.id,
            items: vec![
                OrderItem {
                    product_id: f.tea_id,
                    quantity: 1,
                    note: None,
                },
                OrderItem {
                    product_id: f.tea_id,
                    quantity: 3,
                    note: Some("less ice".to_string()),
                },
            ],
        })
        .await?;
    assert_eq!(orders.len(), 2);

    let large = orders.iter().find(|o| o.quantity == 3).ok_or("order")?;
    f.state
        .order_repository
        .update_status(large.id, OrderStatus::Cancelled)
        .await?;

    let total = f.state.order_repository.total_for_session(session.id).await?;
    assert_eq!(total, 20_000.0);

    assert!(matches!(
        f.state
            .order_repository
            .update_status(large.id, OrderStatus::Served)
            .await,
        Err(ApiError::Conflict(_))
    ));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_expire_is_idempotent() -> TestResult {
    let f = setup().await?;
    let session = f
        .state
        .session_repository
        .start(&start_request(f.table_id, 30), f.staff_id, Utc::now())
        .await?;

    // Not due yet
    let summary = scheduler::expire_sessions(&f.state, Utc::now()).await?;
    assert!(summary.expired_sessions.is_empty());

    f.state
        .session_repository
        .update_remaining_time(session.id, 0)
        .await?;

    let summary = scheduler::expire_sessions(&f.state, Utc::now()).await?;
    assert_eq!(summary.expired_sessions, vec![session.id]);
    assert_eq!(summary.invoices_created.len(), 1);
    assert!(summary.invoice_errors.is_empty());

    let expired = f.state.session_repository.get(session.id).await?;
    assert_eq!(expired.status, SessionStatus::Expired);
    let table = f.state.table_repository.find_by_id(f.table_id).await?.ok_or("table")?;
    assert_eq!(table.status, TableStatus::Available);

    let again = scheduler::expire_sessions(&f.state, Utc::now()).await?;
    assert!(again.expired_sessions.is_empty());
    assert!(again.invoices_created.is_empty());

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_rate_change_does_not_affect_running_session() -> TestResult {
    let f = setup().await?;
    let session = f
        .state
        .session_repository
        .start(&start_request(f.table_id, 60), f.staff_id, Utc::now())
        .await?;

    f.state
        .table_repository
        .update_rate(f.table_id, 150_000.0)
        .await?;

    let reloaded = f.state.session_repository.get(session.id).await?;
    assert_eq!(reloaded.hourly_rate, 100_000.0);

    let now = Utc::now();
    f.state.session_repository.end(session.id, now).await?;
    let invoice = f
        .state
        .invoice_issuer
        .issue_for_session(session.id, f.staff_id, now)
        .await?;
    assert_eq!(invoice.hourly_rate, 100_000.0);
    assert_eq!(invoice.table_amount, 100_000.0);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_add_minutes_extends_preset_and_remaining() -> TestResult {
    let f = setup().await?;
    let session = f
        .state
        .session_repository
        .start(&start_request(f.table_id, 60), f.staff_id, Utc::now())
        .await?;

    let extended = f.state.session_repository.add_minutes(session.id, 30).await?;
    assert_eq!(extended.preset_duration_minutes, 90);
    assert_eq!(extended.remaining_minutes, Some(90));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_end_session_survives_invoice_failure() -> TestResult {
    let f = setup().await?;
    let session = f
        .state
        .session_repository
        .start(&start_request(f.table_id, 60), f.staff_id, Utc::now())
        .await?;

    // Occupy the session's invoice slot so issuing at end fails
    let now = Utc::now();
    f.state
        .invoice_repository
        .create(&NewInvoice {
            session_id: Some(session.id),
            customer_name: None,
            table_name: "Table 1".to_string(),
            start_time: now,
            end_time: now,
            play_duration_minutes: 0,
            hourly_rate: 0.0,
            table_amount: 0.0,
            orders_amount: 0.0,
            discount: 0.0,
            amount: 0.0,
            services_detail: String::new(),
            created_by: f.staff_id,
        })
        .await?;

    let token = f
        .state
        .jwt_service
        .generate_token(f.staff_id, "cashier", "staff")?;
    let response = routes::create_router(f.state.clone())
        .oneshot(
            Request::post(format!("/tables/sessions/{}/end", session.id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert!(body["invoice_id"].is_null());
    assert_eq!(body["total_amount"], 0.0);
    assert_eq!(body["invoice_error"], "Session already has an invoice");
    assert_eq!(body["session"]["status"], "completed");

    let ended = f.state.session_repository.get(session.id).await?;
    assert_eq!(ended.status, SessionStatus::Completed);
    let table = f.state.table_repository.find_by_id(f.table_id).await?.ok_or("table")?;
    assert_eq!(table.status, TableStatus::Available);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_concurrent_starts_on_one_table() -> TestResult {
    let f = setup().await?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sessions = f.state.session_repository.clone();
            let req = start_request(f.table_id, 60);
            let staff_id = f.staff_id;
            tokio::spawn(async move { sessions.start(&req, staff_id, Utc::now()).await })
        })
        .collect();

    let mut started = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => started += 1,
            Err(ApiError::Conflict(_)) => conflicts += 1,
            Err(e) => return Err(e.into()),
        }
    }
    assert_eq!(started, 1);
    assert_eq!(conflicts, 7);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM table_sessions WHERE table_id = $1")
        .bind(f.table_id)
        .fetch_one(&f.state.db_pool)
        .await?;
    assert_eq!(rows, 1);

    Ok(())
}
