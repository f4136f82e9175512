use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tower::util::ServiceExt;
use village_portal::{
    AppState,
    auth::AuthUser,
    backend::{BackendError, MockBackendApi},
    config::AppConfig,
    create_router, handlers,
    mailer::MockMailTransport,
    models::{
        DispatchResponse, LoginRequest, NotificationContent, NotificationRequest, Role,
        SessionGrant, Subscriber,
    },
};

// --- Test Utilities ---

/// Creates an AppState from mock components. The inter-send delay is zeroed so
/// dispatch-heavy tests run instantly.
fn create_test_state(backend: MockBackendApi, mailer: Arc<MockMailTransport>) -> AppState {
    AppState {
        backend: Arc::new(backend),
        mailer,
        config: AppConfig {
            mail_send_delay_ms: 0,
            ..AppConfig::default()
        },
    }
}

fn admin_user() -> AuthUser {
    AuthUser {
        token: "admin-token".to_string(),
        role: Role::Admin,
    }
}

fn member_user() -> AuthUser {
    AuthUser {
        token: "member-token".to_string(),
        role: Role::Member,
    }
}

fn login_payload() -> LoginRequest {
    LoginRequest {
        email: "clerk@village.example".to_string(),
        password: "hunter2".to_string(),
    }
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("response body must deserialize")
}

// --- Login / Logout Tests ---

#[tokio::test]
async fn test_login_sets_session_cookie_and_reports_landing_path() {
    let backend = MockBackendApi {
        login_response: Ok(SessionGrant {
            token: "fresh-token".to_string(),
            role: Role::Admin,
        }),
        ..MockBackendApi::new()
    };
    let state = create_test_state(backend, Arc::new(MockMailTransport::new()));

    let result = handlers::login(State(state), Json(login_payload())).await;

    let response = result.expect("login must succeed").into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login must set the session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth_token=fresh-token"));
    assert!(cookie.contains("HttpOnly"));

    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["landing_path"], "/dashboard/admin");
}

#[tokio::test]
async fn test_login_rejected_credentials_map_to_unauthorized() {
    let backend = MockBackendApi {
        login_response: Err(BackendError::Status(401)),
        ..MockBackendApi::new()
    };
    let state = create_test_state(backend, Arc::new(MockMailTransport::new()));

    let result = handlers::login(State(state), Json(login_payload())).await;

    assert_eq!(result.err(), Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn test_login_backend_outage_maps_to_bad_gateway() {
    let backend = MockBackendApi {
        login_response: Err(BackendError::Transport("refused".to_string())),
        ..MockBackendApi::new()
    };
    let state = create_test_state(backend, Arc::new(MockMailTransport::new()));

    let result = handlers::login(State(state), Json(login_payload())).await;

    assert_eq!(result.err(), Some(StatusCode::BAD_GATEWAY));
}

#[tokio::test]
async fn test_logout_clears_cookie_even_without_a_session() {
    let state = create_test_state(MockBackendApi::new(), Arc::new(MockMailTransport::new()));

    let response = handlers::logout(State(state), HeaderMap::new())
        .await
        .into_response();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("logout must clear the cookie")
        .to_str()
        .unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

// --- Session Tests ---

#[tokio::test]
async fn test_get_session_reports_role_and_landing_path() {
    let Json(info) = handlers::get_session(member_user()).await;

    assert_eq!(info.role, Role::Member);
    assert_eq!(info.landing_path, "/dashboard/member");
}

#[tokio::test]
async fn test_session_route_rejects_anonymous_requests() {
    let app = create_router(create_test_state(
        MockBackendApi::new(),
        Arc::new(MockMailTransport::new()),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_route_resolves_role_from_cookie() {
    let app = create_router(create_test_state(
        MockBackendApi::with_role(Role::Admin),
        Arc::new(MockMailTransport::new()),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/session")
                .header(header::COOKIE, "auth_token=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body["role"], "admin");
}

// --- Notification Dispatch Handler Tests ---

fn announcement_request() -> NotificationRequest {
    NotificationRequest {
        job_type: "announcement".to_string(),
        data: NotificationContent {
            title: "Water outage".to_string(),
            body: "Maintenance on the north main.".to_string(),
            link: None,
        },
    }
}

fn two_subscribers() -> Vec<Subscriber> {
    vec![
        Subscriber {
            email: "a@example.org".to_string(),
            token: "t-a".to_string(),
        },
        Subscriber {
            email: "b@example.org".to_string(),
            token: "t-b".to_string(),
        },
    ]
}

#[tokio::test]
async fn test_dispatch_forbidden_for_members() {
    let mailer = Arc::new(MockMailTransport::new());
    let state = create_test_state(
        MockBackendApi::with_subscribers(two_subscribers()),
        mailer.clone(),
    );

    let result =
        handlers::dispatch_notifications(member_user(), State(state), Json(announcement_request()))
            .await;

    assert_eq!(result.err(), Some(StatusCode::FORBIDDEN));
    assert_eq!(mailer.attempt_count(), 0, "no mail on a forbidden request");
}

#[tokio::test]
async fn test_dispatch_success_reports_accounting() {
    let mailer = Arc::new(MockMailTransport::new());
    let state = create_test_state(
        MockBackendApi::with_subscribers(two_subscribers()),
        mailer.clone(),
    );

    let result =
        handlers::dispatch_notifications(admin_user(), State(state), Json(announcement_request()))
            .await;

    let Json(response): Json<DispatchResponse> = result.expect("dispatch must complete");
    assert!(response.success);
    assert_eq!(response.results.total, 2);
    assert_eq!(response.results.success, 2);
    assert_eq!(response.results.failed, 0);
    assert_eq!(
        response.results.details.success,
        vec!["a@example.org", "b@example.org"]
    );
    assert_eq!(mailer.attempt_count(), 2);
}

#[tokio::test]
async fn test_dispatch_partial_failure_still_returns_ok() {
    let mailer = Arc::new(MockMailTransport::failing_for(&["b@example.org"]));
    let state = create_test_state(
        MockBackendApi::with_subscribers(two_subscribers()),
        mailer.clone(),
    );

    let result =
        handlers::dispatch_notifications(admin_user(), State(state), Json(announcement_request()))
            .await;

    let Json(response): Json<DispatchResponse> = result.expect("partial failure is not an error");
    assert!(response.success);
    assert_eq!(response.results.total, 2);
    assert_eq!(response.results.success, 1);
    assert_eq!(response.results.failed, 1);
    assert_eq!(response.results.details.failed[0].email, "b@example.org");
}

#[tokio::test]
async fn test_dispatch_unknown_type_maps_to_unprocessable() {
    let mailer = Arc::new(MockMailTransport::new());
    let state = create_test_state(
        MockBackendApi::with_subscribers(two_subscribers()),
        mailer.clone(),
    );
    let bogus = NotificationRequest {
        job_type: "bogus".to_string(),
        data: NotificationContent::default(),
    };

    let result = handlers::dispatch_notifications(admin_user(), State(state), Json(bogus)).await;

    assert_eq!(
        result.err(),
        Some(StatusCode::UNPROCESSABLE_ENTITY)
    );
    assert_eq!(mailer.attempt_count(), 0);
}

#[tokio::test]
async fn test_dispatch_subscriber_fetch_failure_maps_to_bad_gateway() {
    let mailer = Arc::new(MockMailTransport::new());
    let backend = MockBackendApi {
        subscriber_response: Err(BackendError::Transport("refused".to_string())),
        ..MockBackendApi::new()
    };
    let state = create_test_state(backend, mailer.clone());

    let result =
        handlers::dispatch_notifications(admin_user(), State(state), Json(announcement_request()))
            .await;

    assert_eq!(result.err(), Some(StatusCode::BAD_GATEWAY));
    assert_eq!(mailer.attempt_count(), 0);
}
