//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Inspections
        .route(
            "/inspecciones",
            get(handlers::list_inspections).post(handlers::create_inspection),
        )
        .route("/inspecciones/export/csv", get(handlers::export_csv))
        .route(
            "/inspecciones/:id",
            get(handlers::get_inspection).delete(handlers::delete_inspection),
        )
        .route("/inspecciones/:id/estado", patch(handlers::change_status))
        .route("/inspecciones/:id/mutabilidad", get(handlers::get_mutability))
        .route("/inspecciones/:id/custodia", get(handlers::verify_custody))
        // Evidence
        .route("/inspecciones/:id/fotos", post(handlers::upload_photos))
        .route(
            "/inspecciones/:id/fotos/:photo_id",
            delete(handlers::delete_photo),
        )
        .route("/inspecciones/:id/firma", post(handlers::upload_signature))
        // Catalogs
        .route(
            "/plantas",
            get(handlers::list_plants).post(handlers::create_plant),
        )
        .route(
            "/plantas/:id",
            put(handlers::update_plant).delete(handlers::delete_plant),
        )
        .route(
            "/navieras",
            get(handlers::list_shipping_lines).post(handlers::create_shipping_line),
        )
        .route(
            "/navieras/:id",
            put(handlers::update_shipping_line).delete(handlers::delete_shipping_line),
        )
        // Users
        .route(
            "/usuarios",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/usuarios/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .route("/usuarios/:id/estado", patch(handlers::set_user_status))
        // Reports
        .route("/estadisticas/dashboard", get(handlers::get_dashboard))
        .route("/reportes/resumen", get(handlers::get_summary))
        // Notifications
        .route("/notificaciones", get(handlers::list_notifications))
        .route(
            "/notificaciones/:id/leida",
            post(handlers::mark_notification_read),
        )
        // Events
        .route("/events", get(handlers::get_events))
        .route("/events/stream", get(handlers::stream_events));

    // Build router with middleware
    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let router = if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::extract::USER_ID_HEADER;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use inspection_engine::{
        EngineConfig, InMemoryStorage, MemoryBlobStore, PlantStorage, ShippingLineStorage,
        UserStorage,
    };
    use inspection_types::{Plant, Role, ShippingLine, User, UserStatus};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "XBOUNDARYX";

    struct Fixture {
        app: Router,
        admin: User,
        supervisor: User,
        inspector: User,
        retired: User,
        plant: Plant,
        line: ShippingLine,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStorage::new());
        let admin = User::new("Ada".into(), "ada@example.com".into(), Role::Admin);
        let supervisor = User::new("Sam".into(), "sam@example.com".into(), Role::Supervisor);
        let inspector = User::new("Ines".into(), "ines@example.com".into(), Role::Inspector);
        let mut retired = User::new("Old".into(), "old@example.com".into(), Role::Admin);
        retired.status = UserStatus::Inactive;
        for user in [&admin, &supervisor, &inspector, &retired] {
            store.upsert_user(user.clone()).await.unwrap();
        }
        let plant = Plant::new("P1".into(), "North".into(), None);
        let line = ShippingLine::new("L1".into(), "Blue Line".into());
        store.upsert_plant(plant.clone()).await.unwrap();
        store.upsert_shipping_line(line.clone()).await.unwrap();

        let state = AppState::new(
            store,
            Arc::new(MemoryBlobStore::new()),
            EngineConfig::default(),
        );
        Fixture {
            app: create_router(state, &ServerConfig::default()),
            admin,
            supervisor,
            inspector,
            retired,
            plant,
            line,
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn json_call(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.id.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        call(app, request).await
    }

    async fn upload_photos(app: &Router, user: &User, id: &str, count: u8) -> (StatusCode, Value) {
        let mut body = Vec::new();
        for n in 0..count {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"p{n}.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&[0xFF, 0xD8, n]);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/inspecciones/{id}/fotos"))
            .header(USER_ID_HEADER, user.id.to_string())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        call(app, request).await
    }

    async fn create(f: &Fixture) -> String {
        let (status, body) = json_call(
            &f.app,
            Method::POST,
            "/api/v1/inspecciones",
            Some(&f.inspector),
            Some(json!({
                "container_number": "ABCD1234567",
                "plant_id": f.plant.id,
                "shipping_line_id": f.line.id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn decide(f: &Fixture, user: &User, id: &str, body: Value) -> (StatusCode, Value) {
        json_call(
            &f.app,
            Method::PATCH,
            &format!("/api/v1/inspecciones/{id}/estado"),
            Some(user),
            Some(body),
        )
        .await
    }

    #[tokio::test]
    async fn test_health_needs_no_caller() {
        let f = fixture().await;
        let (status, body) = json_call(&f.app, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_caller_resolution() {
        let f = fixture().await;

        let (status, body) =
            json_call(&f.app, Method::GET, "/api/v1/inspecciones", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        let stranger = User::new("X".into(), "x@example.com".into(), Role::Admin);
        let (status, _) =
            json_call(&f.app, Method::GET, "/api/v1/inspecciones", Some(&stranger), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            json_call(&f.app, Method::GET, "/api/v1/usuarios", Some(&f.admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, body) = json_call(
            &f.app,
            Method::GET,
            "/api/v1/usuarios?include_inactive=true",
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (status, body) =
            json_call(&f.app, Method::GET, "/api/v1/plantas", Some(&f.retired), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_create_and_list_scoped() {
        let f = fixture().await;
        let id = create(&f).await;

        let (status, body) =
            json_call(&f.app, Method::GET, "/api/v1/inspecciones", Some(&f.inspector), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["status"], "pending");
        assert!(body["items"][0]["code"].as_str().unwrap().starts_with("INS_"));

        let (status, body) = json_call(
            &f.app,
            Method::GET,
            &format!("/api/v1/inspecciones/{id}"),
            Some(&f.supervisor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plant"]["name"], "North");
        assert_eq!(body["mutability"]["can_attach"], true);

        let (status, _) = json_call(
            &f.app,
            Method::GET,
            "/api/v1/inspecciones?page_size=500",
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = fixture().await;
        let (status, body) = json_call(
            &f.app,
            Method::POST,
            "/api/v1/inspecciones",
            Some(&f.inspector),
            Some(json!({
                "container_number": "ABCD1234567",
                "plant_id": uuid::Uuid::new_v4(),
                "shipping_line_id": f.line.id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = json_call(
            &f.app,
            Method::POST,
            "/api/v1/inspecciones",
            Some(&f.inspector),
            Some(json!({ "container_number": "ABCD1234567" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inspector_cannot_decide() {
        let f = fixture().await;
        let id = create(&f).await;

        let (status, body) = decide(&f, &f.inspector, &id, json!({ "estado": "approved" })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (_, body) = json_call(
            &f.app,
            Method::GET,
            &format!("/api/v1/inspecciones/{id}"),
            Some(&f.inspector),
            None,
        )
        .await;
        assert_eq!(body["status"], "pending");
    }

    #[tokio::test]
    async fn test_reject_requires_comment_then_locks() {
        let f = fixture().await;
        let id = create(&f).await;

        let (status, body) = decide(
            &f,
            &f.supervisor,
            &id,
            json!({ "estado": "rejected", "comentario": "   " }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = decide(
            &f,
            &f.supervisor,
            &id,
            json!({ "estado": "rejected", "comentario": "missing seal" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["decision"]["comment"], "missing seal");

        let (status, body) = decide(&f, &f.admin, &id, json!({ "estado": "approved" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = decide(&f, &f.admin, &id, json!({ "estado": "pending" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_approved_evidence_is_locked() {
        let f = fixture().await;
        let id = create(&f).await;

        let (status, photos) = upload_photos(&f.app, &f.inspector, &id, 3).await;
        assert_eq!(status, StatusCode::CREATED, "{photos}");
        let photos = photos.as_array().unwrap().clone();
        assert_eq!(photos.len(), 3);
        assert_eq!(photos[2]["sequence"], 3);

        let (status, _) = decide(&f, &f.supervisor, &id, json!({ "estado": "approved" })).await;
        assert_eq!(status, StatusCode::OK);

        for photo in &photos {
            let photo_id = photo["id"].as_str().unwrap();
            let (status, body) = json_call(
                &f.app,
                Method::DELETE,
                &format!("/api/v1/inspecciones/{id}/fotos/{photo_id}"),
                Some(&f.supervisor),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::CONFLICT);
            assert!(body["error"].as_str().unwrap().contains("evidence locked"));
        }

        let (_, detail) = json_call(
            &f.app,
            Method::GET,
            &format!("/api/v1/inspecciones/{id}"),
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(detail["photos"].as_array().unwrap().len(), 3);
        assert_eq!(detail["mutability"]["is_immutable"], true);

        let (status, _) = upload_photos(&f.app, &f.inspector, &id, 1).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = json_call(
            &f.app,
            Method::GET,
            &format!("/api/v1/inspecciones/{id}/custodia"),
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intact"], true);
    }

    #[tokio::test]
    async fn test_not_found_and_bad_ids() {
        let f = fixture().await;
        let missing = uuid::Uuid::new_v4();

        let (status, body) = json_call(
            &f.app,
            Method::GET,
            &format!("/api/v1/inspecciones/{missing}"),
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) = json_call(
            &f.app,
            Method::GET,
            "/api/v1/inspecciones/not-an-id",
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_catalog_conflicts() {
        let f = fixture().await;
        let (status, _) = json_call(
            &f.app,
            Method::POST,
            "/api/v1/plantas",
            Some(&f.inspector),
            Some(json!({ "code": "P2", "name": "South" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = json_call(
            &f.app,
            Method::POST,
            "/api/v1/plantas",
            Some(&f.supervisor),
            Some(json!({ "code": "P1", "name": "Duplicate" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        create(&f).await;
        let (status, _) = json_call(
            &f.app,
            Method::DELETE,
            &format!("/api/v1/plantas/{}", f.plant.id.as_uuid()),
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_csv_export_is_admin_only() {
        let f = fixture().await;
        create(&f).await;

        let (status, _) = json_call(
            &f.app,
            Method::GET,
            "/api/v1/inspecciones/export/csv",
            Some(&f.supervisor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let request = Request::builder()
            .uri("/api/v1/inspecciones/export/csv?estado=pending")
            .header(USER_ID_HEADER, f.admin.id.to_string())
            .body(Body::empty())
            .unwrap();
        let response = f.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("\"ABCD1234567\";\"North\";\"Blue Line\";\"Ines\";\"Pendiente\""));
        assert!(body.contains("\"Filtros: Estado: Pendiente\""));
    }

    #[tokio::test]
    async fn test_reports_and_notifications() {
        let f = fixture().await;
        let id = create(&f).await;

        let (status, body) = json_call(
            &f.app,
            Method::GET,
            "/api/v1/reportes/resumen",
            Some(&f.inspector),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["pending"], 1);

        let (status, _) = json_call(
            &f.app,
            Method::GET,
            "/api/v1/estadisticas/dashboard?fecha_desde=2024-02-01&fecha_hasta=2024-01-01",
            Some(&f.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Notifications are fed by a background task
        let mut inbox = Value::Null;
        for _ in 0..50 {
            let (_, body) = json_call(
                &f.app,
                Method::GET,
                "/api/v1/notificaciones",
                Some(&f.supervisor),
                None,
            )
            .await;
            if body.as_array().is_some_and(|items| !items.is_empty()) {
                inbox = body;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let items = inbox.as_array().expect("supervisor notification");
        assert_eq!(items[0]["inspection_id"], id.as_str());
        assert_eq!(items[0]["read"], false);

        let notification_id = items[0]["id"].as_str().unwrap();
        let (status, _) = json_call(
            &f.app,
            Method::POST,
            &format!("/api/v1/notificaciones/{notification_id}/leida"),
            Some(&f.inspector),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = json_call(
            &f.app,
            Method::POST,
            &format!("/api/v1/notificaciones/{notification_id}/leida"),
            Some(&f.supervisor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, events) =
            json_call(&f.app, Method::GET, "/api/v1/events?limit=5", Some(&f.admin), None).await;
        assert_eq!(events[0]["event"]["type"], "inspeccion:creada");
    }
}
