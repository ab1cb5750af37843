use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{contributions, expenses, memberships, pool, settlements, trips, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/trip", post(trips::trip_new).get(trips::list))
        .route("/trip/join", post(trips::join))
        .route("/trip/{trip_id}", get(trips::get))
        .route("/trip/{trip_id}/status", axum::routing::patch(trips::set_status))
        .route(
            "/trip/{trip_id}/members",
            get(memberships::list).post(memberships::add),
        )
        .route(
            "/trip/{trip_id}/contributions",
            get(contributions::list).post(contributions::create),
        )
        .route(
            "/trip/{trip_id}/contributions/{id}",
            axum::routing::patch(contributions::update).delete(contributions::remove),
        )
        .route(
            "/trip/{trip_id}/expenses",
            get(expenses::list).post(expenses::create),
        )
        .route(
            "/trip/{trip_id}/expenses/{id}",
            axum::routing::patch(expenses::update).delete(expenses::remove),
        )
        .route(
            "/trip/{trip_id}/settlements",
            get(settlements::list).post(settlements::create),
        )
        .route("/trip/{trip_id}/pool", get(pool::get))
        .route("/trip/{trip_id}/pool/export", get(pool::export_csv))
        .route("/trip/{trip_id}/pool/summary", get(pool::summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ActiveModelTrait, ActiveValue, Database};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_state() -> ServerState {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        for (uid, username, name) in [
            ("u-alice", "alice", "Alice"),
            ("u-bob", "bob", "Bob"),
        ] {
            user::ActiveModel {
                uid: ActiveValue::Set(uid.to_string()),
                username: ActiveValue::Set(username.to_string()),
                password: ActiveValue::Set("password".to_string()),
                name: ActiveValue::Set(name.to_string()),
                email: ActiveValue::Set(format!("{username}@example.com")),
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let engine = Engine::builder().database(db.clone()).build();
        ServerState {
            engine: Arc::new(engine),
            db,
        }
    }

    fn basic_auth(username: &str) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:password"));
        format!("Basic {encoded}")
    }

    fn request(method: &str, uri: &str, username: &str, body: Option<Value>) -> HttpRequest<Body> {
        let builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(username))
            .header(header::CONTENT_TYPE, "application/json");

        match body {
            Some(value) => builder
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn requests_without_credentials_are_rejected() {
        let state = test_state().await;
        let response = router(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/trip")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let state = test_state().await;
        let encoded = base64::engine::general_purpose::STANDARD.encode("alice:wrong");
        let response = router(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/trip")
                    .header(header::AUTHORIZATION, format!("Basic {encoded}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn trip_is_hidden_until_joined() {
        let state = test_state().await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/trip",
                "alice",
                Some(json!({"name": "Dolomites", "destination": "Cortina"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let trip = json_body(response).await;
        let trip_id = trip["id"].as_str().unwrap().to_string();
        let join_code = trip["join_code"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/trip/{trip_id}"), "bob", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/trip/join",
                "bob",
                Some(json!({"join_code": join_code})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("GET", &format!("/trip/{trip_id}"), "bob", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn pool_report_reflects_recorded_activity() {
        let state = test_state().await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/trip",
                "alice",
                Some(json!({"name": "Dolomites", "destination": "Cortina"})),
            ))
            .await
            .unwrap();
        let trip = json_body(response).await;
        let trip_id = trip["id"].as_str().unwrap().to_string();
        let join_code = trip["join_code"].as_str().unwrap().to_string();

        app.clone()
            .oneshot(request(
                "POST",
                "/trip/join",
                "bob",
                Some(json!({"join_code": join_code})),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/trip/{trip_id}/contributions"),
                "alice",
                Some(json!({"amount_cents": 10_000, "note": "kitty"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // 6000 split equally between two members: 3000 each.
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/trip/{trip_id}/expenses"),
                "bob",
                Some(json!({
                    "title": "Dinner",
                    "amount_cents": 6_000,
                    "paid_by_uid": "u-bob",
                    "split_between_uids": ["u-alice", "u-bob"],
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/trip/{trip_id}/pool"), "bob", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = json_body(response).await;

        assert_eq!(report["total_contributed_cents"], 10_000);
        assert_eq!(report["total_spent_cents"], 6_000);
        assert_eq!(report["balance_cents"], 4_000);
        // ascending by net: bob -3000, alice 7000
        assert_eq!(report["balances"][0]["uid"], "u-bob");
        assert_eq!(report["balances"][0]["net_cents"], -3_000);
        assert_eq!(report["balances"][1]["uid"], "u-alice");
        assert_eq!(report["balances"][1]["net_cents"], 7_000);
        assert_eq!(report["suggested_settlements"][0]["from_uid"], "u-bob");
        assert_eq!(report["suggested_settlements"][0]["to_uid"], "u-alice");
        assert_eq!(report["suggested_settlements"][0]["amount_cents"], 3_000);
    }

    #[tokio::test]
    async fn invalid_split_is_unprocessable() {
        let state = test_state().await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/trip",
                "alice",
                Some(json!({"name": "Dolomites", "destination": "Cortina"})),
            ))
            .await
            .unwrap();
        let trip = json_body(response).await;
        let trip_id = trip["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(request(
                "POST",
                &format!("/trip/{trip_id}/expenses"),
                "alice",
                Some(json!({
                    "title": "Dinner",
                    "amount_cents": 6_000,
                    "paid_by_uid": "u-alice",
                    "split_between_uids": ["u-alice"],
                    "split_type": "exact",
                    "split_exact_cents": {"u-alice": 1_000},
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn csv_export_is_served_as_csv() {
        let state = test_state().await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/trip",
                "alice",
                Some(json!({"name": "Dolomites", "destination": "Cortina"})),
            ))
            .await
            .unwrap();
        let trip = json_body(response).await;
        let trip_id = trip["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(request(
                "GET",
                &format!("/trip/{trip_id}/pool/export"),
                "alice",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("SUMMARY"));
        assert!(body.contains("BALANCES"));
    }
}
