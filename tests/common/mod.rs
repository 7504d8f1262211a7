#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use dock_ledger::{
    config::AppConfig,
    db,
    services::{
        catalog::CreateProductInput,
        unloading::{EventView, LineItemInput, RegisterEventInput},
    },
    AppState,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

/// Application state and router backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    /// Fresh database with all migrations applied.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("dock_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.receipt_issuer = "Test Dock".to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), Arc::new(cfg));
        let router = Router::new()
            .nest("/api/v1", dock_ledger::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    pub async fn company(&self, name: &str) -> Uuid {
        let (company, _) = self
            .state
            .services
            .catalog
            .find_or_create_company(name)
            .await
            .expect("company");
        company.id
    }

    pub async fn product(&self, name: &str, units_per_layer: i64, layers_per_pallet: i64) -> Uuid {
        let (product, _) = self
            .state
            .services
            .catalog
            .find_or_create_product(CreateProductInput {
                name: name.to_string(),
                category: None,
                units_per_layer: Some(units_per_layer),
                layers_per_pallet: Some(layers_per_pallet),
            })
            .await
            .expect("product");
        product.id
    }

    /// Registers an arrival at `hh:mm` on `date` with the given items.
    pub async fn register(
        &self,
        date: NaiveDate,
        hhmm: (u32, u32),
        company_id: Uuid,
        items: Vec<(Uuid, i32, i32)>,
    ) -> EventView {
        self.state
            .services
            .unloading
            .register(date, arrival(date, hhmm), event_input(Some(company_id), items))
            .await
            .expect("register event")
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let disposition = response
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        Response {
            status,
            content_type,
            disposition,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

pub struct Response {
    pub status: StatusCode,
    pub content_type: String,
    pub disposition: Option<String>,
    pub text: String,
}

impl Response {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).expect("json body")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn arrival(date: NaiveDate, (h, m): (u32, u32)) -> NaiveDateTime {
    date.and_hms_opt(h, m, 0).expect("valid time")
}

pub fn event_input(company_id: Option<Uuid>, items: Vec<(Uuid, i32, i32)>) -> RegisterEventInput {
    RegisterEventInput {
        company_id,
        driver_name: "Juan Perez".to_string(),
        driver_phone: "0991234567".to_string(),
        plate: "gba-1234".to_string(),
        items: items
            .into_iter()
            .map(|(product_id, full_pallets, loose_units)| LineItemInput {
                product_id: Some(product_id),
                full_pallets,
                loose_units,
            })
            .collect(),
        ..Default::default()
    }
}
