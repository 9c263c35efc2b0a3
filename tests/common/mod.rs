//! Shared wiremock fixtures.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tokenward::auth::{CredentialPair, CredentialStore};
use tokenward::client::ApiClient;
use tokenward::config::ClientConfig;

pub const API_PREFIX: &str = "/api";

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(format!("{}{API_PREFIX}", server.uri()))
        .request_timeout(Duration::from_secs(5))
        .refresh_timeout(Duration::from_secs(5))
        .build()
}

/// Client pointed at `server` over in-memory credentials seeded with `pair`.
pub fn client_for(
    server: &MockServer,
    pair: Option<CredentialPair>,
) -> (Arc<ApiClient>, Arc<CredentialStore>) {
    let credentials = Arc::new(CredentialStore::in_memory());
    if let Some(pair) = pair {
        credentials.set(pair).expect("seed credentials");
    }
    let client = ApiClient::with_credentials(config_for(server), credentials.clone())
        .expect("client should build");
    (Arc::new(client), credentials)
}

pub fn api(p: &str) -> String {
    format!("{API_PREFIX}{p}")
}

/// Expect exactly `times` refresh calls presenting `refresh`, answered with
/// a rotated pair.
pub async fn mount_refresh(server: &MockServer, refresh: &str, new_pair: (&str, &str), times: u64) {
    Mock::given(method("POST"))
        .and(path(api("/auth/refresh/")))
        .and(body_json(json!({ "refresh": refresh })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": new_pair.0,
            "refresh": new_pair.1,
        })))
        .expect(times)
        .mount(server)
        .await;
}

pub fn membership(uuid: &str, company_uuid: &str, trade_name: &str) -> Value {
    json!({
        "uuid": uuid,
        "role": "owner",
        "role_display": "Owner",
        "is_active": true,
        "created_at": "2024-03-01T12:00:00Z",
        "company": {
            "uuid": company_uuid,
            "trade_name": trade_name,
            "legal_name": format!("{trade_name} LTDA"),
            "cnpj": "12.345.678/0001-90",
            "email": "contato@example.com",
            "phone": "",
            "is_active": true
        },
        "theme": { "primary_color": "#1f6feb" }
    })
}

pub fn user_json(companies: Vec<Value>) -> Value {
    json!({
        "id": 7,
        "email": "ana@example.com",
        "first_name": "Ana",
        "last_name": "Souza",
        "full_name": "Ana Souza",
        "phone": "+55 11 5555-0000",
        "is_active": true,
        "date_joined": "2024-01-10T09:30:00Z",
        "avatar": null,
        "companies": companies
    })
}

pub fn login_json(access: &str, refresh: &str, companies: Vec<Value>) -> Value {
    json!({
        "access": access,
        "refresh": refresh,
        "user": user_json(companies),
    })
}
