use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use homestock_auth::{JwtClaims, PrincipalId, Role};
use homestock_core::HouseholdId;
use homestock_infra::AppConfig;
use homestock_iot::{DeviceClient, DeviceConfig, DeviceError, LedState, SensorReading};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(AppConfig::for_tests(SECRET), Arc::new(FakeDevices::default())).await
    }

    async fn spawn_with(config: AppConfig, devices: Arc<FakeDevices>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = homestock_api::app::build_app_with_devices(config, devices)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Default)]
struct FakeDevices {
    readings: Mutex<HashMap<String, SensorReading>>,
}

#[async_trait]
impl DeviceClient for FakeDevices {
    async fn read_sensors(&self, device: &DeviceConfig) -> Result<SensorReading, DeviceError> {
        self.readings
            .lock()
            .unwrap()
            .get(&device.id)
            .copied()
            .ok_or_else(|| DeviceError::Request("connection refused".into()))
    }

    async fn set_led(&self, device: &DeviceConfig, on: bool) -> Result<LedState, DeviceError> {
        if self.readings.lock().unwrap().contains_key(&device.id) {
            Ok(LedState { on })
        } else {
            Err(DeviceError::Request("connection refused".into()))
        }
    }
}

fn mint_jwt(household_id: HouseholdId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        household_id,
        username: "minted".to_string(),
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn register(client: &reqwest::Client, srv: &TestServer, username: &str) -> (String, Value) {
    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "username": username, "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    (body["token"].as_str().unwrap().to_string(), body["user"].clone())
}

async fn post_json(client: &reqwest::Client, url: String, token: &str, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).bearer_auth(token).json(&body).send().await.unwrap();
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get_json(client: &reqwest::Client, url: String, token: &str) -> (StatusCode, Value) {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "unauthorized");

    let res = client
        .get(srv.url("/inventory/items"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn register_login_and_whoami() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, user) = register(&client, &srv, "Alex").await;
    assert_eq!(user["username"], "alex");
    assert_eq!(user["roles"], json!(["owner"]));
    assert!(user.get("password_hash").is_none());

    let (status, me) = get_json(&client, srv.url("/whoami"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["household_id"], user["household_id"]);
    assert_eq!(me["username"], "alex");

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "username": "ALEX", "password": "another-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "alex", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "alex", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn inventory_status_and_low_stock_alert() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;

    let (status, item) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Olive oil", "category": "Pantry", "quantity": 3, "low_stock_threshold": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["status"], "Available");
    let id = item["id"].as_str().unwrap().to_string();

    let (status, item) = post_json(
        &client,
        srv.url(&format!("/inventory/items/{id}/adjust")),
        &token,
        json!({ "delta": -2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["status"], "Low Stock");
    assert_eq!(item["low_stock_alert"]["active"], true);
    assert_eq!(item["low_stock_alert"]["acknowledged"], false);

    let (_, alerts) = get_json(&client, srv.url("/inventory/alerts"), &token).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);

    let (status, item) = post_json(
        &client,
        srv.url(&format!("/inventory/items/{id}/acknowledge")),
        &token,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["low_stock_alert"]["acknowledged_by"], "alex");

    let (status, _) = post_json(
        &client,
        srv.url(&format!("/inventory/items/{id}/acknowledge")),
        &token,
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = post_json(
        &client,
        srv.url(&format!("/inventory/items/{id}/adjust")),
        &token,
        json!({ "delta": -5 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");

    let res = client
        .put(srv.url(&format!("/inventory/items/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["status"], "Out of Stock");

    let (_, listed) = get_json(&client, srv.url("/inventory/items?status=Out%20of%20Stock"), &token).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, body) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "  ", "category": "Pantry", "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn expired_items_and_expiring_window() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;
    let today = Utc::now().date_naive();

    let (_, expired) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Milk", "category": "Dairy", "quantity": 2, "expiry_date": today.to_string() }),
    )
    .await;
    assert_eq!(expired["status"], "Expired");

    post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({
            "name": "Yogurt",
            "category": "Dairy",
            "quantity": 4,
            "expiry_date": (today + ChronoDuration::days(3)).to_string(),
        }),
    )
    .await;

    let (status, soon) = get_json(&client, srv.url("/inventory/expiring"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = soon.as_array().unwrap().iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Yogurt"]);

    let (_, none) = get_json(&client, srv.url("/inventory/expiring?days=1"), &token).await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn households_cannot_see_each_other() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token1, _) = register(&client, &srv, "alex").await;
    let (token2, _) = register(&client, &srv, "sam").await;

    let (_, item) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token1,
        json!({ "name": "Flour", "category": "Baking", "quantity": 5 }),
    )
    .await;
    let id = item["id"].as_str().unwrap().to_string();

    let (status, _) = get_json(&client, srv.url(&format!("/inventory/items/{id}")), &token2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(
        &client,
        srv.url(&format!("/inventory/items/{id}/adjust")),
        &token2,
        json!({ "delta": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = get_json(&client, srv.url("/inventory/items"), &token2).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, body) = get_json(&client, srv.url("/inventory/items/not-a-uuid"), &token1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn viewers_are_read_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(HouseholdId::new(), vec![Role::VIEWER]);

    let (status, _) = get_json(&client, srv.url("/inventory/items"), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Widget", "category": "Misc", "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = post_json(&client, srv.url("/grocery/restock"), &token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owners_manage_household_members() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (owner_token, owner) = register(&client, &srv, "alex").await;

    let (status, robin) = post_json(
        &client,
        srv.url("/users"),
        &owner_token,
        json!({ "username": "robin", "password": "robin-pass", "role": "viewer" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(robin["household_id"], owner["household_id"]);

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "robin", "password": "robin-pass" }))
        .send()
        .await
        .unwrap();
    let robin_token = res.json::<Value>().await.unwrap()["token"].as_str().unwrap().to_string();

    let (status, users) = get_json(&client, srv.url("/users"), &robin_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, _) = post_json(
        &client,
        srv.url("/users"),
        &robin_token,
        json!({ "username": "mallory", "password": "mallory-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let res = client
        .put(srv.url("/users/me/password"))
        .bearer_auth(&robin_token)
        .json(&json!({ "current_password": "robin-pass", "new_password": "robin-pass-2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let owner_id = owner["id"].as_str().unwrap();
    let res = client
        .delete(srv.url(&format!("/users/{owner_id}")))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let robin_id = robin["id"].as_str().unwrap();
    let res = client
        .delete(srv.url(&format!("/users/{robin_id}")))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let (_, users) = get_json(&client, srv.url("/users"), &owner_token).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn grocery_list_restocks_from_inventory() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;

    post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Coffee", "category": "Pantry", "quantity": 0, "low_stock_threshold": 1 }),
    )
    .await;
    post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Tea", "category": "Pantry", "quantity": 10 }),
    )
    .await;

    let (status, added) = post_json(&client, srv.url("/grocery/restock"), &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let added = added.as_array().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["name"], "Coffee");
    assert_eq!(added[0]["quantity"], 2);
    let coffee_id = added[0]["id"].as_str().unwrap().to_string();

    let (status, _) = post_json(&client, srv.url("/grocery/restock"), &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, list) = get_json(&client, srv.url("/grocery/items"), &token).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, item) = post_json(
        &client,
        srv.url(&format!("/grocery/items/{coffee_id}/purchase")),
        &token,
        json!({ "purchased": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["purchased"], true);

    let res = client
        .delete(srv.url("/grocery/items"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(srv.url("/grocery/items?purchased=true"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["removed"], 1);
}

#[tokio::test]
async fn budgets_expenses_and_reports() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;

    let (status, budget) = post_json(
        &client,
        srv.url("/budgets"),
        &token,
        json!({
            "name": "Groceries",
            "allocated": 20000,
            "period_start": "2026-03-01",
            "period_end": "2026-03-31",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let budget_id = budget["id"].as_str().unwrap().to_string();

    for (amount, day) in [(12500, "2026-03-04"), (9000, "2026-03-18")] {
        let (status, _) = post_json(
            &client,
            srv.url("/expenses"),
            &token,
            json!({ "budget_id": budget_id, "amount": amount, "spent_on": day, "description": "market" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = post_json(
        &client,
        srv.url("/expenses"),
        &token,
        json!({ "budget_id": budget_id, "amount": 100, "spent_on": "2026-04-02" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, summary) = get_json(&client, srv.url(&format!("/budgets/{budget_id}/summary")), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["spent"], 21500);
    assert_eq!(summary["remaining"], -1500);
    assert_eq!(summary["over_budget"], true);

    let (_, filtered) = get_json(&client, srv.url("/expenses?from=2026-03-10"), &token).await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url("/reports/expenses.csv"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    let csv = res.text().await.unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Groceries,2026-03-04,market,125.00"));

    let res = client
        .get(srv.url("/reports/budgets.csv"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert!(res.text().await.unwrap().contains("Groceries,200.00,215.00,-15.00"));

    let res = client
        .delete(srv.url(&format!("/budgets/{budget_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["expenses_removed"], 2);
    let (_, expenses) = get_json(&client, srv.url("/expenses"), &token).await;
    assert!(expenses.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn barcodes_are_stored_and_decoded() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;

    let (status, decoded) = post_json(
        &client,
        srv.url("/barcodes/decode"),
        &token,
        json!({ "code": "(01)09506000134352(17)270600" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decoded["expiry_date"], "2027-06-30");

    let (status, record) = post_json(&client, srv.url("/barcodes"), &token, json!({ "code": "LOT 20261105" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["decoded"]["embedded_date"], "2026-11-05");
    let id = record["id"].as_str().unwrap().to_string();

    let (_, listed) = get_json(&client, srv.url("/barcodes"), &token).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = client
        .delete(srv.url(&format!("/barcodes/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let (status, _) = get_json(&client, srv.url(&format!("/barcodes/{id}")), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn iot_devices_refresh_and_led() {
    let devices = Arc::new(FakeDevices::default());
    devices.readings.lock().unwrap().insert(
        "kitchen".into(),
        SensorReading {
            temperature: Some(21.5),
            humidity: Some(40.0),
            gas: Some(120.0),
        },
    );

    let mut config = AppConfig::for_tests(SECRET);
    config.devices = DeviceConfig::parse_list("kitchen=http://10.0.0.2,garage=http://10.0.0.3").unwrap();
    let srv = TestServer::spawn_with(config, devices).await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;

    let (status, list) = get_json(&client, srv.url("/iot/devices"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (status, kitchen) = post_json(&client, srv.url("/iot/devices/kitchen/refresh"), &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kitchen["online"], true);
    assert_eq!(kitchen["reading"]["temperature"], 21.5);
    assert_eq!(kitchen["gas_alarm"], false);

    let (status, led) = post_json(&client, srv.url("/iot/devices/kitchen/led"), &token, json!({ "on": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(led["led_on"], true);

    let (status, body) = post_json(&client, srv.url("/iot/devices/garage/refresh"), &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "device_unavailable");
    let (_, garage) = get_json(&client, srv.url("/iot/devices/garage"), &token).await;
    assert_eq!(garage["online"], false);

    let (status, _) = get_json(&client, srv.url("/iot/devices/attic"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let viewer = mint_jwt(HouseholdId::new(), vec![Role::VIEWER]);
    let (status, _) = post_json(&client, srv.url("/iot/devices/kitchen/led"), &viewer, json!({ "on": false })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// Read SSE frames until one for `topic` arrives; returns its JSON data.
async fn next_event(res: &mut reqwest::Response, topic: &str) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let marker = format!("event: {topic}\n");
    let mut buf = String::new();
    loop {
        let chunk = tokio::time::timeout_at(deadline, res.chunk())
            .await
            .expect("no event before deadline")
            .unwrap()
            .expect("stream ended");
        buf.push_str(&String::from_utf8_lossy(&chunk));

        if let Some(start) = buf.find(&marker) {
            let frame = &buf[start..];
            if let Some(end) = frame.find("\n\n") {
                let data = frame[..end]
                    .lines()
                    .find_map(|l| l.strip_prefix("data: "))
                    .expect("frame without data");
                return serde_json::from_str(data).unwrap();
            }
        }
    }
}

#[tokio::test]
async fn bad_requests_answer_with_json_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;

    let (status, body) = get_json(&client, srv.url("/inventory/items?status=low_stock"), &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_query");

    let (_, item) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Soap", "category": "Bathroom", "quantity": 4 }),
    )
    .await;
    let id = item["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(&client, srv.url(&format!("/inventory/items/{id}/adjust")), &token, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_body");

    let res = client
        .post(srv.url("/inventory/items"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "invalid_body");

    let (status, body) = get_json(&client, srv.url("/no/such/route"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn patch_with_null_clears_a_wrong_expiry() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;
    let yesterday = Utc::now().date_naive() - ChronoDuration::days(1);

    let (_, item) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Honey", "category": "Pantry", "quantity": 3, "expiry_date": yesterday.to_string() }),
    )
    .await;
    assert_eq!(item["status"], "Expired");
    let id = item["id"].as_str().unwrap().to_string();

    let res = client
        .put(srv.url(&format!("/inventory/items/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "expiry_date": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["expiry_date"], Value::Null);
    assert_eq!(item["status"], "Available");
}

#[tokio::test]
async fn low_stock_alerts_are_streamed_to_the_household() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;
    let (other_token, _) = register(&client, &srv, "sam").await;

    let mut stream = client.get(srv.url("/stream")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(stream.status(), StatusCode::OK);
    assert!(stream.headers()["content-type"].to_str().unwrap().starts_with("text/event-stream"));
    let mut other_stream = client.get(srv.url("/stream")).bearer_auth(&other_token).send().await.unwrap();

    let (_, item) = post_json(
        &client,
        srv.url("/inventory/items"),
        &token,
        json!({ "name": "Dish soap", "category": "Kitchen", "quantity": 5, "low_stock_threshold": 2 }),
    )
    .await;
    let id = item["id"].as_str().unwrap().to_string();

    let (status, _) = post_json(
        &client,
        srv.url(&format!("/inventory/items/{id}/adjust")),
        &token,
        json!({ "delta": -4 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let event = next_event(&mut stream, "inventory.low_stock").await;
    assert_eq!(event["item_id"], id.as_str());
    assert_eq!(event["name"], "Dish soap");
    assert_eq!(event["quantity"], 1);

    let quiet = tokio::time::timeout(Duration::from_millis(300), other_stream.chunk()).await;
    assert!(quiet.is_err(), "other household received an event");
}

#[tokio::test]
async fn inventory_report_and_status_filter() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (token, _) = register(&client, &srv, "alex").await;

    for (name, quantity) in [("Pasta", 1), ("Tomatoes", 12)] {
        post_json(
            &client,
            srv.url("/inventory/items"),
            &token,
            json!({ "name": name, "category": "Pantry", "quantity": quantity, "low_stock_threshold": 2, "unit": "pcs" }),
        )
        .await;
    }

    let (status, low) = get_json(&client, srv.url("/inventory/items?status=Low%20Stock"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = low.as_array().unwrap().iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Pasta"]);

    let res = client
        .get(srv.url("/reports/inventory.csv"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/csv; charset=utf-8");
    assert!(
        res.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("inventory.csv")
    );

    let csv = res.text().await.unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,name,category,quantity,unit,low_stock_threshold,status,manufacture_date,expiry_date,storage_temperature,barcode")
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains(",Pasta,Pantry,1,pcs,2,Low Stock,"));
    assert!(rows[1].contains(",Tomatoes,Pantry,12,pcs,2,Available,"));
}
