#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use fulcrum_api_rust::airtable::{AirtableClient, AirtableError, AirtableQuery};
use fulcrum_api_rust::auth;
use fulcrum_api_rust::config::AppConfig;
use fulcrum_api_rust::database::{into_record, MemoryRecordStore, RecordStore, Table};
use fulcrum_api_rust::services::{
    CaptchaError, CaptchaVerifier, EmailMessage, FileStorage, FileStorageError, GeoError, GeoLocator, Mailer,
    MailerError,
};
use fulcrum_api_rust::{app, AppState};

pub const ADMIN: i64 = 1;
pub const CHANNEL_OWNER: i64 = 2;
pub const CHANNEL_USER: i64 = 3;
pub const OFFICE_ADMIN: i64 = 4;
pub const RIVAL_USER: i64 = 5;
pub const BLOCKED_USER: i64 = 6;

pub const GOOD_CAPTCHA: &str = "good-captcha";
pub const PASSWORD: &str = "Secret12";
/// Tenant derived from the `Host` header reqwest sends to the test server.
pub const TENANT: &str = "127.0.0.1";

/// Airtable double: each table answers with a fixed list, single records are
/// looked up by `(table, id)`.
#[derive(Default)]
pub struct FakeAirtable {
    tables: Mutex<HashMap<String, Value>>,
    records: Mutex<HashMap<(String, String), Value>>,
    failing: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<(String, AirtableQuery)>>,
}

impl FakeAirtable {
    pub fn set_table(&self, table: &str, records: Value) {
        self.tables.lock().unwrap().insert(table.to_string(), records);
    }

    pub fn set_record(&self, table: &str, id: &str, record: Value) {
        self.records.lock().unwrap().insert((table.to_string(), id.to_string()), record);
    }

    pub fn fail_table(&self, table: &str) {
        self.failing.lock().unwrap().push(table.to_string());
    }

    pub fn queries_for(&self, table: &str) -> Vec<AirtableQuery> {
        self.calls.lock().unwrap().iter().filter(|(t, _)| t == table).map(|(_, q)| q.clone()).collect()
    }

    fn list(&self, table: &str, query: &AirtableQuery) -> Result<Value, AirtableError> {
        self.calls.lock().unwrap().push((table.to_string(), query.clone()));
        if self.failing.lock().unwrap().iter().any(|t| t == table) {
            return Err(AirtableError::Api { status: 500, message: format!("{} unavailable", table) });
        }
        Ok(self.tables.lock().unwrap().get(table).cloned().unwrap_or_else(|| json!([])))
    }
}

#[async_trait]
impl AirtableClient for FakeAirtable {
    async fn first_page(&self, table: &str, query: &AirtableQuery) -> Result<Value, AirtableError> {
        self.list(table, query)
    }

    async fn all(&self, table: &str, query: &AirtableQuery) -> Result<Value, AirtableError> {
        self.list(table, query)
    }

    async fn find(&self, table: &str, record_id: &str) -> Result<Value, AirtableError> {
        if self.failing.lock().unwrap().iter().any(|t| t == table) {
            return Err(AirtableError::Api { status: 500, message: format!("{} unavailable", table) });
        }
        self.records
            .lock()
            .unwrap()
            .get(&(table.to_string(), record_id.to_string()))
            .cloned()
            .ok_or_else(|| AirtableError::Api { status: 404, message: "NOT_FOUND".to_string() })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailerError::SendFailed("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Accepts [`GOOD_CAPTCHA`] only.
pub struct FakeCaptcha;

#[async_trait]
impl CaptchaVerifier for FakeCaptcha {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        if token == GOOD_CAPTCHA {
            Ok(())
        } else {
            Err(CaptchaError::Rejected(vec!["invalid-input-response".to_string()]))
        }
    }
}

#[derive(Default)]
pub struct FakeGeo {
    pub countries: Mutex<HashMap<String, String>>,
    pub asked: Mutex<Vec<String>>,
}

#[async_trait]
impl GeoLocator for FakeGeo {
    async fn country(&self, ip: &str) -> Result<Option<String>, GeoError> {
        self.asked.lock().unwrap().push(ip.to_string());
        Ok(self.countries.lock().unwrap().get(ip).cloned())
    }
}

#[derive(Default)]
pub struct FakeFiles {
    pub deleted: Mutex<Vec<i64>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl FileStorage for FakeFiles {
    async fn delete(&self, file_id: i64) -> Result<(), FileStorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(FileStorageError::Rejected { status: 503, body: "bucket offline".to_string() });
        }
        self.deleted.lock().unwrap().push(file_id);
        Ok(())
    }
}

/// One server per test, bound to a free port and backed by fakes.
pub struct TestApp {
    pub base_url: String,
    pub config: AppConfig,
    pub store: Arc<MemoryRecordStore>,
    pub airtable: Arc<FakeAirtable>,
    pub mailer: Arc<RecordingMailer>,
    pub geo: Arc<FakeGeo>,
    pub files: Arc<FakeFiles>,
    client: reqwest::Client,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.channel.email_confirm_url = "https://portal.test/confirm".to_string();
    config
}

pub async fn spawn_app() -> Result<TestApp> {
    let config = test_config();
    let store = Arc::new(MemoryRecordStore::new());
    seed(&store).await;

    let airtable = Arc::new(FakeAirtable::default());
    let mailer = Arc::new(RecordingMailer::default());
    let geo = Arc::new(FakeGeo::default());
    let files = Arc::new(FakeFiles::default());

    let state = AppState {
        config: Arc::new(config.clone()),
        store: store.clone(),
        airtable: airtable.clone(),
        mailer: mailer.clone(),
        captcha: Arc::new(FakeCaptcha),
        geo: geo.clone(),
        files: files.clone(),
    };

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    let app = TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        config,
        store,
        airtable,
        mailer,
        geo,
        files,
        client: reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?,
    };
    app.wait_ready().await?;
    Ok(app)
}

impl TestApp {
    async fn wait_ready(&self) -> Result<()> {
        for _ in 0..50 {
            if let Ok(res) = self.client.get(format!("{}/live", self.base_url)).send().await {
                if res.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {}", self.base_url)
    }

    pub fn token(&self, user_id: i64) -> String {
        auth::issue_token(&self.config.security, user_id).expect("token")
    }

    pub async fn get(&self, path: &str, user: Option<i64>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(id) = user {
            req = req.bearer_auth(self.token(id));
        }
        read(req.send().await?).await
    }

    pub async fn post(&self, path: &str, user: Option<i64>, body: Value) -> Result<(StatusCode, Value)> {
        let mut req = self.client.post(format!("{}{}", self.base_url, path)).json(&body);
        if let Some(id) = user {
            req = req.bearer_auth(self.token(id));
        }
        read(req.send().await?).await
    }

    pub async fn delete(&self, path: &str, user: Option<i64>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.delete(format!("{}{}", self.base_url, path));
        if let Some(id) = user {
            req = req.bearer_auth(self.token(id));
        }
        read(req.send().await?).await
    }

    pub fn raw(&self) -> &reqwest::Client {
        &self.client
    }

    /// Give `user_id` a real argon2 hash of [`PASSWORD`].
    pub async fn set_password(&self, user_id: i64) {
        let hash = auth::hash_password(PASSWORD).expect("hash");
        self.store
            .update(Table::AuthUser, json!({ "id": user_id }), into_record(json!({ "password": hash })))
            .await
            .expect("update password");
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.store.rows(table).await.into_iter().map(Value::Object).collect()
    }

    pub async fn row(&self, table: Table, id: i64) -> Option<Value> {
        self.store.select_by_id(table, id).await.expect("select").map(Value::Object)
    }
}

async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let text = res.text().await?;
    let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
    Ok((status, body))
}

fn user(id: i64, first: &str, email: &str, channel: Option<i64>, active: bool) -> Value {
    json!({
        "id": id,
        "first_name": first,
        "last_name": "Tester",
        "email": email,
        "password": null,
        "registration_key": null,
        "language": "en",
        "channelId": channel,
        "is_active": active,
        "created_on": "2024-01-01 00:00:00",
    })
}

async fn seed(store: &MemoryRecordStore) {
    store
        .seed(
            Table::AuthGroup,
            vec![
                json!({"id": 1, "role": "channelAdmin", "description": "Channel administrator"}),
                json!({"id": 2, "role": "channelUser", "description": "Channel user"}),
                json!({"id": 3, "role": "officeAdmin", "description": "Office administrator"}),
                json!({"id": 4, "role": "admin", "description": "System administrator"}),
            ],
        )
        .await;
    store
        .seed(
            Table::AuthUser,
            vec![
                user(ADMIN, "Ada", "admin@fulcrum.test", None, true),
                user(CHANNEL_OWNER, "Olive", "owner@agency.test", Some(1), true),
                user(CHANNEL_USER, "Uma", "agent@agency.test", Some(1), true),
                user(OFFICE_ADMIN, "Otto", "office@fulcrum.test", None, true),
                user(RIVAL_USER, "Rita", "rita@rival.test", Some(2), true),
                user(BLOCKED_USER, "Bo", "blocked@agency.test", Some(1), false),
            ],
        )
        .await;
    store
        .seed(
            Table::AuthMembership,
            vec![
                json!({"id": 1, "user_id": ADMIN, "group_id": 4}),
                json!({"id": 2, "user_id": CHANNEL_OWNER, "group_id": 1}),
                json!({"id": 3, "user_id": CHANNEL_OWNER, "group_id": 2}),
                json!({"id": 4, "user_id": CHANNEL_USER, "group_id": 2}),
                json!({"id": 5, "user_id": OFFICE_ADMIN, "group_id": 3}),
                json!({"id": 6, "user_id": RIVAL_USER, "group_id": 2}),
                json!({"id": 7, "user_id": BLOCKED_USER, "group_id": 1}),
            ],
        )
        .await;
    store
        .seed(
            Table::Channel,
            vec![
                json!({"id": 1, "airTableId": "recChan1", "userId": CHANNEL_OWNER, "created_on": "2024-01-01 00:00:00"}),
                json!({"id": 2, "airTableId": "recChan2", "userId": RIVAL_USER, "created_on": "2024-01-01 00:00:00"}),
            ],
        )
        .await;

    store
        .seed(
            Table::Region,
            vec![
                json!({"id": 1, "name": "UK", "currency": "GBP"}),
                json!({"id": 2, "name": "Thailand", "currency": "THB"}),
            ],
        )
        .await;
    store.seed(Table::CommissionScheme, vec![json!({"id": 1, "name": "Standard"})]).await;
    store
        .seed(
            Table::CommissionSchemeDetail,
            vec![json!({"id": 1, "commissionSchemeId": 1, "paymentPercent": 10, "commissionPercent": 2.5, "paymentDueDay": 30})],
        )
        .await;
    store
        .seed(
            Table::PaymentSchedule,
            vec![json!({"id": 1, "projectId": 1, "isActive": true, "name": "Standard 10/90"})],
        )
        .await;
    store
        .seed(
            Table::Project,
            vec![
                json!({
                    "id": 1, "name": "Tower A", "isActive": true, "region": 2, "code": "TWA",
                    "isCompleted": false, "commissionSchemeId": 1, "airtableId": "recP1", "paymentScheduleId": 1
                }),
                json!({
                    "id": 2, "name": "Garden Court", "isActive": true, "region": 1, "code": "GDN",
                    "isCompleted": true, "commissionSchemeId": null, "airtableId": null, "paymentScheduleId": null
                }),
            ],
        )
        .await;
    store
        .seed(
            Table::ProjectInventory,
            vec![
                json!({
                    "id": 1, "unit_no": "A-101", "version": 1, "projectId": 1, "floor": 1, "unit_type": "1BR",
                    "beds": 1, "carpark": 0, "title_deed_area_sqm": 45.5, "interior_work_area_sqm": 10.25,
                    "overseas_price": 150000, "local_price": 140000, "unit_status": "Available",
                    "paymentScheduleId": 1, "marketing_cmp_unitpage": {"gallery": [10]}
                }),
                json!({
                    "id": 2, "unit_no": "A-102", "version": 1, "projectId": 1, "floor": 1, "unit_type": "2BR",
                    "beds": 2, "carpark": 1, "title_deed_area_sqm": 70, "interior_work_area_sqm": null,
                    "overseas_price": 210000, "local_price": 200000, "unit_status": "Reserved",
                    "paymentScheduleId": null, "marketing_cmp_unitpage": null
                }),
            ],
        )
        .await;
    store
        .seed(
            Table::File,
            vec![json!({"id": 5, "filename": "lobby.jpg", "type": "image/jpeg", "bucket": "media", "tag": "hero"})],
        )
        .await;
    store
        .seed(
            Table::ProjectMedia,
            vec![
                json!({"id": 10, "projectId": 1, "type": "image", "fileId": 5, "url": null}),
                json!({"id": 11, "projectId": 1, "type": "video", "fileId": null, "url": "https://video.test/tour"}),
            ],
        )
        .await;
    store
        .seed(
            Table::InventorySyncAudit,
            vec![
                json!({"id": 1, "time": "2024-03-01T08:00:00", "userId": ADMIN, "projectId": 1, "status": "ok", "message": "first"}),
                json!({"id": 2, "time": "2024-03-02T09:30:00", "userId": ADMIN, "projectId": 2, "status": "ok", "message": "garden"}),
                json!({"id": 3, "time": "2024-03-03T10:45:00.5", "userId": null, "projectId": 1, "status": "error", "message": "latest"}),
            ],
        )
        .await;
}

/// The Airtable rows behind channel #1.
pub fn seed_channel_airtable(airtable: &FakeAirtable) {
    use fulcrum_api_rust::airtable::{CHANNEL_AGREEMENTS, CHANNEL_LIST, CHANNEL_REPRESENTATIVE, PROJECTS_SYNCED_VIEW, SALES_STATUS};

    airtable.set_table(
        CHANNEL_REPRESENTATIVE,
        json!([{"id": "recRep1", "fields": {"Name": "Olive Owner", "Email": "owner@agency.test", "Channels": ["recChan1"]}}]),
    );
    airtable.set_record(
        CHANNEL_LIST,
        "recChan1",
        json!({"id": "recChan1", "fields": {
            "Trading Name 常用稱呼": "Acme Realty",
            "Company Name 公司註冊名稱": "Acme Realty Ltd",
            "Business Address": "1 Main Street"
        }}),
    );
    airtable.set_table(
        CHANNEL_AGREEMENTS,
        json!([
            {"id": "recAg1", "fields": {"Contract ID": "C-001", "Channel": "Acme Realty", "Project": ["recP1", "recP2"]}},
            {"id": "recAg2", "fields": {"Contract ID": "C-002", "Channel": "Acme Realty"}}
        ]),
    );
    airtable.set_record(PROJECTS_SYNCED_VIEW, "recP1", json!({"id": "recP1", "fields": {"Project Name": "Tower A"}}));
    airtable.set_record(PROJECTS_SYNCED_VIEW, "recP2", json!({"id": "recP2", "fields": {"Project Name": "Garden Court"}}));
    airtable.set_table(
        SALES_STATUS,
        json!([{"id": "recS1", "fields": {
            "Order ID": "SO-1",
            "Link Project": ["recP1"],
            "Agency Eligibility": "Eligible",
            "Reserve Date": "2024-02-01",
            "Transacted Price": 150000,
            "Paid Percentage": 0.3,
            "SPA post date": "2024-02-15",
            "Applied Project Agreement": ["recAg1", "recAg2"]
        }}]),
    );
}

pub fn assert_error(res: (StatusCode, Value), status: u16, message: &str) {
    let (code, body) = res;
    assert_eq!(code.as_u16(), status, "unexpected status, body: {}", body);
    assert_eq!(body["status"], status, "body: {}", body);
    assert_eq!(body["message"], message, "body: {}", body);
}

/// `fields` query value: a URL-encoded JSON array.
pub fn fields_param(fields: &[&str]) -> String {
    let raw = serde_json::to_string(fields).expect("fields");
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
