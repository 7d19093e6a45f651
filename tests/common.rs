#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use wildfire_leads::common::*;
use wildfire_leads::config::FunnelSettings;
use wildfire_leads::db::LeadStore;
use wildfire_leads::models::*;
use wildfire_leads::services::*;
use wildfire_leads::web::security::RateLimiter;
use wildfire_leads::web::session::StateSeal;
use wildfire_leads::web::AppState;

const SQL_TIME_FMT: &str = "%Y-%m-%d %H:%M:%S%#z";

pub fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_str(s, SQL_TIME_FMT)
        .expect("Invalid time format in test helper")
        .with_timezone(&Utc)
}

pub fn seed_id(n: u8) -> Uuid {
    Uuid::parse_str(&format!("00000000-0000-0000-0000-{:012x}", n)).unwrap()
}

fn blank_record(id: Uuid, created: &str) -> TrackingRecord {
    TrackingRecord {
        id,
        owner_type: None,
        property_damage: None,
        injured_status: None,
        first_name: None,
        last_name: None,
        email: None,
        phone: None,
        tcpa_consent: true,
        summary: None,
        utm_source: None,
        utm_campaign: None,
        utm_medium: None,
        click_id: None,
        referrer: None,
        campaign_id: None,
        adset_id: None,
        creative_id: None,
        is_completed: false,
        sent_to_crm: false,
        created_at: parse_time(created),
        edited_at: parse_time(created),
        completed_at: None,
    }
}

/// Open partial lead: answered the first two questions.
pub fn get_seed_partial() -> TrackingRecord {
    TrackingRecord {
        owner_type: Some(OwnerType::Homeowner),
        property_damage: Some(PropertyDamage::Smoke),
        utm_source: Some("fb".to_string()),
        click_id: Some("abc123".to_string()),
        ..blank_record(seed_id(1), "2025-01-20 10:00:00+00")
    }
}

/// Completed lead whose CRM forward failed.
pub fn get_seed_unsent() -> TrackingRecord {
    TrackingRecord {
        owner_type: Some(OwnerType::Renter),
        property_damage: Some(PropertyDamage::Destroyed),
        injured_status: Some(InjuredStatus::Injured),
        first_name: Some("Dana".to_string()),
        last_name: Some("Reyes".to_string()),
        email: Some("dana@example.com".to_string()),
        phone: Some("5551234567".to_string()),
        summary: Some("Great job Dana for taking the first step.".to_string()),
        utm_source: Some("google".to_string()),
        is_completed: true,
        edited_at: parse_time("2025-01-20 11:05:00+00"),
        completed_at: Some(parse_time("2025-01-20 11:05:00+00")),
        ..blank_record(seed_id(2), "2025-01-20 11:00:00+00")
    }
}

/// Completed and forwarded lead.
pub fn get_seed_sent() -> TrackingRecord {
    TrackingRecord {
        owner_type: Some(OwnerType::BusinessOwner),
        property_damage: Some(PropertyDamage::EvacOnly),
        injured_status: Some(InjuredStatus::NotInjured),
        first_name: Some("Sam".to_string()),
        last_name: Some("Ortiz".to_string()),
        email: Some("sam@example.com".to_string()),
        phone: Some("5559876543".to_string()),
        is_completed: true,
        sent_to_crm: true,
        edited_at: parse_time("2025-01-19 09:10:00+00"),
        completed_at: Some(parse_time("2025-01-19 09:10:00+00")),
        ..blank_record(seed_id(3), "2025-01-19 09:00:00+00")
    }
}

pub fn attribution_fb() -> Attribution {
    Attribution {
        utm_source: Some("fb".to_string()),
        click_id: Some("abc123".to_string()),
        ..Attribution::default()
    }
}

/// A draft that passes the completion schema.
pub fn complete_draft() -> LeadDraft {
    LeadDraft {
        owner_type: Some(OwnerType::Homeowner),
        property_damage: Some(PropertyDamage::Partial),
        injured_status: Some(InjuredStatus::NotInjured),
        first_name: "Alex".to_string(),
        last_name: "Kim".to_string(),
        email: "alex@example.com".to_string(),
        phone: "(555) 123-4567".to_string(),
        tcpa_consent: true,
        summary: Some("Great job Alex for taking the first step.".to_string()),
        attribution: attribution_fb(),
    }
}

fn apply_partial(record: &mut TrackingRecord, data: &LeadColumns) {
    fn fill<T: Clone>(column: &mut Option<T>, value: &Option<T>) {
        if value.is_some() {
            *column = value.clone();
        }
    }
    fn keep<T: Clone>(column: &mut Option<T>, value: &Option<T>) {
        if column.is_none() {
            *column = value.clone();
        }
    }

    fill(&mut record.owner_type, &data.owner_type);
    fill(&mut record.property_damage, &data.property_damage);
    fill(&mut record.injured_status, &data.injured_status);
    fill(&mut record.first_name, &data.first_name);
    fill(&mut record.last_name, &data.last_name);
    fill(&mut record.email, &data.email);
    fill(&mut record.phone, &data.phone);
    record.tcpa_consent = data.tcpa_consent;
    fill(&mut record.summary, &data.summary);

    let a = &data.attribution;
    keep(&mut record.utm_source, &a.utm_source);
    keep(&mut record.utm_campaign, &a.utm_campaign);
    keep(&mut record.utm_medium, &a.utm_medium);
    keep(&mut record.click_id, &a.click_id);
    keep(&mut record.referrer, &a.referrer);
    keep(&mut record.campaign_id, &a.campaign_id);
    keep(&mut record.adset_id, &a.adset_id);
    keep(&mut record.creative_id, &a.creative_id);
    record.edited_at = Utc::now();
}

/// In-memory [`LeadStore`] with the same write rules as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, TrackingRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with_records(records: Vec<TrackingRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.id, record);
            }
        }
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn record(&self, id: Uuid) -> Option<TrackingRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    /// Id of the single stored record.
    pub fn only_id(&self) -> Uuid {
        let map = self.records.lock().unwrap();
        assert_eq!(map.len(), 1, "expected exactly one record");
        *map.keys().next().unwrap()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check_writes(&self) -> Result<(), LeadError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LeadError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn insert(&self, data: &LeadColumns, is_completed: bool) -> TrackingRecord {
        let now = Utc::now();
        let mut record = TrackingRecord {
            created_at: now,
            edited_at: now,
            ..blank_record(Uuid::new_v4(), "2025-01-01 00:00:00+00")
        };
        apply_partial(&mut record, data);
        if is_completed {
            record.is_completed = true;
            record.completed_at = Some(now);
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        record
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn create_partial(
        &self,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        self.check_writes()?;
        Ok(self.insert(data, false))
    }

    async fn update_partial(
        &self,
        id: Uuid,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        self.check_writes()?;
        {
            let mut map = self.records.lock().unwrap();
            if let Some(record) = map.get_mut(&id) {
                if !record.is_completed {
                    apply_partial(record, data);
                }
                return Ok(record.clone());
            }
        }
        Ok(self.insert(data, false))
    }

    async fn complete(
        &self,
        id: Option<Uuid>,
        data: &LeadColumns,
    ) -> Result<TrackingRecord, LeadError> {
        self.check_writes()?;
        if let Some(id) = id {
            let mut map = self.records.lock().unwrap();
            if let Some(record) = map.get_mut(&id) {
                if record.is_completed {
                    return Err(LeadError::AlreadyCompleted(id));
                }
                apply_partial(record, data);
                record.first_name = data.first_name.clone();
                record.last_name = data.last_name.clone();
                record.email = data.email.clone();
                record.phone = data.phone.clone();
                record.is_completed = true;
                record.completed_at.get_or_insert_with(Utc::now);
                return Ok(record.clone());
            }
        }
        Ok(self.insert(data, true))
    }

    async fn mark_sent_to_crm(
        &self,
        id: Uuid,
    ) -> Result<TrackingRecord, LeadError> {
        self.check_writes()?;
        let mut map = self.records.lock().unwrap();
        match map.get_mut(&id) {
            Some(record) if record.is_completed => {
                record.sent_to_crm = true;
                Ok(record.clone())
            }
            _ => Err(LeadError::NotFound(id)),
        }
    }

    async fn list_unsent(
        &self,
        limit: i64,
    ) -> Result<Vec<TrackingRecord>, LeadError> {
        let map = self.records.lock().unwrap();
        let mut unsent: Vec<TrackingRecord> = map
            .values()
            .filter(|r| r.is_completed && !r.sent_to_crm)
            .cloned()
            .collect();
        unsent.sort_by_key(|r| r.completed_at);
        unsent.truncate(limit.max(0) as usize);
        Ok(unsent)
    }
}

/// CRM double that records every payload it receives.
#[derive(Default)]
pub struct RecordingCrm {
    pub payloads: Mutex<Vec<CrmPayload>>,
    fail: AtomicBool,
}

impl RecordingCrm {
    pub fn failing() -> Self {
        let crm = Self::default();
        crm.fail.store(true, Ordering::SeqCst);
        crm
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<CrmPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl CrmForwarder for RecordingCrm {
    async fn forward(&self, payload: &CrmPayload) -> Result<(), ForwardError> {
        self.payloads.lock().unwrap().push(payload.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ForwardError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPixels {
    pub fired: Mutex<Vec<(PixelEvent, Option<String>)>>,
}

impl RecordingPixels {
    pub fn events(&self) -> Vec<(PixelEvent, Option<String>)> {
        self.fired.lock().unwrap().clone()
    }
}

#[async_trait]
impl PixelFirer for RecordingPixels {
    async fn fire(&self, event: PixelEvent, click_id: Option<String>) {
        self.fired.lock().unwrap().push((event, click_id));
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub crm: Arc<RecordingCrm>,
    pub pixels: Arc<RecordingPixels>,
    pub gateway: LeadGateway,
}

pub fn harness_with(store: MemoryStore, crm: RecordingCrm) -> Harness {
    harness_with_settings(store, crm, GatewaySettings::default())
}

pub fn harness_with_settings(
    store: MemoryStore,
    crm: RecordingCrm,
    settings: GatewaySettings,
) -> Harness {
    let store = Arc::new(store);
    let crm = Arc::new(crm);
    let pixels = Arc::new(RecordingPixels::default());
    let forwarder: Arc<dyn CrmForwarder> = crm.clone();
    let gateway = LeadGateway::new(
        store.clone(),
        Some(forwarder),
        pixels.clone(),
        settings,
    );
    Harness {
        store,
        crm,
        pixels,
        gateway,
    }
}

pub fn harness() -> Harness {
    harness_with(MemoryStore::default(), RecordingCrm::default())
}

/// Gateway without any CRM configured.
pub fn harness_without_crm() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let crm = Arc::new(RecordingCrm::default());
    let pixels = Arc::new(RecordingPixels::default());
    let gateway = LeadGateway::new(
        store.clone(),
        None,
        pixels.clone(),
        GatewaySettings::default(),
    );
    Harness {
        store,
        crm,
        pixels,
        gateway,
    }
}

/// Lets spawned fire-and-forget tasks run to completion.
pub async fn drain_tasks() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub fn app_state(harness: &Harness, funnel: FunnelSettings) -> AppState {
    AppState {
        gateway: harness.gateway.clone(),
        summaries: Arc::new(ScriptedSummaryGenerator),
        rate_limiter: Arc::new(RateLimiter::default()),
        funnel,
        seal: Arc::new(test_seal()),
    }
}

pub const TEST_STATE_SECRET: &str = "test-funnel-state-secret-0123456789";

pub fn test_seal() -> StateSeal {
    StateSeal::new(TEST_STATE_SECRET.as_bytes()).unwrap()
}

/// Rewrites the JSON inside a sealed state and keeps the original tag, the
/// way a visitor editing the hidden field would.
pub fn edit_sealed(sealed: &str, edit: impl FnOnce(&mut serde_json::Value)) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let (payload, tag) = sealed.split_once('.').unwrap();
    let mut json: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
    edit(&mut json);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json).unwrap());
    format!("{}.{}", payload, tag)
}

/// Minimal HTTP endpoint that answers every request with one canned
/// response and keeps the raw requests it saw.
pub struct StubServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> url::Url {
        url::Url::parse(&format!("{}{}", self.base, path)).unwrap()
    }
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(head_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..head_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    raw.len() >= head_end + 4 + content_length
}

pub async fn stub_server(status: &'static str, body: &'static str) -> StubServer {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("addr");
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };

            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => raw.extend_from_slice(&buf[..n]),
                }
            }
            seen.lock()
                .unwrap()
                .push(String::from_utf8_lossy(&raw).into_owned());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    StubServer {
        base: format!("http://{}", addr),
        requests,
    }
}

/// Body of a raw HTTP request.
pub fn request_body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
}
