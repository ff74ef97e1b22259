//! In-memory stand-ins for the stores and gateway, used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::clients::{PushDelivery, PushGateway, PushMessage};
use crate::features::notifications::services::{PushTokenStore, UserProfileStore};
use crate::features::reports::models::{BatchOutcome, MatchIdUpdate, Report, ReportType};
use crate::features::reports::ReportStore;

pub const BASE_TIMESTAMP_MS: i64 = 1_700_000_000_000;

/// A report near central Kuala Lumpur with a navy dominant color
pub fn report(report_type: ReportType, user_id: &str, description: &str) -> Report {
    Report {
        id: Uuid::new_v4(),
        report_type,
        user_id: user_id.to_string(),
        description: description.to_string(),
        latitude: Some(3.1390),
        longitude: Some(101.6869),
        dominant_color_rgb: Some(vec![20, 40, 160]),
        reported_at_ms: BASE_TIMESTAMP_MS,
        match_id: None,
        created_at: Utc::now(),
    }
}

/// A report by a random user, far from the default location, with random text
pub fn unrelated_report(report_type: ReportType) -> Report {
    let user: String = Username().fake();
    let description: String = Sentence(3..6).fake();
    let mut r = report(report_type, &user, &description);
    r.latitude = Some(-33.8688);
    r.longitude = Some(151.2093);
    r
}

#[derive(Default)]
struct StoreState {
    reports: Vec<Report>,
    reads: usize,
    batches: usize,
}

/// Report store backed by a vector; batches are applied under one lock
#[derive(Default)]
pub struct InMemoryReportStore {
    state: Mutex<StoreState>,
    fail_reads: bool,
    fail_writes: bool,
    /// Simulates a concurrent match landing between read and write
    claim_before_write: Mutex<Option<(Uuid, Uuid)>>,
}

impl InMemoryReportStore {
    pub fn new(reports: Vec<Report>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                reports,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn failing_writes(reports: Vec<Report>) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(reports)
        }
    }

    pub fn claim_before_write(&self, report_id: Uuid, claimed_by: Uuid) {
        *self.claim_before_write.lock().unwrap() = Some((report_id, claimed_by));
    }

    pub fn insert(&self, report: Report) {
        self.state.lock().unwrap().reports.push(report);
    }

    pub fn get(&self, id: Uuid) -> Option<Report> {
        self.state
            .lock()
            .unwrap()
            .reports
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn match_id_of(&self, id: Uuid) -> Option<Uuid> {
        self.get(id).and_then(|r| r.match_id)
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn batch_count(&self) -> usize {
        self.state.lock().unwrap().batches
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn find_by_type(&self, report_type: ReportType) -> Result<Vec<Report>> {
        if self.fail_reads {
            return Err(AppError::Internal("report store unavailable".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state
            .reports
            .iter()
            .filter(|r| r.report_type == report_type)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        if self.fail_reads {
            return Err(AppError::Internal("report store unavailable".to_string()));
        }
        Ok(self.get(id))
    }

    async fn apply_match_updates(&self, updates: &[MatchIdUpdate]) -> Result<BatchOutcome> {
        if self.fail_writes {
            return Err(AppError::Internal("batch write failed".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.batches += 1;

        if let Some((report_id, claimed_by)) = self.claim_before_write.lock().unwrap().take() {
            if let Some(r) = state.reports.iter_mut().find(|r| r.id == report_id) {
                r.match_id = Some(claimed_by);
            }
        }

        for update in updates {
            let unmatched = state
                .reports
                .iter()
                .any(|r| r.id == update.report_id && r.match_id.is_none());
            if !unmatched {
                return Ok(BatchOutcome::Rejected {
                    report_id: update.report_id,
                });
            }
        }

        for update in updates {
            if let Some(r) = state.reports.iter_mut().find(|r| r.id == update.report_id) {
                r.match_id = Some(update.match_id);
            }
        }

        Ok(BatchOutcome::Committed)
    }
}

/// Token lookups for either the primary store or profile records
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: HashMap<String, String>,
    failing: bool,
}

impl InMemoryTokenStore {
    pub fn with(user_id: &str, token: &str) -> Self {
        Self::from_pairs(&[(user_id, token)])
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            tokens: pairs
                .iter()
                .map(|(user, token)| (user.to_string(), token.to_string()))
                .collect(),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            tokens: HashMap::new(),
            failing: true,
        }
    }

    fn lookup(&self, user_id: &str) -> Result<Option<String>> {
        if self.failing {
            return Err(AppError::Internal("token store unavailable".to_string()));
        }
        Ok(self.tokens.get(user_id).cloned())
    }
}

#[async_trait]
impl PushTokenStore for InMemoryTokenStore {
    async fn get_token(&self, user_id: &str) -> Result<Option<String>> {
        self.lookup(user_id)
    }
}

#[async_trait]
impl UserProfileStore for InMemoryTokenStore {
    async fn get_fcm_token(&self, user_id: &str) -> Result<Option<String>> {
        self.lookup(user_id)
    }
}

/// Gateway that keeps every message it was asked to send
#[derive(Default)]
pub struct RecordingPushGateway {
    sent: Mutex<Vec<PushMessage>>,
}

impl RecordingPushGateway {
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<PushDelivery> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(PushDelivery::Delivered)
    }
}

pub struct FailingPushGateway;

#[async_trait]
impl PushGateway for FailingPushGateway {
    async fn send(&self, _message: &PushMessage) -> Result<PushDelivery> {
        Err(AppError::ExternalServiceError(
            "gateway rejected message".to_string(),
        ))
    }
}
