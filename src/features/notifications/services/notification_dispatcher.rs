use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::notifications::clients::{PushDelivery, PushGateway, PushMessage};
use crate::features::notifications::services::{PushTokenStore, UserProfileStore};

pub const MATCH_FOUND_TITLE: &str = "Possible match found!";
pub const MATCH_FOUND_BODY: &str =
    "Someone reported an item that looks like the one you lost. Open the app to take a look.";
pub const MATCH_FOUND_TYPE: &str = "match_found";

/// Whether a notification actually went out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    NoToken,
    /// The gateway accepted the message but did not deliver it
    Suppressed,
}

/// Sends "possible match" notifications to the owner of the lost report
pub struct NotificationDispatcher {
    token_store: Arc<dyn PushTokenStore>,
    profile_store: Arc<dyn UserProfileStore>,
    gateway: Arc<dyn PushGateway>,
}

impl NotificationDispatcher {
    pub fn new(
        token_store: Arc<dyn PushTokenStore>,
        profile_store: Arc<dyn UserProfileStore>,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            token_store,
            profile_store,
            gateway,
        }
    }

    /// Notify `owner_id` that their lost report has a candidate match.
    ///
    /// A missing token is not an error; gateway failures are returned.
    pub async fn notify_match(
        &self,
        owner_id: &str,
        lost_report_id: Uuid,
        found_report_id: Uuid,
    ) -> Result<DispatchOutcome> {
        let Some(token) = self.resolve_token(owner_id).await else {
            tracing::warn!(
                "No push token for user {}, skipping match notification for report {}",
                owner_id,
                lost_report_id
            );
            return Ok(DispatchOutcome::NoToken);
        };

        let mut data = BTreeMap::new();
        data.insert("type".to_string(), MATCH_FOUND_TYPE.to_string());
        data.insert("lostReportId".to_string(), lost_report_id.to_string());
        data.insert("foundReportId".to_string(), found_report_id.to_string());

        let message = PushMessage {
            token,
            title: MATCH_FOUND_TITLE.to_string(),
            body: MATCH_FOUND_BODY.to_string(),
            data,
        };

        let delivery = self.gateway.send(&message).await.map_err(|e| {
            tracing::error!(
                "Failed to send match notification to user {}: {}",
                owner_id,
                e
            );
            e
        })?;

        if delivery == PushDelivery::Suppressed {
            return Ok(DispatchOutcome::Suppressed);
        }

        tracing::info!(
            "Match notification sent to user {} (lost={}, found={})",
            owner_id,
            lost_report_id,
            found_report_id
        );

        Ok(DispatchOutcome::Sent)
    }

    /// Primary store first, then the profile record
    async fn resolve_token(&self, user_id: &str) -> Option<String> {
        match self.token_store.get_token(user_id).await {
            Ok(Some(token)) if !token.trim().is_empty() => return Some(token),
            Ok(_) => tracing::debug!("No primary push token for user {}", user_id),
            Err(e) => tracing::warn!(
                "Primary push token lookup failed for user {}: {}; trying profile",
                user_id,
                e
            ),
        }

        match self.profile_store.get_fcm_token(user_id).await {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!("Profile token lookup failed for user {}: {}", user_id, e);
                None
            }
        }
    }
}
