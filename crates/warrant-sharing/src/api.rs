//! Request and response records for the sharing operations.
//!
//! Field names are camelCase on the wire. Enumerated request fields arrive as
//! raw strings and are validated by the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warrant_types::{ShareId, UserId, WorkspaceId};

use crate::share::{SharePermission, ShareState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub workspace_id: String,
    pub created_by: String,
    pub permission: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_expiry: Option<DateTime<Utc>>,
    /// Zero means unlimited.
    #[serde(default)]
    pub max_access_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_id: ShareId,
    pub token: String,
    pub link: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeShareRequest {
    pub share_id: ShareId,
    pub revoked_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeShareResponse {
    pub share_id: ShareId,
    pub revoked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSharesRequest {
    pub workspace_id: String,
    pub requested_by: String,
}

/// One share as seen by workspace members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSummary {
    pub share_id: ShareId,
    pub link: String,
    pub permission: SharePermission,
    pub state: ShareState,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: u32,
    pub max_access_count: u32,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSharesResponse {
    pub workspace_id: WorkspaceId,
    /// Newest first.
    pub shares: Vec<ShareSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    pub share_id: ShareId,
    pub link: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateShareTokenResponse {
    pub share_id: ShareId,
    pub workspace_id: WorkspaceId,
    pub permission: SharePermission,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_revoked: bool,
    pub access_count: u32,
    pub max_access_count: u32,
}
