//! Storage and cache ports consumed by the sharing service.
//!
//! Implementations must check the request context before mutating anything
//! so that a cancelled caller never leaves a partial write behind.

use std::time::Duration;

use thiserror::Error;
use warrant_rbac::{Member, Role};
use warrant_types::{MemberId, RequestContext, Result, ShareId, UserId, WorkspaceId};
use warrant_workspace::Workspace;

use crate::share::ShareRecord;

/// Persistence for workspace aggregates.
pub trait WorkspaceStore: Send + Sync {
    /// Conflict if the id is taken.
    fn create(&self, ctx: &RequestContext, workspace: Workspace) -> Result<()>;

    fn find(&self, ctx: &RequestContext, id: &WorkspaceId) -> Result<Option<Workspace>>;

    /// NotFound if the workspace does not exist.
    fn update(&self, ctx: &RequestContext, workspace: Workspace) -> Result<()>;
}

/// Persistence for membership records.
pub trait MemberStore: Send + Sync {
    /// Conflict if the user is already a member of the workspace.
    fn create(&self, ctx: &RequestContext, member: Member) -> Result<()>;

    fn find(&self, ctx: &RequestContext, id: MemberId) -> Result<Option<Member>>;

    fn find_by_workspace_and_user(
        &self,
        ctx: &RequestContext,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<Option<Member>>;

    fn list_by_workspace(
        &self,
        ctx: &RequestContext,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Member>>;

    /// NotFound if the member does not exist.
    fn update(&self, ctx: &RequestContext, member: Member) -> Result<()>;

    fn update_role(&self, ctx: &RequestContext, id: MemberId, role: Role) -> Result<()>;

    fn set_active(&self, ctx: &RequestContext, id: MemberId, active: bool) -> Result<()>;
}

/// Result of a conditional access-count increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// The count was incremented to this value.
    Incremented(u32),
    /// The share was already at its cap. Nothing changed.
    LimitReached,
}

/// Persistence for share records.
pub trait ShareStore: Send + Sync {
    /// Conflict if the id or token is taken.
    fn create(&self, ctx: &RequestContext, record: ShareRecord) -> Result<()>;

    fn find_by_id(&self, ctx: &RequestContext, id: ShareId) -> Result<Option<ShareRecord>>;

    fn find_by_token(&self, ctx: &RequestContext, token: &str) -> Result<Option<ShareRecord>>;

    fn list_by_workspace(
        &self,
        ctx: &RequestContext,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<ShareRecord>>;

    /// NotFound if the share does not exist.
    fn update(&self, ctx: &RequestContext, record: ShareRecord) -> Result<()>;

    /// Atomically flips `revoked` to true.
    ///
    /// Returns false if the share was already revoked. NotFound if missing.
    fn revoke(&self, ctx: &RequestContext, id: ShareId) -> Result<bool>;

    /// Atomically increments the access count unless `max` is non-zero and
    /// the count has already reached it.
    fn increment_access_count(
        &self,
        ctx: &RequestContext,
        id: ShareId,
        max: u32,
    ) -> Result<IncrementOutcome>;
}

/// Cache failures. Never surfaced to service callers.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache value could not be encoded: {0}")]
    Codec(String),

    #[error("cache call cancelled")]
    Cancelled,
}

/// Key/value cache with per-entry time to live.
pub trait Cache: Send + Sync {
    fn get(
        &self,
        ctx: &RequestContext,
        key: &str,
    ) -> std::result::Result<Option<Vec<u8>>, CacheError>;

    fn set_with_ttl(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError>;

    fn delete(&self, ctx: &RequestContext, key: &str) -> std::result::Result<(), CacheError>;
}
