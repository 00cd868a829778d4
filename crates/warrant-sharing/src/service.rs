//! The capability token service.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use warrant_rbac::{Action, PermissionPolicy, ResourceType};
use warrant_types::{
    Clock, Error, RequestContext, Result, ShareId, SystemClock, UserId, WorkspaceId,
};
use warrant_workspace::{Workspace, WorkspaceStatus};

use crate::api::{
    ListSharesRequest, ListSharesResponse, RevokeShareRequest, RevokeShareResponse,
    ShareLinkResponse, ShareRequest, ShareResponse, ShareSummary, ValidateShareTokenResponse,
};
use crate::cache::{ShareCache, link_key, token_key};
use crate::ports::{Cache, IncrementOutcome, MemberStore, ShareStore, WorkspaceStore};
use crate::share::{ShareDuration, SharePermission, ShareRecord, ShareState};
use crate::token::{TokenSigner, fingerprint};

/// Default lifetime of cached validation results and links.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Link rendering and caching knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharingSettings {
    host: String,
    cache_ttl: Duration,
}

impl SharingSettings {
    /// `host` is a bare host name such as `app.example`. Links always use
    /// https.
    pub fn new(host: &str, cache_ttl: Duration) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(Error::validation("base domain is required"));
        }
        if host.contains('/') {
            return Err(Error::validation("base domain must be a bare host"));
        }
        if cache_ttl.is_zero() {
            return Err(Error::validation("cache ttl must be positive"));
        }
        Ok(Self {
            host: host.to_string(),
            cache_ttl,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn link_for(&self, token: &str) -> String {
        format!("https://{}/share/{token}", self.host)
    }
}

/// The ports a [`CapabilityTokenService`] runs against.
#[derive(Clone)]
pub struct SharingPorts {
    pub workspaces: Arc<dyn WorkspaceStore>,
    pub members: Arc<dyn MemberStore>,
    pub shares: Arc<dyn ShareStore>,
    pub cache: Arc<dyn Cache>,
}

impl SharingPorts {
    /// Persists a workspace aggregate and mirrors its membership into the
    /// member store.
    ///
    /// Members missing from the store are created and changed ones are
    /// updated under their stored id. Stored members no longer in the
    /// aggregate are deactivated.
    pub fn save_workspace(&self, ctx: &RequestContext, workspace: &Workspace) -> Result<()> {
        match self.workspaces.update(ctx, workspace.clone()) {
            Err(Error::NotFound(_)) => self.workspaces.create(ctx, workspace.clone())?,
            other => other?,
        }

        let stored = self.members.list_by_workspace(ctx, &workspace.id)?;
        for member in workspace.members() {
            match stored.iter().find(|m| m.user_id == member.user_id) {
                None => self.members.create(ctx, member.clone())?,
                Some(existing) if existing == member => {}
                Some(existing) => {
                    let mut member = member.clone();
                    member.id = existing.id;
                    self.members.update(ctx, member)?;
                }
            }
        }
        for gone in stored
            .iter()
            .filter(|m| m.is_active && workspace.member(&m.user_id).is_none())
        {
            self.members.set_active(ctx, gone.id, false)?;
        }

        debug!(workspace = %workspace.id, members = workspace.members().len(), "Workspace saved");
        Ok(())
    }
}

/// Issues, lists, revokes and redeems share tokens.
///
/// The stored [`ShareRecord`] is authoritative for revocation, expiry and
/// usage. Token claims only locate it. Callers are authorized against the
/// membership of the stored [`Workspace`] aggregate.
pub struct CapabilityTokenService {
    workspaces: Arc<dyn WorkspaceStore>,
    shares: Arc<dyn ShareStore>,
    cache: ShareCache,
    policy: PermissionPolicy,
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
    settings: SharingSettings,
}

impl CapabilityTokenService {
    pub fn new(ports: SharingPorts, signer: TokenSigner, settings: SharingSettings) -> Self {
        Self {
            workspaces: ports.workspaces,
            shares: ports.shares,
            cache: ShareCache::new(ports.cache),
            policy: PermissionPolicy::standard(),
            signer,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    pub fn with_policy(mut self, policy: PermissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &PermissionPolicy {
        &self.policy
    }

    pub fn settings(&self) -> &SharingSettings {
        &self.settings
    }

    /// Mints a token for a workspace and persists its record.
    ///
    /// The creator must hold `Share` on the workspace.
    pub fn share(&self, ctx: &RequestContext, request: ShareRequest) -> Result<ShareResponse> {
        let workspace_id = WorkspaceId::parse(&request.workspace_id)?;
        let created_by = UserId::parse(&request.created_by)?;
        let permission: SharePermission = request.permission.parse()?;
        let duration: ShareDuration = request.duration.parse()?;
        let max_access_count = u32::try_from(request.max_access_count).map_err(|_| {
            Error::validation("maxAccessCount must be between 0 and 4294967295")
        })?;

        let now = self.clock.now();
        let expires_at = duration.expires_at(now, request.custom_expiry)?;

        let workspace = self.load_workspace(ctx, &workspace_id)?;
        if workspace.status() == WorkspaceStatus::Archived {
            return Err(Error::validation("workspace is archived"));
        }

        self.authorize_share(&workspace, &created_by)?;

        let share_id = ShareId::generate();
        let token =
            self.signer
                .generate_token(share_id, &workspace_id, permission, expires_at, now)?;
        let record = ShareRecord::new(
            share_id,
            workspace_id.clone(),
            token.clone(),
            permission,
            expires_at,
            created_by.clone(),
            max_access_count,
            now,
        );

        ctx.check()?;
        self.shares.create(ctx, record)?;

        let fp = fingerprint(&token);
        info!(
            share_id = %share_id,
            workspace = %workspace_id,
            created_by = %created_by,
            permission = %permission,
            duration = %duration,
            max_access_count,
            token = short(&fp),
            "Share issued"
        );

        Ok(ShareResponse {
            share_id,
            link: self.settings.link_for(&token),
            token,
            expires_at,
        })
    }

    /// Revokes a share. Revoking an already revoked share succeeds without
    /// checking permission.
    pub fn revoke(
        &self,
        ctx: &RequestContext,
        request: RevokeShareRequest,
    ) -> Result<RevokeShareResponse> {
        let share_id = request.share_id;
        let revoked_by = UserId::parse(&request.revoked_by)?;

        ctx.check()?;
        let record = self
            .shares
            .find_by_id(ctx, share_id)?
            .ok_or_else(|| Error::not_found(format!("share {share_id}")))?;

        if record.revoked {
            debug!(share_id = %share_id, "Share already revoked");
            return Ok(RevokeShareResponse {
                share_id,
                revoked: true,
            });
        }

        let workspace = self.load_workspace(ctx, &record.workspace_id)?;
        self.authorize_share(&workspace, &revoked_by)?;

        ctx.check()?;
        let flipped = self.shares.revoke(ctx, share_id)?;

        // The flip has landed; invalidate even if the caller has since gone.
        let background = RequestContext::background();
        self.cache.delete(&background, &link_key(share_id));
        self.cache
            .delete(&background, &token_key(&fingerprint(&record.token)));

        if flipped {
            info!(
                share_id = %share_id,
                workspace = %record.workspace_id,
                revoked_by = %revoked_by,
                "Share revoked"
            );
        }

        Ok(RevokeShareResponse {
            share_id,
            revoked: true,
        })
    }

    /// Lists a workspace's shares, newest first.
    pub fn list_shares(
        &self,
        ctx: &RequestContext,
        request: ListSharesRequest,
    ) -> Result<ListSharesResponse> {
        let workspace_id = WorkspaceId::parse(&request.workspace_id)?;
        let requested_by = UserId::parse(&request.requested_by)?;

        let workspace = self.load_workspace(ctx, &workspace_id)?;
        self.authorize_share(&workspace, &requested_by)?;

        ctx.check()?;
        let mut records = self.shares.list_by_workspace(ctx, &workspace_id)?;
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let now = self.clock.now();
        let shares = records
            .into_iter()
            .map(|r| ShareSummary {
                share_id: r.id,
                link: self.settings.link_for(&r.token),
                permission: r.permission,
                state: r.state(now),
                expires_at: r.expires_at,
                access_count: r.access_count,
                max_access_count: r.max_access_count,
                created_by: r.created_by,
                created_at: r.created_at,
            })
            .collect();

        Ok(ListSharesResponse {
            workspace_id,
            shares,
        })
    }

    /// Returns the link for a live share. Revoked and expired shares fail.
    pub fn get_share_link(
        &self,
        ctx: &RequestContext,
        share_id: ShareId,
    ) -> Result<ShareLinkResponse> {
        let key = link_key(share_id);
        if let Some(cached) = self.cache.get::<ShareLinkResponse>(ctx, &key) {
            return Ok(cached);
        }

        ctx.check()?;
        let record = self
            .shares
            .find_by_id(ctx, share_id)?
            .ok_or_else(|| Error::not_found(format!("share {share_id}")))?;

        let now = self.clock.now();
        match record.state(now) {
            state @ (ShareState::Revoked | ShareState::Expired) => {
                return Err(state
                    .rejection()
                    .unwrap_or_else(|| Error::validation("share is not active")));
            }
            ShareState::Active | ShareState::Exhausted => {}
        }

        let response = ShareLinkResponse {
            share_id,
            link: self.settings.link_for(&record.token),
            expires_at: record.expires_at,
        };
        self.cache
            .put(ctx, &key, &response, self.cache_ttl(record.expires_at, now));

        Ok(response)
    }

    /// Redeems a token.
    ///
    /// The signature is checked before the token is decoded. On success the
    /// share's access count is incremented; capped shares are admitted at
    /// most `max_access_count` times in total.
    pub fn validate_share_token(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> Result<ValidateShareTokenResponse> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::validation("token is required"));
        }

        let fp = fingerprint(token);
        let key = token_key(&fp);
        if let Some(cached) = self.cache.get::<ValidateShareTokenResponse>(ctx, &key) {
            let now = self.clock.now();
            if !cached.is_revoked && cached.expires_at.is_none_or(|at| at > now) {
                return Ok(cached);
            }
        }

        let claims = match self.signer.verify_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(token = short(&fp), "Share token rejected");
                return Err(e);
            }
        };

        ctx.check()?;
        let record = self
            .shares
            .find_by_token(ctx, token)?
            .ok_or_else(|| Error::not_found("share"))?;
        if record.id != claims.share_id || record.workspace_id != claims.workspace_id {
            warn!(token = short(&fp), share_id = %record.id, "Token claims disagree with record");
            return Err(Error::validation("invalid token"));
        }

        let now = self.clock.now();
        let state = record.state(now);
        if let Some(rejection) = state.rejection() {
            debug!(share_id = %record.id, state = %state, "Share token refused");
            return Err(rejection);
        }

        ctx.check()?;
        let access_count =
            match self
                .shares
                .increment_access_count(ctx, record.id, record.max_access_count)
            {
                Ok(IncrementOutcome::Incremented(count)) => count,
                Ok(IncrementOutcome::LimitReached) => {
                    debug!(share_id = %record.id, "Share access limit reached");
                    return Err(Error::validation("access limit reached"));
                }
                Err(e) => {
                    warn!(share_id = %record.id, error = %e, "Access count not recorded");
                    record.access_count
                }
            };

        let response = ValidateShareTokenResponse {
            share_id: record.id,
            workspace_id: record.workspace_id,
            permission: record.permission,
            expires_at: record.expires_at,
            is_revoked: false,
            access_count,
            max_access_count: record.max_access_count,
        };

        // Capped shares always go to the store so the increment bounds them.
        if record.max_access_count == 0 {
            self.cache
                .put(ctx, &key, &response, self.cache_ttl(record.expires_at, now));

            // A revoke may have cleared the key before the put landed.
            match self.shares.find_by_id(ctx, record.id) {
                Ok(Some(current)) if !current.revoked => {}
                _ => {
                    debug!(share_id = %record.id, "Dropping cached validation for revoked share");
                    self.cache.delete(&RequestContext::background(), &key);
                }
            }
        }

        debug!(share_id = %response.share_id, access_count, "Share token accepted");
        Ok(response)
    }

    fn load_workspace(&self, ctx: &RequestContext, id: &WorkspaceId) -> Result<Workspace> {
        ctx.check()?;
        self.workspaces
            .find(ctx, id)?
            .ok_or_else(|| Error::not_found(format!("workspace {id}")))
    }

    fn authorize_share(&self, workspace: &Workspace, user_id: &UserId) -> Result<()> {
        let Some(member) = workspace.member(user_id) else {
            warn!(workspace = %workspace.id, user = %user_id, "Share denied to non-member");
            return Err(Error::forbidden("insufficient permission"));
        };
        self.policy
            .authorize(member, ResourceType::Workspace, Action::Share)?;
        Ok(())
    }

    fn cache_ttl(&self, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        let ttl = self.settings.cache_ttl;
        match expires_at {
            None => ttl,
            Some(at) => (at - now).to_std().map_or(Duration::ZERO, |left| left.min(ttl)),
        }
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
