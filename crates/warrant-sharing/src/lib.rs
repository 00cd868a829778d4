//! # warrant-sharing: Capability tokens for workspace sharing
//!
//! Issues signed, revocable share links for a workspace and redeems them.
//!
//! - **Tokens** are `base64url(claims).base64url(HMAC-SHA256)`; the MAC is
//!   checked in constant time before the claims are decoded.
//! - **Records** in the [`ShareStore`] are authoritative. A token only
//!   locates its record; revocation, expiry and usage caps are read from
//!   the store.
//! - **Usage caps** are enforced by an atomic compare-and-increment, so a
//!   share with `maxAccessCount = N` admits at most N redemptions even
//!   under concurrent validation.
//! - **Membership** is read from the stored [`warrant_workspace::Workspace`]
//!   aggregate. [`SharingPorts::save_workspace`] keeps the [`MemberStore`]
//!   in step with it.
//! - **Caching** is best-effort. Cache failures degrade to misses.
//!
//! ## Architecture
//!
//! ```text
//! ShareRequest ──► CapabilityTokenService ──► PermissionPolicy (Share on workspace)
//!                        │        │
//!                        │        └──► TokenSigner (HMAC-SHA256)
//!                        ▼
//!        WorkspaceStore / MemberStore / ShareStore / Cache   (ports)
//!                        │
//!                        ▼
//!            memory::* adapters, or the host's own
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use warrant_sharing::{
//!     CapabilityTokenService, DEFAULT_CACHE_TTL, SharePermission, ShareRequest, SharingPorts,
//!     SharingSettings, TokenSigner,
//! };
//! use warrant_types::{RequestContext, UserId, WorkspaceId};
//! use warrant_workspace::Workspace;
//!
//! let ctx = RequestContext::background();
//! let ports = SharingPorts::in_memory();
//!
//! let workspace = Workspace::new(WorkspaceId::new("ws1"), "Filings", UserId::new("u1"), Utc::now())?;
//! ports.save_workspace(&ctx, &workspace)?;
//!
//! let service = CapabilityTokenService::new(
//!     ports,
//!     TokenSigner::from_secret("0123456789abcdef0123456789abcdef")?,
//!     SharingSettings::new("app.example", DEFAULT_CACHE_TTL)?,
//! );
//!
//! let issued = service.share(&ctx, ShareRequest {
//!     workspace_id: "ws1".into(),
//!     created_by: "u1".into(),
//!     permission: "edit".into(),
//!     duration: "7d".into(),
//!     custom_expiry: None,
//!     max_access_count: 0,
//! })?;
//! assert_eq!(issued.link, format!("https://app.example/share/{}", issued.token));
//!
//! let redeemed = service.validate_share_token(&ctx, &issued.token)?;
//! assert_eq!(redeemed.permission, SharePermission::Edit);
//! # Ok::<(), warrant_types::Error>(())
//! ```

pub mod api;
mod cache;
pub mod memory;
pub mod ports;
pub mod service;
pub mod share;
pub mod token;


pub use api::{
    ListSharesRequest, ListSharesResponse, RevokeShareRequest, RevokeShareResponse,
    ShareLinkResponse, ShareRequest, ShareResponse, ShareSummary, ValidateShareTokenResponse,
};
pub use memory::{InMemoryCache, InMemoryMemberStore, InMemoryShareStore, InMemoryWorkspaceStore};
pub use ports::{Cache, CacheError, IncrementOutcome, MemberStore, ShareStore, WorkspaceStore};
pub use service::{CapabilityTokenService, DEFAULT_CACHE_TTL, SharingPorts, SharingSettings};
pub use share::{ShareDuration, SharePermission, ShareRecord, ShareState};
pub use token::{SigningKey, TokenClaims, TokenSigner, fingerprint};
