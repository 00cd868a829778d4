//! Share records and their lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use warrant_types::{Error, Result, ShareId, UserId, WorkspaceId};

/// What a share link lets its holder do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePermission {
    ReadOnly,
    Comment,
    Edit,
}

impl SharePermission {
    pub const ALL: [SharePermission; 3] = [
        SharePermission::ReadOnly,
        SharePermission::Comment,
        SharePermission::Edit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SharePermission::ReadOnly => "read_only",
            SharePermission::Comment => "comment",
            SharePermission::Edit => "edit",
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read_only" => Ok(SharePermission::ReadOnly),
            "comment" => Ok(SharePermission::Comment),
            "edit" => Ok(SharePermission::Edit),
            other => Err(Error::validation(format!(
                "permission must be read_only, comment or edit, got {other:?}"
            ))),
        }
    }
}

/// Requested lifetime of a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShareDuration {
    #[serde(rename = "permanent")]
    Permanent,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "custom")]
    Custom,
}

impl ShareDuration {
    pub fn as_str(self) -> &'static str {
        match self {
            ShareDuration::Permanent => "permanent",
            ShareDuration::SevenDays => "7d",
            ShareDuration::ThirtyDays => "30d",
            ShareDuration::Custom => "custom",
        }
    }

    /// Resolves the expiry instant for a share created at `now`.
    ///
    /// `Custom` requires `custom_expiry` strictly after `now`; the other
    /// durations ignore it.
    pub fn expires_at(
        self,
        now: DateTime<Utc>,
        custom_expiry: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>> {
        match self {
            ShareDuration::Permanent => Ok(None),
            ShareDuration::SevenDays => Ok(Some(now + Duration::days(7))),
            ShareDuration::ThirtyDays => Ok(Some(now + Duration::days(30))),
            ShareDuration::Custom => match custom_expiry {
                None => Err(Error::validation("custom duration requires customExpiry")),
                Some(at) if at <= now => {
                    Err(Error::validation("customExpiry must be in the future"))
                }
                Some(at) => Ok(Some(at)),
            },
        }
    }
}

impl fmt::Display for ShareDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "permanent" => Ok(ShareDuration::Permanent),
            "7d" => Ok(ShareDuration::SevenDays),
            "30d" => Ok(ShareDuration::ThirtyDays),
            "custom" => Ok(ShareDuration::Custom),
            other => Err(Error::validation(format!(
                "duration must be permanent, 7d, 30d or custom, got {other:?}"
            ))),
        }
    }
}

/// Where a share sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareState {
    Active,
    Revoked,
    Expired,
    Exhausted,
}

impl ShareState {
    pub fn as_str(self) -> &'static str {
        match self {
            ShareState::Active => "active",
            ShareState::Revoked => "revoked",
            ShareState::Expired => "expired",
            ShareState::Exhausted => "exhausted",
        }
    }

    /// The error a validation attempt reports in this state, if any.
    pub fn rejection(self) -> Option<Error> {
        match self {
            ShareState::Active => None,
            ShareState::Revoked => Some(Error::validation("share has been revoked")),
            ShareState::Expired => Some(Error::validation("share has expired")),
            ShareState::Exhausted => Some(Error::validation("access limit reached")),
        }
    }
}

impl fmt::Display for ShareState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted share.
///
/// `max_access_count == 0` means unlimited. `revoked` only ever goes from
/// false to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecord {
    pub id: ShareId,
    pub workspace_id: WorkspaceId,
    pub token: String,
    pub permission: SharePermission,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub max_access_count: u32,
    pub access_count: u32,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShareRecord {
    pub fn new(
        id: ShareId,
        workspace_id: WorkspaceId,
        token: String,
        permission: SharePermission,
        expires_at: Option<DateTime<Utc>>,
        created_by: UserId,
        max_access_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workspace_id,
            token,
            permission,
            expires_at,
            created_by,
            max_access_count,
            access_count: 0,
            revoked: false,
            revoked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_access_count > 0 && self.access_count >= self.max_access_count
    }

    /// Revoked wins over expired, which wins over exhausted.
    pub fn state(&self, now: DateTime<Utc>) -> ShareState {
        if self.revoked {
            ShareState::Revoked
        } else if self.is_expired(now) {
            ShareState::Expired
        } else if self.is_exhausted() {
            ShareState::Exhausted
        } else {
            ShareState::Active
        }
    }

    /// Marks the share revoked. Returns false if it already was.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.revoked_at = Some(now);
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_772_366_400, 0).unwrap()
    }

    fn record(expires_at: Option<DateTime<Utc>>, max: u32) -> ShareRecord {
        ShareRecord::new(
            ShareId::generate(),
            WorkspaceId::new("ws1"),
            "tok".to_string(),
            SharePermission::Edit,
            expires_at,
            UserId::new("u1"),
            max,
            now(),
        )
    }

    #[test_case("read_only", SharePermission::ReadOnly)]
    #[test_case("comment", SharePermission::Comment)]
    #[test_case("edit", SharePermission::Edit)]
    fn test_permission_parses(input: &str, expected: SharePermission) {
        assert_eq!(input.parse::<SharePermission>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test_case("" ; "empty")]
    #[test_case("write" ; "unknown")]
    #[test_case("Edit" ; "case sensitive")]
    fn test_permission_rejects(input: &str) {
        assert!(matches!(input.parse::<SharePermission>(), Err(Error::Validation(_))));
    }

    #[test_case("permanent", None ; "permanent")]
    #[test_case("7d", Some(7) ; "seven days")]
    #[test_case("30d", Some(30) ; "thirty days")]
    fn test_fixed_durations(input: &str, days: Option<i64>) {
        let duration: ShareDuration = input.parse().unwrap();
        assert_eq!(
            duration.expires_at(now(), None).unwrap(),
            days.map(|d| now() + Duration::days(d))
        );
    }

    #[test]
    fn test_custom_duration_must_be_future() {
        let custom = ShareDuration::Custom;
        assert!(custom.expires_at(now(), None).is_err());
        assert!(custom.expires_at(now(), Some(now())).is_err());
        assert!(custom.expires_at(now(), Some(now() - Duration::hours(1))).is_err());

        let later = now() + Duration::hours(3);
        assert_eq!(custom.expires_at(now(), Some(later)).unwrap(), Some(later));
    }

    #[test]
    fn test_unknown_duration_rejected() {
        assert!(matches!("1y".parse::<ShareDuration>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_state_precedence() {
        let mut r = record(Some(now() + Duration::days(1)), 2);
        assert_eq!(r.state(now()), ShareState::Active);

        r.access_count = 2;
        assert_eq!(r.state(now()), ShareState::Exhausted);
        assert_eq!(r.state(now() + Duration::days(2)), ShareState::Expired);

        assert!(r.revoke(now()));
        assert_eq!(r.state(now() + Duration::days(2)), ShareState::Revoked);
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let r = record(Some(now()), 0);
        assert!(r.is_expired(now()));
        assert!(!r.is_expired(now() - Duration::seconds(1)));
    }

    #[test]
    fn test_unlimited_never_exhausts() {
        let mut r = record(None, 0);
        r.access_count = u32::MAX;
        assert_eq!(r.state(now()), ShareState::Active);
    }

    #[test]
    fn test_revoke_is_one_way() {
        let mut r = record(None, 0);
        assert!(r.revoke(now()));
        let at = r.revoked_at;
        assert!(!r.revoke(now() + Duration::hours(1)));
        assert!(r.revoked);
        assert_eq!(r.revoked_at, at);
    }
}
