use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use warrant_rbac::{Member, Role};
use warrant_types::{Error, MemberId, RequestContext, Result, ShareId, UserId, WorkspaceId};
use warrant_workspace::Workspace;

use crate::ports::{IncrementOutcome, MemberStore, ShareStore, WorkspaceStore};
use crate::share::ShareRecord;

fn read<'a, T>(lock: &'a RwLock<T>, ctx: &RequestContext) -> Result<RwLockReadGuard<'a, T>> {
    ctx.check()?;
    lock.read().map_err(|_| Error::internal("store lock poisoned"))
}

/// Takes the write lock, then re-checks the context so nothing is written
/// for a caller that was cancelled while waiting.
fn write<'a, T>(lock: &'a RwLock<T>, ctx: &RequestContext) -> Result<RwLockWriteGuard<'a, T>> {
    ctx.check()?;
    let guard = lock
        .write()
        .map_err(|_| Error::internal("store lock poisoned"))?;
    ctx.check()?;
    Ok(guard)
}

/// [`WorkspaceStore`] over a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryWorkspaceStore {
    workspaces: RwLock<HashMap<WorkspaceId, Workspace>>,
}

impl InMemoryWorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkspaceStore for InMemoryWorkspaceStore {
    fn create(&self, ctx: &RequestContext, workspace: Workspace) -> Result<()> {
        workspace.check_invariants()?;
        let mut map = write(&self.workspaces, ctx)?;
        if map.contains_key(&workspace.id) {
            return Err(Error::conflict(format!("workspace {} exists", workspace.id)));
        }
        map.insert(workspace.id.clone(), workspace);
        Ok(())
    }

    fn find(&self, ctx: &RequestContext, id: &WorkspaceId) -> Result<Option<Workspace>> {
        Ok(read(&self.workspaces, ctx)?.get(id).cloned())
    }

    fn update(&self, ctx: &RequestContext, workspace: Workspace) -> Result<()> {
        workspace.check_invariants()?;
        let mut map = write(&self.workspaces, ctx)?;
        let slot = map
            .get_mut(&workspace.id)
            .ok_or_else(|| Error::not_found(format!("workspace {}", workspace.id)))?;
        *slot = workspace;
        Ok(())
    }
}

/// [`MemberStore`] over a `HashMap` keyed by member id.
#[derive(Debug, Default)]
pub struct InMemoryMemberStore {
    members: RwLock<HashMap<MemberId, Member>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_member<R>(
        &self,
        ctx: &RequestContext,
        id: MemberId,
        f: impl FnOnce(&mut Member) -> R,
    ) -> Result<R> {
        let mut map = write(&self.members, ctx)?;
        let member = map
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("member {id}")))?;
        Ok(f(member))
    }
}

impl MemberStore for InMemoryMemberStore {
    fn create(&self, ctx: &RequestContext, member: Member) -> Result<()> {
        let mut map = write(&self.members, ctx)?;
        let duplicate = map.values().any(|m| {
            m.id == member.id
                || (m.workspace_id == member.workspace_id && m.user_id == member.user_id)
        });
        if duplicate {
            return Err(Error::conflict(format!(
                "user {} is already a member of workspace {}",
                member.user_id, member.workspace_id
            )));
        }
        map.insert(member.id, member);
        Ok(())
    }

    fn find(&self, ctx: &RequestContext, id: MemberId) -> Result<Option<Member>> {
        Ok(read(&self.members, ctx)?.get(&id).cloned())
    }

    fn find_by_workspace_and_user(
        &self,
        ctx: &RequestContext,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<Option<Member>> {
        Ok(read(&self.members, ctx)?
            .values()
            .find(|m| &m.workspace_id == workspace_id && &m.user_id == user_id)
            .cloned())
    }

    fn list_by_workspace(
        &self,
        ctx: &RequestContext,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = read(&self.members, ctx)?
            .values()
            .filter(|m| &m.workspace_id == workspace_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| b.role.cmp(&a.role).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(members)
    }

    fn update(&self, ctx: &RequestContext, member: Member) -> Result<()> {
        let id = member.id;
        self.with_member(ctx, id, |slot| *slot = member)
    }

    fn update_role(&self, ctx: &RequestContext, id: MemberId, role: Role) -> Result<()> {
        self.with_member(ctx, id, |m| m.role = role)
    }

    fn set_active(&self, ctx: &RequestContext, id: MemberId, active: bool) -> Result<()> {
        self.with_member(ctx, id, |m| m.is_active = active)
    }
}

#[derive(Debug, Default)]
struct ShareTable {
    by_id: HashMap<ShareId, ShareRecord>,
    by_token: HashMap<String, ShareId>,
}

/// [`ShareStore`] with a token index. Conditional updates happen under the
/// write lock.
#[derive(Debug, Default)]
pub struct InMemoryShareStore {
    table: RwLock<ShareTable>,
}

impl InMemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShareStore for InMemoryShareStore {
    fn create(&self, ctx: &RequestContext, record: ShareRecord) -> Result<()> {
        let mut table = write(&self.table, ctx)?;
        if table.by_id.contains_key(&record.id) || table.by_token.contains_key(&record.token) {
            return Err(Error::conflict(format!("share {} exists", record.id)));
        }
        table.by_token.insert(record.token.clone(), record.id);
        table.by_id.insert(record.id, record);
        Ok(())
    }

    fn find_by_id(&self, ctx: &RequestContext, id: ShareId) -> Result<Option<ShareRecord>> {
        Ok(read(&self.table, ctx)?.by_id.get(&id).cloned())
    }

    fn find_by_token(&self, ctx: &RequestContext, token: &str) -> Result<Option<ShareRecord>> {
        let table = read(&self.table, ctx)?;
        Ok(table
            .by_token
            .get(token)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    fn list_by_workspace(
        &self,
        ctx: &RequestContext,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<ShareRecord>> {
        Ok(read(&self.table, ctx)?
            .by_id
            .values()
            .filter(|r| &r.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    fn update(&self, ctx: &RequestContext, record: ShareRecord) -> Result<()> {
        let mut table = write(&self.table, ctx)?;
        let previous = table
            .by_id
            .get(&record.id)
            .ok_or_else(|| Error::not_found(format!("share {}", record.id)))?;
        if previous.token != record.token {
            return Err(Error::validation("share token cannot change"));
        }
        if previous.revoked && !record.revoked {
            return Err(Error::validation("revoked share cannot be restored"));
        }
        // Concurrent increments may have landed since the caller's read.
        let access_count = previous.access_count.max(record.access_count);
        table.by_id.insert(
            record.id,
            ShareRecord {
                access_count,
                ..record
            },
        );
        Ok(())
    }

    fn revoke(&self, ctx: &RequestContext, id: ShareId) -> Result<bool> {
        let mut table = write(&self.table, ctx)?;
        let record = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("share {id}")))?;
        Ok(record.revoke(chrono::Utc::now()))
    }

    fn increment_access_count(
        &self,
        ctx: &RequestContext,
        id: ShareId,
        max: u32,
    ) -> Result<IncrementOutcome> {
        let mut table = write(&self.table, ctx)?;
        let record = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("share {id}")))?;

        if max > 0 && record.access_count >= max {
            return Ok(IncrementOutcome::LimitReached);
        }
        record.access_count = record.access_count.saturating_add(1);
        Ok(IncrementOutcome::Incremented(record.access_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::SharePermission;
    use chrono::Utc;

    fn record(max: u32) -> ShareRecord {
        let id = ShareId::generate();
        ShareRecord::new(
            id,
            WorkspaceId::new("ws1"),
            format!("token-{id}"),
            SharePermission::ReadOnly,
            None,
            UserId::new("u1"),
            max,
            Utc::now(),
        )
    }

    #[test]
    fn test_share_create_and_lookup() {
        let ctx = RequestContext::background();
        let store = InMemoryShareStore::new();
        let r = record(0);
        store.create(&ctx, r.clone()).unwrap();

        assert_eq!(store.find_by_id(&ctx, r.id).unwrap(), Some(r.clone()));
        assert_eq!(store.find_by_token(&ctx, &r.token).unwrap(), Some(r.clone()));
        assert_eq!(store.find_by_token(&ctx, "other").unwrap(), None);
        assert!(matches!(store.create(&ctx, r), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_increment_stops_at_cap() {
        let ctx = RequestContext::background();
        let store = InMemoryShareStore::new();
        let r = record(2);
        store.create(&ctx, r.clone()).unwrap();

        assert_eq!(
            store.increment_access_count(&ctx, r.id, 2).unwrap(),
            IncrementOutcome::Incremented(1)
        );
        assert_eq!(
            store.increment_access_count(&ctx, r.id, 2).unwrap(),
            IncrementOutcome::Incremented(2)
        );
        assert_eq!(
            store.increment_access_count(&ctx, r.id, 2).unwrap(),
            IncrementOutcome::LimitReached
        );
        assert_eq!(store.find_by_id(&ctx, r.id).unwrap().unwrap().access_count, 2);
    }

    #[test]
    fn test_revoke_flips_once() {
        let ctx = RequestContext::background();
        let store = InMemoryShareStore::new();
        let r = record(0);
        store.create(&ctx, r.clone()).unwrap();

        assert!(store.revoke(&ctx, r.id).unwrap());
        assert!(!store.revoke(&ctx, r.id).unwrap());
        assert!(store.find_by_id(&ctx, r.id).unwrap().unwrap().revoked);
        assert!(matches!(
            store.revoke(&ctx, ShareId::generate()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_never_regresses_count_or_revocation() {
        let ctx = RequestContext::background();
        let store = InMemoryShareStore::new();
        let r = record(0);
        store.create(&ctx, r.clone()).unwrap();
        store.increment_access_count(&ctx, r.id, 0).unwrap();
        store.revoke(&ctx, r.id).unwrap();

        let err = store.update(&ctx, r.clone()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let mut stale = r;
        stale.revoked = true;
        store.update(&ctx, stale.clone()).unwrap();
        assert_eq!(store.find_by_id(&ctx, stale.id).unwrap().unwrap().access_count, 1);
    }

    #[test]
    fn test_cancelled_context_writes_nothing() {
        let ctx = RequestContext::background();
        ctx.cancel_handle().cancel();
        let store = InMemoryShareStore::new();

        assert_eq!(store.create(&ctx, record(0)).unwrap_err(), Error::Cancelled);
        assert!(
            store
                .list_by_workspace(&RequestContext::background(), &WorkspaceId::new("ws1"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_member_store_rejects_duplicate_membership() {
        let ctx = RequestContext::background();
        let store = InMemoryMemberStore::new();
        let now = Utc::now();
        let m = Member::owner(WorkspaceId::new("ws1"), UserId::new("u1"), now);
        store.create(&ctx, m.clone()).unwrap();

        let again = Member::invite(
            WorkspaceId::new("ws1"),
            UserId::new("u1"),
            Role::Viewer,
            UserId::new("u1"),
            now,
        );
        assert!(matches!(store.create(&ctx, again), Err(Error::Conflict(_))));

        store.update_role(&ctx, m.id, Role::Admin).unwrap();
        store.set_active(&ctx, m.id, false).unwrap();
        let stored = store
            .find_by_workspace_and_user(&ctx, &WorkspaceId::new("ws1"), &UserId::new("u1"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, Role::Admin);
        assert!(!stored.is_active);
        assert!(matches!(
            store.set_active(&ctx, MemberId::generate(), true),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_workspace_store_create_update() {
        let ctx = RequestContext::background();
        let store = InMemoryWorkspaceStore::new();
        let now = Utc::now();
        let mut ws =
            Workspace::new(WorkspaceId::new("ws1"), "Filings", UserId::new("u1"), now).unwrap();
        store.create(&ctx, ws.clone()).unwrap();
        assert!(matches!(store.create(&ctx, ws.clone()), Err(Error::Conflict(_))));

        ws.archive(now);
        store.update(&ctx, ws.clone()).unwrap();
        assert_eq!(store.find(&ctx, &ws.id).unwrap(), Some(ws));
    }
}
