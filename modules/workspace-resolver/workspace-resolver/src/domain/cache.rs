//! Caller-owned memo of resolved workspaces.

use std::sync::atomic::{AtomicI32, Ordering};

use dashmap::DashMap;
use time::Date;
use workspace_resolver_sdk::{UserIdentity, WorkspaceDescriptor};

use super::group::today;

/// (user id, claim set fingerprint)
type CacheKey = (String, u64);

#[derive(Debug)]
struct CachedResolution {
    resolved_on: Date,
    workspaces: Vec<WorkspaceDescriptor>,
}

/// Resolutions keyed by user and the exact claims presented.
///
/// A changed claim set misses the cache; stale entries for a user are
/// dropped with [`invalidate`](Self::invalidate).
///
/// Entries live until the UTC date changes, since `ws_days_left` counts
/// from the day of resolution. The first insert of a new day evicts every
/// older entry, so the cache holds at most one day of distinct
/// (user, claims) pairs. Group changes in the directory are not seen
/// before then unless the user is invalidated.
#[derive(Debug, Default)]
pub struct WorkspaceCache {
    entries: DashMap<CacheKey, CachedResolution>,
    /// Julian day of the last eviction sweep.
    swept_on: AtomicI32,
}

impl WorkspaceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspaces resolved today for exactly these claims.
    #[must_use]
    pub fn get(&self, user: &UserIdentity) -> Option<Vec<WorkspaceDescriptor>> {
        self.get_on(user, today())
    }

    /// Like [`get`](Self::get), with `day` standing in for today.
    #[must_use]
    pub fn get_on(&self, user: &UserIdentity, day: Date) -> Option<Vec<WorkspaceDescriptor>> {
        let key = Self::key(user);
        let entry = self.entries.get(&key)?;
        if entry.resolved_on == day {
            return Some(entry.workspaces.clone());
        }
        drop(entry);

        self.entries.remove_if(&key, |_, entry| entry.resolved_on != day);
        None
    }

    pub fn insert(&self, user: &UserIdentity, workspaces: Vec<WorkspaceDescriptor>) {
        self.insert_on(user, workspaces, today());
    }

    /// Like [`insert`](Self::insert), with `day` standing in for today.
    pub fn insert_on(&self, user: &UserIdentity, workspaces: Vec<WorkspaceDescriptor>, day: Date) {
        let julian = day.to_julian_day();
        if self.swept_on.swap(julian, Ordering::Relaxed) != julian {
            self.entries.retain(|_, entry| entry.resolved_on == day);
        }
        self.entries.insert(
            Self::key(user),
            CachedResolution {
                resolved_on: day,
                workspaces,
            },
        );
    }

    /// Drop every entry of `user_id`; returns how many were removed.
    #[must_use]
    pub fn invalidate(&self, user_id: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|(id, _), _| {
            let keep = id != user_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(user: &UserIdentity) -> CacheKey {
        (user.user_id.clone(), user.claims.fingerprint())
    }
}
