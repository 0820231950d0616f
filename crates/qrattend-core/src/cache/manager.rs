use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::api::{ApiError, Directory};
use crate::models::{AttendancePage, Meeting, User};

/// Users change rarely; re-read the directory at most hourly.
const USERS_TTL_SECS: u64 = 3600;

/// Meetings are scheduled ahead of time; hourly is fresh enough.
const MEETINGS_TTL_SECS: u64 = 3600;

/// Attendance changes with every check-in.
const ATTENDANCE_TTL_SECS: u64 = 600;

/// The unit of caching and remote fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Users,
    Meetings,
    Attendance,
}

impl ResourceKind {
    pub fn ttl(&self) -> Duration {
        match self {
            ResourceKind::Users => Duration::from_secs(USERS_TTL_SECS),
            ResourceKind::Meetings => Duration::from_secs(MEETINGS_TTL_SECS),
            ResourceKind::Attendance => Duration::from_secs(ATTENDANCE_TTL_SECS),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Users => write!(f, "users"),
            ResourceKind::Meetings => write!(f, "meetings"),
            ResourceKind::Attendance => write!(f, "attendance"),
        }
    }
}

/// A whole-collection snapshot and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CachedSnapshot<T> {
    pub data: Arc<Vec<T>>,
    pub expires_at: Instant,
}

impl<T> CachedSnapshot<T> {
    pub fn new(data: Vec<T>, fetched_at: Instant, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            expires_at: fetched_at + ttl,
        }
    }

    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }

    /// Time left before the snapshot goes stale (zero once expired)
    pub fn expires_in(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug)]
struct Slot<T> {
    kind: ResourceKind,
    entry: Option<CachedSnapshot<T>>,
}

impl<T: Clone> Slot<T> {
    fn new(kind: ResourceKind) -> Self {
        Self { kind, entry: None }
    }

    /// Return the cached snapshot if it may be used, otherwise fetch live.
    /// A failed fetch leaves the previous snapshot and expiry untouched.
    async fn read<F, Fut>(
        &mut self,
        enabled: bool,
        force_refresh: bool,
        fetch: F,
    ) -> Result<Arc<Vec<T>>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        if enabled && !force_refresh {
            if let Some(entry) = self.entry.as_ref().filter(|e| e.is_fresh()) {
                debug!(resource = %self.kind, expires_in = ?entry.expires_in(), "Cache hit");
                return Ok(Arc::clone(&entry.data));
            }
        }

        debug!(resource = %self.kind, force_refresh, "Fetching live");
        let fetched_at = Instant::now();
        let data = fetch().await?;
        let entry = CachedSnapshot::new(data, fetched_at, self.kind.ttl());
        let snapshot = Arc::clone(&entry.data);
        self.entry = Some(entry);
        Ok(snapshot)
    }

    fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Time-boxed snapshots of the three remote collections.
///
/// Owned by the capture loop and lent to the check-in flow. Snapshots are
/// shared as `Arc`s, so a cache hit hands back the very same collection.
#[derive(Debug)]
pub struct DirectoryCache {
    enabled: bool,
    users: Slot<User>,
    meetings: Slot<Meeting>,
    attendance: Slot<AttendancePage>,
}

impl DirectoryCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            users: Slot::new(ResourceKind::Users),
            meetings: Slot::new(ResourceKind::Meetings),
            attendance: Slot::new(ResourceKind::Attendance),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn users<D: Directory + ?Sized>(
        &mut self,
        directory: &D,
        force_refresh: bool,
    ) -> Result<Arc<Vec<User>>, ApiError> {
        self.users
            .read(self.enabled, force_refresh, || directory.list_users())
            .await
    }

    pub async fn meetings<D: Directory + ?Sized>(
        &mut self,
        directory: &D,
        force_refresh: bool,
    ) -> Result<Arc<Vec<Meeting>>, ApiError> {
        self.meetings
            .read(self.enabled, force_refresh, || directory.query_meetings())
            .await
    }

    pub async fn attendance<D: Directory + ?Sized>(
        &mut self,
        directory: &D,
        force_refresh: bool,
    ) -> Result<Arc<Vec<AttendancePage>>, ApiError> {
        self.attendance
            .read(self.enabled, force_refresh, || directory.query_attendance())
            .await
    }

    /// Append a freshly created page to the attendance snapshot, starting a
    /// new snapshot if none exists. The expiry is left as it was.
    pub fn record_attendance(&mut self, page: AttendancePage) {
        match self.attendance.entry.as_mut() {
            Some(entry) => Arc::make_mut(&mut entry.data).push(page),
            None => {
                self.attendance.entry = Some(CachedSnapshot::new(
                    vec![page],
                    Instant::now(),
                    ResourceKind::Attendance.ttl(),
                ));
            }
        }
    }

    /// Forget a snapshot so the next read goes to the network.
    pub fn invalidate(&mut self, kind: ResourceKind) {
        debug!(resource = %kind, "Cache invalidated");
        match kind {
            ResourceKind::Users => self.users.invalidate(),
            ResourceKind::Meetings => self.meetings.invalidate(),
            ResourceKind::Attendance => self.attendance.invalidate(),
        }
    }

    /// Remaining lifetime of a snapshot, `None` if nothing is cached
    pub fn expires_in(&self, kind: ResourceKind) -> Option<Duration> {
        match kind {
            ResourceKind::Users => self.users.entry.as_ref().map(CachedSnapshot::expires_in),
            ResourceKind::Meetings => self.meetings.entry.as_ref().map(CachedSnapshot::expires_in),
            ResourceKind::Attendance => {
                self.attendance.entry.as_ref().map(CachedSnapshot::expires_in)
            }
        }
    }

    /// Current attendance snapshot without touching the network
    pub fn cached_attendance(&self) -> Option<Arc<Vec<AttendancePage>>> {
        self.attendance.entry.as_ref().map(|e| Arc::clone(&e.data))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{attendance, meeting, user, MemoryDirectory};
    use std::sync::atomic::Ordering;

    fn directory() -> MemoryDirectory {
        MemoryDirectory::new(
            vec![user("u-1", "Ada Lovelace")],
            vec![meeting("m-1", Some("2026-10-16"), &[])],
            vec![attendance("a-1", Some("u-1"))],
        )
    }

    #[test]
    fn test_resource_ttls() {
        assert_eq!(ResourceKind::Users.ttl(), Duration::from_secs(3600));
        assert_eq!(ResourceKind::Meetings.ttl(), Duration::from_secs(3600));
        assert_eq!(ResourceKind::Attendance.ttl(), Duration::from_secs(600));
        assert_eq!(ResourceKind::Attendance.to_string(), "attendance");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_within_ttl_returns_same_snapshot() {
        let dir = directory();
        let mut cache = DirectoryCache::new(true);

        let first = cache.meetings(&dir, false).await.unwrap();
        tokio::time::advance(Duration::from_secs(3599)).await;
        let second = cache.meetings(&dir, false).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(MemoryDirectory::count(&dir.meeting_fetches), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_ttl_fetches_once() {
        let dir = directory();
        let mut cache = DirectoryCache::new(true);

        let first = cache.meetings(&dir, false).await.unwrap();
        tokio::time::advance(Duration::from_secs(3601)).await;
        let second = cache.meetings(&dir, false).await.unwrap();
        let third = cache.meetings(&dir, false).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(MemoryDirectory::count(&dir.meeting_fetches), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attendance_expires_sooner_than_users() {
        let dir = directory();
        let mut cache = DirectoryCache::new(true);

        cache.users(&dir, false).await.unwrap();
        cache.attendance(&dir, false).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        cache.users(&dir, false).await.unwrap();
        cache.attendance(&dir, false).await.unwrap();

        assert_eq!(MemoryDirectory::count(&dir.user_fetches), 1);
        assert_eq!(MemoryDirectory::count(&dir.attendance_fetches), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_bypasses_fresh_snapshot() {
        let dir = directory();
        let mut cache = DirectoryCache::new(true);

        cache.users(&dir, false).await.unwrap();
        cache.users(&dir, true).await.unwrap();
        assert_eq!(MemoryDirectory::count(&dir.user_fetches), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let dir = directory();
        let mut cache = DirectoryCache::new(false);

        cache.users(&dir, false).await.unwrap();
        cache.users(&dir, false).await.unwrap();
        cache.users(&dir, false).await.unwrap();
        assert_eq!(MemoryDirectory::count(&dir.user_fetches), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let dir = directory();
        let mut cache = DirectoryCache::new(true);

        let first = cache.meetings(&dir, false).await.unwrap();
        dir.fail_meetings.store(true, Ordering::SeqCst);
        assert!(cache.meetings(&dir, true).await.is_err());
        dir.fail_meetings.store(false, Ordering::SeqCst);

        let again = cache.meetings(&dir, false).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(MemoryDirectory::count(&dir.meeting_fetches), 2);
    }

    #[tokio::test]
    async fn test_empty_collection_is_an_error() {
        let dir = MemoryDirectory::default();
        let mut cache = DirectoryCache::new(true);
        assert!(matches!(
            cache.users(&dir, false).await,
            Err(ApiError::EmptyCollection("users"))
        ));
        assert_eq!(cache.expires_in(ResourceKind::Users), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_attendance_appends_without_refetch() {
        let dir = directory();
        let mut cache = DirectoryCache::new(true);

        let before = cache.attendance(&dir, false).await.unwrap();
        cache.record_attendance(attendance("a-2", Some("u-2")));
        let after = cache.attendance(&dir, false).await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_eq!(after[1].id, "a-2");
        assert_eq!(MemoryDirectory::count(&dir.attendance_fetches), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_attendance_initializes_snapshot() {
        let mut cache = DirectoryCache::new(true);
        assert!(cache.cached_attendance().is_none());

        cache.record_attendance(attendance("a-9", Some("u-1")));
        let cached = cache.cached_attendance().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cache.expires_in(ResourceKind::Attendance), Some(Duration::from_secs(600)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_next_read() {
        let dir = directory();
        let mut cache = DirectoryCache::new(true);

        cache.meetings(&dir, false).await.unwrap();
        cache.invalidate(ResourceKind::Meetings);
        assert_eq!(cache.expires_in(ResourceKind::Meetings), None);
        cache.meetings(&dir, false).await.unwrap();
        assert_eq!(MemoryDirectory::count(&dir.meeting_fetches), 2);
    }
}
