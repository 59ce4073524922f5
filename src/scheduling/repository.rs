use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    FunctionId, MinistryId, RequestId, Scale, ScaleId, ServiceHistoryEntry, SubstitutionRequest,
    SubstitutionStatus, TenantId, VolunteerAvailability, VolunteerId,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage for volunteer availability calendars. Mutations are scoped to a
/// single record; implementations need per-document atomicity only.
pub trait AvailabilityRepository: Send + Sync {
    fn fetch(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
    ) -> Result<Option<VolunteerAvailability>, RepositoryError>;

    /// Insert or replace the record for its (tenant, ministry, volunteer)
    /// key. The invariant of one active record per key lives here.
    fn upsert(&self, record: VolunteerAvailability) -> Result<(), RepositoryError>;
}

/// Storage for scales. `update` is version-guarded: the stored scale's
/// `version` must equal the submitted one, and the store bumps it on write;
/// a mismatch returns `Conflict`.
pub trait ScaleRepository: Send + Sync {
    fn fetch(&self, tenant: &TenantId, id: &ScaleId) -> Result<Option<Scale>, RepositoryError>;

    fn insert(&self, scale: Scale) -> Result<(), RepositoryError>;

    fn update(&self, scale: Scale) -> Result<(), RepositoryError>;

    /// Scales on which the volunteer holds a confirmed assignment for the
    /// given service date, across ministries. Backs the double-booking guard.
    fn confirmed_for_volunteer_on(
        &self,
        tenant: &TenantId,
        volunteer: &VolunteerId,
        date: NaiveDate,
    ) -> Result<Vec<Scale>, RepositoryError>;
}

/// Storage for substitution requests.
pub trait SubstitutionRepository: Send + Sync {
    /// Insert a new pending request. Implementations must enforce at most
    /// one pending request per (scale, requester) as a uniqueness rule, not
    /// a check-then-insert, returning `Conflict` on the duplicate.
    fn insert(&self, request: SubstitutionRequest) -> Result<(), RepositoryError>;

    fn fetch(
        &self,
        tenant: &TenantId,
        id: &RequestId,
    ) -> Result<Option<SubstitutionRequest>, RepositoryError>;

    /// Persist a state transition. The stored request must still be pending;
    /// a terminal stored state returns `Conflict` so racing responders never
    /// overwrite each other.
    fn transition(&self, request: SubstitutionRequest) -> Result<(), RepositoryError>;

    /// Persist an accepted request together with the reassigned scale as one
    /// atomic commit. The commit must refuse (`Conflict`) unless the stored
    /// request is still pending and the stored scale's version matches the
    /// submitted one; on success the scale version is bumped. Either both
    /// documents are written or neither is.
    fn commit_swap(
        &self,
        request: SubstitutionRequest,
        scale: Scale,
    ) -> Result<(), RepositoryError>;
}

/// Append-only storage for realized service outcomes.
pub trait ServiceHistoryRepository: Send + Sync {
    /// Append an entry; `Conflict` when an entry for the same
    /// (volunteer, scale, function) already exists.
    fn append(&self, entry: ServiceHistoryEntry) -> Result<(), RepositoryError>;

    fn for_volunteer(
        &self,
        tenant: &TenantId,
        volunteer: &VolunteerId,
    ) -> Result<Vec<ServiceHistoryEntry>, RepositoryError>;
}

/// Facts the core emits for an external dispatcher (notifier) to act on.
/// The core only makes them observable; delivery is not its concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingEvent {
    SwapRequestCreated {
        tenant_id: TenantId,
        request_id: RequestId,
        scale_id: ScaleId,
        requester_id: VolunteerId,
        target_id: VolunteerId,
    },
    SwapRequestResponded {
        tenant_id: TenantId,
        request_id: RequestId,
        scale_id: ScaleId,
        status: SubstitutionStatus,
    },
    SwapExecuted {
        tenant_id: TenantId,
        scale_id: ScaleId,
        function_id: FunctionId,
        from_volunteer: VolunteerId,
        to_volunteer: VolunteerId,
    },
    ScalePublishedWithGaps {
        tenant_id: TenantId,
        scale_id: ScaleId,
        unfilled_required_slots: u32,
    },
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Outbound hook for emitted facts (e.g. an email/push dispatcher).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: SchedulingEvent) -> Result<(), EventError>;
}
