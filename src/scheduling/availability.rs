use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::{
    BlockedDate, BranchId, MinistryId, TenantId, VolunteerAvailability, VolunteerId,
};
use super::repository::{AvailabilityRepository, RepositoryError};

/// Error raised by availability mutations.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("monthly blocked-day quota reached ({used} of {quota} used)")]
    QuotaExceeded { used: u32, quota: u32 },
    #[error("date {0} is already blocked")]
    AlreadyBlocked(NaiveDate),
    #[error("availability record is inactive")]
    RecordInactive,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AvailabilityError {
    /// Stable machine-readable reason code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::AlreadyBlocked(_) => "already_blocked",
            Self::RecordInactive => "record_inactive",
            Self::Repository(_) => "repository_error",
        }
    }
}

/// Quota usage snapshot for one calendar month, reused by UI and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyBlockedInfo {
    pub used: u32,
    pub quota: u32,
    pub remaining: u32,
}

/// Owns each volunteer's blocked-date calendar per ministry and enforces the
/// monthly blocked-day quota. Records are created lazily on the first block
/// and only ever deactivated, never deleted.
pub struct AvailabilityStore<R> {
    repository: Arc<R>,
    default_quota: u8,
}

impl<R> AvailabilityStore<R>
where
    R: AvailabilityRepository + 'static,
{
    pub fn new(repository: Arc<R>, default_quota: u8) -> Self {
        Self {
            repository,
            default_quota,
        }
    }

    /// Block a calendar day. Re-blocking an already-blocked day is an error
    /// rather than a silent no-op, so callers can surface the conflict.
    #[allow(clippy::too_many_arguments)]
    pub fn block_date(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        branch: Option<BranchId>,
        date: NaiveDate,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<VolunteerAvailability, AvailabilityError> {
        let mut record = match self.repository.fetch(tenant, ministry, volunteer)? {
            Some(existing) => existing,
            None => VolunteerAvailability::new(
                tenant.clone(),
                branch,
                ministry.clone(),
                volunteer.clone(),
                self.default_quota,
                now,
            ),
        };

        if !record.is_active {
            return Err(AvailabilityError::RecordInactive);
        }
        if record.is_day_blocked(date) {
            return Err(AvailabilityError::AlreadyBlocked(date));
        }

        let used = record.blocked_days_in_month(date.year(), date.month());
        let quota = record.max_blocked_days_per_month as u32;
        if used >= quota {
            return Err(AvailabilityError::QuotaExceeded { used, quota });
        }

        record.insert_blocked(BlockedDate {
            date,
            reason,
            is_blocked: true,
            created_at: now,
        });
        record.last_updated = now;
        self.repository.upsert(record.clone())?;

        info!(
            tenant = %tenant.0,
            ministry = %ministry.0,
            volunteer = %volunteer.0,
            %date,
            used = used + 1,
            quota,
            "blocked date recorded"
        );
        Ok(record)
    }

    /// Remove a blocked day. A missing record or absent day is a no-op.
    pub fn unblock_date(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), AvailabilityError> {
        let Some(mut record) = self.repository.fetch(tenant, ministry, volunteer)? else {
            return Ok(());
        };
        if !record.remove_blocked(date) {
            return Ok(());
        }
        record.last_updated = now;
        self.repository.upsert(record)?;
        Ok(())
    }

    /// Quota usage for one calendar month. Absent records report the
    /// configured default quota and zero usage.
    pub fn monthly_blocked_info(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        year: i32,
        month: u32,
    ) -> Result<MonthlyBlockedInfo, AvailabilityError> {
        let (used, quota) = match self.repository.fetch(tenant, ministry, volunteer)? {
            Some(record) => (
                record.blocked_days_in_month(year, month),
                record.max_blocked_days_per_month as u32,
            ),
            None => (0, self.default_quota as u32),
        };
        Ok(MonthlyBlockedInfo {
            used,
            quota,
            remaining: quota.saturating_sub(used),
        })
    }

    /// Per-volunteer quota override on top of the ministry default.
    pub fn set_monthly_quota(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        quota: u8,
        now: DateTime<Utc>,
    ) -> Result<VolunteerAvailability, AvailabilityError> {
        let mut record = self
            .repository
            .fetch(tenant, ministry, volunteer)?
            .unwrap_or_else(|| {
                VolunteerAvailability::new(
                    tenant.clone(),
                    None,
                    ministry.clone(),
                    volunteer.clone(),
                    self.default_quota,
                    now,
                )
            });
        record.max_blocked_days_per_month = quota;
        record.last_updated = now;
        self.repository.upsert(record.clone())?;
        Ok(record)
    }

    /// Soft delete: the record stays for audit but refuses further blocks.
    pub fn deactivate(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        now: DateTime<Utc>,
    ) -> Result<(), AvailabilityError> {
        let Some(mut record) = self.repository.fetch(tenant, ministry, volunteer)? else {
            return Err(AvailabilityError::Repository(RepositoryError::NotFound));
        };
        record.is_active = false;
        record.last_updated = now;
        self.repository.upsert(record)?;
        Ok(())
    }

    pub(crate) fn fetch_record(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
    ) -> Result<Option<VolunteerAvailability>, RepositoryError> {
        self.repository.fetch(tenant, ministry, volunteer)
    }

    pub(crate) fn default_quota(&self) -> u8 {
        self.default_quota
    }
}
