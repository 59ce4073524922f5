use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::availability::AvailabilityStore;
use super::domain::{MinistryId, ScaleId, TenantId, VolunteerId};
use super::providers::{MembershipProvider, ProviderError};
use super::repository::{AvailabilityRepository, RepositoryError, ScaleRepository};

/// Infrastructure failure while evaluating a decision. Refusals are not
/// errors; they come back inside the decision types below.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Why a volunteer is unavailable on a date. Codes are stable for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailabilityReason {
    DateBlocked,
    AlreadyAssigned { scale_id: ScaleId },
    InactiveMembership,
}

impl UnavailabilityReason {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DateBlocked => "date_blocked",
            Self::AlreadyAssigned { .. } => "already_assigned",
            Self::InactiveMembership => "inactive_membership",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::DateBlocked => "volunteer blocked this date".to_string(),
            Self::AlreadyAssigned { scale_id } => {
                format!("volunteer already serves on scale {}", scale_id.0)
            }
            Self::InactiveMembership => "volunteer is not an active member".to_string(),
        }
    }
}

/// Outcome of `check_availability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityDecision {
    pub is_available: bool,
    pub reason: Option<UnavailabilityReason>,
}

impl AvailabilityDecision {
    fn available() -> Self {
        Self {
            is_available: true,
            reason: None,
        }
    }

    fn unavailable(reason: UnavailabilityReason) -> Self {
        Self {
            is_available: false,
            reason: Some(reason),
        }
    }
}

/// Why a block request would be refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockRefusal {
    QuotaReached { used: u32, quota: u32 },
    DayAlreadyBlocked,
    ConfirmedAssignment { scale_id: ScaleId },
}

impl BlockRefusal {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::QuotaReached { .. } => "blocked_day_quota_reached",
            Self::DayAlreadyBlocked => "day_already_blocked",
            Self::ConfirmedAssignment { .. } => "assignment_conflict",
        }
    }
}

/// Outcome of `can_block_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockCheck {
    pub can_block: bool,
    pub reason: Option<BlockRefusal>,
}

impl BlockCheck {
    fn allowed() -> Self {
        Self {
            can_block: true,
            reason: None,
        }
    }

    fn refused(reason: BlockRefusal) -> Self {
        Self {
            can_block: false,
            reason: Some(reason),
        }
    }
}

/// Pure decision logic over the availability store, scale assignments, and
/// membership scope. Calling twice without intervening mutation yields
/// identical results.
pub struct AvailabilityValidator<A, S, M> {
    store: Arc<AvailabilityStore<A>>,
    scales: Arc<S>,
    membership: Arc<M>,
}

impl<A, S, M> AvailabilityValidator<A, S, M>
where
    A: AvailabilityRepository + 'static,
    S: ScaleRepository + 'static,
    M: MembershipProvider + 'static,
{
    pub fn new(store: Arc<AvailabilityStore<A>>, scales: Arc<S>, membership: Arc<M>) -> Self {
        Self {
            store,
            scales,
            membership,
        }
    }

    /// Is the volunteer free to serve this ministry on this date?
    pub fn check_availability(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        date: NaiveDate,
    ) -> Result<AvailabilityDecision, ValidatorError> {
        if let Some(record) = self.store.fetch_record(tenant, ministry, volunteer)? {
            if record.is_active && record.is_day_blocked(date) {
                return Ok(AvailabilityDecision::unavailable(
                    UnavailabilityReason::DateBlocked,
                ));
            }
        }

        // Confirmed assignment anywhere that day blocks cross-ministry
        // double-booking.
        let conflicts = self
            .scales
            .confirmed_for_volunteer_on(tenant, volunteer, date)?;
        if let Some(conflict) = conflicts.first() {
            return Ok(AvailabilityDecision::unavailable(
                UnavailabilityReason::AlreadyAssigned {
                    scale_id: conflict.id.clone(),
                },
            ));
        }

        if !self
            .membership
            .is_active_member(tenant, ministry, volunteer, None)?
        {
            return Ok(AvailabilityDecision::unavailable(
                UnavailabilityReason::InactiveMembership,
            ));
        }

        Ok(AvailabilityDecision::available())
    }

    /// May the volunteer block this date? Refused when the month is at quota
    /// or when a confirmed assignment already exists that day; the latter
    /// must go through the substitution workflow instead.
    pub fn can_block_date(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        date: NaiveDate,
    ) -> Result<BlockCheck, ValidatorError> {
        let mut used = 0;
        let mut quota = self.store.default_quota() as u32;
        if let Some(record) = self.store.fetch_record(tenant, ministry, volunteer)? {
            if record.is_day_blocked(date) {
                return Ok(BlockCheck::refused(BlockRefusal::DayAlreadyBlocked));
            }
            used = record.blocked_days_in_month(date.year(), date.month());
            quota = record.max_blocked_days_per_month as u32;
        }

        if used >= quota {
            return Ok(BlockCheck::refused(BlockRefusal::QuotaReached {
                used,
                quota,
            }));
        }

        let conflicts = self
            .scales
            .confirmed_for_volunteer_on(tenant, volunteer, date)?;
        if let Some(conflict) = conflicts.first() {
            return Ok(BlockCheck::refused(BlockRefusal::ConfirmedAssignment {
                scale_id: conflict.id.clone(),
            }));
        }

        Ok(BlockCheck::allowed())
    }
}
