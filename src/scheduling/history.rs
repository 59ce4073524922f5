use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use super::domain::{
    MinistryId, ServiceHistoryEntry, ServiceOutcome, ServiceStats, TenantId, VolunteerId,
};
use super::repository::{RepositoryError, ServiceHistoryRepository};

/// Error raised by the history ledger.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("a history entry for volunteer {volunteer}, scale {scale}, function {function} already exists")]
    DuplicateEntry {
        volunteer: String,
        scale: String,
        function: String,
    },
    #[error(transparent)]
    Repository(RepositoryError),
}

impl HistoryError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DuplicateEntry { .. } => "duplicate_history_entry",
            Self::Repository(_) => "repository_error",
        }
    }
}

/// Append-only record of realized service outcomes; consumed in aggregate by
/// the assignment ranking.
pub struct ServiceHistoryLedger<R> {
    repository: Arc<R>,
}

impl<R> ServiceHistoryLedger<R>
where
    R: ServiceHistoryRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Append one entry. One historical record exists per realized
    /// assignment; corrections are new entries.
    pub fn record(&self, entry: ServiceHistoryEntry) -> Result<(), HistoryError> {
        let volunteer = entry.volunteer_id.0.clone();
        let scale = entry.scale_id.0.clone();
        let function = entry.function_id.0.clone();
        self.repository.append(entry).map_err(|err| match err {
            RepositoryError::Conflict => HistoryError::DuplicateEntry {
                volunteer: volunteer.clone(),
                scale: scale.clone(),
                function: function.clone(),
            },
            other => HistoryError::Repository(other),
        })?;
        debug!(%volunteer, %scale, "service history appended");
        Ok(())
    }

    /// Aggregate attendance statistics, optionally restricted to an
    /// inclusive service-date range.
    pub fn stats(
        &self,
        tenant: &TenantId,
        volunteer: &VolunteerId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<ServiceStats, HistoryError> {
        let entries = self
            .repository
            .for_volunteer(tenant, volunteer)
            .map_err(HistoryError::Repository)?;

        let mut completed = 0u32;
        let mut missed = 0u32;
        let mut cancelled = 0u32;
        for entry in entries.iter().filter(|entry| in_range(entry, range)) {
            match entry.status {
                ServiceOutcome::Completed => completed += 1,
                ServiceOutcome::Missed => missed += 1,
                ServiceOutcome::Cancelled => cancelled += 1,
            }
        }

        let total = completed + missed + cancelled;
        let attendance_rate = if total == 0 {
            0.0
        } else {
            completed as f32 / total as f32 * 100.0
        };

        Ok(ServiceStats {
            total_services: total,
            completed_services: completed,
            missed_services: missed,
            cancelled_services: cancelled,
            attendance_rate,
        })
    }

    /// Completed services for one ministry inside an inclusive window.
    /// Feeds the ranking's load-spread key; missed and cancelled outcomes do
    /// not count against a volunteer's future priority.
    pub fn completed_in_window(
        &self,
        tenant: &TenantId,
        volunteer: &VolunteerId,
        ministry: &MinistryId,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<u32, HistoryError> {
        let entries = self
            .repository
            .for_volunteer(tenant, volunteer)
            .map_err(HistoryError::Repository)?;
        Ok(entries
            .iter()
            .filter(|entry| {
                entry.ministry_id == *ministry
                    && entry.status == ServiceOutcome::Completed
                    && entry.service_date >= since
                    && entry.service_date <= until
            })
            .count() as u32)
    }

}

fn in_range(entry: &ServiceHistoryEntry, range: Option<(NaiveDate, NaiveDate)>) -> bool {
    match range {
        Some((start, end)) => entry.service_date >= start && entry.service_date <= end,
        None => true,
    }
}
