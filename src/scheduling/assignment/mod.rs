mod config;
mod ranking;

pub use config::AssignmentConfig;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    Assignment, AssignmentStatus, FunctionId, Scale, ScaleId, ScaleStatus, SkillLevel, TenantId,
    VolunteerId,
};
use super::history::{HistoryError, ServiceHistoryLedger};
use super::providers::{MembershipProvider, ProviderError, QualificationProvider};
use super::repository::{
    AvailabilityRepository, EventError, EventPublisher, RepositoryError, ScaleRepository,
    SchedulingEvent, ServiceHistoryRepository,
};
use super::validator::{AvailabilityValidator, UnavailabilityReason, ValidatorError};

/// Error raised by suggestion generation and publication.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("scale {0} not found")]
    ScaleNotFound(ScaleId),
    #[error("ministry catalog lacks function {function_id} referenced by the scale template")]
    MinistryMismatch { function_id: FunctionId },
    #[error("scale {scale_id} is {}, expected draft", status.label())]
    NotDraft {
        scale_id: ScaleId,
        status: ScaleStatus,
    },
    #[error("scale template has no slot for function {function_id}")]
    UnknownFunction { function_id: FunctionId },
    #[error("volunteer {volunteer_id} is not approved for function {function_id}")]
    UnqualifiedSelection {
        volunteer_id: VolunteerId,
        function_id: FunctionId,
    },
    #[error("volunteer {volunteer_id} is unavailable on the scale date: {}", reason.message())]
    UnavailableSelection {
        volunteer_id: VolunteerId,
        reason: UnavailabilityReason,
    },
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}

impl AssignmentError {
    /// Stable machine-readable reason code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ScaleNotFound(_) => "scale_not_found",
            Self::MinistryMismatch { .. } => "ministry_mismatch",
            Self::NotDraft { .. } => "scale_not_draft",
            Self::UnknownFunction { .. } => "unknown_function",
            Self::UnqualifiedSelection { .. } => "unqualified_selection",
            Self::UnavailableSelection { .. } => "unavailable_selection",
            Self::Validator(_) | Self::Repository(_) => "repository_error",
            Self::History(_) => "history_error",
            Self::Provider(_) => "provider_error",
            Self::Event(_) => "event_error",
        }
    }
}

/// One ranked candidate for a function slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCandidate {
    pub volunteer_id: VolunteerId,
    pub level: SkillLevel,
    /// Completed services inside the trailing ranking window.
    pub recent_services: u32,
}

/// Ranked suggestions for one function slot of the scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSuggestions {
    pub function_id: FunctionId,
    pub is_required: bool,
    pub required_slots: u8,
    pub optional_slots: u8,
    /// Candidate count before truncation to the slot capacity.
    pub available_candidates: u32,
    pub candidates: Vec<SlotCandidate>,
}

/// Read-only coverage report and per-slot suggestions for a draft scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPlan {
    pub scale_id: ScaleId,
    pub suggestions: Vec<FunctionSuggestions>,
    pub requires_approval: bool,
    pub total_volunteers_needed: u32,
    pub total_volunteers_available: u32,
    /// Percentage of required slots with at least one available candidate.
    pub coverage: u8,
}

/// A human-confirmed choice handed to `publish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSelection {
    pub function_id: FunctionId,
    pub volunteer_id: VolunteerId,
}

/// Produces ranked volunteer suggestions per function slot and a coverage
/// report. Generation never mutates the scale; `publish` is the separate
/// confirmation step that persists chosen assignments.
pub struct ScaleAssignmentEngine<A, S, M, Q, H, E> {
    scales: Arc<S>,
    validator: Arc<AvailabilityValidator<A, S, M>>,
    qualifications: Arc<Q>,
    ledger: Arc<ServiceHistoryLedger<H>>,
    events: Arc<E>,
    config: AssignmentConfig,
}

impl<A, S, M, Q, H, E> ScaleAssignmentEngine<A, S, M, Q, H, E>
where
    A: AvailabilityRepository + 'static,
    S: ScaleRepository + 'static,
    M: MembershipProvider + 'static,
    Q: QualificationProvider + 'static,
    H: ServiceHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(
        scales: Arc<S>,
        validator: Arc<AvailabilityValidator<A, S, M>>,
        qualifications: Arc<Q>,
        ledger: Arc<ServiceHistoryLedger<H>>,
        events: Arc<E>,
        config: AssignmentConfig,
    ) -> Self {
        Self {
            scales,
            validator,
            qualifications,
            ledger,
            events,
            config,
        }
    }

    /// Build the ranked suggestion plan for a scale. Read-only and
    /// side-effect-free; safe to call concurrently.
    pub fn generate(
        &self,
        tenant: &TenantId,
        scale_id: &ScaleId,
        today: NaiveDate,
    ) -> Result<AssignmentPlan, AssignmentError> {
        let scale = self
            .scales
            .fetch(tenant, scale_id)?
            .ok_or_else(|| AssignmentError::ScaleNotFound(scale_id.clone()))?;

        let catalog = self
            .qualifications
            .ministry_functions(tenant, &scale.ministry_id)?;
        for slot in &scale.function_slots {
            if !catalog.contains(&slot.function_id) {
                return Err(AssignmentError::MinistryMismatch {
                    function_id: slot.function_id.clone(),
                });
            }
        }

        let window_start = today - Duration::days(self.config.ranking_window_days);
        let mut suggestions = Vec::with_capacity(scale.function_slots.len());
        let mut total_required = 0u32;
        let mut fillable_required = 0u32;
        let mut total_available = 0u32;

        for slot in &scale.function_slots {
            let approved = self.qualifications.approved_volunteers(
                tenant,
                &scale.ministry_id,
                &slot.function_id,
                scale.branch_id.as_ref(),
            )?;

            let mut candidates = Vec::new();
            for qualified in approved {
                let decision = self.validator.check_availability(
                    tenant,
                    &scale.ministry_id,
                    &qualified.volunteer_id,
                    scale.service_date,
                )?;
                if !decision.is_available {
                    continue;
                }
                let recent_services = self.ledger.completed_in_window(
                    tenant,
                    &qualified.volunteer_id,
                    &scale.ministry_id,
                    window_start,
                    today,
                )?;
                candidates.push(SlotCandidate {
                    volunteer_id: qualified.volunteer_id,
                    level: qualified.level,
                    recent_services,
                });
            }

            ranking::rank_candidates(&mut candidates);
            let available = candidates.len() as u32;
            candidates.truncate(slot.required_slots as usize + slot.optional_slots as usize);

            total_available += available;
            if slot.is_required {
                total_required += slot.required_slots as u32;
                fillable_required += available.min(slot.required_slots as u32);
            }

            suggestions.push(FunctionSuggestions {
                function_id: slot.function_id.clone(),
                is_required: slot.is_required,
                required_slots: slot.required_slots,
                optional_slots: slot.optional_slots,
                available_candidates: available,
                candidates,
            });
        }

        let coverage = ranking::coverage_percent(fillable_required, total_required);
        let requires_approval = coverage < 100 || !self.config.auto_assign;
        if coverage < 100 {
            warn!(
                scale = %scale_id.0,
                coverage,
                needed = total_required,
                "scale suggestions leave required slots uncovered"
            );
        }

        Ok(AssignmentPlan {
            scale_id: scale_id.clone(),
            suggestions,
            requires_approval,
            total_volunteers_needed: total_required,
            total_volunteers_available: total_available,
            coverage,
        })
    }

    /// Persist confirmed assignments and transition the scale from draft to
    /// published. Each selection is re-validated against the template, the
    /// qualification provider, and current availability. Publishing with
    /// unfilled required slots succeeds but surfaces a gap event for the
    /// dispatcher.
    pub fn publish(
        &self,
        tenant: &TenantId,
        scale_id: &ScaleId,
        selections: &[SlotSelection],
    ) -> Result<Scale, AssignmentError> {
        let mut scale = self
            .scales
            .fetch(tenant, scale_id)?
            .ok_or_else(|| AssignmentError::ScaleNotFound(scale_id.clone()))?;

        if scale.status != ScaleStatus::Draft {
            return Err(AssignmentError::NotDraft {
                scale_id: scale_id.clone(),
                status: scale.status,
            });
        }

        for selection in selections {
            if !scale
                .function_slots
                .iter()
                .any(|slot| slot.function_id == selection.function_id)
            {
                return Err(AssignmentError::UnknownFunction {
                    function_id: selection.function_id.clone(),
                });
            }

            let approved = self.qualifications.approved_volunteers(
                tenant,
                &scale.ministry_id,
                &selection.function_id,
                scale.branch_id.as_ref(),
            )?;
            if !approved
                .iter()
                .any(|qualified| qualified.volunteer_id == selection.volunteer_id)
            {
                return Err(AssignmentError::UnqualifiedSelection {
                    volunteer_id: selection.volunteer_id.clone(),
                    function_id: selection.function_id.clone(),
                });
            }

            let decision = self.validator.check_availability(
                tenant,
                &scale.ministry_id,
                &selection.volunteer_id,
                scale.service_date,
            )?;
            if let Some(reason) = decision.reason {
                return Err(AssignmentError::UnavailableSelection {
                    volunteer_id: selection.volunteer_id.clone(),
                    reason,
                });
            }
        }

        scale.assignments = selections
            .iter()
            .map(|selection| Assignment {
                function_id: selection.function_id.clone(),
                volunteer_id: selection.volunteer_id.clone(),
                status: AssignmentStatus::Confirmed,
            })
            .collect();
        scale.status = ScaleStatus::Published;

        let unfilled: u32 = scale
            .function_slots
            .iter()
            .filter(|slot| slot.is_required)
            .map(|slot| {
                (slot.required_slots as u32).saturating_sub(scale.confirmed_count(&slot.function_id))
            })
            .sum();

        self.scales.update(scale.clone())?;
        info!(
            scale = %scale_id.0,
            assignments = scale.assignments.len(),
            unfilled,
            "scale published"
        );

        if unfilled > 0 {
            self.events.publish(SchedulingEvent::ScalePublishedWithGaps {
                tenant_id: tenant.clone(),
                scale_id: scale_id.clone(),
                unfilled_required_slots: unfilled,
            })?;
        }

        Ok(scale)
    }
}
