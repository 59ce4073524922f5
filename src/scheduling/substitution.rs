use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    RequestId, Scale, ScaleId, SkillLevel, SubstitutionRequest, SubstitutionStatus, TenantId,
    VolunteerId,
};
use super::providers::{MembershipProvider, ProviderError, QualificationProvider};
use super::repository::{
    AvailabilityRepository, EventError, EventPublisher, RepositoryError, ScaleRepository,
    SchedulingEvent, SubstitutionRepository,
};
use super::validator::{AvailabilityValidator, UnavailabilityReason, ValidatorError};

/// Error raised by the substitution workflow. Variants map onto the stable
/// taxonomy: not-found, forbidden, conflict, stale-state, validation.
#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    #[error("scale {0} not found")]
    ScaleNotFound(ScaleId),
    #[error("substitution request {0} not found")]
    RequestNotFound(RequestId),
    #[error("a pending substitution request already exists for this assignment")]
    DuplicateRequest,
    #[error("requester holds no confirmed assignment on this scale")]
    RequesterNotAssigned,
    #[error("invalid swap target: {0}")]
    InvalidTarget(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("request was already responded to")]
    AlreadyResponded,
    #[error("request expired before a response was recorded")]
    Expired,
    #[error("target is no longer available: {}", reason.message())]
    TargetNoLongerAvailable { reason: UnavailabilityReason },
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}

impl SubstitutionError {
    /// Stable machine-readable reason code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ScaleNotFound(_) => "scale_not_found",
            Self::RequestNotFound(_) => "request_not_found",
            Self::DuplicateRequest => "duplicate_request",
            Self::RequesterNotAssigned => "requester_not_assigned",
            Self::InvalidTarget(_) => "invalid_target",
            Self::Forbidden(_) => "forbidden",
            Self::AlreadyResponded => "already_responded",
            Self::Expired => "request_expired",
            Self::TargetNoLongerAvailable { .. } => "target_unavailable",
            Self::Validator(_) | Self::Repository(_) => "repository_error",
            Self::Provider(_) => "provider_error",
            Self::Event(_) => "event_error",
        }
    }
}

/// The target's decision on a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDecision {
    Accept,
    Reject { reason: Option<String> },
}

/// A volunteer eligible for the requester's slot, annotated with advisory
/// availability so a UI can gray out unavailable candidates. The
/// authoritative re-check happens at accept time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapCandidate {
    pub volunteer_id: VolunteerId,
    pub level: SkillLevel,
    pub is_available: bool,
    pub unavailable_reason: Option<UnavailabilityReason>,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("swap-{id:06}"))
}

/// Drives the peer-to-peer swap state machine: candidate discovery, request
/// creation, target response, cancellation, and lazy expiry.
pub struct SubstitutionWorkflow<B, A, S, M, Q, E> {
    requests: Arc<B>,
    scales: Arc<S>,
    validator: Arc<AvailabilityValidator<A, S, M>>,
    qualifications: Arc<Q>,
    events: Arc<E>,
    expiry: Duration,
}

impl<B, A, S, M, Q, E> SubstitutionWorkflow<B, A, S, M, Q, E>
where
    B: SubstitutionRepository + 'static,
    A: AvailabilityRepository + 'static,
    S: ScaleRepository + 'static,
    M: MembershipProvider + 'static,
    Q: QualificationProvider + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(
        requests: Arc<B>,
        scales: Arc<S>,
        validator: Arc<AvailabilityValidator<A, S, M>>,
        qualifications: Arc<Q>,
        events: Arc<E>,
        expiry_hours: i64,
    ) -> Self {
        Self {
            requests,
            scales,
            validator,
            qualifications,
            events,
            expiry: Duration::hours(expiry_hours),
        }
    }

    /// Volunteers qualified for the requester's confirmed function slot,
    /// requester excluded, each annotated with advisory availability.
    pub fn find_swap_candidates(
        &self,
        tenant: &TenantId,
        scale_id: &ScaleId,
        requester: &VolunteerId,
    ) -> Result<Vec<SwapCandidate>, SubstitutionError> {
        let scale = self.fetch_scale(tenant, scale_id)?;
        let assignment = scale
            .confirmed_assignment(requester)
            .ok_or(SubstitutionError::RequesterNotAssigned)?;

        let approved = self.qualifications.approved_volunteers(
            tenant,
            &scale.ministry_id,
            &assignment.function_id,
            scale.branch_id.as_ref(),
        )?;

        let mut candidates = Vec::with_capacity(approved.len());
        for qualified in approved {
            if qualified.volunteer_id == *requester {
                continue;
            }
            let decision = self.validator.check_availability(
                tenant,
                &scale.ministry_id,
                &qualified.volunteer_id,
                scale.service_date,
            )?;
            candidates.push(SwapCandidate {
                volunteer_id: qualified.volunteer_id,
                level: qualified.level,
                is_available: decision.is_available,
                unavailable_reason: decision.reason,
            });
        }
        Ok(candidates)
    }

    /// Open a pending swap request toward a target volunteer. Never mutates
    /// the scale; the reassignment happens only on accept.
    pub fn create_request(
        &self,
        tenant: &TenantId,
        scale_id: &ScaleId,
        requester: &VolunteerId,
        target: &VolunteerId,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<SubstitutionRequest, SubstitutionError> {
        let scale = self.fetch_scale(tenant, scale_id)?;
        let assignment = scale
            .confirmed_assignment(requester)
            .ok_or(SubstitutionError::RequesterNotAssigned)?;

        if target == requester {
            return Err(SubstitutionError::InvalidTarget(
                "target is the requester themselves",
            ));
        }

        let approved = self
            .qualifications
            .approved_functions(tenant, &scale.ministry_id, target)?;
        if !approved
            .iter()
            .any(|qualified| qualified.function_id == assignment.function_id)
        {
            return Err(SubstitutionError::InvalidTarget(
                "target lacks an approved qualification for the function",
            ));
        }

        let request = SubstitutionRequest {
            id: next_request_id(),
            tenant_id: tenant.clone(),
            scale_id: scale_id.clone(),
            requester_id: requester.clone(),
            target_id: target.clone(),
            reason,
            status: SubstitutionStatus::Pending,
            rejection_reason: None,
            expires_at: now + self.expiry,
            created_at: now,
        };

        self.requests.insert(request.clone()).map_err(|err| match err {
            RepositoryError::Conflict => SubstitutionError::DuplicateRequest,
            other => SubstitutionError::Repository(other),
        })?;

        info!(
            tenant = %tenant.0,
            scale = %scale_id.0,
            request = %request.id.0,
            requester = %requester.0,
            target = %target.0,
            "swap request created"
        );
        self.events.publish(SchedulingEvent::SwapRequestCreated {
            tenant_id: tenant.clone(),
            request_id: request.id.clone(),
            scale_id: scale_id.clone(),
            requester_id: requester.clone(),
            target_id: target.clone(),
        })?;

        Ok(request)
    }

    /// Record the target's decision. Checks run in a fixed order and the
    /// first failing one is returned: not-found, forbidden, already
    /// responded, expired. A failed authoritative availability check leaves
    /// the request pending so the responder may retry later.
    pub fn respond(
        &self,
        tenant: &TenantId,
        request_id: &RequestId,
        responder: &VolunteerId,
        decision: SwapDecision,
        now: DateTime<Utc>,
    ) -> Result<SubstitutionRequest, SubstitutionError> {
        let mut request = self
            .requests
            .fetch(tenant, request_id)?
            .ok_or_else(|| SubstitutionError::RequestNotFound(request_id.clone()))?;

        if request.target_id != *responder {
            return Err(SubstitutionError::Forbidden(
                "only the request target may respond",
            ));
        }
        if request.status.is_terminal() {
            return Err(SubstitutionError::AlreadyResponded);
        }
        if request.is_expired(now) {
            self.persist_expiry(&mut request)?;
            return Err(SubstitutionError::Expired);
        }

        match decision {
            SwapDecision::Reject { reason } => {
                request.status = SubstitutionStatus::Rejected;
                request.rejection_reason = reason;
                self.requests.transition(request.clone()).map_err(map_transition_conflict)?;
                info!(request = %request_id.0, "swap request rejected");
                self.events.publish(SchedulingEvent::SwapRequestResponded {
                    tenant_id: tenant.clone(),
                    request_id: request_id.clone(),
                    scale_id: request.scale_id.clone(),
                    status: SubstitutionStatus::Rejected,
                })?;
                Ok(request)
            }
            SwapDecision::Accept => self.accept(tenant, request),
        }
    }

    /// Withdraw a pending request. Only the original requester may cancel.
    pub fn cancel(
        &self,
        tenant: &TenantId,
        request_id: &RequestId,
        caller: &VolunteerId,
        now: DateTime<Utc>,
    ) -> Result<SubstitutionRequest, SubstitutionError> {
        let mut request = self
            .requests
            .fetch(tenant, request_id)?
            .ok_or_else(|| SubstitutionError::RequestNotFound(request_id.clone()))?;

        if request.requester_id != *caller {
            return Err(SubstitutionError::Forbidden(
                "only the original requester may cancel",
            ));
        }
        if request.status.is_terminal() {
            return Err(SubstitutionError::AlreadyResponded);
        }
        if request.is_expired(now) {
            self.persist_expiry(&mut request)?;
            return Err(SubstitutionError::Expired);
        }

        request.status = SubstitutionStatus::Cancelled;
        self.requests.transition(request.clone()).map_err(map_transition_conflict)?;
        info!(request = %request_id.0, "swap request cancelled");
        Ok(request)
    }

    fn accept(
        &self,
        tenant: &TenantId,
        mut request: SubstitutionRequest,
    ) -> Result<SubstitutionRequest, SubstitutionError> {
        let mut scale = self.fetch_scale(tenant, &request.scale_id)?;

        // Authoritative re-check; the advisory one from candidate discovery
        // may be stale by now.
        let decision = self.validator.check_availability(
            tenant,
            &scale.ministry_id,
            &request.target_id,
            scale.service_date,
        )?;
        if let Some(reason) = decision.reason {
            return Err(SubstitutionError::TargetNoLongerAvailable { reason });
        }

        let function_id = scale
            .confirmed_assignment(&request.requester_id)
            .map(|assignment| assignment.function_id.clone())
            .ok_or(SubstitutionError::RequesterNotAssigned)?;

        if !scale.swap_assignment(&function_id, &request.requester_id, &request.target_id) {
            return Err(SubstitutionError::RequesterNotAssigned);
        }
        request.status = SubstitutionStatus::Accepted;

        // One commit covers the request and the reassigned scale; a racing
        // accept loses the status/version guard and surfaces as a conflict.
        self.requests
            .commit_swap(request.clone(), scale.clone())
            .map_err(map_transition_conflict)?;

        info!(
            tenant = %tenant.0,
            request = %request.id.0,
            scale = %request.scale_id.0,
            from = %request.requester_id.0,
            to = %request.target_id.0,
            "swap executed"
        );
        self.events.publish(SchedulingEvent::SwapRequestResponded {
            tenant_id: tenant.clone(),
            request_id: request.id.clone(),
            scale_id: request.scale_id.clone(),
            status: SubstitutionStatus::Accepted,
        })?;
        self.events.publish(SchedulingEvent::SwapExecuted {
            tenant_id: tenant.clone(),
            scale_id: request.scale_id.clone(),
            function_id,
            from_volunteer: request.requester_id.clone(),
            to_volunteer: request.target_id.clone(),
        })?;

        Ok(request)
    }

    fn persist_expiry(&self, request: &mut SubstitutionRequest) -> Result<(), SubstitutionError> {
        request.status = SubstitutionStatus::Expired;
        // Opportunistic: a racing writer may have already finalized the
        // request, which is fine for decision purposes.
        match self.requests.transition(request.clone()) {
            Ok(()) | Err(RepositoryError::Conflict) => Ok(()),
            Err(other) => Err(SubstitutionError::Repository(other)),
        }
    }

    fn fetch_scale(
        &self,
        tenant: &TenantId,
        scale_id: &ScaleId,
    ) -> Result<Scale, SubstitutionError> {
        self.scales
            .fetch(tenant, scale_id)?
            .ok_or_else(|| SubstitutionError::ScaleNotFound(scale_id.clone()))
    }
}

fn map_transition_conflict(err: RepositoryError) -> SubstitutionError {
    match err {
        RepositoryError::Conflict => SubstitutionError::AlreadyResponded,
        other => SubstitutionError::Repository(other),
    }
}
