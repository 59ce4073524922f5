//! Volunteer-scheduling core: availability calendars, ranked assignment
//! suggestions, the peer-to-peer substitution workflow, and the service
//! history ledger that biases future ranking.
//!
//! Tenant context is always an explicit parameter; the core never reads
//! ambient tenant or clock state.

pub mod assignment;
pub mod availability;
pub mod domain;
pub mod history;
pub mod providers;
pub mod repository;
pub mod substitution;
pub mod validator;

#[cfg(test)]
mod tests;

pub use assignment::{
    AssignmentConfig, AssignmentError, AssignmentPlan, FunctionSuggestions, ScaleAssignmentEngine,
    SlotCandidate, SlotSelection,
};
pub use availability::{AvailabilityError, AvailabilityStore, MonthlyBlockedInfo};
pub use domain::{
    Assignment, AssignmentStatus, BlockedDate, BranchId, FunctionId, FunctionSlot, MinistryId,
    RequestId, Scale, ScaleId, ScaleStatus, ServiceHistoryEntry, ServiceOutcome, ServiceStats,
    SkillLevel, SubstitutionRequest, SubstitutionStatus, TenantId, VolunteerAvailability,
    VolunteerId,
};
pub use history::{HistoryError, ServiceHistoryLedger};
pub use providers::{
    MembershipProvider, ProviderError, QualificationProvider, QualifiedFunction,
    QualifiedVolunteer,
};
pub use repository::{
    AvailabilityRepository, EventError, EventPublisher, RepositoryError, ScaleRepository,
    SchedulingEvent, ServiceHistoryRepository, SubstitutionRepository,
};
pub use substitution::{
    SubstitutionError, SubstitutionWorkflow, SwapCandidate, SwapDecision,
};
pub use validator::{
    AvailabilityDecision, AvailabilityValidator, BlockCheck, BlockRefusal, UnavailabilityReason,
    ValidatorError,
};
