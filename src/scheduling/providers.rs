use serde::{Deserialize, Serialize};

use super::domain::{BranchId, FunctionId, MinistryId, SkillLevel, TenantId, VolunteerId};

/// Error raised by the identity/qualification collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// An approved function held by one volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedFunction {
    pub function_id: FunctionId,
    pub level: SkillLevel,
}

/// A volunteer approved for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedVolunteer {
    pub volunteer_id: VolunteerId,
    pub level: SkillLevel,
}

/// Qualification data consumed from the surrounding system. Only approved
/// qualifications are ever returned; unapproved functions never surface as
/// suggestions.
pub trait QualificationProvider: Send + Sync {
    /// Approved functions for one volunteer in a ministry.
    fn approved_functions(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
    ) -> Result<Vec<QualifiedFunction>, ProviderError>;

    /// All volunteers approved for a function, optionally branch-scoped.
    fn approved_volunteers(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        function: &FunctionId,
        branch: Option<&BranchId>,
    ) -> Result<Vec<QualifiedVolunteer>, ProviderError>;

    /// The ministry's function catalog; backs the template-integrity guard.
    fn ministry_functions(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
    ) -> Result<Vec<FunctionId>, ProviderError>;
}

/// Membership scope consumed from the surrounding system.
pub trait MembershipProvider: Send + Sync {
    fn is_active_member(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        branch: Option<&BranchId>,
    ) -> Result<bool, ProviderError>;
}
