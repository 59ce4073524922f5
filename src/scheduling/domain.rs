use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for tenants; every core call is tenant-keyed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Identifier wrapper for branches within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchId(pub String);

/// Identifier wrapper for ministries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinistryId(pub String);

/// Identifier wrapper for volunteers. `Ord` backs the deterministic ranking
/// tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolunteerId(pub String);

/// Identifier wrapper for ministry functions (e.g. "Vocalista").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub String);

/// Identifier wrapper for scales (scheduled service occurrences).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScaleId(pub String);

/// Identifier wrapper for substitution requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

macro_rules! display_as_inner {
    ($($id:ident),+ $(,)?) => {
        $(
            impl fmt::Display for $id {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

display_as_inner!(
    TenantId, BranchId, MinistryId, VolunteerId, FunctionId, ScaleId, RequestId,
);

/// Skill level attached to an approved qualification. Declaration order
/// gives `Beginner < Intermediate < Specialist`, which the ranking relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Specialist,
}

impl SkillLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Specialist => "specialist",
        }
    }
}

/// One blocked calendar day inside a volunteer's availability record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDate {
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

/// Per (tenant, ministry, volunteer) availability calendar. At most one
/// active record exists per key; records are deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerAvailability {
    pub tenant_id: TenantId,
    pub branch_id: Option<BranchId>,
    pub ministry_id: MinistryId,
    pub volunteer_id: VolunteerId,
    pub blocked_dates: Vec<BlockedDate>,
    pub max_blocked_days_per_month: u8,
    pub is_active: bool,
    pub last_updated: DateTime<Utc>,
}

impl VolunteerAvailability {
    pub fn new(
        tenant_id: TenantId,
        branch_id: Option<BranchId>,
        ministry_id: MinistryId,
        volunteer_id: VolunteerId,
        max_blocked_days_per_month: u8,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            branch_id,
            ministry_id,
            volunteer_id,
            blocked_dates: Vec::new(),
            max_blocked_days_per_month,
            is_active: true,
            last_updated: now,
        }
    }

    /// True when the exact calendar day carries a blocking entry.
    pub fn is_day_blocked(&self, date: NaiveDate) -> bool {
        self.blocked_dates
            .iter()
            .any(|entry| entry.is_blocked && entry.date == date)
    }

    /// Count of blocking entries falling in the given calendar month.
    pub fn blocked_days_in_month(&self, year: i32, month: u32) -> u32 {
        use chrono::Datelike;
        self.blocked_dates
            .iter()
            .filter(|entry| {
                entry.is_blocked && entry.date.year() == year && entry.date.month() == month
            })
            .count() as u32
    }

    /// Insert a blocking entry keeping the list sorted by day.
    pub(crate) fn insert_blocked(&mut self, entry: BlockedDate) {
        let pos = self
            .blocked_dates
            .binary_search_by_key(&entry.date, |existing| existing.date)
            .unwrap_or_else(|insert_at| insert_at);
        self.blocked_dates.insert(pos, entry);
    }

    /// Remove the entry for the given day, if present.
    pub(crate) fn remove_blocked(&mut self, date: NaiveDate) -> bool {
        let before = self.blocked_dates.len();
        self.blocked_dates.retain(|entry| entry.date != date);
        before != self.blocked_dates.len()
    }
}

/// Lifecycle of a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStatus {
    Draft,
    Published,
    Occurred,
    Cancelled,
}

impl ScaleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Occurred => "occurred",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A role within a scale with required/optional headcount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSlot {
    pub function_id: FunctionId,
    pub required_slots: u8,
    pub optional_slots: u8,
    pub is_required: bool,
}

/// Status of a single volunteer assignment on a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Suggested,
    Confirmed,
    SwappedOut,
}

impl AssignmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Suggested => "suggested",
            Self::Confirmed => "confirmed",
            Self::SwappedOut => "swapped_out",
        }
    }
}

/// A volunteer slotted into a function on a scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub function_id: FunctionId,
    pub volunteer_id: VolunteerId,
    pub status: AssignmentStatus,
}

/// A rostered service occurrence for a ministry on a date. `version` is the
/// optimistic-concurrency token; stores bump it on every accepted update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub id: ScaleId,
    pub tenant_id: TenantId,
    pub branch_id: Option<BranchId>,
    pub ministry_id: MinistryId,
    pub service_date: NaiveDate,
    pub function_slots: Vec<FunctionSlot>,
    pub assignments: Vec<Assignment>,
    pub status: ScaleStatus,
    pub version: u64,
}

impl Scale {
    /// The volunteer's confirmed assignment on this scale, if any.
    pub fn confirmed_assignment(&self, volunteer: &VolunteerId) -> Option<&Assignment> {
        self.assignments.iter().find(|assignment| {
            assignment.volunteer_id == *volunteer
                && assignment.status == AssignmentStatus::Confirmed
        })
    }

    /// Confirmed headcount for one function.
    pub fn confirmed_count(&self, function: &FunctionId) -> u32 {
        self.assignments
            .iter()
            .filter(|assignment| {
                assignment.function_id == *function
                    && assignment.status == AssignmentStatus::Confirmed
            })
            .count() as u32
    }

    /// Flip `from`'s confirmed assignment for `function` to swapped-out and
    /// confirm `to` for the same function. Returns false when `from` holds
    /// no confirmed assignment for that function, leaving the scale intact.
    pub(crate) fn swap_assignment(
        &mut self,
        function: &FunctionId,
        from: &VolunteerId,
        to: &VolunteerId,
    ) -> bool {
        let Some(outgoing) = self.assignments.iter_mut().find(|assignment| {
            assignment.function_id == *function
                && assignment.volunteer_id == *from
                && assignment.status == AssignmentStatus::Confirmed
        }) else {
            return false;
        };
        outgoing.status = AssignmentStatus::SwappedOut;

        if let Some(incoming) = self.assignments.iter_mut().find(|assignment| {
            assignment.function_id == *function && assignment.volunteer_id == *to
        }) {
            incoming.status = AssignmentStatus::Confirmed;
        } else {
            self.assignments.push(Assignment {
                function_id: function.clone(),
                volunteer_id: to.clone(),
                status: AssignmentStatus::Confirmed,
            });
        }
        true
    }
}

/// Lifecycle of a substitution request. Every non-pending state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Expired,
}

impl SubstitutionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A peer-to-peer swap request between a requester and a target volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRequest {
    pub id: RequestId,
    pub tenant_id: TenantId,
    pub scale_id: ScaleId,
    pub requester_id: VolunteerId,
    pub target_id: VolunteerId,
    pub reason: String,
    pub status: SubstitutionStatus,
    pub rejection_reason: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SubstitutionRequest {
    pub fn is_pending(&self) -> bool {
        self.status == SubstitutionStatus::Pending
    }

    /// Lazy-expiry predicate: a pending request past its horizon counts as
    /// expired for decision purposes even before the transition is persisted.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && now > self.expires_at
    }
}

/// Realized outcome of one assignment after the scale occurred or was
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOutcome {
    Completed,
    Missed,
    Cancelled,
}

impl ServiceOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Append-only history record; corrections are new entries, never updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHistoryEntry {
    pub tenant_id: TenantId,
    pub volunteer_id: VolunteerId,
    pub scale_id: ScaleId,
    pub function_id: FunctionId,
    pub ministry_id: MinistryId,
    pub service_date: NaiveDate,
    pub status: ServiceOutcome,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate attendance statistics for one volunteer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub total_services: u32,
    pub completed_services: u32,
    pub missed_services: u32,
    pub cancelled_services: u32,
    /// Percentage in [0, 100]; 0 when no services were recorded.
    pub attendance_rate: f32,
}
