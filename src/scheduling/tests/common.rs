use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::scheduling::assignment::{AssignmentConfig, ScaleAssignmentEngine};
use crate::scheduling::availability::AvailabilityStore;
use crate::scheduling::domain::{
    Assignment, AssignmentStatus, BranchId, FunctionId, FunctionSlot, MinistryId, RequestId, Scale,
    ScaleId, ScaleStatus, ServiceHistoryEntry, ServiceOutcome, SkillLevel, SubstitutionRequest,
    TenantId, VolunteerAvailability, VolunteerId,
};
use crate::scheduling::history::ServiceHistoryLedger;
use crate::scheduling::providers::{
    MembershipProvider, ProviderError, QualificationProvider, QualifiedFunction,
    QualifiedVolunteer,
};
use crate::scheduling::repository::{
    AvailabilityRepository, EventError, EventPublisher, RepositoryError, ScaleRepository,
    SchedulingEvent, ServiceHistoryRepository, SubstitutionRepository,
};
use crate::scheduling::substitution::SubstitutionWorkflow;
use crate::scheduling::validator::AvailabilityValidator;

pub(super) fn tenant() -> TenantId {
    TenantId("acme-church".to_string())
}

pub(super) fn ministry() -> MinistryId {
    MinistryId("worship".to_string())
}

pub(super) fn volunteer(name: &str) -> VolunteerId {
    VolunteerId(name.to_string())
}

pub(super) fn function(name: &str) -> FunctionId {
    FunctionId(name.to_string())
}

pub(super) fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, dom: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, dom, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn slot(name: &str, required: u8, optional: u8) -> FunctionSlot {
    FunctionSlot {
        function_id: function(name),
        required_slots: required,
        optional_slots: optional,
        is_required: true,
    }
}

pub(super) fn draft_scale(id: &str, date: NaiveDate, slots: Vec<FunctionSlot>) -> Scale {
    Scale {
        id: ScaleId(id.to_string()),
        tenant_id: tenant(),
        branch_id: None,
        ministry_id: ministry(),
        service_date: date,
        function_slots: slots,
        assignments: Vec::new(),
        status: ScaleStatus::Draft,
        version: 0,
    }
}

pub(super) fn published_scale(
    id: &str,
    date: NaiveDate,
    slots: Vec<FunctionSlot>,
    confirmed: Vec<(&str, &str)>,
) -> Scale {
    let mut scale = draft_scale(id, date, slots);
    scale.status = ScaleStatus::Published;
    scale.assignments = confirmed
        .into_iter()
        .map(|(function_name, volunteer_name)| Assignment {
            function_id: function(function_name),
            volunteer_id: volunteer(volunteer_name),
            status: AssignmentStatus::Confirmed,
        })
        .collect();
    scale
}

pub(super) fn history_entry(
    volunteer_name: &str,
    scale_name: &str,
    function_name: &str,
    date: NaiveDate,
    status: ServiceOutcome,
) -> ServiceHistoryEntry {
    ServiceHistoryEntry {
        tenant_id: tenant(),
        volunteer_id: volunteer(volunteer_name),
        scale_id: ScaleId(scale_name.to_string()),
        function_id: function(function_name),
        ministry_id: ministry(),
        service_date: date,
        status,
        notes: None,
        recorded_at: at(2024, 6, 1, 12),
    }
}

#[derive(Default)]
struct StoreState {
    availability: HashMap<(TenantId, MinistryId, VolunteerId), VolunteerAvailability>,
    scales: HashMap<(TenantId, ScaleId), Scale>,
    requests: HashMap<(TenantId, RequestId), SubstitutionRequest>,
    history: Vec<ServiceHistoryEntry>,
}

/// One lock over every collection, so `commit_swap` is trivially atomic —
/// the same guarantee a database-backed store gets from a transaction.
#[derive(Default)]
pub(super) struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub(super) fn seed_scale(&self, scale: Scale) {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state
            .scales
            .insert((scale.tenant_id.clone(), scale.id.clone()), scale);
    }

    pub(super) fn scale(&self, tenant: &TenantId, id: &ScaleId) -> Scale {
        let state = self.state.lock().expect("store mutex poisoned");
        state
            .scales
            .get(&(tenant.clone(), id.clone()))
            .cloned()
            .expect("scale present")
    }

    pub(super) fn request(&self, tenant: &TenantId, id: &RequestId) -> SubstitutionRequest {
        let state = self.state.lock().expect("store mutex poisoned");
        state
            .requests
            .get(&(tenant.clone(), id.clone()))
            .cloned()
            .expect("request present")
    }
}

impl AvailabilityRepository for MemoryStore {
    fn fetch(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
    ) -> Result<Option<VolunteerAvailability>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .availability
            .get(&(tenant.clone(), ministry.clone(), volunteer.clone()))
            .cloned())
    }

    fn upsert(&self, record: VolunteerAvailability) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state.availability.insert(
            (
                record.tenant_id.clone(),
                record.ministry_id.clone(),
                record.volunteer_id.clone(),
            ),
            record,
        );
        Ok(())
    }
}

impl ScaleRepository for MemoryStore {
    fn fetch(&self, tenant: &TenantId, id: &ScaleId) -> Result<Option<Scale>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.scales.get(&(tenant.clone(), id.clone())).cloned())
    }

    fn insert(&self, scale: Scale) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let key = (scale.tenant_id.clone(), scale.id.clone());
        if state.scales.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        state.scales.insert(key, scale);
        Ok(())
    }

    fn update(&self, mut scale: Scale) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let key = (scale.tenant_id.clone(), scale.id.clone());
        let stored = state.scales.get(&key).ok_or(RepositoryError::NotFound)?;
        if stored.version != scale.version {
            return Err(RepositoryError::Conflict);
        }
        scale.version += 1;
        state.scales.insert(key, scale);
        Ok(())
    }

    fn confirmed_for_volunteer_on(
        &self,
        tenant: &TenantId,
        volunteer: &VolunteerId,
        date: NaiveDate,
    ) -> Result<Vec<Scale>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .scales
            .values()
            .filter(|scale| {
                scale.tenant_id == *tenant
                    && scale.service_date == date
                    && scale.confirmed_assignment(volunteer).is_some()
            })
            .cloned()
            .collect())
    }
}

impl SubstitutionRepository for MemoryStore {
    fn insert(&self, request: SubstitutionRequest) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let duplicate = state.requests.values().any(|existing| {
            existing.tenant_id == request.tenant_id
                && existing.scale_id == request.scale_id
                && existing.requester_id == request.requester_id
                && existing.is_pending()
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        state
            .requests
            .insert((request.tenant_id.clone(), request.id.clone()), request);
        Ok(())
    }

    fn fetch(
        &self,
        tenant: &TenantId,
        id: &RequestId,
    ) -> Result<Option<SubstitutionRequest>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.requests.get(&(tenant.clone(), id.clone())).cloned())
    }

    fn transition(&self, request: SubstitutionRequest) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let key = (request.tenant_id.clone(), request.id.clone());
        let stored = state.requests.get(&key).ok_or(RepositoryError::NotFound)?;
        if stored.status.is_terminal() {
            return Err(RepositoryError::Conflict);
        }
        state.requests.insert(key, request);
        Ok(())
    }

    fn commit_swap(
        &self,
        request: SubstitutionRequest,
        mut scale: Scale,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let request_key = (request.tenant_id.clone(), request.id.clone());
        let scale_key = (scale.tenant_id.clone(), scale.id.clone());

        let stored_request = state
            .requests
            .get(&request_key)
            .ok_or(RepositoryError::NotFound)?;
        if stored_request.status.is_terminal() {
            return Err(RepositoryError::Conflict);
        }
        let stored_scale = state.scales.get(&scale_key).ok_or(RepositoryError::NotFound)?;
        if stored_scale.version != scale.version {
            return Err(RepositoryError::Conflict);
        }

        scale.version += 1;
        state.requests.insert(request_key, request);
        state.scales.insert(scale_key, scale);
        Ok(())
    }
}

impl ServiceHistoryRepository for MemoryStore {
    fn append(&self, entry: ServiceHistoryEntry) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let duplicate = state.history.iter().any(|existing| {
            existing.tenant_id == entry.tenant_id
                && existing.volunteer_id == entry.volunteer_id
                && existing.scale_id == entry.scale_id
                && existing.function_id == entry.function_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        state.history.push(entry);
        Ok(())
    }

    fn for_volunteer(
        &self,
        tenant: &TenantId,
        volunteer: &VolunteerId,
    ) -> Result<Vec<ServiceHistoryEntry>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .history
            .iter()
            .filter(|entry| entry.tenant_id == *tenant && entry.volunteer_id == *volunteer)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryQualifications {
    approvals: Mutex<HashMap<(TenantId, MinistryId, FunctionId), Vec<QualifiedVolunteer>>>,
    catalogs: Mutex<HashMap<(TenantId, MinistryId), Vec<FunctionId>>>,
}

impl MemoryQualifications {
    pub(super) fn approve(
        &self,
        ministry: &MinistryId,
        function: &FunctionId,
        volunteer: &VolunteerId,
        level: SkillLevel,
    ) {
        self.register_function(ministry, function);
        let mut approvals = self.approvals.lock().expect("approvals mutex poisoned");
        approvals
            .entry((tenant(), ministry.clone(), function.clone()))
            .or_default()
            .push(QualifiedVolunteer {
                volunteer_id: volunteer.clone(),
                level,
            });
    }

    pub(super) fn register_function(&self, ministry: &MinistryId, function: &FunctionId) {
        let mut catalogs = self.catalogs.lock().expect("catalogs mutex poisoned");
        let entry = catalogs.entry((tenant(), ministry.clone())).or_default();
        if !entry.contains(function) {
            entry.push(function.clone());
        }
    }
}

impl QualificationProvider for MemoryQualifications {
    fn approved_functions(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
    ) -> Result<Vec<QualifiedFunction>, ProviderError> {
        let approvals = self.approvals.lock().expect("approvals mutex poisoned");
        Ok(approvals
            .iter()
            .filter(|((t, m, _), _)| t == tenant && m == ministry)
            .flat_map(|((_, _, function), qualified)| {
                qualified
                    .iter()
                    .filter(|entry| entry.volunteer_id == *volunteer)
                    .map(|entry| QualifiedFunction {
                        function_id: function.clone(),
                        level: entry.level,
                    })
            })
            .collect())
    }

    fn approved_volunteers(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        function: &FunctionId,
        _branch: Option<&BranchId>,
    ) -> Result<Vec<QualifiedVolunteer>, ProviderError> {
        let approvals = self.approvals.lock().expect("approvals mutex poisoned");
        Ok(approvals
            .get(&(tenant.clone(), ministry.clone(), function.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn ministry_functions(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
    ) -> Result<Vec<FunctionId>, ProviderError> {
        let catalogs = self.catalogs.lock().expect("catalogs mutex poisoned");
        Ok(catalogs
            .get(&(tenant.clone(), ministry.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub(super) struct MemoryMembership {
    inactive: Mutex<HashSet<(TenantId, MinistryId, VolunteerId)>>,
}

impl MemoryMembership {
    pub(super) fn deactivate(&self, ministry: &MinistryId, volunteer: &VolunteerId) {
        self.inactive
            .lock()
            .expect("membership mutex poisoned")
            .insert((tenant(), ministry.clone(), volunteer.clone()));
    }
}

impl MembershipProvider for MemoryMembership {
    fn is_active_member(
        &self,
        tenant: &TenantId,
        ministry: &MinistryId,
        volunteer: &VolunteerId,
        _branch: Option<&BranchId>,
    ) -> Result<bool, ProviderError> {
        let inactive = self.inactive.lock().expect("membership mutex poisoned");
        Ok(!inactive.contains(&(tenant.clone(), ministry.clone(), volunteer.clone())))
    }
}

#[derive(Default)]
pub(super) struct MemoryEvents {
    events: Mutex<Vec<SchedulingEvent>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<SchedulingEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for MemoryEvents {
    fn publish(&self, event: SchedulingEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) type TestEngine = ScaleAssignmentEngine<
    MemoryStore,
    MemoryStore,
    MemoryMembership,
    MemoryQualifications,
    MemoryStore,
    MemoryEvents,
>;

pub(super) type TestWorkflow = SubstitutionWorkflow<
    MemoryStore,
    MemoryStore,
    MemoryStore,
    MemoryMembership,
    MemoryQualifications,
    MemoryEvents,
>;

pub(super) struct Harness {
    pub(super) store: Arc<MemoryStore>,
    pub(super) qualifications: Arc<MemoryQualifications>,
    pub(super) membership: Arc<MemoryMembership>,
    pub(super) events: Arc<MemoryEvents>,
    pub(super) availability: Arc<AvailabilityStore<MemoryStore>>,
    pub(super) validator:
        Arc<AvailabilityValidator<MemoryStore, MemoryStore, MemoryMembership>>,
    pub(super) ledger: Arc<ServiceHistoryLedger<MemoryStore>>,
    pub(super) engine: TestEngine,
    pub(super) workflow: TestWorkflow,
}

pub(super) fn harness() -> Harness {
    harness_with(AssignmentConfig::default(), 5, 24)
}

pub(super) fn harness_with(
    config: AssignmentConfig,
    default_quota: u8,
    expiry_hours: i64,
) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let qualifications = Arc::new(MemoryQualifications::default());
    let membership = Arc::new(MemoryMembership::default());
    let events = Arc::new(MemoryEvents::default());

    let availability = Arc::new(AvailabilityStore::new(store.clone(), default_quota));
    let validator = Arc::new(AvailabilityValidator::new(
        availability.clone(),
        store.clone(),
        membership.clone(),
    ));
    let ledger = Arc::new(ServiceHistoryLedger::new(store.clone()));
    let engine = ScaleAssignmentEngine::new(
        store.clone(),
        validator.clone(),
        qualifications.clone(),
        ledger.clone(),
        events.clone(),
        config,
    );
    let workflow = SubstitutionWorkflow::new(
        store.clone(),
        store.clone(),
        validator.clone(),
        qualifications.clone(),
        events.clone(),
        expiry_hours,
    );

    Harness {
        store,
        qualifications,
        membership,
        events,
        availability,
        validator,
        ledger,
        engine,
        workflow,
    }
}
