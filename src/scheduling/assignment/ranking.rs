use super::SlotCandidate;

/// Composite priority: qualification level descending, then fewer realized
/// services in the trailing window, then volunteer id for determinism.
pub(crate) fn rank_candidates(candidates: &mut [SlotCandidate]) {
    candidates.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| a.recent_services.cmp(&b.recent_services))
            .then_with(|| a.volunteer_id.cmp(&b.volunteer_id))
    });
}

/// Percentage of required slots for which an available, qualified volunteer
/// exists, rounded to the nearest integer. A scale with no required slots is
/// fully covered by definition.
pub(crate) fn coverage_percent(fillable_required: u32, total_required: u32) -> u8 {
    if total_required == 0 {
        return 100;
    }
    ((fillable_required as f64 / total_required as f64) * 100.0).round() as u8
}
