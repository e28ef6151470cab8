//! Campaign selection: highest priority wins, ties go to the smallest id.

use std::cmp::Ordering;
use std::sync::Arc;

use super::model::Campaign;

/// Precedence order: `Less` means `a` should play before `b`.
pub fn precedence(a: &Campaign, b: &Campaign) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| a.id().cmp(b.id()))
}

/// Pick the campaign that should be playing. Pure; callers re-evaluate on
/// every qualifying event rather than caching the answer.
pub fn select_campaign(campaigns: &[Arc<Campaign>]) -> Option<&Arc<Campaign>> {
    campaigns.iter().min_by(|a, b| precedence(a, b))
}
