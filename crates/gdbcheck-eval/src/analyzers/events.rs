use crate::model::{GroupFindings, GroupKind};

use super::{AnalysisContext, degraded};

/// Geologic events that no extended attribute links to.
///
/// Produces nothing unless both the events and the extended-attributes
/// entities exist.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let conventions = &ctx.registry.conventions;
    let events = &conventions.geologic_events;
    let attributes = &conventions.extended_attributes;
    if !ctx.inventory.contains(events) || !ctx.inventory.contains(attributes) {
        return Vec::new();
    }

    let ids = match ctx.distinct(events, &ctx.registry.identifier_field(events)) {
        Ok(ids) => ids,
        Err(line) => return degraded(&[GroupKind::UnusedEvents], &line),
    };
    let linked = match ctx.distinct(attributes, &conventions.value_link_field) {
        Ok(linked) => linked,
        Err(line) => return degraded(&[GroupKind::UnusedEvents], &line),
    };

    let unused = ids.difference(&linked).map(|id| id.to_string()).collect();
    vec![GroupFindings::new(GroupKind::UnusedEvents, unused)]
}
