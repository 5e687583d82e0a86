//! Role-scoped alert listing filters.

use uuid::Uuid;

use crate::models::{ActorScope, AlertClause, AlertFilter, AlertStatus, StatusMatch};

/// Builds the listing filter for `scope`.
///
/// `statuses` is the caller's status filter; `None` means no filter was sent.
pub fn listing_filter(scope: ActorScope, statuses: Option<Vec<AlertStatus>>) -> AlertFilter {
    match scope {
        ActorScope::Admin => AlertFilter::single(AlertClause::statuses(
            statuses.map_or(StatusMatch::Any, StatusMatch::In),
        )),
        ActorScope::Garage { garage_id } => garage_filter(garage_id, statuses),
        ActorScope::Requester { user_id } => AlertFilter::single(
            AlertClause::statuses(match statuses {
                Some(list) => StatusMatch::In(list),
                None => StatusMatch::NotIn(vec![AlertStatus::Cancelled]),
            })
            .created_by(user_id),
        ),
    }
}

/// Garages see open statuses without restriction, and `assigned` or
/// `resolved` alerts only when assigned to their own garage. The halves are
/// separate clauses so the ownership check never applies to the open half.
fn garage_filter(garage_id: Uuid, statuses: Option<Vec<AlertStatus>>) -> AlertFilter {
    let Some(statuses) = statuses else {
        // Default view: the open queue plus everything this garage handled.
        return AlertFilter::single(AlertClause::statuses(StatusMatch::In(vec![
            AlertStatus::Pending,
        ])))
        .or(AlertClause::statuses(StatusMatch::Any).assigned_to(garage_id));
    };

    let (owned, general): (Vec<_>, Vec<_>) = statuses
        .into_iter()
        .partition(AlertStatus::is_owned_by_responder);

    let mut filter = AlertFilter::default();
    if !general.is_empty() {
        filter = filter.or(AlertClause::statuses(StatusMatch::In(general)));
    }
    if !owned.is_empty() {
        filter = filter.or(AlertClause::statuses(StatusMatch::In(owned)).assigned_to(garage_id));
    }
    filter
}
