//! Position maintenance for ordered scopes.
//!
//! A scope is the set of lists of one board or the set of tasks of one list.
//! Members carry an integer `position`; after any reorder or move the touched
//! scopes are renumbered to `0..count`. Appends take `max + 1` and never touch
//! siblings, and deletes never renumber, so gaps can exist until the next
//! reorder.
//!
//! These functions are pure. The server runs them inside a transaction, the
//! client runs them against its local snapshot for optimistic updates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Position = i64;

/// A member id together with the position it should hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: i64,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingError {
    /// The id does not belong to the scope
    #[error("{0} is not a member of this scope")]
    UnknownMember(i64),

    /// The id appears more than once in the requested order
    #[error("{0} appears more than once in the requested order")]
    DuplicateMember(i64),

    /// A member of the scope was left out of the requested order
    #[error("{0} is missing from the requested order")]
    MissingMember(i64),

    /// The scope's highest position leaves no room to append after it
    #[error("position {0} is the largest allowed; reorder the scope before appending")]
    PositionOverflow(Position),
}

/// Position for a new member appended to a scope.
pub fn next_position<I>(existing: I) -> Result<Position, OrderingError>
where
    I: IntoIterator<Item = Position>,
{
    match existing.into_iter().max() {
        None => Ok(0),
        Some(max) => max
            .checked_add(1)
            .ok_or(OrderingError::PositionOverflow(max)),
    }
}

/// Clamp a requested insertion index into `[0, len]`. Negative indexes
/// insert at the front.
pub fn clamp_index(index: i64, len: usize) -> usize {
    usize::try_from(index).map_or(0, |index| index.min(len))
}

/// Assign each id the position equal to its index.
pub fn renumber(order: &[i64]) -> Vec<Placement> {
    order
        .iter()
        .enumerate()
        .map(|(index, id)| Placement {
            id: *id,
            position: index as Position,
        })
        .collect()
}

/// Check that `order` names every member of the scope exactly once.
pub fn validate_order(members: &[i64], order: &[i64]) -> Result<(), OrderingError> {
    let known: HashSet<i64> = members.iter().copied().collect();
    let mut seen = HashSet::with_capacity(order.len());

    for id in order {
        if !known.contains(id) {
            return Err(OrderingError::UnknownMember(*id));
        }
        if !seen.insert(*id) {
            return Err(OrderingError::DuplicateMember(*id));
        }
    }

    match members.iter().find(|id| !seen.contains(*id)) {
        Some(missing) => Err(OrderingError::MissingMember(*missing)),
        None => Ok(()),
    }
}

/// Placements that bring `members` into `order`.
///
/// Only members whose position actually changes are returned, so applying
/// the same order twice yields nothing the second time.
pub fn reorder(members: &[Placement], order: &[i64]) -> Result<Vec<Placement>, OrderingError> {
    let ids: Vec<i64> = members.iter().map(|member| member.id).collect();
    validate_order(&ids, order)?;

    Ok(renumber(order)
        .into_iter()
        .filter(|target| {
            members
                .iter()
                .any(|member| member.id == target.id && member.position != target.position)
        })
        .collect())
}

/// Move `id` to `index` inside one scope and return the new order.
///
/// The index is clamped to the last slot.
pub fn move_within(order: &[i64], id: i64, index: i64) -> Result<Vec<i64>, OrderingError> {
    let from = order
        .iter()
        .position(|member| *member == id)
        .ok_or(OrderingError::UnknownMember(id))?;

    let mut result = order.to_vec();
    result.remove(from);
    let to = clamp_index(index, result.len());
    result.insert(to, id);
    Ok(result)
}

/// Outcome of moving one member from a source scope into a different
/// destination scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Remaining source members, renumbered from 0
    pub source: Vec<Placement>,
    /// Destination members including the moved one, renumbered from 0
    pub destination: Vec<Placement>,
    /// Final position of the moved member
    pub position: Position,
}

/// Remove `id` from `source` and insert it into `destination` at `index`
/// (clamped to `[0, destination.len()]`).
///
/// Callers moving inside one scope use [`move_within`] instead; running
/// both halves over the same scope would renumber it twice.
pub fn plan_move(
    source: &[i64],
    destination: &[i64],
    id: i64,
    index: i64,
) -> Result<MovePlan, OrderingError> {
    if !source.contains(&id) {
        return Err(OrderingError::UnknownMember(id));
    }
    if destination.contains(&id) {
        return Err(OrderingError::DuplicateMember(id));
    }

    let remaining: Vec<i64> = source.iter().copied().filter(|member| *member != id).collect();

    let mut target = destination.to_vec();
    let at = clamp_index(index, target.len());
    target.insert(at, id);

    Ok(MovePlan {
        source: renumber(&remaining),
        destination: renumber(&target),
        position: at as Position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placements(pairs: &[(i64, Position)]) -> Vec<Placement> {
        pairs
            .iter()
            .map(|(id, position)| Placement {
                id: *id,
                position: *position,
            })
            .collect()
    }

    fn permutations(items: &[i64]) -> Vec<Vec<i64>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut result = Vec::new();
        for (i, head) in items.iter().enumerate() {
            let mut rest = items.to_vec();
            rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, *head);
                result.push(tail);
            }
        }
        result
    }

    #[test]
    fn test_next_position_empty_scope() {
        assert_eq!(next_position(Vec::new()), Ok(0));
    }

    #[test]
    fn test_next_position_uses_max_not_count() {
        assert_eq!(next_position(vec![0, 2]), Ok(3));
        assert_eq!(next_position(vec![5, 1, 3]), Ok(6));
    }

    #[test]
    fn test_next_position_at_max_is_an_error() {
        assert_eq!(
            next_position(vec![0, Position::MAX]),
            Err(OrderingError::PositionOverflow(Position::MAX))
        );
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(-1, 3), 0);
        assert_eq!(clamp_index(i64::MIN, 3), 0);
        assert_eq!(clamp_index(2, 3), 2);
        assert_eq!(clamp_index(99, 3), 3);
        assert_eq!(clamp_index(0, 0), 0);
    }

    #[test]
    fn test_reorder_reverse() {
        let members = placements(&[(10, 0), (11, 1), (12, 2)]);
        let updates = reorder(&members, &[12, 11, 10]).unwrap();
        assert_eq!(updates, placements(&[(12, 0), (10, 2)]));
    }

    #[test]
    fn test_reorder_is_idempotent() {
        let members = placements(&[(1, 0), (2, 1), (3, 2)]);
        let order = [3, 1, 2];
        let first = reorder(&members, &order).unwrap();

        let mut applied = members.clone();
        for update in &first {
            if let Some(member) = applied.iter_mut().find(|m| m.id == update.id) {
                member.position = update.position;
            }
        }

        assert!(reorder(&applied, &order).unwrap().is_empty());
    }

    #[test]
    fn test_reorder_every_permutation_reads_back() {
        let members = placements(&[(1, 0), (2, 1), (3, 2), (4, 3)]);
        for order in permutations(&[1, 2, 3, 4]) {
            let mut applied = members.clone();
            for update in reorder(&members, &order).unwrap() {
                if let Some(member) = applied.iter_mut().find(|m| m.id == update.id) {
                    member.position = update.position;
                }
            }
            applied.sort_by_key(|member| member.position);
            let read_back: Vec<i64> = applied.iter().map(|member| member.id).collect();
            assert_eq!(read_back, order);
        }
    }

    #[test]
    fn test_reorder_closes_gaps() {
        let members = placements(&[(1, 0), (3, 2)]);
        let updates = reorder(&members, &[1, 3]).unwrap();
        assert_eq!(updates, placements(&[(3, 1)]));
    }

    #[test]
    fn test_reorder_rejects_wrong_member_sets() {
        let members = placements(&[(1, 0), (2, 1)]);
        assert_eq!(
            reorder(&members, &[1, 2, 9]),
            Err(OrderingError::UnknownMember(9))
        );
        assert_eq!(
            reorder(&members, &[1, 1]),
            Err(OrderingError::DuplicateMember(1))
        );
        assert_eq!(reorder(&members, &[2]), Err(OrderingError::MissingMember(1)));
    }

    #[test]
    fn test_move_within_clamps() {
        assert_eq!(move_within(&[1, 2, 3], 1, 99).unwrap(), vec![2, 3, 1]);
        assert_eq!(move_within(&[1, 2, 3], 3, 0).unwrap(), vec![3, 1, 2]);
        assert_eq!(move_within(&[1, 2, 3], 2, 1).unwrap(), vec![1, 2, 3]);
        assert_eq!(move_within(&[1, 2, 3], 3, -4).unwrap(), vec![3, 1, 2]);
        assert!(move_within(&[1, 2, 3], 4, 0).is_err());
    }

    #[test]
    fn test_plan_move_conserves_members() {
        let source = [1, 2, 3, 4];
        let destination = [7, 8];
        for index in 0..=destination.len() {
            let plan = plan_move(&source, &destination, 2, index as i64).unwrap();

            assert_eq!(plan.source.len(), source.len() - 1);
            assert_eq!(plan.destination.len(), destination.len() + 1);
            for (expected, placement) in plan.source.iter().enumerate() {
                assert_eq!(placement.position, expected as Position);
            }
            for (expected, placement) in plan.destination.iter().enumerate() {
                assert_eq!(placement.position, expected as Position);
            }
            assert_eq!(plan.position, index as Position);
            assert_eq!(plan.destination[index].id, 2);
        }
    }

    #[test]
    fn test_plan_move_into_empty_scope() {
        let plan = plan_move(&[1, 2, 3], &[], 1, 5).unwrap();
        assert_eq!(plan.source, placements(&[(2, 0), (3, 1)]));
        assert_eq!(plan.destination, placements(&[(1, 0)]));
        assert_eq!(plan.position, 0);
    }

    #[test]
    fn test_plan_move_negative_index_goes_first() {
        let plan = plan_move(&[1, 2], &[7, 8], 2, -1).unwrap();
        assert_eq!(plan.destination, placements(&[(2, 0), (7, 1), (8, 2)]));
        assert_eq!(plan.position, 0);
    }

    #[test]
    fn test_plan_move_requires_membership() {
        assert_eq!(
            plan_move(&[1], &[2], 5, 0),
            Err(OrderingError::UnknownMember(5))
        );
        assert_eq!(
            plan_move(&[1, 2], &[2], 2, 0),
            Err(OrderingError::DuplicateMember(2))
        );
    }
}
