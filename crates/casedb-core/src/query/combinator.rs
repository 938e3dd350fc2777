//! Set combination of candidate id sets.

use crate::storage::IdSet;

/// Ids present in both `selected` and `candidates`.
///
/// Commutative, associative and idempotent; an empty operand yields an
/// empty result. Iterates the smaller operand.
pub fn intersect(selected: &IdSet, candidates: &IdSet) -> IdSet {
    let (small, large) = if selected.len() <= candidates.len() {
        (selected, candidates)
    } else {
        (candidates, selected)
    };

    small
        .iter()
        .filter(|id| large.contains(id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u64]) -> IdSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_commutative() {
        let a = set(&[1, 2, 3, 4]);
        let b = set(&[3, 4, 5]);
        assert_eq!(intersect(&a, &b), intersect(&b, &a));
        assert_eq!(intersect(&a, &b), set(&[3, 4]));
    }

    #[test]
    fn test_idempotent() {
        let a = set(&[1, 2, 3]);
        assert_eq!(intersect(&a, &a), a);
    }

    #[test]
    fn test_empty_operand() {
        let a = set(&[1, 2, 3]);
        let empty = IdSet::new();
        assert!(intersect(&a, &empty).is_empty());
        assert!(intersect(&empty, &a).is_empty());
        assert!(intersect(&empty, &empty).is_empty());
    }

    #[test]
    fn test_associative() {
        let a = set(&[1, 2, 3, 4, 5]);
        let b = set(&[2, 3, 4, 9]);
        let c = set(&[3, 4, 7]);
        assert_eq!(
            intersect(&intersect(&a, &b), &c),
            intersect(&a, &intersect(&b, &c))
        );
    }

    #[test]
    fn test_never_introduces_ids() {
        let a = set(&[1, 2, 3]);
        let b = set(&[2, 3, 4]);
        let result = intersect(&a, &b);
        assert!(result.iter().all(|id| a.contains(id) && b.contains(id)));
    }
}
