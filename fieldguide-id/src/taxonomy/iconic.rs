//! Iconic groups
//!
//! An iconic group is a coarse visual category (birds, plants, ...) used for
//! default imagery. A taxon's group is picked by walking a fixed priority
//! list and taking the first group present in the taxon's ancestry.

/// Catch-all group when no iconic ancestor is found
pub const DEFAULT_ICONIC_GROUP: i64 = 1;
/// Protozoa
pub const PROTOZOA: i64 = 47686;
/// Chromista (kelp and relatives)
pub const CHROMISTA: i64 = 48222;

/// Known iconic groups
const ICONIC_GROUPS: [(i64, &str); 13] = [
    (DEFAULT_ICONIC_GROUP, "Animalia"),
    (3, "Aves"),
    (20978, "Amphibia"),
    (26036, "Reptilia"),
    (40151, "Mammalia"),
    (47115, "Mollusca"),
    (47119, "Arachnida"),
    (47126, "Plantae"),
    (47158, "Insecta"),
    (47170, "Fungi"),
    (47178, "Actinopterygii"),
    (PROTOZOA, "Protozoa"),
    (CHROMISTA, "Chromista"),
];

/// Lookup order. Protozoa and kelp come first; the rest run from the
/// highest group id down, and the catch-all is never matched directly.
const PRIORITY: [i64; 12] = [
    PROTOZOA, CHROMISTA, 47178, 47170, 47158, 47126, 47119, 47115, 40151, 26036, 20978, 3,
];

/// Position of `group_id` in the lookup order (0 = checked first)
pub fn priority_of(group_id: i64) -> Option<usize> {
    PRIORITY.iter().position(|&id| id == group_id)
}

/// Display name of an iconic group
pub fn iconic_group_name(group_id: i64) -> Option<&'static str> {
    ICONIC_GROUPS
        .iter()
        .find(|(id, _)| *id == group_id)
        .map(|(_, name)| *name)
}

/// First iconic group (in priority order) present in `ancestor_ids`
pub fn resolve_iconic_group(ancestor_ids: &[i64]) -> i64 {
    PRIORITY
        .iter()
        .copied()
        .find(|id| ancestor_ids.contains(id))
        .unwrap_or(DEFAULT_ICONIC_GROUP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protozoa() {
        assert_eq!(resolve_iconic_group(&[47686]), PROTOZOA);
    }

    #[test]
    fn test_empty_falls_back_to_default() {
        assert_eq!(resolve_iconic_group(&[]), DEFAULT_ICONIC_GROUP);
    }

    #[test]
    fn test_animal_lineage_without_iconic_class() {
        // Animalia → Annelida: no iconic group below the kingdom
        assert_eq!(resolve_iconic_group(&[48460, 1, 47491]), DEFAULT_ICONIC_GROUP);
    }

    #[test]
    fn test_monarch_lineage_is_insecta() {
        let lineage = [48460, 1, 47120, 372739, 47158, 184884, 47157, 47224, 47223, 48662];
        assert_eq!(resolve_iconic_group(&lineage), 47158);
    }

    #[test]
    fn test_bird_lineage() {
        assert_eq!(resolve_iconic_group(&[48460, 1, 2, 355675, 3, 7251]), 3);
    }

    #[test]
    fn test_priority_table() {
        assert_eq!(priority_of(PROTOZOA), Some(0));
        assert_eq!(priority_of(CHROMISTA), Some(1));
        assert_eq!(priority_of(3), Some(11));
        assert_eq!(priority_of(DEFAULT_ICONIC_GROUP), None);
    }

    #[test]
    fn test_every_prioritized_group_has_a_name() {
        for id in PRIORITY {
            assert!(iconic_group_name(id).is_some(), "{} has no name", id);
        }
        assert_eq!(iconic_group_name(47126), Some("Plantae"));
        assert_eq!(iconic_group_name(999), None);
    }
}
