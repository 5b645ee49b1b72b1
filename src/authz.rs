//! Authorization: deciding whether a caller's token subjects may act on a
//! topic's tenant.

/// Decides allow/deny for a caller against a topic's required tenant
/// subject, OR-ed across every subject carried by the token.
///
/// A subject is allowed when any of:
/// 1. it is one of the configured super-roles,
/// 2. it equals `required_subject` literally,
/// 3. stripping its last `-`-delimited suffix yields a non-empty string
///    equal to `required_subject` (the tenant-extraction rule).
pub fn authorize(required_subject: &str, token_subjects: &str, super_roles: &[String]) -> bool {
    token_subjects
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .any(|subject| {
            super_roles.iter().any(|role| role == subject)
                || subject == required_subject
                || tenant_of_subject(subject).is_some_and(|tenant| tenant == required_subject)
        })
}

/// Strips the last `-`-delimited suffix from a token subject, e.g.
/// `acme-prod` → `acme`. Returns `None` when there is no `-` or the
/// remainder is empty.
fn tenant_of_subject(subject: &str) -> Option<&str> {
    let (head, _) = subject.rsplit_once('-')?;
    if head.is_empty() {
        None
    } else {
        Some(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_role_is_always_allowed() {
        let roles = vec!["admin".to_string()];
        assert!(authorize("acme", "admin", &roles));
    }

    #[test]
    fn literal_subject_match_is_allowed() {
        assert!(authorize("acme", "acme", &[]));
    }

    #[test]
    fn tenant_suffix_stripping_allows() {
        assert!(authorize("acme", "acme-prod", &[]));
    }

    #[test]
    fn unrelated_subject_is_denied() {
        assert!(!authorize("acme", "other-prod", &[]));
    }

    #[test]
    fn or_across_multiple_token_subjects() {
        assert!(authorize("acme", "other, acme-prod", &[]));
    }

    #[test]
    fn bare_suffix_with_no_remainder_is_denied() {
        assert!(!authorize("", "-prod", &[]));
    }
}
