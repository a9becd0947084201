//! Matching configured key/certificate names against a remote listing.

use std::collections::HashSet;

const PEM_SUFFIX: &str = ".pem";

/// Find the on-server filename for a logical name.
///
/// Tries the name verbatim, then the `.pem`-toggled variant: stripped when
/// the name already ends in `.pem` (any case), appended otherwise. Matching
/// against `available` is exact and case-sensitive.
pub fn resolve_remote_filename(available: &HashSet<String>, desired: &str) -> Option<String> {
    if desired.is_empty() {
        return None;
    }

    candidates(desired)
        .into_iter()
        .find(|candidate| available.contains(candidate))
}

fn candidates(desired: &str) -> [String; 2] {
    let alternate = if has_suffix_ignore_case(desired, PEM_SUFFIX) {
        desired[..desired.len() - PEM_SUFFIX.len()].to_string()
    } else {
        format!("{desired}{PEM_SUFFIX}")
    };
    [desired.to_string(), alternate]
}

/// ASCII case-insensitive suffix test that never slices inside a UTF-8 char.
pub(crate) fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    let (name, suffix) = (name.as_bytes(), suffix.as_bytes());
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
