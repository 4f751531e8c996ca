//! Dashboard and folder identifier derivation
//!
//! Grafana uids are limited to 40 characters of `[A-Za-z0-9-]`. Every
//! dashboard a package ships lives under the package namespace: its uid
//! equals the package folder uid or starts with it followed by a hyphen.
//! The folder itself owns the bare namespace, so dashboard uids never equal
//! it.
//!
//! Derivation is total: any input string (empty, unicode, oversized) yields a
//! valid uid. Nothing here returns an error.

use crate::package::short_name;

/// Maximum length of a Grafana uid.
pub const MAX_UID_LEN: usize = 40;

/// Namespace used when a package short name has no usable characters.
const FALLBACK_NAMESPACE: &str = "package";

/// Collapse every run of characters outside `[A-Za-z0-9]` into a single `-`.
///
/// Existing hyphens are part of such runs, so `"a //--b"` becomes `"a-b"`.
/// The output is ASCII, which keeps byte truncation on char boundaries.
pub fn sanitize_uid(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Folder uid for a package: the sanitized short name.
pub fn folder_uid(package_name: &str) -> String {
    let mut uid = sanitize_uid(short_name(package_name));
    uid.truncate(MAX_UID_LEN);
    if uid.trim_matches('-').is_empty() {
        FALLBACK_NAMESPACE.to_string()
    } else {
        uid
    }
}

/// Folder title for a package: its short name.
pub fn folder_title(package_name: &str) -> String {
    let short = short_name(package_name).trim();
    if short.is_empty() {
        folder_uid(package_name)
    } else {
        short.to_string()
    }
}

/// Whether `uid` belongs to the namespace of `package_name`.
pub fn in_namespace(package_name: &str, uid: &str) -> bool {
    has_namespace_prefix(&folder_uid(package_name), uid)
}

fn has_namespace_prefix(namespace: &str, uid: &str) -> bool {
    match uid.strip_prefix(namespace) {
        Some(rest) => rest.is_empty() || rest.starts_with('-') || namespace.ends_with('-'),
        None => false,
    }
}

/// Derive the uid of the dashboard at `index` in a package manifest.
///
/// 1. A missing or blank `raw_uid` becomes `{namespace}-{index}`.
/// 2. A uid outside the namespace is prefixed with `{namespace}-`.
/// 3. The result is sanitized. When it is too long it is cut from the right,
///    so the namespace prefix survives, and ends with `-{index}` so siblings
///    cut to the same prefix stay distinct.
/// 4. A result equal to the folder uid is suffixed with the index.
pub fn dashboard_uid(package_name: &str, raw_uid: Option<&str>, index: usize) -> String {
    let namespace = folder_uid(package_name);

    let candidate = raw_uid
        .map(sanitize_uid)
        .filter(|uid| !uid.trim_matches('-').is_empty());

    let uid = match candidate {
        Some(uid) if has_namespace_prefix(&namespace, &uid) => uid,
        Some(uid) => sanitize_uid(&format!("{namespace}-{uid}")),
        None => sanitize_uid(&format!("{namespace}-{index}")),
    };
    let uid = if uid.len() > MAX_UID_LEN {
        with_index(&uid, index, 0)
    } else {
        uid
    };

    if uid == namespace {
        disambiguate(&namespace, index)
    } else {
        uid
    }
}

/// Build a uid distinct from `namespace` by appending the index.
///
/// Attempt 0 can only collide when the namespace already ends in `-{index}`
/// at full length; attempt 1 ends in a different digit, so the loop runs at
/// most twice.
fn disambiguate(namespace: &str, index: usize) -> String {
    let mut attempt = 0usize;
    loop {
        let uid = with_index(namespace, index, attempt);
        if uid != namespace {
            return uid;
        }
        attempt += 1;
    }
}

/// `base` cut so that `-{index}` (or `-{index}-{attempt}`) fits in a uid.
fn with_index(base: &str, index: usize, attempt: usize) -> String {
    let suffix = if attempt == 0 {
        format!("-{index}")
    } else {
        format!("-{index}-{attempt}")
    };
    let mut base = base.to_string();
    base.truncate(MAX_UID_LEN.saturating_sub(suffix.len()));
    sanitize_uid(&format!("{base}{suffix}"))
}

/// Derive the title of the dashboard at `index`.
///
/// The developer title wins when present; otherwise `{shortName} {index}`.
pub fn dashboard_title(package_name: &str, raw_title: Option<&str>, index: usize) -> String {
    match raw_title.map(str::trim).filter(|title| !title.is_empty()) {
        Some(title) => title.to_string(),
        None => format!("{} {}", folder_title(package_name), index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRYSM: &str = "prysm.dnp.dappnode.eth";

    #[test]
    fn test_missing_uid_is_synthesized() {
        assert_eq!(dashboard_uid(PRYSM, None, 0), "prysm-0");
        assert_eq!(dashboard_uid(PRYSM, Some(""), 3), "prysm-3");
        assert_eq!(dashboard_uid(PRYSM, Some("//"), 1), "prysm-1");
    }

    #[test]
    fn test_folder_uid_is_short_name() {
        assert_eq!(folder_uid(PRYSM), "prysm");
        assert_eq!(folder_title(PRYSM), "prysm");
        assert_eq!(folder_uid("my_node.dnp.dappnode.eth"), "my-node");
    }

    #[test]
    fn test_special_characters_collapse() {
        assert_eq!(
            dashboard_uid(PRYSM, Some("Prysm dashboard //--"), 0),
            "prysm-Prysm-dashboard-"
        );
    }

    #[test]
    fn test_uid_in_namespace_is_kept() {
        assert_eq!(dashboard_uid(PRYSM, Some("prysm-beacon"), 0), "prysm-beacon");
        assert_eq!(dashboard_uid(PRYSM, Some("prysm_beacon"), 0), "prysm-beacon");
    }

    #[test]
    fn test_similar_prefix_is_not_namespace() {
        assert_eq!(
            dashboard_uid(PRYSM, Some("prysmatic"), 2),
            "prysm-prysmatic"
        );
        assert!(!in_namespace(PRYSM, "prysmatic"));
        assert!(in_namespace(PRYSM, "prysm-prysmatic"));
    }

    #[test]
    fn test_folder_collision_is_disambiguated() {
        assert_eq!(dashboard_uid(PRYSM, Some("prysm"), 0), "prysm-0");
        assert_eq!(dashboard_uid(PRYSM, Some("prysm"), 4), "prysm-4");
        assert_ne!(dashboard_uid(PRYSM, Some("prysm"), 0), folder_uid(PRYSM));
    }

    #[test]
    fn test_too_long_uid_keeps_namespace() {
        let uid = dashboard_uid(PRYSM, Some(&"p".repeat(80)), 0);
        assert_eq!(uid.len(), MAX_UID_LEN);
        assert!(uid.starts_with("prysm-"));
        assert_eq!(uid, format!("prysm-{}-0", "p".repeat(32)));

        let sibling = dashboard_uid(PRYSM, Some(&"p".repeat(81)), 1);
        assert_eq!(sibling, format!("prysm-{}-1", "p".repeat(32)));
    }

    #[test]
    fn test_long_namespace_keeps_index() {
        let name = format!("{}.dnp.dappnode.eth", "a".repeat(39));
        let first = dashboard_uid(&name, None, 0);
        let second = dashboard_uid(&name, None, 1);

        assert_ne!(first, second);
        assert_eq!(first, format!("{}-0", "a".repeat(38)));
        assert_eq!(second, format!("{}-1", "a".repeat(38)));
        assert_ne!(first, folder_uid(&name));
    }

    #[test]
    fn test_long_namespace_collision() {
        let name = format!("{}-0.dnp.dappnode.eth", "a".repeat(38));
        let folder = folder_uid(&name);
        assert_eq!(folder.len(), MAX_UID_LEN);

        let uid = dashboard_uid(&name, None, 0);
        assert_ne!(uid, folder);
        assert!(uid.len() <= MAX_UID_LEN);
    }

    #[test]
    fn test_unicode_and_empty_names() {
        let uid = dashboard_uid("ñandú.eth", Some("panel ✓"), 1);
        assert_eq!(uid, "-and-panel-");

        assert_eq!(folder_uid(""), "package");
        assert_eq!(dashboard_uid("", None, 0), "package-0");
        assert_eq!(folder_title(""), "package");
    }

    #[test]
    fn test_titles() {
        assert_eq!(dashboard_title(PRYSM, None, 0), "prysm 0");
        assert_eq!(dashboard_title(PRYSM, Some("  "), 2), "prysm 2");
        assert_eq!(dashboard_title(PRYSM, Some("Beacon"), 2), "Beacon");
    }
}
