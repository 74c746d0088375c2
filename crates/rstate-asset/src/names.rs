//! Archive member naming: forward-slash paths in lexically cleaned form.

use std::path::{Component, Path};

/// Lexically clean a forward-slash path.
///
/// Repeated separators and `.` elements are dropped and `..` elements
/// consume the preceding element where one exists. An empty result becomes
/// `"."`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join a sub-archive's key with one of its member names.
pub fn join_member(root: &str, name: &str) -> String {
    match (root.is_empty(), name.is_empty()) {
        (true, _) => clean_path(name),
        (false, true) => clean_path(root),
        (false, false) => clean_path(&format!("{root}/{name}")),
    }
}

/// Name of `path` relative to `root`, with forward slashes regardless of the
/// host separator.
pub fn relative_member_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(clean_path(&parts.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn clean_collapses_dots_and_slashes() {
        assert_eq!(clean_path("./foo"), "foo");
        assert_eq!(clean_path("foo//bar/./baz"), "foo/bar/baz");
        assert_eq!(clean_path("foo/../bar"), "bar");
        assert_eq!(clean_path("../foo"), "../foo");
        assert_eq!(clean_path("/../foo"), "/foo");
        assert_eq!(clean_path("foo/"), "foo");
        assert_eq!(clean_path(""), ".");
        assert_eq!(clean_path("."), ".");
        assert_eq!(clean_path("/"), "/");
    }

    #[test]
    fn join_prefixes_and_cleans() {
        assert_eq!(join_member("./foo", "a.txt"), "foo/a.txt");
        assert_eq!(join_member("foo", "bar/b.txt"), "foo/bar/b.txt");
        assert_eq!(join_member("", "x"), "x");
        assert_eq!(join_member("dir/", ""), "dir");
    }

    #[test]
    fn relative_names_use_forward_slashes() {
        let root = PathBuf::from("/tmp/root");
        let path = root.join("a").join("b.txt");
        assert_eq!(relative_member_name(&root, &path).as_deref(), Some("a/b.txt"));
        assert_eq!(relative_member_name(&root, Path::new("/elsewhere")), None);
    }

    proptest::proptest! {
        #[test]
        fn clean_is_idempotent(path in "[a-z./]{0,24}") {
            let once = clean_path(&path);
            proptest::prop_assert_eq!(clean_path(&once), once.clone());
            proptest::prop_assert!(!once.contains("//"));
        }

        #[test]
        fn joined_names_have_no_dot_segments(root in "[a-z]{1,6}(/[a-z]{1,6}){0,3}", name in "[a-z]{1,6}(/[a-z]{1,6}){0,3}") {
            let joined = join_member(&format!("./{root}"), &name);
            proptest::prop_assert_eq!(joined, format!("{root}/{name}"));
        }
    }
}
