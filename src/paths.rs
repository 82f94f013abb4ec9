/// Normalize a parameter-store prefix.
///
/// Backslashes become forward slashes and the result starts and ends with
/// exactly one `/`, so `prefix + key` is always a valid hierarchical name.
///
/// ```
/// assert_eq!(fixbot::sanitize_path("self-healing-code"), "/self-healing-code/");
/// assert_eq!(fixbot::sanitize_path("\\a\\b\\"), "/a/b/");
/// ```
pub fn sanitize_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let inner = normalized.trim_matches('/');
    if inner.is_empty() {
        return "/".to_string();
    }
    format!("/{}/", inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_missing_slashes() {
        assert_eq!(sanitize_path("app/prod"), "/app/prod/");
        assert_eq!(sanitize_path("/app/prod"), "/app/prod/");
        assert_eq!(sanitize_path("app/prod/"), "/app/prod/");
    }

    #[test]
    fn converts_backslashes() {
        assert_eq!(sanitize_path(r"app\prod"), "/app/prod/");
    }

    #[test]
    fn collapses_repeated_edges() {
        assert_eq!(sanitize_path("//app//"), "/app/");
        assert_eq!(sanitize_path(""), "/");
        assert_eq!(sanitize_path("///"), "/");
    }

    #[test]
    fn is_idempotent() {
        for input in ["", "/", "a", r"\a\b", "a/b/", "//x//y//", r"\\srv\share\"] {
            let once = sanitize_path(input);
            assert_eq!(sanitize_path(&once), once, "input {:?}", input);
            assert!(once.starts_with('/') && !once.starts_with("//") || once == "/");
            assert!(once.ends_with('/') && !once.ends_with("//") || once == "/");
        }
    }
}
