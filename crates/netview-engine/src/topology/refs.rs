/// Extracts the node id from a link endpoint reference.
///
/// Grammar, in order of precedence:
///
/// ```text
/// reference = "ne:" node-id "/" port-path   ; structured reference
///           | node-id "/" port-path         ; structured, no scheme
///           | node-id                       ; bare id (fallback)
/// port-path = segment *("/" segment)        ; shelf/slot/port, ignored here
/// ```
///
/// So `"ne:core-7/1/2/3"`, `"core-7/1/2/3"` and `"core-7"` all resolve to
/// `"core-7"`. Anything that matches neither structured form is treated as
/// a bare id verbatim; this function never fails.
pub fn extract_node_id(reference: &str) -> &str {
    let rest = reference.strip_prefix("ne:").unwrap_or(reference);
    match rest.split_once('/') {
        Some((node_id, _)) if !node_id.is_empty() => node_id,
        _ => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_passes_through() {
        assert_eq!(extract_node_id("core-7"), "core-7");
    }

    #[test]
    fn scheme_and_port_path_are_stripped() {
        assert_eq!(extract_node_id("ne:core-7/1/2/3"), "core-7");
    }

    #[test]
    fn port_path_without_scheme() {
        assert_eq!(extract_node_id("edge-a/0/1"), "edge-a");
    }

    #[test]
    fn scheme_without_path() {
        assert_eq!(extract_node_id("ne:edge-a"), "edge-a");
    }

    #[test]
    fn degenerate_leading_slash_falls_back_to_whole_string() {
        // No extractable id before the slash; whole-string fallback.
        assert_eq!(extract_node_id("/1/2"), "/1/2");
    }
}
