/// Prepends `/prefix` to a cookie path. The root path maps to `/prefix`
/// rather than `/prefix/`.
///
/// The prefix is used verbatim: surrounding slashes are not stripped here, so
/// `prefix_path("/x", "/api/")` yields `"//api//x"`. Callers normalize the
/// prefix once and never pass an empty one.
pub fn prefix_path(path: &str, prefix: &str) -> String {
    if path == "/" {
        return format!("/{prefix}");
    }
    format!("/{prefix}{path}")
}
