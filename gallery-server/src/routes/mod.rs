pub mod canvas;
pub mod images;
pub mod system;
pub mod users;

/// A request field that must be present and non-blank.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
