//! TodoMVC selectors.
//!
//! Tasks are addressed by position (`nth=`) in the current view, never by
//! text: `:has-text()` is a case-insensitive substring match and would
//! confuse "Task to Edit" with "Task to Edit by Tab".

use tickmark_common::FilterKind;

pub const BODY: &str = "body";
pub const HEADER: &str = ".header h1";
pub const NEW_TODO: &str = "input.new-todo";
pub const ITEMS: &str = ".todo-list li";
pub const COMPLETED_ITEMS: &str = ".todo-list li.completed";
pub const EDIT_INPUT: &str = "input.edit";

pub const NEW_TODO_PLACEHOLDER: &str = "What needs to be done?";
pub const HEADER_TEXT: &str = "todos";

/// Target for outside-activation commits; clicking it never lands on a task
pub const OUTSIDE: &str = HEADER;

pub fn item(index: usize) -> String {
    format!("{} >> nth={}", ITEMS, index)
}

pub fn item_part(index: usize, part: &str) -> String {
    format!("{} >> {}", item(index), part)
}

pub fn label(index: usize) -> String {
    item_part(index, "label")
}

pub fn toggle(index: usize) -> String {
    item_part(index, "input.toggle")
}

pub fn destroy(index: usize) -> String {
    item_part(index, "button.destroy")
}

pub fn edit_input(index: usize) -> String {
    item_part(index, EDIT_INPUT)
}

pub fn filter_link(filter: FilterKind) -> String {
    format!(".filters a:has-text('{}')", filter.label())
}

/// Filter selected by a URL's hash route (`#/active`, `#/completed`)
pub fn route_filter(url: &str) -> FilterKind {
    match url.rsplit_once('#').map(|(_, route)| route.trim_start_matches('/')) {
        Some("active") => FilterKind::Active,
        Some("completed") => FilterKind::Completed,
        _ => FilterKind::All,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_parts() {
        assert_eq!(item(2), ".todo-list li >> nth=2");
        assert_eq!(destroy(0), ".todo-list li >> nth=0 >> button.destroy");
        assert_eq!(edit_input(1), ".todo-list li >> nth=1 >> input.edit");
    }

    #[test]
    fn test_filter_link() {
        assert_eq!(
            filter_link(FilterKind::Completed),
            ".filters a:has-text('Completed')"
        );
    }

    #[test]
    fn test_route_filter() {
        assert_eq!(route_filter("https://x/#/active"), FilterKind::Active);
        assert_eq!(route_filter("https://x/#/completed"), FilterKind::Completed);
        assert_eq!(route_filter("https://x/#/"), FilterKind::All);
        assert_eq!(route_filter("https://x/"), FilterKind::All);
    }
}
