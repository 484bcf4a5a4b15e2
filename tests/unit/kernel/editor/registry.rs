use super::*;
use crate::kernel::TextEncoding;

fn loc(raw: &str) -> Locator {
    Locator::parse(raw).unwrap()
}

fn push_file(reg: &mut TabRegistry, raw: &str) -> TabId {
    let id = reg.alloc_tab_id();
    reg.push(EditorTab::file(id, loc(raw), "", TextEncoding::Utf8))
}

#[test]
fn ids_are_unique_and_increasing() {
    let mut reg = TabRegistry::new();
    let a = reg.alloc_tab_id();
    let b = reg.alloc_tab_id();
    assert!(b > a);
}

#[test]
fn set_active_requires_membership() {
    let mut reg = TabRegistry::new();
    let a = push_file(&mut reg, "/a.txt");
    assert_eq!(reg.active_id(), None);
    assert!(!reg.set_active(TabId::new(99)));
    assert!(reg.set_active(a));
    assert!(!reg.set_active(a));
    assert_eq!(reg.active_tab().map(|t| t.id), Some(a));
}

#[test]
fn find_prefers_last_match_and_never_returns_diff_for_any() {
    let mut reg = TabRegistry::new();
    let first = push_file(&mut reg, "/a.txt");
    let second = push_file(&mut reg, "/a.txt");
    let diff_id = reg.alloc_tab_id();
    reg.push(EditorTab::diff(
        diff_id,
        loc("/a.txt"),
        loc("/a.txt").previous_version(),
        "",
        "",
    ));

    assert_ne!(first, second);
    assert_eq!(reg.find(&loc("/a.txt"), OpenKind::Any), Some(second));
    assert_eq!(reg.find(&loc("/a.txt"), OpenKind::Diff), Some(diff_id));
    assert_eq!(
        reg.find_diff(&loc("/a.txt"), &loc("/a.txt").previous_version()),
        Some(diff_id)
    );
    assert_eq!(reg.find_diff(&loc("/a.txt"), &loc("/b.txt")), None);
}

#[test]
fn reference_count_includes_compare_targets() {
    let mut reg = TabRegistry::new();
    push_file(&mut reg, "/a.txt");
    let id = reg.alloc_tab_id();
    reg.push(EditorTab::diff(id, loc("/b.txt"), loc("/a.txt"), "", ""));

    assert_eq!(reg.reference_count(&loc("/a.txt")), 2);
    assert_eq!(reg.reference_count(&loc("/b.txt")), 1);
    assert_eq!(reg.reference_count(&loc("/c.txt")), 0);
}

#[test]
fn replace_at_keeps_position_and_moves_active() {
    let mut reg = TabRegistry::new();
    let a = push_file(&mut reg, "/a.txt");
    push_file(&mut reg, "/b.txt");
    reg.set_active(a);

    let c = reg.alloc_tab_id();
    let old = reg
        .replace_at(0, EditorTab::file(c, loc("/c.txt"), "", TextEncoding::Utf8))
        .unwrap();
    assert_eq!(old.id, a);
    assert!(old.token().is_cancelled());
    assert_eq!(reg.active_id(), Some(c));
    assert_eq!(reg.index_of(c), Some(0));
    assert_eq!(reg.len(), 2);
}

#[test]
fn neighbour_prefers_left() {
    let mut reg = TabRegistry::new();
    let a = push_file(&mut reg, "/a.txt");
    let b = push_file(&mut reg, "/b.txt");
    push_file(&mut reg, "/c.txt");
    assert_eq!(reg.neighbour_of(0), Some(b));
    assert_eq!(reg.neighbour_of(1), Some(a));
}

#[test]
fn removing_active_clears_pointer_and_cancels_token() {
    let mut reg = TabRegistry::new();
    let a = push_file(&mut reg, "/a.txt");
    reg.set_active(a);
    let token = reg.get(a).unwrap().token().clone();

    let removed = reg.remove(a).unwrap();
    assert_eq!(removed.id, a);
    assert_eq!(reg.active_id(), None);
    assert!(token.is_cancelled());
    assert!(reg.is_empty());
    assert!(reg.remove(a).is_none());
}

#[test]
fn ids_within_matches_previews_of_descendants() {
    let mut reg = TabRegistry::new();
    let inside = push_file(&mut reg, "/dir/a.md");
    push_file(&mut reg, "/dirx/b.md");
    let preview = reg.alloc_tab_id();
    reg.push(EditorTab::preview(preview, &loc("/dir/a.md"), ""));

    assert_eq!(reg.ids_within(&loc("/dir")), vec![inside, preview]);
}

#[test]
fn clear_cancels_everything() {
    let mut reg = TabRegistry::new();
    let a = push_file(&mut reg, "/a.txt");
    reg.set_active(a);
    let tabs = reg.clear();
    assert_eq!(tabs.len(), 1);
    assert!(tabs[0].token().is_cancelled());
    assert_eq!(reg.active_id(), None);
}

#[test]
fn view_mode_change_is_reported() {
    let mut reg = TabRegistry::new();
    assert!(!reg.set_view_mode(ViewMode::Normal));
    assert!(reg.set_view_mode(ViewMode::Diff));
    assert_eq!(reg.view_mode(), ViewMode::Diff);
}
