use super::*;
use crate::kernel::editor::{ImagePayload, OpenKind};
use crate::kernel::error::{NotificationLevel, SessionErrorKind};
use crate::kernel::pipeline::ReadOutcome;
use crate::kernel::services::ports::VcsStatus;
use crate::kernel::vcs::{VcsFileStatus, VcsSnapshot};
use crate::kernel::TextEncoding;
use std::sync::Arc;

fn loc(raw: &str) -> Locator {
    Locator::parse(raw).unwrap()
}

fn new_store() -> Store {
    Store::new(SessionSettings::default())
}

fn read_request(effects: &[Effect]) -> Option<u64> {
    effects.iter().find_map(|effect| match effect {
        Effect::ReadForOpen { request, .. } => Some(*request),
        _ => None,
    })
}

fn complete_open(store: &mut Store, raw: &str, new_tab: bool, outcome: ReadOutcome) -> DispatchResult {
    let locator = loc(raw);
    let res = store.dispatch(Action::Open {
        locator: locator.clone(),
        kind: OpenKind::Any,
        new_tab,
    });
    let request = read_request(&res.effects).expect("open should issue a read");
    store.dispatch(Action::OpenRead {
        request,
        locator,
        outcome,
    })
}

fn text(content: &str) -> ReadOutcome {
    ReadOutcome::Text {
        text: content.to_string(),
        encoding: TextEncoding::Utf8,
    }
}

/// Opens `raw` as a text file and returns the new tab and the effects of the
/// completion.
fn open_text(store: &mut Store, raw: &str, content: &str, new_tab: bool) -> (TabId, Vec<Effect>) {
    let res = complete_open(store, raw, new_tab, text(content));
    let id = store.state().registry.active_id().expect("opened tab is active");
    (id, res.effects)
}

fn models(effects: &[Effect]) -> Vec<&ModelCommand> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Model(command) => Some(command),
            _ => None,
        })
        .collect()
}

fn notifications(effects: &[Effect]) -> Vec<&Notification> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
        .collect()
}

fn edit(store: &mut Store, raw: &str, content: &str) {
    store.dispatch(Action::ContentChanged {
        locator: loc(raw),
        text: content.to_string(),
    });
}

fn tab(store: &Store, id: TabId) -> &EditorTab {
    store.state().registry.get(id).expect("tab exists")
}

fn write_of(effects: &[Effect]) -> Option<(Vec<(TabId, u64)>, Vec<u8>)> {
    effects.iter().find_map(|effect| match effect {
        Effect::WriteContent {
            versions, bytes, ..
        } => Some((versions.clone(), bytes.clone())),
        _ => None,
    })
}

#[test]
fn open_installs_active_file_tab_and_model() {
    let mut store = new_store();
    let (id, effects) = open_text(&mut store, "/w/a.txt", "hello", false);

    let t = tab(&store, id);
    assert_eq!(t.kind, TabKind::File);
    assert_eq!(t.text(), "hello");
    assert_eq!(
        models(&effects),
        vec![
            &ModelCommand::NewModel {
                locator: loc("/w/a.txt"),
                content: "hello".to_string(),
            },
            &ModelCommand::SetModel {
                from: None,
                to: loc("/w/a.txt"),
            },
        ]
    );
    assert!(store.state().pending_opens.is_empty());
}

#[test]
fn repeated_open_while_reading_issues_one_read() {
    let mut store = new_store();
    let first = store.dispatch(Action::Open {
        locator: loc("/w/a.txt"),
        kind: OpenKind::Any,
        new_tab: false,
    });
    let second = store.dispatch(Action::Open {
        locator: loc("/w/a.txt"),
        kind: OpenKind::Any,
        new_tab: true,
    });
    assert!(read_request(&first.effects).is_some());
    assert!(second.effects.is_empty());
    assert!(store.state().pending_opens[&loc("/w/a.txt")].new_tab);

    let request = read_request(&first.effects).unwrap();
    store.dispatch(Action::OpenRead {
        request,
        locator: loc("/w/a.txt"),
        outcome: text("x"),
    });
    assert_eq!(store.state().registry.len(), 1);
}

#[test]
fn opening_an_open_locator_activates_existing_tab() {
    let mut store = new_store();
    let (a, _) = open_text(&mut store, "/w/a.txt", "a", false);
    open_text(&mut store, "/w/b.txt", "b", true);

    let res = store.dispatch(Action::Open {
        locator: loc("/w/a.txt"),
        kind: OpenKind::Any,
        new_tab: true,
    });
    assert!(read_request(&res.effects).is_none());
    assert_eq!(store.state().registry.active_id(), Some(a));
    assert_eq!(store.state().registry.len(), 2);
    assert_eq!(
        models(&res.effects),
        vec![&ModelCommand::SetModel {
            from: Some(loc("/w/b.txt")),
            to: loc("/w/a.txt"),
        }]
    );
}

#[test]
fn unedited_active_tab_is_replaced_in_place() {
    let mut store = new_store();
    let (a, _) = open_text(&mut store, "/w/a.txt", "a", false);
    let (b, effects) = open_text(&mut store, "/w/b.txt", "b", false);

    let registry = &store.state().registry;
    assert_ne!(a, b);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.index_of(b), Some(0));
    assert_eq!(registry.active_id(), Some(b));
    assert!(models(&effects).contains(&&ModelCommand::RemoveModel {
        locator: loc("/w/a.txt"),
    }));
}

#[test]
fn edited_tab_is_never_replaced() {
    let mut store = new_store();
    open_text(&mut store, "/w/a.txt", "a", false);
    edit(&mut store, "/w/a.txt", "a!");
    open_text(&mut store, "/w/b.txt", "b", false);
    assert_eq!(store.state().registry.len(), 2);
}

#[test]
fn reuse_is_disabled_by_settings_and_new_tab() {
    let mut store = Store::new(SessionSettings {
        always_open_in_new_tab: true,
        ..SessionSettings::default()
    });
    open_text(&mut store, "/w/a.txt", "a", false);
    open_text(&mut store, "/w/b.txt", "b", false);
    assert_eq!(store.state().registry.len(), 2);

    let mut store = new_store();
    open_text(&mut store, "/w/a.txt", "a", false);
    open_text(&mut store, "/w/b.txt", "b", true);
    assert_eq!(store.state().registry.len(), 2);
}

#[test]
fn stale_or_cancelled_open_results_are_dropped() {
    let mut store = new_store();
    let res = store.dispatch(Action::Open {
        locator: loc("/w/a.txt"),
        kind: OpenKind::Any,
        new_tab: false,
    });
    let request = read_request(&res.effects).unwrap();

    let stale = store.dispatch(Action::OpenRead {
        request: request + 100,
        locator: loc("/w/a.txt"),
        outcome: text("x"),
    });
    assert!(!stale.state_changed);
    assert!(store.state().registry.is_empty());

    store.dispatch(Action::CloseAll);
    let late = store.dispatch(Action::OpenRead {
        request,
        locator: loc("/w/a.txt"),
        outcome: text("x"),
    });
    assert!(!late.state_changed);
    assert!(store.state().registry.is_empty());
}

#[test]
fn edit_save_scenario_tracks_versions() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "v1", false);
    edit(&mut store, "/w/a.txt", "v2");
    edit(&mut store, "/w/a.txt", "v3");
    assert_eq!(tab(&store, id).current_version_id(), 3);
    assert!(tab(&store, id).is_dirty());

    let res = store.dispatch(Action::Save { tab: id });
    let (versions, bytes) = write_of(&res.effects).expect("save writes");
    assert_eq!(versions, vec![(id, 3)]);
    assert_eq!(bytes, b"v3");

    // Typing continues while the write is in flight.
    edit(&mut store, "/w/a.txt", "v4");
    let res = store.dispatch(Action::Saved {
        locator: loc("/w/a.txt"),
        versions,
        result: Ok(()),
    });
    assert!(res
        .effects
        .iter()
        .any(|e| matches!(e, Effect::RefreshVcs { .. })));

    let t = tab(&store, id);
    assert_eq!(t.last_saved_version_id(), 3);
    assert_eq!(t.current_version_id(), 4);
    assert!(t.is_dirty());
    assert_eq!(t.pending_save(), None);

    let res = store.dispatch(Action::Save { tab: id });
    let (versions, _) = write_of(&res.effects).unwrap();
    assert_eq!(versions, vec![(id, 4)]);
}

#[test]
fn versions_never_decrease() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "", false);
    let mut last = tab(&store, id).current_version_id();
    for i in 0..5 {
        edit(&mut store, "/w/a.txt", &i.to_string());
        let now = tab(&store, id).current_version_id();
        assert!(now > last);
        last = now;
    }
    store.dispatch(Action::Saved {
        locator: loc("/w/a.txt"),
        versions: vec![(id, 2)],
        result: Ok(()),
    });
    assert_eq!(tab(&store, id).current_version_id(), last);
}

#[test]
fn clean_or_already_saving_tab_is_not_written() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "a", false);

    let res = store.dispatch(Action::Save { tab: id });
    assert!(res.effects.is_empty());
    assert!(!res.state_changed);

    edit(&mut store, "/w/a.txt", "b");
    assert!(write_of(&store.dispatch(Action::SaveActive).effects).is_some());
    assert!(store.dispatch(Action::Save { tab: id }).effects.is_empty());
}

#[test]
fn unencodable_text_is_reported_without_writing() {
    let mut store = new_store();
    let (id, _) = {
        let res = complete_open(
            &mut store,
            "/w/latin.txt",
            false,
            ReadOutcome::Text {
                text: "abc".to_string(),
                encoding: TextEncoding::Windows1252,
            },
        );
        (store.state().registry.active_id().unwrap(), res.effects)
    };
    edit(&mut store, "/w/latin.txt", "中");

    let res = store.dispatch(Action::Save { tab: id });
    assert!(write_of(&res.effects).is_none());
    let notes = notifications(&res.effects);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, Some(SessionErrorKind::Unencodable));
    assert_eq!(tab(&store, id).pending_save(), None);
}

#[test]
fn write_to_vanished_location_flags_tab_deleted() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "a", false);
    edit(&mut store, "/w/a.txt", "b");
    let res = store.dispatch(Action::Save { tab: id });
    let (versions, _) = write_of(&res.effects).unwrap();

    let res = store.dispatch(Action::Saved {
        locator: loc("/w/a.txt"),
        versions,
        result: Err(SessionError::ResourceMissing {
            locator: loc("/w/a.txt"),
        }),
    });
    let notes = notifications(&res.effects);
    assert_eq!(notes[0].level, NotificationLevel::Warning);
    let t = tab(&store, id);
    assert!(t.is_deleted);
    assert!(t.is_dirty());
    assert_eq!(t.pending_save(), None);
}

#[test]
fn deleted_clean_tab_can_be_saved_back() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "a", false);
    store.dispatch(Action::ExistenceChecked {
        missing: vec![loc("/w/a.txt")],
    });
    assert!(tab(&store, id).is_deleted);

    let res = store.dispatch(Action::Save { tab: id });
    let (versions, bytes) = write_of(&res.effects).expect("deleted tab is written");
    assert_eq!(bytes, b"a");
    store.dispatch(Action::Saved {
        locator: loc("/w/a.txt"),
        versions,
        result: Ok(()),
    });
    assert!(!tab(&store, id).is_deleted);
}

#[test]
fn closing_active_tab_activates_left_neighbour() {
    let mut store = new_store();
    let (a, _) = open_text(&mut store, "/w/a.txt", "", true);
    let (b, _) = open_text(&mut store, "/w/b.txt", "", true);
    let (c, _) = open_text(&mut store, "/w/c.txt", "", true);
    store.dispatch(Action::ActivateTab { tab: b });

    let res = store.dispatch(Action::Close {
        locator: loc("/w/b.txt"),
        kind: OpenKind::Any,
    });
    assert_eq!(store.state().registry.active_id(), Some(a));
    assert_eq!(
        models(&res.effects),
        vec![
            &ModelCommand::SetModel {
                from: Some(loc("/w/b.txt")),
                to: loc("/w/a.txt"),
            },
            &ModelCommand::RemoveModel {
                locator: loc("/w/b.txt"),
            },
        ]
    );

    store.dispatch(Action::Close {
        locator: loc("/w/a.txt"),
        kind: OpenKind::Any,
    });
    assert_eq!(store.state().registry.active_id(), Some(c));

    let res = store.dispatch(Action::Close {
        locator: loc("/w/c.txt"),
        kind: OpenKind::Any,
    });
    assert_eq!(store.state().registry.active_id(), None);
    assert!(store.state().registry.is_empty());
    assert!(models(&res.effects).contains(&&ModelCommand::SwitchToNormalView));
}

#[test]
fn closing_inactive_tab_still_activates_its_neighbour() {
    let mut store = new_store();
    let (a, _) = open_text(&mut store, "/w/a.txt", "", true);
    open_text(&mut store, "/w/b.txt", "", true);
    let (c, _) = open_text(&mut store, "/w/c.txt", "", true);
    assert_eq!(store.state().registry.active_id(), Some(c));

    let res = store.dispatch(Action::Close {
        locator: loc("/w/b.txt"),
        kind: OpenKind::Any,
    });
    assert_eq!(store.state().registry.active_id(), Some(a));
    assert!(models(&res.effects).contains(&&ModelCommand::SetModel {
        from: Some(loc("/w/c.txt")),
        to: loc("/w/a.txt"),
    }));

    // First tab: no left neighbour, so the right one takes over.
    store.dispatch(Action::Close {
        locator: loc("/w/a.txt"),
        kind: OpenKind::Any,
    });
    assert_eq!(store.state().registry.active_id(), Some(c));
}

#[test]
fn models_are_released_only_when_unreferenced() {
    let mut store = new_store();
    open_text(&mut store, "/w/a.txt", "a", false);
    let prev = loc("/w/a.txt").previous_version();
    store.dispatch(Action::DiffRead {
        locator: loc("/w/a.txt"),
        compare_target: prev.clone(),
        result: Ok(("old".to_string(), "a".to_string())),
    });
    assert_eq!(store.state().registry.len(), 2);

    let res = store.dispatch(Action::Close {
        locator: loc("/w/a.txt"),
        kind: OpenKind::File,
    });
    assert!(models(&res.effects)
        .iter()
        .all(|c| !matches!(c, ModelCommand::RemoveModel { .. })));

    let res = store.dispatch(Action::Close {
        locator: loc("/w/a.txt"),
        kind: OpenKind::Diff,
    });
    let removed: Vec<&ModelCommand> = models(&res.effects)
        .into_iter()
        .filter(|c| matches!(c, ModelCommand::RemoveModel { .. }))
        .collect();
    assert_eq!(
        removed,
        vec![
            &ModelCommand::RemoveModel {
                locator: loc("/w/a.txt"),
            },
            &ModelCommand::RemoveModel { locator: prev },
        ]
    );
    assert_eq!(store.state().registry.view_mode(), ViewMode::Normal);
}

#[test]
fn binary_content_opens_as_image_tab() {
    let mut store = new_store();
    let payload = ImagePayload {
        format: image::ImageFormat::Png,
        width: 4,
        height: 3,
        bytes: Arc::new(vec![0x89, b'P', b'N', b'G']),
    };
    let res = complete_open(&mut store, "/w/pic.png", false, ReadOutcome::Image(payload));

    let active = store.state().active_tab().unwrap();
    assert_eq!(active.kind, TabKind::Image);
    assert_eq!(active.image.as_ref().map(|i| (i.width, i.height)), Some((4, 3)));
    assert!(models(&res.effects).is_empty());
}

#[test]
fn failed_open_notifies_and_creates_no_tab() {
    let mut store = new_store();
    let err = SessionError::UnsupportedEncoding {
        locator: loc("/w/blob"),
    };
    let res = complete_open(&mut store, "/w/blob", false, ReadOutcome::Failed(err));
    assert!(store.state().registry.is_empty());
    assert_eq!(
        notifications(&res.effects)[0].kind,
        Some(SessionErrorKind::UnsupportedEncoding)
    );
}

#[test]
fn placeholder_open_requests_download() {
    let mut store = new_store();
    let res = store.dispatch(Action::Open {
        locator: loc("/w/.a.txt.icloud"),
        kind: OpenKind::Any,
        new_tab: false,
    });
    assert!(matches!(
        res.effects.as_slice(),
        [Effect::RequestDownload { .. }]
    ));
    assert!(store.state().pending_opens.is_empty());

    let res = store.dispatch(Action::DownloadRequested {
        locator: loc("/w/.a.txt.icloud"),
        result: Ok(()),
    });
    assert_eq!(
        notifications(&res.effects)[0].message,
        "Downloading .a.txt.icloud"
    );
}

#[test]
fn preview_follows_open_file_text() {
    let mut store = new_store();
    let (file, _) = open_text(&mut store, "/w/r.md", "# a", false);
    store.dispatch(Action::OpenPreview {
        locator: loc("/w/r.md"),
    });

    let preview = store.state().active_tab().unwrap();
    assert_eq!(preview.kind, TabKind::Preview);
    assert_eq!(preview.text(), "# a");
    let preview_id = preview.id;

    edit(&mut store, "/w/r.md", "# b");
    assert_eq!(tab(&store, preview_id).text(), "# b");
    assert_eq!(tab(&store, preview_id).current_version_id(), 1);
    assert_eq!(tab(&store, file).current_version_id(), 2);

    // A second request re-activates the same preview.
    store.dispatch(Action::ActivateTab { tab: file });
    store.dispatch(Action::Open {
        locator: loc("/w/r.md"),
        kind: OpenKind::Preview,
        new_tab: false,
    });
    assert_eq!(store.state().registry.active_id(), Some(preview_id));
    assert_eq!(store.state().registry.len(), 2);
}

#[test]
fn preview_of_unopened_file_reads_once() {
    let mut store = new_store();
    let first = store.dispatch(Action::OpenPreview {
        locator: loc("/w/n.md"),
    });
    assert!(matches!(
        first.effects.as_slice(),
        [Effect::ReadForPreview { .. }]
    ));
    let second = store.dispatch(Action::OpenPreview {
        locator: loc("/w/n.md"),
    });
    assert!(second.effects.is_empty());

    store.dispatch(Action::PreviewRead {
        locator: loc("/w/n.md"),
        result: Ok("body".to_string()),
    });
    let active = store.state().active_tab().unwrap();
    assert_eq!(active.locator, loc("/w/n.md").decorated("preview"));
    assert_eq!(active.title, "Preview n.md");

    let unsupported = store.dispatch(Action::OpenPreview {
        locator: loc("/w/main.rs"),
    });
    assert!(unsupported.effects.is_empty());
    assert!(!unsupported.state_changed);
}

#[test]
fn preview_requested_during_open_is_added_with_file() {
    let mut store = new_store();
    let res = store.dispatch(Action::Open {
        locator: loc("/w/r.md"),
        kind: OpenKind::Any,
        new_tab: false,
    });
    store.dispatch(Action::OpenPreview {
        locator: loc("/w/r.md"),
    });
    store.dispatch(Action::OpenRead {
        request: read_request(&res.effects).unwrap(),
        locator: loc("/w/r.md"),
        outcome: text("# t"),
    });

    let kinds: Vec<TabKind> = store.state().registry.tabs().iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TabKind::File, TabKind::Preview]);
    assert_eq!(store.state().active_tab().unwrap().kind, TabKind::Preview);
}

fn apply_status(store: &mut Store, tracked: &[&str]) -> DispatchResult {
    let res = store.dispatch(Action::RefreshVcs);
    let seq = match res.effects.as_slice() {
        [Effect::RefreshVcs { seq }] => *seq,
        other => panic!("expected a refresh, got {other:?}"),
    };
    let mut status = VcsStatus::default();
    for raw in tracked {
        status.worktree.insert(loc(raw), VcsFileStatus::Modified);
    }
    store.dispatch(Action::VcsRefreshed {
        seq,
        result: Ok(VcsSnapshot {
            status,
            ahead_behind: None,
            has_remote: false,
        }),
    })
}

#[test]
fn compare_with_previous_requires_tracked_changes() {
    let mut store = new_store();
    let res = store.dispatch(Action::CompareWithPrevious {
        locator: loc("/w/a.txt"),
    });
    let notes = notifications(&res.effects);
    assert_eq!(notes[0].kind, Some(SessionErrorKind::NoTrackedChanges));
    assert_eq!(notes[0].message, "No changes are made in this file");

    assert!(apply_status(&mut store, &["/w/a.txt"]).state_changed);
    let res = store.dispatch(Action::CompareWithPrevious {
        locator: loc("/w/a.txt"),
    });
    assert!(matches!(
        res.effects.as_slice(),
        [Effect::FetchPrevious { .. }]
    ));
}

#[test]
fn stale_status_is_ignored() {
    let mut store = new_store();
    let older = store.dispatch(Action::RefreshVcs);
    let older_seq = match older.effects.as_slice() {
        [Effect::RefreshVcs { seq }] => *seq,
        _ => unreachable!(),
    };
    apply_status(&mut store, &["/w/new.txt"]);

    let mut status = VcsStatus::default();
    status
        .worktree
        .insert(loc("/w/old.txt"), VcsFileStatus::Modified);
    let res = store.dispatch(Action::VcsRefreshed {
        seq: older_seq,
        result: Ok(VcsSnapshot {
            status,
            ..VcsSnapshot::default()
        }),
    });
    assert!(!res.state_changed);
    assert!(store.state().vcs.is_tracked(&loc("/w/new.txt")));
    assert!(!store.state().vcs.is_tracked(&loc("/w/old.txt")));
}

#[test]
fn compare_with_selected_needs_a_selection() {
    let mut store = new_store();
    let res = store.dispatch(Action::CompareWithSelected {
        locator: loc("/w/b.txt"),
    });
    assert_eq!(notifications(&res.effects)[0].level, NotificationLevel::Info);

    store.dispatch(Action::SelectForCompare {
        locator: loc("/w/a.txt"),
    });
    let res = store.dispatch(Action::CompareWithSelected {
        locator: loc("/w/b.txt"),
    });
    match res.effects.as_slice() {
        [Effect::ReadPair { original, modified }] => {
            assert_eq!(original, &loc("/w/a.txt"));
            assert_eq!(modified, &loc("/w/b.txt"));
        }
        other => panic!("expected a pair read, got {other:?}"),
    }
}

#[test]
fn diff_for_same_pair_is_updated_not_duplicated() {
    let mut store = new_store();
    let res = store.dispatch(Action::DiffRead {
        locator: loc("/w/b.txt"),
        compare_target: loc("/w/a.txt"),
        result: Ok(("o1".to_string(), "m1".to_string())),
    });
    assert_eq!(store.state().registry.view_mode(), ViewMode::Diff);
    assert!(models(&res.effects).contains(&&ModelCommand::SwitchToDiffView {
        original_content: "o1".to_string(),
        modified_content: "m1".to_string(),
        original: loc("/w/a.txt"),
        modified: loc("/w/b.txt"),
    }));

    let res = store.dispatch(Action::DiffRead {
        locator: loc("/w/b.txt"),
        compare_target: loc("/w/a.txt"),
        result: Ok(("o2".to_string(), "m2".to_string())),
    });
    assert_eq!(store.state().registry.len(), 1);
    let diff = store.state().active_tab().unwrap();
    assert_eq!(diff.compare_text(), "o2");
    assert_eq!(diff.text(), "m2");
    assert!(models(&res.effects).contains(&&ModelCommand::SwitchToDiffView {
        original_content: "o2".to_string(),
        modified_content: "m2".to_string(),
        original: loc("/w/a.txt"),
        modified: loc("/w/b.txt"),
    }));
}

#[test]
fn diff_over_edited_file_saves_the_live_buffer() {
    let mut store = new_store();
    let (file, _) = open_text(&mut store, "/w/a.txt", "a", false);
    edit(&mut store, "/w/a.txt", "a2");
    let res = store.dispatch(Action::DiffRead {
        locator: loc("/w/a.txt"),
        compare_target: loc("/w/a.txt").previous_version(),
        result: Ok(("old".to_string(), "a".to_string())),
    });

    let diff = store.state().active_tab().unwrap();
    assert_eq!(diff.kind, TabKind::Diff);
    assert_eq!(diff.text(), "a2");
    assert!(diff.is_dirty());
    assert!(models(&res.effects).contains(&&ModelCommand::SwitchToDiffView {
        original_content: "old".to_string(),
        modified_content: "a2".to_string(),
        original: loc("/w/a.txt").previous_version(),
        modified: loc("/w/a.txt"),
    }));

    let res = store.dispatch(Action::SaveActive);
    let (versions, bytes) = write_of(&res.effects).expect("unsaved buffer is written");
    assert_eq!(bytes, b"a2");
    assert_eq!(versions.len(), 2);
    store.dispatch(Action::Saved {
        locator: loc("/w/a.txt"),
        versions,
        result: Ok(()),
    });
    assert!(!tab(&store, file).is_dirty());
    assert!(!store.state().active_tab().unwrap().is_dirty());
}

#[test]
fn diff_tab_keeps_file_tab_encoding() {
    let mut store = new_store();
    complete_open(
        &mut store,
        "/w/l.txt",
        false,
        ReadOutcome::Text {
            text: "caf\u{e9}".to_string(),
            encoding: TextEncoding::Windows1252,
        },
    );
    store.dispatch(Action::DiffRead {
        locator: loc("/w/l.txt"),
        compare_target: loc("/w/l.txt").previous_version(),
        result: Ok(("cafe".to_string(), "caf\u{e9}".to_string())),
    });
    edit(&mut store, "/w/l.txt", "caf\u{e9}!");

    let res = store.dispatch(Action::SaveActive);
    let (_, bytes) = write_of(&res.effects).expect("edited diff is written");
    assert_eq!(bytes, b"caf\xe9!");
}

#[test]
fn leaving_a_diff_switches_back_to_normal_view() {
    let mut store = new_store();
    let (file, _) = open_text(&mut store, "/w/a.txt", "", false);
    store.dispatch(Action::DiffRead {
        locator: loc("/w/a.txt"),
        compare_target: loc("/w/a.txt").previous_version(),
        result: Ok((String::new(), String::new())),
    });
    let res = store.dispatch(Action::ActivateTab { tab: file });
    assert_eq!(
        models(&res.effects),
        vec![
            &ModelCommand::SwitchToNormalView,
            &ModelCommand::SetModel {
                from: None,
                to: loc("/w/a.txt"),
            },
        ]
    );
    assert_eq!(store.state().registry.view_mode(), ViewMode::Normal);
}

#[test]
fn rename_rebases_open_tabs() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/d/a.txt", "", false);

    let res = store.dispatch(Action::Rename {
        locator: loc("/w/d/a.txt"),
        new_name: "x/y".to_string(),
    });
    assert_eq!(
        notifications(&res.effects)[0].kind,
        Some(SessionErrorKind::InvalidLocator)
    );

    let res = store.dispatch(Action::Rename {
        locator: loc("/w/d/a.txt"),
        new_name: "b.txt".to_string(),
    });
    let (from, to) = match res.effects.as_slice() {
        [Effect::RenamePath { from, to }] => (from.clone(), to.clone()),
        other => panic!("expected a rename, got {other:?}"),
    };
    assert_eq!(to, loc("/w/d/b.txt"));

    let res = store.dispatch(Action::PathRenamed {
        from,
        to,
        result: Ok(()),
    });
    assert_eq!(
        models(&res.effects),
        vec![
            &ModelCommand::RenameModel {
                old: loc("/w/d/a.txt"),
                new: loc("/w/d/b.txt"),
            },
            &ModelCommand::SetModel {
                from: Some(loc("/w/d/a.txt")),
                to: loc("/w/d/b.txt"),
            },
        ]
    );
    let t = tab(&store, id);
    assert_eq!(t.locator, loc("/w/d/b.txt"));
    assert_eq!(t.title, "b.txt");
}

#[test]
fn folder_rename_moves_descendant_tabs() {
    let mut store = new_store();
    let (a, _) = open_text(&mut store, "/w/d/a.txt", "", true);
    let (b, _) = open_text(&mut store, "/w/d/sub/b.txt", "", true);
    store.dispatch(Action::PathRenamed {
        from: loc("/w/d"),
        to: loc("/w/e"),
        result: Ok(()),
    });
    assert_eq!(tab(&store, a).locator, loc("/w/e/a.txt"));
    assert_eq!(tab(&store, b).locator, loc("/w/e/sub/b.txt"));
}

#[test]
fn rename_reissues_open_still_reading() {
    let mut store = new_store();
    let res = store.dispatch(Action::Open {
        locator: loc("/w/d/a.txt"),
        kind: OpenKind::Any,
        new_tab: true,
    });
    let old_request = read_request(&res.effects).unwrap();

    let res = store.dispatch(Action::PathRenamed {
        from: loc("/w/d"),
        to: loc("/w/e"),
        result: Ok(()),
    });
    let (request, locator) = res
        .effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ReadForOpen { request, locator } => Some((*request, locator.clone())),
            _ => None,
        })
        .expect("open should follow the rename");
    assert_eq!(locator, loc("/w/e/a.txt"));
    assert_ne!(request, old_request);

    let late = store.dispatch(Action::OpenRead {
        request: old_request,
        locator: loc("/w/d/a.txt"),
        outcome: text("old"),
    });
    assert!(!late.state_changed);
    assert!(store.state().registry.active_id().is_none());

    store.dispatch(Action::OpenRead {
        request,
        locator: loc("/w/e/a.txt"),
        outcome: text("moved"),
    });
    let id = store.state().registry.active_id().unwrap();
    assert_eq!(tab(&store, id).locator, loc("/w/e/a.txt"));
}

#[test]
fn rename_reissues_pending_preview_read() {
    let mut store = new_store();
    store.dispatch(Action::OpenPreview {
        locator: loc("/w/d/a.md"),
    });
    let res = store.dispatch(Action::PathRenamed {
        from: loc("/w/d/a.md"),
        to: loc("/w/d/b.md"),
        result: Ok(()),
    });
    assert!(res.effects.iter().any(|effect| matches!(
        effect,
        Effect::ReadForPreview { locator } if *locator == loc("/w/d/b.md")
    )));
    assert!(!store.state().pending_previews.contains(&loc("/w/d/a.md")));
}

#[test]
fn deleting_a_folder_closes_tabs_below_it() {
    let mut store = new_store();
    open_text(&mut store, "/w/d/a.txt", "", true);
    open_text(&mut store, "/w/d/sub/b.txt", "", true);
    let (c, _) = open_text(&mut store, "/w/e/c.txt", "", true);
    store.dispatch(Action::SelectForCompare {
        locator: loc("/w/d/a.txt"),
    });

    let res = store.dispatch(Action::PathDeleted {
        locator: loc("/w/d"),
        result: Ok(()),
    });
    assert!(res
        .effects
        .iter()
        .any(|e| matches!(e, Effect::RefreshVcs { .. })));
    assert_eq!(store.state().registry.len(), 1);
    assert_eq!(store.state().registry.active_id(), Some(c));
    assert_eq!(store.state().selected_for_compare, None);
}

#[test]
fn removed_paths_are_confirmed_before_flagging() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "", false);

    let res = store.dispatch(Action::PathsChanged {
        modified: Vec::new(),
        removed: vec![loc("/w")],
    });
    match res.effects.as_slice() {
        [Effect::CheckExistence { locators }] => assert_eq!(locators, &vec![loc("/w/a.txt")]),
        other => panic!("expected an existence check, got {other:?}"),
    }
    assert!(!tab(&store, id).is_deleted);

    let res = store.dispatch(Action::ExistenceChecked {
        missing: vec![loc("/w/a.txt")],
    });
    let notes = notifications(&res.effects);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, Some(SessionErrorKind::ResourceMissing));
    assert!(tab(&store, id).is_deleted);

    let again = store.dispatch(Action::ExistenceChecked {
        missing: vec![loc("/w/a.txt")],
    });
    assert!(again.effects.is_empty());
}

#[test]
fn external_change_reloads_clean_tabs_only() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "old", false);

    let res = store.dispatch(Action::PathsChanged {
        modified: vec![loc("/w/a.txt")],
        removed: Vec::new(),
    });
    let (tab_id, external) = match res.effects.as_slice() {
        [Effect::ReloadContent { tab, external, .. }] => (*tab, *external),
        other => panic!("expected a reload, got {other:?}"),
    };
    assert_eq!(tab_id, id);
    assert!(external);

    let res = store.dispatch(Action::Reloaded {
        tab: id,
        encoding: TextEncoding::Utf8,
        external: true,
        result: Ok("new".to_string()),
    });
    assert_eq!(
        models(&res.effects),
        vec![&ModelCommand::UpdateModelContent {
            locator: loc("/w/a.txt"),
            content: "new".to_string(),
        }]
    );
    assert_eq!(tab(&store, id).text(), "new");
    assert!(!tab(&store, id).is_dirty());

    edit(&mut store, "/w/a.txt", "mine");
    let res = store.dispatch(Action::PathsChanged {
        modified: vec![loc("/w/a.txt")],
        removed: Vec::new(),
    });
    assert!(res.effects.is_empty());
}

#[test]
fn reload_with_encoding_updates_encoding_or_reports_mismatch() {
    let mut store = new_store();
    let (id, _) = open_text(&mut store, "/w/a.txt", "caf?", false);

    let res = store.dispatch(Action::ReloadWithEncoding {
        encoding: TextEncoding::Windows1252,
    });
    assert!(matches!(
        res.effects.as_slice(),
        [Effect::ReloadContent {
            external: false,
            ..
        }]
    ));

    let res = store.dispatch(Action::Reloaded {
        tab: id,
        encoding: TextEncoding::ShiftJis,
        external: false,
        result: Err(SessionError::EncodingMismatch {
            locator: loc("/w/a.txt"),
            encoding: TextEncoding::ShiftJis,
        }),
    });
    assert_eq!(
        notifications(&res.effects)[0].message,
        "Failed to read file with Shift_JIS"
    );
    assert_eq!(tab(&store, id).encoding, TextEncoding::Utf8);

    store.dispatch(Action::Reloaded {
        tab: id,
        encoding: TextEncoding::Windows1252,
        external: false,
        result: Ok("café".to_string()),
    });
    assert_eq!(tab(&store, id).encoding, TextEncoding::Windows1252);
    assert_eq!(tab(&store, id).text(), "café");
}

#[test]
fn load_workspace_resets_session() {
    let mut store = new_store();
    open_text(&mut store, "/w/a.txt", "", false);
    store.dispatch(Action::SelectForCompare {
        locator: loc("/w/a.txt"),
    });

    let res = store.dispatch(Action::LoadWorkspace { root: loc("/x") });
    assert!(models(&res.effects).contains(&&ModelCommand::RemoveAllModels));
    assert!(res
        .effects
        .iter()
        .any(|e| matches!(e, Effect::WatchWorkspace { root } if *root == loc("/x"))));
    assert!(res
        .effects
        .iter()
        .any(|e| matches!(e, Effect::LoadRepository { .. })));
    assert!(store.state().registry.is_empty());
    assert_eq!(store.state().selected_for_compare, None);
    assert_eq!(store.state().workspace_root, Some(loc("/x")));

    let other = store.dispatch(Action::WorkspaceLoaded {
        root: loc("/old"),
        result: Ok(()),
    });
    assert!(other.effects.is_empty());
    let res = store.dispatch(Action::WorkspaceLoaded {
        root: loc("/x"),
        result: Ok(()),
    });
    assert!(matches!(res.effects.as_slice(), [Effect::RefreshVcs { .. }]));
}

#[test]
fn close_all_leaves_diff_view() {
    let mut store = new_store();
    open_text(&mut store, "/w/a.txt", "", false);
    store.dispatch(Action::DiffRead {
        locator: loc("/w/a.txt"),
        compare_target: loc("/w/a.txt").previous_version(),
        result: Ok((String::new(), String::new())),
    });

    let res = store.dispatch(Action::CloseAll);
    assert_eq!(
        models(&res.effects),
        vec![
            &ModelCommand::RemoveAllModels,
            &ModelCommand::SwitchToNormalView,
        ]
    );
    assert!(store.state().registry.is_empty());
    assert_eq!(store.state().registry.view_mode(), ViewMode::Normal);
    assert!(!store.dispatch(Action::CloseAll).state_changed);
}

#[test]
fn snapshot_skips_diff_tabs() {
    let mut store = new_store();
    open_text(&mut store, "/w/a.txt", "", true);
    open_text(&mut store, "/w/b.txt", "", true);
    let snapshot = store.state().snapshot();
    assert_eq!(snapshot.opened, vec![loc("/w/a.txt"), loc("/w/b.txt")]);
    assert_eq!(snapshot.active, Some(loc("/w/b.txt")));

    store.dispatch(Action::DiffRead {
        locator: loc("/w/a.txt"),
        compare_target: loc("/w/a.txt").previous_version(),
        result: Ok((String::new(), String::new())),
    });
    let snapshot = store.state().snapshot();
    assert_eq!(snapshot.opened.len(), 2);
    assert_eq!(snapshot.active, None);
}
