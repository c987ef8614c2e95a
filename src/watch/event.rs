// src/watch/event.rs

//! Translation of raw `notify` events into [`ChangeEvent`]s.

use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::Event;

use crate::types::{ChangeEvent, ChangeKind};

/// What the notify callback forwards into the async side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    Change(ChangeEvent),
    /// The backend reported an error while observing.
    Error {
        path: Option<PathBuf>,
        message: String,
    },
}

impl WatchSignal {
    pub fn from_notify(result: notify::Result<Event>) -> Vec<WatchSignal> {
        match result {
            Ok(event) => change_events(&event)
                .into_iter()
                .map(WatchSignal::Change)
                .collect(),
            Err(err) => vec![WatchSignal::Error {
                path: err.paths.first().cloned(),
                message: err.to_string(),
            }],
        }
    }
}

/// Split one notify event into per-path changes.
///
/// Renames reported as a pair (`RenameMode::Both`) yield a `Deleted` for the
/// old path and a `Created` for the new one, so each side is checked against
/// the watched set on its own. Access events are dropped.
pub fn change_events(event: &Event) -> Vec<ChangeEvent> {
    let paths = &event.paths;

    match event.kind {
        EventKind::Access(_) => Vec::new(),
        EventKind::Create(_) => with_kind(paths, ChangeKind::Created),
        EventKind::Remove(_) => with_kind(paths, ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => with_kind(paths, ChangeKind::Deleted),
            RenameMode::To => with_kind(paths, ChangeKind::Created),
            RenameMode::Both => {
                let mut out = Vec::with_capacity(paths.len());
                if let Some(from) = paths.first() {
                    out.push(ChangeEvent::new(from, ChangeKind::Deleted));
                }
                for to in paths.iter().skip(1) {
                    out.push(ChangeEvent::new(to, ChangeKind::Created));
                }
                out
            }
            RenameMode::Any | RenameMode::Other => with_kind(paths, ChangeKind::Renamed),
        },
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            with_kind(paths, ChangeKind::Modified)
        }
    }
}

fn with_kind(paths: &[PathBuf], kind: ChangeKind) -> Vec<ChangeEvent> {
    paths.iter().map(|p| ChangeEvent::new(p, kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut ev = Event::new(kind);
        for p in paths {
            ev = ev.add_path(PathBuf::from(p));
        }
        ev
    }

    #[test]
    fn basic_kinds_map_one_to_one() {
        let created = change_events(&event(EventKind::Create(CreateKind::File), &["/p/a.rs"]));
        assert_eq!(created, vec![ChangeEvent::new("/p/a.rs", ChangeKind::Created)]);

        let modified = change_events(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/p/a.rs"],
        ));
        assert_eq!(modified, vec![ChangeEvent::new("/p/a.rs", ChangeKind::Modified)]);

        let removed = change_events(&event(EventKind::Remove(RemoveKind::File), &["/p/a.rs"]));
        assert_eq!(removed, vec![ChangeEvent::new("/p/a.rs", ChangeKind::Deleted)]);
    }

    #[test]
    fn rename_modes() {
        let from = change_events(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/p/old.rs"],
        ));
        assert_eq!(from, vec![ChangeEvent::new("/p/old.rs", ChangeKind::Deleted)]);

        let to = change_events(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/p/new.rs"],
        ));
        assert_eq!(to, vec![ChangeEvent::new("/p/new.rs", ChangeKind::Created)]);

        let both = change_events(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/p/old.rs", "/p/new.rs"],
        ));
        assert_eq!(
            both,
            vec![
                ChangeEvent::new("/p/old.rs", ChangeKind::Deleted),
                ChangeEvent::new("/p/new.rs", ChangeKind::Created),
            ]
        );

        let any = change_events(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            &["/p/x.rs"],
        ));
        assert_eq!(any, vec![ChangeEvent::new("/p/x.rs", ChangeKind::Renamed)]);
    }

    #[test]
    fn access_is_ignored() {
        let ev = event(EventKind::Access(AccessKind::Any), &["/p/a.rs"]);
        assert!(change_events(&ev).is_empty());
    }

    #[test]
    fn errors_become_error_signals() {
        let err = notify::Error::generic("backend gone").add_path(PathBuf::from("/p"));
        let signals = WatchSignal::from_notify(Err(err));
        assert!(matches!(
            signals.as_slice(),
            [WatchSignal::Error { path: Some(p), message }]
                if p == &PathBuf::from("/p") && message.contains("backend gone")
        ));
    }
}
