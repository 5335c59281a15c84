use std::{collections::HashMap, fmt, sync::Arc};

use bevy::prelude::*;
use serde::Deserialize;

use super::types::{DialogRef, Script};

/// A script authored in a `*.script.ron` file.
///
/// ```ron
/// (
///     id: "baker",
///     entries: [
///         (text: "Fresh bread!", skipable: true),
///         (text: "Want some?", isQuestion: true, buttons: [
///             (label: "Yes", goToDialog: "yes"),
///             (label: "No", goToDialog: "no"),
///         ]),
///         (text: "Enjoy.", name: Some("yes"), isEndOfDialog: true),
///         (text: "Suit yourself.", name: Some("no"), isEndOfDialog: true),
///     ],
/// )
/// ```
#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
pub struct ScriptAsset {
    pub id: String,
    pub entries: Script,
}

/// Scripts available to `NpcCommand::Talk` by id.
#[derive(Resource, Default)]
pub struct ScriptLibrary {
    scripts: HashMap<String, Arc<Script>>,
    by_asset: HashMap<AssetId<ScriptAsset>, String>,
    handles: Vec<Handle<ScriptAsset>>,
}

impl ScriptLibrary {
    /// Starts loading a script file; it becomes available once the asset is ready.
    pub fn load(&mut self, asset_server: &AssetServer, path: impl Into<String>) {
        let handle = asset_server.load::<ScriptAsset>(path.into());
        self.handles.push(handle);
    }

    pub fn insert(&mut self, id: impl Into<String>, script: Script) {
        let id = id.into();
        log_lints(&id, &script);
        self.scripts.insert(id, Arc::new(script));
    }

    pub fn get(&self, id: &str) -> Option<Arc<Script>> {
        self.scripts.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scripts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    fn remove_asset(&mut self, asset: AssetId<ScriptAsset>) {
        if let Some(id) = self.by_asset.remove(&asset) {
            self.scripts.remove(&id);
        }
    }
}

pub(crate) fn sync_script_assets(
    mut events: MessageReader<AssetEvent<ScriptAsset>>,
    assets: Res<Assets<ScriptAsset>>,
    mut library: ResMut<ScriptLibrary>,
) {
    for event in events.read() {
        match event {
            AssetEvent::Added { id } | AssetEvent::Modified { id } => {
                let Some(asset) = assets.get(*id) else {
                    continue;
                };
                debug!("script '{}' loaded ({} entries)", asset.id, asset.entries.len());
                library.insert(asset.id.clone(), asset.entries.clone());
                library.by_asset.insert(*id, asset.id.clone());
            }
            AssetEvent::Removed { id } => library.remove_asset(*id),
            _ => {}
        }
    }
}

fn log_lints(id: &str, script: &Script) {
    for warning in script.lint() {
        warn!("script '{id}': {warning}");
    }
}

/// Authoring mistakes that still produce a playable script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptWarning {
    Empty,
    TooManyButtons { entry: usize, count: usize },
    QuestionWithoutButtons { entry: usize },
    UnknownTarget { entry: usize, button: usize, name: String },
    TargetOutOfRange { entry: usize, button: usize, index: usize },
    NoEnd,
}

impl fmt::Display for ScriptWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "script has no entries"),
            Self::TooManyButtons { entry, count } => {
                write!(f, "entry {entry} has {count} buttons, only 4 can be shown")
            }
            Self::QuestionWithoutButtons { entry } => {
                write!(f, "entry {entry} is a question without buttons and can't be left")
            }
            Self::UnknownTarget {
                entry,
                button,
                name,
            } => write!(
                f,
                "button {button} of entry {entry} jumps to unknown entry '{name}', the first entry will be used"
            ),
            Self::TargetOutOfRange {
                entry,
                button,
                index,
            } => write!(
                f,
                "button {button} of entry {entry} jumps to entry {index}, which doesn't exist"
            ),
            Self::NoEnd => write!(f, "no entry is marked as end of dialog"),
        }
    }
}

impl Script {
    /// Checks for authoring mistakes. Scripts with warnings are still usable.
    pub fn lint(&self) -> Vec<ScriptWarning> {
        if self.is_empty() {
            return vec![ScriptWarning::Empty];
        }

        let mut warnings = Vec::new();
        for (entry_index, entry) in self.entries.iter().enumerate() {
            if entry.buttons.len() > 4 {
                warnings.push(ScriptWarning::TooManyButtons {
                    entry: entry_index,
                    count: entry.buttons.len(),
                });
            }
            if entry.is_question && entry.buttons.is_empty() {
                warnings.push(ScriptWarning::QuestionWithoutButtons { entry: entry_index });
            }
            for (button_index, button) in entry.buttons.iter().enumerate() {
                match &button.go_to_dialog {
                    DialogRef::Name(name)
                        if !self
                            .entries
                            .iter()
                            .any(|other| other.name.as_deref() == Some(name.as_str())) =>
                    {
                        warnings.push(ScriptWarning::UnknownTarget {
                            entry: entry_index,
                            button: button_index,
                            name: name.clone(),
                        });
                    }
                    DialogRef::Index(index) if *index >= self.len() => {
                        warnings.push(ScriptWarning::TargetOutOfRange {
                            entry: entry_index,
                            button: button_index,
                            index: *index,
                        });
                    }
                    _ => {}
                }
            }
        }

        if !self.entries.iter().any(|entry| entry.is_end_of_dialog) {
            warnings.push(ScriptWarning::NoEnd);
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{ButtonEntry, DialogEntry};

    #[test]
    fn parses_script_asset_ron() {
        let asset: ScriptAsset = ron::from_str(
            r#"(
                id: "baker",
                entries: [
                    (text: "Fresh bread!", skipable: true),
                    (text: "Bye.", isEndOfDialog: true),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(asset.id, "baker");
        assert_eq!(asset.entries.len(), 2);
        assert!(asset.entries.entries[0].skipable);
    }

    #[test]
    fn clean_script_has_no_warnings() {
        let script = Script::new()
            .entry(
                DialogEntry::new("?")
                    .question()
                    .button(ButtonEntry::new("ok", "done")),
            )
            .entry(DialogEntry::new("bye").name("done").end());
        assert!(script.lint().is_empty());
    }

    #[test]
    fn reports_authoring_mistakes() {
        let mut question = DialogEntry::new("?").question();
        for _ in 0..5 {
            question = question.button(ButtonEntry::new("b", "nowhere"));
        }
        let script = Script::new()
            .entry(question)
            .entry(DialogEntry::new("??").question())
            .entry(DialogEntry::new("x").button(ButtonEntry::new("far", 9usize)));

        let warnings = script.lint();
        assert!(warnings.contains(&ScriptWarning::TooManyButtons { entry: 0, count: 5 }));
        assert!(warnings.contains(&ScriptWarning::QuestionWithoutButtons { entry: 1 }));
        assert!(warnings.contains(&ScriptWarning::UnknownTarget {
            entry: 0,
            button: 4,
            name: "nowhere".into(),
        }));
        assert!(warnings.contains(&ScriptWarning::TargetOutOfRange {
            entry: 2,
            button: 0,
            index: 9,
        }));
        assert_eq!(warnings.last(), Some(&ScriptWarning::NoEnd));
    }

    #[test]
    fn library_shares_scripts_by_id() {
        let mut library = ScriptLibrary::default();
        library.insert("intro", Script::new().entry(DialogEntry::new("hi").end()));

        let first = library.get("intro").unwrap();
        let second = library.get("intro").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(library.get("outro").is_none());
    }
}
