//! Branching conversation scripts: the authoring types, RON loading and the
//! navigation rules every dialog session shares.

mod library;
pub mod navigator;
mod types;

use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;

pub use library::{ScriptAsset, ScriptLibrary, ScriptWarning};
pub use navigator::{Advance, ButtonSlot, SkipOutcome};
pub use types::{ButtonEntry, DialogEntry, DialogRef, Hook, HookFn, ImageData, ImageSection, Script};

pub(crate) struct ScriptPlugin;

impl Plugin for ScriptPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScriptLibrary>();
    }
}

/// Registers the `*.script.ron` loader and keeps [`ScriptLibrary`] in sync
/// with loaded files. Needs an `AssetPlugin`.
pub(crate) struct ScriptAssetPlugin;

impl Plugin for ScriptAssetPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<ScriptAsset>::new(&["script.ron"]))
            .add_systems(PreUpdate, library::sync_script_assets);
    }
}
