//! Pure index arithmetic over a [`Script`].
//!
//! Every function pushes the hooks it fires onto `fired`, in firing order, and
//! never touches presentation.

use super::types::{DialogEntry, DialogRef, Hook, Script};

/// Outcome of moving through a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing happened (question entry, missing button).
    Stay,
    Moved(usize),
    /// The conversation is over.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    Stopped(usize),
    End,
}

/// Question buttons, in authoring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonSlot {
    Confirm,
    Cancel,
    Third,
    Fourth,
}

impl ButtonSlot {
    pub const ALL: [Self; 4] = [Self::Confirm, Self::Cancel, Self::Third, Self::Fourth];

    pub fn index(self) -> usize {
        match self {
            Self::Confirm => 0,
            Self::Cancel => 1,
            Self::Third => 2,
            Self::Fourth => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Index of the entry `target` points at. Unknown names fall back to the
/// first entry.
pub fn resolve(script: &Script, target: &DialogRef) -> usize {
    match target {
        DialogRef::Index(index) => *index,
        DialogRef::Name(name) => script
            .entries
            .iter()
            .position(|entry| entry.name.as_deref() == Some(name.as_str()))
            .unwrap_or_else(|| {
                tracing::debug!("no dialog entry named '{name}', using the first entry");
                0
            }),
    }
}

/// Leaves entry `index` the linear way. Questions can only be left through
/// their buttons.
pub fn next(script: &Script, index: usize, fired: &mut Vec<Hook>) -> Advance {
    match script.get(index) {
        Some(entry) if entry.is_question => Advance::Stay,
        _ => step(script, index, fired),
    }
}

/// Like [`next`], but questions are stepped over like any other entry.
/// Speech bubbles have no buttons to answer with.
pub fn step(script: &Script, index: usize, fired: &mut Vec<Hook>) -> Advance {
    let Some(entry) = script.get(index) else {
        return Advance::End;
    };
    fire(&entry.triggered_by_next, fired);
    if entry.is_end_of_dialog || index + 1 >= script.len() {
        return Advance::End;
    }
    Advance::Moved(index + 1)
}

/// Takes question button `slot` on entry `index`, if the entry has that many
/// buttons.
pub fn branch(script: &Script, index: usize, slot: ButtonSlot, fired: &mut Vec<Hook>) -> Advance {
    let Some(button) = script
        .get(index)
        .and_then(|entry| entry.buttons.get(slot.index()))
    else {
        return Advance::Stay;
    };
    let target = resolve(script, &button.go_to_dialog);
    fire(&button.triggered_actions, fired);
    Advance::Moved(target)
}

/// Walks forward from `start` while `eligible` holds, firing each entry's
/// `triggered_by_next`. Stops on the first ineligible entry, or ends on an
/// eligible end-of-dialog entry.
pub fn skip_run(
    script: &Script,
    start: usize,
    eligible: impl Fn(&DialogEntry) -> bool,
    fired: &mut Vec<Hook>,
) -> SkipOutcome {
    let mut index = start;
    while let Some(entry) = script.get(index) {
        if !eligible(entry) {
            return SkipOutcome::Stopped(index);
        }
        fire(&entry.triggered_by_next, fired);
        if entry.is_end_of_dialog {
            return SkipOutcome::End;
        }
        index += 1;
    }
    SkipOutcome::End
}

/// Follows [`step`] from `start` to the end of the conversation, firing every
/// hook on the way.
pub fn run_to_end(script: &Script, start: usize, fired: &mut Vec<Hook>) {
    let mut index = start;
    while let Advance::Moved(to) = step(script, index, fired) {
        index = to;
    }
}

fn fire(hook: &Option<Hook>, fired: &mut Vec<Hook>) {
    if let Some(hook) = hook {
        fired.push(hook.clone());
    }
}
