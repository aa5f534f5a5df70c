//! User validation hooks, run bottom up after decoding
//!
//! Hooks sit on option groups and on commands. They run depth first,
//! leaves first: a command's groups validate innermost first, then the
//! command's own hook, walking from the resolved command up to the root.
//! A hook receives the mutable bindings and its mutations survive into
//! the resolution handed back to the caller.

use crate::decoder::Bindings;
use crate::error::Message;
use crate::schema::{CmdId, Tree};

/// Failure raised by a validation hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// User visible message paired with the usage line, exit 64
    Validation(String),
    /// User visible message without usage, exit 1
    Domain(String),
    /// Exit with this code, print nothing
    Exit(i32),
    /// Print the message, if any, and exit 0
    CleanExit(Option<String>),
}

impl Violation {
    /// Message + usage, the common case
    pub fn validation(msg: impl Into<String>) -> Self {
        Violation::Validation(msg.into())
    }

    /// Message only, no usage block
    pub fn domain(msg: impl Into<String>) -> Self {
        Violation::Domain(msg.into())
    }
}

impl From<Violation> for Message {
    fn from(violation: Violation) -> Self {
        match violation {
            Violation::Validation(msg) => Message::Validation(msg),
            Violation::Domain(msg) => Message::Domain(msg),
            Violation::Exit(code) => Message::Silent(code),
            Violation::CleanExit(msg) => Message::CleanExit(msg),
        }
    }
}

pub(crate) fn run_hooks(tree: &Tree, cmd: CmdId, bindings: &mut Bindings) -> Result<(), Message> {
    let mut path = tree.path(cmd);
    path.reverse();

    for c in path {
        let command = &tree.cmds[c];
        // innermost groups first: children appear after their parent in
        // the group table, so walking it backwards is deepest first
        for group in command.groups.iter().rev() {
            if let Some(hook) = &group.hook {
                hook(bindings).map_err(Message::from)?;
            }
        }
        if let Some(hook) = &command.hook {
            hook(bindings).map_err(Message::from)?;
        }
    }
    Ok(())
}
