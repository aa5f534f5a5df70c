//! Name resolution against the schema in effect at the current command
//!
//! A [`Scope`] is rebuilt at every subcommand transition. It flattens the
//! current command's slots together with every ancestor's (ancestors
//! first, so nearer declarations shadow farther ones) and answers the
//! questions the matcher keeps asking: which slot does this spelling
//! belong to, is this character a flag or a value taking short, is this
//! word a subcommand, is this element a help request.

use std::collections::BTreeMap;

use crate::arg::Element;
use crate::name::{kebab, Convention, NameKind};
use crate::schema::{CmdId, NameRole, Slot, SlotId, Tree, ValueKind};

pub(crate) struct Scope<'a> {
    pub(crate) tree: &'a Tree,
    pub(crate) cmd: CmdId,
    pub(crate) convention: Convention,
    longs: BTreeMap<String, (SlotId, NameRole)>,
    single_dash: BTreeMap<String, (SlotId, NameRole)>,
    shorts: BTreeMap<char, (SlotId, NameRole)>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(tree: &'a Tree, cmd: CmdId, convention: Convention) -> Self {
        let mut scope = Scope {
            tree,
            cmd,
            convention,
            longs: BTreeMap::new(),
            single_dash: BTreeMap::new(),
            shorts: BTreeMap::new(),
        };
        // root first: a child redeclaring a name shadows the ancestor
        for cmd_id in tree.path(cmd) {
            for &slot_id in &tree.cmds[cmd_id].slots {
                for sn in &tree.slots[slot_id].names {
                    let entry = (slot_id, sn.role);
                    match sn.name.kind {
                        NameKind::Long => {
                            scope.longs.insert(sn.name.spelling.clone(), entry);
                        }
                        NameKind::SingleDashLong => {
                            scope.single_dash.insert(sn.name.spelling.clone(), entry);
                        }
                        NameKind::Short => {
                            if let Some(c) = sn.name.short_char() {
                                scope.shorts.insert(c, entry);
                            }
                        }
                    }
                }
            }
        }
        scope
    }

    pub(crate) fn slot(&self, id: SlotId) -> &'a Slot {
        &self.tree.slots[id]
    }

    pub(crate) fn long(&self, name: &str) -> Option<(SlotId, NameRole)> {
        if let Some(hit) = self.longs.get(name) {
            return Some(*hit);
        }
        // DOS spellings are case carried: `/FullName` answers for the
        // canonical `full-name`
        if self.convention == Convention::Dos {
            return self.longs.get(&kebab(name)).copied();
        }
        None
    }

    pub(crate) fn short(&self, c: char) -> Option<(SlotId, NameRole)> {
        if let Some(hit) = self.shorts.get(&c) {
            return Some(*hit);
        }
        if self.convention == Convention::Dos {
            let flipped: Vec<char> = if c.is_uppercase() {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            if let [single] = flipped.as_slice() {
                return self.shorts.get(single).copied();
            }
        }
        None
    }

    pub(crate) fn single_dash(&self, text: &str) -> Option<(SlotId, NameRole)> {
        self.single_dash.get(text).copied()
    }

    /// Is this character a declared zero arity flag here?
    pub(crate) fn short_is_flag(&self, c: char) -> bool {
        match self.short(c) {
            Some((slot, _)) => !self.slot(slot).arg.takes_value(),
            None => false,
        }
    }

    /// Is this character a declared value taking short here?
    pub(crate) fn short_takes_value(&self, c: char) -> Option<SlotId> {
        match self.short(c) {
            Some((slot, _)) if self.slot(slot).arg.takes_value() => Some(slot),
            _ => None,
        }
    }

    /// Does the element spell the current command's help flag set?
    pub(crate) fn is_help(&self, element: &Element) -> bool {
        let help = &self.tree.cmds[self.cmd].help_names;
        match element {
            Element::Long { name, value: None, .. } => help
                .iter()
                .any(|n| n.kind == NameKind::Long && n.spelling == *name),
            Element::Short { name, value: None, .. } => {
                help.iter().any(|n| n.short_char() == Some(*name))
            }
            _ => false,
        }
    }

    /// Resolve a word to a direct child by name or alias
    pub(crate) fn subcommand(&self, word: &str) -> Option<CmdId> {
        self.tree.cmds[self.cmd]
            .children
            .iter()
            .copied()
            .find(|&child| {
                let cmd = &self.tree.cmds[child];
                cmd.name == word || cmd.aliases.iter().any(|a| a == word)
            })
    }

    /// Whether any element recognizable as an option starts with this
    /// element: used by value scanning strategies to know where to stop
    pub(crate) fn element_is_recognized_option(&self, element: &Element) -> bool {
        match element {
            Element::Long { name, .. } => self.long(name).is_some() || self.is_help(element),
            Element::Short { name, .. } => self.short(*name).is_some() || self.is_help(element),
            Element::Compound { text, .. } => {
                if self.single_dash(text).is_some() {
                    return true;
                }
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => self.short(first).is_some(),
                    None => false,
                }
            }
            Element::Terminator | Element::Word(_) => false,
        }
    }

    /// True when some positional in scope declares a numeric value, which
    /// lets number shaped compounds reclassify as values
    pub(crate) fn has_numeric_positional(&self) -> bool {
        self.tree
            .path(self.cmd)
            .iter()
            .flat_map(|&c| self.tree.cmds[c].slots.iter())
            .map(|&s| &self.tree.slots[s])
            .any(|slot| {
                slot.arg.is_positional()
                    && matches!(slot.arg.value, ValueKind::Int { .. } | ValueKind::Float)
            })
    }

    /// All slots visible here, root first, declaration order within each
    /// command
    pub(crate) fn visible_slots(&self) -> Vec<SlotId> {
        self.tree
            .path(self.cmd)
            .iter()
            .flat_map(|&c| self.tree.cmds[c].slots.iter().copied())
            .collect()
    }

    /// Positional slots of the current command only, in order
    pub(crate) fn positionals(&self) -> Vec<SlotId> {
        self.tree.cmds[self.cmd]
            .slots
            .iter()
            .copied()
            .filter(|&s| self.tree.slots[s].arg.is_positional())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{compile, Arg, Command};

    fn scope_for(cmd: Command) -> (Tree, CmdId) {
        (compile(cmd).unwrap(), 0)
    }

    #[test]
    fn child_shadows_ancestor_names() {
        let tree = compile(
            Command::new("app")
                .arg(Arg::option("level"))
                .command(Command::new("run").arg(Arg::option("level").long("level"))),
        )
        .unwrap();
        let root_scope = Scope::new(&tree, 0, Convention::Posix);
        let child_scope = Scope::new(&tree, 1, Convention::Posix);
        let (root_slot, _) = root_scope.long("level").unwrap();
        let (child_slot, _) = child_scope.long("level").unwrap();
        assert_ne!(root_slot, child_slot);
        assert_eq!(tree.slots[child_slot].owner, 1);
    }

    #[test]
    fn ancestor_options_stay_visible_in_children() {
        let tree = compile(
            Command::new("app")
                .arg(Arg::flag("verbose").short('v'))
                .command(Command::new("run")),
        )
        .unwrap();
        let child_scope = Scope::new(&tree, 1, Convention::Posix);
        assert!(child_scope.short('v').is_some());
        assert!(child_scope.short_is_flag('v'));
    }

    #[test]
    fn dos_lookup_is_case_carried() {
        let (tree, root) = scope_for(Command::new("app").arg(Arg::option("full_name")));
        let scope = Scope::new(&tree, root, Convention::Dos);
        assert!(scope.long("FullName").is_some());
        assert!(scope.long("full-name").is_some());
    }

    #[test]
    fn aliases_resolve_to_the_same_child() {
        let (tree, root) =
            scope_for(Command::new("app").command(Command::new("remove").alias("rm")));
        let scope = Scope::new(&tree, root, Convention::Posix);
        assert_eq!(scope.subcommand("remove"), scope.subcommand("rm"));
        assert!(scope.subcommand("mv").is_none());
    }
}
