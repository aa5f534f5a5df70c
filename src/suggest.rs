//! Typo suggestions for unknown options and subcommands
//!
//! Behind the default `suggestions` feature. The candidate pool is the
//! scope the unknown spelling failed to resolve in: every visible option
//! name for options, the sibling command names and aliases for commands.

use crate::name::Convention;
use crate::schema::{CmdId, Tree, Visibility};

/// `, did you mean `--quiet`?` or nothing worth saying
pub(crate) fn for_option(
    tree: &Tree,
    cmd: CmdId,
    convention: Convention,
    text: &str,
) -> Option<String> {
    let mut candidates = Vec::new();
    for c in tree.path(cmd) {
        for &slot_id in &tree.cmds[c].slots {
            let slot = &tree.slots[slot_id];
            if slot.visibility == Visibility::Private {
                continue;
            }
            for sn in &slot.names {
                candidates.push(sn.name.render(convention));
            }
        }
    }
    best_match(text, &candidates).map(|hit| format!(", did you mean `{}`?", hit))
}

pub(crate) fn for_command(tree: &Tree, cmd: CmdId, word: &str) -> Option<String> {
    let mut candidates = Vec::new();
    for &child in &tree.cmds[cmd].children {
        let c = &tree.cmds[child];
        if !c.display {
            continue;
        }
        candidates.push(c.name.clone());
        candidates.extend(c.aliases.iter().cloned());
    }
    best_match(word, &candidates).map(|hit| format!(", did you mean `{}`?", hit))
}

#[cfg(feature = "suggestions")]
fn best_match(input: &str, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::damerau_levenshtein(input, c), c))
        .filter(|(distance, candidate)| *distance <= 2 && *distance < candidate.chars().count())
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.clone())
}

#[cfg(not(feature = "suggestions"))]
fn best_match(_input: &str, _candidates: &[String]) -> Option<String> {
    None
}
