//! Shell completion: script generation and runtime candidate emission
//!
//! The generated script re-invokes the tool with the hidden
//! `--argot-complete` argument followed by the words typed so far; the
//! tool answers with candidates on stdout, one per line. File and
//! directory hints are delegated to the shell's own machinery inside the
//! generated script, the runtime side only answers with names, cases and
//! list hints.

use std::ffi::OsString;
use std::str::FromStr;

use crate::lexer::Scope;
use crate::name::Convention;
use crate::schema::{CompletionHint, Tree, Visibility};

/// Shells the generator knows how to write a script for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl FromStr for Shell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            other => Err(format!("unsupported shell: {}", other)),
        }
    }
}

/// The distinguished argument the generated scripts pass back
pub(crate) const COMPLETE_ARG: &str = "--argot-complete";

pub(crate) fn script(shell: Shell, program: &str) -> String {
    match shell {
        Shell::Bash => bash_script(program),
        Shell::Zsh => zsh_script(program),
        Shell::Fish => fish_script(program),
    }
}

fn bash_script(program: &str) -> String {
    format!(
        "\
_{program}() {{
    local candidates
    candidates=$(\"{program}\" {complete} \"${{COMP_WORDS[@]:1:COMP_CWORD}}\" 2>/dev/null)
    local IFS=$'\\n'
    COMPREPLY=($(compgen -W \"$candidates\" -- \"${{COMP_WORDS[COMP_CWORD]}}\"))
    if [[ ${{#COMPREPLY[@]}} -eq 0 ]]; then
        COMPREPLY=($(compgen -f -- \"${{COMP_WORDS[COMP_CWORD]}}\"))
    fi
}}
complete -F _{program} {program}
",
        program = program,
        complete = COMPLETE_ARG,
    )
}

fn zsh_script(program: &str) -> String {
    format!(
        "\
#compdef {program}
_{program}() {{
    local -a candidates
    candidates=(${{(f)\"$(\"{program}\" {complete} \"${{words[@]:1}}\" 2>/dev/null)\"}})
    if (( ${{#candidates}} )); then
        compadd -- \"${{candidates[@]}}\"
    else
        _files
    fi
}}
_{program} \"$@\"
",
        program = program,
        complete = COMPLETE_ARG,
    )
}

fn fish_script(program: &str) -> String {
    format!(
        "\
function __fish_{program}_complete
    {program} {complete} (commandline -opc)[2..-1] (commandline -ct) 2>/dev/null
end
complete -c {program} -f -a '(__fish_{program}_complete)'
",
        program = program,
        complete = COMPLETE_ARG,
    )
}

/// Candidates for the partially typed last word, one per line
pub(crate) fn candidates(tree: &Tree, convention: Convention, words: &[OsString]) -> String {
    let (context, partial) = match words.split_last() {
        Some((last, rest)) => (rest, last.to_string_lossy().into_owned()),
        None => (words, String::new()),
    };

    // walk the typed words to find the command the cursor sits in and
    // whether the previous word is an option waiting for its value
    let mut cmd = 0;
    let mut pending_value: Option<usize> = None;
    for word in context {
        let text = word.to_string_lossy();
        let scope = Scope::new(tree, cmd, convention);
        if let Some(child) = scope.subcommand(&text) {
            cmd = child;
            pending_value = None;
            continue;
        }
        pending_value = None;
        if let Some(name) = text.strip_prefix("--") {
            let name = name.split('=').next().unwrap_or(name);
            if let Some((slot, _)) = scope.long(name) {
                if scope.slot(slot).arg.takes_value() && !text.contains('=') {
                    pending_value = Some(slot);
                }
            }
        } else if let Some(rest) = text.strip_prefix('-') {
            if let Some(c) = rest.chars().next() {
                if rest.chars().count() == 1 {
                    if let Some(slot) = scope.short_takes_value(c) {
                        pending_value = Some(slot);
                    }
                }
            }
        }
    }

    let scope = Scope::new(tree, cmd, convention);
    let mut out = Vec::new();

    if let Some(slot_id) = pending_value {
        push_hint_candidates(&mut out, tree, slot_id, &partial);
    } else if partial.starts_with('-') || (convention == Convention::Dos && partial.starts_with('/'))
    {
        for slot_id in scope.visible_slots() {
            let slot = &tree.slots[slot_id];
            if slot.visibility != Visibility::Default {
                continue;
            }
            for sn in &slot.names {
                out.push(sn.name.render(convention));
            }
        }
        for name in &tree.cmds[cmd].help_names {
            out.push(name.render(convention));
        }
    } else {
        for &child in &tree.cmds[cmd].children {
            if tree.cmds[child].display {
                out.push(tree.cmds[child].name.clone());
            }
        }
        // the hungry positional may carry a list hint
        for slot_id in scope.positionals() {
            push_hint_candidates(&mut out, tree, slot_id, &partial);
        }
    }

    out.retain(|c| c.starts_with(&partial));
    out.sort();
    out.dedup();
    let mut text = out.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

fn push_hint_candidates(out: &mut Vec<String>, tree: &Tree, slot_id: usize, partial: &str) {
    match &tree.slots[slot_id].arg.completion {
        Some(CompletionHint::List(values)) => {
            out.extend(values.iter().map(|v| (*v).to_string()));
        }
        Some(CompletionHint::Custom(f)) => out.extend(f(partial)),
        // file, dir and shell command hints resolve inside the shell
        Some(CompletionHint::File { .. })
        | Some(CompletionHint::Dir)
        | Some(CompletionHint::ShellCommand(_))
        | None => {}
    }
}
