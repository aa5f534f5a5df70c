//! Help screen rendering, a pure function of the schema and a column
//! width
//!
//! Sections appear in a fixed order: `OVERVIEW:`, `USAGE:`,
//! `ARGUMENTS:`, `OPTIONS:`, one block per titled group, and
//! `SUBCOMMANDS:`. Hidden arguments appear only in the `--help-hidden`
//! variant, private ones never.

use std::fmt::Write;

use crate::name::{Convention, NameKind};
use crate::schema::{
    ArgKind, Arity, CmdId, FlagKind, NameRole, Slot, Tree, Visibility,
};
use crate::usage::synthesize;

pub(crate) const DEFAULT_WIDTH: usize = 80;

/// One rendered row: the name column and the optional help text
struct HelpRow {
    name: String,
    help: Option<String>,
}

pub(crate) fn render_help(
    tree: &Tree,
    cmd: CmdId,
    convention: Convention,
    width: usize,
    show_hidden: bool,
) -> String {
    let command = &tree.cmds[cmd];
    let mut out = String::new();

    if command.summary.is_some() || command.discussion.is_some() {
        if let Some(summary) = &command.summary {
            let _ = w_section!(out, "OVERVIEW:");
            let _ = writeln!(out, " {}", summary);
        }
        if let Some(discussion) = &command.discussion {
            if command.summary.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", discussion);
        }
        out.push('\n');
    }

    let _ = w_section!(out, "USAGE:");
    let _ = writeln!(out, " {}", synthesize(tree, cmd, convention));

    let visible = |slot: &Slot| match slot.visibility {
        Visibility::Default => true,
        Visibility::Hidden => show_hidden,
        Visibility::Private => false,
    };

    // positionals, then ungrouped options, then one block per titled group
    let mut arguments = Vec::new();
    let mut options = Vec::new();
    let mut grouped: Vec<(String, Vec<HelpRow>)> = Vec::new();

    for &slot_id in &command.slots {
        let slot = &tree.slots[slot_id];
        if !visible(slot) {
            continue;
        }
        let rows = slot_rows(slot, convention);
        if slot.arg.is_positional() {
            arguments.extend(rows);
        } else {
            match titled_group(tree, slot) {
                Some(title) => match grouped.iter_mut().find(|(t, _)| *t == title) {
                    Some((_, block)) => block.extend(rows),
                    None => grouped.push((title, rows)),
                },
                None => options.extend(rows),
            }
        }
    }

    // the built in rows every command answers to
    options.push(HelpRow {
        name: help_flag_names(tree, cmd, convention),
        help: Some("Show help information.".to_string()),
    });
    if command.version.is_some() {
        options.push(HelpRow {
            name: "--version".to_string(),
            help: Some("Show the version.".to_string()),
        });
    }

    if !arguments.is_empty() {
        out.push('\n');
        let _ = w_section!(out, "ARGUMENTS:");
        out.push('\n');
        write_rows(&mut out, &arguments, width);
    }

    out.push('\n');
    let _ = w_section!(out, "OPTIONS:");
    out.push('\n');
    write_rows(&mut out, &options, width);

    for (title, block) in &grouped {
        out.push('\n');
        let heading = format!("{}:", title);
        let _ = w_section!(out, heading.as_str());
        out.push('\n');
        write_rows(&mut out, block, width);
    }

    let children: Vec<CmdId> = command
        .children
        .iter()
        .copied()
        .filter(|&c| tree.cmds[c].display)
        .collect();
    if !children.is_empty() {
        out.push('\n');
        let _ = w_section!(out, "SUBCOMMANDS:");
        out.push('\n');
        let rows: Vec<HelpRow> = children
            .iter()
            .map(|&c| {
                let child = &tree.cmds[c];
                let mut name = child.name.clone();
                for alias in &child.aliases {
                    name.push_str(", ");
                    name.push_str(alias);
                }
                if command.default_child == Some(c) {
                    name.push_str(" (default)");
                }
                HelpRow {
                    name,
                    help: child.summary.clone(),
                }
            })
            .collect();
        write_rows(&mut out, &rows, width);
        let _ = write!(
            out,
            "\n  See '{} help <subcommand>' for detailed help.\n",
            tree.full_name(0)
        );
    }

    out
}

/// The innermost titled group a slot sits in, if any
fn titled_group(tree: &Tree, slot: &Slot) -> Option<String> {
    let mut group = slot.group;
    while let Some(ix) = group {
        let info = &tree.cmds[slot.owner].groups[ix];
        if let Some(title) = &info.title {
            return Some(title.clone());
        }
        group = info.parent;
    }
    None
}

fn help_flag_names(tree: &Tree, cmd: CmdId, convention: Convention) -> String {
    let names: Vec<String> = tree.cmds[cmd]
        .help_names
        .iter()
        .map(|n| n.render(convention))
        .collect();
    names.join(", ")
}

fn slot_rows(slot: &Slot, convention: Convention) -> Vec<HelpRow> {
    let mut annotated = slot.arg.help.clone();
    if let Some(discussion) = &slot.arg.discussion {
        annotated = Some(match annotated {
            Some(h) => format!("{}\n{}", h, discussion),
            None => discussion.clone(),
        });
    }
    if let Some(var) = slot.arg.env {
        let note = format!("[env: {}]", var);
        annotated = Some(match annotated {
            Some(h) => format!("{} {}", h, note),
            None => note,
        });
    }
    if let Some(default) = &slot.arg.fallback {
        let note = format!("(default: {})", default);
        annotated = Some(match annotated {
            Some(h) => format!("{} {}", h, note),
            None => note,
        });
    }

    if slot.arg.is_positional() {
        let mut name = format!("<{}>", slot.arg.meta());
        if slot.arg.arity == Arity::Variadic {
            name.push_str(" ...");
        }
        return vec![HelpRow {
            name,
            help: annotated,
        }];
    }

    if slot.arg.kind == ArgKind::Flag(FlagKind::Selector) {
        // one row per case, the shared help on the first
        return slot
            .names
            .iter()
            .enumerate()
            .map(|(ix, sn)| HelpRow {
                name: sn.name.render(convention),
                help: if ix == 0 { annotated.clone() } else { None },
            })
            .collect();
    }

    let shorts: Vec<String> = slot
        .names
        .iter()
        .filter(|sn| sn.name.kind == NameKind::Short)
        .map(|sn| sn.name.render(convention))
        .collect();
    // positive and negative long spellings pair up with a slash
    let mut longs: Vec<String> = Vec::new();
    for role in [NameRole::Plain, NameRole::Enable] {
        if let Some(sn) = slot
            .names
            .iter()
            .find(|sn| sn.role == role && sn.name.kind != NameKind::Short)
        {
            longs.push(sn.name.render(convention));
        }
    }
    for role in [NameRole::Negative, NameRole::Disable] {
        if let Some(sn) = slot
            .names
            .iter()
            .find(|sn| sn.role == role && sn.name.kind != NameKind::Short)
        {
            longs.push(sn.name.render(convention));
        }
    }

    let mut name = shorts
        .into_iter()
        .chain(std::iter::once(longs.join("/")).filter(|s| !s.is_empty()))
        .collect::<Vec<_>>()
        .join(", ");
    if slot.arg.takes_value() {
        let _ = write!(name, " <{}>", slot.arg.meta());
    }

    vec![HelpRow {
        name,
        help: annotated,
    }]
}

fn write_rows(out: &mut String, rows: &[HelpRow], width: usize) {
    let pad = rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0);

    for row in rows {
        // the name column is styled, so padding is written separately:
        // escape sequences must not count against the column width
        out.push_str("  ");
        let _ = write!(out, "{}", w_flag!(row.name.as_str()));
        let Some(help) = &row.help else {
            out.push('\n');
            continue;
        };
        let indent = 2 + pad + 2;
        let wrapped = wrap(help, width.saturating_sub(indent).max(20));
        for (ix, line) in wrapped.iter().enumerate() {
            if ix == 0 {
                let gap = pad - row.name.chars().count();
                let _ = writeln!(out, "{:gap$}  {}", "", line, gap = gap);
            } else {
                let _ = writeln!(out, "{:indent$}{}", "", line, indent = indent);
            }
        }
    }
}

/// Greedy word wrap; explicit newlines in help text are respected
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > columns {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
