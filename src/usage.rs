//! Usage line synthesis, a pure function of the schema

use crate::name::{Convention, NameKind};
use crate::schema::{ArgKind, Arity, CmdId, FlagKind, NameRole, Slot, Strategy, Tree, Visibility};

/// `Usage: ` prefixed line used when pairing diagnostics with usage
pub(crate) fn usage_line(tree: &Tree, cmd: CmdId, convention: Convention) -> String {
    format!("Usage: {}", synthesize(tree, cmd, convention))
}

/// Bare usage text: the full command path followed by its arguments
///
/// A custom usage override is used verbatim, with `{usage}` replaced by
/// the generated text once.
pub(crate) fn synthesize(tree: &Tree, cmd: CmdId, convention: Convention) -> String {
    let generated = generate(tree, cmd, convention);
    match &tree.cmds[cmd].usage {
        Some(custom) => custom.replacen("{usage}", &generated, 1),
        None => generated,
    }
}

fn generate(tree: &Tree, cmd: CmdId, convention: Convention) -> String {
    let mut parts = vec![tree.full_name(cmd)];
    let command = &tree.cmds[cmd];

    // named arguments first, in declaration order
    for &slot_id in &command.slots {
        let slot = &tree.slots[slot_id];
        if slot.visibility != Visibility::Default || slot.arg.is_positional() {
            continue;
        }
        parts.push(named_usage(slot, convention));
    }

    for &slot_id in &command.slots {
        let slot = &tree.slots[slot_id];
        if slot.visibility != Visibility::Default || !slot.arg.is_positional() {
            continue;
        }
        parts.push(positional_usage(slot));
    }

    if !command.children.is_empty() {
        if command.default_child.is_some() {
            parts.push("[<subcommand>]".to_string());
        } else {
            parts.push("<subcommand>".to_string());
        }
    }

    parts.join(" ")
}

fn named_usage(slot: &Slot, convention: Convention) -> String {
    let mut names: Vec<String> = Vec::new();
    match slot.arg.kind {
        ArgKind::Flag(FlagKind::Selector) => {
            for sn in &slot.names {
                names.push(sn.name.render(convention));
            }
        }
        _ => {
            // one spelling per polarity is enough for the usage line
            for role in [NameRole::Plain, NameRole::Enable, NameRole::Disable] {
                if let Some(sn) = slot
                    .names
                    .iter()
                    .find(|sn| sn.role == role && sn.name.kind != NameKind::Short)
                    .or_else(|| slot.names.iter().find(|sn| sn.role == role))
                {
                    names.push(sn.name.render(convention));
                }
            }
        }
    }
    if names.is_empty() {
        names.push(format!("<{}>", slot.arg.meta()));
    }
    let spelled = names.join(" | ");

    let mut out = match slot.arg.kind {
        ArgKind::Flag(_) => spelled,
        _ => format!("{} <{}>", spelled, slot.arg.meta()),
    };
    if slot.arg.arity == Arity::Variadic {
        out.push_str(" ...");
    }
    // a variadic option never counts as missing, so it renders optional
    if slot.arg.required && slot.arg.kind == ArgKind::Option && slot.arg.arity != Arity::Variadic {
        out
    } else {
        format!("[{}]", out)
    }
}

fn positional_usage(slot: &Slot) -> String {
    let meta = format!("<{}>", slot.arg.meta());
    let variadic = slot.arg.arity == Arity::Variadic;
    let prefix = if slot.arg.strategy == Strategy::PostTerminator {
        "-- "
    } else {
        ""
    };
    match (slot.arg.required && !slot.arg.strategy.is_sink(), variadic) {
        (true, false) => format!("{}{}", prefix, meta),
        (true, true) => format!("{}{} ...", prefix, meta),
        (false, false) => format!("[{}{}]", prefix, meta),
        (false, true) => format!("[{}{} ...]", prefix, meta),
    }
}
