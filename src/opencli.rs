//! Machine readable command description: the OpenCLI v0.1 dump
//!
//! Requested with `--help-dump-opencli-v0.1` (the version suffix is part
//! of the contract). Emitted to stdout as a single JSON object covering
//! the addressed command and its whole subtree.

use serde::Serialize;

use crate::name::Convention;
use crate::schema::{
    ArgKind, Arity, CmdId, CompletionHint, FlagKind, Slot, Tree, Visibility,
};

#[derive(Serialize)]
struct Document {
    opencli: &'static str,
    info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<OptionDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<Vec<PositionalDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commands: Option<Vec<CommandDescriptor>>,
}

#[derive(Serialize)]
struct Info {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Serialize)]
struct OptionDescriptor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<Vec<ValueDescriptor>>,
    #[serde(
        rename = "swiftArgumentParserRepeating",
        skip_serializing_if = "std::ops::Not::not"
    )]
    repeating: bool,
    #[serde(
        rename = "swiftArgumentParserFile",
        skip_serializing_if = "std::ops::Not::not"
    )]
    file: bool,
    #[serde(
        rename = "swiftArgumentParserDirectory",
        skip_serializing_if = "std::ops::Not::not"
    )]
    directory: bool,
}

#[derive(Serialize)]
struct ValueDescriptor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

#[derive(Serialize)]
struct PositionalDescriptor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    required: bool,
    #[serde(
        rename = "swiftArgumentParserRepeating",
        skip_serializing_if = "std::ops::Not::not"
    )]
    repeating: bool,
}

#[derive(Serialize)]
struct CommandDescriptor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<OptionDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<Vec<PositionalDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commands: Option<Vec<CommandDescriptor>>,
}

pub(crate) fn dump(tree: &Tree, cmd: CmdId, convention: Convention) -> String {
    let command = &tree.cmds[cmd];
    let (options, arguments) = describe_slots(tree, cmd, convention);
    let document = Document {
        opencli: "0.1",
        info: Info {
            title: tree.full_name(cmd),
            version: command.version.clone(),
            summary: command.summary.clone(),
            description: command.discussion.clone(),
        },
        options: non_empty(options),
        arguments: non_empty(arguments),
        commands: non_empty(describe_children(tree, cmd, convention)),
    };
    match serde_json::to_string_pretty(&document) {
        Ok(json) => format!("{}\n", json),
        Err(_) => String::new(),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn describe_children(tree: &Tree, cmd: CmdId, convention: Convention) -> Vec<CommandDescriptor> {
    tree.cmds[cmd]
        .children
        .iter()
        .filter(|&&c| tree.cmds[c].display)
        .map(|&c| {
            let child = &tree.cmds[c];
            let (options, arguments) = describe_slots(tree, c, convention);
            CommandDescriptor {
                name: child.name.clone(),
                aliases: non_empty(child.aliases.clone()),
                summary: child.summary.clone(),
                options: non_empty(options),
                arguments: non_empty(arguments),
                commands: non_empty(describe_children(tree, c, convention)),
            }
        })
        .collect()
}

fn describe_slots(
    tree: &Tree,
    cmd: CmdId,
    convention: Convention,
) -> (Vec<OptionDescriptor>, Vec<PositionalDescriptor>) {
    let mut options = Vec::new();
    let mut arguments = Vec::new();
    for &slot_id in &tree.cmds[cmd].slots {
        let slot = &tree.slots[slot_id];
        if slot.visibility == Visibility::Private {
            continue;
        }
        if slot.arg.is_positional() {
            arguments.push(PositionalDescriptor {
                name: slot.arg.meta(),
                description: slot.arg.help.clone(),
                required: slot.arg.required && !slot.arg.strategy.is_sink(),
                repeating: slot.arg.arity == Arity::Variadic,
            });
        } else {
            options.push(describe_option(slot, convention));
        }
    }
    (options, arguments)
}

fn describe_option(slot: &Slot, convention: Convention) -> OptionDescriptor {
    let mut spellings = slot.names.iter().map(|sn| sn.name.render(convention));
    let name = spellings.next().unwrap_or_default();
    let aliases: Vec<String> = spellings.collect();

    let arguments = if slot.arg.takes_value() {
        vec![ValueDescriptor {
            name: slot.arg.meta(),
            default: slot.arg.fallback.as_ref().map(ToString::to_string),
        }]
    } else {
        Vec::new()
    };

    let repeating = slot.arg.arity == Arity::Variadic
        || matches!(slot.arg.kind, ArgKind::Flag(FlagKind::Counter))
        || slot.arg.strategy.is_array();
    let file = matches!(slot.arg.completion, Some(CompletionHint::File { .. }));
    let directory = matches!(slot.arg.completion, Some(CompletionHint::Dir));

    OptionDescriptor {
        name,
        aliases: non_empty(aliases),
        description: slot.arg.help.clone(),
        arguments: non_empty(arguments),
        repeating,
        file,
        directory,
    }
}
