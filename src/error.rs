//! Parse failure taxonomy and rendering
//!
//! Internally every failing path produces a [`Message`]; the driver
//! renders it into a [`ParseFailure`] paired with the usage line of the
//! command the parser was resolving at the time. Interrupts (help,
//! version, clean and silent exits) travel the same channel so that any
//! internal boundary is a plain `Result`.

use crate::name::Convention;
use crate::schema::{CmdId, SlotId, Tree};
use crate::usage::usage_line;

/// Unsuccessful command line parsing outcome, internal representation
#[derive(Debug)]
pub(crate) enum Message {
    // interrupts -------------------------------------------------------
    /// Help requested for a command; `hidden` selects the
    /// `--help-hidden` variant
    Help { cmd: CmdId, hidden: bool },
    /// `--version` for a command that carries a version string
    Version(CmdId),
    /// `--help-dump-opencli-v0.1`
    Dump(CmdId),
    /// Clean exit requested by user code, optional message, exit 0
    CleanExit(Option<String>),
    /// Silent exit with the given code
    Silent(i32),
    /// Already rendered, pass through unchanged
    Final(ParseFailure),

    // lex errors -------------------------------------------------------
    /// `--=` and friends: a name with no characters
    EmptyName,

    // match errors -----------------------------------------------------
    /// Option spelling not declared in the current scope
    UnknownOption { text: String },
    /// Word in subcommand position that names no child
    UnknownCommand { word: String },
    /// A value nothing wanted
    Unexpected { text: String },
    /// Option requires a value and none could be claimed
    NoValue { slot: SlotId },
    /// Compound token that resolves neither as a bundle nor as anything
    /// else
    Ambiguity { text: String },
    /// An `Exclusive` argument appeared more than once
    Repeated { slot: SlotId },
    /// Required slots with no binding, no default and no environment
    /// fallback
    Missing(Vec<SlotId>),

    // decode errors ----------------------------------------------------
    /// A raw value that must decode as text is not valid unicode;
    /// `offset` is the byte position of the first undecodable unit
    BadUtf8 {
        index: usize,
        slot: SlotId,
        offset: usize,
    },
    /// Declared type or transform rejected the raw value
    DecodeFailed {
        slot: SlotId,
        raw: String,
        error: String,
    },
    /// Numeric value parsed but fell outside the declared range
    OutOfRange {
        slot: SlotId,
        raw: String,
        min: i64,
        max: i64,
    },
    /// Declared parent command is not an ancestor of the resolved one
    BadParentRef { child: CmdId, referenced: String },

    // user hooks -------------------------------------------------------
    /// Validation hook failure: message plus usage
    Validation(String),
    /// Domain failure raised by user code: message only
    Domain(String),
}

/// Unsuccessful command line parsing outcome, use it for unit tests
///
/// `Stdout` and `Completion` exit 0, `Stderr` exits 64 (usage and
/// validation failures), `Fault` exits 1 (domain failures), `Silent`
/// carries its own code and prints nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseFailure {
    /// Print this to stdout and exit with success
    Stdout(String),
    /// Completion candidates, printed to stdout unchanged
    Completion(String),
    /// Usage or validation failure, print to stderr, exit 64
    Stderr(String),
    /// Domain failure, print to stderr, exit 1
    Fault(String),
    /// Exit with the given code, print nothing
    Silent(i32),
}

impl ParseFailure {
    /// Returns the contained `stderr` value - for unit tests
    ///
    /// # Panics
    ///
    /// Panics if failure contains `stdout`
    #[allow(clippy::must_use_candidate)]
    #[track_caller]
    pub fn unwrap_stderr(self) -> String {
        match self {
            Self::Stderr(msg) | Self::Fault(msg) => msg,
            Self::Stdout(..) | Self::Completion(..) | Self::Silent(..) => {
                panic!("not an stderr: {:?}", self)
            }
        }
    }

    /// Returns the contained `stdout` value - for unit tests
    ///
    /// # Panics
    ///
    /// Panics if failure contains `stderr`
    #[allow(clippy::must_use_candidate)]
    #[track_caller]
    pub fn unwrap_stdout(self) -> String {
        match self {
            Self::Stdout(msg) | Self::Completion(msg) => msg,
            Self::Stderr(..) | Self::Fault(..) | Self::Silent(..) => {
                panic!("not an stdout: {:?}", self)
            }
        }
    }

    /// The exit code this failure asks the process to use
    #[allow(clippy::must_use_candidate)]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Stdout(..) | Self::Completion(..) => 0,
            Self::Stderr(..) => 64,
            Self::Fault(..) => 1,
            Self::Silent(code) => *code,
        }
    }

    /// Print to the stream appropriate for the failure
    pub fn print_message(&self) {
        match self {
            ParseFailure::Stdout(msg) | ParseFailure::Completion(msg) => {
                print!("{}", msg);
            }
            ParseFailure::Stderr(msg) | ParseFailure::Fault(msg) => {
                eprintln!("{}{}", error_prefix(), msg);
            }
            ParseFailure::Silent(_) => {}
        }
    }
}

fn error_prefix() -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let _ = write!(out, "{}", w_err!("Error: "));
    out
}

impl Message {
    /// True when rendering should append the resolved command's usage line
    fn wants_usage(&self) -> bool {
        match self {
            Message::Help { .. }
            | Message::Version(_)
            | Message::Dump(_)
            | Message::CleanExit(_)
            | Message::Silent(_)
            | Message::Final(_)
            | Message::Domain(_) => false,
            _ => true,
        }
    }

    pub(crate) fn render(
        self,
        tree: &Tree,
        cmd: CmdId,
        convention: Convention,
    ) -> ParseFailure {
        let usage = if self.wants_usage() {
            Some(usage_line(tree, cmd, convention))
        } else {
            None
        };

        let summary = match self {
            Message::Help { cmd, hidden } => {
                return ParseFailure::Stdout(crate::help::render_help(
                    tree,
                    cmd,
                    convention,
                    crate::help::DEFAULT_WIDTH,
                    hidden,
                ));
            }
            Message::Version(cmd) => {
                let version = tree.cmds[cmd].version.as_deref().unwrap_or("unknown");
                return ParseFailure::Stdout(format!("{}\n", version));
            }
            Message::Dump(cmd) => {
                return ParseFailure::Stdout(crate::opencli::dump(tree, cmd, convention));
            }
            Message::CleanExit(msg) => {
                return ParseFailure::Stdout(match msg {
                    Some(m) if m.ends_with('\n') => m,
                    Some(m) => format!("{}\n", m),
                    None => String::new(),
                });
            }
            Message::Silent(code) => return ParseFailure::Silent(code),
            Message::Final(failure) => return failure,
            Message::Domain(msg) => return ParseFailure::Fault(msg),

            Message::EmptyName => "option name cannot be empty".to_string(),
            Message::UnknownOption { text } => {
                let mut msg = format!("no such option: `{}`", text);
                if let Some(hint) = crate::suggest::for_option(tree, cmd, convention, &text) {
                    msg.push_str(&hint);
                }
                msg
            }
            Message::UnknownCommand { word } => {
                let mut msg = format!("no such subcommand: `{}`", word);
                if let Some(hint) = crate::suggest::for_command(tree, cmd, &word) {
                    msg.push_str(&hint);
                }
                msg
            }
            Message::Unexpected { text } => {
                format!("`{}` is not expected in this context", text)
            }
            Message::NoValue { slot } => {
                let slot = &tree.slots[slot];
                format!(
                    "`{}` requires an argument `{}`",
                    slot_name(tree, slot.id, convention),
                    slot.arg.meta()
                )
            }
            Message::Ambiguity { text } => {
                let first = text.chars().next().unwrap_or_default();
                format!(
                    "`-{}` could be a group of short flags or `-{}` with an argument, \
                     use `-{}={}` to disambiguate",
                    text,
                    first,
                    first,
                    text.chars().skip(1).collect::<String>(),
                )
            }
            Message::Repeated { slot } => {
                format!(
                    "argument `{}` cannot be used multiple times",
                    slot_name(tree, slot, convention)
                )
            }
            Message::Missing(slots) => {
                let names: Vec<String> = slots
                    .iter()
                    .map(|&s| format!("`{}`", slot_name(tree, s, convention)))
                    .collect();
                match names.as_slice() {
                    [] => "missing required arguments".to_string(),
                    [one] => format!("missing required argument: {}", one),
                    many => format!("missing required arguments: {}", many.join(", ")),
                }
            }
            Message::BadUtf8 { index, slot, offset } => {
                format!(
                    "couldn't decode token {} for `{}`: invalid unicode at byte {}",
                    index,
                    tree.slots[slot].arg.meta(),
                    offset
                )
            }
            Message::DecodeFailed { slot, raw, error } => {
                format!(
                    "couldn't parse `{}` for `{}`: {}",
                    raw,
                    tree.slots[slot].arg.meta(),
                    error
                )
            }
            Message::OutOfRange { slot, raw, min, max } => {
                format!(
                    "value `{}` for `{}` is out of range {}..={}",
                    raw,
                    tree.slots[slot].arg.meta(),
                    min,
                    max
                )
            }
            Message::BadParentRef { child, referenced } => {
                format!(
                    "command `{}` refers to `{}` which is not one of its ancestors",
                    tree.cmds[child].name, referenced
                )
            }
            Message::Validation(msg) => msg,
        };

        match usage {
            Some(usage) => ParseFailure::Stderr(format!("{}\n{}", summary, usage)),
            None => ParseFailure::Stderr(summary),
        }
    }
}

/// Name to blame in diagnostics: first long name, the positional's
/// placeholder otherwise
pub(crate) fn slot_name(tree: &Tree, slot: SlotId, convention: Convention) -> String {
    let slot = &tree.slots[slot];
    match slot.display_name() {
        Some(name) => name.render(convention),
        None => format!("<{}>", slot.arg.meta()),
    }
}
