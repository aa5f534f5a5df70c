//! Schema model: arguments, option groups, commands and the compiled tree
//!
//! A schema is assembled with the [`Arg`], [`Group`] and [`Command`]
//! builders and compiled once into a [`Schema`](crate::Schema) with
//! [`Command::to_schema`]. Compilation flattens option groups into their
//! owning command (at declaration position, so positional ordering is
//! preserved), synthesizes derived names (inverted flag names, selector
//! case names), and rejects invalid compositions with a [`SchemaError`].
//! The compiled tree is immutable and can be shared across threads.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::decoder::{Bindings, Value};
use crate::name::{kebab, Name, NameKind};
use crate::validation::Violation;

/// How an option claims value tokens from the input
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Consume exactly one following element as the value (default)
    Next,
    /// Consume exactly one following element even if it looks like an option
    Unconditional,
    /// Consume the first following element that is not a recognized option
    ScanningForValue,
    /// Consume zero or more value looking elements, stop at the first
    /// recognized option
    UpToNextOption,
    /// One value per occurrence, the option must be repeated
    SingleValue,
    /// One value per occurrence, even if the value looks like an option
    UnconditionalSingleValue,
    /// Every subsequent element up to the end of input
    Remaining,
    /// Variadic positional that also receives elements the matcher could
    /// not otherwise assign
    AllUnrecognized,
    /// Variadic positional receiving everything after the `--` terminator
    PostTerminator,
    /// Like [`AllUnrecognized`](Strategy::AllUnrecognized), plus every
    /// element after the first one this argument claimed
    CaptureForPassthrough,
}

impl Strategy {
    pub(crate) fn is_array(self) -> bool {
        !matches!(
            self,
            Strategy::Next | Strategy::Unconditional | Strategy::ScanningForValue
        )
    }

    pub(crate) fn is_sink(self) -> bool {
        matches!(
            self,
            Strategy::AllUnrecognized | Strategy::PostTerminator | Strategy::CaptureForPassthrough
        )
    }
}

/// Value arity of a single argument
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Arity {
    /// Takes no value (flags)
    Nullary,
    /// Takes exactly one value
    Unary,
    /// Takes any number of values
    Variadic,
}

/// Where an argument may appear in generated output
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    /// Shown in regular help
    Default,
    /// Shown only in the `--help-hidden` variant
    Hidden,
    /// Never shown
    Private,
}

impl Visibility {
    pub(crate) fn stricter(self, other: Visibility) -> Visibility {
        self.max(other)
    }
}

/// Negative name synthesis for boolean flags
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Inversion {
    /// No negative form
    None,
    /// Keep `--name`, synthesize `--no-name`
    PrefixedNo,
    /// Replace `--name` with `--enable-name` and `--disable-name`
    PrefixedEnableDisable,
}

/// What happens when the same argument is given several times
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Exclusivity {
    /// Repetition is an error
    Exclusive,
    /// The first occurrence wins
    ChooseFirst,
    /// The last occurrence wins
    ChooseLast,
}

/// Declared type of an argument's value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Str,
    /// Integer with an inclusive range; out of range input is reported
    /// separately from unparseable input
    Int { min: i64, max: i64 },
    Float,
    Bool,
}

impl Default for ValueKind {
    fn default() -> Self {
        ValueKind::Str
    }
}

/// A transform applied to each raw value before type decoding
pub type Transform = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// User validation hook attached to a command or a group
pub type Hook = Arc<dyn Fn(&mut Bindings) -> Result<(), Violation> + Send + Sync>;

/// Hint for shell completion of an argument's value
#[derive(Clone)]
pub enum CompletionHint {
    /// Complete file names, optionally restricted by extension
    File { ext: Option<&'static str> },
    /// Complete directory names
    Dir,
    /// A fixed list of candidate values
    List(Vec<&'static str>),
    /// Let the shell evaluate this command for candidates
    ShellCommand(&'static str),
    /// Candidates computed from the partial word at completion time
    Custom(Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>),
}

impl std::fmt::Debug for CompletionHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionHint::File { ext } => f.debug_struct("File").field("ext", ext).finish(),
            CompletionHint::Dir => f.write_str("Dir"),
            CompletionHint::List(xs) => f.debug_tuple("List").field(xs).finish(),
            CompletionHint::ShellCommand(c) => f.debug_tuple("ShellCommand").field(c).finish(),
            CompletionHint::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ArgKind {
    Option,
    Flag(FlagKind),
    Positional,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum FlagKind {
    Boolean,
    Counter,
    Selector,
}

/// A single schema entry: an option, a flag or a positional
///
/// Create one with [`Arg::option`], [`Arg::flag`], [`Arg::counter`],
/// [`Arg::selector`] or [`Arg::positional`] and refine it with the
/// builder methods. The identifier doubles as the lookup key in the
/// decoded [`Bindings`] and as the source for the derived long name.
#[derive(Clone)]
pub struct Arg {
    pub(crate) id: &'static str,
    pub(crate) kind: ArgKind,
    pub(crate) names: Vec<Name>,
    pub(crate) arity: Arity,
    pub(crate) strategy: Strategy,
    pub(crate) value: ValueKind,
    pub(crate) fallback: Option<Value>,
    pub(crate) as_flag: Option<Value>,
    pub(crate) transform: Option<Transform>,
    pub(crate) completion: Option<CompletionHint>,
    pub(crate) help: Option<String>,
    pub(crate) discussion: Option<String>,
    pub(crate) placeholder: Option<String>,
    pub(crate) visibility: Visibility,
    pub(crate) inversion: Inversion,
    pub(crate) exclusivity: Exclusivity,
    pub(crate) env: Option<&'static str>,
    pub(crate) required: bool,
    pub(crate) allow_joined: bool,
    pub(crate) cases: Vec<&'static str>,
}

impl std::fmt::Debug for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arg")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("names", &self.names)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl Arg {
    fn new(id: &'static str, kind: ArgKind) -> Self {
        Arg {
            id,
            kind,
            names: Vec::new(),
            arity: match kind {
                ArgKind::Flag(_) => Arity::Nullary,
                _ => Arity::Unary,
            },
            strategy: Strategy::Next,
            value: ValueKind::Str,
            fallback: None,
            as_flag: None,
            transform: None,
            completion: None,
            help: None,
            discussion: None,
            placeholder: None,
            visibility: Visibility::Default,
            inversion: Inversion::None,
            exclusivity: Exclusivity::ChooseLast,
            env: None,
            required: matches!(kind, ArgKind::Option | ArgKind::Positional),
            allow_joined: false,
            cases: Vec::new(),
        }
    }

    /// A named option taking one value
    pub fn option(id: &'static str) -> Self {
        Arg::new(id, ArgKind::Option)
    }

    /// A boolean flag
    pub fn flag(id: &'static str) -> Self {
        let mut a = Arg::new(id, ArgKind::Flag(FlagKind::Boolean));
        a.value = ValueKind::Bool;
        a
    }

    /// A flag counting its occurrences
    pub fn counter(id: &'static str) -> Self {
        let mut a = Arg::new(id, ArgKind::Flag(FlagKind::Counter));
        a.value = ValueKind::Int {
            min: 0,
            max: i64::MAX,
        };
        a
    }

    /// A case enumerated flag: each case spells its own long name
    pub fn selector(id: &'static str, cases: &[&'static str]) -> Self {
        let mut a = Arg::new(id, ArgKind::Flag(FlagKind::Selector));
        a.cases = cases.to_vec();
        a
    }

    /// A positional argument identified by its position
    pub fn positional(id: &'static str) -> Self {
        Arg::new(id, ArgKind::Positional)
    }

    /// Add an explicit name; an explicit long (or single dash) name
    /// replaces the one derived from the identifier
    pub fn name(mut self, name: Name) -> Self {
        self.names.push(name);
        self
    }

    /// Add a short name
    pub fn short(self, c: char) -> Self {
        self.name(Name::short(c))
    }

    /// Add a long name
    pub fn long(self, spelling: impl Into<String>) -> Self {
        self.name(Name::long(spelling))
    }

    /// Also read this argument from an environment variable
    ///
    /// A present key selects a flag regardless of its value; for an
    /// option the value is used. Command line input always wins.
    pub fn env(mut self, var: &'static str) -> Self {
        self.env = Some(var);
        self
    }

    /// Declared value type
    pub fn value(mut self, kind: ValueKind) -> Self {
        self.value = kind;
        self
    }

    /// Shorthand for a full range integer value
    pub fn int(self) -> Self {
        self.value(ValueKind::Int {
            min: i64::MIN,
            max: i64::MAX,
        })
    }

    /// How this argument claims value tokens
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        if strategy.is_array() {
            self.arity = Arity::Variadic;
        }
        self
    }

    /// Accept any number of values
    pub fn variadic(mut self) -> Self {
        self.arity = Arity::Variadic;
        self
    }

    /// Absence is not an error, the slot decodes to "absent"
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Use this value when the argument is absent
    pub fn fallback(mut self, value: Value) -> Self {
        self.fallback = Some(value);
        self.required = false;
        self
    }

    /// Use this value when the name appears with no attached or following
    /// value; composes only with [`Strategy::Next`] and
    /// [`Strategy::ScanningForValue`]
    pub fn default_as_flag(mut self, value: Value) -> Self {
        self.as_flag = Some(value);
        self.required = false;
        self
    }

    /// Apply a failing transform to each raw value before decoding
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    /// Completion hint for this argument's value
    pub fn complete(mut self, hint: CompletionHint) -> Self {
        self.completion = Some(hint);
        self
    }

    /// One line help message
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Longer free form discussion shown in full help
    pub fn discussion(mut self, text: impl Into<String>) -> Self {
        self.discussion = Some(text.into());
        self
    }

    /// Name used for the value in usage lines and diagnostics
    pub fn placeholder(mut self, meta: impl Into<String>) -> Self {
        self.placeholder = Some(meta.into());
        self
    }

    /// Show only under `--help-hidden`
    pub fn hide(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    /// Never show in any generated output
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Synthesize a negative name for a boolean flag
    pub fn invertible(mut self, inversion: Inversion) -> Self {
        self.inversion = inversion;
        self
    }

    /// Repetition is an error
    pub fn exclusive(mut self) -> Self {
        self.exclusivity = Exclusivity::Exclusive;
        self
    }

    /// On repetition keep the first binding
    pub fn choose_first(mut self) -> Self {
        self.exclusivity = Exclusivity::ChooseFirst;
        self
    }

    /// On repetition keep the last binding
    pub fn choose_last(mut self) -> Self {
        self.exclusivity = Exclusivity::ChooseLast;
        self
    }

    /// Allow `-Xvalue` style attachment for this argument's short names
    pub fn allow_joined(mut self) -> Self {
        self.allow_joined = true;
        self
    }

    pub(crate) fn is_positional(&self) -> bool {
        self.kind == ArgKind::Positional
    }

    pub(crate) fn takes_value(&self) -> bool {
        !matches!(self.kind, ArgKind::Flag(_))
    }

    pub(crate) fn meta(&self) -> String {
        match &self.placeholder {
            Some(p) => p.clone(),
            None => self.id.replace(['-', ' '], "_").to_uppercase(),
        }
    }
}

/// A reusable cluster of arguments composed into a command
///
/// The title, when present, renders the group's arguments as a separate
/// help block. Visibility composes: an argument is only as visible as the
/// most restrictive group it sits in.
#[derive(Clone)]
pub struct Group {
    pub(crate) title: Option<String>,
    pub(crate) visibility: Visibility,
    pub(crate) members: Vec<GroupMember>,
    pub(crate) hook: Option<Hook>,
}

#[derive(Clone)]
pub(crate) enum GroupMember {
    Arg(Arg),
    Group(Group),
}

impl Group {
    /// An untitled group: arguments render with the command's own
    pub fn new() -> Self {
        Group {
            title: None,
            visibility: Visibility::Default,
            members: Vec::new(),
            hook: None,
        }
    }

    /// A titled group rendered as its own help block
    pub fn titled(title: impl Into<String>) -> Self {
        let mut g = Group::new();
        g.title = Some(title.into());
        g
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.members.push(GroupMember::Arg(arg));
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.members.push(GroupMember::Group(group));
        self
    }

    pub fn hide(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Validation hook, runs after decode, before the owning command's
    pub fn validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Bindings) -> Result<(), Violation> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }
}

impl Default for Group {
    fn default() -> Self {
        Group::new()
    }
}

/// A command: a named collection of arguments and child commands
#[derive(Clone)]
pub struct Command {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) summary: Option<String>,
    pub(crate) discussion: Option<String>,
    pub(crate) usage: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) members: Vec<GroupMember>,
    pub(crate) children: Vec<Command>,
    pub(crate) default_child: Option<String>,
    pub(crate) help_names: Option<Vec<Name>>,
    pub(crate) display: bool,
    pub(crate) hook: Option<Hook>,
    pub(crate) parent_ref: Option<String>,
}

impl Command {
    /// A command with the given name
    ///
    /// Identifier style input is normalized to kebab case, so
    /// `Command::new("listFiles")` answers to `list-files`.
    pub fn new(name: &str) -> Self {
        Command {
            name: kebab(name),
            aliases: Vec::new(),
            summary: None,
            discussion: None,
            usage: None,
            version: None,
            members: Vec::new(),
            children: Vec::new(),
            default_child: None,
            help_names: None,
            display: true,
            hook: None,
            parent_ref: None,
        }
    }

    /// One line description shown in `OVERVIEW:` and in the parent's
    /// subcommand list
    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }

    /// Longer description shown after the summary
    pub fn discussion(mut self, text: impl Into<String>) -> Self {
        self.discussion = Some(text.into());
        self
    }

    /// Verbatim replacement for the generated usage line
    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = Some(text.into());
        self
    }

    /// Version string; also enables the `--version` flag
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Alternative name this command answers to
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.members.push(GroupMember::Arg(arg));
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.members.push(GroupMember::Group(group));
        self
    }

    pub fn command(mut self, child: Command) -> Self {
        self.children.push(child);
        self
    }

    /// Child selected implicitly when no subcommand is named and the
    /// child's required positionals can be satisfied
    pub fn default_command(mut self, name: &str) -> Self {
        self.default_child = Some(kebab(name));
        self
    }

    /// Replace the default `-h` / `--help` set; inherited by children
    /// that don't set their own
    pub fn help_names(mut self, names: Vec<Name>) -> Self {
        self.help_names = Some(names);
        self
    }

    /// Hide this command from its parent's subcommand list
    pub fn no_display(mut self) -> Self {
        self.display = false;
        self
    }

    /// Validation hook, runs leaves first after decoding
    pub fn validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Bindings) -> Result<(), Violation> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Declare that this command reads bindings of the named ancestor;
    /// checked against the actual resolved path at decode time
    pub fn parent(mut self, name: &str) -> Self {
        self.parent_ref = Some(kebab(name));
        self
    }
}

/// Problems detected while compiling a [`Command`] tree into a schema
///
/// These are construction time faults in the schema itself, not in any
/// input, and render without a usage line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two arguments in one command share a (kind, spelling) pair
    DuplicateName { command: String, name: String },
    /// More than one ordinary variadic positional
    MultipleVariadic { command: String },
    /// A required scalar positional follows a variadic one
    RequiredAfterVariadic { command: String, id: &'static str },
    /// Short name spelling is not exactly one character
    BadShortName { command: String, name: String },
    /// Long name spelling contains whitespace
    BadLongName { command: String, name: String },
    /// `default_as_flag` used with a strategy other than `Next` or
    /// `ScanningForValue`
    BadAsFlagStrategy { command: String, id: &'static str },
    /// The declared default child is not a direct child
    UnknownDefaultChild { command: String, child: String },
    /// A child name or alias collides with a sibling's
    CommandNameClash { command: String, name: String },
    /// A synthesized inverted name collides with a declared one
    InversionCollision { command: String, name: String },
    /// A selector flag with no cases
    EmptySelector { command: String, id: &'static str },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::DuplicateName { command, name } => {
                write!(f, "duplicate name `{}` in command `{}`", name, command)
            }
            SchemaError::MultipleVariadic { command } => {
                write!(f, "command `{}` has more than one variadic positional", command)
            }
            SchemaError::RequiredAfterVariadic { command, id } => write!(
                f,
                "required positional `{}` follows a variadic one in command `{}`",
                id, command
            ),
            SchemaError::BadShortName { command, name } => write!(
                f,
                "short name `{}` in command `{}` must be exactly one character",
                name, command
            ),
            SchemaError::BadLongName { command, name } => write!(
                f,
                "long name `{}` in command `{}` contains whitespace",
                name, command
            ),
            SchemaError::BadAsFlagStrategy { command, id } => write!(
                f,
                "`{}` in command `{}`: default_as_flag requires the Next or ScanningForValue strategy",
                id, command
            ),
            SchemaError::UnknownDefaultChild { command, child } => write!(
                f,
                "default child `{}` of command `{}` is not a direct child",
                child, command
            ),
            SchemaError::CommandNameClash { command, name } => write!(
                f,
                "command name or alias `{}` appears twice under `{}`",
                name, command
            ),
            SchemaError::InversionCollision { command, name } => write!(
                f,
                "inverted name `{}` collides with a declared name in command `{}`",
                name, command
            ),
            SchemaError::EmptySelector { command, id } => {
                write!(f, "selector `{}` in command `{}` has no cases", id, command)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

// ---------------------------------------------------------------------------
// compiled representation

pub(crate) type CmdId = usize;
pub(crate) type SlotId = usize;

/// Why a particular name resolves to a slot
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum NameRole {
    /// A declared (or derived) positive name
    Plain,
    /// Synthesized `--no-...`
    Negative,
    /// Synthesized `--enable-...`
    Enable,
    /// Synthesized `--disable-...`
    Disable,
    /// Selector case by index
    Case(usize),
}

impl NameRole {
    pub(crate) fn polarity(self) -> bool {
        !matches!(self, NameRole::Negative | NameRole::Disable)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SlotName {
    pub(crate) name: Name,
    pub(crate) role: NameRole,
}

/// A compiled argument slot
pub(crate) struct Slot {
    pub(crate) id: SlotId,
    pub(crate) owner: CmdId,
    pub(crate) group: Option<usize>,
    pub(crate) arg: Arg,
    pub(crate) names: Vec<SlotName>,
    pub(crate) visibility: Visibility,
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("group", &self.group)
            .field("arg", &self.arg)
            .field("names", &self.names)
            .field("visibility", &self.visibility)
            .finish()
    }
}

impl Slot {
    /// Preferred name for diagnostics: first long, else first of any kind
    pub(crate) fn display_name(&self) -> Option<&Name> {
        self.names
            .iter()
            .find(|sn| sn.name.kind == NameKind::Long && sn.role == NameRole::Plain)
            .or_else(|| self.names.first())
            .map(|sn| &sn.name)
    }
}

pub(crate) struct GroupInfo {
    pub(crate) parent: Option<usize>,
    pub(crate) title: Option<String>,
    pub(crate) hook: Option<Hook>,
}

impl std::fmt::Debug for GroupInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupInfo")
            .field("parent", &self.parent)
            .field("title", &self.title)
            .field("hook", &self.hook.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

/// A compiled command
pub(crate) struct Cmd {
    pub(crate) parent: Option<CmdId>,
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) summary: Option<String>,
    pub(crate) discussion: Option<String>,
    pub(crate) usage: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) children: Vec<CmdId>,
    pub(crate) default_child: Option<CmdId>,
    pub(crate) help_names: Vec<Name>,
    pub(crate) display: bool,
    pub(crate) slots: Vec<SlotId>,
    pub(crate) groups: Vec<GroupInfo>,
    pub(crate) hook: Option<Hook>,
    pub(crate) parent_ref: Option<String>,
}

impl std::fmt::Debug for Cmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cmd")
            .field("parent", &self.parent)
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("summary", &self.summary)
            .field("discussion", &self.discussion)
            .field("usage", &self.usage)
            .field("version", &self.version)
            .field("children", &self.children)
            .field("default_child", &self.default_child)
            .field("help_names", &self.help_names)
            .field("display", &self.display)
            .field("slots", &self.slots)
            .field("groups", &self.groups)
            .field("hook", &self.hook.as_ref().map(|_| "<hook>"))
            .field("parent_ref", &self.parent_ref)
            .finish()
    }
}

/// The compiled command forest plus the flat slot arena
#[derive(Debug)]
pub(crate) struct Tree {
    pub(crate) cmds: Vec<Cmd>,
    pub(crate) slots: Vec<Slot>,
}

impl Tree {
    pub(crate) fn root(&self) -> &Cmd {
        &self.cmds[0]
    }

    /// Command chain from the root down to `cmd`
    pub(crate) fn path(&self, cmd: CmdId) -> Vec<CmdId> {
        let mut path = vec![cmd];
        let mut cur = cmd;
        while let Some(parent) = self.cmds[cur].parent {
            path.push(parent);
            cur = parent;
        }
        path.reverse();
        path
    }

    /// Full invocation name, `tool stats average`
    pub(crate) fn full_name(&self, cmd: CmdId) -> String {
        self.path(cmd)
            .iter()
            .map(|&c| self.cmds[c].name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

}

pub(crate) fn compile(root: Command) -> Result<Tree, SchemaError> {
    let mut tree = Tree {
        cmds: Vec::new(),
        slots: Vec::new(),
    };
    let default_help = vec![Name::short('h'), Name::long("help")];
    compile_cmd(&mut tree, root, None, &default_help)?;
    Ok(tree)
}

fn compile_cmd(
    tree: &mut Tree,
    cmd: Command,
    parent: Option<CmdId>,
    inherited_help: &[Name],
) -> Result<CmdId, SchemaError> {
    let id = tree.cmds.len();
    let help_names = cmd
        .help_names
        .clone()
        .unwrap_or_else(|| inherited_help.to_vec());

    tree.cmds.push(Cmd {
        parent,
        name: cmd.name.clone(),
        aliases: cmd.aliases.clone(),
        summary: cmd.summary.clone(),
        discussion: cmd.discussion.clone(),
        usage: cmd.usage.clone(),
        version: cmd.version.clone(),
        children: Vec::new(),
        default_child: None,
        help_names: help_names.clone(),
        display: cmd.display,
        slots: Vec::new(),
        groups: Vec::new(),
        hook: cmd.hook.clone(),
        parent_ref: cmd.parent_ref.clone(),
    });

    // groups are spliced in at declaration position so positional
    // ordering survives composition
    collect_members(tree, id, cmd.members, None, Visibility::Default)?;
    check_cmd(tree, id)?;

    let mut sibling_names = BTreeSet::new();
    let mut child_ids = Vec::new();
    for child in cmd.children {
        for name in std::iter::once(&child.name).chain(child.aliases.iter()) {
            if !sibling_names.insert(name.clone()) {
                return Err(SchemaError::CommandNameClash {
                    command: tree.cmds[id].name.clone(),
                    name: name.clone(),
                });
            }
        }
        let child_id = compile_cmd(tree, child, Some(id), &help_names)?;
        child_ids.push(child_id);
    }
    tree.cmds[id].children = child_ids;

    if let Some(default) = cmd.default_child {
        let found = tree.cmds[id]
            .children
            .iter()
            .copied()
            .find(|&c| tree.cmds[c].name == default);
        match found {
            Some(c) => tree.cmds[id].default_child = Some(c),
            None => {
                return Err(SchemaError::UnknownDefaultChild {
                    command: tree.cmds[id].name.clone(),
                    child: default,
                })
            }
        }
    }

    Ok(id)
}

fn collect_members(
    tree: &mut Tree,
    cmd: CmdId,
    members: Vec<GroupMember>,
    group: Option<usize>,
    visibility: Visibility,
) -> Result<(), SchemaError> {
    for member in members {
        match member {
            GroupMember::Arg(arg) => {
                let slot_id = tree.slots.len();
                let names = effective_names(&arg, &tree.cmds[cmd].name)?;
                tree.slots.push(Slot {
                    id: slot_id,
                    owner: cmd,
                    group,
                    visibility: visibility.stricter(arg.visibility),
                    names,
                    arg,
                });
                tree.cmds[cmd].slots.push(slot_id);
            }
            GroupMember::Group(g) => {
                let group_id = tree.cmds[cmd].groups.len();
                let vis = visibility.stricter(g.visibility);
                tree.cmds[cmd].groups.push(GroupInfo {
                    parent: group,
                    title: g.title,
                    hook: g.hook,
                });
                collect_members(tree, cmd, g.members, Some(group_id), vis)?;
            }
        }
    }
    Ok(())
}

/// Synthesize the effective name set of one argument: derived long name,
/// inverted forms and selector cases
fn effective_names(arg: &Arg, command: &str) -> Result<Vec<SlotName>, SchemaError> {
    let mut out = Vec::new();

    if arg.kind == ArgKind::Positional {
        return Ok(out);
    }

    if arg.kind == ArgKind::Flag(FlagKind::Selector) {
        if arg.cases.is_empty() {
            return Err(SchemaError::EmptySelector {
                command: command.to_string(),
                id: arg.id,
            });
        }
        for (ix, case) in arg.cases.iter().enumerate() {
            out.push(SlotName {
                name: Name::long(kebab(case)),
                role: NameRole::Case(ix),
            });
        }
        return Ok(out);
    }

    // the long spelling derives from the identifier unless an explicit
    // long (or single dash) name takes its place; short names alone
    // don't suppress it
    let mut declared = arg.names.clone();
    if !declared.iter().any(|n| n.kind != NameKind::Short) {
        declared.insert(0, Name::long(kebab(arg.id)));
    }

    for name in &declared {
        match name.kind {
            NameKind::Short => {
                if name.spelling.chars().count() != 1 {
                    return Err(SchemaError::BadShortName {
                        command: command.to_string(),
                        name: name.spelling.clone(),
                    });
                }
            }
            NameKind::Long | NameKind::SingleDashLong => {
                if name.spelling.chars().any(char::is_whitespace) {
                    return Err(SchemaError::BadLongName {
                        command: command.to_string(),
                        name: name.spelling.clone(),
                    });
                }
            }
        }
    }

    match arg.inversion {
        Inversion::None => {
            for name in declared {
                out.push(SlotName {
                    name,
                    role: NameRole::Plain,
                });
            }
        }
        Inversion::PrefixedNo => {
            let mut negatives = Vec::new();
            for name in &declared {
                if name.kind == NameKind::Long {
                    let negative = format!("no-{}", name.spelling);
                    if declared.iter().any(|n| n.spelling == negative) {
                        return Err(SchemaError::InversionCollision {
                            command: command.to_string(),
                            name: negative,
                        });
                    }
                    negatives.push(SlotName {
                        name: Name::long(negative),
                        role: NameRole::Negative,
                    });
                }
            }
            for name in declared {
                out.push(SlotName {
                    name,
                    role: NameRole::Plain,
                });
            }
            out.append(&mut negatives);
        }
        Inversion::PrefixedEnableDisable => {
            // the plain names are removed, only the synthesized pair remains
            for name in &declared {
                if name.kind == NameKind::Long {
                    for (prefix, role) in [("enable-", NameRole::Enable), ("disable-", NameRole::Disable)] {
                        let spelling = format!("{}{}", prefix, name.spelling);
                        if declared.iter().any(|n| n.spelling == spelling) {
                            return Err(SchemaError::InversionCollision {
                                command: command.to_string(),
                                name: spelling,
                            });
                        }
                        out.push(SlotName {
                            name: Name::long(spelling),
                            role,
                        });
                    }
                }
            }
        }
    }

    Ok(out)
}

fn check_cmd(tree: &Tree, cmd: CmdId) -> Result<(), SchemaError> {
    let command = &tree.cmds[cmd];

    // (kind, spelling) unique across every name in the command
    let mut seen = BTreeSet::new();
    for &slot_id in &command.slots {
        let slot = &tree.slots[slot_id];
        for sn in &slot.names {
            if !seen.insert((sn.name.kind, sn.name.spelling.clone())) {
                return Err(SchemaError::DuplicateName {
                    command: command.name.clone(),
                    name: sn.name.render(crate::name::Convention::Posix),
                });
            }
        }
        if let Some(err) = check_as_flag(slot, &command.name) {
            return Err(err);
        }
    }

    // positional ordering: at most one ordinary variadic, nothing
    // required after it. Sink strategies are separate channels.
    let mut saw_variadic = false;
    for &slot_id in &command.slots {
        let slot = &tree.slots[slot_id];
        if !slot.arg.is_positional() || slot.arg.strategy.is_sink() {
            continue;
        }
        if saw_variadic {
            if slot.arg.arity == Arity::Variadic {
                return Err(SchemaError::MultipleVariadic {
                    command: command.name.clone(),
                });
            }
            if slot.arg.required {
                return Err(SchemaError::RequiredAfterVariadic {
                    command: command.name.clone(),
                    id: slot.arg.id,
                });
            }
        }
        saw_variadic |= slot.arg.arity == Arity::Variadic;
    }

    Ok(())
}

fn check_as_flag(slot: &Slot, command: &str) -> Option<SchemaError> {
    if slot.arg.as_flag.is_some()
        && !matches!(slot.arg.strategy, Strategy::Next | Strategy::ScanningForValue)
    {
        return Some(SchemaError::BadAsFlagStrategy {
            command: command.to_string(),
            id: slot.arg.id,
        });
    }
    None
}
