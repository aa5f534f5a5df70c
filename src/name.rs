//! Option and command names under the supported parsing conventions

use std::sync::atomic::{AtomicU8, Ordering};

/// Family of syntactic rules used to spell and recognize option names
///
/// [`Posix`](Convention::Posix) is the default: long options use a `--`
/// prefix, short options a single `-`, attached values follow `=`.
/// [`Dos`](Convention::Dos) uses a `/` prefix for both (`+` is accepted as
/// an alternate short prefix) and attaches values after `:`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Convention {
    Posix,
    Dos,
}

impl Default for Convention {
    fn default() -> Self {
        Convention::Posix
    }
}

// 0 - posix, 1 - dos. Read once per parse at entry, never mid-parse.
static PROCESS_CONVENTION: AtomicU8 = AtomicU8::new(0);

/// Set the process wide parsing convention
///
/// Affects every subsequent parse that doesn't carry an explicit
/// [`Settings`](crate::Settings) value. Callers are responsible for
/// serializing writes against concurrent parses.
pub fn set_process_convention(convention: Convention) {
    let val = match convention {
        Convention::Posix => 0,
        Convention::Dos => 1,
    };
    PROCESS_CONVENTION.store(val, Ordering::Relaxed);
}

pub(crate) fn process_convention() -> Convention {
    match PROCESS_CONVENTION.load(Ordering::Relaxed) {
        1 => Convention::Dos,
        _ => Convention::Posix,
    }
}

/// What kind of spelling a [`Name`] carries
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameKind {
    /// `--name` under POSIX, `/Name` under DOS
    Long,
    /// `-n` under POSIX, `/N` under DOS
    Short,
    /// `-name`: a long spelling that keeps the single dash prefix
    SingleDashLong,
}

/// A single option name: identity is the (kind, spelling) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name {
    pub(crate) kind: NameKind,
    pub(crate) spelling: String,
}

impl Name {
    /// A long name, spelled without the prefix: `Name::long("verbose")`
    pub fn long(spelling: impl Into<String>) -> Self {
        Name {
            kind: NameKind::Long,
            spelling: spelling.into(),
        }
    }

    /// A one character short name
    pub fn short(c: char) -> Self {
        Name {
            kind: NameKind::Short,
            spelling: c.to_string(),
        }
    }

    /// A long name that keeps a single dash prefix: `-name`
    pub fn single_dash(spelling: impl Into<String>) -> Self {
        Name {
            kind: NameKind::SingleDashLong,
            spelling: spelling.into(),
        }
    }

    pub(crate) fn short_char(&self) -> Option<char> {
        if self.kind == NameKind::Short {
            self.spelling.chars().next()
        } else {
            None
        }
    }

    /// Spelling with the convention's prefix attached, for diagnostics and help
    pub(crate) fn render(&self, convention: Convention) -> String {
        match (convention, self.kind) {
            (Convention::Posix, NameKind::Long) => format!("--{}", self.spelling),
            (Convention::Posix, NameKind::Short) => format!("-{}", self.spelling),
            (Convention::Posix, NameKind::SingleDashLong) => format!("-{}", self.spelling),
            (Convention::Dos, NameKind::Short) => format!("/{}", self.spelling.to_uppercase()),
            (Convention::Dos, NameKind::Long | NameKind::SingleDashLong) => {
                format!("/{}", pascal(&self.spelling))
            }
        }
    }
}

pub(crate) fn kebab(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    let mut prev_lower = false;
    for c in ident.chars() {
        if c == '_' {
            out.push('-');
            prev_lower = false;
        } else if c.is_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

pub(crate) fn pascal(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut upper_next = true;
    for c in ident.chars() {
        if c == '_' || c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
