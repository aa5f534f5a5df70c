//! Splitting raw tokens into classified input elements
//!
//! One raw token becomes exactly one [`Element`]. Attached values
//! (`--name=value`, `/Name:value`) stay inside the element; a compound
//! short token (`-abc`) is kept ambiguous because only the matcher, with
//! the schema in hand, can decide between a bundle of flags, a short
//! option with a joined value, a single-dash long name, or a negative
//! number.

use std::ffi::{OsStr, OsString};

use crate::error::Message;
use crate::name::Convention;

/// A classified input token
///
/// The original [`OsString`] is retained where diagnostics may need to
/// quote the input verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Element {
    /// `--name` or `--name=value` (`/Name`, `/Name:value` under DOS)
    Long {
        name: String,
        value: Option<OsString>,
        os: OsString,
    },
    /// `-c` or `-c=value` (`/C` under DOS)
    Short {
        name: char,
        value: Option<OsString>,
        os: OsString,
    },
    /// `-abc` or `-abc=value`: ambiguous until matched against the schema
    Compound {
        text: String,
        value: Option<OsString>,
        os: OsString,
    },
    /// The literal `--`: everything after is a value
    Terminator,
    /// Anything else: command, positional, or an option's value
    Word(OsString),
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Long { os, .. } | Element::Short { os, .. } | Element::Compound { os, .. } => {
                write!(f, "{}", os.to_string_lossy())
            }
            Element::Terminator => f.write_str("--"),
            Element::Word(w) => write!(f, "{}", w.to_string_lossy()),
        }
    }
}

impl Element {
    /// The original token, for verbatim quoting
    pub(crate) fn os(&self) -> OsString {
        match self {
            Element::Long { os, .. } | Element::Short { os, .. } | Element::Compound { os, .. } => {
                os.clone()
            }
            Element::Terminator => OsString::from("--"),
            Element::Word(w) => w.clone(),
        }
    }

}

/// Split the whole token sequence under a convention
///
/// Elements keep a 1:1 index correspondence with input tokens. Tokens
/// after the terminator are produced as [`Element::Word`] regardless of
/// their shape.
pub(crate) fn split_all(
    tokens: &[OsString],
    convention: Convention,
) -> Result<Vec<Element>, Message> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut pos_only = false;
    for token in tokens {
        if pos_only {
            out.push(Element::Word(token.clone()));
            continue;
        }
        let element = split_token(token, convention)?;
        pos_only = element == Element::Terminator;
        out.push(element);
    }
    Ok(out)
}

fn split_token(os: &OsStr, convention: Convention) -> Result<Element, Message> {
    match convention {
        Convention::Posix => split_posix(os),
        Convention::Dos => split_dos(os),
    }
}

/// Outcome of splitting one raw token at the platform element level
#[derive(Debug)]
enum RawSplit {
    /// No recognized prefix, or the name units are not valid utf8: the
    /// token can only ever be a value
    Plain,
    /// Prefix length, decoded name, raw attached value
    Named(usize, String, Option<OsString>),
    /// A prefix followed directly by the separator: `--=value`
    Empty,
}

/// Split a prefixed token into its name and attached value without
/// requiring the value to decode
///
/// Dashes, slashes and the separators are low codepoints, so they can be
/// matched against the raw platform representation of the [`OsStr`]
/// directly: bytes on unix, possibly invalid utf16 units on windows.
/// Only the name has to be valid utf8; the value passes through
/// untouched, so `--name=<non-utf8>` still resolves `--name`.
fn split_raw(input: &OsStr, prefix: char, max_prefix: usize, sep: Option<char>) -> RawSplit {
    #[cfg(any(unix, windows))]
    {
        #[cfg(unix)]
        type Elt = u8;
        #[cfg(windows)]
        type Elt = u16;

        // pack a vector of elements back into OsString
        fn os_from_vec(vec: Vec<Elt>) -> OsString {
            #[cfg(unix)]
            {
                <OsString as std::os::unix::ffi::OsStringExt>::from_vec(vec)
            }
            #[cfg(windows)]
            {
                <OsString as std::os::windows::ffi::OsStringExt>::from_wide(&vec)
            }
        }

        // try to decode elements into a String
        fn str_from_vec(vec: Vec<Elt>) -> Option<String> {
            Some(os_from_vec(vec).to_str()?.to_owned())
        }

        // prefixes and separators are ascii, the cast is lossless
        let prefix_elt = prefix as Elt;
        let sep_elt = sep.map(|c| c as Elt);

        let mut items;
        #[cfg(unix)]
        {
            items = std::os::unix::ffi::OsStrExt::as_bytes(input)
                .iter()
                .copied();
        }
        #[cfg(windows)]
        {
            items = std::os::windows::ffi::OsStrExt::encode_wide(input);
        }

        let mut count = 0;
        let mut held = None;
        while count < max_prefix {
            match items.next() {
                Some(e) if e == prefix_elt => count += 1,
                other => {
                    held = other;
                    break;
                }
            }
        }
        if count == 0 {
            return RawSplit::Plain;
        }

        // keep collecting the name until the separator or the end
        let mut name: Vec<Elt> = Vec::new();
        let mut saw_sep = false;
        match held {
            Some(e) if Some(e) == sep_elt => saw_sep = true,
            Some(e) => name.push(e),
            None => {}
        }
        while !saw_sep {
            match items.next() {
                Some(e) if Some(e) == sep_elt => saw_sep = true,
                Some(e) => name.push(e),
                None => break,
            }
        }

        if name.is_empty() {
            return if saw_sep {
                RawSplit::Empty
            } else {
                RawSplit::Plain
            };
        }
        let name = match str_from_vec(name) {
            Some(name) => name,
            None => return RawSplit::Plain,
        };
        let value = if saw_sep {
            Some(os_from_vec(items.collect()))
        } else {
            None
        };
        RawSplit::Named(count, name, value)
    }
    #[cfg(not(any(unix, windows)))]
    {
        split_raw_fallback(input, prefix, max_prefix, sep)
    }
}

/// Utf8-only variant of [`split_raw`] for platforms without an element
/// level view of [`OsStr`]; tests hold it against the primary splitter
#[cfg(any(all(not(windows), not(unix)), test))]
fn split_raw_fallback(
    input: &OsStr,
    prefix: char,
    max_prefix: usize,
    sep: Option<char>,
) -> RawSplit {
    let text = match input.to_str() {
        Some(t) => t,
        None => return RawSplit::Plain,
    };

    let mut chars = text.chars();
    let mut count = 0;
    let mut held = None;
    while count < max_prefix {
        match chars.next() {
            Some(c) if c == prefix => count += 1,
            other => {
                held = other;
                break;
            }
        }
    }
    if count == 0 {
        return RawSplit::Plain;
    }

    let mut name = String::new();
    let mut saw_sep = false;
    match held {
        Some(c) if Some(c) == sep => saw_sep = true,
        Some(c) => name.push(c),
        None => {}
    }
    while !saw_sep {
        match chars.next() {
            Some(c) if Some(c) == sep => saw_sep = true,
            Some(c) => name.push(c),
            None => break,
        }
    }

    if name.is_empty() {
        return if saw_sep {
            RawSplit::Empty
        } else {
            RawSplit::Plain
        };
    }
    let value = if saw_sep {
        Some(OsString::from(chars.collect::<String>()))
    } else {
        None
    };
    RawSplit::Named(count, name, value)
}

fn split_posix(os: &OsStr) -> Result<Element, Message> {
    if os == OsStr::new("--") {
        return Ok(Element::Terminator);
    }
    match split_raw(os, '-', 2, Some('=')) {
        // a lone dash and non decodable names can only ever be values
        RawSplit::Plain => Ok(Element::Word(os.to_os_string())),
        RawSplit::Empty => Err(Message::EmptyName),
        RawSplit::Named(2, name, value) => Ok(Element::Long {
            name,
            value,
            os: os.to_os_string(),
        }),
        RawSplit::Named(_, body, value) => {
            let mut chars = body.chars();
            let first = chars.next().unwrap_or_default();
            if chars.next().is_none() {
                Ok(Element::Short {
                    name: first,
                    value,
                    os: os.to_os_string(),
                })
            } else {
                Ok(Element::Compound {
                    text: body,
                    value,
                    os: os.to_os_string(),
                })
            }
        }
    }
}

fn split_dos(os: &OsStr) -> Result<Element, Message> {
    // the terminator is shared between conventions
    if os == OsStr::new("--") {
        return Ok(Element::Terminator);
    }

    match split_raw(os, '/', 1, Some(':')) {
        RawSplit::Empty => return Err(Message::EmptyName),
        RawSplit::Named(_, body, value) => {
            let mut chars = body.chars();
            let first = chars.next().unwrap_or_default();
            return Ok(if chars.next().is_none() {
                Element::Short {
                    name: first,
                    value,
                    os: os.to_os_string(),
                }
            } else {
                Element::Long {
                    name: body,
                    value,
                    os: os.to_os_string(),
                }
            });
        }
        RawSplit::Plain => {}
    }

    // `+x` spells a short or a bundle, same ambiguity as posix `-x`
    match split_raw(os, '+', 1, None) {
        RawSplit::Named(_, body, value) => {
            let mut chars = body.chars();
            let first = chars.next().unwrap_or_default();
            Ok(if chars.next().is_none() {
                Element::Short {
                    name: first,
                    value,
                    os: os.to_os_string(),
                }
            } else {
                Element::Compound {
                    text: body,
                    value,
                    os: os.to_os_string(),
                }
            })
        }
        _ => Ok(Element::Word(os.to_os_string())),
    }
}

/// `46` or `4.6`: the shape a compound body takes when the token was
/// really a negative number
pub(crate) fn number_shaped(body: &str) -> bool {
    let mut dots = 0;
    let mut digits = 0;
    for c in body.chars() {
        if c == '.' {
            dots += 1;
        } else if c.is_ascii_digit() {
            digits += 1;
        } else {
            return false;
        }
    }
    digits > 0 && dots <= 1
}
