//! Reducing raw occurrences into typed, defaulted, validated bindings
//!
//! The decoder walks every slot on the resolved command path in
//! declaration order: applies exclusivity reduction, transforms, declared
//! type parsing (with a separate out of range error for integers),
//! environment fallback, defaults, and missing required detection. The
//! result is a [`Bindings`] value with typed accessors.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::args::Args;
use crate::error::Message;
use crate::matcher::{Occurrence, RawBindings};
use crate::schema::{ArgKind, Arity, CmdId, Exclusivity, FlagKind, SlotId, Tree, ValueKind};

/// A decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Conversion out of a decoded [`Value`], used by the typed accessors on
/// [`Bindings`]
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Str(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            Value::Str(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for usize {
    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| usize::try_from(i).ok())
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Option<Self> {
        String::from_value(value).map(PathBuf::from)
    }
}

/// Where a slot's decoded value came from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindingSource {
    CommandLine,
    Environment,
    Default,
    Absent,
}

#[derive(Debug, Clone)]
pub(crate) struct Decoded {
    pub(crate) values: Vec<Value>,
    pub(crate) source: BindingSource,
}

/// Typed values of a resolved parse, keyed by argument identifier
///
/// Identifiers of the resolved command shadow same named identifiers of
/// its ancestors.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: BTreeMap<SlotId, Decoded>,
    index: BTreeMap<String, SlotId>,
}

impl Bindings {
    /// True when the argument was given or fell back to a non absent
    /// source
    pub fn contains(&self, id: &str) -> bool {
        self.lookup(id)
            .map_or(false, |d| d.source != BindingSource::Absent)
    }

    /// First (or only) value of the slot, converted
    pub fn get<T: FromValue>(&self, id: &str) -> Option<T> {
        self.lookup(id)
            .and_then(|d| d.values.first())
            .and_then(T::from_value)
    }

    /// Every value of the slot in binding order, converted
    ///
    /// Values a conversion rejects are silently skipped; decode
    /// guarantees they match the declared kind already.
    pub fn get_all<T: FromValue>(&self, id: &str) -> Vec<T> {
        match self.lookup(id) {
            Some(d) => d.values.iter().filter_map(T::from_value).collect(),
            None => Vec::new(),
        }
    }

    /// Boolean flag accessor; absent reads as `false`
    pub fn flag(&self, id: &str) -> bool {
        self.get::<bool>(id).unwrap_or(false)
    }

    /// Counter accessor; absent reads as 0
    pub fn count(&self, id: &str) -> i64 {
        match self.lookup(id) {
            Some(d) => match d.values.as_slice() {
                [Value::Int(n)] => *n,
                values => values.len() as i64,
            },
            None => 0,
        }
    }

    /// Where the value came from
    pub fn source(&self, id: &str) -> BindingSource {
        self.lookup(id).map_or(BindingSource::Absent, |d| d.source)
    }

    /// Replace the slot's value; validation hooks use this and their
    /// mutations survive into the returned resolution
    pub fn set(&mut self, id: &str, value: Value) {
        if let Some(&slot) = self.index.get(id) {
            let entry = self.entries.entry(slot).or_insert(Decoded {
                values: Vec::new(),
                source: BindingSource::Default,
            });
            entry.values = vec![value];
            if entry.source == BindingSource::Absent {
                entry.source = BindingSource::Default;
            }
        }
    }

    fn lookup(&self, id: &str) -> Option<&Decoded> {
        self.index.get(id).and_then(|slot| self.entries.get(slot))
    }
}

pub(crate) fn decode(
    tree: &Tree,
    cmd: CmdId,
    raw: &RawBindings,
    args: &Args,
) -> Result<Bindings, Message> {
    let path = tree.path(cmd);

    // a declared parent reference must name an actual ancestor
    for &c in &path {
        if let Some(referenced) = &tree.cmds[c].parent_ref {
            let ok = path
                .iter()
                .take_while(|&&p| p != c)
                .any(|&p| &tree.cmds[p].name == referenced);
            if !ok {
                return Err(Message::BadParentRef {
                    child: c,
                    referenced: referenced.clone(),
                });
            }
        }
    }

    let mut bindings = Bindings::default();
    let mut missing = Vec::new();

    for &c in &path {
        for &slot_id in &tree.cmds[c].slots {
            let slot = &tree.slots[slot_id];
            // nearer command shadows the ancestor under the same id
            bindings.index.insert(slot.arg.id.to_string(), slot_id);

            let occurrences = raw.slots.get(&slot_id).map(Vec::as_slice).unwrap_or(&[]);
            let decoded = decode_slot(tree, slot_id, occurrences, args, &mut missing)?;
            bindings.entries.insert(slot_id, decoded);
        }
    }

    if !missing.is_empty() {
        return Err(Message::Missing(missing));
    }
    Ok(bindings)
}

fn decode_slot(
    tree: &Tree,
    slot_id: SlotId,
    occurrences: &[Occurrence],
    args: &Args,
    missing: &mut Vec<SlotId>,
) -> Result<Decoded, Message> {
    let slot = &tree.slots[slot_id];
    match slot.arg.kind {
        ArgKind::Flag(FlagKind::Boolean) => {
            if let Some(polarity) = reduce_polarity(occurrences, slot.arg.exclusivity) {
                return Ok(bound(vec![Value::Bool(polarity)]));
            }
            if env_present(slot, args) {
                return Ok(from_env(vec![Value::Bool(true)]));
            }
            match &slot.arg.fallback {
                Some(v) => Ok(defaulted(vec![v.clone()])),
                None => Ok(defaulted(vec![Value::Bool(false)])),
            }
        }
        ArgKind::Flag(FlagKind::Counter) => {
            if !occurrences.is_empty() {
                return Ok(bound(vec![Value::Int(occurrences.len() as i64)]));
            }
            if env_present(slot, args) {
                return Ok(from_env(vec![Value::Int(1)]));
            }
            Ok(defaulted(vec![Value::Int(0)]))
        }
        ArgKind::Flag(FlagKind::Selector) => decode_selector(tree, slot_id, occurrences, args),
        ArgKind::Option | ArgKind::Positional => {
            decode_valued(tree, slot_id, occurrences, args, missing)
        }
    }
}

/// Boolean flags fold their occurrences to the effective polarity
fn reduce_polarity(occurrences: &[Occurrence], exclusivity: Exclusivity) -> Option<bool> {
    let polarity = match exclusivity {
        Exclusivity::ChooseFirst => occurrences.first(),
        // `Exclusive` with more than one occurrence never reaches the
        // decoder, the matcher rejects it
        Exclusivity::ChooseLast | Exclusivity::Exclusive => occurrences.last(),
    };
    polarity.map(|occ| occ.role.polarity())
}

fn decode_selector(
    tree: &Tree,
    slot_id: SlotId,
    occurrences: &[Occurrence],
    args: &Args,
) -> Result<Decoded, Message> {
    let slot = &tree.slots[slot_id];
    let case_value = |occ: &Occurrence| match occ.role {
        crate::schema::NameRole::Case(ix) => Some(Value::Str(slot.arg.cases[ix].to_string())),
        _ => None,
    };

    if !occurrences.is_empty() {
        let values = if slot.arg.arity == Arity::Variadic {
            occurrences.iter().filter_map(case_value).collect()
        } else {
            let chosen = match slot.arg.exclusivity {
                Exclusivity::ChooseFirst => occurrences.first(),
                Exclusivity::ChooseLast | Exclusivity::Exclusive => occurrences.last(),
            };
            chosen.and_then(case_value).into_iter().collect()
        };
        return Ok(bound(values));
    }

    if let Some(var) = slot.arg.env {
        if let Some(raw) = args.env_var(var) {
            let matched = slot.arg.cases.iter().find(|case| **case == raw);
            return match matched {
                Some(case) => Ok(from_env(vec![Value::Str(case.to_string())])),
                None => Err(Message::DecodeFailed {
                    slot: slot_id,
                    raw: raw.to_string(),
                    error: format!("expected one of {}", slot.arg.cases.join(", ")),
                }),
            };
        }
    }
    match &slot.arg.fallback {
        Some(v) => Ok(defaulted(vec![v.clone()])),
        None => Ok(absent()),
    }
}

fn decode_valued(
    tree: &Tree,
    slot_id: SlotId,
    occurrences: &[Occurrence],
    args: &Args,
    missing: &mut Vec<SlotId>,
) -> Result<Decoded, Message> {
    let slot = &tree.slots[slot_id];
    let repeatable = slot.arg.arity == Arity::Variadic || slot.arg.strategy.is_array();

    let selected: Vec<&Occurrence> = if occurrences.is_empty() {
        Vec::new()
    } else if repeatable {
        occurrences.iter().collect()
    } else {
        let chosen = match slot.arg.exclusivity {
            Exclusivity::ChooseFirst => occurrences.first(),
            Exclusivity::ChooseLast | Exclusivity::Exclusive => occurrences.last(),
        };
        chosen.into_iter().collect()
    };

    if !selected.is_empty() {
        let mut values = Vec::new();
        for occ in &selected {
            if occ.values.is_empty() {
                // the name appeared bare: the declared flag value binds
                if let Some(v) = &slot.arg.as_flag {
                    values.push(v.clone());
                }
                continue;
            }
            for (ix, raw) in &occ.values {
                values.push(decode_one(tree, slot_id, *ix, raw)?);
            }
        }
        return Ok(bound(values));
    }

    if let Some(var) = slot.arg.env {
        if let Some(raw) = args.env_var(var) {
            let value = decode_text(tree, slot_id, raw)?;
            return Ok(from_env(vec![value]));
        }
    }
    if let Some(v) = &slot.arg.fallback {
        return Ok(defaulted(vec![v.clone()]));
    }
    if slot.arg.required && !slot.arg.strategy.is_sink() && slot.arg.arity != Arity::Variadic {
        missing.push(slot_id);
        return Ok(absent());
    }
    Ok(absent())
}

fn decode_one(
    tree: &Tree,
    slot_id: SlotId,
    index: usize,
    raw: &OsString,
) -> Result<Value, Message> {
    let text = match raw.to_str() {
        Some(text) => text,
        None => {
            // the replacement character marks where decoding first broke
            let lossy = raw.to_string_lossy();
            let offset = lossy.find('\u{FFFD}').unwrap_or(0);
            return Err(Message::BadUtf8 {
                index,
                slot: slot_id,
                offset,
            });
        }
    };
    decode_text(tree, slot_id, text)
}

fn decode_text(tree: &Tree, slot_id: SlotId, text: &str) -> Result<Value, Message> {
    let slot = &tree.slots[slot_id];
    if let Some(transform) = &slot.arg.transform {
        return transform(text).map_err(|error| Message::DecodeFailed {
            slot: slot_id,
            raw: text.to_string(),
            error,
        });
    }
    match &slot.arg.value {
        ValueKind::Str => Ok(Value::Str(text.to_string())),
        ValueKind::Int { min, max } => {
            let parsed: i64 = text.parse().map_err(|_| Message::DecodeFailed {
                slot: slot_id,
                raw: text.to_string(),
                error: "expected an integer".to_string(),
            })?;
            if parsed < *min || parsed > *max {
                return Err(Message::OutOfRange {
                    slot: slot_id,
                    raw: text.to_string(),
                    min: *min,
                    max: *max,
                });
            }
            Ok(Value::Int(parsed))
        }
        ValueKind::Float => text.parse().map(Value::Float).map_err(|_| {
            Message::DecodeFailed {
                slot: slot_id,
                raw: text.to_string(),
                error: "expected a number".to_string(),
            }
        }),
        ValueKind::Bool => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(Message::DecodeFailed {
                slot: slot_id,
                raw: text.to_string(),
                error: "expected true or false".to_string(),
            }),
        },
    }
}

fn env_present(slot: &crate::schema::Slot, args: &Args) -> bool {
    slot.arg.env.map_or(false, |var| args.env_var(var).is_some())
}

fn bound(values: Vec<Value>) -> Decoded {
    Decoded {
        values,
        source: BindingSource::CommandLine,
    }
}

fn from_env(values: Vec<Value>) -> Decoded {
    Decoded {
        values,
        source: BindingSource::Environment,
    }
}

fn defaulted(values: Vec<Value>) -> Decoded {
    Decoded {
        values,
        source: BindingSource::Default,
    }
}

fn absent() -> Decoded {
    Decoded {
        values: Vec::new(),
        source: BindingSource::Absent,
    }
}
