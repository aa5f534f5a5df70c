//! Binding classified elements to schema slots
//!
//! The matcher walks the element sequence once, left to right, with a
//! consumed mark per element so that value claiming strategies can reach
//! past the cursor. It tracks the current command (rebuilding the lookup
//! [`Scope`] on every subcommand transition), the post terminator state,
//! and the passthrough capture state. It produces raw per slot
//! occurrences; reduction to typed values happens in the decoder.

use std::collections::BTreeMap;
use std::ffi::OsString;

use crate::arg::{number_shaped, Element};
use crate::error::Message;
use crate::lexer::Scope;
use crate::name::Convention;
use crate::schema::{ArgKind, Arity, CmdId, FlagKind, NameRole, SlotId, Strategy, Tree};

/// One appearance of an argument on the command line
#[derive(Debug, Clone)]
pub(crate) struct Occurrence {
    /// Which of the slot's names was used
    pub(crate) role: NameRole,
    /// Raw values claimed by this occurrence, each with the index of the
    /// token it came from
    pub(crate) values: Vec<(usize, OsString)>,
}

/// Raw matcher output: per slot occurrence lists
#[derive(Debug, Default)]
pub(crate) struct RawBindings {
    pub(crate) slots: BTreeMap<SlotId, Vec<Occurrence>>,
}

impl RawBindings {
    fn push(&mut self, slot: SlotId, occurrence: Occurrence) {
        self.slots.entry(slot).or_default().push(occurrence);
    }

    /// Append a value to the slot's latest occurrence, opening one if
    /// needed; used by sinks which accumulate across the whole parse
    fn append(&mut self, slot: SlotId, index: usize, value: OsString) {
        let occurrences = self.slots.entry(slot).or_default();
        match occurrences.last_mut() {
            Some(occ) => occ.values.push((index, value)),
            None => occurrences.push(Occurrence {
                role: NameRole::Plain,
                values: vec![(index, value)],
            }),
        }
    }
}

pub(crate) struct MatchOutcome {
    pub(crate) cmd: CmdId,
    pub(crate) raw: RawBindings,
}

pub(crate) struct Matcher<'a> {
    tree: &'a Tree,
    convention: Convention,
    elements: Vec<Element>,
    consumed: Vec<bool>,
    scope: Scope<'a>,
    raw: RawBindings,
    /// Entered after the `--` terminator
    post_terminator: bool,
    /// The capture-for-passthrough slot, once it has claimed a positional
    passthrough: Option<SlotId>,
    /// Index into the current command's positional queue
    next_positional: usize,
    /// A positional started claiming: subcommand transitions are over
    positional_claimed: bool,
    /// Values nothing wanted yet, kept for default child replay
    unclaimed: Vec<(usize, OsString)>,
    /// First error that would have been reported without a default child
    deferred_error: Option<Message>,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(tree: &'a Tree, elements: Vec<Element>, convention: Convention) -> Self {
        let consumed = vec![false; elements.len()];
        Matcher {
            tree,
            convention,
            elements,
            consumed,
            scope: Scope::new(tree, 0, convention),
            raw: RawBindings::default(),
            post_terminator: false,
            passthrough: None,
            next_positional: 0,
            positional_claimed: false,
            unclaimed: Vec::new(),
            deferred_error: None,
        }
    }

    pub(crate) fn run(mut self) -> Result<MatchOutcome, (Message, CmdId)> {
        let mut cursor = 0;
        while cursor < self.elements.len() {
            if self.consumed[cursor] {
                cursor += 1;
                continue;
            }
            self.consumed[cursor] = true;
            let element = self.elements[cursor].clone();
            if let Err(msg) = self.step(cursor, &element) {
                return Err((msg, self.scope.cmd));
            }
            cursor += 1;
        }

        if let Err(msg) = self.finish() {
            return Err((msg, self.scope.cmd));
        }
        if let Err(msg) = self.verify() {
            return Err((msg, self.scope.cmd));
        }

        Ok(MatchOutcome {
            cmd: self.scope.cmd,
            raw: self.raw,
        })
    }

    fn step(&mut self, index: usize, element: &Element) -> Result<(), Message> {
        // once passthrough capture begins everything goes to it verbatim,
        // help flags included; only the terminator keeps its meaning
        if let Some(sink) = self.passthrough {
            if matches!(element, Element::Terminator) {
                self.post_terminator = true;
                return Ok(());
            }
            self.raw.append(sink, index, element.os());
            return Ok(());
        }

        if self.post_terminator {
            let word = element.os();
            return self.route_post_terminator(index, word);
        }

        match element {
            Element::Terminator => {
                self.post_terminator = true;
                Ok(())
            }
            _ if self.scope.is_help(element) => Err(Message::Help {
                cmd: self.scope.cmd,
                hidden: false,
            }),
            Element::Long { name, value, .. } => {
                match self.scope.long(name) {
                    Some((slot, role)) => self.consume_named(slot, role, index, value.clone()),
                    None => self.unmatched_long(index, name, value.clone()),
                }
            }
            Element::Short { name, value, .. } => match self.scope.short(*name) {
                Some((slot, role)) => self.consume_named(slot, role, index, value.clone()),
                None => self.unmatched_short(index, *name, value.clone(), element),
            },
            Element::Compound { text, value, .. } => {
                self.resolve_compound(index, text, value.clone(), element)
            }
            Element::Word(word) => self.handle_word(index, word.clone()),
        }
    }

    fn unmatched_long(
        &mut self,
        index: usize,
        name: &str,
        value: Option<OsString>,
    ) -> Result<(), Message> {
        if value.is_none() {
            // built in names are recognized only where the user didn't
            // claim the spelling for themselves
            match name {
                "help-hidden" => {
                    return Err(Message::Help {
                        cmd: self.scope.cmd,
                        hidden: true,
                    })
                }
                "help-dump-opencli-v0.1" => return Err(Message::Dump(self.scope.cmd)),
                "version" => {
                    if let Some(cmd) = self.nearest_version() {
                        return Err(Message::Version(cmd));
                    }
                }
                _ => {}
            }
        }
        let os = self.elements[index].os();
        if let Some(sink) = self.unrecognized_sink() {
            self.raw.append(sink, index, os);
            return Ok(());
        }
        Err(Message::UnknownOption {
            text: os.to_string_lossy().into_owned(),
        })
    }

    fn unmatched_short(
        &mut self,
        index: usize,
        name: char,
        value: Option<OsString>,
        element: &Element,
    ) -> Result<(), Message> {
        // `-1` with nothing wanting the digit is a negative number
        if name.is_ascii_digit() && value.is_none() && self.scope.has_numeric_positional() {
            return self.handle_value(index, element.os());
        }
        let os = element.os();
        if let Some(sink) = self.unrecognized_sink() {
            self.raw.append(sink, index, os);
            return Ok(());
        }
        Err(Message::UnknownOption {
            text: os.to_string_lossy().into_owned(),
        })
    }

    fn nearest_version(&self) -> Option<CmdId> {
        self.tree
            .path(self.scope.cmd)
            .into_iter()
            .rev()
            .find(|&c| self.tree.cmds[c].version.is_some())
    }

    /// Post terminator elements feed the post-terminator sink when one is
    /// declared, otherwise they become trailing positional values
    fn route_post_terminator(&mut self, index: usize, word: OsString) -> Result<(), Message> {
        if let Some(sink) = self.sink_with(Strategy::PostTerminator) {
            self.raw.append(sink, index, word);
            return Ok(());
        }
        self.handle_value(index, word)
    }

    fn handle_word(&mut self, index: usize, word: OsString) -> Result<(), Message> {
        if !self.positional_claimed && self.passthrough.is_none() {
            if let Some(text) = word.to_str() {
                if let Some(child) = self.scope.subcommand(text) {
                    self.transition(child);
                    return Ok(());
                }
                // the `help stats average` pseudo subcommand of the root
                if self.scope.cmd == 0 && text == "help" && !self.tree.root().children.is_empty() {
                    return Err(self.help_pseudo_command(index));
                }
            }
        }
        self.handle_value(index, word)
    }

    fn help_pseudo_command(&mut self, index: usize) -> Message {
        let mut cmd = self.scope.cmd;
        for later in self.elements.iter().skip(index + 1) {
            let word = match later {
                Element::Word(w) => w.to_string_lossy().into_owned(),
                other => other.to_string(),
            };
            let child = self.tree.cmds[cmd]
                .children
                .iter()
                .copied()
                .find(|&c| self.tree.cmds[c].name == word || self.tree.cmds[c].aliases.contains(&word));
            match child {
                Some(c) => cmd = c,
                None => return Message::UnknownCommand { word },
            }
        }
        Message::Help { cmd, hidden: false }
    }

    fn transition(&mut self, child: CmdId) {
        self.scope = Scope::new(self.tree, child, self.convention);
        self.next_positional = 0;
        self.positional_claimed = false;
    }

    /// Positional slots of the current command that take values in order:
    /// ordinary positionals plus the passthrough capture
    fn positional_queue(&self) -> Vec<SlotId> {
        self.scope
            .positionals()
            .into_iter()
            .filter(|&s| {
                let strategy = self.tree.slots[s].arg.strategy;
                !matches!(strategy, Strategy::AllUnrecognized | Strategy::PostTerminator)
            })
            .collect()
    }

    fn sink_with(&self, strategy: Strategy) -> Option<SlotId> {
        self.scope
            .positionals()
            .into_iter()
            .find(|&s| self.tree.slots[s].arg.strategy == strategy)
    }

    /// The slot that accepts elements the matcher could not place
    fn unrecognized_sink(&self) -> Option<SlotId> {
        self.sink_with(Strategy::AllUnrecognized)
            .or_else(|| self.sink_with(Strategy::CaptureForPassthrough))
    }

    fn handle_value(&mut self, index: usize, word: OsString) -> Result<(), Message> {
        let queue = self.positional_queue();
        while self.next_positional < queue.len() {
            let slot_id = queue[self.next_positional];
            let slot = &self.tree.slots[slot_id];
            let bound = self
                .raw
                .slots
                .get(&slot_id)
                .map_or(0, |occ| occ.iter().map(|o| o.values.len()).sum());
            if slot.arg.arity != Arity::Variadic && bound >= 1 {
                self.next_positional += 1;
                continue;
            }
            self.positional_claimed = true;
            if slot.arg.strategy == Strategy::CaptureForPassthrough {
                self.passthrough = Some(slot_id);
            }
            self.raw.append(slot_id, index, word);
            return Ok(());
        }

        if let Some(sink) = self.unrecognized_sink() {
            self.raw.append(sink, index, word);
            return Ok(());
        }

        // keep the value around: a default child may still claim it
        let has_default = self.tree.cmds[self.scope.cmd].default_child.is_some();
        let error = if !self.tree.cmds[self.scope.cmd].children.is_empty()
            && self.positional_queue().is_empty()
        {
            Message::UnknownCommand {
                word: word.to_string_lossy().into_owned(),
            }
        } else {
            Message::Unexpected {
                text: word.to_string_lossy().into_owned(),
            }
        };
        if has_default {
            if self.deferred_error.is_none() {
                self.deferred_error = Some(error);
            }
            self.unclaimed.push((index, word));
            return Ok(());
        }
        Err(error)
    }

    fn consume_named(
        &mut self,
        slot_id: SlotId,
        role: NameRole,
        index: usize,
        attached: Option<OsString>,
    ) -> Result<(), Message> {
        let slot = &self.tree.slots[slot_id];
        match slot.arg.kind {
            ArgKind::Flag(_) => {
                if attached.is_some() {
                    return Err(Message::Unexpected {
                        text: self.elements[index].to_string(),
                    });
                }
                self.raw.push(
                    slot_id,
                    Occurrence {
                        role,
                        values: Vec::new(),
                    },
                );
                Ok(())
            }
            ArgKind::Option => self.consume_option(slot_id, role, index, attached),
            ArgKind::Positional => {
                // positionals have no names to consume through
                Err(Message::Unexpected {
                    text: self.elements[index].to_string(),
                })
            }
        }
    }

    fn consume_option(
        &mut self,
        slot_id: SlotId,
        role: NameRole,
        index: usize,
        attached: Option<OsString>,
    ) -> Result<(), Message> {
        let strategy = self.tree.slots[slot_id].arg.strategy;
        let has_as_flag = self.tree.slots[slot_id].arg.as_flag.is_some();

        if let Some(value) = attached {
            // the `remaining` array rejects the attached form, an
            // asymmetry kept for compatibility
            if strategy == Strategy::Remaining {
                return Err(Message::Unexpected {
                    text: self.elements[index].to_string(),
                });
            }
            self.raw.push(
                slot_id,
                Occurrence {
                    role,
                    values: vec![(index, value)],
                },
            );
            return Ok(());
        }

        let values = match strategy {
            Strategy::Next | Strategy::SingleValue => match self.claim_next_value(index) {
                Some(value) => vec![value],
                None if has_as_flag => Vec::new(),
                None => return Err(Message::NoValue { slot: slot_id }),
            },
            Strategy::Unconditional | Strategy::UnconditionalSingleValue => {
                match self.claim_next_any(index) {
                    Some(value) => vec![value],
                    None => return Err(Message::NoValue { slot: slot_id }),
                }
            }
            Strategy::ScanningForValue => match self.claim_scanning(index) {
                Some(value) => vec![value],
                None if has_as_flag => Vec::new(),
                None => return Err(Message::NoValue { slot: slot_id }),
            },
            Strategy::UpToNextOption => self.claim_up_to_option(index),
            Strategy::Remaining => self.claim_remaining(index),
            Strategy::AllUnrecognized
            | Strategy::PostTerminator
            | Strategy::CaptureForPassthrough => {
                // sinks are positional strategies, a named option cannot
                // carry them; the schema builder does not offer it
                Vec::new()
            }
        };

        self.raw.push(slot_id, Occurrence { role, values });
        Ok(())
    }

    /// Is this element usable as a value for a non-unconditional claim?
    fn value_of(&self, element: &Element) -> Option<OsString> {
        match element {
            Element::Word(w) => Some(w.clone()),
            Element::Short { name, value: None, os } => {
                // `-1` is a value when the digit resolves to nothing
                if name.is_ascii_digit() && self.scope.short(*name).is_none() {
                    Some(os.clone())
                } else {
                    None
                }
            }
            Element::Compound { text, value: None, os } => {
                if number_shaped(text) && !self.scope.element_is_recognized_option(element) {
                    Some(os.clone())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Claim the immediately following element when it reads as a value
    fn claim_next_value(&mut self, index: usize) -> Option<(usize, OsString)> {
        let next = index + 1;
        if next >= self.elements.len() || self.consumed[next] {
            return None;
        }
        let value = self.value_of(&self.elements[next])?;
        self.consumed[next] = true;
        Some((next, value))
    }

    /// Claim the immediately following element no matter its shape
    fn claim_next_any(&mut self, index: usize) -> Option<(usize, OsString)> {
        let next = index + 1;
        if next >= self.elements.len() || self.consumed[next] {
            return None;
        }
        self.consumed[next] = true;
        Some((next, self.elements[next].os()))
    }

    /// Scan forward for the first value, stopping at a recognized option
    /// or the terminator
    fn claim_scanning(&mut self, index: usize) -> Option<(usize, OsString)> {
        for ix in index + 1..self.elements.len() {
            if self.consumed[ix] {
                continue;
            }
            let element = &self.elements[ix];
            if matches!(element, Element::Terminator) {
                return None;
            }
            if self.scope.element_is_recognized_option(element) {
                return None;
            }
            if let Some(value) = self.value_of(element) {
                self.consumed[ix] = true;
                return Some((ix, value));
            }
        }
        None
    }

    /// Claim following value elements until the first option or the end
    fn claim_up_to_option(&mut self, index: usize) -> Vec<(usize, OsString)> {
        let mut values = Vec::new();
        for ix in index + 1..self.elements.len() {
            if self.consumed[ix] {
                continue;
            }
            match self.value_of(&self.elements[ix]) {
                Some(value) => {
                    self.consumed[ix] = true;
                    values.push((ix, value));
                }
                None => break,
            }
        }
        values
    }

    /// Claim every subsequent element, option looking ones included; the
    /// terminator itself keeps its meaning
    fn claim_remaining(&mut self, index: usize) -> Vec<(usize, OsString)> {
        let mut values = Vec::new();
        for ix in index + 1..self.elements.len() {
            if self.consumed[ix] {
                continue;
            }
            self.consumed[ix] = true;
            match &self.elements[ix] {
                Element::Terminator => self.post_terminator = true,
                element => values.push((ix, element.os())),
            }
        }
        values
    }

    fn resolve_compound(
        &mut self,
        index: usize,
        text: &str,
        value: Option<OsString>,
        element: &Element,
    ) -> Result<(), Message> {
        // a declared single dash long name wins over any decomposition,
        // signed decimals included
        if let Some((slot, role)) = self.scope.single_dash(text) {
            return self.consume_named(slot, role, index, value);
        }

        // greedy bundle decomposition from the left
        let chars: Vec<char> = text.chars().collect();
        let mut flags = Vec::new();
        let mut resolved = true;
        for (ix, &c) in chars.iter().enumerate() {
            if self.scope.short_is_flag(c) {
                flags.push(c);
                continue;
            }
            if let Some(slot_id) = self.scope.short_takes_value(c) {
                let rest: String = chars[ix + 1..].iter().collect();
                let joined = if rest.is_empty() && value.is_none() {
                    None
                } else if self.tree.slots[slot_id].arg.allow_joined {
                    // rebuilt at the OsString level so a non utf8 value
                    // survives the round trip
                    let mut tail = OsString::from(rest);
                    if let Some(v) = &value {
                        tail.push("=");
                        tail.push(v);
                    }
                    Some(tail)
                } else {
                    // a value taking short in the middle of a bundle
                    // without joined values allowed: ambiguous on purpose
                    return Err(Message::Ambiguity {
                        text: text.to_string(),
                    });
                };
                for &flag in &flags {
                    if let Some((slot, role)) = self.scope.short(flag) {
                        self.raw.push(
                            slot,
                            Occurrence {
                                role,
                                values: Vec::new(),
                            },
                        );
                    }
                }
                let role = self
                    .scope
                    .short(c)
                    .map_or(NameRole::Plain, |(_, role)| role);
                return match joined {
                    Some(joined) => {
                        self.raw.push(
                            slot_id,
                            Occurrence {
                                role,
                                values: vec![(index, joined)],
                            },
                        );
                        Ok(())
                    }
                    None => self.consume_option(slot_id, role, index, None),
                };
            }
            resolved = false;
            break;
        }

        if resolved && value.is_none() {
            // pure flag bundle
            for &flag in &flags {
                if let Some((slot, role)) = self.scope.short(flag) {
                    self.raw.push(
                        slot,
                        Occurrence {
                            role,
                            values: Vec::new(),
                        },
                    );
                }
            }
            return Ok(());
        }

        // unresolved bundle that reads as a negative number
        if value.is_none() && number_shaped(text) && self.scope.has_numeric_positional() {
            return self.handle_value(index, element.os());
        }

        let os = element.os();
        if let Some(sink) = self.unrecognized_sink() {
            self.raw.append(sink, index, os);
            return Ok(());
        }
        Err(Message::UnknownOption {
            text: os.to_string_lossy().into_owned(),
        })
    }

    /// After the last element: default child selection and replay
    fn finish(&mut self) -> Result<(), Message> {
        let cmd = &self.tree.cmds[self.scope.cmd];
        let Some(child) = cmd.default_child else {
            return Ok(());
        };

        let required: usize = self.tree.cmds[child]
            .slots
            .iter()
            .map(|&s| &self.tree.slots[s])
            .filter(|slot| {
                slot.arg.is_positional()
                    && slot.arg.required
                    && !slot.arg.strategy.is_sink()
                    && slot.arg.arity != Arity::Variadic
            })
            .count();
        if self.unclaimed.len() < required {
            match self.deferred_error.take() {
                Some(err) => return Err(err),
                None => return Ok(()),
            }
        }

        self.transition(child);
        self.deferred_error = None;
        let unclaimed = std::mem::take(&mut self.unclaimed);
        for (index, word) in unclaimed {
            self.handle_value(index, word)?;
        }
        Ok(())
    }

    /// Exclusivity and arity verification over the final occurrence lists
    fn verify(&mut self) -> Result<(), Message> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }
        for (&slot_id, occurrences) in &self.raw.slots {
            let slot = &self.tree.slots[slot_id];
            let repeatable = slot.arg.arity == Arity::Variadic
                || matches!(slot.arg.kind, ArgKind::Flag(FlagKind::Counter))
                || matches!(
                    slot.arg.strategy,
                    Strategy::SingleValue | Strategy::UnconditionalSingleValue
                );
            if occurrences.len() > 1
                && !repeatable
                && slot.arg.exclusivity == crate::schema::Exclusivity::Exclusive
            {
                return Err(Message::Repeated { slot: slot_id });
            }
        }
        Ok(())
    }
}
