#![doc = include_str!("../README.md")]

#[cfg(feature = "color")]
#[macro_use]
mod color;
#[cfg(not(feature = "color"))]
#[macro_use]
mod no_color;

mod arg;
mod args;
mod complete;
mod decoder;
mod error;
mod help;
mod lexer;
mod matcher;
mod name;
mod opencli;
mod schema;
mod suggest;
mod usage;
mod validation;

pub use crate::args::Args;
pub use crate::complete::Shell;
pub use crate::decoder::{BindingSource, Bindings, FromValue, Value};
pub use crate::error::ParseFailure;
pub use crate::name::{set_process_convention, Convention, Name, NameKind};
pub use crate::schema::{
    Arg, Arity, Command, CompletionHint, Exclusivity, Group, Inversion, SchemaError, Strategy,
    ValueKind, Visibility,
};
pub use crate::validation::Violation;

#[cfg(test)]
mod tests;

use crate::error::Message;
use crate::schema::Tree;

/// Per parse configuration, read once at entry
///
/// With no explicit convention the process wide knob set through
/// [`set_process_convention`] applies.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub convention: Option<Convention>,
}

/// A compiled, immutable command schema
///
/// Built once with [`Command::to_schema`], reusable (and shareable
/// across threads) for any number of parse invocations. Each invocation
/// owns its own matcher state and diagnostic buffer.
#[derive(Debug)]
pub struct Schema {
    tree: Tree,
    settings: Settings,
}

impl Command {
    /// Compile the command tree, checking every schema invariant
    ///
    /// # Errors
    ///
    /// [`SchemaError`] describes the first construction fault found:
    /// duplicate names, impossible positional orderings, and the rest.
    pub fn to_schema(self) -> Result<Schema, SchemaError> {
        Ok(Schema {
            tree: schema::compile(self)?,
            settings: Settings::default(),
        })
    }

    /// Compile and parse the process arguments, exiting on any failure
    ///
    /// # Panics
    ///
    /// Panics when the schema itself is invalid; that is a bug in the
    /// calling program, not in its input.
    pub fn run(self) -> Resolution {
        match self.to_schema() {
            Ok(schema) => schema.run(),
            Err(err) => panic!("invalid schema: {}", err),
        }
    }
}

/// Successful parse outcome: the resolved command and its typed bindings
#[derive(Debug, Clone)]
pub struct Resolution {
    path: Vec<String>,
    bindings: Bindings,
}

impl Resolution {
    /// Name of the resolved (leaf) command
    pub fn command(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// Command names from the root down to the resolved command
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn into_bindings(self) -> Bindings {
        self.bindings
    }
}

impl Schema {
    /// Override the per parse settings
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Parse the process arguments; print a diagnostic and exit on any
    /// failure or interrupt (help, version, completion)
    pub fn run(&self) -> Resolution {
        match self.run_inner(Args::current_args()) {
            Ok(resolution) => resolution,
            Err(failure) => {
                failure.print_message();
                std::process::exit(failure.exit_code());
            }
        }
    }

    /// Parse the given [`Args`] and produce a value for unit tests or
    /// manual processing
    ///
    /// # Errors
    ///
    /// [`ParseFailure`] covers both genuine errors and interrupts; see
    /// [`ParseFailure::unwrap_stdout`] and
    /// [`ParseFailure::unwrap_stderr`] for test helpers.
    pub fn run_inner(&self, args: Args) -> Result<Resolution, ParseFailure> {
        let convention = self
            .settings
            .convention
            .unwrap_or_else(crate::name::process_convention);

        // completion mode short circuits everything else
        if let Some(first) = args.tokens.first() {
            if first.to_str() == Some(complete::COMPLETE_ARG) {
                let text = complete::candidates(&self.tree, convention, &args.tokens[1..]);
                return Err(ParseFailure::Completion(text));
            }
        }

        let elements = match arg::split_all(&args.tokens, convention) {
            Ok(elements) => elements,
            Err(msg) => return Err(msg.render(&self.tree, 0, convention)),
        };

        let outcome = matcher::Matcher::new(&self.tree, elements, convention)
            .run()
            .map_err(|(msg, cmd)| msg.render(&self.tree, cmd, convention))?;

        let mut bindings = decoder::decode(&self.tree, outcome.cmd, &outcome.raw, &args)
            .map_err(|msg| msg.render(&self.tree, outcome.cmd, convention))?;

        validation::run_hooks(&self.tree, outcome.cmd, &mut bindings)
            .map_err(|msg: Message| msg.render(&self.tree, outcome.cmd, convention))?;

        let path = self
            .tree
            .path(outcome.cmd)
            .into_iter()
            .map(|c| self.tree.cmds[c].name.clone())
            .collect();
        Ok(Resolution { path, bindings })
    }

    /// Completion script for a shell; see the module contract in the
    /// crate docs
    pub fn completion_script(&self, shell: Shell) -> String {
        complete::script(shell, &self.tree.root().name)
    }

    /// The rendered help screen, same text `--help` prints
    pub fn render_help(&self) -> String {
        let convention = self
            .settings
            .convention
            .unwrap_or_else(crate::name::process_convention);
        help::render_help(&self.tree, 0, convention, help::DEFAULT_WIDTH, false)
    }
}
