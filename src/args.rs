//! Input to a parse run: the raw token sequence plus an environment
//! snapshot
//!
//! Both are captured up front; nothing is read from the process once
//! matching begins. The `From` impls make tests read naturally:
//! `schema.run_inner(Args::from(&["--name", "alpha"]))`.

use std::collections::BTreeMap;
use std::ffi::OsString;

/// All inputs of a single parse invocation
#[derive(Debug, Clone, Default)]
pub struct Args {
    pub(crate) tokens: Vec<OsString>,
    pub(crate) env: BTreeMap<String, String>,
}

impl<const N: usize> From<&[&str; N]> for Args {
    fn from(tokens: &[&str; N]) -> Self {
        Args::from(&tokens[..])
    }
}

impl From<&[&str]> for Args {
    fn from(tokens: &[&str]) -> Self {
        Args {
            tokens: tokens.iter().map(OsString::from).collect(),
            env: BTreeMap::new(),
        }
    }
}

impl From<&[OsString]> for Args {
    fn from(tokens: &[OsString]) -> Self {
        Args {
            tokens: tokens.to_vec(),
            env: BTreeMap::new(),
        }
    }
}

impl Args {
    /// Capture the process arguments (without the program name) and the
    /// process environment
    pub fn current_args() -> Self {
        let mut tokens: Vec<OsString> = std::env::args_os().collect();
        if !tokens.is_empty() {
            tokens.remove(0);
        }
        Args {
            tokens,
            env: std::env::vars().collect(),
        }
    }

    /// Replace the environment snapshot, mostly for tests
    #[must_use]
    pub fn with_env<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub(crate) fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}
