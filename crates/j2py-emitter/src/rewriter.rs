//! Final pattern substitutions over the rendered program text.

use j2py_common::{Config, keys};
use regex::Regex;
use tracing::debug;

use crate::error::BuildError;

/// Ordered regex substitutions applied to the complete output.
///
/// Rules run in configuration order; each sees the output of the previous
/// one. Replacements use `$1` / `${name}` group references.
#[derive(Debug, Clone, Default)]
pub struct OutputRewriter {
    rules: Vec<(Regex, String)>,
}

impl OutputRewriter {
    pub fn new(
        rules: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, BuildError> {
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(index, (pattern, replacement))| {
                Regex::new(&pattern)
                    .map(|regex| (regex, replacement))
                    .map_err(|err| BuildError::InvalidRewriteRule {
                        index,
                        pattern,
                        message: err.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = rules.len(), "compiled output substitutions");
        Ok(OutputRewriter { rules })
    }

    /// Compile the combined `outputSubs` pairs of `config`.
    pub fn from_config(config: &Config) -> Result<Self, BuildError> {
        OutputRewriter::new(config.combined_pairs(keys::OUTPUT_SUBS))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, (regex, replacement)| {
                regex.replace_all(&acc, replacement.as_str()).into_owned()
            })
    }
}

#[cfg(test)]
#[path = "../tests/rewriter_tests.rs"]
mod rewriter_tests;
