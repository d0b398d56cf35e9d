//! User-facing configuration for the rewriter.

use std::collections::BTreeMap;

use runic_core::chars::{
  DEFAULT_LEADER,
  char_is_leader,
};
use serde::Deserialize;
use thiserror::Error;

use crate::table::AbbreviationTable;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("failed to parse abbreviation config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("leader must be a printable ASCII character, got {0:?}")]
  InvalidLeader(char),
}

/// Configuration consumed by a [`Rewriter`](crate::rewriter::Rewriter).
///
/// ```toml
/// leader = "\\"
/// eager-replacement = true
/// languages = ["lean4"]
///
/// [custom-translations]
/// qed = "∎"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AbbreviationConfig {
  /// Character that starts abbreviation tracking.
  pub leader:              char,
  /// Replace as soon as the typed mnemonic uniquely and completely
  /// identifies a symbol, without waiting for a terminating character.
  pub eager_replacement:   bool,
  /// Language identifiers the feature is active for; empty means every
  /// language. Gating happens in the embedder's activation layer, before a
  /// rewriter is ever constructed for a buffer.
  pub languages:           Vec<String>,
  /// User mnemonics merged over the built-in set; later entries win.
  pub custom_translations: BTreeMap<String, String>,
}

impl Default for AbbreviationConfig {
  fn default() -> Self {
    Self {
      leader:              DEFAULT_LEADER,
      eager_replacement:   true,
      languages:           Vec::new(),
      custom_translations: BTreeMap::new(),
    }
  }
}

impl AbbreviationConfig {
  pub fn from_toml(input: &str) -> Result<Self> {
    let config: Self = toml::from_str(input)?;
    if !char_is_leader(config.leader) {
      return Err(ConfigError::InvalidLeader(config.leader));
    }
    Ok(config)
  }

  pub fn is_language_active(&self, language: &str) -> bool {
    self.languages.is_empty() || self.languages.iter().any(|active| active == language)
  }

  /// The built-in table with this config's custom translations on top.
  pub fn build_table(&self) -> AbbreviationTable {
    let mut table = AbbreviationTable::builtin();
    for (mnemonic, replacement) in &self.custom_translations {
      table.insert(mnemonic.clone(), replacement.clone());
    }
    table
  }
}
