/// The leader character that starts abbreviation tracking unless the
/// embedder configures another one.
pub const DEFAULT_LEADER: char = '\\';

/// True for characters that may appear inside a mnemonic. Mnemonics are
/// short ASCII sequences (`alpha`, `to`, `l=`, `\`), so anything printable
/// and non-whitespace qualifies.
#[inline]
pub fn char_is_mnemonic(ch: char) -> bool {
  ch.is_ascii_graphic()
}

/// True for characters that can act as the leader. Single printable ASCII
/// character, same class as mnemonics.
#[inline]
pub fn char_is_leader(ch: char) -> bool {
  ch.is_ascii_graphic()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mnemonic_chars() {
    assert!(char_is_mnemonic('a'));
    assert!(char_is_mnemonic('0'));
    assert!(char_is_mnemonic('='));
    assert!(char_is_mnemonic('\\'));
    assert!(!char_is_mnemonic(' '));
    assert!(!char_is_mnemonic('\n'));
    assert!(!char_is_mnemonic('α'));
  }

  #[test]
  fn leader_chars() {
    assert!(char_is_leader(DEFAULT_LEADER));
    assert!(char_is_leader(','));
    assert!(!char_is_leader('\t'));
  }
}
