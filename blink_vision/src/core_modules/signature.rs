// THEORY:
// A `Signature` is a named, fixed-length blink pattern: six consecutive
// presence flags, oldest first. The `SignatureRegistry` is the table the
// matcher walks every frame. Adding a pattern means registering one more
// entry; the matching algorithm never changes.
//
// Signatures are immutable once built. The registry refuses duplicate names so
// that every match event identifies exactly one pattern.

use crate::core_modules::presence::{PresenceFlag, parse_flags};
use crate::error::ConfigError;
use std::borrow::Cow;

/// Number of flags in every signature, and the lookback of the matcher.
pub const SIGNATURE_LEN: usize = 6;

use PresenceFlag::{Absent as A, Present as P};

/// Built-in patterns recognized by a default registry.
pub const ALELUYA: Signature = Signature::new_static("ALELUYA", [P, A, A, P, A, A]);
pub const GERONIMO: Signature = Signature::new_static("GERONIMO", [P, P, A, P, P, A]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: Cow<'static, str>,
    flags: [PresenceFlag; SIGNATURE_LEN],
}

impl Signature {
    pub const fn new_static(name: &'static str, flags: [PresenceFlag; SIGNATURE_LEN]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            flags,
        }
    }

    pub fn new(name: impl Into<String>, flags: [PresenceFlag; SIGNATURE_LEN]) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            flags,
        }
    }

    /// Builds a signature from a flag string such as `"PPAPPA"`.
    pub fn parse(name: impl Into<String>, pattern: &str) -> Result<Self, ConfigError> {
        let name = name.into();
        let flags = parse_flags(pattern)?;
        let found = flags.len();
        let flags: [PresenceFlag; SIGNATURE_LEN] = flags.try_into().map_err(|_| ConfigError::SignatureLength {
            name: name.clone(),
            expected: SIGNATURE_LEN,
            found,
        })?;
        Ok(Self::new(name, flags))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> &[PresenceFlag; SIGNATURE_LEN] {
        &self.flags
    }
}

/// The ordered set of signatures checked on every step.
#[derive(Debug, Clone)]
pub struct SignatureRegistry {
    signatures: Vec<Signature>,
}

impl Default for SignatureRegistry {
    fn default() -> Self {
        Self {
            signatures: vec![ALELUYA, GERONIMO],
        }
    }
}

impl SignatureRegistry {
    /// An empty registry. Use `Default` for the built-in patterns.
    pub fn new() -> Self {
        Self { signatures: Vec::new() }
    }

    pub fn register(&mut self, signature: Signature) -> Result<(), ConfigError> {
        if self.get(signature.name()).is_some() {
            return Err(ConfigError::DuplicateSignature(signature.name().to_string()));
        }
        self.signatures.push(signature);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_holds_builtin_patterns() {
        let registry = SignatureRegistry::default();
        let names: Vec<_> = registry.iter().map(Signature::name).collect();
        assert_eq!(names, vec!["ALELUYA", "GERONIMO"]);
        assert_eq!(registry.get("GERONIMO").unwrap().flags(), &[P, P, A, P, P, A]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = SignatureRegistry::default();
        let err = registry.register(Signature::parse("ALELUYA", "PPPPPP").unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSignature(name) if name == "ALELUYA"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn parse_checks_length() {
        let err = Signature::parse("SHORT", "PAP").unwrap_err();
        assert!(matches!(err, ConfigError::SignatureLength { found: 3, expected: 6, .. }));
        assert_eq!(Signature::parse("ALT", "PAAPAA").unwrap().flags(), ALELUYA.flags());
    }
}
