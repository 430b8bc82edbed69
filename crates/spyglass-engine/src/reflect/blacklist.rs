//! Member blacklist
//!
//! Signatures (`Type.Member`) that must never be cached: members known to
//! crash or hang the host when invoked, plus whatever patterns the user adds
//! through configuration. Exact signatures are looked up directly; wildcard
//! patterns are checked in insertion order, first match wins.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Signatures hidden in every session
const BUILTIN_PATTERNS: &[&str] = &[
    "Type.DeclaringMethod",
    "Rigidbody2D.Cast",
    "Collider2D.Cast",
    "Collider2D.Raycast",
    "Texture2D.SetPixelDataImpl",
    "Camera.CalculateProjectionMatrixFromPhysicalProperties",
    "*.Finalize",
    "*.MemberwiseClone",
];

static BUILTIN: Lazy<Blacklist> = Lazy::new(|| {
    let mut blacklist = Blacklist::default();
    for pattern in BUILTIN_PATTERNS {
        blacklist.add(pattern);
    }
    blacklist
});

/// One blacklist pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignaturePattern {
    /// `*`: everything
    Any,
    /// `Type.Member`
    Exact(String),
    /// `Type.*`
    Prefix(String),
    /// `*.Member`
    Suffix(String),
    /// `*text*`
    Contains(String),
}

impl SignaturePattern {
    /// Parse a pattern string
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern == "*" || pattern == "**" {
            return SignaturePattern::Any;
        }

        let leading = pattern.starts_with('*');
        let trailing = pattern.ends_with('*');
        match (leading, trailing) {
            (true, true) => SignaturePattern::Contains(pattern[1..pattern.len() - 1].to_string()),
            (false, true) => SignaturePattern::Prefix(pattern[..pattern.len() - 1].to_string()),
            (true, false) => SignaturePattern::Suffix(pattern[1..].to_string()),
            (false, false) => SignaturePattern::Exact(pattern.to_string()),
        }
    }

    /// Check if a signature matches this pattern
    pub fn matches(&self, signature: &str) -> bool {
        match self {
            SignaturePattern::Any => true,
            SignaturePattern::Exact(s) => signature == s,
            SignaturePattern::Prefix(p) => signature.starts_with(p.as_str()),
            SignaturePattern::Suffix(s) => signature.ends_with(s.as_str()),
            SignaturePattern::Contains(s) => signature.contains(s.as_str()),
        }
    }
}

/// Set of hidden member signatures
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    /// Exact signatures
    exact: FxHashSet<String>,
    /// Wildcard rules
    rules: Vec<SignaturePattern>,
}

impl Blacklist {
    /// Process-wide default list, built on first use
    pub fn builtin() -> &'static Blacklist {
        &BUILTIN
    }

    /// Default list extended with user patterns
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut blacklist = Self::builtin().clone();
        for pattern in patterns {
            blacklist.add(pattern.as_ref());
        }
        blacklist
    }

    /// Add a pattern
    pub fn add(&mut self, pattern: &str) {
        match SignaturePattern::parse(pattern) {
            SignaturePattern::Exact(s) => {
                self.exact.insert(s);
            }
            rule => self.rules.push(rule),
        }
    }

    /// Whether a signature is hidden
    pub fn is_blocked(&self, signature: &str) -> bool {
        self.exact.contains(signature) || self.rules.iter().any(|r| r.matches(signature))
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.exact.len() + self.rules.len()
    }

    /// Check if there are no patterns
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.rules.is_empty()
    }
}

/// Whether a method is the accessor of a property on the same type
/// (`get_Name`/`set_Name`), which the property itself already covers
pub fn is_property_accessor<'a>(
    method_name: &str,
    mut property_names: impl Iterator<Item = &'a str>,
) -> bool {
    let Some(property) = method_name
        .strip_prefix("get_")
        .or_else(|| method_name.strip_prefix("set_"))
    else {
        return false;
    };
    property_names.any(|name| name == property)
}
