//! Diagnostics collected while lowering.
//!
//! The pass never aborts on bad data: it substitutes a sentinel or drops the
//! offending piece and records what happened here. Diagnostics are a plain
//! value returned alongside the result, not a global side channel.

use std::fmt;

/// What kind of degradation or notable event occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagKind {
    /// Blend mode not in the supported-operator table; layer had no effect.
    UnsupportedBlend,
    /// Effect name with no destination-input mapping; stack dropped.
    UnmappedEffect,
    /// Required channel missing; sentinel substituted.
    MissingChannel,
    /// Channel value did not parse or had no usable interpretation for its
    /// destination; a default was substituted or the step skipped.
    MalformedValue,
    /// A variant-specific override changed a value (message pairs old/new).
    OverrideApplied,
    /// A display name was sanitized into a different identifier.
    Renamed,
    /// Material node encountered outside any active material context.
    NoMaterialContext,
    /// Unknown `brdfType`; the configured default variant was used.
    UnknownVariant,
}

impl fmt::Display for DiagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnsupportedBlend => "unsupported-blend",
            Self::UnmappedEffect => "unmapped-effect",
            Self::MissingChannel => "missing-channel",
            Self::MalformedValue => "malformed-value",
            Self::OverrideApplied => "override",
            Self::Renamed => "renamed",
            Self::NoMaterialContext => "no-material-context",
            Self::UnknownVariant => "unknown-variant",
        };
        f.write_str(s)
    }
}

/// One recorded event.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: DiagKind,
    /// Graph or tree path the event is attached to.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path, self.message)
    }
}

/// Ordered collection of diagnostics for one lowering run.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn push(&mut self, kind: DiagKind, path: impl Into<String>, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            kind,
            path: path.into(),
            message: message.into(),
        });
    }

    /// Record an applied override, pairing old and new value.
    pub fn push_override(&mut self, path: impl Into<String>, channel: &str, old: &str, new: &str) {
        self.push(
            DiagKind::OverrideApplied,
            path,
            format!("{channel} from {old} to {new}"),
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries of one kind.
    pub fn count(&self, kind: DiagKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// First entry of one kind, if any.
    pub fn first(&self, kind: DiagKind) -> Option<&Diagnostic> {
        self.entries.iter().find(|d| d.kind == kind)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
