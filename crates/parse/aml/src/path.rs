//! AML name segments and path expressions.
//!
//! ACPI names are composed of 4-byte segments. A path expression is an
//! optional anchor (`\` for the root, one or more `^` for parent escapes)
//! followed by dot-separated segments, e.g. `\_SB_.PCI0._CRS` or `^^FOO`.
//! Paths hold up to 16 segments inline, which covers all practical ACPI
//! namespace depths.

use core::fmt;
use core::str::FromStr;

/// One four-character component of an ACPI name, such as `_SB_` or `_HID`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameSeg(pub [u8; 4]);

impl NameSeg {
    /// The name of the synthetic namespace root, `\`.
    ///
    /// Never produced by parsing, so it cannot collide with a declared name.
    pub const ROOT: Self = Self(*b"\\\0\0\0");

    /// Padding byte used to extend short ASL names to four characters.
    const PAD: u8 = b'_';

    /// Takes the first four bytes of `bytes` as a raw segment, as encoded in
    /// AML `NameSeg` operands. Returns `None` for shorter input.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let seg: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(Self(seg))
    }

    /// Returns the name as a string slice (ACPI names are always ASCII).
    #[must_use]
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(4);
        core::str::from_utf8(&self.0[..len]).unwrap_or("")
    }
}

impl FromStr for NameSeg {
    type Err = PathError;

    /// Parses a textual segment of 1 to 4 characters, padding with `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return Err(PathError::EmptySegment);
        }
        if bytes.len() > 4 || !bytes.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(PathError::InvalidSegment);
        }

        let mut seg = [Self::PAD; 4];
        seg[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(seg))
    }
}

impl fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameSeg(\"{}\")", self.as_str())
    }
}

impl fmt::Display for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while parsing a path expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// The expression was empty.
    Empty,
    /// A segment between separators was empty (e.g. `A..B` or `A.`).
    EmptySegment,
    /// A segment was longer than 4 characters or contained an invalid byte.
    InvalidSegment,
    /// The path had more than [`MAX_PATH_DEPTH`] segments.
    TooDeep,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty path expression"),
            Self::EmptySegment => f.write_str("empty name segment"),
            Self::InvalidSegment => f.write_str("invalid name segment"),
            Self::TooDeep => f.write_str("path exceeds maximum depth"),
        }
    }
}

/// Where resolution of a path starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAnchor {
    /// No prefix: start at the current scope.
    Relative,
    /// `\` prefix: start at the namespace root.
    Root,
    /// One or more `^` prefixes: move that many scopes up first.
    Parent(usize),
}

/// Number of segments an [`AmlPath`] can hold.
pub const MAX_PATH_DEPTH: usize = 16;

/// A parsed AML name string.
///
/// Stores up to [`MAX_PATH_DEPTH`] (16) segments inline together with the
/// anchor the segments are relative to.
#[derive(Clone, Copy)]
pub struct AmlPath {
    anchor: PathAnchor,
    segments: [NameSeg; MAX_PATH_DEPTH],
    len: u8,
}

impl AmlPath {
    /// The root path (`\`).
    pub const ROOT: Self = Self {
        anchor: PathAnchor::Root,
        segments: [NameSeg(*b"____"); MAX_PATH_DEPTH],
        len: 0,
    };

    /// Creates an empty absolute path.
    #[must_use]
    pub const fn new() -> Self {
        Self::ROOT
    }

    /// Creates an empty path with the given anchor.
    #[must_use]
    pub const fn with_anchor(anchor: PathAnchor) -> Self {
        Self {
            anchor,
            ..Self::ROOT
        }
    }

    /// Parses a textual path expression.
    ///
    /// An anchor alone (`\`, `^`, `^^`) is a valid path with no segments.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the expression is empty, contains an empty
    /// or malformed segment, or is deeper than [`MAX_PATH_DEPTH`].
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        if expr.is_empty() {
            return Err(PathError::Empty);
        }

        let (anchor, rest) = if let Some(rest) = expr.strip_prefix('\\') {
            (PathAnchor::Root, rest)
        } else {
            let rest = expr.trim_start_matches('^');
            match expr.len() - rest.len() {
                0 => (PathAnchor::Relative, rest),
                n => (PathAnchor::Parent(n), rest),
            }
        };

        let mut path = Self::with_anchor(anchor);
        if rest.is_empty() {
            return Ok(path);
        }
        for seg in rest.split('.') {
            if !path.push(seg.parse()?) {
                return Err(PathError::TooDeep);
            }
        }
        Ok(path)
    }

    /// Returns the anchor of this path.
    #[must_use]
    pub const fn anchor(&self) -> PathAnchor {
        self.anchor
    }

    /// Returns `true` if this path is a single unanchored segment, the only
    /// form the ACPI search rule applies to.
    #[must_use]
    pub fn is_bare_name(&self) -> bool {
        self.anchor == PathAnchor::Relative && self.len == 1
    }

    /// Appends `seg`, returning `false` if the path is full.
    pub fn push(&mut self, seg: NameSeg) -> bool {
        if (self.len as usize) >= MAX_PATH_DEPTH {
            return false;
        }
        self.segments[self.len as usize] = seg;
        self.len += 1;
        true
    }

    /// Drops the trailing segment.
    pub fn pop(&mut self) -> Option<NameSeg> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.segments[self.len as usize])
    }

    /// The segments after the anchor.
    #[must_use]
    pub fn segments(&self) -> &[NameSeg] {
        &self.segments[..self.len as usize]
    }

    /// Number of segments, not counting the anchor.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.len as usize
    }
}

impl PartialEq for AmlPath {
    fn eq(&self, other: &Self) -> bool {
        self.anchor == other.anchor && self.segments() == other.segments()
    }
}

impl Eq for AmlPath {}

impl Default for AmlPath {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AmlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AmlPath({self})")
    }
}

impl fmt::Display for AmlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            PathAnchor::Relative => {}
            PathAnchor::Root => f.write_str("\\")?,
            PathAnchor::Parent(n) => {
                for _ in 0..n {
                    f.write_str("^")?;
                }
            }
        }
        for (i, seg) in self.segments().iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}
