//! Path resolution and the ACPI namespace search rule.
//!
//! [`Namespace::resolve_path`] answers "where would a new object named by
//! this path live?" and [`Namespace::find`] answers "which existing object
//! does this reference name?". Both share the same addressing rules:
//!
//! - a leading `\` starts at the root;
//! - each leading `^` moves one scope up, and escaping past the root fails;
//! - otherwise resolution starts at the current scope;
//! - dot-separated segments descend one direct child at a time.
//!
//! Only `find` applies the search rule, and only to bare single-segment
//! names: the current scope is checked first, then each ancestor up to and
//! including the root.

use super::Namespace;
use crate::entity::EntityId;
use crate::path::{AmlPath, NameSeg, PathAnchor};

impl Namespace {
    /// Resolves the insertion point for the final segment of `expr`.
    ///
    /// Returns the container that would own the named object together with
    /// its bare name. The final name itself does not need to exist, but every
    /// intermediate segment must. Returns `None` for malformed paths, paths
    /// without a trailing segment (such as `\`), parent escapes past the
    /// root, and missing intermediate scopes.
    #[must_use]
    pub fn resolve_path(&self, scope: EntityId, expr: &str) -> Option<(EntityId, NameSeg)> {
        let path = AmlPath::parse(expr).ok()?;
        let (&name, intermediate) = path.segments().split_last()?;

        let start = self.anchor_scope(scope, &path)?;
        let parent = self.descend(start, intermediate)?;
        self[parent].is_container().then_some((parent, name))
    }

    /// Looks up the entity referenced by `expr` from `scope`.
    ///
    /// Bare names are subject to the ACPI search rule; anything containing
    /// `\`, `^` or `.` is resolved positionally. A path made only of an
    /// anchor (`\`, `^`) names the anchored scope itself.
    #[must_use]
    pub fn find(&self, scope: EntityId, expr: &str) -> Option<EntityId> {
        let path = AmlPath::parse(expr).ok()?;

        if path.is_bare_name() {
            let name = path.segments()[0];
            return core::iter::once(scope)
                .chain(self.ancestors(scope))
                .find_map(|s| self.find_child(s, name));
        }

        let start = self.anchor_scope(scope, &path)?;
        match path.segments().split_last() {
            None => Some(start),
            Some((&name, intermediate)) => {
                let parent = self.descend(start, intermediate)?;
                self.find_child(parent, name)
            }
        }
    }

    /// Applies the anchor of `path` to `scope`.
    fn anchor_scope(&self, scope: EntityId, path: &AmlPath) -> Option<EntityId> {
        match path.anchor() {
            PathAnchor::Relative => self.get(scope).map(|_| scope),
            PathAnchor::Root => Some(self.root),
            PathAnchor::Parent(depth) => self.ancestors(scope).nth(depth.checked_sub(1)?),
        }
    }

    /// Follows `segments` as direct children starting at `from`.
    fn descend(&self, from: EntityId, segments: &[NameSeg]) -> Option<EntityId> {
        segments
            .iter()
            .try_fold(from, |current, &seg| self.find_child(current, seg))
    }
}
