//! The ACPI namespace tree.
//!
//! A [`Namespace`] owns every entity decoded from the loaded tables in a flat
//! arena. Containment is expressed through [`EntityId`] links: a container
//! lists its children in insertion order and each child records its parent.
//! Parent links are plain ids, so the tree has a single owner and no
//! reference cycles.
//!
//! Lookups by path live in the [`resolve`] submodule.

pub mod resolve;

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};

use crate::entity::{Entity, EntityId};
use crate::path::{AmlPath, NameSeg, PathAnchor};

/// Errors from structural namespace operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceError {
    /// The target parent cannot own children.
    NotAContainer,
    /// The entity already has a parent.
    AlreadyAttached,
    /// The entity is an ancestor of the target parent.
    WouldCycle,
    /// The root scope cannot be attached anywhere.
    RootNotMovable,
    /// The id does not belong to this namespace.
    UnknownEntity,
}

impl fmt::Display for NamespaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAContainer => f.write_str("entity cannot own children"),
            Self::AlreadyAttached => f.write_str("entity is already attached to a scope"),
            Self::WouldCycle => f.write_str("entity is an ancestor of the target scope"),
            Self::RootNotMovable => f.write_str("the root scope cannot be attached"),
            Self::UnknownEntity => f.write_str("unknown entity id"),
        }
    }
}

/// The collected ACPI namespace.
#[derive(Debug)]
pub struct Namespace {
    entities: Vec<Entity>,
    root: EntityId,
}

impl Namespace {
    /// Creates a namespace containing only the root scope `\`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: alloc::vec![Entity::root()],
            root: EntityId::from_index(0),
        }
    }

    /// The root scope.
    #[must_use]
    pub const fn root(&self) -> EntityId {
        self.root
    }

    /// Number of entities in the arena, attached or not.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the entity with the given id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.as_usize())
    }

    /// Returns the entity with the given id mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.as_usize())
    }

    /// Moves a detached entity into the arena.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::from_index(self.entities.len());
        self.entities.push(entity);
        id
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is not a container, `child` already has a parent,
    /// `child` is the root, or `child` is an ancestor of `parent`.
    pub fn append(&mut self, parent: EntityId, child: EntityId) -> Result<(), NamespaceError> {
        let target = self.get(parent).ok_or(NamespaceError::UnknownEntity)?;
        if !target.is_container() {
            return Err(NamespaceError::NotAContainer);
        }
        if child == self.root {
            return Err(NamespaceError::RootNotMovable);
        }
        let entity = self.get(child).ok_or(NamespaceError::UnknownEntity)?;
        if entity.parent.is_some() {
            return Err(NamespaceError::AlreadyAttached);
        }
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(NamespaceError::WouldCycle);
        }

        self[child].parent = Some(parent);
        self[parent].children.push(child);
        log::trace!("aml: attached {} under {}", self.path_of(child), self.path_of(parent));
        Ok(())
    }

    /// Inserts `entity` and attaches it as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`Namespace::append`]. On failure the entity stays detached in the
    /// arena.
    pub fn add(&mut self, parent: EntityId, entity: Entity) -> Result<EntityId, NamespaceError> {
        let id = self.insert(entity);
        self.append(parent, id)?;
        Ok(id)
    }

    /// Detaches `child` from `parent`, leaving it parentless.
    ///
    /// Returns `false` if `child` is not a child of `parent`.
    pub fn remove(&mut self, parent: EntityId, child: EntityId) -> bool {
        let Some(container) = self.get_mut(parent) else {
            return false;
        };
        let Some(pos) = container.children.iter().position(|&c| c == child) else {
            return false;
        };
        container.children.remove(pos);
        self[child].parent = None;
        true
    }

    /// The parent of `id`, or `None` for the root and detached entities.
    #[must_use]
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.get(id).and_then(Entity::parent)
    }

    /// Children of `id` in insertion order.
    #[must_use]
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        match self.get(id) {
            Some(entity) => entity.children(),
            None => &[],
        }
    }

    /// The most recently appended child of `id`.
    #[must_use]
    pub fn last(&self, id: EntityId) -> Option<EntityId> {
        self.get(id).and_then(Entity::last)
    }

    /// Looks up a direct child of `scope` by exact name.
    #[must_use]
    pub fn find_child(&self, scope: EntityId, name: NameSeg) -> Option<EntityId> {
        self.children(scope)
            .iter()
            .copied()
            .find(|&c| self[c].name() == Some(name))
    }

    /// Iterates over the ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: EntityId) -> Ancestors<'_> {
        Ancestors {
            ns: self,
            next: self.parent(id),
        }
    }

    /// Iterates over `start` and all of its descendants in pre-order.
    pub fn walk(&self, start: EntityId) -> Walk<'_> {
        let stack = if self.get(start).is_some() {
            alloc::vec![start]
        } else {
            Vec::new()
        };
        Walk { ns: self, stack }
    }

    /// The scope that names inside `id` are looked up from.
    ///
    /// For an attached entity this is its parent. A term entity held as an
    /// operand of another entity (e.g. the call in `Store (_STA (), Local0)`)
    /// is never attached and takes the scope of its owner instead. Entities
    /// that are neither fall back to the root.
    #[must_use]
    pub fn lexical_scope(&self, id: EntityId) -> EntityId {
        let mut current = id;
        // One hop per entity at most; operand cycles end at the root.
        for _ in 0..self.entities.len() {
            if let Some(parent) = self.parent(current) {
                return parent;
            }
            match self.operand_owner(current) {
                Some(owner) => current = owner,
                None => break,
            }
        }
        self.root
    }

    /// The entity holding `term` as an operand.
    fn operand_owner(&self, term: EntityId) -> Option<EntityId> {
        self.entities
            .iter()
            .position(|e| e.kind().terms().any(|t| t == term))
            .map(EntityId::from_index)
    }

    /// Returns the absolute path of `id`.
    ///
    /// Anonymous entities contribute no segment, so their path is that of
    /// their enclosing scope. Detached subtrees render as relative paths, and
    /// ids that do not belong to this namespace render as an empty one.
    #[must_use]
    pub fn path_of(&self, id: EntityId) -> AmlPath {
        let mut chain: Vec<NameSeg> = core::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&e| e != self.root)
            .filter_map(|e| self.get(e).and_then(Entity::name))
            .collect();
        chain.reverse();

        let attached = id == self.root || self.ancestors(id).any(|a| a == self.root);
        let anchor = if attached { PathAnchor::Root } else { PathAnchor::Relative };
        let mut path = AmlPath::with_anchor(anchor);
        for seg in chain {
            if !path.push(seg) {
                break;
            }
        }
        path
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<EntityId> for Namespace {
    type Output = Entity;

    fn index(&self, id: EntityId) -> &Entity {
        &self.entities[id.as_usize()]
    }
}

impl IndexMut<EntityId> for Namespace {
    fn index_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.as_usize()]
    }
}

/// Iterator over the ancestors of an entity. See [`Namespace::ancestors`].
pub struct Ancestors<'a> {
    ns: &'a Namespace,
    next: Option<EntityId>,
}

impl Iterator for Ancestors<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let current = self.next?;
        self.next = self.ns.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree. See [`Namespace::walk`].
pub struct Walk<'a> {
    ns: &'a Namespace,
    stack: Vec<EntityId>,
}

impl Iterator for Walk<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let current = self.stack.pop()?;
        self.stack.extend(self.ns.children(current).iter().rev());
        Some(current)
    }
}
