//! Constructor argument values.
//!
//! The scanner decodes AML operands into [`AmlArg`] values and feeds them to
//! entities through [`Entity::set_arg`](crate::entity::Entity::set_arg).

use alloc::string::String;
use alloc::vec::Vec;

use crate::entity::EntityId;

/// A decoded operand supplied to an entity during construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AmlArg {
    /// An absent operand (e.g. a `NullName`).
    #[default]
    None,
    /// An integer constant.
    Integer(u64),
    /// A string: either a `StringConst` or a name path awaiting resolution.
    String(String),
    /// Raw bytes, such as a buffer initializer.
    Buffer(Vec<u8>),
    /// A detached term entity, e.g. an expression computing a buffer size.
    Entity(EntityId),
}

impl AmlArg {
    /// Returns the integer payload, if this is an [`AmlArg::Integer`].
    #[must_use]
    pub const fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is an [`AmlArg::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Takes the string payload out of an [`AmlArg::String`].
    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts an integer payload into a narrower type, failing if the
    /// argument is not an integer or does not fit.
    pub(crate) fn narrow<T: TryFrom<u64>>(&self) -> Option<T> {
        self.as_integer().and_then(|v| T::try_from(v).ok())
    }
}

impl From<u64> for AmlArg {
    fn from(v: u64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for AmlArg {
    fn from(s: &str) -> Self {
        Self::String(String::from(s))
    }
}

impl From<String> for AmlArg {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for AmlArg {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<EntityId> for AmlArg {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}
