//! ACPI AML namespace and symbol binding for Hadron OS.
//!
//! The AML scanner turns DSDT/SSDT bytecode into [`Entity`] values and
//! attaches them to a [`Namespace`] as it goes. Each entity takes its
//! decoded operands through [`Entity::set_arg`], which knows how many
//! positional arguments every kind of object consumes. References that may
//! point forward in the table (field regions, method calls, plain name
//! references) are kept by name until the whole table has been read; then
//! [`bind::bind_namespace`] resolves them using the ACPI search rules.
//!
//! # Usage
//!
//! ```
//! use hadron_aml::{AmlArg, Entity, Namespace, TableHandle, bind};
//!
//! let dsdt = TableHandle::new(1);
//! let mut ns = Namespace::new();
//! let (sb, name) = ns.resolve_path(ns.root(), "\\_SB_").unwrap();
//! let sb = ns.add(sb, Entity::scope(dsdt, name)).unwrap();
//!
//! let mut region = Entity::region(dsdt);
//! for (i, arg) in ["REG0".into(), AmlArg::Integer(1), AmlArg::Integer(0x80), AmlArg::Integer(4)]
//!     .into_iter()
//!     .enumerate()
//! {
//!     assert!(region.set_arg(i as u8, arg));
//! }
//! ns.add(sb, region).unwrap();
//!
//! let mut field = Entity::field(dsdt);
//! assert!(field.set_arg(0, "REG0".into()));
//! assert!(field.set_arg(1, AmlArg::Integer(1)));
//! ns.add(sb, field).unwrap();
//!
//! let mut diag = String::new();
//! assert_eq!(bind::bind_namespace(&mut diag, &mut ns), Ok(1));
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod bind;
pub mod entity;
pub mod namespace;
pub mod opcode;
pub mod path;
pub mod value;

pub use bind::{BindError, BindErrorKind, SymbolRole};
pub use entity::{Entity, EntityId, EntityKind, EntityType, TableHandle};
pub use namespace::{Namespace, NamespaceError};
pub use opcode::AmlOpcode;
pub use path::{AmlPath, MAX_PATH_DEPTH, NameSeg, PathAnchor, PathError};
pub use value::AmlArg;
