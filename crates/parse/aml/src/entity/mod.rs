//! The polymorphic AML entity model.
//!
//! Every decoded AML construct becomes an [`Entity`]: a common header
//! (opcode, owning table, optional name, parent link, children for
//! containers) plus a kind-specific [`EntityKind`] payload. Entities live in a
//! [`Namespace`](crate::namespace::Namespace) arena and refer to each other
//! through [`EntityId`]s, so parent links never own their target.
//!
//! The scanner feeds decoded operands to an entity with [`Entity::set_arg`].
//! Each kind consumes a fixed number of positional arguments; once a kind
//! rejects an argument, the entity rejects every later one too.

pub mod kind;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

pub use kind::{
    AccessType, BankField, Buffer, BufferField, Const, EntityKind, EntityType, Field, FieldFlags,
    FieldUnit, Generic, IndexField, Invocation, MAX_METHOD_ARGS, Method, MethodFlags, Mutex,
    PowerResource, Processor, Reference, Region, RegionSpace, UpdateRule,
};

use kind::Intake;

use crate::opcode::AmlOpcode;
use crate::path::NameSeg;
use crate::value::AmlArg;

/// Identifier of the ACPI table an entity was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TableHandle(u8);

impl TableHandle {
    /// Handle reserved for the synthetic namespace root.
    pub const ROOT: Self = Self(0);

    /// Creates a new `TableHandle`.
    #[must_use]
    pub const fn new(val: u8) -> Self {
        Self(val)
    }

    /// Returns the raw `u8` value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of an entity in its namespace arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Returns the arena index (convenience for indexing).
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the decoded AML object tree.
#[derive(Debug, Clone)]
pub struct Entity {
    opcode: AmlOpcode,
    table: TableHandle,
    name: Option<NameSeg>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    args_closed: bool,
    kind: EntityKind,
}

impl Entity {
    fn new(opcode: AmlOpcode, table: TableHandle, name: Option<NameSeg>, kind: EntityKind) -> Self {
        Self {
            opcode,
            table,
            name,
            parent: None,
            children: Vec::new(),
            args_closed: false,
            kind,
        }
    }

    /// The synthetic `\` scope.
    pub(crate) fn root() -> Self {
        Self::new(AmlOpcode::SCOPE, TableHandle::ROOT, Some(NameSeg::ROOT), EntityKind::Scope)
    }

    /// An untyped entity that retains every argument.
    #[must_use]
    pub fn generic(opcode: AmlOpcode, table: TableHandle) -> Self {
        Self::new(opcode, table, None, EntityKind::Generic(Generic::default()))
    }

    /// An untyped entity whose first argument is its name.
    #[must_use]
    pub fn generic_named(opcode: AmlOpcode, table: TableHandle) -> Self {
        Self::new(opcode, table, None, EntityKind::GenericNamed(Generic::default()))
    }

    /// A data constant with an initial value.
    #[must_use]
    pub fn constant(opcode: AmlOpcode, table: TableHandle, value: AmlArg) -> Self {
        Self::new(opcode, table, None, EntityKind::Const(Const { value }))
    }

    /// A `DefScope`.
    #[must_use]
    pub fn scope(table: TableHandle, name: NameSeg) -> Self {
        Self::new(AmlOpcode::SCOPE, table, Some(name), EntityKind::Scope)
    }

    /// A `DefDevice`.
    #[must_use]
    pub fn device(table: TableHandle, name: NameSeg) -> Self {
        Self::new(AmlOpcode::DEVICE, table, Some(name), EntityKind::Device)
    }

    /// A `DefThermalZone`.
    #[must_use]
    pub fn thermal_zone(table: TableHandle, name: NameSeg) -> Self {
        Self::new(AmlOpcode::THERMAL_ZONE, table, Some(name), EntityKind::ThermalZone)
    }

    /// A `DefProcessor`.
    #[must_use]
    pub fn processor(table: TableHandle, name: NameSeg) -> Self {
        let kind = EntityKind::Processor(Processor::default());
        Self::new(AmlOpcode::PROCESSOR, table, Some(name), kind)
    }

    /// A `DefPowerRes`.
    #[must_use]
    pub fn power_resource(table: TableHandle, name: NameSeg) -> Self {
        let kind = EntityKind::PowerResource(PowerResource::default());
        Self::new(AmlOpcode::POWER_RES, table, Some(name), kind)
    }

    /// A `DefMethod`.
    #[must_use]
    pub fn method(table: TableHandle, name: NameSeg) -> Self {
        Self::new(AmlOpcode::METHOD, table, Some(name), EntityKind::Method(Method::default()))
    }

    /// A `DefBuffer`.
    #[must_use]
    pub fn buffer(table: TableHandle) -> Self {
        Self::new(AmlOpcode::BUFFER, table, None, EntityKind::Buffer(Buffer::default()))
    }

    /// A `Create*Field` buffer field.
    ///
    /// The fixed-width opcodes imply the field width; any other opcode takes
    /// the width as an argument, like `CreateField`.
    #[must_use]
    pub fn buffer_field(opcode: AmlOpcode, table: TableHandle) -> Self {
        let kind = EntityKind::buffer_field(opcode.fixed_field_width());
        Self::new(opcode, table, None, kind)
    }

    /// A `DefOpRegion`.
    #[must_use]
    pub fn region(table: TableHandle) -> Self {
        Self::new(AmlOpcode::OP_REGION, table, None, EntityKind::Region(Region::default()))
    }

    /// A `DefMutex`.
    #[must_use]
    pub fn mutex(table: TableHandle) -> Self {
        Self::new(AmlOpcode::MUTEX, table, None, EntityKind::Mutex(Mutex::default()))
    }

    /// A `DefEvent`.
    #[must_use]
    pub fn event(table: TableHandle) -> Self {
        Self::new(AmlOpcode::EVENT, table, None, EntityKind::Event)
    }

    /// A `DefField`.
    #[must_use]
    pub fn field(table: TableHandle) -> Self {
        Self::new(AmlOpcode::FIELD, table, None, EntityKind::Field(Field::default()))
    }

    /// A `DefIndexField`.
    #[must_use]
    pub fn index_field(table: TableHandle) -> Self {
        let kind = EntityKind::IndexField(IndexField::default());
        Self::new(AmlOpcode::INDEX_FIELD, table, None, kind)
    }

    /// A `DefBankField`.
    #[must_use]
    pub fn bank_field(table: TableHandle) -> Self {
        let kind = EntityKind::BankField(BankField::default());
        Self::new(AmlOpcode::BANK_FIELD, table, None, kind)
    }

    /// A named field unit.
    #[must_use]
    pub fn field_unit(table: TableHandle, name: NameSeg) -> Self {
        let kind = EntityKind::FieldUnit(FieldUnit::default());
        Self::new(AmlOpcode::FIELD_UNIT, table, Some(name), kind)
    }

    /// A reference to the object at `target_name`.
    #[must_use]
    pub fn reference(table: TableHandle, target_name: impl Into<String>) -> Self {
        let kind = EntityKind::Reference(Reference {
            target_name: target_name.into(),
            target: None,
        });
        Self::new(AmlOpcode::NAME_REFERENCE, table, None, kind)
    }

    /// A call to the method at `method_name`.
    #[must_use]
    pub fn invocation(table: TableHandle, method_name: impl Into<String>) -> Self {
        let kind = EntityKind::Invocation(Invocation {
            method_name: method_name.into(),
            ..Invocation::default()
        });
        Self::new(AmlOpcode::METHOD_INVOCATION, table, None, kind)
    }

    /// The opcode this entity was decoded from.
    #[must_use]
    pub const fn opcode(&self) -> AmlOpcode {
        self.opcode
    }

    /// The table this entity was decoded from.
    #[must_use]
    pub const fn table(&self) -> TableHandle {
        self.table
    }

    /// The entity's name, or `None` for anonymous entities.
    #[must_use]
    pub const fn name(&self) -> Option<NameSeg> {
        self.name
    }

    /// Assigns a name to an anonymous entity.
    ///
    /// Returns `false` if the entity is already named.
    pub fn set_name(&mut self, name: NameSeg) -> bool {
        if self.name.is_some() {
            return false;
        }
        self.name = Some(name);
        true
    }

    /// The container currently holding this entity.
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Child entities in insertion order; empty for non-containers.
    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// The most recently appended child.
    #[must_use]
    pub fn last(&self) -> Option<EntityId> {
        self.children.last().copied()
    }

    /// Returns `true` if this entity can own children.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// The kind tag of this entity.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    /// The kind-specific payload.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    /// The field unit payload, for the scanner to fill in from the field
    /// list. `None` for any other kind.
    pub fn field_unit_mut(&mut self) -> Option<&mut FieldUnit> {
        match &mut self.kind {
            EntityKind::FieldUnit(unit) => Some(unit),
            _ => None,
        }
    }

    /// Offers the `index`-th constructor argument to this entity.
    ///
    /// Returns `false` once the entity's kind has consumed every argument it
    /// understands, or if `arg` has the wrong value kind. A rejection is
    /// permanent: every later call returns `false` as well.
    pub fn set_arg(&mut self, index: u8, arg: AmlArg) -> bool {
        if self.args_closed {
            return false;
        }

        let accepted = match self.kind.set_arg(index, arg) {
            Intake::Accepted => true,
            Intake::Name(name) => self.set_name(name),
            Intake::Rejected => false,
        };
        self.args_closed = !accepted;
        accepted
    }

    /// The externally visible constructor arguments, in order.
    #[must_use]
    pub fn args(&self) -> &[AmlArg] {
        self.kind.args()
    }
}
