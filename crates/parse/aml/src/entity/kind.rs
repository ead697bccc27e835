//! Kind-specific entity payloads and their argument-intake policies.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::EntityId;
use crate::path::NameSeg;
use crate::value::AmlArg;

/// ACPI methods accept at most seven arguments (`Arg0`..`Arg6`).
pub const MAX_METHOD_ARGS: usize = 7;

/// Outcome of offering one argument to a kind.
pub(crate) enum Intake {
    /// The argument was consumed.
    Accepted,
    /// The argument names the entity.
    Name(NameSeg),
    /// The kind takes no further arguments, or the value had the wrong type.
    Rejected,
}

impl Intake {
    fn from_bool(ok: bool) -> Self {
        if ok { Self::Accepted } else { Self::Rejected }
    }

    fn name(arg: &AmlArg) -> Self {
        match arg.as_str().map(str::parse::<NameSeg>) {
            Some(Ok(seg)) => Self::Name(seg),
            _ => Self::Rejected,
        }
    }

    fn store<T>(slot: &mut T, value: Option<T>) -> Self {
        match value {
            Some(v) => {
                *slot = v;
                Self::Accepted
            }
            None => Self::Rejected,
        }
    }
}

bitflags::bitflags! {
    /// The `MethodFlags` byte of a `DefMethod`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MethodFlags: u8 {
        /// Number of arguments (bits 0-2).
        const ARG_COUNT = 0b0000_0111;
        /// The method is serialized.
        const SERIALIZED = 1 << 3;
        /// Synchronization level (bits 4-7).
        const SYNC_LEVEL = 0b1111_0000;
    }
}

impl MethodFlags {
    /// Number of arguments the method takes.
    #[must_use]
    pub const fn arg_count(self) -> u8 {
        self.bits() & Self::ARG_COUNT.bits()
    }

    /// Whether invocations of the method are serialized.
    #[must_use]
    pub const fn serialized(self) -> bool {
        self.contains(Self::SERIALIZED)
    }

    /// Synchronization level of a serialized method.
    #[must_use]
    pub const fn sync_level(self) -> u8 {
        self.bits() >> 4
    }
}

bitflags::bitflags! {
    /// The `FieldFlags` byte shared by `Field`, `IndexField` and `BankField`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u8 {
        /// Access type (bits 0-3).
        const ACCESS_TYPE = 0b0000_1111;
        /// The global lock must be held while accessing the field.
        const LOCK = 1 << 4;
        /// Update rule (bits 5-6).
        const UPDATE_RULE = 0b0110_0000;
    }
}

impl FieldFlags {
    /// Decodes the access type.
    #[must_use]
    pub const fn access_type(self) -> AccessType {
        match self.bits() & Self::ACCESS_TYPE.bits() {
            0 => AccessType::Any,
            1 => AccessType::Byte,
            2 => AccessType::Word,
            3 => AccessType::DWord,
            4 => AccessType::QWord,
            5 => AccessType::Buffer,
            other => AccessType::Reserved(other),
        }
    }

    /// Decodes the update rule.
    #[must_use]
    pub const fn update_rule(self) -> UpdateRule {
        match (self.bits() & Self::UPDATE_RULE.bits()) >> 5 {
            0 => UpdateRule::Preserve,
            1 => UpdateRule::WriteAsOnes,
            2 => UpdateRule::WriteAsZeros,
            _ => UpdateRule::Reserved,
        }
    }
}

/// Field access width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    /// Any access width.
    Any,
    /// 8-bit accesses.
    Byte,
    /// 16-bit accesses.
    Word,
    /// 32-bit accesses.
    DWord,
    /// 64-bit accesses.
    QWord,
    /// Buffer accesses.
    Buffer,
    /// A reserved encoding.
    Reserved(u8),
}

/// How bits not covered by a field write are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    /// Preserve the other bits.
    Preserve,
    /// Write the other bits as ones.
    WriteAsOnes,
    /// Write the other bits as zeros.
    WriteAsZeros,
    /// The reserved encoding `3`.
    Reserved,
}

/// Address space of an operation region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionSpace {
    /// System memory.
    #[default]
    SystemMemory,
    /// System I/O ports.
    SystemIo,
    /// PCI configuration space.
    PciConfig,
    /// Embedded controller.
    EmbeddedControl,
    /// SMBus.
    SmBus,
    /// CMOS.
    SystemCmos,
    /// PCI BAR target.
    PciBarTarget,
    /// IPMI.
    Ipmi,
    /// General purpose I/O.
    GeneralPurposeIo,
    /// Generic serial bus.
    GenericSerialBus,
    /// Platform communications channel.
    Pcc,
    /// An OEM-defined (`0x80..=0xFF`) or reserved space id.
    Other(u8),
}

impl From<u8> for RegionSpace {
    fn from(id: u8) -> Self {
        match id {
            0x00 => Self::SystemMemory,
            0x01 => Self::SystemIo,
            0x02 => Self::PciConfig,
            0x03 => Self::EmbeddedControl,
            0x04 => Self::SmBus,
            0x05 => Self::SystemCmos,
            0x06 => Self::PciBarTarget,
            0x07 => Self::Ipmi,
            0x08 => Self::GeneralPurposeIo,
            0x09 => Self::GenericSerialBus,
            0x0A => Self::Pcc,
            other => Self::Other(other),
        }
    }
}

/// Retained arguments of an untyped opcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generic {
    /// Arguments in the order they were supplied.
    pub args: Vec<AmlArg>,
}

/// A data constant (`Zero`, `One`, `DwordConst`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Const {
    /// The constant's value.
    pub value: AmlArg,
}

/// A `DefProcessor`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Processor {
    /// Processor id.
    pub id: u8,
    /// Address of the processor control block.
    pub pblk_addr: u32,
    /// Length of the processor control block.
    pub pblk_len: u8,
}

/// A `DefPowerRes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerResource {
    /// Deepest system sleep level the resource must stay on for.
    pub system_level: u8,
    /// Order in which resources are toggled.
    pub resource_order: u16,
}

/// A `DefMethod`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Method {
    /// Decoded method flags.
    pub flags: MethodFlags,
}

/// A `DefBuffer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    /// Declared buffer size (an integer or a size expression).
    pub size: AmlArg,
    /// Initializer bytes.
    pub data: Vec<u8>,
}

/// A `Create*Field` buffer field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferField {
    /// The buffer the field is carved from.
    pub source: AmlArg,
    /// Bit index for `CreateBitField`/`CreateField`, byte index otherwise.
    pub index: AmlArg,
    /// Field width in bits.
    pub bit_width: AmlArg,
    fixed_width: Option<u8>,
}

impl BufferField {
    fn new(fixed_width: Option<u8>) -> Self {
        Self {
            source: AmlArg::None,
            index: AmlArg::None,
            bit_width: fixed_width.map_or(AmlArg::None, |w| AmlArg::Integer(u64::from(w))),
            fixed_width,
        }
    }

    /// Returns `true` if `index` counts bits rather than bytes.
    #[must_use]
    pub const fn bit_indexed(&self) -> bool {
        matches!(self.fixed_width, None | Some(1))
    }

    fn set_arg(&mut self, index: u8, arg: AmlArg) -> Intake {
        match (index, self.fixed_width) {
            (0, _) => {
                self.source = arg;
                Intake::Accepted
            }
            (1, _) => {
                self.index = arg;
                Intake::Accepted
            }
            (2, Some(_)) | (3, None) => Intake::name(&arg),
            (2, None) => {
                self.bit_width = arg;
                Intake::Accepted
            }
            _ => Intake::Rejected,
        }
    }
}

/// A `DefOpRegion`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    /// Address space the region lives in.
    pub space: RegionSpace,
    /// Region offset (an integer or an expression).
    pub offset: AmlArg,
    /// Region length (an integer or an expression).
    pub len: AmlArg,
}

/// A `DefMutex`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mutex {
    /// Synchronization level (0-15).
    pub sync_level: u8,
}

/// A `DefField` whose units live in an operation region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    /// Path of the region, resolved by the binder.
    pub region_name: String,
    /// Field flags.
    pub flags: FieldFlags,
    pub(crate) region: Option<EntityId>,
}

impl Field {
    /// The bound region.
    #[must_use]
    pub const fn region(&self) -> Option<EntityId> {
        self.region
    }
}

/// A `DefIndexField` accessed through an index/data register pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexField {
    /// Path of the index register field unit.
    pub index_reg_name: String,
    /// Path of the data register field unit.
    pub data_reg_name: String,
    /// Field flags.
    pub flags: FieldFlags,
    pub(crate) index_reg: Option<EntityId>,
    pub(crate) data_reg: Option<EntityId>,
}

impl IndexField {
    /// The bound index register.
    #[must_use]
    pub const fn index_reg(&self) -> Option<EntityId> {
        self.index_reg
    }

    /// The bound data register.
    #[must_use]
    pub const fn data_reg(&self) -> Option<EntityId> {
        self.data_reg
    }
}

/// A `DefBankField` selected by writing a bank register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankField {
    /// Path of the region.
    pub region_name: String,
    /// Path of the bank register field unit.
    pub bank_reg_name: String,
    /// Value written to the bank register to select this bank.
    pub bank_value: AmlArg,
    /// Field flags.
    pub flags: FieldFlags,
    pub(crate) region: Option<EntityId>,
    pub(crate) bank_reg: Option<EntityId>,
}

impl BankField {
    /// The bound region.
    #[must_use]
    pub const fn region(&self) -> Option<EntityId> {
        self.region
    }

    /// The bound bank register.
    #[must_use]
    pub const fn bank_reg(&self) -> Option<EntityId> {
        self.bank_reg
    }
}

/// A named unit of a `Field`, `IndexField` or `BankField`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldUnit {
    /// Offset of the unit in bits.
    pub bit_offset: u32,
    /// Width of the unit in bits.
    pub bit_width: u32,
    /// Flags inherited from the declaring field.
    pub flags: FieldFlags,
    /// Access attribute set by a preceding `AccessAs`, if any.
    pub access_attrib: Option<u8>,
    /// Path of a `Connection()` resource, if the unit declares one.
    pub connection_name: Option<String>,
    pub(crate) connection: Option<EntityId>,
}

impl FieldUnit {
    /// The bound connection resource.
    #[must_use]
    pub const fn connection(&self) -> Option<EntityId> {
        self.connection
    }
}

/// A reference to another namespace object by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// Path of the referenced object.
    pub target_name: String,
    pub(crate) target: Option<EntityId>,
}

impl Reference {
    /// The bound target.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }
}

/// A call to a control method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Path of the invoked method.
    pub method_name: String,
    /// Argument terms of the call.
    pub args: Vec<AmlArg>,
    pub(crate) method: Option<EntityId>,
}

impl Invocation {
    /// The bound method definition.
    #[must_use]
    pub const fn method(&self) -> Option<EntityId> {
        self.method
    }
}

/// Kind tag of an entity, used for kind checks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EntityType {
    Generic,
    GenericNamed,
    Const,
    Scope,
    Device,
    ThermalZone,
    Processor,
    PowerResource,
    Method,
    Buffer,
    BufferField,
    Region,
    Mutex,
    Event,
    Field,
    IndexField,
    BankField,
    FieldUnit,
    Reference,
    Invocation,
}

impl EntityType {
    /// Human-readable kind name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::GenericNamed => "GenericNamed",
            Self::Const => "Const",
            Self::Scope => "Scope",
            Self::Device => "Device",
            Self::ThermalZone => "ThermalZone",
            Self::Processor => "Processor",
            Self::PowerResource => "PowerResource",
            Self::Method => "Method",
            Self::Buffer => "Buffer",
            Self::BufferField => "BufferField",
            Self::Region => "Region",
            Self::Mutex => "Mutex",
            Self::Event => "Event",
            Self::Field => "Field",
            Self::IndexField => "IndexField",
            Self::BankField => "BankField",
            Self::FieldUnit => "FieldUnit",
            Self::Reference => "Reference",
            Self::Invocation => "Invocation",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific payload of an [`Entity`](super::Entity).
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum EntityKind {
    Generic(Generic),
    GenericNamed(Generic),
    Const(Const),
    Scope,
    Device,
    ThermalZone,
    Processor(Processor),
    PowerResource(PowerResource),
    Method(Method),
    Buffer(Buffer),
    BufferField(BufferField),
    Region(Region),
    Mutex(Mutex),
    Event,
    Field(Field),
    IndexField(IndexField),
    BankField(BankField),
    FieldUnit(FieldUnit),
    Reference(Reference),
    Invocation(Invocation),
}

impl EntityKind {
    pub(crate) fn buffer_field(fixed_width: Option<u8>) -> Self {
        Self::BufferField(BufferField::new(fixed_width))
    }

    /// Returns the kind tag.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Generic(_) => EntityType::Generic,
            Self::GenericNamed(_) => EntityType::GenericNamed,
            Self::Const(_) => EntityType::Const,
            Self::Scope => EntityType::Scope,
            Self::Device => EntityType::Device,
            Self::ThermalZone => EntityType::ThermalZone,
            Self::Processor(_) => EntityType::Processor,
            Self::PowerResource(_) => EntityType::PowerResource,
            Self::Method(_) => EntityType::Method,
            Self::Buffer(_) => EntityType::Buffer,
            Self::BufferField(_) => EntityType::BufferField,
            Self::Region(_) => EntityType::Region,
            Self::Mutex(_) => EntityType::Mutex,
            Self::Event => EntityType::Event,
            Self::Field(_) => EntityType::Field,
            Self::IndexField(_) => EntityType::IndexField,
            Self::BankField(_) => EntityType::BankField,
            Self::FieldUnit(_) => EntityType::FieldUnit,
            Self::Reference(_) => EntityType::Reference,
            Self::Invocation(_) => EntityType::Invocation,
        }
    }

    /// Returns `true` for kinds that own child entities.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Scope
                | Self::Device
                | Self::ThermalZone
                | Self::Processor(_)
                | Self::PowerResource(_)
                | Self::Method(_)
        )
    }

    /// Returns `true` if the kind carries references the binder must resolve.
    #[must_use]
    pub const fn needs_binding(&self) -> bool {
        match self {
            Self::Field(_)
            | Self::IndexField(_)
            | Self::BankField(_)
            | Self::Reference(_)
            | Self::Invocation(_) => true,
            Self::FieldUnit(unit) => unit.connection_name.is_some(),
            _ => false,
        }
    }

    /// The externally visible argument list.
    pub(crate) fn args(&self) -> &[AmlArg] {
        match self {
            Self::Generic(g) | Self::GenericNamed(g) => &g.args,
            Self::Invocation(inv) => &inv.args,
            _ => &[],
        }
    }

    /// Every operand the kind holds, visible or not.
    pub(crate) fn operands(&self) -> impl Iterator<Item = &AmlArg> {
        let fixed: [Option<&AmlArg>; 3] = match self {
            Self::Const(c) => [Some(&c.value), None, None],
            Self::Buffer(b) => [Some(&b.size), None, None],
            Self::BufferField(f) => [Some(&f.source), Some(&f.index), Some(&f.bit_width)],
            Self::Region(r) => [Some(&r.offset), Some(&r.len), None],
            Self::BankField(f) => [Some(&f.bank_value), None, None],
            _ => [None; 3],
        };
        self.args().iter().chain(fixed.into_iter().flatten())
    }

    /// Term entities supplied as operands.
    pub(crate) fn terms(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.operands().filter_map(|arg| match arg {
            AmlArg::Entity(id) => Some(*id),
            _ => None,
        })
    }

    pub(crate) fn set_arg(&mut self, index: u8, arg: AmlArg) -> Intake {
        match self {
            Self::Generic(g) => {
                g.args.push(arg);
                Intake::Accepted
            }
            Self::GenericNamed(g) => {
                if index == 0 {
                    return Intake::name(&arg);
                }
                g.args.push(arg);
                Intake::Accepted
            }
            Self::Const(c) => {
                if index != 0 {
                    return Intake::Rejected;
                }
                c.value = arg;
                Intake::Accepted
            }
            // Arg 0 is the name slot, assigned when the entity was created.
            Self::Scope | Self::Device | Self::ThermalZone => Intake::from_bool(index == 0),
            Self::Method(m) => match index {
                0 => Intake::Accepted,
                1 => Intake::store(&mut m.flags, arg.narrow().map(MethodFlags::from_bits_retain)),
                _ => Intake::Rejected,
            },
            Self::Processor(p) => match index {
                0 => Intake::store(&mut p.id, arg.narrow()),
                1 => Intake::store(&mut p.pblk_addr, arg.narrow()),
                2 => Intake::store(&mut p.pblk_len, arg.narrow()),
                _ => Intake::Rejected,
            },
            Self::PowerResource(p) => match index {
                0 => Intake::store(&mut p.system_level, arg.narrow()),
                1 => Intake::store(&mut p.resource_order, arg.narrow()),
                _ => Intake::Rejected,
            },
            Self::Buffer(b) => match (index, arg) {
                (0, size) => {
                    b.size = size;
                    Intake::Accepted
                }
                (1, AmlArg::Buffer(data)) => {
                    b.data = data;
                    Intake::Accepted
                }
                _ => Intake::Rejected,
            },
            Self::BufferField(bf) => bf.set_arg(index, arg),
            Self::Region(r) => match index {
                0 => Intake::name(&arg),
                1 => Intake::store(&mut r.space, arg.narrow::<u8>().map(RegionSpace::from)),
                2 => {
                    r.offset = arg;
                    Intake::Accepted
                }
                3 => {
                    r.len = arg;
                    Intake::Accepted
                }
                _ => Intake::Rejected,
            },
            Self::Mutex(m) => match index {
                0 => Intake::name(&arg),
                1 => Intake::store(&mut m.sync_level, arg.narrow().filter(|&lvl: &u8| lvl <= 0x0F)),
                _ => Intake::Rejected,
            },
            Self::Event => {
                if index == 0 {
                    Intake::name(&arg)
                } else {
                    Intake::Rejected
                }
            }
            Self::Field(f) => match index {
                0 => Intake::store(&mut f.region_name, arg.into_string()),
                1 => Intake::store(&mut f.flags, arg.narrow().map(FieldFlags::from_bits_retain)),
                _ => Intake::Rejected,
            },
            Self::IndexField(f) => match index {
                0 => Intake::store(&mut f.index_reg_name, arg.into_string()),
                1 => Intake::store(&mut f.data_reg_name, arg.into_string()),
                2 => Intake::store(&mut f.flags, arg.narrow().map(FieldFlags::from_bits_retain)),
                _ => Intake::Rejected,
            },
            Self::BankField(f) => match index {
                0 => Intake::store(&mut f.region_name, arg.into_string()),
                1 => Intake::store(&mut f.bank_reg_name, arg.into_string()),
                2 => {
                    f.bank_value = arg;
                    Intake::Accepted
                }
                3 => Intake::store(&mut f.flags, arg.narrow().map(FieldFlags::from_bits_retain)),
                _ => Intake::Rejected,
            },
            Self::Invocation(inv) => {
                if inv.args.len() >= MAX_METHOD_ARGS {
                    return Intake::Rejected;
                }
                inv.args.push(arg);
                Intake::Accepted
            }
            Self::FieldUnit(_) | Self::Reference(_) => Intake::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_flags_decode() {
        let flags = MethodFlags::from_bits_retain(0b0101_1011);
        assert_eq!(flags.arg_count(), 3);
        assert!(flags.serialized());
        assert_eq!(flags.sync_level(), 5);
        assert!(!MethodFlags::from_bits_retain(0x02).serialized());
    }

    #[test]
    fn field_flags_decode() {
        let flags = FieldFlags::from_bits_retain(0b0101_0011);
        assert_eq!(flags.access_type(), AccessType::DWord);
        assert!(flags.contains(FieldFlags::LOCK));
        assert_eq!(flags.update_rule(), UpdateRule::WriteAsZeros);
    }

    #[test]
    fn region_space_ids() {
        assert_eq!(RegionSpace::from(0x02), RegionSpace::PciConfig);
        assert_eq!(RegionSpace::from(0x0A), RegionSpace::Pcc);
        assert_eq!(RegionSpace::from(0x80), RegionSpace::Other(0x80));
    }

    #[test]
    fn containers() {
        assert!(EntityKind::Device.is_container());
        assert!(EntityKind::Method(Method::default()).is_container());
        assert!(!EntityKind::Event.is_container());
        assert!(!EntityKind::Field(Field::default()).is_container());
    }

    #[test]
    fn field_unit_needs_binding_only_with_connection() {
        let mut unit = FieldUnit::default();
        assert!(!EntityKind::FieldUnit(unit.clone()).needs_binding());
        unit.connection_name = Some("\\_SB_.GPI0".into());
        assert!(EntityKind::FieldUnit(unit).needs_binding());
    }

    #[test]
    fn terms_include_hidden_operands() {
        let size = EntityId::from_index(4);
        let buffer = EntityKind::Buffer(Buffer { size: AmlArg::Entity(size), data: Vec::new() });
        assert!(buffer.args().is_empty());
        assert_eq!(buffer.terms().collect::<Vec<_>>(), [size]);

        let arg = EntityId::from_index(7);
        let call = EntityKind::Invocation(Invocation {
            method_name: "_STA".into(),
            args: vec![AmlArg::Integer(1), AmlArg::Entity(arg)],
            method: None,
        });
        assert_eq!(call.terms().collect::<Vec<_>>(), [arg]);
        assert_eq!(EntityKind::Event.terms().count(), 0);
    }
}
