//! AML opcode catalogue.
//!
//! Single-byte opcodes are stored as their byte value. Extended opcodes
//! (prefixed by `ExtOpPrefix`, `0x5B`) are stored as `0x5B00 | ext`. Entities
//! that the scanner synthesizes without a dedicated encoding (field units,
//! method invocations, name references) use pseudo-opcodes in `0xFF00..`.

use core::fmt;

/// The extended opcode prefix byte.
pub const EXT_OP_PREFIX: u8 = 0x5B;

/// Base value for parser pseudo-opcodes.
const PSEUDO_BASE: u16 = 0xFF00;

/// An AML opcode or parser pseudo-opcode.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AmlOpcode(pub u16);

macro_rules! aml_opcodes {
    ($($konst:ident = $value:expr => $name:literal,)*) => {
        impl AmlOpcode {
            $(
                #[doc = concat!("The `", $name, "` opcode.")]
                pub const $konst: Self = Self($value);
            )*

            /// Returns the mnemonic of this opcode, or `"unknown"` if the
            /// value is not a mapped opcode.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$konst => $name,)*
                    _ => "unknown",
                }
            }
        }
    };
}

/// Builds an extended opcode value from its second byte.
const fn ext(op: u8) -> u16 {
    ((EXT_OP_PREFIX as u16) << 8) | op as u16
}

aml_opcodes! {
    ZERO = 0x00 => "Zero",
    ONE = 0x01 => "One",
    ALIAS = 0x06 => "Alias",
    NAME = 0x08 => "Name",
    BYTE_PREFIX = 0x0A => "BytePrefix",
    WORD_PREFIX = 0x0B => "WordPrefix",
    DWORD_PREFIX = 0x0C => "DwordPrefix",
    STRING_PREFIX = 0x0D => "StringPrefix",
    QWORD_PREFIX = 0x0E => "QwordPrefix",
    SCOPE = 0x10 => "Scope",
    BUFFER = 0x11 => "Buffer",
    PACKAGE = 0x12 => "Package",
    VAR_PACKAGE = 0x13 => "VarPackage",
    METHOD = 0x14 => "Method",
    EXTERNAL = 0x15 => "External",
    LOCAL0 = 0x60 => "Local0",
    LOCAL1 = 0x61 => "Local1",
    LOCAL2 = 0x62 => "Local2",
    LOCAL3 = 0x63 => "Local3",
    LOCAL4 = 0x64 => "Local4",
    LOCAL5 = 0x65 => "Local5",
    LOCAL6 = 0x66 => "Local6",
    LOCAL7 = 0x67 => "Local7",
    ARG0 = 0x68 => "Arg0",
    ARG1 = 0x69 => "Arg1",
    ARG2 = 0x6A => "Arg2",
    ARG3 = 0x6B => "Arg3",
    ARG4 = 0x6C => "Arg4",
    ARG5 = 0x6D => "Arg5",
    ARG6 = 0x6E => "Arg6",
    STORE = 0x70 => "Store",
    REF_OF = 0x71 => "RefOf",
    ADD = 0x72 => "Add",
    CONCAT = 0x73 => "Concat",
    SUBTRACT = 0x74 => "Subtract",
    INCREMENT = 0x75 => "Increment",
    DECREMENT = 0x76 => "Decrement",
    MULTIPLY = 0x77 => "Multiply",
    DIVIDE = 0x78 => "Divide",
    SHIFT_LEFT = 0x79 => "ShiftLeft",
    SHIFT_RIGHT = 0x7A => "ShiftRight",
    AND = 0x7B => "And",
    NAND = 0x7C => "Nand",
    OR = 0x7D => "Or",
    NOR = 0x7E => "Nor",
    XOR = 0x7F => "Xor",
    NOT = 0x80 => "Not",
    FIND_SET_LEFT_BIT = 0x81 => "FindSetLeftBit",
    FIND_SET_RIGHT_BIT = 0x82 => "FindSetRightBit",
    DEREF_OF = 0x83 => "DerefOf",
    CONCAT_RES = 0x84 => "ConcatRes",
    MOD = 0x85 => "Mod",
    NOTIFY = 0x86 => "Notify",
    SIZE_OF = 0x87 => "SizeOf",
    INDEX = 0x88 => "Index",
    MATCH = 0x89 => "Match",
    CREATE_DWORD_FIELD = 0x8A => "CreateDWordField",
    CREATE_WORD_FIELD = 0x8B => "CreateWordField",
    CREATE_BYTE_FIELD = 0x8C => "CreateByteField",
    CREATE_BIT_FIELD = 0x8D => "CreateBitField",
    OBJECT_TYPE = 0x8E => "ObjectType",
    CREATE_QWORD_FIELD = 0x8F => "CreateQWordField",
    LAND = 0x90 => "Land",
    LOR = 0x91 => "Lor",
    LNOT = 0x92 => "Lnot",
    LEQUAL = 0x93 => "LEqual",
    LGREATER = 0x94 => "LGreater",
    LLESS = 0x95 => "LLess",
    TO_BUFFER = 0x96 => "ToBuffer",
    TO_DECIMAL_STRING = 0x97 => "ToDecimalString",
    TO_HEX_STRING = 0x98 => "ToHexString",
    TO_INTEGER = 0x99 => "ToInteger",
    TO_STRING = 0x9C => "ToString",
    COPY_OBJECT = 0x9D => "CopyObject",
    MID = 0x9E => "Mid",
    CONTINUE = 0x9F => "Continue",
    IF = 0xA0 => "If",
    ELSE = 0xA1 => "Else",
    WHILE = 0xA2 => "While",
    NOOP = 0xA3 => "Noop",
    RETURN = 0xA4 => "Return",
    BREAK = 0xA5 => "Break",
    BREAK_POINT = 0xCC => "BreakPoint",
    ONES = 0xFF => "Ones",
    MUTEX = ext(0x01) => "Mutex",
    EVENT = ext(0x02) => "Event",
    COND_REF_OF = ext(0x12) => "CondRefOf",
    CREATE_FIELD = ext(0x13) => "CreateField",
    LOAD_TABLE = ext(0x1F) => "LoadTable",
    LOAD = ext(0x20) => "Load",
    STALL = ext(0x21) => "Stall",
    SLEEP = ext(0x22) => "Sleep",
    ACQUIRE = ext(0x23) => "Acquire",
    SIGNAL = ext(0x24) => "Signal",
    WAIT = ext(0x25) => "Wait",
    RESET = ext(0x26) => "Reset",
    RELEASE = ext(0x27) => "Release",
    FROM_BCD = ext(0x28) => "FromBCD",
    TO_BCD = ext(0x29) => "ToBCD",
    UNLOAD = ext(0x2A) => "Unload",
    REVISION = ext(0x30) => "Revision",
    DEBUG = ext(0x31) => "Debug",
    FATAL = ext(0x32) => "Fatal",
    TIMER = ext(0x33) => "Timer",
    OP_REGION = ext(0x80) => "OpRegion",
    FIELD = ext(0x81) => "Field",
    DEVICE = ext(0x82) => "Device",
    PROCESSOR = ext(0x83) => "Processor",
    POWER_RES = ext(0x84) => "PowerRes",
    THERMAL_ZONE = ext(0x85) => "ThermalZone",
    INDEX_FIELD = ext(0x86) => "IndexField",
    BANK_FIELD = ext(0x87) => "BankField",
    DATA_REGION = ext(0x88) => "DataRegion",
    FIELD_UNIT = PSEUDO_BASE => "FieldUnit",
    METHOD_INVOCATION = PSEUDO_BASE + 1 => "MethodInvocation",
    NAME_REFERENCE = PSEUDO_BASE + 2 => "NameReference",
}

impl AmlOpcode {
    /// Returns `true` for opcodes encoded with the `0x5B` prefix.
    #[must_use]
    pub const fn is_extended(self) -> bool {
        self.0 >> 8 == EXT_OP_PREFIX as u16
    }

    /// Returns `true` for pseudo-opcodes that have no bytecode encoding.
    #[must_use]
    pub const fn is_pseudo(self) -> bool {
        self.0 >= PSEUDO_BASE
    }

    /// Returns the implied bit width of a fixed-width `Create*Field` opcode.
    ///
    /// `CreateField` takes its width as an operand and returns `None`.
    #[must_use]
    pub const fn fixed_field_width(self) -> Option<u8> {
        match self {
            Self::CREATE_BIT_FIELD => Some(1),
            Self::CREATE_BYTE_FIELD => Some(8),
            Self::CREATE_WORD_FIELD => Some(16),
            Self::CREATE_DWORD_FIELD => Some(32),
            Self::CREATE_QWORD_FIELD => Some(64),
            _ => None,
        }
    }
}

impl fmt::Debug for AmlOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AmlOpcode({}, {:#06x})", self.name(), self.0)
    }
}

impl fmt::Display for AmlOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_lookup() {
        assert_eq!(AmlOpcode::ACQUIRE.name(), "Acquire");
        assert_eq!(AmlOpcode::SCOPE.name(), "Scope");
        assert_eq!(AmlOpcode::METHOD_INVOCATION.name(), "MethodInvocation");
    }

    #[test]
    fn unmapped_opcode_is_unknown() {
        assert_eq!(AmlOpcode(0xFFFF).name(), "unknown");
        assert_eq!(AmlOpcode(0x5BFE).name(), "unknown");
        assert_eq!(format!("{}", AmlOpcode(0x9A)), "unknown");
    }

    #[test]
    fn extended_encoding() {
        assert_eq!(AmlOpcode::DEVICE.0, 0x5B82);
        assert!(AmlOpcode::DEVICE.is_extended());
        assert!(!AmlOpcode::METHOD.is_extended());
        assert!(AmlOpcode::FIELD_UNIT.is_pseudo());
        assert!(!AmlOpcode::ONES.is_pseudo());
    }

    #[test]
    fn fixed_field_widths() {
        assert_eq!(AmlOpcode::CREATE_BIT_FIELD.fixed_field_width(), Some(1));
        assert_eq!(AmlOpcode::CREATE_QWORD_FIELD.fixed_field_width(), Some(64));
        assert_eq!(AmlOpcode::CREATE_FIELD.fixed_field_width(), None);
    }
}
