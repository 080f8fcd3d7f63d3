//! opcode.rs — The closed RTBC instruction set and its operand-shape table.
//!
//! Every fact about instruction widths lives here, in one macro-expanded
//! table per opcode space. Encoders, the decoder and the disassembler all
//! consult [`Shape`] through these tables; nothing else in the crate is
//! allowed to know how many operand bytes an instruction carries.
//!
//! Ids are stable: streams outlive the process that produced them within a
//! single engine version, and the tests at the bottom pin the values.

use core::fmt;

/* ─────────────────────────── Operand shapes ─────────────────────────── */

/// Operand shape of an instruction, after its id byte(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No operand bytes.
    None,
    /// Exactly `n` trailing operand bytes.
    Bytes(u8),
    /// Branch table with a u8 entry count: count, table profile, then
    /// per-entry {4-byte target, 2-byte profile} slots.
    BranchTableU8,
    /// Branch table with a 4-byte entry count.
    BranchTableI32,
    /// Generic memory access: flags byte (offset width, addressing mode),
    /// 4-byte memory index, then the offset at its flagged width.
    MemoryAccess,
    /// Atomic/vector memory access: flags byte, 4-byte memory index, then a
    /// 4- or 8-byte offset selected by the addressing-mode bit.
    AtomicAccess,
    /// A sub-opcode byte follows; its shape comes from the sub-space table.
    Prefix(Prefix),
}

/// Prefixed secondary opcode spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// Saturating conversions, sign extensions, bulk memory/table ops.
    Misc,
    /// 128-bit vector ops.
    Vector,
    /// Shared-memory atomics.
    Atomic,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Prefix::Misc => "misc",
            Prefix::Vector => "vector",
            Prefix::Atomic => "atomic",
        })
    }
}

/// Result classification carried by label records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ResultClass {
    /// The label produces no values.
    None = 0,
    /// All results live on the numeric stack.
    Numeric = 1,
    /// All results live on the reference stack.
    Reference = 2,
    /// Results are spread over both stacks.
    Mixed = 3,
}

impl ResultClass {
    /// Decodes a 2-bit field (always valid).
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => ResultClass::None,
            1 => ResultClass::Numeric,
            2 => ResultClass::Reference,
            _ => ResultClass::Mixed,
        }
    }

    /// The 2-bit field value.
    pub const fn to_bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ResultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultClass::None => "none",
            ResultClass::Numeric => "numeric",
            ResultClass::Reference => "reference",
            ResultClass::Mixed => "mixed",
        })
    }
}

/* ─────────────────────────── Table macro ─────────────────────────── */

/// Expands an opcode-space table into the enum, the id decode, the mnemonic
/// table and the shape table, so a row cannot fall out of sync with itself.
macro_rules! opcode_space {
    (
        $(#[$meta:meta])*
        $vis:vis enum $Enum:ident {
            $( $value:literal $Variant:ident [$mnemonic:literal] => $shape:expr, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u8)]
        $vis enum $Enum {
            $( #[doc = $mnemonic] $Variant = $value, )+
        }

        impl $Enum {
            /// Decodes an id byte; `None` for bytes outside the closed set.
            pub const fn from_u8(byte: u8) -> Option<Self> {
                match byte {
                    $( $value => Some(Self::$Variant), )+
                    _ => None,
                }
            }

            /// The stable id byte.
            pub const fn to_u8(self) -> u8 {
                self as u8
            }

            /// Mnemonic used by the disassembler.
            pub const fn mnemonic(self) -> &'static str {
                match self { $( Self::$Variant => $mnemonic, )+ }
            }

            /// Operand shape after the id byte.
            pub const fn shape(self) -> Shape {
                match self { $( Self::$Variant => $shape, )+ }
            }
        }

        impl fmt::Display for $Enum {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.mnemonic())
            }
        }
    };
}

/* ─────────────────────────── Primary space ─────────────────────────── */

opcode_space! {
    /// Primary opcode space.
    ///
    /// The `.o8`/`.o32` memory forms imply memory 0 with 32-bit addressing
    /// and carry only the offset; the base form carries the generic access
    /// header. Ids 0xF2–0xFB and 0xFF are unassigned.
    pub enum Opcode {
        // control
        0x00 Unreachable ["unreachable"] => Shape::None,
        0x01 Nop ["nop"] => Shape::None,
        0x02 Return ["return"] => Shape::None,
        0x03 LabelU8 ["label.u8"] => Shape::Bytes(1),
        0x04 LabelU16 ["label.u16"] => Shape::Bytes(2),
        0x05 LabelU32 ["label.u32"] => Shape::Bytes(5),
        0x06 LabelI32 ["label.i32"] => Shape::Bytes(9),
        0x07 LabelSimpleU8 ["label.simple.u8"] => Shape::Bytes(1),
        0x08 LabelSimpleU32 ["label.simple.u32"] => Shape::Bytes(4),
        0x09 Loop ["loop"] => Shape::None,
        0x0A If ["if"] => Shape::Bytes(6),
        0x0B BrU8 ["br.u8"] => Shape::Bytes(1),
        0x0C BrI32 ["br.i32"] => Shape::Bytes(4),
        0x0D BrIfU8 ["br_if.u8"] => Shape::Bytes(3),
        0x0E BrIfI32 ["br_if.i32"] => Shape::Bytes(6),
        0x0F BrOnNullU8 ["br_on_null.u8"] => Shape::Bytes(3),
        0x10 BrOnNullI32 ["br_on_null.i32"] => Shape::Bytes(6),
        0x11 BrTableU8 ["br_table.u8"] => Shape::BranchTableU8,
        0x12 BrTableI32 ["br_table.i32"] => Shape::BranchTableI32,
        0x13 CallU8 ["call.u8"] => Shape::Bytes(2),
        0x14 CallI32 ["call.i32"] => Shape::Bytes(8),
        0x15 CallIndirectU8 ["call_indirect.u8"] => Shape::Bytes(5),
        0x16 CallIndirectI32 ["call_indirect.i32"] => Shape::Bytes(14),
        // parametric
        0x17 Drop ["drop"] => Shape::None,
        0x18 DropRef ["drop.ref"] => Shape::None,
        0x19 Select ["select"] => Shape::None,
        0x1A SelectRef ["select.ref"] => Shape::None,
        // locals & globals
        0x1B LocalGetU8 ["local.get.u8"] => Shape::Bytes(1),
        0x1C LocalGetI32 ["local.get.i32"] => Shape::Bytes(4),
        0x1D LocalSetU8 ["local.set.u8"] => Shape::Bytes(1),
        0x1E LocalSetI32 ["local.set.i32"] => Shape::Bytes(4),
        0x1F LocalTeeU8 ["local.tee.u8"] => Shape::Bytes(1),
        0x20 LocalTeeI32 ["local.tee.i32"] => Shape::Bytes(4),
        0x21 GlobalGetU8 ["global.get.u8"] => Shape::Bytes(1),
        0x22 GlobalGetI32 ["global.get.i32"] => Shape::Bytes(4),
        0x23 GlobalSetU8 ["global.set.u8"] => Shape::Bytes(1),
        0x24 GlobalSetI32 ["global.set.i32"] => Shape::Bytes(4),
        // immediates
        0x25 I32ConstI8 ["i32.const.i8"] => Shape::Bytes(1),
        0x26 I32ConstI32 ["i32.const.i32"] => Shape::Bytes(4),
        0x27 I64ConstI8 ["i64.const.i8"] => Shape::Bytes(1),
        0x28 I64ConstI64 ["i64.const.i64"] => Shape::Bytes(8),
        0x29 F32Const ["f32.const"] => Shape::Bytes(4),
        0x2A F64Const ["f64.const"] => Shape::Bytes(8),
        // memory administration, references, tables
        0x2B MemorySize ["memory.size"] => Shape::Bytes(4),
        0x2C MemoryGrow ["memory.grow"] => Shape::Bytes(4),
        0x2D RefNull ["ref.null"] => Shape::None,
        0x2E RefIsNull ["ref.is_null"] => Shape::None,
        0x2F RefFunc ["ref.func"] => Shape::Bytes(4),
        0x30 TableGet ["table.get"] => Shape::Bytes(4),
        0x31 TableSet ["table.set"] => Shape::Bytes(4),
        // memory access, generic header form
        0x32 I32Load ["i32.load"] => Shape::MemoryAccess,
        0x33 I64Load ["i64.load"] => Shape::MemoryAccess,
        0x34 F32Load ["f32.load"] => Shape::MemoryAccess,
        0x35 F64Load ["f64.load"] => Shape::MemoryAccess,
        0x36 I32Load8S ["i32.load8_s"] => Shape::MemoryAccess,
        0x37 I32Load8U ["i32.load8_u"] => Shape::MemoryAccess,
        0x38 I32Load16S ["i32.load16_s"] => Shape::MemoryAccess,
        0x39 I32Load16U ["i32.load16_u"] => Shape::MemoryAccess,
        0x3A I64Load8S ["i64.load8_s"] => Shape::MemoryAccess,
        0x3B I64Load8U ["i64.load8_u"] => Shape::MemoryAccess,
        0x3C I64Load16S ["i64.load16_s"] => Shape::MemoryAccess,
        0x3D I64Load16U ["i64.load16_u"] => Shape::MemoryAccess,
        0x3E I64Load32S ["i64.load32_s"] => Shape::MemoryAccess,
        0x3F I64Load32U ["i64.load32_u"] => Shape::MemoryAccess,
        0x40 I32Store ["i32.store"] => Shape::MemoryAccess,
        0x41 I64Store ["i64.store"] => Shape::MemoryAccess,
        0x42 F32Store ["f32.store"] => Shape::MemoryAccess,
        0x43 F64Store ["f64.store"] => Shape::MemoryAccess,
        0x44 I32Store8 ["i32.store8"] => Shape::MemoryAccess,
        0x45 I32Store16 ["i32.store16"] => Shape::MemoryAccess,
        0x46 I64Store8 ["i64.store8"] => Shape::MemoryAccess,
        0x47 I64Store16 ["i64.store16"] => Shape::MemoryAccess,
        0x48 I64Store32 ["i64.store32"] => Shape::MemoryAccess,
        // memory access, u8 offset on memory 0
        0x49 I32LoadO8 ["i32.load.o8"] => Shape::Bytes(1),
        0x4A I64LoadO8 ["i64.load.o8"] => Shape::Bytes(1),
        0x4B F32LoadO8 ["f32.load.o8"] => Shape::Bytes(1),
        0x4C F64LoadO8 ["f64.load.o8"] => Shape::Bytes(1),
        0x4D I32Load8SO8 ["i32.load8_s.o8"] => Shape::Bytes(1),
        0x4E I32Load8UO8 ["i32.load8_u.o8"] => Shape::Bytes(1),
        0x4F I32Load16SO8 ["i32.load16_s.o8"] => Shape::Bytes(1),
        0x50 I32Load16UO8 ["i32.load16_u.o8"] => Shape::Bytes(1),
        0x51 I64Load8SO8 ["i64.load8_s.o8"] => Shape::Bytes(1),
        0x52 I64Load8UO8 ["i64.load8_u.o8"] => Shape::Bytes(1),
        0x53 I64Load16SO8 ["i64.load16_s.o8"] => Shape::Bytes(1),
        0x54 I64Load16UO8 ["i64.load16_u.o8"] => Shape::Bytes(1),
        0x55 I64Load32SO8 ["i64.load32_s.o8"] => Shape::Bytes(1),
        0x56 I64Load32UO8 ["i64.load32_u.o8"] => Shape::Bytes(1),
        0x57 I32StoreO8 ["i32.store.o8"] => Shape::Bytes(1),
        0x58 I64StoreO8 ["i64.store.o8"] => Shape::Bytes(1),
        0x59 F32StoreO8 ["f32.store.o8"] => Shape::Bytes(1),
        0x5A F64StoreO8 ["f64.store.o8"] => Shape::Bytes(1),
        0x5B I32Store8O8 ["i32.store8.o8"] => Shape::Bytes(1),
        0x5C I32Store16O8 ["i32.store16.o8"] => Shape::Bytes(1),
        0x5D I64Store8O8 ["i64.store8.o8"] => Shape::Bytes(1),
        0x5E I64Store16O8 ["i64.store16.o8"] => Shape::Bytes(1),
        0x5F I64Store32O8 ["i64.store32.o8"] => Shape::Bytes(1),
        // memory access, u32 offset on memory 0
        0x60 I32LoadO32 ["i32.load.o32"] => Shape::Bytes(4),
        0x61 I64LoadO32 ["i64.load.o32"] => Shape::Bytes(4),
        0x62 F32LoadO32 ["f32.load.o32"] => Shape::Bytes(4),
        0x63 F64LoadO32 ["f64.load.o32"] => Shape::Bytes(4),
        0x64 I32Load8SO32 ["i32.load8_s.o32"] => Shape::Bytes(4),
        0x65 I32Load8UO32 ["i32.load8_u.o32"] => Shape::Bytes(4),
        0x66 I32Load16SO32 ["i32.load16_s.o32"] => Shape::Bytes(4),
        0x67 I32Load16UO32 ["i32.load16_u.o32"] => Shape::Bytes(4),
        0x68 I64Load8SO32 ["i64.load8_s.o32"] => Shape::Bytes(4),
        0x69 I64Load8UO32 ["i64.load8_u.o32"] => Shape::Bytes(4),
        0x6A I64Load16SO32 ["i64.load16_s.o32"] => Shape::Bytes(4),
        0x6B I64Load16UO32 ["i64.load16_u.o32"] => Shape::Bytes(4),
        0x6C I64Load32SO32 ["i64.load32_s.o32"] => Shape::Bytes(4),
        0x6D I64Load32UO32 ["i64.load32_u.o32"] => Shape::Bytes(4),
        0x6E I32StoreO32 ["i32.store.o32"] => Shape::Bytes(4),
        0x6F I64StoreO32 ["i64.store.o32"] => Shape::Bytes(4),
        0x70 F32StoreO32 ["f32.store.o32"] => Shape::Bytes(4),
        0x71 F64StoreO32 ["f64.store.o32"] => Shape::Bytes(4),
        0x72 I32Store8O32 ["i32.store8.o32"] => Shape::Bytes(4),
        0x73 I32Store16O32 ["i32.store16.o32"] => Shape::Bytes(4),
        0x74 I64Store8O32 ["i64.store8.o32"] => Shape::Bytes(4),
        0x75 I64Store16O32 ["i64.store16.o32"] => Shape::Bytes(4),
        0x76 I64Store32O32 ["i64.store32.o32"] => Shape::Bytes(4),
        // i32 comparisons
        0x77 I32Eqz ["i32.eqz"] => Shape::None,
        0x78 I32Eq ["i32.eq"] => Shape::None,
        0x79 I32Ne ["i32.ne"] => Shape::None,
        0x7A I32LtS ["i32.lt_s"] => Shape::None,
        0x7B I32LtU ["i32.lt_u"] => Shape::None,
        0x7C I32GtS ["i32.gt_s"] => Shape::None,
        0x7D I32GtU ["i32.gt_u"] => Shape::None,
        0x7E I32LeS ["i32.le_s"] => Shape::None,
        0x7F I32LeU ["i32.le_u"] => Shape::None,
        0x80 I32GeS ["i32.ge_s"] => Shape::None,
        0x81 I32GeU ["i32.ge_u"] => Shape::None,
        // i64 comparisons
        0x82 I64Eqz ["i64.eqz"] => Shape::None,
        0x83 I64Eq ["i64.eq"] => Shape::None,
        0x84 I64Ne ["i64.ne"] => Shape::None,
        0x85 I64LtS ["i64.lt_s"] => Shape::None,
        0x86 I64LtU ["i64.lt_u"] => Shape::None,
        0x87 I64GtS ["i64.gt_s"] => Shape::None,
        0x88 I64GtU ["i64.gt_u"] => Shape::None,
        0x89 I64LeS ["i64.le_s"] => Shape::None,
        0x8A I64LeU ["i64.le_u"] => Shape::None,
        0x8B I64GeS ["i64.ge_s"] => Shape::None,
        0x8C I64GeU ["i64.ge_u"] => Shape::None,
        // f32 comparisons
        0x8D F32Eq ["f32.eq"] => Shape::None,
        0x8E F32Ne ["f32.ne"] => Shape::None,
        0x8F F32Lt ["f32.lt"] => Shape::None,
        0x90 F32Gt ["f32.gt"] => Shape::None,
        0x91 F32Le ["f32.le"] => Shape::None,
        0x92 F32Ge ["f32.ge"] => Shape::None,
        // f64 comparisons
        0x93 F64Eq ["f64.eq"] => Shape::None,
        0x94 F64Ne ["f64.ne"] => Shape::None,
        0x95 F64Lt ["f64.lt"] => Shape::None,
        0x96 F64Gt ["f64.gt"] => Shape::None,
        0x97 F64Le ["f64.le"] => Shape::None,
        0x98 F64Ge ["f64.ge"] => Shape::None,
        // i32 arithmetic
        0x99 I32Clz ["i32.clz"] => Shape::None,
        0x9A I32Ctz ["i32.ctz"] => Shape::None,
        0x9B I32Popcnt ["i32.popcnt"] => Shape::None,
        0x9C I32Add ["i32.add"] => Shape::None,
        0x9D I32Sub ["i32.sub"] => Shape::None,
        0x9E I32Mul ["i32.mul"] => Shape::None,
        0x9F I32DivS ["i32.div_s"] => Shape::None,
        0xA0 I32DivU ["i32.div_u"] => Shape::None,
        0xA1 I32RemS ["i32.rem_s"] => Shape::None,
        0xA2 I32RemU ["i32.rem_u"] => Shape::None,
        0xA3 I32And ["i32.and"] => Shape::None,
        0xA4 I32Or ["i32.or"] => Shape::None,
        0xA5 I32Xor ["i32.xor"] => Shape::None,
        0xA6 I32Shl ["i32.shl"] => Shape::None,
        0xA7 I32ShrS ["i32.shr_s"] => Shape::None,
        0xA8 I32ShrU ["i32.shr_u"] => Shape::None,
        0xA9 I32Rotl ["i32.rotl"] => Shape::None,
        0xAA I32Rotr ["i32.rotr"] => Shape::None,
        // i64 arithmetic
        0xAB I64Clz ["i64.clz"] => Shape::None,
        0xAC I64Ctz ["i64.ctz"] => Shape::None,
        0xAD I64Popcnt ["i64.popcnt"] => Shape::None,
        0xAE I64Add ["i64.add"] => Shape::None,
        0xAF I64Sub ["i64.sub"] => Shape::None,
        0xB0 I64Mul ["i64.mul"] => Shape::None,
        0xB1 I64DivS ["i64.div_s"] => Shape::None,
        0xB2 I64DivU ["i64.div_u"] => Shape::None,
        0xB3 I64RemS ["i64.rem_s"] => Shape::None,
        0xB4 I64RemU ["i64.rem_u"] => Shape::None,
        0xB5 I64And ["i64.and"] => Shape::None,
        0xB6 I64Or ["i64.or"] => Shape::None,
        0xB7 I64Xor ["i64.xor"] => Shape::None,
        0xB8 I64Shl ["i64.shl"] => Shape::None,
        0xB9 I64ShrS ["i64.shr_s"] => Shape::None,
        0xBA I64ShrU ["i64.shr_u"] => Shape::None,
        0xBB I64Rotl ["i64.rotl"] => Shape::None,
        0xBC I64Rotr ["i64.rotr"] => Shape::None,
        // f32 arithmetic
        0xBD F32Abs ["f32.abs"] => Shape::None,
        0xBE F32Neg ["f32.neg"] => Shape::None,
        0xBF F32Ceil ["f32.ceil"] => Shape::None,
        0xC0 F32Floor ["f32.floor"] => Shape::None,
        0xC1 F32Trunc ["f32.trunc"] => Shape::None,
        0xC2 F32Nearest ["f32.nearest"] => Shape::None,
        0xC3 F32Sqrt ["f32.sqrt"] => Shape::None,
        0xC4 F32Add ["f32.add"] => Shape::None,
        0xC5 F32Sub ["f32.sub"] => Shape::None,
        0xC6 F32Mul ["f32.mul"] => Shape::None,
        0xC7 F32Div ["f32.div"] => Shape::None,
        0xC8 F32Min ["f32.min"] => Shape::None,
        0xC9 F32Max ["f32.max"] => Shape::None,
        0xCA F32Copysign ["f32.copysign"] => Shape::None,
        // f64 arithmetic
        0xCB F64Abs ["f64.abs"] => Shape::None,
        0xCC F64Neg ["f64.neg"] => Shape::None,
        0xCD F64Ceil ["f64.ceil"] => Shape::None,
        0xCE F64Floor ["f64.floor"] => Shape::None,
        0xCF F64Trunc ["f64.trunc"] => Shape::None,
        0xD0 F64Nearest ["f64.nearest"] => Shape::None,
        0xD1 F64Sqrt ["f64.sqrt"] => Shape::None,
        0xD2 F64Add ["f64.add"] => Shape::None,
        0xD3 F64Sub ["f64.sub"] => Shape::None,
        0xD4 F64Mul ["f64.mul"] => Shape::None,
        0xD5 F64Div ["f64.div"] => Shape::None,
        0xD6 F64Min ["f64.min"] => Shape::None,
        0xD7 F64Max ["f64.max"] => Shape::None,
        0xD8 F64Copysign ["f64.copysign"] => Shape::None,
        // conversions
        0xD9 I32WrapI64 ["i32.wrap_i64"] => Shape::None,
        0xDA I32TruncF32S ["i32.trunc_f32_s"] => Shape::None,
        0xDB I32TruncF32U ["i32.trunc_f32_u"] => Shape::None,
        0xDC I32TruncF64S ["i32.trunc_f64_s"] => Shape::None,
        0xDD I32TruncF64U ["i32.trunc_f64_u"] => Shape::None,
        0xDE I64ExtendI32S ["i64.extend_i32_s"] => Shape::None,
        0xDF I64ExtendI32U ["i64.extend_i32_u"] => Shape::None,
        0xE0 I64TruncF32S ["i64.trunc_f32_s"] => Shape::None,
        0xE1 I64TruncF32U ["i64.trunc_f32_u"] => Shape::None,
        0xE2 I64TruncF64S ["i64.trunc_f64_s"] => Shape::None,
        0xE3 I64TruncF64U ["i64.trunc_f64_u"] => Shape::None,
        0xE4 F32ConvertI32S ["f32.convert_i32_s"] => Shape::None,
        0xE5 F32ConvertI32U ["f32.convert_i32_u"] => Shape::None,
        0xE6 F32ConvertI64S ["f32.convert_i64_s"] => Shape::None,
        0xE7 F32ConvertI64U ["f32.convert_i64_u"] => Shape::None,
        0xE8 F32DemoteF64 ["f32.demote_f64"] => Shape::None,
        0xE9 F64ConvertI32S ["f64.convert_i32_s"] => Shape::None,
        0xEA F64ConvertI32U ["f64.convert_i32_u"] => Shape::None,
        0xEB F64ConvertI64S ["f64.convert_i64_s"] => Shape::None,
        0xEC F64ConvertI64U ["f64.convert_i64_u"] => Shape::None,
        0xED F64PromoteF32 ["f64.promote_f32"] => Shape::None,
        0xEE I32ReinterpretF32 ["i32.reinterpret_f32"] => Shape::None,
        0xEF I64ReinterpretF64 ["i64.reinterpret_f64"] => Shape::None,
        0xF0 F32ReinterpretI32 ["f32.reinterpret_i32"] => Shape::None,
        0xF1 F64ReinterpretI64 ["f64.reinterpret_i64"] => Shape::None,
        // prefixes
        0xFC MiscPrefix ["misc"] => Shape::Prefix(Prefix::Misc),
        0xFD VectorPrefix ["vector"] => Shape::Prefix(Prefix::Vector),
        0xFE AtomicPrefix ["atomic"] => Shape::Prefix(Prefix::Atomic),
    }
}

impl Opcode {
    /// Narrow `(o8, o32)` forms of a generic memory-access opcode.
    pub const fn narrow_memory_forms(self) -> Option<(Opcode, Opcode)> {
        match self {
            Opcode::I32Load => Some((Opcode::I32LoadO8, Opcode::I32LoadO32)),
            Opcode::I64Load => Some((Opcode::I64LoadO8, Opcode::I64LoadO32)),
            Opcode::F32Load => Some((Opcode::F32LoadO8, Opcode::F32LoadO32)),
            Opcode::F64Load => Some((Opcode::F64LoadO8, Opcode::F64LoadO32)),
            Opcode::I32Load8S => Some((Opcode::I32Load8SO8, Opcode::I32Load8SO32)),
            Opcode::I32Load8U => Some((Opcode::I32Load8UO8, Opcode::I32Load8UO32)),
            Opcode::I32Load16S => Some((Opcode::I32Load16SO8, Opcode::I32Load16SO32)),
            Opcode::I32Load16U => Some((Opcode::I32Load16UO8, Opcode::I32Load16UO32)),
            Opcode::I64Load8S => Some((Opcode::I64Load8SO8, Opcode::I64Load8SO32)),
            Opcode::I64Load8U => Some((Opcode::I64Load8UO8, Opcode::I64Load8UO32)),
            Opcode::I64Load16S => Some((Opcode::I64Load16SO8, Opcode::I64Load16SO32)),
            Opcode::I64Load16U => Some((Opcode::I64Load16UO8, Opcode::I64Load16UO32)),
            Opcode::I64Load32S => Some((Opcode::I64Load32SO8, Opcode::I64Load32SO32)),
            Opcode::I64Load32U => Some((Opcode::I64Load32UO8, Opcode::I64Load32UO32)),
            Opcode::I32Store => Some((Opcode::I32StoreO8, Opcode::I32StoreO32)),
            Opcode::I64Store => Some((Opcode::I64StoreO8, Opcode::I64StoreO32)),
            Opcode::F32Store => Some((Opcode::F32StoreO8, Opcode::F32StoreO32)),
            Opcode::F64Store => Some((Opcode::F64StoreO8, Opcode::F64StoreO32)),
            Opcode::I32Store8 => Some((Opcode::I32Store8O8, Opcode::I32Store8O32)),
            Opcode::I32Store16 => Some((Opcode::I32Store16O8, Opcode::I32Store16O32)),
            Opcode::I64Store8 => Some((Opcode::I64Store8O8, Opcode::I64Store8O32)),
            Opcode::I64Store16 => Some((Opcode::I64Store16O8, Opcode::I64Store16O32)),
            Opcode::I64Store32 => Some((Opcode::I64Store32O8, Opcode::I64Store32O32)),
            _ => None,
        }
    }
}

/* ─────────────────────────── Misc space ─────────────────────────── */

opcode_space! {
    /// Sub-space behind [`Opcode::MiscPrefix`].
    pub enum MiscOp {
        0x00 I32TruncSatF32S ["i32.trunc_sat_f32_s"] => Shape::None,
        0x01 I32TruncSatF32U ["i32.trunc_sat_f32_u"] => Shape::None,
        0x02 I32TruncSatF64S ["i32.trunc_sat_f64_s"] => Shape::None,
        0x03 I32TruncSatF64U ["i32.trunc_sat_f64_u"] => Shape::None,
        0x04 I64TruncSatF32S ["i64.trunc_sat_f32_s"] => Shape::None,
        0x05 I64TruncSatF32U ["i64.trunc_sat_f32_u"] => Shape::None,
        0x06 I64TruncSatF64S ["i64.trunc_sat_f64_s"] => Shape::None,
        0x07 I64TruncSatF64U ["i64.trunc_sat_f64_u"] => Shape::None,
        0x08 I32Extend8S ["i32.extend8_s"] => Shape::None,
        0x09 I32Extend16S ["i32.extend16_s"] => Shape::None,
        0x0A I64Extend8S ["i64.extend8_s"] => Shape::None,
        0x0B I64Extend16S ["i64.extend16_s"] => Shape::None,
        0x0C I64Extend32S ["i64.extend32_s"] => Shape::None,
        0x0D MemoryInit ["memory.init"] => Shape::Bytes(8),
        0x0E MemoryCopy ["memory.copy"] => Shape::Bytes(8),
        0x0F MemoryFill ["memory.fill"] => Shape::Bytes(4),
        0x10 DataDrop ["data.drop"] => Shape::Bytes(4),
        0x11 ElemDrop ["elem.drop"] => Shape::Bytes(4),
        0x12 TableInit ["table.init"] => Shape::Bytes(8),
        0x13 TableCopy ["table.copy"] => Shape::Bytes(8),
        0x14 TableGrow ["table.grow"] => Shape::Bytes(4),
        0x15 TableSize ["table.size"] => Shape::Bytes(4),
        0x16 TableFill ["table.fill"] => Shape::Bytes(4),
    }
}

/* ─────────────────────────── Atomic space ─────────────────────────── */

opcode_space! {
    /// Sub-space behind [`Opcode::AtomicPrefix`]. Everything except the
    /// fence is a memory access and carries the access header.
    pub enum AtomicOp {
        0x00 Fence ["atomic.fence"] => Shape::None,
        0x01 Notify ["memory.atomic.notify"] => Shape::AtomicAccess,
        0x02 Wait32 ["memory.atomic.wait32"] => Shape::AtomicAccess,
        0x03 Wait64 ["memory.atomic.wait64"] => Shape::AtomicAccess,
        0x04 I32AtomicLoad ["i32.atomic.load"] => Shape::AtomicAccess,
        0x05 I64AtomicLoad ["i64.atomic.load"] => Shape::AtomicAccess,
        0x06 I32AtomicLoad8U ["i32.atomic.load8_u"] => Shape::AtomicAccess,
        0x07 I32AtomicLoad16U ["i32.atomic.load16_u"] => Shape::AtomicAccess,
        0x08 I64AtomicLoad8U ["i64.atomic.load8_u"] => Shape::AtomicAccess,
        0x09 I64AtomicLoad16U ["i64.atomic.load16_u"] => Shape::AtomicAccess,
        0x0A I64AtomicLoad32U ["i64.atomic.load32_u"] => Shape::AtomicAccess,
        0x0B I32AtomicStore ["i32.atomic.store"] => Shape::AtomicAccess,
        0x0C I64AtomicStore ["i64.atomic.store"] => Shape::AtomicAccess,
        0x0D I32AtomicStore8 ["i32.atomic.store8"] => Shape::AtomicAccess,
        0x0E I32AtomicStore16 ["i32.atomic.store16"] => Shape::AtomicAccess,
        0x0F I64AtomicStore8 ["i64.atomic.store8"] => Shape::AtomicAccess,
        0x10 I64AtomicStore16 ["i64.atomic.store16"] => Shape::AtomicAccess,
        0x11 I64AtomicStore32 ["i64.atomic.store32"] => Shape::AtomicAccess,
        0x12 I32AtomicRmwAdd ["i32.atomic.rmw.add"] => Shape::AtomicAccess,
        0x13 I64AtomicRmwAdd ["i64.atomic.rmw.add"] => Shape::AtomicAccess,
        0x14 I32AtomicRmw8AddU ["i32.atomic.rmw8.add_u"] => Shape::AtomicAccess,
        0x15 I32AtomicRmw16AddU ["i32.atomic.rmw16.add_u"] => Shape::AtomicAccess,
        0x16 I64AtomicRmw8AddU ["i64.atomic.rmw8.add_u"] => Shape::AtomicAccess,
        0x17 I64AtomicRmw16AddU ["i64.atomic.rmw16.add_u"] => Shape::AtomicAccess,
        0x18 I64AtomicRmw32AddU ["i64.atomic.rmw32.add_u"] => Shape::AtomicAccess,
        0x19 I32AtomicRmwSub ["i32.atomic.rmw.sub"] => Shape::AtomicAccess,
        0x1A I64AtomicRmwSub ["i64.atomic.rmw.sub"] => Shape::AtomicAccess,
        0x1B I32AtomicRmw8SubU ["i32.atomic.rmw8.sub_u"] => Shape::AtomicAccess,
        0x1C I32AtomicRmw16SubU ["i32.atomic.rmw16.sub_u"] => Shape::AtomicAccess,
        0x1D I64AtomicRmw8SubU ["i64.atomic.rmw8.sub_u"] => Shape::AtomicAccess,
        0x1E I64AtomicRmw16SubU ["i64.atomic.rmw16.sub_u"] => Shape::AtomicAccess,
        0x1F I64AtomicRmw32SubU ["i64.atomic.rmw32.sub_u"] => Shape::AtomicAccess,
        0x20 I32AtomicRmwAnd ["i32.atomic.rmw.and"] => Shape::AtomicAccess,
        0x21 I64AtomicRmwAnd ["i64.atomic.rmw.and"] => Shape::AtomicAccess,
        0x22 I32AtomicRmw8AndU ["i32.atomic.rmw8.and_u"] => Shape::AtomicAccess,
        0x23 I32AtomicRmw16AndU ["i32.atomic.rmw16.and_u"] => Shape::AtomicAccess,
        0x24 I64AtomicRmw8AndU ["i64.atomic.rmw8.and_u"] => Shape::AtomicAccess,
        0x25 I64AtomicRmw16AndU ["i64.atomic.rmw16.and_u"] => Shape::AtomicAccess,
        0x26 I64AtomicRmw32AndU ["i64.atomic.rmw32.and_u"] => Shape::AtomicAccess,
        0x27 I32AtomicRmwOr ["i32.atomic.rmw.or"] => Shape::AtomicAccess,
        0x28 I64AtomicRmwOr ["i64.atomic.rmw.or"] => Shape::AtomicAccess,
        0x29 I32AtomicRmw8OrU ["i32.atomic.rmw8.or_u"] => Shape::AtomicAccess,
        0x2A I32AtomicRmw16OrU ["i32.atomic.rmw16.or_u"] => Shape::AtomicAccess,
        0x2B I64AtomicRmw8OrU ["i64.atomic.rmw8.or_u"] => Shape::AtomicAccess,
        0x2C I64AtomicRmw16OrU ["i64.atomic.rmw16.or_u"] => Shape::AtomicAccess,
        0x2D I64AtomicRmw32OrU ["i64.atomic.rmw32.or_u"] => Shape::AtomicAccess,
        0x2E I32AtomicRmwXor ["i32.atomic.rmw.xor"] => Shape::AtomicAccess,
        0x2F I64AtomicRmwXor ["i64.atomic.rmw.xor"] => Shape::AtomicAccess,
        0x30 I32AtomicRmw8XorU ["i32.atomic.rmw8.xor_u"] => Shape::AtomicAccess,
        0x31 I32AtomicRmw16XorU ["i32.atomic.rmw16.xor_u"] => Shape::AtomicAccess,
        0x32 I64AtomicRmw8XorU ["i64.atomic.rmw8.xor_u"] => Shape::AtomicAccess,
        0x33 I64AtomicRmw16XorU ["i64.atomic.rmw16.xor_u"] => Shape::AtomicAccess,
        0x34 I64AtomicRmw32XorU ["i64.atomic.rmw32.xor_u"] => Shape::AtomicAccess,
        0x35 I32AtomicRmwXchg ["i32.atomic.rmw.xchg"] => Shape::AtomicAccess,
        0x36 I64AtomicRmwXchg ["i64.atomic.rmw.xchg"] => Shape::AtomicAccess,
        0x37 I32AtomicRmw8XchgU ["i32.atomic.rmw8.xchg_u"] => Shape::AtomicAccess,
        0x38 I32AtomicRmw16XchgU ["i32.atomic.rmw16.xchg_u"] => Shape::AtomicAccess,
        0x39 I64AtomicRmw8XchgU ["i64.atomic.rmw8.xchg_u"] => Shape::AtomicAccess,
        0x3A I64AtomicRmw16XchgU ["i64.atomic.rmw16.xchg_u"] => Shape::AtomicAccess,
        0x3B I64AtomicRmw32XchgU ["i64.atomic.rmw32.xchg_u"] => Shape::AtomicAccess,
        0x3C I32AtomicRmwCmpxchg ["i32.atomic.rmw.cmpxchg"] => Shape::AtomicAccess,
        0x3D I64AtomicRmwCmpxchg ["i64.atomic.rmw.cmpxchg"] => Shape::AtomicAccess,
        0x3E I32AtomicRmw8CmpxchgU ["i32.atomic.rmw8.cmpxchg_u"] => Shape::AtomicAccess,
        0x3F I32AtomicRmw16CmpxchgU ["i32.atomic.rmw16.cmpxchg_u"] => Shape::AtomicAccess,
        0x40 I64AtomicRmw8CmpxchgU ["i64.atomic.rmw8.cmpxchg_u"] => Shape::AtomicAccess,
        0x41 I64AtomicRmw16CmpxchgU ["i64.atomic.rmw16.cmpxchg_u"] => Shape::AtomicAccess,
        0x42 I64AtomicRmw32CmpxchgU ["i64.atomic.rmw32.cmpxchg_u"] => Shape::AtomicAccess,
    }
}

/* ─────────────────────────── Vector space ─────────────────────────── */

opcode_space! {
    /// Sub-space behind [`Opcode::VectorPrefix`].
    pub enum VectorOp {
        0x00 V128Load ["v128.load"] => Shape::AtomicAccess,
        0x01 V128Store ["v128.store"] => Shape::AtomicAccess,
        0x02 V128Const ["v128.const"] => Shape::Bytes(16),
        0x03 I8x16Shuffle ["i8x16.shuffle"] => Shape::Bytes(16),
        0x04 I8x16Swizzle ["i8x16.swizzle"] => Shape::None,
        0x05 I8x16Splat ["i8x16.splat"] => Shape::None,
        0x06 I16x8Splat ["i16x8.splat"] => Shape::None,
        0x07 I32x4Splat ["i32x4.splat"] => Shape::None,
        0x08 I64x2Splat ["i64x2.splat"] => Shape::None,
        0x09 F32x4Splat ["f32x4.splat"] => Shape::None,
        0x0A F64x2Splat ["f64x2.splat"] => Shape::None,
        0x0B I8x16ExtractLaneS ["i8x16.extract_lane_s"] => Shape::Bytes(1),
        0x0C I8x16ExtractLaneU ["i8x16.extract_lane_u"] => Shape::Bytes(1),
        0x0D I8x16ReplaceLane ["i8x16.replace_lane"] => Shape::Bytes(1),
        0x0E I16x8ExtractLaneS ["i16x8.extract_lane_s"] => Shape::Bytes(1),
        0x0F I16x8ExtractLaneU ["i16x8.extract_lane_u"] => Shape::Bytes(1),
        0x10 I16x8ReplaceLane ["i16x8.replace_lane"] => Shape::Bytes(1),
        0x11 I32x4ExtractLane ["i32x4.extract_lane"] => Shape::Bytes(1),
        0x12 I32x4ReplaceLane ["i32x4.replace_lane"] => Shape::Bytes(1),
        0x13 I64x2ExtractLane ["i64x2.extract_lane"] => Shape::Bytes(1),
        0x14 I64x2ReplaceLane ["i64x2.replace_lane"] => Shape::Bytes(1),
        0x15 F32x4ExtractLane ["f32x4.extract_lane"] => Shape::Bytes(1),
        0x16 F32x4ReplaceLane ["f32x4.replace_lane"] => Shape::Bytes(1),
        0x17 F64x2ExtractLane ["f64x2.extract_lane"] => Shape::Bytes(1),
        0x18 F64x2ReplaceLane ["f64x2.replace_lane"] => Shape::Bytes(1),
        0x19 V128Not ["v128.not"] => Shape::None,
        0x1A V128And ["v128.and"] => Shape::None,
        0x1B V128AndNot ["v128.andnot"] => Shape::None,
        0x1C V128Or ["v128.or"] => Shape::None,
        0x1D V128Xor ["v128.xor"] => Shape::None,
        0x1E V128Bitselect ["v128.bitselect"] => Shape::None,
        0x1F V128AnyTrue ["v128.any_true"] => Shape::None,
        0x20 I8x16Eq ["i8x16.eq"] => Shape::None,
        0x21 I8x16Ne ["i8x16.ne"] => Shape::None,
        0x22 I8x16LtS ["i8x16.lt_s"] => Shape::None,
        0x23 I8x16LtU ["i8x16.lt_u"] => Shape::None,
        0x24 I8x16GtS ["i8x16.gt_s"] => Shape::None,
        0x25 I8x16GtU ["i8x16.gt_u"] => Shape::None,
        0x26 I8x16LeS ["i8x16.le_s"] => Shape::None,
        0x27 I8x16LeU ["i8x16.le_u"] => Shape::None,
        0x28 I8x16GeS ["i8x16.ge_s"] => Shape::None,
        0x29 I8x16GeU ["i8x16.ge_u"] => Shape::None,
        0x2A I8x16Abs ["i8x16.abs"] => Shape::None,
        0x2B I8x16Neg ["i8x16.neg"] => Shape::None,
        0x2C I8x16AllTrue ["i8x16.all_true"] => Shape::None,
        0x2D I8x16Bitmask ["i8x16.bitmask"] => Shape::None,
        0x2E I8x16Shl ["i8x16.shl"] => Shape::None,
        0x2F I8x16ShrS ["i8x16.shr_s"] => Shape::None,
        0x30 I8x16ShrU ["i8x16.shr_u"] => Shape::None,
        0x31 I8x16Add ["i8x16.add"] => Shape::None,
        0x32 I8x16Sub ["i8x16.sub"] => Shape::None,
        0x33 I8x16MinS ["i8x16.min_s"] => Shape::None,
        0x34 I8x16MinU ["i8x16.min_u"] => Shape::None,
        0x35 I8x16MaxS ["i8x16.max_s"] => Shape::None,
        0x36 I8x16MaxU ["i8x16.max_u"] => Shape::None,
        0x37 I16x8Eq ["i16x8.eq"] => Shape::None,
        0x38 I16x8Ne ["i16x8.ne"] => Shape::None,
        0x39 I16x8LtS ["i16x8.lt_s"] => Shape::None,
        0x3A I16x8LtU ["i16x8.lt_u"] => Shape::None,
        0x3B I16x8GtS ["i16x8.gt_s"] => Shape::None,
        0x3C I16x8GtU ["i16x8.gt_u"] => Shape::None,
        0x3D I16x8LeS ["i16x8.le_s"] => Shape::None,
        0x3E I16x8LeU ["i16x8.le_u"] => Shape::None,
        0x3F I16x8GeS ["i16x8.ge_s"] => Shape::None,
        0x40 I16x8GeU ["i16x8.ge_u"] => Shape::None,
        0x41 I16x8Abs ["i16x8.abs"] => Shape::None,
        0x42 I16x8Neg ["i16x8.neg"] => Shape::None,
        0x43 I16x8AllTrue ["i16x8.all_true"] => Shape::None,
        0x44 I16x8Bitmask ["i16x8.bitmask"] => Shape::None,
        0x45 I16x8Shl ["i16x8.shl"] => Shape::None,
        0x46 I16x8ShrS ["i16x8.shr_s"] => Shape::None,
        0x47 I16x8ShrU ["i16x8.shr_u"] => Shape::None,
        0x48 I16x8Add ["i16x8.add"] => Shape::None,
        0x49 I16x8Sub ["i16x8.sub"] => Shape::None,
        0x4A I16x8Mul ["i16x8.mul"] => Shape::None,
        0x4B I16x8MinS ["i16x8.min_s"] => Shape::None,
        0x4C I16x8MinU ["i16x8.min_u"] => Shape::None,
        0x4D I16x8MaxS ["i16x8.max_s"] => Shape::None,
        0x4E I16x8MaxU ["i16x8.max_u"] => Shape::None,
        0x4F I32x4Eq ["i32x4.eq"] => Shape::None,
        0x50 I32x4Ne ["i32x4.ne"] => Shape::None,
        0x51 I32x4LtS ["i32x4.lt_s"] => Shape::None,
        0x52 I32x4LtU ["i32x4.lt_u"] => Shape::None,
        0x53 I32x4GtS ["i32x4.gt_s"] => Shape::None,
        0x54 I32x4GtU ["i32x4.gt_u"] => Shape::None,
        0x55 I32x4LeS ["i32x4.le_s"] => Shape::None,
        0x56 I32x4LeU ["i32x4.le_u"] => Shape::None,
        0x57 I32x4GeS ["i32x4.ge_s"] => Shape::None,
        0x58 I32x4GeU ["i32x4.ge_u"] => Shape::None,
        0x59 I32x4Abs ["i32x4.abs"] => Shape::None,
        0x5A I32x4Neg ["i32x4.neg"] => Shape::None,
        0x5B I32x4AllTrue ["i32x4.all_true"] => Shape::None,
        0x5C I32x4Bitmask ["i32x4.bitmask"] => Shape::None,
        0x5D I32x4Shl ["i32x4.shl"] => Shape::None,
        0x5E I32x4ShrS ["i32x4.shr_s"] => Shape::None,
        0x5F I32x4ShrU ["i32x4.shr_u"] => Shape::None,
        0x60 I32x4Add ["i32x4.add"] => Shape::None,
        0x61 I32x4Sub ["i32x4.sub"] => Shape::None,
        0x62 I32x4Mul ["i32x4.mul"] => Shape::None,
        0x63 I32x4MinS ["i32x4.min_s"] => Shape::None,
        0x64 I32x4MinU ["i32x4.min_u"] => Shape::None,
        0x65 I32x4MaxS ["i32x4.max_s"] => Shape::None,
        0x66 I32x4MaxU ["i32x4.max_u"] => Shape::None,
        0x67 I64x2Eq ["i64x2.eq"] => Shape::None,
        0x68 I64x2Ne ["i64x2.ne"] => Shape::None,
        0x69 I64x2LtS ["i64x2.lt_s"] => Shape::None,
        0x6A I64x2GtS ["i64x2.gt_s"] => Shape::None,
        0x6B I64x2LeS ["i64x2.le_s"] => Shape::None,
        0x6C I64x2GeS ["i64x2.ge_s"] => Shape::None,
        0x6D I64x2Abs ["i64x2.abs"] => Shape::None,
        0x6E I64x2Neg ["i64x2.neg"] => Shape::None,
        0x6F I64x2AllTrue ["i64x2.all_true"] => Shape::None,
        0x70 I64x2Bitmask ["i64x2.bitmask"] => Shape::None,
        0x71 I64x2Shl ["i64x2.shl"] => Shape::None,
        0x72 I64x2ShrS ["i64x2.shr_s"] => Shape::None,
        0x73 I64x2ShrU ["i64x2.shr_u"] => Shape::None,
        0x74 I64x2Add ["i64x2.add"] => Shape::None,
        0x75 I64x2Sub ["i64x2.sub"] => Shape::None,
        0x76 I64x2Mul ["i64x2.mul"] => Shape::None,
        0x77 F32x4Eq ["f32x4.eq"] => Shape::None,
        0x78 F32x4Ne ["f32x4.ne"] => Shape::None,
        0x79 F32x4Lt ["f32x4.lt"] => Shape::None,
        0x7A F32x4Gt ["f32x4.gt"] => Shape::None,
        0x7B F32x4Le ["f32x4.le"] => Shape::None,
        0x7C F32x4Ge ["f32x4.ge"] => Shape::None,
        0x7D F32x4Abs ["f32x4.abs"] => Shape::None,
        0x7E F32x4Neg ["f32x4.neg"] => Shape::None,
        0x7F F32x4Sqrt ["f32x4.sqrt"] => Shape::None,
        0x80 F32x4Add ["f32x4.add"] => Shape::None,
        0x81 F32x4Sub ["f32x4.sub"] => Shape::None,
        0x82 F32x4Mul ["f32x4.mul"] => Shape::None,
        0x83 F32x4Div ["f32x4.div"] => Shape::None,
        0x84 F32x4Min ["f32x4.min"] => Shape::None,
        0x85 F32x4Max ["f32x4.max"] => Shape::None,
        0x86 F64x2Eq ["f64x2.eq"] => Shape::None,
        0x87 F64x2Ne ["f64x2.ne"] => Shape::None,
        0x88 F64x2Lt ["f64x2.lt"] => Shape::None,
        0x89 F64x2Gt ["f64x2.gt"] => Shape::None,
        0x8A F64x2Le ["f64x2.le"] => Shape::None,
        0x8B F64x2Ge ["f64x2.ge"] => Shape::None,
        0x8C F64x2Abs ["f64x2.abs"] => Shape::None,
        0x8D F64x2Neg ["f64x2.neg"] => Shape::None,
        0x8E F64x2Sqrt ["f64x2.sqrt"] => Shape::None,
        0x8F F64x2Add ["f64x2.add"] => Shape::None,
        0x90 F64x2Sub ["f64x2.sub"] => Shape::None,
        0x91 F64x2Mul ["f64x2.mul"] => Shape::None,
        0x92 F64x2Div ["f64x2.div"] => Shape::None,
        0x93 F64x2Min ["f64x2.min"] => Shape::None,
        0x94 F64x2Max ["f64x2.max"] => Shape::None,
        0x95 I32x4TruncSatF32x4S ["i32x4.trunc_sat_f32x4_s"] => Shape::None,
        0x96 I32x4TruncSatF32x4U ["i32x4.trunc_sat_f32x4_u"] => Shape::None,
        0x97 F32x4ConvertI32x4S ["f32x4.convert_i32x4_s"] => Shape::None,
        0x98 F32x4ConvertI32x4U ["f32x4.convert_i32x4_u"] => Shape::None,
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
