//! bits.rs — Packed flag bytes and the narrowest-width ladder.
//!
//! Each header byte layout is declared once here as masks, tag ladders and
//! small helpers. `encode` builds flag bytes out of these, `decode` takes
//! them apart with the same constants; neither side re-derives a width on
//! its own.

/* ─────────────────────────── Width ladder ─────────────────────────── */

/// Narrowest-width class of an operand value.
///
/// Selection walks the ladder in a fixed order: signed byte, unsigned byte,
/// unsigned short, unsigned 32-bit, full width. Call sites keep only the
/// classes their opcode has a form for and fall through to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthClass {
    /// Fits an i8.
    I8,
    /// Fits a u8.
    U8,
    /// Fits a u16.
    U16,
    /// Fits a u32.
    U32,
    /// Needs the full width of its opcode.
    Wide,
}

impl WidthClass {
    /// Class of a signed value. Negative values fit only `I8` or `Wide`.
    pub const fn of(value: i64) -> Self {
        if value >= i8::MIN as i64 && value <= i8::MAX as i64 {
            WidthClass::I8
        } else if value >= 0 && value <= u8::MAX as i64 {
            WidthClass::U8
        } else if value >= 0 && value <= u16::MAX as i64 {
            WidthClass::U16
        } else if value >= 0 && value <= u32::MAX as i64 {
            WidthClass::U32
        } else {
            WidthClass::Wide
        }
    }

    /// Class of an unsigned value; the `I8` rung does not participate.
    pub const fn of_unsigned(value: u64) -> Self {
        if value <= u8::MAX as u64 {
            WidthClass::U8
        } else if value <= u16::MAX as u64 {
            WidthClass::U16
        } else if value <= u32::MAX as u64 {
            WidthClass::U32
        } else {
            WidthClass::Wide
        }
    }
}

/* ─────────────────────── Memory-access header ─────────────────────── */

/// Generic memory access, flags bits 0–1: offset width tag.
pub const MEM_OFFSET_MASK: u8 = 0b0000_0011;
/// Offset width tag: u8.
pub const MEM_OFFSET_U8: u8 = 0;
/// Offset width tag: u32.
pub const MEM_OFFSET_U32: u8 = 1;
/// Offset width tag: u64.
pub const MEM_OFFSET_U64: u8 = 2;
/// Flags bit 2: the accessed memory uses 64-bit addressing.
pub const MEM_ADDR64: u8 = 0b0000_0100;

/// Builds the flags byte of a generic memory access.
pub const fn memory_flags(offset_tag: u8, addr64: bool) -> u8 {
    (offset_tag & MEM_OFFSET_MASK) | if addr64 { MEM_ADDR64 } else { 0 }
}

/// Offset field width in bytes, `None` for the unassigned tag 3.
pub const fn memory_offset_width(flags: u8) -> Option<u8> {
    match flags & MEM_OFFSET_MASK {
        MEM_OFFSET_U8 => Some(1),
        MEM_OFFSET_U32 => Some(4),
        MEM_OFFSET_U64 => Some(8),
        _ => None,
    }
}

/// Builds the flags byte of an atomic/vector access. Only the addressing
/// bit matters; the offset is u32, or u64 under 64-bit addressing.
pub const fn atomic_flags(addr64: bool) -> u8 {
    if addr64 {
        MEM_ADDR64 | MEM_OFFSET_U64
    } else {
        MEM_OFFSET_U32
    }
}

/// Offset field width of an atomic/vector access.
pub const fn atomic_offset_width(flags: u8) -> u8 {
    if flags & MEM_ADDR64 != 0 {
        8
    } else {
        4
    }
}

/* ─────────────────────── Length / value ladders ─────────────────────── */

/// Width tag of a length-like field (u8/u16/u32, always present).
pub const fn length_tag(value: u64) -> u8 {
    match WidthClass::of_unsigned(value) {
        WidthClass::U8 | WidthClass::I8 => 0,
        WidthClass::U16 => 1,
        _ => 2,
    }
}

/// Field width in bytes of a length tag, `None` for the unassigned tag 3.
pub const fn length_field_bytes(tag: u8) -> Option<u8> {
    match tag & 0b11 {
        0 => Some(1),
        1 => Some(2),
        2 => Some(4),
        _ => None,
    }
}

/// Width tag of an implied-zero field: 0 encodes the value zero with no
/// bytes, 1/2/3 are u8/u16/u32.
pub const fn implied_zero_tag(value: u32) -> u8 {
    if value == 0 {
        0
    } else {
        match WidthClass::of_unsigned(value as u64) {
            WidthClass::U8 | WidthClass::I8 => 1,
            WidthClass::U16 => 2,
            _ => 3,
        }
    }
}

/// Field width in bytes of an implied-zero (or optional) tag.
pub const fn implied_zero_field_bytes(tag: u8) -> u8 {
    match tag & 0b11 {
        0 => 0,
        1 => 1,
        2 => 2,
        _ => 4,
    }
}

/* ─────────────────────── Data segment header ─────────────────────── */

/// Flags bits 0–1: payload length width tag (see [`length_tag`]).
pub const DATA_LENGTH_MASK: u8 = 0b0000_0011;
/// Flags bit 2: segment mode, set for passive.
pub const DATA_PASSIVE: u8 = 0b0000_0100;
/// Flags bits 3–5: value field width tag (see [`data_value_field_bytes`]).
pub const DATA_VALUE_MASK: u8 = 0b0011_1000;
/// Shift of the value width tag.
pub const DATA_VALUE_SHIFT: u8 = 3;
/// Flags bit 6: the value field holds the length of trailing offset
/// bytecode instead of a constant offset address.
pub const DATA_OFFSET_BYTECODE: u8 = 0b0100_0000;
/// Flags bit 7: memory index is zero and carries no field.
pub const DATA_MEMORY_ZERO: u8 = 0b1000_0000;

/// Value width tag of an active segment's value field (never 0; passive
/// segments have no value field and use tag 0).
pub const fn data_value_tag(value: u64) -> u8 {
    match WidthClass::of_unsigned(value) {
        WidthClass::U8 | WidthClass::I8 => 1,
        WidthClass::U16 => 2,
        WidthClass::U32 => 3,
        WidthClass::Wide => 4,
    }
}

/// Value field width in bytes, `None` for the unassigned tags 5–7.
pub const fn data_value_field_bytes(tag: u8) -> Option<u8> {
    match tag {
        0 => Some(0),
        1 => Some(1),
        2 => Some(2),
        3 => Some(4),
        4 => Some(8),
        _ => None,
    }
}

/// Memory/table index byte, bits 6–7: extension kind.
pub const INDEX_KIND_MASK: u8 = 0b1100_0000;
/// Shift of the extension kind.
pub const INDEX_KIND_SHIFT: u8 = 6;
/// Index byte bits 0–5: value when the kind is inline.
pub const INDEX_INLINE_MASK: u8 = 0b0011_1111;
/// Kind 0: the index lives in the low 6 bits of the byte itself.
pub const INDEX_KIND_INLINE: u8 = 0;
/// Kind 1: a u8 index follows.
pub const INDEX_KIND_U8: u8 = 1;
/// Kind 2: a u16 index follows.
pub const INDEX_KIND_U16: u8 = 2;
/// Kind 3: a u32 index follows.
pub const INDEX_KIND_U32: u8 = 3;

/// Extension field width in bytes of an index byte kind.
pub const fn index_extension_bytes(kind: u8) -> u8 {
    match kind & 0b11 {
        INDEX_KIND_INLINE => 0,
        INDEX_KIND_U8 => 1,
        INDEX_KIND_U16 => 2,
        _ => 4,
    }
}

/* ─────────────────────── Element segment header ─────────────────────── */

/// First flags byte, bits 0–1: entry count width tag (see [`length_tag`]).
pub const ELEM_COUNT_MASK: u8 = 0b0000_0011;
/// Bits 2–3: table index, implied-zero ladder.
pub const ELEM_TABLE_MASK: u8 = 0b0000_1100;
/// Shift of the table index tag.
pub const ELEM_TABLE_SHIFT: u8 = 2;
/// Bits 4–5: offset-bytecode length, optional ladder (0 = absent).
pub const ELEM_OFFSET_BYTECODE_MASK: u8 = 0b0011_0000;
/// Shift of the offset-bytecode tag.
pub const ELEM_OFFSET_BYTECODE_SHIFT: u8 = 4;
/// Bits 6–7: constant offset address, optional ladder (0 = absent).
pub const ELEM_OFFSET_ADDRESS_MASK: u8 = 0b1100_0000;
/// Shift of the offset-address tag.
pub const ELEM_OFFSET_ADDRESS_SHIFT: u8 = 6;

/// Second flags byte, bits 0–1: segment mode.
pub const ELEM_MODE_MASK: u8 = 0b0000_0011;
/// Bits 4–7: element type tag.
pub const ELEM_KIND_MASK: u8 = 0b1111_0000;
/// Shift of the element type tag.
pub const ELEM_KIND_SHIFT: u8 = 4;

/// Instantiation mode of a data or element segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SegmentMode {
    /// Replayed into its memory/table at instantiation.
    Active = 0,
    /// Kept for later `memory.init`/`table.init`.
    Passive = 1,
    /// Element-only: declared for `ref.func` validity, never replayed.
    Declarative = 2,
}

impl SegmentMode {
    /// Decodes the 2-bit mode field; tag 3 is unassigned.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b11 {
            0 => Some(SegmentMode::Active),
            1 => Some(SegmentMode::Passive),
            2 => Some(SegmentMode::Declarative),
            _ => None,
        }
    }
}

/// Reference type of an element segment's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ElementKind {
    /// `funcref` entries.
    FuncRef = 0,
    /// `externref` entries.
    ExternRef = 1,
}

impl ElementKind {
    /// Decodes the 4-bit type tag; only 0 and 1 are assigned.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b1111 {
            0 => Some(ElementKind::FuncRef),
            1 => Some(ElementKind::ExternRef),
            _ => None,
        }
    }
}

/// Element entry tag: null reference.
pub const ELEM_ENTRY_NULL: u8 = 0;
/// Element entry tag: u8 function index.
pub const ELEM_ENTRY_FUNC_U8: u8 = 1;
/// Element entry tag: u16 function index.
pub const ELEM_ENTRY_FUNC_U16: u8 = 2;
/// Element entry tag: u32 function index.
pub const ELEM_ENTRY_FUNC_U32: u8 = 3;
/// Element entry tag: initializer expression (u16 length + bytes).
pub const ELEM_ENTRY_EXPR: u8 = 4;

/* ─────────────────────── Code entry header ─────────────────────── */

/// Flags bits 0–1: function index, implied-zero ladder.
pub const CODE_FUNCTION_MASK: u8 = 0b0000_0011;
/// Bits 2–3: max stack size, implied-zero ladder.
pub const CODE_STACK_MASK: u8 = 0b0000_1100;
/// Shift of the max stack tag.
pub const CODE_STACK_SHIFT: u8 = 2;
/// Bits 4–5: body length width tag (see [`length_tag`]).
pub const CODE_LENGTH_MASK: u8 = 0b0011_0000;
/// Shift of the length tag.
pub const CODE_LENGTH_SHIFT: u8 = 4;
/// Bit 6: a 0-terminated locals list follows the fixed fields.
pub const CODE_LOCALS_PRESENT: u8 = 0b0100_0000;
/// Bit 7: a 0-terminated results list follows the locals.
pub const CODE_RESULTS_PRESENT: u8 = 0b1000_0000;

/* ─────────────────────── Label packing ─────────────────────── */

/// `label.u8` operand, bits 0–4: stack depth (≤ 31).
pub const LABEL_U8_DEPTH_MASK: u8 = 0b0001_1111;
/// `label.u8` operand, bit 5: result count (≤ 1).
pub const LABEL_U8_COUNT_BIT: u8 = 0b0010_0000;
/// `label.u8`/`label.u16` first operand byte, bits 6–7: result class.
pub const LABEL_RESULT_SHIFT: u8 = 6;
/// `label.u16` first operand byte, bits 0–5: result count (≤ 63).
pub const LABEL_U16_COUNT_MASK: u8 = 0b0011_1111;

/// `label.simple.u8` operand, bits 0–5: stack depth (≤ 63).
pub const LABEL_SIMPLE_DEPTH_MASK: u8 = 0b0011_1111;
/// `label.simple.u8` operand, bits 6–7: result count (≤ 3).
pub const LABEL_SIMPLE_COUNT_SHIFT: u8 = 6;

/* ─────────────────────────── Tests ─────────────────────────── */
