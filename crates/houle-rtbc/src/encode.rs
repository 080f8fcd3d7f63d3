//! encode.rs — Opcode-aware construction of RTBC streams.
//!
//! [`BytecodeEncoder`] covers the full instruction set. It always picks the
//! narrowest operand form that fits, walking the ladder in [`WidthClass`]
//! order, and hands back [`Location`]s wherever a field may need patching
//! later. The free `emit_*` helpers at the bottom are shared with the
//! reduced encoder in `simple`, so the two cannot drift apart on the byte
//! layouts they have in common.
//!
//! Out-of-range values are caller bugs and fail assertions; nothing here
//! returns a recoverable error.

use houle_core::{ByteWriter, BytecodeStream, Location, ValueType};
use tracing::debug;

use crate::bits::{
    atomic_flags, data_value_tag, implied_zero_tag, length_tag, memory_flags, ElementKind,
    SegmentMode, WidthClass, CODE_LENGTH_SHIFT, CODE_LOCALS_PRESENT, CODE_RESULTS_PRESENT,
    CODE_STACK_SHIFT, DATA_MEMORY_ZERO, DATA_OFFSET_BYTECODE, DATA_PASSIVE, DATA_VALUE_SHIFT,
    ELEM_ENTRY_EXPR, ELEM_ENTRY_FUNC_U16, ELEM_ENTRY_FUNC_U32, ELEM_ENTRY_FUNC_U8,
    ELEM_ENTRY_NULL, ELEM_KIND_SHIFT, ELEM_OFFSET_ADDRESS_SHIFT, ELEM_OFFSET_BYTECODE_SHIFT,
    ELEM_TABLE_SHIFT, INDEX_INLINE_MASK, INDEX_KIND_SHIFT, INDEX_KIND_U16, INDEX_KIND_U32,
    INDEX_KIND_U8, LABEL_RESULT_SHIFT, LABEL_U16_COUNT_MASK, LABEL_U8_COUNT_BIT,
    LABEL_U8_DEPTH_MASK, MEM_OFFSET_U32, MEM_OFFSET_U64, MEM_OFFSET_U8,
};
use crate::opcode::{AtomicOp, MiscOp, Opcode, ResultClass, Shape, VectorOp};

/* ─────────────────────────── Segment descriptors ─────────────────────────── */

/// Where an active data segment starts in its memory.
#[derive(Debug, Clone, Copy)]
pub enum DataOffset<'a> {
    /// Constant destination address.
    Address(u64),
    /// Initializer bytecode evaluated by the linker at reset time.
    Bytecode(&'a [u8]),
}

/// Instantiation mode of a data segment being encoded.
#[derive(Debug, Clone, Copy)]
pub enum DataMode<'a> {
    /// Replayed into `memory` at the given offset on every reset.
    Active {
        /// Target memory index.
        memory: u32,
        /// Destination offset.
        offset: DataOffset<'a>,
    },
    /// Kept aside for `memory.init`.
    Passive,
}

/// Where an active element segment starts in its table.
#[derive(Debug, Clone, Copy)]
pub enum ElemOffset<'a> {
    /// Constant destination index.
    Address(u32),
    /// Initializer bytecode evaluated by the linker at reset time.
    Bytecode(&'a [u8]),
}

/// Instantiation mode of an element segment being encoded.
#[derive(Debug, Clone, Copy)]
pub enum ElemMode<'a> {
    /// Replayed into `table` at the given offset on every reset.
    Active {
        /// Target table index.
        table: u32,
        /// Destination offset.
        offset: ElemOffset<'a>,
    },
    /// Kept aside for `table.init`.
    Passive,
    /// Declared for reference validity only, never replayed.
    Declarative,
}

/* ─────────────────────────── Encoder ─────────────────────────── */

/// Append-only builder of a full-instruction-set RTBC stream.
#[derive(Debug, Default)]
pub struct BytecodeEncoder {
    w: ByteWriter,
}

impl BytecodeEncoder {
    /// Empty encoder.
    pub fn new() -> Self {
        Self { w: ByteWriter::new() }
    }

    /// Empty encoder with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { w: ByteWriter::with_capacity(capacity) }
    }

    /// Current end of the stream.
    pub fn position(&self) -> Location {
        self.w.position()
    }

    /// Bytes emitted so far.
    pub fn len(&self) -> usize {
        self.w.len()
    }

    /// True while nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    /// Emitted bytes, for inspection.
    pub fn as_slice(&self) -> &[u8] {
        self.w.as_slice()
    }

    /// Freezes the stream.
    pub fn finish(self) -> BytecodeStream {
        debug!(bytes = self.w.len(), "rtbc stream frozen");
        self.w.freeze()
    }

    /// Raw payload bytes (segment contents, spliced initializers).
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.w.write_bytes(bytes);
    }

    /* ───── plain instructions ───── */

    /// One opcode with no operands.
    pub fn add_op(&mut self, op: Opcode) {
        emit_op(&mut self.w, op);
    }

    /// Misc-prefixed opcode with no operands.
    pub fn add_misc(&mut self, op: MiscOp) {
        debug_assert!(matches!(op.shape(), Shape::None), "{op} carries operands");
        self.w.write_u8(Opcode::MiscPrefix.to_u8());
        self.w.write_u8(op.to_u8());
    }

    /// Misc-prefixed opcode with one 4-byte index operand.
    pub fn add_misc_index(&mut self, op: MiscOp, index: u32) {
        debug_assert!(matches!(op.shape(), Shape::Bytes(4)), "{op} does not take one index");
        self.w.write_u8(Opcode::MiscPrefix.to_u8());
        self.w.write_u8(op.to_u8());
        self.w.write_u32_le(index);
    }

    /// Misc-prefixed opcode with two 4-byte index operands.
    pub fn add_misc_pair(&mut self, op: MiscOp, first: u32, second: u32) {
        debug_assert!(matches!(op.shape(), Shape::Bytes(8)), "{op} does not take two indices");
        self.w.write_u8(Opcode::MiscPrefix.to_u8());
        self.w.write_u8(op.to_u8());
        self.w.write_u32_le(first);
        self.w.write_u32_le(second);
    }

    /* ───── labels ───── */

    /// Label record, narrowest of the four shapes. Branch targets point at
    /// the returned Location.
    pub fn add_label(
        &mut self,
        result_count: u32,
        stack_depth: u32,
        class: ResultClass,
    ) -> Location {
        let at = self.w.position();
        if result_count <= 1 && stack_depth <= LABEL_U8_DEPTH_MASK as u32 {
            self.w.write_u8(Opcode::LabelU8.to_u8());
            let mut packed = (class.to_bits() << LABEL_RESULT_SHIFT) | stack_depth as u8;
            if result_count == 1 {
                packed |= LABEL_U8_COUNT_BIT;
            }
            self.w.write_u8(packed);
        } else if result_count <= LABEL_U16_COUNT_MASK as u32 && stack_depth <= u8::MAX as u32 {
            self.w.write_u8(Opcode::LabelU16.to_u8());
            self.w.write_u8((class.to_bits() << LABEL_RESULT_SHIFT) | result_count as u8);
            self.w.write_u8(stack_depth as u8);
        } else if result_count <= u16::MAX as u32 && stack_depth <= u16::MAX as u32 {
            self.w.write_u8(Opcode::LabelU32.to_u8());
            self.w.write_u8(class.to_bits());
            self.w.write_u16_le(result_count as u16);
            self.w.write_u16_le(stack_depth as u16);
        } else {
            self.w.write_u8(Opcode::LabelI32.to_u8());
            self.w.write_u8(class.to_bits());
            self.w.write_u32_le(result_count);
            self.w.write_u32_le(stack_depth);
        }
        at
    }

    /// Label record followed by the loop marker. Back edges point at the
    /// returned Location, so re-entry replays the record.
    pub fn add_loop_label(
        &mut self,
        result_count: u32,
        stack_depth: u32,
        class: ResultClass,
    ) -> Location {
        let at = self.add_label(result_count, stack_depth, class);
        self.w.write_u8(Opcode::Loop.to_u8());
        at
    }

    /* ───── branches ───── */

    /// Unconditional branch to an already-emitted target.
    pub fn add_branch(&mut self, target: Location) {
        emit_branch(&mut self.w, target);
    }

    /// Unconditional forward branch; returns the target field to patch.
    pub fn add_branch_location(&mut self) -> Location {
        emit_branch_location(&mut self.w)
    }

    /// Conditional branch to an already-emitted target.
    pub fn add_branch_if(&mut self, target: Location) {
        emit_branch_if(&mut self.w, target);
    }

    /// Conditional forward branch; returns the target field to patch.
    pub fn add_branch_if_location(&mut self) -> Location {
        emit_branch_if_location(&mut self.w)
    }

    /// Null-check branch to an already-emitted target.
    pub fn add_branch_on_null(&mut self, target: Location) {
        emit_rel_branch(&mut self.w, Opcode::BrOnNullU8, Opcode::BrOnNullI32, target);
        self.w.write_u16_le(0);
    }

    /// Null-check forward branch; returns the target field to patch.
    pub fn add_branch_on_null_location(&mut self) -> Location {
        self.w.write_u8(Opcode::BrOnNullI32.to_u8());
        let at = self.w.position();
        self.w.write_u32_le(0);
        self.w.write_u16_le(0);
        at
    }

    /// `if`: always the 4-byte forward form; returns the target field.
    pub fn add_if(&mut self) -> Location {
        self.w.write_u8(Opcode::If.to_u8());
        let at = self.w.position();
        self.w.write_u32_le(0);
        self.w.write_u16_le(0);
        at
    }

    /// Resolves a reserved 4-byte target field.
    pub fn patch_branch_target(&mut self, at: Location, target: Location) {
        emit_patch_branch(&mut self.w, at, target);
    }

    /// Branch table: count, table profile, then `count` reserved entries.
    /// Returns each entry's target field, to patch individually.
    pub fn add_branch_table(&mut self, count: u32) -> Vec<Location> {
        emit_branch_table(&mut self.w, count)
    }

    /* ───── calls ───── */

    /// Direct call; narrow when node and function both fit a byte.
    pub fn add_call(&mut self, node: u32, function: u32) {
        emit_call(&mut self.w, node, function);
    }

    /// Indirect call; narrow when node, type and table all fit a byte.
    pub fn add_indirect_call(&mut self, node: u32, type_index: u32, table: u32) {
        emit_indirect_call(&mut self.w, node, type_index, table);
    }

    /* ───── immediates ───── */

    /// i32 constant, i8 payload when it fits.
    pub fn add_i32_const(&mut self, value: i32) {
        emit_i32_const(&mut self.w, value);
    }

    /// i64 constant, i8 payload when it fits.
    pub fn add_i64_const(&mut self, value: i64) {
        emit_i64_const(&mut self.w, value);
    }

    /// f32 constant.
    pub fn add_f32_const(&mut self, value: f32) {
        emit_f32_const(&mut self.w, value);
    }

    /// f64 constant.
    pub fn add_f64_const(&mut self, value: f64) {
        emit_f64_const(&mut self.w, value);
    }

    /* ───── locals, globals, references ───── */

    /// `local.get`.
    pub fn add_local_get(&mut self, index: u32) {
        self.indexed(Opcode::LocalGetU8, Opcode::LocalGetI32, index);
    }

    /// `local.set`.
    pub fn add_local_set(&mut self, index: u32) {
        self.indexed(Opcode::LocalSetU8, Opcode::LocalSetI32, index);
    }

    /// `local.tee`.
    pub fn add_local_tee(&mut self, index: u32) {
        self.indexed(Opcode::LocalTeeU8, Opcode::LocalTeeI32, index);
    }

    /// `global.get`.
    pub fn add_global_get(&mut self, index: u32) {
        self.indexed(Opcode::GlobalGetU8, Opcode::GlobalGetI32, index);
    }

    /// `global.set`.
    pub fn add_global_set(&mut self, index: u32) {
        self.indexed(Opcode::GlobalSetU8, Opcode::GlobalSetI32, index);
    }

    /// `ref.func`.
    pub fn add_ref_func(&mut self, function: u32) {
        self.w.write_u8(Opcode::RefFunc.to_u8());
        self.w.write_u32_le(function);
    }

    /// `table.get`.
    pub fn add_table_get(&mut self, table: u32) {
        self.w.write_u8(Opcode::TableGet.to_u8());
        self.w.write_u32_le(table);
    }

    /// `table.set`.
    pub fn add_table_set(&mut self, table: u32) {
        self.w.write_u8(Opcode::TableSet.to_u8());
        self.w.write_u32_le(table);
    }

    fn indexed(&mut self, narrow: Opcode, wide: Opcode, index: u32) {
        if WidthClass::of_unsigned(index as u64) == WidthClass::U8 {
            self.w.write_u8(narrow.to_u8());
            self.w.write_u8(index as u8);
        } else {
            self.w.write_u8(wide.to_u8());
            self.w.write_u32_le(index);
        }
    }

    /* ───── memory, atomics, vectors ───── */

    /// Memory access. Memory 0 with 32-bit addressing gets a narrow form
    /// when the offset fits; anything else gets the generic header.
    pub fn add_memory_access(&mut self, op: Opcode, memory: u32, offset: u64, addr64: bool) {
        debug_assert!(matches!(op.shape(), Shape::MemoryAccess), "{op} is not a memory access");
        if memory == 0 && !addr64 {
            if let Some((o8, o32)) = op.narrow_memory_forms() {
                match WidthClass::of_unsigned(offset) {
                    WidthClass::U8 => {
                        self.w.write_u8(o8.to_u8());
                        self.w.write_u8(offset as u8);
                        return;
                    }
                    WidthClass::U16 | WidthClass::U32 => {
                        self.w.write_u8(o32.to_u8());
                        self.w.write_u32_le(offset as u32);
                        return;
                    }
                    _ => {}
                }
            }
        }
        let tag = match WidthClass::of_unsigned(offset) {
            WidthClass::U8 => MEM_OFFSET_U8,
            WidthClass::U16 | WidthClass::U32 => MEM_OFFSET_U32,
            _ => MEM_OFFSET_U64,
        };
        self.w.write_u8(op.to_u8());
        self.w.write_u8(memory_flags(tag, addr64));
        self.w.write_u32_le(memory);
        match tag {
            MEM_OFFSET_U8 => self.w.write_u8(offset as u8),
            MEM_OFFSET_U32 => self.w.write_u32_le(offset as u32),
            _ => self.w.write_u64_le(offset),
        }
    }

    /// `memory.size`.
    pub fn add_memory_size(&mut self, memory: u32) {
        self.w.write_u8(Opcode::MemorySize.to_u8());
        self.w.write_u32_le(memory);
    }

    /// `memory.grow`.
    pub fn add_memory_grow(&mut self, memory: u32) {
        self.w.write_u8(Opcode::MemoryGrow.to_u8());
        self.w.write_u32_le(memory);
    }

    /// Atomic access; always the header form.
    pub fn add_atomic_access(&mut self, op: AtomicOp, memory: u32, offset: u64, addr64: bool) {
        debug_assert!(matches!(op.shape(), Shape::AtomicAccess), "{op} is not an access");
        self.w.write_u8(Opcode::AtomicPrefix.to_u8());
        self.w.write_u8(op.to_u8());
        self.access_header(memory, offset, addr64);
    }

    /// `atomic.fence`.
    pub fn add_atomic_fence(&mut self) {
        self.w.write_u8(Opcode::AtomicPrefix.to_u8());
        self.w.write_u8(AtomicOp::Fence.to_u8());
    }

    /// Vector-prefixed opcode with no operands.
    pub fn add_vector_op(&mut self, op: VectorOp) {
        debug_assert!(matches!(op.shape(), Shape::None), "{op} carries operands");
        self.w.write_u8(Opcode::VectorPrefix.to_u8());
        self.w.write_u8(op.to_u8());
    }

    /// `v128.load` / `v128.store`; always the header form.
    pub fn add_vector_access(&mut self, op: VectorOp, memory: u32, offset: u64, addr64: bool) {
        debug_assert!(matches!(op.shape(), Shape::AtomicAccess), "{op} is not an access");
        self.w.write_u8(Opcode::VectorPrefix.to_u8());
        self.w.write_u8(op.to_u8());
        self.access_header(memory, offset, addr64);
    }

    /// `v128.const`.
    pub fn add_vector_const(&mut self, value: u128) {
        self.w.write_u8(Opcode::VectorPrefix.to_u8());
        self.w.write_u8(VectorOp::V128Const.to_u8());
        self.w.write_u128_le(value);
    }

    /// `i8x16.shuffle`.
    pub fn add_vector_shuffle(&mut self, lanes: [u8; 16]) {
        self.w.write_u8(Opcode::VectorPrefix.to_u8());
        self.w.write_u8(VectorOp::I8x16Shuffle.to_u8());
        self.w.write_bytes(&lanes);
    }

    /// Lane extract/replace.
    pub fn add_vector_lane(&mut self, op: VectorOp, lane: u8) {
        debug_assert!(matches!(op.shape(), Shape::Bytes(1)), "{op} does not take a lane");
        self.w.write_u8(Opcode::VectorPrefix.to_u8());
        self.w.write_u8(op.to_u8());
        self.w.write_u8(lane);
    }

    fn access_header(&mut self, memory: u32, offset: u64, addr64: bool) {
        assert!(
            addr64 || offset <= u32::MAX as u64,
            "offset {offset} exceeds 32-bit addressing"
        );
        self.w.write_u8(atomic_flags(addr64));
        self.w.write_u32_le(memory);
        if addr64 {
            self.w.write_u64_le(offset);
        } else {
            self.w.write_u32_le(offset as u32);
        }
    }

    /* ───── segment and code-entry headers ───── */

    /// Data segment header; the payload follows via [`Self::add_bytes`].
    /// Returns the header start.
    pub fn add_data_header(&mut self, length: u64, mode: &DataMode<'_>) -> Location {
        assert!(length <= u32::MAX as u64, "segment length {length} exceeds u32");
        let at = self.w.position();
        match mode {
            DataMode::Passive => {
                self.w.write_u8(length_tag(length) | DATA_PASSIVE);
                self.write_length(length);
            }
            DataMode::Active { memory, offset } => {
                let (value, bytecode) = match offset {
                    DataOffset::Address(address) => (*address, None),
                    DataOffset::Bytecode(bc) => {
                        debug_assert!(!bc.is_empty(), "empty offset initializer");
                        (bc.len() as u64, Some(*bc))
                    }
                };
                let mut flags = length_tag(length) | (data_value_tag(value) << DATA_VALUE_SHIFT);
                if bytecode.is_some() {
                    flags |= DATA_OFFSET_BYTECODE;
                }
                if *memory == 0 {
                    flags |= DATA_MEMORY_ZERO;
                }
                self.w.write_u8(flags);
                self.write_length(length);
                self.write_data_value(value);
                if let Some(bc) = bytecode {
                    self.w.write_bytes(bc);
                }
                if *memory != 0 {
                    self.write_index(*memory);
                }
            }
        }
        at
    }

    /// Element segment header; entries follow via `add_elem_*`.
    /// Returns the header start.
    pub fn add_elem_header(
        &mut self,
        count: u32,
        kind: ElementKind,
        mode: &ElemMode<'_>,
    ) -> Location {
        let at = self.w.position();
        let (seg_mode, table, bytecode, address) = match mode {
            ElemMode::Active { table, offset } => match offset {
                ElemOffset::Address(address) => {
                    (SegmentMode::Active, *table, None, Some(*address))
                }
                ElemOffset::Bytecode(bc) => {
                    debug_assert!(!bc.is_empty(), "empty offset initializer");
                    (SegmentMode::Active, *table, Some(*bc), None)
                }
            },
            ElemMode::Passive => (SegmentMode::Passive, 0, None, None),
            ElemMode::Declarative => (SegmentMode::Declarative, 0, None, None),
        };
        let bytecode_tag = bytecode.map_or(0, |bc| implied_zero_tag(bc.len() as u32));
        let address_tag = address.map_or(0, implied_zero_tag);
        let flags = length_tag(count as u64)
            | (implied_zero_tag(table) << ELEM_TABLE_SHIFT)
            | (bytecode_tag << ELEM_OFFSET_BYTECODE_SHIFT)
            | (address_tag << ELEM_OFFSET_ADDRESS_SHIFT);
        self.w.write_u8(flags);
        self.w.write_u8((seg_mode as u8) | ((kind as u8) << ELEM_KIND_SHIFT));
        self.write_length(count as u64);
        self.write_implied_zero(table);
        if let Some(bc) = bytecode {
            self.write_implied_zero(bc.len() as u32);
            self.w.write_bytes(bc);
        }
        if let Some(address) = address {
            self.write_implied_zero(address);
        }
        at
    }

    /// Element entry: null reference.
    pub fn add_elem_null(&mut self) {
        self.w.write_u8(ELEM_ENTRY_NULL);
    }

    /// Element entry: function index, narrowest tag.
    pub fn add_elem_function(&mut self, function: u32) {
        match WidthClass::of_unsigned(function as u64) {
            WidthClass::U8 | WidthClass::I8 => {
                self.w.write_u8(ELEM_ENTRY_FUNC_U8);
                self.w.write_u8(function as u8);
            }
            WidthClass::U16 => {
                self.w.write_u8(ELEM_ENTRY_FUNC_U16);
                self.w.write_u16_le(function as u16);
            }
            _ => {
                self.w.write_u8(ELEM_ENTRY_FUNC_U32);
                self.w.write_u32_le(function);
            }
        }
    }

    /// Element entry: initializer expression evaluated by the host.
    pub fn add_elem_expr(&mut self, bytecode: &[u8]) {
        assert!(bytecode.len() <= u16::MAX as usize, "initializer exceeds u16 length");
        self.w.write_u8(ELEM_ENTRY_EXPR);
        self.w.write_u16_le(bytecode.len() as u16);
        self.w.write_bytes(bytecode);
    }

    /// Code entry header, written after its body. `body_length` counts back
    /// from the header start. Returns the header start.
    pub fn add_code_entry(
        &mut self,
        function_index: u32,
        max_stack_size: u32,
        body_length: u32,
        locals: &[ValueType],
        results: &[ValueType],
    ) -> Location {
        let at = self.w.position();
        assert!(
            body_length as usize <= at.as_usize(),
            "body length {body_length} reaches before the stream start"
        );
        let mut flags = implied_zero_tag(function_index)
            | (implied_zero_tag(max_stack_size) << CODE_STACK_SHIFT)
            | (length_tag(body_length as u64) << CODE_LENGTH_SHIFT);
        if !locals.is_empty() {
            flags |= CODE_LOCALS_PRESENT;
        }
        if !results.is_empty() {
            flags |= CODE_RESULTS_PRESENT;
        }
        self.w.write_u8(flags);
        self.write_implied_zero(function_index);
        self.write_implied_zero(max_stack_size);
        self.write_length(body_length as u64);
        if !locals.is_empty() {
            for ty in locals {
                self.w.write_u8(ty.to_byte());
            }
            self.w.write_u8(0);
        }
        if !results.is_empty() {
            for ty in results {
                self.w.write_u8(ty.to_byte());
            }
            self.w.write_u8(0);
        }
        at
    }

    /* ───── field writers ───── */

    fn write_length(&mut self, value: u64) {
        match length_tag(value) {
            0 => self.w.write_u8(value as u8),
            1 => self.w.write_u16_le(value as u16),
            _ => self.w.write_u32_le(value as u32),
        }
    }

    fn write_data_value(&mut self, value: u64) {
        match data_value_tag(value) {
            1 => self.w.write_u8(value as u8),
            2 => self.w.write_u16_le(value as u16),
            3 => self.w.write_u32_le(value as u32),
            _ => self.w.write_u64_le(value),
        }
    }

    fn write_implied_zero(&mut self, value: u32) {
        match implied_zero_tag(value) {
            0 => {}
            1 => self.w.write_u8(value as u8),
            2 => self.w.write_u16_le(value as u16),
            _ => self.w.write_u32_le(value),
        }
    }

    fn write_index(&mut self, index: u32) {
        if index <= INDEX_INLINE_MASK as u32 {
            self.w.write_u8(index as u8);
        } else {
            match WidthClass::of_unsigned(index as u64) {
                WidthClass::U8 | WidthClass::I8 => {
                    self.w.write_u8(INDEX_KIND_U8 << INDEX_KIND_SHIFT);
                    self.w.write_u8(index as u8);
                }
                WidthClass::U16 => {
                    self.w.write_u8(INDEX_KIND_U16 << INDEX_KIND_SHIFT);
                    self.w.write_u16_le(index as u16);
                }
                _ => {
                    self.w.write_u8(INDEX_KIND_U32 << INDEX_KIND_SHIFT);
                    self.w.write_u32_le(index);
                }
            }
        }
    }
}

/* ─────────────────────────── Shared emitters ─────────────────────────── */
// Used by both encoders; keeping them here keeps the byte layouts of the
// overlapping instruction set in one place.

pub(crate) fn emit_op(w: &mut ByteWriter, op: Opcode) {
    debug_assert!(matches!(op.shape(), Shape::None), "{op} carries operands");
    w.write_u8(op.to_u8());
}

fn emit_rel_branch(w: &mut ByteWriter, narrow: Opcode, wide: Opcode, target: Location) {
    // The relative offset is anchored at the operand field, one byte past
    // the opcode about to be written.
    let rel = target.as_usize() as i64 - (w.len() as i64 + 1);
    if (-(u8::MAX as i64)..=0).contains(&rel) {
        w.write_u8(narrow.to_u8());
        w.write_u8((-rel) as u8);
    } else {
        assert!(
            i32::try_from(rel).is_ok(),
            "branch distance {rel} exceeds the 4-byte form"
        );
        w.write_u8(wide.to_u8());
        w.write_u32_le(rel as i32 as u32);
    }
}

pub(crate) fn emit_branch(w: &mut ByteWriter, target: Location) {
    emit_rel_branch(w, Opcode::BrU8, Opcode::BrI32, target);
}

pub(crate) fn emit_branch_location(w: &mut ByteWriter) -> Location {
    w.write_u8(Opcode::BrI32.to_u8());
    let at = w.position();
    w.write_u32_le(0);
    at
}

pub(crate) fn emit_branch_if(w: &mut ByteWriter, target: Location) {
    emit_rel_branch(w, Opcode::BrIfU8, Opcode::BrIfI32, target);
    w.write_u16_le(0);
}

pub(crate) fn emit_branch_if_location(w: &mut ByteWriter) -> Location {
    w.write_u8(Opcode::BrIfI32.to_u8());
    let at = w.position();
    w.write_u32_le(0);
    w.write_u16_le(0);
    at
}

pub(crate) fn emit_patch_branch(w: &mut ByteWriter, at: Location, target: Location) {
    let rel = target.as_usize() as i64 - at.as_usize() as i64;
    assert!(
        i32::try_from(rel).is_ok(),
        "branch distance {rel} exceeds the 4-byte form"
    );
    w.patch_u32_le(at, rel as i32 as u32);
}

pub(crate) fn emit_branch_table(w: &mut ByteWriter, count: u32) -> Vec<Location> {
    if WidthClass::of_unsigned(count as u64) == WidthClass::U8 {
        w.write_u8(Opcode::BrTableU8.to_u8());
        w.write_u8(count as u8);
    } else {
        w.write_u8(Opcode::BrTableI32.to_u8());
        w.write_u32_le(count);
    }
    w.write_u16_le(0);
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        entries.push(w.position());
        w.write_u32_le(0);
        w.write_u16_le(0);
    }
    entries
}

pub(crate) fn emit_call(w: &mut ByteWriter, node: u32, function: u32) {
    if WidthClass::of_unsigned(node as u64) == WidthClass::U8
        && WidthClass::of_unsigned(function as u64) == WidthClass::U8
    {
        w.write_u8(Opcode::CallU8.to_u8());
        w.write_u8(node as u8);
        w.write_u8(function as u8);
    } else {
        w.write_u8(Opcode::CallI32.to_u8());
        w.write_u32_le(node);
        w.write_u32_le(function);
    }
}

pub(crate) fn emit_indirect_call(w: &mut ByteWriter, node: u32, type_index: u32, table: u32) {
    if WidthClass::of_unsigned(node as u64) == WidthClass::U8
        && WidthClass::of_unsigned(type_index as u64) == WidthClass::U8
        && WidthClass::of_unsigned(table as u64) == WidthClass::U8
    {
        w.write_u8(Opcode::CallIndirectU8.to_u8());
        w.write_u8(node as u8);
        w.write_u8(type_index as u8);
        w.write_u8(table as u8);
    } else {
        w.write_u8(Opcode::CallIndirectI32.to_u8());
        w.write_u32_le(node);
        w.write_u32_le(type_index);
        w.write_u32_le(table);
    }
    w.write_u16_le(0);
}

pub(crate) fn emit_i32_const(w: &mut ByteWriter, value: i32) {
    if WidthClass::of(value as i64) == WidthClass::I8 {
        w.write_u8(Opcode::I32ConstI8.to_u8());
        w.write_u8(value as i8 as u8);
    } else {
        w.write_u8(Opcode::I32ConstI32.to_u8());
        w.write_u32_le(value as u32);
    }
}

pub(crate) fn emit_i64_const(w: &mut ByteWriter, value: i64) {
    if WidthClass::of(value) == WidthClass::I8 {
        w.write_u8(Opcode::I64ConstI8.to_u8());
        w.write_u8(value as i8 as u8);
    } else {
        w.write_u8(Opcode::I64ConstI64.to_u8());
        w.write_u64_le(value as u64);
    }
}

pub(crate) fn emit_f32_const(w: &mut ByteWriter, value: f32) {
    w.write_u8(Opcode::F32Const.to_u8());
    w.write_f32_le(value);
}

pub(crate) fn emit_f64_const(w: &mut ByteWriter, value: f64) {
    w.write_u8(Opcode::F64Const.to_u8());
    w.write_f64_le(value);
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn label_widths_by_magnitude() {
        let mut enc = BytecodeEncoder::new();
        enc.add_label(1, 31, ResultClass::Numeric);
        enc.add_label(1, 32, ResultClass::Numeric);
        enc.add_label(2, 10, ResultClass::Mixed);
        enc.add_label(64, 10, ResultClass::Mixed);
        enc.add_label(0, 70_000, ResultClass::None);
        let bytes = enc.as_slice();
        assert_eq!(bytes[0], Opcode::LabelU8.to_u8());
        assert_eq!(bytes[1], (1 << 6) | LABEL_U8_COUNT_BIT | 31);
        assert_eq!(bytes[2], Opcode::LabelU16.to_u8());
        assert_eq!(&bytes[3..5], &[(1 << 6) | 1, 32]);
        assert_eq!(bytes[5], Opcode::LabelU16.to_u8());
        assert_eq!(bytes[8], Opcode::LabelU32.to_u8());
        assert_eq!(&bytes[9..14], &[3, 64, 0, 10, 0]);
        assert_eq!(bytes[14], Opcode::LabelI32.to_u8());
        assert_eq!(&bytes[15..24], &[0, 0, 0, 0, 0, 0x70, 0x11, 0x01, 0x00]);
    }

    #[test]
    fn loop_label_places_the_marker_after_the_record() {
        let mut enc = BytecodeEncoder::new();
        let at = enc.add_loop_label(0, 3, ResultClass::None);
        assert_eq!(at, Location::ZERO);
        assert_eq!(enc.as_slice(), &[Opcode::LabelU8.to_u8(), 3, Opcode::Loop.to_u8()]);
    }

    #[test]
    fn backward_branch_picks_the_byte_form() {
        let mut enc = BytecodeEncoder::new();
        let target = enc.add_label(0, 0, ResultClass::None);
        enc.add_op(Opcode::Nop);
        enc.add_branch(target);
        // Field at 4, target 0: magnitude 4.
        assert_eq!(&enc.as_slice()[3..], &[Opcode::BrU8.to_u8(), 4]);
    }

    #[test]
    fn distant_backward_branch_falls_back_to_i32() {
        let mut enc = BytecodeEncoder::new();
        let target = enc.position();
        for _ in 0..300 {
            enc.add_op(Opcode::Nop);
        }
        enc.add_branch(target);
        let bytes = enc.as_slice();
        assert_eq!(bytes[300], Opcode::BrI32.to_u8());
        assert_eq!(&bytes[301..305], (-301i32).to_le_bytes());
    }

    #[test]
    fn forward_branch_patches_to_the_resolved_target() {
        let mut enc = BytecodeEncoder::new();
        let field = enc.add_branch_if_location();
        enc.add_op(Opcode::Nop);
        let target = enc.add_label(0, 0, ResultClass::None);
        let before = enc.len();
        enc.patch_branch_target(field, target);
        assert_eq!(enc.len(), before);
        // Opcode at 0, field at 1, profile at 5, nop at 7, label at 8.
        assert_eq!(&enc.as_slice()[1..5], 7i32.to_le_bytes());
    }

    #[test]
    fn branch_table_reserves_one_slot_per_entry() {
        let mut enc = BytecodeEncoder::new();
        let entries = enc.add_branch_table(3);
        assert_eq!(entries.len(), 3);
        // id + count + table profile + 3 × (target + profile).
        assert_eq!(enc.len(), 1 + 1 + 2 + 3 * 6);
        assert_eq!(entries[0].as_usize(), 4);
        assert_eq!(entries[1].as_usize(), 10);
        let target = enc.add_label(0, 0, ResultClass::None);
        enc.patch_branch_target(entries[1], target);
        let rel = (target.as_usize() - entries[1].as_usize()) as i32;
        assert_eq!(&enc.as_slice()[10..14], rel.to_le_bytes());
    }

    #[test]
    fn call_widths() {
        let mut enc = BytecodeEncoder::new();
        enc.add_call(3, 200);
        enc.add_call(3, 256);
        enc.add_indirect_call(1, 2, 3);
        let bytes = enc.as_slice();
        assert_eq!(&bytes[..3], &[Opcode::CallU8.to_u8(), 3, 200]);
        assert_eq!(bytes[3], Opcode::CallI32.to_u8());
        assert_eq!(&bytes[4..8], 3u32.to_le_bytes());
        assert_eq!(&bytes[8..12], 256u32.to_le_bytes());
        assert_eq!(&bytes[12..18], &[Opcode::CallIndirectU8.to_u8(), 1, 2, 3, 0, 0]);
    }

    #[test]
    fn const_widths() {
        let mut enc = BytecodeEncoder::new();
        enc.add_i32_const(-128);
        enc.add_i32_const(128);
        enc.add_i64_const(127);
        enc.add_i64_const(-129);
        let bytes = enc.as_slice();
        assert_eq!(&bytes[..2], &[Opcode::I32ConstI8.to_u8(), 0x80]);
        assert_eq!(bytes[2], Opcode::I32ConstI32.to_u8());
        assert_eq!(&bytes[7..9], &[Opcode::I64ConstI8.to_u8(), 127]);
        assert_eq!(bytes[9], Opcode::I64ConstI64.to_u8());
        assert_eq!(&bytes[10..18], (-129i64).to_le_bytes());
    }

    #[test]
    fn memory_access_forms() {
        let mut enc = BytecodeEncoder::new();
        enc.add_memory_access(Opcode::I32Load, 0, 5, false);
        enc.add_memory_access(Opcode::I32Load, 0, 300, false);
        enc.add_memory_access(Opcode::I32Load, 2, 5, false);
        enc.add_memory_access(Opcode::I64Store, 0, 5, true);
        let bytes = enc.as_slice();
        assert_eq!(&bytes[..2], &[Opcode::I32LoadO8.to_u8(), 5]);
        assert_eq!(bytes[2], Opcode::I32LoadO32.to_u8());
        assert_eq!(&bytes[3..7], 300u32.to_le_bytes());
        // Non-default memory forces the generic header.
        assert_eq!(&bytes[7..9], &[Opcode::I32Load.to_u8(), MEM_OFFSET_U8]);
        assert_eq!(&bytes[9..13], 2u32.to_le_bytes());
        assert_eq!(bytes[13], 5);
        // 64-bit addressing too, even on memory 0.
        assert_eq!(bytes[14], Opcode::I64Store.to_u8());
        assert_eq!(bytes[15], memory_flags(MEM_OFFSET_U8, true));
    }

    #[test]
    fn atomic_access_header() {
        let mut enc = BytecodeEncoder::new();
        enc.add_atomic_access(AtomicOp::I32AtomicRmwAdd, 0, 16, false);
        enc.add_atomic_fence();
        let bytes = enc.as_slice();
        assert_eq!(
            &bytes[..3],
            &[Opcode::AtomicPrefix.to_u8(), AtomicOp::I32AtomicRmwAdd.to_u8(), atomic_flags(false)]
        );
        assert_eq!(&bytes[3..7], 0u32.to_le_bytes());
        assert_eq!(&bytes[7..11], 16u32.to_le_bytes());
        assert_eq!(&bytes[11..], &[Opcode::AtomicPrefix.to_u8(), AtomicOp::Fence.to_u8()]);
    }

    #[test]
    fn data_header_active_constant_offset() {
        let mut enc = BytecodeEncoder::new();
        let at = enc.add_data_header(
            10_000,
            &DataMode::Active { memory: 0, offset: DataOffset::Address(0) },
        );
        assert_eq!(at, Location::ZERO);
        // u16 length, u8 value, memory-index-zero.
        assert_eq!(enc.as_slice(), &[0b1000_1001, 0x10, 0x27, 0x00]);
    }

    #[test]
    fn data_header_nonzero_memory_appends_the_index() {
        let mut enc = BytecodeEncoder::new();
        enc.add_data_header(4, &DataMode::Active { memory: 5, offset: DataOffset::Address(64) });
        // Inline index kind: low six bits hold the value.
        assert_eq!(enc.as_slice(), &[0b0000_1000, 4, 64, 0b0000_0101]);
    }

    #[test]
    fn elem_header_active_zero_offset_is_two_flag_bytes_and_count() {
        let mut enc = BytecodeEncoder::new();
        enc.add_elem_header(
            2,
            ElementKind::FuncRef,
            &ElemMode::Active { table: 0, offset: ElemOffset::Address(0) },
        );
        enc.add_elem_function(7);
        enc.add_elem_null();
        assert_eq!(enc.as_slice(), &[0, 0, 2, ELEM_ENTRY_FUNC_U8, 7, ELEM_ENTRY_NULL]);
    }

    #[test]
    fn code_entry_header_fields() {
        let mut enc = BytecodeEncoder::new();
        for _ in 0..10 {
            enc.add_op(Opcode::Nop);
        }
        let at = enc.add_code_entry(0, 4, 10, &[], &[]);
        assert_eq!(at.as_usize(), 10);
        assert_eq!(&enc.as_slice()[10..], &[0b0000_0100, 4, 10]);

        let mut enc = BytecodeEncoder::new();
        enc.add_op(Opcode::Return);
        enc.add_code_entry(3, 1, 1, &[ValueType::I32, ValueType::F64], &[ValueType::I64]);
        let header = &enc.as_slice()[1..];
        assert_eq!(header[0], 0b1100_0101);
        assert_eq!(header[1], 3);
        assert_eq!(header[2], 1);
        assert_eq!(header[3], 1);
        assert_eq!(&header[4..7], &[0x7F, 0x7C, 0x00]);
        assert_eq!(&header[7..], &[0x7E, 0x00]);
    }
}
