//! decode.rs — Resynchronization over a frozen RTBC stream.
//!
//! [`BytecodeDecoder`] re-derives per-instance state (globals, memory and
//! table contents) and locates structural landmarks (code entries, call
//! sites) without executing anything. Every cursor movement goes through
//! [`instruction_len`], the one width engine over the shared opcode table;
//! a stream the encoders produced always scans cleanly, and any byte the
//! table does not know is an internal-consistency fault, never skipped.

use core::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use houle_core::{ByteReader, CoreError, Location, ValueType};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::bits::{
    atomic_offset_width, data_value_field_bytes, implied_zero_field_bytes, length_field_bytes,
    memory_offset_width, ElementKind, SegmentMode, CODE_FUNCTION_MASK, CODE_LENGTH_MASK,
    CODE_LENGTH_SHIFT, CODE_LOCALS_PRESENT, CODE_RESULTS_PRESENT, CODE_STACK_MASK,
    CODE_STACK_SHIFT, DATA_LENGTH_MASK, DATA_MEMORY_ZERO, DATA_OFFSET_BYTECODE, DATA_PASSIVE,
    DATA_VALUE_MASK, DATA_VALUE_SHIFT, ELEM_COUNT_MASK, ELEM_ENTRY_EXPR, ELEM_ENTRY_FUNC_U16,
    ELEM_ENTRY_FUNC_U32, ELEM_ENTRY_FUNC_U8, ELEM_ENTRY_NULL, ELEM_KIND_MASK, ELEM_KIND_SHIFT,
    ELEM_MODE_MASK, ELEM_OFFSET_ADDRESS_MASK, ELEM_OFFSET_ADDRESS_SHIFT,
    ELEM_OFFSET_BYTECODE_MASK, ELEM_OFFSET_BYTECODE_SHIFT, ELEM_TABLE_MASK, ELEM_TABLE_SHIFT,
    INDEX_INLINE_MASK, INDEX_KIND_MASK, INDEX_KIND_SHIFT, INDEX_KIND_U16, INDEX_KIND_U32,
    INDEX_KIND_U8,
};
use crate::host::{
    DataAllocator, DataInstance, ElementValue, GlobalStore, InstanceState, Linker, MemoryHost,
    TableHost,
};
use crate::module::{GlobalInit, ModuleImage};
use crate::opcode::{AtomicOp, MiscOp, Opcode, Prefix, Shape, VectorOp};
use crate::{DecodeError, DecodeResult};

/// Value-type list of a code entry (locals or results).
pub type TypeList = SmallVec<[ValueType; 8]>;

/* ─────────────────────────── Width engine ─────────────────────────── */

/// Total encoded length of the instruction at `at`, id byte(s) included.
///
/// This is the only place the crate turns bytes back into widths; the scan
/// loop, the disassembler and the lock-step tests all advance through it.
pub fn instruction_len(bc: &[u8], at: usize) -> DecodeResult<usize> {
    let mut r = ByteReader::at(bc, at);
    let byte = r.read_u8()?;
    let op = Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode { opcode: byte, at })?;
    skip_operands(&mut r, op.shape())?;
    Ok(r.offset() - at)
}

fn skip_operands(r: &mut ByteReader<'_>, shape: Shape) -> DecodeResult<()> {
    match shape {
        Shape::None => Ok(()),
        Shape::Bytes(n) => Ok(r.skip(n as usize)?),
        Shape::BranchTableU8 => {
            let count = r.read_u8()? as u64;
            skip_branch_table(r, count)
        }
        Shape::BranchTableI32 => {
            let count = r.read_u32_le()? as u64;
            skip_branch_table(r, count)
        }
        Shape::MemoryAccess => {
            let at = r.offset();
            let flags = r.read_u8()?;
            let width = memory_offset_width(flags).ok_or(DecodeError::MalformedFlags {
                what: "memory access",
                flags,
                at,
            })?;
            Ok(r.skip(4 + width as usize)?)
        }
        Shape::AtomicAccess => {
            let flags = r.read_u8()?;
            Ok(r.skip(4 + atomic_offset_width(flags) as usize)?)
        }
        Shape::Prefix(prefix) => {
            let at = r.offset();
            let sub = r.read_u8()?;
            let sub_shape = match prefix {
                Prefix::Misc => MiscOp::from_u8(sub).map(MiscOp::shape),
                Prefix::Atomic => AtomicOp::from_u8(sub).map(AtomicOp::shape),
                Prefix::Vector => VectorOp::from_u8(sub).map(VectorOp::shape),
            }
            .ok_or(DecodeError::UnknownSubOpcode { prefix, opcode: sub, at })?;
            // Sub-spaces never nest another prefix.
            skip_operands(r, sub_shape)
        }
    }
}

fn skip_branch_table(r: &mut ByteReader<'_>, count: u64) -> DecodeResult<()> {
    // Table profile plus {target, profile} per entry.
    let bytes = 2 + count * 6;
    if (r.remaining() as u64) < bytes {
        return Err(DecodeError::Truncated(CoreError::UnexpectedEof {
            needed: bytes,
            at: r.offset() as u64,
        }));
    }
    Ok(r.skip(bytes as usize)?)
}

/// Absolute target of the branch at `at`; `None` when the instruction is
/// not a branch. The relative offset is anchored at the operand field,
/// one byte past the opcode.
pub fn branch_target(bc: &[u8], at: usize) -> DecodeResult<Option<usize>> {
    let mut r = ByteReader::at(bc, at);
    let byte = r.read_u8()?;
    let op = Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode { opcode: byte, at })?;
    let field = at as i64 + 1;
    let target = match op {
        Opcode::BrU8 | Opcode::BrIfU8 | Opcode::BrOnNullU8 => field - r.read_u8()? as i64,
        Opcode::BrI32 | Opcode::BrIfI32 | Opcode::BrOnNullI32 | Opcode::If => {
            field + r.read_i32_le()? as i64
        }
        _ => return Ok(None),
    };
    if target < 0 || target > bc.len() as i64 {
        return Err(DecodeError::BranchOutOfStream { at, target });
    }
    Ok(Some(target as usize))
}

/* ─────────────────────────── Field readers ─────────────────────────── */

fn read_length_field(
    r: &mut ByteReader<'_>,
    tag: u8,
    flags: u8,
    at: usize,
    what: &'static str,
) -> DecodeResult<u64> {
    let width = length_field_bytes(tag).ok_or(DecodeError::MalformedFlags { what, flags, at })?;
    Ok(match width {
        1 => r.read_u8()? as u64,
        2 => r.read_u16_le()? as u64,
        _ => r.read_u32_le()? as u64,
    })
}

fn read_implied_zero_field(r: &mut ByteReader<'_>, tag: u8) -> DecodeResult<u32> {
    Ok(match implied_zero_field_bytes(tag) {
        0 => 0,
        1 => r.read_u8()? as u32,
        2 => r.read_u16_le()? as u32,
        _ => r.read_u32_le()?,
    })
}

fn read_data_value_field(
    r: &mut ByteReader<'_>,
    tag: u8,
    flags: u8,
    at: usize,
) -> DecodeResult<u64> {
    let width = data_value_field_bytes(tag).ok_or(DecodeError::MalformedFlags {
        what: "data segment value",
        flags,
        at,
    })?;
    Ok(match width {
        0 => 0,
        1 => r.read_u8()? as u64,
        2 => r.read_u16_le()? as u64,
        4 => r.read_u32_le()? as u64,
        _ => r.read_u64_le()?,
    })
}

fn read_index_field(r: &mut ByteReader<'_>) -> DecodeResult<u32> {
    let byte = r.read_u8()?;
    Ok(match (byte & INDEX_KIND_MASK) >> INDEX_KIND_SHIFT {
        INDEX_KIND_U8 => r.read_u8()? as u32,
        INDEX_KIND_U16 => r.read_u16_le()? as u32,
        INDEX_KIND_U32 => r.read_u32_le()?,
        _ => (byte & INDEX_INLINE_MASK) as u32,
    })
}

fn read_type_list(r: &mut ByteReader<'_>) -> DecodeResult<TypeList> {
    let mut list = TypeList::new();
    loop {
        let at = r.offset();
        let byte = r.read_u8()?;
        if byte == 0 {
            return Ok(list);
        }
        let ty = ValueType::from_byte(byte).ok_or(DecodeError::MalformedFlags {
            what: "value type",
            flags: byte,
            at,
        })?;
        list.push(ty);
    }
}

fn read_elem_entry<'m>(r: &mut ByteReader<'m>) -> DecodeResult<ElementValue<'m>> {
    let at = r.offset();
    let tag = r.read_u8()?;
    Ok(match tag {
        ELEM_ENTRY_NULL => ElementValue::Null,
        ELEM_ENTRY_FUNC_U8 => ElementValue::Function(r.read_u8()? as u32),
        ELEM_ENTRY_FUNC_U16 => ElementValue::Function(r.read_u16_le()? as u32),
        ELEM_ENTRY_FUNC_U32 => ElementValue::Function(r.read_u32_le()?),
        ELEM_ENTRY_EXPR => {
            let length = r.read_u16_le()? as usize;
            ElementValue::Expr(r.read_bytes(length)?)
        }
        _ => {
            return Err(DecodeError::MalformedFlags { what: "element entry", flags: tag, at });
        }
    })
}

/* ─────────────────────────── Code entries ─────────────────────────── */

/// One call instruction found while scanning a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSite {
    /// Direct call, callee known statically.
    Direct {
        /// Instruction position.
        at: Location,
        /// Callee function index.
        function: u32,
    },
    /// Indirect call through a table.
    Indirect {
        /// Instruction position.
        at: Location,
    },
}

/// Decoded code entry header plus the call sites of its body.
#[derive(Debug, Clone)]
pub struct CodeEntry {
    /// Index of the function this body belongs to.
    pub function_index: u32,
    /// Operand stack high-water mark, precomputed by the parser.
    pub max_stack_size: u32,
    /// Body start; the body ends at the entry's header.
    pub body: Location,
    /// Body length in bytes.
    pub body_length: u32,
    /// Local variable types, empty when the function has none.
    pub locals: TypeList,
    /// Result types, empty when the function returns nothing.
    pub results: TypeList,
    /// Call instructions in body order.
    pub call_sites: Vec<CallSite>,
}

impl CodeEntry {
    /// Byte range of the body within the stream.
    pub fn body_range(&self) -> Range<usize> {
        let start = self.body.as_usize();
        start..start + self.body_length as usize
    }
}

/* ─────────────────────────── Decoder ─────────────────────────── */

/// Walks a borrowed [`ModuleImage`] to rebuild instance state and locate
/// structure. Never executes code; never mutates the stream.
#[derive(Debug, Clone, Copy)]
pub struct BytecodeDecoder<'m> {
    image: &'m ModuleImage,
}

impl<'m> BytecodeDecoder<'m> {
    /// Decoder over a frozen image.
    pub fn new(image: &'m ModuleImage) -> Self {
        Self { image }
    }

    /// The image being decoded.
    pub fn image(&self) -> &'m ModuleImage {
        self.image
    }

    /// Stores every non-imported global's initial value at the instance's
    /// address for it, evaluating recorded initializers via the linker.
    pub fn reset_globals(
        &self,
        instance: &InstanceState,
        store: &mut dyn GlobalStore,
        linker: &mut dyn Linker,
    ) {
        for (index, spec) in self.image.globals().iter().enumerate() {
            if spec.imported {
                continue;
            }
            let address = instance.global_address(index as u32);
            let value = match &spec.init {
                GlobalInit::Value(value) => *value,
                GlobalInit::Bytecode(bytecode) => linker.eval_constant_expr(bytecode),
            };
            store.store(spec.value_type, address, value);
        }
        debug!(globals = self.image.globals().len(), "globals reset");
    }

    /// Replays active data segments into their memories and instantiates
    /// passive ones into the instance's slots. Idempotent: prior off-heap
    /// allocations are released before fresh ones are made.
    pub fn reset_memories(
        &self,
        instance: &mut InstanceState,
        memories: &mut dyn MemoryHost,
        linker: &mut dyn Linker,
        mut allocator: Option<&mut dyn DataAllocator>,
    ) -> DecodeResult<()> {
        let bc = self.image.bytes();
        for (index, header) in self.image.data_segments().iter().enumerate() {
            let at = header.as_usize();
            let mut r = ByteReader::at(bc, at);
            let flags = r.read_u8()?;
            let length =
                read_length_field(&mut r, flags & DATA_LENGTH_MASK, flags, at, "data segment")?;
            if flags & DATA_PASSIVE != 0 {
                if let Some(handle) =
                    instance.take_data(index as u32).and_then(|prior| prior.off_heap)
                {
                    match allocator.as_deref_mut() {
                        Some(alloc) => alloc.release(handle),
                        None => debug_assert!(false, "off-heap handle outlived its allocator"),
                    }
                }
                let payload_at = r.offset();
                let payload = r.read_bytes(length as usize)?;
                let off_heap = allocator.as_deref_mut().map(|alloc| alloc.allocate(payload));
                instance.install_data(
                    index as u32,
                    DataInstance {
                        payload: Location::new(payload_at as u32),
                        length: length as u32,
                        off_heap,
                    },
                );
                trace!(segment = index, length, "passive data segment instantiated");
            } else {
                let value_tag = (flags & DATA_VALUE_MASK) >> DATA_VALUE_SHIFT;
                let value = read_data_value_field(&mut r, value_tag, flags, at)?;
                let offset = if flags & DATA_OFFSET_BYTECODE != 0 {
                    let initializer = r.read_bytes(value as usize)?;
                    linker.eval_constant_expr(initializer)
                } else {
                    value
                };
                let memory =
                    if flags & DATA_MEMORY_ZERO != 0 { 0 } else { read_index_field(&mut r)? };
                let size = memories.byte_size(memory);
                let end = offset.checked_add(length);
                if offset > size || end.map_or(true, |e| e > size) {
                    return Err(DecodeError::MemoryOutOfBounds { memory, offset, length, size });
                }
                let payload = r.read_bytes(length as usize)?;
                memories.initialize(memory, payload, offset);
                trace!(segment = index, memory, offset, length, "active data segment replayed");
            }
        }
        debug!(segments = self.image.data_segments().len(), "memories reset");
        Ok(())
    }

    /// Replays active element segments into their tables entry by entry
    /// and registers passive/declarative ones with the linker.
    pub fn reset_tables(
        &self,
        tables: &mut dyn TableHost,
        linker: &mut dyn Linker,
    ) -> DecodeResult<()> {
        let bc = self.image.bytes();
        for (index, header) in self.image.elem_segments().iter().enumerate() {
            let at = header.as_usize();
            let mut r = ByteReader::at(bc, at);
            let flags = r.read_u8()?;
            let type_and_mode = r.read_u8()?;
            let mode = SegmentMode::from_bits(type_and_mode & ELEM_MODE_MASK).ok_or(
                DecodeError::MalformedFlags {
                    what: "element segment mode",
                    flags: type_and_mode,
                    at,
                },
            )?;
            ElementKind::from_bits((type_and_mode & ELEM_KIND_MASK) >> ELEM_KIND_SHIFT).ok_or(
                DecodeError::MalformedFlags { what: "element kind", flags: type_and_mode, at },
            )?;
            let count =
                read_length_field(&mut r, flags & ELEM_COUNT_MASK, flags, at, "element segment")?
                    as u32;
            match mode {
                SegmentMode::Active => {
                    let table = read_implied_zero_field(
                        &mut r,
                        (flags & ELEM_TABLE_MASK) >> ELEM_TABLE_SHIFT,
                    )?;
                    let bytecode_tag =
                        (flags & ELEM_OFFSET_BYTECODE_MASK) >> ELEM_OFFSET_BYTECODE_SHIFT;
                    let offset = if bytecode_tag != 0 {
                        let length = read_implied_zero_field(&mut r, bytecode_tag)?;
                        let initializer = r.read_bytes(length as usize)?;
                        linker.eval_constant_expr(initializer)
                    } else {
                        read_implied_zero_field(
                            &mut r,
                            (flags & ELEM_OFFSET_ADDRESS_MASK) >> ELEM_OFFSET_ADDRESS_SHIFT,
                        )? as u64
                    };
                    let size = tables.size(table);
                    let end = offset.checked_add(count as u64);
                    if offset > size as u64 || end.map_or(true, |e| e > size as u64) {
                        return Err(DecodeError::TableOutOfBounds { table, offset, count, size });
                    }
                    for slot in 0..count {
                        let value = read_elem_entry(&mut r)?;
                        tables.set(table, offset as u32 + slot, value);
                    }
                    trace!(segment = index, table, offset, count, "active element segment replayed");
                }
                SegmentMode::Passive | SegmentMode::Declarative => {
                    let entries = Location::new(r.offset() as u32);
                    linker.register_passive_elements(index as u32, entries, count);
                    trace!(segment = index, count, "element segment registered");
                }
            }
        }
        debug!(segments = self.image.elem_segments().len(), "tables reset");
        Ok(())
    }

    /// Decodes the code entry at `index` and scans its body for call
    /// sites.
    ///
    /// # Panics
    ///
    /// Panics when `index` is outside the image's code entry table.
    pub fn read_code_entry(&self, index: u32) -> DecodeResult<CodeEntry> {
        let header = self.image.code_entries()[index as usize];
        let bc = self.image.bytes();
        let at = header.as_usize();
        let mut r = ByteReader::at(bc, at);
        let flags = r.read_u8()?;
        let function_index = read_implied_zero_field(&mut r, flags & CODE_FUNCTION_MASK)?;
        let max_stack_size =
            read_implied_zero_field(&mut r, (flags & CODE_STACK_MASK) >> CODE_STACK_SHIFT)?;
        let length = read_length_field(
            &mut r,
            (flags & CODE_LENGTH_MASK) >> CODE_LENGTH_SHIFT,
            flags,
            at,
            "code entry",
        )? as u32;
        let locals = if flags & CODE_LOCALS_PRESENT != 0 {
            read_type_list(&mut r)?
        } else {
            TypeList::new()
        };
        let results = if flags & CODE_RESULTS_PRESENT != 0 {
            read_type_list(&mut r)?
        } else {
            TypeList::new()
        };
        let body_start = at
            .checked_sub(length as usize)
            .ok_or(DecodeError::BodyOutOfStream { at, length })?;
        let call_sites = self.scan_call_sites(body_start..at)?;
        trace!(
            function = function_index,
            body = length,
            calls = call_sites.len(),
            "code entry read"
        );
        Ok(CodeEntry {
            function_index,
            max_stack_size,
            body: Location::new(body_start as u32),
            body_length: length,
            locals,
            results,
            call_sites,
        })
    }

    /// Decodes every code entry, function order.
    pub fn read_code_entries(&self) -> DecodeResult<Vec<CodeEntry>> {
        (0..self.image.code_entries().len() as u32)
            .map(|index| self.read_code_entry(index))
            .collect()
    }

    fn scan_call_sites(&self, body: Range<usize>) -> DecodeResult<Vec<CallSite>> {
        let bc = self.image.bytes();
        let mut sites = Vec::new();
        let mut at = body.start;
        while at < body.end {
            let len = instruction_len(bc, at)?;
            if at + len > body.end {
                return Err(DecodeError::ScanOverrun { at, end: body.end });
            }
            match Opcode::from_u8(bc[at]) {
                Some(Opcode::CallU8) => sites.push(CallSite::Direct {
                    at: Location::new(at as u32),
                    function: bc[at + 2] as u32,
                }),
                Some(Opcode::CallI32) => sites.push(CallSite::Direct {
                    at: Location::new(at as u32),
                    function: LittleEndian::read_u32(&bc[at + 5..at + 9]),
                }),
                Some(Opcode::CallIndirectU8 | Opcode::CallIndirectI32) => {
                    sites.push(CallSite::Indirect { at: Location::new(at as u32) });
                }
                _ => {}
            }
            at += len;
        }
        Ok(sites)
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{BytecodeEncoder, DataMode, DataOffset, ElemMode, ElemOffset};
    use crate::host::OffHeapHandle;
    use crate::module::{GlobalSpec, ModuleLayout};
    use crate::opcode::ResultClass;
    use crate::simple::SimpleBytecodeEncoder;
    use pretty_assertions::assert_eq;

    fn image_of(enc: BytecodeEncoder, layout: ModuleLayout) -> ModuleImage {
        ModuleImage::new(enc.finish(), layout)
    }

    #[derive(Debug, Default)]
    struct RecordingStore {
        written: Vec<(ValueType, u32, u64)>,
    }

    impl GlobalStore for RecordingStore {
        fn store(&mut self, value_type: ValueType, address: u32, value: u64) {
            self.written.push((value_type, address, value));
        }
    }

    /// Evaluates initializers as a little-endian u32 read and records
    /// passive element registrations.
    #[derive(Debug, Default)]
    struct FakeLinker {
        registered: Vec<(u32, Location, u32)>,
    }

    impl Linker for FakeLinker {
        fn eval_constant_expr(&mut self, bytecode: &[u8]) -> u64 {
            LittleEndian::read_u32(bytecode) as u64
        }

        fn register_passive_elements(&mut self, segment: u32, entries: Location, count: u32) {
            self.registered.push((segment, entries, count));
        }
    }

    #[derive(Debug)]
    struct VecMemory {
        bytes: Vec<u8>,
    }

    impl MemoryHost for VecMemory {
        fn byte_size(&self, _memory: u32) -> u64 {
            self.bytes.len() as u64
        }

        fn initialize(&mut self, _memory: u32, src: &[u8], dest: u64) {
            let dest = dest as usize;
            self.bytes[dest..dest + src.len()].copy_from_slice(src);
        }
    }

    /// Owned mirror of [`ElementValue`], so slots outlive the stream borrow.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Slot {
        Empty,
        Null,
        Function(u32),
        Expr(Vec<u8>),
    }

    #[derive(Debug)]
    struct VecTable {
        slots: Vec<Slot>,
    }

    impl TableHost for VecTable {
        fn size(&self, _table: u32) -> u32 {
            self.slots.len() as u32
        }

        fn grow(&mut self, _table: u32, delta: u32) -> u32 {
            let before = self.slots.len();
            self.slots.resize(before + delta as usize, Slot::Empty);
            before as u32
        }

        fn set(&mut self, _table: u32, at: u32, value: ElementValue<'_>) {
            self.slots[at as usize] = match value {
                ElementValue::Null => Slot::Null,
                ElementValue::Function(function) => Slot::Function(function),
                ElementValue::Expr(bytecode) => Slot::Expr(bytecode.to_vec()),
            };
        }
    }

    #[derive(Debug, Default)]
    struct TallyAllocator {
        next: u64,
        released: Vec<OffHeapHandle>,
    }

    impl DataAllocator for TallyAllocator {
        fn allocate(&mut self, _bytes: &[u8]) -> OffHeapHandle {
            self.next += 1;
            OffHeapHandle(self.next)
        }

        fn release(&mut self, handle: OffHeapHandle) {
            self.released.push(handle);
        }
    }

    #[test]
    fn cursor_advances_by_the_emitted_width() {
        let mut enc = BytecodeEncoder::new();
        enc.add_op(Opcode::I32Add);
        enc.add_atomic_access(AtomicOp::I64AtomicRmwXchg, 1, 64, true);
        enc.add_misc_pair(MiscOp::MemoryCopy, 0, 1);
        enc.add_vector_shuffle([0; 16]);
        enc.add_branch_table(2);
        let bytes = enc.as_slice().to_vec();

        let mut at = 0;
        let mut lens = Vec::new();
        while at < bytes.len() {
            let len = instruction_len(&bytes, at).unwrap();
            lens.push(len);
            at += len;
        }
        assert_eq!(at, bytes.len());
        // add, atomic header with u64 offset, misc pair, shuffle, table of 2.
        assert_eq!(lens, vec![1, 15, 10, 18, 16]);
    }

    #[test]
    fn unknown_bytes_are_internal_faults() {
        let err = instruction_len(&[0xFF], 0).unwrap_err();
        assert_eq!(err, DecodeError::UnknownOpcode { opcode: 0xFF, at: 0 });
        assert!(err.is_internal());
        assert!(!err.is_out_of_bounds());

        let err = instruction_len(&[Opcode::MiscPrefix.to_u8(), 0x7F], 0).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownSubOpcode { prefix: Prefix::Misc, opcode: 0x7F, at: 1 }
        );

        // Offset width tag 3 is unassigned.
        let err = instruction_len(&[Opcode::I32Load.to_u8(), 0b11, 0, 0, 0, 0], 0).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedFlags { what: "memory access", .. }));
    }

    #[test]
    fn truncated_streams_report_eof() {
        let err = instruction_len(&[Opcode::CallI32.to_u8(), 1, 2], 0).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(_)));
        assert!(err.is_internal());
    }

    #[test]
    fn branch_targets_recover_for_both_forms() {
        let mut enc = BytecodeEncoder::new();
        let label = enc.add_label(0, 0, ResultClass::None);
        enc.add_op(Opcode::Nop);
        let narrow_at = enc.len();
        enc.add_branch(label);
        let wide_at = enc.len();
        let field = enc.add_branch_if_location();
        let forward = enc.add_label(0, 1, ResultClass::Numeric);
        enc.patch_branch_target(field, forward);
        let bytes = enc.as_slice();

        assert_eq!(branch_target(bytes, narrow_at).unwrap(), Some(label.as_usize()));
        assert_eq!(branch_target(bytes, wide_at).unwrap(), Some(forward.as_usize()));
        // Not a branch.
        assert_eq!(branch_target(bytes, 2).unwrap(), None);
    }

    #[test]
    fn corrupt_branch_magnitude_is_caught() {
        // Backward magnitude larger than the field position.
        let bytes = [Opcode::BrU8.to_u8(), 200];
        let err = branch_target(&bytes, 0).unwrap_err();
        assert!(matches!(err, DecodeError::BranchOutOfStream { at: 0, target: -199 }));
        assert!(err.is_internal());
    }

    #[test]
    fn code_entry_header_and_call_scan() {
        let mut enc = BytecodeEncoder::new();
        let body_start = enc.len();
        enc.add_op(Opcode::Nop);
        enc.add_call(1, 3);
        enc.add_indirect_call(0, 2, 70_000);
        enc.add_op(Opcode::Return);
        let body_length = (enc.len() - body_start) as u32;
        let header = enc.add_code_entry(
            7,
            5,
            body_length,
            &[ValueType::I32],
            &[ValueType::F32, ValueType::FuncRef],
        );
        let image = image_of(enc, ModuleLayout { code_entries: vec![header], ..Default::default() });
        let decoder = BytecodeDecoder::new(&image);

        let entry = decoder.read_code_entry(0).unwrap();
        assert_eq!(entry.function_index, 7);
        assert_eq!(entry.max_stack_size, 5);
        assert_eq!(entry.body_length, body_length);
        assert_eq!(entry.body_range(), body_start..header.as_usize());
        assert_eq!(entry.locals.as_slice(), &[ValueType::I32]);
        assert_eq!(entry.results.as_slice(), &[ValueType::F32, ValueType::FuncRef]);
        // Direct narrow call advances 3 bytes, indirect wide 15.
        assert_eq!(
            entry.call_sites,
            vec![
                CallSite::Direct { at: Location::new(1), function: 3 },
                CallSite::Indirect { at: Location::new(4) },
            ]
        );
    }

    #[test]
    fn scan_faults_on_a_body_that_splits_an_instruction() {
        let mut enc = BytecodeEncoder::new();
        enc.add_op(Opcode::Nop);
        // The callee index doubles as a call opcode once the body boundary
        // slices the instruction apart.
        enc.add_call(1, Opcode::CallU8.to_u8() as u32);
        let header = enc.add_code_entry(0, 1, 2, &[], &[]);
        let image = image_of(enc, ModuleLayout { code_entries: vec![header], ..Default::default() });
        let decoder = BytecodeDecoder::new(&image);
        // Body 2..4 starts inside the call; the resynthesized call at 3
        // reaches past the body end into the header.
        let err = decoder.read_code_entry(0).unwrap_err();
        assert_eq!(err, DecodeError::ScanOverrun { at: 3, end: 4 });
        assert!(err.is_internal());
    }

    #[test]
    fn vector_access_widths_scan_like_atomics() {
        let mut enc = BytecodeEncoder::new();
        enc.add_vector_access(VectorOp::V128Load, 0, 8, false);
        enc.add_vector_lane(VectorOp::I8x16ExtractLaneS, 3);
        let bytes = enc.as_slice().to_vec();
        assert_eq!(instruction_len(&bytes, 0).unwrap(), 11);
        assert_eq!(instruction_len(&bytes, 11).unwrap(), 3);
    }

    #[test]
    fn narrow_backward_branch_keeps_its_magnitude() {
        let mut enc = BytecodeEncoder::new();
        for _ in 0..50 {
            enc.add_op(Opcode::Nop);
        }
        let target = enc.position();
        while enc.len() < 300 {
            enc.add_op(Opcode::Nop);
        }
        enc.add_branch(target);
        let bytes = enc.as_slice();
        // Field at 301, target 50: distance 251 still fits the byte form.
        assert_eq!(bytes[300], Opcode::BrU8.to_u8());
        assert_eq!(bytes[301], 251);
        assert_eq!(branch_target(bytes, 300).unwrap(), Some(50));
    }

    // Emits every assigned opcode in all four spaces, in every operand
    // form the encoders can produce, and re-scans the streams checking
    // that each instruction starts exactly where the encoder left off.
    #[test]
    fn every_assigned_opcode_scans_in_lock_step() {
        let mut enc = BytecodeEncoder::new();
        let mut starts = Vec::new();

        macro_rules! emit {
            ($e:expr) => {{
                starts.push(enc.len());
                $e;
            }};
        }

        for byte in 0..=u8::MAX {
            if let Some(op) = Opcode::from_u8(byte) {
                match op.shape() {
                    Shape::None => emit!(enc.add_op(op)),
                    Shape::MemoryAccess => {
                        emit!(enc.add_memory_access(op, 0, 8, false));
                        emit!(enc.add_memory_access(op, 0, 4096, false));
                        emit!(enc.add_memory_access(op, 1, 8, false));
                        emit!(enc.add_memory_access(op, 1, 100_000, false));
                        emit!(enc.add_memory_access(op, 0, 1 << 33, true));
                    }
                    // Operand-carrying forms are exercised family by
                    // family below.
                    _ => {}
                }
            }
        }

        emit!(enc.add_label(0, 0, ResultClass::None));
        emit!(enc.add_label(2, 0, ResultClass::Numeric));
        emit!(enc.add_label(200, 300, ResultClass::Mixed));
        emit!(enc.add_label(70_000, 0, ResultClass::Reference));

        emit!(enc.add_branch(Location::new(enc.len() as u32)));
        emit!(enc.add_branch(Location::ZERO));
        emit!(enc.add_branch_if(Location::new(enc.len() as u32)));
        emit!(enc.add_branch_if(Location::ZERO));
        emit!(enc.add_branch_on_null(Location::new(enc.len() as u32)));
        emit!(enc.add_branch_on_null(Location::ZERO));
        emit!({
            let field = enc.add_if();
            enc.patch_branch_target(field, Location::ZERO);
        });
        emit!(enc.add_branch_table(3));
        emit!(enc.add_branch_table(300));

        emit!(enc.add_call(1, 2));
        emit!(enc.add_call(300, 2));
        emit!(enc.add_indirect_call(1, 2, 3));
        emit!(enc.add_indirect_call(1, 2, 300));

        emit!(enc.add_i32_const(-5));
        emit!(enc.add_i32_const(40_000));
        emit!(enc.add_i64_const(100));
        emit!(enc.add_i64_const(1 << 40));
        emit!(enc.add_f32_const(1.5));
        emit!(enc.add_f64_const(2.5));

        emit!(enc.add_local_get(5));
        emit!(enc.add_local_get(300));
        emit!(enc.add_local_set(5));
        emit!(enc.add_local_set(300));
        emit!(enc.add_local_tee(5));
        emit!(enc.add_local_tee(300));
        emit!(enc.add_global_get(5));
        emit!(enc.add_global_get(300));
        emit!(enc.add_global_set(5));
        emit!(enc.add_global_set(300));

        emit!(enc.add_memory_size(0));
        emit!(enc.add_memory_grow(1));
        emit!(enc.add_ref_func(7));
        emit!(enc.add_table_get(0));
        emit!(enc.add_table_set(1));

        for byte in 0..=u8::MAX {
            if let Some(op) = MiscOp::from_u8(byte) {
                match op.shape() {
                    Shape::None => emit!(enc.add_misc(op)),
                    Shape::Bytes(4) => emit!(enc.add_misc_index(op, 9)),
                    _ => emit!(enc.add_misc_pair(op, 4, 11)),
                }
            }
        }

        for byte in 0..=u8::MAX {
            if let Some(op) = AtomicOp::from_u8(byte) {
                if op.shape() == Shape::None {
                    emit!(enc.add_atomic_fence());
                } else {
                    emit!(enc.add_atomic_access(op, 0, 16, false));
                    emit!(enc.add_atomic_access(op, 2, 1 << 34, true));
                }
            }
        }

        for byte in 0..=u8::MAX {
            if let Some(op) = VectorOp::from_u8(byte) {
                match op.shape() {
                    Shape::None => emit!(enc.add_vector_op(op)),
                    Shape::AtomicAccess => {
                        emit!(enc.add_vector_access(op, 0, 4, false));
                        emit!(enc.add_vector_access(op, 1, 1 << 35, true));
                    }
                    Shape::Bytes(1) => emit!(enc.add_vector_lane(op, 2)),
                    _ => {}
                }
            }
        }
        emit!(enc.add_vector_const(0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10));
        emit!(enc.add_vector_shuffle([7; 16]));

        // The simple label family only the reduced encoder produces.
        let mut simple = SimpleBytecodeEncoder::new();
        let mut simple_starts = Vec::new();
        simple_starts.push(simple.len());
        let top = simple.add_label(1, 2);
        simple_starts.push(simple.len());
        simple.add_branch(top);
        simple_starts.push(simple.len());
        simple.add_label(9, 100);
        simple_starts.push(simple.len());
        simple.add_op(Opcode::Return);

        fn walk(bytes: &[u8], starts: &[usize], seen: &mut [[bool; 256]; 4]) {
            let mut at = 0;
            let mut index = 0;
            while at < bytes.len() {
                assert_eq!(at, starts[index], "instruction {index} starts off the boundary");
                let op = Opcode::from_u8(bytes[at]).unwrap();
                seen[0][bytes[at] as usize] = true;
                if let Shape::Prefix(prefix) = op.shape() {
                    let space = match prefix {
                        Prefix::Misc => 1,
                        Prefix::Atomic => 2,
                        Prefix::Vector => 3,
                    };
                    seen[space][bytes[at + 1] as usize] = true;
                }
                at += instruction_len(bytes, at).unwrap();
                index += 1;
            }
            assert_eq!(at, bytes.len());
            assert_eq!(index, starts.len());
        }

        let mut seen = [[false; 256]; 4];
        walk(enc.as_slice(), &starts, &mut seen);
        walk(simple.as_slice(), &simple_starts, &mut seen);

        for byte in 0..=u8::MAX {
            let b = byte as usize;
            assert_eq!(seen[0][b], Opcode::from_u8(byte).is_some(), "primary {byte:#04x}");
            assert_eq!(seen[1][b], MiscOp::from_u8(byte).is_some(), "misc {byte:#04x}");
            assert_eq!(seen[2][b], AtomicOp::from_u8(byte).is_some(), "atomic {byte:#04x}");
            assert_eq!(seen[3][b], VectorOp::from_u8(byte).is_some(), "vector {byte:#04x}");
        }
    }

    #[test]
    fn globals_reset_skips_imports_and_evaluates_initializers() {
        let mut enc = BytecodeEncoder::new();
        enc.add_op(Opcode::Nop);
        let layout = ModuleLayout {
            globals: vec![
                GlobalSpec {
                    value_type: ValueType::I32,
                    imported: true,
                    init: GlobalInit::Value(1),
                },
                GlobalSpec {
                    value_type: ValueType::I64,
                    imported: false,
                    init: GlobalInit::Value(7),
                },
                GlobalSpec {
                    value_type: ValueType::F64,
                    imported: false,
                    init: GlobalInit::Bytecode(vec![44, 1, 0, 0]),
                },
            ],
            ..Default::default()
        };
        let image = image_of(enc, layout);
        let instance = InstanceState::new(vec![11, 22, 33], 0);
        let mut store = RecordingStore::default();
        let mut linker = FakeLinker::default();

        BytecodeDecoder::new(&image).reset_globals(&instance, &mut store, &mut linker);
        assert_eq!(store.written, vec![(ValueType::I64, 22, 7), (ValueType::F64, 33, 300)]);
    }

    #[test]
    fn active_data_header_packs_and_replays() {
        let mut enc = BytecodeEncoder::new();
        let header = enc
            .add_data_header(10_000, &DataMode::Active { memory: 0, offset: DataOffset::Address(0) });
        enc.add_bytes(&[0xAB; 10_000]);
        // u16 length, byte-wide zero value, memory zero implied by the
        // flags: a four-byte header.
        assert_eq!(
            &enc.as_slice()[header.as_usize()..header.as_usize() + 4],
            &[0x89, 0x10, 0x27, 0x00]
        );

        let image = image_of(enc, ModuleLayout { data_segments: vec![header], ..Default::default() });
        let mut instance = InstanceState::new(vec![], 1);
        let mut memory = VecMemory { bytes: vec![0; 16_384] };
        let mut linker = FakeLinker::default();
        BytecodeDecoder::new(&image)
            .reset_memories(&mut instance, &mut memory, &mut linker, None)
            .unwrap();
        assert!(memory.bytes[..10_000].iter().all(|&b| b == 0xAB));
        assert_eq!(memory.bytes[10_000], 0);

        // Replaying the same stream into a fresh equal-size memory lands
        // byte-identical contents.
        let mut second = VecMemory { bytes: vec![0; 16_384] };
        BytecodeDecoder::new(&image)
            .reset_memories(&mut instance, &mut second, &mut linker, None)
            .unwrap();
        assert_eq!(second.bytes, memory.bytes);
    }

    #[test]
    fn data_replay_past_the_memory_end_is_catchable() {
        let mut enc = BytecodeEncoder::new();
        let header = enc
            .add_data_header(8, &DataMode::Active { memory: 1, offset: DataOffset::Address(60) });
        enc.add_bytes(&[1; 8]);
        let image = image_of(enc, ModuleLayout { data_segments: vec![header], ..Default::default() });
        let mut instance = InstanceState::new(vec![], 1);
        let mut memory = VecMemory { bytes: vec![0; 64] };

        let err = BytecodeDecoder::new(&image)
            .reset_memories(&mut instance, &mut memory, &mut FakeLinker::default(), None)
            .unwrap_err();
        assert_eq!(err, DecodeError::MemoryOutOfBounds { memory: 1, offset: 60, length: 8, size: 64 });
        assert!(err.is_out_of_bounds());
        assert!(!err.is_internal());
    }

    #[test]
    fn passive_segments_swap_their_off_heap_copies_on_reset() {
        let mut enc = BytecodeEncoder::new();
        let header = enc.add_data_header(3, &DataMode::Passive);
        let payload = enc.len();
        enc.add_bytes(b"abc");
        let image = image_of(enc, ModuleLayout { data_segments: vec![header], ..Default::default() });
        let decoder = BytecodeDecoder::new(&image);
        let mut instance = InstanceState::new(vec![], 1);
        let mut memory = VecMemory { bytes: vec![] };
        let mut linker = FakeLinker::default();
        let mut alloc = TallyAllocator::default();

        decoder
            .reset_memories(&mut instance, &mut memory, &mut linker, Some(&mut alloc))
            .unwrap();
        assert_eq!(
            instance.data_instance(0),
            Some(&DataInstance {
                payload: Location::new(payload as u32),
                length: 3,
                off_heap: Some(OffHeapHandle(1)),
            })
        );

        // A second reset releases the first copy before allocating again.
        decoder
            .reset_memories(&mut instance, &mut memory, &mut linker, Some(&mut alloc))
            .unwrap();
        assert_eq!(alloc.released, vec![OffHeapHandle(1)]);
        assert_eq!(instance.data_instance(0).unwrap().off_heap, Some(OffHeapHandle(2)));

        instance.release_all(&mut alloc);
        assert_eq!(alloc.released, vec![OffHeapHandle(1), OffHeapHandle(2)]);
        assert!(instance.data_instance(0).is_none());
    }

    #[test]
    fn element_segments_replay_and_register() {
        let mut enc = BytecodeEncoder::new();
        let active = enc.add_elem_header(
            3,
            ElementKind::FuncRef,
            &ElemMode::Active { table: 1, offset: ElemOffset::Address(2) },
        );
        enc.add_elem_function(7);
        enc.add_elem_null();
        enc.add_elem_function(70_000);
        let passive = enc.add_elem_header(2, ElementKind::FuncRef, &ElemMode::Passive);
        let entries = enc.len();
        enc.add_elem_expr(&[9, 9]);
        enc.add_elem_function(1);
        let image = image_of(
            enc,
            ModuleLayout { elem_segments: vec![active, passive], ..Default::default() },
        );
        let mut tables = VecTable { slots: vec![Slot::Empty; 5] };
        let mut linker = FakeLinker::default();

        BytecodeDecoder::new(&image).reset_tables(&mut tables, &mut linker).unwrap();
        assert_eq!(
            tables.slots,
            vec![Slot::Empty, Slot::Empty, Slot::Function(7), Slot::Null, Slot::Function(70_000)]
        );
        assert_eq!(linker.registered, vec![(1, Location::new(entries as u32), 2)]);
    }

    #[test]
    fn element_replay_past_the_table_end_is_catchable() {
        let mut enc = BytecodeEncoder::new();
        let header = enc.add_elem_header(
            3,
            ElementKind::FuncRef,
            &ElemMode::Active { table: 0, offset: ElemOffset::Address(2) },
        );
        enc.add_elem_null();
        enc.add_elem_null();
        enc.add_elem_null();
        let image = image_of(enc, ModuleLayout { elem_segments: vec![header], ..Default::default() });
        let mut tables = VecTable { slots: vec![Slot::Empty; 4] };

        let err = BytecodeDecoder::new(&image)
            .reset_tables(&mut tables, &mut FakeLinker::default())
            .unwrap_err();
        assert_eq!(err, DecodeError::TableOutOfBounds { table: 0, offset: 2, count: 3, size: 4 });
        assert!(err.is_out_of_bounds());
    }

    #[test]
    fn initializer_offsets_go_through_the_linker() {
        let mut enc = BytecodeEncoder::new();
        let expr = [40, 0, 0, 0];
        let data = enc
            .add_data_header(2, &DataMode::Active { memory: 0, offset: DataOffset::Bytecode(&expr) });
        enc.add_bytes(&[0xEE, 0xFF]);
        let elem = enc.add_elem_header(
            1,
            ElementKind::FuncRef,
            &ElemMode::Active { table: 0, offset: ElemOffset::Bytecode(&expr) },
        );
        enc.add_elem_function(5);
        let image = image_of(
            enc,
            ModuleLayout {
                data_segments: vec![data],
                elem_segments: vec![elem],
                ..Default::default()
            },
        );
        let decoder = BytecodeDecoder::new(&image);
        let mut linker = FakeLinker::default();

        let mut instance = InstanceState::new(vec![], 1);
        let mut memory = VecMemory { bytes: vec![0; 64] };
        decoder.reset_memories(&mut instance, &mut memory, &mut linker, None).unwrap();
        assert_eq!(&memory.bytes[40..42], &[0xEE, 0xFF]);

        let mut tables = VecTable { slots: vec![Slot::Empty; 64] };
        decoder.reset_tables(&mut tables, &mut linker).unwrap();
        assert_eq!(tables.slots[40], Slot::Function(5));
    }
}
