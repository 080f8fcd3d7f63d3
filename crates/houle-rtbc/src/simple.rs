//! simple.rs — Reduced encoder for synthesized sequences.
//!
//! Constant-expression initializers and linker-built stubs need only a
//! slice of the instruction set, and their labels carry no result-type
//! refinement. [`SimpleBytecodeEncoder`] covers exactly that slice. Every
//! layout it shares with the full encoder goes through the `emit_*`
//! helpers in `encode`, so the two cannot disagree on a byte.
//!
//! A stream is built by exactly one encoder; the two kinds are never
//! interleaved in the same stream.

use houle_core::{ByteWriter, BytecodeStream, Location};
use tracing::debug;

use crate::bits::{LABEL_SIMPLE_COUNT_SHIFT, LABEL_SIMPLE_DEPTH_MASK};
use crate::encode::{
    emit_branch, emit_branch_if, emit_branch_if_location, emit_branch_location,
    emit_branch_table, emit_call, emit_f32_const, emit_f64_const, emit_i32_const,
    emit_i64_const, emit_indirect_call, emit_op, emit_patch_branch,
};
use crate::opcode::Opcode;

/// Append-only builder of a reduced-instruction-set RTBC stream.
#[derive(Debug, Default)]
pub struct SimpleBytecodeEncoder {
    w: ByteWriter,
}

impl SimpleBytecodeEncoder {
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
        debug!(bytes = self.w.len(), "rtbc stream frozen (reduced set)");
        self.w.freeze()
    }

    /// One opcode with no operands.
    pub fn add_op(&mut self, op: Opcode) {
        emit_op(&mut self.w, op);
    }

    /// Simple label record: packed byte, or u16 count and depth when the
    /// packed form does not fit. Branch targets point at the returned
    /// Location.
    pub fn add_label(&mut self, result_count: u32, stack_depth: u32) -> Location {
        let at = self.w.position();
        if result_count <= 3 && stack_depth <= LABEL_SIMPLE_DEPTH_MASK as u32 {
            self.w.write_u8(Opcode::LabelSimpleU8.to_u8());
            self.w
                .write_u8(((result_count as u8) << LABEL_SIMPLE_COUNT_SHIFT) | stack_depth as u8);
        } else {
            assert!(
                result_count <= u16::MAX as u32 && stack_depth <= u16::MAX as u32,
                "label record {result_count}/{stack_depth} exceeds the u16 form"
            );
            self.w.write_u8(Opcode::LabelSimpleU32.to_u8());
            self.w.write_u16_le(result_count as u16);
            self.w.write_u16_le(stack_depth as u16);
        }
        at
    }

    /// Simple label followed by the loop marker.
    pub fn add_loop_label(&mut self, result_count: u32, stack_depth: u32) -> Location {
        let at = self.add_label(result_count, stack_depth);
        self.w.write_u8(Opcode::Loop.to_u8());
        at
    }

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

    /// Resolves a reserved 4-byte target field.
    pub fn patch_branch_target(&mut self, at: Location, target: Location) {
        emit_patch_branch(&mut self.w, at, target);
    }

    /// Branch table; returns each entry's target field.
    pub fn add_branch_table(&mut self, count: u32) -> Vec<Location> {
        emit_branch_table(&mut self.w, count)
    }

    /// Direct call.
    pub fn add_call(&mut self, node: u32, function: u32) {
        emit_call(&mut self.w, node, function);
    }

    /// Indirect call.
    pub fn add_indirect_call(&mut self, node: u32, type_index: u32, table: u32) {
        emit_indirect_call(&mut self.w, node, type_index, table);
    }

    /// i32 constant.
    pub fn add_i32_const(&mut self, value: i32) {
        emit_i32_const(&mut self.w, value);
    }

    /// i64 constant.
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
}
