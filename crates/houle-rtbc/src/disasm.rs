//! Minimal textual listings of RTBC streams, used by debug tooling.
//!
//! Every cursor move goes through [`instruction_len`], so a listing always
//! agrees with what the decoder would scan. Branch operands render as the
//! absolute offsets they resolve to.

use core::fmt::Write;
use core::ops::Range;

use houle_core::{ByteReader, ValueType};

use crate::bits::{
    memory_offset_width, MEM_ADDR64, LABEL_RESULT_SHIFT, LABEL_SIMPLE_COUNT_SHIFT,
    LABEL_SIMPLE_DEPTH_MASK, LABEL_U16_COUNT_MASK, LABEL_U8_COUNT_BIT, LABEL_U8_DEPTH_MASK,
};
use crate::decode::{branch_target, instruction_len, BytecodeDecoder};
use crate::module::{GlobalInit, ModuleImage};
use crate::opcode::{AtomicOp, MiscOp, Opcode, Prefix, ResultClass, Shape, VectorOp};
use crate::{DecodeError, DecodeResult};

/// Multi-line, human readable listing of a whole image: layout summary,
/// globals, then every code entry with its disassembled body.
pub fn disassemble_full(image: &ModuleImage, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {title} == (bytes={}, globals={}, data={}, elem={}, code={})",
        image.bytes().len(),
        image.globals().len(),
        image.data_segments().len(),
        image.elem_segments().len(),
        image.code_entries().len(),
    );

    for (index, global) in image.globals().iter().enumerate() {
        let _ = write!(out, ";; global[{index}] {}", global.value_type);
        if global.imported {
            let _ = write!(out, " (import)");
        }
        match &global.init {
            GlobalInit::Value(value) => {
                let _ = writeln!(out, " = {value}");
            }
            GlobalInit::Bytecode(bytecode) => {
                let _ = writeln!(out, " = expr[{}]", bytecode.len());
            }
        }
    }

    let decoder = BytecodeDecoder::new(image);
    for index in 0..image.code_entries().len() as u32 {
        let _ = writeln!(out);
        match decoder.read_code_entry(index) {
            Ok(entry) => {
                let body = entry.body_range();
                let _ = writeln!(
                    out,
                    ";; code[{index}] fn={} stack={} body={}..{} locals={} results={}",
                    entry.function_index,
                    entry.max_stack_size,
                    body.start,
                    body.end,
                    show_types(&entry.locals),
                    show_types(&entry.results),
                );
                out.push_str(&disassemble_range(image.bytes(), body));
            }
            Err(err) => {
                let _ = writeln!(out, ";; code[{index}] !! {err}");
            }
        }
    }

    out
}

/// One line per instruction over a whole stream.
pub fn disassemble_compact(bc: &[u8]) -> String {
    disassemble_range(bc, 0..bc.len())
}

/// One line per instruction over a byte range. Rendering stops at the
/// first undecodable instruction with a `!!` line naming the fault.
pub fn disassemble_range(bc: &[u8], range: Range<usize>) -> String {
    let mut out = String::new();
    let mut at = range.start;
    while at < range.end {
        match write_instruction(&mut out, bc, at) {
            Ok(len) => at += len,
            Err(err) => {
                let _ = writeln!(out, "{at:06}: !! {err}");
                break;
            }
        }
    }
    out
}

fn write_instruction(out: &mut String, bc: &[u8], at: usize) -> DecodeResult<usize> {
    let len = instruction_len(bc, at)?;
    let mut r = ByteReader::at(bc, at);
    let byte = r.read_u8()?;
    let op = Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode { opcode: byte, at })?;
    let _ = write!(out, "{at:06}: ");
    match op {
        Opcode::LabelU8 => {
            let packed = r.read_u8()?;
            let _ = write!(
                out,
                "{op} count={} depth={} class={}",
                u32::from(packed & LABEL_U8_COUNT_BIT != 0),
                packed & LABEL_U8_DEPTH_MASK,
                ResultClass::from_bits(packed >> LABEL_RESULT_SHIFT),
            );
        }
        Opcode::LabelU16 => {
            let packed = r.read_u8()?;
            let depth = r.read_u8()?;
            let _ = write!(
                out,
                "{op} count={} depth={depth} class={}",
                packed & LABEL_U16_COUNT_MASK,
                ResultClass::from_bits(packed >> LABEL_RESULT_SHIFT),
            );
        }
        Opcode::LabelU32 => {
            let class = ResultClass::from_bits(r.read_u8()?);
            let count = r.read_u16_le()?;
            let depth = r.read_u16_le()?;
            let _ = write!(out, "{op} count={count} depth={depth} class={class}");
        }
        Opcode::LabelI32 => {
            let class = ResultClass::from_bits(r.read_u8()?);
            let count = r.read_u32_le()?;
            let depth = r.read_u32_le()?;
            let _ = write!(out, "{op} count={count} depth={depth} class={class}");
        }
        Opcode::LabelSimpleU8 => {
            let packed = r.read_u8()?;
            let _ = write!(
                out,
                "{op} count={} depth={}",
                packed >> LABEL_SIMPLE_COUNT_SHIFT,
                packed & LABEL_SIMPLE_DEPTH_MASK,
            );
        }
        Opcode::LabelSimpleU32 => {
            let count = r.read_u16_le()?;
            let depth = r.read_u16_le()?;
            let _ = write!(out, "{op} count={count} depth={depth}");
        }
        Opcode::BrU8
        | Opcode::BrI32
        | Opcode::BrIfU8
        | Opcode::BrIfI32
        | Opcode::BrOnNullU8
        | Opcode::BrOnNullI32
        | Opcode::If => {
            let _ = write!(out, "{op}");
            if let Some(target) = branch_target(bc, at)? {
                let _ = write!(out, " -> {target:06}");
            }
        }
        Opcode::BrTableU8 | Opcode::BrTableI32 => {
            let count = if op == Opcode::BrTableU8 {
                r.read_u8()? as u32
            } else {
                r.read_u32_le()?
            };
            r.skip(2)?;
            let _ = write!(out, "{op} count={count} [");
            for entry in 0..count {
                let field = r.offset() as i64;
                let rel = r.read_i32_le()? as i64;
                r.skip(2)?;
                if entry > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{:06}", field + rel);
            }
            out.push(']');
        }
        Opcode::CallU8 => {
            let node = r.read_u8()?;
            let function = r.read_u8()?;
            let _ = write!(out, "{op} node={node} fn={function}");
        }
        Opcode::CallI32 => {
            let node = r.read_u32_le()?;
            let function = r.read_u32_le()?;
            let _ = write!(out, "{op} node={node} fn={function}");
        }
        Opcode::CallIndirectU8 => {
            let node = r.read_u8()?;
            let type_index = r.read_u8()?;
            let table = r.read_u8()?;
            let _ = write!(out, "{op} node={node} type={type_index} table={table}");
        }
        Opcode::CallIndirectI32 => {
            let node = r.read_u32_le()?;
            let type_index = r.read_u32_le()?;
            let table = r.read_u32_le()?;
            let _ = write!(out, "{op} node={node} type={type_index} table={table}");
        }
        Opcode::I32ConstI8 | Opcode::I64ConstI8 => {
            let _ = write!(out, "{op} {}", r.read_i8()?);
        }
        Opcode::I32ConstI32 => {
            let _ = write!(out, "{op} {}", r.read_i32_le()?);
        }
        Opcode::I64ConstI64 => {
            let _ = write!(out, "{op} {}", r.read_u64_le()? as i64);
        }
        Opcode::F32Const => {
            let _ = write!(out, "{op} {}", r.read_f32_le()?);
        }
        Opcode::F64Const => {
            let _ = write!(out, "{op} {}", r.read_f64_le()?);
        }
        Opcode::LocalGetU8
        | Opcode::LocalSetU8
        | Opcode::LocalTeeU8
        | Opcode::GlobalGetU8
        | Opcode::GlobalSetU8 => {
            let _ = write!(out, "{op} {}", r.read_u8()?);
        }
        Opcode::LocalGetI32
        | Opcode::LocalSetI32
        | Opcode::LocalTeeI32
        | Opcode::GlobalGetI32
        | Opcode::GlobalSetI32
        | Opcode::MemorySize
        | Opcode::MemoryGrow
        | Opcode::RefFunc
        | Opcode::TableGet
        | Opcode::TableSet => {
            let _ = write!(out, "{op} {}", r.read_u32_le()?);
        }
        Opcode::MiscPrefix => {
            let sub_at = r.offset();
            let byte = r.read_u8()?;
            let sub = MiscOp::from_u8(byte).ok_or(DecodeError::UnknownSubOpcode {
                prefix: Prefix::Misc,
                opcode: byte,
                at: sub_at,
            })?;
            match sub.shape() {
                Shape::Bytes(4) => {
                    let _ = write!(out, "{sub} {}", r.read_u32_le()?);
                }
                Shape::Bytes(8) => {
                    let first = r.read_u32_le()?;
                    let second = r.read_u32_le()?;
                    let _ = write!(out, "{sub} {first} {second}");
                }
                _ => {
                    let _ = write!(out, "{sub}");
                }
            }
        }
        Opcode::AtomicPrefix => {
            let sub_at = r.offset();
            let byte = r.read_u8()?;
            let sub = AtomicOp::from_u8(byte).ok_or(DecodeError::UnknownSubOpcode {
                prefix: Prefix::Atomic,
                opcode: byte,
                at: sub_at,
            })?;
            let _ = write!(out, "{sub}");
            if sub.shape() == Shape::AtomicAccess {
                write_wide_access(out, &mut r)?;
            }
        }
        Opcode::VectorPrefix => {
            let sub_at = r.offset();
            let byte = r.read_u8()?;
            let sub = VectorOp::from_u8(byte).ok_or(DecodeError::UnknownSubOpcode {
                prefix: Prefix::Vector,
                opcode: byte,
                at: sub_at,
            })?;
            let _ = write!(out, "{sub}");
            match sub.shape() {
                Shape::AtomicAccess => write_wide_access(out, &mut r)?,
                Shape::Bytes(1) => {
                    let _ = write!(out, " lane={}", r.read_u8()?);
                }
                Shape::Bytes(16) => {
                    for byte in r.read_bytes(16)? {
                        let _ = write!(out, " {byte:02x}");
                    }
                }
                _ => {}
            }
        }
        _ => match op.shape() {
            // All remaining 1- and 4-byte shapes are the narrow memory
            // forms, offset on memory 0.
            Shape::Bytes(1) => {
                let _ = write!(out, "{op} offset={}", r.read_u8()?);
            }
            Shape::Bytes(4) => {
                let _ = write!(out, "{op} offset={}", r.read_u32_le()?);
            }
            Shape::MemoryAccess => {
                let _ = write!(out, "{op}");
                let flags_at = r.offset();
                let flags = r.read_u8()?;
                let width = memory_offset_width(flags).ok_or(DecodeError::MalformedFlags {
                    what: "memory access",
                    flags,
                    at: flags_at,
                })?;
                let memory = r.read_u32_le()?;
                let offset = match width {
                    1 => r.read_u8()? as u64,
                    4 => r.read_u32_le()? as u64,
                    _ => r.read_u64_le()?,
                };
                let _ = write!(out, " mem={memory} offset={offset}");
                if flags & MEM_ADDR64 != 0 {
                    let _ = write!(out, " addr64");
                }
            }
            _ => {
                let _ = write!(out, "{op}");
            }
        },
    }
    let _ = writeln!(out);
    Ok(len)
}

/// Flags byte, memory index and flagged-width offset of an atomic or
/// vector access.
fn write_wide_access(out: &mut String, r: &mut ByteReader<'_>) -> DecodeResult<()> {
    let flags = r.read_u8()?;
    let memory = r.read_u32_le()?;
    let offset = if flags & MEM_ADDR64 != 0 {
        r.read_u64_le()?
    } else {
        r.read_u32_le()? as u64
    };
    let _ = write!(out, " mem={memory} offset={offset}");
    if flags & MEM_ADDR64 != 0 {
        let _ = write!(out, " addr64");
    }
    Ok(())
}

fn show_types(types: &[ValueType]) -> String {
    let mut out = String::from("[");
    for (index, ty) in types.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{ty}");
    }
    out.push(']');
    out
}
