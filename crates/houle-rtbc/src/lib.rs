//! houle-rtbc — Encodage & resynchronisation du bytecode RTBC
//!
//! Représentation interne du moteur Houle : le parseur wasm émet un flux
//! RTBC par module, l'interpréteur le consomme, et le décodeur rejoue les
//! segments à chaque (ré)instanciation sans rien exécuter.
//!
//! Flux :
//! ```text
//! [instruction]  id u8 (+ sous-id u8 après 0xFC/0xFD/0xFE) + opérandes LE
//! [data]         flags u8 + longueur + [valeur | bytecode] + [index] + payload
//! [elem]         flags u8 + mode/genre u8 + count + table + offset + entrées
//! [code]         flags u8 + fn + pile max + longueur + locals 0-fin + résultats 0-fin
//! ```
//!
//! Largeurs : chaque opérande prend la forme la plus étroite qui contient sa
//! valeur (échelle u8 → u16 → u32, voir `bits::WidthClass`). Les branches
//! mémorisent un déplacement relatif ancré sur leur champ d'opérande, un
//! octet après l'id.
//!
//! API :
//! - `BytecodeEncoder` / `SimpleBytecodeEncoder` : émission
//! - `BytecodeDecoder` : rejouage des segments, entrées de code, sites d'appel
//! - `disasm::disassemble_full()` / `disassemble_compact()` : listings
//!
//! Ce crate ne valide ni n'exécute le wasm source (rôles du parseur et de
//! l'interpréteur) : un flux RTBC est produit par le moteur et supposé
//! auto-cohérent, tout octet inconnu est une faute interne.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

use thiserror::Error;

pub mod bits;
pub mod decode;
pub mod disasm;
pub mod encode;
pub mod host;
pub mod module;
pub mod opcode;
pub mod simple;

pub use decode::{branch_target, instruction_len, BytecodeDecoder, CallSite, CodeEntry, TypeList};
pub use encode::{BytecodeEncoder, DataMode, DataOffset, ElemMode, ElemOffset};
pub use host::{
    DataAllocator, DataInstance, ElementValue, GlobalStore, InstanceState, Linker, MemoryHost,
    OffHeapHandle, TableHost,
};
pub use module::{GlobalInit, GlobalSpec, ModuleImage, ModuleLayout};
pub use opcode::{AtomicOp, MiscOp, Opcode, Prefix, ResultClass, Shape, VectorOp};
pub use simple::SimpleBytecodeEncoder;

// Types du core qui apparaissent dans l'API publique du crate.
pub use houle_core::{BytecodeStream, CoreError, Location, ValueType};

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Decoding faults over a frozen stream.
///
/// Out-of-bounds segment replays are host-visible conditions a caller may
/// catch and surface; everything else means the stream itself is corrupt,
/// which a correct encoder never produces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Id byte outside the closed instruction set.
    #[error("unknown opcode {opcode:#04x} at offset {at}")]
    UnknownOpcode {
        /// The offending id byte.
        opcode: u8,
        /// Stream offset of the id byte.
        at: usize,
    },

    /// Sub-id byte unknown to its prefixed space.
    #[error("unknown {prefix} opcode {opcode:#04x} at offset {at}")]
    UnknownSubOpcode {
        /// The space the id byte was looked up in.
        prefix: Prefix,
        /// The offending sub-id byte.
        opcode: u8,
        /// Stream offset of the sub-id byte.
        at: usize,
    },

    /// Flags byte with an unassigned tag combination.
    #[error("malformed {what} flags {flags:#04x} at offset {at}")]
    MalformedFlags {
        /// Which header the flags belong to.
        what: &'static str,
        /// The offending byte.
        flags: u8,
        /// Stream offset of the byte.
        at: usize,
    },

    /// Active data segment reaching outside its memory.
    #[error(
        "data segment does not fit memory {memory}: {length} bytes at offset {offset}, size {size}"
    )]
    MemoryOutOfBounds {
        /// Target memory index.
        memory: u32,
        /// Destination offset, after initializer evaluation.
        offset: u64,
        /// Payload length in bytes.
        length: u64,
        /// Byte size of the memory.
        size: u64,
    },

    /// Active element segment reaching outside its table.
    #[error(
        "element segment does not fit table {table}: {count} entries at offset {offset}, size {size}"
    )]
    TableOutOfBounds {
        /// Target table index.
        table: u32,
        /// Destination offset, after initializer evaluation.
        offset: u64,
        /// Entry count.
        count: u32,
        /// Entry capacity of the table.
        size: u32,
    },

    /// Read past the end of the stream.
    #[error("truncated stream: {0}")]
    Truncated(#[from] CoreError),

    /// Branch operand resolving outside the stream.
    #[error("branch at offset {at} resolves outside the stream (target {target})")]
    BranchOutOfStream {
        /// Offset of the branch instruction.
        at: usize,
        /// The resolved absolute target.
        target: i64,
    },

    /// Code entry whose body length reaches before the stream start.
    #[error("code entry at offset {at} claims a {length}-byte body before the stream start")]
    BodyOutOfStream {
        /// Offset of the entry header.
        at: usize,
        /// Claimed body length.
        length: u32,
    },

    /// Instruction scan crossing a body boundary.
    #[error("instruction at offset {at} runs past the body end {end}")]
    ScanOverrun {
        /// Offset of the instruction that crosses the boundary.
        at: usize,
        /// Body end offset.
        end: usize,
    },
}

impl DecodeError {
    /// True for segment replays the host can catch: the stream is sound,
    /// the target memory or table is just too small.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            DecodeError::MemoryOutOfBounds { .. } | DecodeError::TableOutOfBounds { .. }
        )
    }

    /// True when the stream itself is corrupt.
    pub fn is_internal(&self) -> bool {
        !self.is_out_of_bounds()
    }
}

/// Résultat commun du décodeur.
pub type DecodeResult<T> = core::result::Result<T, DecodeError>;

/* ─────────────────────────── Prélude ─────────────────────────── */

/// Prélude pratique pour importer d'un coup.
pub mod prelude {
    pub use crate::decode::{branch_target, instruction_len, BytecodeDecoder, CallSite, CodeEntry};
    pub use crate::encode::{BytecodeEncoder, DataMode, DataOffset, ElemMode, ElemOffset};
    pub use crate::host::{
        DataAllocator, ElementValue, GlobalStore, InstanceState, Linker, MemoryHost, TableHost,
    };
    pub use crate::module::{GlobalInit, GlobalSpec, ModuleImage, ModuleLayout};
    pub use crate::opcode::{AtomicOp, MiscOp, Opcode, ResultClass, VectorOp};
    pub use crate::simple::SimpleBytecodeEncoder;
    pub use crate::{DecodeError, DecodeResult};
    pub use houle_core::{Location, ValueType};
}

/* ─────────────────────────── Tests ─────────────────────────── */
