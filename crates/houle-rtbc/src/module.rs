//! module.rs — Frozen module image and its structural tables.
//!
//! The parser (out of scope here) freezes one stream per module and records
//! where the interesting structures start. [`ModuleImage`] owns both; the
//! decoder borrows it and never mutates it.

use houle_core::{BytecodeStream, Location, ValueType};

/// How a global's initial value is produced at reset time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlobalInit {
    /// Precomputed raw 64-bit image of the value.
    Value(u64),
    /// Initializer bytecode (reduced set) evaluated by the linker on every
    /// reset. Owned per global; not a range into the main stream.
    Bytecode(Vec<u8>),
}

/// Static description of one global.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalSpec {
    /// Declared value type.
    pub value_type: ValueType,
    /// Imported globals are owned elsewhere; resets skip them.
    pub imported: bool,
    /// Initial value source.
    pub init: GlobalInit,
}

/// Structural offsets recorded while the parser emits a module's stream.
///
/// Segment and code-entry Locations point at the first header byte.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleLayout {
    /// Global descriptions, declaration order.
    pub globals: Vec<GlobalSpec>,
    /// Data segment headers, declaration order.
    pub data_segments: Vec<Location>,
    /// Element segment headers, declaration order.
    pub elem_segments: Vec<Location>,
    /// Code entry headers, function order.
    pub code_entries: Vec<Location>,
}

/// A frozen stream plus the landmarks the decoder needs to walk it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleImage {
    stream: BytecodeStream,
    layout: ModuleLayout,
}

impl ModuleImage {
    /// Binds a frozen stream to its layout.
    pub fn new(stream: BytecodeStream, layout: ModuleLayout) -> Self {
        Self { stream, layout }
    }

    /// The frozen stream.
    pub fn stream(&self) -> &BytecodeStream {
        &self.stream
    }

    /// The raw bytes of the frozen stream.
    pub fn bytes(&self) -> &[u8] {
        self.stream.as_slice()
    }

    /// Global descriptions, declaration order.
    pub fn globals(&self) -> &[GlobalSpec] {
        &self.layout.globals
    }

    /// Data segment header offsets.
    pub fn data_segments(&self) -> &[Location] {
        &self.layout.data_segments
    }

    /// Element segment header offsets.
    pub fn elem_segments(&self) -> &[Location] {
        &self.layout.elem_segments
    }

    /// Code entry header offsets.
    pub fn code_entries(&self) -> &[Location] {
        &self.layout.code_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use houle_core::ByteWriter;

    #[test]
    fn image_exposes_its_layout() {
        let mut w = ByteWriter::new();
        w.write_u32_le(0xAABB_CCDD);
        let image = ModuleImage::new(
            w.freeze(),
            ModuleLayout {
                globals: vec![GlobalSpec {
                    value_type: ValueType::I64,
                    imported: false,
                    init: GlobalInit::Value(9),
                }],
                data_segments: vec![Location::new(1)],
                elem_segments: vec![],
                code_entries: vec![Location::new(2), Location::new(3)],
            },
        );
        assert_eq!(image.bytes().len(), 4);
        assert_eq!(image.globals().len(), 1);
        assert_eq!(image.data_segments(), &[Location::new(1)]);
        assert!(image.elem_segments().is_empty());
        assert_eq!(image.code_entries().len(), 2);
    }
}
