//! host.rs — The collaborator boundary of the decoder.
//!
//! Resynchronization never touches engine state directly: globals, memories,
//! tables, constant-expression evaluation and off-heap allocation all sit
//! behind these in-process traits. The decoder stays testable with mocks and
//! the engine keeps its representations private.

use houle_core::{Location, ValueType};

/// Opaque handle to an off-heap copy of a passive data segment.
///
/// Exclusively owned: released before replacement on each reset and exactly
/// once when the owning instance is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffHeapHandle(pub u64);

/// One element segment entry, as replayed into a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementValue<'a> {
    /// Null reference.
    Null,
    /// Function reference by index.
    Function(u32),
    /// Initializer expression the host evaluates on use.
    Expr(&'a [u8]),
}

/// Global registry of an instance.
pub trait GlobalStore {
    /// Stores a raw 64-bit value image for the global at `address`.
    fn store(&mut self, value_type: ValueType, address: u32, value: u64);
}

/// Linear memories of an instance.
pub trait MemoryHost {
    /// Current byte size of `memory`.
    fn byte_size(&self, memory: u32) -> u64;

    /// Copies `src` into `memory` starting at `dest`. Callers bounds-check
    /// first; `dest + src.len()` never exceeds [`Self::byte_size`].
    fn initialize(&mut self, memory: u32, src: &[u8], dest: u64);
}

/// Tables of an instance.
pub trait TableHost {
    /// Current entry count of `table`.
    fn size(&self, table: u32) -> u32;

    /// Grows `table` by `delta` entries; returns the previous size.
    fn grow(&mut self, table: u32, delta: u32) -> u32;

    /// Writes one entry. Callers bounds-check against [`Self::size`].
    fn set(&mut self, table: u32, at: u32, value: ElementValue<'_>);
}

/// Link-time services: constant-expression evaluation and passive element
/// registration.
pub trait Linker {
    /// Evaluates a short initializer sequence to its raw 64-bit result.
    /// The bytecode was validated upstream and is trusted here.
    fn eval_constant_expr(&mut self, bytecode: &[u8]) -> u64;

    /// Records where a passive or declarative element segment's entries
    /// start, for later `table.init`.
    fn register_passive_elements(&mut self, segment: u32, entries: Location, count: u32);
}

/// Off-heap allocator for passive data segments, when the embedder keeps
/// memories outside the managed heap.
pub trait DataAllocator {
    /// Copies `bytes` off-heap and returns the owning handle.
    fn allocate(&mut self, bytes: &[u8]) -> OffHeapHandle;

    /// Releases a handle returned by [`Self::allocate`].
    fn release(&mut self, handle: OffHeapHandle);
}

/* ─────────────────────────── Instance state ─────────────────────────── */

/// A passive data segment instantiated into an instance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataInstance {
    /// Payload start in the frozen stream.
    pub payload: Location,
    /// Payload length in bytes.
    pub length: u32,
    /// Off-heap copy, when an allocator was supplied.
    pub off_heap: Option<OffHeapHandle>,
}

/// Per-instance bookkeeping written by the decoder during resets.
///
/// The frozen stream never changes; everything mutable lives here.
#[derive(Debug, Default)]
pub struct InstanceState {
    global_addresses: Vec<u32>,
    data: Vec<Option<DataInstance>>,
}

impl InstanceState {
    /// State for an instance with the given global addresses and data
    /// segment count. Addresses are assigned by the embedder, one per
    /// global, declaration order.
    pub fn new(global_addresses: Vec<u32>, data_segment_count: usize) -> Self {
        Self { global_addresses, data: vec![None; data_segment_count] }
    }

    /// Registry address of a global.
    pub fn global_address(&self, global: u32) -> u32 {
        self.global_addresses[global as usize]
    }

    /// Current instantiation of a passive data segment, if any.
    pub fn data_instance(&self, segment: u32) -> Option<&DataInstance> {
        self.data[segment as usize].as_ref()
    }

    /// Removes and returns a segment's instantiation. The caller owns any
    /// off-heap handle it carries.
    pub fn take_data(&mut self, segment: u32) -> Option<DataInstance> {
        self.data[segment as usize].take()
    }

    /// Installs a segment's instantiation. The slot must be empty; resets
    /// take the prior instantiation first.
    pub fn install_data(&mut self, segment: u32, instance: DataInstance) {
        let slot = &mut self.data[segment as usize];
        debug_assert!(slot.is_none(), "segment {segment} instantiated twice without a take");
        *slot = Some(instance);
    }

    /// Releases every off-heap handle and clears the slots. Idempotent;
    /// called when the instance is discarded.
    pub fn release_all(&mut self, allocator: &mut dyn DataAllocator) {
        for slot in &mut self.data {
            if let Some(handle) = slot.take().and_then(|inst| inst.off_heap) {
                allocator.release(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingAllocator {
        next: u64,
        live: Vec<u64>,
        released: Vec<u64>,
    }

    impl DataAllocator for CountingAllocator {
        fn allocate(&mut self, _bytes: &[u8]) -> OffHeapHandle {
            self.next += 1;
            self.live.push(self.next);
            OffHeapHandle(self.next)
        }

        fn release(&mut self, handle: OffHeapHandle) {
            assert!(self.live.contains(&handle.0), "release of a foreign handle");
            assert!(!self.released.contains(&handle.0), "double release");
            self.released.push(handle.0);
        }
    }

    #[test]
    fn release_all_is_idempotent_and_exact() {
        let mut alloc = CountingAllocator::default();
        let mut state = InstanceState::new(vec![], 3);
        for segment in 0..2u32 {
            let handle = alloc.allocate(&[]);
            state.install_data(
                segment,
                DataInstance { payload: Location::ZERO, length: 0, off_heap: Some(handle) },
            );
        }
        // Slot 2 stays empty; one slot without an off-heap copy.
        state.release_all(&mut alloc);
        state.release_all(&mut alloc);
        assert_eq!(alloc.released, vec![1, 2]);
    }

    #[test]
    fn take_then_install_replaces_an_instantiation() {
        let mut state = InstanceState::new(vec![7, 8], 1);
        assert_eq!(state.global_address(1), 8);
        state.install_data(
            0,
            DataInstance { payload: Location::new(4), length: 2, off_heap: None },
        );
        let prior = state.take_data(0).unwrap();
        assert_eq!(prior.payload, Location::new(4));
        assert!(state.data_instance(0).is_none());
        state.install_data(
            0,
            DataInstance { payload: Location::new(9), length: 2, off_heap: None },
        );
        assert_eq!(state.data_instance(0).unwrap().payload, Location::new(9));
    }
}
