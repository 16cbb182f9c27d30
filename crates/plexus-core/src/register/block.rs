//! Fixed-capacity register pool for one data type.
//!
//! A [`RegisterBlock`] never grows. Allocation beyond its capacity fails with
//! [`RegisterError::Exhausted`]; callers size blocks up front, for example
//! from a [`plan_capacities`](crate::plan_capacities) dry run.
//!
//! Register indices are issued from the top down: slot `i` carries index
//! `capacity - 1 - i` and the lowest free slot is always taken first, so a
//! fresh block of capacity 4 hands out 3, 2, 1, 0.

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeSet, string::String, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeSet;

use crate::error::RegisterError;
use crate::graph::{DataType, ModuleId};

/// A single storage slot.
#[derive(Debug, Clone)]
pub struct Register {
    index: usize,
    owner: Option<ModuleId>,
    /// Consumer modules that still need this register's value.
    children: BTreeSet<ModuleId>,
}

impl Register {
    fn new(index: usize) -> Self {
        Self {
            index,
            owner: None,
            children: BTreeSet::new(),
        }
    }

    /// Position within the owning block. Immutable.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Module whose output currently occupies this register.
    pub fn owner(&self) -> Option<ModuleId> {
        self.owner
    }

    /// Modules still waiting to read this register (its live range).
    pub fn children(&self) -> &BTreeSet<ModuleId> {
        &self.children
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ModuleId>) {
        self.owner = owner;
    }

    pub(crate) fn add_child(&mut self, module: ModuleId) {
        self.children.insert(module);
    }

    pub(crate) fn remove_child(&mut self, module: ModuleId) -> bool {
        self.children.remove(&module)
    }

    fn release(&mut self) {
        self.owner = None;
        self.children.clear();
    }
}

/// Pool of registers serving one data type.
#[derive(Debug, Clone)]
pub struct RegisterBlock {
    name: String,
    data_type: DataType,
    registers: Vec<Register>,
    /// Free slot positions; the lowest is handed out first.
    free: BTreeSet<usize>,
    /// Allocated register indices.
    allocated: BTreeSet<usize>,
    peak: usize,
}

impl RegisterBlock {
    /// Creates a block with `capacity` registers for `data_type`.
    pub fn new(name: impl Into<String>, data_type: DataType, capacity: usize) -> Self {
        let registers = (0..capacity).map(|i| Register::new(capacity - 1 - i)).collect();
        Self {
            name: name.into(),
            data_type,
            registers,
            free: (0..capacity).collect(),
            allocated: BTreeSet::new(),
            peak: 0,
        }
    }

    /// Block name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data type served by this block.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Fixed number of registers.
    pub fn capacity(&self) -> usize {
        self.registers.len()
    }

    /// Number of registers currently allocated.
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    /// Highest simultaneous allocation count since construction or the
    /// last [`reset_peak()`](Self::reset_peak).
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Resets the high-water mark to the current allocation count.
    pub fn reset_peak(&mut self) {
        self.peak = self.allocated.len();
    }

    /// Indices of allocated registers, ascending.
    pub fn allocated(&self) -> impl Iterator<Item = usize> + '_ {
        self.allocated.iter().copied()
    }

    /// Returns true if the register at `index` is allocated.
    pub fn is_allocated(&self, index: usize) -> bool {
        self.allocated.contains(&index)
    }

    /// Returns the register with the given index.
    pub fn register(&self, index: usize) -> Option<&Register> {
        let slot = self.slot_of(index)?;
        self.registers.get(slot)
    }

    pub(crate) fn register_mut(&mut self, index: usize) -> Option<&mut Register> {
        let slot = self.slot_of(index)?;
        self.registers.get_mut(slot)
    }

    /// Draws one unused register and returns its index.
    ///
    /// The returned register has no owner and no children.
    pub fn alloc(&mut self) -> Result<usize, RegisterError> {
        let slot = self.free.pop_first().ok_or_else(|| RegisterError::Exhausted {
            block: self.name.clone(),
            capacity: self.capacity(),
        })?;
        let reg = &mut self.registers[slot];
        reg.release();
        let index = reg.index;
        self.allocated.insert(index);
        self.peak = self.peak.max(self.allocated.len());
        #[cfg(feature = "tracing")]
        tracing::trace!("reg_alloc: {}:{index}", self.name);
        Ok(index)
    }

    /// Returns the register at `index` to the pool and clears its live range.
    pub fn free(&mut self, index: usize) -> Result<(), RegisterError> {
        if !self.allocated.remove(&index) {
            return Err(RegisterError::NotAllocated {
                block: self.name.clone(),
                index,
            });
        }
        let slot = self.capacity() - 1 - index;
        self.registers[slot].release();
        self.free.insert(slot);
        #[cfg(feature = "tracing")]
        tracing::trace!("reg_free: {}:{index}", self.name);
        Ok(())
    }

    /// Frees every allocated register.
    pub fn clear(&mut self) {
        let indices: Vec<usize> = self.allocated.iter().copied().collect();
        for index in indices {
            // Every index came from `allocated`, so this cannot fail.
            let _ = self.free(index);
        }
    }

    fn slot_of(&self, index: usize) -> Option<usize> {
        (index < self.capacity()).then(|| self.capacity() - 1 - index)
    }
}
