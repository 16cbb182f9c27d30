//! Per-type routing of register requests and liveness pruning.

#[cfg(not(feature = "std"))]
use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};
#[cfg(feature = "std")]
use std::collections::{BTreeMap, BTreeSet};

use super::block::{Register, RegisterBlock};
use crate::error::ScheduleError;
use crate::graph::{DataType, ModuleId};

/// Identifier of a block inside a [`RegisterAllocationContext`].
///
/// Stable for the lifetime of the context: replacing the block for a type
/// keeps its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Weak handle to an allocated register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterRef {
    /// Block holding the register.
    pub block: BlockId,
    /// Register index within the block.
    pub index: usize,
}

/// What [`RegisterAllocationContext::alloc`] does for a type with no block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnregisteredTypePolicy {
    /// Fail the pass with [`ScheduleError::UnregisteredType`].
    #[default]
    Error,
    /// Leave the output without a register and carry on.
    Skip,
}

/// Routes allocation requests to the block matching a data type.
///
/// Blocks are installed by the caller before scheduling; the context never
/// creates one on its own.
#[derive(Debug, Default, Clone)]
pub struct RegisterAllocationContext {
    blocks: Vec<RegisterBlock>,
    by_type: BTreeMap<DataType, BlockId>,
    policy: UnregisteredTypePolicy,
}

impl RegisterAllocationContext {
    /// Creates an empty context with the default [`UnregisteredTypePolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy for types without a block.
    pub fn with_policy(mut self, policy: UnregisteredTypePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the policy for types without a block.
    pub fn policy(&self) -> UnregisteredTypePolicy {
        self.policy
    }

    /// Installs `block` for its data type. A block already serving that
    /// type is replaced (last write wins) and keeps its [`BlockId`].
    pub fn set_registers(&mut self, block: RegisterBlock) -> BlockId {
        if let Some(&id) = self.by_type.get(block.data_type()) {
            self.blocks[id.0 as usize] = block;
            return id;
        }
        let id = BlockId(self.blocks.len() as u32);
        self.by_type.insert(block.data_type().clone(), id);
        self.blocks.push(block);
        id
    }

    /// Returns the block serving `data_type`.
    pub fn registers(&self, data_type: &DataType) -> Option<&RegisterBlock> {
        let id = self.by_type.get(data_type)?;
        self.blocks.get(id.0 as usize)
    }

    /// Returns the block serving `data_type`, mutably.
    pub fn registers_mut(&mut self, data_type: &DataType) -> Option<&mut RegisterBlock> {
        let id = self.by_type.get(data_type)?;
        self.blocks.get_mut(id.0 as usize)
    }

    /// Returns a block by id.
    pub fn block(&self, id: BlockId) -> Option<&RegisterBlock> {
        self.blocks.get(id.0 as usize)
    }

    /// Iterates over every installed block.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &RegisterBlock)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (BlockId(i as u32), b))
    }

    /// Resolves a handle to its register.
    pub fn register(&self, reg: RegisterRef) -> Option<&Register> {
        self.block(reg.block)?.register(reg.index)
    }

    /// Total registers allocated across all blocks.
    pub fn allocated_count(&self) -> usize {
        self.blocks.iter().map(RegisterBlock::allocated_count).sum()
    }

    /// Allocates a register of `data_type` owned by `owner`.
    ///
    /// Returns `Ok(None)` when no block serves the type and the policy is
    /// [`UnregisteredTypePolicy::Skip`].
    pub fn alloc(
        &mut self,
        owner: ModuleId,
        data_type: &DataType,
    ) -> Result<Option<RegisterRef>, ScheduleError> {
        let Some(&id) = self.by_type.get(data_type) else {
            return match self.policy {
                UnregisteredTypePolicy::Error => Err(ScheduleError::UnregisteredType {
                    data_type: data_type.clone(),
                    module: owner,
                }),
                UnregisteredTypePolicy::Skip => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("reg_alloc: no block for type '{data_type}', {owner} output left without storage");
                    Ok(None)
                }
            };
        };
        let block = &mut self.blocks[id.0 as usize];
        let index = block.alloc()?;
        if let Some(reg) = block.register_mut(index) {
            reg.set_owner(Some(owner));
        }
        Ok(Some(RegisterRef { block: id, index }))
    }

    /// Records that `module` will read `reg` (extends its live range).
    pub(crate) fn add_child(&mut self, reg: RegisterRef, module: ModuleId) {
        if let Some(r) = self
            .blocks
            .get_mut(reg.block.0 as usize)
            .and_then(|b| b.register_mut(reg.index))
        {
            r.add_child(module);
        }
    }

    /// Liveness reclamation after `module` has been scheduled.
    ///
    /// Removes `module` from every allocated register's children. Registers
    /// left with no children are freed unless their owner is in `exempt`.
    /// Returns the number of registers freed.
    pub fn prune(&mut self, module: ModuleId, exempt: &BTreeSet<ModuleId>) -> usize {
        let mut freed = 0;
        for block in &mut self.blocks {
            let mut dead = Vec::new();
            for index in block.allocated().collect::<Vec<_>>() {
                let Some(reg) = block.register_mut(index) else {
                    continue;
                };
                reg.remove_child(module);
                let pinned = reg.owner().is_some_and(|owner| exempt.contains(&owner));
                if reg.children().is_empty() && !pinned {
                    dead.push(index);
                }
            }
            for index in dead {
                if block.free(index).is_ok() {
                    freed += 1;
                }
            }
        }
        freed
    }

    /// Frees every register in every block.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
    }

    /// Resets every block's high-water mark.
    pub fn reset_peaks(&mut self) {
        for block in &mut self.blocks {
            block.reset_peak();
        }
    }
}
