//! The array pool: a registry mapping identifiers to live arrays, with a
//! LIFO free-id stack so repeatedly allocating and abandoning arrays of the
//! same shape reuses the most recently freed slot (`spec.md` §4.5, §9).

use crate::error::Trap;

struct Slot {
    data: Vec<u32>,
    live: bool,
}

/// Registry of variable-length arrays, identified by a stable non-negative
/// integer. Identifier 0 is always array 0, the executing program; it is
/// live from [`ArrayPool::boot`] until the pool is dropped.
///
/// # Examples
/// ```
/// use um::pool::ArrayPool;
///
/// let mut pool = ArrayPool::boot(vec![0, 0, 0]);
/// let id = pool.allocate(4).unwrap();
/// assert_eq!(id, 1);
/// pool.amend(id, 2, 99).unwrap();
/// assert_eq!(pool.index(id, 2).unwrap(), 99);
/// pool.abandon(id).unwrap();
/// assert_eq!(pool.allocate(0), Ok(1)); // the freed id is reused
/// ```
pub struct ArrayPool {
    slots: Vec<Slot>,
    free_ids: Vec<u32>,
}

impl ArrayPool {
    /// Installs `program` as array 0 and clears the free-id stack.
    pub fn boot(program: Vec<u32>) -> ArrayPool {
        ArrayPool {
            slots: vec![Slot {
                data: program,
                live: true,
            }],
            free_ids: Vec::new(),
        }
    }

    /// Acquires an id (preferring a previously abandoned one), attaches a
    /// fresh zero-initialized buffer of `length` words, and marks it live.
    /// `length = 0` is permitted and produces a live, zero-length array.
    pub fn allocate(&mut self, length: u32) -> Result<u32, Trap> {
        let mut data = Vec::new();
        data.try_reserve_exact(length as usize)
            .map_err(|_| Trap::AllocOutOfMemory)?;
        data.resize(length as usize, 0);

        let id = if let Some(id) = self.free_ids.pop() {
            let slot = &mut self.slots[id as usize];
            slot.data = data;
            slot.live = true;
            log::trace!("pool: reused id={} len={}", id, length);
            id
        } else {
            let id = self.slots.len() as u32;
            self.slots.push(Slot { data, live: true });
            log::trace!("pool: issued new id={} len={}", id, length);
            id
        };
        // id 0 is permanently reserved for the program and can never be
        // handed out by this path; this would indicate a bug in the
        // free-id bookkeeping above.
        if id == 0 {
            return Err(Trap::AllocIdZeroReserved);
        }
        Ok(id)
    }

    /// Releases the storage owned by `id` and pushes it onto the free-id
    /// stack. `id` must be nonzero and currently live.
    pub fn abandon(&mut self, id: u32) -> Result<(), Trap> {
        if id == 0 {
            return Err(Trap::DeallocInvalidId);
        }
        let slot = self
            .slots
            .get_mut(id as usize)
            .filter(|s| s.live)
            .ok_or(Trap::DeallocInvalidId)?;
        slot.data = Vec::new();
        slot.live = false;
        self.free_ids.push(id);
        log::trace!("pool: abandoned id={}", id);
        Ok(())
    }

    fn live_slot(&self, id: u32) -> Result<&Slot, Trap> {
        self.slots
            .get(id as usize)
            .filter(|s| s.live)
            .ok_or(Trap::IndexInactiveArray)
    }

    /// Reads the word at `offset` within array `id`.
    pub fn index(&self, id: u32, offset: u32) -> Result<u32, Trap> {
        let slot = self.live_slot(id)?;
        slot.data
            .get(offset as usize)
            .copied()
            .ok_or(Trap::IndexOffsetOob)
    }

    /// Writes `value` at `offset` within array `id`.
    pub fn amend(&mut self, id: u32, offset: u32, value: u32) -> Result<(), Trap> {
        let slot = self
            .slots
            .get_mut(id as usize)
            .filter(|s| s.live)
            .ok_or(Trap::UpdateInactiveArray)?;
        let cell = slot
            .data
            .get_mut(offset as usize)
            .ok_or(Trap::UpdateOffsetOob)?;
        *cell = value;
        Ok(())
    }

    /// Returns the length of array 0, the code segment the emulator fetches
    /// instructions from.
    pub fn array0_len(&self) -> u32 {
        self.slots[0].data.len() as u32
    }

    /// Fetches the word at `pc` within array 0.
    pub fn array0_word(&self, pc: u32) -> Option<u32> {
        self.slots[0].data.get(pc as usize).copied()
    }

    /// Replaces array 0 wholesale with an independent duplicate of array
    /// `id`, implementing opcode 12's eager-copy semantics (`spec.md` §9):
    /// the source array remains live and independently mutable afterward.
    pub fn duplicate_into_array0(&mut self, id: u32) -> Result<(), Trap> {
        let data = self.live_slot(id)?.data.clone();
        self.slots[0].data = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_zero_is_reserved_for_the_program() {
        let pool = ArrayPool::boot(vec![1, 2, 3]);
        assert_eq!(pool.array0_len(), 3);
        assert_eq!(pool.index(0, 1), Ok(2));
    }

    #[test]
    fn allocate_assigns_smallest_unused_id_then_reuses_freed() {
        let mut pool = ArrayPool::boot(vec![]);
        assert_eq!(pool.allocate(1), Ok(1));
        assert_eq!(pool.allocate(1), Ok(2));
        pool.abandon(1).unwrap();
        assert_eq!(pool.allocate(1), Ok(1), "LIFO free-id reuse");
        assert_eq!(pool.allocate(1), Ok(3));
    }

    #[test]
    fn abandon_id_zero_traps() {
        let mut pool = ArrayPool::boot(vec![]);
        assert_eq!(pool.abandon(0), Err(Trap::DeallocInvalidId));
    }

    #[test]
    fn abandon_unallocated_id_traps() {
        let mut pool = ArrayPool::boot(vec![]);
        assert_eq!(pool.abandon(5), Err(Trap::DeallocInvalidId));
    }

    #[test]
    fn index_out_of_bounds_traps() {
        let mut pool = ArrayPool::boot(vec![]);
        let id = pool.allocate(2).unwrap();
        assert_eq!(pool.index(id, 2), Err(Trap::IndexOffsetOob));
    }

    #[test]
    fn index_into_abandoned_id_traps() {
        let mut pool = ArrayPool::boot(vec![]);
        let id = pool.allocate(1).unwrap();
        pool.abandon(id).unwrap();
        assert_eq!(pool.index(id, 0), Err(Trap::IndexInactiveArray));
    }

    #[test]
    fn duplicate_into_array0_copies_independently() {
        let mut pool = ArrayPool::boot(vec![0]);
        let id = pool.allocate(2).unwrap();
        pool.amend(id, 0, 7).unwrap();
        pool.amend(id, 1, 8).unwrap();
        pool.duplicate_into_array0(id).unwrap();
        assert_eq!(pool.array0_len(), 2);
        assert_eq!(pool.array0_word(0), Some(7));

        // mutating the new array 0 must not affect the source array
        pool.amend(0, 0, 42).unwrap();
        assert_eq!(pool.index(id, 0), Ok(7));
    }

    #[test]
    fn duplicate_from_inactive_id_traps() {
        let mut pool = ArrayPool::boot(vec![0]);
        assert_eq!(pool.duplicate_into_array0(9), Err(Trap::IndexInactiveArray));
    }
}
