//! Arena - index-addressed node storage with a free list.
//!
//! Backs the intrusive FIFO lists of one book side. Nodes are addressed by
//! `u32` indices instead of pointers, so the per-level id maps hold plain
//! integers and nothing can dangle. Slots are recycled through a free list
//! threaded through the `next` field of unused nodes; when the free list
//! runs dry the arena grows by one node.

use std::fmt;

use crate::command::Order;

/// Sentinel value representing a null/invalid index (like nullptr)
pub const NULL_INDEX: u32 = u32::MAX;

/// Compressed pointer into an [`Arena`].
pub type ArenaIndex = u32;

/// One order plus its list linkage - exactly 64 bytes (one cache line).
///
/// | Field      | Type    | Offset | Size |
/// |------------|---------|--------|------|
/// | order      | Order   | 0      | 40   |
/// | next       | u32     | 40     | 4    |
/// | prev       | u32     | 44     | 4    |
/// | _reserved  | [u8;16] | 48     | 16   |
#[repr(C)]
#[repr(align(64))]
#[derive(Clone, Copy)]
pub struct OrderNode {
    /// The resting order (id, side, price, remaining quantity, sequence)
    pub order: Order,

    /// Index of the next (younger) order at the same price
    pub next: ArenaIndex,

    /// Index of the previous (older) order; enables O(1) unlink
    pub prev: ArenaIndex,

    pub _reserved: [u8; 16],
}

const _: () = assert!(
    std::mem::size_of::<OrderNode>() == 64,
    "OrderNode must be exactly 64 bytes (one cache line)"
);

const _: () = assert!(
    std::mem::align_of::<OrderNode>() == 64,
    "OrderNode must be 64-byte aligned"
);

impl OrderNode {
    #[inline]
    pub const fn new(order: Order) -> Self {
        Self {
            order,
            next: NULL_INDEX,
            prev: NULL_INDEX,
            _reserved: [0u8; 16],
        }
    }

    /// An unused node (free list member)
    #[inline]
    pub const fn empty() -> Self {
        Self::new(Order::EMPTY)
    }
}

impl fmt::Debug for OrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderNode")
            .field("order", &self.order)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Growable pool of [`OrderNode`]s with O(1) allocation and deallocation.
pub struct Arena {
    nodes: Vec<OrderNode>,

    /// Head of the free list
    free_head: ArenaIndex,

    /// Number of currently allocated nodes
    allocated_count: u32,
}

impl Arena {
    /// Create an arena with `capacity` nodes already threaded on the free list.
    ///
    /// # Panics
    /// Panics if capacity reaches `NULL_INDEX`, which is reserved.
    pub fn with_capacity(capacity: u32) -> Self {
        assert!(capacity < NULL_INDEX, "Capacity must be less than NULL_INDEX");

        let mut nodes = vec![OrderNode::empty(); capacity as usize];
        for (i, node) in nodes.iter_mut().enumerate() {
            let next = i as u32 + 1;
            node.next = if next < capacity { next } else { NULL_INDEX };
        }

        Self {
            nodes,
            free_head: if capacity > 0 { 0 } else { NULL_INDEX },
            allocated_count: 0,
        }
    }

    /// Store `order` in a free slot, growing the pool if none is left.
    ///
    /// The returned node is unlinked (`prev == next == NULL_INDEX`).
    ///
    /// # Complexity
    /// O(1), amortized O(1) when growing
    #[inline]
    pub fn alloc(&mut self, order: Order) -> ArenaIndex {
        let index = if self.free_head == NULL_INDEX {
            let index = self.nodes.len();
            assert!(index < NULL_INDEX as usize, "Arena index space exhausted");
            self.nodes.push(OrderNode::new(order));
            index as ArenaIndex
        } else {
            let index = self.free_head;
            let node = &mut self.nodes[index as usize];
            self.free_head = node.next;
            *node = OrderNode::new(order);
            index
        };

        self.allocated_count += 1;
        index
    }

    /// Return a node to the free list.
    ///
    /// The caller must have unlinked the node and must not use the index
    /// again (no double-free protection beyond debug assertions).
    #[inline]
    pub fn free(&mut self, index: ArenaIndex) {
        debug_assert!((index as usize) < self.nodes.len(), "Index out of bounds");
        debug_assert!(self.allocated_count > 0, "Double free detected");

        let node = &mut self.nodes[index as usize];
        node.order = Order::EMPTY;
        node.prev = NULL_INDEX;
        node.next = self.free_head;
        self.free_head = index;
        self.allocated_count -= 1;
    }

    #[inline]
    pub fn get(&self, index: ArenaIndex) -> &OrderNode {
        debug_assert!((index as usize) < self.nodes.len(), "Index out of bounds");
        &self.nodes[index as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> &mut OrderNode {
        debug_assert!((index as usize) < self.nodes.len(), "Index out of bounds");
        &mut self.nodes[index as usize]
    }

    /// Number of currently allocated nodes.
    #[inline]
    pub fn allocated(&self) -> u32 {
        self.allocated_count
    }

    /// Number of nodes backing the arena (allocated + free).
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.nodes.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocated_count == 0
    }

    /// Pre-fault the backing memory so the first orders don't pay page faults.
    pub fn warm_up(&mut self) {
        for node in &mut self.nodes {
            // SAFETY: `node` is a valid, exclusively borrowed element.
            unsafe {
                std::ptr::write_volatile(&mut node._reserved[0], 0);
            }
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.nodes.len())
            .field("allocated", &self.allocated_count)
            .field("free_head", &self.free_head)
            .finish()
    }
}
