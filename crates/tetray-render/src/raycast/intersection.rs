//! Per-pixel depth-sorted intersection lists backed by a block pool.
//!
//! Nodes live in fixed-size blocks and are addressed by `u32` handles. Blocks
//! are allocated on demand up to a fixed maximum and are never freed between
//! renders: [`PixelLists::reset`] only rewinds the allocation cursor and clears
//! the per-pixel heads.

use super::face_index::FaceId;

/// Handle of a node in an [`IntersectionPool`].
pub type NodeHandle = u32;

/// A boundary face crossing a pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// The crossed face.
    pub face: FaceId,
    /// Depth used for ordering.
    pub z: f64,
    /// Next node of the same pixel, deeper or equal.
    pub next: Option<NodeHandle>,
}

/// Block allocator for [`Intersection`] nodes.
#[derive(Debug, Clone)]
pub struct IntersectionPool {
    blocks: Vec<Vec<Intersection>>,
    block_size: usize,
    max_blocks: usize,
    len: usize,
}

impl IntersectionPool {
    /// Creates an empty pool. Capacity is clamped so every handle fits in a `u32`.
    pub fn new(block_size: usize, max_blocks: usize) -> Self {
        let block_size = block_size.clamp(1, u32::MAX as usize);
        let max_blocks = max_blocks.clamp(1, u32::MAX as usize / block_size);
        Self {
            blocks: Vec::new(),
            block_size,
            max_blocks,
            len: 0,
        }
    }

    /// Maximum number of nodes.
    pub fn capacity(&self) -> usize {
        self.block_size * self.max_blocks
    }

    /// Number of nodes handed out since the last reset.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no node has been handed out since the last reset.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of blocks currently held.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Stores a node, returning `None` when the pool is full.
    pub fn allocate(&mut self, node: Intersection) -> Option<NodeHandle> {
        if self.len >= self.capacity() {
            return None;
        }
        let block = self.len / self.block_size;
        let offset = self.len % self.block_size;
        if block == self.blocks.len() {
            self.blocks.push(Vec::with_capacity(self.block_size));
        }
        let slots = &mut self.blocks[block];
        if offset < slots.len() {
            slots[offset] = node;
        } else {
            slots.push(node);
        }
        self.len += 1;
        Some((block * self.block_size + offset) as NodeHandle)
    }

    /// A node by handle.
    #[inline]
    pub fn get(&self, handle: NodeHandle) -> &Intersection {
        let h = handle as usize;
        &self.blocks[h / self.block_size][h % self.block_size]
    }

    #[inline]
    fn get_mut(&mut self, handle: NodeHandle) -> &mut Intersection {
        let h = handle as usize;
        &mut self.blocks[h / self.block_size][h % self.block_size]
    }

    /// Rewinds the allocation cursor, keeping every block.
    pub fn reset(&mut self) {
        self.len = 0;
    }
}

/// Intersection lists of every pixel of the in-use image.
#[derive(Debug, Clone)]
pub struct PixelLists {
    pool: IntersectionPool,
    heads: Vec<Option<NodeHandle>>,
    width: usize,
    height: usize,
    dropped: usize,
}

impl PixelLists {
    /// Creates empty lists with the given pool limits.
    pub fn new(block_size: usize, max_blocks: usize) -> Self {
        Self {
            pool: IntersectionPool::new(block_size, max_blocks),
            heads: Vec::new(),
            width: 0,
            height: 0,
            dropped: 0,
        }
    }

    /// Clears every list and resizes for a `width` x `height` image.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.pool.reset();
        self.heads.clear();
        self.heads.resize(width * height, None);
        self.width = width;
        self.height = height;
        self.dropped = 0;
    }

    /// Changes the pool limits. Existing lists are discarded.
    pub fn set_limits(&mut self, block_size: usize, max_blocks: usize) {
        if self.pool.block_size != block_size || self.pool.max_blocks != max_blocks {
            self.pool = IntersectionPool::new(block_size, max_blocks);
            self.heads.iter_mut().for_each(|h| *h = None);
        }
    }

    /// Image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Nodes stored since the last reset.
    pub fn num_intersections(&self) -> usize {
        self.pool.len()
    }

    /// Nodes dropped because the pool was full.
    pub fn num_dropped(&self) -> usize {
        self.dropped
    }

    /// The underlying pool.
    pub fn pool(&self) -> &IntersectionPool {
        &self.pool
    }

    /// Inserts a node into the list of pixel `(x, y)`, keeping depth order.
    ///
    /// Equal depths keep insertion order. Returns `false` when the pool is
    /// full; the first overflow of a render is logged.
    pub fn insert(&mut self, x: usize, y: usize, face: FaceId, z: f64) -> bool {
        let pixel = y * self.width + x;
        let Some(handle) = self.pool.allocate(Intersection { face, z, next: None }) else {
            if self.dropped == 0 {
                log::error!(
                    "intersection pool exhausted ({} nodes); further intersections are dropped",
                    self.pool.capacity()
                );
            }
            self.dropped += 1;
            return false;
        };

        let mut prev: Option<NodeHandle> = None;
        let mut cursor = self.heads[pixel];
        while let Some(h) = cursor {
            let node = self.pool.get(h);
            if node.z > z {
                break;
            }
            prev = Some(h);
            cursor = node.next;
        }

        self.pool.get_mut(handle).next = cursor;
        match prev {
            Some(p) => self.pool.get_mut(p).next = Some(handle),
            None => self.heads[pixel] = Some(handle),
        }
        true
    }

    /// Nodes of pixel `(x, y)` from nearest to farthest.
    pub fn iter(&self, x: usize, y: usize) -> PixelIter<'_> {
        let head = if x < self.width && y < self.height {
            self.heads[y * self.width + x]
        } else {
            None
        };
        PixelIter {
            pool: &self.pool,
            cursor: head,
        }
    }
}

/// Iterator over one pixel's intersections.
pub struct PixelIter<'a> {
    pool: &'a IntersectionPool,
    cursor: Option<NodeHandle>,
}

impl<'a> Iterator for PixelIter<'a> {
    type Item = &'a Intersection;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pool.get(self.cursor?);
        self.cursor = node.next;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pool_spans_blocks() {
        let mut pool = IntersectionPool::new(2, 3);
        let handles: Vec<_> = (0..5)
            .map(|i| {
                pool.allocate(Intersection {
                    face: i,
                    z: 0.0,
                    next: None,
                })
                .unwrap()
            })
            .collect();
        assert_eq!(handles, vec![0, 1, 2, 3, 4]);
        assert_eq!(pool.num_blocks(), 3);
        assert_eq!(pool.get(3).face, 3);
    }

    #[test]
    fn test_reset_keeps_blocks() {
        let mut pool = IntersectionPool::new(4, 2);
        for i in 0..6 {
            pool.allocate(Intersection {
                face: i,
                z: 0.0,
                next: None,
            });
        }
        pool.reset();
        assert!(pool.is_empty());
        assert_eq!(pool.num_blocks(), 2);
        let h = pool
            .allocate(Intersection {
                face: 9,
                z: 0.0,
                next: None,
            })
            .unwrap();
        assert_eq!(pool.get(h).face, 9);
    }

    #[test]
    fn test_overflow_drops_nodes() {
        let mut lists = PixelLists::new(2, 2);
        lists.reset(2, 2);
        for i in 0..6 {
            lists.insert(0, 0, i, f64::from(i));
        }
        assert_eq!(lists.num_intersections(), 4);
        assert_eq!(lists.num_dropped(), 2);
        assert_eq!(lists.iter(0, 0).count(), 4);
    }

    #[test]
    fn test_insert_sorted_and_stable() {
        let mut lists = PixelLists::new(8, 4);
        lists.reset(3, 2);
        lists.insert(1, 1, 0, 0.5);
        lists.insert(1, 1, 1, 0.2);
        lists.insert(1, 1, 2, 0.5);
        lists.insert(1, 1, 3, 0.9);
        let faces: Vec<_> = lists.iter(1, 1).map(|n| n.face).collect();
        assert_eq!(faces, vec![1, 0, 2, 3]);
        assert_eq!(lists.iter(0, 0).count(), 0);
        assert_eq!(lists.iter(5, 5).count(), 0);
    }

    #[test]
    fn test_reset_clears_heads() {
        let mut lists = PixelLists::new(8, 4);
        lists.reset(2, 2);
        lists.insert(0, 1, 7, 0.3);
        lists.reset(2, 2);
        assert_eq!(lists.iter(0, 1).count(), 0);
        assert_eq!(lists.num_intersections(), 0);
    }

    proptest! {
        #[test]
        fn test_lists_are_depth_sorted(depths in prop::collection::vec(0.0f64..1.0, 1..64)) {
            let mut lists = PixelLists::new(16, 16);
            lists.reset(1, 1);
            for (i, z) in depths.iter().enumerate() {
                lists.insert(0, 0, i as FaceId, *z);
            }
            let zs: Vec<f64> = lists.iter(0, 0).map(|n| n.z).collect();
            prop_assert_eq!(zs.len(), depths.len());
            prop_assert!(zs.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
