//! Tracking allocator with guard-byte corruction detection.
//!
//! Every allocation is wrapped with 16-byte guard zones filled with
//! `GUARD_BYTE`; the user region is filled with `ALLOC_BYTE` on allocation
//! and `FREE_BYTE` on release. Live blocks are tracked in a slot arena
//! rather than an intrusive linked list — the safe-Rust equivalent, since
//! we can't thread raw prev/next pointers through user memory here. A
//! `checkpoint()` is just the arena's current generation counter; auditing
//! "anything allocated since" is an index range scan.

use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr::NonNull;

use crate::location::SourceLocation;

const GUARD_BYTE: u8 = 0xEF;
const ALLOC_BYTE: u8 = 0xBA;
const FREE_BYTE: u8 = 0xCD;
const GUARD_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

#[derive(Debug, Clone, Copy)]
struct BlockInfo {
    block_ptr: NonNull<u8>,
    block_layout: Layout,
    user_size: usize,
    location: SourceLocation,
}

// SAFETY: the pointers here are never dereferenced from more than one
// thread at a time; `TrackingAllocator` is only ever used behind the
// runner's per-thread `TestContext`.
unsafe impl Send for BlockInfo {}

/// A corrupted guard zone, reported with both the allocation site and the
/// release site (if the corruption was noticed at free time).
#[derive(Debug, Clone)]
pub struct Corruption {
    pub allocated_at: SourceLocation,
    pub freed_at: Option<SourceLocation>,
}

#[derive(Default)]
pub struct TrackingAllocator {
    // Append-only: a block's index is its allocation order, which
    // `checkpoint()`/`leaked_since()` rely on. Freed slots become `None`
    // but are never reused, so an index once past a checkpoint always
    // stays past it.
    live: Vec<Option<BlockInfo>>,
}

fn block_layout(user_size: usize) -> Layout {
    let total = GUARD_SIZE + user_size + GUARD_SIZE;
    Layout::from_size_align(total, std::mem::align_of::<u128>()).expect("layout overflow")
}

impl TrackingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    pub fn alloc(&mut self, size: usize) -> NonNull<u8> {
        self.alloc_at(size, SourceLocation::caller())
    }

    pub fn alloc_at(&mut self, size: usize, location: SourceLocation) -> NonNull<u8> {
        let layout = block_layout(size);
        // SAFETY: layout is non-zero sized (guard zones alone are 32 bytes).
        let block_ptr = unsafe { System.alloc(layout) };
        let block_ptr = NonNull::new(block_ptr).expect("allocation failed");

        unsafe {
            std::ptr::write_bytes(block_ptr.as_ptr(), GUARD_BYTE, GUARD_SIZE);
            let user_ptr = block_ptr.as_ptr().add(GUARD_SIZE);
            std::ptr::write_bytes(user_ptr, ALLOC_BYTE, size);
            std::ptr::write_bytes(user_ptr.add(size), GUARD_BYTE, GUARD_SIZE);
        }

        let info = BlockInfo {
            block_ptr,
            block_layout: layout,
            user_size: size,
            location,
        };

        self.live.push(Some(info));
        let _ = BlockId(self.live.len() - 1);

        // SAFETY: user_ptr is block_ptr + GUARD_SIZE, within the allocation.
        unsafe { NonNull::new_unchecked(block_ptr.as_ptr().add(GUARD_SIZE)) }
    }

    #[track_caller]
    pub fn zalloc(&mut self, size: usize) -> NonNull<u8> {
        let ptr = self.alloc(size);
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, size) };
        ptr
    }

    fn find_block_index(&self, user_ptr: NonNull<u8>) -> Option<usize> {
        self.live.iter().position(|slot| {
            slot.map(|info| unsafe {
                info.block_ptr.as_ptr().add(GUARD_SIZE) == user_ptr.as_ptr()
            })
            .unwrap_or(false)
        })
    }

    /// Checks both guard zones around `user_ptr`. Returns `Err` describing
    /// the corruption without removing the block.
    pub fn check_guards(&self, user_ptr: NonNull<u8>) -> Result<(), Corruption> {
        let idx = self
            .find_block_index(user_ptr)
            .expect("check_guards on unknown pointer");
        let info = self.live[idx].unwrap();
        unsafe {
            let head = info.block_ptr.as_ptr();
            let tail = head.add(GUARD_SIZE + info.user_size);
            let head_ok = (0..GUARD_SIZE).all(|i| *head.add(i) == GUARD_BYTE);
            let tail_ok = (0..GUARD_SIZE).all(|i| *tail.add(i) == GUARD_BYTE);
            if head_ok && tail_ok {
                Ok(())
            } else {
                Err(Corruption {
                    allocated_at: info.location,
                    freed_at: None,
                })
            }
        }
    }

    #[track_caller]
    pub fn free(&mut self, user_ptr: NonNull<u8>) -> Result<(), Corruption> {
        let location = SourceLocation::caller();
        let idx = self
            .find_block_index(user_ptr)
            .expect("free on pointer not owned by this allocator");
        let info = self.live[idx].take().unwrap();

        let corrupted = self.check_guards_info(&info);

        unsafe {
            let user = info.block_ptr.as_ptr().add(GUARD_SIZE);
            std::ptr::write_bytes(user, FREE_BYTE, info.user_size);
            System.dealloc(info.block_ptr.as_ptr(), info.block_layout);
        }

        if corrupted {
            Err(Corruption {
                allocated_at: info.location,
                freed_at: Some(location),
            })
        } else {
            Ok(())
        }
    }

    fn check_guards_info(&self, info: &BlockInfo) -> bool {
        unsafe {
            let head = info.block_ptr.as_ptr();
            let tail = head.add(GUARD_SIZE + info.user_size);
            let head_ok = (0..GUARD_SIZE).all(|i| *head.add(i) == GUARD_BYTE);
            let tail_ok = (0..GUARD_SIZE).all(|i| *tail.add(i) == GUARD_BYTE);
            !(head_ok && tail_ok)
        }
    }

    /// `realloc(p, 0)` is equivalent to `free(p)` and yields no pointer,
    /// matching `_test_realloc(ptr, 0)` in the original implementation.
    /// Otherwise always allocates a fresh block and copies
    /// `min(old_size, new_size)` bytes, per spec.md §9 Open Question (b).
    #[track_caller]
    pub fn realloc(&mut self, user_ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
        let location = SourceLocation::caller();

        if new_size == 0 {
            let _ = self.free(user_ptr);
            return None;
        }

        let idx = self
            .find_block_index(user_ptr)
            .expect("realloc on pointer not owned by this allocator");
        let old_info = self.live[idx].unwrap();
        let copy_len = old_info.user_size.min(new_size);

        let new_ptr = self.alloc_at(new_size, location);
        unsafe {
            std::ptr::copy_nonoverlapping(user_ptr.as_ptr(), new_ptr.as_ptr(), copy_len);
        }
        let _ = self.free(user_ptr);
        Some(new_ptr)
    }

    /// The arena's current high-water index — a snapshot usable with
    /// [`TrackingAllocator::leaked_since`] to audit everything allocated
    /// after this point and never freed.
    pub fn checkpoint(&self) -> usize {
        self.live.len()
    }

    pub fn leaked_since(&self, checkpoint: usize) -> Vec<(SourceLocation, usize)> {
        self.live[checkpoint.min(self.live.len())..]
            .iter()
            .filter_map(|slot| slot.map(|info| (info.location, info.user_size)))
            .collect()
    }

    pub fn live_block_count(&self) -> usize {
        self.live.iter().filter(|s| s.is_some()).count()
    }
}
