//! Dirty-mask bits and the per-component tracker.
//!
//! A mask is an OR-accumulated set of reasons a component needs to be
//! synchronized. Bits stay set until a pack successfully writes them.

/// Full state requested. A pack mask carrying this bit encodes every group
/// regardless of what has accumulated.
pub const INITIAL_UPDATE: u32 = 1 << 0;
/// The owning entity changed.
pub const OWNER: u32 = 1 << 1;
/// Generic state update.
pub const UPDATE: u32 = 1 << 2;
/// The enabled flag was written.
pub const ENABLE: u32 = 1 << 3;
/// Name or namespace changed.
pub const NAMESPACE: u32 = 1 << 4;
/// First bit available to component subtypes.
pub const NEXT_FREE: u32 = 1 << 5;

/// Accumulated dirty bits of one component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyMask(u32);

impl DirtyMask {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn set(&mut self, bits: u32) {
        self.0 |= bits;
    }

    pub fn clear(&mut self, bits: u32) {
        self.0 &= !bits;
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `bits` is set.
    #[must_use]
    pub const fn contains(self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    /// Returns `true` if any bit of `bits` is set.
    #[must_use]
    pub const fn intersects(self, bits: u32) -> bool {
        self.0 & bits != 0
    }

    #[must_use]
    pub const fn is_clear(self) -> bool {
        self.0 == 0
    }

    /// The bits a pack with `requested` should encode: everything requested
    /// on an initial update, otherwise only what is both requested and dirty.
    #[must_use]
    pub const fn effective(self, requested: u32) -> u32 {
        if requested & INITIAL_UPDATE != 0 {
            requested
        } else {
            requested & self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_accumulates() {
        let mut mask = DirtyMask::new();
        mask.set(ENABLE);
        mask.set(OWNER);
        assert!(mask.contains(ENABLE | OWNER));
        assert!(!mask.contains(ENABLE | UPDATE));
        assert!(mask.intersects(ENABLE | UPDATE));
    }

    #[test]
    fn test_clear_leaves_other_bits() {
        let mut mask = DirtyMask::new();
        mask.set(ENABLE | NEXT_FREE);
        mask.clear(ENABLE);
        assert_eq!(mask.bits(), NEXT_FREE);
        mask.clear(NEXT_FREE);
        assert!(mask.is_clear());
    }

    #[test]
    fn test_effective_mask() {
        let mut mask = DirtyMask::new();
        mask.set(ENABLE);
        assert_eq!(mask.effective(ENABLE | NEXT_FREE), ENABLE);
        assert_eq!(
            mask.effective(INITIAL_UPDATE | ENABLE | NEXT_FREE),
            INITIAL_UPDATE | ENABLE | NEXT_FREE
        );
    }
}
