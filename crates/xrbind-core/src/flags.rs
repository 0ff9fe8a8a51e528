//! Typesafe 64-bit bitmask types.
//!
//! Each mask is ABI-identical to the raw 64-bit flags value. `empty()` and
//! `all()` stand for "no bits" and "every defined bit"; `!` complements within
//! the defined bits only. Unknown bits survive `from_bits_retain`/`bits`
//! round trips so masks from newer runtimes are not lost.

use bitflags::bitflags;

/// Raw flags type used at the ABI.
pub type Flags64 = u64;

bitflags! {
    /// Instance creation flags. No bits are defined yet.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct InstanceCreateFlags: Flags64 {}
}

bitflags! {
    /// Session creation flags. No bits are defined yet.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct SessionCreateFlags: Flags64 {}
}

bitflags! {
    /// Validity and tracking state of a located space.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct SpaceLocationFlags: Flags64 {
        const ORIENTATION_VALID = 0x0000_0001;
        const POSITION_VALID = 0x0000_0002;
        const ORIENTATION_TRACKED = 0x0000_0004;
        const POSITION_TRACKED = 0x0000_0008;
    }
}

impl SpaceLocationFlags {
    /// Both orientation and position are valid.
    #[must_use]
    pub const fn pose_valid(self) -> bool {
        self.contains(Self::ORIENTATION_VALID.union(Self::POSITION_VALID))
    }
}

const _: () = {
    assert!(size_of::<InstanceCreateFlags>() == size_of::<Flags64>());
    assert!(size_of::<SessionCreateFlags>() == size_of::<Flags64>());
    assert!(size_of::<SpaceLocationFlags>() == size_of::<Flags64>());
    assert!(align_of::<SpaceLocationFlags>() == align_of::<Flags64>());
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_bits_covers_every_defined_flag() {
        assert_eq!(SpaceLocationFlags::all().bits(), 0xF);
        assert_eq!(SpaceLocationFlags::empty().bits(), 0);
    }

    #[test]
    fn complement_stays_within_defined_bits() {
        let f = SpaceLocationFlags::ORIENTATION_VALID | SpaceLocationFlags::POSITION_TRACKED;
        assert_eq!((!f).bits(), 0x6);
        assert_eq!(!SpaceLocationFlags::empty(), SpaceLocationFlags::all());
    }

    #[test]
    fn set_operations() {
        let a = SpaceLocationFlags::ORIENTATION_VALID | SpaceLocationFlags::POSITION_VALID;
        let b = SpaceLocationFlags::POSITION_VALID | SpaceLocationFlags::POSITION_TRACKED;
        assert_eq!(a & b, SpaceLocationFlags::POSITION_VALID);
        assert_eq!(
            a ^ b,
            SpaceLocationFlags::ORIENTATION_VALID | SpaceLocationFlags::POSITION_TRACKED
        );
        assert!(a.pose_valid());
        assert!(!b.pose_valid());
    }

    #[test]
    fn unknown_bits_round_trip() {
        let raw: Flags64 = 0x8000_0000_0000_0003;
        let f = SpaceLocationFlags::from_bits_retain(raw);
        assert_eq!(f.bits(), raw);
        assert!(SpaceLocationFlags::from_bits(raw).is_none());
        assert_eq!(InstanceCreateFlags::from_bits_retain(5).bits(), 5);
    }
}
