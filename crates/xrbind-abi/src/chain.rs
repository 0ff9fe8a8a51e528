//! Extension-chain traversal.
//!
//! Chains are singly linked through untyped `next` pointers, each node
//! starting with its own type tag. All pointer walking happens here: callers
//! get a typed [`ChainNode`] per link, or a typed reference from
//! [`find_in_chain`].

use std::ffi::c_void;
use std::marker::PhantomData;

use crate::structs::{
    HandTrackerCreateInfoEXT, InstanceCreateInfo, InstanceProperties, ReferenceSpaceCreateInfo,
    SessionBeginInfo, SessionCreateInfo, SpaceLocation, SystemGetInfo,
    SystemHandTrackingPropertiesEXT, SystemProperties, TypedStruct,
};
use crate::sys::{self, StructureType};

macro_rules! chain_nodes {
    ($($variant:ident),* $(,)?) => {
        /// One link of a chain, by its tag.
        #[derive(Debug, Clone, Copy)]
        pub enum ChainNode<'a> {
            $( $variant(&'a $variant), )*
            /// A tag this binding does not know.
            Unknown(StructureType),
        }

        impl ChainNode<'_> {
            #[must_use]
            pub fn structure_type(&self) -> StructureType {
                match self {
                    $( Self::$variant(_) => <$variant as TypedStruct>::TYPE, )*
                    Self::Unknown(ty) => *ty,
                }
            }
        }

        /// # Safety
        ///
        /// `node` must point at a live struct whose layout matches its tag.
        unsafe fn classify<'a>(node: *const sys::BaseInStructure) -> ChainNode<'a> {
            // SAFETY: caller contract.
            let ty = unsafe { (*node).ty };
            $(
                if ty == <$variant as TypedStruct>::TYPE {
                    // SAFETY: the tag identifies the concrete type.
                    return ChainNode::$variant(unsafe { &*node.cast::<$variant>() });
                }
            )*
            ChainNode::Unknown(ty)
        }
    };
}

chain_nodes!(
    InstanceCreateInfo,
    InstanceProperties,
    SystemGetInfo,
    SystemProperties,
    SystemHandTrackingPropertiesEXT,
    SessionCreateInfo,
    SessionBeginInfo,
    ReferenceSpaceCreateInfo,
    SpaceLocation,
    HandTrackerCreateInfoEXT,
);

/// Iterator over the links after a chain head.
#[derive(Debug, Clone)]
pub struct ChainIter<'a> {
    cur: *const sys::BaseInStructure,
    _chain: PhantomData<&'a ()>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = ChainNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur.is_null() {
            return None;
        }
        let node = self.cur;
        // SAFETY: guaranteed by the contract of `chain`/`chain_from`.
        unsafe {
            self.cur = (*node).next;
            Some(classify(node))
        }
    }
}

/// Walk the links after `head`.
///
/// # Safety
///
/// Every node reachable from `head`'s `next` link must be a live struct whose
/// layout matches its tag, valid for `'a` and not mutated meanwhile.
#[must_use]
pub unsafe fn chain<'a, S: TypedStruct>(head: &'a S) -> ChainIter<'a> {
    // SAFETY: forwarded caller contract.
    unsafe { chain_from(head.next()) }
}

/// Walk a chain starting at a raw `next` link.
///
/// # Safety
///
/// As for [`chain`], for every node reachable from `next`.
#[must_use]
pub unsafe fn chain_from<'a>(next: *const c_void) -> ChainIter<'a> {
    ChainIter {
        cur: next.cast(),
        _chain: PhantomData,
    }
}

/// The first link after `head` tagged `T::TYPE`.
///
/// # Safety
///
/// As for [`chain`].
#[must_use]
pub unsafe fn find_in_chain<'a, T: TypedStruct, S: TypedStruct>(head: &'a S) -> Option<&'a T> {
    // SAFETY: forwarded caller contract.
    let mut cur: *const sys::BaseInStructure = head.next().cast();
    while !cur.is_null() {
        // SAFETY: forwarded caller contract.
        unsafe {
            if (*cur).ty == T::TYPE {
                return Some(&*cur.cast::<T>());
            }
            cur = (*cur).next;
        }
    }
    None
}

/// Mutable lookup starting from a raw output-chain link, for code that fills
/// chained output structs.
///
/// # Safety
///
/// Every node reachable from `next` must be a live, exclusively borrowed
/// struct whose layout matches its tag, valid for `'a`.
#[must_use]
pub unsafe fn find_in_chain_mut<'a, T: TypedStruct>(next: *mut c_void) -> Option<&'a mut T> {
    let mut cur: *mut sys::BaseOutStructure = next.cast();
    while !cur.is_null() {
        // SAFETY: caller contract.
        unsafe {
            if (*cur).ty == T::TYPE {
                return Some(&mut *cur.cast::<T>());
            }
            cur = (*cur).next;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::erase;
    use crate::sys::Bool32;

    #[test]
    fn walks_known_links_in_order() {
        let mut ext = SystemHandTrackingPropertiesEXT::default();
        let mut loc = SpaceLocation::default();
        let mut props = SystemProperties::default();
        props.set_next(erase(&mut loc));
        loc.set_next(erase(&mut ext));

        // SAFETY: every link points at a live local of the right type.
        let tags: Vec<_> = unsafe { chain(&props) }
            .map(|n| n.structure_type())
            .collect();
        assert_eq!(
            tags,
            vec![StructureType::SPACE_LOCATION, StructureType::SYSTEM_HAND_TRACKING_PROPERTIES_EXT]
        );
    }

    #[test]
    fn unknown_tags_are_reported_not_dereferenced() {
        let mut foreign = sys::BaseOutStructure {
            ty: StructureType::from_raw(999),
            next: std::ptr::null_mut(),
        };
        let mut props = SystemProperties::default();
        props.set_next(erase(&mut foreign));

        // SAFETY: the single link is a live base structure.
        let nodes: Vec<_> = unsafe { chain(&props) }.collect();
        assert!(matches!(nodes.as_slice(), [ChainNode::Unknown(t)] if t.into_raw() == 999));
    }

    #[test]
    fn finds_typed_link() {
        let mut ext = SystemHandTrackingPropertiesEXT::default();
        let mut props = SystemProperties::default();
        props.push_next(&mut ext);

        // SAFETY: the chain consists of `ext` only.
        let found = unsafe { find_in_chain_mut::<SystemHandTrackingPropertiesEXT>(props.next().cast_mut()) };
        found.expect("linked").supports_hand_tracking = Bool32::TRUE;
        assert_eq!(ext.supports_hand_tracking, Bool32::TRUE);

        // SAFETY: as above.
        let none = unsafe { find_in_chain::<SpaceLocation, _>(&props) };
        assert!(none.is_none());
    }

    #[test]
    fn empty_chain_yields_nothing() {
        let props = SystemProperties::default();
        // SAFETY: no links.
        assert_eq!(unsafe { chain(&props) }.count(), 0);
    }
}
