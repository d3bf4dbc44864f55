//! Storage shapes that describe a slot by size and alignment instead of by type.

use std::fmt;
use std::mem::MaybeUninit;

trait Sealed {}

/// An alignment that a [`GenericPool`][crate::GenericPool] slot can be given.
///
/// Implemented by the zero-sized markers [`Align1`] through [`Align64`]. The trait is sealed.
#[expect(private_bounds, reason = "intentionally sealed trait")]
pub trait Alignment: Sealed + Copy + fmt::Debug {
    /// The alignment in bytes.
    const ALIGN: usize;
}

/// Aligns slot storage to 1 byte.
#[derive(Clone, Copy, Debug)]
#[repr(align(1))]
pub struct Align1;

/// Aligns slot storage to 2 bytes.
#[derive(Clone, Copy, Debug)]
#[repr(align(2))]
pub struct Align2;

/// Aligns slot storage to 4 bytes.
#[derive(Clone, Copy, Debug)]
#[repr(align(4))]
pub struct Align4;

/// Aligns slot storage to 8 bytes.
#[derive(Clone, Copy, Debug)]
#[repr(align(8))]
pub struct Align8;

/// Aligns slot storage to 16 bytes.
#[derive(Clone, Copy, Debug)]
#[repr(align(16))]
pub struct Align16;

/// Aligns slot storage to 32 bytes.
#[derive(Clone, Copy, Debug)]
#[repr(align(32))]
pub struct Align32;

/// Aligns slot storage to 64 bytes.
#[derive(Clone, Copy, Debug)]
#[repr(align(64))]
pub struct Align64;

impl Sealed for Align1 {}
impl Sealed for Align2 {}
impl Sealed for Align4 {}
impl Sealed for Align8 {}
impl Sealed for Align16 {}
impl Sealed for Align32 {}
impl Sealed for Align64 {}

impl Alignment for Align1 {
    const ALIGN: usize = 1;
}

impl Alignment for Align2 {
    const ALIGN: usize = 2;
}

impl Alignment for Align4 {
    const ALIGN: usize = 4;
}

impl Alignment for Align8 {
    const ALIGN: usize = 8;
}

impl Alignment for Align16 {
    const ALIGN: usize = 16;
}

impl Alignment for Align32 {
    const ALIGN: usize = 32;
}

impl Alignment for Align64 {
    const ALIGN: usize = 64;
}

/// Uninitialized storage of `SIZE` bytes aligned to `A`.
///
/// This type is never constructed. It only serves as the slot shape of a
/// [`GenericPool`][crate::GenericPool], so that one pool can hold values of any type whose size
/// is at most `SIZE` and whose alignment is at most `A::ALIGN`.
///
/// The size of the type is `SIZE` rounded up to a multiple of `A::ALIGN`.
#[repr(C)]
pub struct AlignedBytes<const SIZE: usize, A: Alignment> {
    _align: [A; 0],
    _bytes: [MaybeUninit<u8>; SIZE],
}

impl<const SIZE: usize, A: Alignment> fmt::Debug for AlignedBytes<SIZE, A> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBytes")
            .field("size", &SIZE)
            .field("align", &A::ALIGN)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::mem::{align_of, size_of};

    use super::*;

    #[test]
    fn markers_have_declared_alignment() {
        assert_eq!(align_of::<Align1>(), Align1::ALIGN);
        assert_eq!(align_of::<Align2>(), Align2::ALIGN);
        assert_eq!(align_of::<Align4>(), Align4::ALIGN);
        assert_eq!(align_of::<Align8>(), Align8::ALIGN);
        assert_eq!(align_of::<Align16>(), Align16::ALIGN);
        assert_eq!(align_of::<Align32>(), Align32::ALIGN);
        assert_eq!(align_of::<Align64>(), Align64::ALIGN);
    }

    #[test]
    fn markers_are_zero_sized() {
        assert_eq!(size_of::<Align64>(), 0);
        assert_eq!(size_of::<[Align64; 0]>(), 0);
    }

    #[test]
    fn aligned_bytes_has_requested_shape() {
        assert_eq!(size_of::<AlignedBytes<8, Align8>>(), 8);
        assert_eq!(align_of::<AlignedBytes<8, Align8>>(), 8);

        assert_eq!(size_of::<AlignedBytes<3, Align1>>(), 3);
        assert_eq!(align_of::<AlignedBytes<3, Align1>>(), 1);
    }

    #[test]
    fn aligned_bytes_size_rounds_up_to_alignment() {
        assert_eq!(size_of::<AlignedBytes<5, Align4>>(), 8);
        assert_eq!(size_of::<AlignedBytes<17, Align16>>(), 32);
    }
}
