//! Allocation and element transfer helpers.
//!
//! These functions are the only place where element storage is allocated.
//! Allocation never aborts on exhaustion: a refused request is reported as an
//! `AllocationFailed` error and nothing is allocated. A zero-length request is
//! legal and yields "no allocation" (`None`).

use holdfast_common::{Result, error::Error, verify_arg};

/// An owned block of elements. `None` stands for the absence of an allocation
/// and is the only representation of a zero-length block.
pub type Block<T> = Option<Box<[T]>>;

/// Allocates a block of `len` default-initialized elements.
///
/// Returns `Ok(None)` when `len` is zero.
pub fn allocate<T: Default>(len: usize) -> Result<Block<T>> {
    allocate_with(len, T::default)
}

/// Allocates a block of `len` elements, initializing each one with `f`.
///
/// Returns `Ok(None)` when `len` is zero.
pub fn allocate_with<T>(len: usize, f: impl FnMut() -> T) -> Result<Block<T>> {
    if len == 0 {
        return Ok(None);
    }
    let mut vec = reserve_exact::<T>(len)?;
    vec.resize_with(len, f);
    Ok(Some(vec.into_boxed_slice()))
}

/// Allocates a block holding clones of the first `len` elements of `src`.
///
/// # Panics
///
/// Panics if exactly one of `src.is_none()` and `len == 0` holds, or if `src`
/// holds fewer than `len` elements.
#[track_caller]
pub fn allocate_from_raw<T: Clone>(src: Option<&[T]>, len: usize) -> Result<Block<T>> {
    validate_raw_pair(src.is_none(), len);
    let Some(src) = src else {
        return Ok(None);
    };
    let src = prefix(src, len);
    let mut vec = reserve_exact::<T>(len)?;
    vec.extend_from_slice(src);
    Ok(Some(vec.into_boxed_slice()))
}

/// Allocates a block holding clones of the `len` elements starting at `ptr`.
///
/// # Safety
///
/// When `ptr` is non-null it must be valid for reads of `len` initialized
/// elements of `T`, as required by [`std::slice::from_raw_parts`].
///
/// # Panics
///
/// Panics if exactly one of `ptr.is_null()` and `len == 0` holds.
#[track_caller]
pub unsafe fn allocate_from_raw_parts<T: Clone>(ptr: *const T, len: usize) -> Result<Block<T>> {
    validate_raw_pair(ptr.is_null(), len);
    if ptr.is_null() {
        return Ok(None);
    }
    let src = unsafe { std::slice::from_raw_parts(ptr, len) };
    allocate_from_raw(Some(src), len)
}

/// Clones `src` into `dst` element by element.
///
/// # Panics
///
/// Panics if the slices differ in length.
#[inline]
#[track_caller]
pub fn copy_elements<T: Clone>(dst: &mut [T], src: &[T]) {
    check_same_len(dst.len(), src.len());
    dst.clone_from_slice(src);
}

/// Copies `src` into `dst` as raw bytes.
///
/// # Panics
///
/// Panics if the slices differ in length.
#[inline]
#[track_caller]
pub fn copy_pod_elements<T: bytemuck::Pod>(dst: &mut [T], src: &[T]) {
    check_same_len(dst.len(), src.len());
    if std::mem::size_of::<T>() == 0 {
        return;
    }
    let dst: &mut [u8] = bytemuck::cast_slice_mut(dst);
    dst.copy_from_slice(bytemuck::cast_slice(src));
}

/// Moves the elements of `src` into `dst`.
///
/// Ownership is transferred by swapping, so `src` is left holding the values
/// that `dst` held before the call. No element is cloned or dropped.
///
/// # Panics
///
/// Panics if the slices differ in length.
#[inline]
#[track_caller]
pub fn move_elements<T>(dst: &mut [T], src: &mut [T]) {
    check_same_len(dst.len(), src.len());
    dst.swap_with_slice(src);
}

/// Returns the referenced value, failing fast when the allocation is absent.
///
/// # Panics
///
/// Panics if `value` is `None`.
#[inline]
#[track_caller]
pub fn validate_not_null<T: ?Sized>(value: Option<&T>) -> &T {
    match value {
        Some(value) => value,
        None => panic!("dereference of an absent allocation"),
    }
}

/// Mutable counterpart of [`validate_not_null`].
#[inline]
#[track_caller]
pub fn validate_not_null_mut<T: ?Sized>(value: Option<&mut T>) -> &mut T {
    match value {
        Some(value) => value,
        None => panic!("dereference of an absent allocation"),
    }
}

/// Checks the pairing of a raw source and its length: a null source must come
/// with a zero length and a non-null one with a nonzero length.
///
/// # Panics
///
/// Panics when the pairing does not hold.
#[inline]
#[track_caller]
pub fn validate_raw_pair(is_null: bool, len: usize) {
    assert!(
        is_null == (len == 0),
        "{} source paired with length {len}",
        if is_null { "null" } else { "non-null" },
    );
}

/// Resolves the source of a write of `len` elements.
///
/// An absent source is accepted only for an empty write; otherwise it is an
/// invalid argument. The returned slice holds exactly `len` elements.
///
/// # Panics
///
/// Panics if a present `src` holds fewer than `len` elements.
#[track_caller]
pub fn resolve_source<T>(src: Option<&[T]>, len: usize) -> Result<&[T]> {
    verify_arg!(src, src.is_some() || len == 0);
    match src {
        Some(src) => Ok(prefix(src, len)),
        None => Ok(&[]),
    }
}

fn reserve_exact<T>(len: usize) -> Result<Vec<T>> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|e| {
        log::debug!(
            "allocation of {len} elements ({} bytes each) failed: {e}",
            std::mem::size_of::<T>()
        );
        Error::allocation_failed(len, e)
    })?;
    Ok(vec)
}

#[inline]
#[track_caller]
fn prefix<T>(src: &[T], len: usize) -> &[T] {
    assert!(
        src.len() >= len,
        "source holds {} elements, expected at least {len}",
        src.len()
    );
    &src[..len]
}

#[inline]
#[track_caller]
fn check_same_len(dst: usize, src: usize) {
    assert_eq!(dst, src, "destination and source lengths differ");
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use holdfast_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_allocate_zero_is_none() {
        let block = allocate::<u32>(0).unwrap();
        assert!(block.is_none());
    }

    #[test]
    fn test_allocate_default_initialized() {
        let block = allocate::<u64>(5).unwrap().unwrap();
        assert_eq!(block.len(), 5);
        assert!(block.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_allocate_with() {
        let mut next = 0;
        let block = allocate_with(4, || {
            next += 1;
            next
        })
        .unwrap()
        .unwrap();
        assert_eq!(&block[..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_allocate_overflow_reports_failure() {
        let err = allocate::<u64>(usize::MAX).unwrap_err();
        assert!(err.is_resource_exhausted());
        assert!(matches!(
            err.kind(),
            ErrorKind::AllocationFailed {
                requested: usize::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_allocate_from_raw() {
        let src = [7u8, 8, 9, 10];
        let block = allocate_from_raw(Some(&src[..]), 3).unwrap().unwrap();
        assert_eq!(&block[..], &[7, 8, 9]);
        assert_ne!(block.as_ptr(), src.as_ptr());

        assert!(allocate_from_raw::<u8>(None, 0).unwrap().is_none());
    }

    #[test]
    #[should_panic(expected = "null source paired with length 3")]
    fn test_allocate_from_raw_null_with_len() {
        let _ = allocate_from_raw::<u8>(None, 3);
    }

    #[test]
    #[should_panic(expected = "non-null source paired with length 0")]
    fn test_allocate_from_raw_zero_len_with_source() {
        let _ = allocate_from_raw(Some(&[1u8, 2][..]), 0);
    }

    #[test]
    #[should_panic(expected = "source holds 2 elements")]
    fn test_allocate_from_raw_short_source() {
        let _ = allocate_from_raw(Some(&[1u8, 2][..]), 3);
    }

    #[test]
    fn test_allocate_from_raw_parts() {
        let src = vec![String::from("a"), String::from("b")];
        let block = unsafe { allocate_from_raw_parts(src.as_ptr(), src.len()) }
            .unwrap()
            .unwrap();
        assert_eq!(&block[..], &src[..]);

        let empty = unsafe { allocate_from_raw_parts::<String>(std::ptr::null(), 0) }.unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_copy_elements_clones() {
        let shared = Rc::new(5);
        let src = vec![shared.clone(), shared.clone()];
        let mut dst = vec![Rc::new(0), Rc::new(0)];
        copy_elements(&mut dst, &src);
        assert_eq!(Rc::strong_count(&shared), 5);
        assert_eq!(*dst[1], 5);
    }

    #[test]
    fn test_copy_pod_elements() {
        let src = [1u32, 0xdead_beef, 3];
        let mut dst = [0u32; 3];
        copy_pod_elements(&mut dst, &src);
        assert_eq!(dst, src);
    }

    #[test]
    #[should_panic(expected = "destination and source lengths differ")]
    fn test_copy_elements_len_mismatch() {
        let mut dst = [0u8; 2];
        copy_elements(&mut dst, &[1, 2, 3]);
    }

    #[test]
    fn test_move_elements_swaps() {
        let mut src = vec![String::from("x"), String::from("y")];
        let mut dst = vec![String::new(), String::new()];
        move_elements(&mut dst, &mut src);
        assert_eq!(dst, ["x", "y"]);
        assert!(src.iter().all(String::is_empty));
    }

    #[test]
    fn test_validate_not_null() {
        let v = 3;
        assert_eq!(*validate_not_null(Some(&v)), 3);
    }

    #[test]
    #[should_panic(expected = "dereference of an absent allocation")]
    fn test_validate_not_null_panics() {
        validate_not_null::<u8>(None);
    }

    #[test]
    fn test_resolve_source() {
        assert_eq!(resolve_source(Some(&[1, 2, 3][..]), 2).unwrap(), &[1, 2]);
        assert!(resolve_source::<u8>(None, 0).unwrap().is_empty());
        let err = resolve_source::<u8>(None, 5).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }
}
