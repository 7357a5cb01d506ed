use holdfast_common_traits::buffer::{StorageOwner, WriteBuffer, write_iter};

use crate::{BoundedBuffer, GrowableBuffer, GrowthPolicy, OwnedStorage};

/// Appends a little-endian length-prefixed record; works over any write buffer.
fn append_record<B>(buf: &mut B, payload: &[u8]) -> holdfast_common::Result<()>
where
    B: WriteBuffer<u8>,
{
    let len = u16::try_from(payload.len()).expect("record too long");
    let start = buf.write_position();
    buf.write_many(Some(&len.to_le_bytes()[..]), 2)?;
    if let Err(e) = buf.write_many((!payload.is_empty()).then_some(payload), payload.len()) {
        buf.set_write_position(start)?;
        return Err(e);
    }
    Ok(())
}

fn random_chunk() -> Vec<u32> {
    (0..fastrand::usize(0..40))
        .map(|_| fastrand::u32(..))
        .collect()
}

fn sum_written<B: WriteBuffer<u32> + ?Sized>(buf: &B) -> u64 {
    buf.written().iter().map(|&v| v as u64).sum()
}

#[test]
fn test_bounded_scenario() {
    let mut b = BoundedBuffer::<u8>::with_len(4).unwrap();
    b.write_many(Some(&[1, 2, 3, 4][..]), 4).unwrap();
    assert_eq!(b.write_position(), 4);
    assert!(b.write(5).is_err());
    assert_eq!(b.as_slice(), &[1, 2, 3, 4]);
}

#[test]
fn test_growable_scenario() {
    let mut d = GrowableBuffer::<u32>::with_len(0).unwrap();
    let mut previous_len = d.len();
    for i in 0..20u32 {
        d.write(1000 + i).unwrap();
        assert!(d.len() >= previous_len);
        previous_len = d.len();
    }
    assert_eq!(d.write_position(), 20);
    let expected: Vec<u32> = (1000..1020).collect();
    assert_eq!(d.written(), expected);
}

#[test]
fn test_move_scenario() {
    let mut p1 = OwnedStorage::<i32>::with_len(10).unwrap();
    let p2 = p1.take();
    assert_eq!(p1.len(), 0);
    assert_eq!(p2.len(), 10);
}

#[test]
fn test_null_source_scenario() {
    let mut d = GrowableBuffer::<i32>::new();
    assert!(d.write_many(None, 5).is_err());
    assert_eq!(d.len(), 0);
    assert_eq!(d.write_position(), 0);
}

#[test]
fn test_copy_independence_scenario() {
    let a = OwnedStorage::<i32>::with_len(5).unwrap();
    let b = a.clone();

    let mut writer = BoundedBuffer::from_storage(a);
    writer.write_many(Some(&[9, 9, 9][..]), 3).unwrap();
    assert_eq!(b.as_slice(), &[0, 0, 0, 0, 0]);
    assert_eq!(writer.as_slice(), &[9, 9, 9, 0, 0]);
}

#[test]
fn test_with_len_property() {
    for _ in 0..100 {
        let n = fastrand::usize(0..512);
        let s = OwnedStorage::<u16>::with_len(n).unwrap();
        assert_eq!(s.len(), n);
        assert_eq!(s.get().is_none(), n == 0);
        assert_eq!(s.size(), n * 2);
    }
}

#[test]
fn test_bounded_exact_fill_property() {
    for _ in 0..50 {
        let n = fastrand::usize(0..64);
        let mut b = BoundedBuffer::<u64>::with_len(n).unwrap();
        for i in 0..n {
            b.write(i as u64).unwrap();
        }
        assert!(b.write(0).is_err());
        assert_eq!(b.write_position(), n);
    }
}

#[test]
fn test_growable_random_writes_preserve_order() {
    for _ in 0..20 {
        let mut d = GrowableBuffer::<u32>::new();
        let mut expected = Vec::new();
        for _ in 0..fastrand::usize(0..200) {
            match fastrand::u8(0..3) {
                0 => {
                    let v = fastrand::u32(..);
                    d.write(v).unwrap();
                    expected.push(v);
                }
                1 => {
                    let chunk = random_chunk();
                    let src = (!chunk.is_empty()).then_some(&chunk[..]);
                    d.write_many(src, chunk.len()).unwrap();
                    expected.extend_from_slice(&chunk);
                }
                _ => {
                    let mut chunk = random_chunk();
                    let copy = chunk.clone();
                    d.write_many_moved(&mut chunk).unwrap();
                    expected.extend_from_slice(&copy);
                }
            }
            assert!(d.len() >= d.write_position());
        }
        assert_eq!(d.write_position(), expected.len());
        assert_eq!(d.written(), expected);
    }
}

#[test]
fn test_set_write_position_property() {
    let mut b = BoundedBuffer::<u8>::with_len(10).unwrap();
    for pos in 0..=20 {
        assert_eq!(b.set_write_position(pos).is_ok(), pos <= 10);
    }
    b.reset_write_position();
    assert_eq!(b.write_position(), 0);
}

#[test]
fn test_generic_writer_over_both_policies() {
    let mut fixed = BoundedBuffer::<u8>::with_len(8).unwrap();
    append_record(&mut fixed, b"abc").unwrap();
    assert_eq!(fixed.written(), &[3, 0, b'a', b'b', b'c']);
    assert!(append_record(&mut fixed, b"xyz").is_err());
    assert_eq!(fixed.write_position(), 5);

    let mut growing = GrowableBuffer::<u8>::new();
    append_record(&mut growing, b"abc").unwrap();
    append_record(&mut growing, b"xyz").unwrap();
    append_record(&mut growing, b"").unwrap();
    assert_eq!(
        growing.written(),
        &[3, 0, b'a', b'b', b'c', 3, 0, b'x', b'y', b'z', 0, 0]
    );
}

#[test]
fn test_write_iter_restores_cursor() {
    let mut fixed = BoundedBuffer::<u32>::with_len(4).unwrap();
    assert_eq!(write_iter(&mut fixed, [1, 2]).unwrap(), 2);
    assert!(write_iter(&mut fixed, [3, 4, 5]).is_err());
    assert_eq!(fixed.write_position(), 2);
    assert_eq!(sum_written(&fixed), 3);
    // Slots past the restored cursor keep what the failed call wrote.
    assert_eq!(fixed.as_slice(), &[1, 2, 3, 4]);

    let mut growing = GrowableBuffer::<u32>::new();
    assert_eq!(write_iter(&mut growing, 0..100).unwrap(), 100);
    assert_eq!(sum_written(&growing), 4950);
}

#[test]
fn test_write_from_across_buffer_kinds() {
    let mut growing = GrowableBuffer::<u32>::new();
    write_iter(&mut growing, 1..=5).unwrap();

    let mut fixed = BoundedBuffer::<u32>::with_len(5).unwrap();
    fixed.write_from(&growing, true).unwrap();
    assert!(fixed.compare_raw(Some(growing.written()), 5));

    let policy = GrowthPolicy::DEFAULT.with_min_len(1);
    let mut other = GrowableBuffer::<u32>::with_policy(0, policy).unwrap();
    other.write_from(&fixed, false).unwrap();
    assert_eq!(other.len(), 5);
    assert!(other.compare(&fixed));
}

#[test]
fn test_dyn_storage_owner() {
    let owners: Vec<Box<dyn StorageOwner<u8>>> = vec![
        Box::new(OwnedStorage::from_vec(vec![1, 2])),
        Box::new(BoundedBuffer::<u8>::with_len(3).unwrap()),
        Box::new(GrowableBuffer::<u8>::new()),
    ];
    let lengths: Vec<usize> = owners.iter().map(|o| o.len()).collect();
    assert_eq!(lengths, [2, 3, 0]);
    assert!(owners.iter().map(|o| o.has_storage()).eq([true, true, false]));
}
