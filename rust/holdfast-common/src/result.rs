pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns an `InvalidArgument` error from the enclosing function when the
/// condition does not hold.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

/// Checks that a write cursor placed at `pos` stays within a block of `len`
/// elements.
#[inline]
pub fn verify_position(pos: usize, len: usize) -> Result<()> {
    if pos <= len {
        Ok(())
    } else {
        Err(crate::error::Error::invalid_position(pos, len))
    }
}

/// Checks that `count` elements written at `write_pos` fit within a block of
/// `len` elements, returning the end of the written range.
#[inline]
pub fn verify_fits(write_pos: usize, count: usize, len: usize) -> Result<usize> {
    match write_pos.checked_add(count) {
        Some(end) if end <= len => Ok(end),
        _ => buffer_full(write_pos, count, len),
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
fn buffer_full(write_pos: usize, count: usize, len: usize) -> Result<usize> {
    Err(crate::error::Error::buffer_full(write_pos, count, len))
}
