use crate::common::*;
use ndarray::Array;

/// Convert every element to another float type.
pub(crate) fn cast_array<T, U, D>(array: &Array<T, D>) -> Result<Array<U, D>>
where
    T: Float,
    U: Float,
    D: Dimension,
{
    let values: Vec<U> = array
        .iter()
        .map(|&value| {
            U::from(value).ok_or_else(|| format_err!("{:?} cannot be cast", value.to_f64()))
        })
        .try_collect()?;
    let cast = Array::from_shape_vec(array.raw_dim(), values)?;
    Ok(cast)
}

/// Cast a scalar to the working float type.
pub(crate) fn cast_scalar<T>(value: f64) -> Result<T>
where
    T: Float,
{
    T::from(value).ok_or_else(|| format_err!("{} cannot be cast", value))
}
