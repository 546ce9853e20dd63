//! Utilities.
use anyhow::Result;
use ndarray::{Array1, Array2};
use std::convert::TryFrom;
use tch::{Device, Kind, Tensor};

/// Converts [`Array2`] to a 2-dimensional [`Tensor`] on `device`.
pub fn array2_to_tensor(a: &Array2<f32>, device: Device) -> Tensor {
    let (n, m) = a.dim();
    let v: Vec<f32> = a.iter().copied().collect();
    Tensor::from_slice(&v)
        .reshape([n as i64, m as i64])
        .to(device)
}

/// Converts [`Array1`] to a 1-dimensional [`Tensor`] on `device`.
pub fn array1_to_tensor(a: &Array1<f32>, device: Device) -> Tensor {
    let v: Vec<f32> = a.iter().copied().collect();
    Tensor::from_slice(&v).to(device)
}

/// Converts a 2-dimensional [`Tensor`] to [`Array2`].
pub fn tensor_to_array2(t: &Tensor) -> Result<Array2<f32>> {
    let (n, m) = t.size2()?;
    let v = Vec::<f32>::try_from(&t.to_kind(Kind::Float).to(Device::Cpu).flatten(0, -1))?;
    Ok(Array2::from_shape_vec((n as usize, m as usize), v)?)
}

/// Converts a 1-dimensional [`Tensor`] to [`Array1`].
pub fn tensor_to_array1(t: &Tensor) -> Result<Array1<f32>> {
    let v = Vec::<f32>::try_from(&t.to_kind(Kind::Float).to(Device::Cpu).flatten(0, -1))?;
    Ok(Array1::from(v))
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_array2_layout() -> Result<()> {
        let a = array![[1f32, 2., 3.], [4., 5., 6.]];
        let t = array2_to_tensor(&a, Device::Cpu);

        assert_eq!(t.size(), vec![2, 3]);
        assert_eq!(t.double_value(&[1, 0]), 4.0);
        assert_eq!(tensor_to_array2(&t)?, a);
        Ok(())
    }
}
