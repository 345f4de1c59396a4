//! The 8x8 forward and inverse discrete cosine transforms used by the JPEG
//! Baseline codec.
//!
//! The transforms are separable: a one-dimensional transform is applied to
//! each row and then to each column, with the overall 1/8 normalization
//! applied uniformly through the basis coefficients.

/// The 8x8 matrix of cosine basis coefficients: `BASIS[u][x]` is the
/// contribution of spatial position `x` to frequency `u` in one dimension,
/// including the normalization factors.
///
static BASIS: [[f32; 8]; 8] = build_basis();

const fn build_basis() -> [[f32; 8]; 8] {
  // cos((2x + 1) * u * PI / 16) * c(u) / 2, for u and x in 0..8, where
  // c(0) is 1/sqrt(2) and c(u) is 1 otherwise. Expressed as literals
  // because floating-point math isn't available in const evaluation.
  [
    [
      0.35355339, 0.35355339, 0.35355339, 0.35355339, 0.35355339, 0.35355339,
      0.35355339, 0.35355339,
    ],
    [
      0.49039264, 0.41573481, 0.27778512, 0.09754516, -0.09754516,
      -0.27778512, -0.41573481, -0.49039264,
    ],
    [
      0.46193977, 0.19134172, -0.19134172, -0.46193977, -0.46193977,
      -0.19134172, 0.19134172, 0.46193977,
    ],
    [
      0.41573481, -0.09754516, -0.49039264, -0.27778512, 0.27778512,
      0.49039264, 0.09754516, -0.41573481,
    ],
    [
      0.35355339, -0.35355339, -0.35355339, 0.35355339, 0.35355339,
      -0.35355339, -0.35355339, 0.35355339,
    ],
    [
      0.27778512, -0.49039264, 0.09754516, 0.41573481, -0.41573481,
      -0.09754516, 0.49039264, -0.27778512,
    ],
    [
      0.19134172, -0.46193977, 0.46193977, -0.19134172, -0.19134172,
      0.46193977, -0.46193977, 0.19134172,
    ],
    [
      0.09754516, -0.27778512, 0.41573481, -0.49039264, 0.49039264,
      -0.41573481, 0.27778512, -0.09754516,
    ],
  ]
}

/// Applies the forward transform to an 8x8 block of level-shifted samples
/// in row-major order, producing frequency coefficients in row-major order.
///
pub fn forward(block: &[f32; 64]) -> [f32; 64] {
  let mut rows = [0.0f32; 64];

  // Transform rows
  for y in 0..8 {
    for u in 0..8 {
      let mut sum = 0.0;
      for x in 0..8 {
        sum += block[y * 8 + x] * BASIS[u][x];
      }
      rows[y * 8 + u] = sum;
    }
  }

  // Transform columns
  let mut result = [0.0f32; 64];
  for u in 0..8 {
    for v in 0..8 {
      let mut sum = 0.0;
      for y in 0..8 {
        sum += rows[y * 8 + u] * BASIS[v][y];
      }
      result[v * 8 + u] = sum;
    }
  }

  result
}

/// Applies the inverse transform to an 8x8 block of frequency coefficients
/// in row-major order, producing level-shifted samples in row-major order.
///
pub fn inverse(block: &[f32; 64]) -> [f32; 64] {
  let mut rows = [0.0f32; 64];

  // Transform rows
  for y in 0..8 {
    for x in 0..8 {
      let mut sum = 0.0;
      for u in 0..8 {
        sum += block[y * 8 + u] * BASIS[u][x];
      }
      rows[y * 8 + x] = sum;
    }
  }

  // Transform columns
  let mut result = [0.0f32; 64];
  for x in 0..8 {
    for y in 0..8 {
      let mut sum = 0.0;
      for v in 0..8 {
        sum += rows[v * 8 + x] * BASIS[v][y];
      }
      result[y * 8 + x] = sum;
    }
  }

  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flat_block_transforms_to_dc_only_test() {
    let block = [100.0f32; 64];
    let coefficients = forward(&block);

    // The DC coefficient of a flat block is 8 times the sample value
    assert!((coefficients[0] - 800.0).abs() < 0.01);

    for coefficient in &coefficients[1..] {
      assert!(coefficient.abs() < 0.01);
    }
  }

  #[test]
  fn round_trip_test() {
    let mut block = [0.0f32; 64];
    for (i, sample) in block.iter_mut().enumerate() {
      *sample = ((i * 7) % 256) as f32 - 128.0;
    }

    let recovered = inverse(&forward(&block));

    for (original, recovered) in block.iter().zip(recovered.iter()) {
      assert!((original - recovered).abs() < 0.01);
    }
  }
}
