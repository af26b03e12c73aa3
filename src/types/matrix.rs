use std::ops::{Add, Sub, Mul, Index, IndexMut};

use super::Vector3D;

/// A 3x3 matrix type, used for unit cells and coordinate transformations.
///
/// Storage is row-major; `matrix[0]` is the first row.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Matrix3 {
    data: [[f64; 3]; 3],
}

impl Matrix3 {
    /// Create a new `Matrix3` specifying all its components
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn new(m00: f64, m01: f64, m02: f64,
               m10: f64, m11: f64, m12: f64,
               m20: f64, m21: f64, m22: f64) -> Matrix3 {
        Matrix3 {
            data: [
                [m00, m01, m02],
                [m10, m11, m12],
                [m20, m21, m22],
            ]
        }
    }

    /// Create a matrix with all components set to 0
    #[inline]
    pub fn zero() -> Matrix3 {
        Matrix3::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Create an identity matrix
    #[inline]
    pub fn one() -> Matrix3 {
        Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0)
    }

    /// Compute the determinant of this matrix
    pub fn determinant(&self) -> f64 {
        let m = &self.data;
        m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Compute the transpose of this matrix
    pub fn transposed(&self) -> Matrix3 {
        let m = &self.data;
        Matrix3::new(
            m[0][0], m[1][0], m[2][0],
            m[0][1], m[1][1], m[2][1],
            m[0][2], m[1][2], m[2][2],
        )
    }

    /// Compute the inverse of this matrix
    ///
    /// # Panics
    ///
    /// If the matrix is not invertible, i.e. if its determinant is zero.
    pub fn inverse(&self) -> Matrix3 {
        let determinant = self.determinant();
        assert!(determinant != 0.0, "this matrix is not invertible");

        let m = &self.data;
        let inv_det = 1.0 / determinant;
        let mut inverse = Matrix3::zero();
        inverse[0][0] = inv_det * (m[1][1] * m[2][2] - m[2][1] * m[1][2]);
        inverse[0][1] = inv_det * (m[0][2] * m[2][1] - m[0][1] * m[2][2]);
        inverse[0][2] = inv_det * (m[0][1] * m[1][2] - m[0][2] * m[1][1]);
        inverse[1][0] = inv_det * (m[1][2] * m[2][0] - m[1][0] * m[2][2]);
        inverse[1][1] = inv_det * (m[0][0] * m[2][2] - m[0][2] * m[2][0]);
        inverse[1][2] = inv_det * (m[1][0] * m[0][2] - m[0][0] * m[1][2]);
        inverse[2][0] = inv_det * (m[1][0] * m[2][1] - m[2][0] * m[1][1]);
        inverse[2][1] = inv_det * (m[2][0] * m[0][1] - m[0][0] * m[2][1]);
        inverse[2][2] = inv_det * (m[0][0] * m[1][1] - m[1][0] * m[0][1]);
        return inverse;
    }
}

impl_arithmetic!(
    Matrix3, Matrix3, Add, add, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] + other[i][j];
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Matrix3, Sub, sub, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] - other[i][j];
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Matrix3, Mul, mul, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][0] * other[0][j]
                    + self[i][1] * other[1][j]
                    + self[i][2] * other[2][j];
            }
        }
        result
    }
);

// Row vector times matrix: the natural product when the matrix rows are
// lattice vectors and the vector holds fractional coordinates.
impl_arithmetic!(
    Vector3D, Matrix3, Mul, mul, Vector3D,
    self, other,
    {
        let x = self.x * other[0][0] + self.y * other[1][0] + self.z * other[2][0];
        let y = self.x * other[0][1] + self.y * other[1][1] + self.z * other[2][1];
        let z = self.x * other[0][2] + self.y * other[1][2] + self.z * other[2][2];
        Vector3D::new(x, y, z)
    }
);

// Matrix times column vector
impl_arithmetic!(
    Matrix3, Vector3D, Mul, mul, Vector3D,
    self, other,
    {
        let x = self[0][0] * other.x + self[0][1] * other.y + self[0][2] * other.z;
        let y = self[1][0] * other.x + self[1][1] * other.y + self[1][2] * other.z;
        let z = self[2][0] * other.x + self[2][1] * other.y + self[2][2] * other.z;
        Vector3D::new(x, y, z)
    }
);

lsh_scal_arithmetic!(
    Matrix3, Mul, mul, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] * other;
            }
        }
        result
    }
);

impl Index<usize> for Matrix3 {
    type Output = [f64; 3];
    #[inline]
    fn index(&self, index: usize) -> &[f64; 3] {
        &self.data[index]
    }
}

impl IndexMut<usize> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut [f64; 3] {
        &mut self.data[index]
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3 { data }
    }
}

impl approx::AbsDiffEq for Matrix3 {
    type Epsilon = <f64 as approx::AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        for i in 0..3 {
            for j in 0..3 {
                if !f64::abs_diff_eq(&self[i][j], &other[i][j], epsilon) {
                    return false;
                }
            }
        }
        return true;
    }
}

impl approx::RelativeEq for Matrix3 {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        for i in 0..3 {
            for j in 0..3 {
                if !f64::relative_eq(&self[i][j], &other[i][j], epsilon, max_relative) {
                    return false;
                }
            }
        }
        return true;
    }
}

impl approx::UlpsEq for Matrix3 {
    fn default_max_ulps() -> u32 {
        f64::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Self, epsilon: Self::Epsilon, max_ulps: u32) -> bool {
        for i in 0..3 {
            for j in 0..3 {
                if !f64::ulps_eq(&self[i][j], &other[i][j], epsilon, max_ulps) {
                    return false;
                }
            }
        }
        return true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn determinant() {
        let m = Matrix3::new(2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0);
        assert_ulps_eq!(m.determinant(), 24.0);
        assert_ulps_eq!(Matrix3::one().determinant(), 1.0);
    }

    #[test]
    fn inverse() {
        let m = Matrix3::new(
            2.0, 1.0, 0.0,
            0.0, 3.0, 1.0,
            0.0, 0.0, 4.0,
        );
        assert_ulps_eq!(m * m.inverse(), Matrix3::one());
        assert_ulps_eq!(m.inverse() * m, Matrix3::one());
    }

    #[test]
    #[should_panic(expected = "this matrix is not invertible")]
    fn inverse_singular() {
        let m = Matrix3::zero();
        let _ = m.inverse();
    }

    #[test]
    fn transposed() {
        let m = Matrix3::new(
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        );
        assert_eq!(m.transposed().transposed(), m);
        assert_eq!(m.transposed()[0], [1.0, 4.0, 7.0]);
    }

    #[test]
    fn scalar_product() {
        let m = Matrix3::one();
        assert_eq!((m * 2.0)[1], [0.0, 2.0, 0.0]);
        assert_eq!((&m * 2.0)[0], [2.0, 0.0, 0.0]);
    }

    #[test]
    fn vector_products() {
        let m = Matrix3::new(
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        );
        let v = Vector3D::new(1.0, 2.0, 3.0);

        assert_ulps_eq!(m * v, Vector3D::new(14.0, 32.0, 50.0));
        assert_ulps_eq!(v * m, Vector3D::new(30.0, 36.0, 42.0));
    }
}
