use std::ops::{Add, AddAssign, Sub, SubAssign, Neg, Mul, MulAssign, Div, DivAssign, Index, IndexMut};

/// A 3-dimensional vector type, implementing all usual arithmetic operations.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Vector3D {
    /// x component of the vector
    pub x: f64,
    /// y component of the vector
    pub y: f64,
    /// z component of the vector
    pub z: f64,
}

impl Vector3D {
    /// Create a new `Vector3D` with components `x`, `y`, `z`
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Vector3D {
        Vector3D { x, y, z }
    }

    /// Create a new null `Vector3D`
    #[inline]
    pub fn zero() -> Vector3D {
        Vector3D::new(0.0, 0.0, 0.0)
    }

    /// Return the squared euclidean norm of a `Vector3D`
    #[inline]
    pub fn norm2(&self) -> f64 {
        self * self
    }

    /// Return the euclidean norm of a `Vector3D`
    #[inline]
    pub fn norm(&self) -> f64 {
        f64::sqrt(self.norm2())
    }

    /// Normalize a `Vector3D`
    #[inline]
    pub fn normalized(&self) -> Vector3D {
        self / self.norm()
    }

    /// Compute the cross product of two vectors
    #[inline]
    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        let x = self.y * other.z - self.z * other.y;
        let y = self.z * other.x - self.x * other.z;
        let z = self.x * other.y - self.y * other.x;
        Vector3D::new(x, y, z)
    }
}

impl_arithmetic!(
    Vector3D, Vector3D, Add, add, Vector3D,
    self, other,
    Vector3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, AddAssign, add_assign,
    self, other,
    {self.x += other.x; self.y += other.y; self.z += other.z}
);

impl_arithmetic!(
    Vector3D, Vector3D, Sub, sub, Vector3D,
    self, other,
    Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, SubAssign, sub_assign,
    self, other,
    {self.x -= other.x; self.y -= other.y; self.z -= other.z}
);

// Dot product
impl_arithmetic!(
    Vector3D, Vector3D, Mul, mul, f64,
    self, other,
    self.x * other.x + self.y * other.y + self.z * other.z
);

lsh_scal_arithmetic!(
    Vector3D, Mul, mul, Vector3D,
    self, other,
    Vector3D::new(self.x * other, self.y * other, self.z * other)
);

rhs_scal_arithmetic!(
    Vector3D, Mul, mul, Vector3D,
    self, other,
    Vector3D::new(self * other.x, self * other.y, self * other.z)
);

impl_inplace_arithmetic!(
    Vector3D, f64, MulAssign, mul_assign,
    self, other,
    {self.x *= other; self.y *= other; self.z *= other}
);

lsh_scal_arithmetic!(
    Vector3D, Div, div, Vector3D,
    self, other,
    Vector3D::new(self.x / other, self.y / other, self.z / other)
);

impl_inplace_arithmetic!(
    Vector3D, f64, DivAssign, div_assign,
    self, other,
    {self.x /= other; self.y /= other; self.z /= other}
);

impl Neg for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

impl<'a> Neg for &'a Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

impl Index<usize> for Vector3D {
    type Output = f64;
    #[inline]
    fn index(&self, index: usize) -> &f64 {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("index out of bounds: the len is 3 but the index is {}", index),
        }
    }
}

impl IndexMut<usize> for Vector3D {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("index out of bounds: the len is 3 but the index is {}", index),
        }
    }
}

impl From<[f64; 3]> for Vector3D {
    fn from(data: [f64; 3]) -> Vector3D {
        Vector3D::new(data[0], data[1], data[2])
    }
}

impl approx::AbsDiffEq for Vector3D {
    type Epsilon = <f64 as approx::AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        f64::abs_diff_eq(&self.x, &other.x, epsilon)
            && f64::abs_diff_eq(&self.y, &other.y, epsilon)
            && f64::abs_diff_eq(&self.z, &other.z, epsilon)
    }
}

impl approx::RelativeEq for Vector3D {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        f64::relative_eq(&self.x, &other.x, epsilon, max_relative)
            && f64::relative_eq(&self.y, &other.y, epsilon, max_relative)
            && f64::relative_eq(&self.z, &other.z, epsilon, max_relative)
    }
}

impl approx::UlpsEq for Vector3D {
    fn default_max_ulps() -> u32 {
        f64::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Self, epsilon: Self::Epsilon, max_ulps: u32) -> bool {
        f64::ulps_eq(&self.x, &other.x, epsilon, max_ulps)
            && f64::ulps_eq(&self.y, &other.y, epsilon, max_ulps)
            && f64::ulps_eq(&self.z, &other.z, epsilon, max_ulps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn add_sub() {
        let a = Vector3D::new(2.0, 3.5, 4.8);
        let b = Vector3D::new(6.1, -8.5, 7.3);

        assert_ulps_eq!(a + b, Vector3D::new(8.1, -5.0, 12.1));
        assert_ulps_eq!(a - b, Vector3D::new(-4.1, 12.0, -2.5));

        let mut c = a;
        c += b;
        assert_ulps_eq!(c, a + b);
        c -= b;
        assert_ulps_eq!(c, a);
    }

    #[test]
    fn dot_cross() {
        let a = Vector3D::new(2.1, 3.5, 4.8);
        let b = Vector3D::new(6.7, -8.5, 7.3);

        assert_ulps_eq!(a * b, 2.1 * 6.7 - 3.5 * 8.5 + 4.8 * 7.3);
        // cross product is orthogonal to both operands
        let c = a.cross(&b);
        assert_ulps_eq!(c * a, 0.0, epsilon = 1e-12);
        assert_ulps_eq!(c * b, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn scalar_operations() {
        let a = Vector3D::new(1.0, 2.0, 4.0);
        assert_ulps_eq!(a * 2.0, Vector3D::new(2.0, 4.0, 8.0));
        assert_ulps_eq!(2.0 * &a, Vector3D::new(2.0, 4.0, 8.0));
        assert_ulps_eq!(a / 2.0, Vector3D::new(0.5, 1.0, 2.0));

        let mut b = a;
        b *= 3.0;
        assert_ulps_eq!(b, Vector3D::new(3.0, 6.0, 12.0));
        b /= &3.0;
        assert_ulps_eq!(b, a);
    }

    #[test]
    fn norm() {
        let a = Vector3D::new(1.0, 2.0, -2.0);
        assert_ulps_eq!(a.norm2(), 9.0);
        assert_ulps_eq!(a.norm(), 3.0);
        assert_ulps_eq!(a.normalized().norm(), 1.0);
    }

    #[test]
    fn index() {
        let mut a = Vector3D::new(1.0, 2.0, 3.0);
        assert_eq!(a[0], a.x);
        assert_eq!(a[1], a.y);
        assert_eq!(a[2], a.z);

        a[1] = 42.0;
        assert_eq!(a.y, 42.0);
    }
}
