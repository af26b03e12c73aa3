use crate::types::{Matrix3, Vector3D};

/// Lattice representation of a (possibly triclinic) unit cell: cell lengths
/// and angles, transformations between cartesian and fractional/scaled
/// coordinates, and the reciprocal lattice.
///
/// The cell matrix rows are the lattice vectors `a`, `b`, `c`. The
/// transformation matrices are built in closed form from the cell lengths
/// and angles rather than by general matrix inversion; they assume the usual
/// canonical orientation (`a` along x, `b` in the xy plane). Degenerate
/// (near zero volume) cells are not validated and produce degenerate
/// transforms.
#[derive(Debug, Clone)]
pub struct Lattice {
    cell: Matrix3,
    lengths: Vector3D,
    /// alpha (between b, c), beta (a, c), gamma (a, b), in radians
    angles: Vector3D,
    scaled2cartesian: Matrix3,
    cartesian2scaled: Matrix3,
    reciprocal_vectors: Matrix3,
    reciprocal_lengths: Vector3D,
}

impl Lattice {
    /// Build the lattice data for the given cell matrix (rows are the cell
    /// vectors)
    pub fn new(cell: Matrix3) -> Lattice {
        let a = Vector3D::from(cell[0]);
        let b = Vector3D::from(cell[1]);
        let c = Vector3D::from(cell[2]);

        let lengths = Vector3D::new(a.norm(), b.norm(), c.norm());
        let angles = Vector3D::new(
            f64::acos(b * c / (lengths[1] * lengths[2])),
            f64::acos(a * c / (lengths[0] * lengths[2])),
            f64::acos(a * b / (lengths[0] * lengths[1])),
        );

        let cos = Vector3D::new(angles[0].cos(), angles[1].cos(), angles[2].cos());
        let sin_gamma = angles[2].sin();

        // cell volume divided by a*b*c
        let volume_factor = f64::sqrt(
            1.0 - cos[0] * cos[0] - cos[1] * cos[1] - cos[2] * cos[2]
            + 2.0 * cos[0] * cos[1] * cos[2]
        );

        let mut scaled2cartesian = Matrix3::zero();
        scaled2cartesian[0][0] = lengths[0];
        scaled2cartesian[1][0] = lengths[1] * cos[2];
        scaled2cartesian[1][1] = lengths[1] * sin_gamma;
        scaled2cartesian[2][0] = lengths[2] * cos[1];
        scaled2cartesian[2][1] = lengths[2] * (cos[0] - cos[1] * cos[2]) / sin_gamma;
        scaled2cartesian[2][2] = lengths[2] * volume_factor / sin_gamma;

        let mut cartesian2scaled = Matrix3::zero();
        cartesian2scaled[0][0] = 1.0 / lengths[0];
        cartesian2scaled[1][0] = -cos[2] / (lengths[0] * sin_gamma);
        cartesian2scaled[1][1] = 1.0 / (lengths[1] * sin_gamma);
        cartesian2scaled[2][0] = (cos[0] * cos[2] - cos[1]) / (sin_gamma * lengths[0]) / volume_factor;
        cartesian2scaled[2][1] = (cos[1] * cos[2] - cos[0]) / (sin_gamma * lengths[1]) / volume_factor;
        cartesian2scaled[2][2] = sin_gamma / volume_factor / lengths[2];

        let volume = lengths[0] * lengths[1] * lengths[2] * volume_factor;
        let reciprocal = [b.cross(&c) / volume, c.cross(&a) / volume, a.cross(&b) / volume];
        let reciprocal_vectors = Matrix3::new(
            reciprocal[0].x, reciprocal[0].y, reciprocal[0].z,
            reciprocal[1].x, reciprocal[1].y, reciprocal[1].z,
            reciprocal[2].x, reciprocal[2].y, reciprocal[2].z,
        );
        let reciprocal_lengths = Vector3D::new(
            reciprocal[0].norm(), reciprocal[1].norm(), reciprocal[2].norm(),
        );

        Lattice {
            cell: cell,
            lengths: lengths,
            angles: angles,
            scaled2cartesian: scaled2cartesian,
            cartesian2scaled: cartesian2scaled,
            reciprocal_vectors: reciprocal_vectors,
            reciprocal_lengths: reciprocal_lengths,
        }
    }

    /// Get the cell matrix this lattice was built from
    pub fn cell(&self) -> &Matrix3 {
        &self.cell
    }

    /// Get the lengths of the three cell vectors
    pub fn lengths(&self) -> Vector3D {
        self.lengths
    }

    /// Get the cell angles alpha (between b and c), beta (a, c) and
    /// gamma (a, b), in radians
    pub fn angles(&self) -> Vector3D {
        self.angles
    }

    /// Get the cell volume
    pub fn volume(&self) -> f64 {
        let cos = Vector3D::new(
            self.angles[0].cos(), self.angles[1].cos(), self.angles[2].cos(),
        );
        let factor = f64::sqrt(
            1.0 - cos[0] * cos[0] - cos[1] * cos[1] - cos[2] * cos[2]
            + 2.0 * cos[0] * cos[1] * cos[2]
        );
        return self.lengths[0] * self.lengths[1] * self.lengths[2] * factor;
    }

    /// Get the reciprocal lattice vectors as matrix rows (crystallographic
    /// convention, no 2π factor)
    pub fn reciprocal_vectors(&self) -> &Matrix3 {
        &self.reciprocal_vectors
    }

    /// Get the lengths of the reciprocal lattice vectors
    pub fn reciprocal_lengths(&self) -> Vector3D {
        self.reciprocal_lengths
    }

    /// Convert a cartesian position to fractional/scaled coordinates
    pub fn cartesian_to_fractional(&self, position: Vector3D) -> Vector3D {
        position * self.cartesian2scaled
    }

    /// Convert fractional/scaled coordinates to a cartesian position
    pub fn fractional_to_cartesian(&self, fractional: Vector3D) -> Vector3D {
        fractional * self.scaled2cartesian
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_relative_eq, assert_ulps_eq};

    #[test]
    fn cubic() {
        let lattice = Lattice::new(Matrix3::one() * 3.0);

        assert_ulps_eq!(lattice.lengths(), Vector3D::new(3.0, 3.0, 3.0));
        let right_angle = std::f64::consts::FRAC_PI_2;
        assert_ulps_eq!(lattice.angles(), Vector3D::new(right_angle, right_angle, right_angle));
        assert_ulps_eq!(lattice.volume(), 27.0);

        let frac = lattice.cartesian_to_fractional(Vector3D::new(1.5, 0.0, 3.0));
        assert_ulps_eq!(frac, Vector3D::new(0.5, 0.0, 1.0));
        let cart = lattice.fractional_to_cartesian(frac);
        assert_ulps_eq!(cart, Vector3D::new(1.5, 0.0, 3.0));

        assert_ulps_eq!(*lattice.reciprocal_vectors(), Matrix3::one() * (1.0 / 3.0));
        assert_ulps_eq!(lattice.reciprocal_lengths(), Vector3D::new(1.0, 1.0, 1.0) / 3.0);
    }

    #[test]
    fn triclinic() {
        let cell = Matrix3::new(
            3.0, 0.0, 0.0,
            1.5, 2.5, 0.0,
            0.5, 0.8, 4.0,
        );
        let lattice = Lattice::new(cell);

        assert_relative_eq!(lattice.volume(), cell.determinant(), max_relative = 1e-12);

        // closed-form transforms agree with the exact matrix inverse for a
        // canonically oriented cell
        let inverse = cell.inverse();
        for position in [
            Vector3D::new(0.1, 0.4, 2.2),
            Vector3D::new(-1.0, 3.0, 0.5),
            Vector3D::new(4.0, 2.0, 3.9),
        ] {
            let fractional = lattice.cartesian_to_fractional(position);
            assert_relative_eq!(fractional, position * inverse, max_relative = 1e-10);
            assert_relative_eq!(
                lattice.fractional_to_cartesian(fractional),
                position,
                max_relative = 1e-10,
            );
        }
    }

    #[test]
    fn reciprocal() {
        let cell = Matrix3::new(
            2.0, 0.0, 0.0,
            0.6, 1.8, 0.0,
            0.0, 0.4, 3.1,
        );
        let lattice = Lattice::new(cell);
        let reciprocal = lattice.reciprocal_vectors();

        // b_i . a_j == delta_ij
        for i in 0..3 {
            for j in 0..3 {
                let b_i = Vector3D::from(reciprocal[i]);
                let a_j = Vector3D::from(cell[j]);
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(b_i * a_j, expected, max_relative = 1e-12, epsilon = 1e-12);
            }
        }
    }
}
