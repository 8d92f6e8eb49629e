use super::Vec2;

/// Column-major 3×3 matrix for 2D affine transforms.
///
/// `cols[c][r]` is row `r` of column `c`; a point transforms as
/// `M * (x, y, 1)`. This matches the column layout WGSL expects, so the
/// camera can upload its columns directly into a uniform buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    pub cols: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        cols: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Builds an affine transform from per-axis scale and translation:
    ///
    /// ```text
    /// | sx  0  tx |
    /// |  0 sy  ty |
    /// |  0  0   1 |
    /// ```
    #[inline]
    pub const fn from_scale_translation(sx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Mat3 {
            cols: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [tx, ty, 1.0]],
        }
    }

    /// Transforms a point (w = 1).
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        let c = &self.cols;
        Vec2::new(
            c[0][0] * p.x + c[1][0] * p.y + c[2][0],
            c[0][1] * p.x + c[1][1] * p.y + c[2][1],
        )
    }

    /// General inverse via the cofactor/determinant formula.
    ///
    /// A singular matrix (|det| below epsilon) yields the identity instead of
    /// NaNs, so downstream coordinate conversions stay finite.
    pub fn inverse_or_identity(&self) -> Mat3 {
        let m = &self.cols;
        let (a, b, c) = (m[0][0], m[1][0], m[2][0]);
        let (d, e, f) = (m[0][1], m[1][1], m[2][1]);
        let (g, h, i) = (m[0][2], m[1][2], m[2][2]);

        let co_a = e * i - f * h;
        let co_b = f * g - d * i;
        let co_c = d * h - e * g;

        let det = a * co_a + b * co_b + c * co_c;
        if det.abs() < 1e-12 {
            return Mat3::IDENTITY;
        }
        let inv = 1.0 / det;

        Mat3 {
            cols: [
                [co_a * inv, co_b * inv, co_c * inv],
                [(c * h - b * i) * inv, (a * i - c * g) * inv, (b * g - a * h) * inv],
                [(b * f - c * e) * inv, (c * d - a * f) * inv, (a * e - b * d) * inv],
            ],
        }
    }

    /// Columns padded to vec4 for a WGSL `mat3x3<f32>` uniform (16-byte
    /// column stride).
    #[inline]
    pub fn to_padded_columns(&self) -> [[f32; 4]; 3] {
        let c = &self.cols;
        [
            [c[0][0], c[0][1], c[0][2], 0.0],
            [c[1][0], c[1][1], c[1][2], 0.0],
            [c[2][0], c[2][1], c[2][2], 0.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_points_unchanged() {
        let p = Vec2::new(3.5, -2.0);
        assert_eq!(Mat3::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn scale_translation_round_trips_through_inverse() {
        let m = Mat3::from_scale_translation(2.0, -0.5, 10.0, -4.0);
        let inv = m.inverse_or_identity();

        for p in [Vec2::zero(), Vec2::new(7.0, 3.0), Vec2::new(-120.0, 55.5)] {
            let q = inv.transform_point(m.transform_point(p));
            assert!((q.x - p.x).abs() < 1e-4, "x: {} vs {}", q.x, p.x);
            assert!((q.y - p.y).abs() < 1e-4, "y: {} vs {}", q.y, p.y);
        }
    }

    #[test]
    fn singular_matrix_inverts_to_identity() {
        let m = Mat3::from_scale_translation(0.0, 1.0, 0.0, 0.0);
        assert_eq!(m.inverse_or_identity(), Mat3::IDENTITY);
    }

    #[test]
    fn padded_columns_keep_column_order() {
        let m = Mat3::from_scale_translation(2.0, 3.0, 4.0, 5.0);
        let cols = m.to_padded_columns();
        assert_eq!(cols[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(cols[1], [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(cols[2], [4.0, 5.0, 1.0, 0.0]);
    }
}
