use nalgebra::{Dim, Matrix, RawStorage, U1};

/// Scalar type used for coordinates, prices, costs and the bid increment.
pub trait Real:
    num_traits::Float
    + num_traits::FromPrimitive
    + nalgebra::Scalar
    + nalgebra::SimdValue<Element = Self>
    + nalgebra::SimdPartialOrd
    + std::ops::AddAssign
    + std::ops::SubAssign
    + std::iter::Sum
{
}

impl<T> Real for T where
    T: num_traits::Float
        + num_traits::FromPrimitive
        + nalgebra::Scalar
        + nalgebra::SimdValue<Element = T>
        + nalgebra::SimdPartialOrd
        + std::ops::AddAssign
        + std::ops::SubAssign
        + std::iter::Sum
{
}

/// Converts a count into the scalar type.
pub(crate) fn real<R: Real>(n: usize) -> R {
    R::from_usize(n).unwrap_or_else(R::infinity)
}

/// A point of one of the two sets being matched.
pub trait Point<R: Real> {
    /// Number of coordinates stored.
    fn dim(&self) -> usize;

    fn coord(&self, i: usize) -> R;

    /// Identifier reported in the matching. `None` means the position in the input slice.
    fn id(&self) -> Option<usize> {
        None
    }
}

impl<R, D, S> Point<R> for Matrix<R, D, U1, S>
where
    R: Real,
    D: Dim,
    S: RawStorage<R, D, U1>,
{
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn coord(&self, i: usize) -> R {
        self[i]
    }
}

impl<R: Real, const N: usize> Point<R> for [R; N] {
    fn dim(&self) -> usize {
        N
    }

    fn coord(&self, i: usize) -> R {
        self[i]
    }
}

impl<R: Real> Point<R> for Vec<R> {
    fn dim(&self) -> usize {
        self.len()
    }

    fn coord(&self, i: usize) -> R {
        self[i]
    }
}

/// A point carrying a caller-chosen id, e.g. the index of a persistence pair in its diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Labeled<P> {
    pub id: usize,
    pub point: P,
}

impl<P> Labeled<P> {
    pub fn new(id: usize, point: P) -> Self {
        Self { id, point }
    }
}

impl<R: Real, P: Point<R>> Point<R> for Labeled<P> {
    fn dim(&self) -> usize {
        self.point.dim()
    }

    fn coord(&self, i: usize) -> R {
        self.point.coord(i)
    }

    fn id(&self) -> Option<usize> {
        Some(self.id)
    }
}

/// Minkowski distance between the first `dim` coordinates of `a` and `b`.
///
/// An infinite `internal_p` gives the max norm, which is the usual ground metric for
/// persistence diagrams.
pub fn lp_distance<R, P>(a: &P, b: &P, internal_p: R, dim: usize) -> R
where
    R: Real,
    P: Point<R> + ?Sized,
{
    let diffs = (0..dim).map(|i| (a.coord(i) - b.coord(i)).abs());

    if internal_p.is_infinite() {
        diffs.fold(R::zero(), |m, d| m.max(d))
    } else if internal_p == R::one() {
        diffs.sum()
    } else if internal_p == real(2) {
        diffs.map(|d| d * d).sum::<R>().sqrt()
    } else {
        diffs.map(|d| d.powf(internal_p)).sum::<R>().powf(internal_p.recip())
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use nalgebra::{DVector, Vector3};

    use super::*;

    #[test]
    fn norms_in_the_plane() {
        let a = [0.0_f64, 0.0];
        let b = [3.0, 4.0];

        assert_abs_diff_eq!(lp_distance(&a, &b, f64::INFINITY, 2), 4.0);
        assert_abs_diff_eq!(lp_distance(&a, &b, 1.0, 2), 7.0);
        assert_abs_diff_eq!(lp_distance(&a, &b, 2.0, 2), 5.0);
        assert_abs_diff_eq!(
            lp_distance(&a, &b, 3.0, 2),
            (27.0_f64 + 64.0).powf(1.0 / 3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn only_leading_coordinates_count() {
        let a = Vector3::new(1.0_f64, 1.0, 100.0);
        let b = Vector3::new(2.0_f64, 3.0, -100.0);
        assert_abs_diff_eq!(lp_distance(&a, &b, 1.0, 2), 3.0);
    }

    #[test]
    fn nalgebra_and_vec_points_agree() {
        let a = DVector::from_vec(vec![0.5_f32, -1.0, 2.0]);
        let b = DVector::from_vec(vec![1.5_f32, 1.0, 0.0]);
        let va = vec![0.5_f32, -1.0, 2.0];
        let vb = vec![1.5_f32, 1.0, 0.0];

        assert_eq!(Point::<f32>::dim(&a), 3);
        assert_abs_diff_eq!(
            lp_distance(&a, &b, 2.0, 3),
            lp_distance(&va, &vb, 2.0, 3)
        );
    }

    #[test]
    fn labels_override_index_ids() {
        let p = Labeled::new(42, [1.0_f64, 2.0]);
        assert_eq!(Point::<f64>::id(&p), Some(42));
        assert_eq!(Point::<f64>::id(&[1.0_f64, 2.0]), None);
        assert_eq!(Point::<f64>::coord(&p, 1), 2.0);
    }
}
