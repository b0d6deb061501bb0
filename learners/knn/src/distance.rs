use ndarray::ArrayView1;
use tabkit_helpers::Float;

/// A metric between two equally wide feature vectors.
///
/// `rdistance` is any monotone stand-in for the true distance and is what
/// neighbour searches compare; `distance` is the metric itself.
pub trait Distance<F: Float>: Clone {
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F;

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist
    }

    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdist_to_dist(self.rdistance(a, b))
    }
}

/// Euclidean distance, compared squared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct L2Dist;

impl<F: Float> Distance<F> for L2Dist {
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter().zip(b.iter()).map(|(&x, &y)| (x - y) * (x - y)).sum()
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist.sqrt()
    }
}

/// Manhattan distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct L1Dist;

impl<F: Float> Distance<F> for L1Dist {
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| if x > y { x - y } else { y - x })
            .sum()
    }
}
