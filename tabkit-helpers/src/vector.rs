use crate::Float;
use ndarray::{Array1, ArrayView1};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// One row of a dataset: a fixed-size list of values plus an instance weight.
///
/// Each value is either known (`Some`) or unknown (`None`). Unknown values
/// compare equal to each other, which makes exact-match comparisons between
/// targets and predictions behave the way an evaluator expects.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Vector<F>
where
    F: Float,
{
    values: Array1<Option<F>>,
    weight: F,
}

impl<F> Vector<F>
where
    F: Float,
{
    /// Creates a vector with the default weight of 1.0.
    pub fn new(values: Array1<Option<F>>) -> Self {
        Self::with_weight(values, F::one())
    }

    pub fn with_weight(values: Array1<Option<F>>, weight: F) -> Self {
        Vector { values, weight }
    }

    /// Creates a vector in which every value is known.
    pub fn from_known<I>(values: I) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        Self::new(values.into_iter().map(Some).collect())
    }

    pub fn from_options<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<F>>,
    {
        Self::new(values.into_iter().collect())
    }

    /// A vector of `len` unknown values.
    pub fn unknown(len: usize) -> Self {
        Self::new(Array1::from_elem(len, None))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value at `index`, `None` if it is unknown.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn value(&self, index: usize) -> Option<F> {
        self.values[index]
    }

    pub fn values(&self) -> ArrayView1<'_, Option<F>> {
        self.values.view()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<F>> + '_ {
        self.values.iter().copied()
    }

    pub fn weight(&self) -> F {
        self.weight
    }

    pub fn set_weight(&mut self, weight: F) {
        self.weight = weight;
    }

    pub fn has_unknown(&self) -> bool {
        self.values.iter().any(Option::is_none)
    }

    /// Builds a new vector from `values` that keeps this vector's weight.
    pub fn derive<I>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = Option<F>>,
    {
        Self::with_weight(values.into_iter().collect(), self.weight)
    }

    /// Picks the values at `indexes`, in that order. The weight is kept.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn select(&self, indexes: &[usize]) -> Self {
        self.derive(indexes.iter().map(|&i| self.values[i]))
    }

    /// Number of positions where both vectors hold equal values.
    pub fn agreement(&self, other: &Self) -> usize {
        self.values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count()
    }
}

impl<F: Float> PartialEq for Vector<F> {
    /// Compares values only; the weight is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<F: Float> Hash for Vector<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.len().hash(state);
        for value in self.values.iter() {
            match value {
                None => 0u8.hash(state),
                Some(x) => {
                    1u8.hash(state);
                    // 0.0 == -0.0, so they must hash alike.
                    let x = if x.is_zero() { F::zero() } else { *x };
                    x.integer_decode().hash(state);
                }
            }
        }
    }
}

impl<F: Float> Display for Vector<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Some(x) => write!(f, "{}", x)?,
                None => write!(f, "?")?,
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &Vector<f64>) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_unknown_equals_unknown() {
        let a = Vector::<f64>::new(array![Some(1.0), None, Some(3.0)]);
        let b = Vector::<f64>::new(array![Some(1.0), None, Some(3.0)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_unknown_differs_from_every_number() {
        let a = Vector::<f64>::from_options(vec![None]);
        for x in [0.0, -1.0, f64::MAX, f64::MIN, f64::INFINITY] {
            assert_ne!(a, Vector::from_known(vec![x]));
        }
    }

    #[test]
    fn test_equality_ignores_weight() {
        let a = Vector::with_weight(array![Some(0.0), Some(1.0)], 0.5);
        let b = Vector::from_known(vec![0.0, 1.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signed_zero_hashes_alike() {
        let a = Vector::from_known(vec![0.0]);
        let b = Vector::from_known(vec![-0.0]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_select_and_agreement() {
        let v = Vector::with_weight(array![Some(1.0), Some(2.0), None], 2.0);
        let picked = v.select(&[2, 0]);
        assert_eq!(picked, Vector::from_options(vec![None, Some(1.0)]));
        assert_eq!(picked.weight(), 2.0);

        let w = Vector::from_options(vec![Some(1.0), Some(5.0), None]);
        assert_eq!(v.agreement(&w), 2);
    }

    #[test]
    fn test_display() {
        let v = Vector::from_options(vec![Some(1.5), None]);
        assert_eq!(v.to_string(), "[1.5, ?]");
    }
}
