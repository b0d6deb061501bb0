//! A k-nearest-neighbours model that ranks label vectors instead of picking
//! a single class.

use log::debug;
use ndarray::Array1;
use std::cmp::Ordering;
use tabkit_evaluators::{BoxError, RankedModel};
use tabkit_helpers::{DataError, Dataset, Float, Vector};
use thiserror::Error;

mod distance;

pub use distance::{Distance, L1Dist, L2Dist};

/// Errors that can occur when fitting or querying the k-NN ranker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KnnError {
    #[error("k cannot be zero for a k-NN ranker")]
    InvalidK,
    #[error("cannot predict with an empty training set")]
    EmptyTrainingSet,
    /// Usually NaN somewhere in the data.
    #[error("invalid distance comparison (likely due to NaN values in data)")]
    InvalidDistance,
    #[error("{inputs} input rows but {labels} label rows")]
    RowMismatch { inputs: usize, labels: usize },
    #[error(transparent)]
    Data(#[from] DataError),
}

fn known_features<F: Float>(row: &Vector<F>) -> Result<Array1<F>, DataError> {
    row.iter()
        .enumerate()
        .map(|(index, value)| value.ok_or(DataError::UnexpectedUnknown { index }))
        .collect()
}

/// Stores the (filtered) training rows and, for a query, returns the
/// distinct label vectors of its `k` nearest neighbours ordered by vote
/// count. Equal votes keep the label of the nearer neighbour first.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct KnnRanker<F: Float, D: Distance<F>> {
    k: usize,
    inputs: Vec<Array1<F>>,
    labels: Vec<Vector<F>>,
    distance: D,
}

impl<F: Float, D: Distance<F>> KnnRanker<F, D> {
    /// Keeps every training row. Input rows must be fully known; label rows
    /// are stored as they are.
    ///
    /// # Errors
    ///
    /// `KnnError::InvalidK` if `k` is 0, `KnnError::RowMismatch` if the two
    /// datasets differ in length and `KnnError::Data` on an unknown input.
    pub fn fit(
        k: usize,
        distance: D,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
    ) -> Result<Self, KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK);
        }
        if inputs.n_rows() != labels.n_rows() {
            return Err(KnnError::RowMismatch {
                inputs: inputs.n_rows(),
                labels: labels.n_rows(),
            });
        }
        let features = inputs
            .rows()
            .iter()
            .map(known_features)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("k-NN keeps {} training rows, k = {}", features.len(), k);
        Ok(KnnRanker {
            k,
            inputs: features,
            labels: labels.rows().to_vec(),
            distance,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_training_rows(&self) -> usize {
        self.inputs.len()
    }

    /// At most `max_count` label vectors, most voted first.
    pub fn rank(&self, input: &Vector<F>, max_count: usize) -> Result<Vec<Vector<F>>, KnnError> {
        let Some(first) = self.inputs.first() else {
            return Err(KnnError::EmptyTrainingSet);
        };
        let features = known_features(input)?;
        if features.len() != first.len() {
            return Err(DataError::WidthMismatch {
                expected: first.len(),
                actual: features.len(),
            }
            .into());
        }

        let mut distances: Vec<(F, usize)> = self
            .inputs
            .iter()
            .enumerate()
            .map(|(i, x)| (self.distance.rdistance(x.view(), features.view()), i))
            .collect();
        if distances.iter().any(|(d, _)| d.is_nan()) {
            return Err(KnnError::InvalidDistance);
        }
        // Stable, so equally distant rows keep training order.
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        let neighbours = &distances[..self.k.min(distances.len())];

        let mut votes: Vec<(&Vector<F>, usize)> = Vec::new();
        for &(_, i) in neighbours {
            let label = &self.labels[i];
            match votes.iter_mut().find(|entry| entry.0 == label) {
                Some(entry) => entry.1 += 1,
                None => votes.push((label, 1)),
            }
        }
        votes.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(votes
            .into_iter()
            .take(max_count)
            .map(|(label, _)| label.clone())
            .collect())
    }
}

impl<F: Float, D: Distance<F>> RankedModel<F> for KnnRanker<F, D> {
    fn predict_ranked(&self, input: &Vector<F>, max_count: usize) -> Result<Vec<Vector<F>>, BoxError> {
        Ok(self.rank(input, max_count)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabkit_helpers::{Column, Schema};

    fn points(rows: &[&[f64]]) -> Dataset<f64> {
        let width = rows.first().map_or(0, |r| r.len());
        let schema: Schema = (0..width).map(|i| Column::continuous(format!("x{i}"))).collect();
        Dataset::from_rows(schema, rows.iter().map(|r| Vector::from_known(r.to_vec()))).unwrap()
    }

    fn classes(values: &[f64]) -> Dataset<f64> {
        let schema = Schema::new(vec![Column::nominal("class", ["A", "B"]).unwrap()]);
        Dataset::from_rows(schema, values.iter().map(|&v| Vector::from_known(vec![v]))).unwrap()
    }

    fn class(v: f64) -> Vector<f64> {
        Vector::from_known(vec![v])
    }

    fn clusters(k: usize) -> KnnRanker<f64, L2Dist> {
        let inputs = points(&[
            &[1.0, 1.0],
            &[2.0, 2.0],
            &[1.0, 2.0],
            &[8.0, 8.0],
            &[9.0, 8.0],
            &[8.0, 9.0],
        ]);
        let labels = classes(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        KnnRanker::fit(k, L2Dist, &inputs, &labels).unwrap()
    }

    #[test]
    fn test_knn_ranking_simple() {
        let knn = clusters(3);
        let near_a = Vector::from_known(vec![2.5, 2.5]);
        assert_eq!(knn.rank(&near_a, 2).unwrap(), vec![class(0.0)]);
        let near_b = Vector::from_known(vec![7.5, 8.5]);
        assert_eq!(knn.rank(&near_b, 2).unwrap(), vec![class(1.0)]);
    }

    #[test]
    fn test_ranked_by_votes() {
        let knn = clusters(5);
        let near_a = Vector::from_known(vec![2.5, 2.5]);
        assert_eq!(knn.rank(&near_a, 5).unwrap(), vec![class(0.0), class(1.0)]);
        assert_eq!(knn.rank(&near_a, 1).unwrap(), vec![class(0.0)]);
    }

    #[test]
    fn test_equal_votes_prefer_the_nearer_label() {
        let knn = KnnRanker::fit(2, L2Dist, &points(&[&[0.0], &[3.0]]), &classes(&[0.0, 1.0])).unwrap();
        assert_eq!(
            knn.rank(&Vector::from_known(vec![1.0]), 2).unwrap(),
            vec![class(0.0), class(1.0)]
        );
        assert_eq!(
            knn.rank(&Vector::from_known(vec![2.0]), 2).unwrap(),
            vec![class(1.0), class(0.0)]
        );
    }

    #[test]
    fn test_knn_k_larger_than_dataset() {
        let inputs = points(&[&[1.0], &[2.0], &[10.0]]);
        let knn = KnnRanker::fit(5, L2Dist, &inputs, &classes(&[0.0, 0.0, 1.0])).unwrap();
        assert_eq!(
            knn.rank(&Vector::from_known(vec![3.0]), 1).unwrap(),
            vec![class(0.0)]
        );
    }

    #[test]
    fn test_fit_errors() {
        let inputs = points(&[&[1.0], &[2.0]]);
        assert_eq!(
            KnnRanker::fit(0, L2Dist, &inputs, &classes(&[0.0, 1.0])).unwrap_err(),
            KnnError::InvalidK
        );
        assert_eq!(
            KnnRanker::fit(1, L2Dist, &inputs, &classes(&[0.0])).unwrap_err(),
            KnnError::RowMismatch { inputs: 2, labels: 1 }
        );
        let schema = Schema::new(vec![Column::continuous("x0")]);
        let holes = Dataset::from_rows(schema, vec![Vector::from_options(vec![None])]).unwrap();
        assert_eq!(
            KnnRanker::fit(1, L2Dist, &holes, &classes(&[0.0])).unwrap_err(),
            KnnError::Data(DataError::UnexpectedUnknown { index: 0 })
        );
    }

    #[test]
    fn test_query_errors() {
        let empty = KnnRanker::fit(3, L1Dist, &points(&[]), &classes(&[])).unwrap();
        assert_eq!(
            empty.rank(&Vector::from_known(vec![1.0]), 1).unwrap_err(),
            KnnError::EmptyTrainingSet
        );

        let knn = clusters(3);
        assert_eq!(
            knn.rank(&Vector::from_known(vec![1.0]), 1).unwrap_err(),
            KnnError::Data(DataError::WidthMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(
            knn.rank(&Vector::from_known(vec![f64::NAN, 1.0]), 1).unwrap_err(),
            KnnError::InvalidDistance
        );
        let boxed = knn
            .predict_ranked(&Vector::from_options(vec![Some(1.0), None]), 1)
            .unwrap_err();
        assert_eq!(boxed.to_string(), "unexpected unknown value at position 1");
    }
}
