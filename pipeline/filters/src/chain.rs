use crate::{Filter, FilterError, FilterKind, FilterStage};
use log::debug;
use rand::RngCore;
use std::borrow::Cow;
use tabkit_helpers::{Dataset, Float, Vector};

/// An ordered list of filter stages, outermost first.
///
/// Stages can only be appended, so the chain is acyclic by construction.
/// Forward transforms run front to back; `unfilter_label` runs back to front.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct FilterChain<F: Float> {
    stages: Vec<FilterStage<F>>,
}

impl<F: Float> Default for FilterChain<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> FilterChain<F> {
    /// An empty chain. It passes everything through unchanged.
    pub fn new() -> Self {
        FilterChain { stages: Vec::new() }
    }

    /// Appends `stage` as the new innermost stage.
    pub fn then(mut self, stage: impl Into<FilterStage<F>>) -> Self {
        self.stages.push(stage.into());
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[FilterStage<F>] {
        &self.stages
    }

    /// Trains every stage.
    ///
    /// Each stage is trained on the output of the stages in front of it, so
    /// inner stages learn their statistics from already-transformed data.
    pub fn initialize(
        &mut self,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
        rng: &mut dyn RngCore,
    ) -> Result<(), FilterError> {
        let mut inputs = Cow::Borrowed(inputs);
        let mut labels = Cow::Borrowed(labels);
        let last = self.stages.len().saturating_sub(1);
        for (i, stage) in self.stages.iter_mut().enumerate() {
            stage.initialize(&inputs, &labels, rng)?;
            debug!(
                "initialized {} on {} rows ({} input cols, {} label cols)",
                stage.kind(),
                inputs.n_rows(),
                inputs.n_cols(),
                labels.n_cols()
            );
            if i < last {
                let next_inputs = stage.filter_inputs(&inputs)?;
                let next_labels = stage.filter_labels(&labels)?;
                inputs = Cow::Owned(next_inputs);
                labels = Cow::Owned(next_labels);
            }
        }
        Ok(())
    }

    pub fn filter_input(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        let mut current = Cow::Borrowed(before);
        for stage in &self.stages {
            current = Cow::Owned(stage.filter_input(&current)?);
        }
        Ok(current.into_owned())
    }

    pub fn filter_all_inputs(&self, inputs: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        let mut current = Cow::Borrowed(inputs);
        for stage in &self.stages {
            current = Cow::Owned(stage.filter_inputs(&current)?);
        }
        Ok(current.into_owned())
    }

    /// Filters one label row. Fails with `FilterError::Unsupported` if any
    /// stage only filters labels as a whole dataset.
    pub fn filter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        let mut current = Cow::Borrowed(before);
        for stage in &self.stages {
            current = Cow::Owned(stage.filter_label(&current)?);
        }
        Ok(current.into_owned())
    }

    pub fn filter_all_labels(&self, labels: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        let mut current = Cow::Borrowed(labels);
        for stage in &self.stages {
            current = Cow::Owned(stage.filter_labels(&current)?);
        }
        Ok(current.into_owned())
    }

    /// Maps a prediction back to the original label space, innermost stage
    /// first.
    pub fn unfilter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        let mut current = Cow::Borrowed(before);
        for stage in self.stages.iter().rev() {
            current = Cow::Owned(stage.unfilter_label(&current)?);
        }
        Ok(current.into_owned())
    }

    /// The outermost stage of the given kind, if any.
    pub fn find_filter(&self, kind: FilterKind) -> Option<&FilterStage<F>> {
        self.stages.iter().find(|s| s.kind() == kind)
    }

    pub fn find_filter_mut(&mut self, kind: FilterKind) -> Option<&mut FilterStage<F>> {
        self.stages.iter_mut().find(|s| s.kind() == kind)
    }

    pub fn includes(&self, kind: FilterKind) -> bool {
        self.find_filter(kind).is_some()
    }
}

impl<F: Float, S: Into<FilterStage<F>>> FromIterator<S> for FilterChain<F> {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        FilterChain {
            stages: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::three_class_labels;
    use crate::{MeanModeUnknownFiller, NominalToCategorical, Normalize, ReorderOutputs};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use tabkit_helpers::{Column, Schema};

    fn mixed_inputs() -> Dataset<f64> {
        let schema = Schema::new(vec![
            Column::continuous("size"),
            Column::nominal("shape", ["round", "square", "star"]).unwrap(),
        ]);
        Dataset::from_rows(
            schema,
            vec![
                Vector::from_known(vec![0.0, 0.0]),
                Vector::from_options(vec![None, Some(2.0)]),
                Vector::from_known(vec![10.0, 2.0]),
                Vector::from_options(vec![Some(2.0), None]),
            ],
        )
        .unwrap()
    }

    fn full_chain() -> FilterChain<f64> {
        FilterChain::new()
            .then(MeanModeUnknownFiller::<f64>::new())
            .then(NominalToCategorical::new())
            .then(Normalize::<f64>::new())
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain: FilterChain<f64> = FilterChain::new();
        let labels = three_class_labels();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        chain.initialize(&mixed_inputs(), &labels, &mut rng).unwrap();
        let row = labels.row(2).unwrap();
        assert_eq!(&chain.filter_label(row).unwrap(), row);
        assert_eq!(&chain.unfilter_label(row).unwrap(), row);
    }

    #[test]
    fn test_inner_stages_train_on_transformed_data() {
        let inputs = mixed_inputs();
        let labels = three_class_labels();
        let mut chain = full_chain();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        chain.initialize(&inputs, &labels, &mut rng).unwrap();

        // Unknown size is filled with the mean (4.0), the unknown shape with
        // the mode (star), the shape is one-hot encoded and everything is then
        // scaled into [-1, 1] using the statistics of the encoded data.
        let out = chain.filter_input(inputs.row(1).unwrap()).unwrap();
        let expected = [4.0 / 10.0 * 2.0 - 1.0, -1.0, -1.0, 1.0];
        assert_eq!(out.len(), expected.len());
        for (got, want) in out.iter().zip(expected) {
            assert_abs_diff_eq!(got.unwrap(), want, epsilon = 1e-12);
        }

        let all = chain.filter_all_inputs(&inputs).unwrap();
        assert_eq!(all.n_cols(), 4);
        assert_eq!(all.schema().column(1).unwrap().name(), "shape=round");
        assert_eq!(all.row(1).unwrap(), &out);
    }

    #[test]
    fn test_label_round_trip_through_chain() {
        let inputs = mixed_inputs();
        let labels = three_class_labels();
        let mut chain = full_chain().then(ReorderOutputs::reversed());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        chain.initialize(&inputs, &labels, &mut rng).unwrap();

        let filtered = chain.filter_all_labels(&labels).unwrap();
        for (original, encoded) in labels.rows().iter().zip(filtered.rows()) {
            assert_eq!(&chain.unfilter_label(encoded).unwrap(), original);
        }
    }

    #[test]
    fn test_per_row_label_filter_unsupported_with_reorder() {
        let inputs = mixed_inputs();
        let labels = three_class_labels();
        let mut chain = FilterChain::new()
            .then(NominalToCategorical::new())
            .then(ReorderOutputs::reversed());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        chain.initialize(&inputs, &labels, &mut rng).unwrap();

        let err = chain.filter_label(labels.row(0).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            FilterError::Unsupported {
                filter: FilterKind::ReorderOutputs,
                ..
            }
        ));
    }

    #[test]
    fn test_training_failure_propagates() {
        let labels = three_class_labels();
        let mut chain: FilterChain<f64> = FilterChain::new()
            .then(MeanModeUnknownFiller::<f64>::new())
            .then(ReorderOutputs::with_names(["class1", "nope", "class3"]));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let err = chain
            .initialize(&mixed_inputs(), &labels, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::Data(tabkit_helpers::DataError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_find_filter() {
        let chain = full_chain();
        assert!(chain.includes(FilterKind::Normalize));
        assert!(!chain.includes(FilterKind::ReorderOutputs));
        assert_eq!(
            chain.find_filter(FilterKind::NominalToCategorical).map(|s| s.kind()),
            Some(FilterKind::NominalToCategorical)
        );
        assert!(chain.find_filter(FilterKind::ReorderOutputs).is_none());
    }

    #[test]
    fn test_collect_into_chain() {
        let chain: FilterChain<f64> = vec![Normalize::<f64>::new(), Normalize::new()]
            .into_iter()
            .collect();
        assert_eq!(chain.len(), 2);
    }
}
