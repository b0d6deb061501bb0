//! Invertible data filters and batch evaluation for tabular learners.
//!
//! The workspace is split the same way the data flows: raw rows go through a
//! [`FilterChain`] before a learner sees them, the learner's ranked
//! predictions come back through the chain in reverse, and an
//! [`EvaluationRunner`] scores them against the untouched labels.

pub mod sample;

pub use tabkit_evaluators::{
    Accuracy, AccuracyOfGroup, AccuracyPerColumn, BoxError, ConfusionMatrix, EvalError,
    Evaluation, EvaluationRunner, Evaluator, EvaluatorResult, FilteredLearner, Learner, Mse,
    RankedModel, RelativeEntropy, Scorer, ScorerKind, ScorerSpec, TopN, TopNHamming,
};
pub use tabkit_filters::{
    Filter, FilterChain, FilterError, FilterKind, FilterSpec, FilterStage, MeanModeUnknownFiller,
    NominalToCategorical, Normalize, OutputOrder, ReorderOutputs,
};
pub use tabkit_helpers::{Column, ColumnKind, DataError, Dataset, Float, Schema, Vector};
pub use tabkit_knn::{Distance, KnnError, KnnRanker, L1Dist, L2Dist};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn specs<T: std::str::FromStr>(lines: &[&str]) -> Vec<T>
    where
        T::Err: std::fmt::Debug,
    {
        lines.iter().map(|l| l.parse().unwrap()).collect()
    }

    type Split = (Dataset<f64>, Dataset<f64>, Dataset<f64>, Dataset<f64>);

    fn split(seed: u64, unknown_rate: f64) -> Split {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let data = sample::clusters(&mut rng, 20, unknown_rate).unwrap();
        let (train, test) = sample::holdout(&data, 4).unwrap();
        let (train_inputs, train_labels) = train.split_inputs_labels(sample::N_LABELS).unwrap();
        let (test_inputs, test_labels) = test.split_inputs_labels(sample::N_LABELS).unwrap();
        (train_inputs, train_labels, test_inputs, test_labels)
    }

    fn knn_learner(
        chain: FilterChain<f64>,
        inputs: &Dataset<f64>,
        labels: &Dataset<f64>,
    ) -> FilteredLearner<f64, KnnRanker<f64, L2Dist>> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        FilteredLearner::train(chain, inputs, labels, &mut rng, |inputs, labels| {
            KnnRanker::fit(5, L2Dist, &inputs, &labels)
        })
        .unwrap()
    }

    #[test]
    fn test_separable_clusters_score_perfectly() {
        let (train_inputs, train_labels, test_inputs, test_labels) = split(3, 0.0);
        let chain = FilterChain::from_specs(&specs::<FilterSpec>(&[
            "MeanModeUnknownFiller",
            "NominalToCategorical",
            "Normalize",
        ]));
        let learner = knn_learner(chain, &train_inputs, &train_labels);

        let scorers = specs::<ScorerSpec>(&["Accuracy", "AccuracyPerColumn", "TopN 1 2", "MSE"]);
        let mut runner = EvaluationRunner::from_specs(&scorers).unwrap();
        let evaluation = runner.run(&test_inputs, &test_labels, &learner).unwrap();

        assert_eq!(evaluation.scores(ScorerKind::Accuracy), Some(&[1.0][..]));
        assert_eq!(evaluation.scores(ScorerKind::AccuracyPerColumn), Some(&[1.0, 1.0][..]));
        assert_eq!(evaluation.scores(ScorerKind::TopN), Some(&[1.0, 1.0][..]));
        assert_abs_diff_eq!(evaluation.scores(ScorerKind::Mse).unwrap()[0], 0.0);
        assert_eq!(
            evaluation.to_string(),
            "Accuracy=[1], AccuracyPerColumn=[1, 1], MSE=[0], TopN=[1, 1]"
        );

        let confusions = evaluation.confusions(ScorerKind::Accuracy).unwrap();
        assert_eq!(confusions.len(), 2);
        assert_eq!(confusions[0].label_name(), "class");
        assert_eq!(confusions[0].total(), test_labels.n_rows());
        assert_eq!(confusions[0].count("B", "B"), 5);
    }

    #[test]
    fn test_prefiltered_run_matches_the_raw_run() {
        let (train_inputs, train_labels, test_inputs, test_labels) = split(5, 0.2);
        let chain = FilterChain::<f64>::new()
            .then(MeanModeUnknownFiller::<f64>::new())
            .then(Normalize::<f64>::new());
        let learner = knn_learner(chain, &train_inputs, &train_labels);

        let filtered_inputs = learner.chain().filter_all_inputs(&test_inputs).unwrap();
        let filtered_labels = learner.chain().filter_all_labels(&test_labels).unwrap();
        let mut runner = EvaluationRunner::new(vec![TopN::new(vec![1]).unwrap().into()])
            .unwrap()
            .with_apply_filter(false);
        let filtered = runner
            .run(&filtered_inputs, &filtered_labels, &learner)
            .unwrap();

        let mut runner = EvaluationRunner::new(vec![TopN::new(vec![1]).unwrap().into()]).unwrap();
        let raw = runner.run(&test_inputs, &test_labels, &learner).unwrap();
        assert_eq!(filtered.scores(ScorerKind::TopN), raw.scores(ScorerKind::TopN));
    }

    #[test]
    fn test_unknown_inputs_are_filled_before_the_learner() {
        let (train_inputs, train_labels, test_inputs, test_labels) = split(9, 0.5);

        let chain = FilterChain::from_specs(&specs::<FilterSpec>(&[
            "MeanModeUnknownFiller",
            "NominalToCategorical",
            "Normalize",
        ]));
        let learner = knn_learner(chain, &train_inputs, &train_labels);
        let scorers = specs::<ScorerSpec>(&["TopNHamming 1 3", "AccuracyOfGroup class side"]);
        let mut runner = EvaluationRunner::from_specs(&scorers).unwrap();
        let evaluation = runner.run(&test_inputs, &test_labels, &learner).unwrap();
        for kind in [ScorerKind::TopNHamming, ScorerKind::AccuracyOfGroup] {
            for &score in evaluation.scores(kind).unwrap() {
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }

    #[test]
    fn test_unfiltered_learner_rejects_unknowns() {
        let (train_inputs, train_labels, _, _) = split(9, 0.0);
        let (_, _, test_inputs, test_labels) = split(9, 1.0);
        let learner = knn_learner(
            FilterChain::<f64>::new().then(Normalize::<f64>::new()),
            &train_inputs,
            &train_labels,
        );
        let mut runner = EvaluationRunner::new(vec![Accuracy::new().into()]).unwrap();
        assert!(matches!(
            runner.run(&test_inputs, &test_labels, &learner),
            Err(EvalError::Learner(_))
        ));
    }
}
