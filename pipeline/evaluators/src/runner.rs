use crate::{
    BoxError, EvalError, Evaluation, Evaluator, EvaluatorResult, Scorer, ScorerKind, ScorerSpec,
};
use log::{debug, info};
use rand::RngCore;
use std::collections::BTreeSet;
use tabkit_filters::FilterChain;
use tabkit_helpers::{Dataset, Float, Vector};

/// Anything that can rank candidate label vectors for an input row.
pub trait Learner<F: Float> {
    /// Up to `max_count` predictions, best first. The learner may return
    /// fewer, but never none.
    ///
    /// `apply_filter` tells the learner that `input` is raw data: it has to
    /// run its filters forward on the input and backward on every
    /// prediction. It is false when the data was already filtered.
    fn predict_ranked(
        &self,
        input: &Vector<F>,
        max_count: usize,
        apply_filter: bool,
    ) -> Result<Vec<Vector<F>>, BoxError>;
}

/// A model that works on already filtered data.
pub trait RankedModel<F: Float> {
    fn predict_ranked(&self, input: &Vector<F>, max_count: usize) -> Result<Vec<Vector<F>>, BoxError>;
}

/// Wraps a [`RankedModel`] in a trained [`FilterChain`].
#[derive(Debug, Clone)]
pub struct FilteredLearner<F: Float, M> {
    chain: FilterChain<F>,
    model: M,
}

impl<F: Float, M: RankedModel<F>> FilteredLearner<F, M> {
    /// `chain` must already be initialized on the data `model` was fit on.
    pub fn new(chain: FilterChain<F>, model: M) -> Self {
        FilteredLearner { chain, model }
    }

    /// Initializes `chain` on raw data, filters the data and fits a model on
    /// the result with `fit`.
    pub fn train<E>(
        mut chain: FilterChain<F>,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
        rng: &mut dyn RngCore,
        fit: impl FnOnce(Dataset<F>, Dataset<F>) -> Result<M, E>,
    ) -> Result<Self, EvalError>
    where
        E: Into<BoxError>,
    {
        chain.initialize(inputs, labels, rng)?;
        let filtered_inputs = chain.filter_all_inputs(inputs)?;
        let filtered_labels = chain.filter_all_labels(labels)?;
        debug!(
            "fitting on {} rows of {} filtered input cols",
            filtered_inputs.n_rows(),
            filtered_inputs.n_cols()
        );
        let model = fit(filtered_inputs, filtered_labels).map_err(|e| EvalError::Learner(e.into()))?;
        Ok(FilteredLearner { chain, model })
    }

    pub fn chain(&self) -> &FilterChain<F> {
        &self.chain
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_parts(self) -> (FilterChain<F>, M) {
        (self.chain, self.model)
    }
}

impl<F: Float, M: RankedModel<F>> Learner<F> for FilteredLearner<F, M> {
    fn predict_ranked(
        &self,
        input: &Vector<F>,
        max_count: usize,
        apply_filter: bool,
    ) -> Result<Vec<Vector<F>>, BoxError> {
        if !apply_filter {
            return self.model.predict_ranked(input, max_count);
        }
        let filtered = self.chain.filter_input(input)?;
        let predictions = self.model.predict_ranked(&filtered, max_count)?;
        let mut unfiltered = Vec::with_capacity(predictions.len());
        for prediction in &predictions {
            unfiltered.push(self.chain.unfilter_label(prediction)?);
        }
        Ok(unfiltered)
    }
}

/// Drives a set of evaluators over a dataset with one learner call per row.
#[derive(Debug, Clone)]
pub struct EvaluationRunner<F: Float> {
    evaluators: Vec<Scorer<F>>,
    apply_filter: bool,
}

impl<F: Float> EvaluationRunner<F> {
    /// Fails if `evaluators` is empty or holds the same kind twice.
    pub fn new(evaluators: Vec<Scorer<F>>) -> Result<Self, EvalError> {
        if evaluators.is_empty() {
            return Err(EvalError::Config("no evaluators given".to_string()));
        }
        let mut kinds = BTreeSet::new();
        for evaluator in &evaluators {
            if !kinds.insert(evaluator.kind()) {
                return Err(EvalError::Config(format!(
                    "{} is listed more than once",
                    evaluator.kind()
                )));
            }
        }
        Ok(EvaluationRunner {
            evaluators,
            apply_filter: true,
        })
    }

    pub fn from_specs<'a, I>(specs: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = &'a ScorerSpec>,
    {
        let evaluators = specs
            .into_iter()
            .map(ScorerSpec::build::<F>)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(evaluators)
    }

    /// Whether the learner has to filter each row itself. Defaults to true;
    /// set it to false when the datasets are already filtered.
    pub fn with_apply_filter(mut self, apply_filter: bool) -> Self {
        self.apply_filter = apply_filter;
        self
    }

    pub fn evaluators(&self) -> &[Scorer<F>] {
        &self.evaluators
    }

    pub fn kinds(&self) -> impl Iterator<Item = ScorerKind> + '_ {
        self.evaluators.iter().map(|e| e.kind())
    }

    /// Asks `learner` once per row for as many ranked predictions as the
    /// most demanding evaluator wants, hands them to every evaluator and
    /// collects the scores.
    pub fn run<L>(
        &mut self,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
        learner: &L,
    ) -> Result<Evaluation<F>, EvalError>
    where
        L: Learner<F> + ?Sized,
    {
        if inputs.n_rows() != labels.n_rows() {
            return Err(EvalError::Config(format!(
                "{} input rows but {} label rows",
                inputs.n_rows(),
                labels.n_rows()
            )));
        }
        for evaluator in &mut self.evaluators {
            evaluator.start_batch(labels.schema())?;
        }
        let max_count = self
            .evaluators
            .iter()
            .map(|e| e.max_desired_size())
            .max()
            .unwrap_or(1);

        for (input, target) in inputs.rows().iter().zip(labels.rows()) {
            let predictions = learner
                .predict_ranked(input, max_count, self.apply_filter)
                .map_err(EvalError::Learner)?;
            if predictions.is_empty() {
                return Err(EvalError::EmptyPredictions);
            }
            for evaluator in &mut self.evaluators {
                evaluator.evaluate(target, &predictions)?;
            }
        }

        let mut evaluation = Evaluation::new();
        for evaluator in &self.evaluators {
            evaluation.insert(
                evaluator.kind(),
                EvaluatorResult {
                    scores: evaluator.calc_scores()?,
                    confusions: evaluator.calc_confusions(),
                    higher_is_better: evaluator.higher_is_better(),
                },
            );
        }
        info!("evaluated {} rows: {}", labels.n_rows(), evaluation);
        Ok(evaluation)
    }
}
