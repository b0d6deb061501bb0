use crate::stage::check_width;
use crate::{Filter, FilterError, FilterKind};
use log::{debug, warn};
use rand::RngCore;
use std::collections::BTreeSet;
use tabkit_helpers::{Dataset, Float, Vector};

/// Lowest value after scaling.
pub const BASE: f64 = -1.0;
/// Width of the scaled interval, so the highest value is `BASE + RANGE`.
pub const RANGE: f64 = 2.0;

fn base<F: Float>() -> F {
    -F::one()
}

fn range<F: Float>() -> F {
    F::one() + F::one()
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
struct Bounds<F> {
    min: F,
    max: F,
}

/// Min-max scales continuous columns into `[BASE, BASE + RANGE]`.
///
/// Nominal columns, ignored input columns and columns without any known
/// training value pass through unchanged.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Normalize<F: Float> {
    ignored_inputs: BTreeSet<usize>,
    inputs: Option<Vec<Option<Bounds<F>>>>,
    labels: Option<Vec<Option<Bounds<F>>>>,
}

impl<F: Float> Normalize<F> {
    pub fn new() -> Self {
        Normalize {
            ignored_inputs: BTreeSet::new(),
            inputs: None,
            labels: None,
        }
    }

    /// Leaves input column `column` untouched, e.g. an identifier. Takes
    /// effect at the next `initialize`.
    pub fn ignore_input_column(&mut self, column: usize) {
        self.ignored_inputs.insert(column);
    }

    pub fn with_ignored_input(mut self, column: usize) -> Self {
        self.ignore_input_column(column);
        self
    }

    pub fn ignored_inputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.ignored_inputs.iter().copied()
    }

    fn learn(data: &Dataset<F>, ignored: &BTreeSet<usize>) -> Result<Vec<Option<Bounds<F>>>, FilterError> {
        let mut bounds = Vec::with_capacity(data.n_cols());
        for (c, column) in data.schema().iter().enumerate() {
            if !column.is_continuous() || ignored.contains(&c) {
                bounds.push(None);
                continue;
            }
            match (data.find_min(c)?, data.find_max(c)?) {
                (Some(min), Some(max)) => {
                    if min == max {
                        warn!("column \"{}\" only holds the value {}", column.name(), min);
                    }
                    bounds.push(Some(Bounds { min, max }));
                }
                _ => {
                    warn!("column \"{}\" has no known values and will not be scaled", column.name());
                    bounds.push(None);
                }
            }
        }
        Ok(bounds)
    }

    fn scale(before: &Vector<F>, bounds: &[Option<Bounds<F>>]) -> Result<Vector<F>, FilterError> {
        check_width(before, bounds.len())?;
        Ok(before.derive(before.iter().zip(bounds).map(|(value, b)| match (value, b) {
            (Some(v), Some(b)) => Some(if b.min != b.max {
                (v - b.min) / (b.max - b.min) * range::<F>() + base::<F>()
            } else if v > F::zero() {
                base::<F>() + range::<F>()
            } else {
                base::<F>()
            }),
            (value, _) => value,
        })))
    }

    fn unscale(before: &Vector<F>, bounds: &[Option<Bounds<F>>]) -> Result<Vector<F>, FilterError> {
        check_width(before, bounds.len())?;
        Ok(before.derive(before.iter().zip(bounds).map(|(value, b)| match (value, b) {
            // A constant column can only ever have produced its one value.
            (Some(_), Some(b)) if b.min == b.max => Some(b.max),
            (Some(v), Some(b)) => Some((v - base::<F>()) / range::<F>() * (b.max - b.min) + b.min),
            (value, _) => value,
        })))
    }

    fn input_bounds(&self) -> Result<&[Option<Bounds<F>>], FilterError> {
        self.inputs
            .as_deref()
            .ok_or(FilterError::NotInitialized(FilterKind::Normalize))
    }

    fn label_bounds(&self) -> Result<&[Option<Bounds<F>>], FilterError> {
        self.labels
            .as_deref()
            .ok_or(FilterError::NotInitialized(FilterKind::Normalize))
    }
}

impl<F: Float> Filter<F> for Normalize<F> {
    fn kind(&self) -> FilterKind {
        FilterKind::Normalize
    }

    fn initialize(
        &mut self,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
        _rng: &mut dyn RngCore,
    ) -> Result<(), FilterError> {
        let input_bounds = Self::learn(inputs, &self.ignored_inputs)?;
        let label_bounds = Self::learn(labels, &BTreeSet::new())?;
        debug!(
            "scaling {} of {} input cols and {} of {} label cols",
            input_bounds.iter().filter(|b| b.is_some()).count(),
            input_bounds.len(),
            label_bounds.iter().filter(|b| b.is_some()).count(),
            label_bounds.len()
        );
        self.inputs = Some(input_bounds);
        self.labels = Some(label_bounds);
        Ok(())
    }

    fn filter_input(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        Self::scale(before, self.input_bounds()?)
    }

    fn filter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        Self::scale(before, self.label_bounds()?)
    }

    fn unfilter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        Self::unscale(before, self.label_bounds()?)
    }
}
