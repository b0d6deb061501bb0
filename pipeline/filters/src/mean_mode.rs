use crate::stage::check_width;
use crate::{Filter, FilterError, FilterKind};
use log::{debug, warn};
use rand::RngCore;
use tabkit_helpers::{Dataset, Float, Vector};

/// Replaces unknown input values with the mean (continuous columns) or the
/// mode (nominal columns) seen during training. Labels pass through.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct MeanModeUnknownFiller<F: Float> {
    /// One substitute per input column; `None` when the column had no known
    /// values to learn from.
    substitutes: Option<Vec<Option<F>>>,
}

impl<F: Float> MeanModeUnknownFiller<F> {
    pub fn new() -> Self {
        MeanModeUnknownFiller { substitutes: None }
    }

    pub fn substitutes(&self) -> Option<&[Option<F>]> {
        self.substitutes.as_deref()
    }
}

impl<F: Float> Filter<F> for MeanModeUnknownFiller<F> {
    fn kind(&self) -> FilterKind {
        FilterKind::MeanModeUnknownFiller
    }

    fn initialize(
        &mut self,
        inputs: &Dataset<F>,
        _labels: &Dataset<F>,
        _rng: &mut dyn RngCore,
    ) -> Result<(), FilterError> {
        if inputs.is_empty() {
            warn!("MeanModeUnknownFiller was given an empty dataset to initialize with");
            self.substitutes = Some(vec![None; inputs.n_cols()]);
            return Ok(());
        }

        let mut substitutes = Vec::with_capacity(inputs.n_cols());
        for (c, column) in inputs.schema().iter().enumerate() {
            let substitute = if column.is_continuous() {
                inputs.find_mean(c)?
            } else {
                inputs.find_mode(c)?
            };
            if substitute.is_none() {
                warn!(
                    "column \"{}\" has no known values; its unknowns will stay unknown",
                    column.name()
                );
            }
            substitutes.push(substitute);
        }
        debug!("learned {} substitutes", substitutes.len());
        self.substitutes = Some(substitutes);
        Ok(())
    }

    fn filter_input(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        let substitutes = self
            .substitutes
            .as_ref()
            .ok_or(FilterError::NotInitialized(FilterKind::MeanModeUnknownFiller))?;
        check_width(before, substitutes.len())?;

        if !before.has_unknown() {
            return Ok(before.clone());
        }
        Ok(before.derive(
            before
                .iter()
                .zip(substitutes)
                .map(|(value, substitute)| value.or(*substitute)),
        ))
    }

    fn filter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        Ok(before.clone())
    }

    fn unfilter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        Ok(before.clone())
    }

    fn filter_labels(&self, labels: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        Ok(labels.clone())
    }
}
