use crate::{
    FilterError, MeanModeUnknownFiller, NominalToCategorical, Normalize, ReorderOutputs,
};
use rand::RngCore;
use std::fmt::{Display, Formatter};
use tabkit_helpers::{Dataset, Float, Schema, Vector};

/// Identifies a filter type, e.g. to look one up inside a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum FilterKind {
    MeanModeUnknownFiller,
    NominalToCategorical,
    Normalize,
    ReorderOutputs,
}

impl FilterKind {
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::MeanModeUnknownFiller => "MeanModeUnknownFiller",
            FilterKind::NominalToCategorical => "NominalToCategorical",
            FilterKind::Normalize => "Normalize",
            FilterKind::ReorderOutputs => "ReorderOutputs",
        }
    }
}

impl Display for FilterKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single trainable, reversible transform over a pair of input and label
/// datasets.
///
/// The whole-dataset methods default to mapping the per-row ones over every
/// row and keeping the schema. Filters that change column metadata override
/// them.
pub trait Filter<F: Float> {
    fn kind(&self) -> FilterKind;

    /// Learns the filter's parameters. Calling it again overwrites them.
    fn initialize(
        &mut self,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
        rng: &mut dyn RngCore,
    ) -> Result<(), FilterError>;

    fn filter_input(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError>;

    fn filter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError>;

    /// Maps a (predicted) label from this filter's output space back to its
    /// input space.
    fn unfilter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError>;

    fn filter_inputs(&self, inputs: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        map_rows(inputs.schema().clone(), inputs, |row| self.filter_input(row))
    }

    fn filter_labels(&self, labels: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        map_rows(labels.schema().clone(), labels, |row| self.filter_label(row))
    }
}

/// Builds a new dataset with `schema` from the transformed rows of `source`.
pub(crate) fn map_rows<F, M>(
    schema: Schema,
    source: &Dataset<F>,
    mut map: M,
) -> Result<Dataset<F>, FilterError>
where
    F: Float,
    M: FnMut(&Vector<F>) -> Result<Vector<F>, FilterError>,
{
    let mut out = Dataset::new(schema);
    for row in source.rows() {
        out.push_row(map(row)?)?;
    }
    Ok(out)
}

/// Checks that a vector has the width a filter was trained for.
pub(crate) fn check_width<F: Float>(before: &Vector<F>, expected: usize) -> Result<(), FilterError> {
    if before.len() != expected {
        return Err(tabkit_helpers::DataError::WidthMismatch {
            expected,
            actual: before.len(),
        }
        .into());
    }
    Ok(())
}

/// The closed set of filters a chain can hold.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum FilterStage<F: Float> {
    MeanModeUnknownFiller(MeanModeUnknownFiller<F>),
    NominalToCategorical(NominalToCategorical),
    Normalize(Normalize<F>),
    ReorderOutputs(ReorderOutputs),
}

macro_rules! dispatch {
    ($self:ident, $f:ident => $body:expr) => {
        match $self {
            FilterStage::MeanModeUnknownFiller($f) => $body,
            FilterStage::NominalToCategorical($f) => $body,
            FilterStage::Normalize($f) => $body,
            FilterStage::ReorderOutputs($f) => $body,
        }
    };
}

impl<F: Float> Filter<F> for FilterStage<F> {
    fn kind(&self) -> FilterKind {
        dispatch!(self, f => Filter::<F>::kind(f))
    }

    fn initialize(
        &mut self,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
        rng: &mut dyn RngCore,
    ) -> Result<(), FilterError> {
        dispatch!(self, f => f.initialize(inputs, labels, rng))
    }

    fn filter_input(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        dispatch!(self, f => f.filter_input(before))
    }

    fn filter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        dispatch!(self, f => f.filter_label(before))
    }

    fn unfilter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        dispatch!(self, f => f.unfilter_label(before))
    }

    fn filter_inputs(&self, inputs: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        dispatch!(self, f => f.filter_inputs(inputs))
    }

    fn filter_labels(&self, labels: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        dispatch!(self, f => f.filter_labels(labels))
    }
}

impl<F: Float> FilterStage<F> {
    pub fn as_reorder_outputs(&self) -> Option<&ReorderOutputs> {
        match self {
            FilterStage::ReorderOutputs(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_normalize_mut(&mut self) -> Option<&mut Normalize<F>> {
        match self {
            FilterStage::Normalize(f) => Some(f),
            _ => None,
        }
    }
}

impl<F: Float> From<MeanModeUnknownFiller<F>> for FilterStage<F> {
    fn from(f: MeanModeUnknownFiller<F>) -> Self {
        FilterStage::MeanModeUnknownFiller(f)
    }
}

impl<F: Float> From<NominalToCategorical> for FilterStage<F> {
    fn from(f: NominalToCategorical) -> Self {
        FilterStage::NominalToCategorical(f)
    }
}

impl<F: Float> From<Normalize<F>> for FilterStage<F> {
    fn from(f: Normalize<F>) -> Self {
        FilterStage::Normalize(f)
    }
}

impl<F: Float> From<ReorderOutputs> for FilterStage<F> {
    fn from(f: ReorderOutputs) -> Self {
        FilterStage::ReorderOutputs(f)
    }
}
