use crate::stage::{check_width, map_rows};
use crate::{Filter, FilterError, FilterKind};
use log::debug;
use rand::seq::SliceRandom;
use rand::RngCore;
use tabkit_helpers::{DataError, Dataset, Float, Vector};

/// A name list holding only this token reverses all label columns.
pub const REVERSE_TOKEN: &str = "reverse";

/// How `ReorderOutputs` picks its permutation at `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum OutputOrder {
    /// A fresh uniformly random permutation from the training rng.
    Random,
    /// Label column names in their new order, or just [`REVERSE_TOKEN`].
    Names(Vec<String>),
    /// Label column indexes in their new order.
    Indexes(Vec<usize>),
}

/// Permutes the label columns. Inputs pass through untouched.
///
/// Label filtering only works on whole datasets since the column metadata has
/// to move with the values; `filter_label` on a single row is unsupported.
/// The inverse works row by row.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ReorderOutputs {
    order: OutputOrder,
    /// Output column `i` holds input column `permutation[i]`.
    permutation: Option<Vec<usize>>,
}

impl Default for ReorderOutputs {
    fn default() -> Self {
        Self::random()
    }
}

impl ReorderOutputs {
    pub fn random() -> Self {
        ReorderOutputs {
            order: OutputOrder::Random,
            permutation: None,
        }
    }

    /// Orders the label columns by name. An empty list means a random order.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Self::random();
        }
        ReorderOutputs {
            order: OutputOrder::Names(names),
            permutation: None,
        }
    }

    pub fn with_order(order: Vec<usize>) -> Self {
        ReorderOutputs {
            order: OutputOrder::Indexes(order),
            permutation: None,
        }
    }

    pub fn reversed() -> Self {
        Self::with_names([REVERSE_TOKEN])
    }

    pub fn order(&self) -> &OutputOrder {
        &self.order
    }

    /// The learned permutation, once initialized.
    pub fn permutation(&self) -> Option<&[usize]> {
        self.permutation.as_deref()
    }

    fn learned(&self) -> Result<&[usize], FilterError> {
        self.permutation
            .as_deref()
            .ok_or(FilterError::NotInitialized(FilterKind::ReorderOutputs))
    }

    fn build_permutation<F: Float>(
        &self,
        labels: &Dataset<F>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<usize>, FilterError> {
        let width = labels.n_cols();
        let permutation = match &self.order {
            OutputOrder::Random => {
                let mut permutation: Vec<usize> = (0..width).collect();
                permutation.shuffle(rng);
                permutation
            }
            OutputOrder::Names(names) if names.len() == 1 && names[0] == REVERSE_TOKEN => {
                (0..width).rev().collect()
            }
            OutputOrder::Names(names) => {
                if names.len() != width {
                    return Err(FilterError::Config(format!(
                        "{} column names given to reorder {} label columns",
                        names.len(),
                        width
                    )));
                }
                names
                    .iter()
                    .map(|name| {
                        labels
                            .schema()
                            .column_index(name)
                            .ok_or_else(|| DataError::UnknownColumn(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            OutputOrder::Indexes(order) => order.clone(),
        };

        let mut seen = vec![false; width];
        for &c in &permutation {
            if c >= width || std::mem::replace(&mut seen[c], true) {
                return Err(FilterError::Config(format!(
                    "{:?} is not a permutation of {} label columns",
                    permutation, width
                )));
            }
        }
        if permutation.len() != width {
            return Err(FilterError::Config(format!(
                "{:?} is not a permutation of {} label columns",
                permutation, width
            )));
        }
        Ok(permutation)
    }

    /// Puts per-column items, e.g. column names or confusion matrices, that
    /// follow the filtered label order back into the original label order.
    pub fn unfilter_column_items<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, FilterError> {
        let permutation = self.learned()?;
        if items.len() != permutation.len() {
            return Err(DataError::WidthMismatch {
                expected: permutation.len(),
                actual: items.len(),
            }
            .into());
        }
        let mut out = items.to_vec();
        for (i, &c) in permutation.iter().enumerate() {
            out[c] = items[i].clone();
        }
        Ok(out)
    }
}

impl<F: Float> Filter<F> for ReorderOutputs {
    fn kind(&self) -> FilterKind {
        FilterKind::ReorderOutputs
    }

    fn initialize(
        &mut self,
        _inputs: &Dataset<F>,
        labels: &Dataset<F>,
        rng: &mut dyn RngCore,
    ) -> Result<(), FilterError> {
        let permutation = self.build_permutation(labels, rng)?;
        debug!("reordering label columns as {:?}", permutation);
        self.permutation = Some(permutation);
        Ok(())
    }

    fn filter_input(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        Ok(before.clone())
    }

    fn filter_label(&self, _before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        Err(FilterError::Unsupported {
            filter: FilterKind::ReorderOutputs,
            operation: "per-row label filtering",
        })
    }

    fn unfilter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        let permutation = self.learned()?;
        check_width(before, permutation.len())?;
        let mut values = vec![None; permutation.len()];
        for (i, &c) in permutation.iter().enumerate() {
            values[c] = before.value(i);
        }
        Ok(before.derive(values))
    }

    fn filter_inputs(&self, inputs: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        Ok(inputs.clone())
    }

    fn filter_labels(&self, labels: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        let permutation = self.learned()?;
        let schema = labels.schema().reorder(permutation)?;
        map_rows(schema, labels, |row| {
            check_width(row, permutation.len())?;
            Ok(row.select(permutation))
        })
    }
}
