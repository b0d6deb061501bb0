use crate::stage::{check_width, map_rows};
use crate::{Filter, FilterError, FilterKind};
use log::debug;
use rand::RngCore;
use tabkit_helpers::{Column, ColumnKind, Dataset, Float, Schema, Vector};

/// Converts nominal columns to real-valued indicator columns.
///
/// A nominal column with `n` values becomes `n` columns holding a one-of-n
/// encoding. With `collapse_binary` set, two-valued columns stay a single 0/1
/// column instead. Continuous columns are copied unchanged.
///
/// Decoding a label picks, within each block, the value whose column is
/// highest.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct NominalToCategorical {
    collapse_binary: bool,
    inputs: Option<Encoding>,
    labels: Option<Encoding>,
}

/// The learned layout of one side (inputs or labels).
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
struct Encoding {
    original: Schema,
    encoded: Schema,
    widths: Vec<usize>,
    total: usize,
}

impl Encoding {
    fn new(original: &Schema, collapse_binary: bool) -> Self {
        let mut widths = Vec::with_capacity(original.len());
        let mut encoded = Vec::new();
        for column in original.iter() {
            match column.kind() {
                ColumnKind::Nominal { values } if !(collapse_binary && values.len() == 2) => {
                    widths.push(values.len());
                    for value in values {
                        encoded.push(Column::continuous(format!("{}={}", column.name(), value)));
                    }
                }
                _ => {
                    widths.push(1);
                    encoded.push(Column::continuous(column.name()));
                }
            }
        }
        let total = widths.iter().sum();
        Encoding {
            original: original.clone(),
            encoded: Schema::new(encoded),
            widths,
            total,
        }
    }

    fn encode<F: Float>(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        check_width(before, self.original.len())?;
        let mut after = Vec::with_capacity(self.total);
        for ((column, &width), value) in self.original.iter().zip(&self.widths).zip(before.iter()) {
            column.check_value(value)?;
            if width == 1 {
                after.push(value);
                continue;
            }
            match value {
                // One missing value becomes a block of missing values.
                None => after.extend(std::iter::repeat_n(None, width)),
                Some(v) => {
                    let hot: usize = v.as_();
                    after.extend((0..width).map(|j| {
                        Some(if j == hot { F::one() } else { F::zero() })
                    }));
                }
            }
        }
        Ok(before.derive(after))
    }

    fn decode<F: Float>(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        check_width(before, self.total)?;
        let mut after = Vec::with_capacity(self.original.len());
        let mut start = 0;
        for (column, &width) in self.original.iter().zip(&self.widths) {
            let value = if column.is_continuous() {
                before.value(start)
            } else if width == 1 {
                before
                    .value(start)
                    .map(|v| v.round().max(F::zero()).min(F::one()))
            } else {
                arg_max(before, start, width).map(F::from_count)
            };
            after.push(value);
            start += width;
        }
        Ok(before.derive(after))
    }
}

/// Offset of the largest known value in `v[start..start + width]`, lowest
/// offset on ties. `None` when the whole block is unknown.
fn arg_max<F: Float>(v: &Vector<F>, start: usize, width: usize) -> Option<usize> {
    let mut best: Option<(usize, F)> = None;
    for j in 0..width {
        if let Some(x) = v.value(start + j) {
            match best {
                Some((_, b)) if b >= x => {}
                _ => best = Some((j, x)),
            }
        }
    }
    best.map(|(j, _)| j)
}

impl NominalToCategorical {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps two-valued nominal columns as a single 0/1 column.
    pub fn collapse_binary(mut self, collapse: bool) -> Self {
        self.collapse_binary = collapse;
        self
    }

    pub fn collapses_binary(&self) -> bool {
        self.collapse_binary
    }

    /// Total encoded width of the inputs, once initialized.
    pub fn input_width(&self) -> Option<usize> {
        self.inputs.as_ref().map(|e| e.total)
    }

    pub fn label_width(&self) -> Option<usize> {
        self.labels.as_ref().map(|e| e.total)
    }

    fn input_encoding(&self) -> Result<&Encoding, FilterError> {
        self.inputs
            .as_ref()
            .ok_or(FilterError::NotInitialized(FilterKind::NominalToCategorical))
    }

    fn label_encoding(&self) -> Result<&Encoding, FilterError> {
        self.labels
            .as_ref()
            .ok_or(FilterError::NotInitialized(FilterKind::NominalToCategorical))
    }
}

impl<F: Float> Filter<F> for NominalToCategorical {
    fn kind(&self) -> FilterKind {
        FilterKind::NominalToCategorical
    }

    fn initialize(
        &mut self,
        inputs: &Dataset<F>,
        labels: &Dataset<F>,
        _rng: &mut dyn RngCore,
    ) -> Result<(), FilterError> {
        let input_enc = Encoding::new(inputs.schema(), self.collapse_binary);
        let label_enc = Encoding::new(labels.schema(), self.collapse_binary);
        debug!(
            "encoding {} input cols as {}, {} label cols as {}",
            inputs.n_cols(),
            input_enc.total,
            labels.n_cols(),
            label_enc.total
        );
        self.inputs = Some(input_enc);
        self.labels = Some(label_enc);
        Ok(())
    }

    fn filter_input(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        self.input_encoding()?.encode(before)
    }

    fn filter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        self.label_encoding()?.encode(before)
    }

    fn unfilter_label(&self, before: &Vector<F>) -> Result<Vector<F>, FilterError> {
        self.label_encoding()?.decode(before)
    }

    fn filter_inputs(&self, inputs: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        let enc = self.input_encoding()?;
        map_rows(enc.encoded.clone(), inputs, |row| enc.encode(row))
    }

    fn filter_labels(&self, labels: &Dataset<F>) -> Result<Dataset<F>, FilterError> {
        let enc = self.label_encoding()?;
        map_rows(enc.encoded.clone(), labels, |row| enc.encode(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use tabkit_helpers::DataError;

    /// Inputs: a 3-valued nominal, a binary nominal, a continuous column.
    /// Labels: a binary nominal and a 3-valued nominal.
    fn small_nominal() -> (Dataset<f64>, Dataset<f64>) {
        let inputs = Dataset::from_rows(
            Schema::new(vec![
                Column::nominal("color", ["red", "green", "blue"]).unwrap(),
                Column::nominal("big", ["no", "yes"]).unwrap(),
                Column::continuous("weight"),
            ]),
            vec![
                Vector::from_known(vec![0.0, 1.0, 8.88]),
                Vector::from_known(vec![2.0, 0.0, 999.1]),
            ],
        )
        .unwrap();
        let labels = Dataset::from_rows(
            Schema::new(vec![
                Column::nominal("ok", ["f", "t"]).unwrap(),
                Column::nominal("grade", ["a", "b", "c"]).unwrap(),
            ]),
            vec![
                Vector::from_known(vec![1.0, 1.0]),
                Vector::from_known(vec![0.0, 2.0]),
            ],
        )
        .unwrap();
        (inputs, labels)
    }

    fn trained(collapse: bool) -> (NominalToCategorical, Dataset<f64>, Dataset<f64>) {
        let (inputs, labels) = small_nominal();
        let mut filter = NominalToCategorical::new().collapse_binary(collapse);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        filter.initialize(&inputs, &labels, &mut rng).unwrap();
        (filter, inputs, labels)
    }

    #[test]
    fn test_filter_inputs_collapsed_binary() {
        let (filter, inputs, _) = trained(true);
        let out = filter.filter_inputs(&inputs).unwrap();
        assert_eq!(out.n_cols(), 5);
        assert_eq!(out.row(0).unwrap(), &Vector::from_known(vec![1.0, 0.0, 0.0, 1.0, 8.88]));
        assert_eq!(out.row(1).unwrap(), &Vector::from_known(vec![0.0, 0.0, 1.0, 0.0, 999.1]));
        let names: Vec<&str> = out.schema().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["color=red", "color=green", "color=blue", "big", "weight"]);
        assert!(out.schema().iter().all(|c| c.is_continuous()));
    }

    #[test]
    fn test_filter_labels_without_collapse() {
        let (filter, _, labels) = trained(false);
        let out = filter.filter_labels(&labels).unwrap();
        assert_eq!(out.n_cols(), 5);
        assert_eq!(out.row(0).unwrap(), &Vector::from_known(vec![0.0, 1.0, 0.0, 1.0, 0.0]));
        assert_eq!(filter.label_width(), Some(5));
        assert_eq!(filter.input_width(), Some(6));
    }

    #[test]
    fn test_three_valued_value_one_encodes_and_decodes() {
        let (filter, _, _) = trained(true);
        let label = Vector::from_known(vec![0.0, 1.0]);
        let encoded = filter.filter_label(&label).unwrap();
        assert_eq!(encoded, Vector::from_known(vec![0.0, 0.0, 1.0, 0.0]));

        let decoded = filter
            .unfilter_label(&Vector::from_known(vec![0.3, 0.2, 0.9, 0.1]))
            .unwrap();
        assert_eq!(decoded, label);
    }

    #[test]
    fn test_arg_max_ties_go_to_lowest_index() {
        let (filter, _, _) = trained(false);
        let decoded = filter
            .unfilter_label(&Vector::from_known(vec![0.5, 0.5, 0.4, 0.4, 0.1]))
            .unwrap();
        assert_eq!(decoded, Vector::from_known(vec![0.0, 0.0]));
    }

    #[test]
    fn test_unknown_expands_to_unknown_block_and_back() {
        let (filter, _, _) = trained(true);
        let label = Vector::from_options(vec![Some(1.0), None]);
        let encoded = filter.filter_label(&label).unwrap();
        assert_eq!(encoded, Vector::from_options(vec![Some(1.0), None, None, None]));
        assert_eq!(filter.unfilter_label(&encoded).unwrap(), label);
    }

    #[test]
    fn test_collapsed_binary_rounds() {
        let (filter, _, _) = trained(true);
        let decoded = filter
            .unfilter_label(&Vector::from_known(vec![0.7, 0.0, 0.0, 1.0]))
            .unwrap();
        assert_eq!(decoded, Vector::from_known(vec![1.0, 2.0]));
        let decoded = filter
            .unfilter_label(&Vector::from_known(vec![-0.4, 0.0, 1.0, 0.0]))
            .unwrap();
        assert_eq!(decoded, Vector::from_known(vec![0.0, 1.0]));
    }

    #[test]
    fn test_errors() {
        let (filter, _, _) = trained(true);
        assert!(matches!(
            filter.filter_label(&Vector::from_known(vec![0.0, 3.0])),
            Err(FilterError::Data(DataError::NominalOutOfRange { count: 3, .. }))
        ));
        assert!(matches!(
            filter.filter_label(&Vector::from_known(vec![0.0, -1.0])),
            Err(FilterError::Data(DataError::NegativeNominal { .. }))
        ));
        assert!(matches!(
            filter.unfilter_label(&Vector::from_known(vec![0.0, 1.0, 0.0])),
            Err(FilterError::Data(DataError::WidthMismatch {
                expected: 4,
                actual: 3
            }))
        ));

        let untrained = NominalToCategorical::new();
        assert_eq!(
            untrained.filter_input(&Vector::<f64>::from_known(vec![0.0])),
            Err(FilterError::NotInitialized(FilterKind::NominalToCategorical))
        );
    }

    proptest! {
        #[test]
        fn prop_label_round_trip(ok in 0usize..2, grade in 0usize..3, ok_known: bool, grade_known: bool, collapse: bool) {
            let (filter, _, _) = trained(collapse);
            let label = Vector::from_options(vec![
                ok_known.then_some(ok as f64),
                grade_known.then_some(grade as f64),
            ]);
            let encoded = filter.filter_label(&label).unwrap();
            prop_assert_eq!(filter.unfilter_label(&encoded).unwrap(), label);
        }
    }
}
