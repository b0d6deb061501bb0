use crate::{Column, DataError, Float, Schema, Vector};

/// A table of rows that all share one [`Schema`].
///
/// Every row is validated on insertion, so a `Dataset` never holds a row of
/// the wrong width or an out-of-range nominal value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Dataset<F>
where
    F: Float,
{
    schema: Schema,
    rows: Vec<Vector<F>>,
}

impl<F> Dataset<F>
where
    F: Float,
{
    /// Creates an empty dataset with the given metadata.
    pub fn new(schema: Schema) -> Self {
        Dataset {
            schema,
            rows: Vec::new(),
        }
    }

    /// Creates a dataset and validates every row against `schema`.
    pub fn from_rows<I>(schema: Schema, rows: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = Vector<F>>,
    {
        let mut dataset = Self::new(schema);
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    pub fn push_row(&mut self, row: Vector<F>) -> Result<(), DataError> {
        self.check_row(&row)?;
        self.rows.push(row);
        Ok(())
    }

    /// Checks that `row` fits this dataset's schema.
    pub fn check_row(&self, row: &Vector<F>) -> Result<(), DataError> {
        if row.len() != self.schema.len() {
            return Err(DataError::WidthMismatch {
                expected: self.schema.len(),
                actual: row.len(),
            });
        }
        for (column, value) in self.schema.iter().zip(row.iter()) {
            column.check_value(value)?;
        }
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vector<F>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vector<F>> {
        self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Vector<F>> {
        self.rows.get(index)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> Result<&Column, DataError> {
        self.schema.column(index)
    }

    pub fn is_continuous(&self, index: usize) -> Result<bool, DataError> {
        Ok(self.schema.column(index)?.is_continuous())
    }

    fn known_in_column(&self, col: usize) -> Result<impl Iterator<Item = F> + '_, DataError> {
        self.schema.column(col)?;
        Ok(self.rows.iter().filter_map(move |r| r.value(col)))
    }

    /// Arithmetic mean of the known values in `col`, `None` if there are none.
    pub fn find_mean(&self, col: usize) -> Result<Option<F>, DataError> {
        let mut sum = F::zero();
        let mut count = 0usize;
        for v in self.known_in_column(col)? {
            sum += v;
            count += 1;
        }
        if count == 0 {
            return Ok(None);
        }
        Ok(Some(sum / F::from_count(count)))
    }

    /// Most frequent known value in `col`. Ties go to the smallest value.
    pub fn find_mode(&self, col: usize) -> Result<Option<F>, DataError> {
        let mut counts: Vec<(F, usize)> = Vec::new();
        for v in self.known_in_column(col)? {
            match counts.iter_mut().find(|(value, _)| *value == v) {
                Some((_, n)) => *n += 1,
                None => counts.push((v, 1)),
            }
        }
        let mut best: Option<(F, usize)> = None;
        for (value, n) in counts {
            best = match best {
                Some((bv, bn)) if bn > n || (bn == n && bv <= value) => Some((bv, bn)),
                _ => Some((value, n)),
            };
        }
        Ok(best.map(|(value, _)| value))
    }

    pub fn find_min(&self, col: usize) -> Result<Option<F>, DataError> {
        Ok(self
            .known_in_column(col)?
            .fold(None, |m: Option<F>, v| match m {
                Some(m) if m <= v => Some(m),
                _ => Some(v),
            }))
    }

    pub fn find_max(&self, col: usize) -> Result<Option<F>, DataError> {
        Ok(self
            .known_in_column(col)?
            .fold(None, |m: Option<F>, v| match m {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            }))
    }

    /// Splits the last `n_labels` columns off as a label dataset.
    ///
    /// Row weights are kept on both halves.
    pub fn split_inputs_labels(&self, n_labels: usize) -> Result<(Self, Self), DataError> {
        let (input_schema, label_schema) = self.schema.split_tail(n_labels)?;
        let at = input_schema.len();
        let mut inputs = Self::new(input_schema);
        let mut labels = Self::new(label_schema);
        for row in &self.rows {
            let values = row.values();
            inputs
                .rows
                .push(row.derive(values.iter().take(at).copied()));
            labels
                .rows
                .push(row.derive(values.iter().skip(at).copied()));
        }
        Ok((inputs, labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn mixed() -> Dataset<f64> {
        let schema = Schema::new(vec![
            Column::continuous("a1"),
            Column::nominal("a2", ["t0", "t1", "t2"]).unwrap(),
            Column::nominal("class", ["no", "yes"]).unwrap(),
        ]);
        Dataset::from_rows(
            schema,
            vec![
                Vector::from_options(vec![None, Some(2.0), Some(0.0)]),
                Vector::from_options(vec![Some(7.0), Some(0.0), Some(1.0)]),
                Vector::from_options(vec![Some(7.5), Some(1.0), Some(0.0)]),
                Vector::from_options(vec![Some(8.5), None, Some(1.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_rows() {
        let mut data = mixed();
        assert_eq!(
            data.push_row(Vector::from_known(vec![1.0, 1.0])),
            Err(DataError::WidthMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert!(matches!(
            data.push_row(Vector::from_known(vec![1.0, 3.0, 0.0])),
            Err(DataError::NominalOutOfRange { .. })
        ));
        assert!(matches!(
            data.push_row(Vector::from_known(vec![1.0, -1.0, 0.0])),
            Err(DataError::NegativeNominal { .. })
        ));
        assert_eq!(data.n_rows(), 4);
    }

    #[test]
    fn test_column_statistics_skip_unknowns() {
        let data = mixed();
        assert_abs_diff_eq!(data.find_mean(0).unwrap().unwrap(), 23.0 / 3.0, epsilon = 1e-12);
        assert_eq!(data.find_min(0).unwrap(), Some(7.0));
        assert_eq!(data.find_max(0).unwrap(), Some(8.5));
        // 2.0, 0.0 and 1.0 each appear once; the smallest one wins.
        assert_eq!(data.find_mode(1).unwrap(), Some(0.0));
        assert!(data.find_mean(5).is_err());

        let mut data = data;
        data.push_row(Vector::from_known(vec![1.0, 2.0, 0.0])).unwrap();
        assert_eq!(data.find_mode(1).unwrap(), Some(2.0));
    }

    #[test]
    fn test_statistics_on_empty_dataset() {
        let data: Dataset<f64> = Dataset::new(Schema::new(vec![Column::continuous("x")]));
        assert_eq!(data.find_mean(0).unwrap(), None);
        assert_eq!(data.find_mode(0).unwrap(), None);
        assert_eq!(data.find_min(0).unwrap(), None);
    }

    #[test]
    fn test_split_inputs_labels() {
        let mut data = mixed();
        let mut heavy = Vector::from_known(vec![1.0, 1.0, 1.0]);
        heavy.set_weight(3.0);
        data.push_row(heavy).unwrap();

        let (inputs, labels) = data.split_inputs_labels(1).unwrap();
        assert_eq!(inputs.n_cols(), 2);
        assert_eq!(labels.n_cols(), 1);
        assert_eq!(labels.n_rows(), 5);
        assert_eq!(labels.row(1).unwrap(), &Vector::from_known(vec![1.0]));
        assert_eq!(inputs.row(4).unwrap().weight(), 3.0);
        assert_eq!(labels.row(4).unwrap().weight(), 3.0);
    }
}
