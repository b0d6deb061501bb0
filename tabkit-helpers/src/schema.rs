use crate::{DataError, Float};

/// Name under which unknown values are reported (e.g. in confusion matrices).
pub const UNKNOWN_VALUE_NAME: &str = "?";

/// The semantic type of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum ColumnKind {
    Continuous,
    /// A categorical column. Values are stored as indexes into `values`.
    Nominal { values: Vec<String> },
}

/// Metadata for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Column {
    name: String,
    kind: ColumnKind,
}

impl Column {
    pub fn continuous(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnKind::Continuous,
        }
    }

    /// Creates a nominal column.
    ///
    /// # Errors
    ///
    /// Returns `DataError::TooFewValues` if fewer than two value names are given.
    pub fn nominal<I, S>(name: impl Into<String>, values: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() < 2 {
            return Err(DataError::TooFewValues {
                column: name,
                count: values.len(),
            });
        }
        Ok(Column {
            name,
            kind: ColumnKind::Nominal { values },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self.kind, ColumnKind::Continuous)
    }

    /// Number of nominal values, 0 for continuous columns.
    pub fn value_count(&self) -> usize {
        match &self.kind {
            ColumnKind::Continuous => 0,
            ColumnKind::Nominal { values } => values.len(),
        }
    }

    pub fn value_names(&self) -> &[String] {
        match &self.kind {
            ColumnKind::Continuous => &[],
            ColumnKind::Nominal { values } => values,
        }
    }

    pub fn value_index(&self, value_name: &str) -> Option<usize> {
        self.value_names().iter().position(|v| v == value_name)
    }

    /// Checks that `value` may be stored in this column.
    ///
    /// Unknown values and continuous columns always pass. Nominal values must
    /// be non-negative and below the value count.
    pub fn check_value<F: Float>(&self, value: Option<F>) -> Result<(), DataError> {
        let Some(v) = value else {
            return Ok(());
        };
        if self.is_continuous() {
            return Ok(());
        }
        if v < F::zero() {
            return Err(DataError::NegativeNominal {
                column: self.name.clone(),
                value: v.to_report(),
            });
        }
        let count = self.value_count();
        if v >= F::from_count(count) {
            return Err(DataError::NominalOutOfRange {
                column: self.name.clone(),
                value: v.to_report(),
                count,
            });
        }
        Ok(())
    }

    /// Resolves a stored value to its display name.
    ///
    /// Unknown values map to [`UNKNOWN_VALUE_NAME`]. Continuous columns have
    /// no value names and fail with `DataError::NotNominal`.
    pub fn value_label<F: Float>(&self, value: Option<F>) -> Result<String, DataError> {
        let Some(v) = value else {
            return Ok(UNKNOWN_VALUE_NAME.to_string());
        };
        match &self.kind {
            ColumnKind::Continuous => Err(DataError::NotNominal {
                column: self.name.clone(),
            }),
            ColumnKind::Nominal { values } => {
                self.check_value(Some(v))?;
                let index: usize = v.as_();
                Ok(values[index].clone())
            }
        }
    }
}

/// Ordered column metadata shared by every row of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn column(&self, index: usize) -> Result<&Column, DataError> {
        self.columns.get(index).ok_or(DataError::ColumnOutOfRange {
            index,
            width: self.columns.len(),
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_continuous(&self) -> bool {
        self.columns.iter().any(Column::is_continuous)
    }

    /// A new schema with the columns at `order`, in that order.
    pub fn reorder(&self, order: &[usize]) -> Result<Schema, DataError> {
        let columns = order
            .iter()
            .map(|&i| self.column(i).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Schema { columns })
    }

    /// Splits off the last `n` columns.
    pub fn split_tail(&self, n: usize) -> Result<(Schema, Schema), DataError> {
        if n > self.columns.len() {
            return Err(DataError::InvalidSplit {
                requested: n,
                width: self.columns.len(),
            });
        }
        let at = self.columns.len() - n;
        Ok((
            Schema::new(self.columns[..at].to_vec()),
            Schema::new(self.columns[at..].to_vec()),
        ))
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Schema::new(iter.into_iter().collect())
    }
}
