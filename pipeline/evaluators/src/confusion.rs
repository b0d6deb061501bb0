use crate::evaluation::format_score;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Counts of (target value, predicted value) pairs for one label column.
///
/// Values are stored by name, so unknown values show up under
/// [`tabkit_helpers::UNKNOWN_VALUE_NAME`] instead of being folded into a
/// real value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ConfusionMatrix {
    label_name: String,
    counts: BTreeMap<String, BTreeMap<String, usize>>,
}

impl ConfusionMatrix {
    pub fn new(label_name: impl Into<String>) -> Self {
        ConfusionMatrix {
            label_name: label_name.into(),
            counts: BTreeMap::new(),
        }
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn increment(&mut self, target: &str, predicted: &str) {
        *self
            .counts
            .entry(target.to_string())
            .or_default()
            .entry(predicted.to_string())
            .or_default() += 1;
    }

    pub fn count(&self, target: &str, predicted: &str) -> usize {
        self.counts
            .get(target)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Every value name seen, as a target or as a prediction, sorted.
    pub fn value_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        for (target, row) in &self.counts {
            names.insert(target.as_str());
            names.extend(row.keys().map(String::as_str));
        }
        names
    }

    /// Number of rows whose target was `target`.
    pub fn row_total(&self, target: &str) -> usize {
        self.counts.get(target).map_or(0, |row| row.values().sum())
    }

    pub fn total(&self) -> usize {
        self.counts.values().flat_map(|row| row.values()).sum()
    }

    pub fn correct(&self) -> usize {
        self.counts
            .iter()
            .map(|(target, row)| row.get(target).copied().unwrap_or(0))
            .sum()
    }

    /// Fraction of counts on the diagonal, `None` while the matrix is empty.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.correct() as f64 / total as f64)
    }

    /// Per target value, the fraction of its rows that were predicted correctly.
    pub fn accuracy_per_value(&self) -> BTreeMap<String, f64> {
        self.counts
            .keys()
            .filter_map(|target| {
                let total = self.row_total(target);
                (total > 0).then(|| (target.clone(), self.count(target, target) as f64 / total as f64))
            })
            .collect()
    }

    /// Adds the counts of `other`, e.g. one computed on another partition.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        for (target, row) in &other.counts {
            let mine = self.counts.entry(target.clone()).or_default();
            for (predicted, n) in row {
                *mine.entry(predicted.clone()).or_default() += n;
            }
        }
    }

    /// Largest count in a target's row, not counting correct predictions.
    fn max_error_count(&self, target: &str) -> usize {
        self.counts.get(target).map_or(0, |row| {
            row.iter()
                .filter(|(predicted, _)| predicted.as_str() != target)
                .map(|(_, &n)| n)
                .max()
                .unwrap_or(0)
        })
    }

    /// One line per target value, `name: accuracy (correct/total)`, with the
    /// value that is most often mistaken for a single other value first.
    pub fn accuracy_report(&self) -> String {
        let per_value = self.accuracy_per_value();
        let width = per_value.keys().map(String::len).max().unwrap_or(0);
        let mut targets: Vec<&String> = per_value.keys().collect();
        // Stable, so ties keep name order.
        targets.sort_by(|a, b| self.max_error_count(b).cmp(&self.max_error_count(a)));

        let mut report = String::new();
        for target in targets {
            report.push_str(&format!(
                "{:>width$}: {} ({}/{})\n",
                target,
                format_score(per_value[target]),
                self.count(target, target),
                self.row_total(target),
            ));
        }
        report
    }
}

/// Tab delimited, targets down the side and predictions across the top.
impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names = self.value_names();
        let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
        write!(f, "\t")?;
        for name in &names {
            write!(f, "{name}\t")?;
        }
        writeln!(f)?;
        for target in &names {
            write!(f, "{target:>width$}\t")?;
            for predicted in &names {
                write!(f, "{}\t", self.count(target, predicted))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
