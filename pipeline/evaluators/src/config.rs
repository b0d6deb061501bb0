use crate::{
    Accuracy, AccuracyOfGroup, AccuracyPerColumn, EvalError, Mse, RelativeEntropy, Scorer, TopN,
    TopNHamming,
};
use std::str::FromStr;
use tabkit_helpers::Float;

/// An evaluator described by a settings line such as `"TopN 1 2 5"` or
/// `"AccuracyOfGroup size color"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum ScorerSpec {
    Accuracy,
    AccuracyOfGroup { names: Vec<String> },
    AccuracyPerColumn,
    Mse,
    RelativeEntropy,
    TopN { ns: Vec<usize> },
    TopNHamming { ns: Vec<usize> },
}

fn parse_ns(name: &str, args: &[&str]) -> Result<Vec<usize>, EvalError> {
    args.iter()
        .map(|arg| {
            arg.parse()
                .map_err(|_| EvalError::Config(format!("{name}: \"{arg}\" is not a valid n")))
        })
        .collect()
}

fn no_args(name: &str, args: &[&str]) -> Result<(), EvalError> {
    if args.is_empty() {
        return Ok(());
    }
    Err(EvalError::Config(format!(
        "unexpected arguments for {name}: {}",
        args.join(" ")
    )))
}

impl ScorerSpec {
    pub fn parse(line: &str) -> Result<Self, EvalError> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| EvalError::Config("empty evaluator settings".to_string()))?;
        let args: Vec<&str> = words.collect();
        Self::from_args(name, &args)
    }

    pub fn from_args(name: &str, args: &[&str]) -> Result<Self, EvalError> {
        let spec = match name {
            "Accuracy" => no_args(name, args).map(|_| ScorerSpec::Accuracy)?,
            "AccuracyPerColumn" => no_args(name, args).map(|_| ScorerSpec::AccuracyPerColumn)?,
            "MSE" | "Mse" => no_args(name, args).map(|_| ScorerSpec::Mse)?,
            "RelativeEntropy" => no_args(name, args).map(|_| ScorerSpec::RelativeEntropy)?,
            "AccuracyOfGroup" => ScorerSpec::AccuracyOfGroup {
                names: args.iter().map(|s| s.to_string()).collect(),
            },
            "TopN" => ScorerSpec::TopN {
                ns: parse_ns(name, args)?,
            },
            "TopNHamming" => ScorerSpec::TopNHamming {
                ns: parse_ns(name, args)?,
            },
            _ => return Err(EvalError::Config(format!("unknown evaluator \"{name}\""))),
        };
        Ok(spec)
    }

    /// Builds the evaluator, validating its arguments.
    pub fn build<F: Float>(&self) -> Result<Scorer<F>, EvalError> {
        Ok(match self {
            ScorerSpec::Accuracy => Scorer::Accuracy(Accuracy::new()),
            ScorerSpec::AccuracyOfGroup { names } => {
                Scorer::AccuracyOfGroup(AccuracyOfGroup::new(names.iter().cloned())?)
            }
            ScorerSpec::AccuracyPerColumn => Scorer::AccuracyPerColumn(AccuracyPerColumn::new()),
            ScorerSpec::Mse => Scorer::Mse(Mse::new()),
            ScorerSpec::RelativeEntropy => Scorer::RelativeEntropy(RelativeEntropy::new()),
            ScorerSpec::TopN { ns } => Scorer::TopN(TopN::new(ns.clone())?),
            ScorerSpec::TopNHamming { ns } => Scorer::TopNHamming(TopNHamming::new(ns.clone())?),
        })
    }
}

impl FromStr for ScorerSpec {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
