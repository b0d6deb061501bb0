use crate::{
    FilterChain, FilterError, FilterStage, MeanModeUnknownFiller, NominalToCategorical, Normalize,
    ReorderOutputs,
};
use std::str::FromStr;
use tabkit_helpers::Float;

/// An untrained filter described by a settings line such as
/// `"NominalToCategorical -b"` or `"ReorderOutputs class3 class2 class1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum FilterSpec {
    MeanModeUnknownFiller,
    NominalToCategorical { collapse_binary: bool },
    Normalize { ignored_inputs: Vec<usize> },
    /// An empty name list means a random order.
    ReorderOutputs { names: Vec<String> },
}

impl FilterSpec {
    /// Parses a whitespace separated settings line: the filter name followed
    /// by its arguments.
    pub fn parse(line: &str) -> Result<Self, FilterError> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| FilterError::Config("empty filter settings".to_string()))?;
        let args: Vec<&str> = words.collect();
        Self::from_args(name, &args)
    }

    pub fn from_args(name: &str, args: &[&str]) -> Result<Self, FilterError> {
        match name {
            "MeanModeUnknownFiller" => {
                no_args(name, args)?;
                Ok(FilterSpec::MeanModeUnknownFiller)
            }
            "NominalToCategorical" => match args {
                [] => Ok(FilterSpec::NominalToCategorical {
                    collapse_binary: false,
                }),
                ["-b" | "--collapse-binary"] => Ok(FilterSpec::NominalToCategorical {
                    collapse_binary: true,
                }),
                _ => Err(bad_args(name, args)),
            },
            "Normalize" => {
                let mut ignored_inputs: Vec<usize> = Vec::new();
                let mut rest = args.iter();
                while let Some(&flag) = rest.next() {
                    let column = match (flag, rest.next()) {
                        ("-i", Some(column)) => column,
                        _ => return Err(bad_args(name, args)),
                    };
                    ignored_inputs.push(column.parse().map_err(|_| {
                        FilterError::Config(format!("\"{column}\" is not a column index"))
                    })?);
                }
                Ok(FilterSpec::Normalize { ignored_inputs })
            }
            "ReorderOutputs" => Ok(FilterSpec::ReorderOutputs {
                names: args.iter().map(|s| s.to_string()).collect(),
            }),
            _ => Err(FilterError::Config(format!("unknown filter \"{name}\""))),
        }
    }

    pub fn build<F: Float>(&self) -> FilterStage<F> {
        match self {
            FilterSpec::MeanModeUnknownFiller => {
                FilterStage::MeanModeUnknownFiller(MeanModeUnknownFiller::new())
            }
            FilterSpec::NominalToCategorical { collapse_binary } => NominalToCategorical::new()
                .collapse_binary(*collapse_binary)
                .into(),
            FilterSpec::Normalize { ignored_inputs } => {
                let mut filter = Normalize::new();
                for &c in ignored_inputs {
                    filter.ignore_input_column(c);
                }
                FilterStage::Normalize(filter)
            }
            FilterSpec::ReorderOutputs { names } => {
                ReorderOutputs::with_names(names.iter().cloned()).into()
            }
        }
    }
}

impl FromStr for FilterSpec {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn no_args(name: &str, args: &[&str]) -> Result<(), FilterError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(bad_args(name, args))
    }
}

fn bad_args(name: &str, args: &[&str]) -> FilterError {
    FilterError::Config(format!("unexpected arguments for {name}: {}", args.join(" ")))
}

impl<F: Float> FilterChain<F> {
    /// Builds an untrained chain from specs, outermost first.
    pub fn from_specs<'a, I>(specs: I) -> Self
    where
        I: IntoIterator<Item = &'a FilterSpec>,
    {
        specs.into_iter().map(FilterSpec::build::<F>).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Filter, FilterKind, OutputOrder};

    #[test]
    fn test_parse_settings_lines() {
        assert_eq!(
            FilterSpec::parse("MeanModeUnknownFiller").unwrap(),
            FilterSpec::MeanModeUnknownFiller
        );
        assert_eq!(
            "NominalToCategorical -b".parse::<FilterSpec>().unwrap(),
            FilterSpec::NominalToCategorical {
                collapse_binary: true
            }
        );
        assert_eq!(
            FilterSpec::parse("Normalize -i 0 -i 3").unwrap(),
            FilterSpec::Normalize {
                ignored_inputs: vec![0, 3]
            }
        );
        assert_eq!(
            FilterSpec::parse("  ReorderOutputs class3 class2   class1 ").unwrap(),
            FilterSpec::ReorderOutputs {
                names: vec!["class3".into(), "class2".into(), "class1".into()]
            }
        );
    }

    #[test]
    fn test_bad_settings() {
        for line in [
            "",
            "Smooth",
            "MeanModeUnknownFiller x",
            "NominalToCategorical -x",
            "Normalize -i",
            "Normalize -i first",
            "Normalize 3",
        ] {
            assert!(
                matches!(FilterSpec::parse(line), Err(FilterError::Config(_))),
                "{line:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_build_chain() {
        let specs: Vec<FilterSpec> = [
            "MeanModeUnknownFiller",
            "NominalToCategorical --collapse-binary",
            "Normalize -i 1",
            "ReorderOutputs",
        ]
        .iter()
        .map(|line| line.parse().unwrap())
        .collect();
        let chain: FilterChain<f64> = FilterChain::from_specs(&specs);
        let kinds: Vec<FilterKind> = chain.stages().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            [
                FilterKind::MeanModeUnknownFiller,
                FilterKind::NominalToCategorical,
                FilterKind::Normalize,
                FilterKind::ReorderOutputs
            ]
        );

        let mut chain = chain;
        let normalize = chain
            .find_filter_mut(FilterKind::Normalize)
            .and_then(FilterStage::as_normalize_mut)
            .unwrap();
        assert_eq!(normalize.ignored_inputs().collect::<Vec<_>>(), [1]);
        let reorder = chain
            .find_filter(FilterKind::ReorderOutputs)
            .and_then(FilterStage::as_reorder_outputs)
            .unwrap();
        assert_eq!(reorder.order(), &OutputOrder::Random);
    }
}
