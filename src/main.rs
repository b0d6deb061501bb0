// Trains a k-NN ranker behind a filter chain on seeded synthetic clusters
// and scores it on a held-out quarter of the rows.
use log::info;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::error::Error;
use tabkit::{
    sample, EvaluationRunner, FilterChain, FilterSpec, FilteredLearner, KnnRanker, L2Dist,
    ScorerKind, ScorerSpec,
};

const FILTERS: [&str; 3] = ["MeanModeUnknownFiller", "NominalToCategorical", "Normalize"];
const EVALUATORS: [&str; 6] = [
    "Accuracy",
    "AccuracyOfGroup class",
    "AccuracyPerColumn",
    "TopN 1 2 3",
    "TopNHamming 1 2",
    "MSE",
];
const K: usize = 5;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let data = sample::clusters(&mut rng, 40, 0.1)?;
    let (train, test) = sample::holdout(&data, 4)?;
    let (train_inputs, train_labels) = train.split_inputs_labels(sample::N_LABELS)?;
    let (test_inputs, test_labels) = test.split_inputs_labels(sample::N_LABELS)?;
    info!(
        "{} training rows, {} test rows",
        train_inputs.n_rows(),
        test_inputs.n_rows()
    );

    let filters = FILTERS
        .iter()
        .map(|line| line.parse())
        .collect::<Result<Vec<FilterSpec>, _>>()?;
    let chain = FilterChain::<f64>::from_specs(&filters);
    let learner = FilteredLearner::train(
        chain,
        &train_inputs,
        &train_labels,
        &mut rng,
        |inputs, labels| KnnRanker::fit(K, L2Dist, &inputs, &labels),
    )?;

    let scorers = EVALUATORS
        .iter()
        .map(|line| line.parse())
        .collect::<Result<Vec<ScorerSpec>, _>>()?;
    let mut runner = EvaluationRunner::from_specs(&scorers)?;
    let evaluation = runner.run(&test_inputs, &test_labels, &learner)?;

    println!("{evaluation}");
    if let Some(confusions) = evaluation.confusions(ScorerKind::Accuracy) {
        for matrix in confusions {
            println!("\n{matrix}");
            println!("{}", matrix.accuracy_report());
        }
    }
    Ok(())
}
