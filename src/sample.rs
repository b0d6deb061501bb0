//! Seeded synthetic data for the demo binary and the end-to-end tests.

use rand::Rng;
use tabkit_helpers::{Column, DataError, Dataset, Float, Schema, Vector};

/// Centre of each class in the `x`/`y` plane.
pub const CENTRES: [(f64, f64); 3] = [(2.0, 3.0), (8.0, 6.0), (5.0, 9.0)];

const CLASSES: [&str; 3] = ["A", "B", "C"];

/// Number of trailing label columns in [`clusters`].
pub const N_LABELS: usize = 2;

fn schema() -> Result<Schema, DataError> {
    Ok(Schema::new(vec![
        Column::continuous("x"),
        Column::continuous("y"),
        Column::nominal("texture", ["smooth", "rough"])?,
        Column::nominal("class", CLASSES)?,
        Column::nominal("side", ["west", "east"])?,
    ]))
}

/// `rows_per_class` points around each of [`CENTRES`], interleaved by class.
///
/// Inputs are `x`, `y` (each within 0.5 of the centre) and a nominal
/// `texture` (class A is smooth, the others rough). Labels are the nominal
/// `class` and `side` (west of x = 5 or not). Each `y` is unknown with
/// probability `unknown_rate`.
pub fn clusters<R: Rng + ?Sized>(
    rng: &mut R,
    rows_per_class: usize,
    unknown_rate: f64,
) -> Result<Dataset<f64>, DataError> {
    let mut data = Dataset::new(schema()?);
    for _ in 0..rows_per_class {
        for (class, &(cx, cy)) in CENTRES.iter().enumerate() {
            let x = cx + rng.random_range(-0.5..0.5);
            let y = cy + rng.random_range(-0.5..0.5);
            let y = (rng.random::<f64>() >= unknown_rate).then_some(y);
            let texture = if class == 0 { 0.0 } else { 1.0 };
            let side = if cx < 5.0 { 0.0 } else { 1.0 };
            data.push_row(Vector::from_options(vec![
                Some(x),
                y,
                Some(texture),
                Some(class as f64),
                Some(side),
            ]))?;
        }
    }
    Ok(data)
}

/// Puts every `every`-th row into the second dataset and the rest into the
/// first.
pub fn holdout<F: Float>(
    data: &Dataset<F>,
    every: usize,
) -> Result<(Dataset<F>, Dataset<F>), DataError> {
    if every == 0 {
        return Err(DataError::InvalidSplit {
            requested: every,
            width: data.n_rows(),
        });
    }
    let mut kept = Dataset::new(data.schema().clone());
    let mut held = Dataset::new(data.schema().clone());
    for (i, row) in data.rows().iter().enumerate() {
        if (i + 1) % every == 0 {
            held.push_row(row.clone())?;
        } else {
            kept.push_row(row.clone())?;
        }
    }
    Ok((kept, held))
}
