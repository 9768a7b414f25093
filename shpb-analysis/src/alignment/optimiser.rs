use super::cancellation::Cancellation;
use crate::error::{AlignmentError, ValidationError, ValidationResult};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shpb_common::{Real, metrics::names};
use tracing::{debug, trace};

/// Differential evolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OptimiserConfig {
    pub population_size: usize,
    pub max_generations: usize,
    /// Differential weight applied to the difference vector.
    pub mutation: Real,
    /// Probability of taking each coordinate from the mutant.
    pub crossover: Real,
    /// The search stops once the population's objective spread falls below this.
    pub tolerance: Real,
    /// Fixed seed for reproducible searches, a fresh one is drawn when unset.
    pub seed: Option<u64>,
    /// Evaluate each generation's trials on the rayon thread pool.
    pub parallel: bool,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            max_generations: 200,
            mutation: 0.7,
            crossover: 0.9,
            tolerance: 1e-8,
            seed: Some(42),
            parallel: false,
        }
    }
}

impl OptimiserConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.population_size < 4 {
            return Err(ValidationError::OutOfRange {
                name: "population size",
                requirement: "at least 4",
                value: self.population_size as Real,
            });
        }
        if self.mutation.is_nan() || self.mutation <= 0.0 || self.mutation > 2.0 {
            return Err(ValidationError::OutOfRange {
                name: "mutation",
                requirement: "within (0, 2]",
                value: self.mutation,
            });
        }
        if !(0.0..=1.0).contains(&self.crossover) {
            return Err(ValidationError::OutOfRange {
                name: "crossover",
                requirement: "within [0, 1]",
                value: self.crossover,
            });
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(ValidationError::OutOfRange {
                name: "tolerance",
                requirement: "non-negative",
                value: self.tolerance,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimiserOutcome {
    pub best: Vec<i64>,
    pub value: Real,
    pub generations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

fn to_integers(candidate: &[Real], bounds: &[(i64, i64)]) -> Vec<i64> {
    candidate
        .iter()
        .zip(bounds)
        .map(|(x, &(lo, hi))| (x.round() as i64).clamp(lo, hi))
        .collect()
}

fn evaluate_all<F>(objective: &F, candidates: &[Vec<Real>], bounds: &[(i64, i64)], parallel: bool) -> Vec<Real>
where
    F: Fn(&[i64]) -> Real + Sync,
{
    if parallel {
        candidates
            .par_iter()
            .map(|c| objective(&to_integers(c, bounds)))
            .collect()
    } else {
        candidates
            .iter()
            .map(|c| objective(&to_integers(c, bounds)))
            .collect()
    }
}

/// Picks three distinct population indices, all different from `exclude`.
fn pick_three(rng: &mut StdRng, population: usize, exclude: usize) -> [usize; 3] {
    let mut picked = [exclude; 3];
    for j in 0..3 {
        loop {
            let r = rng.random_range(0..population);
            if r != exclude && !picked[..j].contains(&r) {
                picked[j] = r;
                break;
            }
        }
    }
    picked
}

/// Minimises `objective` over the integer box `bounds` with
/// rand/1/bin differential evolution.
///
/// Trials for a generation are all drawn before any is evaluated, so the
/// outcome for a fixed seed does not depend on `parallel`. The first member
/// of the initial population is the point nearest the origin, and the
/// incumbent only changes on strict improvement, so a flat objective
/// returns that point. The search ends with a greedy walk over the integer
/// neighbourhood of the incumbent.
pub(crate) fn differential_evolution<F>(
    objective: F,
    bounds: &[(i64, i64)],
    config: &OptimiserConfig,
    cancellation: &Cancellation,
) -> Result<OptimiserOutcome, AlignmentError>
where
    F: Fn(&[i64]) -> Real + Sync,
{
    if bounds.is_empty() {
        return Err(ValidationError::Empty("optimiser bounds").into());
    }
    for &(lo, hi) in bounds {
        if lo > hi {
            return Err(ValidationError::InvertedBounds {
                name: "optimiser",
                lower: lo,
                upper: hi,
            }
            .into());
        }
    }
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let dims = bounds.len();
    let pop_size = config.population_size;

    let origin: Vec<Real> = bounds.iter().map(|&(lo, hi)| 0_i64.clamp(lo, hi) as Real).collect();
    let mut population: Vec<Vec<Real>> = std::iter::once(origin)
        .chain((1..pop_size).map(|_| {
            bounds
                .iter()
                .map(|&(lo, hi)| rng.random_range(lo as Real..=hi as Real))
                .collect()
        }))
        .collect();
    let mut fitness = evaluate_all(&objective, &population, bounds, config.parallel);
    let mut evaluations = pop_size;

    let mut best_idx = 0;
    for (i, &value) in fitness.iter().enumerate() {
        if value < fitness[best_idx] {
            best_idx = i;
        }
    }
    let mut best = population[best_idx].clone();
    let mut best_value = fitness[best_idx];

    let mut generations = 0;
    let mut converged = false;
    while generations < config.max_generations {
        cancellation.check(generations)?;

        let (lowest, highest) = fitness
            .iter()
            .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if highest - lowest <= config.tolerance {
            converged = true;
            break;
        }

        let trials: Vec<Vec<Real>> = (0..pop_size)
            .map(|i| {
                let [r0, r1, r2] = pick_three(&mut rng, pop_size, i);
                let forced = rng.random_range(0..dims);
                (0..dims)
                    .map(|j| {
                        if j == forced || rng.random::<Real>() < config.crossover {
                            let (lo, hi) = bounds[j];
                            (population[r0][j]
                                + config.mutation * (population[r1][j] - population[r2][j]))
                                .clamp(lo as Real, hi as Real)
                        } else {
                            population[i][j]
                        }
                    })
                    .collect()
            })
            .collect();
        let trial_fitness = evaluate_all(&objective, &trials, bounds, config.parallel);
        evaluations += pop_size;

        for (i, (trial, value)) in trials.into_iter().zip(trial_fitness).enumerate() {
            if value <= fitness[i] {
                if value < best_value {
                    best_value = value;
                    best.clone_from(&trial);
                }
                population[i] = trial;
                fitness[i] = value;
            }
        }
        generations += 1;
        trace!("Generation {generations}: best objective {best_value}");
    }

    let mut best = to_integers(&best, bounds);
    let polish_evaluations = polish(&objective, &mut best, &mut best_value, bounds);
    evaluations += polish_evaluations;

    debug!(
        "Differential evolution finished after {generations} generation(s), {evaluations} evaluation(s): {best:?} -> {best_value}"
    );
    metrics::counter!(names::FITNESS_EVALUATIONS).increment(evaluations as u64);
    metrics::histogram!(names::ALIGNMENT_GENERATIONS).record(generations as f64);

    Ok(OptimiserOutcome {
        best,
        value: best_value,
        generations,
        evaluations,
        converged,
    })
}

/// Greedy descent over the integer neighbourhood (each coordinate moved by
/// -1, 0 or +1) of `best`, returning the number of evaluations.
fn polish<F>(objective: &F, best: &mut Vec<i64>, best_value: &mut Real, bounds: &[(i64, i64)]) -> usize
where
    F: Fn(&[i64]) -> Real + Sync,
{
    let dims = best.len();
    let offsets: Vec<Vec<i64>> = (0..3_usize.pow(dims as u32))
        .map(|code| {
            (0..dims)
                .map(|d| (code / 3_usize.pow(d as u32) % 3) as i64 - 1)
                .collect()
        })
        .filter(|offset: &Vec<i64>| offset.iter().any(|&o| o != 0))
        .collect();

    let mut evaluations = 0;
    loop {
        let neighbours: Vec<Vec<i64>> = offsets
            .iter()
            .map(|offset| {
                best.iter()
                    .zip(offset)
                    .zip(bounds)
                    .map(|((b, o), &(lo, hi))| (b + o).clamp(lo, hi))
                    .collect::<Vec<i64>>()
            })
            .filter(|candidate| candidate != best)
            .collect();
        let mut improved = false;
        for candidate in neighbours {
            let value = objective(&candidate);
            evaluations += 1;
            if value < *best_value {
                *best_value = value;
                *best = candidate;
                improved = true;
            }
        }
        if !improved {
            return evaluations;
        }
    }
}
