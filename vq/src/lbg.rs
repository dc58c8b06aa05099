//! LBG codebook training.
//!
//! Starting from the mean of the training set, every stage splits each
//! codeword in two and refines the doubled codebook with K-means. Training
//! stops once the codebook reaches the target size; codewords that end up
//! owning no training vector are then dropped.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{CancelToken, CodeBook, DistanceMetric, VqError};

/// Number of training vectors each parallel task accumulates. Fixed so that
/// summation order, and therefore the result, does not depend on the
/// thread count.
const CHUNK_SIZE: usize = 256;

/// Relative jitter applied when a codeword cannot be split by its data.
const JITTER: f64 = 0.1;

/// LBG trainer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LbgConfig {
    /// K-means stops when the relative change of the average distortion
    /// falls below this value.
    pub distortion_delta: f64,
    /// Upper bound on K-means iterations per stage.
    pub max_iterations: usize,
    /// Root seed for split jitter.
    pub seed: u64,
}

impl Default for LbgConfig {
    fn default() -> Self {
        Self {
            distortion_delta: 0.05,
            max_iterations: 50,
            seed: 0,
        }
    }
}

/// One split-and-refine stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStage {
    /// Codebook size during this stage.
    pub size: usize,
    /// Average distortion after the split and after every K-means step.
    pub distortions: Vec<f64>,
}

/// What happened during training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub stages: Vec<TrainingStage>,
    /// Codewords dropped because no training vector used them.
    pub dropped: usize,
    /// Size of the final codebook.
    pub final_size: usize,
}

impl TrainingReport {
    /// Average distortion of the last refinement step.
    pub fn final_distortion(&self) -> Option<f64> {
        self.stages.last()?.distortions.last().copied()
    }
}

/// Per-cluster sums collected in one assignment pass.
struct Accumulator {
    sums: Vec<Vec<f64>>,
    counts: Vec<usize>,
    distortion: f64,
}

impl Accumulator {
    fn new(clusters: usize, dim: usize) -> Self {
        Self {
            sums: vec![vec![0.0; dim]; clusters],
            counts: vec![0; clusters],
            distortion: 0.0,
        }
    }

    fn merge(mut self, other: Accumulator) -> Self {
        for (s, o) in self.sums.iter_mut().zip(&other.sums) {
            s.iter_mut().zip(o).for_each(|(a, b)| *a += b);
        }
        self.counts.iter_mut().zip(&other.counts).for_each(|(a, b)| *a += b);
        self.distortion += other.distortion;
        self
    }
}

/// Trains codebooks with the LBG algorithm.
#[derive(Debug, Clone, Default)]
pub struct LbgTrainer {
    config: LbgConfig,
    metric: DistanceMetric,
}

impl LbgTrainer {
    /// Creates a trainer with the given settings and metric.
    pub fn new(config: LbgConfig, metric: DistanceMetric) -> Self {
        Self { config, metric }
    }

    /// Returns the trainer settings.
    pub fn config(&self) -> &LbgConfig {
        &self.config
    }

    /// Returns the distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Trains a codebook of at most `target_size.next_power_of_two()`
    /// codewords.
    ///
    /// The codebook doubles each stage until it reaches the target, so a
    /// target of 3 trains 4 codewords. Unused codewords are dropped from the
    /// returned codebook. The token is checked before every split and every
    /// K-means step.
    pub fn train(
        &self,
        set: &[Vec<f64>],
        target_size: usize,
        cancel: &CancelToken,
    ) -> Result<(CodeBook, TrainingReport), VqError> {
        if target_size == 0 {
            return Err(VqError::InvalidSize(0));
        }
        let dim = check_training_set(set)?;

        let mut codebook = CodeBook::new(dim, vec![mean(set, dim)])?;
        let mut report = TrainingReport::default();
        let initial = self.accumulate(set, &codebook);
        report.stages.push(TrainingStage {
            size: 1,
            distortions: vec![initial.distortion / set.len() as f64],
        });

        let mut stage = 0u64;
        while codebook.len() < target_size {
            cancel.check()?;
            stage += 1;
            codebook = self.split(set, &codebook, stage)?;
            cancel.check()?;
            let (refined, distortions) = self.refine(set, codebook, cancel)?;
            codebook = refined;
            debug!(
                "lbg stage {}: {} codewords, distortion {:.4}",
                stage,
                codebook.len(),
                distortions.last().copied().unwrap_or_default()
            );
            report.stages.push(TrainingStage {
                size: codebook.len(),
                distortions,
            });
        }

        cancel.check()?;
        let trained = codebook.len();
        let codebook = codebook.clear(set, self.metric)?;
        report.dropped = trained - codebook.len();
        report.final_size = codebook.len();
        info!(
            "trained codebook: {} codewords ({} dropped) from {} vectors",
            report.final_size,
            report.dropped,
            set.len()
        );
        Ok((codebook, report))
    }

    /// Replaces each codeword with the two most distant training vectors
    /// assigned to it.
    fn split(&self, set: &[Vec<f64>], codebook: &CodeBook, stage: u64) -> Result<CodeBook, VqError> {
        let assignment = self.assign(set, codebook);
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); codebook.len()];
        for (i, &c) in assignment.iter().enumerate() {
            members[c].push(i);
        }

        let metric = self.metric;
        let seed = self.config.seed;
        let children: Vec<([Vec<f64>; 2], bool)> = codebook
            .codewords()
            .par_iter()
            .zip(members.par_iter())
            .enumerate()
            .map(|(index, (parent, owned))| match farthest_pair(set, owned, metric) {
                Some((a, b)) => ([set[a].clone(), set[b].clone()], false),
                None => {
                    let mut rng = StdRng::seed_from_u64(task_seed(seed, stage, index as u64));
                    (jitter(parent, &mut rng), true)
                }
            })
            .collect();

        let degenerate = children.iter().filter(|(_, jittered)| *jittered).count();
        if degenerate > 0 {
            debug!("lbg stage {}: {} codewords split by jitter", stage, degenerate);
        }
        let codewords = children.into_iter().flat_map(|(pair, _)| pair).collect();
        CodeBook::new(codebook.dim(), codewords)
    }

    /// K-means until the relative distortion change drops below the
    /// configured delta or the iteration cap is hit.
    fn refine(
        &self,
        set: &[Vec<f64>],
        mut codebook: CodeBook,
        cancel: &CancelToken,
    ) -> Result<(CodeBook, Vec<f64>), VqError> {
        let n = set.len() as f64;
        let mut acc = self.accumulate(set, &codebook);
        let mut distortion = acc.distortion / n;
        let mut history = vec![distortion];

        for _ in 0..self.config.max_iterations {
            cancel.check()?;
            let codewords = codebook
                .codewords()
                .iter()
                .zip(acc.sums.iter().zip(&acc.counts))
                .map(|(old, (sum, &count))| {
                    if count == 0 {
                        old.clone()
                    } else {
                        sum.iter().map(|s| s / count as f64).collect()
                    }
                })
                .collect();
            codebook = CodeBook::new(codebook.dim(), codewords)?;

            acc = self.accumulate(set, &codebook);
            let next = acc.distortion / n;
            history.push(next);
            let change = if distortion > 0.0 {
                (distortion - next).abs() / distortion
            } else {
                0.0
            };
            distortion = next;
            if change < self.config.distortion_delta {
                break;
            }
        }
        Ok((codebook, history))
    }

    /// Nearest codeword of every training vector.
    fn assign(&self, set: &[Vec<f64>], codebook: &CodeBook) -> Vec<usize> {
        set.par_iter()
            .map(|x| codebook.nearest_unchecked(x, self.metric).map_or(0, |(i, _)| i))
            .collect()
    }

    /// Per-cluster sums, counts and total distortion, reduced in chunk
    /// order.
    fn accumulate(&self, set: &[Vec<f64>], codebook: &CodeBook) -> Accumulator {
        let (k, dim) = (codebook.len(), codebook.dim());
        set.par_chunks(CHUNK_SIZE)
            .map(|chunk| {
                let mut acc = Accumulator::new(k, dim);
                for x in chunk {
                    if let Some((i, d)) = codebook.nearest_unchecked(x, self.metric) {
                        acc.sums[i].iter_mut().zip(x).for_each(|(s, v)| *s += v);
                        acc.counts[i] += 1;
                        acc.distortion += d;
                    }
                }
                acc
            })
            .collect::<Vec<_>>()
            .into_iter()
            .fold(Accumulator::new(k, dim), Accumulator::merge)
    }
}

/// Validates the training set and returns its dimension.
fn check_training_set(set: &[Vec<f64>]) -> Result<usize, VqError> {
    let dim = set.first().ok_or(VqError::EmptyTrainingSet)?.len();
    if dim == 0 {
        return Err(VqError::InvalidSize(0));
    }
    if let Some(bad) = set.iter().find(|x| x.len() != dim) {
        return Err(VqError::DimensionMismatch {
            expected: dim,
            got: bad.len(),
        });
    }
    Ok(dim)
}

fn mean(set: &[Vec<f64>], dim: usize) -> Vec<f64> {
    let mut m = vec![0.0; dim];
    for x in set {
        m.iter_mut().zip(x).for_each(|(a, b)| *a += b);
    }
    m.iter_mut().for_each(|a| *a /= set.len() as f64);
    m
}

/// The two members farthest apart, or `None` if there are fewer than two
/// or all of them coincide. Ties keep the first pair found.
fn farthest_pair(set: &[Vec<f64>], members: &[usize], metric: DistanceMetric) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (k, &i) in members.iter().enumerate() {
        for &j in &members[k + 1..] {
            let d = metric.distance_unchecked(&set[i], &set[j]);
            if best.is_none_or(|(_, _, b)| d > b) {
                best = Some((i, j, d));
            }
        }
    }
    best.filter(|&(_, _, d)| d > 0.0).map(|(i, j, _)| (i, j))
}

/// `c - c * u * JITTER` and `c + c * u * JITTER` with a fresh uniform `u`
/// per component.
fn jitter<R: Rng + ?Sized>(parent: &[f64], rng: &mut R) -> [Vec<f64>; 2] {
    let mut lo = Vec::with_capacity(parent.len());
    let mut hi = Vec::with_capacity(parent.len());
    for &c in parent {
        lo.push(c - c * rng.random::<f64>() * JITTER);
        hi.push(c + c * rng.random::<f64>() * JITTER);
    }
    [lo, hi]
}

/// Derives an independent seed for one codeword of one stage.
fn task_seed(root: u64, stage: u64, index: u64) -> u64 {
    root ^ stage.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ index.wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTERS: [(f64, f64); 4] = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)];

    /// Four well separated 2-D blobs of 25 points each, along a line.
    fn blobs() -> Vec<Vec<f64>> {
        let centers = CENTERS;
        let mut rng = StdRng::seed_from_u64(3);
        let mut set = Vec::new();
        for (cx, cy) in centers {
            for _ in 0..25 {
                set.push(vec![
                    cx + rng.random_range(-0.5..=0.5),
                    cy + rng.random_range(-0.5..=0.5),
                ]);
            }
        }
        set
    }

    fn trainer() -> LbgTrainer {
        LbgTrainer::new(LbgConfig::default(), DistanceMetric::Euclidean)
    }

    #[test]
    fn finds_four_blobs() {
        let set = blobs();
        let (cb, report) = trainer().train(&set, 4, &CancelToken::new()).unwrap();
        assert_eq!(cb.len(), 4);
        assert_eq!(report.final_size, 4);
        for (cx, cy) in CENTERS {
            let c = cb.quantize(&[cx, cy], DistanceMetric::Euclidean).unwrap();
            assert!((c[0] - cx).abs() < 0.5 && (c[1] - cy).abs() < 0.5, "{c:?}");
        }
        assert!(report.final_distortion().unwrap() < 0.5);
    }

    #[test]
    fn stage_sizes_are_powers_of_two_within_target() {
        let set = blobs();
        for target in [1, 2, 8, 16] {
            let (cb, report) = trainer().train(&set, target, &CancelToken::new()).unwrap();
            assert!(cb.len() <= target, "target {target}: {} codewords", cb.len());
            for (i, stage) in report.stages.iter().enumerate() {
                assert_eq!(stage.size, 1 << i);
                assert!(stage.size <= target);
            }
            assert!(cb.usage(&set, DistanceMetric::Euclidean).unwrap().iter().all(|&n| n > 0));
        }
    }

    #[test]
    fn non_power_of_two_target_rounds_up() {
        let set = blobs();
        let (_, report) = trainer().train(&set, 3, &CancelToken::new()).unwrap();
        assert_eq!(report.stages.last().unwrap().size, 4);
    }

    #[test]
    fn kmeans_distortion_never_increases() {
        let set = blobs();
        let cfg = LbgConfig {
            distortion_delta: 0.0,
            max_iterations: 20,
            ..Default::default()
        };
        let (_, report) = LbgTrainer::new(cfg, DistanceMetric::Euclidean)
            .train(&set, 8, &CancelToken::new())
            .unwrap();
        for stage in &report.stages {
            for w in stage.distortions.windows(2) {
                assert!(w[1] <= w[0] + 1e-9, "stage {}: {:?}", stage.size, stage.distortions);
            }
        }
    }

    #[test]
    fn training_is_deterministic() {
        let set = blobs();
        let a = trainer().train(&set, 16, &CancelToken::new()).unwrap();
        let b = trainer().train(&set, 16, &CancelToken::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_vectors_split_by_jitter_then_cleared() {
        let set = vec![vec![2.0, 4.0]; 10];
        let (cb, report) = trainer().train(&set, 4, &CancelToken::new()).unwrap();
        assert_eq!(cb.len(), 1);
        assert_eq!(report.dropped, 3);
        assert_eq!(cb.codewords()[0], vec![2.0, 4.0]);
    }

    #[test]
    fn jitter_brackets_parent() {
        let mut rng = StdRng::seed_from_u64(1);
        let [lo, hi] = jitter(&[10.0, -10.0, 0.0], &mut rng);
        assert!(lo[0] <= 10.0 && lo[0] >= 9.0);
        assert!(hi[0] >= 10.0 && hi[0] <= 11.0);
        assert!(lo[1] >= -10.0 && hi[1] <= -10.0);
        assert_eq!(lo[2], 0.0);
    }

    #[test]
    fn rejects_bad_input() {
        let t = trainer();
        let c = CancelToken::new();
        assert!(matches!(t.train(&[], 4, &c), Err(VqError::EmptyTrainingSet)));
        assert!(matches!(
            t.train(&[vec![1.0], vec![1.0, 2.0]], 4, &c),
            Err(VqError::DimensionMismatch { expected: 1, got: 2 })
        ));
        assert!(matches!(t.train(&[vec![1.0]], 0, &c), Err(VqError::InvalidSize(0))));
    }

    #[test]
    fn cancelled_before_start() {
        let c = CancelToken::new();
        c.cancel();
        assert!(matches!(trainer().train(&blobs(), 4, &c), Err(VqError::Cancelled)));
    }

    #[test]
    fn cancelled_during_training() {
        // Thousands of K-means steps over a few thousand vectors: far longer
        // than the delay before the token fires.
        let mut rng = StdRng::seed_from_u64(5);
        let set: Vec<Vec<f64>> = (0..4000)
            .map(|_| (0..4).map(|_| rng.random_range(-1.0..1.0)).collect())
            .collect();
        let cfg = LbgConfig {
            distortion_delta: 0.0,
            max_iterations: 10_000,
            ..Default::default()
        };
        let trainer = LbgTrainer::new(cfg, DistanceMetric::Euclidean);
        let cancel = CancelToken::new();

        let result = std::thread::scope(|s| {
            let token = cancel.clone();
            s.spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(50));
                token.cancel();
            });
            trainer.train(&set, 1024, &cancel)
        });
        assert!(matches!(result, Err(VqError::Cancelled)));
    }
}
