use crate::partition::fair_partition;
use geo::Contains;
use hazard_core::{HazardError, PointHazard, RegionSet, Result, ScoreVector};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of one point-scoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct PointTally {
    /// Points per region, as a raw score vector.
    pub scores: ScoreVector,
    pub matched: u64,
    /// Points inside no region; dropped without error.
    pub unmatched: u64,
}

/// Counts building points per region on a fixed-size worker pool.
#[derive(Debug, Clone, Copy)]
pub struct PointHazardScorer {
    workers: usize,
}

/// Per-worker counts, indexed by region position in the `RegionSet`.
struct ChunkTally {
    counts: Vec<u64>,
    unmatched: u64,
}

impl PointHazardScorer {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Assigns every point to the first region (in set order) that strictly
    /// contains it.
    ///
    /// Points are split into one contiguous chunk per worker; workers share
    /// `regions` read-only and return private tallies that are summed once all
    /// of them finish. The sum is over disjoint integer tallies, so the result
    /// does not depend on chunk boundaries, worker count or completion order.
    /// Any worker error or panic fails the whole call.
    pub fn score(&self, regions: &RegionSet, points: &[PointHazard]) -> Result<PointTally> {
        let chunks = fair_partition(points.len(), self.workers);
        tracing::debug!(
            points = points.len(),
            workers = self.workers,
            chunks = chunks.len(),
            "partitioned building points"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("point-scorer-{i}"))
            .build()
            .map_err(|e| HazardError::WorkerFailure {
                worker: 0,
                reason: format!("could not start worker pool: {e}"),
            })?;

        let tallies = pool.install(|| {
            chunks
                .par_iter()
                .enumerate()
                .map(|(worker, range)| run_worker(worker, regions, &points[range.clone()]))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut counts = vec![0u64; regions.len()];
        let mut unmatched = 0u64;
        for tally in tallies {
            for (total, local) in counts.iter_mut().zip(tally.counts) {
                *total += local;
            }
            unmatched += tally.unmatched;
        }

        let matched = counts.iter().sum();
        if unmatched > 0 {
            tracing::info!(unmatched, "building points outside every region were dropped");
        }
        let scores = ScoreVector::from_pairs(
            regions
                .names()
                .zip(counts)
                .map(|(name, count)| (name, count as f64)),
        );
        Ok(PointTally {
            scores,
            matched,
            unmatched,
        })
    }
}

fn run_worker(worker: usize, regions: &RegionSet, points: &[PointHazard]) -> Result<ChunkTally> {
    panic::catch_unwind(AssertUnwindSafe(|| tally_chunk(worker, regions, points))).unwrap_or_else(
        |payload| {
            Err(HazardError::WorkerFailure {
                worker,
                reason: panic_message(payload.as_ref()),
            })
        },
    )
}

fn tally_chunk(worker: usize, regions: &RegionSet, points: &[PointHazard]) -> Result<ChunkTally> {
    let mut counts = vec![0u64; regions.len()];
    let mut unmatched = 0u64;
    for hazard in points {
        let point = hazard.point;
        if !point.x().is_finite() || !point.y().is_finite() {
            return Err(HazardError::WorkerFailure {
                worker,
                reason: format!("non-finite point ({}, {})", point.x(), point.y()),
            });
        }
        match regions.iter().position(|r| r.boundary().contains(&point)) {
            Some(i) => counts[i] += 1,
            None => unmatched += 1,
        }
    }
    Ok(ChunkTally { counts, unmatched })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".into()
    }
}
