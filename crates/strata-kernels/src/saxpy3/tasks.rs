//! Coarse/fine task partition of the columns of B

use super::flopcount::FlopCount;
use super::hash_size::{hash_table_size, Accumulator};
use crate::config::{AxbMethod, Saxpy3Config};
use crate::error::{Result, SpgemmError};
use crate::utility::util::{as_f64, cumsum, nthreads_for, pslice, try_filled, usize_to_i64};
use core::ops::Range;
use rayon::prelude::*;
use strata_core::{Matrix, Scalar};

/// Work owned by one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskRange {
    /// Whole vectors `kfirst..klast` of B (and C).
    Coarse { kfirst: usize, klast: usize },
    /// Entries `pstart..pend` of B(:,kk), shared with the rest of `team`.
    Fine {
        kk: usize,
        pstart: usize,
        pend: usize,
        /// Index into the team list; the team's first member is its leader.
        team: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Task {
    pub range: TaskRange,
    pub acc: Accumulator,
    pub flops: i64,
}

impl Task {
    /// Vectors owned by a coarse task.
    #[inline]
    pub fn columns(&self) -> Option<Range<usize>> {
        match self.range {
            TaskRange::Coarse { kfirst, klast } => Some(kfirst..klast),
            TaskRange::Fine { .. } => None,
        }
    }
}

/// A group of fine tasks computing one column through a shared workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Team {
    pub kk: usize,
    /// Task ids of the members, starting with the leader.
    pub members: Range<usize>,
    pub acc: Accumulator,
}

/// Fine tasks first (ids `0..nfine`), then coarse tasks in column order.
#[derive(Debug, Clone, Default)]
pub(crate) struct TaskList {
    pub tasks: Vec<Task>,
    pub teams: Vec<Team>,
    pub nfine: usize,
    pub nthreads: usize,
}

impl TaskList {
    #[inline]
    pub fn fine(&self) -> &[Task] {
        &self.tasks[..self.nfine]
    }

    #[inline]
    pub fn coarse(&self) -> &[Task] {
        &self.tasks[self.nfine..]
    }

    #[inline]
    pub fn ncoarse(&self) -> usize {
        self.tasks.len() - self.nfine
    }

    /// (fine hash, fine Gustavson, coarse hash, coarse Gustavson)
    pub fn census(&self) -> (usize, usize, usize, usize) {
        let (fg, fh): (Vec<&Task>, Vec<&Task>) =
            self.fine().iter().partition(|t| t.acc.is_gustavson());
        let (cg, ch): (Vec<&Task>, Vec<&Task>) =
            self.coarse().iter().partition(|t| t.acc.is_gustavson());
        (fh.len(), fg.len(), ch.len(), cg.len())
    }
}

struct Partitioner<'a, T> {
    a: &'a Matrix<T>,
    b: &'a Matrix<T>,
    flops: &'a FlopCount,
    cvlen: usize,
    method: AxbMethod,
    config: &'a Saxpy3Config,
    fine: Vec<Task>,
    coarse: Vec<Task>,
    teams: Vec<Team>,
}

impl<T: Scalar> Partitioner<'_, T> {
    fn coarse_task(&mut self, kfirst: usize, klast: usize) {
        let bflops = &self.flops.bflops;
        let flmax = (kfirst..klast)
            .into_par_iter()
            .map(|kk| bflops[kk + 1] - bflops[kk])
            .max()
            .unwrap_or(1)
            .max(1);
        self.coarse.push(Task {
            range: TaskRange::Coarse { kfirst, klast },
            acc: hash_table_size(flmax, self.cvlen, self.method, self.config.gustavson_divisor),
            flops: bflops[klast] - bflops[kfirst],
        });
    }

    fn fine_team(&mut self, kk: usize, team_size: usize) -> Result<()> {
        let (a, b) = (self.a, self.b);
        let range = b.vector_range(kk);
        let mut entry_flops = try_filled(range.len(), 0i64, "fine task flops")?;
        entry_flops
            .par_iter_mut()
            .zip(range.clone().into_par_iter())
            .for_each(|(fl, pb)| {
                if b.is_present(pb) {
                    *fl = usize_to_i64(a.lookup(b.row_at(pb)).len());
                }
            });
        let cum = cumsum(&entry_flops, "fine task flops")?;
        let slice = pslice(&cum, team_size);

        // one workspace for the whole column, sized from the column's flops
        let acc = hash_table_size(
            self.flops.vector(kk),
            self.cvlen,
            self.method,
            self.config.gustavson_divisor,
        );
        let team = self.teams.len();
        let leader = self.fine.len();
        for w in slice.windows(2) {
            self.fine.push(Task {
                range: TaskRange::Fine {
                    kk,
                    pstart: range.start + w[0],
                    pend: range.start + w[1],
                    team,
                },
                acc,
                flops: cum[w[1]] - cum[w[0]],
            });
        }
        self.teams.push(Team {
            kk,
            members: leader..self.fine.len(),
            acc,
        });
        Ok(())
    }
}

/// Split the vectors of B into coarse and fine tasks.
///
/// # Algorithm
/// 1. `nthreads = clamp(total / chunk, 1, nthreads_max)`; one initial range
///    for a single thread, `tasks_per_thread * nthreads` otherwise.
/// 2. Slice the flop prefix sum into initial ranges of equal cost.
/// 3. A range costing more than `2 * costly * target` is scanned for costly
///    vectors (more than `costly * target` flops and more than one entry in
///    B). Each one becomes a team of `ceil(flops / target_fine)` fine tasks;
///    the vectors between them form coarse tasks. Empty ranges are dropped.
/// 4. With a single initial range, B with one vector gets one fine task and
///    anything else one coarse task.
pub(crate) fn partition<T: Scalar>(
    flops: &FlopCount,
    a: &Matrix<T>,
    b: &Matrix<T>,
    cvlen: usize,
    method: AxbMethod,
    config: &Saxpy3Config,
    nthreads_max: usize,
) -> Result<TaskList> {
    let bnvec = b.nvec();
    let total = flops.total();
    let chunk = config.chunk.max(1.0);
    let nthreads = nthreads_for(as_f64(total), chunk, nthreads_max);
    let ntasks_initial = if nthreads == 1 {
        1
    } else {
        config.tasks_per_thread.max(1) * nthreads
    };

    #[allow(clippy::cast_precision_loss)]
    let target_task_size = (as_f64(total) / ntasks_initial as f64).max(chunk);
    let target_fine_size = (target_task_size / config.fine_work.max(1.0)).max(chunk);

    let mut p = Partitioner {
        a,
        b,
        flops,
        cvlen,
        method,
        config,
        fine: Vec::new(),
        coarse: Vec::new(),
        teams: Vec::new(),
    };

    if bnvec == 0 {
        // nothing to compute
    } else if ntasks_initial > 1 {
        let coarse_initial = pslice(&flops.bflops, ntasks_initial);
        for w in coarse_initial.windows(2) {
            let (kfirst, klast) = (w[0], w[1]);
            if kfirst == klast {
                continue;
            }
            let task_flops = as_f64(flops.bflops[klast] - flops.bflops[kfirst]);
            if task_flops > 2.0 * config.costly * target_task_size {
                let mut kcoarse_start = kfirst;
                for kk in kfirst..klast {
                    let jflops = as_f64(flops.vector(kk));
                    let bjnz = b.vector_range(kk).len();
                    if jflops > config.costly * target_task_size && bjnz > 1 {
                        if kcoarse_start < kk {
                            p.coarse_task(kcoarse_start, kk);
                        }
                        kcoarse_start = kk + 1;
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let team_size = ((jflops / target_fine_size).ceil() as usize).max(1);
                        p.fine_team(kk, team_size)?;
                    }
                }
                if kcoarse_start < klast {
                    p.coarse_task(kcoarse_start, klast);
                }
            } else {
                p.coarse_task(kfirst, klast);
            }
        }
    } else if bnvec == 1 {
        p.fine_team(0, 1)?;
    } else {
        p.coarse_task(0, bnvec);
    }

    let nfine = p.fine.len();
    let mut tasks = p.fine;
    tasks
        .try_reserve_exact(p.coarse.len())
        .map_err(|_| SpgemmError::OutOfMemory("task list"))?;
    tasks.append(&mut p.coarse);
    Ok(TaskList {
        tasks,
        teams: p.teams,
        nfine,
        nthreads,
    })
}
