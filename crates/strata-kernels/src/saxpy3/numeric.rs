//! Numeric phase: compute the values of C into the final pattern

use super::factory::{KernelRunner, SaxpyKernel};
use super::symbolic::scatter_coarse;
use super::tasks::{TaskList, TaskRange};
use super::workspace::{CoarseWorkspace, Probe, TeamWorkspace, Workspaces};
use super::Context;
use crate::error::Result;
use crate::utility::util::{i64_to_usize, split_ranges_mut, usize_to_i64};
use core::ops::Range;
use rayon::prelude::*;
use strata_core::Scalar;

/// Everything the numeric phase writes to or reads from, ready to run with
/// whichever kernel the factory picks.
pub(crate) struct NumericPhase<'r, 'c, T> {
    pub ctx: &'r Context<'c, T>,
    pub tasks: &'r TaskList,
    pub ws: &'r mut Workspaces<T>,
    /// Column pointers of C, one per vector of B plus one.
    pub cp: &'r [i64],
    pub ci: &'r mut [i64],
    /// `None` computes the pattern only.
    pub cx: Option<&'r mut [T]>,
}

impl<T: Scalar> KernelRunner<T> for NumericPhase<'_, '_, T> {
    type Output = Result<()>;

    fn run<K: SaxpyKernel<T>>(self, kernel: &K) -> Result<()> {
        numeric(self, kernel)
    }
}

#[derive(Clone, Copy)]
enum Owner {
    Coarse,
    Team,
}

type OutputSlice<'s, T> = (&'s mut [i64], Option<&'s mut [T]>);

fn coarse_numeric<T: Scalar, K: SaxpyKernel<T>>(
    ctx: &Context<'_, T>,
    ws: &mut CoarseWorkspace<T>,
    cols: Range<usize>,
    cp: &[i64],
    (ci, mut cx): OutputSlice<'_, T>,
    kernel: &K,
) -> Result<()> {
    let (a, b) = (ctx.a, ctx.b);
    let terminal = kernel.terminal();
    let any = kernel.is_any();
    let base = cp[cols.start];
    for kk in cols {
        let start = i64_to_usize(cp[kk] - base);
        let end = i64_to_usize(cp[kk + 1] - base);
        if start == end {
            continue;
        }
        let j = b.vector_index(kk);
        let marks = ws.begin_column();
        let restricts = scatter_coarse(&ctx.mask, ws, j, marks);
        ws.reserve_column(end - start)?;
        for pb in b.vector_range(kk) {
            if !b.is_present(pb) {
                continue;
            }
            let bkj = b.value_at(pb);
            for pa in a.lookup(b.row_at(pb)) {
                if !a.is_present(pa) {
                    continue;
                }
                let i = a.row_at(pa);
                if ctx.blocked_in_place(i, j) {
                    continue;
                }
                match ws.probe(i, marks) {
                    Probe::Found { slot, mark } if mark == marks.in_c => {
                        if any {
                            continue;
                        }
                        let old = ws.value(slot);
                        if terminal == Some(old) {
                            continue;
                        }
                        let t = kernel.multiply(a.value_at(pa), bkj);
                        ws.set_value(slot, kernel.combine(old, t));
                    }
                    Probe::Found { slot, .. } => {
                        if restricts {
                            ws.insert(slot, i, kernel.multiply(a.value_at(pa), bkj), marks);
                        }
                    }
                    Probe::Vacant(slot) => {
                        if !restricts {
                            ws.insert(slot, i, kernel.multiply(a.value_at(pa), bkj), marks);
                        }
                    }
                }
            }
        }
        ws.drain_column(&mut ci[start..end], cx.as_deref_mut().map(|x| &mut x[start..end]));
    }
    Ok(())
}

fn fine_numeric<T: Scalar, K: SaxpyKernel<T>>(
    ctx: &Context<'_, T>,
    ws: &TeamWorkspace,
    kk: usize,
    entries: Range<usize>,
    kernel: &K,
) {
    let (a, b) = (ctx.a, ctx.b);
    let j = b.vector_index(kk);
    let terminal = kernel.terminal();
    for pb in entries {
        if !b.is_present(pb) {
            continue;
        }
        let bkj = b.value_at(pb);
        for pa in a.lookup(b.row_at(pb)) {
            if !a.is_present(pa) {
                continue;
            }
            let i = a.row_at(pa);
            if ctx.blocked_in_place(i, j) {
                continue;
            }
            if let Some(slot) = ws.find(i) {
                let t = kernel.multiply(a.value_at(pa), bkj);
                ws.fold(slot, t, terminal, |x, y| kernel.combine(x, y));
            }
        }
    }
}

/// Fill `ci`/`cx` using the pattern counted by the symbolic phase. Without
/// `cx` only the row indices are written.
///
/// Each coarse task writes its own columns; each team folds into its shared
/// workspace and is gathered once every member is done. Rows come out
/// sorted within every column.
pub(crate) fn numeric<T: Scalar, K: SaxpyKernel<T>>(
    phase: NumericPhase<'_, '_, T>,
    kernel: &K,
) -> Result<()> {
    let NumericPhase {
        ctx,
        tasks,
        ws,
        cp,
        ci,
        cx,
    } = phase;
    let Workspaces { coarse, teams } = ws;
    let teams: &[TeamWorkspace] = teams;

    let coarse_cols: Vec<Range<usize>> =
        tasks.coarse().iter().filter_map(|t| t.columns()).collect();
    let mut segments: Vec<(Range<usize>, Owner)> = coarse_cols
        .iter()
        .map(|cols| (cols.clone(), Owner::Coarse))
        .chain(tasks.teams.iter().map(|t| (t.kk..t.kk + 1, Owner::Team)))
        .collect();
    segments.sort_unstable_by_key(|(cols, _)| cols.start);
    let out_ranges: Vec<Range<usize>> = segments
        .iter()
        .map(|(cols, _)| i64_to_usize(cp[cols.start])..i64_to_usize(cp[cols.end]))
        .collect();

    let mut coarse_out: Vec<OutputSlice<'_, T>> = Vec::with_capacity(coarse_cols.len());
    let mut team_out: Vec<OutputSlice<'_, T>> = Vec::with_capacity(tasks.teams.len());
    let value_parts: Vec<Option<&mut [T]>> = match cx {
        Some(cx) => split_ranges_mut(cx, &out_ranges).into_iter().map(Some).collect(),
        None => out_ranges.iter().map(|_| None).collect(),
    };
    let parts = split_ranges_mut(ci, &out_ranges).into_iter().zip(value_parts);
    for ((_, owner), part) in segments.iter().zip(parts) {
        match owner {
            Owner::Coarse => coarse_out.push(part),
            Owner::Team => team_out.push(part),
        }
    }

    let (coarse_done, ()) = rayon::join(
        || {
            coarse
                .par_iter_mut()
                .zip(coarse_out.into_par_iter())
                .zip(coarse_cols.par_iter())
                .try_for_each(|((cw, out), cols)| {
                    coarse_numeric(ctx, cw, cols.clone(), cp, out, kernel)
                })
        },
        || {
            tasks.fine().par_iter().for_each(|task| {
                if let TaskRange::Fine {
                    kk,
                    pstart,
                    pend,
                    team,
                } = task.range
                {
                    fine_numeric(ctx, &teams[team], kk, pstart..pend, kernel);
                }
            });
        },
    );
    coarse_done?;

    teams
        .par_iter()
        .zip(team_out.into_par_iter())
        .try_for_each(|(tw, (ci, cx))| {
            let entries: Vec<(usize, T)> = tw.gather(ci.len())?;
            debug_assert_eq!(entries.len(), ci.len());
            for (dst, &(i, _)) in ci.iter_mut().zip(&entries) {
                *dst = usize_to_i64(i);
            }
            if let Some(cx) = cx {
                for (dst, &(_, v)) in cx.iter_mut().zip(&entries) {
                    *dst = v;
                }
            }
            Ok(())
        })
}
