//! Symbolic phase: count the entries of every column of C
//
// Coarse tasks own their columns and count with a private workspace. Fine
// tasks of a team race to claim rows in the shared workspace; each claim
// succeeds for exactly one member, so the team's counts add up to the
// column count without further merging.

use super::tasks::{TaskList, TaskRange};
use super::workspace::{
    ColumnMarks, CoarseWorkspace, Probe, TeamWorkspace, Workspaces, ALLOWED, BLOCKED,
};
use super::{Context, MaskMode};
use crate::error::Result;
use crate::mask::Mask;
use crate::utility::util::{split_ranges_mut, try_filled, usize_to_i64};
use core::ops::Range;
use rayon::prelude::*;
use strata_core::Scalar;

/// Scatter the rows of `M(:,j)` into a coarse workspace for the current
/// column. Returns whether the mask restricts C(:,j) to the scattered rows
/// (`true`) or excludes them (`false`, complemented mask). Without an
/// inline mask nothing is scattered and nothing is restricted.
pub(crate) fn scatter_coarse<T: Scalar>(
    mask: &MaskMode<'_>,
    ws: &mut CoarseWorkspace<T>,
    j: usize,
    marks: ColumnMarks,
) -> bool {
    let MaskMode::Inline(mask) = mask else {
        return false;
    };
    for p in mask.matrix.lookup(j) {
        if mask.slot_true(p) {
            let row = mask.matrix.row_at(p);
            if let Probe::Vacant(slot) = ws.probe(row, marks) {
                ws.occupy(slot, row, marks.mask);
            }
        }
    }
    !mask.complement
}

fn scatter_team(mask: &Mask<'_>, ws: &TeamWorkspace, j: usize) {
    let flag = if mask.complement { BLOCKED } else { ALLOWED };
    for p in mask.matrix.lookup(j) {
        if mask.slot_true(p) {
            ws.scatter(mask.matrix.row_at(p), flag);
        }
    }
}

fn coarse_symbolic<T: Scalar>(
    ctx: &Context<'_, T>,
    ws: &mut CoarseWorkspace<T>,
    cols: Range<usize>,
    counts: &mut [i64],
) {
    let (a, b) = (ctx.a, ctx.b);
    for (kk, cjnz) in cols.zip(counts.iter_mut()) {
        let j = b.vector_index(kk);
        let marks = ws.begin_column();
        let restricts = scatter_coarse(&ctx.mask, ws, j, marks);
        let mut count = 0usize;
        for pb in b.vector_range(kk) {
            if !b.is_present(pb) {
                continue;
            }
            for pa in a.lookup(b.row_at(pb)) {
                if !a.is_present(pa) {
                    continue;
                }
                let i = a.row_at(pa);
                if ctx.blocked_in_place(i, j) {
                    continue;
                }
                match ws.probe(i, marks) {
                    Probe::Found { slot, mark } => {
                        if restricts && mark == marks.mask {
                            ws.set_mark(slot, marks.in_c);
                            count += 1;
                        }
                    }
                    Probe::Vacant(slot) => {
                        if !restricts {
                            ws.occupy(slot, i, marks.in_c);
                            count += 1;
                        }
                    }
                }
            }
        }
        *cjnz = usize_to_i64(count);
    }
}

fn fine_symbolic<T: Scalar>(
    ctx: &Context<'_, T>,
    ws: &TeamWorkspace,
    kk: usize,
    entries: Range<usize>,
) -> i64 {
    let (a, b) = (ctx.a, ctx.b);
    let j = b.vector_index(kk);
    let restricts = ctx.restricts();
    let mut count = 0usize;
    for pb in entries {
        if !b.is_present(pb) {
            continue;
        }
        for pa in a.lookup(b.row_at(pb)) {
            if !a.is_present(pa) {
                continue;
            }
            let i = a.row_at(pa);
            if !ctx.blocked_in_place(i, j) && ws.claim(i, restricts) {
                count += 1;
            }
        }
    }
    usize_to_i64(count)
}

/// Count the entries of C(:,j) for every vector of B.
///
/// Team workspaces receive the inline mask first, in a pass of its own, so
/// no claim can race with a mask scatter. Coarse and fine tasks then run
/// side by side; the fine counts of each team are summed at the end.
pub(crate) fn symbolic<T: Scalar>(
    ctx: &Context<'_, T>,
    tasks: &TaskList,
    ws: &mut Workspaces<T>,
) -> Result<Vec<i64>> {
    let b = ctx.b;
    let mut cnz = try_filled(b.nvec(), 0i64, "column counts")?;
    let mut fine_counts = try_filled(tasks.nfine, 0i64, "fine task counts")?;
    let Workspaces { coarse, teams } = ws;
    let teams: &[TeamWorkspace] = teams;

    if let MaskMode::Inline(mask) = &ctx.mask {
        tasks
            .teams
            .par_iter()
            .zip(teams.par_iter())
            .for_each(|(team, tw)| scatter_team(mask, tw, b.vector_index(team.kk)));
    }

    let coarse_cols: Vec<Range<usize>> =
        tasks.coarse().iter().filter_map(|t| t.columns()).collect();
    let count_parts = split_ranges_mut(&mut cnz, &coarse_cols);

    rayon::join(
        || {
            coarse
                .par_iter_mut()
                .zip(count_parts.into_par_iter())
                .zip(coarse_cols.par_iter())
                .for_each(|((cw, counts), cols)| coarse_symbolic(ctx, cw, cols.clone(), counts));
        },
        || {
            fine_counts
                .par_iter_mut()
                .zip(tasks.fine().par_iter())
                .for_each(|(count, task)| {
                    if let TaskRange::Fine {
                        kk,
                        pstart,
                        pend,
                        team,
                    } = task.range
                    {
                        *count = fine_symbolic(ctx, &teams[team], kk, pstart..pend);
                    }
                });
        },
    );

    for team in &tasks.teams {
        cnz[team.kk] = fine_counts[team.members.clone()].iter().sum();
    }
    Ok(cnz)
}
