//! Hash and Gustavson accumulators for coarse tasks and fine-task teams
//
// Coarse workspaces belong to one task and are reused column after column.
// A slot is live for the current column only if its mark is at least the
// column's `allowed` mark, so moving to the next column is a counter bump,
// never a clear.
//
// Team workspaces are shared by the fine tasks of one column. Each slot
// state packs `(row + 1) << 2 | flag` into one `AtomicU64`, so claiming a
// slot and learning its row is a single compare-and-swap.

use super::hash_size::Accumulator;
use super::tasks::TaskList;
use crate::error::{Result, SpgemmError};
use crate::utility::util::{hash_slot, try_filled, try_filled_with, usize_to_i64};
use std::sync::atomic::{AtomicU64, Ordering};
use strata_core::Scalar;

/// Marks identifying live slots of the current column.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnMarks {
    /// Row scattered from the mask (allowed, or blocked under a complement).
    pub mask: u64,
    /// Row present in C(:,j).
    pub in_c: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The row holds `slot` for this column, with the given mark.
    Found { slot: usize, mark: u64 },
    /// The row is absent; `slot` is where it would go.
    Vacant(usize),
}

pub(crate) struct CoarseWorkspace<T> {
    acc: Accumulator,
    marks: Vec<u64>,
    rows: Vec<usize>,
    values: Vec<T>,
    generation: u64,
    /// Slots entering C(:,j) during the current numeric column.
    touched: Vec<usize>,
    scratch: Vec<(usize, T)>,
}

impl<T: Scalar> CoarseWorkspace<T> {
    fn new(acc: Accumulator) -> Result<Self> {
        let cap = acc.capacity();
        let rows = match acc {
            Accumulator::Hash(_) => try_filled(cap, 0usize, "hash rows")?,
            Accumulator::Gustavson(_) => Vec::new(),
        };
        Ok(Self {
            acc,
            marks: try_filled(cap, 0u64, "workspace marks")?,
            rows,
            values: try_filled(cap, T::ZERO, "workspace values")?,
            generation: 0,
            touched: Vec::new(),
            scratch: Vec::new(),
        })
    }

    /// Start a new column; every slot from earlier columns becomes stale.
    #[inline]
    pub fn begin_column(&mut self) -> ColumnMarks {
        self.generation += 2;
        ColumnMarks {
            mask: self.generation - 1,
            in_c: self.generation,
        }
    }

    #[inline]
    pub fn probe(&self, row: usize, marks: ColumnMarks) -> Probe {
        match self.acc {
            Accumulator::Gustavson(_) => {
                let mark = self.marks[row];
                if mark >= marks.mask {
                    Probe::Found { slot: row, mark }
                } else {
                    Probe::Vacant(row)
                }
            }
            Accumulator::Hash(h) => {
                let mut slot = hash_slot(row, h);
                loop {
                    let mark = self.marks[slot];
                    if mark < marks.mask {
                        return Probe::Vacant(slot);
                    }
                    if self.rows[slot] == row {
                        return Probe::Found { slot, mark };
                    }
                    slot = (slot + 1) & (h - 1);
                }
            }
        }
    }

    #[inline]
    pub fn occupy(&mut self, slot: usize, row: usize, mark: u64) {
        self.marks[slot] = mark;
        if !self.rows.is_empty() {
            self.rows[slot] = row;
        }
    }

    #[inline]
    pub fn set_mark(&mut self, slot: usize, mark: u64) {
        self.marks[slot] = mark;
    }

    #[inline]
    pub fn value(&self, slot: usize) -> T {
        self.values[slot]
    }

    #[inline]
    pub fn set_value(&mut self, slot: usize, value: T) {
        self.values[slot] = value;
    }

    /// Insert `row` at `slot` as a new entry of C(:,j) holding `value`.
    #[inline]
    pub fn insert(&mut self, slot: usize, row: usize, value: T, marks: ColumnMarks) {
        self.occupy(slot, row, marks.in_c);
        self.values[slot] = value;
        self.touched.push(slot);
    }

    /// Make room for a column of `cjnz` entries.
    pub fn reserve_column(&mut self, cjnz: usize) -> Result<()> {
        self.touched.clear();
        self.scratch.clear();
        self.touched
            .try_reserve(cjnz)
            .and_then(|()| self.scratch.try_reserve(cjnz))
            .map_err(|_| SpgemmError::OutOfMemory("column gather"))
    }

    /// Write the current column into `ci`, and its values into `cx` unless
    /// only the pattern is wanted. Rows come out sorted.
    pub fn drain_column(&mut self, ci: &mut [i64], cx: Option<&mut [T]>) {
        debug_assert_eq!(self.touched.len(), ci.len());
        for &slot in &self.touched {
            let row = if self.rows.is_empty() { slot } else { self.rows[slot] };
            self.scratch.push((row, self.values[slot]));
        }
        self.scratch.sort_unstable_by_key(|&(i, _)| i);
        for (dst, &(i, _)) in ci.iter_mut().zip(&self.scratch) {
            *dst = usize_to_i64(i);
        }
        if let Some(cx) = cx {
            for (dst, &(_, v)) in cx.iter_mut().zip(&self.scratch) {
                *dst = v;
            }
        }
        self.touched.clear();
    }
}

pub(crate) const ALLOWED: u64 = 1;
pub(crate) const IN_C: u64 = 2;
pub(crate) const BLOCKED: u64 = 3;

#[inline]
const fn encode(row: usize, flag: u64) -> u64 {
    ((row as u64 + 1) << 2) | flag
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn decode_row(state: u64) -> usize {
    ((state >> 2) - 1) as usize
}

pub(crate) struct TeamWorkspace {
    acc: Accumulator,
    state: Vec<AtomicU64>,
    values: Vec<AtomicU64>,
}

impl TeamWorkspace {
    fn new(acc: Accumulator, identity_bits: u64) -> Result<Self> {
        let cap = acc.capacity();
        Ok(Self {
            acc,
            state: try_filled_with(cap, "team workspace", || AtomicU64::new(0))?,
            values: try_filled_with(cap, "team values", || AtomicU64::new(identity_bits))?,
        })
    }

    #[inline]
    fn first_slot(&self, row: usize) -> usize {
        match self.acc {
            Accumulator::Gustavson(_) => row,
            Accumulator::Hash(h) => hash_slot(row, h),
        }
    }

    #[inline]
    fn next_slot(&self, slot: usize) -> Option<usize> {
        match self.acc {
            Accumulator::Gustavson(_) => None,
            Accumulator::Hash(h) => Some((slot + 1) & (h - 1)),
        }
    }

    /// Record a mask entry before any member claims rows. Not concurrent
    /// with `claim`.
    pub fn scatter(&self, row: usize, flag: u64) {
        let mut slot = self.first_slot(row);
        loop {
            let cell = &self.state[slot];
            if cell.load(Ordering::Relaxed) == 0 {
                cell.store(encode(row, flag), Ordering::Relaxed);
                return;
            }
            match self.next_slot(slot) {
                Some(next) => slot = next,
                None => return,
            }
        }
    }

    /// Insert `row` into C(:,j). Returns true only for the member whose
    /// compare-and-swap put it there. With `mask_restricts`, rows not
    /// scattered from the mask are rejected.
    pub fn claim(&self, row: usize, mask_restricts: bool) -> bool {
        let target = encode(row, IN_C);
        let mut slot = self.first_slot(row);
        loop {
            let cell = &self.state[slot];
            let mut cur = cell.load(Ordering::Acquire);
            loop {
                if cur == 0 {
                    if mask_restricts {
                        return false;
                    }
                    match cell.compare_exchange(0, target, Ordering::AcqRel, Ordering::Acquire) {
                        Ok(_) => return true,
                        Err(actual) => {
                            cur = actual;
                            continue;
                        }
                    }
                }
                if decode_row(cur) != row {
                    break;
                }
                return match cur & 3 {
                    ALLOWED => cell
                        .compare_exchange(cur, target, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok(),
                    _ => false,
                };
            }
            match self.next_slot(slot) {
                Some(next) => slot = next,
                None => return false,
            }
        }
    }

    /// Slot of `row` if it is in C(:,j).
    pub fn find(&self, row: usize) -> Option<usize> {
        let mut slot = self.first_slot(row);
        loop {
            let cur = self.state[slot].load(Ordering::Acquire);
            if cur == 0 {
                return None;
            }
            if decode_row(cur) == row {
                return (cur & 3 == IN_C).then_some(slot);
            }
            slot = self.next_slot(slot)?;
        }
    }

    /// Fold `t` into the slot with an atomic compare-and-swap loop, leaving
    /// a slot that already holds `terminal` untouched.
    #[inline]
    pub fn fold<T: Scalar>(&self, slot: usize, t: T, terminal: Option<T>, combine: impl Fn(T, T) -> T) {
        let cell = &self.values[slot];
        let mut cur = cell.load(Ordering::Relaxed);
        loop {
            let old = T::from_bits(cur);
            if terminal == Some(old) {
                return;
            }
            let new = combine(old, t).to_bits();
            match cell.compare_exchange_weak(cur, new, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return,
                Err(actual) => cur = actual,
            }
        }
    }

    /// All `(row, value)` pairs of C(:,j), sorted by row.
    pub fn gather<T: Scalar>(&self, cjnz: usize) -> Result<Vec<(usize, T)>> {
        let mut out = Vec::new();
        out.try_reserve_exact(cjnz)
            .map_err(|_| SpgemmError::OutOfMemory("team gather"))?;
        for (state, value) in self.state.iter().zip(&self.values) {
            let cur = state.load(Ordering::Relaxed);
            if cur != 0 && cur & 3 == IN_C {
                out.push((decode_row(cur), T::from_bits(value.load(Ordering::Relaxed))));
            }
        }
        if !self.acc.is_gustavson() {
            out.sort_unstable_by_key(|&(i, _)| i);
        }
        Ok(out)
    }
}

/// One workspace per coarse task and one per fine-task team.
pub(crate) struct Workspaces<T> {
    pub coarse: Vec<CoarseWorkspace<T>>,
    pub teams: Vec<TeamWorkspace>,
}

/// Allocate every workspace up front. Team values start at the monoid
/// identity so each contribution is a plain atomic fold.
pub(crate) fn allocate<T: Scalar>(tasks: &TaskList, identity: T) -> Result<Workspaces<T>> {
    let mut coarse = Vec::new();
    coarse
        .try_reserve_exact(tasks.ncoarse())
        .map_err(|_| SpgemmError::OutOfMemory("coarse workspaces"))?;
    for task in tasks.coarse() {
        coarse.push(CoarseWorkspace::new(task.acc)?);
    }
    let mut teams = Vec::new();
    teams
        .try_reserve_exact(tasks.teams.len())
        .map_err(|_| SpgemmError::OutOfMemory("team workspaces"))?;
    for team in &tasks.teams {
        teams.push(TeamWorkspace::new(team.acc, identity.to_bits())?);
    }
    Ok(Workspaces { coarse, teams })
}
