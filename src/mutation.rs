//! Mutation operators perturbing the order of a single path.
//!
//! Every random draw has its valid range expressed as a pure function of the
//! number of nodes `n` and the previous draws. A range is `None` when it would
//! be empty, in which case the mutation leaves the path unchanged. All moves
//! stay inside the open path `[0, n)`.

use crate::error::{Result, TspError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Mutation operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationType {
    /// Reverse a random segment of at least three nodes
    Invert,
    /// Swap two adjacent nodes
    Switch,
    /// Move a random block further down the path
    Shift,
}

impl MutationType {
    pub const ALL: [MutationType; 3] = [MutationType::Invert, MutationType::Switch, MutationType::Shift];

    pub fn name(&self) -> &'static str {
        match self {
            MutationType::Invert => "Invert",
            MutationType::Switch => "Switch",
            MutationType::Shift => "Shift",
        }
    }

    /// Draw a concrete move for a path over `n` nodes
    pub fn draw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Option<MutationMove> {
        match self {
            MutationType::Invert => {
                let len = rng.gen_range(invert_length_range(n)?);
                let start = rng.gen_range(invert_start_range(n, len)?);
                Some(MutationMove::Invert { start, len })
            }
            MutationType::Switch => {
                let index = rng.gen_range(switch_index_range(n)?);
                Some(MutationMove::Switch { index })
            }
            MutationType::Shift => {
                let block = rng.gen_range(shift_block_range(n)?);
                let start = rng.gen_range(shift_start_range(n, block)?);
                let distance = rng.gen_range(shift_distance_range(n, block, start)?);
                Some(MutationMove::Shift { start, block, distance })
            }
        }
    }
}

impl TryFrom<usize> for MutationType {
    type Error = TspError;

    fn try_from(selector: usize) -> Result<Self> {
        match selector {
            0 => Ok(MutationType::Invert),
            1 => Ok(MutationType::Switch),
            2 => Ok(MutationType::Shift),
            other => Err(TspError::InvalidConfiguration(format!(
                "mutation selector must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MutationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Segment lengths for inversion: `3..=n`
pub fn invert_length_range(n: usize) -> Option<Range<usize>> {
    (n >= 3).then_some(3..n + 1)
}

/// Segment starts for an inversion of `len` nodes: `0..=n-len`
pub fn invert_start_range(n: usize, len: usize) -> Option<Range<usize>> {
    (len > 0 && len <= n).then(|| 0..n - len + 1)
}

/// Indices whose successor can be swapped with them: `0..n-1`
pub fn switch_index_range(n: usize) -> Option<Range<usize>> {
    (n >= 2).then(|| 0..n - 1)
}

/// Block sizes for shifting: `1..=n-2`
pub fn shift_block_range(n: usize) -> Option<Range<usize>> {
    (n >= 3).then(|| 1..n - 1)
}

/// Block starts leaving room for a shift of at least one position
pub fn shift_start_range(n: usize, block: usize) -> Option<Range<usize>> {
    let end = n.checked_sub(block)?;
    (block > 0 && end > 0).then_some(0..end)
}

/// Shift distances keeping block and shifted elements inside the open path
pub fn shift_distance_range(n: usize, block: usize, start: usize) -> Option<Range<usize>> {
    let max = n.checked_sub(block + start)?;
    (max >= 1).then(|| 1..max + 1)
}

/// A concrete mutation move on an open path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMove {
    /// Reverse `path[start..start + len]`
    Invert { start: usize, len: usize },
    /// Swap `path[index]` and `path[index + 1]`
    Switch { index: usize },
    /// Rotate `path[start..start + block + distance]` left by `block`
    Shift { start: usize, block: usize, distance: usize },
}

impl MutationMove {
    pub fn apply<T>(&self, path: &mut [T]) {
        match *self {
            MutationMove::Invert { start, len } => path[start..start + len].reverse(),
            MutationMove::Switch { index } => path.swap(index, index + 1),
            MutationMove::Shift { start, block, distance } => {
                path[start..start + block + distance].rotate_left(block)
            }
        }
    }
}

/// Draw and apply a mutation to the open path, leaving it unchanged when
/// the path is too short for the operator
pub(crate) fn apply<T, R: Rng + ?Sized>(mutation_type: MutationType, open_path: &mut [T], rng: &mut R) {
    if let Some(mv) = mutation_type.draw(open_path.len(), rng) {
        log::trace!("{} mutation: {:?}", mutation_type, mv);
        mv.apply(open_path);
    }
}
