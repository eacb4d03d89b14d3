//! Recombination operators producing one child path from two parent paths.
//!
//! Both operators work on closed paths (`n + 1` elements, last equal to first)
//! and never read the closing element: the child's closing element is always
//! rederived from its first slot.

use crate::error::{Result, TspError};
use crate::graph::NodeId;
use crate::tour::PathBuilder;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Crossover operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossoverType {
    /// Order Crossover (OX)
    OrderCrossover,
    /// Cycle Crossover (CX)
    CycleCrossover,
}

impl CrossoverType {
    pub const ALL: [CrossoverType; 2] = [CrossoverType::OrderCrossover, CrossoverType::CycleCrossover];

    pub fn name(&self) -> &'static str {
        match self {
            CrossoverType::OrderCrossover => "Order-Crossover",
            CrossoverType::CycleCrossover => "Cycle-Crossover",
        }
    }
}

impl TryFrom<usize> for CrossoverType {
    type Error = TspError;

    fn try_from(selector: usize) -> Result<Self> {
        match selector {
            0 => Ok(CrossoverType::OrderCrossover),
            1 => Ok(CrossoverType::CycleCrossover),
            other => Err(TspError::InvalidConfiguration(format!(
                "crossover selector must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CrossoverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Length of the segment order crossover copies from the first parent.
///
/// Half of the closed path length `n + 1`, rounded down.
pub fn order_segment_len(n: usize) -> usize {
    (n + 1) / 2
}

/// Valid segment starts for order crossover over `n` nodes.
///
/// The segment plus one guard element must fit before the closing element,
/// so the last open position is never copied from the first parent.
pub fn order_start_range(n: usize) -> Option<Range<usize>> {
    let end = n.checked_sub(order_segment_len(n))?;
    (end > 0).then_some(0..end)
}

/// Valid starting indices for cycle crossover over `n` nodes
pub fn cycle_start_range(n: usize) -> Option<Range<usize>> {
    (n > 0).then_some(0..n)
}

fn open_len(parent1: &[NodeId], parent2: &[NodeId]) -> Result<usize> {
    if parent1.len() != parent2.len() {
        return Err(TspError::LengthMismatch {
            left: parent1.len(),
            right: parent2.len(),
        });
    }
    parent1
        .len()
        .checked_sub(1)
        .ok_or_else(|| TspError::InvalidPath("cannot recombine empty paths".to_string()))
}

fn check_start(start: usize, range: Option<Range<usize>>) -> Result<()> {
    match range {
        Some(r) if r.contains(&start) => Ok(()),
        r => Err(TspError::InvalidConfiguration(format!(
            "crossover start {} outside valid range {:?}",
            start, r
        ))),
    }
}

pub(crate) fn order_crossover<R: Rng + ?Sized>(
    parent1: &[NodeId],
    parent2: &[NodeId],
    rng: &mut R,
) -> Result<PathBuilder> {
    let n = open_len(parent1, parent2)?;
    match order_start_range(n) {
        Some(range) => order_fill(parent1, parent2, rng.gen_range(range)),
        None => Ok(PathBuilder::from_closed_path(parent1)),
    }
}

pub(crate) fn cycle_crossover<R: Rng + ?Sized>(
    parent1: &[NodeId],
    parent2: &[NodeId],
    rng: &mut R,
) -> Result<PathBuilder> {
    let n = open_len(parent1, parent2)?;
    match cycle_start_range(n) {
        Some(range) => cycle_fill(parent1, parent2, rng.gen_range(range)),
        None => Ok(PathBuilder::from_closed_path(parent1)),
    }
}

/// Order crossover with an explicit segment start.
///
/// Returns the closed child path.
pub fn order_crossover_at(parent1: &[NodeId], parent2: &[NodeId], start: usize) -> Result<Vec<NodeId>> {
    let n = open_len(parent1, parent2)?;
    check_start(start, order_start_range(n))?;
    order_fill(parent1, parent2, start)?.into_path()
}

/// Cycle crossover with an explicit starting index.
///
/// Returns the closed child path.
pub fn cycle_crossover_at(parent1: &[NodeId], parent2: &[NodeId], start: usize) -> Result<Vec<NodeId>> {
    let n = open_len(parent1, parent2)?;
    check_start(start, cycle_start_range(n))?;
    cycle_fill(parent1, parent2, start)?.into_path()
}

fn order_fill(parent1: &[NodeId], parent2: &[NodeId], start: usize) -> Result<PathBuilder> {
    let n = parent1.len() - 1;
    let end = start + order_segment_len(n);
    let mut child = PathBuilder::vacant(n);

    for i in start..end {
        child.set(i, parent1[i]);
    }
    let segment: HashSet<NodeId> = parent1[start..end].iter().copied().collect();

    let vacant: Vec<usize> = (0..n).filter(|&i| child.is_vacant(i)).collect();
    let donors = parent2[..n].iter().copied().filter(|node| !segment.contains(node));
    for (slot, node) in vacant.into_iter().zip(donors) {
        child.set(slot, node);
    }

    child.close();
    Ok(child)
}

fn cycle_fill(parent1: &[NodeId], parent2: &[NodeId], start: usize) -> Result<PathBuilder> {
    let n = parent1.len() - 1;
    let position_in_p1: HashMap<NodeId, usize> =
        parent1[..n].iter().enumerate().map(|(i, &node)| (node, i)).collect();

    let mut child = PathBuilder::vacant(n);
    let mut in_cycle = vec![false; n];
    let mut index = start;

    while !in_cycle[index] {
        in_cycle[index] = true;
        let node = parent2[index];
        child.set(index, node);
        index = *position_in_p1.get(&node).ok_or_else(|| {
            TspError::InvalidPath(format!("node {} of the second parent is missing from the first", node))
        })?;
    }

    for i in 0..n {
        if child.is_vacant(i) {
            child.set(i, parent1[i]);
        }
    }

    child.close();
    Ok(child)
}
