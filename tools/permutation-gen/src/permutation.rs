//! Cartesian-product enumeration of an option space and requirement filtering.

use std::fmt;

use crate::config::OptionSpace;
use crate::requirement::Requirement;

/// One value chosen for every axis of an option space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation<'a> {
    space: &'a OptionSpace,
    /// Index into each axis's value list, in axis declaration order
    indices: Vec<usize>,
}

impl<'a> Permutation<'a> {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Value chosen for the named axis.
    pub fn value(&self, axis: &str) -> Option<&'a str> {
        let index = self.space.axis_index(axis)?;
        Some(self.space.axes()[index].values[self.indices[index]].as_str())
    }

    /// `(axis, value)` pairs in axis declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        let space = self.space;
        space
            .axes()
            .iter()
            .zip(&self.indices)
            .map(|(axis, &i)| (axis.name.as_str(), axis.values[i].as_str()))
    }

    /// `_`-joined `axis+value` pairs, e.g. `A1_Bx`. Suffix not included.
    pub fn output_name(&self) -> String {
        self.iter()
            .map(|(axis, value)| format!("{axis}{value}"))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// `(A=1, B=x)`
impl fmt::Display for Permutation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (axis, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{axis}={value}")?;
        }
        write!(f, ")")
    }
}

/// Lazy enumeration of every candidate permutation.
///
/// Nested-loop order: the first declared axis is the most significant digit,
/// the last declared axis changes fastest.
pub struct Permutations<'a> {
    space: &'a OptionSpace,
    next: Option<Vec<usize>>,
    remaining: usize,
}

impl<'a> Permutations<'a> {
    pub fn new(space: &'a OptionSpace) -> Self {
        let remaining = space.candidate_count();
        Self {
            space,
            next: (remaining > 0).then(|| vec![0; space.axes().len()]),
            remaining,
        }
    }
}

impl<'a> Iterator for Permutations<'a> {
    type Item = Permutation<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.remaining = self.remaining.saturating_sub(1);

        // Odometer increment, last axis first
        let mut successor = current.clone();
        let axes = self.space.axes();
        for position in (0..successor.len()).rev() {
            successor[position] += 1;
            if successor[position] < axes[position].values.len() {
                self.next = Some(successor);
                break;
            }
            successor[position] = 0;
        }

        Some(Permutation {
            space: self.space,
            indices: current,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Result of filtering an option space by its requirements.
#[derive(Debug, Clone)]
pub struct Generation<'a> {
    /// Number of candidates before filtering
    pub total: usize,
    /// Survivors, in enumeration order
    pub permutations: Vec<Permutation<'a>>,
}

/// Enumerate `space` and keep the permutations for which every requirement holds.
pub fn generate<'a>(space: &'a OptionSpace, requirements: &[Requirement]) -> Generation<'a> {
    let mut total = 0;
    let permutations = Permutations::new(space)
        .inspect(|_| total += 1)
        .filter(|permutation| satisfies_all(permutation, requirements))
        .collect();

    Generation {
        total,
        permutations,
    }
}

/// Conjunction of `requirements`; true when there are none.
pub fn satisfies_all(permutation: &Permutation<'_>, requirements: &[Requirement]) -> bool {
    requirements
        .iter()
        .all(|requirement| requirement.holds(permutation))
}
