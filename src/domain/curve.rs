//! # Breakpoint Tables
//!
//! Thermal derating, capacity and open-circuit-voltage curves are all step
//! functions of a single input. Each one is stored as an ordered list of
//! upper edges, evaluated low-to-high by one lookup, so every input value
//! falls into exactly one band.

/// Upper edge of a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    /// Band covers inputs strictly below the value.
    Below(f64),
    /// Band covers inputs up to and including the value.
    UpTo(f64),
}

impl Edge {
    fn contains(&self, input: f64) -> bool {
        match *self {
            Edge::Below(limit) => input < limit,
            Edge::UpTo(limit) => input <= limit,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            Edge::Below(limit) | Edge::UpTo(limit) => limit,
        }
    }
}

/// A monotone step curve: the first band whose edge contains the input wins,
/// anything past the last edge maps to `beyond`.
#[derive(Debug, Clone, Copy)]
pub struct StepCurve {
    bands: &'static [(Edge, f64)],
    beyond: f64,
}

impl StepCurve {
    pub const fn new(bands: &'static [(Edge, f64)], beyond: f64) -> Self {
        Self { bands, beyond }
    }

    /// Multiplier for `input`. NaN falls through to `beyond`.
    pub fn lookup(&self, input: f64) -> f64 {
        self.bands
            .iter()
            .find(|(edge, _)| edge.contains(input))
            .map(|(_, factor)| *factor)
            .unwrap_or(self.beyond)
    }

    pub fn bands(&self) -> &'static [(Edge, f64)] {
        self.bands
    }

    pub fn beyond(&self) -> f64 {
        self.beyond
    }
}

/// Clamp that tolerates an inverted range: the ceiling wins when
/// `floor > ceiling`, where `f64::clamp` would panic.
pub fn clamp_between(value: f64, floor: f64, ceiling: f64) -> f64 {
    value.max(floor).min(ceiling)
}
