//! Coordinate paths: dot-separated vertex addresses such as `"0.3"`.
//!
//! For a LineString or MultiPoint the single index is the vertex. For a
//! Polygon or MultiLineString the first index selects the ring or child and
//! the second the vertex within it. Multi-geometries peel off the leading
//! index to pick a child and hand the tail down.

use crate::error::DrawError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use winnow::ascii::digit1;
use winnow::combinator::separated;
use winnow::prelude::*;

#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordPath(SmallVec<[usize; 3]>);

impl CoordPath {
    /// The empty path. Points accept it; every other geometry ignores it.
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    pub fn new(indices: &[usize]) -> Self {
        Self(SmallVec::from_slice(indices))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, depth: usize) -> Option<usize> {
        self.0.get(depth).copied()
    }

    /// Leading index and the remaining tail.
    pub fn split_first(&self) -> Option<(usize, CoordPath)> {
        let (&head, tail) = self.0.split_first()?;
        Some((head, CoordPath::new(tail)))
    }

    /// Extend this path by one level.
    pub fn child(&self, index: usize) -> CoordPath {
        let mut next = self.0.clone();
        next.push(index);
        CoordPath(next)
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────

fn parse_index(input: &mut &str) -> ModalResult<usize> {
    digit1.try_map(|s: &str| s.parse::<usize>()).parse_next(input)
}

fn parse_indices(input: &mut &str) -> ModalResult<Vec<usize>> {
    separated(1.., parse_index, '.').parse_next(input)
}

impl FromStr for CoordPath {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(CoordPath::root());
        }
        parse_indices
            .parse(s)
            .map(|v| CoordPath(SmallVec::from_vec(v)))
            .map_err(|_| DrawError::InvalidCoordPath(s.to_string()))
    }
}

impl fmt::Display for CoordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{idx}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CoordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoordPath({self})")
    }
}

impl Serialize for CoordPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CoordPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
