//! 1-安全 P/T 网静态结构元素：库所、迁移、弧与标识。
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};

/// Sorted, duplicate-free set of place indices.
pub type PlaceSet = SmallVec<[PlaceId; 4]>;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct Place {
    pub name: String,
}

impl Place {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A transition with its pre-set (tokens required) and post-set (tokens
/// produced). A place may sit in both sets.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Transition {
    pub name: String,
    pub pre: PlaceSet,
    pub post: PlaceSet,
}

impl Transition {
    pub fn new(name: impl Into<String>, pre: PlaceSet, post: PlaceSet) -> Self {
        Self {
            name: name.into(),
            pre,
            post,
        }
    }

    /// Places whose next-state value is fixed by a firing: `pre ∪ post`.
    pub fn affected(&self) -> PlaceSet {
        let mut affected: PlaceSet = self.pre.iter().chain(self.post.iter()).copied().collect();
        affected.sort_unstable();
        affected.dedup();
        affected
    }

    pub fn consumes(&self, place: PlaceId) -> bool {
        self.pre.binary_search(&place).is_ok()
    }

    pub fn produces(&self, place: PlaceId) -> bool {
        self.post.binary_search(&place).is_ok()
    }

    /// An empty pre-set makes the transition enabled under every marking.
    pub fn is_always_enabled(&self) -> bool {
        self.pre.is_empty()
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArcDirection {
    PlaceToTransition,
    TransitionToPlace,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Arc {
    pub place: PlaceId,
    pub transition: TransitionId,
    pub direction: ArcDirection,
}

impl Arc {
    pub fn new(place: PlaceId, transition: TransitionId, direction: ArcDirection) -> Self {
        Self {
            place,
            transition,
            direction,
        }
    }
}

impl fmt::Debug for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            ArcDirection::PlaceToTransition => write!(f, "{:?} -> {:?}", self.place, self.transition),
            ArcDirection::TransitionToPlace => write!(f, "{:?} -> {:?}", self.transition, self.place),
        }
    }
}

/// One 0/1 entry per place index.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Marking(pub IndexVec<PlaceId, u8>);

impl Marking {
    pub fn empty(places: usize) -> Self {
        Self(IndexVec::from_vec(vec![0; places]))
    }

    /// Any non-zero entry counts as a token.
    pub fn from_bits(bits: &[u8]) -> Self {
        Self(bits.iter().map(|bit| u8::from(*bit != 0)).collect())
    }

    pub fn from_places(places: usize, marked: impl IntoIterator<Item = PlaceId>) -> Self {
        let mut bits = vec![0u8; places];
        for place in marked {
            bits[place.index()] = 1;
        }
        Self(IndexVec::from_vec(bits))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_marked(&self, place: PlaceId) -> bool {
        self.0[place] != 0
    }

    pub fn value(&self, place: PlaceId) -> u8 {
        self.0[place]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, u8)> + '_ {
        self.0.iter_enumerated().map(|(place, bit)| (place, *bit))
    }

    pub fn marked_places(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.iter()
            .filter_map(|(place, bit)| (bit != 0).then_some(place))
    }

    pub fn token_count(&self) -> usize {
        self.0.iter().filter(|bit| **bit != 0).count()
    }

    pub fn bits(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn to_bits(&self) -> Vec<u8> {
        self.0.as_slice().to_vec()
    }

    /// `Σ w[p] · M[p]`; missing weights count as zero.
    pub fn weighted_sum(&self, weights: &[i64]) -> i64 {
        self.iter()
            .filter(|(_, bit)| *bit != 0)
            .map(|(place, _)| weights.get(place.index()).copied().unwrap_or(0))
            .sum()
    }

    pub(crate) fn set(&mut self, place: PlaceId, value: bool) {
        self.0.as_mut_slice()[place.index()] = u8::from(value);
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, bit) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{bit}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn affected_merges_pre_and_post() {
        let t = Transition::new(
            "t",
            smallvec![PlaceId::new(0), PlaceId::new(2)],
            smallvec![PlaceId::new(1), PlaceId::new(2)],
        );
        assert_eq!(
            t.affected().as_slice(),
            &[PlaceId::new(0), PlaceId::new(1), PlaceId::new(2)]
        );
        assert!(t.consumes(PlaceId::new(2)));
        assert!(!t.is_always_enabled());
    }

    #[test]
    fn marking_renders_as_tuple() {
        let m = Marking::from_bits(&[1, 0, 7]);
        assert_eq!(m.to_string(), "(1,0,1)");
        assert_eq!(m.token_count(), 2);
        assert_eq!(m.weighted_sum(&[2, 5, 3]), 5);
    }

    #[test]
    fn set_toggles_single_place() {
        let mut m = Marking::empty(3);
        m.set(PlaceId::new(1), true);
        assert_eq!(m.to_bits(), vec![0, 1, 0]);
        assert_eq!(m.marked_places().collect::<Vec<_>>(), vec![PlaceId::new(1)]);
    }
}
