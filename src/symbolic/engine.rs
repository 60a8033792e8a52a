//! Forward-image reachability over a BDD transition relation.
use biodivine_lib_bdd::Bdd;

use crate::net::{Idx, Marking, Net, PlaceId, Transition};
use crate::symbolic::fixpoint::{FixpointError, least_fixpoint_by, subset_lattice_bound};
use crate::symbolic::manager::{BoolSetManager, Enumeration, Layer};

/// Reachable-set predicate over the current-state variables.
#[derive(Debug, Clone)]
pub struct ReachableSet {
    pub set: Bdd,
    /// Image steps taken, the last one confirming the fixpoint.
    pub iterations: usize,
}

/// One analysis: a net, its own variable manager and the relation `R`.
pub struct ReachabilityEngine<'net> {
    net: &'net Net,
    manager: BoolSetManager,
    relation: Bdd,
}

impl<'net> ReachabilityEngine<'net> {
    pub fn new(net: &'net Net) -> Self {
        let manager = BoolSetManager::new(net.places_len());
        let relation = net
            .transitions
            .iter()
            .fold(manager.mk_false(), |acc, transition| {
                acc.or(&transition_relation(&manager, net.places_len(), transition))
            });
        log::debug!(
            "net '{}': transition relation over {} variables has {} nodes",
            net.name,
            2 * net.places_len(),
            relation.size()
        );
        Self {
            net,
            manager,
            relation,
        }
    }

    pub fn net(&self) -> &'net Net {
        self.net
    }

    pub fn manager(&self) -> &BoolSetManager {
        &self.manager
    }

    /// `R = ⋁ₜ Rₜ` over current and next variables.
    pub fn transition_relation(&self) -> &Bdd {
        &self.relation
    }

    pub fn marking_set(&self, marking: &Marking) -> Bdd {
        self.manager.cube(marking, Layer::Current)
    }

    pub fn initial_set(&self) -> Bdd {
        self.marking_set(self.net.initial_marking())
    }

    /// One-step successors of `set`, expressed over current variables.
    pub fn image(&self, set: &Bdd) -> Bdd {
        let potential = set.and(&self.relation);
        let image = self.manager.exists(&potential, Layer::Current);
        self.manager.rename_next_to_current(&image)
    }

    pub fn reachable(&self) -> Result<ReachableSet, FixpointError> {
        self.reachable_from(self.initial_set())
    }

    /// Least fixpoint of `S ↦ S ∨ image(S)` above `seed`.
    pub fn reachable_from(&self, seed: Bdd) -> Result<ReachableSet, FixpointError> {
        let bound = subset_lattice_bound(self.net.places_len());
        let fixpoint = least_fixpoint_by(
            seed,
            bound,
            |set| {
                let next = set.or(&self.image(set));
                log::debug!(
                    "net '{}': fixpoint step, {} BDD nodes",
                    self.net.name,
                    next.size()
                );
                next
            },
            |a, b| self.manager.equivalent(a, b),
        )?;
        log::debug!(
            "net '{}': reachability converged after {} iterations",
            self.net.name,
            fixpoint.iterations
        );
        Ok(ReachableSet {
            set: fixpoint.value,
            iterations: fixpoint.iterations,
        })
    }

    pub fn contains(&self, set: &Bdd, marking: &Marking) -> bool {
        self.manager.contains(set, marking)
    }

    pub fn count(&self, set: &Bdd) -> f64 {
        self.manager.count(set)
    }

    pub fn enumerate(&self, set: &Bdd, limit: usize) -> Enumeration {
        let listed = self.manager.enumerate(set, limit);
        if listed.truncated {
            log::warn!(
                "net '{}': enumeration stopped at {} markings; the list is a lower bound",
                self.net.name,
                limit
            );
        }
        listed
    }
}

/// `Rₜ = enabled(t) ∧ change(t) ∧ frame(t)`. A place in both pre- and
/// post-set is forced to 1 in the next state.
fn transition_relation(manager: &BoolSetManager, places: usize, transition: &Transition) -> Bdd {
    let enabled = transition
        .pre
        .iter()
        .fold(manager.mk_true(), |acc, &place| {
            acc.and(&manager.literal(Layer::Current, place, true))
        });

    let affected = transition.affected();
    let change = affected.iter().fold(manager.mk_true(), |acc, &place| {
        acc.and(&manager.literal(Layer::Next, place, transition.produces(place)))
    });

    let frame = (0..places)
        .map(PlaceId::from_usize)
        .filter(|place| affected.binary_search(place).is_err())
        .fold(manager.mk_true(), |acc, place| acc.and(&manager.unchanged(place)));

    enabled.and(&change).and(&frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetBuilder;

    fn sorted_bits(listed: &Enumeration) -> Vec<Vec<u8>> {
        let mut bits: Vec<_> = listed.markings.iter().map(Marking::to_bits).collect();
        bits.sort();
        bits
    }

    fn fork() -> Net {
        let mut builder = NetBuilder::new("fork");
        builder
            .add_place("p0", true)
            .add_place("p1", false)
            .add_place("p2", false)
            .add_transition("t0")
            .add_arc("p0", "t0")
            .add_arc("t0", "p1")
            .add_arc("t0", "p2");
        builder.build()
    }

    #[test]
    fn fork_reaches_two_markings() {
        let net = fork();
        let engine = ReachabilityEngine::new(&net);
        let reach = engine.reachable().unwrap();
        let listed = engine.enumerate(&reach.set, 100);
        assert_eq!(sorted_bits(&listed), vec![vec![0, 1, 1], vec![1, 0, 0]]);
        assert_eq!(engine.count(&reach.set), 2.0);
        assert_eq!(reach.iterations, 2);
    }

    #[test]
    fn relation_relates_exactly_the_firings() {
        let net = fork();
        let engine = ReachabilityEngine::new(&net);
        let manager = engine.manager();
        let from = Marking::from_bits(&[1, 0, 0]);
        let to = Marking::from_bits(&[0, 1, 1]);
        let pair = manager
            .cube(&from, Layer::Current)
            .and(&manager.cube(&to, Layer::Next));
        assert!(!pair.and(engine.transition_relation()).is_false());

        let stuck = manager
            .cube(&to, Layer::Current)
            .and(&manager.cube(&to, Layer::Next));
        assert!(stuck.and(engine.transition_relation()).is_false());
    }

    #[test]
    fn self_loop_keeps_place_marked() {
        let mut builder = NetBuilder::new("loop");
        builder
            .add_place("a", true)
            .add_place("b", false)
            .add_transition("t")
            .add_arc("a", "t")
            .add_arc("t", "a")
            .add_arc("t", "b");
        let net = builder.build();
        let engine = ReachabilityEngine::new(&net);
        let reach = engine.reachable().unwrap();
        let listed = engine.enumerate(&reach.set, 100);
        assert_eq!(sorted_bits(&listed), vec![vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn empty_preset_fires_from_anywhere() {
        let mut builder = NetBuilder::new("source");
        builder
            .add_place("a", false)
            .add_transition("gen")
            .add_arc("gen", "a");
        let net = builder.build();
        let engine = ReachabilityEngine::new(&net);
        let reach = engine.reachable().unwrap();
        assert!(engine.contains(&reach.set, &Marking::from_bits(&[1])));
        assert!(engine.contains(&reach.set, &Marking::from_bits(&[0])));
    }

    #[test]
    fn no_transitions_keeps_initial_only() {
        let mut builder = NetBuilder::new("single");
        builder.add_place("p", true);
        let net = builder.build();
        let engine = ReachabilityEngine::new(&net);
        let reach = engine.reachable().unwrap();
        assert!(engine.manager().equivalent(&reach.set, &engine.initial_set()));
        assert_eq!(reach.iterations, 1);
    }

    #[test]
    fn wide_net_counts_its_markings() {
        let mut builder = NetBuilder::new("wide");
        for place in 0..1100 {
            builder.add_place(format!("p{place:04}"), place == 0);
        }
        builder
            .add_transition("t")
            .add_arc("p0000", "t")
            .add_arc("t", "p0001");
        let net = builder.build();
        let engine = ReachabilityEngine::new(&net);
        let reach = engine.reachable().unwrap();
        assert_eq!(engine.count(&reach.set), 2.0);
        assert_eq!(engine.enumerate(&reach.set, 10).len(), 2);
    }

    #[test]
    fn reachable_set_is_idempotent() {
        let net = fork();
        let engine = ReachabilityEngine::new(&net);
        let reach = engine.reachable().unwrap();
        let again = engine.reachable_from(reach.set.clone()).unwrap();
        assert!(engine.manager().equivalent(&again.set, &reach.set));
        assert_eq!(again.iterations, 1);
    }
}
