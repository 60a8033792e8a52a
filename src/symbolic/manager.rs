//! Owned Boolean-set manager for one analysis.
//!
//! Every place `p` gets a current-state variable `x{p}` and a next-state
//! variable `xp{p}`. Variables are declared interleaved (`x0, xp0, x1, xp1,
//! ...`) so that a firing, which relates `x{p}` and `xp{p}` for each place,
//! stays compact as a BDD. The variable table is a field of the manager and
//! is never shared: two analyses must each build their own manager.
use biodivine_lib_bdd::{Bdd, BddVariable, BddVariableSet, BddVariableSetBuilder};
use indexmap::IndexMap;

use crate::net::{Idx, Marking, PlaceId};

/// Which half of a variable pair a predicate is expressed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Current,
    Next,
}

/// Explicit markings read out of a predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    pub markings: Vec<Marking>,
    /// The cap was reached while more markings remained; `markings` is then
    /// a lower bound of the set.
    pub truncated: bool,
}

impl Enumeration {
    pub fn len(&self) -> usize {
        self.markings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markings.is_empty()
    }
}

pub struct BoolSetManager {
    variables: BddVariableSet,
    table: IndexMap<String, BddVariable>,
    current: Vec<BddVariable>,
    next: Vec<BddVariable>,
    identity: Bdd,
    /// `¬xp0 ∧ ¬xp1 ∧ ...`
    next_cleared: Bdd,
}

impl BoolSetManager {
    pub fn new(places: usize) -> Self {
        let mut builder = BddVariableSetBuilder::new();
        let mut table = IndexMap::with_capacity(places * 2);
        let mut current = Vec::with_capacity(places);
        let mut next = Vec::with_capacity(places);
        for place in 0..places {
            let name = format!("x{place}");
            let var = builder.make_variable(&name);
            table.insert(name, var);
            current.push(var);

            let name = format!("xp{place}");
            let var = builder.make_variable(&name);
            table.insert(name, var);
            next.push(var);
        }
        let variables = builder.build();

        let identity = current
            .iter()
            .zip(&next)
            .fold(variables.mk_true(), |acc, (&x, &xp)| {
                acc.and(&variables.mk_var(x).iff(&variables.mk_var(xp)))
            });
        let next_cleared = next.iter().fold(variables.mk_true(), |acc, &xp| {
            acc.and(&variables.mk_literal(xp, false))
        });

        Self {
            variables,
            table,
            current,
            next,
            identity,
            next_cleared,
        }
    }

    pub fn places(&self) -> usize {
        self.current.len()
    }

    /// Looks a declared variable up by name (`x3`, `xp3`, ...).
    pub fn var(&self, name: &str) -> Option<Bdd> {
        self.table
            .get(name)
            .map(|&var| self.variables.mk_var(var))
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn mk_true(&self) -> Bdd {
        self.variables.mk_true()
    }

    pub fn mk_false(&self) -> Bdd {
        self.variables.mk_false()
    }

    fn layer(&self, layer: Layer) -> &[BddVariable] {
        match layer {
            Layer::Current => &self.current,
            Layer::Next => &self.next,
        }
    }

    /// Literal `x{p}` / `xp{p}` (or its negation when `value` is false).
    pub fn literal(&self, layer: Layer, place: PlaceId, value: bool) -> Bdd {
        self.variables
            .mk_literal(self.layer(layer)[place.index()], value)
    }

    /// `x{p} ↔ xp{p}`.
    pub fn unchanged(&self, place: PlaceId) -> Bdd {
        let x = self.variables.mk_var(self.current[place.index()]);
        let xp = self.variables.mk_var(self.next[place.index()]);
        x.iff(&xp)
    }

    /// The conjunction fixing every variable of `layer` to the marking.
    pub fn cube(&self, marking: &Marking, layer: Layer) -> Bdd {
        debug_assert_eq!(marking.len(), self.places());
        marking
            .iter()
            .fold(self.mk_true(), |acc, (place, bit)| {
                acc.and(&self.literal(layer, place, bit != 0))
            })
    }

    pub fn exists(&self, set: &Bdd, layer: Layer) -> Bdd {
        set.exists(self.layer(layer))
    }

    /// Substitutes every `xp{p}` by `x{p}`; `set` must not mention current
    /// variables.
    pub fn rename_next_to_current(&self, set: &Bdd) -> Bdd {
        set.and(&self.identity).exists(&self.next)
    }

    /// Substitutes every `x{p}` by `xp{p}`; `set` must not mention next
    /// variables.
    pub fn rename_current_to_next(&self, set: &Bdd) -> Bdd {
        set.and(&self.identity).exists(&self.current)
    }

    /// Semantic equality of two predicates.
    pub fn equivalent(&self, a: &Bdd, b: &Bdd) -> bool {
        a.iff(b).is_true()
    }

    pub fn contains(&self, set: &Bdd, marking: &Marking) -> bool {
        !set.and(&self.cube(marking, Layer::Current)).is_false()
    }

    /// Number of current-state assignments in `set`. Exact while the count
    /// fits an `f64` mantissa.
    ///
    /// The next layer is pinned to zero before counting, so the free `xp`
    /// variables never contribute a `2ⁿ` factor.
    pub fn count(&self, set: &Bdd) -> f64 {
        self.exists(set, Layer::Next)
            .and(&self.next_cleared)
            .cardinality()
    }

    /// Lists the current-state assignments of `set`, stopping after `limit`.
    ///
    /// Each BDD path is a cube over the current variables; variables the
    /// path leaves open are expanded to both values. Paths are disjoint, so
    /// no marking is produced twice.
    pub fn enumerate(&self, set: &Bdd, limit: usize) -> Enumeration {
        let projected = self.exists(set, Layer::Next);
        let mut out = Enumeration::default();

        'paths: for clause in projected.sat_clauses() {
            let mut bits = vec![0u8; self.places()];
            let mut free = Vec::new();
            for (place, &var) in self.current.iter().enumerate() {
                match clause.get_value(var) {
                    Some(value) => bits[place] = u8::from(value),
                    None => free.push(place),
                }
            }

            // Odometer over the unconstrained places.
            loop {
                if out.markings.len() >= limit {
                    out.truncated = true;
                    break 'paths;
                }
                out.markings.push(Marking::from_bits(&bits));

                let mut carry = true;
                for &place in &free {
                    if bits[place] == 0 {
                        bits[place] = 1;
                        carry = false;
                        break;
                    }
                    bits[place] = 0;
                }
                if carry {
                    break;
                }
            }
        }

        out
    }
}
