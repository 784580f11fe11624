//! Canonical abstraction, isomorphism and partial join
//!
//! A node's canonical name is the vector of its values for the unary
//! abstraction predicates. Blur merges nodes sharing a name; the partial
//! join matches nodes of two blurred structures by name.

use super::three_valued::{Table, ThreeValuedStructure};
use crate::features::structure::ports::{AbstractStructure, MergeOutcome, NodeId};
use crate::features::vocabulary::PredicateId;
use crate::shared::models::Kleene;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use tracing::trace;

type Name = Vec<Kleene>;

impl ThreeValuedStructure {
    fn abstraction_predicates(&self) -> Vec<PredicateId> {
        self.vocabulary.unary_abstraction().collect()
    }

    fn name_of(&self, node: NodeId, preds: &[PredicateId]) -> Name {
        preds.iter().map(|p| self.eval(*p, &[node])).collect()
    }

    /// Nodes grouped by canonical name, in name order
    fn groups(&self, preds: &[PredicateId]) -> BTreeMap<Name, Vec<NodeId>> {
        let mut groups: BTreeMap<Name, Vec<NodeId>> = BTreeMap::new();
        for &node in &self.nodes {
            groups.entry(self.name_of(node, preds)).or_default().push(node);
        }
        groups
    }

    pub(super) fn blur_nodes(&mut self) {
        let preds = self.abstraction_predicates();
        let groups = self.groups(&preds);
        if groups.len() == self.nodes.len() {
            return;
        }

        let mut representative: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut group_size: FxHashMap<NodeId, usize> = FxHashMap::default();
        for members in groups.values() {
            let rep = members[0];
            group_size.insert(rep, members.len());
            for &m in members {
                representative.insert(m, rep);
            }
        }

        let mut tables = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let mut joined: BTreeMap<Box<[NodeId]>, (Kleene, usize)> = BTreeMap::new();
            for (tuple, value) in table {
                let mapped: Box<[NodeId]> = tuple.iter().map(|n| representative[n]).collect();
                joined
                    .entry(mapped)
                    .and_modify(|(acc, count)| {
                        *acc = acc.join(*value);
                        *count += 1;
                    })
                    .or_insert((*value, 1));
            }
            let mut merged = Table::new();
            for (tuple, (mut value, count)) in joined {
                let covered: usize = tuple.iter().map(|n| group_size[n]).product();
                if count < covered {
                    // some merged tuples were absent, i.e. false
                    value = value.join(Kleene::False);
                }
                if value != Kleene::False {
                    merged.insert(tuple, value);
                }
            }
            tables.push(merged);
        }

        self.tables = tables;
        self.nodes.retain(|n| representative[n] == *n);
        let sm = self.vocabulary.reserved().sm;
        for (rep, size) in group_size {
            if size > 1 {
                self.update(sm, &[rep], Kleene::Unknown);
            }
        }
        trace!(nodes = self.nodes.len(), "blurred structure");
    }

    /// Signature over every unary predicate, reserved ones included
    fn signature(&self, node: NodeId, unary: &[PredicateId]) -> Name {
        self.name_of(node, unary)
    }

    pub(super) fn isomorphic(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() {
            return false;
        }
        let mut higher: Vec<PredicateId> = Vec::new();
        let mut unary: Vec<PredicateId> = Vec::new();
        for pred in self.vocabulary.iter() {
            let (mine, theirs) = (&self.tables[pred.id.index()], &other.tables[pred.id.index()]);
            if mine.len() != theirs.len() {
                return false;
            }
            match pred.arity {
                0 => {
                    if mine != theirs {
                        return false;
                    }
                }
                1 => unary.push(pred.id),
                _ => higher.push(pred.id),
            }
        }

        let mine = bucket(self, &unary);
        let theirs = bucket(other, &unary);
        if mine.len() != theirs.len()
            || mine
                .iter()
                .zip(theirs.iter())
                .any(|((ka, va), (kb, vb))| ka != kb || va.len() != vb.len())
        {
            return false;
        }

        let candidates = &theirs;
        let order: Vec<(NodeId, &Vec<NodeId>)> = mine
            .iter()
            .flat_map(|(sig, nodes)| nodes.iter().map(move |n| (*n, &candidates[sig])))
            .collect();
        let mut mapping: Vec<(NodeId, NodeId)> = Vec::with_capacity(order.len());
        let mut used: FxHashSet<NodeId> = FxHashSet::default();
        self.extend_mapping(other, &higher, &order, &mut mapping, &mut used)
    }

    fn extend_mapping(
        &self,
        other: &Self,
        binary: &[PredicateId],
        order: &[(NodeId, &Vec<NodeId>)],
        mapping: &mut Vec<(NodeId, NodeId)>,
        used: &mut FxHashSet<NodeId>,
    ) -> bool {
        let Some(&(node, candidates)) = order.get(mapping.len()) else {
            return self.tables_agree(other, binary, mapping);
        };
        for &candidate in candidates {
            if used.contains(&candidate) {
                continue;
            }
            mapping.push((node, candidate));
            if self.pairs_agree(other, binary, mapping) {
                used.insert(candidate);
                if self.extend_mapping(other, binary, order, mapping, used) {
                    return true;
                }
                used.remove(&candidate);
            }
            mapping.pop();
        }
        false
    }

    /// Check binary predicates between the newest mapped node and every
    /// node mapped so far
    fn pairs_agree(&self, other: &Self, preds: &[PredicateId], mapping: &[(NodeId, NodeId)]) -> bool {
        let Some(&(a, b)) = mapping.last() else {
            return true;
        };
        preds
            .iter()
            .filter(|p| self.vocabulary.arity(**p) == 2)
            .all(|&p| {
                mapping.iter().all(|&(x, y)| {
                    self.eval(p, &[a, x]) == other.eval(p, &[b, y])
                        && self.eval(p, &[x, a]) == other.eval(p, &[y, b])
                })
            })
    }

    fn tables_agree(&self, other: &Self, preds: &[PredicateId], mapping: &[(NodeId, NodeId)]) -> bool {
        if mapping.len() != self.nodes.len() {
            return false;
        }
        let map: FxHashMap<NodeId, NodeId> = mapping.iter().copied().collect();
        preds.iter().all(|&p| {
            self.entries(p).all(|(tuple, value)| {
                let image: Vec<NodeId> = tuple.iter().map(|n| map[n]).collect();
                other.eval(p, &image) == value
            })
        })
    }

    /// Pointwise join with a structure whose nodes match ours by canonical
    /// name. `Unrelated` when names are not unique or differ, or when the
    /// nullary predicates disagree.
    pub(super) fn join_into(&mut self, other: &Self) -> MergeOutcome {
        let preds = self.abstraction_predicates();
        let (Some(mine), Some(theirs)) = (unique_names(self, &preds), unique_names(other, &preds))
        else {
            return MergeOutcome::Unrelated;
        };
        if mine.len() != theirs.len() || mine.keys().ne(theirs.keys()) {
            return MergeOutcome::Unrelated;
        }
        let nullary_agree = self
            .vocabulary
            .with_arity(0)
            .all(|p| self.eval(p.id, &[]) == other.eval(p.id, &[]));
        if !nullary_agree {
            return MergeOutcome::Unrelated;
        }

        let to_mine: FxHashMap<NodeId, NodeId> = theirs
            .iter()
            .map(|(name, theirs_node)| (*theirs_node, mine[name]))
            .collect();

        let mut changed = false;
        for index in 0..self.tables.len() {
            let theirs_mapped: Table = other.tables[index]
                .iter()
                .map(|(tuple, value)| {
                    let mapped: Box<[NodeId]> = tuple.iter().map(|n| to_mine[n]).collect();
                    (mapped, *value)
                })
                .collect();
            let mine_table = &mut self.tables[index];
            let keys: Vec<Box<[NodeId]>> = mine_table
                .keys()
                .chain(theirs_mapped.keys())
                .cloned()
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            for key in keys {
                let old = mine_table.get(&key).copied().unwrap_or(Kleene::False);
                let new = old.join(theirs_mapped.get(&key).copied().unwrap_or(Kleene::False));
                if new != old {
                    changed = true;
                    mine_table.insert(key, new);
                }
            }
        }

        if changed {
            MergeOutcome::Merged
        } else {
            MergeOutcome::Subsumed
        }
    }
}

fn bucket(s: &ThreeValuedStructure, unary: &[PredicateId]) -> BTreeMap<Name, Vec<NodeId>> {
    let mut out: BTreeMap<Name, Vec<NodeId>> = BTreeMap::new();
    for &node in &s.nodes {
        out.entry(s.signature(node, unary)).or_default().push(node);
    }
    out
}

fn unique_names(s: &ThreeValuedStructure, preds: &[PredicateId]) -> Option<BTreeMap<Name, NodeId>> {
    let mut out = BTreeMap::new();
    for &node in &s.nodes {
        if out.insert(s.name_of(node, preds), node).is_some() {
            return None;
        }
    }
    Some(out)
}
