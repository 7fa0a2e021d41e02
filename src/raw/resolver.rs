//! Dependency resolution: a total order over raw definitions.
//!
//! A definition appears in the order only after every definition it links
//! to, directly or through a nested child. Targets satisfied externally (a
//! prior notebook, or a `declare`d name) impose no ordering.
//!
//! Two phases:
//! 1. **Orphans**: any link whose target is neither external nor in the
//!    input set fails immediately.
//! 2. **Fixed point**: repeated passes move every solvable definition, in
//!    input order, into the output. A pass that moves nothing means the rest
//!    form a cycle.

use std::collections::{HashMap, HashSet};

use petgraph::graph::DiGraph;

use crate::error::ResolveError;
use crate::raw::{RawDefinition, RawKey};

/// Result type for resolution.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Order `raws` so that every definition follows what it references.
///
/// `is_external` answers whether a key is satisfied outside the input set.
/// Ties are broken by input order.
pub fn solve<'a, F>(raws: &'a [RawDefinition], is_external: F) -> ResolveResult<Vec<&'a RawDefinition>>
where
    F: Fn(&RawKey) -> bool,
{
    let known: HashSet<&RawKey> = raws.iter().map(RawDefinition::key).collect();
    check_orphans(raws, &known, &is_external)?;

    let mut remaining: Vec<&RawDefinition> = raws.iter().collect();
    let mut solved: HashSet<&RawKey> = HashSet::with_capacity(raws.len());
    let mut ordered = Vec::with_capacity(raws.len());
    let mut pass = 0usize;

    while !remaining.is_empty() {
        pass += 1;
        let before = remaining.len();
        let mut next = Vec::with_capacity(before);

        for raw in remaining {
            let ready = raw
                .all_links()
                .into_iter()
                .all(|(_, _, target)| is_external(target) || solved.contains(target));
            if ready {
                solved.insert(raw.key());
                ordered.push(raw);
            } else {
                next.push(raw);
            }
        }

        tracing::debug!(pass, solved = before - next.len(), left = next.len(), "resolver pass");

        if next.len() == before {
            return Err(unresolvable(&next, &is_external));
        }
        remaining = next;
    }

    Ok(ordered)
}

fn check_orphans<F>(raws: &[RawDefinition], known: &HashSet<&RawKey>, is_external: &F) -> ResolveResult<()>
where
    F: Fn(&RawKey) -> bool,
{
    for raw in raws {
        for (owner, field, target) in raw.all_links() {
            if is_external(target) || known.contains(target) {
                continue;
            }
            let field = if owner == raw.key() {
                field.to_string()
            } else {
                format!("{owner}.{field}")
            };
            return Err(ResolveError::UnresolvedReference {
                key: raw.key().to_string(),
                field,
                missing: target.to_string(),
            });
        }
    }
    Ok(())
}

/// Build the cycle error, naming the strongly connected components among the
/// unsolved definitions.
fn unresolvable<F>(remaining: &[&RawDefinition], is_external: &F) -> ResolveError
where
    F: Fn(&RawKey) -> bool,
{
    let mut graph: DiGraph<&RawKey, ()> = DiGraph::new();
    let index: HashMap<&RawKey, _> = remaining
        .iter()
        .map(|raw| (raw.key(), graph.add_node(raw.key())))
        .collect();

    for raw in remaining {
        let from = index[raw.key()];
        for (_, _, target) in raw.all_links() {
            if is_external(target) {
                continue;
            }
            if let Some(&to) = index.get(target) {
                graph.update_edge(from, to, ());
            }
        }
    }

    let cycles = petgraph::algo::tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut names: Vec<String> = scc.iter().map(|&n| graph[n].to_string()).collect();
            names.sort();
            names
        })
        .collect();

    ResolveError::UnresolvableGraph {
        remaining: remaining.iter().map(|raw| raw.key().to_string()).collect(),
        cycles,
    }
}
