use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;

/// A dependency loop found while sorting; the path starts and ends on the
/// same node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<N> {
    pub path: Vec<N>,
}

impl<N: fmt::Display> fmt::Display for Cycle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, node) in self.path.iter().enumerate() {
            if idx > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

/// Orders `graph` so that every node comes after the nodes it depends on.
///
/// `graph` maps a node to its dependencies. Keys are visited in map order and
/// dependencies in list order, so the result is deterministic. Dependencies
/// that are not keys themselves are still emitted.
pub fn sort<N>(graph: &IndexMap<N, Vec<N>>) -> Result<Vec<N>, Cycle<N>>
where
    N: Clone + Eq + Hash,
{
    let mut output = Vec::with_capacity(graph.len());
    let mut visited: HashSet<N> = HashSet::with_capacity(graph.len());
    let mut in_stack: HashSet<N> = HashSet::new();
    let mut stack: Vec<(N, usize)> = Vec::new();

    for start in graph.keys() {
        if visited.contains(start) {
            continue;
        }
        in_stack.insert(start.clone());
        stack.push((start.clone(), 0));

        while let Some(frame) = stack.last_mut() {
            let next = graph
                .get(&frame.0)
                .and_then(|deps| deps.get(frame.1))
                .cloned();
            frame.1 += 1;

            match next {
                Some(dep) if in_stack.contains(&dep) => {
                    let from = stack
                        .iter()
                        .position(|(node, _)| *node == dep)
                        .unwrap_or(0);
                    let mut path: Vec<N> = stack[from..].iter().map(|(node, _)| node.clone()).collect();
                    path.push(dep);
                    return Err(Cycle { path });
                }
                Some(dep) if visited.contains(&dep) => {}
                Some(dep) => {
                    in_stack.insert(dep.clone());
                    stack.push((dep, 0));
                }
                None => {
                    if let Some((node, _)) = stack.pop() {
                        in_stack.remove(&node);
                        visited.insert(node.clone());
                        output.push(node);
                    }
                }
            }
        }
    }

    Ok(output)
}
