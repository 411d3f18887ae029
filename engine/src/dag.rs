//! Dependency-graph validation shared by the planner (I1, I2) and the
//! executor (cycle check on load), grounded in the same DFS used elsewhere
//! in this codebase for dependency graphs.

use std::collections::{HashMap, HashSet};

/// An acyclicity violation, reported with the path that closes the cycle.
#[derive(Debug, Clone)]
pub struct CycleError {
    pub path: Vec<String>,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dependency cycle: {}", self.path.join(" -> "))
    }
}

/// Validate that `dependencies` over `ids` is acyclic and closed (I1, I2).
///
/// `edges` maps each id to the ids it depends on. Returns the offending path
/// on the first cycle found; dangling references (a dependency not present
/// in `edges`) are reported as a one-element "cycle" naming the missing id.
pub fn validate(edges: &HashMap<String, Vec<String>>) -> Result<(), CycleError> {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for id in edges.keys() {
        if !visited.contains(id.as_str()) && has_cycle(id, edges, &mut visited, &mut rec_stack, &mut path) {
            return Err(CycleError { path });
        }
    }

    Ok(())
}

fn has_cycle<'a>(
    node: &'a str,
    edges: &'a HashMap<String, Vec<String>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<String>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node.to_string());

    if let Some(deps) = edges.get(node) {
        for dep in deps {
            if !edges.contains_key(dep.as_str()) {
                path.clear();
                path.push(dep.clone());
                return true;
            }
            if !visited.contains(dep.as_str()) {
                if has_cycle(dep, edges, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(dep.as_str()) {
                path.push(dep.clone());
                return true;
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

/// Topological order over `edges` (dependencies first). Assumes [`validate`]
/// has already succeeded; dangling references are silently skipped.
pub fn topological_order(edges: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut result = Vec::new();

    for id in edges.keys() {
        topo_visit(id, edges, &mut visited, &mut result);
    }

    result
}

fn topo_visit<'a>(
    node: &'a str,
    edges: &'a HashMap<String, Vec<String>>,
    visited: &mut HashSet<&'a str>,
    result: &mut Vec<String>,
) {
    if visited.contains(node) {
        return;
    }
    visited.insert(node);

    if let Some(deps) = edges.get(node) {
        for dep in deps {
            if edges.contains_key(dep) {
                topo_visit(dep, edges, visited, result);
            }
        }
    }
    result.push(node.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(id, deps)| (id.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect()
    }

    #[test]
    fn accepts_diamond_dependency() {
        let e = edges(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        assert!(validate(&e).is_ok());
    }

    #[test]
    fn rejects_a_direct_cycle() {
        let e = edges(&[("a", &["b"]), ("b", &["a"])]);
        let err = validate(&e).unwrap_err();
        assert!(err.path.contains(&"a".to_string()));
    }

    #[test]
    fn rejects_a_dangling_dependency_as_a_one_element_cycle() {
        let e = edges(&[("a", &["missing"])]);
        let err = validate(&e).unwrap_err();
        assert_eq!(err.path, vec!["missing".to_string()]);
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let e = edges(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        let order = topological_order(&e);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }
}
