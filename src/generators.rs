//! Generators of input graphs for [`convert_to_fg`](crate::core::convert_to_fg).
//!
//! Node weights are node numbers, so results of a conversion can be
//! mapped back to them through origins.

use petgraph::graph::UnGraph;
use rand::Rng;
use rand_distr::{Bernoulli, BernoulliError};

use crate::core::Labeled;

/// Creates a path 0 - 1 - ... - (n - 1)
///
/// # Example
///
/// ```
/// use fgrs::generators::path;
///
/// let graph = path(3);
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// ```
pub fn path(nodes_number: usize) -> UnGraph<usize, ()> {
    let mut graph = UnGraph::with_capacity(nodes_number, nodes_number.saturating_sub(1));
    let nodes: Vec<_> = (0..nodes_number).map(|i| graph.add_node(i)).collect();
    for pair in nodes.windows(2) {
        graph.add_edge(pair[0], pair[1], ());
    }
    graph
}

/// Creates a random G(n, p) graph: every pair of distinct nodes
/// is connected independently with probability `p`
///
/// # Arguments
///
/// * `nodes_number` - A number of nodes
/// * `p` - A probability of an edge
/// * `rng` - A generator of random numbers
///
/// # Notes
///
/// Fails if `p` is not in [0, 1]
pub fn gnp(
    nodes_number: usize,
    p: f64,
    rng: &mut impl Rng,
) -> Result<UnGraph<usize, ()>, BernoulliError> {
    let distr = Bernoulli::new(p)?;
    let mut graph = UnGraph::with_capacity(nodes_number, 0);
    let nodes: Vec<_> = (0..nodes_number).map(|i| graph.add_node(i)).collect();
    for (i, u) in nodes.iter().enumerate() {
        for v in &nodes[(i + 1)..] {
            if rng.sample(distr) {
                graph.add_edge(*u, *v, ());
            }
        }
    }
    Ok(graph)
}

/// Creates a random bipartite graph with labeled parts: a variable and a factor
/// are connected independently with probability `p`
///
/// # Arguments
///
/// * `variables_number` - A number of nodes labeled 0, numbered first
/// * `factors_number` - A number of nodes labeled 1, numbered after variables
/// * `p` - A probability of an edge
/// * `rng` - A generator of random numbers
///
/// # Example
///
/// ```
/// use fgrs::generators::random_bipartite;
/// use rand::thread_rng;
///
/// let graph = random_bipartite(3, 2, 1f64, &mut thread_rng()).unwrap();
/// assert_eq!(graph.node_count(), 5);
/// assert_eq!(graph.edge_count(), 6);
/// ```
pub fn random_bipartite(
    variables_number: usize,
    factors_number: usize,
    p: f64,
    rng: &mut impl Rng,
) -> Result<UnGraph<Labeled<usize>, ()>, BernoulliError> {
    let distr = Bernoulli::new(p)?;
    let mut graph = UnGraph::with_capacity(variables_number + factors_number, 0);
    let variables: Vec<_> = (0..variables_number)
        .map(|i| graph.add_node(Labeled::variable(i)))
        .collect();
    let factors: Vec<_> = (0..factors_number)
        .map(|j| graph.add_node(Labeled::factor(variables_number + j)))
        .collect();
    for f in &factors {
        for v in &variables {
            if rng.sample(distr) {
                graph.add_edge(*v, *f, ());
            }
        }
    }
    Ok(graph)
}
