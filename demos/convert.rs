use clap::Parser;
use fgrs::core::{
    convert_to_fg_par, random_message_initializer, FactorGraph, FactorNode, GraphSummary,
    VariableNode,
};
use fgrs::generators::{gnp, random_bipartite};
use ndarray::Array1;
use rand::thread_rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Converts a random graph to a factor graph and prints its summary as YAML
#[derive(Parser, Debug)]
struct Args {
    /// Number of nodes of a random G(n, p) graph, or of variables of a bipartite one
    #[arg(short, long, default_value_t = 100)]
    nodes: usize,

    /// Number of factors of a random bipartite graph
    #[arg(short, long, default_value_t = 20)]
    factors: usize,

    /// Probability of an edge
    #[arg(short, long, default_value_t = 0.05)]
    probability: f64,

    /// Generate a labeled bipartite graph instead of G(n, p)
    #[arg(short, long)]
    bipartite: bool,

    /// Cardinality of variables, i.e. size of initial messages
    #[arg(short, long, default_value_t = 2)]
    cardinality: usize,
}

#[derive(Serialize)]
struct Report {
    bipartite: bool,
    input_nodes: usize,
    input_edges: usize,
    factor_graph: GraphSummary,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let mut rng = thread_rng();
    // -------------------------------------------------------------------------------------
    let (input_nodes, input_edges, mut fg) = if args.bipartite {
        let graph = random_bipartite(args.nodes, args.factors, args.probability, &mut rng)?;
        let fg: FactorGraph<Array1<f64>, ()> = convert_to_fg_par(
            &graph,
            |i| VariableNode::new(format!("x{i}")),
            |j, f| FactorNode::new(format!("f{j}"), f),
            true,
        )?;
        (graph.node_count(), graph.edge_count(), fg)
    } else {
        let graph = gnp(args.nodes, args.probability, &mut rng)?;
        let fg: FactorGraph<Array1<f64>, ()> = convert_to_fg_par(
            &graph,
            |i| VariableNode::new(format!("x{i}")),
            |j, f| FactorNode::new(format!("f{j}"), f),
            false,
        )?;
        (graph.node_count(), graph.edge_count(), fg)
    };
    fg.init_messages(random_message_initializer(rng, args.cardinality));
    fg.validate()?;
    // -------------------------------------------------------------------------------------
    let report = Report {
        bipartite: args.bipartite,
        input_nodes,
        input_edges,
        factor_graph: fg.summary(),
    };
    println!("{}", fg.summary());
    println!("{}", serde_yaml::to_string(&report)?);
    Ok(())
}
