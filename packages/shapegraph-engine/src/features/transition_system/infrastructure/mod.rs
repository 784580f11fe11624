mod cfg;
mod exploded_graph;

pub use cfg::Cfg;
pub use exploded_graph::ExplodedGraph;
