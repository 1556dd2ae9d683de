pub mod atlas_graph;
