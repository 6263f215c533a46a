pub mod nearest_neighbor_associator;
pub mod positional_associator;
