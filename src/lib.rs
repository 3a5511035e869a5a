/// A module containing factor graphs and the conversion of arbitrary graphs to factor graphs
pub mod core;
/// A module containing generators of input graphs
pub mod generators;

#[cfg(test)]
mod tests;
