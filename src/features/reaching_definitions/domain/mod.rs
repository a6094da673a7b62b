pub mod definitions_map;

pub use definitions_map::DefinitionsMap;
