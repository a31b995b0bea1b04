//! Small ordered containers shared across the name batch, legacy, and zen modules

pub mod indexed_map;
pub use indexed_map::IndexedMap;
