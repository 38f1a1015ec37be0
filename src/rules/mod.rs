//! Pure validation rules consulted by handlers before anything is copied.

pub mod data_type;
pub mod index;
pub mod lookup;
pub mod name;
pub mod relationship;
pub mod sequence;
pub mod usage;
