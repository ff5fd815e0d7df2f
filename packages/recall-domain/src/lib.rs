pub mod display;
pub mod feedback;
pub mod recency;
pub mod sequence;
pub mod view;
