pub mod chart;
pub mod geometry;
pub mod interaction;
pub mod period;
pub mod sample;
pub mod series;
pub mod settings;
