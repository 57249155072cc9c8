pub mod plot;
pub mod render;
pub mod render2d;
pub mod rng;

pub use plot::training_chart;
pub use render::{encode_png, save_png};
pub use render2d::{Canvas, Color, BLACK, WHITE, RED, BLUE, GRAY};
pub use rng::{RngStream, SeedSequence, rng_from_seed};
