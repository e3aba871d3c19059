pub mod config;
pub mod engine;
pub mod formats;
pub mod math;
pub mod model;
pub mod params;
pub mod player;
pub mod render;
pub mod texture;

pub use config::PlayerConfig;
pub use engine::{CubismEngine, ScriptedEngine};
pub use model::{Drawable, ModelState};
pub use player::{Player, PlayerError};
pub use render::software::SoftwareRenderer;
pub use render::{draw, CubismRenderer};
