//! Scene descriptions for the scripted engine.

mod json;
pub mod scene;

use glam::Vec2;

pub use self::json::JsonError;
pub use scene::{load_scene, parse_scene, SceneParseError};

/// Pairs up a flat `[x0, y0, x1, y1, ...]` list. A trailing odd float is dropped.
#[inline]
fn f32s_as_vec2s(floats: &[f32]) -> Vec<Vec2> {
	floats.chunks_exact(2).map(|xy| Vec2::new(xy[0], xy[1])).collect()
}
