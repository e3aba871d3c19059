//! Query interface over the animation engine that poses the model every tick.
//!
//! The engine is a black box: it owns deformation, parameter values, opacity, visibility and draw order.
//! This crate only reads its per-tick results through [`CubismEngine`] and feeds parameter deltas back.

mod scripted;

use std::path::Path;

use glam::{UVec2, Vec2};

pub use scripted::{ParameterBinding, ScriptedDrawable, ScriptedEngine, ScriptedModel, ScriptedParameter};

/// Capabilities an animation backend has to provide to be rendered.
///
/// Drawable indices passed in are always in `0..self.drawable_count()`; implementations may panic otherwise.
///
/// Slices returned here borrow the engine, so they cannot outlive the next [`CubismEngine::update()`].
/// Every count query has a matching buffer query, and callers are expected to check that both agree.
pub trait CubismEngine {
	fn drawable_count(&self) -> usize;
	/// Canvas size in model units.
	fn canvas_size(&self) -> Vec2;
	/// Canvas size in pixels. This is the size of the virtual canvas everything is composited into.
	fn canvas_size_pixels(&self) -> UVec2;
	fn pixels_per_unit(&self) -> f32;

	fn parameter_count(&self) -> usize;
	fn parameter_id(&self, index: usize) -> &str;

	fn texture_index(&self, drawable: usize) -> usize;
	/// Image file backing a texture index, if the engine knows one.
	fn texture_file_name(&self, texture: usize) -> Option<&Path>;

	fn drawable_id(&self, drawable: usize) -> &str;
	fn vertex_count(&self, drawable: usize) -> usize;
	/// Positions in model space, `[-1, 1]` on both axes, Y up.
	fn vertex_positions(&self, drawable: usize) -> &[Vec2];
	/// Texture coordinates in `[0, 1]`, V up.
	fn vertex_uvs(&self, drawable: usize) -> &[Vec2];
	fn index_count(&self, drawable: usize) -> usize;
	fn vertex_indices(&self, drawable: usize) -> &[u16];
	fn opacity(&self, drawable: usize) -> f32;
	fn blend_mode(&self, drawable: usize) -> i32;
	fn mask_count(&self, drawable: usize) -> usize;
	fn masks(&self, drawable: usize) -> &[i32];
	fn is_inverted_mask(&self, drawable: usize) -> bool;
	fn culling(&self, drawable: usize) -> i32;
	fn is_visible(&self, drawable: usize) -> bool;
	fn vertex_positions_did_change(&self, drawable: usize) -> bool;

	/// One entry per drawable: `orders[drawable] = position in the draw sequence`.
	fn render_orders(&self) -> &[i32];

	/// Advance the simulation by one tick.
	fn update(&mut self);
	/// Add `delta` to the parameter at `index` and re-pose the model.
	fn add_parameter_value(&mut self, index: usize, delta: f32);
}

/// Possible errors setting up an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("Ticks per second must be positive")]
	InvalidTickRate,
	#[error("Drawable {drawable:?} binds to parameter {parameter}, but there are only {count} parameters")]
	UnknownParameter {
		drawable: String,
		parameter: usize,
		count: usize,
	},
	#[error("Render order table has {orders} entries for {drawables} drawables")]
	RenderOrderLength { orders: usize, drawables: usize },
}
