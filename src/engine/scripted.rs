use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};
use tracing::debug;

use super::{CubismEngine, EngineError};

/// A parameter of a scripted model and the value it returns to on every tick.
#[derive(Clone, Debug)]
pub struct ScriptedParameter {
	pub id: String,
	pub default: f32,
}

/// Moves every vertex of a drawable by `offset` per unit of parameter value.
#[derive(Clone, Copy, Debug)]
pub struct ParameterBinding {
	pub parameter: usize,
	pub offset: Vec2,
}

/// Static description of one drawable. `positions` is the rest pose.
#[derive(Clone, Debug)]
pub struct ScriptedDrawable {
	pub id: String,
	pub texture_index: usize,
	pub positions: Vec<Vec2>,
	pub uvs: Vec<Vec2>,
	pub indices: Vec<u16>,
	pub opacity: f32,
	pub blend_mode: i32,
	pub masks: Vec<i32>,
	pub inverted_mask: bool,
	pub culling: i32,
	pub visible: bool,
	pub bindings: Vec<ParameterBinding>,
}

impl ScriptedDrawable {
	/// A visible, fully opaque, unmasked drawable.
	pub fn new(id: impl Into<String>, texture_index: usize, positions: Vec<Vec2>, uvs: Vec<Vec2>, indices: Vec<u16>) -> Self {
		Self {
			id: id.into(),
			texture_index,
			positions,
			uvs,
			indices,
			opacity: 1.0,
			blend_mode: 0,
			masks: Vec::new(),
			inverted_mask: false,
			culling: 0,
			visible: true,
			bindings: Vec::new(),
		}
	}
}

/// Everything a [`ScriptedEngine`] plays back.
#[derive(Clone, Debug)]
pub struct ScriptedModel {
	pub canvas_size: Vec2,
	pub pixels_per_unit: f32,
	pub canvas_size_pixels: UVec2,
	pub textures: Vec<PathBuf>,
	pub parameters: Vec<ScriptedParameter>,
	pub drawables: Vec<ScriptedDrawable>,
	/// `render_orders[drawable] = position in the draw sequence`
	pub render_orders: Vec<i32>,
}

/// In-memory engine: no physics or motions, parameters only translate the meshes bound to them.
///
/// Like a real engine, every tick starts from the default parameter values,
/// so deltas added through [`CubismEngine::add_parameter_value()`] only last until the next update.
pub struct ScriptedEngine {
	model: ScriptedModel,
	ticks_per_second: u32,
	ticks: u64,
	values: Vec<f32>,
	deformed: Vec<Vec<Vec2>>,
	changed: Vec<bool>,
}

impl ScriptedEngine {
	pub fn new(model: ScriptedModel, ticks_per_second: u32) -> Result<Self, EngineError> {
		if ticks_per_second == 0 {
			return Err(EngineError::InvalidTickRate);
		}
		if model.render_orders.len() != model.drawables.len() {
			return Err(EngineError::RenderOrderLength {
				orders: model.render_orders.len(),
				drawables: model.drawables.len(),
			});
		}
		for drawable in &model.drawables {
			if let Some(binding) = (drawable.bindings.iter()).find(|b| b.parameter >= model.parameters.len()) {
				return Err(EngineError::UnknownParameter {
					drawable: drawable.id.clone(),
					parameter: binding.parameter,
					count: model.parameters.len(),
				});
			}
		}

		let values = model.parameters.iter().map(|p| p.default).collect();
		let deformed = vec![Vec::new(); model.drawables.len()];
		let changed = vec![true; model.drawables.len()];

		let mut engine = Self {
			model,
			ticks_per_second,
			ticks: 0,
			values,
			deformed,
			changed,
		};
		engine.deform();
		// nothing has been read yet, so everything counts as changed on the first query
		engine.changed.fill(true);
		Ok(engine)
	}

	pub fn model(&self) -> &ScriptedModel {
		&self.model
	}

	/// Edits take effect on the next [`CubismEngine::update()`].
	pub fn model_mut(&mut self) -> &mut ScriptedModel {
		&mut self.model
	}

	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Simulated time in seconds.
	pub fn elapsed(&self) -> f32 {
		self.ticks as f32 / self.ticks_per_second as f32
	}

	pub fn parameter_value(&self, index: usize) -> Option<f32> {
		self.values.get(index).copied()
	}

	fn deform(&mut self) {
		self.deformed.resize_with(self.model.drawables.len(), Vec::new);
		self.changed.resize(self.model.drawables.len(), true);

		for ((drawable, deformed), changed) in (self.model.drawables.iter())
			.zip(self.deformed.iter_mut())
			.zip(self.changed.iter_mut())
		{
			let shift: Vec2 = (drawable.bindings.iter())
				.map(|b| b.offset * self.values[b.parameter])
				.sum();

			*changed = deformed.len() != drawable.positions.len()
				|| (deformed.iter().zip(&drawable.positions)).any(|(d, p)| *d != *p + shift);

			deformed.clear();
			deformed.extend(drawable.positions.iter().map(|p| *p + shift));
		}
	}
}

impl CubismEngine for ScriptedEngine {
	fn drawable_count(&self) -> usize {
		self.model.drawables.len()
	}

	fn canvas_size(&self) -> Vec2 {
		self.model.canvas_size
	}

	fn canvas_size_pixels(&self) -> UVec2 {
		self.model.canvas_size_pixels
	}

	fn pixels_per_unit(&self) -> f32 {
		self.model.pixels_per_unit
	}

	fn parameter_count(&self) -> usize {
		self.model.parameters.len()
	}

	fn parameter_id(&self, index: usize) -> &str {
		&self.model.parameters[index].id
	}

	fn texture_index(&self, drawable: usize) -> usize {
		self.model.drawables[drawable].texture_index
	}

	fn texture_file_name(&self, texture: usize) -> Option<&Path> {
		self.model.textures.get(texture).map(PathBuf::as_path)
	}

	fn drawable_id(&self, drawable: usize) -> &str {
		&self.model.drawables[drawable].id
	}

	fn vertex_count(&self, drawable: usize) -> usize {
		self.model.drawables[drawable].positions.len()
	}

	fn vertex_positions(&self, drawable: usize) -> &[Vec2] {
		&self.deformed[drawable]
	}

	fn vertex_uvs(&self, drawable: usize) -> &[Vec2] {
		&self.model.drawables[drawable].uvs
	}

	fn index_count(&self, drawable: usize) -> usize {
		self.model.drawables[drawable].indices.len()
	}

	fn vertex_indices(&self, drawable: usize) -> &[u16] {
		&self.model.drawables[drawable].indices
	}

	fn opacity(&self, drawable: usize) -> f32 {
		self.model.drawables[drawable].opacity
	}

	fn blend_mode(&self, drawable: usize) -> i32 {
		self.model.drawables[drawable].blend_mode
	}

	fn mask_count(&self, drawable: usize) -> usize {
		self.model.drawables[drawable].masks.len()
	}

	fn masks(&self, drawable: usize) -> &[i32] {
		&self.model.drawables[drawable].masks
	}

	fn is_inverted_mask(&self, drawable: usize) -> bool {
		self.model.drawables[drawable].inverted_mask
	}

	fn culling(&self, drawable: usize) -> i32 {
		self.model.drawables[drawable].culling
	}

	fn is_visible(&self, drawable: usize) -> bool {
		self.model.drawables[drawable].visible
	}

	fn vertex_positions_did_change(&self, drawable: usize) -> bool {
		self.changed[drawable]
	}

	fn render_orders(&self) -> &[i32] {
		&self.model.render_orders
	}

	fn update(&mut self) {
		self.ticks += 1;
		for (value, param) in self.values.iter_mut().zip(&self.model.parameters) {
			*value = param.default;
		}
		self.values.resize(self.model.parameters.len(), 0.0);
		self.deform();
		debug!("Scripted engine advanced to tick {}", self.ticks);
	}

	fn add_parameter_value(&mut self, index: usize, delta: f32) {
		self.values[index] += delta;
		self.deform();
	}
}
