use glam::{UVec2, Vec2};
use tracing::{debug, info, warn};

use crate::config::{normalize_pointer, PlayerConfig, TrackingInput};
use crate::engine::CubismEngine;
use crate::math::viewport::Viewport;
use crate::model::{ModelError, ModelState};
use crate::params::SetParamError;
use crate::render::software::SoftwareRenderer;
use crate::render::{draw, CubismRenderer};
use crate::texture::{load_engine_textures, TextureError, TextureMap};

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
	#[error("Could not load textures: {0}")]
	Texture(#[from] TextureError),
	#[error("Invalid model: {0}")]
	Model(#[from] ModelError),
}

/// A tracking target resolved against the model's parameters.
#[derive(Clone, Copy, Debug)]
struct TrackedParameter {
	index: usize,
	input: TrackingInput,
	gain: f32,
}

/// Drives one model: advances the engine, feeds it input, keeps the render state in sync and draws it.
///
/// Every `.tick()` produces exactly one state that the following `.draw()` calls consume.
pub struct Player<E: CubismEngine> {
	engine: E,
	model: ModelState,
	viewport: Viewport,
	config: PlayerConfig,
	pointer: Option<Vec2>,
	tracked: Vec<TrackedParameter>,
	/// Parameter deltas waiting for the next tick.
	pending: Vec<(usize, f32)>,
}

impl<E: CubismEngine> Player<E> {
	/// Decodes the textures the engine's model uses, then loads it.
	pub fn load(engine: E, config: PlayerConfig) -> Result<Self, PlayerError> {
		let textures = load_engine_textures(&engine)?;
		Self::new(engine, textures, config)
	}

	pub fn new(engine: E, textures: TextureMap, config: PlayerConfig) -> Result<Self, PlayerError> {
		let model = ModelState::load(&engine, textures)?;

		let mut tracked = Vec::new();
		if config.tracking.enabled {
			for target in &config.tracking.targets {
				match model.parameters().get(&target.parameter) {
					Some(index) => tracked.push(TrackedParameter {
						index,
						input: target.input,
						gain: target.gain,
					}),
					None => warn!("Model has no parameter {}, it will not follow the pointer", target.parameter),
				}
			}
		}
		info!("Head tracking drives {} parameters", tracked.len());

		let viewport = Viewport::compute(model.canvas_units(), model.canvas_size(), config.window_size);
		Ok(Self {
			engine,
			model,
			viewport,
			config,
			pointer: None,
			tracked,
			pending: Vec::new(),
		})
	}

	/// New window size in pixels. The canvas keeps its size, only the way it is scaled changes.
	pub fn resize(&mut self, window: UVec2) {
		self.config.window_size = window;
		self.update_viewport();
	}

	/// Pointer position in window pixels, `None` when the window does not have focus.
	pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
		self.pointer = pointer;
	}

	/// Adds `delta` to the named parameter on the next tick, on top of whatever pose the engine computes.
	pub fn add_parameter_value(&mut self, name: &str, delta: f32) -> Result<(), SetParamError> {
		let index = self.model.parameters().index_of(name)?;
		self.pending.push((index, delta));
		Ok(())
	}

	/// Advances the model by one tick.
	pub fn tick(&mut self) -> Result<(), ModelError> {
		self.engine.update();

		for (index, delta) in self.pending.drain(..) {
			self.engine.add_parameter_value(index, delta);
		}
		self.apply_tracking();

		self.model.refresh(&self.engine)?;
		self.update_viewport();
		Ok(())
	}

	fn apply_tracking(&mut self) {
		let Some(pointer) = self.pointer.and_then(|p| normalize_pointer(p, self.config.window_size)) else {
			return;
		};
		debug!("Tracking pointer at {}", pointer);

		for tracked in &self.tracked {
			let delta = tracked.input.select(pointer) * tracked.gain;
			self.engine.add_parameter_value(tracked.index, delta);
		}
	}

	fn update_viewport(&mut self) {
		self.viewport = Viewport::compute(self.model.canvas_units(), self.model.canvas_size(), self.config.window_size);
	}

	/// Draws the state of the last tick.
	pub fn draw<R: CubismRenderer>(&self, renderer: &mut R) {
		draw(renderer, &self.model, &self.viewport);
	}

	/// A software renderer sized and colored for this player.
	pub fn software_renderer(&self) -> SoftwareRenderer {
		let mut renderer = SoftwareRenderer::new(self.model.canvas_size())
			.with_clear_colors(self.config.canvas_clear, self.config.window_background);
		renderer.resize(self.config.window_size);
		renderer
	}

	pub fn engine(&self) -> &E {
		&self.engine
	}

	pub fn engine_mut(&mut self) -> &mut E {
		&mut self.engine
	}

	pub fn model(&self) -> &ModelState {
		&self.model
	}

	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	pub fn config(&self) -> &PlayerConfig {
		&self.config
	}

	pub fn pointer(&self) -> Option<Vec2> {
		self.pointer
	}
}
