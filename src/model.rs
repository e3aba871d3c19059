use glam::{UVec2, Vec2};
use tracing::{debug, info};

use crate::engine::CubismEngine;
use crate::math::vertex::{transform_vertices, Vertex};
use crate::params::ParameterMap;
use crate::render::order::{resolve_render_orders, RenderOrderError};
use crate::texture::{ShallowTexture, TextureMap};

/// Compositing rule tagged on a drawable by the engine.
///
/// Informational for now: unmasked drawables are all composited with normal blending, whatever the mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
	#[default]
	Normal,
	Additive,
	Multiply,
	Mask,
}

impl BlendMode {
	pub const VALUES: [BlendMode; 4] = [BlendMode::Normal, BlendMode::Additive, BlendMode::Multiply, BlendMode::Mask];

	pub fn from_code(code: i32) -> Option<Self> {
		usize::try_from(code).ok().and_then(|i| Self::VALUES.get(i)).copied()
	}
}

/// Backface culling code as reported by the engine. Not applied by the compositors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Culling(pub i32);

/// Stable engine-side name of a drawable. For lookups and logs, never for ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DrawableId(String);

impl DrawableId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// One textured triangle mesh of the model, as of the last refresh.
#[derive(Clone, Debug, Default)]
pub struct Drawable {
	/// Fixed at load.
	pub texture_index: usize,
	pub vertex_positions: Vec<Vec2>,
	pub vertex_uvs: Vec<Vec2>,
	pub vertex_indices: Vec<u16>,
	pub id: DrawableId,
	pub opacity: f32,
	pub blend_mode: BlendMode,
	/// Drawables whose alpha clips this one. Empty means unmasked.
	pub masks: Vec<usize>,
	pub is_inverted_mask: bool,
	pub culling: Culling,
	pub is_visible: bool,
	pub vertex_positions_did_change: bool,
	/// Canvas-space vertices rebuilt from positions and UVs on every refresh.
	pub vertices: Vec<Vertex>,
}

impl Drawable {
	/// Whether the drawable contributes nothing this tick.
	pub fn is_skipped(&self) -> bool {
		!self.is_visible || self.opacity <= 0.0
	}

	pub fn triangle_count(&self) -> usize {
		self.vertex_indices.len() / 3
	}
}

/// The engine violated its contract. Fatal for the session.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
	#[error("Engine reports an empty canvas ({0})")]
	EmptyCanvas(UVec2),
	#[error("Drawable count changed from {loaded} to {now}")]
	DrawableCountChanged { loaded: usize, now: usize },
	#[error("Drawable {drawable}: {positions} positions and {uvs} UVs for {expected} vertices")]
	VertexBufferLength {
		drawable: usize,
		expected: usize,
		positions: usize,
		uvs: usize,
	},
	#[error("Drawable {drawable}: index buffer has {got} entries, expected {expected}")]
	IndexBufferLength { drawable: usize, expected: usize, got: usize },
	#[error("Drawable {drawable}: {count} indices do not form whole triangles")]
	IncompleteTriangle { drawable: usize, count: usize },
	#[error("Drawable {drawable}: vertex index {index} out of range for {vertex_count} vertices")]
	VertexIndexOutOfRange {
		drawable: usize,
		index: u16,
		vertex_count: usize,
	},
	#[error("Drawable {drawable}: mask buffer has {got} entries, expected {expected}")]
	MaskBufferLength { drawable: usize, expected: usize, got: usize },
	#[error("Drawable {drawable}: mask {mask} out of range for {count} drawables")]
	MaskOutOfRange { drawable: usize, mask: i32, count: usize },
	#[error("Drawable {0} masks itself")]
	SelfMask(usize),
	#[error("Drawable {0} is part of a mask cycle")]
	MaskCycle(usize),
	#[error("Drawable {drawable}: unknown blend mode code {code}")]
	UnknownBlendMode { drawable: usize, code: i32 },
	#[error("Drawable {drawable} uses texture {texture}, which is not loaded")]
	MissingTexture { drawable: usize, texture: usize },
	#[error(transparent)]
	RenderOrder(#[from] RenderOrderError),
}

/// Per-model render state: drawables, draw sequence, textures and parameter names.
///
/// Drawable indices are stable for the whole session. Per-tick fields are overwritten in full on every
/// `.refresh()`, reusing the previous allocations.
pub struct ModelState {
	drawables: Vec<Drawable>,
	render_orders: Vec<usize>,
	textures: TextureMap,
	parameters: ParameterMap,
	canvas_size: UVec2,
	canvas_units: Vec2,
}

impl ModelState {
	/// Reads the static parts of the model, then does a first refresh.
	pub fn load(engine: &impl CubismEngine, textures: TextureMap) -> Result<Self, ModelError> {
		let canvas_size = engine.canvas_size_pixels();
		if canvas_size.x == 0 || canvas_size.y == 0 {
			return Err(ModelError::EmptyCanvas(canvas_size));
		}

		let drawables = (0..engine.drawable_count())
			.map(|i| Drawable {
				texture_index: engine.texture_index(i),
				..Default::default()
			})
			.collect::<Vec<_>>();

		let mut model = Self {
			drawables,
			render_orders: Vec::new(),
			textures,
			parameters: ParameterMap::from_engine(engine),
			canvas_size,
			canvas_units: engine.canvas_size(),
		};
		model.refresh(engine)?;

		info!(
			"Loaded model: {} drawables, {} textures, {} parameters, {}x{} canvas",
			model.drawables.len(),
			model.textures.len(),
			model.parameters.len(),
			canvas_size.x,
			canvas_size.y
		);
		Ok(model)
	}

	/// Pulls this tick's state of every drawable and the draw sequence out of the engine.
	pub fn refresh(&mut self, engine: &impl CubismEngine) -> Result<(), ModelError> {
		let now = engine.drawable_count();
		if now != self.drawables.len() {
			return Err(ModelError::DrawableCountChanged {
				loaded: self.drawables.len(),
				now,
			});
		}

		for i in 0..self.drawables.len() {
			self.refresh_drawable(engine, i)?;
		}
		self.check_mask_cycles()?;
		resolve_render_orders(engine.render_orders(), self.drawables.len(), &mut self.render_orders)?;

		debug!("Refreshed {} drawables", self.drawables.len());
		Ok(())
	}

	fn refresh_drawable(&mut self, engine: &impl CubismEngine, i: usize) -> Result<(), ModelError> {
		let count = self.drawables.len();
		let Self {
			drawables,
			textures,
			canvas_size,
			..
		} = self;
		let drawable = &mut drawables[i];

		let texture = textures.get(&drawable.texture_index).ok_or(ModelError::MissingTexture {
			drawable: i,
			texture: drawable.texture_index,
		})?;

		let vertex_count = engine.vertex_count(i);
		let positions = engine.vertex_positions(i);
		let uvs = engine.vertex_uvs(i);
		if positions.len() != vertex_count || uvs.len() != vertex_count {
			return Err(ModelError::VertexBufferLength {
				drawable: i,
				expected: vertex_count,
				positions: positions.len(),
				uvs: uvs.len(),
			});
		}

		let index_count = engine.index_count(i);
		let indices = engine.vertex_indices(i);
		if indices.len() != index_count {
			return Err(ModelError::IndexBufferLength {
				drawable: i,
				expected: index_count,
				got: indices.len(),
			});
		}
		if index_count % 3 != 0 {
			return Err(ModelError::IncompleteTriangle {
				drawable: i,
				count: index_count,
			});
		}
		if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertex_count) {
			return Err(ModelError::VertexIndexOutOfRange {
				drawable: i,
				index,
				vertex_count,
			});
		}

		let mask_count = engine.mask_count(i);
		let masks = engine.masks(i);
		if masks.len() != mask_count {
			return Err(ModelError::MaskBufferLength {
				drawable: i,
				expected: mask_count,
				got: masks.len(),
			});
		}
		drawable.masks.clear();
		for &mask in masks {
			let index = match usize::try_from(mask) {
				Ok(index) if index < count => index,
				_ => return Err(ModelError::MaskOutOfRange { drawable: i, mask, count }),
			};
			if index == i {
				return Err(ModelError::SelfMask(i));
			}
			drawable.masks.push(index);
		}

		let code = engine.blend_mode(i);
		drawable.blend_mode = BlendMode::from_code(code).ok_or(ModelError::UnknownBlendMode { drawable: i, code })?;

		drawable.vertex_positions.clear();
		drawable.vertex_positions.extend_from_slice(positions);
		drawable.vertex_uvs.clear();
		drawable.vertex_uvs.extend_from_slice(uvs);
		drawable.vertex_indices.clear();
		drawable.vertex_indices.extend_from_slice(indices);

		let id = engine.drawable_id(i);
		if drawable.id.0 != id {
			drawable.id.0.clear();
			drawable.id.0.push_str(id);
		}
		drawable.opacity = engine.opacity(i);
		drawable.is_inverted_mask = engine.is_inverted_mask(i);
		drawable.culling = Culling(engine.culling(i));
		drawable.is_visible = engine.is_visible(i);
		drawable.vertex_positions_did_change = engine.vertex_positions_did_change(i);

		transform_vertices(
			&drawable.vertex_positions,
			&drawable.vertex_uvs,
			canvas_size.as_vec2(),
			Vec2::new(texture.width() as f32, texture.height() as f32),
			&mut drawable.vertices,
		);

		Ok(())
	}

	/// Masks may not reference each other in a loop.
	fn check_mask_cycles(&self) -> Result<(), ModelError> {
		#[derive(Clone, Copy, PartialEq)]
		enum Mark {
			New,
			Active,
			Done,
		}

		if self.drawables.iter().all(|d| d.masks.is_empty()) {
			return Ok(());
		}

		let mut marks = vec![Mark::New; self.drawables.len()];
		let mut stack = Vec::new();

		for root in 0..self.drawables.len() {
			if marks[root] != Mark::New {
				continue;
			}
			marks[root] = Mark::Active;
			stack.push((root, 0));

			while let Some((node, next)) = stack.last_mut() {
				let node = *node;
				match self.drawables[node].masks.get(*next) {
					Some(&mask) => {
						*next += 1;
						match marks[mask] {
							Mark::Active => return Err(ModelError::MaskCycle(mask)),
							Mark::New => {
								marks[mask] = Mark::Active;
								stack.push((mask, 0));
							}
							Mark::Done => (),
						}
					}
					None => {
						marks[node] = Mark::Done;
						stack.pop();
					}
				}
			}
		}

		Ok(())
	}

	pub fn drawables(&self) -> &[Drawable] {
		&self.drawables
	}

	pub fn drawable(&self, index: usize) -> Option<&Drawable> {
		self.drawables.get(index)
	}

	/// `render_orders()[position] = drawable index`, back to front.
	pub fn render_orders(&self) -> &[usize] {
		&self.render_orders
	}

	pub fn textures(&self) -> &TextureMap {
		&self.textures
	}

	/// Texture of one of this model's drawables.
	///
	/// Loading and refreshing fail with [`ModelError::MissingTexture`] first, so every drawable
	/// handed out by the model has its texture.
	pub fn texture_of(&self, drawable: &Drawable) -> &ShallowTexture {
		&self.textures[&drawable.texture_index]
	}

	pub fn parameters(&self) -> &ParameterMap {
		&self.parameters
	}

	/// Virtual canvas size in pixels.
	pub fn canvas_size(&self) -> UVec2 {
		self.canvas_size
	}

	/// Canvas size in model units.
	pub fn canvas_units(&self) -> Vec2 {
		self.canvas_units
	}
}
