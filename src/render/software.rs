use glam::{vec4, UVec2, Vec2, Vec4};
use image::RgbaImage;
use tracing::debug;

use super::shader::CompositeMaskShader;
use super::surface::{premultiply, Surface};
use super::CubismRenderer;
use crate::math::triangle::rasterize;
use crate::math::viewport::Viewport;
use crate::model::{Drawable, ModelState};

/// Where the renderer is within the mask pass of one drawable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MaskStage {
	Idle,
	DrawMasks,
	DrawTarget,
}

/// Texel multiplier that keeps alpha only.
const MASK_SILHOUETTE: Vec4 = vec4(0.0, 0.0, 0.0, 1.0);

/// CPU compositor. Everything is drawn into a canvas of the model's pixel size, which is then scaled onto
/// a window surface of arbitrary size by `.present()`.
///
/// Masked drawables are drawn through two scratch surfaces of canvas size: a mask buffer collecting the
/// alpha of all masks, and a working buffer holding the drawable alone.
pub struct SoftwareRenderer {
	canvas: Surface,
	mask_buffer: Surface,
	working_buffer: Surface,
	window: Surface,
	stage: MaskStage,
	canvas_clear: Vec4,
	window_clear: Vec4,
}

impl SoftwareRenderer {
	/// Transparent canvas on a white window. The window starts out at canvas size.
	pub fn new(canvas_size: UVec2) -> Self {
		Self {
			canvas: Surface::new(canvas_size),
			mask_buffer: Surface::new(canvas_size),
			working_buffer: Surface::new(canvas_size),
			window: Surface::new(canvas_size),
			stage: MaskStage::Idle,
			canvas_clear: Vec4::ZERO,
			window_clear: Vec4::ONE,
		}
	}

	/// Replaces the colors the canvas and the window are cleared to, straight RGBA8.
	pub fn with_clear_colors(mut self, canvas: [u8; 4], window: [u8; 4]) -> Self {
		self.canvas_clear = premultiply(canvas);
		self.window_clear = premultiply(window);
		self
	}

	/// Sets the size of the window surface. Takes effect on the next `.present()`.
	pub fn resize(&mut self, window: UVec2) {
		self.window.resize(window);
	}

	pub fn canvas(&self) -> &Surface {
		&self.canvas
	}

	pub fn window(&self) -> &Surface {
		&self.window
	}

	pub fn canvas_image(&self) -> RgbaImage {
		self.canvas.to_rgba8()
	}

	/// The last presented frame.
	pub fn window_image(&self) -> RgbaImage {
		self.window.to_rgba8()
	}
}

/// Rasterizes every triangle of `drawable` into `target`, texels multiplied by `scale` and blended source-over.
fn draw_triangles(target: &mut Surface, model: &ModelState, drawable: &Drawable, scale: Vec4) {
	let texture = model.texture_of(drawable);
	let (width, height) = (target.width(), target.height());
	let vertices = &drawable.vertices;

	for triangle in drawable.vertex_indices.chunks_exact(3) {
		let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| vertices[i as usize]);
		rasterize([a.dst, b.dst, c.dst], width, height, |x, y, weights| {
			let src: Vec2 = a.src * weights.x + b.src * weights.y + c.src * weights.z;
			let texel = texture.sample_nearest(src.x, src.y);
			target.blend(x, y, texel * scale);
		});
	}
}

impl CubismRenderer for SoftwareRenderer {
	fn clear_canvas(&mut self) {
		debug_assert_eq!(self.stage, MaskStage::Idle, "Canvas cleared in the middle of a mask pass");
		self.canvas.fill(self.canvas_clear);
	}

	fn draw_direct(&mut self, model: &ModelState, drawable: &Drawable) {
		debug_assert_eq!(self.stage, MaskStage::Idle);
		draw_triangles(&mut self.canvas, model, drawable, Vec4::splat(drawable.opacity));
	}

	fn on_begin_masks(&mut self, drawable: &Drawable) {
		debug_assert_eq!(self.stage, MaskStage::Idle);

		let size = self.canvas.size();
		self.mask_buffer.resize(size);
		self.working_buffer.resize(size);

		// no masks at all means nothing is clipped
		if drawable.masks.is_empty() {
			self.mask_buffer.fill(MASK_SILHOUETTE);
		} else {
			self.mask_buffer.fill(Vec4::ZERO);
		}
		self.working_buffer.fill(Vec4::ZERO);

		self.stage = MaskStage::DrawMasks;
	}

	fn draw_mask(&mut self, model: &ModelState, mask: &Drawable) {
		debug_assert_eq!(self.stage, MaskStage::DrawMasks);
		draw_triangles(&mut self.mask_buffer, model, mask, MASK_SILHOUETTE);
	}

	fn draw_masked_content(&mut self, model: &ModelState, drawable: &Drawable) {
		debug_assert_eq!(self.stage, MaskStage::DrawMasks);
		draw_triangles(&mut self.working_buffer, model, drawable, Vec4::splat(drawable.opacity));
		self.stage = MaskStage::DrawTarget;
	}

	fn on_end_masks(&mut self, drawable: &Drawable) {
		debug_assert_eq!(self.stage, MaskStage::DrawTarget);

		let shader = CompositeMaskShader {
			inverted: drawable.is_inverted_mask && !drawable.masks.is_empty(),
		};
		shader.draw(&mut self.canvas, &self.mask_buffer, &self.working_buffer);

		self.stage = MaskStage::Idle;
	}

	fn present(&mut self, viewport: &Viewport) {
		debug_assert_eq!(self.stage, MaskStage::Idle);
		debug_assert_eq!(viewport.canvas, self.canvas.size());

		self.window.resize(viewport.window);
		self.window.fill(self.window_clear);

		let Some(window_to_canvas) = viewport.window_to_canvas() else {
			debug!("Canvas has no area on the window, presenting background only");
			return;
		};

		let bounds = self.canvas.size().as_vec2();
		for y in 0..self.window.height() {
			for x in 0..self.window.width() {
				let p = window_to_canvas.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
				if p.x < 0.0 || p.y < 0.0 || p.x >= bounds.x || p.y >= bounds.y {
					continue;
				}
				self.window.blend(x, y, self.canvas.sample_bilinear(p));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use glam::uvec2;

	use super::*;
	use crate::engine::ScriptedDrawable;
	use crate::model::tests::{quad, scripted, textures};
	use crate::render::{draw, CubismRendererCommon};

	const RED: Vec4 = vec4(1.0, 0.0, 0.0, 1.0);
	const BLUE: Vec4 = vec4(0.0, 0.0, 1.0, 1.0);

	fn model(drawables: Vec<ScriptedDrawable>) -> ModelState {
		ModelState::load(&scripted(drawables), textures()).unwrap()
	}

	fn render(model: &ModelState, window: UVec2) -> SoftwareRenderer {
		let mut renderer = SoftwareRenderer::new(model.canvas_size());
		let viewport = Viewport::compute(model.canvas_units(), model.canvas_size(), window);
		draw(&mut renderer, model, &viewport);
		renderer
	}

	/// Red clip over the left half of the canvas, blue face over all of it, masked by the clip.
	fn clipped_face(inverted: bool) -> Vec<ScriptedDrawable> {
		let mut face = quad("Face", 1, (-1.0, -1.0), (1.0, 1.0));
		face.masks = vec![0];
		face.inverted_mask = inverted;
		vec![quad("Clip", 0, (-1.0, -1.0), (0.0, 1.0)), face]
	}

	#[test]
	fn direct_draw_follows_the_mesh() {
		let renderer = render(&model(vec![quad("Clip", 0, (-1.0, -1.0), (0.0, 1.0))]), uvec2(16, 16));
		let canvas = renderer.canvas();
		assert_eq!(canvas.pixel(0, 0), RED);
		assert_eq!(canvas.pixel(7, 15), RED);
		assert_eq!(canvas.pixel(8, 0), Vec4::ZERO);
		assert_eq!(canvas.pixel(15, 15), Vec4::ZERO);
	}

	#[test]
	fn mask_clips_to_mask_alpha() {
		let renderer = render(&model(clipped_face(false)), uvec2(16, 16));
		let canvas = renderer.canvas();
		for y in 0..16 {
			assert_eq!(canvas.pixel(4, y), BLUE);
			assert_eq!(canvas.pixel(12, y), Vec4::ZERO);
		}
	}

	#[test]
	fn inverted_mask_shows_outside_of_mask() {
		let renderer = render(&model(clipped_face(true)), uvec2(16, 16));
		let canvas = renderer.canvas();
		for y in 0..16 {
			assert_eq!(canvas.pixel(4, y), RED);
			assert_eq!(canvas.pixel(12, y), BLUE);
		}
	}

	#[test]
	fn normal_and_inverted_masks_partition_the_drawable() {
		let alphas = |inverted: bool| {
			let mut drawables = clipped_face(inverted);
			// hidden drawables still clip
			drawables[0].visible = false;
			drawables[1].opacity = 0.8;
			let renderer = render(&model(drawables), uvec2(16, 16));
			renderer.canvas().pixels().iter().map(|p| p.w).collect::<Vec<_>>()
		};

		let (normal, inverted) = (alphas(false), alphas(true));
		assert!(normal.iter().any(|&a| a > 0.0));
		assert!(inverted.iter().any(|&a| a > 0.0));
		for (n, i) in normal.iter().zip(&inverted) {
			assert!((n + i - 0.8).abs() < 1e-6, "{n} + {i}");
		}
	}

	#[test]
	fn empty_mask_list_matches_direct_draw() {
		let mut top = quad("Top", 1, (-0.5, -1.0), (1.0, 0.5));
		top.opacity = 0.4;
		let model = model(vec![quad("Bottom", 0, (-1.0, -1.0), (0.5, 1.0)), top]);

		let direct = render(&model, uvec2(16, 16));

		let mut masked = SoftwareRenderer::new(model.canvas_size());
		masked.clear_canvas();
		masked.draw_direct(&model, &model.drawables()[0]);
		masked.draw_masked(&model, 1);

		for (d, m) in direct.canvas().pixels().iter().zip(masked.canvas().pixels()) {
			assert!((*d - *m).abs().max_element() < 1e-6, "{d} != {m}");
		}
	}

	#[test]
	fn self_overlapping_mesh_matches_direct_draw_when_masked() {
		// every triangle drawn twice, like a mesh folded over itself
		let mut folded = quad("Folded", 0, (-1.0, -1.0), (1.0, 1.0));
		folded.indices = vec![0, 1, 2, 0, 2, 3, 0, 1, 2, 0, 2, 3];
		folded.opacity = 0.5;
		let model = model(vec![folded]);

		let direct = render(&model, uvec2(16, 16));

		let mut masked = SoftwareRenderer::new(model.canvas_size());
		masked.clear_canvas();
		masked.draw_masked(&model, 0);

		assert_eq!(direct.canvas().pixel(4, 4), vec4(0.75, 0.0, 0.0, 0.75));
		for (d, m) in direct.canvas().pixels().iter().zip(masked.canvas().pixels()) {
			assert!((*d - *m).abs().max_element() < 1e-6, "{d} != {m}");
		}
	}

	#[test]
	fn opacity_scales_direct_draws() {
		let mut drawable = quad("Half", 0, (-1.0, -1.0), (1.0, 1.0));
		drawable.opacity = 0.5;
		let renderer = render(&model(vec![drawable]), uvec2(16, 16));
		assert_eq!(renderer.canvas().pixel(3, 3), vec4(0.5, 0.0, 0.0, 0.5));
	}

	#[test]
	fn present_letterboxes_from_the_corner() {
		let model = model(vec![quad("Full", 0, (-1.0, -1.0), (1.0, 1.0))]);
		let renderer = render(&model, uvec2(32, 16));

		let window = renderer.window_image();
		assert_eq!(window.dimensions(), (32, 16));
		assert_eq!(window.get_pixel(8, 8).0, [255, 0, 0, 255]);
		assert_eq!(window.get_pixel(20, 8).0, [255, 255, 255, 255]);
	}

	#[test]
	fn present_scales_canvas_up() {
		let model = model(vec![quad("Clip", 0, (-1.0, -1.0), (0.0, 1.0))]);
		let mut renderer = SoftwareRenderer::new(model.canvas_size()).with_clear_colors([0, 0, 0, 0], [0, 255, 0, 255]);
		let viewport = Viewport::compute(model.canvas_units(), model.canvas_size(), uvec2(32, 32));
		draw(&mut renderer, &model, &viewport);

		let window = renderer.window_image();
		assert_eq!(window.get_pixel(2, 2).0, [255, 0, 0, 255]);
		assert_eq!(window.get_pixel(29, 29).0, [0, 255, 0, 255]);
	}
}
