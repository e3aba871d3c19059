pub mod order;
pub mod shader;
pub mod software;
pub mod surface;

use tracing::debug;

use crate::math::viewport::Viewport;
use crate::model::{Drawable, ModelState};

/// A rendering backend for a loaded model.
///
/// "Bring your own backend": [`draw()`] walks the model in draw order and calls these hooks,
/// the backend decides how pixels are produced.
/// [`software::SoftwareRenderer`] is the CPU implementation shipped here.
///
/// Masked drawables go through the hooks in this order, once per drawable:
/// `on_begin_masks`, `draw_mask` for every mask, `draw_masked_content`, `on_end_masks`.
pub trait CubismRenderer {
	/// Start a frame on an empty virtual canvas.
	fn clear_canvas(&mut self);

	/// Draw an unmasked drawable straight into the canvas, alpha scaled by its opacity.
	fn draw_direct(&mut self, model: &ModelState, drawable: &Drawable);

	/// Reset the mask and working buffers for `drawable`.
	fn on_begin_masks(&mut self, drawable: &Drawable);
	/// Accumulate the alpha silhouette of one mask drawable into the mask buffer.
	fn draw_mask(&mut self, model: &ModelState, mask: &Drawable);
	/// Draw the masked drawable itself into the working buffer, alpha scaled by its opacity.
	fn draw_masked_content(&mut self, model: &ModelState, drawable: &Drawable);
	/// Combine the working buffer with the mask buffer into the canvas.
	fn on_end_masks(&mut self, drawable: &Drawable);

	/// Scale the finished canvas onto the window.
	fn present(&mut self, viewport: &Viewport);
}

/// Draw dispatch implemented for every [`CubismRenderer`].
pub trait CubismRendererCommon {
	/// Run the full mask pass for the drawable at `index`, even if it has no masks.
	fn draw_masked(&mut self, model: &ModelState, index: usize);

	/// Composite every visible drawable in draw order, then present.
	fn draw_model(&mut self, model: &ModelState, viewport: &Viewport);
}

impl<T: CubismRenderer> CubismRendererCommon for T {
	fn draw_masked(&mut self, model: &ModelState, index: usize) {
		let drawables = model.drawables();
		let drawable = &drawables[index];

		self.on_begin_masks(drawable);
		for &mask in &drawable.masks {
			self.draw_mask(model, &drawables[mask]);
		}
		self.draw_masked_content(model, drawable);
		self.on_end_masks(drawable);
	}

	fn draw_model(&mut self, model: &ModelState, viewport: &Viewport) {
		self.clear_canvas();

		let mut drawn = 0;
		for &index in model.render_orders() {
			let drawable = &model.drawables()[index];
			if drawable.is_skipped() {
				continue;
			}

			if drawable.masks.is_empty() {
				self.draw_direct(model, drawable);
			} else {
				self.draw_masked(model, index);
			}
			drawn += 1;
		}
		debug!("Composited {} of {} drawables", drawn, model.drawables().len());

		self.present(viewport);
	}
}

/// Draws one frame of `model` with the provided renderer.
///
/// Nothing shows up unless the renderer's `present()` gets its canvas somewhere visible,
/// e.g. [`software::SoftwareRenderer::window_image()`].
pub fn draw<T: CubismRenderer>(renderer: &mut T, model: &ModelState, viewport: &Viewport) {
	renderer.draw_model(model, viewport);
}

#[cfg(test)]
mod tests {
	use glam::uvec2;

	use super::*;
	use crate::model::tests::{quad, scripted, textures};

	/// Intercepts draw calls instead of producing pixels.
	#[derive(Default)]
	struct CallLog(Vec<String>);

	impl CubismRenderer for CallLog {
		fn clear_canvas(&mut self) {
			self.0.push("clear".to_owned());
		}

		fn draw_direct(&mut self, _model: &ModelState, drawable: &Drawable) {
			self.0.push(format!("direct {}", drawable.id.as_str()));
		}

		fn on_begin_masks(&mut self, drawable: &Drawable) {
			self.0.push(format!("begin masks {}", drawable.id.as_str()));
		}

		fn draw_mask(&mut self, _model: &ModelState, mask: &Drawable) {
			self.0.push(format!("mask {}", mask.id.as_str()));
		}

		fn draw_masked_content(&mut self, _model: &ModelState, drawable: &Drawable) {
			self.0.push(format!("content {}", drawable.id.as_str()));
		}

		fn on_end_masks(&mut self, drawable: &Drawable) {
			self.0.push(format!("end masks {}", drawable.id.as_str()));
		}

		fn present(&mut self, _viewport: &Viewport) {
			self.0.push("present".to_owned());
		}
	}

	fn draw_calls(engine: &crate::engine::ScriptedEngine) -> Vec<String> {
		let model = ModelState::load(engine, textures()).unwrap();
		let viewport = Viewport::compute(model.canvas_units(), model.canvas_size(), uvec2(16, 16));
		let mut log = CallLog::default();
		draw(&mut log, &model, &viewport);
		log.0
	}

	#[test]
	fn follows_resolved_render_order() {
		let mut engine = scripted(vec![
			quad("A", 0, (-1.0, -1.0), (1.0, 1.0)),
			quad("B", 1, (-1.0, -1.0), (1.0, 1.0)),
		]);
		engine.model_mut().render_orders = vec![1, 0];
		crate::engine::CubismEngine::update(&mut engine);

		assert_eq!(draw_calls(&engine), ["clear", "direct B", "direct A", "present"]);
	}

	#[test]
	fn skips_invisible_and_transparent_drawables() {
		let mut hidden = quad("Hidden", 0, (-1.0, -1.0), (1.0, 1.0));
		hidden.visible = false;
		let mut clear = quad("Clear", 0, (-1.0, -1.0), (1.0, 1.0));
		clear.opacity = 0.0;
		let engine = scripted(vec![hidden, clear, quad("Shown", 0, (-1.0, -1.0), (1.0, 1.0))]);

		assert_eq!(draw_calls(&engine), ["clear", "direct Shown", "present"]);
	}

	#[test]
	fn masked_drawables_run_the_mask_pass() {
		let mut face = quad("Face", 1, (-1.0, -1.0), (1.0, 1.0));
		face.masks = vec![0, 2];
		// masks are still used when hidden themselves
		let mut clip = quad("Clip", 0, (-1.0, -1.0), (1.0, 1.0));
		clip.visible = false;
		let engine = scripted(vec![
			quad("Skin", 0, (-1.0, -1.0), (1.0, 1.0)),
			face,
			clip,
		]);

		assert_eq!(
			draw_calls(&engine),
			[
				"clear",
				"direct Skin",
				"begin masks Face",
				"mask Skin",
				"mask Clip",
				"content Face",
				"end masks Face",
				"present"
			]
		);
	}
}
