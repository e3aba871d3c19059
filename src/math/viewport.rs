use glam::{vec2, Affine2, UVec2, Vec2};

/// Scaling of the fixed-size virtual canvas onto the window.
///
/// Anchored at the window's top-left corner: the canvas is squeezed along one axis to keep the model's
/// aspect ratio, and the remaining window area is left to the background. No centering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Aspect correction, one component is always `1`.
	pub scale: Vec2,
	pub canvas: UVec2,
	pub window: UVec2,
}

impl Viewport {
	/// `canvas_units` is the canvas size in model units as reported by the engine,
	/// models wider than one unit switch to squeezing Y when the window is taller than wide.
	pub fn compute(canvas_units: Vec2, canvas: UVec2, window: UVec2) -> Self {
		let scale = if window.x == 0 || window.y == 0 {
			Vec2::ONE
		} else {
			let (w, h) = (window.x as f32, window.y as f32);
			if canvas_units.x > 1.0 && window.x < window.y {
				vec2(1.0, w / h)
			} else {
				vec2(h / w, 1.0)
			}
		};

		Self { scale, canvas, window }
	}

	/// Total transform from canvas pixels to window pixels.
	pub fn canvas_to_window(&self) -> Affine2 {
		if self.canvas.x == 0 || self.canvas.y == 0 {
			return Affine2::from_scale(Vec2::ZERO);
		}
		Affine2::from_scale(self.scale * self.window.as_vec2() / self.canvas.as_vec2())
	}

	/// Inverse of `.canvas_to_window()`, or `None` if the canvas collapses to nothing on screen.
	pub fn window_to_canvas(&self) -> Option<Affine2> {
		let forward = self.canvas_to_window();
		if forward.matrix2.determinant() == 0.0 {
			None
		} else {
			Some(forward.inverse())
		}
	}
}
