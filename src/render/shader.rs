use glam::Vec4;

use super::surface::Surface;

/// The two-input compositing pass of masked drawables.
///
/// Inputs are a mask image, of which only alpha matters, and a working image holding the drawable itself.
/// Each output pixel is the working pixel scaled by the mask alpha (or its complement when inverted),
/// blended source-over into the target. Drawable opacity is already part of the working image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeMaskShader {
	pub inverted: bool,
}

impl CompositeMaskShader {
	/// Visible fraction of a pixel given its mask sample.
	#[inline]
	pub fn coverage(&self, mask: Vec4) -> f32 {
		if self.inverted {
			1.0 - mask.w
		} else {
			mask.w
		}
	}

	#[inline]
	pub fn shade(&self, mask: Vec4, working: Vec4) -> Vec4 {
		working * self.coverage(mask)
	}

	/// Runs the pass over the full extent of `working`. All three surfaces must have the same size.
	pub fn draw(&self, target: &mut Surface, mask: &Surface, working: &Surface) {
		debug_assert_eq!(target.size(), mask.size());
		debug_assert_eq!(target.size(), working.size());

		for y in 0..working.height() {
			for x in 0..working.width() {
				let color = self.shade(mask.pixel(x, y), working.pixel(x, y));
				target.blend(x, y, color);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use glam::{uvec2, vec4};

	use super::*;

	#[test]
	fn normal_and_inverted_sum_to_full_coverage() {
		let working = vec4(0.0, 0.0, 1.0, 1.0);
		for mask_alpha in [0.0, 0.1, 0.25, 0.5, 0.9, 1.0] {
			let mask = vec4(0.0, 0.0, 0.0, mask_alpha);
			let normal = CompositeMaskShader { inverted: false };
			let inverted = CompositeMaskShader { inverted: true };

			let sum = normal.shade(mask, working).w + inverted.shade(mask, working).w;
			assert!((sum - 1.0).abs() < 1e-6, "mask alpha {mask_alpha}: {sum}");
		}
	}

	#[test]
	fn coverage_scales_every_channel() {
		let shader = CompositeMaskShader { inverted: false };
		let shaded = shader.shade(vec4(0.0, 0.0, 0.0, 0.5), vec4(0.8, 0.4, 0.2, 1.0));
		assert_eq!(shaded, vec4(0.4, 0.2, 0.1, 0.5));

		let inverted = CompositeMaskShader { inverted: true };
		assert_eq!(inverted.shade(vec4(0.0, 0.0, 0.0, 1.0), vec4(0.8, 0.4, 0.2, 1.0)), Vec4::ZERO);
	}

	#[test]
	fn draw_blends_over_target() {
		let mut target = Surface::new(uvec2(2, 1));
		target.fill(vec4(1.0, 0.0, 0.0, 1.0));
		let mut mask = Surface::new(uvec2(2, 1));
		mask.blend(0, 0, vec4(0.0, 0.0, 0.0, 1.0));
		let mut working = Surface::new(uvec2(2, 1));
		working.fill(vec4(0.0, 1.0, 0.0, 1.0));

		let shader = CompositeMaskShader { inverted: false };
		shader.draw(&mut target, &mask, &working);

		assert_eq!(target.pixel(0, 0), vec4(0.0, 1.0, 0.0, 1.0));
		assert_eq!(target.pixel(1, 0), vec4(1.0, 0.0, 0.0, 1.0));
	}
}
