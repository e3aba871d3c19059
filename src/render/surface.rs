use glam::{vec4, UVec2, Vec2, Vec4};
use image::{Rgba, RgbaImage};

/// Premultiplied source-over.
#[inline]
pub fn over(dst: Vec4, src: Vec4) -> Vec4 {
	src + dst * (1.0 - src.w)
}

/// Straight RGBA8 to premultiplied, channels in `[0, 1]`.
pub fn premultiply(rgba: [u8; 4]) -> Vec4 {
	let [r, g, b, a] = rgba.map(|c| c as f32 / 255.0);
	vec4(r * a, g * a, b * a, a)
}

fn unpremultiply(color: Vec4) -> [u8; 4] {
	let a = color.w.clamp(0.0, 1.0);
	if a <= 0.0 {
		return [0; 4];
	}
	let to_u8 = |c: f32| ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8;
	[to_u8(color.x), to_u8(color.y), to_u8(color.z), (a * 255.0).round() as u8]
}

/// Row-major offset of `(x, y)`, computed in `usize` so large surfaces don't wrap around.
#[inline]
fn pixel_index(width: u32, x: u32, y: u32) -> usize {
	y as usize * width as usize + x as usize
}

/// An offscreen RGBA image in premultiplied `f32`, rows top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
	width: u32,
	height: u32,
	pixels: Vec<Vec4>,
}

impl Surface {
	/// Fully transparent surface.
	pub fn new(size: UVec2) -> Self {
		Self {
			width: size.x,
			height: size.y,
			pixels: vec![Vec4::ZERO; size.x as usize * size.y as usize],
		}
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn size(&self) -> UVec2 {
		UVec2::new(self.width, self.height)
	}

	pub fn pixels(&self) -> &[Vec4] {
		&self.pixels
	}

	pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
		self.pixels[pixel_index(self.width, x, y)]
	}

	pub fn fill(&mut self, color: Vec4) {
		self.pixels.fill(color);
	}

	/// Reallocates only if the size actually changes. Content is undefined afterwards.
	pub fn resize(&mut self, size: UVec2) {
		if size != self.size() {
			*self = Self::new(size);
		}
	}

	/// Source-over `color` onto the pixel at `(x, y)`.
	#[inline]
	pub fn blend(&mut self, x: u32, y: u32, color: Vec4) {
		let dst = &mut self.pixels[pixel_index(self.width, x, y)];
		*dst = over(*dst, color);
	}

	/// Bilinear sample at a point in pixel space, where pixel `(x, y)` has its center at `(x + 0.5, y + 0.5)`.
	/// Clamps to the edge.
	pub fn sample_bilinear(&self, p: Vec2) -> Vec4 {
		if self.width == 0 || self.height == 0 {
			return Vec4::ZERO;
		}

		let p = p - Vec2::splat(0.5);
		let base = p.floor();
		let t = p - base;

		let max_x = self.width as i64 - 1;
		let max_y = self.height as i64 - 1;
		let fetch = |dx: i64, dy: i64| {
			let x = (base.x as i64 + dx).clamp(0, max_x) as u32;
			let y = (base.y as i64 + dy).clamp(0, max_y) as u32;
			self.pixel(x, y)
		};

		let top = fetch(0, 0).lerp(fetch(1, 0), t.x);
		let bottom = fetch(0, 1).lerp(fetch(1, 1), t.x);
		top.lerp(bottom, t.y)
	}

	/// Straight-alpha RGBA8 copy of the surface.
	pub fn to_rgba8(&self) -> RgbaImage {
		RgbaImage::from_fn(self.width, self.height, |x, y| Rgba(unpremultiply(self.pixel(x, y))))
	}
}
