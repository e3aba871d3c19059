use glam::{vec2, Vec2, Vec4};

/// One vertex ready for rasterization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
	/// Destination surface pixel, origin top-left, Y down.
	pub dst: Vec2,
	/// Source texel, origin top-left, Y down.
	pub src: Vec2,
	/// Always opaque white. Opacity and tint are applied when compositing.
	pub color: Vec4,
}

/// Maps model-space positions and UVs of one drawable to surface pixels and texels, writing into `out`.
///
/// Model space is `[-1, 1]²` with Y up, UVs are `[0, 1]²` with V up; both get flipped vertically.
/// `out` is cleared first, and ends up with exactly one vertex per position.
///
/// Panics if `positions` and `uvs` differ in length: the engine broke its contract and the model should have caught it.
pub fn transform_vertices(positions: &[Vec2], uvs: &[Vec2], surface_size: Vec2, texture_size: Vec2, out: &mut Vec<Vertex>) {
	assert_eq!(
		positions.len(),
		uvs.len(),
		"Every vertex position must have a matching UV."
	);

	let half = surface_size / 2.0;

	out.clear();
	out.extend(positions.iter().zip(uvs).map(|(pos, uv)| Vertex {
		dst: vec2((pos.x + 1.0) * half.x, surface_size.y - (pos.y + 1.0) * half.y),
		src: vec2(uv.x * texture_size.x, texture_size.y - uv.y * texture_size.y),
		color: Vec4::ONE,
	}));
}
