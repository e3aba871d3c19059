use glam::{Vec2, Vec3};

/// Return top-left and bottom-right corners of the smallest covering rectangle over a list of points.
#[inline]
fn get_bounds<'a>(vertices: impl Iterator<Item = &'a Vec2>) -> (Vec2, Vec2) {
	let (mut x, mut y, mut z, mut w) = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
	vertices.for_each(|v| {
		(x, y, z, w) = (x.min(v.x), y.min(v.y), z.max(v.x), w.max(v.y));
	});
	(Vec2::new(x, y), Vec2::new(z, w))
}

/// Twice the signed area of `(a, b, p)`. Positive when `p` is on the inner side of edge `a -> b`.
#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
	(b - a).perp_dot(p - a)
}

/// Pixels exactly on an edge belong to the triangle only if the edge is a top or a left edge,
/// so two triangles sharing an edge never both cover a pixel.
#[inline]
fn is_top_left(a: Vec2, b: Vec2) -> bool {
	let d = b - a;
	d.y < 0.0 || (d.y == 0.0 && d.x > 0.0)
}

/// Calls `f(x, y, barycentric)` for every pixel of a `width` × `height` surface whose center lies in the triangle.
///
/// Coordinates are in pixels, Y down. Winding does not matter. Degenerate triangles cover nothing.
/// The barycentric weights refer to the vertices in the order they were passed.
pub fn rasterize(triangle: [Vec2; 3], width: u32, height: u32, mut f: impl FnMut(u32, u32, Vec3)) {
	let [mut v0, mut v1, mut v2] = triangle;
	let mut area = edge(v0, v1, v2);
	let flipped = area < 0.0;
	if flipped {
		std::mem::swap(&mut v1, &mut v2);
		area = -area;
	}
	if area == 0.0 || !area.is_finite() {
		return;
	}

	let (top_left, bottom_right) = get_bounds([v0, v1, v2].iter());
	let x_begin = top_left.x.floor().max(0.0) as u32;
	let y_begin = top_left.y.floor().max(0.0) as u32;
	let x_end = (bottom_right.x.ceil().max(0.0) as u32).min(width);
	let y_end = (bottom_right.y.ceil().max(0.0) as u32).min(height);

	let bias = [is_top_left(v1, v2), is_top_left(v2, v0), is_top_left(v0, v1)];
	let covers = |w: f32, top_left: bool| w > 0.0 || (w == 0.0 && top_left);

	for y in y_begin..y_end {
		for x in x_begin..x_end {
			let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
			let w0 = edge(v1, v2, p);
			let w1 = edge(v2, v0, p);
			let w2 = edge(v0, v1, p);

			if covers(w0, bias[0]) && covers(w1, bias[1]) && covers(w2, bias[2]) {
				let weights = Vec3::new(w0, w1, w2) / area;
				// undo the swap so weights line up with the caller's vertices
				let weights = if flipped {
					Vec3::new(weights.x, weights.z, weights.y)
				} else {
					weights
				};
				f(x, y, weights);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use glam::vec2;

	use super::*;

	fn coverage(triangles: &[[Vec2; 3]], width: u32, height: u32) -> Vec<u32> {
		let mut hits = vec![0; (width * height) as usize];
		for triangle in triangles {
			rasterize(*triangle, width, height, |x, y, _| hits[(y * width + x) as usize] += 1);
		}
		hits
	}

	#[test]
	fn bounds() {
		let vertices = [vec2(0.0, 1.0), vec2(1.0, 0.0), vec2(-1.0, -1.0)];
		assert_eq!(get_bounds(vertices.iter()), (vec2(-1.0, -1.0), vec2(1.0, 1.0)))
	}

	#[test]
	fn quad_covers_every_pixel_once() {
		let (a, b, c, d) = (vec2(0.0, 0.0), vec2(8.0, 0.0), vec2(8.0, 6.0), vec2(0.0, 6.0));
		// opposite windings on purpose
		let hits = coverage(&[[a, b, c], [a, d, c]], 8, 6);
		assert!(hits.iter().all(|&h| h == 1), "{hits:?}");
	}

	#[test]
	fn fan_around_center_has_no_double_coverage() {
		let center = vec2(4.0, 4.0);
		let ring = [
			vec2(0.0, 0.0),
			vec2(8.0, 0.0),
			vec2(8.0, 8.0),
			vec2(0.0, 8.0),
		];
		let triangles: Vec<[Vec2; 3]> = (0..4).map(|i| [center, ring[i], ring[(i + 1) % 4]]).collect();

		let hits = coverage(&triangles, 8, 8);
		assert!(hits.iter().all(|&h| h == 1), "{hits:?}");
	}

	#[test]
	fn clipped_to_surface() {
		let hits = coverage(&[[vec2(-10.0, -10.0), vec2(30.0, -10.0), vec2(-10.0, 30.0)]], 4, 4);
		assert!(hits.iter().all(|&h| h == 1));
	}

	#[test]
	fn degenerate_triangle_covers_nothing() {
		let hits = coverage(&[[vec2(0.0, 0.0), vec2(2.0, 2.0), vec2(4.0, 4.0)]], 4, 4);
		assert!(hits.iter().all(|&h| h == 0));
	}

	#[test]
	fn weights_follow_caller_vertex_order() {
		let triangle = [vec2(0.0, 0.0), vec2(0.0, 100.0), vec2(100.0, 0.0)];
		let mut seen = false;
		rasterize(triangle, 100, 100, |x, y, w| {
			if (x, y) == (0, 0) {
				seen = true;
				// pixel center (0.5, 0.5) is almost exactly the first vertex
				assert!(w.x > 0.98, "{w}");
				assert!((w.x + w.y + w.z - 1.0).abs() < 1e-5);
			}
			if (x, y) == (0, 98) {
				assert!(w.y > 0.97, "{w}");
			}
		});
		assert!(seen);
	}
}
