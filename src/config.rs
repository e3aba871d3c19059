use glam::{vec2, UVec2, Vec2};

/// Which normalized pointer coordinate drives a tracked parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingInput {
	X,
	Y,
	/// Product of both coordinates, for head tilt.
	XY,
}

impl TrackingInput {
	pub fn select(self, pointer: Vec2) -> f32 {
		match self {
			TrackingInput::X => pointer.x,
			TrackingInput::Y => pointer.y,
			TrackingInput::XY => pointer.x * pointer.y,
		}
	}
}

/// Adds `gain * input` to the named parameter every tick the pointer is over the window.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingTarget {
	pub parameter: String,
	pub input: TrackingInput,
	pub gain: f32,
}

impl TrackingTarget {
	pub fn new(parameter: &str, input: TrackingInput, gain: f32) -> Self {
		Self {
			parameter: parameter.to_owned(),
			input,
			gain,
		}
	}
}

/// Pointer-driven head tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadTracking {
	pub enabled: bool,
	pub targets: Vec<TrackingTarget>,
}

impl Default for HeadTracking {
	/// Head, body and eyes follow the pointer, using the standard parameter names of Cubism models.
	fn default() -> Self {
		use TrackingInput::*;

		Self {
			enabled: true,
			targets: vec![
				TrackingTarget::new("ParamAngleX", X, 30.0),
				TrackingTarget::new("ParamAngleY", Y, 30.0),
				TrackingTarget::new("ParamAngleZ", XY, -30.0),
				TrackingTarget::new("ParamBodyAngleX", X, 10.0),
				TrackingTarget::new("ParamEyeBallX", X, 1.0),
				TrackingTarget::new("ParamEyeBallY", Y, 1.0),
			],
		}
	}
}

/// Maps a pointer position in window pixels to `[-1, 1]²` with Y up.
///
/// Returns `None` when the pointer is outside of the window.
pub fn normalize_pointer(pointer: Vec2, window: UVec2) -> Option<Vec2> {
	let size = window.as_vec2();
	if pointer.x < 0.0 || pointer.y < 0.0 || pointer.x >= size.x || pointer.y >= size.y {
		return None;
	}
	Some(vec2(pointer.x * 2.0 / size.x - 1.0, -(pointer.y * 2.0 / size.y - 1.0)))
}

/// Settings of a [`Player`](crate::player::Player) session.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerConfig {
	/// Simulation rate for engines built alongside the player, e.g. [`ScriptedEngine::new`](crate::engine::ScriptedEngine::new).
	pub ticks_per_second: u32,
	pub window_size: UVec2,
	pub tracking: HeadTracking,
	/// Straight RGBA8.
	pub canvas_clear: [u8; 4],
	/// Straight RGBA8, shows wherever the canvas does not cover the window.
	pub window_background: [u8; 4],
}

impl Default for PlayerConfig {
	fn default() -> Self {
		Self {
			ticks_per_second: 60,
			window_size: UVec2::new(640, 480),
			tracking: HeadTracking::default(),
			canvas_clear: [0, 0, 0, 0],
			window_background: [255, 255, 255, 255],
		}
	}
}

#[cfg(test)]
mod tests {
	use glam::uvec2;

	use super::*;

	#[test]
	fn pointer_corners() {
		let window = uvec2(640, 480);
		assert_eq!(normalize_pointer(vec2(0.0, 0.0), window), Some(vec2(-1.0, 1.0)));
		assert_eq!(normalize_pointer(vec2(320.0, 240.0), window), Some(Vec2::ZERO));
		assert_eq!(normalize_pointer(vec2(480.0, 360.0), window), Some(vec2(0.5, -0.5)));
	}

	#[test]
	fn pointer_outside_is_ignored() {
		let window = uvec2(640, 480);
		assert_eq!(normalize_pointer(vec2(-1.0, 10.0), window), None);
		assert_eq!(normalize_pointer(vec2(640.0, 10.0), window), None);
		assert_eq!(normalize_pointer(vec2(10.0, 480.0), window), None);
		assert_eq!(normalize_pointer(vec2(10.0, 10.0), uvec2(0, 0)), None);
	}

	#[test]
	fn tilt_uses_both_axes() {
		assert_eq!(TrackingInput::XY.select(vec2(0.5, -0.5)), -0.25);
		assert_eq!(TrackingInput::Y.select(vec2(0.5, -0.5)), -0.5);
	}
}
