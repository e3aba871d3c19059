use std::collections::HashMap;

use crate::engine::CubismEngine;

/// Parameter names of a model mapped to the engine's parameter indices.
///
/// Built once at load. Lets callers drive parameters such as `ParamAngleX` without hardcoding indices.
#[derive(Clone, Debug, Default)]
pub struct ParameterMap {
	indices: HashMap<String, usize>,
}

impl ParameterMap {
	pub fn from_engine(engine: &impl CubismEngine) -> Self {
		let indices = (0..engine.parameter_count())
			.map(|i| (engine.parameter_id(i).to_owned(), i))
			.collect();
		Self { indices }
	}

	pub fn get(&self, name: &str) -> Option<usize> {
		self.indices.get(name).copied()
	}

	/// Same as `.get()`, but an unknown name is an error.
	pub fn index_of(&self, name: &str) -> Result<usize, SetParamError> {
		self.get(name)
			.ok_or_else(|| SetParamError::NoParameterNamed(name.to_owned()))
	}

	pub fn len(&self) -> usize {
		self.indices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}
}

/// Possible errors setting a param.
#[derive(Debug, thiserror::Error)]
pub enum SetParamError {
	#[error("No parameter named {0}")]
	NoParameterNamed(String),
}

#[cfg(test)]
mod tests {
	use glam::{uvec2, vec2};

	use super::*;
	use crate::engine::{ScriptedEngine, ScriptedModel, ScriptedParameter};

	#[test]
	fn maps_names_to_engine_indices() {
		let parameters = ["ParamAngleX", "ParamAngleY", "ParamEyeBallX"]
			.into_iter()
			.map(|id| ScriptedParameter {
				id: id.to_owned(),
				default: 0.0,
			})
			.collect();
		let engine = ScriptedEngine::new(
			ScriptedModel {
				canvas_size: vec2(1.0, 1.0),
				pixels_per_unit: 1.0,
				canvas_size_pixels: uvec2(1, 1),
				textures: Vec::new(),
				parameters,
				drawables: Vec::new(),
				render_orders: Vec::new(),
			},
			60,
		)
		.unwrap();

		let map = ParameterMap::from_engine(&engine);
		assert_eq!(map.len(), 3);
		assert_eq!(map.get("ParamAngleY"), Some(1));
		assert_eq!(map.index_of("ParamEyeBallX").unwrap(), 2);
		assert!(matches!(
			map.index_of("ParamMouthOpenY"),
			Err(SetParamError::NoParameterNamed(name)) if name == "ParamMouthOpenY"
		));
	}
}
