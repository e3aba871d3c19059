use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};
use json::JsonValue;
use tracing::info;

use crate::engine::{ParameterBinding, ScriptedDrawable, ScriptedModel, ScriptedParameter};

use super::f32s_as_vec2s;
use super::json::{JsonError, JsonObject, SerialExtend};

pub type SceneParseResult<T> = Result<T, SceneParseError>;

#[derive(Debug, thiserror::Error)]
pub enum SceneParseError {
	#[error("Could not read scene file {path:?}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("Scene is not valid JSON: {0}")]
	InvalidJson(#[from] json::Error),
	#[error(transparent)]
	JsonError(#[from] JsonError),
	#[error("Expected even number of floats in list, got {0}")]
	OddNumberOfFloatsInList(usize),
	#[error("Unknown param name {0:?}")]
	UnknownParamName(String),
}

impl SceneParseError {
	pub fn nested(self, key: &str) -> Self {
		match self {
			SceneParseError::JsonError(err) => SceneParseError::JsonError(err.nested(key)),
			_ => self,
		}
	}

	fn in_list(self, index: usize) -> Self {
		match self {
			SceneParseError::JsonError(err) => SceneParseError::JsonError(err.in_list(index)),
			_ => self,
		}
	}
}

fn vals<T>(key: &str, res: SceneParseResult<T>) -> SceneParseResult<T> {
	res.map_err(|e| e.nested(key))
}

fn as_object<'file>(msg: &str, val: &'file JsonValue) -> SceneParseResult<JsonObject<'file>> {
	if let Some(obj) = val.as_object() {
		Ok(JsonObject(obj))
	} else {
		Err(SceneParseError::JsonError(JsonError::ValueIsNotObject(msg.to_owned())))
	}
}

/// Runs `parse` on every object of the list at `key`.
fn deserialize_objects<'file, T>(
	obj: &JsonObject<'file>,
	key: &str,
	mut parse: impl FnMut(JsonObject<'file>) -> SceneParseResult<T>,
) -> SceneParseResult<Vec<T>> {
	let list = obj.get_list(key)?;
	let parsed = list
		.iter()
		.enumerate()
		.map(|(i, val)| as_object(key, val).and_then(&mut parse).map_err(|e| e.in_list(i)))
		.collect();
	vals(key, parsed)
}

fn deserialize_vec2s_flat(obj: &JsonObject, key: &str) -> SceneParseResult<Vec<Vec2>> {
	let floats = obj.get_list_of(key, JsonValue::as_f32)?;
	if floats.len() % 2 != 0 {
		return Err(SceneParseError::OddNumberOfFloatsInList(floats.len()));
	}
	Ok(f32s_as_vec2s(&floats))
}

// scene structure

struct Canvas {
	size: Vec2,
	pixels_per_unit: f32,
	pixel_size: UVec2,
}

fn deserialize_canvas(obj: JsonObject) -> SceneParseResult<Canvas> {
	let size = Vec2::new(obj.get_f32("width")?, obj.get_f32("height")?);
	let pixels_per_unit = obj.get_f32("pixels_per_unit")?;

	let derived = (size * pixels_per_unit).round().max(Vec2::ZERO).as_uvec2();
	let pixel_size = UVec2::new(
		obj.get_optional("pixel_width", JsonObject::get_u32)?.unwrap_or(derived.x),
		obj.get_optional("pixel_height", JsonObject::get_u32)?.unwrap_or(derived.y),
	);

	Ok(Canvas {
		size,
		pixels_per_unit,
		pixel_size,
	})
}

fn deserialize_parameter(obj: JsonObject) -> SceneParseResult<ScriptedParameter> {
	Ok(ScriptedParameter {
		id: obj.get_str("id")?.to_owned(),
		default: obj.get_optional("default", JsonObject::get_f32)?.unwrap_or_default(),
	})
}

fn deserialize_binding(obj: JsonObject, parameters: &[ScriptedParameter]) -> SceneParseResult<ParameterBinding> {
	let name = obj.get_str("parameter")?;
	let parameter = parameters
		.iter()
		.position(|p| p.id == name)
		.ok_or_else(|| SceneParseError::UnknownParamName(name.to_owned()))?;

	Ok(ParameterBinding {
		parameter,
		offset: obj.get_vec2("offset")?,
	})
}

/// A drawable and where it goes in the draw sequence, if the scene says so.
fn deserialize_drawable(
	obj: JsonObject,
	parameters: &[ScriptedParameter],
) -> SceneParseResult<(ScriptedDrawable, Option<i32>)> {
	let mut drawable = ScriptedDrawable::new(
		obj.get_str("id")?,
		obj.get_usize("texture")?,
		deserialize_vec2s_flat(&obj, "positions")?,
		deserialize_vec2s_flat(&obj, "uvs")?,
		obj.get_list_of("indices", JsonValue::as_u16)?,
	);

	if let Some(opacity) = obj.get_optional("opacity", JsonObject::get_f32)? {
		drawable.opacity = opacity;
	}
	if let Some(blend_mode) = obj.get_optional("blend_mode", JsonObject::get_i32)? {
		drawable.blend_mode = blend_mode;
	}
	if obj.contains("masks") {
		drawable.masks = obj.get_list_of("masks", JsonValue::as_i32)?;
	}
	if let Some(inverted) = obj.get_optional("inverted_mask", JsonObject::get_bool)? {
		drawable.inverted_mask = inverted;
	}
	if let Some(culling) = obj.get_optional("culling", JsonObject::get_i32)? {
		drawable.culling = culling;
	}
	if let Some(visible) = obj.get_optional("visible", JsonObject::get_bool)? {
		drawable.visible = visible;
	}
	if obj.contains("bindings") {
		drawable.bindings = deserialize_objects(&obj, "bindings", |binding| deserialize_binding(binding, parameters))?;
	}

	let render_order = obj.get_optional("render_order", JsonObject::get_i32)?;
	Ok((drawable, render_order))
}

fn deserialize_scene(obj: JsonObject, base_dir: &Path) -> SceneParseResult<ScriptedModel> {
	let canvas = vals("canvas", deserialize_canvas(obj.get_object("canvas")?))?;

	let textures = obj
		.get_list("textures")?
		.iter()
		.enumerate()
		.map(|(i, val)| match val.as_str() {
			Some(name) => Ok(base_dir.join(name)),
			None => Err(JsonError::ValueIsNotString("textures".to_owned()).in_list(i).nested("textures")),
		})
		.collect::<Result<Vec<_>, _>>()?;

	let parameters = if obj.contains("parameters") {
		deserialize_objects(&obj, "parameters", deserialize_parameter)?
	} else {
		Vec::new()
	};

	let (drawables, orders): (Vec<_>, Vec<_>) =
		deserialize_objects(&obj, "drawables", |drawable| deserialize_drawable(drawable, &parameters))?
			.into_iter()
			.unzip();
	let render_orders = (orders.into_iter().enumerate())
		.map(|(i, order)| order.unwrap_or(i as i32))
		.collect();

	Ok(ScriptedModel {
		canvas_size: canvas.size,
		pixels_per_unit: canvas.pixels_per_unit,
		canvas_size_pixels: canvas.pixel_size,
		textures,
		parameters,
		drawables,
		render_orders,
	})
}

/// Parses a scene description. Texture file names are resolved relative to `base_dir`.
///
/// A scene is a JSON object:
///
/// ```json
/// {
///     "canvas": { "width": 2.0, "height": 2.0, "pixels_per_unit": 256 },
///     "textures": ["texture_00.png"],
///     "parameters": [{ "id": "ParamAngleX", "default": 0 }],
///     "drawables": [{
///         "id": "ArtMesh0",
///         "texture": 0,
///         "positions": [-1, -1, 1, -1, 1, 1],
///         "uvs": [0, 0, 1, 0, 1, 1],
///         "indices": [0, 1, 2],
///         "bindings": [{ "parameter": "ParamAngleX", "offset": [0.01, 0] }]
///     }]
/// }
/// ```
///
/// Drawables may also set `opacity`, `blend_mode`, `masks` (drawable indices), `inverted_mask`, `culling`,
/// `visible` and `render_order`, which otherwise default to an opaque, visible, unmasked drawable
/// drawn in declaration order.
pub fn parse_scene(text: &str, base_dir: &Path) -> SceneParseResult<ScriptedModel> {
	let value = json::parse(text)?;
	deserialize_scene(as_object("(scene)", &value)?, base_dir)
}

/// Reads and parses a scene file.
pub fn load_scene(path: &Path) -> SceneParseResult<ScriptedModel> {
	let text = fs::read_to_string(path).map_err(|source| SceneParseError::Io {
		path: path.to_owned(),
		source,
	})?;
	let base_dir = path.parent().unwrap_or(Path::new(""));
	let scene = parse_scene(&text, base_dir)?;

	info!(
		"Loaded scene {:?}: {} drawables, {} parameters",
		path,
		scene.drawables.len(),
		scene.parameters.len()
	);
	Ok(scene)
}
