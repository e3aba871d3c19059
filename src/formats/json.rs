//! Thin accessor layer over `json`, with errors that remember where in the document they happened.

use glam::Vec2;
use json::JsonValue;

pub(super) trait SerialExtend {
	fn as_object(&self) -> Option<&json::object::Object>;
}

impl SerialExtend for json::JsonValue {
	fn as_object(&self) -> Option<&json::object::Object> {
		if let json::JsonValue::Object(object) = self {
			Some(object)
		} else {
			None
		}
	}
}

pub type JsonResult<T> = Result<T, JsonError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JsonError {
	#[error("Key {0:?} does not exist")]
	KeyDoesNotExist(String),
	#[error("Value at {0:?} is not an object")]
	ValueIsNotObject(String),
	#[error("Value at {0:?} is not a list")]
	ValueIsNotList(String),
	#[error("Value at {0:?} is not a string")]
	ValueIsNotString(String),
	#[error("Value at {0:?} is not a number")]
	ValueIsNotNumber(String),
	#[error("Value at {0:?} is not a bool")]
	ValueIsNotBool(String),
	#[error("Error while parsing int at {0:?}\n  - number out of scope")]
	ParseIntError(String),
	#[error("Error while parsing vec2 at {key:?}\n  - {msg}")]
	ParseVec2Error { key: String, msg: String },
	#[error("Error in list at index {index}\n  - {inner}")]
	ErrorInList { index: usize, inner: Box<JsonError> },
	#[error("Error in object at {key:?}\n  - {inner}")]
	ErrorInObject { key: String, inner: Box<JsonError> },
}

impl JsonError {
	pub fn nested(self, key: &str) -> Self {
		Self::ErrorInObject {
			key: key.to_owned(),
			inner: Box::new(self),
		}
	}

	pub fn in_list(self, index: usize) -> Self {
		Self::ErrorInList {
			index,
			inner: Box::new(self),
		}
	}
}

pub struct JsonObject<'a>(pub &'a json::object::Object);

impl<'a> JsonObject<'a> {
	fn get(&self, key: &str) -> JsonResult<&'a json::JsonValue> {
		match self.0.get(key) {
			Some(value) => Ok(value),
			None => Err(JsonError::KeyDoesNotExist(key.to_owned())),
		}
	}

	/// Whether `key` is present, `null` counting as absent.
	pub fn contains(&self, key: &str) -> bool {
		self.0.get(key).map_or(false, |value| !value.is_null())
	}

	pub fn get_object(&self, key: &str) -> JsonResult<JsonObject<'a>> {
		match self.get(key)?.as_object() {
			Some(obj) => Ok(JsonObject(obj)),
			None => Err(JsonError::ValueIsNotObject(key.to_owned())),
		}
	}

	pub fn get_list(&self, key: &str) -> JsonResult<&'a [JsonValue]> {
		match self.get(key)? {
			json::JsonValue::Array(arr) => Ok(arr),
			_ => Err(JsonError::ValueIsNotList(key.to_owned())),
		}
	}

	pub fn get_str(&self, key: &str) -> JsonResult<&'a str> {
		match self.get(key)?.as_str() {
			Some(val) => Ok(val),
			None => Err(JsonError::ValueIsNotString(key.to_owned())),
		}
	}

	fn get_number(&self, key: &str) -> JsonResult<json::number::Number> {
		match self.get(key)?.as_number() {
			Some(val) => Ok(val),
			None => Err(JsonError::ValueIsNotNumber(key.to_owned())),
		}
	}

	pub fn get_f32(&self, key: &str) -> JsonResult<f32> {
		Ok(self.get_number(key)?.into())
	}

	pub fn get_u32(&self, key: &str) -> JsonResult<u32> {
		self.get_number(key)?
			.try_into()
			.map_err(|_| JsonError::ParseIntError(key.to_owned()))
	}

	pub fn get_usize(&self, key: &str) -> JsonResult<usize> {
		self.get_number(key)?
			.try_into()
			.map_err(|_| JsonError::ParseIntError(key.to_owned()))
	}

	pub fn get_i32(&self, key: &str) -> JsonResult<i32> {
		self.get_number(key)?
			.try_into()
			.map_err(|_| JsonError::ParseIntError(key.to_owned()))
	}

	pub fn get_bool(&self, key: &str) -> JsonResult<bool> {
		match self.get(key)?.as_bool() {
			Some(val) => Ok(val),
			None => Err(JsonError::ValueIsNotBool(key.to_owned())),
		}
	}

	pub fn get_vec2(&self, key: &str) -> JsonResult<Vec2> {
		let list = self.get_list(key)?;
		if list.len() != 2 {
			return Err(JsonError::ParseVec2Error {
				key: key.to_owned(),
				msg: format!("expected list of length 2, but has length {}", list.len()),
			});
		}

		let mut xy = [0.0; 2];
		for (component, val) in xy.iter_mut().zip(list) {
			*component = match val.as_number() {
				Some(val) => val.into(),
				None => {
					return Err(JsonError::ParseVec2Error {
						key: key.to_owned(),
						msg: "expected float, but did not get a number".to_owned(),
					})
				}
			};
		}
		Ok(Vec2::from(xy))
	}

	/// Every element of the list at `key`, converted with `convert`.
	pub fn get_list_of<T>(&self, key: &str, convert: impl Fn(&JsonValue) -> Option<T>) -> JsonResult<Vec<T>> {
		self.get_list(key)?
			.iter()
			.enumerate()
			.map(|(index, val)| convert(val).ok_or_else(|| JsonError::ValueIsNotNumber(key.to_owned()).in_list(index)))
			.collect()
	}

	/// `Ok(None)` if `key` is absent, otherwise the result of `get`.
	pub fn get_optional<T>(&self, key: &str, get: impl FnOnce(&Self, &str) -> JsonResult<T>) -> JsonResult<Option<T>> {
		if self.contains(key) {
			get(self, key).map(Some)
		} else {
			Ok(None)
		}
	}
}
