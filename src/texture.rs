use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use glam::{vec4, Vec4};
use image::{ImageBuffer, ImageError, Rgba};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, error};

use crate::engine::CubismEngine;

/// Decoded texture, straight (non-premultiplied) RGBA8, rows top to bottom.
#[derive(Clone, Debug)]
pub struct ShallowTexture {
	pixels: Vec<u8>,
	width: u32,
	height: u32,
}

impl ShallowTexture {
	/// A texture filled with one color.
	pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
		Self {
			pixels: rgba.repeat(width as usize * height as usize),
			width,
			height,
		}
	}

	pub fn pixels(&self) -> &[u8] {
		&self.pixels
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	/// Nearest texel at a point in texel space, premultiplied, channels in `[0, 1]`.
	/// Points outside the texture clamp to the edge.
	pub fn sample_nearest(&self, x: f32, y: f32) -> Vec4 {
		if self.width == 0 || self.height == 0 {
			return Vec4::ZERO;
		}

		let x = (x.floor().max(0.0) as u32).min(self.width - 1);
		let y = (y.floor().max(0.0) as u32).min(self.height - 1);
		let offset = 4 * (y as usize * self.width as usize + x as usize);
		let [r, g, b, a] = [
			self.pixels[offset],
			self.pixels[offset + 1],
			self.pixels[offset + 2],
			self.pixels[offset + 3],
		]
		.map(|c| c as f32 / 255.0);

		vec4(r * a, g * a, b * a, a)
	}
}

impl From<ImageBuffer<Rgba<u8>, Vec<u8>>> for ShallowTexture {
	fn from(value: ImageBuffer<Rgba<u8>, Vec<u8>>) -> Self {
		Self {
			width: value.width(),
			height: value.height(),
			pixels: value.into_raw(),
		}
	}
}

/// Texture index as reported by the engine, mapped to the decoded image.
pub type TextureMap = HashMap<usize, ShallowTexture>;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
	#[error("Could not decode texture {index} at {path:?}")]
	Decode {
		index: usize,
		path: PathBuf,
		#[source]
		source: ImageError,
	},
	#[error("Engine reports no file for texture {0}")]
	NoFileName(usize),
}

fn decode_texture(index: usize, path: &Path) -> Result<ShallowTexture, TextureError> {
	debug!("Decoding texture {} from {:?}", index, path);
	let img = image::open(path).map_err(|source| TextureError::Decode {
		index,
		path: path.to_owned(),
		source,
	})?;
	Ok(ShallowTexture::from(img.into_rgba8()))
}

/// Decodes texture files in parallel. The first failure aborts the whole table.
pub fn decode_textures(files: &[(usize, PathBuf)]) -> Result<TextureMap, TextureError> {
	files
		.par_iter()
		.map(|(index, path)| decode_texture(*index, path).map(|tex| (*index, tex)))
		.inspect(|res| {
			if let Err(e) = res {
				error!("{}", e);
			}
		})
		.collect()
}

/// Decodes every texture referenced by at least one drawable of the engine's model.
pub fn load_engine_textures(engine: &impl CubismEngine) -> Result<TextureMap, TextureError> {
	let referenced: BTreeSet<usize> = (0..engine.drawable_count()).map(|i| engine.texture_index(i)).collect();

	let files = referenced
		.into_iter()
		.map(|index| match engine.texture_file_name(index) {
			Some(path) => Ok((index, path.to_owned())),
			None => Err(TextureError::NoFileName(index)),
		})
		.collect::<Result<Vec<_>, _>>()?;

	decode_textures(&files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nearest_sample_is_premultiplied_and_clamped() {
		let mut tex = ShallowTexture::solid(2, 2, [255, 0, 0, 255]);
		// bottom right texel: half transparent white
		tex.pixels[12..16].copy_from_slice(&[255, 255, 255, 128]);

		assert_eq!(tex.sample_nearest(0.5, 0.5), vec4(1.0, 0.0, 0.0, 1.0));

		let a = 128.0 / 255.0;
		assert_eq!(tex.sample_nearest(1.5, 1.5), vec4(a, a, a, a));
		assert_eq!(tex.sample_nearest(10.0, 10.0), vec4(a, a, a, a));
		assert_eq!(tex.sample_nearest(-3.0, -3.0), vec4(1.0, 0.0, 0.0, 1.0));
	}

	#[test]
	fn empty_texture_samples_transparent() {
		let tex = ShallowTexture::solid(0, 0, [255, 255, 255, 255]);
		assert_eq!(tex.sample_nearest(0.0, 0.0), Vec4::ZERO);
	}

	#[test]
	fn missing_file_is_fatal() {
		let res = decode_textures(&[(3, PathBuf::from("definitely/not/here.png"))]);
		assert!(matches!(res, Err(TextureError::Decode { index: 3, .. })));
	}
}
