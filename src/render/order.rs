/// The engine's render order table is not a permutation of the drawable indices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderOrderError {
	#[error("Render order table has {got} entries, expected one per drawable ({expected})")]
	Length { expected: usize, got: usize },
	#[error("Drawable {drawable} is placed at position {position}, outside of 0..{count}")]
	OutOfRange { drawable: usize, position: i32, count: usize },
	#[error("Drawables {first} and {second} both claim draw position {position}")]
	Duplicate { position: usize, first: usize, second: usize },
}

/// Inverts the engine's `raw[drawable] = position` table into the draw sequence `out[position] = drawable`.
///
/// `out` is cleared and refilled. A table that is not a permutation of `0..drawable_count` is an error,
/// never clamped.
pub fn resolve_render_orders(raw: &[i32], drawable_count: usize, out: &mut Vec<usize>) -> Result<(), RenderOrderError> {
	if raw.len() != drawable_count {
		return Err(RenderOrderError::Length {
			expected: drawable_count,
			got: raw.len(),
		});
	}

	const UNSET: usize = usize::MAX;
	out.clear();
	out.resize(drawable_count, UNSET);

	for (drawable, &position) in raw.iter().enumerate() {
		let slot = usize::try_from(position)
			.ok()
			.and_then(|p| out.get_mut(p).map(|slot| (p, slot)));
		let Some((p, slot)) = slot else {
			return Err(RenderOrderError::OutOfRange {
				drawable,
				position,
				count: drawable_count,
			});
		};

		if *slot != UNSET {
			return Err(RenderOrderError::Duplicate {
				position: p,
				first: *slot,
				second: drawable,
			});
		}
		*slot = drawable;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolve(raw: &[i32]) -> Result<Vec<usize>, RenderOrderError> {
		let mut out = Vec::new();
		resolve_render_orders(raw, raw.len(), &mut out).map(|_| out)
	}

	/// `sequence[position] = drawable` back to `raw[drawable] = position`.
	fn invert(sequence: &[usize]) -> Vec<i32> {
		let mut raw = vec![0; sequence.len()];
		for (position, &drawable) in sequence.iter().enumerate() {
			raw[drawable] = position as i32;
		}
		raw
	}

	#[test]
	fn swapped_pair_draws_second_drawable_first() {
		assert_eq!(resolve(&[1, 0]).unwrap(), vec![1, 0]);
	}

	#[test]
	fn resolves_to_permutation_and_inverts_back() {
		let tables: [&[i32]; 5] = [&[], &[0], &[0, 1, 2, 3], &[3, 1, 0, 2], &[4, 2, 5, 0, 1, 3]];
		for raw in tables {
			let sequence = resolve(raw).unwrap();

			let mut sorted = sequence.clone();
			sorted.sort_unstable();
			assert_eq!(sorted, (0..raw.len()).collect::<Vec<_>>());

			assert_eq!(invert(&sequence), raw);
			assert_eq!(resolve(&invert(&sequence)).unwrap(), sequence);
		}
	}

	#[test]
	fn rejects_out_of_range_positions() {
		assert_eq!(
			resolve(&[0, 2]),
			Err(RenderOrderError::OutOfRange {
				drawable: 1,
				position: 2,
				count: 2
			})
		);
		assert!(matches!(resolve(&[-1, 0]), Err(RenderOrderError::OutOfRange { drawable: 0, .. })));
	}

	#[test]
	fn rejects_duplicate_positions() {
		assert_eq!(
			resolve(&[1, 0, 1]),
			Err(RenderOrderError::Duplicate {
				position: 1,
				first: 0,
				second: 2
			})
		);
	}

	#[test]
	fn rejects_length_mismatch() {
		let mut out = Vec::new();
		assert_eq!(
			resolve_render_orders(&[0, 1], 3, &mut out),
			Err(RenderOrderError::Length { expected: 3, got: 2 })
		);
	}
}
