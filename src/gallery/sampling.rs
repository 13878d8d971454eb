// * Fixed-stride sampling of thumbnail positions.

/// Picks up to `limit` positions out of `total`, every `stride`th one.
///
/// When the range is too short to yield `limit` picks at `stride`, the stride
/// shrinks to `max(1, total / limit)` so the picks still span the range.
/// No randomness: the same inputs always give the same positions.
pub fn sample_positions(total: usize, stride: usize, limit: usize) -> Vec<usize> {
    if total == 0 || limit == 0 {
        return Vec::new();
    }

    let stride = stride.max(1);
    let effective = if total.div_ceil(stride) < limit {
        (total / limit).max(1)
    } else {
        stride
    };

    (0..total).step_by(effective).take(limit).collect()
}
