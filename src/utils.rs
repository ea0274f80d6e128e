/// Shortest signed distance from `last` to `raw` on a circle of `resolution` counts.
///
/// Both inputs must lie in `[0, resolution)`. A move of exactly half a turn
/// is reported as negative.
pub fn wrapping_delta(raw: u16, last: u16, resolution: u16) -> i32 {
    let resolution = i32::from(resolution);
    let half = resolution / 2;
    let delta = (i32::from(raw) - i32::from(last)).rem_euclid(resolution);
    if delta >= half { delta - resolution } else { delta }
}

/// Reduce an unbounded position into `[0, resolution)` after removing `offset`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn reduce(position: i64, offset: i64, resolution: u16) -> u16 {
    position.wrapping_sub(offset).rem_euclid(i64::from(resolution)) as u16
}
