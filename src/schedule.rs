/// Check a step number against a user-specified interval. Useful to decide
/// whether the current step is a status step, an output step, or anything
/// else that recurs on a fixed step cadence.
///
/// An interval of zero means every step qualifies; a negative interval means
/// no step ever does.
///
pub fn is_due(step: u64, interval: i64) -> bool {
    if interval == 0 {
        true
    } else if interval < 0 {
        false
    } else {
        step % interval as u64 == 0
    }
}
