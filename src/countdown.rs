/// Compact countdown label for a signed number of seconds.
///
/// Under a minute shows seconds, under an hour shows minutes and seconds,
/// anything longer shows hours and minutes. A zero trailing unit is dropped
/// and races already past their start get a leading `-`.
pub fn format_countdown(seconds: i64) -> String {
    let abs = seconds.unsigned_abs();

    let label = if abs < 60 {
        format!("{}s", abs)
    } else if abs < 3600 {
        let (minutes, secs) = (abs / 60, abs % 60);
        if secs > 0 {
            format!("{}m {}s", minutes, secs)
        } else {
            format!("{}m", minutes)
        }
    } else {
        let (hours, minutes) = (abs / 3600, (abs % 3600) / 60);
        if minutes > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    };

    if seconds < 0 {
        format!("-{}", label)
    } else {
        label
    }
}
