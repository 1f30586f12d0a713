/// Formats a duration in milliseconds as `S.SSs`, followed by a minutes/seconds breakdown
/// when there is anything to break down, e.g. `90.50s (1min 30s)`.
pub fn format_duration(ms: f64) -> String {
    let seconds = ms / 1000.0;
    let whole_minutes = (seconds / 60.0) as i64;
    let remainder_seconds = (seconds as i64) % 60;

    let mut formatted = format!("{seconds:.2}s");
    let parts: Vec<String> = [
        (whole_minutes > 0).then(|| {
            let suffix = if whole_minutes > 1 { "mins" } else { "min" };
            format!("{whole_minutes}{suffix}")
        }),
        (remainder_seconds > 0).then(|| format!("{remainder_seconds}s")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !parts.is_empty() {
        formatted.push_str(&format!(" ({})", parts.join(" ")));
    }
    formatted
}
