//! WebVTT rendering for corrected segments.

use crate::mapping::Segment;

/// `HH:MM:SS.mmm`, rounded to the nearest millisecond.  Negative times clamp
/// to zero.
pub fn vtt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        ms
    )
}

/// Render `segments` as a WebVTT document with numbered cues.
pub fn segments_to_vtt(segments: &[Segment]) -> String {
    let mut lines = vec!["WEBVTT".to_string(), String::new()];
    for (i, seg) in segments.iter().enumerate() {
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            vtt_timestamp(seg.start_time),
            vtt_timestamp(seg.end_time)
        ));
        lines.push(seg.text.clone());
        lines.push(String::new());
    }
    lines.join("\n")
}

/// `<video_id>.vtt`, with anything but ASCII alphanumerics, `-` and `_`
/// replaced so the name stays a single path component.
pub fn vtt_file_name(video_id: &str) -> String {
    let stem: String = video_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "video.vtt".to_string()
    } else {
        format!("{stem}.vtt")
    }
}
