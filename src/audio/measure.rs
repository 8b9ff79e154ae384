// Duration probing for encoded clips
//
// Containers that carry a frame count (WAV, most MP4/FLAC) are answered from
// the header. Headerless streams (plain MP3 from TTS providers) are walked
// packet by packet.

use std::io::Cursor;
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Length of the encoded audio in `bytes`, or `None` if it cannot be probed
pub fn clip_duration(bytes: &[u8], mime: &str) -> Option<Duration> {
    if bytes.is_empty() {
        return None;
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_for(mime) {
        hint.with_extension(extension);
    }

    let probed = match symphonia::default::get_probe().format(
        &hint,
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) {
        Ok(probed) => probed,
        Err(e) => {
            warn!("Failed to probe {} audio: {}", mime, e);
            return None;
        }
    };

    let mut format = probed.format;
    let track = format.default_track()?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let frames = match params.n_frames {
        Some(frames) => frames,
        None => {
            let mut total = 0u64;
            while let Ok(packet) = format.next_packet() {
                if packet.track_id() == track_id {
                    total += packet.dur;
                }
            }
            total
        }
    };

    let duration = if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(frames);
        Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac)
    } else if let Some(sample_rate) = params.sample_rate.filter(|rate| *rate > 0) {
        Duration::from_secs_f64(frames as f64 / sample_rate as f64)
    } else {
        warn!("{} audio has neither time base nor sample rate", mime);
        return None;
    };

    debug!("Measured {} audio: {:.2}s", mime, duration.as_secs_f64());

    Some(duration)
}

fn extension_for(mime: &str) -> Option<&'static str> {
    match mime.split(';').next().map(str::trim) {
        Some("audio/mpeg") | Some("audio/mp3") => Some("mp3"),
        Some("audio/wav") | Some("audio/x-wav") | Some("audio/wave") => Some("wav"),
        Some("audio/ogg") => Some("ogg"),
        Some("audio/flac") => Some("flac"),
        Some("audio/mp4") | Some("audio/aac") => Some("m4a"),
        _ => None,
    }
}

/// MIME type guessed from a file extension
pub fn mime_for_path(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a") | Some("mp4") | Some("aac") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_garbage_bytes() {
        assert_eq!(clip_duration(&[], "audio/wav"), None);
        assert_eq!(clip_duration(b"definitely not audio", "audio/mpeg"), None);
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(std::path::Path::new("rain.MP3")), "audio/mpeg");
        assert_eq!(mime_for_path(std::path::Path::new("bed.wav")), "audio/wav");
        assert_eq!(mime_for_path(std::path::Path::new("noext")), "application/octet-stream");
    }
}
