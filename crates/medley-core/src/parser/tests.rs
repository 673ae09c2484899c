use super::*;
use crate::config::default_noise;
use crate::status::Severity;

fn parser() -> LogEventParser {
    LogEventParser::new(default_noise())
}

fn music(line: &str) -> ParseEvents {
    parser().parse(line, Tool::Music, EngineState::Downloading)
}

fn video(line: &str) -> ParseEvents {
    parser().parse(line, Tool::Video, EngineState::Downloading)
}

#[test]
fn blank_lines_produce_nothing() {
    for line in ["", "   ", "\t\r", "\x1b[0m  "] {
        assert!(music(line).is_empty(), "{line:?}");
        assert!(video(line).is_empty(), "{line:?}");
    }
}

#[test]
fn music_discovery_sets_total() {
    let ev = music("Found 12 songs in MyMix");
    assert_eq!(ev.total_items, Some(12));
    assert_eq!(ev.downloaded_increment, 0);
    let log = ev.log.unwrap();
    assert!(log.message.contains("MyMix"));
    assert!(log.message.contains("12"));
    assert_eq!(log.severity, Severity::Info);
}

#[test]
fn music_discovery_strips_playlist_suffix() {
    let ev = music("Found 3 songs in Road Trip (Playlist)");
    assert_eq!(ev.log.unwrap().message, "Found 3 songs in Road Trip");
}

#[test]
fn music_completion() {
    let ev = music(r#"Downloaded "Song A": https://x"#);
    assert_eq!(ev.downloaded_increment, 1);
    assert!(ev.current_item.as_deref().unwrap().contains("Song A"));
    assert_eq!(ev.new_filename.as_deref(), Some("Song A"));
}

#[test]
fn music_item_start() {
    let ev = music(r#"Downloading "Artist - Song""#);
    assert_eq!(ev.new_state, Some(EngineState::Downloading));
    assert_eq!(ev.current_item.as_deref(), Some("Artist - Song"));
    assert_eq!(ev.downloaded_increment, 0);

    // URL fetch notices are not items.
    assert!(music("Downloading https://open.spotify.com/track/x").current_item.is_none());
}

#[test]
fn music_skip_counts_as_processed() {
    let ev = music("Skipping Artist - Song (file already exists) (duplicate)");
    assert_eq!(ev.downloaded_increment, 1);
    assert_eq!(ev.current_item.as_deref(), Some("Artist - Song"));
    assert!(ev.new_state.is_none());
    assert_eq!(ev.log.unwrap().severity, Severity::Info);
}

#[test]
fn rate_limit_enters_retrying_without_progress() {
    let ev = music("Your application has reached a rate/request limit. Retry will occur after: 30 s");
    assert_eq!(ev.new_state, Some(EngineState::Retrying));
    assert_eq!(ev.downloaded_increment, 0);
    let log = ev.log.unwrap();
    assert_eq!(log.severity, Severity::Warning);
    assert!(log.message.contains("30s"));
}

#[test]
fn rate_limit_wait_ignores_status_code() {
    let ev = video("WARNING: HTTP Error 429: Too Many Requests, retrying after 12 seconds");
    assert_eq!(ev.new_state, Some(EngineState::Retrying));
    assert!(ev.log.unwrap().message.contains("12s"));

    let ev = music("rate/request limit reached");
    assert!(ev.log.unwrap().message.ends_with("waiting"));
}

#[test]
fn retrying_recovers_on_next_classified_line() {
    let p = parser();
    let ev = p.parse("Skipping Artist - Song", Tool::Music, EngineState::Retrying);
    assert_eq!(ev.new_state, Some(EngineState::Downloading));

    // Another throttle notice keeps the state.
    let ev = p.parse("rate/request limit", Tool::Music, EngineState::Retrying);
    assert_eq!(ev.new_state, Some(EngineState::Retrying));

    // Inert lines do not drive recovery.
    let ev = p.parse("some unrelated chatter", Tool::Music, EngineState::Retrying);
    assert!(ev.is_empty());
}

#[test]
fn unresolvable_item_is_counted_and_errors() {
    let ev = music("LookupError: No results found for song: Artist - Missing");
    assert_eq!(ev.downloaded_increment, 1);
    let log = ev.log.unwrap();
    assert_eq!(log.severity, Severity::Error);
    assert!(log.message.contains("Artist - Missing"));

    let ev = video("ERROR: [youtube] abc123: Video unavailable");
    assert_eq!(ev.downloaded_increment, 1);
    assert_eq!(ev.log.unwrap().severity, Severity::Error);
}

#[test]
fn noise_warnings_are_suppressed() {
    assert!(video("WARNING: [youtube] abc: Some web client https formats have been skipped").is_empty());
    assert!(video("WARNING: No supported JavaScript runtime could be found").is_empty());

    let ev = video("WARNING: unable to extract uploader");
    let log = ev.log.unwrap();
    assert_eq!(log.severity, Severity::Warning);
    assert_eq!(log.message, "unable to extract uploader");
}

#[test]
fn custom_noise_list() {
    let p = LogEventParser::new(vec!["ffmpeg not found".into()]);
    assert!(p
        .parse("WARNING: ffmpeg not found", Tool::Video, EngineState::Idle)
        .is_empty());
    assert!(!p
        .parse("WARNING: web client", Tool::Video, EngineState::Idle)
        .is_empty());
}

#[test]
fn generic_errors_pass_through() {
    let ev = video("ERROR: unable to download webpage");
    assert_eq!(ev.log.unwrap().message, "unable to download webpage");
    let ev = music("PermissionError: [Errno 13] Permission denied: '/music/x.mp3'");
    assert!(ev.log.unwrap().message.starts_with("Permission denied"));
}

#[test]
fn video_progress_only_sets_state() {
    let ev = video("[download]  23.5% of 10.00MiB at 2.00MiB/s ETA 00:05");
    assert_eq!(ev.new_state, Some(EngineState::Downloading));
    assert!(ev.log.is_none());
    assert_eq!(ev.downloaded_increment, 0);
}

#[test]
fn video_item_discovery_uses_total() {
    let ev = video("[download] Downloading item 3 of 12");
    assert_eq!(ev.total_items, Some(12));
    assert_eq!(ev.downloaded_increment, 0);
}

#[test]
fn video_destination_and_completion() {
    let ev = video("[download] Destination: /music/Mix/Some_Song.webm");
    assert_eq!(ev.current_item.as_deref(), Some("Some_Song"));
    assert_eq!(ev.downloaded_increment, 0);

    let ev = video("[ExtractAudio] Destination: /music/Mix/Some_Song.mp3");
    assert_eq!(ev.downloaded_increment, 1);
    assert_eq!(ev.new_filename.as_deref(), Some("Some_Song.mp3"));

    let ev = video(r#"[Merger] Merging formats into "/music/Mix/Clip.mkv""#);
    assert_eq!(ev.new_filename.as_deref(), Some("Clip.mkv"));
}

#[test]
fn video_already_downloaded() {
    let ev = video("[download] /music/Mix/Clip.mp4 has already been downloaded");
    assert_eq!(ev.downloaded_increment, 1);
    assert_eq!(ev.current_item.as_deref(), Some("Clip"));
    assert_eq!(ev.new_filename.as_deref(), Some("Clip.mp4"));
}

#[test]
fn tool_specific_rules_do_not_cross() {
    assert!(video(r#"Downloaded "Song A": https://x"#).is_empty());
    assert!(music("[download] Destination: /x/y.webm").is_empty());
}

#[test]
fn ansi_codes_are_stripped() {
    let ev = music("\x1b[32mFound 4 songs in Colors\x1b[0m");
    assert_eq!(ev.total_items, Some(4));
    assert_eq!(ev.log.unwrap().message, "Found 4 songs in Colors");
}

#[test]
fn unmatched_and_hostile_lines_are_inert() {
    let samples = [
        "Processing query",
        "[youtube] abc: Downloading webpage",
        "[youtube] Extracting URL: https://youtu.be/x",
        "Found songs in nothing",
        "\u{0}\u{1}\u{7f}",
        "🎵🎵🎵",
        "Downloaded",
    ];
    for line in samples {
        assert!(music(line).is_empty(), "{line:?}");
        assert!(video(line).is_empty(), "{line:?}");
    }
}

#[test]
fn adversarial_lines_never_panic() {
    let huge = "9".repeat(40);
    let lines = [
        format!("Found {huge} songs in X"),
        format!("Downloading item 1 of {huge}"),
        format!("Playlist X: Downloading {huge} items"),
        format!("HTTP Error 429: retry after {huge} s"),
        "after".to_string(),
        "rate/request limit reached, try again after".to_string(),
        "\x1b[".to_string(),
        "\x1b[31".to_string(),
        "\x1b[31mFound".to_string(),
        "\u{FFFD}\u{FFFD}\u{FFFD}".to_string(),
        r#"Downloaded """#.to_string(),
        "Downloaded \"\u{FFFD}\"".to_string(),
        "Downloading \"".to_string(),
        "Skipping \"\"".to_string(),
        "[download] Destination: ".to_string(),
        "[Merger] Merging formats into \"\"".to_string(),
        "ERROR:".to_string(),
        "WARNING:".to_string(),
        "LookupError".to_string(),
        "Found 5 songs in ".to_string(),
        "٣ songs after ٤".to_string(),
        "x".repeat(64 * 1024),
    ];
    let parser = parser();
    for line in &lines {
        for tool in [Tool::Music, Tool::Video] {
            for state in [EngineState::Idle, EngineState::Downloading, EngineState::Retrying] {
                let ev = parser.parse(line, tool, state);
                assert!(ev.downloaded_increment <= 1, "{line:?}");
            }
        }
    }

    assert!(music(&lines[0]).is_empty());
    assert!(video(&lines[1]).total_items.is_none());
    let throttled = music(&lines[3]);
    assert_eq!(throttled.new_state, Some(EngineState::Retrying));
    assert_eq!(throttled.log.unwrap().message, "Rate limited upstream, waiting");
    assert!(music("after").is_empty());
    assert!(music(r#"Downloaded """#).is_empty());
    assert_eq!(
        music("Downloaded \"\u{FFFD}\"").new_filename.as_deref(),
        Some("\u{FFFD}")
    );
}

#[test]
fn first_integer_extraction() {
    assert_eq!(first_integer("after: 42 s"), Some(42));
    assert_eq!(first_integer("no digits"), None);
    assert_eq!(first_integer("a1b22"), Some(1));
}
