//! System prompts for the three agents, plus the date/time context
//! appended to each of them.

use chrono::{Local, Utc};

pub const ORCHESTRATOR_PROMPT: &str = "\
You are a robot assistant that answers music requests using the provided tools.
Hand Spotify requests (finding tracks or albums, listing album tracks, playing music) to the spotify tool.
Hand lyrics requests (finding lyrics, identifying a song from a fragment of its lyrics) to the lyrics tool.
A request may need both, e.g. identify a song from its lyrics, then play it.
Do not be overly verbose in your reasoning or responses.
Make sure to only pass valid URIs to tools that expect them. Do not pass placeholder inputs by accident.";

pub const SPOTIFY_AGENT_PROMPT: &str = "\
You are a specialized assistant that controls access to Spotify information.
You have access to several tools that allow you to search the Spotify catalog and play tracks.
To play a song, search for it first and pass the track_uri from the results to spotify_play_track.
To list the tracks on an album, search for the album first and pass its album_uri to spotify_album_tracks.
Make sure to only pass valid URIs to tools that expect them.
Do not pass placeholder inputs by accident.";

pub const LYRICS_AGENT_PROMPT: &str = "\
You are a specialized assistant that finds song lyrics.
Use genius_lyrics to fetch the lyrics of a song when you know its title.
When you only have a fragment of the lyrics, use web_search to identify the song first.
Report the song title and artist with your answer.
Do not pass placeholder inputs by accident.";

/// Current date and time, in UTC and local time.
///
/// ```text
/// Current date/time: Wednesday, February 05, 2025, 14:30:15 UTC (2025-02-05T14:30:15+00:00)
/// Local time: Wednesday, February 05, 2025, 09:30:15 -05:00 (2025-02-05T09:30:15-05:00)
/// ```
pub fn get_datetime_context() -> String {
    let utc_now = Utc::now();
    let local_now = Local::now();

    format!(
        "Current date/time: {}, {} UTC ({})\nLocal time: {}, {} ({})",
        utc_now.format("%A, %B %d, %Y"),
        utc_now.format("%H:%M:%S"),
        utc_now.to_rfc3339(),
        local_now.format("%A, %B %d, %Y"),
        local_now.format("%H:%M:%S %Z"),
        local_now.to_rfc3339()
    )
}

/// `base` followed by the date/time context.
pub fn build_system_prompt(base: &str) -> String {
    format!("{}\n\n{}", base.trim_end(), get_datetime_context())
}
