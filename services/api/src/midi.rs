//! services/api/src/midi.rs
//!
//! Renders a chord-progression string ("Cmaj7 - Am7 - Fmaj7 - G") into a
//! Standard MIDI File for playback. One whole note per chord at a fixed
//! tempo, all voices on one piano channel.
//!
//! Uses the `midly` crate for MIDI writing. Output is SMF Format 1.

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Each chord sounds for a whole note.
const TICKS_PER_CHORD: u32 = TICKS_PER_QUARTER as u32 * 4;

const TEMPO_BPM: u32 = 120;

const VELOCITY: u8 = 80;

/// Renders the progression to SMF bytes. Returns `None` when no chord
/// symbol in the string can be parsed.
pub fn render_progression(progression: &str) -> Option<Vec<u8>> {
    let chords: Vec<Vec<u8>> = progression
        .split(['-', '|', ','])
        .filter_map(|symbol| parse_chord(symbol.trim()))
        .collect();
    if chords.is_empty() {
        return None;
    }

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Track<'static> = Vec::new();
    let tempo_microseconds = 60_000_000 / TEMPO_BPM;
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    // Track 1: the chords, acoustic grand on channel 0.
    let channel = u4::new(0);
    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange { program: u7::new(0) },
        },
    });

    for pitches in &chords {
        for (i, pitch) in pitches.iter().enumerate() {
            track.push(TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key: u7::new(*pitch),
                        vel: u7::new(if i == 0 { VELOCITY } else { VELOCITY - 10 }),
                    },
                },
            });
        }
        for (i, pitch) in pitches.iter().enumerate() {
            track.push(TrackEvent {
                delta: u28::new(if i == 0 { TICKS_PER_CHORD } else { 0 }),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key: u7::new(*pitch),
                        vel: u7::new(0),
                    },
                },
            });
        }
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    let mut buf = Vec::new();
    smf.write(&mut buf).ok()?;
    Some(buf)
}

/// Parses a chord symbol ("Am7", "Fmaj7", "Bb", "Gsus4") into MIDI pitches
/// around middle C. Unknown quality suffixes fall back to a major triad.
pub fn parse_chord(symbol: &str) -> Option<Vec<u8>> {
    let mut chars = symbol.chars();
    let letter = chars.next()?;
    let base: i16 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest: &str = chars.as_str();
    let (accidental, quality) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let root = (60 + base + accidental) as u8;
    let intervals: &[u8] = match quality {
        "" | "maj" => &[0, 4, 7],
        "m" | "min" => &[0, 3, 7],
        "maj7" => &[0, 4, 7, 11],
        "m7" | "min7" => &[0, 3, 7, 10],
        "7" => &[0, 4, 7, 10],
        "dim" => &[0, 3, 6],
        "dim7" => &[0, 3, 6, 9],
        "m7b5" => &[0, 3, 6, 10],
        "aug" => &[0, 4, 8],
        "sus2" => &[0, 2, 7],
        "sus4" => &[0, 5, 7],
        "6" => &[0, 4, 7, 9],
        "m6" => &[0, 3, 7, 9],
        "add9" => &[0, 4, 7, 14],
        "9" => &[0, 4, 7, 10, 14],
        "m9" => &[0, 3, 7, 10, 14],
        _ => &[0, 4, 7],
    };

    Some(intervals.iter().map(|i| root + i).collect())
}
