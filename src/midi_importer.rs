use crate::model::curve::{PitchCurve, PitchPoint};
use crate::model::song::*;
use anyhow::{Result, anyhow};
use log::{debug, warn};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;
/// Raw bend units per semitone of decoded deviation.
pub const PITCH_BEND_UNITS_PER_SEMITONE: f64 = 768.0;

/// Simple policy for reducing overlapping MIDI notes to a single monophonic vocal line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolyPolicy {
    /// Pick the highest active pitch for a given set of overlapping notes.
    #[default]
    Highest,

    /// Pick the lowest active pitch for a given set of overlapping notes.
    Lowest,

    /// Pick the highest velocity note for a given set of overlapping notes.
    Loudest,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub transpose_semitones: i32,
    /// `None` keeps overlapping notes as they are, leaving them for the pitch pipeline to reject.
    pub policy: Option<PolyPolicy>,
    pub channel: u8,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            transpose_semitones: 0,
            policy: Some(PolyPolicy::Highest),
            channel: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenNote {
    start_tick: u64,
    velocity: u8,
    lyric: Option<String>,
}

#[derive(Debug, Clone)]
struct NoteInterval {
    key: u8,
    start_tick: u64,
    end_tick: u64,
    velocity: u8,
    lyric: Option<String>,
}

#[derive(Debug, Clone)]
struct VoicedNote {
    note: Note,
    velocity: u8,
}

#[derive(Debug, Clone, Copy)]
struct Boundary {
    tick: i64,
    is_start: bool,
    index: usize,
}

pub fn import_midi_file<P: AsRef<Path>>(path: P, options: ImportOptions) -> Result<Song> {
    let bytes = fs::read(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read MIDI file {}: {}",
            path.as_ref().display(),
            e
        )
    })?;

    midi_bytes_to_song(&bytes, path.as_ref(), options)
}

pub fn midi_bytes_to_song(bytes: &[u8], source_path: &Path, options: ImportOptions) -> Result<Song> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("Failed to parse MIDI: {:?}", e))?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(_fps, _subframe) => {
            return Err(anyhow!(
                "SMPTE timecode midi timing is not currently supported..!"
            ));
        }
    };

    if ticks_per_quarter == 0 {
        return Err(anyhow!("MIDI header declares zero ticks per quarter note..!"));
    }

    debug!("Ticks per quarter note: {}", ticks_per_quarter);
    debug!(
        "MIDI format: {:?}, tracks: {}",
        smf.header.format,
        smf.tracks.len()
    );

    let to_timeline = |tick: u64| -> i64 { (tick * TICKS_IN_BEAT as u64 / ticks_per_quarter as u64) as i64 };

    let mut track_name = String::new();
    let mut tempo_changes: Vec<(u64, u32)> = Vec::new();
    let mut intervals: Vec<NoteInterval> = Vec::new();
    let mut bends: Vec<PitchPoint> = Vec::new();
    let mut open_notes: HashMap<u8, Vec<OpenNote>> = HashMap::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut abs_tick: u64 = 0;
        let mut pending_lyric: Option<String> = None;

        for event in track.iter() {
            abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);

            match &event.kind {
                TrackEventKind::Meta(meta) => match meta {
                    MetaMessage::Tempo(micro) => {
                        let mpqn: u32 = micro.as_int();
                        tempo_changes.push((abs_tick, mpqn));
                        debug!(
                            "Tempo change at tick {} -> {} us/qn (track {})",
                            abs_tick, mpqn, track_idx
                        );
                    }
                    MetaMessage::TrackName(bytes) => {
                        if track_name.is_empty() {
                            track_name = String::from_utf8_lossy(bytes).into_owned();
                            debug!("Track name: {}", track_name);
                        }
                    }
                    MetaMessage::Lyric(bytes) => {
                        let lyric = String::from_utf8_lossy(bytes).trim().to_string();
                        if !lyric.is_empty() {
                            pending_lyric = Some(lyric);
                        }
                    }
                    _ => {}
                },
                TrackEventKind::Midi { channel, message } => {
                    if channel.as_int() != options.channel {
                        continue;
                    }

                    match message {
                        MidiMessage::NoteOn { key, vel } => {
                            let velocity: u8 = vel.as_int();

                            if velocity == 0 {
                                close_note(&mut open_notes, &mut intervals, key.as_int(), abs_tick);
                            } else {
                                open_notes.entry(key.as_int()).or_default().push(OpenNote {
                                    start_tick: abs_tick,
                                    velocity,
                                    lyric: pending_lyric.take(),
                                });
                            }
                        }
                        MidiMessage::NoteOff { key, vel: _ } => {
                            close_note(&mut open_notes, &mut intervals, key.as_int(), abs_tick);
                        }
                        MidiMessage::PitchBend { bend } => {
                            let value = bend.as_int() as f64 / PITCH_BEND_UNITS_PER_SEMITONE;
                            bends.push(PitchPoint::new(to_timeline(abs_tick), value));
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    let last_tick_estimate = intervals
        .iter()
        .map(|interval| interval.end_tick)
        .max()
        .unwrap_or(0)
        .max(
            tempo_changes
                .iter()
                .map(|(tick, _)| *tick)
                .max()
                .unwrap_or(0),
        );

    for (key, stack) in open_notes.into_iter() {
        for open in stack {
            let end_tick = if last_tick_estimate > open.start_tick {
                last_tick_estimate
            } else {
                open.start_tick + ticks_per_quarter as u64
            };

            warn!(
                "Unclosed NoteOn for {} at tick: {} auto-closing at: {}..!",
                key, open.start_tick, end_tick
            );

            intervals.push(NoteInterval {
                key,
                start_tick: open.start_tick,
                end_tick,
                velocity: open.velocity,
                lyric: open.lyric,
            });
        }
    }

    tempo_changes.sort_by_key(|(tick, _)| *tick);
    let tempos: Vec<Tempo> = tempo_changes
        .into_iter()
        .filter(|(_, mpqn)| *mpqn > 0)
        .map(|(tick, mpqn)| Tempo::new(to_timeline(tick), MICROSECONDS_PER_MINUTE / mpqn as f64))
        .collect();

    let mut voiced: Vec<VoicedNote> = Vec::new();
    for interval in intervals.into_iter() {
        let key = interval.key as i32 + options.transpose_semitones;

        if !(0..=127).contains(&key) {
            warn!("Dropping out-of-range MIDI {} after transpose..!", key);
            continue;
        }

        let tick_on = to_timeline(interval.start_tick);
        let tick_off = to_timeline(interval.end_tick);

        if tick_off <= tick_on {
            debug!(
                "Skipping zero/negative length midi note {}, start: {} end: {}..!",
                interval.key, tick_on, tick_off
            );
            continue;
        }

        let lyric = interval.lyric.unwrap_or_else(|| DEFAULT_LYRIC.to_string());
        voiced.push(VoicedNote {
            note: Note::new(key as u8, tick_on, tick_off, lyric),
            velocity: interval.velocity,
        });
    }

    voiced.sort_by_key(|v| (v.note.tick_on, v.note.tick_off));

    let notes = match options.policy {
        Some(policy) => reduce_to_monophonic(voiced, policy),
        None => voiced.into_iter().map(|v| v.note).collect(),
    };

    debug!(
        "Imported {} notes, {} tempo changes and {} pitch bend samples..!",
        notes.len(),
        tempos.len(),
        bends.len()
    );

    let song = Song {
        metadata: Metadata {
            title: source_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
                .or_else(|| (!track_name.is_empty()).then_some(track_name)),
            source_ticks_per_beat: Some(ticks_per_quarter),
        },
        notes,
        tempos,
        pitch: PitchCurve::new(bends, false),
    };

    Ok(song)
}

fn close_note(
    open_notes: &mut HashMap<u8, Vec<OpenNote>>,
    intervals: &mut Vec<NoteInterval>,
    key: u8,
    abs_tick: u64,
) {
    if let Some(open) = open_notes.get_mut(&key).and_then(|stack| stack.pop()) {
        intervals.push(NoteInterval {
            key,
            start_tick: open.start_tick,
            end_tick: abs_tick,
            velocity: open.velocity,
            lyric: open.lyric,
        });
    } else {
        debug!("Orphaned NoteOff for {} at tick {}..!", key, abs_tick);
    }
}

/// Given a possibly-overlapping set of notes, reduce to a single monophonic sequence according
/// to the specified policy. The notes emitted by this function never overlap.
///
/// Basic approach: create a sorted set of ticks where something changes (start or end), and at
/// each of them decide which note should be active using the policy.
fn reduce_to_monophonic(notes: Vec<VoicedNote>, policy: PolyPolicy) -> Vec<Note> {
    if notes.is_empty() {
        return Vec::new();
    }

    let mut boundaries: Vec<Boundary> = notes
        .iter()
        .enumerate()
        .flat_map(|(index, v)| {
            [
                Boundary {
                    tick: v.note.tick_on,
                    is_start: true,
                    index,
                },
                Boundary {
                    tick: v.note.tick_off,
                    is_start: false,
                    index,
                },
            ]
        })
        .collect();

    // Ends sort before starts at the same tick, so a note ending at `t` is not counted active
    // for another note starting at `t`.
    boundaries.sort_by_key(|b| (b.tick, b.is_start));

    let mut result: Vec<Note> = Vec::new();
    let mut current: Option<(usize, i64)> = None;
    let mut active: Vec<usize> = Vec::new();
    let mut reduced = false;

    for b in boundaries.into_iter() {
        if b.is_start {
            active.push(b.index);
        } else {
            active.retain(|&i| i != b.index);
        }

        if active.len() > 1 && !reduced {
            reduced = true;
            warn!(
                "MIDI contains overlapping notes, so reducing to monophony according to the chosen policy [{:?}]...",
                policy
            );
        }

        let chosen = match policy {
            PolyPolicy::Highest => active.iter().copied().max_by_key(|&i| notes[i].note.key),
            PolyPolicy::Lowest => active.iter().copied().min_by_key(|&i| notes[i].note.key),
            PolyPolicy::Loudest => active.iter().copied().max_by_key(|&i| notes[i].velocity),
        };

        if chosen != current.map(|(index, _)| index) {
            if let Some((index, start)) = current
                && b.tick > start
            {
                let mut note = notes[index].note.clone();
                note.tick_on = start;
                note.tick_off = b.tick;
                result.push(note);
            }

            current = chosen.map(|index| (index, b.tick));
        }
    }

    result
}
