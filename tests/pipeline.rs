use VOX_BEND::pitch::interpolation::Kernel;
use VOX_BEND::pitch::sectioned::PITCH_MAX_VALUE;
use VOX_BEND::pitch::vibrato::Shaping;
use VOX_BEND::{
    Converter, ImportOptions, Metadata, Note, PitchCurve, PitchError, Song, Target, Tempo,
    VibratoParams, midi_bytes_to_song,
};
use midly::num::{u4, u7, u14, u15, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, TrackEvent, TrackEventKind};
use std::path::Path;

fn midi(message: MidiMessage) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(0),
        message,
    }
}

fn bend(value: i16) -> TrackEventKind<'static> {
    midi(MidiMessage::PitchBend {
        bend: PitchBend(u14::new((value as i32 + 0x2000) as u16)),
    })
}

fn two_note_midi() -> Vec<u8> {
    let events = vec![
        (0, midi(MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(100) })),
        (0, bend(0)),
        (120, bend(384)),
        (240, bend(3072)),
        (120, midi(MidiMessage::NoteOff { key: u7::new(60), vel: u7::new(0) })),
        (0, midi(MidiMessage::NoteOn { key: u7::new(64), vel: u7::new(100) })),
        (480, midi(MidiMessage::NoteOff { key: u7::new(64), vel: u7::new(0) })),
        (1000, bend(-768)),
    ];

    let mut track: Vec<TrackEvent<'static>> = events
        .into_iter()
        .map(|(delta, kind)| TrackEvent {
            delta: u28::new(delta),
            kind,
        })
        .collect();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(480))),
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

#[test]
fn midi_to_both_targets() {
    let song = midi_bytes_to_song(&two_note_midi(), Path::new("demo.mid"), ImportOptions::default()).unwrap();
    assert_eq!(song.notes.len(), 2);

    let conversion = Converter::default().convert(&song, Target::Both).unwrap();

    let flat = conversion.flat.unwrap();
    let values: Vec<f64> = flat.points.iter().map(|p| p.value).collect();
    assert_eq!(flat.points.first().map(|p| p.tick), Some(0));
    assert!(values.contains(&50.0));
    assert!(values.contains(&400.0));
    assert!(values.contains(&-100.0));

    let sectioned = conversion.sectioned.unwrap();
    // 4 semitones exceeds the default range, and the late bend sits in its own section.
    assert_eq!(sectioned.pitch_bend_sensitivity.first().map(|e| e.value), Some(4));
    assert_eq!(sectioned.pitch_bend.last().map(|e| e.pos), Some(1960));
    assert_eq!(sectioned.pitch_bend.last().map(|e| e.value), Some(-4095));
    assert!(sectioned.pitch_bend.iter().all(|e| e.value.abs() <= PITCH_MAX_VALUE));

    let json = serde_json::to_value(Converter::default().convert(&song, Target::Sectioned).unwrap()).unwrap();
    assert!(json["flat"].is_null());
    assert!(json["sectioned"]["pitchBend"].is_array());
}

#[test]
fn absolute_curve_with_vibrato() {
    let song = Song {
        metadata: Metadata::default(),
        notes: vec![Note::new(60, 0, 1920, "a"), Note::new(62, 1920, 3840, "i")],
        tempos: vec![Tempo::new(0, 120.0), Tempo::new(1920, 90.0)],
        pitch: PitchCurve::from_values([(0, 60.0), (960, 60.5), (1920, 62.0), (3840, 62.0)], true),
    };

    let converter = Converter::new(Some(Shaping {
        kernel: Kernel::Linear,
        defaults: VibratoParams {
            depth: Some(2.0),
            ..Default::default()
        },
        envelope: None,
    }));

    let sectioned = converter.convert_sectioned(&song).unwrap().unwrap();
    assert!(sectioned.pitch_bend.len() > 100);
    assert!(sectioned.pitch_bend.windows(2).all(|w| w[0].pos < w[1].pos));
    assert!(sectioned.pitch_bend.iter().any(|e| e.value != 0));

    let flat = converter.convert_flat(&song).unwrap().unwrap();
    assert!(flat.points.windows(2).all(|w| w[0].tick < w[1].tick));
}

#[test]
fn overlapping_notes_abort() {
    let song = Song {
        metadata: Metadata::default(),
        notes: vec![Note::new(60, 0, 600, "a"), Note::new(62, 480, 960, "i")],
        tempos: vec![],
        pitch: PitchCurve::from_values([(0, 1.0)], false),
    };

    assert!(matches!(
        Converter::default().convert(&song, Target::Flat),
        Err(PitchError::OverlappingNotes { index: 0, tick_off: 600, next_tick_on: 480 })
    ));
}

#[test]
fn no_notes_no_curve() {
    let song = Song {
        metadata: Metadata::default(),
        notes: vec![],
        tempos: vec![],
        pitch: PitchCurve::from_values([(0, 61.0)], true),
    };

    let conversion = Converter::default().convert(&song, Target::Both).unwrap();
    assert!(conversion.flat.is_none());
    assert!(conversion.sectioned.is_none());
}
