use basic_pitch_midi::{convert, transcribe, Activations, ConversionConfig, ConversionError};
use midly::num::{u15, u24};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use ndarray::Array2;

const N_NOTE_BINS: usize = 88;
const N_CONTOUR_BINS: usize = 264;

fn silent(n_frames: usize) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    (
        Array2::zeros((n_frames, N_NOTE_BINS)),
        Array2::zeros((n_frames, N_NOTE_BINS)),
        Array2::zeros((n_frames, N_CONTOUR_BINS)),
    )
}

/// One sustained note at MIDI 61 from frame 5 to 25.
fn single_note() -> Activations {
    let (mut notes, mut onsets, contours) = silent(100);
    onsets[[5, 40]] = 0.9;
    for t in 5..25 {
        notes[[t, 40]] = 0.8;
    }
    Activations::new(notes, onsets, contours).unwrap()
}

/// A busier texture: two overlapping notes, one isolated note and an
/// onset-less stretch of energy.
fn chord_and_tail() -> Activations {
    let (mut notes, mut onsets, mut contours) = silent(200);
    for (start, end, bin) in [(10, 40, 39), (20, 60, 43), (80, 110, 50)] {
        onsets[[start, bin]] = 0.95;
        for t in start..end {
            notes[[t, bin]] = 0.7;
            contours[[t, bin * 3 + 1]] = 0.9;
        }
    }
    for t in 130..160 {
        notes[[t, 60]] = 0.6;
    }
    Activations::new(notes, onsets, contours).unwrap()
}

/// Channel messages of the instrument track with their absolute ticks.
fn instrument_events(bytes: &[u8]) -> Vec<(u32, MidiMessage)> {
    let smf = Smf::parse(bytes).unwrap();
    assert_eq!(smf.tracks.len(), 2);

    let mut tick = 0;
    let mut events = vec![];
    for event in &smf.tracks[1] {
        tick += event.delta.as_int();
        if let TrackEventKind::Midi { message, .. } = event.kind {
            events.push((tick, message));
        }
    }
    events
}

fn count(events: &[(u32, MidiMessage)], pred: impl Fn(&MidiMessage) -> bool) -> usize {
    events.iter().filter(|(_, m)| pred(m)).count()
}

#[test]
fn test_single_note_scenario() {
    let config = ConversionConfig {
        include_pitch_bends: false,
        ..Default::default()
    };
    let bytes = convert(&single_note(), &config).unwrap();
    let events = instrument_events(&bytes);

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], (0, MidiMessage::ProgramChange { program }) if program.as_int() == 4));
    assert!(
        matches!(events[1], (25, MidiMessage::NoteOn { key, vel }) if key.as_int() == 61 && vel.as_int() == 102)
    );
    assert!(matches!(events[2], (127, MidiMessage::NoteOff { key, .. }) if key.as_int() == 61));
}

#[test]
fn test_header_and_meta_track() {
    let bytes = convert(&single_note(), &ConversionConfig::default()).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(smf.header.timing, Timing::Metrical(u15::new(220)));
    let meta: Vec<_> = smf.tracks[0]
        .iter()
        .filter_map(|e| match e.kind {
            TrackEventKind::Meta(m) => Some(m),
            _ => None,
        })
        .collect();
    assert!(meta.contains(&MetaMessage::Tempo(u24::new(500_000))));
    assert!(meta.contains(&MetaMessage::TimeSignature(4, 2, 24, 8)));
}

#[test]
fn test_silence_gives_empty_instrument_track() {
    let (notes, onsets, contours) = silent(50);
    let activations = Activations::new(notes, onsets, contours).unwrap();

    let bytes = convert(&activations, &ConversionConfig::default()).unwrap();
    let events = instrument_events(&bytes);

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].1, MidiMessage::ProgramChange { .. }));
}

#[test]
fn test_events_are_in_tick_order() {
    let bytes = convert(&chord_and_tail(), &ConversionConfig::default()).unwrap();
    let events = instrument_events(&bytes);

    assert!(events.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[test]
fn test_note_on_and_off_counts_match_notes() {
    let config = ConversionConfig {
        include_pitch_bends: false,
        ..Default::default()
    };
    let activations = chord_and_tail();
    let notes = transcribe(&activations, &config).unwrap();
    let events = instrument_events(&convert(&activations, &config).unwrap());

    // three onset notes and one recovered from the tail
    assert_eq!(notes.len(), 4);
    assert_eq!(count(&events, |m| matches!(m, MidiMessage::NoteOn { .. })), notes.len());
    assert_eq!(count(&events, |m| matches!(m, MidiMessage::NoteOff { .. })), notes.len());
    assert_eq!(count(&events, |m| matches!(m, MidiMessage::PitchBend { .. })), 0);
}

#[test]
fn test_notes_stay_in_range() {
    let config = ConversionConfig::default();
    let notes = transcribe(&chord_and_tail(), &config).unwrap();

    for note in &notes {
        assert!((21..=108).contains(&note.pitch_midi));
        assert!(note.duration_frames() > config.min_note_length);
        assert!((0.0..=1.0).contains(&note.amplitude));
    }
}

#[test]
fn test_only_isolated_notes_keep_bends() {
    let activations = chord_and_tail();
    let notes = transcribe(&activations, &ConversionConfig::default()).unwrap();

    for note in &notes {
        let overlapped = notes.iter().any(|other| other != note && other.overlaps(note));
        assert_eq!(note.pitch_bends.is_none(), overlapped, "{note:?}");
        if let Some(bends) = &note.pitch_bends {
            assert_eq!(bends.len(), note.duration_frames());
        }
    }

    // the isolated onset note follows its contour one bin above nominal
    let isolated = notes.iter().find(|n| n.pitch_midi == 71).unwrap();
    assert!(isolated.pitch_bends.as_ref().unwrap().iter().all(|&b| b == 1));

    let events = instrument_events(&convert(&activations, &ConversionConfig::default()).unwrap());
    assert!(count(&events, |m| matches!(m, MidiMessage::PitchBend { .. })) > 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ConversionConfig {
        frame_threshold: 1.5,
        ..Default::default()
    };

    assert!(matches!(
        convert(&single_note(), &config),
        Err(ConversionError::InvalidConfig(_))
    ));
}

#[test]
fn test_output_is_deterministic() {
    let config = ConversionConfig::default();
    let activations = chord_and_tail();

    assert_eq!(convert(&activations, &config).unwrap(), convert(&activations, &config).unwrap());
}
