use log::debug;
use midly::num::{u14, u15, u24, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::constants::{
    MIDI_CHANNEL, MIDI_PROGRAM, MIDI_TEMPO_US, PITCH_BEND_CENTER, PITCH_BEND_MAX, PITCH_BEND_PER_CONTOUR_BIN,
    TIME_SIGNATURE_DENOMINATOR_POW2, TIME_SIGNATURE_NUMERATOR,
};
use crate::error::Result;

use super::note_event_times::NoteEventTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEventKind {
    NoteOff { key: u8 },
    NoteOn { key: u8, vel: u8 },
    /// 14-bit value, 8192 is centre.
    PitchBend { value: u16 },
}

impl TimedEventKind {
    /// Order among events sharing a tick: note offs, then note ons, then
    /// pitch bends.
    pub fn tie_break_rank(&self) -> u8 {
        match self {
            TimedEventKind::NoteOff { .. } => 0,
            TimedEventKind::NoteOn { .. } => 1,
            TimedEventKind::PitchBend { .. } => 2,
        }
    }

    fn to_midi_message(self) -> MidiMessage {
        match self {
            TimedEventKind::NoteOff { key } => MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
            TimedEventKind::NoteOn { key, vel } => MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
            TimedEventKind::PitchBend { value } => MidiMessage::PitchBend {
                bend: PitchBend(u14::new(value)),
            },
        }
    }
}

/// A channel event at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: u32,
    pub channel: u8,
    pub kind: TimedEventKind,
}

/// Converts seconds to ticks at the fixed 120 BPM tempo.
pub fn time_to_ticks(time_seconds: f32, ticks_per_quarter: u16) -> u32 {
    let ticks = time_seconds as f64 * ticks_per_quarter as f64 * 1_000_000.0 / MIDI_TEMPO_US as f64;
    ticks.round().max(0.0) as u32
}

/// MIDI velocity for an amplitude in `[0, 1]`, clamped to `0..=127`.
pub fn amplitude_to_velocity(amplitude: f32) -> u8 {
    (amplitude * 127.0).round().clamp(0.0, 127.0) as u8
}

/// 14-bit pitch bend value for an offset in contour bins, clamped to `0..=16383`.
pub fn contour_bend_to_pitch_bend(bend: i32) -> u16 {
    bend.saturating_mul(PITCH_BEND_PER_CONTOUR_BIN)
        .saturating_add(PITCH_BEND_CENTER)
        .clamp(0, PITCH_BEND_MAX) as u16
}

/// Build every note on, note off and pitch bend event at its absolute tick,
/// sorted by tick and then by [`TimedEventKind::tie_break_rank`].
///
/// Pitch bends are spread evenly from a note's start to its end; no bend's
/// tick exceeds the note off tick. A single bend sits on the note's start tick.
pub fn generate_ordered_midi_events(note_events: &[NoteEventTime], ticks_per_quarter: u16) -> Vec<TimedEvent> {
    let mut events = vec![];
    let event = |tick: u32, kind: TimedEventKind| TimedEvent {
        tick,
        channel: MIDI_CHANNEL,
        kind,
    };

    for note_event in note_events {
        let start_tick = time_to_ticks(note_event.start_time_seconds, ticks_per_quarter);
        let end_tick = time_to_ticks(note_event.end_time_seconds, ticks_per_quarter);
        let key = note_event.pitch_midi;

        events.push(event(
            start_tick,
            TimedEventKind::NoteOn {
                key,
                vel: amplitude_to_velocity(note_event.amplitude),
            },
        ));

        if let Some(pitch_bends) = &note_event.pitch_bends {
            match pitch_bends.len() {
                0 => {}
                1 => events.push(event(
                    start_tick,
                    TimedEventKind::PitchBend {
                        value: contour_bend_to_pitch_bend(pitch_bends[0]),
                    },
                )),
                n => {
                    let time_increment = note_event.duration_seconds() / (n - 1) as f32;
                    for (i, &pitch_bend) in pitch_bends.iter().enumerate() {
                        let bend_time = note_event.start_time_seconds + i as f32 * time_increment;
                        let bend_tick = time_to_ticks(bend_time, ticks_per_quarter).min(end_tick);
                        events.push(event(
                            bend_tick,
                            TimedEventKind::PitchBend {
                                value: contour_bend_to_pitch_bend(pitch_bend),
                            },
                        ));
                    }
                }
            }
        }

        events.push(event(end_tick, TimedEventKind::NoteOff { key }));
    }

    // stable, so equal keys keep note order
    events.sort_by(|a, b| {
        a.tick
            .cmp(&b.tick)
            .then(a.kind.tie_break_rank().cmp(&b.kind.tie_break_rank()))
    });

    events
}

/// Generate MIDI file data from note events.
///
/// The file has two tracks: tempo and time signature, then an electric
/// piano track on channel 0 holding the notes and bends.
///
/// # Arguments
///
/// * `notes` - List of time-based note events.
/// * `ticks_per_quarter` - Metrical resolution.
///
/// # Returns
///
/// * A vector of bytes representing the MIDI file.
pub fn generate_midi_file_data(notes: &[NoteEventTime], ticks_per_quarter: u16) -> Result<Vec<u8>> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(ticks_per_quarter)),
    ));

    let mut meta_track = Track::new();
    meta_track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(MIDI_TEMPO_US))),
    });
    meta_track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
            TIME_SIGNATURE_NUMERATOR,
            TIME_SIGNATURE_DENOMINATOR_POW2,
            24, // MIDI clocks per metronome click
            8,  // 32nd notes per quarter note
        )),
    });
    meta_track.push(end_of_track(0));
    smf.tracks.push(meta_track);

    let mut track = Track::new();
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Midi {
            channel: MIDI_CHANNEL.into(),
            message: MidiMessage::ProgramChange {
                program: u7::new(MIDI_PROGRAM),
            },
        },
    });

    let events = generate_ordered_midi_events(notes, ticks_per_quarter);
    debug!("encoding {} events for {} notes", events.len(), notes.len());

    let mut last_tick = 0;
    for event in &events {
        track.push(TrackEvent {
            delta: event.tick.saturating_sub(last_tick).into(),
            kind: TrackEventKind::Midi {
                channel: event.channel.into(),
                message: event.kind.to_midi_message(),
            },
        });
        last_tick = event.tick;
    }
    track.push(end_of_track(0));
    smf.tracks.push(track);

    let mut buffer = Vec::new();
    smf.write_std(&mut buffer)?;

    Ok(buffer)
}

fn end_of_track<'a>(delta: u32) -> TrackEvent<'a> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}
