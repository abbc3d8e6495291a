//! Audible click on each committed key.
//!
//! A short synthesized tick, played through the default output device.
//! No audio device is a silent downgrade, never a failure: commits are
//! authoritative with or without the sound.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

const SAMPLE_RATE: u32 = 44_100;
const CLICK_HZ:    f32 = 1_000.0;
const CLICK_MS:    u32 = 30;

// ════════════════════════════════════════════════════════════════════════════
// ClickTone
// ════════════════════════════════════════════════════════════════════════════

pub struct ClickTone {
    // The stream must stay alive for the sink to keep playing.
    _stream: OutputStream,
    sink:    Sink,
    samples: Vec<f32>,
}

impl ClickTone {
    pub fn new() -> anyhow::Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        Ok(ClickTone {
            _stream: stream,
            sink,
            samples: synthesize_click(),
        })
    }

    /// Queue one click.  Clicks are short enough that queuing behind an
    /// in-flight one is inaudible.
    pub fn play(&self) {
        self.sink
            .append(SamplesBuffer::new(1, SAMPLE_RATE, self.samples.clone()));
    }
}

/// An exponentially decaying sine burst — reads as a key click without
/// shipping a sound asset.
fn synthesize_click() -> Vec<f32> {
    let n = (SAMPLE_RATE * CLICK_MS / 1000) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let envelope = (-t * 180.0).exp();
            (t * CLICK_HZ * std::f32::consts::TAU).sin() * envelope * 0.25
        })
        .collect()
}
