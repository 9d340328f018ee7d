use std::sync::{Arc, Mutex};

use crate::dsp::amplify;

/// Samples retained for analysis readers. Matches the window the waveform
/// and spectrum views consume in one frame.
pub const TAP_LEN: usize = 2048;

/// Ring of the most recent post-gain samples, shared between the rendering
/// thread (writer) and any number of pollers (readers).
struct TapRing {
    samples: Vec<f32>,
    write_pos: usize,
    /// Total frames ever published; lets pollers detect staleness cheaply.
    frames: u64,
}

impl TapRing {
    fn write(&mut self, block: &[f32]) {
        for &s in block {
            self.samples[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % TAP_LEN;
        }
        self.frames += block.len() as u64;
    }
}

/// Read handle onto the mixed output signal.
///
/// Pull-based and non-destructive: reading copies the most recent window
/// without consuming it, so any number of views can poll at their own frame
/// rate with no effect on the signal or on each other. Cloning the handle
/// just clones the `Arc`.
#[derive(Clone)]
pub struct AnalysisTap {
    ring: Arc<Mutex<TapRing>>,
}

impl AnalysisTap {
    /// Copy the latest samples into `out` in chronological order (oldest
    /// first) and return how many were written: `min(out.len(), TAP_LEN)`.
    pub fn read_into(&self, out: &mut [f32]) -> usize {
        let ring = self.ring.lock().expect("tap lock poisoned");
        let len = out.len().min(TAP_LEN);

        // Walk backwards from the write position so `out` ends on the
        // newest sample
        let start = (ring.write_pos + TAP_LEN - len) % TAP_LEN;
        for (i, slot) in out[..len].iter_mut().enumerate() {
            *slot = ring.samples[(start + i) % TAP_LEN];
        }
        len
    }

    /// Total frames published so far. Unchanged value between two polls
    /// means no new audio has been rendered.
    pub fn frames_published(&self) -> u64 {
        self.ring.lock().expect("tap lock poisoned").frames
    }

    pub fn window_len(&self) -> usize {
        TAP_LEN
    }
}

/// The single point every voice's output flows through on its way to the
/// device: master gain, then the analysis tap, then the interleaved device
/// buffer. Voices never touch the device buffer directly, so level and
/// analysis policy stay in one place.
pub struct MasterBus {
    gain: f32,
    ring: Arc<Mutex<TapRing>>,
}

impl MasterBus {
    pub fn new(gain: f32) -> Self {
        Self {
            gain,
            ring: Arc::new(Mutex::new(TapRing {
                samples: vec![0.0; TAP_LEN],
                write_pos: 0,
                frames: 0,
            })),
        }
    }

    pub fn tap(&self) -> AnalysisTap {
        AnalysisTap {
            ring: Arc::clone(&self.ring),
        }
    }

    /// Apply master gain to `block`, publish it to the tap, and fan it out
    /// to every channel of the interleaved `out` buffer.
    ///
    /// The tap publish uses `try_lock`: if a reader holds the lock this
    /// frame is simply not observable, and the rendering thread never
    /// blocks.
    pub fn route(&mut self, block: &mut [f32], out: &mut [f32], channels: usize) {
        debug_assert_eq!(out.len(), block.len() * channels);

        amplify::apply_gain(block, self.gain);

        if let Ok(mut ring) = self.ring.try_lock() {
            ring.write(block);
        }

        for (frame, &s) in block.iter().enumerate() {
            for ch in 0..channels {
                out[frame * channels + ch] = s;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_to_all_channels_with_gain() {
        let mut bus = MasterBus::new(0.5);
        let mut block = [1.0f32, -1.0, 0.5, 0.0];
        let mut out = [0.0f32; 8];

        bus.route(&mut block, &mut out, 2);

        assert_eq!(out, [0.5, 0.5, -0.5, -0.5, 0.25, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn tap_sees_what_the_device_sees() {
        let mut bus = MasterBus::new(1.0);
        let tap = bus.tap();

        let mut block = [0.1f32, 0.2, 0.3];
        let mut out = [0.0f32; 3];
        bus.route(&mut block, &mut out, 1);

        let mut window = [0.0f32; 3];
        assert_eq!(tap.read_into(&mut window), 3);
        assert_eq!(window, [0.1, 0.2, 0.3]);
        assert_eq!(tap.frames_published(), 3);
    }

    #[test]
    fn reading_does_not_consume() {
        let mut bus = MasterBus::new(1.0);
        let tap = bus.tap();

        let mut block = [0.7f32; 4];
        let mut out = [0.0f32; 4];
        bus.route(&mut block, &mut out, 1);

        let mut a = [0.0f32; 4];
        let mut b = [0.0f32; 4];
        tap.read_into(&mut a);
        tap.read_into(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn window_holds_the_most_recent_samples() {
        let mut bus = MasterBus::new(1.0);
        let tap = bus.tap();

        // Overfill the ring, then check the tail is what remains
        let mut out = vec![0.0f32; TAP_LEN];
        let mut first = vec![0.25f32; TAP_LEN];
        bus.route(&mut first, &mut out, 1);
        let mut second = vec![0.75f32; 16];
        let mut out16 = [0.0f32; 16];
        bus.route(&mut second, &mut out16, 1);

        let mut window = [0.0f32; 32];
        tap.read_into(&mut window);
        assert!(window[..16].iter().all(|&s| s == 0.25));
        assert!(window[16..].iter().all(|&s| s == 0.75));
    }
}
