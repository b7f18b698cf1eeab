//! Fixed-capacity circular buffer feeding the spectrum analyser.
//!
//! New samples **overwrite** the oldest data when the buffer is full, so the
//! most-recent `capacity` samples are always available.  Unlike a draining
//! queue, the analyser reads the tail *without* consuming it — every frame
//! sees a sliding window over the live stream.
//!
//! # Example
//!
//! ```rust
//! use interview_coach::capture::SampleRing;
//!
//! let mut ring = SampleRing::new(4);
//! ring.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]); // 5 items → oldest dropped
//!
//! let mut window = [0.0_f32; 4];
//! ring.copy_tail(&mut window);
//! assert_eq!(window, [2.0, 3.0, 4.0, 5.0]);
//! ```

// ---------------------------------------------------------------------------
// SampleRing
// ---------------------------------------------------------------------------

/// A fixed-capacity circular buffer of `f32` audio samples.
///
/// ## Overflow behaviour
///
/// When [`push_slice`](Self::push_slice) would exceed `capacity`, the oldest
/// samples are silently overwritten.  The buffer never allocates beyond its
/// initial capacity.
pub struct SampleRing {
    buf: Vec<f32>,
    capacity: usize,
    /// Index of the *next* write position (wraps around `capacity`).
    write_pos: usize,
    /// Number of valid samples currently stored (≤ `capacity`).
    len: usize,
}

impl SampleRing {
    /// Create a new ring with the given `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SampleRing capacity must be > 0");
        Self {
            buf: vec![0.0; capacity],
            capacity,
            write_pos: 0,
            len: 0,
        }
    }

    /// Append `data` to the ring, overwriting the oldest samples on overflow.
    pub fn push_slice(&mut self, data: &[f32]) {
        for &sample in data {
            self.buf[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.capacity;
            if self.len < self.capacity {
                self.len += 1;
            }
        }
    }

    /// Copy the newest samples into `out` in chronological order, without
    /// consuming them.
    ///
    /// When fewer than `out.len()` samples have been written, the head of
    /// `out` is zero-padded so the valid tail still ends at `out`'s last
    /// element.  `out` longer than `capacity` is capped at `capacity`.
    pub fn copy_tail(&self, out: &mut [f32]) {
        let want = out.len().min(self.capacity);
        let have = want.min(self.len);
        let pad = out.len() - have;

        for slot in out[..pad].iter_mut() {
            *slot = 0.0;
        }

        // Oldest of the `have` samples sits `have` positions behind write_pos.
        let start = (self.write_pos + self.capacity - have) % self.capacity;
        for (i, slot) in out[pad..].iter_mut().enumerate() {
            *slot = self.buf[(start + i) % self.capacity];
        }
    }

    /// Discard all samples and reset the write position.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Number of valid samples currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the ring contains no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of samples the ring can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_tail_within_capacity() {
        let mut ring = SampleRing::new(8);
        ring.push_slice(&[1.0, 2.0, 3.0]);

        let mut out = [0.0_f32; 3];
        ring.copy_tail(&mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
        // Non-draining: a second read sees the same data.
        ring.copy_tail(&mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn overflow_keeps_newest() {
        let mut ring = SampleRing::new(4);
        ring.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(ring.len(), 4);
        let mut out = [0.0_f32; 4];
        ring.copy_tail(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn partial_fill_zero_pads_head() {
        let mut ring = SampleRing::new(8);
        ring.push_slice(&[7.0, 8.0]);

        let mut out = [9.9_f32; 4];
        ring.copy_tail(&mut out);
        assert_eq!(out, [0.0, 0.0, 7.0, 8.0]);
    }

    #[test]
    fn copy_shorter_window_than_stored() {
        let mut ring = SampleRing::new(8);
        ring.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut out = [0.0_f32; 2];
        ring.copy_tail(&mut out);
        assert_eq!(out, [4.0, 5.0]);
    }

    #[test]
    fn clear_resets_state() {
        let mut ring = SampleRing::new(4);
        ring.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        ring.clear();

        assert!(ring.is_empty());
        let mut out = [1.0_f32; 4];
        ring.copy_tail(&mut out);
        assert_eq!(out, [0.0, 0.0, 0.0, 0.0]);

        ring.push_slice(&[9.0]);
        let mut one = [0.0_f32; 1];
        ring.copy_tail(&mut one);
        assert_eq!(one, [9.0]);
    }

    #[test]
    #[should_panic(expected = "SampleRing capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = SampleRing::new(0);
    }
}
