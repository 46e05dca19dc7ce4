//! External input sampled once per frame.
//!
//! The renderer owns the window, the camera, and the audio analyser. Each
//! frame it hands the simulation a [`FrameInput`] snapshot of plain values;
//! the most recent value always wins and nothing is queued.
//!
//! ```ignore
//! sim.input_mut().pointer.press(world_point);
//! sim.input_mut().audio.set_spectrum(&bins);
//! sim.update(delta);
//! ```

use glam::Vec3;

/// Pointer (mouse or touch) state in simulation space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerInput {
    /// Pointer already unprojected to a world point at the camera's working depth.
    world_position: Option<Vec3>,
    /// Button or touch currently held.
    active: bool,
    /// Sticky mode: interaction stays on without holding the button.
    continuous: bool,
}

impl PointerInput {
    /// Move the pointer to a new world position.
    pub fn set_position(&mut self, world_position: Vec3) {
        self.world_position = world_position.is_finite().then_some(world_position);
    }

    /// Pointer left the canvas.
    pub fn clear_position(&mut self) {
        self.world_position = None;
    }

    /// Button or touch went down at `world_position`.
    pub fn press(&mut self, world_position: Vec3) {
        self.set_position(world_position);
        self.active = true;
    }

    /// Button or touch went up.
    pub fn release(&mut self) {
        self.active = false;
    }

    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    pub fn toggle_continuous(&mut self) {
        self.continuous = !self.continuous;
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn world_position(&self) -> Option<Vec3> {
        self.world_position
    }

    /// World point to interact with this frame, if interaction is on.
    pub fn interaction_point(&self) -> Option<Vec3> {
        if self.active || self.continuous {
            self.world_position
        } else {
            None
        }
    }
}

/// Audio analyser output, or nothing when no microphone is connected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioInput {
    /// Normalized overall level (typically a spectral average).
    level: Option<f32>,
    /// Normalized per-bin magnitudes, used to spread the response over particles.
    spectrum: Vec<f32>,
}

impl AudioInput {
    /// Set the overall level; clamped to `[0, 1]`, non-finite values disconnect.
    pub fn set_level(&mut self, level: f32) {
        self.level = level.is_finite().then(|| level.clamp(0.0, 1.0));
    }

    /// Set per-bin magnitudes in `[0, 1]`; the level becomes their average.
    pub fn set_spectrum(&mut self, bins: &[f32]) {
        self.spectrum.clear();
        self.spectrum.extend(
            bins.iter()
                .map(|b| if b.is_finite() { b.clamp(0.0, 1.0) } else { 0.0 }),
        );
        if self.spectrum.is_empty() {
            self.level = None;
        } else {
            let sum: f32 = self.spectrum.iter().sum();
            self.level = Some(sum / self.spectrum.len() as f32);
        }
    }

    /// Microphone disconnected or permission denied.
    pub fn disconnect(&mut self) {
        self.level = None;
        self.spectrum.clear();
    }

    pub fn is_active(&self) -> bool {
        self.level.is_some()
    }

    pub fn level(&self) -> Option<f32> {
        self.level
    }

    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }

    /// Audio factor for particle `index`.
    ///
    /// Each particle listens to its own frequency bin (`index % bins`), so
    /// the response is spread over the field instead of moving everything
    /// in lockstep. Without a spectrum the overall level is used; without
    /// audio the factor is 0.
    pub fn factor(&self, index: usize) -> f32 {
        match self.level {
            None => 0.0,
            Some(level) if self.spectrum.is_empty() => level,
            Some(_) => self.spectrum[index % self.spectrum.len()],
        }
    }
}

/// Everything the simulation reads from the outside world in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInput {
    pub pointer: PointerInput,
    pub audio: AudioInput,
    /// Distance from the camera to the origin, scales the pointer radius.
    pub camera_distance: f32,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            pointer: PointerInput::default(),
            audio: AudioInput::default(),
            camera_distance: 50.0,
        }
    }
}

impl FrameInput {
    /// Set the camera distance; non-finite or negative values are ignored.
    pub fn set_camera_distance(&mut self, distance: f32) {
        if distance.is_finite() && distance > 0.0 {
            self.camera_distance = distance;
        }
    }
}
