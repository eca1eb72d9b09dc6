//! Master volume with mute/restore
//!
//! The master level scales every track linearly (0.0 to 1.0). Muting drops the
//! level to zero and remembers the previous level so unmute can bring it back.

use crate::types::clamp_volume;

/// Level used when unmuting with nothing (or silence) to restore
pub const DEFAULT_RESTORE_LEVEL: f32 = 1.0;

/// Master volume controller
#[derive(Debug, Clone, PartialEq)]
pub struct MasterVolume {
    /// Current level (0.0 - 1.0)
    level: f32,

    /// Level saved by the last mute
    restore_level: Option<f32>,
}

impl MasterVolume {
    /// Create a master volume at the given level
    pub fn new(level: f32) -> Self {
        Self {
            level: clamp_volume(level),
            restore_level: None,
        }
    }

    /// Attach a previously saved restore level
    #[must_use]
    pub fn with_restore_level(mut self, restore_level: Option<f32>) -> Self {
        self.restore_level = restore_level.map(clamp_volume);
        self
    }

    /// Set the level directly (clamped)
    pub fn set_level(&mut self, level: f32) {
        self.level = clamp_volume(level);
    }

    /// Current level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Level that the next unmute would restore
    pub fn restore_level(&self) -> Option<f32> {
        self.restore_level
    }

    /// Muted means the level is zero, however it got there
    pub fn is_muted(&self) -> bool {
        self.level == 0.0
    }

    /// Save the current level and go silent
    ///
    /// Muting while already silent keeps the saved level.
    pub fn mute(&mut self) {
        if self.level > 0.0 {
            self.restore_level = Some(self.level);
            self.level = 0.0;
        }
    }

    /// Restore the saved level, or full volume if none was saved or it was zero
    pub fn unmute(&mut self) {
        self.level = match self.restore_level {
            Some(level) if level > 0.0 => level,
            _ => DEFAULT_RESTORE_LEVEL,
        };
    }

    /// Mute when audible, unmute when silent
    pub fn toggle_mute(&mut self) {
        if self.is_muted() {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// Scale a track volume by the master level
    pub fn apply(&self, volume: f32) -> f32 {
        clamp_volume(volume) * self.level
    }
}

impl Default for MasterVolume {
    fn default() -> Self {
        Self::new(1.0)
    }
}
