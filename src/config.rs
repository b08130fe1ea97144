#[cfg(test)]
mod tests;

use {
    serde::Deserialize,
    std::{io, path::Path, time::Duration},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {0}")]
    Read(String, #[source] io::Error),
    #[error("Could not parse the configuration")]
    Parse(#[source] toml::de::Error),
    #[error("The screen size {0}x{1} is invalid")]
    ScreenSize(i32, i32),
    #[error("The refresh interval must not be 0")]
    RefreshInterval,
    #[error("The wake batch threshold must not be 0")]
    WakeBatch,
    #[error("The title height {0} is larger than the screen height {1}")]
    TitleHeight(i32, i32),
}

/// Settings handed to the server at initialization.
///
/// Unknown keys are rejected so that typos do not silently fall back to the
/// defaults.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub width: i32,
    pub height: i32,
    pub depth: u8,
    pub dpi: u32,
    /// Make every newly framed window fullscreen.
    pub fullscreen: bool,
    /// Synthesize decorative frames around wrapper windows.
    pub frames: bool,
    pub frame_width: i32,
    pub title_height: i32,
    pub title_color: u32,
    pub title_text_color: u32,
    pub border_color: u32,
    pub root_background: u32,
    pub refresh_interval_ms: u64,
    /// Re-signal a display's wake condition every `wake_batch` events even if
    /// a wake-up is still pending.
    pub wake_batch: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            depth: 32,
            dpi: 96,
            fullscreen: false,
            frames: true,
            frame_width: 4,
            title_height: 17,
            title_color: 0xff3a_5f8f,
            title_text_color: 0xffff_ffff,
            border_color: 0xff2b_2b2b,
            root_background: 0xff00_0000,
            refresh_interval_ms: 16,
            wake_batch: 64,
        }
    }
}

impl ServerConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
        Self::from_toml(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 1 || self.height < 1 {
            return Err(ConfigError::ScreenSize(self.width, self.height));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::RefreshInterval);
        }
        if self.wake_batch == 0 {
            return Err(ConfigError::WakeBatch);
        }
        if self.title_height >= self.height {
            return Err(ConfigError::TitleHeight(self.title_height, self.height));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn frame_width(&self) -> i32 {
        self.frame_width.clamp(0, i16::MAX as i32)
    }

    pub fn title_height(&self) -> i32 {
        self.title_height.clamp(0, i16::MAX as i32)
    }
}
