use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// Noise reduction applied in native signal scale before normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum NoiseReduction {
    #[default]
    None,
    Gaussian,
    Median,
    Bilateral,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Dicom,
    Png,
    Jpeg,
    Tiff,
    Gif,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Dicom => "dcm",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Tiff => "tiff",
            ExportFormat::Gif => "gif",
        }
    }
}

/// The four derived views produced per scan index, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    InPhase,
    OutPhase,
    Water,
    Fat,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::InPhase,
        Channel::OutPhase,
        Channel::Water,
        Channel::Fat,
    ];

    /// Stable label used in export file names.
    pub fn label(self) -> &'static str {
        match self {
            Channel::InPhase => "in_phase",
            Channel::OutPhase => "out_phase",
            Channel::Water => "water",
            Channel::Fat => "fat",
        }
    }
}

/// Playback speed multiplier applied to the base tick interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaySpeed {
    X0_25,
    X0_5,
    #[default]
    X1,
    X1_5,
    X2,
    X4,
}

impl PlaySpeed {
    pub fn multiplier(self) -> f32 {
        match self {
            PlaySpeed::X0_25 => 0.25,
            PlaySpeed::X0_5 => 0.5,
            PlaySpeed::X1 => 1.0,
            PlaySpeed::X1_5 => 1.5,
            PlaySpeed::X2 => 2.0,
            PlaySpeed::X4 => 4.0,
        }
    }
}

impl fmt::Display for PlaySpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaySpeed::X0_25 => "0.25x",
            PlaySpeed::X0_5 => "0.5x",
            PlaySpeed::X1 => "1x",
            PlaySpeed::X1_5 => "1.5x",
            PlaySpeed::X2 => "2x",
            PlaySpeed::X4 => "4x",
        };
        f.write_str(label)
    }
}

impl FromStr for PlaySpeed {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "0.25x" => Ok(PlaySpeed::X0_25),
            "0.5x" => Ok(PlaySpeed::X0_5),
            "1x" => Ok(PlaySpeed::X1),
            "1.5x" => Ok(PlaySpeed::X1_5),
            "2x" => Ok(PlaySpeed::X2),
            "4x" => Ok(PlaySpeed::X4),
            other => Err(format!(
                "unknown play speed `{other}` (expected 0.25x, 0.5x, 1x, 1.5x, 2x or 4x)"
            )),
        }
    }
}

/// Render window size. Display-only; never affects the numeric pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowSize {
    #[default]
    S400,
    S512,
    S600,
    S800,
}

impl WindowSize {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            WindowSize::S400 => (400, 400),
            WindowSize::S512 => (512, 512),
            WindowSize::S600 => (600, 600),
            WindowSize::S800 => (800, 800),
        }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{w}x{h}")
    }
}

impl FromStr for WindowSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "400x400" => Ok(WindowSize::S400),
            "512x512" => Ok(WindowSize::S512),
            "600x600" => Ok(WindowSize::S600),
            "800x800" => Ok(WindowSize::S800),
            other => Err(format!(
                "unknown window size `{other}` (expected 400x400, 512x512, 600x600 or 800x800)"
            )),
        }
    }
}
