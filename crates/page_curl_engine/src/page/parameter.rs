//! Page material parameters

use std::fmt;

use crate::render::ParameterType;

/// Per-page parameters exposed by the page material
///
/// The names returned by [`Parameter::name`] must match the names compiled
/// into the material package exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Image drawn on the page
    ImageTexture,
    /// Apex of the curl cone
    ApexFloat,
    /// Curl angle
    ThetaFloat,
}

impl Parameter {
    /// Every page parameter
    pub const ALL: [Self; 3] = [Self::ImageTexture, Self::ApexFloat, Self::ThetaFloat];

    /// Shader-side name of the parameter
    pub const fn name(self) -> &'static str {
        match self {
            Self::ImageTexture => "imageTexture",
            Self::ApexFloat => "apexFloat",
            Self::ThetaFloat => "thetaFloat",
        }
    }

    /// Declared type of the parameter
    pub const fn ty(self) -> ParameterType {
        match self {
            Self::ImageTexture => ParameterType::Sampler2d,
            Self::ApexFloat | Self::ThetaFloat => ParameterType::Float,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
