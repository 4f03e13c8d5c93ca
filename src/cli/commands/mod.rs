use clap::Subcommand;
use std::path::PathBuf;
use std::str::FromStr;

use crate::model::TextureFormat;

pub mod convert;
pub mod texture;

/// Compression format argument for texture operations
#[derive(Debug, Clone, Copy)]
pub struct FormatArg(pub TextureFormat);

impl FromStr for FormatArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dxt1" | "bc1" => Ok(FormatArg(TextureFormat::Dxt1)),
            "dxt5" | "bc3" => Ok(FormatArg(TextureFormat::Dxt5)),
            _ => Err(format!(
                "Invalid format '{s}'. Valid values: dxt1/bc1, dxt5/bc3"
            )),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a model file into an asset bundle
    Convert {
        /// Source model file (glTF or GLB)
        source: PathBuf,

        /// Output directory for the bundle
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Assign this catalog shader to every material
        #[arg(long)]
        shader: Option<String>,

        /// Force a texture compression format instead of auto-selecting
        #[arg(short, long)]
        format: Option<FormatArg>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Compress a single image into a DDS texture container
    Texture {
        /// Source image file
        source: PathBuf,

        /// Output file (defaults to the source stem with .dds)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force a compression format instead of auto-selecting
        #[arg(short, long)]
        format: Option<FormatArg>,
    },
}

impl Commands {
    /// Execute the selected command
    pub fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Convert {
                source,
                output,
                shader,
                format,
                quiet,
            } => convert::execute(
                &source,
                &output,
                shader.as_deref(),
                format.map(|f| f.0),
                quiet,
            ),
            Self::Texture {
                source,
                output,
                format,
            } => texture::execute(&source, output.as_deref(), format.map(|f| f.0)),
        }
    }
}
