use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clef_core::gallery::ArtifactKind;

#[derive(Parser)]
#[command(name = "clef")]
#[command(about = "Capture audio or sheet music and convert it to notation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// CLI profile holding the server configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the token in the system keychain
    Login {
        /// Account email (prompted when omitted)
        #[arg(long, value_name = "EMAIL")]
        email: Option<String>,
        /// Account password (prompted when omitted)
        #[arg(long, value_name = "PASSWORD")]
        password: Option<String>,
    },
    /// Create an account on the conversion server
    Register {
        /// Account email (prompted when omitted)
        #[arg(long, value_name = "EMAIL")]
        email: Option<String>,
        /// Account password (prompted when omitted)
        #[arg(long, value_name = "PASSWORD")]
        password: Option<String>,
    },
    /// Sign out and clear the stored token
    Logout,
    /// Show who the stored token belongs to
    Whoami,
    /// Record from the microphone until Enter, then finalize a WAV
    Record {
        /// Write the WAV here instead of the generated name
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Submit the recording for conversion right away
        #[arg(long)]
        submit: bool,
        /// Input device name (default input device when omitted)
        #[arg(long, value_name = "NAME")]
        device: Option<String>,
    },
    /// Submit an audio file for conversion
    Upload {
        /// Audio file to submit (prompted when omitted)
        path: Option<PathBuf>,
        /// Route the submission through the single legacy /upload endpoint
        #[arg(long)]
        legacy: bool,
    },
    /// Submit a sheet-music photo for conversion
    Scan {
        /// Image file to submit (prompted when omitted)
        path: Option<PathBuf>,
        /// Capture from the camera instead of picking a file
        #[arg(long)]
        camera: bool,
    },
    /// Browse converted sheets
    Sheets {
        #[command(subcommand)]
        command: Option<SheetsCommands>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive screen-by-screen session
    Shell,
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SheetsCommands {
    /// Download the photographed sheet image
    Show {
        /// Sheet file name as listed
        name: String,
        /// Optional output path (the sheet's own name when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Download a derived conversion artifact
    Fetch {
        /// Sheet file name as listed
        name: String,
        /// Artifact flavor
        #[arg(long, value_enum, default_value_t = ArtifactFlavor::Mxl)]
        kind: ArtifactFlavor,
        /// Optional output path (the derived name when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved profile configuration
    Show,
    /// Set the conversion server URL for a profile
    SetUrl {
        /// Server base URL, e.g. https://convert.example.com
        url: String,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Route submissions through the legacy /upload endpoint
        #[arg(long, value_name = "BOOL")]
        legacy_upload: Option<bool>,
        /// Keep the current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Make a profile the default for later commands
    UseProfile {
        /// Profile name
        name: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ArtifactFlavor {
    Omr,
    Mxl,
}

impl ArtifactFlavor {
    pub const fn kind(self) -> ArtifactKind {
        match self {
            Self::Omr => ArtifactKind::Omr,
            Self::Mxl => ArtifactKind::Mxl,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
