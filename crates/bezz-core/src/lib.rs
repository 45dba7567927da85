pub mod app_config;
pub mod brief;
pub mod config;
pub mod photo_styles;
pub mod status;

pub use app_config::{AppConfig, DbConfig, Environment};
pub use brief::{
    BrandIdentity, BrandStrategy, Brief, BriefInput, BriefResults, CampaignAngle, ColorSwatch,
    CreativeSpec, MessagingFramework, NameSuggestion, RenderedCreative, TargetSegment,
};
pub use config::{load_app_config, load_app_config_from_env, load_db_config};
pub use photo_styles::PhotoStyles;
pub use status::BriefStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read photo styles file {path}: {source}")]
    StylesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse photo styles file: {0}")]
    StylesFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition { from: BriefStatus, to: BriefStatus },

    #[error("unknown brief status: {0}")]
    UnknownStatus(String),

    #[error("invalid brief: {0}")]
    Validation(String),
}
