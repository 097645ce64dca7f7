//! Ambient weather for the configured coordinate
//!
//! The only provider is Open-Meteo's forecast endpoint. Callers go through
//! [`thermex_core::WeatherSource`], which never fails; the fallible call is
//! [`OpenMeteoSource::try_fetch`].

pub mod open_meteo;

pub use open_meteo::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Missing field in provider response: {0}")]
    MissingField(&'static str),
}

pub type WeatherResult<T> = Result<T, WeatherError>;
