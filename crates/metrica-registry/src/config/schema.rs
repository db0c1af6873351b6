use serde::Deserialize;

use metrica_core::error::{MetricaError, Result};
use metrica_core::time::{parse_duration_ms, Granularity};

use crate::series::{WindowOverrides, WindowTable};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    pub version: u32,

    #[serde(default)]
    pub windows: WindowsSection,

    #[serde(default)]
    pub refresh: RefreshSection,
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricaError::UnsupportedVersion);
        }

        self.windows.overrides()?;
        self.refresh.interval_ms()?;

        Ok(())
    }

    /// Default window table with this config's overrides applied.
    pub fn window_table(&self) -> Result<WindowTable> {
        Ok(WindowTable::default().with_overrides(self.windows.overrides()?))
    }
}

/// Integer milliseconds or a duration expression (`"5 hours"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationSpec {
    Millis(u64),
    Expr(String),
}

impl DurationSpec {
    pub fn to_ms(&self) -> Result<u64> {
        match self {
            DurationSpec::Millis(ms) => Ok(*ms),
            DurationSpec::Expr(s) => parse_duration_ms(s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowsSection {
    #[serde(default)]
    pub daily: Option<DurationSpec>,
    #[serde(default)]
    pub weekly: Option<DurationSpec>,
    #[serde(default)]
    pub monthly: Option<DurationSpec>,
    #[serde(default)]
    pub yearly: Option<DurationSpec>,
}

impl WindowsSection {
    pub fn overrides(&self) -> Result<WindowOverrides> {
        Ok(WindowOverrides {
            daily: window_ms(Granularity::Day, self.daily.as_ref())?,
            weekly: window_ms(Granularity::Week, self.weekly.as_ref())?,
            monthly: window_ms(Granularity::Month, self.monthly.as_ref())?,
            yearly: window_ms(Granularity::Year, self.yearly.as_ref())?,
        })
    }
}

fn window_ms(slot: Granularity, spec: Option<&DurationSpec>) -> Result<Option<u64>> {
    let Some(spec) = spec else { return Ok(None); };
    let field = format!("windows.{}", slot.window_label());
    let ms = spec
        .to_ms()
        .map_err(|e| MetricaError::InvalidArgument(format!("{field}: {e}")))?;
    if ms == 0 {
        return Err(MetricaError::InvalidArgument(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(Some(ms))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshSection {
    #[serde(default = "default_refresh_interval")]
    pub interval: DurationSpec,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            interval: default_refresh_interval(),
        }
    }
}

impl RefreshSection {
    pub fn interval_ms(&self) -> Result<u64> {
        let ms = self
            .interval
            .to_ms()
            .map_err(|e| MetricaError::InvalidArgument(format!("refresh.interval: {e}")))?;
        if ms < MIN_REFRESH_MS {
            return Err(MetricaError::InvalidArgument(format!(
                "refresh.interval must be at least {MIN_REFRESH_MS}ms"
            )));
        }
        Ok(ms)
    }
}

const MIN_REFRESH_MS: u64 = 10;

fn default_refresh_interval() -> DurationSpec {
    DurationSpec::Millis(10_000)
}
