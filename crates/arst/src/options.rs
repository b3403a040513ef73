use std::str::FromStr;

use serde::Deserialize;

use crate::ArstError;

/// Net used as reset for registers with a declared initial value.
///
/// Written as `<netname>` for an active-high reset or `!<netname>` for an
/// active-low one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct GlobalReset {
    pub net: String,
    pub active_low: bool,
}

impl FromStr for GlobalReset {
    type Err = ArstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (net, active_low) = match trimmed.strip_prefix('!') {
            Some(net) => (net.trim_start(), true),
            None => (trimmed, false),
        };
        if net.is_empty() || net.contains(char::is_whitespace) {
            return Err(ArstError::InvalidGlobalReset(s.to_string()));
        }
        Ok(Self {
            net: net.to_string(),
            active_low,
        })
    }
}

impl TryFrom<String> for GlobalReset {
    type Error = ArstError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArstOptions {
    pub global_reset: Option<GlobalReset>,
}

impl ArstOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, ArstError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_global_reset(mut self, global_reset: GlobalReset) -> Self {
        self.global_reset = Some(global_reset);
        self
    }
}
