//! Scripted drives for the simulated board

use acc_core::error::{AccError, AccResult};
use acc_library::hardware::sim::SimFrame;
use acc_library::ControlInputs;
use serde::Deserialize;
use std::path::Path;

const DEMO: &str = include_str!("../scenarios/demo.toml");

/// Voltage used for a held button unless the step says otherwise
pub const PRESSED_VOLTS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "step", default)]
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioStep {
    /// Held buttons by name
    #[serde(default)]
    pub buttons: Vec<String>,
    #[serde(default = "default_volts")]
    pub volts: f64,
    pub distance: f64,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_volts() -> f64 {
    PRESSED_VOLTS
}

fn default_repeat() -> u32 {
    1
}

impl Scenario {
    /// The drive bundled with the binary
    pub fn demo() -> AccResult<Self> {
        Self::from_toml(DEMO)
    }

    pub fn load(path: &Path) -> AccResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AccError::config(format!("cannot read scenario {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> AccResult<Self> {
        let scenario: Scenario = toml::from_str(text)
            .map_err(|e| AccError::config(format!("invalid scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> AccResult<()> {
        if self.steps.is_empty() {
            return Err(AccError::config(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        for (i, step) in self.steps.iter().enumerate() {
            step.inputs()
                .map_err(|e| AccError::config(format!("step {}: {}", i + 1, e)))?;
            if !(0.0..=5.0).contains(&step.volts) {
                return Err(AccError::config(format!(
                    "step {}: volts must be within 0..=5, got {}",
                    i + 1,
                    step.volts
                )));
            }
        }
        Ok(())
    }

    /// Total iterations the scenario drives
    pub fn iterations(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.repeat)).sum()
    }

    pub fn frames(&self) -> AccResult<Vec<SimFrame>> {
        self.steps
            .iter()
            .map(|step| Ok(SimFrame::new(step.inputs()?, step.repeat)))
            .collect()
    }
}

impl ScenarioStep {
    pub fn inputs(&self) -> AccResult<ControlInputs> {
        let mut inputs = ControlInputs::idle(self.distance);
        for button in &self.buttons {
            let slot = match button.to_ascii_lowercase().as_str() {
                "increase" => &mut inputs.increase,
                "decrease" => &mut inputs.decrease,
                "cancel" => &mut inputs.cancel,
                "set" => &mut inputs.set,
                "acc" => &mut inputs.acc,
                other => {
                    return Err(AccError::InvalidInput(format!(
                        "unknown button '{}'",
                        other
                    )))
                }
            };
            *slot = self.volts;
        }
        Ok(inputs)
    }
}
