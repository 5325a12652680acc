//! Code for reading a factory from `factory.toml`.
use super::{FACTORY_FILE_NAME, read_toml};
use crate::component::ComponentType;
use crate::connection::ConnectionOptions;
use crate::factory::{Factory, FactoryOptions};
use crate::parameter::{ParameterMap, ParameterValue};
use crate::units::{QuantityType, Unit};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// The contents of `factory.toml`
#[derive(Debug, Deserialize, PartialEq)]
struct FactoryFile {
    #[serde(default)]
    factory: FactoryOptions,
    #[serde(default)]
    units: Vec<UnitRaw>,
    #[serde(default)]
    flowtypes: Vec<FlowTypeRaw>,
    #[serde(default)]
    components: Vec<ComponentRaw>,
    #[serde(default)]
    connections: Vec<ConnectionRaw>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct UnitRaw {
    key: String,
    name: Option<String>,
    quantity_type: QuantityType,
    #[serde(default)]
    magnitudes: Vec<(f64, String)>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct FlowTypeRaw {
    key: String,
    unit: String,
    color: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ComponentRaw {
    key: String,
    #[serde(rename = "type")]
    component_type: ComponentType,
    flowtype: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    parameters: ParameterMap,
    /// Maps parameter names to scenario time series or scalars
    #[serde(default)]
    scenario_data: IndexMap<String, String>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ConnectionRaw {
    origin: String,
    destination: String,
    flowtype: Option<String>,
    /// Shorthand for setting both weights
    weight: Option<f64>,
    weight_origin: Option<f64>,
    weight_destination: Option<f64>,
}

impl ConnectionRaw {
    fn options(&self) -> ConnectionOptions {
        let default = self
            .weight
            .map_or_else(ConnectionOptions::default, ConnectionOptions::weight);
        ConnectionOptions {
            flowtype: self.flowtype.as_deref().map(Into::into),
            weight_origin: self.weight_origin.unwrap_or(default.weight_origin),
            weight_destination: self.weight_destination.unwrap_or(default.weight_destination),
        }
    }
}

/// Read a factory from the specified model directory.
///
/// Units and flowtypes are added first, then the components with their parameters and finally
/// the connections, so that flowtypes can be propagated through the complete graph.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_factory(model_dir: &Path) -> Result<Factory> {
    let file_path = model_dir.join(FACTORY_FILE_NAME);
    let raw: FactoryFile = read_toml(&file_path)?;
    build_factory(raw).with_context(|| format!("Invalid factory in {}", file_path.display()))
}

fn build_factory(raw: FactoryFile) -> Result<Factory> {
    let mut factory = Factory::new(raw.factory);

    for unit in raw.units {
        let magnitudes: Vec<_> = unit
            .magnitudes
            .iter()
            .map(|(scale, label)| (*scale, label.as_str()))
            .collect();
        let name = unit.name.as_deref().unwrap_or(&unit.key);
        factory.add_unit(Unit::new(&unit.key, name, unit.quantity_type, &magnitudes))?;
    }

    for flowtype in raw.flowtypes {
        factory
            .add_flowtype(&flowtype.key, &flowtype.unit, flowtype.color.as_deref())
            .with_context(|| format!("Could not add flowtype {}", flowtype.key))?;
    }

    for component in &raw.components {
        let key = component.key.as_str();
        factory
            .add_component(key, component.component_type, component.flowtype.as_deref())
            .with_context(|| format!("Could not add component {key}"))?;

        // The name and description are configured along with the other parameters
        let mut parameters = component.parameters.clone();
        for (name, value) in [("name", &component.name), ("description", &component.description)] {
            if let Some(value) = value {
                parameters.insert(name.to_string(), ParameterValue::Text(value.clone()));
            }
        }
        if !parameters.is_empty() {
            factory.set_configuration(key, &parameters)?;
        }
    }

    for connection in &raw.connections {
        factory
            .add_connection(
                &connection.origin,
                &connection.destination,
                &connection.options(),
            )
            .with_context(|| {
                format!(
                    "Could not connect {} to {}",
                    connection.origin, connection.destination
                )
            })?;
    }

    for component in raw.components {
        if !component.scenario_data.is_empty() {
            factory.set_scenario_data(&component.key, component.scenario_data)?;
        }
    }

    Ok(factory)
}
