//! Graph-wide checks which cannot be made while the factory is being built
use super::Factory;
use crate::component::{Component, ComponentKind};
use crate::error::{ModelError, ModelResult};
use crate::graph::{find_undrained_components, find_unsupplied_components};
use crate::units::QuantityType;
use log::warn;

/// Sums of connection weights on each side of a component, split by quantity
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct WeightSums {
    energy_in: f64,
    material_in: f64,
    energy_out: f64,
    material_out: f64,
}

impl Factory {
    /// Check the whole factory for defects which can only be found once it is complete.
    ///
    /// Every component is checked and all defects are reported together. As a side effect, the
    /// base efficiency of each converter is recorded. Calling this again on an unchanged factory
    /// gives the same result.
    pub fn check_validity(&mut self) -> ModelResult<()> {
        let mut defects = Vec::new();
        let mut eta_bases = Vec::new();

        for component in self.components.values() {
            match &component.kind {
                ComponentKind::Converter(_) => {
                    let (eta_base, mut found) = self.check_converter(component);
                    eta_bases.push((component.key.clone(), eta_base));
                    defects.append(&mut found);
                }
                ComponentKind::Deadtime(deadtime) => {
                    if !self.has_regular_input(component) {
                        defects.push(format!("Deadtime {} has no input", component.name));
                    }
                    if !self.has_regular_output(component) {
                        defects.push(format!("Deadtime {} has no output", component.name));
                    }
                    if deadtime.delay > self.max_timesteps {
                        defects.push(format!(
                            "Deadtime {} has a delay ({}) longer than the horizon ({})",
                            component.name, deadtime.delay, self.max_timesteps
                        ));
                    }
                }
                ComponentKind::TriggerDemand(trigger) => {
                    defects.append(&mut self.check_trigger(component));
                    if !trigger.is_configured() {
                        defects.push(format!(
                            "Trigger demand {} has no load profile",
                            component.name
                        ));
                    }
                }
                ComponentKind::ThermalSystem(thermal) if !thermal.is_configured() => {
                    defects.push(format!(
                        "Thermal system {} needs a positive resistance and capacity",
                        component.name
                    ));
                }
                ComponentKind::Schedule(_) => {
                    if !self.has_regular_input(component) {
                        defects.push(format!("Schedule {} has no input", component.name));
                    }
                    if !self.has_regular_output(component) {
                        defects.push(format!("Schedule {} has no output", component.name));
                    }
                }
                _ => {}
            }
        }

        for (key, eta_base) in eta_bases {
            if let ComponentKind::Converter(converter) = &mut self.components[&key].kind {
                converter.eta_base = eta_base;
            }
        }

        self.warn_about_loose_ends();

        if defects.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Validity(defects))
        }
    }

    fn has_regular_input(&self, component: &Component) -> bool {
        self.inputs(component).any(|c| !c.is_slack)
    }

    fn has_regular_output(&self, component: &Component) -> bool {
        self.outputs(component)
            .any(|c| !c.is_slack && !c.to_losses)
    }

    fn weight_sums(&self, component: &Component) -> WeightSums {
        let mut sums = WeightSums::default();
        for connection in self.inputs(component).filter(|c| !c.is_slack) {
            if self.quantity(&connection.flowtype).is_material() {
                sums.material_in += connection.weight_destination;
            } else {
                sums.energy_in += connection.weight_destination;
            }
        }
        for connection in self
            .outputs(component)
            .filter(|c| !c.is_slack && !c.to_losses)
        {
            if self.quantity(&connection.flowtype).is_material() {
                sums.material_out += connection.weight_origin;
            } else {
                sums.energy_out += connection.weight_origin;
            }
        }

        sums
    }

    /// Check that a converter neither creates energy nor material
    fn check_converter(&self, component: &Component) -> (Option<f64>, Vec<String>) {
        let name = &component.name;
        let sums = self.weight_sums(component);
        let mut defects = Vec::new();

        if sums.energy_in + sums.material_in == 0.0 {
            defects.push(format!("Converter {name} has no inputs"));
        }
        for (quantity, input, output) in [
            (QuantityType::Energy, sums.energy_in, sums.energy_out),
            (QuantityType::Material, sums.material_in, sums.material_out),
        ] {
            if output > 0.0 && input == 0.0 {
                defects.push(format!(
                    "Converter {name} has {quantity} outputs but no {quantity} inputs"
                ));
            } else if output > input {
                defects.push(format!(
                    "Converter {name} creates {quantity}: output weights ({output}) exceed input \
                     weights ({input})"
                ));
            }
        }

        let eta_base = (sums.energy_in > 0.0).then(|| sums.energy_out / sums.energy_in);
        (eta_base, defects)
    }

    /// Check that a trigger demand's inputs and outputs pair up by quantity
    fn check_trigger(&self, component: &Component) -> Vec<String> {
        let name = &component.name;
        let mut defects = Vec::new();
        if !self.has_regular_input(component) {
            defects.push(format!("Trigger demand {name} has no inputs"));
        }

        let sums = self.weight_sums(component);
        for (quantity, has_input, has_output) in [
            (
                QuantityType::Energy,
                sums.energy_in > 0.0,
                sums.energy_out > 0.0,
            ),
            (
                QuantityType::Material,
                sums.material_in > 0.0,
                sums.material_out > 0.0,
            ),
        ] {
            if has_input && !has_output {
                defects.push(format!(
                    "Trigger demand {name} has {quantity} input but no {quantity} output"
                ));
            }
            if has_output && !has_input {
                defects.push(format!(
                    "Trigger demand {name} has {quantity} output but no {quantity} input"
                ));
            }
        }

        defects
    }

    fn warn_about_loose_ends(&self) {
        for connection in self.connections.values() {
            if !connection.has_known_flowtype() {
                warn!(
                    "The flowtype of connection {} is still unknown",
                    connection.name
                );
            }
        }

        for component in self.components.values() {
            if !component.is_structural
                && component.inputs.is_empty()
                && component.outputs.is_empty()
            {
                warn!("Component {} is not connected to anything", component.name);
            }
        }

        for key in find_unsupplied_components(self) {
            warn!("Component {key} cannot be reached from any source");
        }
        for key in find_undrained_components(self) {
            warn!("No sink or storage can be reached from component {key}");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::component::{ComponentKind, ComponentType};
    use crate::connection::ConnectionOptions;
    use crate::error::ModelError;
    use crate::factory::Factory;
    use crate::fixture::factory;
    use crate::parameter::ParameterMap;
    use rstest::rstest;

    /// grid (electricity) and mine (ore) feeding a converter
    fn converter(factory: &mut Factory, output_weight: f64, output_flowtype: &str) {
        factory
            .add_component("grid", ComponentType::Source, Some("electricity"))
            .unwrap();
        factory
            .add_component("furnace", ComponentType::Converter, None)
            .unwrap();
        factory
            .add_component("out", ComponentType::Sink, Some(output_flowtype))
            .unwrap();
        factory
            .add_connection("grid", "furnace", &ConnectionOptions::default())
            .unwrap();
        factory
            .add_connection("furnace", "out", &ConnectionOptions::weight(output_weight))
            .unwrap();
    }

    fn eta_base(factory: &Factory) -> Option<f64> {
        let ComponentKind::Converter(converter) = &factory.component("furnace").unwrap().kind
        else {
            panic!("furnace should be a converter");
        };
        converter.eta_base
    }

    #[rstest]
    #[case(0.8, true)]
    #[case(1.0, true)]
    #[case(1.2, false)]
    fn test_converter_conservation(
        mut factory: Factory,
        #[case] output_weight: f64,
        #[case] valid: bool,
    ) {
        converter(&mut factory, output_weight, "electricity");
        assert_eq!(factory.check_validity().is_ok(), valid);
        assert_eq!(eta_base(&factory), Some(output_weight));
    }

    #[rstest]
    fn test_converter_output_without_input(mut factory: Factory) {
        converter(&mut factory, 1.0, "steel");
        let Err(ModelError::Validity(defects)) = factory.check_validity() else {
            panic!("Expected a validity error");
        };
        assert_eq!(
            defects,
            ["Converter furnace has material outputs but no material inputs"]
        );
    }

    #[rstest]
    fn test_all_components_checked(mut factory: Factory) {
        factory
            .add_component("belt1", ComponentType::Deadtime, None)
            .unwrap();
        factory
            .add_component("belt2", ComponentType::Deadtime, None)
            .unwrap();
        let Err(ModelError::Validity(defects)) = factory.check_validity() else {
            panic!("Expected a validity error");
        };
        assert_eq!(defects.len(), 4);
    }

    #[rstest]
    fn test_deadtime_delay_too_long(mut factory: Factory) {
        factory
            .add_component("grid", ComponentType::Source, None)
            .unwrap();
        factory
            .add_component("belt", ComponentType::Deadtime, None)
            .unwrap();
        factory
            .add_component("demand", ComponentType::Sink, None)
            .unwrap();
        factory
            .add_connection("grid", "belt", &ConnectionOptions::default())
            .unwrap();
        factory
            .add_connection("belt", "demand", &ConnectionOptions::default())
            .unwrap();
        assert!(factory.check_validity().is_ok());

        let params: ParameterMap = [("delay".to_string(), 50.0.into())].into_iter().collect();
        factory.set_configuration("belt", &params).unwrap();
        assert!(factory.check_validity().is_err());
    }

    #[rstest]
    fn test_trigger_pairing(mut factory: Factory) {
        factory
            .add_component("grid", ComponentType::Source, Some("electricity"))
            .unwrap();
        factory
            .add_component("press", ComponentType::TriggerDemand, None)
            .unwrap();
        let params: ParameterMap = [("load_profile_energy".to_string(), vec![1.0].into())]
            .into_iter()
            .collect();
        factory.set_configuration("press", &params).unwrap();
        factory
            .add_connection("grid", "press", &ConnectionOptions::default())
            .unwrap();

        let Err(ModelError::Validity(defects)) = factory.check_validity() else {
            panic!("Expected a validity error");
        };
        assert_eq!(
            defects,
            ["Trigger demand press has energy input but no energy output"]
        );
    }

    #[rstest]
    fn test_idempotent(mut factory: Factory) {
        converter(&mut factory, 0.9, "electricity");
        let first = factory.check_validity();
        let snapshot = factory.clone();
        let second = factory.check_validity();
        assert_eq!(first, second);
        assert_eq!(factory, snapshot);
    }
}
