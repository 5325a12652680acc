//! Fixtures for tests
use crate::component::ComponentType;
use crate::connection::ConnectionOptions;
use crate::factory::{Factory, FactoryOptions};
use crate::parameter::{ParameterMap, ParameterValue};
use crate::scenario::Scenario;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Assert that a model error with the given message occurs
macro_rules! assert_model_error {
    ($result:expr, $msg:expr) => {
        assert_eq!($result.unwrap_err().to_string(), $msg);
    };
}
pub(crate) use assert_model_error;

/// Build a parameter map from name/value pairs
pub fn params<const N: usize>(pairs: [(&str, ParameterValue); N]) -> ParameterMap {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// An empty factory covering five timesteps, with two energy and two material flowtypes
#[fixture]
pub fn factory() -> Factory {
    let mut factory = Factory::new(FactoryOptions {
        name: "test".into(),
        max_timesteps: 5,
        ..FactoryOptions::default()
    });
    for (key, unit) in [
        ("electricity", "energy"),
        ("gas", "energy"),
        ("ore", "material"),
        ("steel", "material"),
    ] {
        factory.add_flowtype(key, unit, None).unwrap();
    }

    factory
}

/// A grid feeding a fixed demand through a pool, over three timesteps
#[fixture]
pub fn grid_factory(mut factory: Factory) -> Factory {
    factory
        .add_component("grid", ComponentType::Source, Some("electricity"))
        .unwrap();
    factory
        .add_component("pool", ComponentType::Pool, None)
        .unwrap();
    factory
        .add_component("demand", ComponentType::Sink, None)
        .unwrap();
    factory
        .add_connection("grid", "pool", &ConnectionOptions::default())
        .unwrap();
    factory
        .add_connection("pool", "demand", &ConnectionOptions::default())
        .unwrap();
    factory
        .set_configuration(
            "grid",
            &params([("cost", 2.0.into()), ("power_max", 10.0.into())]),
        )
        .unwrap();
    factory
        .set_configuration("demand", &params([("demand", 5.0.into())]))
        .unwrap();

    factory
}

/// A scenario of three one-hour timesteps
#[fixture]
pub fn scenario() -> Scenario {
    Scenario::new("test", 3, 1.0).unwrap()
}
