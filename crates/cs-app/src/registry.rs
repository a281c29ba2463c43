//! Model registry: configuration model types to simulation entities.

use cs_models::{Constant, DiscretePid, Gain, LagModel, SampledPid, Step};
use cs_project::ModelDef;
use cs_sim::{CustomEntity, CustomModel, EntityResult, SimulationEntity};

use crate::error::{AppError, AppResult};

/// Every model type a configuration may name.
pub const MODEL_TYPES: [ModelDef; 6] = [
    ModelDef::Constant,
    ModelDef::Step,
    ModelDef::Gain,
    ModelDef::FirstOrderLag,
    ModelDef::SampledPid,
    ModelDef::DiscretePid,
];

fn boxed<M: CustomModel + 'static>(model: M) -> EntityResult<Box<dyn SimulationEntity>> {
    Ok(Box::new(CustomEntity::new(model)?))
}

/// Instantiate a fresh entity for `system`.
pub fn instantiate(system: &str, model: ModelDef) -> AppResult<Box<dyn SimulationEntity>> {
    let entity = match model {
        ModelDef::Constant => boxed(Constant),
        ModelDef::Step => boxed(Step),
        ModelDef::Gain => boxed(Gain),
        ModelDef::FirstOrderLag => boxed(LagModel::new()),
        ModelDef::SampledPid => boxed(SampledPid::new()),
        ModelDef::DiscretePid => boxed(DiscretePid::new()),
    };
    entity.map_err(|e| AppError::Build {
        system: system.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_type_instantiates() {
        for model in MODEL_TYPES {
            let entity = instantiate("s", model).unwrap();
            // All shipped models expose at least one readable output
            let readable = ["y", "u", "output"]
                .iter()
                .any(|name| entity.is_readable(name));
            assert!(readable, "{}", model.name());
        }
    }
}
