use crate::Result;
use crate::Transform;
use graft_core::MethodBody;
use tracing::info;

/// Trait for running a sequence of transforms on one method body.
pub trait Pass {
    fn run(&self, method: &mut MethodBody, passes: &[Box<dyn Transform>]) -> Result<bool>;
}

/// Default implementation of the Pass trait.
///
/// Each transform works on a copy of the body, which replaces the original only if the
/// transform reports a change.
pub struct DefaultPass;

impl Pass for DefaultPass {
    fn run(&self, method: &mut MethodBody, passes: &[Box<dyn Transform>]) -> Result<bool> {
        let mut changed = false;

        for pass in passes {
            let before = method.instructions.len();
            let mut snapshot = method.clone();

            let mutated = pass.apply(&mut snapshot)?;
            if !mutated {
                continue;
            }

            let delta = snapshot.instructions.len().saturating_sub(before);
            info!("{:>14} +{}", pass.name(), delta);
            *method = snapshot;
            changed = true;
        }
        Ok(changed)
    }
}
