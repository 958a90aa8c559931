//! Runs `interop/identity.test.ts`.
use anyhow::Result;

use crate::assertions::Assertions;
use crate::subject::ModuleInstance;

fn identity(t: &mut Assertions, instance: &mut dyn ModuleInstance) -> Result<()> {
    for x in [0, 42, -1, i32::MIN] {
        let got = t.call_i32(instance, "identity", &[x])?;
        t.equal(got, x, format!("identity({x})"));
    }
    Ok(())
}

register_runner!(identity);
