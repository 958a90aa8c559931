//! Runs `interop/add.test.ts`.
use anyhow::Result;

use crate::assertions::Assertions;
use crate::subject::ModuleInstance;

fn add(t: &mut Assertions, instance: &mut dyn ModuleInstance) -> Result<()> {
    t.ok(
        instance.exports().iter().any(|e| e == "add"),
        "an export named add",
    );

    for (a, b) in [(1, 2), (-5, 5), (i32::MAX, 1)] {
        let got = t.call_i32(instance, "add", &[a, b])?;
        t.equal(got, a.wrapping_add(b), format!("add({a}, {b})"));
    }

    Ok(())
}

register_runner!(add);
