/// Registers an interop runner.
///
/// Takes the name of a function in the invoking module with the signature `fn x(&mut Assertions, &mut dyn
/// ModuleInstance) -> anyhow::Result<()>`.  The function name is the fixture id it runs for: `add` runs against
/// `interop/add.test.ts`.  Dashes in fixture file names map to underscores.
macro_rules! register_runner {
    ($runner_fn:ident) => {
        inventory::submit! {
            crate::registry::RunnerRegistryEntry {
                name: stringify!($runner_fn),
                run_fn: $runner_fn,
                file: file!(),
                line: line!(),
                column: column!(),
            }
        }
    };
}
