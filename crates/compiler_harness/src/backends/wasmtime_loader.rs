//! Loads binaries into wasmtime.
//!
//! Compilation and instantiation happen on tokio's blocking pool, so the interop suite can have several loads in
//! flight.  Imports the harness knows nothing about are defined as traps, so modules that import them still load and
//! only fail if the import is actually called.  `env.abort` fails the call that reached it.
use anyhow::{anyhow, bail, Context, Result};
use wasmtime::{Config, Engine, ExternType, Instance, Linker, Module, Store, Val, ValType};

use crate::subject::{Capability, Loader, ModuleInstance, Value};

#[derive(Clone)]
pub struct WasmtimeLoader {
    engine: Engine,
}

impl WasmtimeLoader {
    pub fn new() -> Result<Self> {
        let engine = Engine::new(&Config::new()).context("Failed to create the wasmtime engine")?;
        Ok(Self { engine })
    }
}

fn create_linker(engine: &Engine, module: &Module) -> Result<Linker<()>> {
    let mut linker = Linker::new(engine);
    linker.func_wrap(
        "env",
        "abort",
        |msg: i32, file: i32, line: i32, column: i32| -> Result<()> {
            bail!("abort called (message at {msg}, file at {file}, line {line}, column {column})")
        },
    )?;
    linker.define_unknown_imports_as_traps(module)?;
    Ok(linker)
}

fn instantiate_blocking(engine: &Engine, binary: &[u8]) -> Result<WasmtimeInstance> {
    let module = Module::new(engine, binary).context("Failed to compile module")?;
    let linker = create_linker(engine, &module)?;

    let mut store = Store::new(engine, ());
    let instance = linker
        .instantiate(&mut store, &module)
        .context("Failed to instantiate module")?;

    let exports = module
        .exports()
        .filter(|e| matches!(e.ty(), ExternType::Func(_)))
        .map(|e| e.name().to_string())
        .collect();

    Ok(WasmtimeInstance {
        store,
        instance,
        exports,
    })
}

#[async_trait::async_trait]
impl Loader for WasmtimeLoader {
    fn capability(&self) -> Capability {
        Capability::Supported
    }

    async fn instantiate(&self, binary: Vec<u8>) -> Result<Box<dyn ModuleInstance>> {
        let engine = self.engine.clone();
        let instance =
            tokio::task::spawn_blocking(move || instantiate_blocking(&engine, &binary)).await??;
        Ok(Box::new(instance))
    }
}

struct WasmtimeInstance {
    store: Store<()>,
    instance: Instance,
    exports: Vec<String>,
}

fn to_val(v: &Value) -> Val {
    match *v {
        Value::I32(x) => Val::I32(x),
        Value::I64(x) => Val::I64(x),
        Value::F32(x) => Val::F32(x.to_bits()),
        Value::F64(x) => Val::F64(x.to_bits()),
    }
}

fn from_val(v: &Val) -> Result<Value> {
    Ok(match v {
        Val::I32(x) => Value::I32(*x),
        Val::I64(x) => Value::I64(*x),
        Val::F32(x) => Value::F32(f32::from_bits(*x)),
        Val::F64(x) => Value::F64(f64::from_bits(*x)),
        other => bail!("unsupported result {other:?}"),
    })
}

impl ModuleInstance for WasmtimeInstance {
    fn exports(&self) -> Vec<String> {
        self.exports.clone()
    }

    fn call(&mut self, export: &str, args: &[Value]) -> Result<Vec<Value>> {
        let func = self
            .instance
            .get_func(&mut self.store, export)
            .ok_or_else(|| anyhow!("no exported function named {export}"))?;

        let ty = func.ty(&self.store);
        let mut results = ty
            .results()
            .map(|t| match t {
                ValType::I64 => Val::I64(0),
                ValType::F32 => Val::F32(0),
                ValType::F64 => Val::F64(0),
                _ => Val::I32(0),
            })
            .collect::<Vec<_>>();
        let params = args.iter().map(to_val).collect::<Vec<_>>();

        func.call(&mut self.store, &params, &mut results)
            .with_context(|| format!("calling {export}"))?;
        results.iter().map(from_val).collect()
    }
}
