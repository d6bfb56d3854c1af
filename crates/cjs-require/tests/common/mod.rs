//! Scripted engine for integration tests.
//!
//! A module file's source text names a Rust closure registered with
//! [`TestEngine::define`]; running the module calls that closure with the
//! module scope. `.json` modules are evaluated for real from the wrapper.

#![allow(dead_code)]

use anyhow::{anyhow, bail};
use cjs_require::{
    Engine, MODULE_WRAPPER_HEAD, MODULE_WRAPPER_TAIL, MemoryLoader, ModuleScope, Registry,
    RegistryBuilder, Require,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Engine value
#[derive(Clone, Debug)]
pub enum Value {
    Undefined,
    Bool(bool),
    Number(f64),
    Str(String),
    Json(serde_json::Value),
    Object(Rc<RefCell<BTreeMap<String, Value>>>),
    Function(String),
}

impl Value {
    pub fn object() -> Self {
        Value::Object(Rc::new(RefCell::new(BTreeMap::new())))
    }

    pub fn str(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.borrow().get(key).cloned().unwrap_or(Value::Undefined),
            Value::Json(json) => json
                .get(key)
                .cloned()
                .map(Value::Json)
                .unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        }
    }

    pub fn set(&self, key: &str, value: Value) {
        match self {
            Value::Object(map) => {
                map.borrow_mut().insert(key.to_string(), value);
            }
            other => panic!("cannot set '{key}' on {other:?}"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Reference equality for objects
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

type Body = Rc<dyn Fn(&ModuleScope<Value>) -> anyhow::Result<()>>;

const JSON_PREFIX: &str = "module.exports = JSON.parse(";

/// Engine whose programs are Rust closures
#[derive(Default)]
pub struct TestEngine {
    bodies: RefCell<HashMap<String, Body>>,
    runs: RefCell<Vec<String>>,
    caller: RefCell<Option<String>>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body run for modules whose source is `name`
    pub fn define<F>(&self, name: &str, body: F)
    where
        F: Fn(&ModuleScope<Value>) -> anyhow::Result<()> + 'static,
    {
        self.bodies
            .borrow_mut()
            .insert(name.to_string(), Rc::new(body));
    }

    /// Bodies executed so far, in order
    pub fn runs(&self) -> Vec<String> {
        self.runs.borrow().clone()
    }

    pub fn run_count(&self, name: &str) -> usize {
        self.runs.borrow().iter().filter(|r| *r == name).count()
    }

    /// Pretend host code in `path` is on top of the call stack
    pub fn set_caller(&self, path: Option<&str>) {
        *self.caller.borrow_mut() = path.map(str::to_string);
    }
}

impl Engine for TestEngine {
    type Value = Value;
    type Program = String;

    fn new_object(&self) -> Value {
        Value::object()
    }

    fn compile(&self, name: &str, source: &str) -> anyhow::Result<String> {
        let body = source
            .strip_prefix(MODULE_WRAPPER_HEAD)
            .and_then(|s| s.strip_suffix(MODULE_WRAPPER_TAIL))
            .ok_or_else(|| anyhow!("{name}: source is not a module wrapper"))?
            .trim();
        if body == "syntax error" {
            bail!("SyntaxError: Unexpected token in {name}");
        }
        Ok(body.to_string())
    }

    fn run_program(&self, program: &String) -> anyhow::Result<Value> {
        if program == "not a function" {
            return Ok(Value::Number(1.0));
        }
        Ok(Value::Function(program.clone()))
    }

    fn is_function(&self, value: &Value) -> bool {
        matches!(value, Value::Function(_))
    }

    fn call_module(&self, function: &Value, scope: ModuleScope<Value>) -> anyhow::Result<()> {
        let Value::Function(body) = function else {
            bail!("TypeError: not a function");
        };

        if let Some(literal) = body.strip_prefix(JSON_PREFIX).and_then(|s| s.strip_suffix(')')) {
            let text: String = serde_json::from_str(literal)?;
            let json: serde_json::Value = serde_json::from_str(&text)?;
            scope.module.set_exports(Value::Json(json));
            return Ok(());
        }

        self.runs.borrow_mut().push(body.clone());
        let run = self
            .bodies
            .borrow()
            .get(body)
            .cloned()
            .ok_or_else(|| anyhow!("ReferenceError: {body} is not defined"))?;
        run(&scope)
    }

    fn caller_path(&self) -> Option<String> {
        self.caller.borrow().clone()
    }
}

/// Registry builder for the test engine
pub fn registry() -> RegistryBuilder<TestEngine> {
    Registry::builder()
}

/// Module system over in-memory files
pub fn setup(files: MemoryLoader) -> (Rc<TestEngine>, Require<TestEngine>) {
    setup_with(registry().source_loader(files))
}

/// Module system from a prepared registry builder
pub fn setup_with(builder: RegistryBuilder<TestEngine>) -> (Rc<TestEngine>, Require<TestEngine>) {
    let engine = Rc::new(TestEngine::new());
    let require = Require::new(Rc::new(builder.build()), Rc::clone(&engine));
    (engine, require)
}

/// Body that just records its own name in `exports.name`
pub fn named(name: &'static str) -> impl Fn(&ModuleScope<Value>) -> anyhow::Result<()> {
    move |scope| {
        scope.exports.set("name", Value::str(name));
        Ok(())
    }
}
