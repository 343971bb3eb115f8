//! Node-API bridge. The replacer and runtime hooks are JS callbacks invoked
//! synchronously on the calling thread.

use napi::{Env, JsFunction};
use napi_derive::napi;
use serde::Serialize;
use std::cell::RefCell;

use crate::compile::compile_directives;
use crate::options::CompileDirectivesOptions;
use crate::registry::DirectiveRegistry;
use crate::rewrite::{Replacer, ReplacerArgs, RuntimeCodeGenerator};

struct JsCallback<'e> {
    env: &'e Env,
    func: &'e JsFunction,
    /// First JS-side failure; reported once the compile returns.
    failure: RefCell<Option<napi::Error>>,
}

impl<'e> JsCallback<'e> {
    fn new(env: &'e Env, func: &'e JsFunction) -> Self {
        Self {
            env,
            func,
            failure: RefCell::new(None),
        }
    }

    fn call<T: Serialize>(&self, arg: &T) -> String {
        match self.try_call(arg) {
            Ok(text) => text,
            Err(error) => {
                self.failure.borrow_mut().get_or_insert(error);
                // Parses as an expression and as a statement list.
                String::from("undefined")
            }
        }
    }

    fn try_call<T: Serialize>(&self, arg: &T) -> napi::Result<String> {
        let value = self.env.to_js_value(arg)?;
        let result = self.func.call(None, &[value])?;
        result.coerce_to_string()?.into_utf8()?.into_owned()
    }

    fn take_failure(&self) -> Option<napi::Error> {
        self.failure.borrow_mut().take()
    }
}

impl Replacer for JsCallback<'_> {
    fn replace(&self, args: &ReplacerArgs) -> String {
        self.call(args)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeCodeArgs<'r> {
    directive_fns_by_id: &'r DirectiveRegistry,
}

impl RuntimeCodeGenerator for JsCallback<'_> {
    fn runtime_code(&self, registry: &DirectiveRegistry) -> String {
        self.call(&RuntimeCodeArgs {
            directive_fns_by_id: registry,
        })
    }
}

#[napi]
pub fn compile_directives_native(
    env: Env,
    options: serde_json::Value,
    replacer: JsFunction,
    get_runtime_code: Option<JsFunction>,
) -> napi::Result<serde_json::Value> {
    let opts: CompileDirectivesOptions = serde_json::from_value(options)
        .map_err(|e| napi::Error::from_reason(format!("Invalid options: {}", e)))?;

    let replacer = JsCallback::new(&env, &replacer);
    let runtime = get_runtime_code.as_ref().map(|f| JsCallback::new(&env, f));

    let result = compile_directives(
        &opts,
        &replacer,
        runtime.as_ref().map(|r| r as &dyn RuntimeCodeGenerator),
    );

    if let Some(error) = replacer.take_failure() {
        return Err(error);
    }
    if let Some(error) = runtime.as_ref().and_then(JsCallback::take_failure) {
        return Err(error);
    }

    let result = result.map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(&result)
        .map_err(|e| napi::Error::from_reason(format!("Failed to serialize result: {}", e)))
}
