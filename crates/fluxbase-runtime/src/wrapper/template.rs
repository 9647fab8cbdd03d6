use fluxbase_core::{ExecutionKind, ExecutionRequest};

use super::imports::hoist_imports;

const RESULT_MARKER: &str = "__RESULT__::";
const PROGRESS_MARKER: &str = "__PROGRESS__::";

/// Generates the self-contained source handed to the external interpreter
/// (spec §4.C). This is a string-templating concern, not an embedded
/// scripting engine (spec §9 "Dynamic runtime bridge") — the output is
/// JavaScript/TypeScript-flavored text that some other process executes.
pub struct CodeWrapper;

impl Default for CodeWrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWrapper {
    pub fn new() -> Self {
        Self
    }

    /// `runtime` names the interpreter flavour the wrapped source targets.
    /// Only `"javascript"` is understood today; any other value returns
    /// `source` unchanged (spec §4.C "If the runtime kind is unknown, the
    /// wrapper returns the user source unchanged").
    pub fn wrap(&self, source: &str, req: &ExecutionRequest, runtime: &str) -> String {
        if runtime != "javascript" {
            return source.to_string();
        }

        let (imports, body) = hoist_imports(source);
        let cancel_var = match req.kind {
            ExecutionKind::Function => "FLUXBASE_FUNCTION_CANCELLED",
            ExecutionKind::Job => "FLUXBASE_JOB_CANCELLED",
        };
        let context_fn = match req.kind {
            ExecutionKind::Function => "getExecutionContext",
            ExecutionKind::Job => "getJobContext",
        };
        let payload_fn = match req.kind {
            ExecutionKind::Function => "getPayload",
            ExecutionKind::Job => "getJobPayload",
        };
        let payload_json = serde_json::to_string(&req.payload).unwrap_or_else(|_| "null".to_string());

        let mut out = String::new();

        for line in &imports {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');

        out.push_str(&format!(
            r#"const userClient = createClient(process.env.FLUXBASE_URL, process.env.FLUXBASE_USER_TOKEN);
const serviceClient = createClient(process.env.FLUXBASE_URL, process.env.FLUXBASE_SERVICE_TOKEN);

const secrets = {{
  getUser(name) {{ return process.env["SECRET_" + String(name).toUpperCase()]; }},
  getSystem(name) {{ return process.env["SECRET_" + String(name).toUpperCase()]; }},
  getRequired(name) {{
    const value = secrets.getUser(name);
    if (value === undefined) {{ throw new Error("missing required secret: " + name); }}
    return value;
  }},
}};

function reportProgress(value) {{
  console.log("{progress}" + JSON.stringify(value));
}}

function isCancelled() {{
  const flag = process.env["{cancel_var}"];
  if (flag && flag.length > 0) {{ return true; }}
  try {{
    return require("fs").existsSync("/tmp/fluxbase-cancel-{execution_id}");
  }} catch (e) {{
    return false;
  }}
}}

function checkCancellation() {{
  if (isCancelled()) {{
    throw new Error("execution cancelled");
  }}
}}

function {context_fn}() {{
  return {{
    id: "{execution_id}",
    name: "{name}",
    namespace: "{namespace}",
    userId: {user_id},
  }};
}}

function {payload_fn}() {{
  return {payload_json};
}}

const ai = {{
  async chat(args) {{ return serviceClient.rpc("ai.chat", args); }},
  async embed(args) {{ return serviceClient.rpc("ai.embed", args); }},
  async listProviders() {{ return serviceClient.rpc("ai.listProviders", {{}}); }},
}};

"#,
            progress = PROGRESS_MARKER,
            cancel_var = cancel_var,
            execution_id = req.id,
            name = escape_js(&req.name),
            namespace = escape_js(&req.namespace),
            user_id = req
                .user_id
                .as_deref()
                .map(|u| format!("\"{}\"", escape_js(u)))
                .unwrap_or_else(|| "null".to_string()),
            payload_json = payload_json,
        ));

        out.push_str(&body);
        out.push('\n');

        out.push_str(&format!(
            r#"
(async () => {{
  const candidates = [typeof handler !== "undefined" ? handler : undefined,
                       typeof default_handler !== "undefined" ? default_handler : undefined,
                       typeof main !== "undefined" ? main : undefined];
  const entry = candidates.find((f) => typeof f === "function");
  try {{
    if (!entry) {{ throw new Error("no handler, default_handler, or main exported"); }}
    const value = await entry({payload_fn}());
    console.log("{result}" + JSON.stringify({{ success: true, value }}));
    process.exit(0);
  }} catch (err) {{
    console.log("{result}" + JSON.stringify({{
      success: false,
      error: {{ message: err && err.message ? err.message : String(err), stack: err && err.stack }},
    }}));
    process.exit(1);
  }}
}})();
"#,
            payload_fn = payload_fn,
            result = RESULT_MARKER,
        ));

        out
    }
}

fn escape_js(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn req() -> ExecutionRequest {
        ExecutionRequest::builder(ExecutionKind::Function, "echo")
            .timeout(Duration::from_secs(5))
            .payload(serde_json::json!({"x": 1}))
            .build()
    }

    #[test]
    fn unknown_runtime_passes_source_through_unchanged() {
        let wrapper = CodeWrapper::new();
        let source = "def handler(req): return req";
        assert_eq!(wrapper.wrap(source, &req(), "python"), source);
    }

    #[test]
    fn javascript_runtime_emits_marker_protocol() {
        let wrapper = CodeWrapper::new();
        let source = "export function handler(req) { return { echoed: req.x }; }";
        let wrapped = wrapper.wrap(source, &req(), "javascript");
        assert!(wrapped.contains("__RESULT__::"));
        assert!(wrapped.contains("__PROGRESS__::"));
        assert!(wrapped.contains("function handler"));
    }

    #[test]
    fn hoisted_imports_land_above_the_client_declarations() {
        let wrapper = CodeWrapper::new();
        let source = "import { z } from \"zod\";\nexport function handler() { return 1; }";
        let wrapped = wrapper.wrap(source, &req(), "javascript");
        let import_pos = wrapped.find("import { z }").unwrap();
        let client_pos = wrapped.find("createClient").unwrap();
        assert!(import_pos < client_pos);
    }
}
