//! Registers the `console` table inside a snippet's script environment and
//! wraps the environment's own `print`.
//!
//! Every call is captured as a [`ConsoleEntry`] and then forwarded to the
//! environment's native `print`, so in-sandbox debugging behaves as usual.

use mlua::{Lua, Result, Value, Variadic};

use crate::console::{ConsoleBridge, Level};

/// Install the console interface on `lua`, feeding `bridge`.
pub fn install(lua: &Lua, bridge: &ConsoleBridge) -> Result<()> {
    let native_print: mlua::Function = lua.globals().get("print")?;

    let console = lua.create_table()?;
    for (name, level) in [
        ("log", Level::Log),
        ("error", Level::Error),
        ("warn", Level::Warn),
        ("info", Level::Info),
    ] {
        let bridge = bridge.clone();
        let forward = native_print.clone();
        console.set(
            name,
            lua.create_function(move |_, args: Variadic<Value>| {
                bridge.push(level, format_args(&args));
                forward.call::<()>(args)
            })?,
        )?;
    }
    lua.globals().set("console", console)?;

    // print(...) keeps its native behavior but is also captured at log level.
    let bridge = bridge.clone();
    let wrapped = lua.create_function(move |_, args: Variadic<Value>| {
        bridge.push(Level::Log, format_args(&args));
        native_print.call::<()>(args)
    })?;
    lua.globals().set("print", wrapped)?;

    Ok(())
}

/// Renders one call's arguments the way the console view shows them: plain
/// text for scalars, indented JSON for structures, space-joined.
pub fn format_args(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(format_value).collect();
    parts.join(" ")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_str().map(|x| x.to_string()).unwrap_or_default(),
        Value::Integer(n) => n.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Nil => "nil".to_string(),
        // Structured values serialize as indented JSON; values that cannot
        // (self-referential tables, functions) fall back to their debug form.
        other => serde_json::to_string_pretty(other)
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}
