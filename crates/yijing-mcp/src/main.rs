mod server;

use std::path::Path;
use std::sync::Arc;

use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use yijing_core::{AiSettings, HexagramTable, LoadPolicy};

use server::YijingServer;

const SERVER_NAME: &str = "yijing";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // Handle `yijing-mcp init` subcommand
    if std::env::args().nth(1).as_deref() == Some("init") {
        return init_project();
    }

    let settings = yijing_core::apply_env(yijing_core::read_settings(), |k| std::env::var(k).ok());
    let table = load_table(&settings)?;
    tracing::info!(
        entries = table.len(),
        ai = yijing_core::ai_configured(&settings),
        "starting yijing MCP server"
    );

    let service = YijingServer::new(Arc::new(table), settings)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}

/// The configured table file if any, otherwise the embedded one. A bad table
/// stops startup rather than serving partial readings.
fn load_table(settings: &AiSettings) -> Result<HexagramTable, yijing_core::TableError> {
    if settings.table_path.is_empty() {
        HexagramTable::embedded()
    } else {
        HexagramTable::load(Path::new(&settings.table_path), LoadPolicy::Strict)
    }
}

/// Write project-scoped MCP config files in the current directory so that
/// Claude Code and/or Codex discover yijing-mcp when working in this project.
/// Only writes config for tools that are actually installed.
fn init_project() -> Result<(), Box<dyn std::error::Error>> {
    let binary_path = std::env::current_exe()?
        .canonicalize()?
        .to_string_lossy()
        .to_string();

    let cwd = std::env::current_dir()?;

    let has_claude = which("claude");
    let has_codex = which("codex");

    if !has_claude && !has_codex {
        eprintln!("Neither `claude` nor `codex` found in PATH.");
        eprintln!("Install Claude Code or OpenAI Codex first, then re-run `yijing-mcp init`.");
        std::process::exit(1);
    }

    if has_claude {
        init_claude_code(&cwd, &binary_path)?;
    }
    if has_codex {
        init_codex(&cwd, &binary_path)?;
    }

    let tools: Vec<&str> = [
        has_claude.then_some("Claude Code"),
        has_codex.then_some("Codex"),
    ]
    .into_iter()
    .flatten()
    .collect();
    eprintln!("\nDone. {} will use {SERVER_NAME} in this project.", tools.join(" and "));
    Ok(())
}

fn which(name: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| {
                dir.join(name).is_file() || dir.join(format!("{name}.exe")).is_file()
            })
        })
        .unwrap_or(false)
}

/// Merge our entry into `.mcp.json`, keeping other servers.
fn merge_mcp_json(existing: Option<&str>, binary_path: &str) -> serde_json::Value {
    let mut root: serde_json::Value = existing
        .and_then(|s| serde_json::from_str(s).ok())
        .filter(|v: &serde_json::Value| v.is_object())
        .unwrap_or_else(|| serde_json::json!({}));

    if !root.get("mcpServers").is_some_and(|v| v.is_object()) {
        root["mcpServers"] = serde_json::json!({});
    }
    root["mcpServers"][SERVER_NAME] = serde_json::json!({
        "type": "stdio",
        "command": binary_path,
        "args": [],
    });
    root
}

/// Merge our entry into a Codex `config.toml`, keeping formatting elsewhere.
fn merge_codex_toml(existing: Option<&str>, binary_path: &str) -> toml_edit::DocumentMut {
    let mut doc: toml_edit::DocumentMut = existing
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();

    if !doc.contains_table("mcp_servers") {
        doc["mcp_servers"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    let mut server = toml_edit::Table::new();
    server.insert("command", toml_edit::value(binary_path));
    server.insert("args", toml_edit::value(toml_edit::Array::new()));
    doc["mcp_servers"][SERVER_NAME] = toml_edit::Item::Table(server);
    doc
}

fn init_claude_code(cwd: &Path, binary_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = cwd.join(".mcp.json");
    let existing = std::fs::read_to_string(&path).ok();
    let root = merge_mcp_json(existing.as_deref(), binary_path);
    std::fs::write(&path, serde_json::to_string_pretty(&root)?)?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn init_codex(cwd: &Path, binary_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let codex_dir = cwd.join(".codex");
    let path = codex_dir.join("config.toml");
    let existing = std::fs::read_to_string(&path).ok();
    let doc = merge_codex_toml(existing.as_deref(), binary_path);
    std::fs::create_dir_all(&codex_dir)?;
    std::fs::write(&path, doc.to_string())?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcp_json_keeps_other_servers() {
        let existing = r#"{"mcpServers":{"other":{"command":"x"}},"keep":1}"#;
        let root = merge_mcp_json(Some(existing), "/bin/yijing-mcp");
        assert_eq!(root["mcpServers"]["other"]["command"], "x");
        assert_eq!(root["mcpServers"]["yijing"]["command"], "/bin/yijing-mcp");
        assert_eq!(root["keep"], 1);
    }

    #[test]
    fn mcp_json_recovers_from_garbage() {
        let root = merge_mcp_json(Some("not json"), "/bin/y");
        assert_eq!(root["mcpServers"]["yijing"]["type"], "stdio");
        let root = merge_mcp_json(Some("[1,2]"), "/bin/y");
        assert!(root.is_object());
    }

    #[test]
    fn codex_toml_adds_server_table() {
        let existing = "model = \"o3\"\n\n[mcp_servers.other]\ncommand = \"x\"\n";
        let doc = merge_codex_toml(Some(existing), "/bin/yijing-mcp");
        let text = doc.to_string();
        assert!(text.contains("model = \"o3\""));
        assert!(text.contains("[mcp_servers.yijing]"));
        assert!(text.contains("command = \"/bin/yijing-mcp\""));
        assert_eq!(doc["mcp_servers"]["other"]["command"].as_str(), Some("x"));
    }

    #[test]
    fn missing_table_path_uses_embedded() {
        let table = load_table(&AiSettings::default()).unwrap();
        assert_eq!(table.len(), 64);
    }

    #[test]
    fn unreadable_table_path_fails_startup() {
        let settings = AiSettings {
            table_path: "/nonexistent/yijing/table.json".into(),
            ..Default::default()
        };
        assert!(matches!(
            load_table(&settings),
            Err(yijing_core::TableError::Io(_))
        ));
    }
}
