//! Integration tests for `bundleconf chunks`.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "bundleconf-cli", "--bin", "bundleconf", "--"]);
    cmd
}

const CONFIG: &str = r#"{
    "build": { "rollupOptions": { "output": { "manualChunks": {
        "material-icons": ["@mdi/font"]
    } } } }
}"#;

const GRAPH: &str = r#"{
    "entry": "src/main.ts",
    "modules": [
        { "path": "src/main.ts", "imports": ["src/App.vue", "node_modules/@mdi/font/css/materialdesignicons.css"], "dynamicImports": ["src/views/About.vue"] },
        { "path": "src/App.vue" },
        { "path": "src/views/About.vue", "imports": ["node_modules/@mdi/font/css/materialdesignicons.css"] },
        { "path": "node_modules/@mdi/font/css/materialdesignicons.css", "imports": ["node_modules/@mdi/font/fonts/icon.woff2"] },
        { "path": "node_modules/@mdi/font/fonts/icon.woff2" }
    ]
}"#;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("package.json"), "{}").unwrap();
    std::fs::write(dir.path().join("bundleconf.config.json"), CONFIG).unwrap();
    std::fs::write(dir.path().join("graph.json"), GRAPH).unwrap();
    dir
}

fn run(cwd: &Path, args: &[&str]) -> std::process::Output {
    cargo_bin()
        .arg("--cwd")
        .arg(cwd)
        .arg("--json")
        .args(args)
        .output()
        .expect("Failed to run bundleconf")
}

#[test]
fn test_chunks_groups_icon_package() {
    let dir = project();
    let output = run(dir.path(), &["chunks", "graph.json", "--out", "dist/manifest.json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["ok"], true);

    let chunks = json["manifest"]["chunks"].as_array().unwrap();
    let icons = chunks
        .iter()
        .find(|c| c["name"] == "material-icons")
        .expect("material-icons chunk");
    assert_eq!(icons["file"], "material-icons.js");
    assert_eq!(icons["isManual"], true);
    assert_eq!(icons["modules"].as_array().unwrap().len(), 2);

    // No @mdi/font module anywhere else
    for chunk in chunks.iter().filter(|c| c["name"] != "material-icons") {
        for module in chunk["modules"].as_array().unwrap() {
            assert!(!module.as_str().unwrap().contains("@mdi/font"));
        }
    }

    let written = std::fs::read_to_string(dir.path().join("dist/manifest.json")).unwrap();
    let written: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(written, json["manifest"]);
}

#[test]
fn test_chunks_unknown_module_is_reported() {
    let dir = project();
    std::fs::write(
        dir.path().join("graph.json"),
        r#"{ "entry": "src/main.ts", "modules": [{ "path": "src/main.ts", "imports": ["src/gone.ts"] }] }"#,
    )
    .unwrap();

    let output = run(dir.path(), &["chunks", "graph.json"]);
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"]["code"], "GRAPH_INVALID");
}
