//! End-to-end: a Vue project's config drives resolution, serving, and chunking.

use bundleconf_core::build::{BuildPlan, GraphDescription, ModuleDescription};
use bundleconf_core::config::{load_config, Command, ConfigEnv};
use bundleconf_core::{FsGuard, PathResolver, Resolution};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VITE_CONFIG: &str = r"
import { fileURLToPath, URL } from 'node:url'

import { defineConfig } from 'vite'
import vue from '@vitejs/plugin-vue'
import vueDevTools from 'vite-plugin-vue-devtools'

export default defineConfig({
  plugins: [
    vue(),
    vueDevTools(),
  ],
  resolve: {
    alias: {
      '@': fileURLToPath(new URL('./src', import.meta.url))
    },
  },
  server: {
    fs: {
      allow: ['..', 'node_modules']
    }
  },
  build: {
    rollupOptions: {
      output: {
        manualChunks: {
          'material-icons': ['@mdi/font']
        }
      }
    }
  }
})
";

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// `<tmp>/workspace/app` with sources and an installed `@mdi/font`.
fn vue_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap().join("workspace/app");

    write(&root.join("package.json"), r#"{ "name": "app", "type": "module" }"#);
    write(&root.join("vite.config.js"), VITE_CONFIG);
    write(&root.join("src/main.ts"), "import App from './App.vue'");
    write(&root.join("src/App.vue"), "<template><Foo/></template>");
    write(&root.join("src/components/Foo.vue"), "<template/>");
    write(&root.join("src/views/AboutView.vue"), "<template/>");

    let font = root.join("node_modules/@mdi/font");
    write(
        &font.join("package.json"),
        r#"{ "name": "@mdi/font", "main": "css/materialdesignicons.css" }"#,
    );
    write(&font.join("css/materialdesignicons.css"), "@font-face {}");
    write(&font.join("fonts/materialdesignicons-webfont.woff2"), "wOF2");

    (dir, root)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_alias_resolution_through_loaded_config() {
    let (_dir, root) = vue_project();
    let config = load_config(&root, None, &ConfigEnv::new(Command::Serve)).unwrap();
    let resolver = PathResolver::new(&config);

    let foo = resolver
        .resolve("@/components/Foo.vue", Some(&root.join("src/App.vue")))
        .unwrap();
    assert_eq!(foo.path(), Some(root.join("src/components/Foo.vue").as_path()));

    let icons = resolver.resolve("@mdi/font", Some(&root.join("src/main.ts"))).unwrap();
    assert_eq!(
        icons,
        Resolution::File {
            path: root.join("node_modules/@mdi/font/css/materialdesignicons.css"),
            package: Some("@mdi/font".to_string()),
        }
    );

    assert!(resolver.resolve("@/components/Missing.vue", None).is_err());
}

#[test]
fn test_dev_server_serves_icon_fonts_only() {
    let (_dir, root) = vue_project();
    let config = load_config(&root, None, &ConfigEnv::new(Command::Serve)).unwrap();
    let guard = FsGuard::new(&config.server.fs, &config.root).unwrap();

    assert!(guard
        .check_url("/node_modules/@mdi/font/fonts/materialdesignicons-webfont.woff2")
        .is_allowed());
    assert!(guard.check(&root.join("../shared/logo.svg")).is_allowed());
    assert!(!guard.check(Path::new("/etc/passwd")).is_allowed());
    assert!(!guard.check_url("/@fs/etc/passwd").is_allowed());
    assert!(!guard.check_url("/.env").is_allowed());
}

#[test]
fn test_material_icons_chunk() {
    let (_dir, root) = vue_project();
    let config = load_config(&root, None, &ConfigEnv::new(Command::Build)).unwrap();

    let main = root.join("src/main.ts");
    let app = root.join("src/App.vue");
    let about = root.join("src/views/AboutView.vue");
    let css = root.join("node_modules/@mdi/font/css/materialdesignicons.css");
    let font = root.join("node_modules/@mdi/font/fonts/materialdesignicons-webfont.woff2");

    let module = |path: &Path, imports: &[&Path], dynamic: &[&Path]| ModuleDescription {
        path: path_str(path),
        imports: imports.iter().map(|p| path_str(p)).collect(),
        dynamic_imports: dynamic.iter().map(|p| path_str(p)).collect(),
    };
    let desc = GraphDescription {
        entry: path_str(&main),
        modules: vec![
            module(&main, &[&app, &css], &[&about]),
            module(&app, &[], &[]),
            module(&about, &[&css], &[]),
            module(&css, &[&font], &[]),
            module(&font, &[], &[]),
        ],
    };

    let plan = BuildPlan::from_description(&desc, &config.build.manual_chunks).unwrap();
    assert_eq!(plan.chunk_name_for(&path_str(&css)), Some("material-icons"));
    assert_eq!(plan.chunk_name_for(&path_str(&font)), Some("material-icons"));
    assert_eq!(plan.chunk_name_for(&path_str(&main)), Some("main"));
    assert_eq!(plan.chunk_name_for(&path_str(&app)), Some("main"));

    let manifest = plan.manifest();
    let icons: Vec<_> = manifest
        .chunks
        .iter()
        .filter(|c| c.modules.iter().any(|m| m.contains("@mdi/font")))
        .collect();
    assert_eq!(icons.len(), 1);
    assert_eq!(icons[0].file, "material-icons.js");
    assert!(icons[0].is_manual);
}

#[test]
fn test_two_loads_agree() {
    let (_dir, root) = vue_project();
    let env = ConfigEnv::new(Command::Serve);
    let first = load_config(&root, None, &env).unwrap();
    let second = load_config(&root, None, &env).unwrap();
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());

    let (r1, r2) = (PathResolver::new(&first), PathResolver::new(&second));
    let (g1, g2) = (
        FsGuard::new(&first.server.fs, &first.root).unwrap(),
        FsGuard::new(&second.server.fs, &second.root).unwrap(),
    );
    for specifier in ["@/App.vue", "@mdi/font", "@/nope", "vue"] {
        assert_eq!(r1.resolve(specifier, None), r2.resolve(specifier, None));
    }
    for request in [
        "/src/App.vue",
        "/@fs/etc/passwd",
        "/node_modules/@mdi/font/css/materialdesignicons.css",
    ] {
        assert_eq!(g1.check_url(request), g2.check_url(request));
    }
}
