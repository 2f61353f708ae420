//! Static reader for JavaScript/TypeScript config modules.
//!
//! No JS engine is involved. The reader finds the default export object
//! (`export default { ... }`, `export default defineConfig({ ... })`, or
//! `export default config` with `const config = { ... }`), parses it as an
//! object literal, and evaluates the handful of path helpers real configs use
//! to build absolute paths:
//!
//! ```js
//! import { fileURLToPath, URL } from 'node:url'
//! import vue from '@vitejs/plugin-vue'
//!
//! export default defineConfig({
//!   plugins: [vue()],
//!   resolve: { alias: { '@': fileURLToPath(new URL('./src', import.meta.url)) } },
//! })
//! ```
//!
//! Plugin calls become `{ name, package, options }` objects. Inside the options
//! this layer owns ([`RECOGNIZED_FIELDS`]), anything that is not a literal is
//! rejected with the option path that contained it. Every other key is read
//! leniently: unmodelled expressions are kept as their source text.

use rustc_hash::FxHashMap as HashMap;
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use url::Url;

/// Option paths evaluated strictly. Everything below them must be a literal
/// or a supported path helper.
pub const RECOGNIZED_FIELDS: &[&str] = &[
    "root",
    "mode",
    "resolve.alias",
    "resolve.extensions",
    "server.fs",
    "build.outDir",
    "build.rollupOptions.output.manualChunks",
];

/// `field` is a recognized option or sits below one.
fn is_recognized(field: &str) -> bool {
    RECOGNIZED_FIELDS.iter().any(|known| {
        field
            .strip_prefix(known)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '[']))
    })
}

/// `field` is an object on the way to a recognized option (`build`, `server`).
fn leads_to_recognized(field: &str) -> bool {
    RECOGNIZED_FIELDS.iter().any(|known| {
        known
            .strip_prefix(field)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// A parsed JavaScript expression, limited to what config objects contain.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
    Array(Vec<Expr>),
    /// Properties in source order.
    Object(Vec<(String, Expr)>),
    /// Identifier or member chain (`__dirname`, `import.meta.url`).
    Ident(String),
    /// `callee(args)` or `new callee(args)`.
    Call {
        callee: String,
        args: Vec<Expr>,
        is_new: bool,
    },
    /// Source text of an expression the reader does not model
    /// (arrow functions, operators, regex literals, spreads).
    Opaque(String),
}

/// Read a config module and return its default export as JSON.
///
/// `config_file` anchors `import.meta.url` and `__dirname`.
pub fn evaluate_config_module(source: &str, config_file: &Path) -> Result<Value, String> {
    let stripped = strip_comments(source);
    let imports = scan_import_bindings(&stripped);

    let object = extract_default_export_object(&stripped)
        .ok_or_else(|| "No `export default { ... }` found in config file".to_string())?;
    let expr = parse_js_expr(&object)?;

    let scope = ModuleScope::new(config_file, imports);
    scope.eval_config(&expr)
}

/// Parse a single JS expression.
pub fn parse_js_expr(input: &str) -> Result<Expr, String> {
    let mut parser = JsExprParser::new(input);
    let expr = parser.parse_value()?;
    parser.skip_whitespace();
    match parser.peek() {
        None | Some(';' | ')') => Ok(expr),
        Some(ch) => Err(format!(
            "Unexpected trailing character '{}' at position {}",
            ch, parser.pos
        )),
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Bindings visible to the default export: the config location and imports.
struct ModuleScope {
    config_file: PathBuf,
    config_dir: PathBuf,
    /// Local binding → module it was imported from.
    imports: HashMap<String, String>,
}

impl ModuleScope {
    fn new(config_file: &Path, imports: HashMap<String, String>) -> Self {
        let config_dir = config_file
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            config_file: config_file.to_path_buf(),
            config_dir,
            imports,
        }
    }

    fn eval_config(&self, expr: &Expr) -> Result<Value, String> {
        let Expr::Object(props) = expr else {
            return Err("Default export is not an object literal".to_string());
        };

        let mut map = Map::new();
        for (key, value) in props {
            let evaluated = if key == "plugins" {
                self.eval_plugins(value)?
            } else {
                self.eval_option(value, key)?
            };
            map.insert(key.clone(), evaluated);
        }
        Ok(Value::Object(map))
    }

    /// Strict inside recognized options, lenient everywhere else.
    fn eval_option(&self, expr: &Expr, field: &str) -> Result<Value, String> {
        if is_recognized(field) {
            return self.eval(expr, field);
        }
        if !leads_to_recognized(field) {
            return Ok(self.eval_lenient(expr));
        }
        let Expr::Object(props) = expr else {
            return self.eval(expr, field);
        };
        let mut map = Map::new();
        for (key, value) in props {
            map.insert(key.clone(), self.eval_option(value, &format!("{field}.{key}"))?);
        }
        Ok(Value::Object(map))
    }

    /// `plugins: [vue(), vueDevTools({ ... })]`
    fn eval_plugins(&self, expr: &Expr) -> Result<Value, String> {
        let Expr::Array(items) = expr else {
            return Err("`plugins` must be an array".to_string());
        };

        let mut plugins = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let field = format!("plugins[{idx}]");
            match item {
                // Falsy entries are skipped by the bundler (`cond && plugin()` patterns).
                Expr::Null | Expr::Bool(false) => {}
                Expr::Call {
                    callee,
                    args,
                    is_new: false,
                } => {
                    let binding = callee.split('.').next().unwrap_or(callee);
                    let mut plugin = Map::new();
                    plugin.insert("name".to_string(), Value::String(callee.clone()));
                    if let Some(package) = self.imports.get(binding) {
                        plugin.insert("package".to_string(), Value::String(package.clone()));
                    }
                    let options = match args.first() {
                        Some(arg @ Expr::Object(_)) => self.eval_lenient(arg),
                        _ => Value::Null,
                    };
                    plugin.insert("options".to_string(), options);
                    plugins.push(Value::Object(plugin));
                }
                // Already-evaluated descriptor objects are passed through.
                Expr::Object(_) => plugins.push(self.eval(item, &field)?),
                other => {
                    return Err(format!(
                        "`{field}` must be a plugin call, got {}",
                        other.describe()
                    ))
                }
            }
        }
        Ok(Value::Array(plugins))
    }

    /// Evaluate a value in a recognized option. Unmodelled expressions are errors.
    fn eval(&self, expr: &Expr, field: &str) -> Result<Value, String> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => Ok(Value::Number(n.clone())),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.eval(item, &format!("{field}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Object(props) => {
                let mut map = Map::new();
                for (key, value) in props {
                    map.insert(key.clone(), self.eval(value, &format!("{field}.{key}"))?);
                }
                Ok(Value::Object(map))
            }
            Expr::Ident(name) => self
                .eval_ident(name)
                .map(Value::String)
                .ok_or_else(|| format!("`{field}`: cannot evaluate identifier `{name}`")),
            Expr::Call { .. } => self
                .eval_call(expr)
                .map(Value::String)
                .map_err(|e| format!("`{field}`: {e}")),
            Expr::Opaque(src) => Err(format!("`{field}`: unsupported expression `{src}`")),
        }
    }

    /// Evaluate plugin options and unrecognized keys: whatever cannot be
    /// evaluated is kept as source text.
    fn eval_lenient(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Array(items) => {
                Value::Array(items.iter().map(|i| self.eval_lenient(i)).collect())
            }
            Expr::Object(props) => Value::Object(
                props
                    .iter()
                    .map(|(k, v)| (k.clone(), self.eval_lenient(v)))
                    .collect(),
            ),
            Expr::Ident(name) => {
                Value::String(self.eval_ident(name).unwrap_or_else(|| name.clone()))
            }
            Expr::Call { .. } => {
                Value::String(self.eval_call(expr).unwrap_or_else(|_| expr.describe()))
            }
            Expr::Opaque(src) => Value::String(src.clone()),
            other => self.eval(other, "").unwrap_or(Value::Null),
        }
    }

    fn eval_ident(&self, name: &str) -> Option<String> {
        match name {
            "__dirname" | "import.meta.dirname" => Some(self.config_dir.display().to_string()),
            "__filename" | "import.meta.filename" => Some(self.config_file.display().to_string()),
            "import.meta.url" => self.config_url().map(String::from),
            _ => None,
        }
    }

    fn config_url(&self) -> Option<Url> {
        Url::from_file_path(&self.config_file).ok()
    }

    /// Path helpers: `fileURLToPath`, `new URL`, `path.resolve`, `path.join`.
    fn eval_call(&self, expr: &Expr) -> Result<String, String> {
        let Expr::Call {
            callee,
            args,
            is_new,
        } = expr
        else {
            return Err(format!("expected a call, got {}", expr.describe()));
        };

        match (callee.as_str(), *is_new) {
            ("URL", true) => self.eval_url(args).map(String::from),
            ("fileURLToPath" | "url.fileURLToPath", false) => {
                let [arg] = args.as_slice() else {
                    return Err("fileURLToPath() takes exactly one argument".to_string());
                };
                let url = match arg {
                    Expr::Call {
                        callee, is_new: true, args,
                    } if callee == "URL" => self.eval_url(args)?,
                    other => {
                        let text = self.eval_string_arg(other)?;
                        Url::parse(&text).map_err(|e| format!("invalid URL '{text}': {e}"))?
                    }
                };
                url.to_file_path()
                    .map(|p| p.display().to_string())
                    .map_err(|()| format!("'{url}' is not a file URL"))
            }
            ("path.resolve" | "resolve" | "path.join" | "join", false) => {
                let resolve = callee.ends_with("resolve");
                let mut out = if resolve {
                    self.config_dir.clone()
                } else {
                    PathBuf::new()
                };
                for arg in args {
                    let segment = self.eval_string_arg(arg)?;
                    if resolve && Path::new(&segment).is_absolute() {
                        out = PathBuf::from(segment);
                    } else {
                        out.push(segment);
                    }
                }
                Ok(bundleconf_util::path::normalize(&out).display().to_string())
            }
            _ => Err(format!(
                "unsupported call `{}{callee}(...)`",
                if *is_new { "new " } else { "" }
            )),
        }
    }

    /// `new URL(relative, base)`
    fn eval_url(&self, args: &[Expr]) -> Result<Url, String> {
        match args {
            [input] => {
                let text = self.eval_string_arg(input)?;
                Url::parse(&text).map_err(|e| format!("invalid URL '{text}': {e}"))
            }
            [input, base] => {
                let input = self.eval_string_arg(input)?;
                let base = self.eval_string_arg(base)?;
                let base = Url::parse(&base)
                    .map_err(|e| format!("invalid base URL '{base}': {e}"))?;
                base.join(&input)
                    .map_err(|e| format!("cannot join '{input}' onto '{base}': {e}"))
            }
            _ => Err("new URL() takes one or two arguments".to_string()),
        }
    }

    fn eval_string_arg(&self, expr: &Expr) -> Result<String, String> {
        match expr {
            Expr::Str(s) => Ok(s.clone()),
            Expr::Ident(name) => self
                .eval_ident(name)
                .ok_or_else(|| format!("cannot evaluate identifier `{name}`")),
            Expr::Call { .. } => self.eval_call(expr),
            other => Err(format!("expected a string, got {}", other.describe())),
        }
    }
}

impl Expr {
    /// Short description for error messages.
    fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Str(s) => format!("'{s}'"),
            Self::Array(_) => "an array".to_string(),
            Self::Object(_) => "an object".to_string(),
            Self::Ident(name) => format!("`{name}`"),
            Self::Call { callee, is_new, .. } => {
                format!("`{}{callee}(...)`", if *is_new { "new " } else { "" })
            }
            Self::Opaque(src) => format!("`{src}`"),
        }
    }
}

// ============================================================================
// Source scanning
// ============================================================================

/// Map local import bindings to their module: `import vue from '@vitejs/plugin-vue'`
/// yields `vue → @vitejs/plugin-vue`.
fn scan_import_bindings(source: &str) -> HashMap<String, String> {
    let mut bindings = HashMap::default();
    let pattern = r#"import\s+(?:type\s+)?([\w$*{}\s,]+?)\s+from\s+['"]([^'"]+)['"]"#;
    let Ok(re) = regex_lite::Regex::new(pattern) else {
        return bindings;
    };

    for caps in re.captures_iter(source) {
        let (Some(clause), Some(module)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let module = module.as_str();
        for part in clause.as_str().split(|c| c == ',' || c == '{' || c == '}') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            // `* as ns`, `orig as local`
            let local = part.rsplit(" as ").next().unwrap_or(part).trim();
            let local = local.strip_prefix("type ").unwrap_or(local).trim();
            if !local.is_empty() && local != "*" {
                bindings.insert(local.to_string(), module.to_string());
            }
        }
    }
    bindings
}

/// Extract the object literal that is the module's default export.
///
/// Returns the object including the outer braces.
fn extract_default_export_object(source: &str) -> Option<String> {
    let marker = "export default";
    let idx = source.find(marker)?;
    let mut after = source[idx + marker.len()..].trim_start();

    if let Some(rest) = after.strip_prefix("defineConfig") {
        after = rest.trim_start().strip_prefix('(')?.trim_start();
    } else if let Some(name) = leading_identifier(after) {
        after = find_binding_initializer(source, name)?;
    }

    if !after.starts_with('{') {
        return None;
    }
    balanced_prefix(after)
}

fn leading_identifier(s: &str) -> Option<&str> {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map_or(s.len(), |(i, _)| i);
    let ident = &s[..end];
    match ident.chars().next() {
        Some(c) if !c.is_ascii_digit() => Some(ident),
        _ => None,
    }
}

/// For `export default config`, locate `const config = { ... }` (optionally typed
/// or wrapped in `defineConfig(...)`) and return the text starting at `{`.
fn find_binding_initializer<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!(
        r"(?:const|let|var)\s+{}\s*(?::[^=]+)?=\s*(?:defineConfig\s*\(\s*)?",
        regex_lite::escape(name)
    );
    let re = regex_lite::Regex::new(&pattern).ok()?;
    let m = re.find(source)?;
    Some(&source[m.end()..])
}

/// Return the balanced `{ ... }` at the start of `s`, respecting strings.
fn balanced_prefix(s: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in s.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(s[..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip single-line (//) and multi-line (/* */) comments from JS source.
///
/// Newlines inside block comments are kept so positions stay on the same line.
fn strip_comments(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let mut in_string: Option<char> = None;

    while i < len {
        if let Some(quote) = in_string {
            result.push(chars[i]);
            if chars[i] == '\\' && i + 1 < len {
                result.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if chars[i] == quote {
                in_string = None;
            }
            i += 1;
        } else if i + 1 < len && chars[i] == '/' && chars[i + 1] == '/' {
            while i < len && chars[i] != '\n' {
                i += 1;
            }
        } else if i + 1 < len && chars[i] == '/' && chars[i + 1] == '*' {
            i += 2;
            while i + 1 < len && !(chars[i] == '*' && chars[i + 1] == '/') {
                if chars[i] == '\n' {
                    result.push('\n');
                }
                i += 1;
            }
            i += 2;
        } else {
            if matches!(chars[i], '"' | '\'' | '`') {
                in_string = Some(chars[i]);
            }
            result.push(chars[i]);
            i += 1;
        }
    }

    result
}

// ============================================================================
// Expression parser
// ============================================================================

struct JsExprParser {
    chars: Vec<char>,
    pos: usize,
}

impl JsExprParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut idx = self.pos;
        for expected in s.chars() {
            if self.chars.get(idx) != Some(&expected) {
                return false;
            }
            idx += 1;
        }
        true
    }

    fn at_delimiter(&self) -> bool {
        matches!(self.peek(), None | Some(',' | '}' | ']' | ')' | ';'))
    }

    /// Parse a value; if the expression continues past the first primary
    /// (operators, arrow bodies, member access on calls), capture it whole as
    /// [`Expr::Opaque`].
    fn parse_value(&mut self) -> Result<Expr, String> {
        self.skip_whitespace();
        let start = self.pos;

        let primary = match self.peek() {
            Some('{') => self.parse_object()?,
            Some('[') => self.parse_array()?,
            Some('"' | '\'' | '`') => self.parse_string()?,
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.parse_number()?,
            Some(ch) if is_ident_start(ch) => self.parse_ident_or_call()?,
            Some(_) => return self.parse_opaque(start),
            None => return Err("Unexpected end of input".to_string()),
        };

        self.skip_whitespace();
        if self.at_delimiter() {
            Ok(primary)
        } else {
            self.parse_opaque(start)
        }
    }

    /// Consume up to the next top-level delimiter and return the raw text.
    fn parse_opaque(&mut self, start: usize) -> Result<Expr, String> {
        self.pos = start;
        let mut depth = 0usize;
        let mut in_string: Option<char> = None;

        while let Some(ch) = self.peek() {
            if let Some(quote) = in_string {
                if ch == '\\' {
                    self.pos += 1;
                } else if ch == quote {
                    in_string = None;
                }
                self.pos += 1;
                continue;
            }
            match ch {
                '"' | '\'' | '`' => in_string = Some(ch),
                '{' | '[' | '(' => depth += 1,
                '}' | ']' | ')' if depth == 0 => break,
                '}' | ']' | ')' => depth -= 1,
                ',' | ';' if depth == 0 => break,
                _ => {}
            }
            self.pos += 1;
        }

        if in_string.is_some() || depth != 0 {
            return Err(format!("Unterminated expression at position {start}"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(format!("Expected a value at position {start}"));
        }
        Ok(Expr::Opaque(text))
    }

    fn parse_object(&mut self) -> Result<Expr, String> {
        self.advance(); // '{'
        let mut props = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') => {
                    self.advance();
                    return Ok(Expr::Object(props));
                }
                None => return Err("Unterminated object".to_string()),
                _ => {}
            }

            let key = self.parse_key()?;
            self.skip_whitespace();

            match self.peek() {
                Some(':') => {
                    self.advance();
                    let value = self.parse_value()?;
                    props.push((key, value));
                }
                // Shorthand property: `{ alias }`
                Some(',' | '}') => props.push((key.clone(), Expr::Ident(key))),
                other => return Err(format!("Expected ':' after key, got {other:?}")),
            }

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some('}') => {}
                None => return Err("Unterminated object".to_string()),
                Some(ch) => return Err(format!("Expected ',' or '}}' in object, got '{ch}'")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Expr, String> {
        self.advance(); // '['
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(']') => {
                    self.advance();
                    return Ok(Expr::Array(items));
                }
                None => return Err("Unterminated array".to_string()),
                _ => {}
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(']') => {}
                None => return Err("Unterminated array".to_string()),
                Some(ch) => return Err(format!("Expected ',' or ']' in array, got '{ch}'")),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('"' | '\'') => match self.parse_string()? {
                Expr::Str(s) => Ok(s),
                _ => Err("Expected string key".to_string()),
            },
            Some(ch) if is_ident_start(ch) || ch.is_ascii_digit() => {
                let mut key = String::new();
                while let Some(ch) = self.peek() {
                    if is_ident_part(ch) {
                        key.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Ok(key)
            }
            other => Err(format!("Expected object key, got {other:?}")),
        }
    }

    fn parse_string(&mut self) -> Result<Expr, String> {
        let Some(quote) = self.advance() else {
            return Err("Unexpected end of input".to_string());
        };
        let mut s = String::new();

        loop {
            match self.advance() {
                Some(ch) if ch == quote => return Ok(Expr::Str(s)),
                Some('$') if quote == '`' && self.peek() == Some('{') => {
                    return Err(
                        "Template literals with substitutions are not supported".to_string()
                    );
                }
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('\\') => s.push('\\'),
                    Some(ch) if ch == quote => s.push(ch),
                    Some(ch) => {
                        s.push('\\');
                        s.push(ch);
                    }
                    None => return Err("Unterminated string escape".to_string()),
                },
                Some(ch) => s.push(ch),
                None => return Err("Unterminated string".to_string()),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Expr, String> {
        let mut num_str = String::new();
        let mut has_dot = false;

        if self.peek() == Some('-') {
            num_str.push('-');
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                if ch != '_' {
                    num_str.push(ch);
                }
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if has_dot {
            let n = num_str
                .parse::<f64>()
                .map_err(|e| format!("Invalid number '{num_str}': {e}"))?;
            Number::from_f64(n)
                .map(Expr::Number)
                .ok_or_else(|| format!("Invalid number '{num_str}'"))
        } else {
            num_str
                .parse::<i64>()
                .map(|n| Expr::Number(n.into()))
                .map_err(|e| format!("Invalid number '{num_str}': {e}"))
        }
    }

    /// Identifiers, keywords, member chains, and `[new] callee(args)`.
    fn parse_ident_or_call(&mut self) -> Result<Expr, String> {
        let mut is_new = false;
        if self.starts_with("new")
            && self
                .chars
                .get(self.pos + 3)
                .is_some_and(|c| c.is_whitespace())
        {
            is_new = true;
            self.pos += 3;
            self.skip_whitespace();
        }

        let name = self.parse_member_chain();
        if name.is_empty() {
            return Err(format!("Expected identifier at position {}", self.pos));
        }

        if !is_new {
            match name.as_str() {
                "true" => return Ok(Expr::Bool(true)),
                "false" => return Ok(Expr::Bool(false)),
                "null" | "undefined" => return Ok(Expr::Null),
                _ => {}
            }
        }

        self.skip_whitespace();
        if self.peek() != Some('(') {
            return if is_new {
                Ok(Expr::Call {
                    callee: name,
                    args: Vec::new(),
                    is_new,
                })
            } else {
                Ok(Expr::Ident(name))
            };
        }

        self.advance(); // '('
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.advance();
                    break;
                }
                None => return Err("Unterminated argument list".to_string()),
                _ => {}
            }
            args.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(')') => {}
                None => return Err("Unterminated argument list".to_string()),
                Some(ch) => return Err(format!("Expected ',' or ')' in arguments, got '{ch}'")),
            }
        }

        Ok(Expr::Call {
            callee: name,
            args,
            is_new,
        })
    }

    fn parse_member_chain(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if is_ident_part(ch) || (ch == '.' && !name.is_empty() && !name.ends_with('.')) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
