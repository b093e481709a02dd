//! TypeScript-to-JavaScript transpilation.
//!
//! Client scripts are authored in TypeScript; the responder asks this
//! module for plain JavaScript to put on the wire. The implementation is
//! a token-level type eraser with a fixed CommonJS module lowering — no
//! project configuration is consulted, and identical input always yields
//! identical output.
//!
//! Supported surface: type annotations (variables, parameters, returns,
//! class members), optional/non-null markers, `interface` and `type`
//! declarations, `declare` statements, `as`/`satisfies` casts,
//! unambiguous generic parameter/argument lists, class `implements`
//! clauses and access modifiers, constructor parameter properties, enums
//! with literal initializers, and `import`/`export` lowering to
//! `require`/`exports.*`. Constructs outside that surface (namespaces,
//! decorators, re-exports, computed enum initializers) are rejected with
//! a diagnostic rather than emitted broken.

mod lexer;
mod strip;

use thiserror::Error;

/// A positioned problem found while transpiling.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub offset: usize,
    pub message: String,
}

/// Transpilation failure with a source position.
#[derive(Debug, Clone, Error)]
#[error("transpile error at line {line}, column {column}: {message}")]
pub struct TranspileError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl TranspileError {
    fn at(source: &str, offset: usize, message: String) -> Self {
        let prefix = &source[..offset.min(source.len())];
        let line = prefix.matches('\n').count() + 1;
        let column = offset - prefix.rfind('\n').map_or(0, |p| p + 1) + 1;
        Self {
            line,
            column,
            message,
        }
    }
}

/// Transpile TypeScript source text into plain JavaScript.
pub fn transpile(source: &str) -> Result<String, TranspileError> {
    let toks = lexer::tokenize(source)
        .map_err(|e| TranspileError::at(source, e.offset, e.message))?;
    strip::strip(source, &toks).map_err(|d| TranspileError::at(source, d.offset, d.message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_javascript_is_untouched() {
        let src = "function hello() {\n    console.log('hi');\n}\nhello();\n";
        assert_eq!(transpile(src).unwrap(), src);
    }

    #[test]
    fn test_variable_and_function_annotations() {
        let src = "const greeting: string = 'hi';\nfunction add(a: number, b: number): number {\n    return a + b;\n}\n";
        let expected =
            "const greeting = 'hi';\nfunction add(a, b) {\n    return a + b;\n}\n";
        assert_eq!(transpile(src).unwrap(), expected);
    }

    #[test]
    fn test_interface_and_type_alias_are_erased() {
        let src = "interface Point {\n    x: number;\n    y: number;\n}\ntype ID = string | number;\nconst p = { x: 1, y: 2 };\n";
        let out = transpile(src).unwrap();
        assert_eq!(out.trim(), "const p = { x: 1, y: 2 };");
        assert!(!out.contains("interface"));
        assert!(!out.contains("ID"));
    }

    #[test]
    fn test_arrow_annotations_and_generics() {
        let src = "const ids = items.map((item: Item): string => item.id);\nconst set = new Set<string>(ids);\n";
        let expected = "const ids = items.map((item) => item.id);\nconst set = new Set(ids);\n";
        assert_eq!(transpile(src).unwrap(), expected);
    }

    #[test]
    fn test_optional_and_non_null_markers() {
        let src = "function find(name?: string) {\n    return registry.get(name)!.value;\n}\n";
        let expected = "function find(name) {\n    return registry.get(name).value;\n}\n";
        assert_eq!(transpile(src).unwrap(), expected);
    }

    #[test]
    fn test_ternaries_survive() {
        let src = "const label = count > 1 ? 'items' : 'item';\n";
        assert_eq!(transpile(src).unwrap(), src);
    }

    #[test]
    fn test_object_literal_colons_survive() {
        let src = "const style = { color: 'red', width: 10 };\n";
        assert_eq!(transpile(src).unwrap(), src);
    }

    #[test]
    fn test_as_cast_is_erased() {
        let src = "const el = document.getElementById('app') as HTMLElement;\nel.focus();\n";
        let expected = "const el = document.getElementById('app');\nel.focus();\n";
        assert_eq!(transpile(src).unwrap(), expected);
    }

    #[test]
    fn test_import_lowering() {
        let src = "import { clamp } from './math';\nclamp(1, 2, 3);\n";
        let out = transpile(src).unwrap();
        assert!(out.starts_with("\"use strict\";\n"));
        assert!(out.contains("Object.defineProperty(exports, \"__esModule\", { value: true });"));
        assert!(out.contains("const { clamp } = require('./math');"));
        assert!(!out.contains("import"));
    }

    #[test]
    fn test_import_forms() {
        let out = transpile("import './side-effect';\n").unwrap();
        assert!(out.contains("require('./side-effect');"));

        let out = transpile("import * as util from './util';\n").unwrap();
        assert!(out.contains("const util = require('./util');"));

        let out = transpile("import app from './app';\n").unwrap();
        assert!(out.contains("const app = require('./app').default;"));

        let out = transpile("import { a as b, c } from './m';\n").unwrap();
        assert!(out.contains("const { a: b, c } = require('./m');"));

        // Type-only imports vanish.
        let out = transpile("import type { T } from './types';\nconst x = 1;\n").unwrap();
        assert!(!out.contains("require('./types')"));
        assert!(out.contains("const x = 1;"));
    }

    #[test]
    fn test_export_function_and_const() {
        let src = "export function double(n: number): number {\n    return n * 2;\n}\nexport const limit: number = 10;\n";
        let out = transpile(src).unwrap();
        assert!(out.contains("function double(n) {"));
        assert!(out.contains("const limit = 10;"));
        assert!(out.contains("exports.double = double;"));
        assert!(out.contains("exports.limit = limit;"));
        assert!(!out.contains("export "));
    }

    #[test]
    fn test_export_default() {
        let src = "export default function setup(): void {}\n";
        let expected = "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true });\nexports.default = function setup() {}\n";
        assert_eq!(transpile(src).unwrap(), expected);
    }

    #[test]
    fn test_export_list() {
        let src = "const a = 1;\nconst b = 2;\nexport { a, b as c };\n";
        let out = transpile(src).unwrap();
        assert!(out.contains("exports.a = a;"));
        assert!(out.contains("exports.c = b;"));
    }

    #[test]
    fn test_class_members() {
        let src = "class Ticker {\n    private count: number = 0;\n    tick(): number {\n        this.count += 1;\n        return this.count;\n    }\n}\n";
        let out = transpile(src).unwrap();
        assert!(out.contains("count = 0;"));
        assert!(out.contains("tick() {"));
        assert!(!out.contains("private"));
        assert!(!out.contains(": number"));
    }

    #[test]
    fn test_constructor_parameter_properties() {
        let src = "class Point {\n    constructor(private x: number, private y: number) {\n        this.render();\n    }\n}\n";
        let out = transpile(src).unwrap();
        assert!(out.contains("this.x = x;"));
        assert!(out.contains("this.y = y;"));
        assert!(!out.contains("private"));
        // Assignments land before the original body statements.
        assert!(out.find("this.x = x;").unwrap() < out.find("this.render();").unwrap());
    }

    #[test]
    fn test_implements_clause_is_erased() {
        let src = "class Walker extends Base implements Movable {\n    step() {}\n}\n";
        let out = transpile(src).unwrap();
        assert!(out.contains("class Walker extends Base {"));
        assert!(!out.contains("implements"));
        assert!(!out.contains("Movable"));
    }

    #[test]
    fn test_enum_lowering() {
        let src = "enum Level {\n    Debug,\n    Info = 10,\n    Warn = \"warn\",\n}\n";
        let expected = "var Level;\n(function (Level) {\n    Level[Level[\"Debug\"] = 0] = \"Debug\";\n    Level[Level[\"Info\"] = 10] = \"Info\";\n    Level[\"Warn\"] = \"warn\";\n})(Level || (Level = {}));\n";
        assert_eq!(transpile(src).unwrap(), expected);
    }

    #[test]
    fn test_deterministic_output() {
        let src = "import { x } from './m';\nexport const y: number = x as number;\nenum E { A, B }\n";
        let first = transpile(src).unwrap();
        let second = transpile(src).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unterminated_literal_is_an_error() {
        assert!(transpile("const s = 'oops").is_err());
        assert!(transpile("const t = `oops").is_err());
        assert!(transpile("/* never closed").is_err());
    }

    #[test]
    fn test_unsupported_constructs_are_errors() {
        assert!(transpile("namespace Util { export const x = 1; }").is_err());
        assert!(transpile("@sealed\nclass C {}").is_err());
        assert!(transpile("export * from './other';\n").is_err());
        assert!(transpile("enum Bad { A = compute() }\n").is_err());
    }

    #[test]
    fn test_error_positions_are_line_based() {
        let err = transpile("const ok = 1;\n@dec\nclass C {}\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
    }
}
