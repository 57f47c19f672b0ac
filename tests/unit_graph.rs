// tests/unit_graph.rs
//! Tests for import extraction across languages.

use slopgraph::graph::imports::{self, ImportKind, SkipReason};
use std::path::Path;

#[test]
fn test_python_import() {
    let content = r"
import os
import sys
import json
";
    let imports = imports::extract(Path::new("main.py"), content).unwrap();
    let specs: Vec<&str> = imports.iter().map(|i| i.spec.as_str()).collect();
    assert_eq!(specs, ["os", "sys", "json"]);
}

#[test]
fn test_python_from_import_keeps_names() {
    let content = "from app.models import User, Group as G\n";
    let imports = imports::extract(Path::new("views.py"), content).unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].spec, "app.models");
    assert_eq!(imports[0].names, ["User", "Group"]);
    assert_eq!(imports[0].line, 1);
}

#[test]
fn test_python_method_import_is_deferred() {
    let content = r"
import top

class Service:
    def run(self):
        from .heavy import Engine
        return Engine()
";
    let imports = imports::extract(Path::new("svc.py"), content).unwrap();
    assert_eq!(imports.len(), 2);
    assert!(!imports[0].deferred, "module-level import is load-time");
    assert!(imports[1].deferred, "method-local import is deferred");
    assert_eq!(imports[1].spec, ".heavy");
}

#[test]
fn test_python_syntax_error_is_skipped() {
    let result = imports::extract(Path::new("bad.py"), "def f(:\n    pass\n");
    assert_eq!(result, Err(SkipReason::Syntax));
}

#[test]
fn test_ts_import_export_require() {
    let content = r#"
import React from 'react';
import { helper } from "./helper";
export * from './models';
const cfg = require('./config');
"#;
    let imports = imports::extract(Path::new("src/app.ts"), content).unwrap();
    let specs: Vec<&str> = imports.iter().map(|i| i.spec.as_str()).collect();
    assert_eq!(specs, ["react", "./helper", "./models", "./config"]);
    assert_eq!(imports[2].kind, ImportKind::ReExport);
    assert_eq!(imports[3].kind, ImportKind::Static);
}

#[test]
fn test_tsx_dynamic_import() {
    let content = "const Page = lazy(() => import('./pages/Home'));\nexport default () => <Page />;\n";
    let imports = imports::extract(Path::new("src/App.tsx"), content).unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].spec, "./pages/Home");
    assert_eq!(imports[0].kind, ImportKind::Dynamic);
}

#[test]
fn test_ts_template_string_require_is_ignored() {
    let content = "const m = require(`./${name}`);\n";
    let imports = imports::extract(Path::new("load.ts"), content).unwrap();
    assert!(imports.is_empty());
}

#[test]
fn test_unsupported_extension() {
    assert_eq!(
        imports::extract(Path::new("main.go"), "package main\n"),
        Err(SkipReason::Unsupported)
    );
}
