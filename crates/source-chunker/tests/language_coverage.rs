use source_chunker::{ChunkKind, Chunker, ChunkerConfig, HeuristicTokenizer, Language};

fn chunk(code: &str, language: Language) -> Vec<source_chunker::CodeChunk> {
    let chunker = Chunker::new(ChunkerConfig::default()).expect("valid config");
    chunker
        .chunk(code, language, &HeuristicTokenizer)
        .expect("chunking failed")
}

#[test]
fn typescript_functions_and_methods_are_chunked() {
    let code = r#"
import { join } from "path";

function greet(name: string): string {
  return join("hi", name);
}

class Point {
  x: number;

  constructor(x: number) {
    this.x = x;
  }

  norm(): number {
    return Math.abs(this.x);
  }
}
"#;

    let chunks = chunk(code, Language::TypeScript);
    assert_eq!(chunks.len(), 2);

    let greet = &chunks[0];
    assert_eq!(greet.meta.part_name.as_deref(), Some("greet"));
    assert!(greet.text.contains("import { join } from \"path\";"));
    assert!(greet.text.contains("function greet(name: string): string {"));

    let norm = &chunks[1];
    assert_eq!(norm.meta.part_name.as_deref(), Some("norm"));
    assert!(norm.text.contains("class Point"));
    assert!(norm.text.contains("constructor(x: number)"));
    assert!(!norm.text.contains("import { join }"));
}

#[test]
fn javascript_require_bindings_are_inlined() {
    let code = r#"
const fs = require("fs");

function readConfig(path) {
  return fs.readFileSync(path);
}
"#;

    let chunks = chunk(code, Language::JavaScript);
    assert_eq!(chunks.len(), 1);
    let func = &chunks[0];
    assert_eq!(func.meta.kind, ChunkKind::Function);
    assert!(func.text.contains("const fs = require(\"fs\");"));
    assert!(func.text.contains("function readConfig(path) {"));
}

#[test]
fn java_methods_carry_package_import_and_class_context() {
    let code = r#"
package com.example;

import java.util.List;

class Box {
    private int size;

    int sum(List<Integer> xs) {
        int total = size;
        for (int x : xs) {
            total += x;
        }
        return total;
    }
}
"#;

    let chunks = chunk(code, Language::Java);
    assert_eq!(chunks.len(), 1);
    let sum = &chunks[0];
    assert_eq!(sum.meta.kind, ChunkKind::Function);
    assert_eq!(sum.meta.part_name.as_deref(), Some("sum"));
    assert!(sum.text.starts_with("package com.example;\n"));
    assert!(sum.text.contains("import java.util.List;"));
    assert!(sum.text.contains("class Box {"));
    assert!(sum.text.contains("private int size;"));
    assert!(sum.text.contains("int sum(List<Integer> xs) {"));
}

#[test]
fn c_functions_inline_used_macros_and_keep_doc_comments_in_meta() {
    let code = r#"#include <stdio.h>

#define LIMIT 10

// adds two numbers
int add(int a, int b) {
    return a + b + LIMIT;
}

int main(void) {
    printf("%d\n", add(1, 2));
    return 0;
}
"#;

    let chunks = chunk(code, Language::C);
    let add = chunks
        .iter()
        .find(|c| c.meta.part_name.as_deref() == Some("add"))
        .expect("add chunk");
    assert!(add.text.contains("#define LIMIT 10"));
    assert_eq!(add.meta.docstring.as_deref(), Some("// adds two numbers"));

    let main = chunks
        .iter()
        .find(|c| c.meta.part_name.as_deref() == Some("main"))
        .expect("main chunk");
    assert!(!main.text.contains("#define LIMIT 10"));

    let preamble = chunks
        .iter()
        .find(|c| c.meta.kind == ChunkKind::Preamble)
        .expect("preamble chunk");
    assert!(preamble.text.contains("#include <stdio.h>"));
}

#[test]
fn c_type_definitions_without_identifier_uses_stay_in_preamble() {
    // struct usage appears as a type, not a plain identifier, so the
    // definition is not pulled into the function chunk
    let code = r#"
struct point { int x; int y; };

int norm(struct point p) {
    return p.x * p.x + p.y * p.y;
}
"#;

    let chunks = chunk(code, Language::C);
    let norm = chunks
        .iter()
        .find(|c| c.meta.part_name.as_deref() == Some("norm"))
        .expect("norm chunk");
    assert!(!norm.text.contains("struct point { int x; int y; };"));

    let preamble = chunks
        .iter()
        .find(|c| c.meta.kind == ChunkKind::Preamble)
        .expect("preamble chunk");
    assert!(preamble.text.contains("struct point { int x; int y; };"));
}

#[test]
fn unsupported_language_yields_single_verbatim_block() {
    let code = "package main\n\nfunc main() {\n\tprintln(\"hi\")\n}\n";
    let chunks = chunk(code, Language::Go);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].meta.kind, ChunkKind::CodeBlock);
    assert_eq!(chunks[0].text, code);
    assert_eq!(chunks[0].meta.start_line, 1);
    assert_eq!(chunks[0].meta.end_line, 5);
}

#[test]
fn signature_end_line_points_at_the_declaration() {
    let code = "def f(\n    a,\n    b,\n):\n    return a + b\n";
    let chunks = chunk(code, Language::Python);
    let func = &chunks[0];
    assert_eq!(func.meta.start_line, 1);
    assert_eq!(func.meta.end_line, 5);
    assert_eq!(func.meta.end_line_signature, Some(4));
}
