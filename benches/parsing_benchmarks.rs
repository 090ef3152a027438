use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rs274::flavor::builtin_flavor;
use rs274::parser::{tokenize_line, Parser};
use rs274::validation::validate_program;
use rs274::{parse_line, Machine};

/// Generate G-code content of different patterns for benchmarking
fn generate_gcode_content(lines: usize, pattern: &str) -> String {
    let mut content = String::new();

    match pattern {
        "movement_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "N{} G1 X{:.3} Y{:.3} Z{:.3} F1500\n",
                    i,
                    (i as f32) * 0.1,
                    (i as f32) * 0.2,
                    (i as f32) * 0.05
                ));
            }
        }
        "expression_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "#1=[{} * 0.5] G1 X[#1 + cos[{}]] Y[sqrt[#1] ** 2] Z[atan[1]/[{} + 1]]\n",
                    i,
                    i % 360,
                    i % 7
                ));
            }
        }
        "comment_heavy" => {
            for i in 0..lines {
                content.push_str(&format!(
                    "G1 X{:.1} Y{:.1} (segment {}) ; layer {}\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.1,
                    i % 100,
                    i / 100
                ));
            }
        }
        _ => {
            for i in 0..lines {
                match i % 4 {
                    0 => content.push_str(&format!(
                        "G1 X{:.3} Y{:.3} F1500\n",
                        (i as f32) * 0.1,
                        (i as f32) * 0.2
                    )),
                    1 => content.push_str(&format!("; Layer {}\n", i / 4)),
                    2 => content.push_str(&format!("M3 S{}\n", 200 + (i % 50))),
                    _ => content.push_str(&format!("G0 Z{:.2}\n", (i as f32) * 0.1)),
                }
            }
        }
    }

    content
}

/// Benchmark parsing single lines of different shapes
fn bench_single_line_parsing(c: &mut Criterion) {
    let test_lines = vec![
        ("simple_move", "G1 X10 Y20"),
        ("complex_move", "N120 G1 X123.456 Y789.012 Z0.3 F1500"),
        ("with_comment", "G1 X10 Y20 (rapid) ; Move to next position"),
        ("expression", "G1 X[1 + [2 * cos[#3]]] Y[atan[1]/[2]]"),
        ("parameter_setting", "#1=[#2 mod 3] #4=-0.5"),
        ("block_delete", "/ N3 M3 S1000 T1 M6"),
    ];

    let mut group = c.benchmark_group("single_line_parsing");

    for (name, line) in &test_lines {
        group.bench_with_input(BenchmarkId::new("tokenize", name), line, |b, line| {
            b.iter(|| black_box(tokenize_line(black_box(line))))
        });
        group.bench_with_input(BenchmarkId::new("parse_line", name), line, |b, line| {
            b.iter(|| black_box(parse_line(black_box(line))))
        });
    }

    group.finish();
}

/// Benchmark whole programs with a reused parser
fn bench_program_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("program_parsing");

    for &size in &[100, 1_000, 10_000] {
        for pattern in ["movement_heavy", "expression_heavy", "comment_heavy", "mixed"] {
            let content = generate_gcode_content(size, pattern);

            group.throughput(Throughput::Bytes(content.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(pattern, size),
                &content,
                |b, content| {
                    let mut parser = Parser::new();
                    b.iter(|| black_box(parser.parse_program(black_box(content))))
                },
            );
        }
    }

    group.finish();
}

/// Benchmark table lookups over an already parsed program
fn bench_annotation(c: &mut Criterion) {
    let flavor = Arc::new(builtin_flavor().expect("embedded flavor loads"));
    let mut machine = Machine::new(flavor);
    let content = generate_gcode_content(1_000, "mixed");
    let program = machine.parse_program(&content).expect("generated program parses");

    let mut group = c.benchmark_group("annotation");
    group.throughput(Throughput::Elements(program.len() as u64));
    group.bench_function("annotate", |b| {
        b.iter(|| {
            for line in program.iter() {
                black_box(machine.annotate(line));
            }
        })
    });
    group.bench_function("validate", |b| {
        b.iter(|| black_box(validate_program(&program, machine.config())))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_single_line_parsing,
    bench_program_parsing,
    bench_annotation
);
criterion_main!(benches);
