//! Parser benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use esparse::{parse_module, to_estree, Lexer, ParserOptions, TokenKind};

const SAMPLE_SOURCE: &str = r#"
// Sample module for benchmarking
function fibonacci(n) {
    if (n <= 1) return n;
    return fibonacci(n - 1) + fibonacci(n - 2);
}

class Calculator {
    #result = 0;
    static instances = 0;

    constructor() {
        Calculator.instances++;
    }

    add(x, y) {
        return x + y;
    }

    get result() {
        return this.#result;
    }

    async fetchData(url) {
        const response = await fetch(url);
        return response?.json?.() ?? null;
    }
}

const calc = new Calculator();
const numbers = [1, 2, 3, 4, 5].map(n => n ** 2);
const { a, b, ...rest } = { a: 1, b: 2, c: 3, d: 4 };
const template = `Hello ${name}, you have ${count} messages`;

for (const [key, value] of Object.entries(rest)) {
    label: for (let i = 0; i < value; i++) {
        if (i % 2) continue label;
    }
}

export { Calculator, fibonacci };
export default calc;
"#;

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(SAMPLE_SOURCE), true);
            while let Ok(token) = lexer.next_token() {
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
        });
    });

    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));
    let options = ParserOptions::default();

    group.bench_function("module", |b| {
        b.iter(|| parse_module(black_box(SAMPLE_SOURCE), &options));
    });

    let program = parse_module(SAMPLE_SOURCE, &options).expect("sample parses");
    let ranged = ParserOptions {
        ranges: true,
        loc: true,
        ..ParserOptions::default()
    };
    group.bench_function("estree", |b| {
        b.iter(|| to_estree(black_box(&program), SAMPLE_SOURCE, &ranged));
    });

    group.finish();
}

criterion_group!(benches, bench_lexer, bench_parser);
criterion_main!(benches);
