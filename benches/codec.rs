#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};
use kat::prelude::*;

#[derive(KatRep, Default, Debug, Clone)]
struct User {
    id:   i32,
    name: Option<String>,
    #[kat(alias = "disabled")]
    blocked: bool,
    roles:   Vec<String>,
}

const N_USERS: usize = 1000;

fn users() -> Vec<User> {
    (0..N_USERS)
        .map(|i| User {
            id:      i as i32,
            name:    Some(format!("user ({})", i)),
            blocked: i % 7 == 0,
            roles:   vec!["reader".to_string(), "writer".to_string()],
        })
        .collect()
}

fn bench_write(c: &mut Criterion) {
    let users = users();
    let len = kat::write(&users).unwrap().len();
    c.bench_function(
        &format!("Writing {} users, output size of {} bytes", N_USERS, len),
        move |b| b.iter(|| kat::write(black_box(&users)).unwrap()),
    );
}

fn bench_tokenize(c: &mut Criterion) {
    let text = kat::write(&users()).unwrap();
    c.bench_function(
        &format!("Tokenizing {} bytes", text.len()),
        move |b| b.iter(|| kat::lexer::Lexer::new(black_box(&text)).count()),
    );
}

fn bench_parse_tree(c: &mut Criterion) {
    let text = kat::write(&users()).unwrap();
    c.bench_function(
        &format!("Parsing {} bytes into a tree", text.len()),
        move |b| b.iter(|| kat::parser::parse(black_box(&text)).unwrap()),
    );
}

fn bench_read_typed(c: &mut Criterion) {
    let text = kat::write(&users()).unwrap();
    c.bench_function(
        &format!("Reading {} users from {} bytes", N_USERS, text.len()),
        move |b| b.iter(|| kat::read::<Vec<User>, _>(black_box(&text)).unwrap()),
    );
}

fn bench_read_dynamic(c: &mut Criterion) {
    let text = kat::write(&users()).unwrap();
    c.bench_function(
        &format!("Reading {} bytes as dynamic values", text.len()),
        move |b| b.iter(|| kat::read::<Kat, _>(black_box(&text)).unwrap()),
    );
}

criterion_group!(
    benches,
    bench_write,
    bench_tokenize,
    bench_parse_tree,
    bench_read_typed,
    bench_read_dynamic
);
criterion_main!(benches);
