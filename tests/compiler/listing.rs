use crate::util::*;
use progs::{disassemble, compiler::{parse_listing, render, ListingErrorKind}};

fn counter() -> Vec<Expression> {
    with_builtins(vec![
        function("twice", Type::function(Type::Float, vec![ Type::Float ]), &[ "n" ], vec![
            ret(Some(binary(Operator::Mul, var("n"), float(2.0)))),
        ]),
        function("main", procedure(), &[], vec![
            decl_init("i", Type::Float, float(0.0)),
            while_loop(lt(var("i"), float(3.0)), block(vec![
                emit(call("twice", vec![ var("i") ])),
                post_inc(var("i")),
            ])),
        ]),
    ])
}

#[test]
fn annotated_listing() {
    let program = build(&counter());
    let listing = disassemble(&program);
    let twice = program.functions[program.function_index("twice").unwrap()].first_statement;
    assert!(listing.contains(&format!(".func twice = ${}", program.function_index("twice").unwrap())));
    assert!(listing.contains(&format!(".func main = ${}", program.function_index("main").unwrap())));
    assert!(listing.lines().next().unwrap().contains("DONE"));
    let body = listing.lines().skip_while(|line| !line.starts_with(".func twice")).nth(1).unwrap();
    assert!(body.trim_start().starts_with(&format!("{twice}:")));
    assert!(listing.contains("IFNOT"));
    assert!(listing.contains("GOTO"));
}

#[test]
fn listing_round_trip() {
    let program = build(&counter());
    let statements = parse_listing(&disassemble(&program)).unwrap();
    assert_eq!(statements, program.statements);
    let rebuilt = Program { statements, ..program.clone() };
    let mut vm = VM::new(&rebuilt);
    vm.run("main").unwrap();
    assert_eq!(vm.output(), "0 2 4 ");
}

#[test]
fn edited_listing() {
    let program = build(&counter());
    let listing = disassemble(&program).replacen("DONE", "NOPE", 1);
    let error = parse_listing(&listing).unwrap_err();
    assert_eq!(error.kind(), &ListingErrorKind::UnknownMnemonic("NOPE".to_string()));
    assert_eq!(error.line(), 1);
}

#[test]
fn ir_blocks() {
    init_logging();
    let compiled = progs::compiler::compile(&counter(), CompilerOptions::default()).unwrap();
    let rendered = render(&compiled.ir);
    let twice = rendered.lines().position(|line| line.starts_with(".func twice = $")).unwrap();
    let main = rendered.lines().position(|line| line.starts_with(".func main = $")).unwrap();
    assert!(twice < main);
    assert!(rendered.lines().nth(twice).unwrap().ends_with('{'));
    assert_eq!(rendered.lines().nth(main - 1), Some("}"));
    assert_eq!(rendered.lines().last(), Some("}"));
    assert!(rendered.lines().skip(main).any(|line| line.trim_start().starts_with("IFNOT")));
}
