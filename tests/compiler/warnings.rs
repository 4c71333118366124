use crate::util::*;
use progs::compiler::Compiled;

fn compiled(roots: &[ Expression ], options: CompilerOptions) -> Compiled {
    init_logging();
    progs::compiler::compile(roots, options).unwrap_or_else(|error| panic!("compilation failed: {error}"))
}

fn kinds(compiled: &Compiled) -> Vec<DiagnosticKind> {
    compiled.diagnostics.iter().map(|diagnostic| diagnostic.kind).collect()
}

#[test]
fn redeclaration() {
    let result = compiled(&with_builtins(vec![
        decl_init("x", Type::Float, float(1.0)),
        decl_init("x", Type::Float, float(2.0)),
        function("main", procedure(), &[], vec![ emit(var("x")) ]),
    ]), CompilerOptions::default());
    assert_eq!(kinds(&result), vec![ DiagnosticKind::Redeclaration ]);
    let mut vm = VM::new(&result.program);
    vm.run("main").unwrap();
    assert_eq!(vm.output(), "2 ");
}

#[test]
fn redefinition() {
    let result = compiled(&with_builtins(vec![
        function("main", procedure(), &[], vec![ emit(float(1.0)) ]),
        function("main", procedure(), &[], vec![ emit(float(2.0)) ]),
    ]), CompilerOptions::default());
    assert_eq!(kinds(&result), vec![ DiagnosticKind::Redefinition ]);
    let mut vm = VM::new(&result.program);
    vm.run("main").unwrap();
    assert_eq!(vm.output(), "2 ");
}

#[test]
fn arity_truncated() {
    let result = compiled(&program(vec![
        call("print", vec![ string("a"), string("b"), string("c") ]),
    ]), CompilerOptions { max_params: 2, ..CompilerOptions::default() });
    assert_eq!(kinds(&result), vec![ DiagnosticKind::ArityTruncated ]);
    assert!(result.diagnostics[0].message.contains("truncated to 2"));
    let mut vm = VM::new(&result.program);
    vm.run("main").unwrap();
    assert_eq!(vm.output(), "ab");
}

#[test]
fn used_before_assignment() {
    let result = compiled(&program(vec![
        decl("x", Type::Float),
        emit(var("x")),
        emit(var("x")),
        decl("total", Type::Float),
        assign(var("total"), binary(Operator::Add, var("total"), float(1.0))),
    ]), CompilerOptions::default());
    assert_eq!(kinds(&result), vec![ DiagnosticKind::UsedBeforeAssigned, DiagnosticKind::UsedBeforeAssigned ]);
    assert!(result.diagnostics[0].message.contains("'x'"));
    assert!(result.diagnostics[1].message.contains("'total'"));
}

#[test]
fn assigned_locals_and_parameters() {
    let result = compiled(&with_builtins(vec![
        function("twice", Type::function(Type::Float, vec![ Type::Float ]), &[ "a" ], vec![
            ret(Some(add(var("a"), var("a")))),
        ]),
        function("main", procedure(), &[], vec![
            decl("x", Type::Float),
            assign(var("x"), float(2.0)),
            decl_init("y", Type::Float, call("twice", vec![ var("x") ])),
            emit(var("y")),
        ]),
    ]), CompilerOptions::default());
    assert!(result.diagnostics.is_empty());
    let mut vm = VM::new(&result.program);
    vm.run("main").unwrap();
    assert_eq!(vm.output(), "4 ");
}

#[test]
fn storage_overlapping_parameters() {
    init_logging();
    let roots = program(vec![ emit(float(1.0)) ]);
    for start in [ 0, 2, 27 ] {
        let options = CompilerOptions { user_storage_start: start, ..CompilerOptions::default() };
        match progs::compiler::compile(&roots, options) {
            Err(error) => assert!(matches!(error.kind(), CompileErrorKind::InvalidOption(_))),
            Ok(_) => panic!("user_storage_start {start} was accepted"),
        }
    }
    let options = CompilerOptions { user_storage_start: progs::config::RESERVED_GLOBALS, ..CompilerOptions::default() };
    let mut vm = VM::new(&compiled(&roots, options).program);
    vm.run("main").unwrap();
    assert_eq!(vm.output(), "1 ");
}

#[test]
fn no_warnings() {
    let result = compiled(&program(vec![ emit(float(1.0)) ]), CompilerOptions::default());
    assert!(result.diagnostics.is_empty());
    assert!(!result.ir.is_empty());
}

#[test]
fn unresolved_symbol() {
    let error = compile_error(&program(vec![ emit(var("missing")) ]));
    assert_eq!(error, CompileErrorKind::UnresolvedSymbol("missing".to_string()));
}

#[test]
fn unresolved_label() {
    let error = compile_error(&program(vec![ goto("nowhere") ]));
    assert_eq!(error, CompileErrorKind::UnresolvedLabel("nowhere".to_string()));
}

#[test]
fn remainder_needs_helper() {
    let body = vec![
        decl_init("a", Type::Float, float(7.0)),
        emit(binary(Operator::Rem, var("a"), float(4.0))),
    ];
    let error = compile_error(&program(body.clone()));
    assert_eq!(error, CompileErrorKind::UnresolvedSymbol("__builtin_mod".to_string()));
    let result = printed(&execute(&with_builtins(vec![
        function("__builtin_mod", Type::function(Type::Float, vec![ Type::Float, Type::Float ]), &[ "a", "b" ], vec![
            ret(Some(binary(Operator::Sub, var("a"), binary(Operator::Mul, var("b"), call("floor", vec![ binary(Operator::Div, var("a"), var("b")) ]))))),
        ]),
        function("main", procedure(), &[], body),
    ])));
    assert_all(&result, &[ "3" ]);
}

#[test]
fn not_assignable() {
    let error = compile_error(&program(vec![ assign(float(1.0), float(2.0)) ]));
    assert!(matches!(error, CompileErrorKind::NotAssignable(_)));
    let error = compile_error(&program(vec![ assign(add(float(1.0), float(2.0)), float(2.0)) ]));
    assert!(matches!(error, CompileErrorKind::NotAssignable(_)));
}

#[test]
fn break_outside_of_loop() {
    let error = compile_error(&program(vec![ brk() ]));
    assert!(matches!(error, CompileErrorKind::Unsupported(_)));
}
