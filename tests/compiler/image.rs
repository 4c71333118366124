use crate::util::*;
use progs::{ProgramErrorKind, config::{HEADER_SIZE, PROGS_VERSION}};

fn sample() -> Program {
    build(&with_builtins(vec![
        decl_init("speed", Type::Float, float(4.5)),
        decl_init("greeting", Type::String, string("hello")),
        decl("health", Type::field(Type::Float)),
        function("main", procedure(), &[], vec![
            decl_init("e", Type::Entity, call("spawn", vec![])),
            assign(member(var("e"), "health"), var("speed")),
            emit_str(var("greeting")),
            emit(member(var("e"), "health")),
        ]),
    ]))
}

#[test]
fn image_round_trip() {
    let program = sample();
    assert_eq!(program.version, PROGS_VERSION);
    assert_eq!(program.crc, program.checksum());
    let bytes = program.to_bytes();
    assert_eq!(&bytes[0..4], &PROGS_VERSION.to_le_bytes());
    let loaded = Program::from_bytes(&bytes).unwrap();
    assert_eq!(loaded, program);
    let mut vm = VM::new(&loaded);
    vm.run("main").unwrap();
    assert_eq!(vm.output(), "hello 4.5 ");
}

#[test]
fn rejects_damaged_images() {
    let bytes = sample().to_bytes();
    let error = |image: &[ u8 ]| Program::from_bytes(image).unwrap_err().kind().clone();
    assert_eq!(error(&bytes[..30]), ProgramErrorKind::Truncated);
    let mut version = bytes.clone();
    version[0..4].copy_from_slice(&7i32.to_le_bytes());
    assert_eq!(error(&version), ProgramErrorKind::BadVersion(7));
    let mut opcode = bytes.clone();
    opcode[HEADER_SIZE..HEADER_SIZE + 2].copy_from_slice(&0x7fffu16.to_le_bytes());
    assert_eq!(error(&opcode), ProgramErrorKind::BadOpcode(0x7fff));
    assert!(matches!(error(&bytes[..bytes.len() - 1]), ProgramErrorKind::BadSection(_)));
}
