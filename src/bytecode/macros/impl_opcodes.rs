/// Macro to generate the opcode enum, statement rendering and VM dispatch from instruction definitions.
///
/// Each definition names the opcode, its three operands, the readable rendering of a statement using it and the
/// action executed by the VM. Definitions declaring `-> Advance` return how to move the statement index, all others
/// advance to the next statement.
macro_rules! impl_opcodes {
    // render one element of a statement's readable form
    (@pretty $statement:ident, a) => ( format!("${}", $statement.a) );
    (@pretty $statement:ident, b) => ( format!("${}", $statement.b) );
    (@pretty $statement:ident, c) => ( format!("${}", $statement.c) );
    (@pretty $statement:ident, rel_a) => ( format!("{:+}", $statement.a) );
    (@pretty $statement:ident, rel_b) => ( format!("{:+}", $statement.b) );
    (@pretty $statement:ident, $text:literal) => ( $text.to_string() );
    // wrap action result
    (@action Advance $code:block) => ( $code );
    (@action $code:block) => ( { $code Ok(Advance::Next) } );
    // main definition block
    (
        $(
            $( #[ $attr:meta ] )*
            fn $name:ident ( & mut $self:ident, $a:ident, $b:ident, $c:ident ) $( -> $advance:ident )? [ $( $pretty:tt )* ] $code:block
        )+
    ) => {

        /// Progs instructions. Generated from the definitions passed to the `impl_opcodes!` macro.
        /// The discriminant of each variant is its on-disk opcode.
        #[allow(non_camel_case_types)]
        #[repr(u16)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum OpCode {
            $(
                $( #[ $attr ] )*
                $name,
            )+
        }

        impl OpCode {
            /// All opcodes ordered by their numeric value.
            pub const ALL: &'static [OpCode] = &[ $( OpCode::$name, )+ ];

            /// Converts u16 to opcode.
            pub fn from_u16(opcode: u16) -> Option<Self> {
                Self::ALL.get(opcode as usize).copied()
            }

            /// Returns the mnemonic of the opcode.
            pub fn mnemonic(self: &Self) -> &'static str {
                match self {
                    $( OpCode::$name => stringify!($name), )+
                }
            }

            /// Parses an opcode mnemonic.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                match mnemonic {
                    $( stringify!($name) => Some(OpCode::$name), )+
                    _ => None,
                }
            }
        }

        impl crate::bytecode::Statement {
            /// Returns a readable rendering of the statement, e.g. `$102 = $100 + $101`.
            pub fn describe(self: &Self) -> String {
                match self.op {
                    $(
                        OpCode::$name => {
                            let parts: Vec<String> = vec![ $( impl_opcodes!(@pretty self, $pretty) ),* ];
                            parts.join(" ")
                        }
                    )+
                }
            }
        }

        /// Instruction actions. Implemented on VM by the `impl_opcodes!` macro.
        #[cfg(feature="runtime")]
        impl crate::bytecode::runtime::vm::VM {

            /// Executes a single statement and returns how to advance the statement index.
            pub(crate) fn exec_statement(self: &mut Self, statement: crate::bytecode::Statement) -> RuntimeResult<Advance> {
                paste::paste! {
                    match statement.op {
                        $( OpCode::$name => self.[<op_ $name:lower>](statement.a, statement.b, statement.c), )+
                    }
                }
            }

            paste::paste! {
                $(
                    $( #[ $attr ] )*
                    #[allow(unused_variables)]
                    fn [<op_ $name:lower>]($self: &mut Self, $a: Operand, $b: Operand, $c: Operand) -> RuntimeResult<Advance> {
                        impl_opcodes!(@action $( $advance )? $code)
                    }
                )+
            }
        }
    }
}

pub(crate) use impl_opcodes;
