/// Macro to generate the builtin table from host function definitions.
///
/// Each definition carries its builtin id, the identifiers under which the VM and the argument count are
/// visible to the body, its fixed parameters, an optional variadic tail type and an optional return type.
macro_rules! impl_builtins {
    // Parameter and return pseudo-types to expression tree types.
    (@type Float) => { $crate::shared::types::Type::Float };
    (@type Vector) => { $crate::shared::types::Type::Vector };
    (@type String) => { $crate::shared::types::Type::String };
    (@type ZoneString) => { $crate::shared::types::Type::String };
    (@type Entity) => { $crate::shared::types::Type::Entity };
    (@type StringIndex) => { $crate::shared::types::Type::String };
    (@type) => { $crate::shared::types::Type::Void };
    // VM: Load an argument from its parameter slot.
    (@param $vm:ident, $index:expr, Float) => { $vm.param_float($index)? };
    (@param $vm:ident, $index:expr, Vector) => { $vm.param_vector($index)? };
    (@param $vm:ident, $index:expr, String) => { $vm.param_string($index)? };
    (@param $vm:ident, $index:expr, Entity) => { $vm.param_int($index)? };
    (@param $vm:ident, $index:expr, StringIndex) => { $vm.param_int($index)? };
    // VM: Store the result in the return slot.
    (@ret $vm:ident, $value:ident, Float) => { $vm.return_with_float($value) };
    (@ret $vm:ident, $value:ident, Vector) => { $vm.return_with_vector($value) };
    (@ret $vm:ident, $value:ident, String) => { $vm.return_with_string($value) };
    (@ret $vm:ident, $value:ident, ZoneString) => { { let index = $vm.strings.zone($value); $vm.return_with_int(index) } };
    (@ret $vm:ident, $value:ident, Entity) => { $vm.return_with_int($value) };
    (@ret $vm:ident, $value:ident) => { { let () = $value; Ok(()) } };
    // main definition block
    (
        $(
            $( #[ $attr:meta ] )*
            $id:literal fn $name:ident ( & mut $vm:ident, $argc:ident ) ( $( $param:ident : $pty:ident ),* ) $( ... $vararg:ident )? $( -> $ret:ident )? $code:block
        )+
    ) => {

        /// Host implemented functions. Generated from the definitions passed to the `impl_builtins!` macro.
        #[allow(non_camel_case_types)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $(
                $( #[ $attr ] )*
                $name,
            )+
        }

        impl Builtin {
            /// All builtins ordered by their id.
            pub const ALL: &'static [Builtin] = &[ $( Builtin::$name, )+ ];

            /// Returns the builtin with the given id.
            pub fn from_id(id: i32) -> Option<Self> {
                match id {
                    $( $id => Some(Builtin::$name), )+
                    _ => None,
                }
            }

            /// Returns the builtin with the given name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( stringify!($name) => Some(Builtin::$name), )+
                    _ => None,
                }
            }

            /// Id of the builtin. Function records store it negated as their first statement.
            pub fn id(self: &Self) -> i32 {
                match self {
                    $( Builtin::$name => $id, )+
                }
            }

            /// Name under which programs call the builtin.
            pub fn name(self: &Self) -> &'static str {
                match self {
                    $( Builtin::$name => stringify!($name), )+
                }
            }

            /// Function type of the builtin.
            pub fn signature(self: &Self) -> $crate::shared::types::Type {
                use $crate::shared::types::{Type, FunctionType};
                match self {
                    $(
                        Builtin::$name => Type::Function(Box::new(FunctionType {
                            ret     : impl_builtins!(@type $( $ret )?),
                            params  : vec![ $( impl_builtins!(@type $pty) ),* ],
                            vararg  : None $( .or(Some(impl_builtins!(@type $vararg))) )?,
                        })),
                    )+
                }
            }

            /// Executes the builtin with `num_args` arguments stored in the parameter slots.
            #[cfg(feature="runtime")]
            #[allow(unused_variables, unused_mut, unused_assignments, unreachable_code)]
            pub(crate) fn exec(self: &Self, vm: &mut $crate::bytecode::runtime::vm::VM, num_args: usize) -> $crate::bytecode::runtime::error::RuntimeResult {
                match self {
                    $(
                        Builtin::$name => {
                            let $vm = &mut *vm;
                            let $argc = num_args;
                            let mut index = 0usize;
                            $(
                                let $param = impl_builtins!(@param $vm, index, $pty);
                                index += 1;
                            )*
                            let result = $code;
                            impl_builtins!(@ret $vm, result $(, $ret )?)
                        },
                    )+
                }
            }
        }
    };
}

pub(crate) use impl_builtins;
