//! Built-in functions. These will be implemented on the Builtin enum and exec'd via `VM::call_function()`.

use crate::bytecode::macros::impl_builtins;
#[cfg(feature="runtime")]
use crate::bytecode::runtime::error::RuntimeErrorKind;

impl_builtins! {

    /// Prints all arguments without separator.
    1 fn print(&mut vm, argc) () ...String {
        let text = vm.param_strings(0, argc)?.concat();
        vm.print(&text);
    }

    /// Formats a float.
    2 fn ftos(&mut vm, argc) (value: Float) -> String {
        format!("{value}")
    }

    /// Creates a new entity.
    3 fn spawn(&mut vm, argc) () -> Entity {
        vm.entities.spawn()
    }

    /// Destroys an entity. The world cannot be destroyed.
    4 fn kill(&mut vm, argc) (entity: Entity) {
        vm.entities.kill(entity).map_err(|kind| vm.error(kind))?;
    }

    /// Formats a vector as `'x y z'`.
    5 fn vtos(&mut vm, argc) (value: Vector) -> String {
        format!("'{} {} {}'", value[0], value[1], value[2])
    }

    /// Aborts execution with the concatenated arguments as message.
    6 fn error(&mut vm, argc) () ...String {
        let message = vm.param_strings(0, argc)?.concat();
        return Err(vm.error(RuntimeErrorKind::BuiltinArgument(message)));
    }

    /// Length of a vector.
    7 fn vlen(&mut vm, argc) (value: Vector) -> Float {
        (value[0] * value[0] + value[1] * value[1] + value[2] * value[2]).sqrt()
    }

    /// Formats an entity reference.
    8 fn etos(&mut vm, argc) (entity: Entity) -> String {
        format!("entity {entity}")
    }

    /// Parses a float. Unparsable input yields 0.
    9 fn stof(&mut vm, argc) (text: String) -> Float {
        text.trim().parse::<f32>().unwrap_or(0.0)
    }

    /// Concatenates all arguments.
    10 fn strcat(&mut vm, argc) () ...String -> String {
        vm.param_strings(0, argc)?.concat()
    }

    /// Compares two strings, optionally only their first `length` characters. Returns the difference of the first
    /// differing characters, a missing character counting as zero.
    11 fn strcmp(&mut vm, argc) (left: String, right: String) ...Float -> Float {
        let limit = if argc > 2 { vm.param_float(2)?.max(0.0) as usize } else { usize::MAX };
        let (mut left, mut right) = (left.chars(), right.chars());
        let mut difference = 0i64;
        for _ in 0..limit {
            match (left.next(), right.next()) {
                (None, None) => break,
                (l, r) => difference = l.map_or(0, |c| c as i64) - r.map_or(0, |c| c as i64),
            }
            if difference != 0 {
                break;
            }
        }
        difference as f32
    }

    /// Scales a vector to unit length. The zero vector is returned unchanged.
    12 fn normalize(&mut vm, argc) (value: Vector) -> Vector {
        let length = (value[0] * value[0] + value[1] * value[1] + value[2] * value[2]).sqrt();
        if length == 0.0 {
            value
        } else {
            [ value[0] / length, value[1] / length, value[2] / length ]
        }
    }

    13 fn sqrt(&mut vm, argc) (value: Float) -> Float {
        value.sqrt()
    }

    14 fn floor(&mut vm, argc) (value: Float) -> Float {
        value.floor()
    }

    15 fn pow(&mut vm, argc) (base: Float, exponent: Float) -> Float {
        base.powf(exponent)
    }

    /// Aborts execution with the given message if the condition is false.
    16 fn assert(&mut vm, argc) (condition: Float, message: String) {
        if condition == 0.0 {
            return Err(vm.error(RuntimeErrorKind::AssertionFailed(message)));
        }
    }

    /// Truncates a float towards zero.
    17 fn ftoi(&mut vm, argc) (value: Float) -> Float {
        value.trunc()
    }

    /// Copies a string into persistent zone memory.
    18 fn strzone(&mut vm, argc) (text: String) -> ZoneString {
        text
    }

    /// Frees a zone string. Other strings are ignored.
    19 fn strunzone(&mut vm, argc) (text: StringIndex) {
        vm.strings.unzone(text);
    }
}
