//! Host-dependent typedef prelude.
//!
//! Some typedefs never appear in the AST dump because the front-end treats
//! them as builtins; each platform seeds the ones its system headers rely
//! on. The table maps a typedef name to a canonical primitive, or to an
//! opaque integer when the type has no portable representation (the SVE
//! vector registers on macOS/arm64).

use crate::model::Type;
use crate::platform::Platform;

/// Typedefs seeded into a fresh import context for `platform`.
pub fn seeded_typedefs(platform: Platform) -> Vec<(String, Type)> {
    let mut seeds = vec![("bool".to_string(), integer("uint8"))];
    if platform == Platform::MacOs {
        seeds.extend(sve_typedefs());
    }
    seeds
}

/// SVE element names as they map onto canonical primitives.
const SVE_ELEMENTS: [(&str, &str); 9] = [
    ("Int8", "char"),
    ("Int16", "short"),
    ("Int32", "int"),
    ("Int64", "long"),
    ("Uint8", "char"),
    ("Uint16", "short"),
    ("Uint32", "int"),
    ("Uint64", "long"),
    ("Bool", "uint8"),
];

/// SVE float element spellings; these stay opaque.
const SVE_FLOATS: [&str; 6] = [
    "Float16", "Float32", "Float64", "BFloat16", "BFloat32", "BFloat64",
];

/// Vector tuple element spellings used by the `__clang_sv*x{2,3,4}_t`
/// family; all opaque.
const SVE_TUPLE_ELEMENTS: [&str; 14] = [
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64",
    "float16", "float32", "float64", "bfloat16", "bfloat32", "bfloat64",
];

fn sve_typedefs() -> Vec<(String, Type)> {
    let mut seeds = Vec::new();
    for (element, canonical) in SVE_ELEMENTS {
        seeds.push((format!("__SV{element}_t"), integer(canonical)));
    }
    for element in SVE_FLOATS {
        let name = format!("__SV{element}_t");
        seeds.push((name.clone(), Type::Integer(name)));
    }
    for n in 2..=4 {
        for element in SVE_TUPLE_ELEMENTS {
            let name = format!("__clang_sv{element}x{n}_t");
            seeds.push((name.clone(), Type::Integer(name)));
        }
    }
    seeds
}

fn integer(name: &str) -> Type {
    Type::Integer(name.to_string())
}
